//! Build-time information
//!
//! Metadata captured at compile time by the build script, shown by
//! `health-check --version`.

/// Build timestamp (when the binary was compiled)
pub const BUILD_TIMESTAMP: &str = env!("VERGEN_BUILD_TIMESTAMP");

/// Target triple (e.g., x86_64-unknown-linux-gnu, x86_64-apple-darwin)
pub const CARGO_TARGET_TRIPLE: &str = env!("VERGEN_CARGO_TARGET_TRIPLE");

/// Rust compiler version (e.g., 1.85.0)
pub const RUSTC_SEMVER: &str = env!("VERGEN_RUSTC_SEMVER");

/// Crate version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the long version string used by the CLI
///
/// Format: `{version} ({target}, rustc {rustc}, built {timestamp})`
pub fn long_version() -> String {
    format!(
        "{} ({}, rustc {}, built {})",
        PKG_VERSION, CARGO_TARGET_TRIPLE, RUSTC_SEMVER, BUILD_TIMESTAMP
    )
}
