//! Cloud Health Check
//!
//! Aggregates the events reported by a cloud service-health feed into a
//! per-service report and a single healthy/unhealthy verdict.

/// Build-time information (version, target, compiler)
pub mod build_info;

/// Layered configuration (files, environment, command line)
pub mod config;

/// Error types shared across the crate
pub mod error;

/// Event aggregation, verdicts and report rendering
pub mod health;

/// Event sources (static, JSON file, HTTP feed)
pub mod source;

pub use error::{HealthError, Result};
