//! Health check configuration
//!
//! Settings are layered, later sources overriding earlier ones:
//! 1. Built-in defaults
//! 2. `config/default.toml`, next to the executable or in the current directory
//! 3. An explicit config file (`--config`)
//! 4. Environment variables with prefix `HEALTH_CHECK_` (e.g., `HEALTH_CHECK_SOURCE__ENDPOINT`)
//! 5. The legacy variables `AWS_SERVICES`, `AWS_REGION`, `AWS_ACCESS_KEY_ID`
//!    and `AWS_SECRET_ACCESS_KEY` (or their lower-case dashed spellings)
//! 6. Command line overrides

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer};

use crate::error::{HealthError, Result};
use crate::health::ServiceName;
use crate::source::{
    Credentials, DEFAULT_LOOKBACK_DAYS, DEFAULT_STATUS_FILTER, EventQuery, MAX_LOOKBACK_DAYS,
    TimeRange,
};

/// Where events are read from
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// JSON feed document on disk
    pub events_file: Option<PathBuf>,
    /// Base URL of an HTTP health feed
    pub endpoint: Option<String>,
    /// Request timeout for the HTTP feed
    pub timeout_secs: u64,
}

/// Credentials for the HTTP feed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// Health check configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CheckConfig {
    /// Services to check, in order
    #[serde(deserialize_with = "comma_list")]
    pub services: Vec<String>,
    /// Region to query; unset queries every region
    pub region: Option<String>,
    /// Length of the query window in days
    pub lookback_days: i64,
    /// Status codes to query
    #[serde(deserialize_with = "comma_list")]
    pub status_filter: Vec<String>,
    /// Cap on events per service
    pub max_results_per_service: Option<usize>,
    pub source: SourceConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Comma-separated service list
    pub services: Option<String>,
    pub region: Option<String>,
    pub events_file: Option<PathBuf>,
    pub endpoint: Option<String>,
    pub lookback_days: Option<i64>,
}

impl CheckConfig {
    /// Loads configuration from the default locations and the process environment
    pub fn load(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let config_dir = Self::find_config_dir();
        Self::load_from(config_dir.as_deref(), file, None, overrides)
    }

    /// Loads configuration from explicit locations
    ///
    /// `env` replaces the process environment when given.
    pub fn load_from(
        config_dir: Option<&Path>,
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("services", Vec::<String>::new())?
            .set_default("lookback_days", DEFAULT_LOOKBACK_DAYS)?
            .set_default("status_filter", DEFAULT_STATUS_FILTER.to_vec())?
            .set_default("max_results_per_service", 10)?
            .set_default("source.timeout_secs", 30)?;

        if let Some(dir) = config_dir {
            builder = builder.add_source(File::from(dir.join("default.toml")).required(false));
        }

        if let Some(file) = file {
            builder = builder.add_source(File::from(file).required(true));
        }

        // Use __ as separator for nested fields (e.g., HEALTH_CHECK_SOURCE__ENDPOINT)
        builder = builder.add_source(
            Environment::with_prefix("HEALTH_CHECK")
                .prefix_separator("_")
                .separator("__")
                .source(env.clone()),
        );

        let legacy = |keys: &[&str]| legacy_var(env.as_ref(), keys);
        builder = builder
            .set_override_option("services", legacy(&["AWS_SERVICES"]))?
            .set_override_option("region", legacy(&["AWS_REGION", "aws-region"]))?
            .set_override_option(
                "credentials.access_key_id",
                legacy(&["AWS_ACCESS_KEY_ID", "aws-access-key-id"]),
            )?
            .set_override_option(
                "credentials.secret_access_key",
                legacy(&["AWS_SECRET_ACCESS_KEY", "aws-secret-access-key"]),
            )?;

        builder = builder
            .set_override_option("services", overrides.services.clone())?
            .set_override_option("region", overrides.region.clone())?
            .set_override_option(
                "source.events_file",
                overrides
                    .events_file
                    .as_ref()
                    .map(|path| path.display().to_string()),
            )?
            .set_override_option("source.endpoint", overrides.endpoint.clone())?
            .set_override_option("lookback_days", overrides.lookback_days)?;

        let config: CheckConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Finds the config directory next to the executable or in the current directory
    fn find_config_dir() -> Option<PathBuf> {
        if let Ok(exe_path) = std::env::current_exe()
            && let Some(exe_dir) = exe_path.parent()
        {
            let config_dir = exe_dir.join("config");
            if config_dir.exists() {
                return Some(config_dir);
            }
        }

        let cwd_config = PathBuf::from("config");
        if cwd_config.exists() {
            return Some(cwd_config);
        }

        None
    }

    fn validate(&self) -> Result<()> {
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(HealthError::InvalidConfig(format!(
                "lookback_days must be between 1 and {}, got {}",
                MAX_LOOKBACK_DAYS, self.lookback_days
            )));
        }
        if self.max_results_per_service == Some(0) {
            return Err(HealthError::InvalidConfig(
                "max_results_per_service must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Requested services, in configured order
    pub fn service_names(&self) -> Vec<ServiceName> {
        self.services.iter().cloned().map(ServiceName::from).collect()
    }

    pub fn credentials(&self) -> Option<Credentials> {
        Credentials::from_parts(
            self.credentials.access_key_id.clone(),
            self.credentials.secret_access_key.clone(),
        )
    }

    /// Builds the event query for a window ending at `now`
    pub fn query(&self, now: DateTime<Utc>) -> EventQuery {
        let mut query = EventQuery::new(
            self.service_names(),
            TimeRange::lookback(now, self.lookback_days),
        )
        .with_status_filter(&self.status_filter);

        if let Some(region) = &self.region {
            query = query.with_region(region.clone());
        }
        if let Some(max) = self.max_results_per_service {
            query = query.with_max_results_per_service(max);
        }
        query
    }
}

fn legacy_var(env: Option<&HashMap<String, String>>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| match env {
            Some(env) => env.get(*key).cloned(),
            None => std::env::var(key).ok(),
        })
        .filter(|value| !value.trim().is_empty())
}

/// Accepts either a list or a comma-separated string
fn comma_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    let items = match StringOrList::deserialize(deserializer)? {
        StringOrList::One(value) => vec![value],
        StringOrList::Many(values) => values,
    };

    Ok(items
        .iter()
        .flat_map(|item| item.split(','))
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn load(vars: &[(&str, &str)], overrides: &ConfigOverrides) -> Result<CheckConfig> {
        CheckConfig::load_from(None, None, env(vars), overrides)
    }

    #[test]
    fn test_defaults() {
        let config = load(&[], &ConfigOverrides::default()).unwrap();

        assert!(config.services.is_empty());
        assert_eq!(config.lookback_days, 7);
        assert_eq!(config.status_filter, vec!["open", "upcoming"]);
        assert_eq!(config.max_results_per_service, Some(10));
        assert_eq!(config.source.timeout_secs, 30);
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_legacy_environment() {
        let config = load(
            &[
                ("AWS_SERVICES", "Amazon S3, Amazon EC2"),
                ("aws-region", "eu-west-1"),
                ("aws-access-key-id", "AKID"),
                ("aws-secret-access-key", "secret"),
            ],
            &ConfigOverrides::default(),
        )
        .unwrap();

        assert_eq!(config.services, vec!["Amazon S3", "Amazon EC2"]);
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.credentials().unwrap().access_key_id, "AKID");
    }

    #[test]
    fn test_prefixed_environment() {
        let config = load(
            &[
                ("HEALTH_CHECK_SERVICES", "S3,EC2"),
                ("HEALTH_CHECK_LOOKBACK_DAYS", "14"),
                ("HEALTH_CHECK_SOURCE__ENDPOINT", "https://health.example.com"),
            ],
            &ConfigOverrides::default(),
        )
        .unwrap();

        assert_eq!(config.services, vec!["S3", "EC2"]);
        assert_eq!(config.lookback_days, 14);
        assert_eq!(
            config.source.endpoint.as_deref(),
            Some("https://health.example.com")
        );
    }

    #[test]
    fn test_overrides_win() {
        let overrides = ConfigOverrides {
            services: Some("RDS".to_string()),
            region: Some("ap-south-1".to_string()),
            ..Default::default()
        };
        let config = load(
            &[("AWS_SERVICES", "S3"), ("AWS_REGION", "us-east-1")],
            &overrides,
        )
        .unwrap();

        assert_eq!(config.services, vec!["RDS"]);
        assert_eq!(config.region.as_deref(), Some("ap-south-1"));
    }

    #[test]
    fn test_config_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
services = ["S3", "CloudFront"]
region = "us-east-1"
status_filter = "open"

[source]
events_file = "events.json"
"#
        )
        .unwrap();

        let config = CheckConfig::load_from(
            None,
            Some(file.path()),
            env(&[]),
            &ConfigOverrides::default(),
        )
        .unwrap();

        assert_eq!(config.services, vec!["S3", "CloudFront"]);
        assert_eq!(config.status_filter, vec!["open"]);
        assert_eq!(
            config.source.events_file.as_deref(),
            Some(Path::new("events.json"))
        );
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let result = CheckConfig::load_from(
            None,
            Some(&missing),
            env(&[]),
            &ConfigOverrides::default(),
        );

        assert!(matches!(result, Err(HealthError::Config(_))));
    }

    #[test]
    fn test_non_positive_lookback_rejected() {
        let overrides = ConfigOverrides {
            lookback_days: Some(0),
            ..Default::default()
        };
        let result = load(&[], &overrides);

        assert!(matches!(result, Err(HealthError::InvalidConfig(_))));
    }

    #[test]
    fn test_oversized_lookback_rejected() {
        let overrides = ConfigOverrides {
            services: Some("S3".to_string()),
            lookback_days: Some(i64::MAX / 2),
            ..Default::default()
        };
        let result = load(&[], &overrides);

        assert!(matches!(result, Err(HealthError::InvalidConfig(_))));
    }

    #[test]
    fn test_longest_lookback_accepted() {
        let overrides = ConfigOverrides {
            lookback_days: Some(MAX_LOOKBACK_DAYS),
            ..Default::default()
        };
        let config = load(&[], &overrides).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap();

        assert_eq!(config.query(now).window.end, now);
    }

    #[test]
    fn test_zero_max_results_rejected() {
        let result = load(
            &[("HEALTH_CHECK_MAX_RESULTS_PER_SERVICE", "0")],
            &ConfigOverrides::default(),
        );

        assert!(matches!(result, Err(HealthError::InvalidConfig(_))));
    }

    #[test]
    fn test_query_from_config() {
        let config = load(
            &[("AWS_SERVICES", "S3,EC2"), ("AWS_REGION", "us-east-1")],
            &ConfigOverrides::default(),
        )
        .unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap();
        let query = config.query(now);

        assert_eq!(query.services, ServiceName::parse_list("S3,EC2"));
        assert_eq!(query.region.as_deref(), Some("us-east-1"));
        assert_eq!(query.window, TimeRange::lookback(now, 7));
        assert_eq!(query.max_results_per_service, Some(10));
        assert!(query.accepts_status("open"));
    }
}
