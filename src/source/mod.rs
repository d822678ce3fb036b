//! Event sources
//!
//! An [`EventSource`] supplies the raw health events for a query window,
//! region and status filter. The aggregation core only sees the resulting
//! [`HealthEvent`]s and a [`SourceError`] when nothing could be fetched.

pub mod document;
pub mod file;
pub mod http;

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::health::{HealthEvent, ServiceName};

pub use document::{FeedDocument, FeedEvent};
pub use file::JsonFileSource;
pub use http::HttpEventSource;

/// Default lookback for the query window
pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;

/// Longest configurable lookback
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

/// Status codes queried when none are configured
pub const DEFAULT_STATUS_FILTER: [&str; 2] = ["open", "upcoming"];

/// Errors raised when events cannot be fetched
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no credentials found")]
    MissingCredentials,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },

    #[error("malformed health feed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Supplies health events for a query
pub trait EventSource {
    /// Fetches the events matching `query`
    fn fetch_events(&self, query: &EventQuery) -> Result<Vec<HealthEvent>, SourceError>;

    /// Short label used in logs
    fn describe(&self) -> String {
        "event source".to_string()
    }
}

/// Closed time interval `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window covering the `days` before `end`
    ///
    /// A lookback past the representable range starts at the earliest
    /// representable instant.
    pub fn lookback(end: DateTime<Utc>, days: i64) -> Self {
        let start = Duration::try_days(days)
            .and_then(|span| end.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end }
    }

    /// Returns true if `[from, until]` intersects the window
    ///
    /// A missing `until` means the interval is still open.
    pub fn overlaps(&self, from: DateTime<Utc>, until: Option<DateTime<Utc>>) -> bool {
        from <= self.end && until.is_none_or(|until| until >= self.start)
    }
}

/// Parameters for one fetch
#[derive(Debug, Clone)]
pub struct EventQuery {
    /// Requested services, in the order given by the caller
    pub services: Vec<ServiceName>,
    /// Region to query; `None` queries every region
    pub region: Option<String>,
    pub window: TimeRange,
    /// Lower-case status codes to include; empty includes every status
    pub status_filter: BTreeSet<String>,
    /// Cap on events returned per service
    pub max_results_per_service: Option<usize>,
}

impl EventQuery {
    /// Creates a query with the default status filter
    pub fn new(services: Vec<ServiceName>, window: TimeRange) -> Self {
        Self {
            services,
            region: None,
            window,
            status_filter: DEFAULT_STATUS_FILTER
                .iter()
                .map(|status| status.to_string())
                .collect(),
            max_results_per_service: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_status_filter<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.status_filter = statuses
            .into_iter()
            .map(|status| status.as_ref().trim().to_ascii_lowercase())
            .filter(|status| !status.is_empty())
            .collect();
        self
    }

    pub fn with_max_results_per_service(mut self, max: usize) -> Self {
        self.max_results_per_service = Some(max);
        self
    }

    /// Returns true if a raw status code passes the status filter
    pub fn accepts_status(&self, raw: &str) -> bool {
        self.status_filter.is_empty()
            || self
                .status_filter
                .contains(&raw.trim().to_ascii_lowercase())
    }

    /// Returns true if `service` is requested, or no services are listed
    pub fn accepts_service(&self, service: &str) -> bool {
        self.services.is_empty() || self.services.iter().any(|s| s.as_str() == service)
    }

    /// Returns true if an event in `region` is visible to this query
    ///
    /// Events without a region and `global` events are visible everywhere.
    pub fn accepts_region(&self, region: Option<&str>) -> bool {
        match (&self.region, region) {
            (None, _) | (_, None) => true,
            (Some(_), Some("global")) => true,
            (Some(wanted), Some(region)) => wanted == region,
        }
    }
}

/// Access key pair for an authenticated source
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Credentials {
    /// Builds credentials when both parts are present and non-empty
    pub fn from_parts(
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
    ) -> Option<Self> {
        match (access_key_id, secret_access_key) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some(Self {
                access_key_id: id,
                secret_access_key: secret,
            }),
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Source backed by a fixed list of events
///
/// Returns the events as given, without applying the query filters.
#[derive(Debug, Clone, Default)]
pub struct StaticEventSource {
    events: Vec<HealthEvent>,
}

impl StaticEventSource {
    pub fn new(events: Vec<HealthEvent>) -> Self {
        Self { events }
    }
}

impl EventSource for StaticEventSource {
    fn fetch_events(&self, _query: &EventQuery) -> Result<Vec<HealthEvent>, SourceError> {
        Ok(self.events.clone())
    }

    fn describe(&self) -> String {
        format!("{} static events", self.events.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_lookback_window() {
        let window = TimeRange::lookback(at(8), DEFAULT_LOOKBACK_DAYS);
        assert_eq!(window.start, at(1));
        assert_eq!(window.end, at(8));
    }

    #[test]
    fn test_lookback_out_of_range_saturates() {
        let window = TimeRange::lookback(at(8), i64::MAX / 2);
        assert_eq!(window.start, DateTime::<Utc>::MIN_UTC);
        assert!(window.overlaps(at(1), None));
    }

    #[test]
    fn test_window_overlaps() {
        let window = TimeRange::new(at(5), at(10));
        assert!(window.overlaps(at(1), None));
        assert!(window.overlaps(at(1), Some(at(5))));
        assert!(!window.overlaps(at(1), Some(at(4))));
        assert!(!window.overlaps(at(11), None));
    }

    #[test]
    fn test_default_status_filter() {
        let query = EventQuery::new(Vec::new(), TimeRange::lookback(at(8), 7));
        assert!(query.accepts_status("open"));
        assert!(query.accepts_status("UPCOMING"));
        assert!(!query.accepts_status("closed"));
    }

    #[test]
    fn test_empty_status_filter_accepts_all() {
        let query = EventQuery::new(Vec::new(), TimeRange::lookback(at(8), 7))
            .with_status_filter(Vec::<String>::new());
        assert!(query.accepts_status("closed"));
        assert!(query.accepts_status("whatever"));
    }

    #[test]
    fn test_region_matching() {
        let query = EventQuery::new(Vec::new(), TimeRange::lookback(at(8), 7))
            .with_region("us-east-1");
        assert!(query.accepts_region(Some("us-east-1")));
        assert!(query.accepts_region(Some("global")));
        assert!(query.accepts_region(None));
        assert!(!query.accepts_region(Some("eu-west-1")));
    }

    #[test]
    fn test_credentials_require_both_parts() {
        assert!(Credentials::from_parts(Some("id".into()), Some("secret".into())).is_some());
        assert!(Credentials::from_parts(Some("id".into()), None).is_none());
        assert!(Credentials::from_parts(Some(String::new()), Some("secret".into())).is_none());
    }

    #[test]
    fn test_credentials_debug_hides_secret() {
        let creds = Credentials::from_parts(Some("AKID".into()), Some("hunter2".into())).unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("hunter2"));
    }
}
