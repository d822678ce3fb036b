//! Service names, event statuses and health events

use std::fmt;

/// Name of a service whose health is being checked
///
/// Names are opaque and compared exactly: `"EC2"` and `"ec2"` are different
/// services.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses a comma-separated list such as `"S3, EC2,,RDS"`
    ///
    /// Entries are trimmed and empty entries are dropped. Order and
    /// duplicates are preserved.
    pub fn parse_list(list: &str) -> Vec<ServiceName> {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ServiceName::new)
            .collect()
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ServiceName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Status of a reported health event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventStatus {
    /// Service reported as operating normally
    Ok,
    /// Ongoing incident
    Open,
    /// Scheduled change or maintenance
    Upcoming,
    /// Resolved incident
    Closed,
    /// Status string not recognized
    Unknown,
}

impl EventStatus {
    /// Maps a raw status code to a status, case-insensitively
    ///
    /// Unrecognized codes become [`EventStatus::Unknown`], which counts as
    /// unhealthy.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ok" => EventStatus::Ok,
            "open" => EventStatus::Open,
            "upcoming" => EventStatus::Upcoming,
            "closed" => EventStatus::Closed,
            _ => EventStatus::Unknown,
        }
    }

    /// Returns true only for [`EventStatus::Ok`]
    pub fn is_ok(&self) -> bool {
        matches!(self, EventStatus::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Ok => "ok",
            EventStatus::Open => "open",
            EventStatus::Upcoming => "upcoming",
            EventStatus::Closed => "closed",
            EventStatus::Unknown => "unknown",
        }
    }

    /// Returns the status as a colored string
    pub fn as_colored_str(&self) -> String {
        use colored::Colorize;
        match self {
            EventStatus::Ok => self.as_str().green().to_string(),
            EventStatus::Upcoming => self.as_str().yellow().to_string(),
            EventStatus::Open | EventStatus::Closed | EventStatus::Unknown => {
                self.as_str().red().to_string()
            }
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single incident or advisory reported for a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthEvent {
    /// Service the event applies to
    pub service: ServiceName,
    /// Opaque event identifier
    pub event_id: String,
    /// Classified status
    pub status: EventStatus,
}

impl HealthEvent {
    pub fn new(
        service: impl Into<ServiceName>,
        event_id: impl Into<String>,
        status: EventStatus,
    ) -> Self {
        Self {
            service: service.into(),
            event_id: event_id.into(),
            status,
        }
    }

    /// Builds an event from a raw status code
    pub fn from_raw(
        service: impl Into<ServiceName>,
        event_id: impl Into<String>,
        raw_status: &str,
    ) -> Self {
        Self::new(service, event_id, EventStatus::parse(raw_status))
    }
}
