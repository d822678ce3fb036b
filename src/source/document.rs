//! Health feed document
//!
//! The JSON shape read by the file and HTTP sources, modelled on the
//! provider's `DescribeEvents` response:
//!
//! ```json
//! {
//!   "events": [
//!     {
//!       "arn": "arn:aws:health:us-east-1::event/EC2/ISSUE/abc",
//!       "service": "EC2",
//!       "region": "us-east-1",
//!       "startTime": "2024-03-05T10:00:00Z",
//!       "statusCode": "open"
//!     }
//!   ]
//! }
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use super::EventQuery;
use crate::health::{EventStatus, HealthEvent};

/// Top-level feed document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedDocument {
    #[serde(default)]
    pub events: Vec<FeedEvent>,
}

/// One event as reported by the feed
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEvent {
    /// Unique event identifier
    pub arn: String,
    pub service: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub status_code: String,
}

impl FeedEvent {
    fn in_window(&self, query: &EventQuery) -> bool {
        let Some(start) = self.start_time else {
            return true;
        };
        // Scheduled work is reported ahead of its start
        if EventStatus::parse(&self.status_code) == EventStatus::Upcoming {
            return start >= query.window.start;
        }
        query.window.overlaps(start, self.end_time)
    }

    fn matches(&self, query: &EventQuery) -> bool {
        query.accepts_service(&self.service)
            && query.accepts_region(self.region.as_deref())
            && query.accepts_status(&self.status_code)
            && self.in_window(query)
    }

    fn into_health_event(self) -> HealthEvent {
        let status = EventStatus::parse(&self.status_code);
        if status == EventStatus::Unknown {
            warn!(
                event_id = %self.arn,
                service = %self.service,
                status = %self.status_code,
                "Unrecognized event status, treating as unhealthy"
            );
        }
        HealthEvent::new(self.service, self.arn, status)
    }
}

impl FeedDocument {
    /// Parses a document from JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Applies the query filters and converts the survivors, keeping feed order
    ///
    /// The per-service cap only applies to `ok` events; events reporting a
    /// degradation are always kept.
    pub fn into_events(self, query: &EventQuery) -> Vec<HealthEvent> {
        let mut ok_per_service: HashMap<String, usize> = HashMap::new();

        self.events
            .into_iter()
            .filter(|event| event.matches(query))
            .filter(|event| {
                let Some(max) = query.max_results_per_service else {
                    return true;
                };
                if !EventStatus::parse(&event.status_code).is_ok() {
                    return true;
                }
                let count = ok_per_service.entry(event.service.clone()).or_default();
                *count += 1;
                if *count > max {
                    warn!(
                        event_id = %event.arn,
                        service = %event.service,
                        max,
                        "Dropping ok event over the per-service limit"
                    );
                    return false;
                }
                true
            })
            .map(FeedEvent::into_health_event)
            .collect()
    }
}
