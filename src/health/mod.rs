//! Service health aggregation
//!
//! Turns the events reported by an [`EventSource`](crate::source::EventSource)
//! into one result per requested service and an overall verdict, useful for:
//! - Scheduled checks in a monitoring pipeline
//! - CI/CD gates that must fail on degraded dependencies
//!
//! # Example
//!
//! ```
//! use cloud_health_check::health::{self, EventStatus, HealthEvent, ServiceName, Verdict};
//!
//! let services = ServiceName::parse_list("S3,EC2");
//! let events = vec![
//!     HealthEvent::new("S3", "E1", EventStatus::Ok),
//!     HealthEvent::new("EC2", "E2", EventStatus::Open),
//! ];
//!
//! let aggregation = health::aggregate(&services, events).unwrap();
//! assert_eq!(aggregation.verdict(), Verdict::Unhealthy);
//! println!("{}", health::render(&aggregation.results));
//! ```

pub mod aggregator;
pub mod event;
pub mod reporter;

pub use aggregator::{Aggregation, ServiceResult, Verdict, aggregate};
pub use event::{EventStatus, HealthEvent, ServiceName};
pub use reporter::{ReportFormat, format_table, print_report, render};

use crate::error::Result;
use crate::source::{EventQuery, EventSource};

/// Fetches events for `query` from `source` and aggregates them
///
/// The service list is validated before the source is contacted.
pub fn check_services<S>(source: &S, query: &EventQuery) -> Result<Aggregation>
where
    S: EventSource + ?Sized,
{
    if query.services.is_empty() {
        return aggregate(&query.services, Vec::new());
    }

    let events = source.fetch_events(query)?;
    tracing::info!(events = events.len(), "Fetched health events");

    let aggregation = aggregate(&query.services, events)?;
    for event in &aggregation.unmatched {
        tracing::debug!(
            service = %event.service,
            event_id = %event.event_id,
            "Ignoring event for unrequested service"
        );
    }

    Ok(aggregation)
}
