//! Matches events to requested services and derives the verdict

use indexmap::IndexMap;

use super::event::{HealthEvent, ServiceName};
use crate::error::{HealthError, Result};

/// Overall result of a health check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Healthy,
    Unhealthy,
}

impl Verdict {
    /// Folds per-service health flags into a verdict
    pub fn from_results(results: &[ServiceResult]) -> Self {
        if results.iter().all(|result| result.healthy) {
            Verdict::Healthy
        } else {
            Verdict::Unhealthy
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, Verdict::Healthy)
    }

    /// Returns the process exit code for this verdict
    /// 0 = healthy, 1 = unhealthy
    pub fn exit_code(&self) -> i32 {
        match self {
            Verdict::Healthy => 0,
            Verdict::Unhealthy => 1,
        }
    }
}

/// Health of one requested service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResult {
    /// The requested service
    pub service: ServiceName,
    /// Events reported for this service, in source order
    pub events: Vec<HealthEvent>,
    /// True when every event is ok (or there are none)
    pub healthy: bool,
}

impl ServiceResult {
    fn new(service: ServiceName, events: Vec<HealthEvent>) -> Self {
        let healthy = events.iter().all(|event| event.status.is_ok());
        Self {
            service,
            events,
            healthy,
        }
    }
}

/// Results of one aggregation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    /// One entry per distinct requested service, in first-requested order
    pub results: Vec<ServiceResult>,
    /// Events for services that were not requested, in source order
    pub unmatched: Vec<HealthEvent>,
}

impl Aggregation {
    /// Overall verdict; unmatched events never count
    pub fn verdict(&self) -> Verdict {
        Verdict::from_results(&self.results)
    }

    pub fn healthy_count(&self) -> usize {
        self.results.iter().filter(|result| result.healthy).count()
    }

    pub fn unhealthy_count(&self) -> usize {
        self.results.len() - self.healthy_count()
    }

    /// Looks up the result for a requested service
    pub fn result_for(&self, service: &str) -> Option<&ServiceResult> {
        self.results
            .iter()
            .find(|result| result.service.as_str() == service)
    }
}

/// Buckets `events` under the requested `services` and classifies each one
///
/// An event belongs to a service when its `service` field equals the
/// requested name exactly. Requesting a name twice yields a single result.
/// Fails with [`HealthError::InvalidInput`] when `services` is empty.
pub fn aggregate<I>(services: &[ServiceName], events: I) -> Result<Aggregation>
where
    I: IntoIterator<Item = HealthEvent>,
{
    if services.is_empty() {
        return Err(HealthError::InvalidInput(
            "no services specified".to_string(),
        ));
    }

    let mut buckets: IndexMap<ServiceName, Vec<HealthEvent>> = IndexMap::new();
    for service in services {
        buckets.entry(service.clone()).or_default();
    }

    let mut unmatched = Vec::new();
    for event in events {
        match buckets.get_mut(&event.service) {
            Some(bucket) => bucket.push(event),
            None => unmatched.push(event),
        }
    }

    let results = buckets
        .into_iter()
        .map(|(service, events)| ServiceResult::new(service, events))
        .collect();

    Ok(Aggregation { results, unmatched })
}
