//! Event source reading a health feed document from disk

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use super::{EventQuery, EventSource, FeedDocument, SourceError};
use crate::health::HealthEvent;

/// Reads events from a JSON feed document on each fetch
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EventSource for JsonFileSource {
    fn fetch_events(&self, query: &EventQuery) -> Result<Vec<HealthEvent>, SourceError> {
        debug!(path = %self.path.display(), "Reading health feed");
        let bytes = fs::read(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;

        let document = FeedDocument::from_slice(&bytes)?;
        Ok(document.into_events(query))
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::ServiceName;
    use crate::source::TimeRange;
    use chrono::Utc;
    use std::io::Write;

    fn query() -> EventQuery {
        EventQuery::new(ServiceName::parse_list("EC2"), TimeRange::lookback(Utc::now(), 7))
    }

    #[test]
    fn test_reads_feed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"events": [{{"arn": "E1", "service": "EC2", "statusCode": "open"}}]}}"#
        )
        .unwrap();

        let source = JsonFileSource::new(file.path());
        let events = source.fetch_events(&query()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_id, "E1");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonFileSource::new(dir.path().join("absent.json"));

        let err = source.fetch_events(&query()).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let source = JsonFileSource::new(file.path());
        let err = source.fetch_events(&query()).unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }
}
