//! Event source fetching a health feed document over HTTP

use std::time::Duration;

use chrono::SecondsFormat;
use reqwest::Client;
use tokio::runtime::Runtime;
use tracing::debug;
use url::Url;

use super::{Credentials, EventQuery, EventSource, FeedDocument, SourceError};
use crate::health::HealthEvent;

/// Fetches events from `<endpoint>/events` with basic authentication
///
/// The source owns a tokio runtime so it can be driven from the synchronous
/// check pipeline.
pub struct HttpEventSource {
    endpoint: Url,
    credentials: Credentials,
    client: Client,
    runtime: Runtime,
}

impl HttpEventSource {
    /// Creates a source for `endpoint`
    ///
    /// Fails with [`SourceError::MissingCredentials`] when no credentials are
    /// configured.
    pub fn new(
        endpoint: &str,
        credentials: Option<Credentials>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let credentials = credentials.ok_or(SourceError::MissingCredentials)?;

        let mut endpoint = Url::parse(endpoint)?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        let client = Client::builder().timeout(timeout).build()?;
        let runtime = Runtime::new().map_err(SourceError::Runtime)?;

        Ok(Self {
            endpoint,
            credentials,
            client,
            runtime,
        })
    }

    /// Builds the request URL for `query`
    pub fn request_url(&self, query: &EventQuery) -> Result<Url, SourceError> {
        let mut url = self.endpoint.join("events")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(region) = &query.region {
                pairs.append_pair("region", region);
            }
            pairs.append_pair(
                "start",
                &query.window.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            );
            pairs.append_pair(
                "end",
                &query.window.end.to_rfc3339_opts(SecondsFormat::Secs, true),
            );
            if !query.status_filter.is_empty() {
                let statuses: Vec<&str> =
                    query.status_filter.iter().map(String::as_str).collect();
                pairs.append_pair("status", &statuses.join(","));
            }
            for service in &query.services {
                pairs.append_pair("service", service.as_str());
            }
        }
        Ok(url)
    }

    async fn fetch_document(&self, url: Url) -> Result<FeedDocument, SourceError> {
        let response = self
            .client
            .get(url.clone())
            .basic_auth(
                &self.credentials.access_key_id,
                Some(&self.credentials.secret_access_key),
            )
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(FeedDocument::from_slice(&body)?)
    }
}

impl EventSource for HttpEventSource {
    fn fetch_events(&self, query: &EventQuery) -> Result<Vec<HealthEvent>, SourceError> {
        let url = self.request_url(query)?;
        debug!(%url, "Requesting health events");

        let document = self.runtime.block_on(self.fetch_document(url))?;
        // The endpoint may ignore some parameters, so filter locally as well
        Ok(document.into_events(query))
    }

    fn describe(&self) -> String {
        format!("endpoint {}", self.endpoint)
    }
}
