use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::EndpointConfig;
use crate::visitor::VisitorRecord;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("request to telemetry backend failed")]
    Network(#[source] reqwest::Error),
    #[error("telemetry backend rejected visitor data: {status} {body}")]
    Rejected { status: StatusCode, body: String },
}

/// Terminal state of a submission attempt that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Endpoint not configured, nothing was sent
    Skipped,
    Delivered { status: StatusCode },
}

/// Posts visitor records to the `visitors` table, once each.
#[derive(Clone)]
pub struct TelemetrySubmitter {
    client: Client,
    endpoint: EndpointConfig,
}

impl TelemetrySubmitter {
    pub fn new(client: Client, endpoint: EndpointConfig) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// Send `record` in a single POST.
    ///
    /// The record is consumed: there is no retry and nothing is kept for a
    /// later attempt.
    pub async fn submit(&self, record: VisitorRecord) -> Result<Submission, SubmitError> {
        if !self.endpoint.is_configured() {
            info!(
                url = %self.endpoint.url,
                api_key = if self.endpoint.api_key.is_empty() { "Not set" } else { "Set" },
                "Telemetry endpoint not configured. Skipping data save."
            );
            return Ok(Submission::Skipped);
        }

        let url = self.endpoint.visitors_url();
        let key = self.endpoint.api_key.as_str();
        debug!(%url, ?record, "Sending visitor data");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header("apikey", key)
            .bearer_auth(key)
            .header("Prefer", "return=minimal")
            .json(&record)
            .send()
            .await
            .map_err(SubmitError::Network)?;

        let status = response.status();
        debug!(%status, headers = ?response.headers(), "Telemetry backend responded");

        if !status.is_success() {
            // An unreadable error body still counts as a rejection.
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Rejected { status, body });
        }

        Ok(Submission::Delivered { status })
    }
}
