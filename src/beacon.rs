//! Page-load flow: collect one record, submit it, log the outcome.

use tracing::{error, info};

use crate::error_chain;
use crate::telemetry::{SubmitError, Submission, TelemetrySubmitter};
use crate::visitor::{ClientEnvironment, VisitorCollector, UNKNOWN};

/// What happened to the page-load record
#[derive(Debug)]
pub struct BeaconOutcome {
    pub ip_resolved: bool,
    pub result: Result<Submission, SubmitError>,
}

impl BeaconOutcome {
    pub fn delivered(&self) -> bool {
        matches!(self.result, Ok(Submission::Delivered { .. }))
    }
}

/// Run collect then submit, in that order, and log the result.
///
/// Telemetry failures never reach the caller as errors; the outcome is
/// returned as a value for inspection only.
pub async fn run_page_load(
    collector: &VisitorCollector,
    submitter: &TelemetrySubmitter,
    env: &ClientEnvironment,
) -> BeaconOutcome {
    let record = collector.collect(env).await;
    let ip_resolved = record.ip != UNKNOWN;

    let result = submitter.submit(record).await;
    log_submission(&result);

    BeaconOutcome {
        ip_resolved,
        result,
    }
}

pub fn log_submission(result: &Result<Submission, SubmitError>) {
    match result {
        // The submitter already reported the skip.
        Ok(Submission::Skipped) => {}
        Ok(Submission::Delivered { status }) => {
            info!(%status, "✅ Visitor data saved successfully");
        }
        Err(SubmitError::Rejected { status, body }) => {
            error!(%status, %body, "❌ Failed to save visitor data");
        }
        Err(SubmitError::Network(source)) => {
            error!(error = %error_chain(source), "❌ Telemetry backend unreachable, visitor data dropped");
        }
    }
}
