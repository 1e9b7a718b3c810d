//! Telemetry submission to the hosted REST backend

pub mod submitter;

pub use submitter::{SubmitError, Submission, TelemetrySubmitter};
