pub mod beacon;
pub mod config;
pub mod consent;
pub mod telemetry;
pub mod visitor;

pub use beacon::{run_page_load, BeaconOutcome};
pub use config::{ConfigSource, EndpointConfig};
pub use telemetry::{SubmitError, Submission, TelemetrySubmitter};
pub use visitor::{ClientEnvironment, VisitorCollector, VisitorRecord};

/// User agent sent on every outgoing request
pub const USER_AGENT: &str = concat!("visitor-beacon/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client. No request timeout is configured.
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().user_agent(USER_AGENT).build()
}

/// Render an error and its sources as `outer: cause: root`
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
