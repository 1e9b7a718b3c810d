//! Telemetry submitter integration tests
//!
//! These tests run the submitter against a mock backend and verify the
//! request shape, the single-attempt policy and how failures are reported.

use reqwest::StatusCode;
use visitor_beacon::config::{EndpointConfig, PLACEHOLDER_URL};
use visitor_beacon::telemetry::{SubmitError, Submission, TelemetrySubmitter};
use visitor_beacon::visitor::{DeviceType, VisitorRecord};
use wiremock::matchers::{any, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to build a fully populated record
fn sample_record() -> VisitorRecord {
    VisitorRecord {
        timestamp: "2025-02-14T19:30:00.000Z".to_string(),
        device_type: DeviceType::Mobile,
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148".to_string(),
        language: "en-US".to_string(),
        platform: "iPhone".to_string(),
        screen_resolution: "390x844".to_string(),
        window_size: "390x664".to_string(),
        timezone: "Europe/Lisbon".to_string(),
        referrer: String::new(),
        url: "https://proposal.example/".to_string(),
        ip: "203.0.113.7".to_string(),
    }
}

fn submitter_for(endpoint: EndpointConfig) -> TelemetrySubmitter {
    TelemetrySubmitter::new(visitor_beacon::http_client().unwrap(), endpoint)
}

#[tokio::test]
async fn test_submit_posts_once_with_supabase_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/visitors"))
        .and(header("apikey", "abc"))
        .and(header("authorization", "Bearer abc"))
        .and(header("content-type", "application/json"))
        .and(header("prefer", "return=minimal"))
        .and(body_partial_json(serde_json::json!({
            "device_type": "mobile",
            "screen_resolution": "390x844",
            "ip": "203.0.113.7",
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let submitter = submitter_for(EndpointConfig::new(server.uri(), "abc"));
    let result = submitter.submit(sample_record()).await;

    assert_eq!(
        result.unwrap(),
        Submission::Delivered {
            status: StatusCode::CREATED
        }
    );
}

#[tokio::test]
async fn test_body_is_the_flat_record() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/visitors"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let record = sample_record();
    submitter_for(EndpointConfig::new(server.uri(), "abc"))
        .submit(record.clone())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: VisitorRecord = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body, record);
}

#[tokio::test]
async fn test_unconfigured_endpoint_makes_no_calls() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    // URL set but no key
    let result = submitter_for(EndpointConfig::new(server.uri(), ""))
        .submit(sample_record())
        .await;
    assert_eq!(result.unwrap(), Submission::Skipped);

    let result = submitter_for(EndpointConfig::new(PLACEHOLDER_URL, "abc"))
        .submit(sample_record())
        .await;
    assert_eq!(result.unwrap(), Submission::Skipped);

    let result = submitter_for(EndpointConfig::new("", ""))
        .submit(sample_record())
        .await;
    assert_eq!(result.unwrap(), Submission::Skipped);
}

#[tokio::test]
async fn test_non_success_status_returns_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/visitors"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .expect(1)
        .mount(&server)
        .await;

    let result = submitter_for(EndpointConfig::new(server.uri(), "wrong"))
        .submit(sample_record())
        .await;

    match result {
        Err(SubmitError::Rejected { status, body }) => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, "Invalid API key");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let result = submitter_for(EndpointConfig::new(server.uri(), "abc"))
        .submit(sample_record())
        .await;

    assert!(matches!(
        result,
        Err(SubmitError::Rejected { status, .. }) if status == StatusCode::SERVICE_UNAVAILABLE
    ));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    // Bind then drop a listener so the port is known to be closed.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let submitter = submitter_for(EndpointConfig::new(format!("http://{addr}"), "abc"));
    assert_eq!(submitter.endpoint().api_key, "abc");

    let result = submitter.submit(sample_record()).await;
    assert!(matches!(result, Err(SubmitError::Network(_))));
}
