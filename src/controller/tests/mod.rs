//! Controller test suite, organized by stage:
//! - [`select`] - selection gate, auto-detect wiring
//! - [`submit`] - submission path and session replacement
//! - [`poller`] - polling engine state machine

mod poller;
mod select;

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::Config;
use crate::controller::ObfuscatorController;
use crate::types::Artifact;

/// Short timings so scenario tests complete quickly in real time.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub(crate) fn test_controller(server: &MockServer) -> ObfuscatorController {
    ObfuscatorController::new(Config {
        base_url: format!("{}/api", server.uri()),
        poll_interval: POLL_INTERVAL,
        auto_retrieve_delay: Duration::from_millis(20),
        // Long enough that entries never expire mid-test
        notification_ttl: Duration::from_secs(60),
        ..Config::default()
    })
    .expect("test config is valid")
}

pub(crate) fn test_artifact() -> Artifact {
    Artifact::from_bytes("app.jar", b"PK\x03\x04test".to_vec())
}

/// Mock accepting a submission with the given job id.
pub(crate) fn submit_success(job_id: &str) -> Mock {
    Mock::given(method("POST"))
        .and(path("/api/obfuscate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "jobId": job_id,
            "status": "PENDING",
            "message": "Obfuscation job started"
        })))
}

/// Response template for a status query answering with `status`.
pub(crate) fn status_body(status: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "success": true,
        "status": status
    }))
}

/// Mock answering status queries for `job_id` with `template`.
pub(crate) fn status_mock(job_id: &str, template: ResponseTemplate) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/api/status/{job_id}")))
        .respond_with(template)
}

/// Number of status queries the server has seen for `job_id`.
pub(crate) async fn status_query_count(server: &MockServer, job_id: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == format!("/api/status/{job_id}"))
        .count()
}
