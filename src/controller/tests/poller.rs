use std::time::Duration;

use wiremock::{MockServer, ResponseTemplate};

use super::{
    POLL_INTERVAL, status_body, status_mock, status_query_count, submit_success, test_artifact,
    test_controller,
};
use crate::options::OptionsForm;
use crate::types::{Event, JobStatus, NotificationKind};

#[tokio::test]
async fn transport_failures_never_advance_the_state_machine() {
    let server = MockServer::start().await;
    submit_success("abc").mount(&server).await;
    // Two network-level failures, then COMPLETED
    status_mock("abc", ResponseTemplate::new(500).set_body_string("boom"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    status_mock("abc", status_body("COMPLETED")).mount(&server).await;

    let controller = test_controller(&server);
    controller.select(test_artifact()).unwrap();
    let session = controller.submit(&OptionsForm::default()).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), session.cancelled())
        .await
        .expect("session should reach a terminal state");

    // Exactly N+1 queries: the two failures plus the successful one
    assert_eq!(status_query_count(&server, "abc").await, 3);
    let snapshot = controller.progress().borrow().clone();
    assert_eq!(snapshot.status, Some(JobStatus::Completed));
    assert!(snapshot.terminal);
}

#[tokio::test]
async fn terminal_states_stop_the_timer() {
    let server = MockServer::start().await;
    submit_success("abc").mount(&server).await;
    status_mock("abc", status_body("COMPLETED")).mount(&server).await;

    let controller = test_controller(&server);
    controller.select(test_artifact()).unwrap();
    let session = controller.submit(&OptionsForm::default()).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), session.cancelled())
        .await
        .expect("session should reach a terminal state");
    let queries_at_terminal = status_query_count(&server, "abc").await;
    assert_eq!(queries_at_terminal, 1);

    // Leave the controller alive over several more intervals
    tokio::time::sleep(POLL_INTERVAL * 5).await;
    assert_eq!(status_query_count(&server, "abc").await, queries_at_terminal);

    // The terminal session also released the slot
    assert!(controller.current_session().is_none());
}

#[tokio::test]
async fn cancellation_stops_polling_and_is_idempotent() {
    let server = MockServer::start().await;
    submit_success("abc").mount(&server).await;
    status_mock("abc", status_body("PENDING")).mount(&server).await;

    let controller = test_controller(&server);
    controller.select(test_artifact()).unwrap();
    let session = controller.submit(&OptionsForm::default()).await.unwrap();

    // Let a few polls happen, then cancel twice
    tokio::time::sleep(POLL_INTERVAL * 3).await;
    session.cancel();
    session.cancel();

    tokio::time::sleep(POLL_INTERVAL).await;
    let queries_at_cancel = status_query_count(&server, "abc").await;
    assert!(queries_at_cancel >= 1);

    tokio::time::sleep(POLL_INTERVAL * 5).await;
    assert_eq!(status_query_count(&server, "abc").await, queries_at_cancel);
}

#[tokio::test]
async fn progress_is_monotone_even_when_states_alternate() {
    let server = MockServer::start().await;
    submit_success("abc").mount(&server).await;
    status_mock("abc", status_body("PROCESSING"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // The backend briefly reports PENDING again before completing
    status_mock("abc", status_body("PENDING"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    status_mock("abc", status_body("COMPLETED")).mount(&server).await;

    let controller = test_controller(&server);
    let mut events = controller.subscribe();
    controller.select(test_artifact()).unwrap();
    let session = controller.submit(&OptionsForm::default()).await.unwrap();

    let mut saw_regression = false;
    let mut last_percent = 0u8;
    let wait = async {
        loop {
            if let Ok(event) = events.recv().await {
                let percent = controller.progress().borrow().percent;
                if percent < last_percent {
                    saw_regression = true;
                }
                last_percent = percent;
                if matches!(event, Event::Completed { .. }) {
                    break;
                }
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("job should complete");
    session.cancelled().await;

    assert!(!saw_regression, "progress percentage regressed");
    assert_eq!(controller.progress().borrow().percent, 100);
}

#[tokio::test]
async fn logs_are_replaced_wholesale_and_blank_filtered() {
    let server = MockServer::start().await;
    submit_success("abc").mount(&server).await;
    status_mock(
        "abc",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "status": "PROCESSING",
            "logs": "loading classes\n\ntransforming\n"
        })),
    )
    .up_to_n_times(1)
    .mount(&server)
    .await;
    status_mock(
        "abc",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "status": "COMPLETED",
            "logs": "step1\nstep2\n"
        })),
    )
    .mount(&server)
    .await;

    let controller = test_controller(&server);
    controller.select(test_artifact()).unwrap();
    let session = controller.submit(&OptionsForm::default()).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), session.cancelled())
        .await
        .expect("session should reach a terminal state");

    // The final blob replaced the earlier lines entirely
    let snapshot = controller.progress().borrow().clone();
    assert_eq!(snapshot.log_lines, vec!["step1", "step2"]);
}

#[tokio::test]
async fn failed_jobs_surface_the_backend_diagnostic() {
    let server = MockServer::start().await;
    submit_success("xyz").mount(&server).await;
    status_mock(
        "xyz",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "status": "FAILED",
            "errorMessage": "bad bytecode"
        })),
    )
    .mount(&server)
    .await;

    let controller = test_controller(&server);
    let mut events = controller.subscribe();
    controller.select(test_artifact()).unwrap();
    let session = controller.submit(&OptionsForm::default()).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), session.cancelled())
        .await
        .expect("session should reach a terminal state");

    let snapshot = controller.progress().borrow().clone();
    assert_eq!(snapshot.status, Some(JobStatus::Failed));
    assert!(snapshot.terminal);
    assert_eq!(snapshot.percent, 100);
    assert_eq!(snapshot.diagnostic.as_deref(), Some("bad bytecode"));

    assert!(
        controller
            .notifications()
            .active()
            .iter()
            .any(|n| n.kind == NotificationKind::Error && n.message == "bad bytecode")
    );

    // A Failed event fired and no retrieval surfaced
    let mut saw_failed = false;
    while let Ok(event) = events.try_recv() {
        match event {
            Event::Failed { message, .. } => {
                assert_eq!(message, "bad bytecode");
                saw_failed = true;
            }
            Event::Completed { .. } | Event::AutoRetrieve { .. } => {
                panic!("retrieval must not be exposed for a failed job")
            }
            _ => {}
        }
    }
    assert!(saw_failed);
}

#[tokio::test]
async fn failed_jobs_without_a_diagnostic_report_unknown_error() {
    let server = MockServer::start().await;
    submit_success("xyz").mount(&server).await;
    status_mock("xyz", status_body("FAILED")).mount(&server).await;

    let controller = test_controller(&server);
    controller.select(test_artifact()).unwrap();
    let session = controller.submit(&OptionsForm::default()).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), session.cancelled())
        .await
        .expect("session should reach a terminal state");

    assert!(
        controller
            .notifications()
            .active()
            .iter()
            .any(|n| n.kind == NotificationKind::Error && n.message == "Unknown error")
    );
}

#[tokio::test]
async fn completion_schedules_one_auto_retrieve_trigger() {
    let server = MockServer::start().await;
    submit_success("abc").mount(&server).await;
    status_mock("abc", status_body("COMPLETED")).mount(&server).await;

    let controller = test_controller(&server);
    let mut events = controller.subscribe();
    controller.select(test_artifact()).unwrap();
    controller.submit(&OptionsForm::default()).await.unwrap();

    let mut completed_at = None;
    let wait = async {
        loop {
            match events.recv().await {
                Ok(Event::Completed { download_url, .. }) => {
                    assert!(download_url.ends_with("/download/abc"));
                    completed_at = Some(tokio::time::Instant::now());
                }
                Ok(Event::AutoRetrieve { job_id, url }) => {
                    assert_eq!(job_id.as_str(), "abc");
                    assert!(url.ends_with("/download/abc"));
                    break;
                }
                _ => {}
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("auto-retrieve should fire");

    // The trigger fired after the configured delay, not immediately
    let elapsed = completed_at.expect("Completed precedes AutoRetrieve").elapsed();
    assert!(elapsed >= Duration::from_millis(20));

    // Exactly one trigger
    tokio::time::sleep(Duration::from_millis(100)).await;
    let mut extra_triggers = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, Event::AutoRetrieve { .. }) {
            extra_triggers += 1;
        }
    }
    assert_eq!(extra_triggers, 0);
}
