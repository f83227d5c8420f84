use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{test_artifact, test_controller};
use crate::error::Error;
use crate::types::{Artifact, Event, NotificationKind};

#[tokio::test]
async fn rejection_pushes_an_error_notification_and_keeps_prior_selection() {
    let server = MockServer::start().await;
    let controller = test_controller(&server);

    controller.select(test_artifact()).unwrap();
    let err = controller
        .select(Artifact::from_bytes("malware.exe", vec![1]))
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(
        controller.selector().selected_name().as_deref(),
        Some("app.jar")
    );

    let notifications = controller.notifications().active();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Error);
    assert!(notifications[0].message.contains("malware.exe"));
}

#[tokio::test]
async fn selection_emits_an_event_with_name_and_size() {
    let server = MockServer::start().await;
    let controller = test_controller(&server);
    let mut events = controller.subscribe();

    controller.select(test_artifact()).unwrap();

    match events.recv().await.unwrap() {
        Event::ArtifactSelected { name, size } => {
            assert_eq!(name, "app.jar");
            assert_eq!(size, 8);
        }
        other => panic!("expected ArtifactSelected, got {other:?}"),
    }
}

#[tokio::test]
async fn auto_detect_fills_an_untouched_scope_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "mainPackage": "com.acme.app",
            "mainClass": "com.acme.app.Main",
            "totalClasses": 42
        })))
        .mount(&server)
        .await;

    let controller = test_controller(&server);
    let mut events = controller.subscribe();
    controller.select(test_artifact()).unwrap();

    // ArtifactSelected first, then the detection lands
    loop {
        match tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("detection should arrive")
            .unwrap()
        {
            Event::ScopeDetected { package } => {
                assert_eq!(package, "com.acme.app");
                break;
            }
            _ => continue,
        }
    }

    assert_eq!(controller.scope_field().value(), "com.acme.app");
    assert!(!controller.scope_field().is_touched());
    assert!(
        controller
            .notifications()
            .active()
            .iter()
            .any(|n| n.kind == NotificationKind::Success && n.message.contains("com.acme.app"))
    );
}

#[tokio::test]
async fn late_detection_never_overwrites_a_user_edit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "success": true,
                    "mainPackage": "com.detected.app"
                }))
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;

    let controller = test_controller(&server);
    controller.select(test_artifact()).unwrap();

    // The user types before the detection response arrives
    controller.scope_field().set("com.typed.by.user");

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(controller.scope_field().value(), "com.typed.by.user");
}

#[tokio::test]
async fn detection_failure_is_silently_absorbed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(500).set_body_string("exploded"))
        .mount(&server)
        .await;

    let controller = test_controller(&server);
    controller.select(test_artifact()).unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    // Selection itself is unaffected and nothing error-ish surfaced
    assert_eq!(
        controller.selector().selected_name().as_deref(),
        Some("app.jar")
    );
    assert!(controller.notifications().is_empty());
    assert_eq!(controller.scope_field().value(), "");
}

#[tokio::test]
async fn a_new_selection_resets_the_scope_field() {
    let server = MockServer::start().await;
    let controller = test_controller(&server);

    controller.select(test_artifact()).unwrap();
    controller.scope_field().set("com.typed.by.user");

    controller
        .select(Artifact::from_bytes("other.jar", vec![1, 2]))
        .unwrap();
    assert_eq!(controller.scope_field().value(), "");
    assert!(!controller.scope_field().is_touched());
}
