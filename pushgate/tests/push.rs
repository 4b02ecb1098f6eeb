//! Integration tests for the gateway client.

use std::time::Duration;

use http::{Method, StatusCode};
use prometheus::{Gauge, Registry};
use pushgate::push::{PushError, Pusher};
use pushgate::testing::MockGateway;

fn registry_with(values: &[(&str, f64)]) -> Registry {
    let registry = Registry::new();
    for (name, value) in values {
        let gauge = Gauge::new(*name, format!("help for {name}")).unwrap();
        gauge.set(*value);
        registry.register(Box::new(gauge)).unwrap();
    }
    registry
}

#[tokio::test]
async fn test_add_posts_text_format_to_job_path() {
    let gateway = MockGateway::start().await;
    let pusher = Pusher::new(&gateway.host(), "db_backup").unwrap();

    pusher
        .add(&registry_with(&[("db_backup_records_processed", 42.0)]).gather())
        .await
        .unwrap();

    let received = gateway.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].method, Method::POST);
    assert_eq!(received[0].path, "/metrics/job/db_backup");
    assert_eq!(received[0].content_type, "text/plain; version=0.0.4");
    assert!(received[0].body.contains("db_backup_records_processed 42"));
}

#[tokio::test]
async fn test_add_preserves_unlisted_metrics() {
    let gateway = MockGateway::start().await;
    let pusher = Pusher::new(&gateway.host(), "db_backup").unwrap();

    pusher
        .add(&registry_with(&[("kept_seconds", 1.0), ("updated_total", 1.0)]).gather())
        .await
        .unwrap();
    pusher
        .add(&registry_with(&[("updated_total", 2.0)]).gather())
        .await
        .unwrap();

    let path = "/metrics/job/db_backup";
    assert_eq!(gateway.value(path, "kept_seconds"), Some(1.0));
    assert_eq!(gateway.value(path, "updated_total"), Some(2.0));
}

#[tokio::test]
async fn test_push_replaces_group() {
    let gateway = MockGateway::start().await;
    let pusher = Pusher::new(&gateway.host(), "request_timing").unwrap();

    pusher
        .add(&registry_with(&[("stale_seconds", 9.0)]).gather())
        .await
        .unwrap();
    pusher
        .push(&registry_with(&[("request_duration_seconds", 0.0)]).gather())
        .await
        .unwrap();

    let received = gateway.received();
    assert_eq!(received[1].method, Method::PUT);
    assert_eq!(
        gateway.metric_names("/metrics/job/request_timing"),
        vec!["request_duration_seconds".to_string()]
    );
}

#[tokio::test]
async fn test_delete_removes_group() {
    let gateway = MockGateway::start().await;
    let pusher = Pusher::new(&gateway.host(), "db_backup").unwrap();

    pusher
        .add(&registry_with(&[("gone_seconds", 1.0)]).gather())
        .await
        .unwrap();
    pusher.delete().await.unwrap();

    assert_eq!(gateway.received()[1].method, Method::DELETE);
    assert!(gateway.metric_names("/metrics/job/db_backup").is_empty());
}

#[tokio::test]
async fn test_grouping_labels_in_path() {
    let gateway = MockGateway::start().await;
    let pusher = Pusher::new(&gateway.host(), "db_backup")
        .unwrap()
        .grouping("instance", "primary")
        .unwrap();

    pusher.add(&[]).await.unwrap();

    assert_eq!(
        gateway.received()[0].path,
        "/metrics/job/db_backup/instance/primary"
    );
}

#[tokio::test]
async fn test_accepted_status_is_success() {
    let gateway = MockGateway::with_status(StatusCode::ACCEPTED).await;
    let pusher = Pusher::new(&gateway.host(), "db_backup").unwrap();

    assert!(pusher.add(&[]).await.is_ok());
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let gateway = MockGateway::with_status(StatusCode::BAD_REQUEST).await;
    let pusher = Pusher::new(&gateway.host(), "db_backup").unwrap();

    let err = pusher.add(&[]).await.unwrap_err();
    match err {
        PushError::UnexpectedStatus { status, url, .. } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(url.ends_with("/metrics/job/db_backup"));
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_gateway_is_transport_error() {
    // Bind and immediately release a port so nothing is listening on it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let pusher = Pusher::new(&addr.to_string(), "db_backup").unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), pusher.add(&[]))
        .await
        .expect("push should fail fast against a closed port");

    assert!(matches!(result, Err(PushError::Transport(_))));
}
