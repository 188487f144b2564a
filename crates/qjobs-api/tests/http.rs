//! HTTP-layer tests. Opt in with `cargo test -- --ignored` against a
//! Redis reachable at `REDIS_URL` (see `qjobs-engine`'s lifecycle tests
//! for the same convention).

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use qjobs_api::AppState;
use qjobs_engine::QueueEngine;
use qjobs_metrics::MetricsSink;
use qjobs_store::StoreClient;
use tower::ServiceExt;

async fn test_state() -> AppState {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/15".into());
    let store = StoreClient::connect(&url, 4).await.expect("connect to test redis");
    let mut conn = store.pool().get().await.unwrap();
    let _: () = redis::cmd("FLUSHDB").query_async(&mut *conn).await.unwrap();
    AppState::new(store.clone(), QueueEngine::new(store.clone()), MetricsSink::new(store))
}

#[tokio::test]
#[ignore = "requires a running redis reachable at REDIS_URL"]
async fn health_returns_ok_status() {
    let app = qjobs_api::router(test_state().await);
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
#[ignore = "requires a running redis reachable at REDIS_URL"]
async fn enqueue_then_fetch_job_round_trips() {
    let app = qjobs_api::router(test_state().await);
    let post_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/jobs")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"type":"echo","payload":{"msg":"hi"}}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(post_response.status(), StatusCode::OK);
    let body = post_response.into_body().collect().await.unwrap().to_bytes();
    let created: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let get_response = app
        .oneshot(Request::builder().uri(format!("/jobs/{id}")).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(get_response.status(), StatusCode::OK);
    let body = get_response.into_body().collect().await.unwrap().to_bytes();
    let fetched: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(fetched["id"], id);
    assert_eq!(fetched["status"], "queued");
}

#[tokio::test]
#[ignore = "requires a running redis reachable at REDIS_URL"]
async fn enqueue_rejects_unknown_priority() {
    let app = qjobs_api::router(test_state().await);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/jobs")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"type":"echo","priority":"urgent"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "requires a running redis reachable at REDIS_URL"]
async fn queues_reports_scheduled_size_for_delayed_job() {
    let app = qjobs_api::router(test_state().await);
    let post_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/jobs")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"type":"echo","delay_sec":30.0}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(post_response.status(), StatusCode::OK);

    let queues_response = app
        .oneshot(Request::builder().uri("/queues").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(queues_response.status(), StatusCode::OK);
    let body = queues_response.into_body().collect().await.unwrap().to_bytes();
    let queues: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(queues["sizes"]["scheduled"], 1);
    assert_eq!(queues["sizes"]["default"], 0);
    assert!(queues["peek"]["deadletter"].as_array().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires a running redis reachable at REDIS_URL"]
async fn recent_wraps_entries_under_a_recent_key() {
    let app = qjobs_api::router(test_state().await);
    let post_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/jobs")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"type":"echo","payload":{"msg":"hi"}}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(post_response.status(), StatusCode::OK);
    let body = post_response.into_body().collect().await.unwrap().to_bytes();
    let created: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let recent_response = app
        .oneshot(Request::builder().uri("/recent").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(recent_response.status(), StatusCode::OK);
    let body = recent_response.into_body().collect().await.unwrap().to_bytes();
    let recent: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let entries = recent["recent"].as_array().expect("recent must be a JSON array under a `recent` key");
    assert!(entries.iter().any(|entry| entry["id"] == id));
}

#[tokio::test]
#[ignore = "requires a running redis reachable at REDIS_URL"]
async fn unknown_job_id_returns_404() {
    let app = qjobs_api::router(test_state().await);
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/jobs/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
