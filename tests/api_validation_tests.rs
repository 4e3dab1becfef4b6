//! Handler validation tests.
//!
//! Requests are driven through the router with `tower::ServiceExt::oneshot`.
//! No checkers are registered and no AWS endpoint is reachable, so these
//! exercise exactly the paths that must reject or answer before any upstream
//! call is made.

use std::sync::Arc;

use aws_config::BehaviorVersion;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use devcost::api::{router, AppState};
use devcost::aws::iam::IamCreatorResolver;
use devcost::aws::AwsClients;

fn test_router() -> Router {
    let sdk_config = aws_config::SdkConfig::builder()
        .behavior_version(BehaviorVersion::latest())
        .build();
    let clients = AwsClients::new(&sdk_config);
    let resolver = Arc::new(IamCreatorResolver::new(clients.iam.clone()));
    router(Arc::new(AppState {
        clients,
        checkers: Vec::new(),
        resolver,
        cache: None,
    }))
}

async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
    let response = test_router()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

#[tokio::test]
async fn test_health_reports_healthy() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["message"], "DevCost API is running");
}

#[tokio::test]
async fn test_unused_resources_rejects_lone_start_date() {
    let (status, body) = get("/resources/unused?start=2025-05-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Both start and end dates must be provided together"
    );
}

#[tokio::test]
async fn test_unused_resources_rejects_lone_end_date() {
    let (status, body) = get("/resources/unused?end=2025-05-07").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Both start and end dates must be provided together"
    );
}

#[tokio::test]
async fn test_unused_resources_rejects_reversed_dates() {
    let (status, body) = get("/resources/unused?start=2025-05-07&end=2025-05-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "End date must be after start date");
}

#[tokio::test]
async fn test_unused_resources_rejects_malformed_dates() {
    let (status, body) = get("/resources/unused?start=05-01-2025&end=2025-05-07").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid start date format, use YYYY-MM-DD");

    let (status, body) = get("/resources/unused?start=2025-05-01&end=garbage").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid end date format, use YYYY-MM-DD");
}

#[tokio::test]
async fn test_unused_resources_rejects_bad_unused_for_days() {
    for uri in [
        "/resources/unused?unusedForDays=0",
        "/resources/unused?unusedForDays=-3",
        "/resources/unused?unusedForDays=soon",
    ] {
        let (status, body) = get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Invalid unusedForDays, must be a positive integer"
        );
    }
}

#[tokio::test]
async fn test_unused_resources_empty_catalogue_returns_empty_list() {
    let (status, body) = get("/resources/unused").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unused_resources"], serde_json::json!([]));
    assert!(body.get("warning").is_none());
}

#[tokio::test]
async fn test_tag_costs_requires_tag_key() {
    let (status, body) = get("/costs/tag").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "tag_key is required");

    let (status, _) = get("/costs/tag?tag_key=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tag_costs_validates_dates_before_upstream() {
    let (status, body) = get("/costs/tag?tag_key=project&start=2025-05-07&end=2025-05-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "End date must be after start date");
}

#[tokio::test]
async fn test_project_costs_validates_dates() {
    let (status, body) = get("/costs/projects?start=2025-05-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Both start and end dates must be provided together"
    );
}

#[tokio::test]
async fn test_resources_by_tag_requires_both_params() {
    for uri in [
        "/getresourcesbytag",
        "/getresourcesbytag?tag_key=project",
        "/getresourcesbytag?tag_value=dev-cluster",
        "/getresourcesbytag?tag_key=&tag_value=dev-cluster",
    ] {
        let (status, body) = get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "tag_key and tag_value are required");
    }
}
