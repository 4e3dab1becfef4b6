//! HTTP surface: routing, shared state, and the error-to-status mapping.

pub mod handlers;
pub mod mock;
pub mod params;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

use crate::aws::iam::CreatorResolver;
use crate::aws::AwsClients;
use crate::cache::Cache;
use crate::checkers::ResourceChecker;
use crate::error::DevcostError;

/// Everything the handlers need, built once at startup. Service clients are
/// reused across requests; per-request state does not exist.
pub struct AppState {
    pub clients: AwsClients,
    pub checkers: Vec<Arc<dyn ResourceChecker>>,
    pub resolver: Arc<dyn CreatorResolver>,
    pub cache: Option<Cache>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/costs/projects", get(handlers::project_costs))
        .route("/costs/tag", get(handlers::tag_costs))
        .route("/users", get(handlers::users))
        .route("/getresourcesbytag", get(handlers::resources_by_tag))
        .route("/resources/unused", get(handlers::unused_resources))
        .with_state(state)
}

/// Map an error to its HTTP response. Auth failures never reach this point;
/// handlers intercept them for the mock-data fallback first.
pub(crate) fn error_response(err: DevcostError) -> Response {
    let status = match &err {
        DevcostError::Validation(_) | DevcostError::TagNotActive { .. } => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_400() {
        let response = error_response(DevcostError::validation("tag_key is required"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_tag_not_active_maps_to_400() {
        let response = error_response(DevcostError::TagNotActive {
            tag_key: "team".to_string(),
        });
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_maps_to_500() {
        let response = error_response(DevcostError::Aws("throttled".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
