//! Request handlers.
//!
//! Each handler validates its parameters, fans out to the AWS query layer,
//! and wraps the result in its response envelope. When credentials are
//! rejected upstream the handler degrades to a canned payload with a warning
//! instead of an error; dropping the request (client disconnect) drops the
//! handler future and aborts outstanding upstream calls with it.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use super::params::{parse_unused_for_days, parse_window, WindowParams};
use super::{error_response, mock, AppState};
use crate::aws::{cost, iam, tagging};
use crate::checkers::run_checkers;
use crate::error::DevcostError;
use crate::models::TimeWindow;

pub async fn health() -> Response {
    Json(json!({
        "status": "healthy",
        "message": "DevCost API is running",
    }))
    .into_response()
}

pub async fn project_costs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WindowParams>,
) -> Response {
    let window = match parse_window(params.start.as_deref(), params.end.as_deref()) {
        Ok(w) => w,
        Err(e) => return error_response(e),
    };
    match cost::project_costs(&state.clients, &window).await {
        Ok(costs) => Json(json!({ "projects": costs })).into_response(),
        Err(e) if e.is_auth_failure() => {
            warn!("falling back to mock project costs: {e}");
            Json(json!({
                "projects": mock::project_costs(),
                "warning": mock::MOCK_WARNING,
            }))
            .into_response()
        }
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct TagCostParams {
    pub tag_key: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

pub async fn tag_costs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TagCostParams>,
) -> Response {
    let Some(tag_key) = params.tag_key.filter(|k| !k.is_empty()) else {
        return error_response(DevcostError::validation("tag_key is required"));
    };
    let window = match parse_window(params.start.as_deref(), params.end.as_deref()) {
        Ok(w) => w,
        Err(e) => return error_response(e),
    };

    let cache_key = tag_cost_cache_key(&tag_key, &window);
    if let Some(cache) = &state.cache {
        if let Some(cached) = cache.get::<Vec<crate::models::TagCost>>(&cache_key).await {
            return Json(json!({ "tag_costs": cached })).into_response();
        }
    }

    match cost::tag_costs(&state.clients, state.resolver.as_ref(), &tag_key, &window).await {
        Ok(costs) => {
            if let Some(cache) = &state.cache {
                cache.put(&cache_key, &costs).await;
            }
            Json(json!({ "tag_costs": costs })).into_response()
        }
        Err(e) if e.is_auth_failure() => {
            warn!("falling back to mock tag costs: {e}");
            Json(json!({
                "tag_costs": mock::tag_costs(&tag_key),
                "warning": mock::MOCK_WARNING,
            }))
            .into_response()
        }
        Err(e) => error_response(e),
    }
}

fn tag_cost_cache_key(tag_key: &str, window: &TimeWindow) -> String {
    format!(
        "tag_costs:{tag_key}:{}:{}",
        window.start_date(),
        window.end_date()
    )
}

pub async fn users(State(state): State<Arc<AppState>>) -> Response {
    match iam::list_usernames(&state.clients.iam).await {
        Ok(usernames) => Json(json!({ "users": usernames })).into_response(),
        Err(e) if e.is_auth_failure() => {
            warn!("falling back to mock users: {e}");
            Json(json!({
                "users": mock::users(),
                "warning": mock::MOCK_WARNING,
            }))
            .into_response()
        }
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ResourcesByTagParams {
    pub tag_key: Option<String>,
    pub tag_value: Option<String>,
}

pub async fn resources_by_tag(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResourcesByTagParams>,
) -> Response {
    let (tag_key, tag_value) = match (
        params.tag_key.filter(|k| !k.is_empty()),
        params.tag_value.filter(|v| !v.is_empty()),
    ) {
        (Some(k), Some(v)) => (k, v),
        _ => {
            return error_response(DevcostError::validation(
                "tag_key and tag_value are required",
            ));
        }
    };

    match tagging::resources_by_tag(&state.clients, &tag_key, &tag_value).await {
        Ok(resources) => Json(json!({ "resources": resources })).into_response(),
        Err(e) if e.is_auth_failure() => {
            warn!("falling back to mock resources: {e}");
            Json(json!({
                "resources": mock::resources(),
                "warning": mock::MOCK_WARNING,
            }))
            .into_response()
        }
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct UnusedResourcesParams {
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(rename = "unusedForDays")]
    pub unused_for_days: Option<String>,
}

pub async fn unused_resources(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UnusedResourcesParams>,
) -> Response {
    let unused_for_days = match parse_unused_for_days(params.unused_for_days.as_deref()) {
        Ok(d) => d,
        Err(e) => return error_response(e),
    };
    let window = match parse_window(params.start.as_deref(), params.end.as_deref()) {
        Ok(w) => w,
        Err(e) => return error_response(e),
    };

    match run_checkers(&state.checkers, &window, unused_for_days).await {
        Ok(resources) => Json(json!({ "unused_resources": resources })).into_response(),
        Err(e) if e.is_auth_failure() => {
            warn!("falling back to mock unused resources: {e}");
            Json(json!({
                "unused_resources": mock::unused_resources(),
                "warning": mock::MOCK_WARNING,
            }))
            .into_response()
        }
        Err(e) => error_response(e),
    }
}
