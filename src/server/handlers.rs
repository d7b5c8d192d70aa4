//! HTTP request handlers.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use super::AppState;
use crate::core::resource::{CachePolicy, Resource, ResourceRequest};
use crate::proxy::{ProxyResponse, proxy};

pub async fn proxy_resource(
    resource: Resource,
    State(state): State<Arc<AppState>>,
    ticker: Option<String>,
    query: HashMap<String, String>,
) -> Response {
    let mut request = ResourceRequest::new(resource).with_query_map(query);
    request.ticker = ticker;

    into_response(proxy(state.upstream.as_ref(), &request).await)
}

fn into_response(response: ProxyResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CACHE_CONTROL, response.cache_control),
        ],
        response.body,
    )
        .into_response()
}

/// JSON answer for a request whose path or query could not be decoded.
pub fn invalid_request(resource: Resource, reason: String) -> Response {
    warn!(%resource, %reason, "Rejected malformed request");
    into_response(ProxyResponse {
        status: StatusCode::BAD_REQUEST.as_u16(),
        body: json!({ "error": "Invalid request", "detail": reason }).to_string(),
        cache_control: CachePolicy::NoStore.header_value(),
        fallback: true,
    })
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
