//! The Auth Gate.
//!
//! When an API key is configured, every request must present it in
//! `X-API-Key` or as `Authorization: Bearer <key>`. Pre-flight
//! `OPTIONS` requests and the health probe pass without one. The gate
//! also turns every request away with 503 once routes are unbound
//! during shutdown.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Paths reachable without a key.
const EXEMPT_PATHS: &[&str] = &["/nova/health"];

/// Keys presented by a request, trimmed, in header order of precedence.
pub fn presented_keys(headers: &HeaderMap) -> impl Iterator<Item = &str> {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let (scheme, token) = v.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then_some(token.trim())
        });
    api_key.into_iter().chain(bearer).filter(|k| !k.is_empty())
}

/// Whether `headers` carry `expected`.
pub fn is_authorized(headers: &HeaderMap, expected: &str) -> bool {
    presented_keys(headers).any(|k| k == expected)
}

/// Middleware enforcing the API key.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }
    if !state.routes.is_bound() {
        return ApiError::ShuttingDown.into_response();
    }
    if EXEMPT_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }
    if let Some(expected) = state.api_key() {
        if !is_authorized(request.headers(), expected) {
            warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "rejected request without a valid API key"
            );
            return ApiError::Unauthorized.into_response();
        }
    }
    next.run(request).await
}
