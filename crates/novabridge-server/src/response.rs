//! Success envelopes and CORS headers.
//!
//! Every success body is a JSON object carrying `"status": "ok"` next
//! to the handler's own fields. CORS headers are attached to every
//! response, errors included, by [`cors_layers`].

use axum::Json;
use axum::http::{HeaderName, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Map, Value};
use tower::ServiceBuilder;
use tower::layer::util::{Identity, Stack};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::error::ApiError;

/// Methods advertised to browsers.
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
/// Request headers advertised to browsers.
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-API-Key";
/// Pre-flight cache lifetime in seconds.
pub const MAX_AGE_SECS: &str = "86400";

/// Result type of every handler.
pub type ApiResult = Result<Response, ApiError>;

/// Wrap `body` in the success envelope.
///
/// Objects gain a `status` field; any other value is nested under
/// `result`.
///
/// # Errors
///
/// [`ApiError::Internal`] when `body` cannot be serialized.
pub fn ok<T: Serialize>(body: &T) -> ApiResult {
    let value = serde_json::to_value(body)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize response: {e}")))?;
    let mut map = match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("result".to_owned(), other);
            map
        }
    };
    map.insert("status".to_owned(), Value::String("ok".to_owned()));
    Ok(Json(Value::Object(map)).into_response())
}

/// `{"status": "ok"}` and nothing else.
///
/// # Errors
///
/// Never fails in practice; shares [`ok`]'s signature.
pub fn ok_empty() -> ApiResult {
    ok(&Map::new())
}

type HeaderLayer = SetResponseHeaderLayer<HeaderValue>;

/// The CORS header stack.
pub type CorsLayers =
    Stack<HeaderLayer, Stack<HeaderLayer, Stack<HeaderLayer, Stack<HeaderLayer, Identity>>>>;

fn overriding(name: HeaderName, value: &'static str) -> HeaderLayer {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

/// Layers that stamp the CORS headers on every response.
pub fn cors_layers() -> ServiceBuilder<CorsLayers> {
    ServiceBuilder::new()
        .layer(overriding(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .layer(overriding(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS))
        .layer(overriding(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS))
        .layer(overriding(header::ACCESS_CONTROL_MAX_AGE, MAX_AGE_SECS))
}
