//! Viewport handlers: offscreen screenshots and the virtual camera.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderName, header};
use axum::response::IntoResponse;
use novabridge_core::codec;
use novabridge_core::session::CameraUpdate;
use serde_json::{Value, json};

use super::Params;
use crate::error::ApiError;
use crate::json::Fields;
use crate::response::{ApiResult, ok};
use crate::state::AppState;

/// Response header carrying the PNG width for binary screenshots.
pub const WIDTH_HEADER: &str = "x-novabridge-width";
/// Response header carrying the PNG height for binary screenshots.
pub const HEIGHT_HEADER: &str = "x-novabridge-height";

/// A requested dimension; zero or negative keeps the current size.
fn dimension(value: Option<i64>) -> Option<u32> {
    value
        .filter(|v| *v > 0)
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
}

// ---------------------------------------------------------------------------
// GET /nova/viewport/screenshot
// ---------------------------------------------------------------------------

/// Capture the viewport from the virtual camera as PNG.
///
/// `format=png` or `format=raw` returns the PNG bytes with the size in
/// `X-NovaBridge-Width` / `X-NovaBridge-Height`; anything else returns
/// base64 inside the JSON envelope.
pub async fn screenshot(State(state): State<Arc<AppState>>, query: Params) -> ApiResult {
    let params = Fields::default().with_query(query.0);
    let width = dimension(params.i64("width")?);
    let height = dimension(params.i64("height")?);
    let binary = matches!(
        params.str("format")?.map(str::to_ascii_lowercase).as_deref(),
        Some("png" | "raw")
    );

    let shot = state
        .run(move |s| {
            let size = if width.is_some() || height.is_some() {
                let (current_w, current_h) = s.viewport().size();
                Some((width.unwrap_or(current_w), height.unwrap_or(current_h)))
            } else {
                None
            };
            Ok(s.screenshot(size)?)
        })
        .await?;

    if binary {
        return Ok((
            [
                (header::CONTENT_TYPE, "image/png".to_owned()),
                (HeaderName::from_static(WIDTH_HEADER), shot.width.to_string()),
                (HeaderName::from_static(HEIGHT_HEADER), shot.height.to_string()),
            ],
            shot.png,
        )
            .into_response());
    }
    ok(&json!({
        "image": codec::to_base64(&shot.png),
        "width": shot.width,
        "height": shot.height,
        "format": "png",
    }))
}

// ---------------------------------------------------------------------------
// POST /nova/viewport/camera/set
// ---------------------------------------------------------------------------

/// Parse a camera update. Show flags with non-boolean values are kept
/// with `None` so they can be reported back as unknown.
fn parse_camera(body: &Fields) -> Result<CameraUpdate, ApiError> {
    let fov = body.f64("fov")?;
    if let Some(fov) = fov {
        if !fov.is_finite() || fov <= 0.0 || fov >= 180.0 {
            return Err(ApiError::bad_request(
                "fov must be between 0 and 180 degrees",
            ));
        }
    }
    let show_flags = body.object("show_flags")?.map(|flags| {
        flags
            .keys()
            .map(|name| {
                let enabled = match flags.value(name) {
                    Some(Value::Bool(b)) => Some(*b),
                    _ => None,
                };
                (name.clone(), enabled)
            })
            .collect()
    });
    Ok(CameraUpdate {
        location: body.partial_vec3("location")?,
        rotation: body.partial_rotator("rotation")?,
        fov,
        show_flags,
    })
}

/// Move the virtual camera and toggle capture show flags.
pub async fn camera_set(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let update = parse_camera(&body)?;
    let report = state.run(move |s| Ok(s.set_camera(&update)?)).await?;
    ok(&report)
}

// ---------------------------------------------------------------------------
// GET /nova/viewport/camera/get
// ---------------------------------------------------------------------------

/// Current camera pose and viewport capture size.
pub async fn camera_get(State(state): State<Arc<AppState>>) -> ApiResult {
    let report = state.run(|s| Ok(s.camera_report())).await?;
    ok(&report)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn body(value: Value) -> Fields {
        match value {
            Value::Object(map) => Fields::from_map(map),
            _ => Fields::default(),
        }
    }

    #[test]
    fn non_positive_dimensions_keep_the_current_size() {
        assert_eq!(dimension(Some(0)), None);
        assert_eq!(dimension(Some(-5)), None);
        assert_eq!(dimension(Some(320)), Some(320));
        assert_eq!(dimension(None), None);
    }

    #[test]
    fn non_boolean_show_flags_are_marked_unknown() {
        let update = parse_camera(&body(json!({
            "location": {"z": 1000},
            "fov": 60,
            "show_flags": {"Fog": false, "Grid": "yes"}
        })))
        .unwrap();
        assert_eq!(update.location.z, Some(1000.0));
        assert_eq!(update.fov, Some(60.0));
        assert_eq!(
            update.show_flags.unwrap(),
            vec![("Fog".to_owned(), Some(false)), ("Grid".to_owned(), None)]
        );
    }

    #[test]
    fn fov_must_be_a_sensible_angle() {
        assert!(parse_camera(&body(json!({"fov": 0}))).is_err());
        assert!(parse_camera(&body(json!({"fov": 200}))).is_err());
        assert!(parse_camera(&body(json!({"fov": "wide"}))).is_err());
    }
}
