//! Material handlers: base materials, instances, and parameters.

use std::sync::Arc;

use axum::extract::State;
use novabridge_host::{MaterialHost, MaterialInfo, MaterialParam};
use serde_json::{Map, Value, json};

use super::Params;
use super::asset::DEFAULT_CONTENT_PATH;
use crate::error::ApiError;
use crate::json::Fields;
use crate::response::{ApiResult, ok};
use crate::state::AppState;

fn param_json(param: &MaterialParam) -> Value {
    match param {
        MaterialParam::Scalar(v) => json!(v),
        MaterialParam::Vector(c) => json!({ "r": c.r, "g": c.g, "b": c.b, "a": c.a }),
    }
}

fn info_json(info: &MaterialInfo) -> Value {
    let parameters: Map<String, Value> = info
        .parameters
        .iter()
        .map(|(name, param)| (name.clone(), param_json(param)))
        .collect();
    json!({
        "path": info.path,
        "class": info.class,
        "parameters": parameters,
    })
}

/// Read the `type` and `value` of a set-param request.
fn parse_param(body: &Fields) -> Result<MaterialParam, ApiError> {
    let kind = body.str_or("type", "scalar")?.to_ascii_lowercase();
    match kind.as_str() {
        "scalar" => body
            .f64("value")?
            .map(MaterialParam::Scalar)
            .ok_or_else(|| ApiError::bad_request("Missing 'value' parameter")),
        "vector" => body
            .color("value")?
            .map(MaterialParam::Vector)
            .ok_or_else(|| ApiError::bad_request("Missing 'value' parameter")),
        other => Err(ApiError::bad_request(format!(
            "Unsupported parameter type: {other}. Supported: scalar, vector"
        ))),
    }
}

// ---------------------------------------------------------------------------
// POST /nova/material/create
// ---------------------------------------------------------------------------

/// Create a base material, optionally with a constant base color.
pub async fn create(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let name = body.required("name")?.to_owned();
    let path = body.str_or("path", DEFAULT_CONTENT_PATH)?.to_owned();
    let color = body.color("color")?;
    let asset = state
        .run(move |s| Ok(s.host_mut().create_material(&name, &path, color)?))
        .await?;
    ok(&json!({ "path": asset.path }))
}

// ---------------------------------------------------------------------------
// POST /nova/material/set-param
// ---------------------------------------------------------------------------

/// Override a scalar or vector parameter on a material instance.
pub async fn set_param(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let path = body.required("path")?.to_owned();
    let param = body.required("param")?.to_owned();
    let value = parse_param(&body)?;
    let (path, param) = state
        .run(move |s| {
            s.host_mut().set_material_param(&path, &param, value)?;
            Ok((path, param))
        })
        .await?;
    ok(&json!({ "path": path, "param": param, "value": param_json(&value) }))
}

// ---------------------------------------------------------------------------
// GET|POST /nova/material/get
// ---------------------------------------------------------------------------

/// Material class and, for instances, parameter overrides.
pub async fn get(State(state): State<Arc<AppState>>, query: Params, body: Fields) -> ApiResult {
    let body = body.with_query(query.0);
    let path = body.required("path")?.to_owned();
    let info = state.run(move |s| Ok(s.host().material_info(&path)?)).await?;
    ok(&info_json(&info))
}

// ---------------------------------------------------------------------------
// POST /nova/material/create-instance
// ---------------------------------------------------------------------------

/// Create a material instance of `parent`.
pub async fn create_instance(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let parent = body.required("parent")?.to_owned();
    let name = body.required("name")?.to_owned();
    let path = body.str_or("path", DEFAULT_CONTENT_PATH)?.to_owned();
    let asset = state
        .run(move |s| {
            Ok(s.host_mut()
                .create_material_instance(&parent, &name, &path)?)
        })
        .await?;
    ok(&json!({ "path": asset.path }))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use novabridge_types::LinearColor;

    use super::*;

    fn body(value: Value) -> Fields {
        match value {
            Value::Object(map) => Fields::from_map(map),
            _ => Fields::default(),
        }
    }

    #[test]
    fn scalar_is_the_default_type() {
        let param = parse_param(&body(json!({"value": 0.25}))).unwrap();
        assert_eq!(param, MaterialParam::Scalar(0.25));
    }

    #[test]
    fn vector_values_are_colors() {
        let param = parse_param(&body(json!({
            "type": "Vector",
            "value": {"r": 1, "g": 0, "b": 0}
        })))
        .unwrap();
        assert_eq!(
            param,
            MaterialParam::Vector(LinearColor::new(1.0, 0.0, 0.0, 1.0))
        );
    }

    #[test]
    fn unknown_types_are_rejected() {
        let err = parse_param(&body(json!({"type": "texture", "value": 1}))).unwrap_err();
        assert!(err.to_string().starts_with("Unsupported parameter type: texture"));
    }

    #[test]
    fn vector_params_render_as_objects() {
        let value = param_json(&MaterialParam::Vector(LinearColor::new(0.0, 0.5, 1.0, 1.0)));
        assert_eq!(value, json!({"r": 0.0, "g": 0.5, "b": 1.0, "a": 1.0}));
    }
}
