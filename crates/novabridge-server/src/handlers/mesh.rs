//! Static mesh handlers: raw geometry, statistics, and primitives.

use std::sync::Arc;

use axum::extract::State;
use novabridge_core::mesh::{self, Primitive};
use novabridge_host::{AssetHost, MeshData, MeshVertex};
use novabridge_types::{Vec2, Vec3};
use serde_json::{Value, json};

use super::Params;
use super::asset::DEFAULT_CONTENT_PATH;
use crate::error::ApiError;
use crate::json::Fields;
use crate::response::{ApiResult, ok};
use crate::state::AppState;

/// Primitive edge length / diameter when the request sets none.
pub const DEFAULT_PRIMITIVE_SIZE: f64 = 100.0;

fn item(value: &Value, what: &str, index: usize) -> Result<Fields, ApiError> {
    match value {
        Value::Object(map) => Ok(Fields::from_map(map.clone())),
        _ => Err(ApiError::bad_request(format!("{what} {index} must be an object"))),
    }
}

fn parse_vertex(value: &Value, index: usize) -> Result<MeshVertex, ApiError> {
    let v = item(value, "Vertex", index)?;
    let position = v.axes(["x", "y", "z"])?.resolve(Vec3::ZERO);
    let uv = if v.contains("u") || v.contains("v") {
        Some(Vec2::new(v.f64_or("u", 0.0)?, v.f64_or("v", 0.0)?))
    } else {
        None
    };
    let normal = if ["nx", "ny", "nz"].iter().any(|k| v.contains(k)) {
        Some(v.axes(["nx", "ny", "nz"])?.resolve(Vec3::ZERO))
    } else {
        None
    };
    Ok(MeshVertex {
        position,
        uv,
        normal,
    })
}

fn parse_index(t: &Fields, key: &str, triangle: usize) -> Result<u32, ApiError> {
    let raw = t.i64(key)?.ok_or_else(|| {
        ApiError::bad_request(format!("Triangle {triangle} is missing '{key}'"))
    })?;
    u32::try_from(raw).map_err(|_| {
        ApiError::bad_request(format!("Triangle {triangle} has an invalid index {raw}"))
    })
}

fn parse_triangle(value: &Value, index: usize) -> Result<[u32; 3], ApiError> {
    let t = item(value, "Triangle", index)?;
    Ok([
        parse_index(&t, "i0", index)?,
        parse_index(&t, "i1", index)?,
        parse_index(&t, "i2", index)?,
    ])
}

/// Parse `vertices` and `triangles` and check every index.
///
/// # Errors
///
/// [`ApiError::BadRequest`] for malformed entries, an empty mesh, or an
/// index past the vertex list.
pub fn parse_mesh(body: &Fields) -> Result<MeshData, ApiError> {
    let vertices = body
        .array("vertices")?
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, v)| parse_vertex(v, i))
        .collect::<Result<Vec<_>, _>>()?;
    let triangles = body
        .array("triangles")?
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, t)| parse_triangle(t, i))
        .collect::<Result<Vec<_>, _>>()?;
    let data = MeshData {
        vertices,
        triangles,
    };
    mesh::validate(&data)?;
    Ok(data)
}

// ---------------------------------------------------------------------------
// POST /nova/mesh/create
// ---------------------------------------------------------------------------

/// Build a static mesh from raw vertices and triangles.
pub async fn create(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let name = body.required("name")?.to_owned();
    let path = body.str_or("path", DEFAULT_CONTENT_PATH)?.to_owned();
    let data = parse_mesh(&body)?;
    let (vertices, triangles) = (data.vertices.len(), data.triangles.len());
    let asset = state
        .run(move |s| Ok(s.host_mut().create_mesh(&name, &path, &data)?))
        .await?;
    ok(&json!({
        "path": asset.path,
        "vertices": vertices,
        "triangles": triangles,
    }))
}

// ---------------------------------------------------------------------------
// GET|POST /nova/mesh/get
// ---------------------------------------------------------------------------

/// LOD and geometry counts of a static mesh.
pub async fn get(State(state): State<Arc<AppState>>, query: Params, body: Fields) -> ApiResult {
    let body = body.with_query(query.0);
    let path = body.required("path")?.to_owned();
    let stats = state.run(move |s| Ok(s.host().mesh_stats(&path)?)).await?;
    ok(&stats)
}

// ---------------------------------------------------------------------------
// POST /nova/mesh/primitive
// ---------------------------------------------------------------------------

/// Generate a cube, plane, sphere, or cylinder mesh asset.
pub async fn primitive(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let kind = body.required("type")?.to_ascii_lowercase();
    let shape = Primitive::parse(&kind)?;
    let size = body.f64_or("size", DEFAULT_PRIMITIVE_SIZE)?;
    let data = shape.generate(size)?;
    let name = body.str_or("name", &kind)?.to_owned();
    let path = body.str_or("path", DEFAULT_CONTENT_PATH)?.to_owned();
    let (vertices, triangles) = (data.vertices.len(), data.triangles.len());

    let asset = state
        .run(move |s| Ok(s.host_mut().create_mesh(&name, &path, &data)?))
        .await?;
    ok(&json!({
        "path": asset.path,
        "type": kind,
        "size": size,
        "vertices": vertices,
        "triangles": triangles,
    }))
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
    fn parses_optional_uv_and_normal() {
        let mesh = parse_mesh(&body(json!({
            "vertices": [
                {"x": 0, "y": 0, "z": 0, "u": 0.5},
                {"x": 1, "y": 0, "z": 0, "nz": 1},
                {"x": 0, "y": 1, "z": 0},
            ],
            "triangles": [{"i0": 0, "i1": 1, "i2": 2}],
        })))
        .unwrap();
        assert_eq!(mesh.vertices[0].uv, Some(Vec2::new(0.5, 0.0)));
        assert_eq!(mesh.vertices[0].normal, None);
        assert_eq!(mesh.vertices[1].normal, Some(Vec3::new(0.0, 0.0, 1.0)));
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let err = parse_mesh(&body(json!({
            "vertices": [{"x": 0}, {"x": 1}, {"x": 2}],
            "triangles": [{"i0": 0, "i1": 1, "i2": 3}],
        })))
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert!(err.to_string().contains("vertex 3"));
    }

    #[test]
    fn rejects_negative_and_missing_indices() {
        let negative = body(json!({
            "vertices": [{"x": 0}],
            "triangles": [{"i0": -1, "i1": 0, "i2": 0}],
        }));
        assert!(parse_mesh(&negative).is_err());
        let missing = body(json!({
            "vertices": [{"x": 0}],
            "triangles": [{"i0": 0, "i1": 0}],
        }));
        assert_eq!(
            parse_mesh(&missing).unwrap_err().to_string(),
            "Triangle 0 is missing 'i2'"
        );
    }

    #[test]
    fn rejects_empty_meshes() {
        assert!(parse_mesh(&Fields::default()).is_err());
    }
}
