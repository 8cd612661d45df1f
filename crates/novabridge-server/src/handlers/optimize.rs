//! Optimization handlers: Nanite, LODs, Lumen, texture limits, and
//! collision.

use std::sync::Arc;

use axum::extract::State;
use novabridge_host::{CollisionKind, LumenQuality, OptimizeHost};
use serde_json::json;

use super::asset::DEFAULT_CONTENT_PATH;
use crate::error::ApiError;
use crate::json::Fields;
use crate::response::{ApiResult, ok};
use crate::state::AppState;

/// LOD count when the request sets none.
pub const DEFAULT_NUM_LODS: i64 = 4;
/// Triangle reduction between consecutive LODs.
pub const DEFAULT_LOD_REDUCTION: f64 = 0.5;
/// Texture size cap when the request sets none.
pub const DEFAULT_MAX_TEXTURE_SIZE: i64 = 2048;

const LOD_RANGE: (i64, i64) = (1, 8);
const TEXTURE_SIZE_RANGE: (i64, i64) = (32, 8192);

/// The mesh named by `mesh_path`, or the actor whose mesh to use.
fn mesh_target(body: &Fields) -> Result<(Option<String>, Option<String>), ApiError> {
    let mesh = body.str("mesh_path")?.map(str::to_owned);
    let actor = body.str("actor_name")?.map(str::to_owned);
    Ok((mesh, actor))
}

fn num_lods(body: &Fields) -> Result<u32, ApiError> {
    let n = body.i64("num_lods")?.unwrap_or(DEFAULT_NUM_LODS);
    let (min, max) = LOD_RANGE;
    if !(min..=max).contains(&n) {
        return Err(ApiError::bad_request(format!(
            "num_lods must be between {min} and {max}"
        )));
    }
    u32::try_from(n).map_err(|_| ApiError::bad_request("num_lods is out of range"))
}

fn reduction(body: &Fields) -> Result<f64, ApiError> {
    let r = body.f64_or("reduction_per_level", DEFAULT_LOD_REDUCTION)?;
    if r > 0.0 && r < 1.0 {
        Ok(r)
    } else {
        Err(ApiError::bad_request(
            "reduction_per_level must be between 0 and 1 (exclusive)",
        ))
    }
}

fn max_texture_size(body: &Fields) -> Result<u32, ApiError> {
    let size = body.i64("max_size")?.unwrap_or(DEFAULT_MAX_TEXTURE_SIZE);
    let (min, max) = TEXTURE_SIZE_RANGE;
    u32::try_from(size)
        .ok()
        .filter(|s| (min..=max).contains(&i64::from(*s)) && s.is_power_of_two())
        .ok_or_else(|| {
            ApiError::bad_request(format!(
                "max_size must be a power of two between {min} and {max}"
            ))
        })
}

// ---------------------------------------------------------------------------
// POST /nova/optimize/nanite
// ---------------------------------------------------------------------------

/// Turn Nanite on or off for a mesh, named directly or via an actor.
pub async fn nanite(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let (mesh, actor) = mesh_target(&body)?;
    let enable = body.bool_or("enable", true)?;
    let mesh = state
        .run(move |s| {
            let mesh = s.resolve_mesh(mesh.as_deref(), actor.as_deref())?;
            s.host_mut().set_nanite(&mesh, enable)?;
            Ok(mesh)
        })
        .await?;
    ok(&json!({ "mesh_path": mesh, "nanite_enabled": enable }))
}

// ---------------------------------------------------------------------------
// POST /nova/optimize/lod
// ---------------------------------------------------------------------------

/// Regenerate a mesh's LOD chain.
pub async fn lod(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let (mesh, actor) = mesh_target(&body)?;
    let count = num_lods(&body)?;
    let step = reduction(&body)?;
    let (mesh, triangles) = state
        .run(move |s| {
            let mesh = s.resolve_mesh(mesh.as_deref(), actor.as_deref())?;
            let triangles = s.host_mut().set_lods(&mesh, count, step)?;
            Ok((mesh, triangles))
        })
        .await?;
    ok(&json!({
        "mesh_path": mesh,
        "num_lods": count,
        "reduction_per_level": step,
        "lod_triangles": triangles,
    }))
}

// ---------------------------------------------------------------------------
// POST /nova/optimize/lumen
// ---------------------------------------------------------------------------

/// Configure Lumen global illumination for the project.
pub async fn lumen(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let enabled = body.bool_or("enabled", true)?;
    let raw = body.str_or("quality", "high")?;
    let quality = LumenQuality::parse(raw).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Unsupported quality: {raw}. Supported: low, medium, high, epic"
        ))
    })?;
    let settings = state
        .run(move |s| Ok(s.host_mut().set_lumen(enabled, quality)?))
        .await?;
    ok(&settings)
}

// ---------------------------------------------------------------------------
// GET /nova/optimize/stats
// ---------------------------------------------------------------------------

/// Scene and content statistics.
pub async fn stats(State(state): State<Arc<AppState>>) -> ApiResult {
    let stats = state.run(|s| Ok(s.host().scene_stats())).await?;
    ok(&stats)
}

// ---------------------------------------------------------------------------
// POST /nova/optimize/textures
// ---------------------------------------------------------------------------

/// Cap texture size and set compression for every texture under `path`.
pub async fn textures(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let path = body.str_or("path", DEFAULT_CONTENT_PATH)?.to_owned();
    let max_size = max_texture_size(&body)?;
    let compression = body.str_or("compression", "default")?.to_owned();
    let (path, compression, modified) = state
        .run(move |s| {
            let modified = s
                .host_mut()
                .set_texture_limits(&path, max_size, &compression)?;
            Ok((path, compression, modified))
        })
        .await?;
    ok(&json!({
        "path": path,
        "max_size": max_size,
        "compression": compression,
        "textures_modified": modified,
    }))
}

// ---------------------------------------------------------------------------
// POST /nova/optimize/collision
// ---------------------------------------------------------------------------

/// Replace a mesh's collision setup.
pub async fn collision(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let (mesh, actor) = mesh_target(&body)?;
    let raw = body.str_or("type", "complex")?;
    let kind = CollisionKind::parse(raw).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Unsupported collision type: {raw}. Supported: simple, complex, box, sphere, capsule"
        ))
    })?;
    let mesh = state
        .run(move |s| {
            let mesh = s.resolve_mesh(mesh.as_deref(), actor.as_deref())?;
            s.host_mut().set_collision(&mesh, kind)?;
            Ok(mesh)
        })
        .await?;
    ok(&json!({ "mesh_path": mesh, "collision_type": kind }))
}
