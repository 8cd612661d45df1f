//! Procedural generation handlers. Every route answers 501 when the
//! host was built without the procedural subsystem.

use std::sync::Arc;

use axum::extract::State;
use novabridge_host::SceneHost;
use novabridge_types::Vec3;
use serde_json::json;

use crate::error::ApiError;
use crate::json::Fields;
use crate::response::{ApiResult, ok};
use crate::state::AppState;

/// Volume extent used for axes the request leaves out.
pub const DEFAULT_VOLUME_SIZE: Vec3 = Vec3::new(5000.0, 5000.0, 1000.0);

// ---------------------------------------------------------------------------
// GET /nova/pcg/list-graphs
// ---------------------------------------------------------------------------

/// Object paths of every procedural graph asset.
pub async fn list_graphs(State(state): State<Arc<AppState>>) -> ApiResult {
    let graphs = state.run(|s| Ok(s.procedural()?.list_graphs())).await?;
    ok(&json!({ "count": graphs.len(), "graphs": graphs }))
}

// ---------------------------------------------------------------------------
// POST /nova/pcg/create-volume
// ---------------------------------------------------------------------------

/// Spawn a volume that runs a graph over a box centred at `x, y, z`.
pub async fn create_volume(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let graph = body.required("graph_path")?.to_owned();
    let location = body.axes(["x", "y", "z"])?.resolve(Vec3::ZERO);
    let size = body
        .axes(["size_x", "size_y", "size_z"])?
        .resolve(DEFAULT_VOLUME_SIZE);
    let label = body.str("label")?.filter(|l| !l.is_empty()).map(str::to_owned);

    let actor = state
        .run(move |s| {
            let id = s
                .procedural()?
                .create_volume(&graph, location, size, label.as_deref())?;
            Ok(s.host().actor(id).map(|a| (a.name, a.label)))
        })
        .await?;
    let (name, label) = actor.unwrap_or_default();
    ok(&json!({
        "actor_name": name,
        "label": label,
        "location": location,
        "size": size,
    }))
}

// ---------------------------------------------------------------------------
// POST /nova/pcg/generate
// ---------------------------------------------------------------------------

/// Run generation on a volume, regenerating by default.
pub async fn generate(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let name = body.required("actor_name")?.to_owned();
    let seed = body.i64("seed")?;
    let force = body.bool_or("force_regenerate", true)?;
    let (name, points) = state
        .run(move |s| {
            let actor = s.require_actor(&name)?;
            let points = s.procedural()?.generate(actor.id, seed, force)?;
            Ok((actor.name, points))
        })
        .await?;
    ok(&json!({ "actor_name": name, "points": points, "seed": seed }))
}

// ---------------------------------------------------------------------------
// POST /nova/pcg/set-param
// ---------------------------------------------------------------------------

/// Override one graph parameter on a volume.
pub async fn set_param(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let name = body.required("actor_name")?.to_owned();
    let param = body.required("param_name")?.to_owned();
    let value = body
        .text("value")?
        .ok_or_else(|| ApiError::bad_request("Missing 'value' parameter"))?;
    let param_type = body.str("param_type")?.map(str::to_owned);

    let echo = (param.clone(), value.clone());
    let name = state
        .run(move |s| {
            let actor = s.require_actor(&name)?;
            s.procedural()?
                .set_graph_param(actor.id, &param, &value, param_type.as_deref())?;
            Ok(actor.name)
        })
        .await?;
    ok(&json!({ "actor_name": name, "param_name": echo.0, "value": echo.1 }))
}

// ---------------------------------------------------------------------------
// POST /nova/pcg/cleanup
// ---------------------------------------------------------------------------

/// Remove generated content from a volume.
pub async fn cleanup(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let name = body.required("actor_name")?.to_owned();
    let name = state
        .run(move |s| {
            let actor = s.require_actor(&name)?;
            s.procedural()?.cleanup(actor.id)?;
            Ok(actor.name)
        })
        .await?;
    ok(&json!({ "actor_name": name }))
}
