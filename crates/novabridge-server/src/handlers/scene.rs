//! Scene handlers: list, spawn, delete, transform, inspect, and edit
//! actors in the active level.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use novabridge_core::sequencer::TransformOverride;
use novabridge_host::SceneHost;
use novabridge_types::{PartialRotator, Rotator, Transform, Vec3};
use serde_json::json;

use super::Params;
use crate::error::ApiError;
use crate::json::Fields;
use crate::response::{ApiResult, ok};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /nova/scene/list
// ---------------------------------------------------------------------------

/// Every actor in the active level.
pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult {
    let (actors, level) = state
        .run(|s| Ok((s.host().actors(), s.host().level_name())))
        .await?;
    ok(&json!({
        "count": actors.len(),
        "actors": actors,
        "level": level,
    }))
}

// ---------------------------------------------------------------------------
// POST /nova/scene/spawn
// ---------------------------------------------------------------------------

/// Spawn an actor by class name. Subject to the spawn rate window.
pub async fn spawn(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let class = body
        .require_str("class", "Missing required parameter: 'class'")?
        .to_owned();
    let location = body.axes(["x", "y", "z"])?.resolve(Vec3::ZERO);
    let rotation = PartialRotator {
        pitch: body.f64("pitch")?,
        yaw: body.f64("yaw")?,
        roll: body.f64("roll")?,
    }
    .resolve(Rotator::ZERO);
    let label = body.str("label")?.map(str::to_owned);
    let now = Instant::now();

    let actor = state
        .run(move |s| {
            Ok(s.spawn_actor(
                now,
                &class,
                Transform::at(location, rotation),
                label.as_deref(),
            )?)
        })
        .await?;
    ok(&actor)
}

// ---------------------------------------------------------------------------
// POST /nova/scene/delete
// ---------------------------------------------------------------------------

/// Destroy an actor. The capture proxies are refused.
pub async fn delete(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let name = body.required("name")?.to_owned();
    let deleted = state.run(move |s| Ok(s.delete_actor(&name)?)).await?;
    ok(&json!({ "deleted": deleted }))
}

// ---------------------------------------------------------------------------
// POST /nova/scene/transform
// ---------------------------------------------------------------------------

/// Override some axes of an actor's transform; the rest keep their value.
pub async fn transform(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let name = body.required("name")?.to_owned();
    let change = TransformOverride {
        location: body.partial_vec3("location")?,
        rotation: body.partial_rotator("rotation")?,
        scale: body.partial_vec3("scale")?,
    };
    let actor = state
        .run(move |s| Ok(s.transform_actor(&name, &change)?))
        .await?;
    ok(&actor)
}

// ---------------------------------------------------------------------------
// GET|POST /nova/scene/get
// ---------------------------------------------------------------------------

/// One actor with its properties and components.
pub async fn get(
    State(state): State<Arc<AppState>>,
    query: Params,
    body: Fields,
) -> ApiResult {
    let body = body.with_query(query.0);
    let name = body.required("name")?.to_owned();
    let detail = state.run(move |s| Ok(s.actor_detail(&name)?)).await?;
    ok(&detail)
}

// ---------------------------------------------------------------------------
// POST /nova/scene/set-property
// ---------------------------------------------------------------------------

/// Write a property on an actor or, with `Component.Property`, on one
/// of its components.
pub async fn set_property(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let name = body.required("name")?.to_owned();
    let property = body.required("property")?.to_owned();
    let value = body
        .text("value")?
        .ok_or_else(|| ApiError::bad_request("Missing 'value' parameter"))?;

    let (actor, property) = state
        .run(move |s| {
            s.set_property(&name, &property, &value)?;
            Ok((name, property))
        })
        .await?;
    ok(&json!({ "actor": actor, "property": property }))
}
