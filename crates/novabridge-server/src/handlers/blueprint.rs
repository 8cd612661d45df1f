//! Blueprint handlers.

use std::sync::Arc;

use axum::extract::State;
use novabridge_host::BlueprintHost;
use serde_json::json;

use super::asset::DEFAULT_CONTENT_PATH;
use crate::json::Fields;
use crate::response::{ApiResult, ok};
use crate::state::AppState;

/// Parent class used when the request names none.
pub const DEFAULT_PARENT_CLASS: &str = "Actor";

// ---------------------------------------------------------------------------
// POST /nova/blueprint/create
// ---------------------------------------------------------------------------

/// Create a blueprint asset.
pub async fn create(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let name = body.required("name")?.to_owned();
    let path = body.str_or("path", DEFAULT_CONTENT_PATH)?.to_owned();
    let parent = body.str_or("parent_class", DEFAULT_PARENT_CLASS)?.to_owned();
    let info = state
        .run(move |s| Ok(s.host_mut().create_blueprint(&name, &path, &parent)?))
        .await?;
    ok(&json!({ "path": info.path, "parent_class": info.parent_class }))
}

// ---------------------------------------------------------------------------
// POST /nova/blueprint/add-component
// ---------------------------------------------------------------------------

/// Add a component node to a blueprint's construction script.
pub async fn add_component(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let blueprint = body.required("blueprint")?.to_owned();
    let class = body.required("component_class")?.to_owned();
    let component_name = body
        .str("component_name")?
        .filter(|n| !n.is_empty())
        .map(str::to_owned);
    let (blueprint, component) = state
        .run(move |s| {
            let component = s.host_mut().add_blueprint_component(
                &blueprint,
                &class,
                component_name.as_deref(),
            )?;
            Ok((blueprint, component))
        })
        .await?;
    ok(&json!({ "blueprint": blueprint, "component": component }))
}

// ---------------------------------------------------------------------------
// POST /nova/blueprint/compile
// ---------------------------------------------------------------------------

/// Compile a blueprint.
pub async fn compile(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let blueprint = body.required("blueprint")?.to_owned();
    let info = state
        .run(move |s| Ok(s.host_mut().compile_blueprint(&blueprint)?))
        .await?;
    ok(&json!({ "path": info.path, "compiled": info.compiled }))
}
