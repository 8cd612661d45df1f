//! Asset registry handlers: list, create, copy, move, delete, inspect,
//! and import.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use novabridge_host::AssetHost;
use serde_json::json;
use tracing::info;

use super::Params;
use crate::error::ApiError;
use crate::json::Fields;
use crate::response::{ApiResult, ok};
use crate::state::AppState;

/// Content root used when a request names no path.
pub const DEFAULT_CONTENT_PATH: &str = "/Game";
/// Import scale applied when the request sets none.
pub const DEFAULT_IMPORT_SCALE: f64 = 100.0;

// ---------------------------------------------------------------------------
// GET|POST /nova/asset/list
// ---------------------------------------------------------------------------

/// Assets under a content directory.
pub async fn list(State(state): State<Arc<AppState>>, query: Params, body: Fields) -> ApiResult {
    let body = body.with_query(query.0);
    let path = body.str_or("path", DEFAULT_CONTENT_PATH)?.to_owned();
    let assets = state.run(move |s| Ok(s.host().list_assets(&path))).await?;
    let assets: Vec<_> = assets
        .into_iter()
        .map(|a| {
            json!({
                "name": a.name,
                "path": a.path,
                "class": a.class,
                "package": a.package,
            })
        })
        .collect();
    ok(&json!({ "count": assets.len(), "assets": assets }))
}

// ---------------------------------------------------------------------------
// POST /nova/asset/create
// ---------------------------------------------------------------------------

/// Create an empty `Material` or `StaticMesh` asset.
pub async fn create(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let kind = body.required("type")?.to_owned();
    let name = body.required("name")?.to_owned();
    let path = body.str_or("path", DEFAULT_CONTENT_PATH)?.to_owned();
    let (asset, kind) = state
        .run(move |s| {
            let asset = s.host_mut().create_asset(&kind, &name, &path)?;
            Ok((asset, kind))
        })
        .await?;
    ok(&json!({ "path": asset.path, "type": kind }))
}

// ---------------------------------------------------------------------------
// POST /nova/asset/duplicate
// ---------------------------------------------------------------------------

/// Copy an asset to a new path.
pub async fn duplicate(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let source = body.required("source")?.to_owned();
    let destination = body.required("destination")?.to_owned();
    let asset = state
        .run(move |s| Ok(s.host_mut().duplicate_asset(&source, &destination)?))
        .await?;
    ok(&json!({ "path": asset.path }))
}

// ---------------------------------------------------------------------------
// POST /nova/asset/delete
// ---------------------------------------------------------------------------

/// Delete an asset.
pub async fn delete(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let path = body.required("path")?.to_owned();
    let deleted = state
        .run(move |s| {
            s.host_mut().delete_asset(&path)?;
            Ok(path)
        })
        .await?;
    ok(&json!({ "deleted": deleted }))
}

// ---------------------------------------------------------------------------
// POST /nova/asset/rename
// ---------------------------------------------------------------------------

/// Move an asset to a new path.
pub async fn rename(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let source = body.required("source")?.to_owned();
    let destination = body.required("destination")?.to_owned();
    let asset = state
        .run(move |s| Ok(s.host_mut().rename_asset(&source, &destination)?))
        .await?;
    ok(&json!({ "path": asset.path }))
}

// ---------------------------------------------------------------------------
// GET|POST /nova/asset/info
// ---------------------------------------------------------------------------

/// Details of one asset, including its registry tags.
pub async fn info(State(state): State<Arc<AppState>>, query: Params, body: Fields) -> ApiResult {
    let body = body.with_query(query.0);
    let path = body.required("path")?.to_owned();
    let asset = state.run(move |s| Ok(s.host().asset_info(&path)?)).await?;
    ok(&asset)
}

// ---------------------------------------------------------------------------
// POST /nova/asset/import
// ---------------------------------------------------------------------------

/// Import an `.obj` or `.fbx` file from disk.
///
/// The file checks run on the network side so a bad path never queues
/// work on the editor thread.
pub async fn import(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let file_path = body.require_str("file_path", "Missing 'file_path'")?.to_owned();
    let asset_name = body.str("asset_name")?.filter(|n| !n.is_empty()).map(str::to_owned);
    let destination = body.str_or("destination", DEFAULT_CONTENT_PATH)?.to_owned();
    let scale = body
        .f64("scale")
        .map_err(|_| invalid_scale())?
        .unwrap_or(DEFAULT_IMPORT_SCALE);

    let file = PathBuf::from(&file_path);
    if !tokio::fs::try_exists(&file).await.unwrap_or(false) {
        return Err(ApiError::bad_request(format!("File not found: {file_path}")));
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(invalid_scale());
    }
    let extension = file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    if !matches!(extension.as_deref(), Some("obj" | "fbx")) {
        return Err(ApiError::bad_request(
            "Unsupported file format. Supported: .obj, .fbx",
        ));
    }

    let dest = destination.clone();
    let report = state
        .run(move |s| Ok(s.host_mut().import_file(&file, &dest, asset_name.as_deref(), scale)?))
        .await?;
    info!(
        file = %file_path,
        format = %report.format,
        assets = report.imported_assets.len(),
        "file imported"
    );
    let asset_path = report
        .imported_assets
        .first()
        .cloned()
        .unwrap_or(destination);
    ok(&json!({
        "format": report.format,
        "imported_assets": report.imported_assets,
        "source_file": file_path,
        "asset_path": asset_path,
        "vertices": report.vertices,
        "triangles": report.triangles,
        "import_scale": scale,
    }))
}

fn invalid_scale() -> ApiError {
    ApiError::bad_request("Invalid 'scale'. Provide a positive number.")
}
