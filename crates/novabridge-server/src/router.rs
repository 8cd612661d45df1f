//! Route Table and router construction.
//!
//! [`RouteTable`] binds each application path with its verbs and adds
//! a pre-flight `OPTIONS` responder for the same path. The bound routes
//! are recorded in the [`RouteRegistry`] so `/nova/health` can report
//! how many are live and shutdown can unbind them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use axum::Router;
use axum::handler::Handler;
use axum::middleware;
use axum::routing::{MethodFilter, MethodRouter, get, on, post};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth;
use crate::handlers::{
    asset, blueprint, material, mesh, optimize, pcg, scene, sequencer, stream, system, viewport,
};
use crate::response::{self, ApiResult};
use crate::state::AppState;
use crate::ws;

/// One bound application route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// Request path.
    pub path: &'static str,
    /// Verbs the path answers, excluding the pre-flight `OPTIONS`.
    pub methods: &'static [&'static str],
}

/// Application routes currently bound.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: RwLock<Vec<RouteInfo>>,
    bound: AtomicBool,
}

impl RouteRegistry {
    /// Record `routes` as live.
    pub fn bind(&self, routes: Vec<RouteInfo>) {
        *self.routes.write().unwrap_or_else(|p| p.into_inner()) = routes;
        self.bound.store(true, Ordering::Release);
    }

    /// Unbind every route. Returns how many were bound.
    pub fn unbind_all(&self) -> usize {
        self.bound.store(false, Ordering::Release);
        let mut routes = self.routes.write().unwrap_or_else(|p| p.into_inner());
        let count = routes.len();
        routes.clear();
        count
    }

    /// Number of bound routes.
    pub fn count(&self) -> usize {
        self.routes.read().map_or_else(|p| p.into_inner().len(), |r| r.len())
    }

    /// Whether routes are bound and requests should be served.
    pub fn is_bound(&self) -> bool {
        self.bound.load(Ordering::Acquire)
    }

    /// Snapshot of the bound routes.
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.routes.read().map_or_else(|p| p.into_inner().clone(), |r| r.clone())
    }
}

/// Builder pairing each path with its verbs and a pre-flight responder.
#[derive(Debug)]
pub struct RouteTable {
    router: Router<Arc<AppState>>,
    routes: Vec<RouteInfo>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            routes: Vec::new(),
        }
    }

    fn bind(
        mut self,
        path: &'static str,
        methods: &'static [&'static str],
        route: MethodRouter<Arc<AppState>>,
    ) -> Self {
        self.router = self.router.route(path, route.options(preflight));
        self.routes.push(RouteInfo { path, methods });
        self
    }

    /// Bind a read-only `GET` route.
    #[must_use]
    pub fn get<H, T>(self, path: &'static str, handler: H) -> Self
    where
        H: Handler<T, Arc<AppState>>,
        T: 'static,
    {
        self.bind(path, &["GET"], get(handler))
    }

    /// Bind a mutating `POST` route.
    #[must_use]
    pub fn post<H, T>(self, path: &'static str, handler: H) -> Self
    where
        H: Handler<T, Arc<AppState>>,
        T: 'static,
    {
        self.bind(path, &["POST"], post(handler))
    }

    /// Bind a route answering both `GET` and `POST`.
    #[must_use]
    pub fn get_post<H, T>(self, path: &'static str, handler: H) -> Self
    where
        H: Handler<T, Arc<AppState>>,
        T: 'static,
    {
        self.bind(
            path,
            &["GET", "POST"],
            on(MethodFilter::GET.or(MethodFilter::POST), handler),
        )
    }

    /// Number of application routes bound so far.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether nothing is bound yet.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The router and the list of bound routes.
    pub fn into_parts(self) -> (Router<Arc<AppState>>, Vec<RouteInfo>) {
        (self.router, self.routes)
    }
}

/// Answer a pre-flight request. CORS headers are added by the layer.
async fn preflight() -> ApiResult {
    response::ok_empty()
}

/// Every application route under `/nova`.
pub fn api_routes() -> RouteTable {
    RouteTable::new()
        // System
        .get("/nova/health", system::health)
        .get("/nova/project/info", system::project_info)
        .post("/nova/build/lighting", system::build_lighting)
        .post("/nova/exec/command", system::exec_command)
        // Scene
        .get("/nova/scene/list", scene::list)
        .post("/nova/scene/spawn", scene::spawn)
        .post("/nova/scene/delete", scene::delete)
        .post("/nova/scene/transform", scene::transform)
        .get_post("/nova/scene/get", scene::get)
        .post("/nova/scene/set-property", scene::set_property)
        // Assets
        .get_post("/nova/asset/list", asset::list)
        .post("/nova/asset/create", asset::create)
        .post("/nova/asset/duplicate", asset::duplicate)
        .post("/nova/asset/delete", asset::delete)
        .post("/nova/asset/rename", asset::rename)
        .get_post("/nova/asset/info", asset::info)
        .post("/nova/asset/import", asset::import)
        // Meshes
        .post("/nova/mesh/create", mesh::create)
        .get_post("/nova/mesh/get", mesh::get)
        .post("/nova/mesh/primitive", mesh::primitive)
        // Materials
        .post("/nova/material/create", material::create)
        .post("/nova/material/set-param", material::set_param)
        .get_post("/nova/material/get", material::get)
        .post("/nova/material/create-instance", material::create_instance)
        // Viewport
        .get("/nova/viewport/screenshot", viewport::screenshot)
        .post("/nova/viewport/camera/set", viewport::camera_set)
        .get("/nova/viewport/camera/get", viewport::camera_get)
        // Blueprints
        .post("/nova/blueprint/create", blueprint::create)
        .post("/nova/blueprint/add-component", blueprint::add_component)
        .post("/nova/blueprint/compile", blueprint::compile)
        // Stream control
        .post("/nova/stream/start", stream::start)
        .post("/nova/stream/stop", stream::stop)
        .post("/nova/stream/config", stream::config)
        .get("/nova/stream/status", stream::status)
        // Procedural generation
        .get("/nova/pcg/list-graphs", pcg::list_graphs)
        .post("/nova/pcg/create-volume", pcg::create_volume)
        .post("/nova/pcg/generate", pcg::generate)
        .post("/nova/pcg/set-param", pcg::set_param)
        .post("/nova/pcg/cleanup", pcg::cleanup)
        // Sequencer
        .post("/nova/sequencer/create", sequencer::create)
        .post("/nova/sequencer/add-track", sequencer::add_track)
        .post("/nova/sequencer/set-keyframe", sequencer::set_keyframe)
        .post("/nova/sequencer/play", sequencer::play)
        .post("/nova/sequencer/stop", sequencer::stop)
        .post("/nova/sequencer/scrub", sequencer::scrub)
        .post("/nova/sequencer/render", sequencer::render)
        .get("/nova/sequencer/info", sequencer::info)
        // Optimization
        .post("/nova/optimize/nanite", optimize::nanite)
        .post("/nova/optimize/lod", optimize::lod)
        .post("/nova/optimize/lumen", optimize::lumen)
        .get("/nova/optimize/stats", optimize::stats)
        .post("/nova/optimize/textures", optimize::textures)
        .post("/nova/optimize/collision", optimize::collision)
}

/// Build the HTTP control router and bind its routes in `state`.
///
/// Layers, innermost first: the Auth Gate, the CORS headers, request
/// tracing. Unknown paths get a JSON 404 that passes through the same
/// layers.
pub fn build_router(state: Arc<AppState>) -> Router {
    let (router, routes) = api_routes().into_parts();
    let route_count = routes.len();
    state.routes.bind(routes);
    info!(route_count, port = state.port, "NovaBridge routes bound");

    router
        .fallback(system::not_found)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_api_key,
        ))
        .layer(response::cors_layers())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the stream router: a `WebSocket` upgrade at `/` and `/stream`.
pub fn stream_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(ws::ws_stream))
        .route("/stream", get(ws::ws_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_table_counts_application_routes() {
        let table = api_routes();
        assert_eq!(table.len(), 53);
        let (_, routes) = table.into_parts();
        assert!(routes.iter().all(|r| r.path.starts_with("/nova/")));
        let both: Vec<_> = routes
            .iter()
            .filter(|r| r.methods.len() == 2)
            .map(|r| r.path)
            .collect();
        assert_eq!(
            both,
            [
                "/nova/scene/get",
                "/nova/asset/list",
                "/nova/asset/info",
                "/nova/mesh/get",
                "/nova/material/get",
            ]
        );
    }

    #[test]
    fn unbind_resets_the_count() {
        let registry = RouteRegistry::default();
        let (_, routes) = api_routes().into_parts();
        registry.bind(routes);
        assert!(registry.is_bound());
        assert_eq!(registry.count(), 53);
        assert_eq!(registry.unbind_all(), 53);
        assert_eq!(registry.count(), 0);
        assert!(!registry.is_bound());
    }
}
