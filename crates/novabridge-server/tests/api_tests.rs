//! Integration tests for the NovaBridge control API.
//!
//! Most tests drive the Axum `Router` directly via `tower::ServiceExt`
//! against a `MemoryEditor` host, without starting a TCP server. The
//! stream test starts a full [`Bridge`] on ephemeral ports.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use futures::StreamExt;
use novabridge_core::stream::StreamConfig;
use novabridge_core::{BridgeConfig, EditorSession, EditorThread, StreamHub};
use novabridge_host::MemoryEditor;
use novabridge_server::router::{api_routes, build_router};
use novabridge_server::startup::Bridge;
use novabridge_server::state::AppState;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    dir: TempDir,
}

fn make_app(api_key: Option<&str>, procedural: bool) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = BridgeConfig {
        project_dir: dir.path().to_path_buf(),
        api_key: api_key.map(str::to_owned),
        ..BridgeConfig::default()
    };
    let host = MemoryEditor::new(dir.path());
    let host = if procedural {
        host
    } else {
        host.without_procedural()
    };
    let session = EditorSession::new(Box::new(host), &config);
    let editor = Arc::new(EditorThread::spawn(session).unwrap());
    let hub = StreamHub::new(Arc::clone(&editor), StreamConfig::default(), 30011);
    let state = Arc::new(AppState::new(
        editor,
        hub,
        config.api_key.clone(),
        30010,
        30011,
    ));
    TestApp {
        router: build_router(Arc::clone(&state)),
        state,
        dir,
    }
}

fn app() -> TestApp {
    make_app(None, true)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, body_to_json(response.into_body()).await)
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(post(uri, &body)).await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(get(uri)).await
    }
}

// ---------------------------------------------------------------------------
// Health and routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_ports_and_route_count() {
    let app = app();
    let (status, json) = app.get("/nova/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["engine"], "NovaBridge");
    assert_eq!(json["port"], 30010);
    assert_eq!(json["stream_port"], 30011);
    assert_eq!(json["routes"], 53);
    assert_eq!(json["auth"], false);
    assert_eq!(json["editor_thread"], true);
}

#[tokio::test]
async fn unknown_paths_are_json_404s_with_cors() {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(get("/nova/does/not/exist"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "error");
    assert_eq!(json["code"], 404);
}

#[tokio::test]
async fn unbound_routes_answer_503() {
    let app = app();
    assert_eq!(app.state.routes.unbind_all(), 53);
    let (status, json) = app.get("/nova/scene/list").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "error");
}

// ---------------------------------------------------------------------------
// Auth Gate and CORS
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wrong_or_missing_key_is_401_without_side_effects() {
    let app = make_app(Some("secret"), true);
    let (_, before) = app
        .send(
            Request::get("/nova/scene/list")
                .header("X-API-Key", "secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    let (status, json) = app
        .post("/nova/scene/spawn", json!({"class": "PointLight"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Unauthorized");

    let wrong = Request::post("/nova/scene/spawn")
        .header("X-API-Key", "nope")
        .body(Body::from(r#"{"class":"PointLight"}"#))
        .unwrap();
    assert_eq!(app.send(wrong).await.0, StatusCode::UNAUTHORIZED);

    let (_, after) = app
        .send(
            Request::get("/nova/scene/list")
                .header(header::AUTHORIZATION, "Bearer secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(before["count"], after["count"]);
}

#[tokio::test]
async fn key_is_trimmed_and_health_is_exempt() {
    let app = make_app(Some("secret"), true);
    let padded = Request::get("/nova/project/info")
        .header("X-API-Key", "  secret  ")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(padded).await.0, StatusCode::OK);
    assert_eq!(app.get("/nova/health").await.0, StatusCode::OK);
    assert_eq!(app.get("/nova/project/info").await.0, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn every_route_answers_preflight_with_cors_headers() {
    let app = make_app(Some("secret"), true);
    let (_, routes) = api_routes().into_parts();
    for route in routes {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(route.path)
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", route.path);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, OPTIONS"
        );
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization, X-API-Key"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
    }
}

// ---------------------------------------------------------------------------
// Request parsing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_bodies_are_rejected_before_any_work() {
    let app = app();
    for uri in [
        "/nova/scene/spawn",
        "/nova/asset/create",
        "/nova/mesh/create",
        "/nova/material/create",
        "/nova/sequencer/create",
        "/nova/optimize/lod",
        "/nova/stream/config",
        "/nova/exec/command",
    ] {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, json) = app.send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["error"], "Invalid JSON body", "{uri}");
    }
    let (_, list) = app.get("/nova/scene/list").await;
    assert_eq!(list["count"], 4);
}

#[tokio::test]
async fn wrong_typed_fields_name_the_field() {
    let app = app();
    let (status, json) = app
        .post("/nova/scene/spawn", json!({"class": "PointLight", "x": "left"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Field 'x' must be a number");
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

#[tokio::test]
async fn spawn_places_the_actor_at_the_requested_location() {
    let app = app();
    let (status, json) = app
        .post(
            "/nova/scene/spawn",
            json!({"class": "StaticMeshActor", "x": 100, "y": 200, "z": 0}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["name"].as_str().is_some_and(|n| !n.is_empty()));
    assert_eq!(
        json["transform"]["location"],
        json!({"x": 100.0, "y": 200.0, "z": 0.0})
    );
}

#[tokio::test]
async fn spawn_requires_a_class() {
    let app = app();
    let (status, json) = app.post("/nova/scene/spawn", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing required parameter: 'class'");
}

#[tokio::test]
async fn transform_is_visible_in_the_next_get() {
    let app = app();
    let (_, spawned) = app
        .post("/nova/scene/spawn", json!({"class": "PointLight", "label": "Lamp"}))
        .await;
    let name = spawned["name"].as_str().unwrap().to_owned();

    let (status, _) = app
        .post(
            "/nova/scene/transform",
            json!({
                "name": name,
                "location": {"x": 10.5, "z": -3},
                "rotation": {"yaw": 90},
                "scale": {"x": 2, "y": 2, "z": 2}
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, detail) = app.get(&format!("/nova/scene/get?name={name}")).await;
    assert_eq!(status, StatusCode::OK);
    let t = &detail["transform"];
    assert_eq!(t["location"], json!({"x": 10.5, "y": 0.0, "z": -3.0}));
    assert_eq!(t["rotation"]["yaw"], 90.0);
    assert_eq!(t["scale"], json!({"x": 2.0, "y": 2.0, "z": 2.0}));

    // Lookup by label resolves to the same actor.
    let (_, by_label) = app.post("/nova/scene/get", json!({"name": "Lamp"})).await;
    assert_eq!(by_label["name"], name);
}

#[tokio::test]
async fn component_property_addressing_reaches_the_light() {
    let app = app();
    let (_, spawned) = app
        .post("/nova/scene/spawn", json!({"class": "PointLight"}))
        .await;
    let name = spawned["name"].as_str().unwrap().to_owned();

    let (status, _) = app
        .post(
            "/nova/scene/set-property",
            json!({"name": name, "property": "Light.Intensity", "value": 2500}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, detail) = app.post("/nova/scene/get", json!({"name": name})).await;
    let light = detail["components"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["class"] == "PointLightComponent")
        .unwrap();
    assert_eq!(light["properties"]["Intensity"], "2500.000000");
}

#[tokio::test]
async fn unknown_actor_is_404_naming_it() {
    let app = app();
    let (status, json) = app.post("/nova/scene/delete", json!({"name": "Ghost"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("Ghost"));
}

#[tokio::test]
async fn hundred_and_first_spawn_is_rate_limited() {
    let app = app();
    for i in 0..100 {
        let (status, _) = app
            .post("/nova/scene/spawn", json!({"class": "Actor"}))
            .await;
        assert_eq!(status, StatusCode::OK, "spawn {i}");
    }
    let response = app
        .router
        .clone()
        .oneshot(post("/nova/scene/spawn", &json!({"class": "Actor"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
}

// ---------------------------------------------------------------------------
// Assets, meshes, materials
// ---------------------------------------------------------------------------

#[tokio::test]
async fn import_validates_in_order() {
    let app = app();
    let (status, json) = app.post("/nova/asset/import", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing 'file_path'");

    let missing = app.dir.path().join("nope.obj");
    let (_, json) = app
        .post(
            "/nova/asset/import",
            json!({"file_path": missing.display().to_string(), "scale": -1}),
        )
        .await;
    assert!(json["error"].as_str().unwrap().starts_with("File not found"));

    let text = app.dir.path().join("notes.txt");
    std::fs::write(&text, "hello").unwrap();
    let (_, json) = app
        .post(
            "/nova/asset/import",
            json!({"file_path": text.display().to_string(), "scale": 0}),
        )
        .await;
    assert_eq!(json["error"], "Invalid 'scale'. Provide a positive number.");

    let (_, json) = app
        .post(
            "/nova/asset/import",
            json!({"file_path": text.display().to_string()}),
        )
        .await;
    assert_eq!(json["error"], "Unsupported file format. Supported: .obj, .fbx");
}

#[tokio::test]
async fn obj_import_registers_a_mesh() {
    let app = app();
    let obj = app.dir.path().join("tri.obj");
    std::fs::write(&obj, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
    let (status, json) = app
        .post(
            "/nova/asset/import",
            json!({"file_path": obj.display().to_string(), "destination": "/Game/Imported"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["format"], "obj");
    assert_eq!(json["import_scale"], 100.0);
    let path = json["asset_path"].as_str().unwrap().to_owned();
    let (status, info) = app.get(&format!("/nova/asset/info?path={path}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["class"], "StaticMesh");
}

#[tokio::test]
async fn primitive_mesh_and_material_round_trip() {
    let app = app();
    let (status, mesh) = app
        .post("/nova/mesh/primitive", json!({"type": "cube", "name": "SM_Box"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mesh["triangles"], 12);

    let (_, base) = app
        .post("/nova/material/create", json!({"name": "M_Base"}))
        .await;
    let base = base["path"].as_str().unwrap().to_owned();
    let (status, instance) = app
        .post(
            "/nova/material/create-instance",
            json!({"parent": base, "name": "MI_Red"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let instance = instance["path"].as_str().unwrap().to_owned();

    let (status, _) = app
        .post(
            "/nova/material/set-param",
            json!({"path": instance, "param": "Tint", "type": "vector",
                   "value": {"r": 1, "g": 0, "b": 0}}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, info) = app.post("/nova/material/get", json!({"path": instance})).await;
    assert_eq!(
        info["parameters"]["Tint"],
        json!({"r": 1.0, "g": 0.0, "b": 0.0, "a": 1.0})
    );
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

#[tokio::test]
async fn camera_then_png_screenshot() {
    let app = app();
    let (status, camera) = app
        .post(
            "/nova/viewport/camera/set",
            json!({"location": {"x": 0, "y": 0, "z": 1000}, "fov": 60}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(camera["fov"], 60.0);
    let (width, height) = (camera["width"].clone(), camera["height"].clone());

    let response = app
        .router
        .clone()
        .oneshot(get("/nova/viewport/screenshot?format=png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(headers["x-novabridge-width"], width.to_string().as_str());
    assert_eq!(headers["x-novabridge-height"], height.to_string().as_str());
    let png = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[tokio::test]
async fn json_screenshot_resizes_the_capture() {
    let app = app();
    let (status, shot) = app
        .get("/nova/viewport/screenshot?width=320&height=240")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shot["format"], "png");
    assert_eq!(shot["width"], 320);
    assert_eq!(shot["height"], 240);
    assert!(shot["image"].as_str().is_some_and(|s| !s.is_empty()));

    let (_, camera) = app.get("/nova/viewport/camera/get").await;
    assert_eq!(camera["width"], 320);

    let (status, _) = app.get("/nova/viewport/screenshot?width=wide").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Stream control
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stream_config_validates_ranges() {
    let app = app();
    let (status, _) = app.post("/nova/stream/config", json!({"fps": 60})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, config) = app
        .post(
            "/nova/stream/config",
            json!({"fps": 5, "width": 320, "height": 240}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(config["fps"], 5);

    let (_, status_json) = app.get("/nova/stream/status").await;
    assert_eq!(status_json["streaming"], false);
    assert_eq!(status_json["clients"], 0);
    assert_eq!(status_json["width"], 320);
    assert_eq!(status_json["port"], 30011);

    // No clients: start leaves streaming off.
    let (_, started) = app.post("/nova/stream/start", json!({})).await;
    assert_eq!(started["streaming"], false);
}

async fn raw_post(addr: std::net::SocketAddr, path: &str, body: &str) -> String {
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "POST {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn websocket_client_receives_binary_frames() {
    let dir = tempfile::tempdir().unwrap();
    let config = BridgeConfig {
        host: "127.0.0.1".to_owned(),
        port: 0,
        stream_port: 0,
        project_dir: dir.path().to_path_buf(),
        ..BridgeConfig::default()
    };
    let bridge = Bridge::start(&config, Box::new(MemoryEditor::new(dir.path())))
        .await
        .unwrap();

    let response = raw_post(
        bridge.http_addr(),
        "/nova/stream/config",
        r#"{"fps":5,"width":320,"height":240}"#,
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");

    let url = format!("ws://{}/stream", bridge.stream_addr());
    let (mut ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(frame.is_binary(), "expected a binary frame, got {frame:?}");
    let jpeg = frame.into_data();
    assert!(jpeg.starts_with(&[0xFF, 0xD8]));
    assert!(bridge.state().stream.status().await.streaming);

    ws.close(None).await.unwrap();
    drop(ws);
    let hub = Arc::clone(&bridge.state().stream);
    tokio::time::timeout(Duration::from_secs(2), async {
        while hub.client_count().await > 0
            || hub.status().await.streaming
            || hub.timer_running().await
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    bridge.shutdown().await.unwrap();
}

// ---------------------------------------------------------------------------
// Procedural generation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn procedural_routes_are_501_without_the_subsystem() {
    let app = make_app(None, false);
    let (status, json) = app.get("/nova/pcg/list-graphs").await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(json["code"], 501);
}

#[tokio::test]
async fn procedural_volume_generates_points() {
    let app = app();
    let (_, graphs) = app.get("/nova/pcg/list-graphs").await;
    let graph = graphs["graphs"][0].as_str().unwrap().to_owned();

    let (status, volume) = app
        .post(
            "/nova/pcg/create-volume",
            json!({"graph_path": graph, "label": "Forest"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(volume["size"], json!({"x": 5000.0, "y": 5000.0, "z": 1000.0}));

    let (status, generated) = app
        .post("/nova/pcg/generate", json!({"actor_name": "Forest", "seed": 7}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(generated["points"].as_u64().is_some());

    let (status, _) = app
        .post("/nova/pcg/cleanup", json!({"actor_name": "Forest"}))
        .await;
    assert_eq!(status, StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sequence_keyframes_play_and_render() {
    let app = app();
    let (status, seq) = app
        .post("/nova/sequencer/create", json!({"name": "Intro"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let seq = seq["path"].as_str().unwrap().to_owned();

    let (status, json) = app
        .post(
            "/nova/sequencer/add-track",
            json!({"sequence": seq, "actor_name": "Floor", "track_type": "audio"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("audio"));

    let (status, key) = app
        .post(
            "/nova/sequencer/set-keyframe",
            json!({"sequence": seq, "actor_name": "Floor", "time": 1.0,
                   "location": {"z": 50}}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(key["channels"], 9);
    assert_eq!(key["transform"]["location"]["z"], 50.0);

    let (status, played) = app
        .post("/nova/sequencer/play", json!({"sequence": seq, "loop": true}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(played["playing"], true);

    let (_, stopped) = app.post("/nova/sequencer/stop", json!({})).await;
    assert_eq!(stopped["count"], 1);

    let out = app.dir.path().join("render");
    let (status, render) = app
        .post(
            "/nova/sequencer/render",
            json!({"sequence": seq, "fps": 4, "duration_seconds": 0.5,
                   "output_path": out.display().to_string()}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(render["frames"], 2);
    assert!(out.join("frame_00000.png").is_file());

    let (_, info) = app.get("/nova/sequencer/info").await;
    assert_eq!(info["count"], 1);
}

// ---------------------------------------------------------------------------
// Optimization
// ---------------------------------------------------------------------------

#[tokio::test]
async fn optimization_validates_and_resolves_meshes() {
    let app = app();
    let (status, json) = app
        .post("/nova/optimize/nanite", json!({"actor_name": "Floor", "enable": true}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["mesh_path"], "/Engine/BasicShapes/Cube.Cube");

    let (status, _) = app
        .post("/nova/optimize/nanite", json!({"enable": true}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/nova/optimize/lumen", json!({"quality": "ultra"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/nova/optimize/textures", json!({"max_size": 1000}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, lods) = app
        .post(
            "/nova/optimize/lod",
            json!({"mesh_path": "/Engine/BasicShapes/Cube.Cube", "num_lods": 3}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lods["lod_triangles"].as_array().unwrap().len(), 3);

    let (status, stats) = app.get("/nova/optimize/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["status"], "ok");
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[tokio::test]
async fn console_commands_are_echoed() {
    let app = app();
    let (status, json) = app
        .post("/nova/exec/command", json!({"command": "stat fps"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["command"], "stat fps");

    let (status, json) = app.post("/nova/build/lighting", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["command"], "BUILD LIGHTING");

    let (status, _) = app.post("/nova/exec/command", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
