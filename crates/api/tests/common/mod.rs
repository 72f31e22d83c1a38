//! Shared helpers for API integration tests.
//!
//! Every test gets its own in-process mock of the CMS backend on an
//! ephemeral port, and the real application router pointed at it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use vitrine_api::config::ServerConfig;
use vitrine_api::router::build_app_router;
use vitrine_api::state::AppState;

/// Token the mock backend accepts for `/stores`.
pub const VALID_TOKEN: &str = "token-123";

/// What the mock backend has received.
#[derive(Default)]
pub struct MockCms {
    pub pages: Mutex<HashMap<String, Value>>,
    pub page_writes: Mutex<Vec<Value>>,
    pub layouts: Mutex<Vec<Value>>,
    /// `X-Canvas-Revision` of every page write, in order.
    pub page_revisions: Mutex<Vec<u64>>,
    /// Open-ended compose streams whose connection was dropped.
    pub compose_closed: AtomicUsize,
}

impl MockCms {
    pub fn page_writes(&self) -> Vec<Value> {
        self.page_writes.lock().unwrap().clone()
    }

    pub fn layouts(&self) -> Vec<Value> {
        self.layouts.lock().unwrap().clone()
    }

    pub fn page_revisions(&self) -> Vec<u64> {
        self.page_revisions.lock().unwrap().clone()
    }

    pub fn compose_closed(&self) -> usize {
        self.compose_closed.load(Ordering::SeqCst)
    }
}

/// Build a test `ServerConfig` pointing at `cms_api_url`, with a short
/// autosave window.
pub fn test_config(cms_api_url: String) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        cms_api_url,
        autosave_debounce_ms: 20,
        history_limit: 500,
    }
}

/// Start a mock CMS backend and the application router in front of it.
pub async fn build_test_app() -> (Router, Arc<MockCms>) {
    let cms = Arc::new(MockCms::default());
    let url = spawn_mock_cms(Arc::clone(&cms)).await;
    let app = build_app_router(AppState::new(test_config(url)));
    (app, cms)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_with_token(app: &Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn delete(app: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll `uri` until `done` accepts the `data` payload (at most ~2s).
pub async fn poll_until(app: &Router, uri: &str, done: impl Fn(&Value) -> bool) -> Value {
    for _ in 0..100 {
        let json = body_json(get(app, uri).await).await;
        if done(&json["data"]) {
            return json["data"].clone();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition on {uri} not reached");
}

/// Wait until `done` holds (at most ~2s).
pub async fn wait_for(what: &str, done: impl Fn() -> bool) {
    for _ in 0..100 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("{what} not reached");
}

/// Read a streaming body to its end (at most ~2s).
pub async fn body_text(response: Response) -> String {
    let collected = tokio::time::timeout(Duration::from_secs(2), response.into_body().collect())
        .await
        .expect("body did not end")
        .unwrap();
    String::from_utf8(collected.to_bytes().to_vec()).unwrap()
}

// ---------------------------------------------------------------------------
// Mock CMS backend
// ---------------------------------------------------------------------------

async fn spawn_mock_cms(cms: Arc<MockCms>) -> String {
    let app = Router::new()
        .route("/stores", axum::routing::get(mock_stores))
        .route("/catalogs/{id}/categories", axum::routing::get(mock_categories))
        .route("/layout-by-page-type", axum::routing::get(mock_layout_by_page_type))
        .route("/layouts", post(mock_create_layout))
        .route("/layouts/{id}", put(mock_update_layout))
        .route("/data_widgets", axum::routing::get(mock_data_widgets))
        .route("/cms/pages/{id}", axum::routing::get(mock_get_page).put(mock_put_page))
        .route("/compose/store", post(mock_compose))
        .route("/auth/login", post(mock_login))
        .route("/auth/passkey/login/options", post(mock_passkey_options))
        .route("/auth/passkey/login", post(mock_passkey_login))
        .with_state(cms);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn mock_stores(headers: HeaderMap) -> Response {
    let expected = format!("Bearer {VALID_TOKEN}");
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => {
            Json(json!([{"id": 1, "name": "Main"}, {"id": 2, "name": "Outlet"}])).into_response()
        }
        _ => (StatusCode::UNAUTHORIZED, "invalid token").into_response(),
    }
}

async fn mock_categories(Path(id): Path<String>) -> Response {
    if id == "broken" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "db password=hunter2").into_response();
    }
    Json(json!([{"id": "shoes", "name": "Shoes"}])).into_response()
}

async fn mock_layout_by_page_type(Query(q): Query<HashMap<String, String>>) -> Response {
    match q.get("pageType").map(String::as_str) {
        Some("cart") => Json(json!({
            "id": 41,
            "pageType": "cart",
            "structure": {"sections": [{"id": "summary", "fragment_ids": ["7"]}]},
            "fragments": [{
                "id": 7, "name": "Totals", "style": {}, "widget_id": "cart-summary",
                "order_num": 0, "content": {}
            }]
        }))
        .into_response(),
        _ => (StatusCode::NOT_FOUND, "no layout").into_response(),
    }
}

async fn mock_create_layout(State(cms): State<Arc<MockCms>>, Json(mut body): Json<Value>) -> Response {
    let mut layouts = cms.layouts.lock().unwrap();
    body["id"] = json!(layouts.len() + 100);
    layouts.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn mock_update_layout(
    State(cms): State<Arc<MockCms>>,
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    body["id"] = json!(id);
    cms.layouts.lock().unwrap().push(body.clone());
    Json(body).into_response()
}

async fn mock_data_widgets(Query(q): Query<HashMap<String, String>>) -> Response {
    Json(json!([{
        "id": 5,
        "name": format!("{} widget", q.get("page_type").cloned().unwrap_or_default()),
        "type": "banner",
        "layout": q.get("layout_id"),
    }]))
    .into_response()
}

async fn mock_get_page(State(cms): State<Arc<MockCms>>, Path(id): Path<String>) -> Response {
    match cms.pages.lock().unwrap().get(&id) {
        Some(page) => Json(page.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "no page").into_response(),
    }
}

async fn mock_put_page(
    State(cms): State<Arc<MockCms>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let Some(revision) = headers
        .get("x-canvas-revision")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
    else {
        return StatusCode::PRECONDITION_REQUIRED;
    };
    cms.page_revisions.lock().unwrap().push(revision);
    cms.page_writes.lock().unwrap().push(body.clone());
    cms.pages.lock().unwrap().insert(id, body);
    StatusCode::NO_CONTENT
}

/// Bumps `compose_closed` when the stream holding it is dropped.
struct CloseCounter(Arc<MockCms>);

impl Drop for CloseCounter {
    fn drop(&mut self) {
        self.0.compose_closed.fetch_add(1, Ordering::SeqCst);
    }
}

async fn mock_compose(
    State(cms): State<Arc<MockCms>>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let body = match q.get("store_id").map(String::as_str) {
        Some("hanging") => {
            // One progress frame, then keep-alive comments until the reader goes away.
            let counter = CloseCounter(cms);
            let stream = futures::stream::unfold((counter, 0u32), |(counter, sent)| async move {
                let chunk = if sent == 0 {
                    "data: {\"status\":\"progress\",\"message\":\"Rendering\",\"visual\":{\"progress\":10}}\n\n"
                } else {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    ": keep-alive\n\n"
                };
                Some((Ok::<_, std::io::Error>(chunk), (counter, sent + 1)))
            });
            return (
                [("content-type", "text/event-stream")],
                Body::from_stream(stream),
            )
                .into_response();
        }
        Some("failing") => concat!(
            "data: {\"status\":\"progress\",\"message\":\"Rendering\",\"visual\":{\"progress\":30}}\n\n",
            "data: {\"status\":\"error\",\"message\":\"boom\",\"visual\":{}}\n\n",
        ),
        _ => concat!(
            "data: {\"status\":\"progress\",\"message\":\"Rendering\",\"visual\":{\"type\":\"bar\",\"progress\":30}}\n\n",
            "data: {\"status\":\"progress\",\"message\":\"Bundling\",\"visual\":{\"type\":\"bar\",\"progress\":70}}\n\n",
            "data: {\"status\":\"completed\",\"message\":\"Done\",\"visual\":{}}\n\n",
        ),
    };
    ([("content-type", "text/event-stream")], body).into_response()
}

async fn mock_login(Json(body): Json<Value>) -> Response {
    if body["password"] == "correct" {
        Json(json!({"token": VALID_TOKEN, "user": body["username"]})).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "bad credentials").into_response()
    }
}

async fn mock_passkey_options() -> Json<Value> {
    Json(json!({"publicKey": {"challenge": "q83v7w", "timeout": 60000}}))
}

async fn mock_passkey_login() -> Json<Value> {
    Json(json!({"token": VALID_TOKEN}))
}
