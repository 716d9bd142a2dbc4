//! Stub detection/recipe service
//!
//! Runs an axum router on an ephemeral local port. Replies are configurable
//! per test and every request is counted.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use kitcheneye_common::api::{
    format_detected_objects, DETECTED_OBJECTS_HEADER, DETECT_FILE_FIELD, DETECT_PATH, RECIPE_PATH,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Reply to `POST /detect`
#[derive(Debug, Clone)]
pub enum DetectReply {
    Image {
        labels_header: Option<String>,
        content_type: String,
        body: Vec<u8>,
    },
    Error {
        status: u16,
        body: String,
    },
}

impl DetectReply {
    pub fn labels(header: &str) -> Self {
        DetectReply::Image {
            labels_header: Some(header.to_string()),
            content_type: "image/png".to_string(),
            body: b"annotated-image".to_vec(),
        }
    }

    /// Header written the way the service writes it
    pub fn detected(labels: &[&str]) -> Self {
        let labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        Self::labels(&format_detected_objects(&labels))
    }

    pub fn no_header() -> Self {
        DetectReply::Image {
            labels_header: None,
            content_type: "image/png".to_string(),
            body: b"annotated-image".to_vec(),
        }
    }
}

/// Reply to `POST /recipe/`
#[derive(Debug, Clone)]
pub struct RecipeReply {
    pub status: u16,
    pub body: String,
}

impl RecipeReply {
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: value.to_string(),
        }
    }

    pub fn error(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

struct StubState {
    detect: Mutex<DetectReply>,
    recipe: Mutex<RecipeReply>,
    detect_delay: Mutex<Duration>,
    recipe_delay: Mutex<Duration>,
    detect_calls: AtomicUsize,
    recipe_calls: AtomicUsize,
    multipart_seen: AtomicBool,
    last_recipe_items: Mutex<Vec<String>>,
}

pub struct StubServer {
    addr: std::net::SocketAddr,
    state: Arc<StubState>,
}

impl StubServer {
    /// Start with `apple,banana` detections and an HTML recipe
    pub async fn start() -> Self {
        let state = Arc::new(StubState {
            detect: Mutex::new(DetectReply::detected(&["apple", "banana"])),
            recipe: Mutex::new(RecipeReply::json(
                serde_json::json!({ "recipe_html": "<h1>Fruit salad</h1>" }),
            )),
            detect_delay: Mutex::new(Duration::ZERO),
            recipe_delay: Mutex::new(Duration::ZERO),
            detect_calls: AtomicUsize::new(0),
            recipe_calls: AtomicUsize::new(0),
            multipart_seen: AtomicBool::new(false),
            last_recipe_items: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route(DETECT_PATH, post(detect_handler))
            .route(RECIPE_PATH, post(recipe_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_detect(&self, reply: DetectReply) {
        *self.state.detect.lock().unwrap() = reply;
    }

    pub fn set_recipe(&self, reply: RecipeReply) {
        *self.state.recipe.lock().unwrap() = reply;
    }

    pub fn set_detect_delay(&self, delay: Duration) {
        *self.state.detect_delay.lock().unwrap() = delay;
    }

    pub fn set_recipe_delay(&self, delay: Duration) {
        *self.state.recipe_delay.lock().unwrap() = delay;
    }

    pub fn detect_calls(&self) -> usize {
        self.state.detect_calls.load(Ordering::SeqCst)
    }

    pub fn recipe_calls(&self) -> usize {
        self.state.recipe_calls.load(Ordering::SeqCst)
    }

    /// True once a detect request arrived as multipart with a `file` field
    pub fn multipart_seen(&self) -> bool {
        self.state.multipart_seen.load(Ordering::SeqCst)
    }

    pub fn last_recipe_items(&self) -> Vec<String> {
        self.state.last_recipe_items.lock().unwrap().clone()
    }
}

async fn detect_handler(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.detect_calls.fetch_add(1, Ordering::SeqCst);

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let text = String::from_utf8_lossy(&body);
    let field = format!("name=\"{}\"", DETECT_FILE_FIELD);
    if content_type.starts_with("multipart/form-data") && text.contains(&field) {
        state.multipart_seen.store(true, Ordering::SeqCst);
    }

    let delay = *state.detect_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let reply = state.detect.lock().unwrap().clone();
    match reply {
        DetectReply::Image {
            labels_header,
            content_type,
            body,
        } => {
            let mut builder = Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type);
            if let Some(labels) = labels_header {
                builder = builder.header(DETECTED_OBJECTS_HEADER, labels);
            }
            builder.body(Body::from(body)).unwrap()
        }
        DetectReply::Error { status, body } => Response::builder()
            .status(status)
            .body(Body::from(body))
            .unwrap(),
    }
}

async fn recipe_handler(State(state): State<Arc<StubState>>, body: Bytes) -> Response {
    state.recipe_calls.fetch_add(1, Ordering::SeqCst);

    if let Ok(request) = serde_json::from_slice::<serde_json::Value>(&body) {
        let items = request["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        *state.last_recipe_items.lock().unwrap() = items;
    }

    let delay = *state.recipe_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let reply = state.recipe.lock().unwrap().clone();
    Response::builder()
        .status(reply.status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(reply.body))
        .unwrap()
}
