//! Mock image generation backend for integration tests
//!
//! Serves the Ark generations path and records every request it sees

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// How the mock answers a request
#[derive(Clone, Copy)]
enum Behavior {
    /// Every request succeeds with one image
    Succeed,
    /// The nth request (1-based) fails with a 500 and a JSON error
    FailNth(u32),
    /// Every request answers with this status and a JSON error
    AlwaysStatus(u16),
    /// Every request answers with this status and an empty body
    EmptyStatus(u16),
}

/// Mock Ark backend that returns predictable responses
pub struct MockUpstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    behavior: Behavior,
    delay: Duration,
    request_count: AtomicU32,
    bodies: Mutex<Vec<Value>>,
    authorizations: Mutex<Vec<String>>,
}

impl MockUpstream {
    /// Start a mock that always succeeds
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(Behavior::Succeed, Duration::ZERO).await
    }

    /// Start a mock that fails only the nth request it receives
    pub async fn start_failing_nth(n: u32) -> anyhow::Result<Self> {
        Self::start_inner(Behavior::FailNth(n), Duration::ZERO).await
    }

    /// Start a mock that answers every request with the given error status
    pub async fn start_with_status(status: u16) -> anyhow::Result<Self> {
        Self::start_inner(Behavior::AlwaysStatus(status), Duration::ZERO).await
    }

    /// Start a mock that answers with the given status and no body
    pub async fn start_empty_status(status: u16) -> anyhow::Result<Self> {
        Self::start_inner(Behavior::EmptyStatus(status), Duration::ZERO).await
    }

    /// Start a mock that sleeps before every successful answer
    pub async fn start_slow(delay: Duration) -> anyhow::Result<Self> {
        Self::start_inner(Behavior::Succeed, delay).await
    }

    async fn start_inner(behavior: Behavior, delay: Duration) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            behavior,
            delay,
            request_count: AtomicU32::new(0),
            bodies: Mutex::new(Vec::new()),
            authorizations: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/v3/images/generations", routing::post(handle_generations))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for the relay's `api_base` setting
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of generation requests received
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::SeqCst)
    }

    /// JSON bodies received, in arrival order
    pub fn bodies(&self) -> Vec<Value> {
        self.state.bodies.lock().unwrap().clone()
    }

    /// Authorization header values received, in arrival order
    pub fn authorizations(&self) -> Vec<String> {
        self.state.authorizations.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_generations(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let n = state.request_count.fetch_add(1, Ordering::SeqCst) + 1;

    if let Some(auth) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        state.authorizations.lock().unwrap().push(auth.to_owned());
    }
    state.bodies.lock().unwrap().push(body);

    match state.behavior {
        Behavior::FailNth(target) if target == n => {
            return error_response(500, &format!("mock failure on request {n}"));
        }
        Behavior::AlwaysStatus(status) => {
            return error_response(status, "mock upstream rejected the request");
        }
        Behavior::EmptyStatus(status) => {
            return StatusCode::from_u16(status)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                .into_response();
        }
        _ => {}
    }

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    Json(json!({
        "model": "mock-model",
        "created": 1_700_000_000,
        "data": [
            { "url": format!("https://images.example/{n}.png"), "size": "1024x1024" }
        ],
        "usage": { "generated_images": 1, "output_tokens": 16, "total_tokens": 16 }
    }))
    .into_response()
}

fn error_response(status: u16, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({ "error": { "code": "MockError", "message": message } })),
    )
        .into_response()
}
