//! Test helpers for integration tests
//!
//! Provides a scriptable mock API server: tests enqueue responses (status,
//! headers, body, artificial delay) per path, and the server records every
//! hit with timing and the auth/audit headers it saw.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One scripted response
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Value,
    pub delay: Duration,
}

impl MockResponse {
    /// 200 with a JSON body
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body,
            delay: Duration::ZERO,
        }
    }

    /// Any status with a JSON body
    pub fn status(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
            delay: Duration::ZERO,
        }
    }

    /// 204 with no body
    pub fn no_content() -> Self {
        Self::status(204, Value::Null)
    }

    /// Add one response header
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Attach the full rate-limit header set
    pub fn with_rate_limit(self, limit: u32, remaining: u32, reset_after: f64, bucket: &str) -> Self {
        self.with_header("x-ratelimit-limit", &limit.to_string())
            .with_header("x-ratelimit-remaining", &remaining.to_string())
            .with_header("x-ratelimit-reset-after", &reset_after.to_string())
            .with_header("x-ratelimit-bucket", bucket)
    }

    /// Hold the response for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One observed request
#[derive(Debug, Clone)]
pub struct Hit {
    pub path: String,
    pub started: Instant,
    pub finished: Instant,
    pub authorization: Option<String>,
    pub audit_reason: Option<String>,
}

#[derive(Default)]
struct MockState {
    scripted: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    hits: Mutex<Vec<Hit>>,
}

/// Scriptable mock API server
pub struct MockApi {
    pub addr: SocketAddr,
    state: Arc<MockState>,
    _handle: JoinHandle<()>,
}

impl MockApi {
    /// Bind an ephemeral port and start serving
    pub async fn start() -> Result<Self> {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .fallback(respond)
            .with_state(state.clone());

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    /// Base URL suitable for `Rest::with_base`
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Queue a response for a path (without the `/v{N}` prefix)
    pub fn enqueue(&self, path: &str, response: MockResponse) {
        self.state
            .scripted
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    /// Every request the server has seen, in completion order
    pub fn hits(&self) -> Vec<Hit> {
        self.state.hits.lock().unwrap().clone()
    }

    /// Hits for one path
    pub fn hits_for(&self, path: &str) -> Vec<Hit> {
        self.hits().into_iter().filter(|hit| hit.path == path).collect()
    }
}

async fn respond(State(state): State<Arc<MockState>>, request: Request) -> Response {
    let started = Instant::now();

    let version_prefix = format!("/api/v{}", cord_common::API_VERSION);
    let path = request
        .uri()
        .path()
        .strip_prefix(&version_prefix)
        .unwrap_or(request.uri().path())
        .to_string();

    let authorization = header_string(&request, "authorization");
    let audit_reason = header_string(&request, "x-audit-log-reason");

    let scripted = state
        .scripted
        .lock()
        .unwrap()
        .get_mut(&path)
        .and_then(VecDeque::pop_front);
    let response = scripted.unwrap_or_else(|| MockResponse::ok(json!({})));

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    state.hits.lock().unwrap().push(Hit {
        path,
        started,
        finished: Instant::now(),
        authorization,
        audit_reason,
    });

    let mut builder = Response::builder()
        .status(response.status)
        .header("content-type", "application/json");
    for (name, value) in &response.headers {
        builder = builder.header(name, value);
    }

    let body = if response.body.is_null() {
        Body::empty()
    } else {
        Body::from(response.body.to_string())
    };

    builder.body(body).expect("mock response build")
}

fn header_string(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
