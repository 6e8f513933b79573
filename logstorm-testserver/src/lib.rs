//! Stand-in for the demo web service that `logstorm` drives traffic against.
//!
//! Routes mirror the demo service (CRUD-ish lookups, a login that sometimes
//! rejects, and endpoints that always fail or respond slowly) so the engine can
//! be exercised end-to-end without external processes.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub const PATH_HOME: &str = "/";
pub const PATH_HEALTH: &str = "/health";
pub const PATH_USER: &str = "/api/user/{id}";
pub const PATH_PRODUCT: &str = "/api/product/{id}";
pub const PATH_ORDER: &str = "/api/order";
pub const PATH_LOGIN: &str = "/api/login";
pub const PATH_ERROR_404: &str = "/error/404";
pub const PATH_ERROR_500: &str = "/error/500";
pub const PATH_ERROR_TIMEOUT: &str = "/error/timeout";

/// Highest user id that resolves; larger ids answer 404.
pub const MAX_USER_ID: u64 = 1000;

/// Every n-th login attempt is rejected with 401.
pub const LOGIN_REJECT_EVERY: u64 = 5;

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    logins_total: Arc<AtomicU64>,
    saw_user_agent: Arc<AtomicU64>,
    saw_accept_language: Arc<AtomicU64>,
    saw_json_content_type: Arc<AtomicU64>,
}

impl TestServerStats {
    fn observe(&self, headers: &HeaderMap) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        if headers.contains_key("user-agent") {
            self.saw_user_agent.fetch_add(1, Ordering::Relaxed);
        }
        if headers.contains_key("accept-language") {
            self.saw_accept_language.fetch_add(1, Ordering::Relaxed);
        }
        if headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().starts_with("application/json"))
        {
            self.saw_json_content_type.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn next_login(&self) -> u64 {
        self.logins_total.fetch_add(1, Ordering::Relaxed)
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn saw_user_agent(&self) -> u64 {
        self.saw_user_agent.load(Ordering::Relaxed)
    }

    pub fn saw_accept_language(&self) -> u64 {
        self.saw_accept_language.load(Ordering::Relaxed)
    }

    pub fn saw_json_content_type(&self) -> u64 {
        self.saw_json_content_type.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TestServerOptions {
    /// How long `/error/timeout` sleeps before answering.
    pub slow_delay: Duration,
}

impl Default for TestServerOptions {
    fn default() -> Self {
        Self {
            slow_delay: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone)]
struct AppState {
    stats: TestServerStats,
    opts: TestServerOptions,
}

#[derive(Debug, Serialize)]
struct UserResponse {
    user_id: u64,
    username: String,
    email: String,
}

async fn handle_home(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    state.stats.observe(&headers);
    Json(json!({
        "service": "logstorm test target",
        "total_requests": state.stats.requests_total(),
    }))
}

async fn handle_health(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    state.stats.observe(&headers);
    Json(json!({ "status": "healthy" }))
}

async fn handle_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> (StatusCode, Json<Value>) {
    state.stats.observe(&headers);

    if id > MAX_USER_ID {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "User not found" })),
        );
    }

    let user = UserResponse {
        user_id: id,
        username: format!("user_{id}"),
        email: format!("user{id}@example.com"),
    };
    match serde_json::to_value(user) {
        Ok(v) => (StatusCode::OK, Json(v)),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "encode error" })),
        ),
    }
}

async fn handle_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Json<Value> {
    state.stats.observe(&headers);
    Json(json!({ "product_id": id, "name": format!("Product {id}") }))
}

async fn handle_order_list(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    state.stats.observe(&headers);
    Json(json!({ "orders": [{ "order_id": 1, "status": "paid" }] }))
}

async fn handle_order_create(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.stats.observe(&headers);
    (
        StatusCode::CREATED,
        Json(json!({ "order_id": state.stats.requests_total(), "status": "created" })),
    )
}

async fn handle_login(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.stats.observe(&headers);

    let attempt = state.stats.next_login();
    if attempt % LOGIN_REJECT_EVERY == LOGIN_REJECT_EVERY - 1 {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid credentials" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "status": "success", "expires_in": 3600 })),
    )
}

async fn handle_error_404(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.stats.observe(&headers);
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Resource not found" })),
    )
}

async fn handle_error_500(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.stats.observe(&headers);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal Server Error" })),
    )
}

async fn handle_error_timeout(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    state.stats.observe(&headers);
    sleep(state.opts.slow_delay).await;
    Json(json!({ "message": "This request took too long" }))
}

async fn handle_fallback(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.stats.observe(&headers);
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

pub fn router(stats: TestServerStats, opts: TestServerOptions) -> Router {
    Router::new()
        .route(PATH_HOME, get(handle_home))
        .route(PATH_HEALTH, get(handle_health))
        .route(PATH_USER, get(handle_user))
        .route(PATH_PRODUCT, get(handle_product))
        .route(PATH_ORDER, get(handle_order_list).post(handle_order_create))
        .route(PATH_LOGIN, post(handle_login))
        .route(PATH_ERROR_404, get(handle_error_404))
        .route(PATH_ERROR_500, get(handle_error_500))
        .route(PATH_ERROR_TIMEOUT, get(handle_error_timeout))
        .fallback(handle_fallback)
        .with_state(AppState { stats, opts })
}

pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(TestServerOptions::default()).await
    }

    pub async fn start_with(opts: TestServerOptions) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();

        let app = router(stats.clone(), opts);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        Ok(Self {
            addr,
            base_url: format!("http://{addr}"),
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}
