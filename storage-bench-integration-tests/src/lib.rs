//! In-memory object endpoint used as the system under load in end-to-end tests.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::put,
    Json, Router,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storage_bench_common::ErrorResponse;
use tokio::sync::RwLock;

/// How the sink misbehaves.
#[derive(Debug, Clone, Default)]
pub struct SinkConfig {
    /// Reject every n-th object upload with 503.
    pub fail_every: Option<u64>,
    /// Added to every object request before it is answered.
    pub latency: Option<Duration>,
    /// Buckets that exist from the start.
    pub buckets: Vec<String>,
}

#[derive(Default)]
struct SinkState {
    buckets: HashMap<String, HashMap<String, Bytes>>,
}

#[derive(Clone)]
struct AppState {
    inner: Arc<RwLock<SinkState>>,
    object_puts: Arc<AtomicU64>,
    config: Arc<SinkConfig>,
}

pub struct ObjectSink {
    config: SinkConfig,
}

impl ObjectSink {
    pub fn new(config: SinkConfig) -> Self {
        Self { config }
    }

    fn router(state: AppState) -> Router {
        Router::new()
            .route("/:bucket", put(create_bucket).head(head_bucket))
            .route("/:bucket/:object", put(put_object).get(get_object))
            .with_state(state)
    }

    /// Bind to an ephemeral port, serve in the background, and return the bound address.
    pub async fn spawn(self) -> std::io::Result<SocketAddr> {
        let mut state = SinkState::default();
        for bucket in &self.config.buckets {
            state.buckets.insert(bucket.clone(), HashMap::new());
        }
        let app = Self::router(AppState {
            inner: Arc::new(RwLock::new(state)),
            object_puts: Arc::new(AtomicU64::new(0)),
            config: Arc::new(self.config),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        Ok(addr)
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

async fn head_bucket(State(state): State<AppState>, Path(bucket): Path<String>) -> StatusCode {
    if state.inner.read().await.buckets.contains_key(&bucket) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn create_bucket(State(state): State<AppState>, Path(bucket): Path<String>) -> StatusCode {
    state.inner.write().await.buckets.entry(bucket).or_default();
    StatusCode::OK
}

async fn put_object(
    State(state): State<AppState>,
    Path((bucket, object)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    if let Some(latency) = state.config.latency {
        tokio::time::sleep(latency).await;
    }
    let n = state.object_puts.fetch_add(1, Ordering::Relaxed) + 1;
    if matches!(state.config.fail_every, Some(every) if every > 0 && n % every == 0) {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "slow down");
    }

    let mut inner = state.inner.write().await;
    match inner.buckets.get_mut(&bucket) {
        Some(objects) => {
            objects.insert(object, body);
            StatusCode::OK.into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, format!("no such bucket: {bucket}")),
    }
}

async fn get_object(
    State(state): State<AppState>,
    Path((bucket, object)): Path<(String, String)>,
) -> Response {
    if let Some(latency) = state.config.latency {
        tokio::time::sleep(latency).await;
    }
    let inner = state.inner.read().await;
    match inner.buckets.get(&bucket).and_then(|objects| objects.get(&object)) {
        Some(data) => (StatusCode::OK, data.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
