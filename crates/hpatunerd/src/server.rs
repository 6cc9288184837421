//! Probe and metrics HTTP server.
//!
//! - `GET /healthz`: 200 while the process is up
//! - `GET /readyz` : 200 once the controller has started, 503 otherwise
//! - `GET /metrics`: controller counters in Prometheus text format

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

use hpatuner_controller::{ControllerMetrics, render_prometheus};

/// State shared by the probe handlers.
#[derive(Clone, Default)]
pub struct ProbeState {
    pub ready: Arc<AtomicBool>,
    pub metrics: Arc<ControllerMetrics>,
}

impl ProbeState {
    pub fn new(metrics: Arc<ControllerMetrics>) -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            metrics,
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

pub fn build_router(state: ProbeState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn readyz(State(state): State<ProbeState>) -> impl IntoResponse {
    if state.ready.load(Ordering::SeqCst) {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}

async fn metrics(State(state): State<ProbeState>) -> impl IntoResponse {
    let body = render_prometheus(&state.metrics.snapshot());
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
