//! ExternalDNS webhook routes
//!
//! ExternalDNS talks to out-of-tree providers over a small HTTP protocol:
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET /` | negotiate: returns the domain filter |
//! | `GET /records` | current router state as endpoints |
//! | `POST /records` | apply a change set, `204` on success |
//! | `POST /adjustendpoints` | let the provider adjust desired endpoints |
//!
//! Probes are served from a separate listener (`/healthz`, `/readyz`).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rosdns_core::{ChangeSet, Endpoint, Error, RouterOsProvider};
use serde::Serialize;
use tracing::{debug, error, info};

/// Media type ExternalDNS negotiates for webhook payloads
pub const WEBHOOK_MEDIA_TYPE: &str = "application/external.dns.webhook+json;version=1";

/// Shared state behind every handler
pub struct AppState {
    provider: RouterOsProvider,
    ready: AtomicBool,
}

impl AppState {
    /// Wrap a connected provider
    pub fn new(provider: RouterOsProvider) -> Self {
        Self {
            provider,
            ready: AtomicBool::new(false),
        }
    }

    /// Mark whether the router is reachable
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Track reachability from the outcome of a router call
    fn observe(&self, error: Option<&Error>) {
        match error {
            None => self.set_ready(true),
            Some(Error::Http(_) | Error::Authentication(_)) => self.set_ready(false),
            Some(_) => {}
        }
    }
}

/// Webhook API routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(negotiate))
        .route("/records", get(records).post(apply_changes))
        .route("/adjustendpoints", post(adjust_endpoints))
        .with_state(state)
}

/// Health and readiness routes
pub fn health_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .with_state(state)
}

fn webhook_json<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (status, [(header::CONTENT_TYPE, WEBHOOK_MEDIA_TYPE)], bytes).into_response(),
        Err(e) => {
            error!("Failed to encode response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn error_response(error: &Error) -> Response {
    let status = match error {
        Error::DomainFilter(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error.to_string()).into_response()
}

async fn negotiate(State(state): State<Arc<AppState>>) -> Response {
    debug!("Negotiating domain filter");
    webhook_json(StatusCode::OK, &state.provider.domain_filter().to_json())
}

async fn records(State(state): State<Arc<AppState>>) -> Response {
    let result = state.provider.records().await;
    state.observe(result.as_ref().err());
    match result {
        Ok(endpoints) => {
            debug!("Returning {} endpoints", endpoints.len());
            webhook_json(StatusCode::OK, &endpoints)
        }
        Err(e) => {
            error!("Failed to list records: {}", e);
            error_response(&e)
        }
    }
}

async fn apply_changes(State(state): State<Arc<AppState>>, Json(changes): Json<ChangeSet>) -> Response {
    if changes.is_empty() {
        debug!("Empty change set, nothing to apply");
        return StatusCode::NO_CONTENT.into_response();
    }

    let result = state.provider.apply_changes(&changes).await;
    match result {
        Ok(report) => {
            info!("Change set applied: {} created, {} deleted", report.created, report.deleted);
            state.set_ready(true);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            error!("Failed to apply changes: {}", e);
            error_response(&e)
        }
    }
}

async fn adjust_endpoints(
    State(state): State<Arc<AppState>>,
    Json(endpoints): Json<Vec<Endpoint>>,
) -> Response {
    let adjusted = state.provider.adjust_endpoints(endpoints);
    webhook_json(StatusCode::OK, &adjusted)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn readyz(State(state): State<Arc<AppState>>) -> Response {
    if state.is_ready() {
        (StatusCode::OK, "ready").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "router unreachable").into_response()
    }
}
