//! Health check.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_handler))
}

/// Liveness plus a database ping. 503 when the database is unreachable.
async fn health_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let database_ok = state.db.health_check().await;
    let (status, label) = if database_ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": label,
            "database": database_ok,
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}
