//! `/combos` routes. Every route requires ADMIN.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use comanda_core::payload::{CreateCombo, UpdateCombo};

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::extract::{decode, ValidJson};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(find_all).post(create))
        .route("/{id}", get(find_one).patch(update).delete(remove))
}

/// Answers 200, not 201, as the dashboard expects.
async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ValidJson(payload): ValidJson<CreateCombo>,
) -> ApiResult<Json<Value>> {
    let combo = state.combos().create(payload).await?;

    Ok(Json(json!({
        "message": "Combo created successfully",
        "combo": combo,
    })))
}

async fn find_all(State(state): State<Arc<AppState>>, _admin: AdminUser) -> ApiResult<Json<Value>> {
    let combos = state.combos().find_all().await?;

    Ok(Json(json!({
        "message": "Combos retrieved successfully",
        "data": combos,
    })))
}

async fn find_one(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let combo = state.combos().find_one(&id).await?;

    Ok(Json(json!({
        "message": "Combo retrieved successfully",
        "combo": combo,
    })))
}

async fn update(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<Value>,
) -> ApiResult<Json<Value>> {
    let service = state.combos();
    service.ensure_exists(&id).await?;
    let patch: UpdateCombo = decode(body)?;
    let combo = service.update(&id, patch).await?;

    Ok(Json(json!({
        "message": "Combo updated successfully",
        "combo": combo,
    })))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.combos().remove(&id).await?;

    Ok(Json(json!({ "message": "Combo removed successfully" })))
}
