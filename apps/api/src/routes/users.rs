//! `/users` routes. Every route requires ADMIN.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use comanda_core::payload::UpdateUserRequest;

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::extract::{decode, ValidJson};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(find_all))
        .route("/{id}", get(find_one).patch(update).delete(remove))
}

async fn find_all(State(state): State<Arc<AppState>>, _admin: AdminUser) -> ApiResult<Json<Value>> {
    let users = state.users().find_all().await?;

    Ok(Json(json!({
        "message": "Users retrieved successfully",
        "data": users,
    })))
}

async fn find_one(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user = state.users().find_one(&id).await?;

    Ok(Json(json!({
        "message": "User retrieved successfully",
        "user": user,
    })))
}

async fn update(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<Value>,
) -> ApiResult<Json<Value>> {
    let service = state.users();
    service.ensure_exists(&id).await?;
    let request: UpdateUserRequest = decode(body)?;
    let user = service.update(&id, request).await?;

    Ok(Json(json!({
        "message": "User updated successfully",
        "user": user,
    })))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.users().remove(&id).await?;

    Ok(Json(json!({ "message": "User removed successfully" })))
}
