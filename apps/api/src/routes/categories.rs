//! `/categories` routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use comanda_core::payload::{CreateCategory, UpdateCategory};

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::extract::{decode, ValidJson};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(find_all).post(create))
        .route("/{id}", get(find_one).patch(update).delete(remove))
}

async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ValidJson(payload): ValidJson<CreateCategory>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let category = state.categories().create(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Category created successfully",
            "category": category,
        })),
    ))
}

async fn find_all(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let categories = state.categories().find_all().await?;

    Ok(Json(json!({
        "message": "Categories retrieved successfully",
        "data": categories,
    })))
}

async fn find_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let category = state.categories().find_one(&id).await?;

    Ok(Json(json!({
        "message": "Category retrieved successfully",
        "category": category,
    })))
}

async fn update(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<Value>,
) -> ApiResult<Json<Value>> {
    let service = state.categories();
    service.ensure_exists(&id).await?;
    let patch: UpdateCategory = decode(body)?;
    let category = service.update(&id, patch).await?;

    Ok(Json(json!({
        "message": "Category updated successfully",
        "category": category,
    })))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.categories().remove(&id).await?;

    Ok(Json(json!({ "message": "Category removed successfully" })))
}
