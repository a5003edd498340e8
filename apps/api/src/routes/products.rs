//! `/products` routes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use comanda_core::payload::{CreateProduct, ProductQueryParams, UpdateProduct};

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::extract::{decode, ValidJson};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(find_all).post(create))
        .route("/by-category/{category_id}", get(find_by_category))
        .route("/{id}", get(find_one).patch(update).delete(remove))
}

async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ValidJson(payload): ValidJson<CreateProduct>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let product = state.products().create(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Product created successfully",
            "product": product,
        })),
    ))
}

/// `?page=&limit=&categoryId=&isAvailable=&search=&tags=a,b&onSale=`
async fn find_all(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProductQueryParams>,
) -> ApiResult<Json<Value>> {
    let page = state.products().find_all(params).await?;

    Ok(Json(json!({
        "message": "Products retrieved successfully",
        "data": page.products,
        "pagination": page.pagination,
    })))
}

async fn find_by_category(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let products = state.products().find_by_category(&category_id).await?;

    Ok(Json(json!({
        "message": "Products found successfully",
        "data": products,
    })))
}

async fn find_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let product = state.products().find_one(&id).await?;

    Ok(Json(json!({
        "message": "Product retrieved successfully",
        "product": product,
    })))
}

async fn update(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<Value>,
) -> ApiResult<Json<Value>> {
    let service = state.products();
    service.ensure_exists(&id).await?;
    let patch: UpdateProduct = decode(body)?;
    let product = service.update(&id, patch).await?;

    Ok(Json(json!({
        "message": "Product updated successfully",
        "product": product,
    })))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.products().remove(&id).await?;

    Ok(Json(json!({ "message": "Product removed successfully" })))
}
