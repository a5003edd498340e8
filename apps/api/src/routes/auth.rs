//! `/auth` routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use comanda_core::payload::{LoginRequest, RegisterRequest};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::ValidJson;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

async fn register(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let session = state.auth().register(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": session.user,
            "access_token": session.access_token,
        })),
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let session = state.auth().login(payload).await?;

    Ok(Json(json!({
        "message": "Login successful",
        "user": session.user,
        "access_token": session.access_token,
    })))
}

async fn me(AuthUser(user): AuthUser) -> Json<Value> {
    Json(json!({
        "message": "User retrieved successfully",
        "user": user,
    }))
}
