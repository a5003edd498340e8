//! HTTP routes.
//!
//! ## Route Table
//! ```text
//! ┌──────────────────────────────────────┬───────────────┐
//! │ Route                                │ Gate          │
//! ├──────────────────────────────────────┼───────────────┤
//! │ POST   /auth/register                │ public        │
//! │ POST   /auth/login                   │ public        │
//! │ GET    /auth/me                      │ bearer        │
//! │ GET    /categories[/:id]             │ public        │
//! │ POST   /categories                   │ ADMIN         │
//! │ PATCH  /categories/:id               │ ADMIN         │
//! │ DELETE /categories/:id               │ ADMIN         │
//! │ GET    /products                     │ public        │
//! │ GET    /products/by-category/:catId  │ public        │
//! │ GET    /products/:id                 │ public        │
//! │ POST|PATCH|DELETE /products[/:id]    │ ADMIN         │
//! │ *      /combos[/:id]                 │ ADMIN         │
//! │ GET|PATCH|DELETE /users[/:id]        │ ADMIN         │
//! │ GET    /health                       │ public        │
//! └──────────────────────────────────────┴───────────────┘
//! ```
//!
//! Success bodies are `{ message, <entity> }` or `{ message, data, ... }`.

use std::sync::Arc;

use axum::http::{Method, Uri};
use axum::Router;

use crate::error::ApiError;
use crate::AppState;

pub mod auth;
pub mod categories;
pub mod combos;
pub mod health;
pub mod products;
pub mod users;

/// Every route of the API, without middleware.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health::routes())
        .nest("/auth", auth::routes())
        .nest("/categories", categories::routes())
        .nest("/products", products::routes())
        .nest("/combos", combos::routes())
        .nest("/users", users::routes())
        .fallback(fallback)
}

async fn fallback(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Cannot {} {}", method, uri.path()))
}
