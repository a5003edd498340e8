//! # Comanda API
//!
//! REST backend for the restaurant admin dashboard: categories, products,
//! combos and user accounts.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Comanda API                                   │
//! │                                                                         │
//! │  HTTP ──► CORS ──► Trace ──► error_boundary ──► catch_panic ──► routes │
//! │                                                    │                    │
//! │                          AuthUser / AdminUser ◄────┤                    │
//! │                               (JWT, HS256)         │                    │
//! │                                                    ▼                    │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐ ┌────────────┐ ┌────────┐│
//! │  │  Auth      │ │ Category   │ │ Product    │ │ Combo      │ │ User   ││
//! │  │  Service   │ │ Service    │ │ Service    │ │ Service    │ │ Service││
//! │  └─────┬──────┘ └─────┬──────┘ └─────┬──────┘ └─────┬──────┘ └───┬────┘│
//! │        └──────────────┴──────────────┼──────────────┴────────────┘     │
//! │                                      ▼                                  │
//! │                           comanda-db (SQLite)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::AppConfig`]. Every key can be overridden with a
//! `COMANDA_`-prefixed environment variable.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use comanda_db::Database;

use crate::auth::JwtManager;
use crate::services::{AuthService, CategoryService, ComboService, ProductService, UserService};

// Re-exports
pub use config::AppConfig;
pub use error::{ApiError, ApiResult};

/// Shared application state.
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(config: AppConfig, db: Database) -> Self {
        let jwt = Arc::new(JwtManager::new(&config.jwt_secret, config.jwt_lifetime_secs));
        AppState { config, db, jwt }
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.db.clone(), Arc::clone(&self.jwt))
    }

    pub fn categories(&self) -> CategoryService {
        CategoryService::new(self.db.clone())
    }

    pub fn products(&self) -> ProductService {
        ProductService::new(self.db.clone())
    }

    pub fn combos(&self) -> ComboService {
        ComboService::new(self.db.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.db.clone())
    }
}

/// Assemble the full application with middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    routes::router()
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(axum::middleware::from_fn(error::error_boundary))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
