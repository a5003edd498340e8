//! # API Errors
//!
//! Every failure a handler can produce, and the error boundary that turns
//! them into the JSON envelope clients see.
//!
//! ## Envelope
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  {                                                                      │
//! │    "statusCode": 400,                                                   │
//! │    "timestamp": "2026-01-01T12:00:00.000Z",                             │
//! │    "path": "/combos",                                                   │
//! │    "message": "Validation failed",                                      │
//! │    "errors": [{ "field": "items", "message": "..." }]   (optional)     │
//! │  }                                                                      │
//! │                                                                         │
//! │  handler ──► ApiError::into_response ──► status + ErrorReport          │
//! │                                                │                        │
//! │  error_boundary (middleware) ◄─────────────────┘                        │
//! │    stamps path + timestamp; also catches router 404/405 and            │
//! │    extractor rejections that never went through ApiError               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::any::Any;

use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{error, warn};

use comanda_core::{CoreError, FieldError, ValidationErrors};
use comanda_db::DbError;

/// Largest rejection body the boundary reads back into a message.
const MAX_REJECTION_BODY: usize = 16 * 1024;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// One or more payload fields failed structural validation.
    #[error("Validation failed")]
    Validation(ValidationErrors),

    /// Business rule violation or malformed request.
    #[error("{0}")]
    BadRequest(String),

    /// Missing, invalid or expired credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but lacking the required role.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Unique name or email already taken.
    #[error("{0}")]
    Conflict(String),

    /// Anything else. The detail is logged, never sent.
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        ApiError::Internal(detail.into())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            CoreError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            CoreError::Validation(errors) => ApiError::Validation(errors),
            CoreError::ComboPriceNotBelowOriginal { .. }
            | CoreError::SalePriceNotBelowPrice { .. }
            | CoreError::InvalidValidityWindow
            | CoreError::MissingProducts { .. }
            | CoreError::ItemsTotalOverflow
            | CoreError::HasDependents { .. } => ApiError::BadRequest(err.to_string()),
        }
    }
}

/// Convert database errors.
///
/// ## Error Mapping
/// ```text
/// NotFound            → 404 "<Entity> not found"
/// UniqueViolation     → 409 (store-level backstop for name/email races)
/// ForeignKeyViolation → 400 (referenced row vanished or still referenced)
/// CheckViolation      → 400
/// Other               → 500, detail logged
/// ```
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => ApiError::NotFound(format!("{entity} not found")),
            DbError::UniqueViolation { ref column } => {
                let (entity, field) = unique_target(column);
                ApiError::Conflict(format!("A {entity} with this {field} already exists"))
            }
            DbError::ForeignKeyViolation { .. } => ApiError::BadRequest(
                "The operation conflicts with a related record".to_string(),
            ),
            DbError::CheckViolation { .. } => {
                ApiError::BadRequest("The data violates a consistency rule".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Maps `table.column` from SQLite to a human entity and field name.
fn unique_target(column: &str) -> (&'static str, &'static str) {
    let table = column.split('.').next().unwrap_or_default();
    match table {
        "categories" => ("category", "name"),
        "products" => ("product", "name"),
        "combos" => ("combo", "name"),
        "combo_items" => ("combo item", "product"),
        "users" => ("user", "email"),
        _ => ("record", "value"),
    }
}

// =============================================================================
// Response
// =============================================================================

/// JSON error envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub timestamp: String,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// What the handler reported, carried to the boundary in response
/// extensions.
#[derive(Debug, Clone)]
struct ErrorReport {
    message: String,
    errors: Option<Vec<FieldError>>,
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn render(status: StatusCode, path: String, report: ErrorReport) -> Response {
    let body = ErrorBody {
        status_code: status.as_u16(),
        timestamp: now_timestamp(),
        path,
        message: report.message,
        errors: report.errors,
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            ApiError::Internal(detail) => error!(detail = %detail, "Unhandled error"),
            other => warn!(status = status.as_u16(), error = %other, "Request failed"),
        }

        let errors = match &self {
            ApiError::Validation(errors) => Some(errors.field_errors()),
            _ => None,
        };
        let report = ErrorReport {
            message: self.to_string(),
            errors,
        };

        let mut response = render(status, String::new(), report.clone());
        response.extensions_mut().insert(report);
        response
    }
}

// =============================================================================
// Error Boundary
// =============================================================================

/// Middleware normalizing every error response into [`ErrorBody`].
///
/// Responses produced by [`ApiError`] get the request path stamped in.
/// Anything else with a 4xx/5xx status (unknown route, wrong method,
/// extractor rejection) is rewritten into the same envelope.
pub async fn error_boundary(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let method = request.method().clone();

    let response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    if let Some(report) = response.extensions().get::<ErrorReport>().cloned() {
        return render(status, path, report);
    }

    let message = match status {
        StatusCode::NOT_FOUND => format!("Cannot {method} {path}"),
        StatusCode::METHOD_NOT_ALLOWED => "Method Not Allowed".to_string(),
        StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
        _ => rejection_text(response.into_body())
            .await
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Error").to_string()),
    };

    render(status, path, ErrorReport { message, errors: None })
}

/// Turns a handler panic into a 500 [`ApiError::Internal`]; the boundary
/// then renders it like any other error.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}

async fn rejection_text(body: Body) -> Option<String> {
    let bytes = axum::body::to_bytes(body, MAX_REJECTION_BODY).await.ok()?;
    let text = String::from_utf8(bytes.to_vec()).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use comanda_core::ValidationError;

    #[test]
    fn test_core_error_status_mapping() {
        let cases = [
            (CoreError::not_found("Combo", "x"), StatusCode::NOT_FOUND),
            (
                CoreError::Conflict {
                    entity: "combo",
                    field: "name",
                },
                StatusCode::CONFLICT,
            ),
            (CoreError::InvalidValidityWindow, StatusCode::BAD_REQUEST),
            (CoreError::ItemsTotalOverflow, StatusCode::BAD_REQUEST),
            (
                CoreError::HasDependents {
                    entity: "category",
                    dependents: "products",
                    count: 3,
                },
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (core, status) in cases {
            assert_eq!(ApiError::from(core).status(), status);
        }
    }

    #[test]
    fn test_unique_violation_becomes_conflict() {
        let err = ApiError::from(DbError::UniqueViolation {
            column: "products.name".to_string(),
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "A product with this name already exists");
    }

    #[test]
    fn test_internal_detail_hidden() {
        let err = ApiError::from(DbError::PoolExhausted);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn test_validation_body_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::Required {
            field: "name".to_string(),
        });
        let response = ApiError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let report = response.extensions().get::<ErrorReport>().unwrap();
        let fields = report.errors.as_ref().unwrap();
        assert_eq!(fields[0].field, "name");
    }

    #[tokio::test]
    async fn test_handler_panic_renders_envelope() {
        use axum::routing::get;
        use http_body_util::BodyExt;
        use tower::ServiceExt;
        use tower_http::catch_panic::CatchPanicLayer;

        async fn explode() -> &'static str {
            panic!("line total overflow")
        }

        let app = axum::Router::new()
            .route("/explode", get(explode))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(axum::middleware::from_fn(error_boundary));

        let request = axum::http::Request::builder()
            .uri("/explode")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["statusCode"], 500);
        assert_eq!(body["path"], "/explode");
        assert_eq!(body["message"], "Internal server error");
    }
}
