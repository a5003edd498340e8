//! Request extractors.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// `Json<T>` whose rejection (bad syntax, wrong types, missing required
/// fields, wrong content type) becomes a 400 [`ApiError`].
///
/// Field-level rules are checked afterwards by the payload's `validate()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// Decodes a body taken as raw [`Value`] into `T`. Type mismatches become a
/// 400 [`ApiError`], worded like a [`ValidJson`] rejection.
///
/// PATCH handlers take `ValidJson<Value>`, check the target exists, then
/// decode: a missing record answers 404 whatever the body holds.
pub fn decode<T: DeserializeOwned>(body: Value) -> ApiResult<T> {
    serde_json::from_value(body).map_err(|err| {
        ApiError::BadRequest(format!(
            "Failed to deserialize the JSON body into the target type: {err}"
        ))
    })
}
