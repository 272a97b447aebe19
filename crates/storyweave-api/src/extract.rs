//! Request extractors whose rejections speak the response envelope.
//!
//! Axum's stock `Json` and `Query` extractors reject malformed input with
//! plain-text bodies. Wrapping them routes those failures through
//! [`ApiError`] instead, so a bad JSON body or an unknown query value gets
//! the same `{"success": false, "error", "hint"}` shape as every other
//! failure.

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use storyweave_db::StoreError;

use crate::error::ApiError;

/// JSON body extractor with an enveloped rejection.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(StoreError::validation(
                rejection.body_text(),
                "Send a JSON body matching the endpoint's documented fields",
            )
            .into()),
        }
    }
}

/// Query string extractor with an enveloped rejection.
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(StoreError::validation(
                rejection.body_text(),
                "Check the query string against the endpoint's documented parameters",
            )
            .into()),
        }
    }
}
