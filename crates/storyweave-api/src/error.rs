//! Error types for the API layer.
//!
//! [`ApiError`] maps every failure onto the wire envelope
//! `{"success": false, "error": ..., "hint": ...}` with the HTTP status
//! that matches its category. Store taxonomy errors pass their message and
//! remediation hint through unchanged; infrastructure errors are logged
//! and reported as an opaque 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use storyweave_db::StoreError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request carries no valid identity.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// What is missing or wrong with the credential.
        message: String,
        /// How the caller can recover.
        hint: String,
    },

    /// A data-layer failure, taxonomy or infrastructure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Build an [`ApiError::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
            hint: hint.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, hint) = match self {
            Self::Unauthorized { message, hint } => (StatusCode::UNAUTHORIZED, message, hint),
            Self::Store(store) => match store {
                StoreError::NotFound { entity, hint } => {
                    (StatusCode::NOT_FOUND, format!("{entity} not found"), hint)
                }
                StoreError::Conflict { message, hint } => (StatusCode::CONFLICT, message, hint),
                StoreError::InvalidState { message, hint }
                | StoreError::Validation { message, hint } => {
                    (StatusCode::BAD_REQUEST, message, hint)
                }
                StoreError::Forbidden { message, hint } => (StatusCode::FORBIDDEN, message, hint),
                StoreError::Decode { .. } | StoreError::Postgres(_) | StoreError::Migration(_) => {
                    tracing::error!(error = %store, "Internal error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        String::from("internal error"),
                        String::from("Try again later"),
                    )
                }
            },
        };

        let body = serde_json::json!({
            "success": false,
            "error": error,
            "hint": hint,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        let cases = [
            (
                ApiError::unauthorized("no key", "send one"),
                StatusCode::UNAUTHORIZED,
            ),
            (
                StoreError::not_found("story", "check the id").into(),
                StatusCode::NOT_FOUND,
            ),
            (
                StoreError::conflict("duplicate", "do not repeat").into(),
                StatusCode::CONFLICT,
            ),
            (
                StoreError::invalid_state("wrong status", "wait").into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                StoreError::forbidden("not yours", "join first").into(),
                StatusCode::FORBIDDEN,
            ),
            (
                StoreError::validation("bad field", "fix it").into(),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
