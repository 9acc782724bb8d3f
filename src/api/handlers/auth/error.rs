//! Caller-visible error taxonomy for the auth and user endpoints.
//!
//! Every variant maps to one status code and a stable JSON body of the form
//! `{"error": "message"}`. Internal failures log the source chain and expose
//! nothing else.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The resource already exists, currently always a duplicate email.
    #[error("{0}")]
    Conflict(&'static str),
    /// Malformed input, a bad or expired verification code, or a wrong old
    /// password.
    #[error("{0}")]
    BadRequest(&'static str),
    /// Missing, invalid, expired, or revoked credentials.
    #[error("{0}")]
    Unauthorized(&'static str),
    /// Authenticated, but the role does not allow the operation.
    #[error("{0}")]
    Forbidden(&'static str),
    /// Unexpected hashing, signing, or storage failure.
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Conflict(message) => (StatusCode::CONFLICT, *message),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, *message),
            Self::Unauthorized(message) => (StatusCode::UNAUTHORIZED, *message),
            Self::Forbidden(message) => (StatusCode::FORBIDDEN, *message),
            Self::Internal(err) => {
                error!("Internal auth error: {err:#}");

                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}
