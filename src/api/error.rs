//! Error taxonomy shared by all auth handlers.
//!
//! Every handler returns a typed error instead of leaking storage or hashing
//! failures. The HTTP mapping keeps messages uniform where the flow depends on
//! it: login failures collapse into a single `Unauthorized` response and
//! reset-token failures into a single `Validation` message, so a caller cannot
//! probe which part of the check failed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing input; the message is safe to show the caller.
    #[error("{0}")]
    Validation(String),

    /// Authentication failed: bad credentials or a missing/invalid session.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but the role does not allow the route.
    #[error("{0}")]
    Forbidden(String),

    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Unexpected failure; detail is logged, never surfaced.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl Error {
    /// Uniform login rejection: unknown email, role mismatch, and wrong
    /// password must be observationally indistinguishable.
    #[must_use]
    pub fn invalid_credentials() -> Self {
        Self::Unauthorized("Invalid credentials.".to_string())
    }

    /// Uniform reset-token rejection: never existed, expired, and already
    /// consumed all collapse into the same message.
    #[must_use]
    pub fn invalid_reset_token() -> Self {
        Self::Validation("Invalid or expired reset token".to_string())
    }

    #[must_use]
    pub fn access_denied() -> Self {
        Self::Forbidden("Access denied.".to_string())
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(err) => {
                error!("internal error: {err:#}");
                "Server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            Error::Validation("bad".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::invalid_credentials().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(Error::access_denied().status(), StatusCode::FORBIDDEN);
        assert_eq!(Error::NotFound("User").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn uniform_messages() {
        assert_eq!(
            Error::invalid_credentials().to_string(),
            "Invalid credentials."
        );
        assert_eq!(
            Error::invalid_reset_token().to_string(),
            "Invalid or expired reset token"
        );
        assert_eq!(Error::NotFound("User").to_string(), "User not found");
    }
}
