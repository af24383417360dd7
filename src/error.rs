/*
 * Responsibility
 * - Error taxonomy for configuration, token codec and request authentication
 * - IntoResponse for AuthError (uniform 401 body, no detail leaks to clients)
 */
use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Rejected configuration. Raised by `JwtHandler::new` before any request is served.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("missing key material: {0}")]
    MissingKey(&'static str),

    #[error("failed to read key file {path}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid key material: {what}: {source}")]
    InvalidKey {
        what: &'static str,
        #[source]
        source: jsonwebtoken::errors::Error,
    },

    #[error("missing configuration: {0}")]
    Missing(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Failures of the token codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("token signature mismatch")]
    Signature,

    #[error("token expired")]
    Expired,

    #[error("token algorithm mismatch: expected {expected}, found {found}")]
    AlgorithmMismatch { expected: String, found: String },

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Per-request authentication failures.
///
/// Every variant except the internal ones renders as the same 401 response, so a
/// client cannot learn which check failed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingCredentials,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("missing bearer token")]
    MissingToken,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("internal server error")]
    Internal,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Internal | AuthError::Token(TokenError::Signing(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponseBody {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = if status == StatusCode::UNAUTHORIZED {
            ("UNAUTHORIZED", "unauthorized")
        } else {
            ("INTERNAL", "internal server error")
        };

        let body = ErrorResponseBody {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}
