//! Login, bearer-token and refresh middleware.
//!
//! Each wrapper does its check, derives a new `RequestContext` from whatever
//! the request already carries, stores it in the request extensions and calls
//! the next service. Any failure short-circuits with `AuthError` (401).

use axum::http::{HeaderMap, Request, header};

use crate::context::RequestContext;
use crate::error::AuthError;

pub mod authentication;
pub mod authorization;
pub mod refresh;

/// Token from `Authorization: Bearer <token>`; the scheme is matched case-insensitively.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let (scheme, token) = value.trim().split_once(' ').ok_or(AuthError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}

/// Context already attached by an outer wrapper, or an empty one.
pub(crate) fn current_context<B>(req: &Request<B>) -> RequestContext {
    req.extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_default()
}
