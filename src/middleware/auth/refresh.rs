//! Bearer token → replacement token in the request context.
//!
//! Refresh is strict: the presented token must still be valid (no grace window
//! after `exp`). The presented token is not revoked.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::{bearer_token, current_context};
use crate::error::AuthError;
use crate::handler::JwtHandler;

pub(crate) async fn refresh_middleware(
    State(handler): State<JwtHandler>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers()).inspect_err(|_| {
        warn!("refresh request without bearer token");
    })?;

    let current = match handler.verify(token) {
        Ok(claims) => claims,
        Err(err) => {
            warn!(error = %err, "refresh token verification failed");
            return Err(err.into());
        }
    };

    let (token, renewed) = handler.reissue(&current)?;
    debug!(sub = %renewed.sub, exp = renewed.exp, previous_exp = current.exp, "reissued token");

    let ctx = current_context(&req)
        .with_signed_token(token)
        .with_claims(renewed);
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}
