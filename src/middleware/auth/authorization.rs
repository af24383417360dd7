//! Bearer token → verified claims in the request context.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::{bearer_token, current_context};
use crate::error::AuthError;
use crate::handler::JwtHandler;

pub(crate) async fn authorization_middleware(
    State(handler): State<JwtHandler>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers()).inspect_err(|_| {
        warn!("request without bearer token");
    })?;

    let claims = match handler.verify(token) {
        Ok(claims) => claims,
        Err(err) => {
            warn!(error = %err, "access token verification failed");
            return Err(err.into());
        }
    };

    let ctx = current_context(&req).with_claims(claims);
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}
