//! Login: credentials → authenticator → signed token in the request context.

use axum::{
    body::{self, Body},
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::current_context;
use crate::error::AuthError;
use crate::handler::JwtHandler;

pub(crate) async fn authentication_middleware(
    State(handler): State<JwtHandler>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    // Buffer the body so the extractor can read form fields and the downstream handler still gets it.
    let (parts, body) = req.into_parts();
    let bytes = body::to_bytes(body, handler.max_body_bytes())
        .await
        .map_err(|err| {
            warn!(error = %err, "failed to read login request body");
            AuthError::MissingCredentials
        })?;

    let credentials = handler
        .credential_extractor()
        .extract(&parts, &bytes)
        .await;
    let mut req = Request::from_parts(parts, Body::from(bytes));

    let Some(credentials) = credentials else {
        warn!("login request without credentials");
        return Err(AuthError::MissingCredentials);
    };

    if !handler
        .authenticator()
        .authenticate(&credentials.identifier, &credentials.secret)
        .await
    {
        warn!(identifier = %credentials.identifier, "authentication failed");
        return Err(AuthError::InvalidCredentials);
    }

    let (token, claims) = handler.issue(&credentials.identifier)?;
    debug!(sub = %claims.sub, exp = claims.exp, "issued token");

    let ctx = current_context(&req)
        .with_signed_token(token)
        .with_claims(claims);
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}
