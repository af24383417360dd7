use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::RequestContext;

/// Handler-side extractor for the `RequestContext` a wrapper placed in the request extensions.
///
/// Never rejects: without a wrapper in front, the handler sees an empty context
/// and the accessors report not-found.
#[derive(Debug, Clone, Default)]
pub struct AuthContext(pub RequestContext);

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AuthContext(
            parts
                .extensions
                .get::<RequestContext>()
                .cloned()
                .unwrap_or_default(),
        ))
    }
}
