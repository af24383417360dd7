/*
 * Responsibility
 * - Transport layers wrapped around the demo router
 * - The body cap is the one the login middleware buffers against, so the two cannot disagree
 */
use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::header::{CACHE_CONTROL, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use jwt_handler::JwtHandler;
use tower::timeout::{TimeoutLayer, error::Elapsed};
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

// Responses carry bearer tokens and a login form.
const RESPONSE_HEADERS: [(HeaderName, &str); 4] = [
    (CACHE_CONTROL, "no-store"),
    (X_FRAME_OPTIONS, "DENY"),
    (X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (REFERRER_POLICY, "no-referrer"),
];

pub fn apply(router: Router, jwt: &JwtHandler, request_timeout: Duration) -> Router {
    let router = RESPONSE_HEADERS
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::overriding(
                name,
                HeaderValue::from_static(value),
            ))
        });

    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(transport_error))
            .layer(SetRequestIdLayer::new(REQUEST_ID, MakeRequestUuid))
            .layer(PropagateRequestIdLayer::new(REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(jwt.max_body_bytes()))
            .layer(TimeoutLayer::new(request_timeout)),
    )
}

async fn transport_error(err: BoxError) -> StatusCode {
    if err.is::<Elapsed>() {
        // usually a slow authenticator; the JWT middleware has no timeout of its own
        tracing::warn!("request timed out");
        StatusCode::REQUEST_TIMEOUT
    } else {
        tracing::error!(error = %err, "transport layer failed");
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
