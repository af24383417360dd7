/*
 * Responsibility
 * - Config loading → JwtHandler construction → Router assembly
 * - Transport layers (request id, trace, limits, timeout, response headers)
 * - axum::serve()
 */
use std::time::Duration;
use std::{panic, process};

use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use jwt_handler::JwtHandler;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::{handlers, transport};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,jwt_handler=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: fail fast. Production: default hook, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting demo in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let jwt = build_jwt_handler(config.jwt)?;
    let app = build_router(&jwt, config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_jwt_handler(options: jwt_handler::Options) -> Result<JwtHandler> {
    // Stand-in for a user store lookup.
    let options = options.authenticator(|u: &str, p: &str| u == "admin" && p == "admin");
    Ok(JwtHandler::new(options)?)
}

fn build_router(jwt: &JwtHandler, request_timeout: Duration) -> Router {
    let router = Router::new()
        .route("/", get(handlers::index))
        .merge(jwt.authentication(Router::new().route("/login", post(handlers::login))))
        .merge(jwt.authorization(Router::new().route("/hello", get(handlers::hello))))
        .merge(jwt.refresh(Router::new().route("/refresh", get(handlers::refresh))));

    transport::apply(router, jwt, request_timeout)
}
