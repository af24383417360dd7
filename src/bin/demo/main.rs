/*
 * Responsibility
 * - tokio runtime startup
 * - delegate to app::run() (no logic here)
 */
use anyhow::Result;

mod app;
mod config;
mod handlers;
mod transport;

#[tokio::main]
async fn main() -> Result<()> {
    app::run().await
}
