/*
 * Responsibility
 * - Demo server settings (listen address, environment, request timeout)
 * - JWT settings are delegated to jwt_handler::Options
 */
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jwt_handler::{ConfigError, Options};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub request_timeout: Duration,
    pub jwt: Options,
}

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 8080,
        };

        let addr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let request_timeout = match lookup("REQUEST_TIMEOUT_SECONDS") {
            Some(v) => match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS")),
            },
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let mut jwt = Options::from_lookup(&lookup)?;
        if jwt.hmac_key.is_none() && !app_env.is_production() {
            // Development fallback so `cargo run` works without a .env file.
            jwt = jwt.hmac_key("MYKEY");
        }

        Ok(Self {
            addr,
            app_env,
            request_timeout,
            jwt,
        })
    }
}
