/*
 * Responsibility
 * - Handler options (algorithm, key material, lifetimes, injected capabilities)
 * - Loading the JWT settings from environment variables
 * - Validation happens in JwtHandler::new; nothing here touches key files
 */
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;
use crate::services::auth::credentials::{Authenticator, CredentialExtractor, FormCredentials};

pub const DEFAULT_SIGNING_ALGORITHM: &str = "HS256";
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Where PEM key material comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum KeySource {
    Path(PathBuf),
    Pem(Vec<u8>),
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::Pem(_) => f.write_str("Pem(..)"),
        }
    }
}

impl KeySource {
    pub fn load(&self) -> Result<Vec<u8>, ConfigError> {
        match self {
            Self::Path(path) => std::fs::read(path).map_err(|source| ConfigError::KeyFile {
                path: path.clone(),
                source,
            }),
            Self::Pem(pem) => Ok(pem.clone()),
        }
    }
}

#[derive(Clone)]
pub struct Options {
    /// JWS algorithm name, e.g. `HS256`, `RS256`, `ES256`.
    pub signing_algorithm: String,
    /// Shared secret for the HMAC family.
    pub hmac_key: Option<Vec<u8>>,
    /// Signing key for the RSA / ECDSA families.
    pub private_key: Option<KeySource>,
    /// Verification key for the RSA / ECDSA families.
    pub public_key: Option<KeySource>,
    /// Lifetime of tokens minted at login.
    pub token_ttl: Duration,
    /// Lifetime of tokens minted on refresh.
    pub refresh_ttl: Duration,
    /// Clock skew tolerated when checking `exp`.
    pub leeway: Duration,
    /// Upper bound on the login request body buffered for credential extraction.
    pub max_body_bytes: usize,
    pub authenticator: Option<Arc<dyn Authenticator>>,
    pub credential_extractor: Arc<dyn CredentialExtractor>,
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("Options")
            .field("signing_algorithm", &self.signing_algorithm)
            .field("hmac_key", &self.hmac_key.as_ref().map(|_| ".."))
            .field("private_key", &self.private_key)
            .field("public_key", &self.public_key)
            .field("token_ttl", &self.token_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("leeway", &self.leeway)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("authenticator", &self.authenticator.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            signing_algorithm: DEFAULT_SIGNING_ALGORITHM.to_string(),
            hmac_key: None,
            private_key: None,
            public_key: None,
            token_ttl: DEFAULT_TOKEN_TTL,
            refresh_ttl: DEFAULT_TOKEN_TTL,
            leeway: Duration::ZERO,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            authenticator: None,
            credential_extractor: Arc::new(FormCredentials::default()),
        }
    }
}

impl Options {
    pub fn new(signing_algorithm: impl Into<String>) -> Self {
        Self {
            signing_algorithm: signing_algorithm.into(),
            ..Self::default()
        }
    }

    pub fn hmac_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.hmac_key = Some(key.into());
        self
    }

    pub fn private_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.private_key = Some(KeySource::Path(path.into()));
        self
    }

    pub fn public_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.public_key = Some(KeySource::Path(path.into()));
        self
    }

    pub fn private_key_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.private_key = Some(KeySource::Pem(pem.into()));
        self
    }

    pub fn public_key_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.public_key = Some(KeySource::Pem(pem.into()));
        self
    }

    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    pub fn leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Some(Arc::new(authenticator));
        self
    }

    pub fn credential_extractor(mut self, extractor: impl CredentialExtractor + 'static) -> Self {
        self.credential_extractor = Arc::new(extractor);
        self
    }

    /// JWT settings from the process environment (after `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// JWT settings from an arbitrary key lookup.
    ///
    /// - `JWT_SIGNING_ALGORITHM` (default `HS256`)
    /// - `JWT_HMAC_KEY`
    /// - `JWT_PRIVATE_KEY_PATH`, `JWT_PUBLIC_KEY_PATH`
    /// - `JWT_TOKEN_TTL_SECONDS` (default 3600)
    /// - `JWT_REFRESH_TTL_SECONDS` (default: token TTL)
    /// - `JWT_LEEWAY_SECONDS` (default 0)
    ///
    /// Capabilities (authenticator, extractor) are not loadable and must be set by the caller.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let seconds = |key: &'static str| -> Result<Option<Duration>, ConfigError> {
            non_empty(key)
                .map(|v| {
                    v.trim()
                        .parse::<u64>()
                        .map(Duration::from_secs)
                        .map_err(|_| ConfigError::Invalid(key))
                })
                .transpose()
        };

        let signing_algorithm = non_empty("JWT_SIGNING_ALGORITHM")
            .unwrap_or_else(|| DEFAULT_SIGNING_ALGORITHM.to_string());
        let token_ttl = seconds("JWT_TOKEN_TTL_SECONDS")?.unwrap_or(DEFAULT_TOKEN_TTL);
        let refresh_ttl = seconds("JWT_REFRESH_TTL_SECONDS")?.unwrap_or(token_ttl);
        let leeway = seconds("JWT_LEEWAY_SECONDS")?.unwrap_or(Duration::ZERO);

        Ok(Self {
            signing_algorithm,
            hmac_key: non_empty("JWT_HMAC_KEY").map(String::into_bytes),
            private_key: non_empty("JWT_PRIVATE_KEY_PATH").map(|p| KeySource::Path(p.into())),
            public_key: non_empty("JWT_PUBLIC_KEY_PATH").map(|p| KeySource::Path(p.into())),
            token_ttl,
            refresh_ttl,
            leeway,
            ..Self::default()
        })
    }
}
