/*
 * Responsibility
 * - Validated handler configuration (codec, lifetimes, capabilities)
 * - Token issuance / verification outside the HTTP path
 * - Wrapping routers with the authentication, authorization and refresh middleware
 *
 * Cheap to clone: everything lives behind one Arc and is read-only after `new`.
 */
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};

use crate::config::Options;
use crate::error::{ConfigError, TokenError};
use crate::middleware::auth::{authentication, authorization, refresh};
use crate::services::auth::claims::Claims;
use crate::services::auth::credentials::{Authenticator, CredentialExtractor};
use crate::services::auth::factory::build_token_codec;
use crate::services::auth::token::TokenCodec;

/// Upper bound for token lifetimes and leeway (100 years).
pub const MAX_LIFETIME_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

#[derive(Clone)]
pub struct JwtHandler {
    inner: Arc<Inner>,
}

struct Inner {
    codec: TokenCodec,
    token_ttl_seconds: u64,
    refresh_ttl_seconds: u64,
    max_body_bytes: usize,
    authenticator: Arc<dyn Authenticator>,
    credential_extractor: Arc<dyn CredentialExtractor>,
}

impl std::fmt::Debug for JwtHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtHandler")
            .field("backend", self.inner.codec.backend())
            .field("token_ttl_seconds", &self.inner.token_ttl_seconds)
            .field("refresh_ttl_seconds", &self.inner.refresh_ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl JwtHandler {
    /// Validate `options` and build the handler.
    ///
    /// Fails on an unsupported algorithm, missing or unreadable key material,
    /// a lifetime under one second or over [`MAX_LIFETIME_SECONDS`], or a
    /// missing authenticator.
    pub fn new(options: Options) -> Result<Self, ConfigError> {
        let token_ttl_seconds = whole_seconds(options.token_ttl, "token_ttl")?;
        let refresh_ttl_seconds = whole_seconds(options.refresh_ttl, "refresh_ttl")?;
        if options.leeway.as_secs() > MAX_LIFETIME_SECONDS {
            return Err(ConfigError::Invalid("leeway"));
        }
        if options.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("max_body_bytes"));
        }

        let authenticator = options
            .authenticator
            .clone()
            .ok_or(ConfigError::Missing("authenticator"))?;

        let codec = build_token_codec(&options)?;

        tracing::debug!(
            algorithm = %options.signing_algorithm,
            token_ttl_seconds,
            refresh_ttl_seconds,
            "jwt handler configured"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                codec,
                token_ttl_seconds,
                refresh_ttl_seconds,
                max_body_bytes: options.max_body_bytes,
                authenticator,
                credential_extractor: options.credential_extractor,
            }),
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.inner.codec
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.inner.token_ttl_seconds)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.inner.refresh_ttl_seconds)
    }

    /// Cap on the login body buffered for credential extraction.
    pub fn max_body_bytes(&self) -> usize {
        self.inner.max_body_bytes
    }

    pub(crate) fn authenticator(&self) -> &dyn Authenticator {
        self.inner.authenticator.as_ref()
    }

    pub(crate) fn credential_extractor(&self) -> &dyn CredentialExtractor {
        self.inner.credential_extractor.as_ref()
    }

    /// Mint a login token for `subject`, valid for the token TTL.
    pub fn issue(&self, subject: &str) -> Result<(String, Claims), TokenError> {
        self.mint(subject, self.inner.token_ttl_seconds)
    }

    /// Mint a replacement for verified `claims`, valid for the refresh TTL.
    ///
    /// The original token is not revoked; both stay valid until their own `exp`.
    pub fn reissue(&self, claims: &Claims) -> Result<(String, Claims), TokenError> {
        self.mint(&claims.sub, self.inner.refresh_ttl_seconds)
    }

    /// Verify signature, algorithm and expiration of `token`.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.inner.codec.decode(token)
    }

    fn mint(&self, subject: &str, ttl_seconds: u64) -> Result<(String, Claims), TokenError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims::issue(subject, now, ttl_seconds);
        let token = self.inner.codec.encode(&claims)?;
        Ok((token, claims))
    }

    /// Check credentials, then let `router` see the newly signed token in its `RequestContext`.
    ///
    /// Call after the routes have been added.
    pub fn authentication<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(
            self.clone(),
            authentication::authentication_middleware,
        ))
    }

    /// Require a valid bearer token; `router` sees the parsed claims and subject.
    pub fn authorization<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(
            self.clone(),
            authorization::authorization_middleware,
        ))
    }

    /// Require a valid bearer token and mint a replacement; `router` sees the new signed token.
    pub fn refresh<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(
            self.clone(),
            refresh::refresh_middleware,
        ))
    }
}

fn whole_seconds(ttl: Duration, name: &'static str) -> Result<u64, ConfigError> {
    match ttl.as_secs() {
        0 => Err(ConfigError::Invalid(name)),
        secs if secs > MAX_LIFETIME_SECONDS => Err(ConfigError::Invalid(name)),
        secs => Ok(secs),
    }
}
