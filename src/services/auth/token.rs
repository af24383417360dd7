//! Compact JWS codec: `base64url(header).base64url(claims).base64url(signature)`.
//!
//! Decoding order:
//! 1. structure (three non-empty segments, header JSON, signature base64)
//! 2. header `alg` against the configured algorithm
//! 3. signature over the raw `header.claims` text
//! 4. claims JSON
//! 5. expiration
//!
//! The claims segment is only decoded after the signature has been verified, so
//! any edit to it surfaces as a signature error.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TokenError;
use crate::services::auth::claims::Claims;
use crate::services::auth::signing::{SigningBackend, algorithm_name};

const SEPARATOR: char = '.';

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TokenCodec {
    backend: SigningBackend,
    leeway_seconds: u64,
}

impl TokenCodec {
    pub fn new(backend: SigningBackend, leeway_seconds: u64) -> Self {
        Self {
            backend,
            leeway_seconds,
        }
    }

    pub fn backend(&self) -> &SigningBackend {
        &self.backend
    }

    pub fn leeway_seconds(&self) -> u64 {
        self.leeway_seconds
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = TokenHeader {
            alg: algorithm_name(self.backend.algorithm()).to_string(),
            typ: Some("JWT".to_string()),
        };

        let header_json =
            serde_json::to_vec(&header).map_err(|e| TokenError::Signing(e.to_string()))?;
        let claims_json =
            serde_json::to_vec(claims).map_err(|e| TokenError::Signing(e.to_string()))?;

        let mut token = URL_SAFE_NO_PAD.encode(header_json);
        token.push(SEPARATOR);
        token.push_str(&URL_SAFE_NO_PAD.encode(claims_json));

        let signature = self.backend.sign(token.as_bytes())?;
        token.push(SEPARATOR);
        token.push_str(&URL_SAFE_NO_PAD.encode(signature));

        Ok(token)
    }

    /// Verify and decode `token` against the current time.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify and decode `token`, treating `now` (seconds since the epoch) as the current time.
    pub fn decode_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let (signing_input, signature_b64) =
            token.rsplit_once(SEPARATOR).ok_or(TokenError::Malformed)?;
        let (header_b64, claims_b64) = signing_input
            .split_once(SEPARATOR)
            .ok_or(TokenError::Malformed)?;

        if header_b64.is_empty()
            || claims_b64.is_empty()
            || signature_b64.is_empty()
            || claims_b64.contains(SEPARATOR)
        {
            return Err(TokenError::Malformed);
        }

        let header: TokenHeader = decode_json(header_b64)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed)?;

        let expected = algorithm_name(self.backend.algorithm());
        if header.alg != expected {
            return Err(TokenError::AlgorithmMismatch {
                expected: expected.to_string(),
                found: header.alg,
            });
        }

        if !self.backend.verify(signing_input.as_bytes(), &signature) {
            return Err(TokenError::Signature);
        }

        let claims: Claims = decode_json(claims_b64)?;

        if claims.is_expired(now, self.leeway_seconds) {
            debug!(exp = claims.exp, now, "token expired");
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

fn decode_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}
