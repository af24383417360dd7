use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use subtle::ConstantTimeEq;
use tracing::error;

use crate::error::{ConfigError, TokenError};

/// Algorithm family, fixed when the backend is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmFamily {
    Hmac,
    Rsa,
    Ecdsa,
}

/// Parse a JWS algorithm name into one of the supported algorithms.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    let alg = match name.trim() {
        "HS256" => Algorithm::HS256,
        "HS384" => Algorithm::HS384,
        "HS512" => Algorithm::HS512,
        "RS256" => Algorithm::RS256,
        "RS384" => Algorithm::RS384,
        "RS512" => Algorithm::RS512,
        "PS256" => Algorithm::PS256,
        "PS384" => Algorithm::PS384,
        "PS512" => Algorithm::PS512,
        "ES256" => Algorithm::ES256,
        "ES384" => Algorithm::ES384,
        other => return Err(ConfigError::UnsupportedAlgorithm(other.to_string())),
    };
    Ok(alg)
}

/// JWS `alg` header value for a supported algorithm.
pub fn algorithm_name(alg: Algorithm) -> &'static str {
    match alg {
        Algorithm::HS256 => "HS256",
        Algorithm::HS384 => "HS384",
        Algorithm::HS512 => "HS512",
        Algorithm::RS256 => "RS256",
        Algorithm::RS384 => "RS384",
        Algorithm::RS512 => "RS512",
        Algorithm::PS256 => "PS256",
        Algorithm::PS384 => "PS384",
        Algorithm::PS512 => "PS512",
        Algorithm::ES256 => "ES256",
        Algorithm::ES384 => "ES384",
        _ => "unsupported",
    }
}

pub fn family_of(alg: Algorithm) -> Option<AlgorithmFamily> {
    match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Some(AlgorithmFamily::Hmac),
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => Some(AlgorithmFamily::Rsa),
        Algorithm::ES256 | Algorithm::ES384 => Some(AlgorithmFamily::Ecdsa),
        _ => None,
    }
}

/// Signs and verifies raw payloads with owned key material.
///
/// - HMAC verification recomputes the MAC and compares in constant time.
/// - RSA / ECDSA sign with the private key and verify with the public key.
/// - Key material is never printed via Debug.
#[derive(Clone)]
pub enum SigningBackend {
    Hmac {
        algorithm: Algorithm,
        key: EncodingKey,
    },
    Rsa {
        algorithm: Algorithm,
        private_key: EncodingKey,
        public_key: DecodingKey,
    },
    Ecdsa {
        algorithm: Algorithm,
        private_key: EncodingKey,
        public_key: DecodingKey,
    },
}

impl std::fmt::Debug for SigningBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningBackend")
            .field("family", &self.family())
            .field("algorithm", &algorithm_name(self.algorithm()))
            .finish()
    }
}

impl SigningBackend {
    pub fn hmac(algorithm: Algorithm, secret: &[u8]) -> Result<Self, ConfigError> {
        if family_of(algorithm) != Some(AlgorithmFamily::Hmac) {
            return Err(ConfigError::UnsupportedAlgorithm(
                algorithm_name(algorithm).to_string(),
            ));
        }
        if secret.is_empty() {
            return Err(ConfigError::MissingKey("hmac key"));
        }

        Ok(Self::Hmac {
            algorithm,
            key: EncodingKey::from_secret(secret),
        })
    }

    /// `private_pem` / `public_pem` are PEM encoded (PKCS#1 or PKCS#8 private key, SPKI public key).
    pub fn rsa(
        algorithm: Algorithm,
        private_pem: &[u8],
        public_pem: &[u8],
    ) -> Result<Self, ConfigError> {
        if family_of(algorithm) != Some(AlgorithmFamily::Rsa) {
            return Err(ConfigError::UnsupportedAlgorithm(
                algorithm_name(algorithm).to_string(),
            ));
        }

        let private_key =
            EncodingKey::from_rsa_pem(private_pem).map_err(|source| ConfigError::InvalidKey {
                what: "rsa private key",
                source,
            })?;
        let public_key =
            DecodingKey::from_rsa_pem(public_pem).map_err(|source| ConfigError::InvalidKey {
                what: "rsa public key",
                source,
            })?;

        Ok(Self::Rsa {
            algorithm,
            private_key,
            public_key,
        })
    }

    /// `private_pem` must be a PKCS#8 EC private key; `public_pem` an SPKI public key.
    pub fn ecdsa(
        algorithm: Algorithm,
        private_pem: &[u8],
        public_pem: &[u8],
    ) -> Result<Self, ConfigError> {
        if family_of(algorithm) != Some(AlgorithmFamily::Ecdsa) {
            return Err(ConfigError::UnsupportedAlgorithm(
                algorithm_name(algorithm).to_string(),
            ));
        }

        let private_key =
            EncodingKey::from_ec_pem(private_pem).map_err(|source| ConfigError::InvalidKey {
                what: "ec private key",
                source,
            })?;
        let public_key =
            DecodingKey::from_ec_pem(public_pem).map_err(|source| ConfigError::InvalidKey {
                what: "ec public key",
                source,
            })?;

        Ok(Self::Ecdsa {
            algorithm,
            private_key,
            public_key,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Hmac { algorithm, .. }
            | Self::Rsa { algorithm, .. }
            | Self::Ecdsa { algorithm, .. } => *algorithm,
        }
    }

    pub fn family(&self) -> AlgorithmFamily {
        match self {
            Self::Hmac { .. } => AlgorithmFamily::Hmac,
            Self::Rsa { .. } => AlgorithmFamily::Rsa,
            Self::Ecdsa { .. } => AlgorithmFamily::Ecdsa,
        }
    }

    /// Sign `payload`, returning the raw signature bytes.
    pub fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, TokenError> {
        let key = match self {
            Self::Hmac { key, .. } => key,
            Self::Rsa { private_key, .. } | Self::Ecdsa { private_key, .. } => private_key,
        };

        let encoded = jsonwebtoken::crypto::sign(payload, key, self.algorithm()).map_err(|e| {
            error!(error = %e, algorithm = ?self.algorithm(), "failed to sign payload");
            TokenError::Signing(e.to_string())
        })?;

        URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Check `signature` against `payload`. Any internal failure counts as a mismatch.
    pub fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        match self {
            Self::Hmac { .. } => match self.sign(payload) {
                Ok(expected) => expected.ct_eq(signature).into(),
                Err(_) => false,
            },
            Self::Rsa { public_key, .. } | Self::Ecdsa { public_key, .. } => {
                let encoded = URL_SAFE_NO_PAD.encode(signature);
                jsonwebtoken::crypto::verify(&encoded, payload, public_key, self.algorithm())
                    .unwrap_or(false)
            }
        }
    }
}
