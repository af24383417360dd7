/// Factory: build the signing backend and token codec from `Options`.
use jsonwebtoken::Algorithm;

use crate::config::Options;
use crate::error::ConfigError;
use crate::services::auth::signing::{AlgorithmFamily, SigningBackend, family_of, parse_algorithm};
use crate::services::auth::token::TokenCodec;

pub fn build_signing_backend(options: &Options) -> Result<SigningBackend, ConfigError> {
    let algorithm = parse_algorithm(&options.signing_algorithm)?;

    match family_of(algorithm) {
        Some(AlgorithmFamily::Hmac) => {
            let key = options
                .hmac_key
                .as_deref()
                .ok_or(ConfigError::MissingKey("hmac key"))?;
            SigningBackend::hmac(algorithm, key)
        }
        Some(AlgorithmFamily::Rsa) => {
            let (private_pem, public_pem) = load_key_pair(options)?;
            SigningBackend::rsa(algorithm, &private_pem, &public_pem)
        }
        Some(AlgorithmFamily::Ecdsa) => {
            let (private_pem, public_pem) = load_key_pair(options)?;
            SigningBackend::ecdsa(algorithm, &private_pem, &public_pem)
        }
        None => Err(unsupported(algorithm)),
    }
}

pub fn build_token_codec(options: &Options) -> Result<TokenCodec, ConfigError> {
    let backend = build_signing_backend(options)?;
    Ok(TokenCodec::new(backend, options.leeway.as_secs()))
}

fn load_key_pair(options: &Options) -> Result<(Vec<u8>, Vec<u8>), ConfigError> {
    let private_pem = options
        .private_key
        .as_ref()
        .ok_or(ConfigError::MissingKey("private key"))?
        .load()?;
    let public_pem = options
        .public_key
        .as_ref()
        .ok_or(ConfigError::MissingKey("public key"))?
        .load()?;
    Ok((private_pem, public_pem))
}

fn unsupported(algorithm: Algorithm) -> ConfigError {
    ConfigError::UnsupportedAlgorithm(format!("{algorithm:?}"))
}
