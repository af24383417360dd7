pub mod claims;
pub mod credentials;
pub mod factory;
pub mod signing;
pub mod token;

pub use claims::Claims;
pub use credentials::{Authenticator, BasicCredentials, CredentialExtractor, Credentials, FormCredentials};
pub use factory::{build_signing_backend, build_token_codec};
pub use signing::{AlgorithmFamily, SigningBackend};
pub use token::TokenCodec;
