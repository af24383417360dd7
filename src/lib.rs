//! JWT authentication middleware for axum.
//!
//! A [`JwtHandler`] is built once from [`Options`] and wraps routers with three
//! middleware:
//!
//! - [`JwtHandler::authentication`]: checks login credentials and mints a token
//! - [`JwtHandler::authorization`]: requires a valid bearer token
//! - [`JwtHandler::refresh`]: requires a valid bearer token and mints a replacement
//!
//! Handlers behind a wrapper read the results through [`AuthContext`] and the
//! context accessors.
//!
//! ```ignore
//! let jwt = JwtHandler::new(
//!     Options::new("HS256")
//!         .hmac_key("MYKEY")
//!         .authenticator(|u: &str, p: &str| u == "admin" && p == "admin"),
//! )?;
//!
//! let app = Router::new()
//!     .merge(jwt.authentication(Router::new().route("/login", post(login))))
//!     .merge(jwt.authorization(Router::new().route("/hello", get(hello))))
//!     .merge(jwt.refresh(Router::new().route("/refresh", get(refresh))));
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod services;

pub use config::{KeySource, Options};
pub use context::{
    AuthContext, ContextKey, ContextValue, RequestContext, signed_token_from_context,
    subject_from_context, subject_from_token, token_from_context,
};
pub use error::{AuthError, ConfigError, TokenError};
pub use handler::{JwtHandler, MAX_LIFETIME_SECONDS};
pub use services::auth::{
    AlgorithmFamily, Authenticator, BasicCredentials, Claims, CredentialExtractor, Credentials,
    FormCredentials, SigningBackend, TokenCodec,
};
