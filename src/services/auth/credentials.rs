//! Credential capabilities injected into the handler.
//!
//! - `Authenticator` decides whether an `(identifier, secret)` pair is valid.
//! - `CredentialExtractor` pulls that pair out of an inbound request.
//!
//! Both have blanket impls for plain closures so tests and small apps can pass
//! a function directly.

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Multipart};
use axum::http::{HeaderValue, Request, header, request::Parts};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

/// Identifier/secret pair presented at login. The secret is never printed via Debug.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identifier: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .finish_non_exhaustive()
    }
}

/// Checks credentials, typically against a user store.
///
/// The handler awaits this without a timeout of its own.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, identifier: &str, secret: &str) -> bool;
}

#[async_trait]
impl<F> Authenticator for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    async fn authenticate(&self, identifier: &str, secret: &str) -> bool {
        self(identifier, secret)
    }
}

/// Reads credentials from request parts and the buffered request body.
#[async_trait]
pub trait CredentialExtractor: Send + Sync {
    async fn extract(&self, parts: &Parts, body: &Bytes) -> Option<Credentials>;
}

#[async_trait]
impl<F> CredentialExtractor for F
where
    F: Fn(&Parts, &Bytes) -> Option<Credentials> + Send + Sync,
{
    async fn extract(&self, parts: &Parts, body: &Bytes) -> Option<Credentials> {
        self(parts, body)
    }
}

/// Reads two named form fields from an `application/x-www-form-urlencoded` or
/// `multipart/form-data` body, falling back to the query string.
#[derive(Debug, Clone)]
pub struct FormCredentials {
    identifier_field: String,
    secret_field: String,
}

impl Default for FormCredentials {
    fn default() -> Self {
        Self::new("username", "password")
    }
}

impl FormCredentials {
    pub fn new(identifier_field: impl Into<String>, secret_field: impl Into<String>) -> Self {
        Self {
            identifier_field: identifier_field.into(),
            secret_field: secret_field.into(),
        }
    }

    fn lookup(&self, pairs: &[(String, String)], field: &str) -> Option<String> {
        pairs
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v.clone())
    }
}

#[async_trait]
impl CredentialExtractor for FormCredentials {
    async fn extract(&self, parts: &Parts, body: &Bytes) -> Option<Credentials> {
        let content_type = parts.headers.get(header::CONTENT_TYPE);
        let mime = content_type
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let mut pairs: Vec<(String, String)> = Vec::new();
        if mime.starts_with("application/x-www-form-urlencoded") {
            pairs.extend(url::form_urlencoded::parse(body).into_owned());
        } else if mime.starts_with("multipart/form-data") {
            if let Some(content_type) = content_type {
                pairs.extend(multipart_fields(content_type, body).await);
            }
        }
        if let Some(query) = parts.uri.query() {
            pairs.extend(url::form_urlencoded::parse(query.as_bytes()).into_owned());
        }

        let identifier = self.lookup(&pairs, &self.identifier_field)?;
        let secret = self.lookup(&pairs, &self.secret_field)?;
        if identifier.is_empty() {
            return None;
        }

        Some(Credentials { identifier, secret })
    }
}

/// Text fields of a buffered `multipart/form-data` body. File parts are skipped.
async fn multipart_fields(content_type: &HeaderValue, body: &Bytes) -> Vec<(String, String)> {
    let Ok(req) = Request::builder()
        .header(header::CONTENT_TYPE, content_type.clone())
        .body(Body::from(body.clone()))
    else {
        return Vec::new();
    };

    let mut multipart = match Multipart::from_request(req, &()).await {
        Ok(multipart) => multipart,
        Err(err) => {
            debug!(error = %err, "unreadable multipart login body");
            return Vec::new();
        }
    };

    let mut fields = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                debug!(error = %err, "malformed multipart login body");
                break;
            }
        };
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if field.file_name().is_some() {
            continue;
        }
        match field.text().await {
            Ok(value) => fields.push((name, value)),
            Err(err) => {
                debug!(error = %err, "malformed multipart login field");
                break;
            }
        }
    }
    fields
}

/// Reads `Authorization: Basic base64(identifier:secret)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicCredentials;

#[async_trait]
impl CredentialExtractor for BasicCredentials {
    async fn extract(&self, parts: &Parts, _body: &Bytes) -> Option<Credentials> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .trim();

        let (scheme, encoded) = value.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (identifier, secret) = decoded.split_once(':')?;
        if identifier.is_empty() {
            return None;
        }

        Some(Credentials::new(identifier, secret))
    }
}
