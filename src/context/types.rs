/*
 * Responsibility
 * - Immutable, per-request key/value chain
 * - with_value derives a new context; the parent is never touched, so a parent
 *   can be shared by any number of requests without locking
 */
use std::sync::Arc;

use crate::services::auth::claims::Claims;

/// Well-known context keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKey {
    /// Token string minted for this request (login / refresh).
    SignedToken,
    /// Verified claims for this request.
    ParsedToken,
    /// Authenticated identifier.
    Subject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextValue {
    Text(String),
    Claims(Claims),
}

impl ContextValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Claims(_) => None,
        }
    }

    pub fn as_claims(&self) -> Option<&Claims> {
        match self {
            Self::Claims(c) => Some(c),
            Self::Text(_) => None,
        }
    }
}

#[derive(Debug)]
struct Entry {
    key: ContextKey,
    value: ContextValue,
    parent: Option<Arc<Entry>>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    head: Option<Arc<Entry>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a context that additionally maps `key` to `value`.
    ///
    /// A later value for the same key shadows the earlier one.
    pub fn with_value(&self, key: ContextKey, value: ContextValue) -> Self {
        Self {
            head: Some(Arc::new(Entry {
                key,
                value,
                parent: self.head.clone(),
            })),
        }
    }

    pub fn value_for(&self, key: ContextKey) -> Option<&ContextValue> {
        let mut cursor = self.head.as_deref();
        while let Some(entry) = cursor {
            if entry.key == key {
                return Some(&entry.value);
            }
            cursor = entry.parent.as_deref();
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub(crate) fn with_signed_token(&self, token: String) -> Self {
        self.with_value(ContextKey::SignedToken, ContextValue::Text(token))
    }

    /// Stores the claims and their subject.
    pub(crate) fn with_claims(&self, claims: Claims) -> Self {
        let subject = claims.sub.clone();
        self.with_value(ContextKey::ParsedToken, ContextValue::Claims(claims))
            .with_value(ContextKey::Subject, ContextValue::Text(subject))
    }
}

pub fn signed_token_from_context(ctx: &RequestContext) -> Option<&str> {
    ctx.value_for(ContextKey::SignedToken)?.as_text()
}

pub fn token_from_context(ctx: &RequestContext) -> Option<&Claims> {
    ctx.value_for(ContextKey::ParsedToken)?.as_claims()
}

/// `None` when the subject claim is blank.
pub fn subject_from_token(claims: &Claims) -> Option<&str> {
    let sub = claims.sub.as_str();
    if sub.trim().is_empty() { None } else { Some(sub) }
}

pub fn subject_from_context(ctx: &RequestContext) -> Option<&str> {
    ctx.value_for(ContextKey::Subject)?.as_text()
}
