use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claim set carried by a token.
///
/// `exp` and `iat` are seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    pub fn new(sub: impl Into<String>, exp: i64) -> Self {
        Self {
            sub: sub.into(),
            exp,
            iat: None,
            jti: None,
        }
    }

    /// Claims for a freshly issued token: `exp = now + ttl_seconds`, with `iat` and a random `jti`.
    ///
    /// `exp` saturates at `i64::MAX`.
    pub fn issue(sub: impl Into<String>, now: i64, ttl_seconds: u64) -> Self {
        Self {
            sub: sub.into(),
            exp: now.saturating_add(clamp_seconds(ttl_seconds)),
            iat: Some(now),
            jti: Some(Uuid::new_v4().to_string()),
        }
    }

    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Expired when `exp + leeway < now`; the `exp` second itself is still valid.
    pub fn is_expired(&self, now: i64, leeway_seconds: u64) -> bool {
        self.exp.saturating_add(clamp_seconds(leeway_seconds)) < now
    }
}

fn clamp_seconds(seconds: u64) -> i64 {
    i64::try_from(seconds).unwrap_or(i64::MAX)
}
