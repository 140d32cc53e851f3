use crate::auth::TokenGrant;

/// Most recent bearer token and its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub value: String,
    pub expires_at_ms: i64, // UNIX TIMESTAMP, millis
}

impl CachedToken {
    pub fn new(value: String, expires_at_ms: i64) -> Self {
        Self {
            value,
            expires_at_ms,
        }
    }

    /// `issued_at_ms` is taken before the exchange was sent, so the local
    /// expiry never runs past the server's.
    pub fn from_grant(grant: &TokenGrant, issued_at_ms: i64) -> Self {
        let lifetime_ms = grant.expires_in_secs.saturating_mul(1000);
        Self::new(
            grant.access_token.clone(),
            issued_at_ms.saturating_add(lifetime_ms),
        )
    }

    /// Reusable only while `now < expires_at - margin`.
    pub fn is_fresh(&self, now_ms: i64, safety_margin_ms: i64) -> bool {
        now_ms < self.expires_at_ms.saturating_sub(safety_margin_ms)
    }
}
