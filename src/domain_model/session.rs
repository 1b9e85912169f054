use crate::domain_model::{TokenDigest, UserId};
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// Server-side state binding a refresh token to a user. Fields are read-only
/// once built: rotation always creates a new record.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    token_digest: TokenDigest,
    user_id: UserId,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(
        token_digest: TokenDigest,
        user_id: UserId,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        SessionRecord {
            token_digest,
            user_id,
            issued_at,
            expires_at,
        }
    }

    pub fn token_digest(&self) -> &TokenDigest {
        &self.token_digest
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// `from + ttl`, or `None` when the sum leaves chrono's representable range.
pub fn expiry_after(from: DateTime<Utc>, ttl: Duration) -> Option<DateTime<Utc>> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| from.checked_add_signed(delta))
}
