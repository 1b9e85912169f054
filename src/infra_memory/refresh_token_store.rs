use crate::domain_model::*;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Indices {
    by_token: HashMap<TokenDigest, SessionRecord>,
    by_user: HashMap<UserId, TokenDigest>,
}

impl Indices {
    /// Insert `record`, first dropping whatever token the user held before.
    fn insert_superseding(&mut self, record: SessionRecord) -> Option<TokenDigest> {
        let digest = record.token_digest().clone();
        let previous = self.by_user.insert(record.user_id(), digest.clone());
        let superseded = previous.filter(|old| *old != digest);
        if let Some(old) = &superseded {
            self.by_token.remove(old);
        }
        self.by_token.insert(digest, record);
        superseded
    }

    fn remove(&mut self, digest: &TokenDigest) -> Option<SessionRecord> {
        let record = self.by_token.remove(digest)?;
        // Only clear the user index if it still points here; a newer session
        // for the same user must survive a stale delete.
        if self.by_user.get(&record.user_id()) == Some(digest) {
            self.by_user.remove(&record.user_id());
        }
        Some(record)
    }
}

/// In-process index of live refresh sessions, keyed by token digest, with a
/// secondary per-user index that holds at most one token per user.
///
/// Both indices sit behind a single mutex, so every compound mutation
/// (supersede-then-insert, compare-and-rotate, sweep) is observed as one
/// atomic step. The lock is never held across an `.await`.
#[derive(Default)]
pub struct RefreshTokenStore {
    indices: Mutex<Indices>,
}

impl RefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Indices> {
        self.indices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `record` as the user's only session. Returns the digest of the
    /// session it replaced, if any.
    pub fn put(&self, record: SessionRecord) -> Option<TokenDigest> {
        self.lock().insert_superseding(record)
    }

    pub fn get(&self, token: &RefreshToken) -> Option<SessionRecord> {
        self.lock().by_token.get(&token.digest()).cloned()
    }

    pub fn delete(&self, token: &RefreshToken) -> bool {
        self.lock().remove(&token.digest()).is_some()
    }

    /// Replace `old` with `next` only if `old` is still live. A `false`
    /// return means some other call rotated, revoked or swept `old` first and
    /// `next` was discarded.
    pub fn rotate(&self, old: &RefreshToken, next: SessionRecord) -> bool {
        let old = old.digest();
        let mut indices = self.lock();
        let Some(current) = indices.by_token.get(&old) else {
            return false;
        };
        if current.user_id() != next.user_id() {
            return false;
        }
        debug_assert_eq!(indices.by_user.get(&next.user_id()), Some(&old));

        indices.remove(&old);
        indices.insert_superseding(next);
        true
    }

    pub fn current_for_user(&self, user_id: UserId) -> Option<SessionRecord> {
        let indices = self.lock();
        let digest = indices.by_user.get(&user_id)?;
        indices.by_token.get(digest).cloned()
    }

    /// Drop the user's current session. Returns whether there was one.
    pub fn revoke_user(&self, user_id: UserId) -> bool {
        let mut indices = self.lock();
        match indices.by_user.remove(&user_id) {
            Some(digest) => indices.by_token.remove(&digest).is_some(),
            None => false,
        }
    }

    /// Remove every session that expired before `now`. Returns how many.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut indices = self.lock();
        let expired: Vec<TokenDigest> = indices
            .by_token
            .iter()
            .filter(|(_, record)| record.is_expired(now))
            .map(|(digest, _)| digest.clone())
            .collect();

        for digest in &expired {
            indices.remove(digest);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.lock().by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
