use crate::application_port::AuthError;
use crate::domain_model::UserView;
use crate::domain_port::{PasswordHasher, UserStore};
use std::sync::Arc;
use tokio::sync::OnceCell;

const DUMMY_PASSWORD: &str = "nutrilog-dummy-password";

/// Checks an email/password pair. Unknown email, missing hash and wrong
/// password all come back as `Ok(None)` so callers cannot tell them apart.
/// Misses still pay for one verify against a dummy hash of the same cost.
pub struct CredentialValidator {
    user_store: Arc<dyn UserStore>,
    password_hasher: Arc<dyn PasswordHasher>,
    hash_cost: u32,
    dummy_hash: OnceCell<String>,
}

impl CredentialValidator {
    pub fn new(
        user_store: Arc<dyn UserStore>,
        password_hasher: Arc<dyn PasswordHasher>,
        hash_cost: u32,
    ) -> Self {
        Self {
            user_store,
            password_hasher,
            hash_cost,
            dummy_hash: OnceCell::new(),
        }
    }

    pub async fn validate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserView>, AuthError> {
        let Some(user) = self.user_store.find_by_email(email).await? else {
            self.verify_dummy(password).await?;
            return Ok(None);
        };
        let Some(password_hash) = user.password_hash.as_deref() else {
            self.verify_dummy(password).await?;
            return Ok(None);
        };

        let verified = self.password_hasher.verify(password, password_hash).await?;
        if !verified {
            return Ok(None);
        }

        Ok(Some(UserView::from(user)))
    }

    async fn verify_dummy(&self, password: &str) -> Result<(), AuthError> {
        let dummy_hash = self
            .dummy_hash
            .get_or_try_init(|| self.password_hasher.hash(DUMMY_PASSWORD, self.hash_cost))
            .await?;
        self.password_hasher.verify(password, dummy_hash).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::*;
    use crate::infra_crypto::FakePasswordHasher;
    use crate::infra_memory::MemoryUserStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHasher {
        inner: FakePasswordHasher,
        hashes: AtomicUsize,
        verifies: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl PasswordHasher for CountingHasher {
        async fn hash(&self, password: &str, cost: u32) -> Result<String, AuthError> {
            self.hashes.fetch_add(1, Ordering::SeqCst);
            self.inner.hash(password, cost).await
        }

        async fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AuthError> {
            self.verifies.fetch_add(1, Ordering::SeqCst);
            self.inner.verify(password, password_hash).await
        }
    }

    async fn validator_with_user(email: &str, password: &str) -> CredentialValidator {
        validator_with_hasher(email, password, Arc::new(FakePasswordHasher::new())).await
    }

    async fn validator_with_hasher(
        email: &str,
        password: &str,
        hasher: Arc<dyn PasswordHasher>,
    ) -> CredentialValidator {
        let store = Arc::new(MemoryUserStore::new());
        let password_hash = hasher.hash(password, 1).await.unwrap();
        store
            .create(NewUser {
                email: email.to_string(),
                name: "Ada".to_string(),
                timezone: DEFAULT_TIMEZONE.to_string(),
                password_hash,
                roles: vec![DEFAULT_ROLE.to_string()],
                permissions: vec![],
                preferences: serde_json::json!({}),
            })
            .await
            .unwrap();
        CredentialValidator::new(store, hasher, 1)
    }

    #[tokio::test]
    async fn matching_credentials_yield_the_user_view() {
        let validator = validator_with_user("a@b.com", "p1").await;
        let view = validator.validate("a@b.com", "p1").await.unwrap().unwrap();
        assert_eq!(view.email, "a@b.com");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let validator = validator_with_user("a@b.com", "p1").await;

        assert!(validator.validate("a@b.com", "nope").await.unwrap().is_none());
        assert!(validator.validate("x@y.com", "p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_email_still_runs_one_verify() {
        let hasher = Arc::new(CountingHasher::default());
        let validator = validator_with_hasher("a@b.com", "p1", hasher.clone()).await;
        let hashes_after_seed = hasher.hashes.load(Ordering::SeqCst);

        assert!(validator.validate("x@y.com", "p1").await.unwrap().is_none());
        assert!(validator.validate("z@y.com", "p1").await.unwrap().is_none());
        assert!(validator.validate("a@b.com", "nope").await.unwrap().is_none());

        assert_eq!(hasher.verifies.load(Ordering::SeqCst), 3);
        // The dummy hash is computed once and reused.
        assert_eq!(hasher.hashes.load(Ordering::SeqCst), hashes_after_seed + 1);
    }
}
