use crate::application_port::AuthError;
use crate::domain_port::PasswordHasher;

const FAKE_PREFIX: &str = "fake$";

/// Reversible stand-in for local runs and tests where Argon2 is too slow.
/// Never select it for a deployment that stores real passwords.
#[derive(Debug, Default)]
pub struct FakePasswordHasher;

impl FakePasswordHasher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl PasswordHasher for FakePasswordHasher {
    async fn hash(&self, password: &str, cost: u32) -> Result<String, AuthError> {
        Ok(format!("{FAKE_PREFIX}{cost}${password}"))
    }

    async fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AuthError> {
        let stored = password_hash
            .strip_prefix(FAKE_PREFIX)
            .and_then(|rest| rest.split_once('$'))
            .map(|(_, plain)| plain)
            .ok_or_else(|| AuthError::InternalError("not a fake hash".to_string()))?;
        Ok(stored == password)
    }
}
