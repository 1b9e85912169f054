use crate::application_port::*;

#[async_trait::async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str, cost: u32) -> Result<String, AuthError>;
    /// `Ok(false)` on mismatch. Errors are reserved for unreadable hashes.
    async fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AuthError>;
}
