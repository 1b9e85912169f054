use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use std::time::Duration;

#[async_trait::async_trait]
pub trait TokenSigner: Send + Sync {
    async fn sign(
        &self,
        claims: &AccessClaims,
        secret: &SigningSecret,
        ttl: Duration,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError>;

    async fn verify(&self, token: &str, secret: &SigningSecret)
    -> Result<AccessClaims, AuthError>;
}
