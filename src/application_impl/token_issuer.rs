use crate::application_port::{AuthError, AuthSession};
use crate::domain_model::*;
use crate::domain_port::TokenSigner;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

pub const REFRESH_TOKEN_BYTES: usize = 32;
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct TokenPolicy {
    pub signing_secret: SigningSecret,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenPolicy {
    pub fn new(signing_secret: SigningSecret) -> Self {
        TokenPolicy {
            signing_secret,
            access_ttl: DEFAULT_ACCESS_TTL,
            refresh_ttl: DEFAULT_REFRESH_TTL,
        }
    }
}

/// A freshly minted token pair plus the session record to persist for it.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: AccessToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: RefreshToken,
    pub record: SessionRecord,
}

impl IssuedTokens {
    pub fn into_session(self, user: UserView) -> AuthSession {
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            access_token_expires_at: self.access_token_expires_at,
            refresh_token_expires_at: self.record.expires_at(),
            user,
        }
    }
}

pub struct TokenIssuer {
    signer: Arc<dyn TokenSigner>,
    policy: TokenPolicy,
}

impl TokenIssuer {
    pub fn new(signer: Arc<dyn TokenSigner>, policy: TokenPolicy) -> Self {
        Self { signer, policy }
    }

    /// Sign an access token and mint a refresh token. Does not touch the
    /// session store.
    pub async fn issue(
        &self,
        user_id: UserId,
        email: &str,
        roles: &[String],
        permissions: &[String],
        now: DateTime<Utc>,
    ) -> Result<IssuedTokens, AuthError> {
        let roles = if roles.is_empty() {
            vec![DEFAULT_ROLE.to_string()]
        } else {
            roles.to_vec()
        };
        let claims = AccessClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            roles,
            permissions: permissions.to_vec(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };

        let (access_token, access_token_expires_at) = self
            .signer
            .sign(&claims, &self.policy.signing_secret, self.policy.access_ttl)
            .await?;

        let refresh_expires_at = expiry_after(now, self.policy.refresh_ttl).ok_or_else(|| {
            AuthError::InternalError("refresh token TTL is out of range".to_string())
        })?;

        let refresh_token = Self::generate_refresh_token();
        let record = SessionRecord::new(refresh_token.digest(), user_id, now, refresh_expires_at);

        Ok(IssuedTokens {
            access_token,
            access_token_expires_at,
            refresh_token,
            record,
        })
    }

    pub async fn verify(&self, access_token: &str) -> Result<AccessClaims, AuthError> {
        self.signer
            .verify(access_token, &self.policy.signing_secret)
            .await
    }

    fn generate_refresh_token() -> RefreshToken {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        RefreshToken(hex::encode(bytes))
    }
}
