use crate::domain_model::{AccessClaims, AccessToken, RefreshToken, UserId, UserView};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("refresh token expired")]
    RefreshTokenExpired,
    #[error("invalid access token")]
    InvalidAccessToken,
    #[error("access token expired")]
    AccessTokenExpired,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub name: String,
    pub password: String,
    pub timezone: Option<String>,
}

/// What a successful login, register or refresh hands back to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub user: UserView,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError>;
    async fn register(&self, input: RegisterInput) -> Result<AuthSession, AuthError>;
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<AuthSession, AuthError>;
    /// Revokes the user's current session. Returns whether one existed; a
    /// user without a session is still a successful logout.
    async fn logout(&self, user_id: UserId) -> bool;
    async fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError>;
}
