use crate::application_impl::{CredentialValidator, TokenIssuer, TokenPolicy};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra_memory::RefreshTokenStore;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_HASH_COST: u32 = 3;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub token_policy: TokenPolicy,
    pub hash_cost: u32,
}

/// Entry point for login, register, refresh and logout.
///
/// A user has at most one live refresh token. Issuing a new one, whether by
/// login or by refresh, supersedes the previous one inside the store's lock,
/// and a refresh only commits if the token it presented is still current, so
/// a replayed pre-rotation token can never mint a second session.
pub struct SessionManager {
    user_store: Arc<dyn UserStore>,
    password_hasher: Arc<dyn PasswordHasher>,
    validator: CredentialValidator,
    issuer: TokenIssuer,
    store: Arc<RefreshTokenStore>,
    clock: Arc<dyn Clock>,
    hash_cost: u32,
}

impl SessionManager {
    pub fn new(
        user_store: Arc<dyn UserStore>,
        password_hasher: Arc<dyn PasswordHasher>,
        token_signer: Arc<dyn TokenSigner>,
        store: Arc<RefreshTokenStore>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            validator: CredentialValidator::new(
                user_store.clone(),
                password_hasher.clone(),
                config.hash_cost,
            ),
            issuer: TokenIssuer::new(token_signer, config.token_policy),
            user_store,
            password_hasher,
            store,
            clock,
            hash_cost: config.hash_cost,
        }
    }

    fn validate_registration(email: &str, name: &str, password: &str) -> Result<(), AuthError> {
        if !email.contains('@') {
            return Err(AuthError::InvalidInput("email is malformed".to_string()));
        }
        if name.trim().is_empty() {
            return Err(AuthError::InvalidInput("name is empty".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidInput("password too short".to_string()));
        }
        Ok(())
    }

    async fn start_session(&self, user: UserView) -> Result<AuthSession, AuthError> {
        let issued = self
            .issuer
            .issue(
                user.id,
                &user.email,
                &user.roles,
                &user.permissions,
                self.clock.now(),
            )
            .await?;

        if self.store.put(issued.record.clone()).is_some() {
            debug!(user_id = %user.id, "previous session superseded");
        }
        Ok(issued.into_session(user))
    }
}

#[async_trait::async_trait]
impl AuthService for SessionManager {
    async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let LoginInput { email, password } = input;
        let email = normalize_email(&email);

        let Some(user) = self.validator.validate(&email, &password).await? else {
            debug!("login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let session = self.start_session(user).await?;
        info!(user_id = %session.user.id, "user logged in");
        Ok(session)
    }

    async fn register(&self, input: RegisterInput) -> Result<AuthSession, AuthError> {
        let RegisterInput {
            email,
            name,
            password,
            timezone,
        } = input;
        let email = normalize_email(&email);

        Self::validate_registration(&email, &name, &password)?;

        if self.user_store.find_by_email(&email).await?.is_some() {
            debug!("registration rejected, email taken");
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = self.password_hasher.hash(&password, self.hash_cost).await?;
        let user = self
            .user_store
            .create(NewUser {
                email,
                name: name.trim().to_string(),
                timezone: timezone.unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
                password_hash,
                roles: vec![DEFAULT_ROLE.to_string()],
                permissions: vec![],
                preferences: serde_json::Value::Object(Default::default()),
            })
            .await?;

        let session = self.start_session(UserView::from(user)).await?;
        info!(user_id = %session.user.id, "user registered");
        Ok(session)
    }

    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<AuthSession, AuthError> {
        let record = self
            .store
            .get(refresh_token)
            .ok_or(AuthError::InvalidRefreshToken)?;

        let now = self.clock.now();
        if record.is_expired(now) {
            self.store.delete(refresh_token);
            debug!(user_id = %record.user_id(), "refresh token expired");
            return Err(AuthError::RefreshTokenExpired);
        }

        let Some(user) = self.user_store.find_one(record.user_id()).await? else {
            self.store.delete(refresh_token);
            debug!(user_id = %record.user_id(), "refresh for a missing user");
            return Err(AuthError::InvalidRefreshToken);
        };
        let user = UserView::from(user);

        let issued = self
            .issuer
            .issue(user.id, &user.email, &user.roles, &user.permissions, now)
            .await?;

        // Commit only if nobody rotated, revoked or swept the presented
        // token while we were awaiting the user store and signer.
        if !self.store.rotate(refresh_token, issued.record.clone()) {
            debug!(user_id = %user.id, "refresh lost a race for its token");
            return Err(AuthError::InvalidRefreshToken);
        }

        info!(user_id = %user.id, "session refreshed");
        Ok(issued.into_session(user))
    }

    async fn logout(&self, user_id: UserId) -> bool {
        let revoked = self.store.revoke_user(user_id);
        info!(%user_id, revoked, "user logged out");
        revoked
    }

    async fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.issuer.verify(token).await
    }
}
