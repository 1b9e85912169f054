#![allow(dead_code)]

use chrono::Utc;
use nutrilog_auth::application_impl::*;
use nutrilog_auth::application_port::*;
use nutrilog_auth::domain_model::*;
use nutrilog_auth::domain_port::*;
use nutrilog_auth::infra_crypto::*;
use nutrilog_auth::infra_memory::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const TEST_COST: u32 = 1;

/// Memory user store that counts `create` calls.
pub struct CountingUserStore {
    pub inner: MemoryUserStore,
    creates: AtomicUsize,
}

impl CountingUserStore {
    pub fn new() -> Self {
        CountingUserStore {
            inner: MemoryUserStore::new(),
            creates: AtomicUsize::new(0),
        }
    }

    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl UserStore for CountingUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        self.inner.find_by_email(email).await
    }

    async fn find_one(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        self.inner.find_one(user_id).await
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AuthError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(new_user).await
    }
}

pub struct Harness {
    pub manager: Arc<SessionManager>,
    pub store: Arc<RefreshTokenStore>,
    pub users: Arc<CountingUserStore>,
    pub clock: Arc<ManualClock>,
}

pub fn harness() -> Harness {
    let store = Arc::new(RefreshTokenStore::new());
    let users = Arc::new(CountingUserStore::new());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let config = SessionConfig {
        token_policy: TokenPolicy::new(SigningSecret::new("integration-secret").unwrap()),
        hash_cost: TEST_COST,
    };

    let manager = Arc::new(SessionManager::new(
        users.clone(),
        Arc::new(FakePasswordHasher::new()),
        Arc::new(JwtTokenSigner::new("nutrilog")),
        store.clone(),
        clock.clone(),
        config,
    ));

    Harness {
        manager,
        store,
        users,
        clock,
    }
}

impl Harness {
    /// Insert a user directly, bypassing `register`.
    pub async fn seed_user(&self, email: &str, password: &str) -> User {
        let password_hash = FakePasswordHasher::new()
            .hash(password, TEST_COST)
            .await
            .unwrap();
        self.users
            .inner
            .create(NewUser {
                email: email.to_string(),
                name: "Seeded".to_string(),
                timezone: DEFAULT_TIMEZONE.to_string(),
                password_hash,
                roles: vec![DEFAULT_ROLE.to_string()],
                permissions: vec![],
                preferences: serde_json::json!({ "calorieGoal": 2000 }),
            })
            .await
            .unwrap()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        self.manager
            .login(LoginInput {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
    }

    pub fn live_token_count(&self, tokens: &[RefreshToken]) -> usize {
        tokens.iter().filter(|t| self.store.get(t).is_some()).count()
    }
}
