use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_crypto::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use sqlx::MySqlPool;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    session_store: Arc<RefreshTokenStore>,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let mut pool = None;
        let user_store: Arc<dyn UserStore> = match settings.user.backend.as_str() {
            "memory" => Arc::new(MemoryUserStore::new()),
            "mysql" => {
                let mysql = settings
                    .mysql
                    .as_ref()
                    .ok_or_else(|| anyhow!("user backend mysql needs a [mysql] section"))?;
                let mysql_pool = MySqlPool::connect(&mysql.dsn).await?;
                pool = Some(mysql_pool.clone());
                Arc::new(MySqlUserStore::new(mysql_pool))
            }
            other => return Err(anyhow!("Unknown user backend: {}", other)),
        };

        let password_hasher: Arc<dyn PasswordHasher> =
            match settings.auth.hasher_backend.as_str() {
                "fake" => {
                    warn!("fake password hasher selected; passwords are stored reversibly");
                    Arc::new(FakePasswordHasher::new())
                }
                "real" => Arc::new(Argon2PasswordHasher),
                other => return Err(anyhow!("Unknown hasher backend: {}", other)),
            };

        let token_signer: Arc<dyn TokenSigner> =
            Arc::new(JwtTokenSigner::new(settings.auth.issuer.clone()));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let session_store = Arc::new(RefreshTokenStore::new());

        let auth_service: Arc<dyn AuthService> = Arc::new(SessionManager::new(
            user_store,
            password_hasher,
            token_signer,
            session_store.clone(),
            clock.clone(),
            settings.session_config(),
        ));

        let cancel = CancellationToken::new();
        let sweeper = SessionSweeper::new(
            session_store.clone(),
            clock,
            settings.sweep_interval(),
            cancel.clone(),
        );
        let sweeper_handle = tokio::spawn(async move {
            sweeper.run().await;
        });

        info!(
            user_backend = %settings.user.backend,
            sweep_interval_secs = settings.auth.sweep_interval_secs,
            "server started"
        );

        Ok(Self {
            auth_service,
            session_store,
            sweeper_handle: Mutex::new(Some(sweeper_handle)),
            cancel,
            pool,
        })
    }

    pub fn active_sessions(&self) -> usize {
        self.session_store.len()
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = match self.sweeper_handle.lock() {
            Ok(mut lock) => lock.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            let r = handle.await;
            info!("sweeper handle dropped: {:?}", r);
        }

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
