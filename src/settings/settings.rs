use crate::application_impl::{
    DEFAULT_ACCESS_TTL, DEFAULT_HASH_COST, DEFAULT_REFRESH_TTL, DEFAULT_SWEEP_INTERVAL,
    SessionConfig, TokenPolicy,
};
use crate::domain_model::{SigningSecret, expiry_after};
use anyhow::{Result, anyhow};
use chrono::Utc;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub http: Http,
    pub log: Log,
    pub user: User,
    pub mysql: Option<MySql>,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub signing_secret: SigningSecret,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: u64,
    #[serde(default = "default_hash_cost")]
    pub hash_cost: u32,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_backend")]
    pub hasher_backend: String, // "fake" or "real"
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub backend: String, // "memory" or "mysql"
}

#[derive(Deserialize)]
pub struct MySql {
    pub dsn: String,
}

impl std::fmt::Debug for MySql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySql").field("dsn", &"<redacted>").finish()
    }
}

fn default_issuer() -> String {
    "nutrilog".to_string()
}

fn default_access_ttl_secs() -> u64 {
    DEFAULT_ACCESS_TTL.as_secs()
}

fn default_refresh_ttl_secs() -> u64 {
    DEFAULT_REFRESH_TTL.as_secs()
}

fn default_hash_cost() -> u32 {
    DEFAULT_HASH_COST
}

fn default_sweep_interval_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL.as_secs()
}

fn default_backend() -> String {
    "real".to_string()
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Settings> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .map_err(|e| anyhow!(e))?
            .try_deserialize()
            .map_err(|e| anyhow!(e))?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.auth.access_ttl_secs == 0 || self.auth.refresh_ttl_secs == 0 {
            return Err(anyhow!("token TTLs must be positive"));
        }
        let now = Utc::now();
        for (name, secs) in [
            ("auth.access_ttl_secs", self.auth.access_ttl_secs),
            ("auth.refresh_ttl_secs", self.auth.refresh_ttl_secs),
        ] {
            if expiry_after(now, Duration::from_secs(secs)).is_none() {
                return Err(anyhow!("{} is out of range: {}", name, secs));
            }
        }
        if self.auth.sweep_interval_secs == 0 {
            return Err(anyhow!("auth.sweep_interval_secs must be positive"));
        }
        if self.auth.hash_cost == 0 {
            return Err(anyhow!("auth.hash_cost must be positive"));
        }
        if !matches!(self.auth.hasher_backend.as_str(), "fake" | "real") {
            return Err(anyhow!(
                "Unknown hasher backend: {}",
                self.auth.hasher_backend
            ));
        }
        match self.user.backend.as_str() {
            "memory" => {}
            "mysql" if self.mysql.is_some() => {}
            "mysql" => return Err(anyhow!("user backend mysql needs a [mysql] section")),
            other => return Err(anyhow!("Unknown user backend: {}", other)),
        }
        match (&self.http.cert_path, &self.http.key_path) {
            (Some(_), Some(_)) | (None, None) => {}
            _ => return Err(anyhow!("http.cert_path and http.key_path go together")),
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            token_policy: TokenPolicy {
                signing_secret: self.auth.signing_secret.clone(),
                access_ttl: Duration::from_secs(self.auth.access_ttl_secs),
                refresh_ttl: Duration::from_secs(self.auth.refresh_ttl_secs),
            },
            hash_cost: self.auth.hash_cost,
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.auth.sweep_interval_secs)
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

const ENV_PREFIX: &str = "NUTRILOG";

/// Load settings from `path` (or the build's default file), with
/// `NUTRILOG__SECTION__KEY` environment variables layered on top.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}
