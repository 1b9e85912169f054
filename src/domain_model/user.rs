use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    pub fn new_v4() -> Self {
        UserId(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(UserId)
    }
}

pub const DEFAULT_ROLE: &str = "user";
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// A stored user, including its password hash. Never leaves the crate's
/// service boundary; callers only ever see a [`UserView`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub timezone: String,
    pub preferences: serde_json::Value,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub timezone: String,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub preferences: serde_json::Value,
}

/// The public projection of a [`User`]. It has no secret field, so stripping
/// the password hash is enforced by the type rather than by convention.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub timezone: String,
    pub preferences: serde_json::Value,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        let User {
            id,
            email,
            name,
            timezone,
            preferences,
            roles,
            permissions,
            password_hash: _,
            created_at: _,
        } = user;

        UserView {
            id,
            email,
            name,
            timezone,
            preferences,
            roles,
            permissions,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
