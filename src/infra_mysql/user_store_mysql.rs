use super::util::is_dup_key;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::types::Json;
use sqlx::{MySqlPool, Row};

const USER_COLUMNS: &str =
    "id, email, name, timezone, preferences, roles, permissions, password_hash, created_at";

pub struct MySqlUserStore {
    pool: MySqlPool,
}

impl MySqlUserStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserStore { pool }
    }

    fn row_to_user(row: MySqlRow) -> Result<User, AuthError> {
        let store_err = |e: sqlx::Error| AuthError::Store(e.to_string());

        let id: UserId = row.try_get("id").map_err(store_err)?;
        let email: String = row.try_get("email").map_err(store_err)?;
        let name: String = row.try_get("name").map_err(store_err)?;
        let timezone: String = row.try_get("timezone").map_err(store_err)?;
        let Json(preferences): Json<serde_json::Value> =
            row.try_get("preferences").map_err(store_err)?;
        let Json(roles): Json<Vec<String>> = row.try_get("roles").map_err(store_err)?;
        let Json(permissions): Json<Vec<String>> =
            row.try_get("permissions").map_err(store_err)?;
        let password_hash: Option<String> = row.try_get("password_hash").map_err(store_err)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(store_err)?;

        Ok(User {
            id,
            email,
            name,
            timezone,
            preferences,
            roles,
            permissions,
            password_hash,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl UserStore for MySqlUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row_opt: Option<MySqlRow> =
            sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AuthError::Store(format!("query user by email: {e}")))?;

        row_opt.map(Self::row_to_user).transpose()
    }

    async fn find_one(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        let row_opt: Option<MySqlRow> =
            sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AuthError::Store(format!("query user by id: {e}")))?;

        row_opt.map(Self::row_to_user).transpose()
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AuthError> {
        let user = User {
            id: UserId::new_v4(),
            email: new_user.email,
            name: new_user.name,
            timezone: new_user.timezone,
            preferences: new_user.preferences,
            roles: new_user.roles,
            permissions: new_user.permissions,
            password_hash: Some(new_user.password_hash),
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            r#"
INSERT INTO users (id, email, name, timezone, preferences, roles, permissions, password_hash, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.timezone)
        .bind(Json(&user.preferences))
        .bind(Json(&user.roles))
        .bind(Json(&user.permissions))
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(e) if is_dup_key(&e) => Err(AuthError::UserAlreadyExists),
            Err(e) => Err(AuthError::Store(format!("insert user: {e}"))),
        }
    }
}
