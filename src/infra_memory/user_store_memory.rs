use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

pub struct MemoryUserStore {
    users: DashMap<UserId, User>,
    ids_by_email: DashMap<String, UserId>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        MemoryUserStore {
            users: DashMap::new(),
            ids_by_email: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Drop a user outright. Used to simulate accounts deleted elsewhere.
    pub fn remove(&self, user_id: UserId) -> Option<User> {
        let (_, user) = self.users.remove(&user_id)?;
        self.ids_by_email.remove(&user.email);
        Some(user)
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let Some(user_id) = self.ids_by_email.get(email).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&user_id).map(|user| user.clone()))
    }

    async fn find_one(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self.users.get(&user_id).map(|user| user.clone()))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AuthError> {
        match self.ids_by_email.entry(new_user.email.clone()) {
            Entry::Occupied(_) => Err(AuthError::UserAlreadyExists),
            Entry::Vacant(slot) => {
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
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Test".to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            password_hash: "hash".to_string(),
            roles: vec![DEFAULT_ROLE.to_string()],
            permissions: vec![],
            preferences: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn created_users_are_found_by_email_and_id() {
        let store = MemoryUserStore::new();
        let created = store.create(new_user("a@b.com")).await.unwrap();

        let by_email = store.find_by_email("a@b.com").await.unwrap().unwrap();
        let by_id = store.find_one(created.id).await.unwrap().unwrap();

        assert_eq!(by_email.id, created.id);
        assert_eq!(by_id.email, "a@b.com");
        assert_eq!(by_id.password_hash.as_deref(), Some("hash"));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@b.com")).await.unwrap();

        let err = store.create(new_user("a@b.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn removed_users_disappear_from_both_lookups() {
        let store = MemoryUserStore::new();
        let created = store.create(new_user("a@b.com")).await.unwrap();

        assert!(store.remove(created.id).is_some());
        assert!(store.find_one(created.id).await.unwrap().is_none());
        assert!(store.find_by_email("a@b.com").await.unwrap().is_none());
    }
}
