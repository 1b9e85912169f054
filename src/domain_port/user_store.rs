use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Look a user up by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn find_one(&self, user_id: UserId) -> Result<Option<User>, AuthError>;

    /// Insert a user. Fails with `UserAlreadyExists` if the email is taken.
    async fn create(&self, new_user: NewUser) -> Result<User, AuthError>;
}
