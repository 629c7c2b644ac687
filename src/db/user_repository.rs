use async_trait::async_trait;
use uuid::Uuid;

use crate::models::user::User;

/// Authoritative user store. Tokens embed the user id; every verification
/// re-reads through here so a deleted account invalidates outstanding tokens.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn is_email_taken(&self, email: &str) -> Result<bool, sqlx::Error>;
    async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error>;
    async fn update_subscription(
        &self,
        user_id: Uuid,
        plan: &str,
        status: &str,
    ) -> Result<Option<User>, sqlx::Error>;
    async fn delete_user(&self, user_id: Uuid) -> Result<bool, sqlx::Error>;
}
