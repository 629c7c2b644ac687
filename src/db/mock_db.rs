use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::user::User;

use super::user_repository::UserRepository;

/// In-memory stand-in for the Postgres repository, used by handler tests.
pub struct MockDb {
    pub users: Mutex<HashMap<Uuid, User>>,
    pub should_fail: bool,
}

impl Default for MockDb {
    fn default() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            should_fail: false,
        }
    }
}

impl MockDb {
    pub fn failing() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            should_fail: true,
        }
    }

    pub fn with_user(user: User) -> Self {
        let db = Self::default();
        db.insert_user(user);
        db
    }

    pub fn insert_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    fn fail_if_requested(&self) -> Result<(), sqlx::Error> {
        if self.should_fail {
            return Err(sqlx::Error::Protocol("Mock DB failure".into()));
        }
        Ok(())
    }
}

pub fn sample_user(email: &str, name: &str) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: String::new(),
        name: name.to_string(),
        subscription_plan: None,
        subscription_status: None,
        created_at: OffsetDateTime::now_utc(),
    }
}

#[async_trait]
impl UserRepository for MockDb {
    async fn is_email_taken(&self, email: &str) -> Result<bool, sqlx::Error> {
        self.fail_if_requested()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .any(|user| user.email.eq_ignore_ascii_case(email)))
    }

    async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        self.fail_if_requested()?;
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            name: name.to_string(),
            subscription_plan: None,
            subscription_status: None,
            created_at: OffsetDateTime::now_utc(),
        };
        self.insert_user(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        self.fail_if_requested()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        self.fail_if_requested()?;
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }

    async fn update_subscription(
        &self,
        user_id: Uuid,
        plan: &str,
        status: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        self.fail_if_requested()?;
        let mut users = self.users.lock().unwrap();
        Ok(users.get_mut(&user_id).map(|user| {
            user.subscription_plan = Some(plan.to_string());
            user.subscription_status = Some(status.to_string());
            user.clone()
        }))
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, sqlx::Error> {
        self.fail_if_requested()?;
        Ok(self.users.lock().unwrap().remove(&user_id).is_some())
    }
}
