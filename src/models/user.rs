use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use uuid::Uuid;

/// Plan assigned to accounts that never picked one.
pub const DEFAULT_PLAN: &str = "free";
/// Status assigned to subscriptions that never recorded one.
pub const DEFAULT_STATUS: &str = "active";

#[derive(Debug, FromRow, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub subscription_plan: Option<String>,
    pub subscription_status: Option<String>,
    pub created_at: time::OffsetDateTime,
}

/// Normalized projection of a [`User`] handed to clients and persisted in the
/// client session store. Internally canonical: one spelling, no optionals.
/// Stored data from older clients used camelCase spellings for the
/// subscription fields, so the wire format emits and accepts both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub subscription_plan: String,
    pub subscription_status: String,
}

impl UserView {
    pub fn from_user(user: &User) -> Self {
        UserView {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            subscription_plan: user
                .subscription_plan
                .clone()
                .unwrap_or_else(|| DEFAULT_PLAN.to_string()),
            subscription_status: user
                .subscription_status
                .clone()
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
        }
        .normalized()
    }

    /// Fills defaulted subscription fields. Idempotent: a normalized view
    /// normalizes to itself.
    pub fn normalized(mut self) -> Self {
        if self.subscription_plan.trim().is_empty() {
            self.subscription_plan = DEFAULT_PLAN.to_string();
        }
        if self.subscription_status.trim().is_empty() {
            self.subscription_status = DEFAULT_STATUS.to_string();
        }
        self
    }
}

/// Wire shape for [`UserView`]. Serialization writes both spellings of the
/// subscription fields; deserialization takes whichever is present, preferring
/// the snake_case one when both appear.
#[derive(Serialize, Deserialize)]
struct UserViewWire {
    id: Uuid,
    email: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    subscription_plan: Option<String>,
    #[serde(
        rename = "subscriptionPlan",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    subscription_plan_legacy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subscription_status: Option<String>,
    #[serde(
        rename = "subscriptionStatus",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    subscription_status_legacy: Option<String>,
}

impl Serialize for UserView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        UserViewWire {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            subscription_plan: Some(self.subscription_plan.clone()),
            subscription_plan_legacy: Some(self.subscription_plan.clone()),
            subscription_status: Some(self.subscription_status.clone()),
            subscription_status_legacy: Some(self.subscription_status.clone()),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UserView {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = UserViewWire::deserialize(deserializer)?;
        Ok(UserView {
            id: wire.id,
            email: wire.email,
            name: wire.name,
            subscription_plan: wire
                .subscription_plan
                .or(wire.subscription_plan_legacy)
                .unwrap_or_default(),
            subscription_status: wire
                .subscription_status
                .or(wire.subscription_status_legacy)
                .unwrap_or_default(),
        }
        .normalized())
    }
}
