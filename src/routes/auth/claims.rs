use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::User;

/// How long an issued identity token stays valid.
pub const TOKEN_TTL_DAYS: i64 = 30;

/// Identity payload embedded in a signed token. The server never stores
/// issued tokens; everything needed to recognize the bearer rides in here.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Claims {
    pub id: String, // user UUID
    pub email: String,
    pub name: String,
    pub iat: usize, // issued-at (UNIX timestamp)
    pub exp: usize, // expiration (UNIX timestamp)
}

impl Claims {
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Claims {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            iat: now.timestamp() as usize,
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
        }
    }

    pub fn for_user(user: &User) -> Self {
        Claims::new(user.id.to_string(), user.email.clone(), user.name.clone())
    }
}
