use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

use crate::models::user::UserView;
use crate::routes::auth::verify_token::VerifyTokenResponse;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("verification request failed: {0}")]
    Transport(String),
}

/// How the session provider reaches the server's verification endpoint.
/// `Ok(Some(user))` is a confirmed session, `Ok(None)` an explicit rejection;
/// `Err` means the call itself failed and nothing is known either way.
#[async_trait]
pub trait VerificationGateway: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<Option<UserView>, GatewayError>;
}

pub struct HttpVerificationGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpVerificationGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpVerificationGateway {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl VerificationGateway for HttpVerificationGateway {
    async fn verify_token(&self, token: &str) -> Result<Option<UserView>, GatewayError> {
        let url = format!("{}/api/auth/verify", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(&json!({ "token": token }))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Transport(format!(
                "verification endpoint answered {}",
                response.status()
            )));
        }

        let body: VerifyTokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if body.authenticated {
            Ok(body.user.map(UserView::normalized))
        } else {
            Ok(None)
        }
    }
}
