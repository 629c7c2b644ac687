use crate::config::Config;
use crate::db::user_repository::UserRepository;
use crate::utils::jwt::TokenKeys;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn UserRepository>,
    pub token_keys: Arc<TokenKeys>,
    pub config: Arc<Config>,
}
