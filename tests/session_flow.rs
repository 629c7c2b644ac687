//! End-to-end session lifecycle: the client-side provider reconciling against
//! the real verification route, with the HTTP hop replaced by an in-process
//! router call.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{body::Body, http::Request, routing::post, Router};
use tower::ServiceExt;

use prepdeck_backend::config::Config;
use prepdeck_backend::db::mock_db::{sample_user, MockDb};
use prepdeck_backend::models::user::UserView;
use prepdeck_backend::routes::auth::claims::Claims;
use prepdeck_backend::routes::auth::verify_token::{handle_verify_token, VerifyTokenResponse};
use prepdeck_backend::session::{
    AuthProvider, GatewayError, MemoryStore, PersistedSession, SessionStore, VerificationGateway,
};
use prepdeck_backend::state::AppState;
use prepdeck_backend::utils::jwt::{create_token, TokenKeys};

const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef";

fn app_state(db: Arc<MockDb>) -> AppState {
    AppState {
        db,
        token_keys: Arc::new(TokenKeys::from_secret(TEST_SECRET).unwrap()),
        config: Arc::new(Config {
            database_url: "postgres://unused".into(),
            frontend_origin: "https://localhost:5173".into(),
            token_secret: None,
        }),
    }
}

fn verify_router(db: Arc<MockDb>) -> Router {
    Router::new()
        .route("/api/auth/verify", post(handle_verify_token))
        .with_state(app_state(db))
}

/// Drives the verification route directly instead of over the network.
struct RouterGateway {
    app: Router,
}

#[async_trait]
impl VerificationGateway for RouterGateway {
    async fn verify_token(&self, token: &str) -> Result<Option<UserView>, GatewayError> {
        let request = Request::post("/api/auth/verify")
            .header("Content-Type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&serde_json::json!({ "token": token })).unwrap(),
            ))
            .unwrap();

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Transport(format!(
                "verification endpoint answered {}",
                response.status()
            )));
        }

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let parsed: VerifyTokenResponse =
            serde_json::from_slice(&body).map_err(|e| GatewayError::Transport(e.to_string()))?;

        if parsed.authenticated {
            Ok(parsed.user)
        } else {
            Ok(None)
        }
    }
}

#[tokio::test]
async fn persisted_session_is_reconciled_against_the_server() {
    let mut user = sample_user("jane@example.com", "Jane Doe");
    user.subscription_plan = Some("pro".into());
    let token = create_token(
        &Claims::for_user(&user),
        &TokenKeys::from_secret(TEST_SECRET).unwrap(),
    )
    .unwrap();
    let db = Arc::new(MockDb::with_user(user.clone()));

    // Storage holds a stale projection from before the plan change.
    let stale = UserView {
        id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        subscription_plan: "free".into(),
        subscription_status: "active".into(),
    };
    let store = Arc::new(MemoryStore::default());
    PersistedSession::save(store.as_ref(), &token, &stale);

    let gateway = Arc::new(RouterGateway {
        app: verify_router(db.clone()),
    });
    let provider = AuthProvider::new(store.clone(), gateway);

    provider.initialize().await.unwrap();

    assert!(provider.is_authenticated());
    assert_eq!(provider.user().unwrap().subscription_plan, "pro");
    // The persisted copy now matches the server too.
    let persisted = PersistedSession::load(store.as_ref()).unwrap();
    assert_eq!(persisted.user.subscription_plan, "pro");
}

#[tokio::test]
async fn deleting_the_account_signs_the_client_out_on_refresh() {
    let user = sample_user("jane@example.com", "Jane Doe");
    let token = create_token(
        &Claims::for_user(&user),
        &TokenKeys::from_secret(TEST_SECRET).unwrap(),
    )
    .unwrap();
    let db = Arc::new(MockDb::with_user(user.clone()));

    let store = Arc::new(MemoryStore::default());
    PersistedSession::save(store.as_ref(), &token, &UserView::from_user(&user));

    let gateway = Arc::new(RouterGateway {
        app: verify_router(db.clone()),
    });
    let provider = AuthProvider::new(store.clone(), gateway);

    provider.initialize().await.unwrap();
    assert!(provider.is_authenticated());

    // Account deletion elsewhere; the token is still cryptographically valid.
    db.users.lock().unwrap().clear();

    provider.refresh_user().await.unwrap();

    assert!(!provider.is_authenticated());
    assert!(provider.user().is_none());
    assert!(PersistedSession::load(store.as_ref()).is_none());
}

#[tokio::test]
async fn tampered_token_is_rejected_end_to_end() {
    let user = sample_user("jane@example.com", "Jane Doe");
    let token = create_token(
        &Claims::for_user(&user),
        &TokenKeys::from_secret(TEST_SECRET).unwrap(),
    )
    .unwrap();
    let db = Arc::new(MockDb::with_user(user.clone()));

    let mut tampered = token.clone();
    tampered.push('x');

    let store = Arc::new(MemoryStore::default());
    PersistedSession::save(store.as_ref(), &tampered, &UserView::from_user(&user));

    let gateway = Arc::new(RouterGateway {
        app: verify_router(db),
    });
    let provider = AuthProvider::new(store.clone(), gateway);

    provider.initialize().await.unwrap();

    assert!(!provider.is_authenticated());
    assert!(store.get("prepdeck_token").unwrap().is_none());
}
