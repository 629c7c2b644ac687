use axum::{
    extract::{Json, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::Duration as TimeDuration;

use crate::routes::auth::claims::{Claims, TOKEN_TTL_DAYS};
use crate::routes::auth::AUTH_COOKIE;
use crate::{
    models::user::UserView,
    responses::JsonResponse,
    state::AppState,
    utils::{jwt::create_token, password::hash_password},
};

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Deserialize, Serialize)]
pub struct SignupPayload {
    pub email: String,
    pub name: String,
    pub password: String,
}

fn validate_payload(payload: &SignupPayload) -> Option<&'static str> {
    let email = payload.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Some("A valid email address is required");
    }
    if payload.name.trim().is_empty() {
        return Some("Name is required");
    }
    if payload.password.len() < MIN_PASSWORD_LENGTH {
        return Some("Password must be at least 8 characters");
    }
    None
}

pub async fn handle_signup(
    State(app_state): State<AppState>,
    Json(payload): Json<SignupPayload>,
) -> Response {
    if let Some(message) = validate_payload(&payload) {
        return JsonResponse::bad_request(message).into_response();
    }

    let email = payload.email.trim().to_lowercase();

    match app_state.db.is_email_taken(&email).await {
        Ok(true) => {
            return JsonResponse::conflict("An account with that email already exists")
                .into_response()
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!("DB error checking email: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Password hashing failed: {:?}", e);
            return JsonResponse::server_error("Could not create account").into_response();
        }
    };

    let user = match app_state
        .db
        .create_user(&email, payload.name.trim(), &password_hash)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("DB error creating user: {:?}", e);
            return JsonResponse::server_error("Could not create account").into_response();
        }
    };

    let claims = Claims::for_user(&user);
    match create_token(&claims, &app_state.token_keys) {
        Ok(token) => {
            let cookie = Cookie::build((AUTH_COOKIE, token.clone()))
                .http_only(true)
                .secure(false)
                .same_site(SameSite::Lax)
                .path("/")
                .max_age(TimeDuration::days(TOKEN_TTL_DAYS))
                .build();

            let mut headers = HeaderMap::new();
            headers.insert(
                header::SET_COOKIE,
                HeaderValue::from_str(&cookie.to_string()).unwrap(),
            );
            (
                StatusCode::CREATED,
                headers,
                Json(json!({
                    "success": true,
                    "token": token,
                    "user": UserView::from_user(&user)
                })),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Token error during signup: {:?}", e);
            JsonResponse::server_error("Token generation failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        extract::Request,
        http::StatusCode,
        routing::post,
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::db::mock_db::{sample_user, MockDb};
    use crate::routes::auth::signup::SignupPayload;
    use crate::routes::auth::test_support::{test_keys, test_state};
    use crate::utils::jwt::verify_token;

    fn signup_app(db: Arc<MockDb>) -> Router {
        Router::new()
            .route("/api/auth/signup", post(super::handle_signup))
            .with_state(test_state(db))
    }

    fn signup_request(email: &str, name: &str, password: &str) -> Request<Body> {
        let payload = SignupPayload {
            email: email.into(),
            name: name.into(),
            password: password.into(),
        };
        Request::post("/api/auth/signup")
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&payload).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_signup_token_embeds_new_user_id() {
        let db = Arc::new(MockDb::default());

        let res = signup_app(db.clone())
            .oneshot(signup_request("a@x.com", "Ada", "long-enough-pw"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::CREATED);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();

        let created_id = json["user"]["id"].as_str().unwrap().to_string();
        let token = json["token"].as_str().unwrap();
        let claims = verify_token(token, &test_keys()).expect("fresh token should verify");
        assert_eq!(claims.id, created_id);
        assert_eq!(claims.email, "a@x.com");

        let stored = db.users.lock().unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_conflicts() {
        let db = Arc::new(MockDb::with_user(sample_user("a@x.com", "Ada")));

        let res = signup_app(db)
            .oneshot(signup_request("a@x.com", "Ada", "long-enough-pw"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_signup_rejects_short_password() {
        let res = signup_app(Arc::new(MockDb::default()))
            .oneshot(signup_request("a@x.com", "Ada", "short"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_signup_rejects_bad_email() {
        let res = signup_app(Arc::new(MockDb::default()))
            .oneshot(signup_request("not-an-email", "Ada", "long-enough-pw"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_signup_db_failure_is_server_error() {
        let res = signup_app(Arc::new(MockDb::failing()))
            .oneshot(signup_request("a@x.com", "Ada", "long-enough-pw"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
