use crate::routes::auth::claims::{Claims, TOKEN_TTL_DAYS};
use crate::routes::auth::AUTH_COOKIE;
use crate::{
    models::user::UserView,
    responses::JsonResponse,
    state::AppState,
    utils::{jwt::create_token, password::verify_password},
};

use axum::{
    extract::{Json, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::Duration as TimeDuration;
use uuid::Uuid;

use super::session::AuthSession;

#[derive(Deserialize, Serialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

pub async fn handle_login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Response {
    let user = match app_state.db.find_user_by_email(&payload.email).await {
        Ok(Some(record)) => record,
        Ok(None) => return JsonResponse::unauthorized("Invalid credentials").into_response(),
        Err(e) => {
            tracing::error!("DB error during login: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {
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
                        StatusCode::OK,
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
                    tracing::error!("Token error during login: {:?}", e);
                    JsonResponse::server_error("Token generation failed").into_response()
                }
            }
        }
        Ok(false) => JsonResponse::unauthorized("Invalid credentials").into_response(),
        Err(e) => {
            tracing::error!("Password verification error: {:?}", e);
            JsonResponse::server_error("Internal error").into_response()
        }
    }
}

pub async fn handle_me(
    State(app_state): State<AppState>,
    AuthSession(claims): AuthSession,
) -> Response {
    let user_id = match Uuid::parse_str(&claims.id) {
        Ok(id) => id,
        Err(_) => return JsonResponse::unauthorized("Invalid user ID").into_response(),
    };

    match app_state.db.find_user_by_id(user_id).await {
        Ok(Some(user)) => Json(json!({
            "success": true,
            "user": UserView::from_user(&user)
        }))
        .into_response(),
        Ok(None) => JsonResponse::unauthorized("User not found").into_response(),
        Err(e) => {
            tracing::error!("DB error in handle_me: {:?}", e);
            JsonResponse::server_error("Database error").into_response()
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
        routing::{get, post},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::db::mock_db::{sample_user, MockDb};
    use crate::routes::auth::claims::Claims;
    use crate::routes::auth::login::LoginPayload;
    use crate::routes::auth::test_support::{test_keys, test_state};
    use crate::utils::jwt::create_token;
    use crate::utils::password::hash_password;

    fn login_app(db: Arc<MockDb>) -> Router {
        Router::new()
            .route("/api/auth/login", post(super::handle_login))
            .route("/api/auth/me", get(super::handle_me))
            .with_state(test_state(db))
    }

    fn login_request(email: &str, password: &str) -> Request<Body> {
        let payload = LoginPayload {
            email: email.into(),
            password: password.into(),
        };
        Request::post("/api/auth/login")
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&payload).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_success_returns_token_and_user() {
        let mut user = sample_user("jane@example.com", "Jane Doe");
        user.password_hash = hash_password("correct-horse").unwrap();
        let db = Arc::new(MockDb::with_user(user));

        let res = login_app(db)
            .oneshot(login_request("jane@example.com", "correct-horse"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let set_cookie = res.headers().get("set-cookie").unwrap().to_str().unwrap();
        assert!(set_cookie.contains("auth_token="));

        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], true);
        assert!(json["token"].as_str().is_some());
        assert_eq!(json["user"]["email"], "jane@example.com");
        assert_eq!(json["user"]["subscription_plan"], "free");
        assert_eq!(json["user"]["subscriptionPlan"], "free");
    }

    #[tokio::test]
    async fn test_login_wrong_password_unauthorized() {
        let mut user = sample_user("jane@example.com", "Jane Doe");
        user.password_hash = hash_password("correct-horse").unwrap();
        let db = Arc::new(MockDb::with_user(user));

        let res = login_app(db)
            .oneshot(login_request("jane@example.com", "battery-staple"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_unknown_email_unauthorized() {
        let res = login_app(Arc::new(MockDb::default()))
            .oneshot(login_request("nobody@example.com", "whatever"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_with_bearer_token() {
        let user = sample_user("jane@example.com", "Jane Doe");
        let token = create_token(&Claims::for_user(&user), &test_keys()).unwrap();
        let db = Arc::new(MockDb::with_user(user));

        let res = login_app(db)
            .oneshot(
                Request::get("/api/auth/me")
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["user"]["name"], "Jane Doe");
    }

    #[tokio::test]
    async fn test_me_for_deleted_user_unauthorized() {
        let user = sample_user("jane@example.com", "Jane Doe");
        let token = create_token(&Claims::for_user(&user), &test_keys()).unwrap();
        // Token is valid but the account is gone.
        let db = Arc::new(MockDb::default());

        let res = login_app(db)
            .oneshot(
                Request::get("/api/auth/me")
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
