use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;

use crate::routes::auth::claims::Claims;
use crate::routes::auth::AUTH_COOKIE;
use crate::state::AppState;
use crate::utils::jwt::verify_token;

/// Verified identity of the requester. One verification path for both token
/// transports: the `Authorization: Bearer` header is checked first, then the
/// `auth_token` cookie.
#[derive(Debug, PartialEq)]
pub struct AuthSession(pub Claims);

impl<S> FromRequestParts<S> for AuthSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_owned);

        let token = match bearer {
            Some(token) => token,
            None => {
                let jar = CookieJar::from_headers(&parts.headers);
                jar.get(AUTH_COOKIE)
                    .map(|cookie| cookie.value().to_owned())
                    .ok_or(StatusCode::UNAUTHORIZED)?
            }
        };

        let claims = verify_token(&token, &app_state.token_keys).ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AuthSession(claims))
    }
}
