use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::models::user::UserView;
use crate::responses::JsonResponse;
use crate::routes::auth::session::AuthSession;
use crate::state::AppState;

#[derive(Deserialize, Serialize)]
pub struct UpdateSubscriptionPayload {
    pub plan: String,
    pub status: String,
}

/// Updates the caller's subscription fields. Clients are expected to run
/// their session refresh afterwards so the exposed user view picks up the
/// change without a reload.
pub async fn handle_update_subscription(
    State(app_state): State<AppState>,
    AuthSession(claims): AuthSession,
    Json(payload): Json<UpdateSubscriptionPayload>,
) -> Response {
    if payload.plan.trim().is_empty() || payload.status.trim().is_empty() {
        return JsonResponse::bad_request("Plan and status are required").into_response();
    }

    let user_id = match Uuid::parse_str(&claims.id) {
        Ok(id) => id,
        Err(_) => return JsonResponse::unauthorized("Invalid user ID").into_response(),
    };

    match app_state
        .db
        .update_subscription(user_id, payload.plan.trim(), payload.status.trim())
        .await
    {
        Ok(Some(user)) => Json(json!({
            "success": true,
            "user": UserView::from_user(&user)
        }))
        .into_response(),
        Ok(None) => JsonResponse::not_found("User not found").into_response(),
        Err(e) => {
            tracing::error!("DB error updating subscription: {:?}", e);
            JsonResponse::server_error("Database error").into_response()
        }
    }
}
