//! `/api/users` - admin login.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use cartwright_core::Principal;
use serde_json::json;
use tower_sessions::Session;

use super::ApiJson;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::forms::LoginForm;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Log an admin user in. Same contract as the customer login.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(form): ApiJson<LoginForm>,
) -> Result<Response> {
    if !form.is_complete() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_owned(),
        ));
    }

    let user = AuthService::new(state.store(), state.config().lockout)
        .login_user(&form.email, &form.password)
        .await?;

    set_current_user(
        &session,
        &CurrentUser {
            principal: Principal::admin(user.id.as_i32()),
            email: user.email.clone(),
        },
    )
    .await?;
    set_sentry_user(&format!("admin:{}", user.id), Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "Admin logged in");

    Ok(Json(json!({ "success": true })).into_response())
}

pub async fn logout(session: Session) -> Result<Response> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Json(json!({ "message": "You have been logged out successfully." })).into_response())
}
