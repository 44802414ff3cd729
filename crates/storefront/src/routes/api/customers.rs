//! `/api/customers` - registration, login, and customer profiles.

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use cartwright_core::{CustomerId, Principal, Realm};
use serde_json::json;
use tower_sessions::Session;

use super::{ApiJson, Deleted, Doc, Docs};
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::forms::{LoginForm, RegisterForm};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, CustomerPatch};
use crate::services::auth::AuthService;
use crate::services::customers::CustomerService;
use crate::state::AppState;

/// Log a customer in and start a session.
///
/// `200 {success: true}`, `400` when a field is missing, `401` otherwise.
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

    let customer = AuthService::new(state.store(), state.config().lockout)
        .login_customer(&form.email, &form.password)
        .await?;

    set_current_user(
        &session,
        &CurrentUser {
            principal: Principal::customer(customer.id.as_i32()),
            email: customer.data.email.clone(),
        },
    )
    .await?;
    set_sentry_user(&customer.id, Some(customer.data.email.as_str()));
    tracing::info!(customer_id = %customer.id, "Customer logged in");

    Ok(Json(json!({ "success": true })).into_response())
}

/// Register a customer.
///
/// `201 {message, customer}` on success; `400` for missing or invalid
/// fields; `409` when the email is taken.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RegisterForm>,
) -> Result<Response> {
    if !form.is_complete() {
        return Err(AppError::BadRequest("Missing required fields".to_owned()));
    }

    let customer = AuthService::new(state.store(), state.config().lockout)
        .register_customer(form.into_registration())
        .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(json!({
            "message": "Registration successful",
            "customer": customer,
        })),
    )
        .into_response())
}

/// End the session.
pub async fn logout(session: Session) -> Result<Response> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Json(json!({ "message": "You have been logged out successfully." })).into_response())
}

/// The logged-in customer, or `{user: null}`.
pub async fn me(State(state): State<AppState>, auth: OptionalAuth) -> Result<Response> {
    let customer = match auth.principal() {
        Some(principal) if principal.realm == Realm::Customers => {
            state
                .store()
                .find_customer(CustomerId::new(principal.id))
                .await?
        }
        _ => None,
    };
    Ok(Json(json!({ "user": customer })).into_response())
}

pub async fn list(State(state): State<AppState>, auth: OptionalAuth) -> Result<Response> {
    let customers = CustomerService::new(state.store())
        .list(auth.principal())
        .await?;
    Ok(Docs::from(customers).into_response())
}

pub async fn show(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<CustomerId>,
) -> Result<Response> {
    let customer = CustomerService::new(state.store())
        .get(auth.principal(), id)
        .await?;
    Ok(Doc { doc: customer }.into_response())
}

pub async fn update(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<CustomerId>,
    ApiJson(patch): ApiJson<CustomerPatch>,
) -> Result<Response> {
    let customer = CustomerService::new(state.store())
        .update(auth.principal(), id, patch)
        .await?;
    Ok(Doc { doc: customer }.into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<CustomerId>,
) -> Result<Response> {
    let id = CustomerService::new(state.store())
        .delete(auth.principal(), id)
        .await?;
    Ok(Deleted { id }.into_response())
}
