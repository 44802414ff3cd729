//! Login and registration pages.
//!
//! The pages post back to themselves as plain forms. With scripting
//! enabled, `static/js/auth.js` submits the same fields to the JSON API
//! instead and only uses these handlers for the first render.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use cartwright_core::Principal;

use crate::error::{INVALID_LOGIN, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::forms::{LoginForm, RegisterForm};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;
use crate::validation::ValidationErrors;

/// Shown on the login page after a successful registration.
pub const REGISTERED_NOTICE: &str =
    "Account created successfully! Please log in with your credentials.";

/// Where a successful login lands.
pub const ACCOUNT_PATH: &str = "/account";

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub registered: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub notice: Option<&'static str>,
    /// Form-wide failure, e.g. bad credentials.
    pub message: Option<String>,
    pub errors: ValidationErrors,
    pub email: String,
}

impl LoginTemplate {
    fn error(&self, field: &str) -> Option<&str> {
        self.errors.first(field)
    }
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub message: Option<String>,
    pub errors: ValidationErrors,
    pub form: RegisterForm,
}

impl RegisterTemplate {
    fn error(&self, field: &str) -> Option<&str> {
        self.errors.first(field)
    }

    fn phone(&self) -> &str {
        self.form.phone.as_deref().unwrap_or_default()
    }
}

fn rerender(template: impl IntoResponse, status: StatusCode) -> Response {
    (status, template).into_response()
}

/// `GET /login`
pub async fn login_page(Query(query): Query<LoginQuery>) -> impl IntoResponse {
    LoginTemplate {
        notice: (query.registered.as_deref() == Some("true")).then_some(REGISTERED_NOTICE),
        message: None,
        errors: ValidationErrors::new(),
        email: String::new(),
    }
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let page = |message: Option<String>, errors: ValidationErrors| LoginTemplate {
        notice: None,
        message,
        errors,
        email: form.email.clone(),
    };

    if let Err(errors) = form.validate() {
        return Ok(rerender(page(None, errors), StatusCode::BAD_REQUEST));
    }

    let customer = match AuthService::new(state.store(), state.config().lockout)
        .login_customer(&form.email, &form.password)
        .await
    {
        Ok(customer) => customer,
        Err(AuthError::InvalidCredentials | AuthError::Locked) => {
            return Ok(rerender(
                page(Some(INVALID_LOGIN.to_owned()), ValidationErrors::new()),
                StatusCode::UNAUTHORIZED,
            ));
        }
        Err(e) => return Err(e.into()),
    };

    set_current_user(
        &session,
        &CurrentUser {
            principal: Principal::customer(customer.id.as_i32()),
            email: customer.data.email.clone(),
        },
    )
    .await?;
    set_sentry_user(&customer.id, Some(customer.data.email.as_str()));

    Ok(Redirect::to(ACCOUNT_PATH).into_response())
}

/// `GET /register`
pub async fn register_page() -> impl IntoResponse {
    RegisterTemplate {
        message: None,
        errors: ValidationErrors::new(),
        form: RegisterForm::default(),
    }
}

/// `POST /register`
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Result<Response> {
    if let Err(errors) = form.validate() {
        return Ok(rerender(
            RegisterTemplate {
                message: None,
                errors,
                form,
            },
            StatusCode::BAD_REQUEST,
        ));
    }

    let (status, message) = match AuthService::new(state.store(), state.config().lockout)
        .register_customer(form.clone().into_registration())
        .await
    {
        Ok(_) => return Ok(Redirect::to("/login?registered=true").into_response()),
        Err(AuthError::UserAlreadyExists) => (
            StatusCode::CONFLICT,
            "An account with this email already exists".to_owned(),
        ),
        Err(AuthError::InvalidEmail(_)) => {
            (StatusCode::BAD_REQUEST, "Invalid email address".to_owned())
        }
        Err(AuthError::WeakPassword(msg)) => (StatusCode::BAD_REQUEST, msg),
        Err(e) => return Err(e.into()),
    };

    Ok(rerender(
        RegisterTemplate {
            message: Some(message),
            errors: ValidationErrors::new(),
            form,
        },
        status,
    ))
}

/// `POST /logout`
pub async fn logout(session: Session) -> Result<Response> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/login").into_response())
}
