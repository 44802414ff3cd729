//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (store round trip)
//!
//! # Pages
//! GET  /login                  - Login page (?registered=true shows a notice)
//! POST /login                  - Login action
//! GET  /register               - Register page
//! POST /register               - Register action
//! POST /logout                 - Logout action
//! GET  /account                - Customer profile and orders (requires auth)
//!
//! # API (JSON)
//! POST /api/customers/login    POST /api/customers/register
//! POST /api/customers/logout   GET  /api/customers/me
//! GET  /api/customers          GET|PATCH|DELETE /api/customers/{id}
//! POST /api/users/login        POST /api/users/logout
//! GET|POST /api/products       GET|PATCH|DELETE /api/products/{id}
//! GET|POST /api/categories     GET|PATCH|DELETE /api/categories/{id}
//! GET  /api/categories/{id}/parent-options
//! GET|POST /api/orders         GET|PATCH|DELETE /api/orders/{id}
//! GET|POST /api/media          GET|PATCH|DELETE /api/media/{id}
//! ```

pub mod account;
pub mod api;
pub mod auth;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::state::AppState;

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness probe: the store must answer.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match state.store().health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

/// Create the customer API router.
pub fn customer_api_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(api::customers::login))
        .route("/register", post(api::customers::register))
        .route("/logout", post(api::customers::logout))
        .route("/me", get(api::customers::me))
        .route("/", get(api::customers::list))
        .route(
            "/{id}",
            get(api::customers::show)
                .patch(api::customers::update)
                .delete(api::customers::delete),
        )
}

/// Create the admin user API router.
pub fn user_api_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(api::users::login))
        .route("/logout", post(api::users::logout))
}

/// Create the product API router.
pub fn product_api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api::products::list).post(api::products::create))
        .route(
            "/{id}",
            get(api::products::show)
                .patch(api::products::update)
                .delete(api::products::delete),
        )
}

/// Create the category API router.
pub fn category_api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api::categories::list).post(api::categories::create))
        .route(
            "/{id}",
            get(api::categories::show)
                .patch(api::categories::update)
                .delete(api::categories::delete),
        )
        .route("/{id}/parent-options", get(api::categories::parent_options))
}

/// Create the order API router.
pub fn order_api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api::orders::list).post(api::orders::create))
        .route(
            "/{id}",
            get(api::orders::show)
                .patch(api::orders::update)
                .delete(api::orders::delete),
        )
}

/// Create the media API router.
pub fn media_api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(api::media::list)
                .post(api::media::upload)
                .layer(DefaultBodyLimit::max(api::media::MAX_UPLOAD_BYTES)),
        )
        .route(
            "/{id}",
            get(api::media::show)
                .patch(api::media::update)
                .delete(api::media::delete),
        )
}

/// Create all API routes, mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/customers", customer_api_routes())
        .nest("/users", user_api_routes())
        .nest("/products", product_api_routes())
        .nest("/categories", category_api_routes())
        .nest("/orders", order_api_routes())
        .nest("/media", media_api_routes())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        // Auth pages
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        // Account
        .route("/account", get(account::index))
        // JSON API
        .nest("/api", api_routes())
}
