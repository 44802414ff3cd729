//! Cartwright storefront library.
//!
//! The storefront is an axum server exposing a JSON REST API over the
//! catalog, customer, order and media collections, plus server-rendered
//! login, registration and account pages. The binary in `main.rs` wires
//! this library to `PostgreSQL`; tests wire it to [`db::MemoryStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
mod filters;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
#[cfg(test)]
mod test_support;
pub mod validation;

use axum::{
    Router,
    http::{
        HeaderValue,
        header::{CONTENT_DISPOSITION, CONTENT_SECURITY_POLICY},
    },
};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::services::media::MEDIA_URL_PREFIX;
use crate::state::AppState;

/// Static assets, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the full application router.
///
/// Layers, outermost first: Sentry hub and transaction, request tracing,
/// security headers, request id, sessions. Uploaded media is served
/// sandboxed, and SVG files as downloads.
pub fn app<S>(state: AppState, sessions: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    let media = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(middleware::security_headers::MEDIA_CSP),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            CONTENT_DISPOSITION,
            middleware::security_headers::svg_attachment,
        ))
        .service(ServeDir::new(&state.config().media_dir));

    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .nest_service(MEDIA_URL_PREFIX, media)
        .layer(sessions)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                        tracing::debug!(latency_ms, "response");
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{HeaderMap, Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::db::{CategoryStore, CustomerStore, MemoryStore};
    use crate::test_support::category;

    struct TestApp {
        router: Router,
        store: Arc<MemoryStore>,
    }

    struct Reply {
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    }

    impl Reply {
        fn json(&self) -> Value {
            serde_json::from_str(&self.body).unwrap()
        }

        /// `name=value` of the session cookie, for the next request.
        fn cookie(&self) -> String {
            let set_cookie = self.headers[header::SET_COOKIE].to_str().unwrap();
            set_cookie.split(';').next().unwrap().to_owned()
        }
    }

    fn test_app() -> TestApp {
        let store = Arc::new(MemoryStore::new());
        let config = StorefrontConfig::for_tests();
        let sessions = middleware::session_layer(tower_sessions::MemoryStore::default(), &config);
        let state = AppState::new(config, store.clone());
        TestApp {
            router: app(state, sessions),
            store,
        }
    }

    impl TestApp {
        async fn send(&self, request: Request<Body>) -> Reply {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            Reply {
                status,
                headers,
                body: String::from_utf8(bytes.to_vec()).unwrap(),
            }
        }

        async fn post_json(&self, uri: &str, body: &Value, cookie: Option<&str>) -> Reply {
            let mut request = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
            if let Some(cookie) = cookie {
                request = request.header(header::COOKIE, cookie);
            }
            self.send(request.body(Body::from(body.to_string())).unwrap())
                .await
        }

        async fn get(&self, uri: &str, cookie: Option<&str>) -> Reply {
            let mut request = Request::get(uri);
            if let Some(cookie) = cookie {
                request = request.header(header::COOKIE, cookie);
            }
            self.send(request.body(Body::empty()).unwrap()).await
        }
    }

    fn registration() -> Value {
        json!({
            "email": "Ada@Example.com",
            "password": "analytical-engine",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "acceptedTerms": true,
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let reply = app.get("/health", None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, "ok");
        assert!(reply.headers.contains_key("x-request-id"));

        assert_eq!(app.get("/health/ready", None).await.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_then_duplicate() {
        let app = test_app();

        let reply = app
            .post_json("/api/customers/register", &registration(), None)
            .await;
        assert_eq!(reply.status, StatusCode::CREATED);
        let body = reply.json();
        assert_eq!(body["message"], "Registration successful");
        assert_eq!(body["customer"]["email"], "ada@example.com");
        assert!(body["customer"].get("password").is_none());
        assert!(!reply.body.contains("argon2"));

        let reply = app
            .post_json("/api/customers/register", &registration(), None)
            .await;
        assert_eq!(reply.status, StatusCode::CONFLICT);
        assert_eq!(
            reply.json()["message"],
            "An account with this email already exists"
        );
    }

    #[tokio::test]
    async fn test_register_missing_fields() {
        let app = test_app();
        for field in ["email", "password", "firstName", "lastName", "acceptedTerms"] {
            let mut body = registration();
            body.as_object_mut().unwrap().remove(field);
            let reply = app.post_json("/api/customers/register", &body, None).await;
            assert_eq!(reply.status, StatusCode::BAD_REQUEST, "missing {field}");
            assert_eq!(reply.json()["message"], "Missing required fields");
        }

        let mut body = registration();
        body["password"] = json!("short");
        let reply = app.post_json("/api/customers/register", &body, None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);

        let reply = app.get("/api/customers", None).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
        assert!(app.store.list_customers(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_sets_session() {
        let app = test_app();
        app.post_json("/api/customers/register", &registration(), None)
            .await;

        let reply = app
            .post_json(
                "/api/customers/login",
                &json!({ "email": "ada@example.com", "password": "wrong-password" }),
                None,
            )
            .await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.json()["message"], error::INVALID_LOGIN);

        let reply = app
            .post_json(
                "/api/customers/login",
                &json!({ "email": "ada@example.com" }),
                None,
            )
            .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);

        let reply = app
            .post_json(
                "/api/customers/login",
                &json!({ "email": "ada@example.com", "password": "analytical-engine" }),
                None,
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.json(), json!({ "success": true }));
        let cookie = reply.cookie();
        assert!(cookie.starts_with("cw_session="));

        let me = app.get("/api/customers/me", Some(&cookie)).await.json();
        assert_eq!(me["user"]["firstName"], "Ada");
        assert!(me["user"]["lastLogin"].is_string());

        let page = app.get("/account", Some(&cookie)).await;
        assert_eq!(page.status, StatusCode::OK);
        assert!(page.body.contains("Ada Lovelace"));

        let reply = app
            .post_json("/api/customers/logout", &json!({}), Some(&cookie))
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        let me = app.get("/api/customers/me", Some(&cookie)).await.json();
        assert_eq!(me, json!({ "user": null }));
    }

    #[tokio::test]
    async fn test_catalog_writes_need_login() {
        let app = test_app();
        let reply = app
            .post_json(
                "/api/products",
                &json!({ "name": "Mug", "price": 1200, "sku": "MUG-1" }),
                None,
            )
            .await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);

        let reply = app.get("/api/products", None).await;
        assert_eq!(reply.json(), json!({ "docs": [], "totalDocs": 0 }));
    }

    #[tokio::test]
    async fn test_parent_options_endpoint() {
        let app = test_app();
        let kitchen = app
            .store
            .insert_category(&category("Kitchen", None))
            .await
            .unwrap();
        let mugs = app
            .store
            .insert_category(&category("Mugs", Some(kitchen.id)))
            .await
            .unwrap();

        let reply = app
            .get(&format!("/api/categories/{}/parent-options", mugs.id), None)
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        let body = reply.json();
        assert_eq!(body["totalDocs"], 1);
        assert_eq!(body["docs"][0]["id"], kitchen.id.as_i32());

        let reply = app.get("/api/categories/999/parent-options", None).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_pages() {
        let app = test_app();

        let reply = app.get("/login?registered=true", None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains(routes::auth::REGISTERED_NOTICE));
        assert!(!app.get("/login", None).await.body.contains("Account created"));

        let reply = app.get("/register", None).await;
        assert!(reply.body.contains("Create an Account"));

        let reply = app.get("/account", None).await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.headers[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_uploaded_svg_is_sandboxed() {
        let app = test_app();
        app.post_json("/api/customers/register", &registration(), None)
            .await;
        let cookie = app
            .post_json(
                "/api/customers/login",
                &json!({ "email": "ada@example.com", "password": "analytical-engine" }),
                None,
            )
            .await
            .cookie();

        let boundary = "cartwright-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"logo.svg\"\r\n\
             Content-Type: image/svg+xml\r\n\r\n\
             <svg xmlns=\"http://www.w3.org/2000/svg\"><script>alert(1)</script></svg>\r\n\
             --{boundary}--\r\n"
        );
        let reply = app
            .send(
                Request::post("/api/media")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .header(header::COOKIE, &cookie)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED);
        let url = reply.json()["doc"]["url"].as_str().unwrap().to_owned();

        let reply = app.get(&url, None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.headers[header::CONTENT_TYPE], "image/svg+xml");
        assert_eq!(
            reply.headers[header::CONTENT_SECURITY_POLICY],
            middleware::security_headers::MEDIA_CSP
        );
        assert_eq!(reply.headers[header::CONTENT_DISPOSITION], "attachment");
        assert_eq!(reply.headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

        let page = app.get("/login", None).await;
        assert_eq!(
            page.headers[header::CONTENT_SECURITY_POLICY],
            middleware::security_headers::PAGE_CSP
        );
        assert!(!page.headers.contains_key(header::CONTENT_DISPOSITION));
    }

    #[tokio::test]
    async fn test_register_form_round_trip() {
        let app = test_app();
        let form = "firstName=Ada&lastName=Lovelace&email=ada%40example.com\
                    &password=analytical-engine&confirmPassword=analytical-engine&acceptedTerms=on";

        let reply = app
            .send(
                Request::post("/register")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(form))
                    .unwrap(),
            )
            .await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.headers[header::LOCATION], "/login?registered=true");

        let reply = app
            .send(
                Request::post("/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("email=ada%40example.com&password=nope-nope"))
                    .unwrap(),
            )
            .await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert!(reply.body.contains(error::INVALID_LOGIN));
        assert!(reply.body.contains("value=\"ada@example.com\""));
    }
}
