//! End-to-end tests for the Cartwright storefront.
//!
//! The tests talk HTTP to a running server backed by a migrated database,
//! so they are `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p cartwright-cli -- migrate
//! cargo run -p cartwright-storefront &
//! cargo test -p cartwright-integration-tests -- --ignored
//! ```
//!
//! `STOREFRONT_TEST_URL` overrides the default `http://localhost:3000`.

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Password used for every account the tests register.
pub const TEST_PASSWORD: &str = "integration-pass-1";

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client with its own cookie jar, i.e. its own session.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// An address nobody else has registered.
#[must_use]
pub fn unique_email() -> String {
    format!("it-{}@example.com", Uuid::new_v4().simple())
}

/// Registration body for `email`.
#[must_use]
pub fn registration(email: &str) -> Value {
    json!({
        "email": email,
        "password": TEST_PASSWORD,
        "firstName": "Integration",
        "lastName": "Tester",
        "acceptedTerms": true,
    })
}

/// POST a JSON body to `path`.
///
/// # Panics
///
/// Panics if the request fails to send.
pub async fn post_json(client: &Client, path: &str, body: &Value) -> Response {
    client
        .post(format!("{}{path}", base_url()))
        .json(body)
        .send()
        .await
        .expect("request failed")
}

/// GET `path`.
///
/// # Panics
///
/// Panics if the request fails to send.
pub async fn get(client: &Client, path: &str) -> Response {
    client
        .get(format!("{}{path}", base_url()))
        .send()
        .await
        .expect("request failed")
}

/// Register a fresh customer and log `client` in as them.
///
/// Returns the customer document.
///
/// # Panics
///
/// Panics if registration or login does not succeed.
pub async fn logged_in_customer(client: &Client) -> Value {
    let email = unique_email();
    let resp = post_json(client, "/api/customers/register", &registration(&email)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("invalid JSON");

    let resp = post_json(
        client,
        "/api/customers/login",
        &json!({ "email": email, "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    body["customer"].clone()
}
