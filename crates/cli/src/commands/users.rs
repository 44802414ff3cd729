//! Admin user management.
//!
//! # Usage
//!
//! ```bash
//! cw-cli users create -e admin@example.com -p 'correct horse battery'
//! ```
//!
//! The password may also come from `CW_ADMIN_PASSWORD`.

use thiserror::Error;

use cartwright_storefront::config::LockoutConfig;
use cartwright_storefront::db::PgStore;
use cartwright_storefront::services::auth::{AuthError, AuthService};

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a new admin user and return its id.
pub async fn create_user(email: &str, password: &str) -> Result<i32, UserError> {
    let store = PgStore::new(connect().await?);

    let user = AuthService::new(&store, LockoutConfig::default())
        .create_user(email, password)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id.as_i32())
}
