//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use cartwright_core::{Email, Principal};

/// Session-stored identity.
///
/// Minimal data stored in the session to identify the logged-in principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Realm and database id.
    pub principal: Principal,
    /// Login email, for display.
    pub email: Email,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in principal.
    pub const CURRENT_USER: &str = "current_user";
}
