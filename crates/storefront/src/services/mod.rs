//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Password login, registration, and lockout for both realms
//! - `customers`, `catalog`, `orders`, `media` - Collection operations
//! - `hooks` - Lifecycle hooks run around collection writes
//!
//! Collection operations run in a fixed order: access check, before hooks,
//! validation, persistence, after hooks.

pub mod auth;
pub mod catalog;
pub mod customers;
mod error;
pub mod hooks;
pub mod media;
pub mod orders;

pub use error::{CollectionError, authorize, customer_scope};
