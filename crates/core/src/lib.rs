//! Cartwright Core - Shared types library.
//!
//! This crate provides the types shared by every Cartwright component:
//! - `storefront` - Customer-facing shop and collection REST API
//! - `cli` - Command-line tools for migrations, seeding, and admin users
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Access predicates live here because they are plain boolean
//! functions over a session principal.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money, emails, slugs, order numbers, and statuses
//! - [`access`] - Access predicates and per-collection policies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod types;

pub use access::{AccessArgs, AccessPolicy, Operation, Principal, Realm};
pub use types::*;
