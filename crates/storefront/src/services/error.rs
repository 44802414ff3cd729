//! Collection service errors and the access gate.

use thiserror::Error;

use cartwright_core::{AccessArgs, AccessPolicy, CustomerId, Operation, Principal, Realm};

use crate::db::RepositoryError;
use crate::validation::ValidationErrors;

/// Errors from collection operations.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// The access policy denied the operation.
    #[error("forbidden")]
    Forbidden,

    /// One or more field rules failed.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// The target record does not exist.
    #[error("not found")]
    NotFound,

    /// Duplicate unique value, or a record that is still referenced.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A relationship names a record that does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// Reading or writing an uploaded file failed.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Password hashing failed.
    #[error("password hashing error")]
    PasswordHash,

    /// Any other store failure.
    #[error("repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CollectionError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::InvalidReference(msg) => Self::InvalidReference(msg),
            other => Self::Repository(other),
        }
    }
}

/// Check `policy` for `op`, optionally against the record owner.
///
/// # Errors
///
/// Returns `CollectionError::Forbidden` when the policy denies.
pub fn authorize(
    policy: &AccessPolicy,
    op: Operation,
    user: Option<&Principal>,
    owner: Option<Principal>,
) -> Result<(), CollectionError> {
    let args = match owner {
        Some(owner) => AccessArgs::with_target(user, owner),
        None => AccessArgs::new(user),
    };
    if policy.allows(op, &args) {
        Ok(())
    } else {
        Err(CollectionError::Forbidden)
    }
}

/// The customer a list should be scoped to: customers see only their own
/// records, admins see everything.
#[must_use]
pub fn customer_scope(user: Option<&Principal>) -> Option<CustomerId> {
    user.filter(|p| p.realm == Realm::Customers)
        .map(|p| CustomerId::new(p.id))
}
