//! Customer collection operations.
//!
//! Registration and login live in [`super::auth`]; this module covers the
//! profile reads and writes behind `/api/customers`.

use cartwright_core::{AccessPolicy, CustomerId, Operation, Principal};

use super::auth::{self, MIN_PASSWORD_LENGTH};
use super::{CollectionError, authorize, customer_scope};
use crate::db::Store;
use crate::models::{Customer, CustomerPatch};
use crate::validation::ValidationErrors;

const POLICY: AccessPolicy = AccessPolicy::CUSTOMERS;

/// Customer profile service.
pub struct CustomerService<'a> {
    store: &'a dyn Store,
}

impl<'a> CustomerService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Fetch one customer.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller is that customer (or an admin);
    /// `NotFound` if it does not exist.
    pub async fn get(
        &self,
        user: Option<&Principal>,
        id: CustomerId,
    ) -> Result<Customer, CollectionError> {
        authorize(&POLICY, Operation::Read, user, Some(owner(id)))?;
        self.store
            .find_customer(id)
            .await?
            .ok_or(CollectionError::NotFound)
    }

    /// List customers visible to the caller.
    ///
    /// # Errors
    ///
    /// `Forbidden` when not logged in.
    pub async fn list(&self, user: Option<&Principal>) -> Result<Vec<Customer>, CollectionError> {
        authorize(&POLICY, Operation::Read, user, None)?;
        Ok(self.store.list_customers(customer_scope(user)).await?)
    }

    /// Apply a profile patch, re-hashing the password if one is given.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `NotFound`, `Validation` for failed rules, `Conflict`
    /// for a taken email and `InvalidReference` for unknown wishlist products.
    pub async fn update(
        &self,
        user: Option<&Principal>,
        id: CustomerId,
        mut patch: CustomerPatch,
    ) -> Result<Customer, CollectionError> {
        authorize(&POLICY, Operation::Update, user, Some(owner(id)))?;
        let existing = self
            .store
            .find_customer(id)
            .await?
            .ok_or(CollectionError::NotFound)?;

        let password = patch.password.take();
        let mut data = existing.data;
        let mut errors = ValidationErrors::new();
        patch.apply(&mut data, &mut errors);
        data.validate(&mut errors);

        let password_hash = match password {
            Some(password) => match auth::validate_password(&password) {
                Ok(()) => Some(hash(&password)?),
                Err(_) => {
                    errors.push(
                        "password",
                        format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
                    );
                    None
                }
            },
            None => None,
        };
        let data = errors.finish(|| data)?;

        let customer = self.store.update_customer(id, &data).await?;
        if let Some(password_hash) = password_hash {
            self.store.set_customer_password(id, &password_hash).await?;
            tracing::info!(customer_id = %id, "Customer password changed");
        }
        Ok(customer)
    }

    /// Delete a customer.
    ///
    /// # Errors
    ///
    /// `Forbidden` when not logged in, `NotFound`, or `Conflict` while the
    /// customer still has orders.
    pub async fn delete(
        &self,
        user: Option<&Principal>,
        id: CustomerId,
    ) -> Result<CustomerId, CollectionError> {
        authorize(&POLICY, Operation::Delete, user, Some(owner(id)))?;
        if self.store.delete_customer(id).await? {
            tracing::info!(customer_id = %id, "Customer deleted");
            Ok(id)
        } else {
            Err(CollectionError::NotFound)
        }
    }
}

const fn owner(id: CustomerId) -> Principal {
    Principal::customer(id.as_i32())
}

fn hash(password: &str) -> Result<String, CollectionError> {
    auth::hash_password(password).map_err(|_| CollectionError::PasswordHash)
}
