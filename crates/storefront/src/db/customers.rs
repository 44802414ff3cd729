//! `PostgreSQL` customer repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{Postgres, Transaction};

use cartwright_core::{CustomerId, Email, ProductId};

use super::{CustomerStore, PgStore, RepositoryError, map_delete_error, map_write_error};
use crate::models::{Address, Credentials, Customer, CustomerData, LoginState, NewCustomer};

const CUSTOMER_COLUMNS: &str = r"
    c.id, c.email, c.first_name, c.last_name, c.phone, c.addresses,
    c.accepted_terms, c.subscribe_to_newsletter, c.last_login,
    c.created_at, c.updated_at,
    COALESCE(
        (SELECT array_agg(w.product_id ORDER BY w.position)
         FROM storefront.customer_wishlist w WHERE w.customer_id = c.id),
        '{}'
    ) AS wishlist
";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    email: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    addresses: Json<Vec<Address>>,
    accepted_terms: bool,
    subscribe_to_newsletter: bool,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    wishlist: Vec<i32>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: CustomerId::new(row.id),
            data: CustomerData {
                email,
                first_name: row.first_name,
                last_name: row.last_name,
                phone: row.phone,
                addresses: row.addresses.0,
                wishlist: row.wishlist.into_iter().map(ProductId::new).collect(),
                accepted_terms: row.accepted_terms,
                subscribe_to_newsletter: row.subscribe_to_newsletter,
            },
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerAuthRow {
    #[sqlx(flatten)]
    customer: CustomerRow,
    password_hash: String,
    login_attempts: i32,
    lock_until: Option<DateTime<Utc>>,
}

async fn replace_wishlist(
    tx: &mut Transaction<'_, Postgres>,
    id: CustomerId,
    wishlist: &[ProductId],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM storefront.customer_wishlist WHERE customer_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    for (position, product) in wishlist.iter().enumerate() {
        sqlx::query(
            r"
            INSERT INTO storefront.customer_wishlist (customer_id, product_id, position)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(id)
        .bind(product)
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .execute(&mut **tx)
        .await
        .map_err(|e| map_write_error(e, "duplicate wishlist entry"))?;
    }

    Ok(())
}

impl PgStore {
    async fn fetch_customer(&self, id: CustomerId) -> Result<Customer, RepositoryError> {
        self.find_customer(id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl CustomerStore for PgStore {
    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM storefront.customer c WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(Customer::try_from).transpose()
    }

    async fn find_customer_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Customer, Credentials)>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerAuthRow>(&format!(
            r"
            SELECT {CUSTOMER_COLUMNS}, c.password_hash, c.login_attempts, c.lock_until
            FROM storefront.customer c
            WHERE c.email = $1
            "
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(r) => {
                let credentials = Credentials {
                    password_hash: r.password_hash,
                    login: LoginState {
                        attempts: r.login_attempts,
                        lock_until: r.lock_until,
                    },
                };
                Ok(Some((Customer::try_from(r.customer)?, credentials)))
            }
            None => Ok(None),
        }
    }

    async fn list_customers(
        &self,
        only: Option<CustomerId>,
    ) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            SELECT {CUSTOMER_COLUMNS}
            FROM storefront.customer c
            WHERE $1::INTEGER IS NULL OR c.id = $1
            ORDER BY c.created_at DESC, c.id DESC
            "
        ))
        .bind(only)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(Customer::try_from).collect()
    }

    async fn insert_customer(&self, new: NewCustomer) -> Result<Customer, RepositoryError> {
        let mut tx = self.pool().begin().await?;
        let data = &new.data;

        let id: CustomerId = sqlx::query_scalar(
            r"
            INSERT INTO storefront.customer
                (email, password_hash, first_name, last_name, phone, addresses,
                 accepted_terms, subscribe_to_newsletter, last_login)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(&data.email)
        .bind(&new.password_hash)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.phone)
        .bind(Json(&data.addresses))
        .bind(data.accepted_terms)
        .bind(data.subscribe_to_newsletter)
        .bind(new.last_login)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "email already exists"))?;

        replace_wishlist(&mut tx, id, &data.wishlist).await?;
        tx.commit().await?;

        self.fetch_customer(id).await
    }

    async fn update_customer(
        &self,
        id: CustomerId,
        data: &CustomerData,
    ) -> Result<Customer, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let result = sqlx::query(
            r"
            UPDATE storefront.customer
            SET email = $2, first_name = $3, last_name = $4, phone = $5, addresses = $6,
                accepted_terms = $7, subscribe_to_newsletter = $8, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&data.email)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.phone)
        .bind(Json(&data.addresses))
        .bind(data.accepted_terms)
        .bind(data.subscribe_to_newsletter)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "email already exists"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        replace_wishlist(&mut tx, id, &data.wishlist).await?;
        tx.commit().await?;

        self.fetch_customer(id).await
    }

    async fn set_customer_password(
        &self,
        id: CustomerId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.customer
            SET password_hash = $2, login_attempts = 0, lock_until = NULL, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn set_customer_login_state(
        &self,
        id: CustomerId,
        state: LoginState,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE storefront.customer SET login_attempts = $2, lock_until = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(state.attempts)
        .bind(state.lock_until)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn set_customer_last_login(
        &self,
        id: CustomerId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE storefront.customer SET last_login = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.customer WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| map_delete_error(e, "customer"))?;

        Ok(result.rows_affected() > 0)
    }
}
