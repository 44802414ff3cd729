//! Persistence port and its two adapters.
//!
//! Services talk to storage only through the [`Store`] trait. [`PgStore`]
//! backs it with `PostgreSQL`; [`MemoryStore`] keeps everything in process for
//! tests and local demos and enforces the same uniqueness and reference rules.
//!
//! # Schema: `storefront`
//!
//! - `customer`, `customer_wishlist` - shopper accounts (addresses as JSONB)
//! - `admin_user` - back-office accounts
//! - `media` - uploaded file metadata
//! - `product`, `product_image`, `product_category` - catalog
//! - `category` - hierarchical categories
//! - `customer_order`, `order_item` - orders (addresses as JSONB snapshots)
//! - `tower_sessions.session` - session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p cartwright-cli -- migrate
//! ```

mod categories;
mod customers;
mod media;
pub mod memory;
mod orders;
mod products;
mod users;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use cartwright_core::{
    CategoryId, CustomerId, Email, MediaId, OrderId, OrderNumber, ProductId, ProductStatus, UserId,
};

use crate::models::{
    Category, CategoryData, Credentials, Customer, CustomerData, LoginState, Media, MediaData,
    NewCustomer, Order, OrderData, Product, ProductData, User,
};

pub use memory::MemoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email) or a record still in use.
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A relationship points at a record that does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(String),
}

/// Map unique and foreign-key violations to their domain errors.
pub(crate) fn map_write_error(e: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            let constraint = db_err.constraint().unwrap_or("relationship").to_owned();
            return RepositoryError::InvalidReference(constraint);
        }
    }
    RepositoryError::Database(e)
}

/// Map foreign-key violations on delete to "still referenced".
pub(crate) fn map_delete_error(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Conflict(format!("{what} is still referenced"));
    }
    RepositoryError::Database(e)
}

/// Optional filters for product listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductFilter {
    pub status: Option<ProductStatus>,
    pub category: Option<CategoryId>,
    pub featured: Option<bool>,
}

impl ProductFilter {
    /// True if `product` passes every set filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.status.is_none_or(|s| product.data.status == s)
            && self
                .category
                .is_none_or(|c| product.data.categories.contains(&c))
            && self.featured.is_none_or(|f| product.data.featured == f)
    }
}

/// Customer persistence.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError>;

    /// Load a customer together with its login secret, for authentication.
    async fn find_customer_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Customer, Credentials)>, RepositoryError>;

    /// List customers, optionally only the one with `only`'s id.
    async fn list_customers(
        &self,
        only: Option<CustomerId>,
    ) -> Result<Vec<Customer>, RepositoryError>;

    /// Insert a registration. Duplicate emails are a `Conflict`.
    async fn insert_customer(&self, new: NewCustomer) -> Result<Customer, RepositoryError>;

    async fn update_customer(
        &self,
        id: CustomerId,
        data: &CustomerData,
    ) -> Result<Customer, RepositoryError>;

    async fn set_customer_password(
        &self,
        id: CustomerId,
        password_hash: &str,
    ) -> Result<(), RepositoryError>;

    /// Persist lockout counters.
    async fn set_customer_login_state(
        &self,
        id: CustomerId,
        state: LoginState,
    ) -> Result<(), RepositoryError>;

    async fn set_customer_last_login(
        &self,
        id: CustomerId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Returns `false` if no such customer existed.
    async fn delete_customer(&self, id: CustomerId) -> Result<bool, RepositoryError>;
}

/// Admin user persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_user_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, Credentials)>, RepositoryError>;

    async fn insert_user(&self, email: &Email, password_hash: &str)
    -> Result<User, RepositoryError>;

    async fn set_user_login_state(
        &self,
        id: UserId,
        state: LoginState,
    ) -> Result<(), RepositoryError>;
}

/// Product persistence.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, RepositoryError>;

    /// Unknown categories or images are an `InvalidReference`; a duplicate
    /// name or SKU is a `Conflict`.
    async fn insert_product(&self, data: &ProductData) -> Result<Product, RepositoryError>;

    async fn update_product(
        &self,
        id: ProductId,
        data: &ProductData,
    ) -> Result<Product, RepositoryError>;

    /// Overwrite the stock level only.
    async fn set_inventory(&self, id: ProductId, inventory: i32) -> Result<(), RepositoryError>;

    /// A product that appears on an order is a `Conflict`.
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;
}

/// Category persistence.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    async fn insert_category(&self, data: &CategoryData) -> Result<Category, RepositoryError>;

    async fn update_category(
        &self,
        id: CategoryId,
        data: &CategoryData,
    ) -> Result<Category, RepositoryError>;

    /// Children lose their parent; product assignments are dropped.
    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// List orders, optionally only those placed by `customer`.
    async fn list_orders(&self, customer: Option<CustomerId>)
    -> Result<Vec<Order>, RepositoryError>;

    async fn insert_order(
        &self,
        number: &OrderNumber,
        data: &OrderData,
    ) -> Result<Order, RepositoryError>;

    /// The order number is never touched by updates.
    async fn update_order(&self, id: OrderId, data: &OrderData) -> Result<Order, RepositoryError>;

    async fn delete_order(&self, id: OrderId) -> Result<bool, RepositoryError>;
}

/// Media persistence.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn find_media(&self, id: MediaId) -> Result<Option<Media>, RepositoryError>;

    async fn list_media(&self) -> Result<Vec<Media>, RepositoryError>;

    async fn insert_media(&self, data: &MediaData) -> Result<Media, RepositoryError>;

    async fn update_media(&self, id: MediaId, data: &MediaData) -> Result<Media, RepositoryError>;

    /// Product images using the file are removed; categories lose their image.
    async fn delete_media(&self, id: MediaId) -> Result<bool, RepositoryError>;
}

/// Everything the storefront persists.
#[async_trait]
pub trait Store:
    CustomerStore + UserStore + ProductStore + CategoryStore + OrderStore + MediaStore
{
    /// Cheap round trip used by the readiness probe.
    async fn health_check(&self) -> Result<(), RepositoryError>;
}

/// `PostgreSQL`-backed [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
