//! In-process [`Store`] used by tests and local demos.
//!
//! Mirrors the `PostgreSQL` constraints: unique names and emails, foreign
//! keys on every relationship, and the same cascade rules on delete. The
//! lock is never held across an `.await`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use cartwright_core::{
    CategoryId, CustomerId, Email, MediaId, OrderId, OrderNumber, ProductId, UserId,
};

use super::{
    CategoryStore, CustomerStore, MediaStore, OrderStore, ProductFilter, ProductStore,
    RepositoryError, Store, UserStore,
};
use crate::models::{
    Category, CategoryData, Credentials, Customer, CustomerData, LoginState, Media, MediaData,
    NewCustomer, Order, OrderData, Product, ProductData, User,
};

/// A table keyed by serial id.
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i32, T>,
    next_id: i32,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn allocate(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Rows newest first, matching `ORDER BY created_at DESC, id DESC`.
    fn newest_first(&self) -> impl Iterator<Item = &T> {
        self.rows.values().rev()
    }
}

#[derive(Debug, Default)]
struct Tables {
    customers: Table<(Customer, Credentials)>,
    users: Table<(User, Credentials)>,
    products: Table<Product>,
    categories: Table<Category>,
    orders: Table<Order>,
    media: Table<Media>,
}

impl Tables {
    fn check_customer(&self, id: CustomerId, data: &CustomerData) -> Result<(), RepositoryError> {
        if self
            .customers
            .rows
            .values()
            .any(|(c, _)| c.id != id && c.data.email == data.email)
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        self.check_products(&data.wishlist, "customer_wishlist_product_id_fkey")
    }

    fn check_products(&self, ids: &[ProductId], constraint: &str) -> Result<(), RepositoryError> {
        if ids
            .iter()
            .all(|id| self.products.rows.contains_key(&id.as_i32()))
        {
            Ok(())
        } else {
            Err(RepositoryError::InvalidReference(constraint.to_owned()))
        }
    }

    fn check_product(&self, id: ProductId, data: &ProductData) -> Result<(), RepositoryError> {
        if self
            .products
            .rows
            .values()
            .any(|p| p.id != id && (p.data.name == data.name || p.data.sku == data.sku))
        {
            return Err(RepositoryError::Conflict(
                "product name or SKU already exists".to_owned(),
            ));
        }
        if !data
            .images
            .iter()
            .all(|i| self.media.rows.contains_key(&i.image.as_i32()))
        {
            return Err(RepositoryError::InvalidReference(
                "product_image_media_id_fkey".to_owned(),
            ));
        }
        if !data
            .categories
            .iter()
            .all(|c| self.categories.rows.contains_key(&c.as_i32()))
        {
            return Err(RepositoryError::InvalidReference(
                "product_category_category_id_fkey".to_owned(),
            ));
        }
        Ok(())
    }

    fn check_category(&self, id: CategoryId, data: &CategoryData) -> Result<(), RepositoryError> {
        if self
            .categories
            .rows
            .values()
            .any(|c| c.id != id && c.data.name == data.name)
        {
            return Err(RepositoryError::Conflict(
                "category name already exists".to_owned(),
            ));
        }
        if let Some(parent) = data.parent
            && !self.categories.rows.contains_key(&parent.as_i32())
        {
            return Err(RepositoryError::InvalidReference(
                "category_parent_id_fkey".to_owned(),
            ));
        }
        if let Some(image) = data.image
            && !self.media.rows.contains_key(&image.as_i32())
        {
            return Err(RepositoryError::InvalidReference(
                "category_image_id_fkey".to_owned(),
            ));
        }
        Ok(())
    }

    fn check_order(&self, data: &OrderData) -> Result<(), RepositoryError> {
        if !self.customers.rows.contains_key(&data.customer.as_i32()) {
            return Err(RepositoryError::InvalidReference(
                "customer_order_customer_id_fkey".to_owned(),
            ));
        }
        let products: Vec<ProductId> = data.items.iter().map(|i| i.product).collect();
        self.check_products(&products, "order_item_product_id_fkey")
    }

    /// Category with its derived `products` list filled in.
    fn category_view(&self, category: &Category) -> Category {
        let mut view = category.clone();
        view.products = self
            .products
            .rows
            .values()
            .filter(|p| p.data.categories.contains(&category.id))
            .map(|p| p.id)
            .collect();
        view
    }
}

/// [`Store`] backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables.customers.rows.get(&id.as_i32()).map(|(c, _)| c.clone()))
    }

    async fn find_customer_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Customer, Credentials)>, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables
            .customers
            .rows
            .values()
            .find(|(c, _)| &c.data.email == email)
            .cloned())
    }

    async fn list_customers(
        &self,
        only: Option<CustomerId>,
    ) -> Result<Vec<Customer>, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables
            .customers
            .newest_first()
            .filter(|(c, _)| only.is_none_or(|id| c.id == id))
            .map(|(c, _)| c.clone())
            .collect())
    }

    async fn insert_customer(&self, new: NewCustomer) -> Result<Customer, RepositoryError> {
        let mut tables = self.tables.lock();
        tables.check_customer(CustomerId::new(0), &new.data)?;

        let now = Utc::now();
        let id = tables.customers.allocate();
        let customer = Customer {
            id: CustomerId::new(id),
            data: new.data,
            last_login: Some(new.last_login),
            created_at: now,
            updated_at: now,
        };
        let credentials = Credentials {
            password_hash: new.password_hash,
            login: LoginState::default(),
        };
        tables
            .customers
            .rows
            .insert(id, (customer.clone(), credentials));
        Ok(customer)
    }

    async fn update_customer(
        &self,
        id: CustomerId,
        data: &CustomerData,
    ) -> Result<Customer, RepositoryError> {
        let mut tables = self.tables.lock();
        tables.check_customer(id, data)?;

        let (customer, _) = tables
            .customers
            .rows
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;
        customer.data = data.clone();
        customer.updated_at = Utc::now();
        Ok(customer.clone())
    }

    async fn set_customer_password(
        &self,
        id: CustomerId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock();
        let (customer, credentials) = tables
            .customers
            .rows
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;
        password_hash.clone_into(&mut credentials.password_hash);
        credentials.login = LoginState::default();
        customer.updated_at = Utc::now();
        Ok(())
    }

    async fn set_customer_login_state(
        &self,
        id: CustomerId,
        state: LoginState,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock();
        if let Some((_, credentials)) = tables.customers.rows.get_mut(&id.as_i32()) {
            credentials.login = state;
        }
        Ok(())
    }

    async fn set_customer_last_login(
        &self,
        id: CustomerId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock();
        let (customer, _) = tables
            .customers
            .rows
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;
        customer.last_login = Some(at);
        Ok(())
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock();
        if tables.orders.rows.values().any(|o| o.data.customer == id) {
            return Err(RepositoryError::Conflict(
                "customer is still referenced".to_owned(),
            ));
        }
        Ok(tables.customers.rows.remove(&id.as_i32()).is_some())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables.users.rows.get(&id.as_i32()).map(|(u, _)| u.clone()))
    }

    async fn find_user_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, Credentials)>, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables
            .users
            .rows
            .values()
            .find(|(u, _)| &u.email == email)
            .cloned())
    }

    async fn insert_user(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.tables.lock();
        if tables.users.rows.values().any(|(u, _)| &u.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let now = Utc::now();
        let id = tables.users.allocate();
        let user = User {
            id: UserId::new(id),
            email: email.clone(),
            created_at: now,
            updated_at: now,
        };
        let credentials = Credentials {
            password_hash: password_hash.to_owned(),
            login: LoginState::default(),
        };
        tables.users.rows.insert(id, (user.clone(), credentials));
        Ok(user)
    }

    async fn set_user_login_state(
        &self,
        id: UserId,
        state: LoginState,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock();
        if let Some((_, credentials)) = tables.users.rows.get_mut(&id.as_i32()) {
            credentials.login = state;
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables.products.rows.get(&id.as_i32()).cloned())
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables
            .products
            .newest_first()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn insert_product(&self, data: &ProductData) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.lock();
        tables.check_product(ProductId::new(0), data)?;

        let now = Utc::now();
        let id = tables.products.allocate();
        let product = Product {
            id: ProductId::new(id),
            data: data.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.products.rows.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        data: &ProductData,
    ) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.lock();
        tables.check_product(id, data)?;

        let product = tables
            .products
            .rows
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;
        product.data = data.clone();
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn set_inventory(&self, id: ProductId, inventory: i32) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock();
        let product = tables
            .products
            .rows
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;
        product.data.inventory = inventory;
        product.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock();
        if tables
            .orders
            .rows
            .values()
            .any(|o| o.data.items.iter().any(|i| i.product == id))
        {
            return Err(RepositoryError::Conflict(
                "product is still referenced".to_owned(),
            ));
        }
        if tables.products.rows.remove(&id.as_i32()).is_none() {
            return Ok(false);
        }
        for (customer, _) in tables.customers.rows.values_mut() {
            customer.data.wishlist.retain(|p| *p != id);
        }
        Ok(true)
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables
            .categories
            .rows
            .get(&id.as_i32())
            .map(|c| tables.category_view(c)))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let tables = self.tables.lock();
        let mut categories: Vec<Category> = tables
            .categories
            .rows
            .values()
            .map(|c| tables.category_view(c))
            .collect();
        categories.sort_by(|a, b| a.data.name.cmp(&b.data.name));
        Ok(categories)
    }

    async fn insert_category(&self, data: &CategoryData) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.lock();
        tables.check_category(CategoryId::new(0), data)?;

        let now = Utc::now();
        let id = tables.categories.allocate();
        let category = Category {
            id: CategoryId::new(id),
            data: data.clone(),
            products: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.categories.rows.insert(id, category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        data: &CategoryData,
    ) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.lock();
        tables.check_category(id, data)?;

        let category = tables
            .categories
            .rows
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;
        category.data = data.clone();
        category.updated_at = Utc::now();
        let category = category.clone();
        Ok(tables.category_view(&category))
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock();
        if tables.categories.rows.remove(&id.as_i32()).is_none() {
            return Ok(false);
        }
        for child in tables.categories.rows.values_mut() {
            if child.data.parent == Some(id) {
                child.data.parent = None;
            }
        }
        for product in tables.products.rows.values_mut() {
            product.data.categories.retain(|c| *c != id);
        }
        Ok(true)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables.orders.rows.get(&id.as_i32()).cloned())
    }

    async fn list_orders(
        &self,
        customer: Option<CustomerId>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables
            .orders
            .newest_first()
            .filter(|o| customer.is_none_or(|c| o.data.customer == c))
            .cloned()
            .collect())
    }

    async fn insert_order(
        &self,
        number: &OrderNumber,
        data: &OrderData,
    ) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.lock();
        if tables
            .orders
            .rows
            .values()
            .any(|o| &o.order_number == number)
        {
            return Err(RepositoryError::Conflict(
                "order number already exists".to_owned(),
            ));
        }
        tables.check_order(data)?;

        let now = Utc::now();
        let id = tables.orders.allocate();
        let order = Order {
            id: OrderId::new(id),
            order_number: number.clone(),
            data: data.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.orders.rows.insert(id, order.clone());
        Ok(order)
    }

    async fn update_order(&self, id: OrderId, data: &OrderData) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.lock();
        tables.check_order(data)?;

        let order = tables
            .orders
            .rows
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;
        order.data = data.clone();
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock();
        Ok(tables.orders.rows.remove(&id.as_i32()).is_some())
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn find_media(&self, id: MediaId) -> Result<Option<Media>, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables.media.rows.get(&id.as_i32()).cloned())
    }

    async fn list_media(&self) -> Result<Vec<Media>, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables.media.newest_first().cloned().collect())
    }

    async fn insert_media(&self, data: &MediaData) -> Result<Media, RepositoryError> {
        let mut tables = self.tables.lock();
        if tables
            .media
            .rows
            .values()
            .any(|m| m.data.filename == data.filename)
        {
            return Err(RepositoryError::Conflict(
                "filename already exists".to_owned(),
            ));
        }

        let now = Utc::now();
        let id = tables.media.allocate();
        let media = Media {
            id: MediaId::new(id),
            data: data.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.media.rows.insert(id, media.clone());
        Ok(media)
    }

    async fn update_media(&self, id: MediaId, data: &MediaData) -> Result<Media, RepositoryError> {
        let mut tables = self.tables.lock();
        let media = tables
            .media
            .rows
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;
        // Only the descriptive fields are writable
        media.data.alt_text.clone_from(&data.alt_text);
        media.data.caption.clone_from(&data.caption);
        media.updated_at = Utc::now();
        Ok(media.clone())
    }

    async fn delete_media(&self, id: MediaId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock();
        if tables.media.rows.remove(&id.as_i32()).is_none() {
            return Ok(false);
        }
        for product in tables.products.rows.values_mut() {
            product.data.images.retain(|i| i.image != id);
        }
        for category in tables.categories.rows.values_mut() {
            if category.data.image == Some(id) {
                category.data.image = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
