//! Order operations.
//!
//! Customers may place and read their own orders. Order numbers are assigned
//! here and never change.

use chrono::Utc;

use cartwright_core::{AccessPolicy, CustomerId, Operation, OrderId, Principal};

use super::{CollectionError, authorize, customer_scope, hooks};
use crate::db::{RepositoryError, Store};
use crate::models::{Order, OrderDraft, OrderPatch};

const POLICY: AccessPolicy = AccessPolicy::ORDERS;

/// Attempts at a fresh order number before giving up on a collision.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

/// Order service.
pub struct OrderService<'a> {
    store: &'a dyn Store,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Place an order.
    ///
    /// Any `orderNumber` in the body is ignored. Orders created as
    /// `processing` decrement stock once stored.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller is the ordering customer (or an admin),
    /// `Validation`, or `InvalidReference` for an unknown customer or product.
    pub async fn create(
        &self,
        user: Option<&Principal>,
        patch: OrderPatch,
    ) -> Result<Order, CollectionError> {
        let mut draft = OrderDraft::default();
        draft.apply(patch);
        authorize(&POLICY, Operation::Create, user, draft.customer.map(owner))?;
        let data = draft.validate()?;

        let mut attempt = 0;
        let order = loop {
            attempt += 1;
            let number = hooks::assign_order_number(Utc::now());
            match self.store.insert_order(&number, &data).await {
                Ok(order) => break order,
                Err(RepositoryError::Conflict(msg)) if attempt < ORDER_NUMBER_ATTEMPTS => {
                    tracing::warn!(order_number = %number, reason = %msg, "Order number collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(
            order_number = %order.order_number,
            customer_id = %order.data.customer,
            total = %order.data.total,
            "Order placed"
        );
        hooks::update_inventory(self.store, &order).await;
        Ok(order)
    }

    /// # Errors
    ///
    /// `NotFound`, or `Forbidden` when the caller does not own the order.
    pub async fn get(&self, user: Option<&Principal>, id: OrderId) -> Result<Order, CollectionError> {
        authorize(&POLICY, Operation::Read, user, None)?;
        let order = self
            .store
            .find_order(id)
            .await?
            .ok_or(CollectionError::NotFound)?;
        authorize(&POLICY, Operation::Read, user, Some(owner(order.data.customer)))?;
        Ok(order)
    }

    /// Orders visible to the caller: a customer's own, or all for admins.
    ///
    /// # Errors
    ///
    /// `Forbidden` when not logged in.
    pub async fn list(&self, user: Option<&Principal>) -> Result<Vec<Order>, CollectionError> {
        authorize(&POLICY, Operation::Read, user, None)?;
        Ok(self.store.list_orders(customer_scope(user)).await?)
    }

    /// Update an order. The order number is kept.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `NotFound`, `Validation` or `InvalidReference`.
    pub async fn update(
        &self,
        user: Option<&Principal>,
        id: OrderId,
        patch: OrderPatch,
    ) -> Result<Order, CollectionError> {
        authorize(&POLICY, Operation::Update, user, None)?;
        let existing = self
            .store
            .find_order(id)
            .await?
            .ok_or(CollectionError::NotFound)?;

        let mut draft = OrderDraft::from(existing.data);
        draft.apply(patch);
        let data = draft.validate()?;

        let order = self.store.update_order(id, &data).await?;
        tracing::info!(order_number = %order.order_number, status = %order.data.status, "Order updated");
        Ok(order)
    }

    /// # Errors
    ///
    /// `Forbidden` or `NotFound`.
    pub async fn delete(&self, user: Option<&Principal>, id: OrderId) -> Result<OrderId, CollectionError> {
        authorize(&POLICY, Operation::Delete, user, None)?;
        if self.store.delete_order(id).await? {
            tracing::info!(order_id = %id, "Order deleted");
            Ok(id)
        } else {
            Err(CollectionError::NotFound)
        }
    }
}

const fn owner(id: CustomerId) -> Principal {
    Principal::customer(id.as_i32())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cartwright_core::{Cents, OrderStatus, PaymentMethod};
    use regex::Regex;

    use super::*;
    use crate::db::{CustomerStore, MemoryStore, ProductStore};
    use crate::models::{Customer, OrderItemInput, Product};
    use crate::test_support::{address, customer, product};

    struct Fixture {
        store: MemoryStore,
        ada: Customer,
        bob: Customer,
        mug: Product,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let ada = store.insert_customer(customer("ada@example.com")).await.unwrap();
        let bob = store.insert_customer(customer("bob@example.com")).await.unwrap();
        let mug = store.insert_product(&product("Mug", "MUG-1")).await.unwrap();
        Fixture {
            store,
            ada,
            bob,
            mug,
        }
    }

    fn principal(c: &Customer) -> Principal {
        Principal::customer(c.id.as_i32())
    }

    fn patch(customer: CustomerId, product: &Product, quantity: i32) -> OrderPatch {
        OrderPatch {
            customer: Some(customer),
            items: Some(vec![OrderItemInput {
                product: Some(product.id),
                quantity: Some(quantity),
                price: Some(product.data.price),
            }]),
            shipping_address: Some(address()),
            payment_method: Some(PaymentMethod::Paypal),
            ..OrderPatch::default()
        }
    }

    #[tokio::test]
    async fn test_create_assigns_number_and_totals() {
        let f = fixture().await;
        let orders = OrderService::new(&f.store);

        let order = orders
            .create(Some(&principal(&f.ada)), patch(f.ada.id, &f.mug, 3))
            .await
            .unwrap();

        let re = Regex::new(r"^ORD-\d+-\d{1,3}$").unwrap();
        assert!(re.is_match(order.order_number.as_str()));
        assert_eq!(order.data.subtotal, Cents::new(3000));
        assert_eq!(order.data.total, Cents::new(3000));
        assert_eq!(order.data.status, OrderStatus::Pending);

        // Pending orders leave stock alone
        let mug = f.store.find_product(f.mug.id).await.unwrap().unwrap();
        assert_eq!(mug.data.inventory, 5);
    }

    #[tokio::test]
    async fn test_processing_order_decrements_inventory() {
        let f = fixture().await;
        let orders = OrderService::new(&f.store);

        let mut body = patch(f.ada.id, &f.mug, 7);
        body.status = Some(OrderStatus::Processing);
        orders.create(Some(&principal(&f.ada)), body).await.unwrap();

        let mug = f.store.find_product(f.mug.id).await.unwrap().unwrap();
        assert_eq!(mug.data.inventory, 0);
    }

    #[tokio::test]
    async fn test_customers_order_only_for_themselves() {
        let f = fixture().await;
        let orders = OrderService::new(&f.store);

        assert!(matches!(
            orders
                .create(Some(&principal(&f.bob)), patch(f.ada.id, &f.mug, 1))
                .await,
            Err(CollectionError::Forbidden)
        ));
        assert!(matches!(
            orders.create(None, patch(f.ada.id, &f.mug, 1)).await,
            Err(CollectionError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_read_scoping() {
        let f = fixture().await;
        let orders = OrderService::new(&f.store);
        let placed = orders
            .create(Some(&principal(&f.ada)), patch(f.ada.id, &f.mug, 1))
            .await
            .unwrap();

        assert!(orders.get(Some(&principal(&f.ada)), placed.id).await.is_ok());
        assert!(matches!(
            orders.get(Some(&principal(&f.bob)), placed.id).await,
            Err(CollectionError::Forbidden)
        ));
        assert_eq!(orders.list(Some(&principal(&f.ada))).await.unwrap().len(), 1);
        assert!(orders.list(Some(&principal(&f.bob))).await.unwrap().is_empty());
        assert_eq!(orders.list(Some(&Principal::admin(1))).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_order_number() {
        let f = fixture().await;
        let orders = OrderService::new(&f.store);
        let placed = orders
            .create(Some(&principal(&f.ada)), patch(f.ada.id, &f.mug, 1))
            .await
            .unwrap();

        let updated = orders
            .update(
                Some(&Principal::admin(1)),
                placed.id,
                OrderPatch {
                    status: Some(OrderStatus::Shipped),
                    ..OrderPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.order_number, placed.order_number);
        assert_eq!(updated.data.status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_update_recomputes_amounts() {
        let f = fixture().await;
        let orders = OrderService::new(&f.store);
        let placed = orders
            .create(Some(&principal(&f.ada)), patch(f.ada.id, &f.mug, 2))
            .await
            .unwrap();
        let price = f.mug.data.price;

        let updated = orders
            .update(
                Some(&principal(&f.ada)),
                placed.id,
                OrderPatch {
                    tax: Some(Cents::new(500)),
                    items: Some(vec![OrderItemInput {
                        product: Some(f.mug.id),
                        quantity: Some(5),
                        price: Some(price),
                    }]),
                    ..OrderPatch::default()
                },
            )
            .await
            .unwrap();
        let subtotal = Cents::new(price.as_i64() * 5);
        assert_eq!(updated.data.subtotal, subtotal);
        assert_eq!(updated.data.total, Cents::new(subtotal.as_i64() + 500));

        let updated = orders
            .update(
                Some(&principal(&f.ada)),
                placed.id,
                OrderPatch {
                    shipping: Some(Cents::new(250)),
                    ..OrderPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.data.subtotal, subtotal);
        assert_eq!(updated.data.total, Cents::new(subtotal.as_i64() + 750));

        let updated = orders
            .update(
                Some(&principal(&f.ada)),
                placed.id,
                OrderPatch {
                    tax: Some(Cents::ZERO),
                    total: Some(Cents::new(100)),
                    ..OrderPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.data.total, Cents::new(100));
    }

    #[tokio::test]
    async fn test_missing_items_is_validation_error() {
        let f = fixture().await;
        let orders = OrderService::new(&f.store);
        let mut body = patch(f.ada.id, &f.mug, 1);
        body.items = Some(Vec::new());

        let Err(CollectionError::Validation(errors)) =
            orders.create(Some(&principal(&f.ada)), body).await
        else {
            panic!("expected validation error");
        };
        assert!(errors.fields().contains(&"items"));
    }
}
