//! Collection lifecycle hooks.
//!
//! Before hooks adjust a draft before validation. After hooks run once the
//! write has been persisted; their failures are logged and never undo or
//! fail the write that triggered them.

use chrono::{DateTime, Utc};
use rand::Rng;

use cartwright_core::{CustomerId, OrderNumber, OrderStatus};

use crate::db::{CustomerStore, ProductStore};
use crate::models::{Order, ProductDraft};

/// Before product create: a missing inventory count becomes 0.
pub fn initiate_inventory(draft: &mut ProductDraft) {
    if draft.inventory.is_none() {
        draft.inventory = Some(0);
    }
}

/// Before order create: `ORD-<unix millis>-<0..999>`.
#[must_use]
pub fn assign_order_number(now: DateTime<Utc>) -> OrderNumber {
    let suffix = rand::rng().random_range(0..1000u16);
    OrderNumber::generate(now, suffix)
}

/// During customer login: stamp `lastLogin`.
///
/// Returns the stored timestamp, or `None` if the write failed.
pub async fn update_last_login<S>(store: &S, id: CustomerId, now: DateTime<Utc>) -> Option<DateTime<Utc>>
where
    S: CustomerStore + ?Sized,
{
    match store.set_customer_last_login(id, now).await {
        Ok(()) => Some(now),
        Err(e) => {
            tracing::warn!(customer_id = %id, error = %e, "Failed to update last login");
            None
        }
    }
}

/// After order create: decrement stock for each line item.
///
/// Only orders created as `processing` with at least one item count. Each
/// product is read, clamped to `max(0, inventory - quantity)` and written
/// back. Items are independent: a failure is logged and the rest continue.
pub async fn update_inventory<S>(store: &S, order: &Order)
where
    S: ProductStore + ?Sized,
{
    if order.data.status != OrderStatus::Processing || order.data.items.is_empty() {
        return;
    }

    for item in &order.data.items {
        let product = match store.find_product(item.product).await {
            Ok(Some(product)) => product,
            Ok(None) => {
                tracing::warn!(
                    order_number = %order.order_number,
                    product_id = %item.product,
                    "Ordered product not found; inventory unchanged"
                );
                continue;
            }
            Err(e) => {
                tracing::error!(
                    order_number = %order.order_number,
                    product_id = %item.product,
                    error = %e,
                    "Failed to load product for inventory update"
                );
                continue;
            }
        };

        let remaining = product.data.inventory.saturating_sub(item.quantity).max(0);
        if let Err(e) = store.set_inventory(item.product, remaining).await {
            tracing::error!(
                order_number = %order.order_number,
                product_id = %item.product,
                error = %e,
                "Failed to update inventory"
            );
            continue;
        }

        tracing::info!(
            order_number = %order.order_number,
            product_id = %item.product,
            from = product.data.inventory,
            to = remaining,
            "Inventory decremented"
        );
    }
}
