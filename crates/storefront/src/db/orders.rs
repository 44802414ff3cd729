//! `PostgreSQL` order repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{Postgres, Transaction};

use cartwright_core::{
    Cents, CustomerId, OrderId, OrderNumber, OrderStatus, PaymentMethod, PaymentStatus,
};

use super::{OrderStore, PgStore, RepositoryError, map_write_error};
use crate::models::{BillingAddress, Order, OrderData, OrderItem, PostalAddress};

const ORDER_SELECT: &str = r"
    SELECT o.id, o.order_number, o.customer_id, o.subtotal, o.tax, o.shipping, o.total,
           o.status, o.shipping_address, o.billing_address, o.payment_method,
           o.payment_status, o.notes, o.created_at, o.updated_at,
           COALESCE(
               (SELECT jsonb_agg(
                           jsonb_build_object(
                               'product', i.product_id,
                               'quantity', i.quantity,
                               'price', i.price
                           ) ORDER BY i.position)
                FROM storefront.order_item i WHERE i.order_id = o.id),
               '[]'::jsonb
           ) AS items
    FROM storefront.customer_order o
";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    order_number: String,
    customer_id: i32,
    subtotal: Cents,
    tax: Cents,
    shipping: Cents,
    total: Cents,
    status: OrderStatus,
    shipping_address: Json<PostalAddress>,
    billing_address: Json<BillingAddress>,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    items: Json<Vec<OrderItem>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let order_number = OrderNumber::parse(&row.order_number).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order number in database: {e}"))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            order_number,
            data: OrderData {
                customer: CustomerId::new(row.customer_id),
                items: row.items.0,
                subtotal: row.subtotal,
                tax: row.tax,
                shipping: row.shipping,
                total: row.total,
                status: row.status,
                shipping_address: row.shipping_address.0,
                billing_address: row.billing_address.0,
                payment_method: row.payment_method,
                payment_status: row.payment_status,
                notes: row.notes,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

async fn replace_items(
    tx: &mut Transaction<'_, Postgres>,
    id: OrderId,
    items: &[OrderItem],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM storefront.order_item WHERE order_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r"
            INSERT INTO storefront.order_item (order_id, position, product_id, quantity, price)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(id)
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .bind(item.product)
        .bind(item.quantity)
        .bind(item.price)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_write_error(e, "duplicate order item"))?;
    }

    Ok(())
}

impl PgStore {
    async fn fetch_order(&self, id: OrderId) -> Result<Order, RepositoryError> {
        self.find_order(id).await?.ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        row.map(Order::try_from).transpose()
    }

    async fn list_orders(
        &self,
        customer: Option<CustomerId>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            {ORDER_SELECT}
            WHERE $1::INTEGER IS NULL OR o.customer_id = $1
            ORDER BY o.created_at DESC, o.id DESC
            "
        ))
        .bind(customer)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn insert_order(
        &self,
        number: &OrderNumber,
        data: &OrderData,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let id: OrderId = sqlx::query_scalar(
            r"
            INSERT INTO storefront.customer_order
                (order_number, customer_id, subtotal, tax, shipping, total, status,
                 shipping_address, billing_address, payment_method, payment_status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            ",
        )
        .bind(number.as_str())
        .bind(data.customer)
        .bind(data.subtotal)
        .bind(data.tax)
        .bind(data.shipping)
        .bind(data.total)
        .bind(data.status)
        .bind(Json(&data.shipping_address))
        .bind(Json(&data.billing_address))
        .bind(data.payment_method)
        .bind(data.payment_status)
        .bind(&data.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "order number already exists"))?;

        replace_items(&mut tx, id, &data.items).await?;
        tx.commit().await?;

        self.fetch_order(id).await
    }

    async fn update_order(&self, id: OrderId, data: &OrderData) -> Result<Order, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let result = sqlx::query(
            r"
            UPDATE storefront.customer_order
            SET customer_id = $2, subtotal = $3, tax = $4, shipping = $5, total = $6,
                status = $7, shipping_address = $8, billing_address = $9,
                payment_method = $10, payment_status = $11, notes = $12,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(data.customer)
        .bind(data.subtotal)
        .bind(data.tax)
        .bind(data.shipping)
        .bind(data.total)
        .bind(data.status)
        .bind(Json(&data.shipping_address))
        .bind(Json(&data.billing_address))
        .bind(data.payment_method)
        .bind(data.payment_status)
        .bind(&data.notes)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "order conflict"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        replace_items(&mut tx, id, &data.items).await?;
        tx.commit().await?;

        self.fetch_order(id).await
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.customer_order WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
