//! Orders and line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cartwright_core::{
    Cents, CustomerId, OrderId, OrderNumber, OrderStatus, PaymentMethod, PaymentStatus, ProductId,
};

use super::{PostalAddress, non_blank, nullable};
use crate::validation::ValidationErrors;

/// One product line. `price` is the unit price at purchase time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: ProductId,
    pub quantity: i32,
    pub price: Cents,
}

impl OrderItem {
    /// `quantity * price`, or `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Cents> {
        self.price.checked_mul(self.quantity).ok()
    }
}

/// Line item as submitted; checked field by field before becoming an [`OrderItem`].
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product: Option<ProductId>,
    pub quantity: Option<i32>,
    pub price: Option<Cents>,
}

impl From<OrderItem> for OrderItemInput {
    fn from(item: OrderItem) -> Self {
        Self {
            product: Some(item.product),
            quantity: Some(item.quantity),
            price: Some(item.price),
        }
    }
}

/// Billing address; the address fields only matter when it differs from
/// the shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingAddress {
    #[serde(default = "same_as_shipping_default")]
    pub same_as_shipping: bool,
    #[serde(flatten)]
    pub address: PostalAddress,
}

const fn same_as_shipping_default() -> bool {
    true
}

impl Default for BillingAddress {
    fn default() -> Self {
        Self {
            same_as_shipping: true,
            address: PostalAddress::default(),
        }
    }
}

/// Writable order fields. The order number is assigned separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
    pub customer: CustomerId,
    pub items: Vec<OrderItem>,
    pub subtotal: Cents,
    pub tax: Cents,
    pub shipping: Cents,
    pub total: Cents,
    pub status: OrderStatus,
    pub shipping_address: PostalAddress,
    pub billing_address: BillingAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
}

/// A stored order as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    #[serde(flatten)]
    pub data: OrderData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create or update body for orders.
///
/// There is no `orderNumber` field: a submitted one is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    pub customer: Option<CustomerId>,
    pub items: Option<Vec<OrderItemInput>>,
    pub subtotal: Option<Cents>,
    pub tax: Option<Cents>,
    pub shipping: Option<Cents>,
    pub total: Option<Cents>,
    pub status: Option<OrderStatus>,
    pub shipping_address: Option<PostalAddress>,
    pub billing_address: Option<BillingAddress>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<PaymentStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

/// Working copy of an order while a write is in flight.
#[derive(Debug, Clone, Default)]
pub struct OrderDraft {
    pub customer: Option<CustomerId>,
    pub items: Vec<OrderItemInput>,
    pub subtotal: Option<Cents>,
    pub tax: Cents,
    pub shipping: Cents,
    pub total: Option<Cents>,
    pub status: OrderStatus,
    pub shipping_address: Option<PostalAddress>,
    pub billing_address: BillingAddress,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
}

impl From<OrderData> for OrderDraft {
    fn from(data: OrderData) -> Self {
        Self {
            customer: Some(data.customer),
            items: data.items.into_iter().map(OrderItemInput::from).collect(),
            subtotal: Some(data.subtotal),
            tax: data.tax,
            shipping: data.shipping,
            total: Some(data.total),
            status: data.status,
            shipping_address: Some(data.shipping_address),
            billing_address: data.billing_address,
            payment_method: Some(data.payment_method),
            payment_status: data.payment_status,
            notes: data.notes,
        }
    }
}

impl OrderDraft {
    /// Overlay the fields present in `patch`.
    ///
    /// Changing the items drops the stored subtotal, and changing items, tax
    /// or shipping drops the stored total, so `validate` derives them again.
    /// Amounts given in the patch itself still win.
    pub fn apply(&mut self, patch: OrderPatch) {
        if patch.items.is_some() {
            self.subtotal = None;
        }
        if patch.items.is_some() || patch.tax.is_some() || patch.shipping.is_some() {
            self.total = None;
        }
        if let Some(customer) = patch.customer {
            self.customer = Some(customer);
        }
        if let Some(items) = patch.items {
            self.items = items;
        }
        if let Some(subtotal) = patch.subtotal {
            self.subtotal = Some(subtotal);
        }
        if let Some(tax) = patch.tax {
            self.tax = tax;
        }
        if let Some(shipping) = patch.shipping {
            self.shipping = shipping;
        }
        if let Some(total) = patch.total {
            self.total = Some(total);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(address) = patch.shipping_address {
            self.shipping_address = Some(address);
        }
        if let Some(billing) = patch.billing_address {
            self.billing_address = billing;
        }
        if let Some(method) = patch.payment_method {
            self.payment_method = Some(method);
        }
        if let Some(payment_status) = patch.payment_status {
            self.payment_status = payment_status;
        }
        if let Some(notes) = patch.notes {
            self.notes = non_blank(notes);
        }
    }

    /// Check field rules and fill in derived amounts.
    ///
    /// A missing subtotal is the sum of the line totals; a missing total is
    /// `subtotal + tax + shipping`.
    ///
    /// # Errors
    ///
    /// Returns every failed rule.
    pub fn validate(self) -> Result<OrderData, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let customer = errors.require("customer", self.customer);

        if self.items.is_empty() {
            errors.push("items", "An order needs at least one item.");
        }
        let mut items = Vec::with_capacity(self.items.len());
        for (i, input) in self.items.iter().enumerate() {
            let product = errors.require(&format!("items.{i}.product"), input.product);
            // Quantity defaults to one, like an "add to cart" click
            let quantity = input.quantity.unwrap_or(1);
            if quantity < 1 {
                errors.push(format!("items.{i}.quantity"), "Quantity must be at least 1.");
            }
            let price = errors.require(&format!("items.{i}.price"), input.price);
            if price.is_some_and(|p| p.ensure_non_negative().is_err()) {
                errors.push(format!("items.{i}.price"), "Price cannot be negative.");
            }
            if let (Some(product), Some(price)) = (product, price) {
                items.push(OrderItem {
                    product,
                    quantity,
                    price,
                });
            }
        }

        let subtotal = self.subtotal.or_else(|| {
            items.iter().try_fold(Cents::ZERO, |acc, item| {
                item.line_total().and_then(|line| acc.checked_add(line).ok())
            })
        });
        let subtotal = match subtotal {
            Some(subtotal) => subtotal,
            None => {
                errors.push("subtotal", "Subtotal is too large.");
                Cents::ZERO
            }
        };

        let total = self.total.or_else(|| {
            subtotal
                .checked_add(self.tax)
                .and_then(|sum| sum.checked_add(self.shipping))
                .ok()
        });
        let total = match total {
            Some(total) => total,
            None => {
                errors.push("total", "Total is too large.");
                Cents::ZERO
            }
        };

        for (field, amount) in [
            ("subtotal", subtotal),
            ("tax", self.tax),
            ("shipping", self.shipping),
            ("total", total),
        ] {
            if amount.ensure_non_negative().is_err() {
                errors.push(field, "Amount cannot be negative.");
            }
        }

        let shipping_address = errors.require("shippingAddress", self.shipping_address);
        if let Some(address) = &shipping_address {
            address.validate("shippingAddress", &mut errors);
        }
        if !self.billing_address.same_as_shipping {
            self.billing_address
                .address
                .validate("billingAddress", &mut errors);
        }

        let payment_method = errors.require("paymentMethod", self.payment_method);

        match (customer, shipping_address, payment_method) {
            (Some(customer), Some(shipping_address), Some(payment_method))
                if errors.is_empty() =>
            {
                Ok(OrderData {
                    customer,
                    items,
                    subtotal,
                    tax: self.tax,
                    shipping: self.shipping,
                    total,
                    status: self.status,
                    shipping_address,
                    billing_address: self.billing_address,
                    payment_method,
                    payment_status: self.payment_status,
                    notes: self.notes,
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn patch(value: serde_json::Value) -> OrderPatch {
        serde_json::from_value(value).unwrap()
    }

    fn checkout() -> serde_json::Value {
        serde_json::json!({
            "customer": 1,
            "items": [
                {"product": 10, "quantity": 2, "price": 1500},
                {"product": 11, "price": 250}
            ],
            "tax": 260,
            "shipping": 500,
            "shippingAddress": {
                "name": "Ada Lovelace",
                "addressLine1": "12 Analytical Row",
                "city": "Springfield",
                "state": "IL",
                "postalCode": "62701"
            },
            "paymentMethod": "credit_card",
            "orderNumber": "ORD-1-1"
        })
    }

    #[test]
    fn test_derived_amounts_and_defaults() {
        let mut draft = OrderDraft::default();
        draft.apply(patch(checkout()));
        let data = draft.validate().unwrap();

        assert_eq!(data.items[1].quantity, 1);
        assert_eq!(data.subtotal, Cents::new(3250));
        assert_eq!(data.total, Cents::new(4010));
        assert_eq!(data.status, OrderStatus::Pending);
        assert_eq!(data.payment_status, PaymentStatus::Pending);
        assert!(data.billing_address.same_as_shipping);
    }

    #[test]
    fn test_explicit_amounts_win() {
        let mut draft = OrderDraft::default();
        draft.apply(patch(checkout()));
        draft.apply(patch(serde_json::json!({"subtotal": 3000, "total": 3000})));
        let data = draft.validate().unwrap();
        assert_eq!(data.subtotal, Cents::new(3000));
        assert_eq!(data.total, Cents::new(3000));
    }

    #[test]
    fn test_requires_items() {
        let mut draft = OrderDraft::default();
        draft.apply(patch(checkout()));
        draft.apply(patch(serde_json::json!({"items": []})));
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.fields(), vec!["items"]);
    }

    #[test]
    fn test_item_rules() {
        let mut draft = OrderDraft::default();
        draft.apply(patch(checkout()));
        draft.apply(patch(serde_json::json!({
            "items": [{"product": 10, "quantity": 0, "price": -1}, {"quantity": 1}]
        })));
        let errors = draft.validate().unwrap_err();
        assert_eq!(
            errors.fields(),
            vec![
                "items.0.quantity",
                "items.0.price",
                "items.1.product",
                "items.1.price",
            ]
        );
    }

    #[test]
    fn test_billing_required_only_when_different() {
        let mut draft = OrderDraft::default();
        draft.apply(patch(checkout()));
        draft.apply(patch(serde_json::json!({
            "billingAddress": {"sameAsShipping": false, "name": "Ada Lovelace"}
        })));
        let errors = draft.validate().unwrap_err();
        assert_eq!(
            errors.fields(),
            vec![
                "billingAddress.addressLine1",
                "billingAddress.city",
                "billingAddress.state",
                "billingAddress.postalCode",
            ]
        );
    }

    #[test]
    fn test_missing_required_fields() {
        let errors = OrderDraft::default().validate().unwrap_err();
        assert_eq!(
            errors.fields(),
            vec!["customer", "items", "shippingAddress", "paymentMethod"]
        );
    }
}
