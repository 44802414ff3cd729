//! Builders shared by unit tests.

#![allow(clippy::unwrap_used)]

use chrono::Utc;

use cartwright_core::{
    CategoryId, Cents, CustomerId, Email, OrderStatus, PaymentMethod, PaymentStatus, ProductId,
    ProductStatus, Slug,
};

use crate::models::{
    BillingAddress, CategoryData, CategoryMetadata, CustomerData, MediaData, NewCustomer,
    OrderData, OrderItem, PostalAddress, ProductData, ProductMetadata,
};

pub fn customer(email: &str) -> NewCustomer {
    NewCustomer {
        data: CustomerData {
            email: Email::parse(email).unwrap(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            phone: None,
            addresses: Vec::new(),
            wishlist: Vec::new(),
            accepted_terms: true,
            subscribe_to_newsletter: false,
        },
        password_hash: "hash".to_owned(),
        last_login: Utc::now(),
    }
}

pub fn product(name: &str, sku: &str) -> ProductData {
    ProductData {
        name: name.to_owned(),
        slug: Slug::from_name(name),
        description: None,
        price: Cents::new(1000),
        compare_at_price: None,
        images: Vec::new(),
        inventory: 5,
        sku: sku.to_owned(),
        categories: Vec::new(),
        status: ProductStatus::Published,
        featured: false,
        metadata: ProductMetadata::default(),
    }
}

pub fn category(name: &str, parent: Option<CategoryId>) -> CategoryData {
    CategoryData {
        name: name.to_owned(),
        slug: Slug::from_name(name),
        description: None,
        parent,
        image: None,
        featured: false,
        metadata: CategoryMetadata::default(),
    }
}

pub fn media(filename: &str) -> MediaData {
    MediaData {
        filename: filename.to_owned(),
        mime_type: "image/png".to_owned(),
        filesize: 10,
        url: format!("/media/{filename}"),
        alt_text: None,
        caption: None,
        width: None,
        height: None,
    }
}

pub fn address() -> PostalAddress {
    PostalAddress {
        name: "Ada Lovelace".to_owned(),
        address_line1: "12 Analytical Row".to_owned(),
        city: "Springfield".to_owned(),
        state: "IL".to_owned(),
        postal_code: "62701".to_owned(),
        ..PostalAddress::default()
    }
}

/// A pending order for `quantity` of `product` at $10.00 each.
pub fn order(customer: CustomerId, product: ProductId, quantity: i32) -> OrderData {
    let total = Cents::new(1000 * i64::from(quantity));
    OrderData {
        customer,
        items: vec![OrderItem {
            product,
            quantity,
            price: Cents::new(1000),
        }],
        subtotal: total,
        tax: Cents::ZERO,
        shipping: Cents::ZERO,
        total,
        status: OrderStatus::Pending,
        shipping_address: address(),
        billing_address: BillingAddress::default(),
        payment_method: PaymentMethod::CreditCard,
        payment_status: PaymentStatus::Pending,
        notes: None,
    }
}
