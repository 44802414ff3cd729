//! Domain models for the storefront collections.
//!
//! Every collection follows the same shape:
//!
//! - `XData` holds the writable fields of a stored record.
//! - `X` wraps `XData` with the identity and timestamps (and any read-only
//!   fields) and is what the API returns.
//! - `XPatch` is the JSON body for both create and update. Absent fields are
//!   left alone; nullable fields distinguish "absent" from `null`.
//! - `XDraft` is the working copy a patch is applied to. `validate()` turns a
//!   draft into `XData` or a list of field errors.

pub mod address;
pub mod category;
pub mod credentials;
pub mod customer;
pub mod media;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use address::PostalAddress;
pub use category::{
    Category, CategoryData, CategoryDraft, CategoryMetadata, CategoryPatch, ParentFilter,
    parent_filter,
};
pub use credentials::{Credentials, LoginState};
pub use customer::{Address, Customer, CustomerData, CustomerPatch, NewCustomer};
pub use media::{Media, MediaData, MediaPatch};
pub use order::{
    BillingAddress, Order, OrderData, OrderDraft, OrderItem, OrderItemInput, OrderPatch,
};
pub use product::{
    Product, ProductData, ProductDraft, ProductImage, ProductMetadata, ProductPatch,
};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;

use serde::{Deserialize, Deserializer};

/// Deserialize a field that may be absent, `null`, or a value.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: absent is `None`, `null` is `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trim an optional string, mapping blank to `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
