//! Customer accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cartwright_core::{CustomerId, Email, ProductId};

use super::{PostalAddress, non_blank, nullable};
use crate::validation::ValidationErrors;

/// A saved address in a customer's address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Label such as "Home" or "Work".
    #[serde(default)]
    pub address_name: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(flatten)]
    pub postal: PostalAddress,
}

/// Writable customer profile fields.
///
/// The password hash and lockout counters live in
/// [`Credentials`](super::Credentials) and are never part of this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerData {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub wishlist: Vec<ProductId>,
    pub accepted_terms: bool,
    #[serde(default)]
    pub subscribe_to_newsletter: bool,
}

impl CustomerData {
    /// Profile rules applied on every write.
    pub fn validate(&self, errors: &mut ValidationErrors) {
        if self.first_name.trim().is_empty() {
            errors.required("firstName");
        }
        if self.last_name.trim().is_empty() {
            errors.required("lastName");
        }
        for (i, address) in self.addresses.iter().enumerate() {
            if address.address_name.trim().is_empty() {
                errors.required(format!("addresses.{i}.addressName"));
            }
            address.postal.validate(&format!("addresses.{i}"), errors);
        }
        if self.addresses.iter().filter(|a| a.is_default).count() > 1 {
            errors.push("addresses", "Only one address can be the default.");
        }
    }
}

/// A stored customer as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    #[serde(flatten)]
    pub data: CustomerData,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated registration, ready to persist.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub data: CustomerData,
    pub password_hash: String,
    /// Registration counts as the first login.
    pub last_login: DateTime<Utc>,
}

/// Partial update body for `PATCH /api/customers/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPatch {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    pub addresses: Option<Vec<Address>>,
    pub wishlist: Option<Vec<ProductId>>,
    pub accepted_terms: Option<bool>,
    pub subscribe_to_newsletter: Option<bool>,
}

impl CustomerPatch {
    /// Apply profile fields to `data`.
    ///
    /// The password is not part of the profile; the caller hashes it
    /// separately.
    pub fn apply(self, data: &mut CustomerData, errors: &mut ValidationErrors) {
        if let Some(email) = self.email {
            match Email::parse(&email) {
                Ok(email) => data.email = email,
                Err(e) => errors.push("email", e.to_string()),
            }
        }
        if let Some(first_name) = self.first_name {
            data.first_name = first_name.trim().to_owned();
        }
        if let Some(last_name) = self.last_name {
            data.last_name = last_name.trim().to_owned();
        }
        if let Some(phone) = self.phone {
            data.phone = non_blank(phone);
        }
        if let Some(addresses) = self.addresses {
            data.addresses = addresses;
        }
        if let Some(wishlist) = self.wishlist {
            data.wishlist = dedup(wishlist);
        }
        if let Some(accepted_terms) = self.accepted_terms {
            data.accepted_terms = accepted_terms;
        }
        if let Some(subscribe) = self.subscribe_to_newsletter {
            data.subscribe_to_newsletter = subscribe;
        }
    }
}

/// Drop repeated ids, keeping first occurrence order.
pub(crate) fn dedup<T: PartialEq + Copy>(ids: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn data() -> CustomerData {
        CustomerData {
            email: Email::parse("ada@example.com").unwrap(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            phone: None,
            addresses: Vec::new(),
            wishlist: Vec::new(),
            accepted_terms: true,
            subscribe_to_newsletter: false,
        }
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let mut customer = data();
        customer.phone = Some("+1 555 0100".to_owned());

        let absent: CustomerPatch = serde_json::from_str(r#"{"firstName":"Augusta"}"#).unwrap();
        let mut errors = ValidationErrors::new();
        absent.apply(&mut customer, &mut errors);
        assert_eq!(customer.phone.as_deref(), Some("+1 555 0100"));
        assert_eq!(customer.first_name, "Augusta");

        let null: CustomerPatch = serde_json::from_str(r#"{"phone":null}"#).unwrap();
        null.apply(&mut customer, &mut errors);
        assert_eq!(customer.phone, None);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_patch_rejects_bad_email() {
        let mut customer = data();
        let patch = CustomerPatch {
            email: Some("nope".to_owned()),
            ..CustomerPatch::default()
        };
        let mut errors = ValidationErrors::new();
        patch.apply(&mut customer, &mut errors);
        assert_eq!(errors.fields(), vec!["email"]);
        assert_eq!(customer.email.as_str(), "ada@example.com");
    }

    #[test]
    fn test_wishlist_is_a_set() {
        let mut customer = data();
        let patch: CustomerPatch = serde_json::from_str(r#"{"wishlist":[3,1,3,2,1]}"#).unwrap();
        patch.apply(&mut customer, &mut ValidationErrors::new());
        assert_eq!(
            customer.wishlist,
            vec![ProductId::new(3), ProductId::new(1), ProductId::new(2)]
        );
    }

    #[test]
    fn test_address_rules() {
        let mut customer = data();
        let patch: CustomerPatch = serde_json::from_value(serde_json::json!({
            "addresses": [
                {"addressName": "Home", "isDefault": true, "name": "Ada", "addressLine1": "1 Main St",
                 "city": "Springfield", "state": "IL", "postalCode": "62701"},
                {"isDefault": true, "name": "Ada", "addressLine1": "2 Side St",
                 "city": "Springfield", "state": "IL", "postalCode": "62702"}
            ]
        }))
        .unwrap();
        let mut errors = ValidationErrors::new();
        patch.apply(&mut customer, &mut errors);
        customer.validate(&mut errors);

        assert_eq!(customer.addresses[0].postal.country, "United States");
        assert_eq!(errors.fields(), vec!["addresses.1.addressName", "addresses"]);
    }

    #[test]
    fn test_serialized_customer_has_no_secrets() {
        let customer = Customer {
            id: CustomerId::new(1),
            data: data(),
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["firstName"], "Ada");
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("loginAttempts").is_none());
    }
}
