//! Postal addresses shared by customers and orders.

use serde::{Deserialize, Serialize};

use crate::validation::ValidationErrors;

/// Country used when an address does not name one.
pub const DEFAULT_COUNTRY: &str = "United States";

/// A postal address. Missing fields deserialize as blank so validation can
/// report each one by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostalAddress {
    pub name: String,
    pub address_line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl Default for PostalAddress {
    fn default() -> Self {
        Self {
            name: String::new(),
            address_line1: String::new(),
            address_line2: None,
            city: String::new(),
            state: String::new(),
            postal_code: String::new(),
            country: DEFAULT_COUNTRY.to_owned(),
        }
    }
}

impl PostalAddress {
    /// Check required fields, reporting failures under `prefix`.
    pub fn validate(&self, prefix: &str, errors: &mut ValidationErrors) {
        let required = [
            ("name", &self.name),
            ("addressLine1", &self.address_line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.required(format!("{prefix}.{field}"));
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_country_defaults() {
        let address: PostalAddress = serde_json::from_value(serde_json::json!({
            "name": "Ada Lovelace",
            "addressLine1": "12 Analytical Row",
            "city": "Springfield",
            "state": "IL",
            "postalCode": "62701"
        }))
        .unwrap();
        assert_eq!(address.country, DEFAULT_COUNTRY);

        let mut errors = ValidationErrors::new();
        address.validate("shippingAddress", &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_reports_blank_fields_by_path() {
        let mut errors = ValidationErrors::new();
        PostalAddress::default().validate("addresses.0", &mut errors);
        assert_eq!(
            errors.fields(),
            vec![
                "addresses.0.name",
                "addresses.0.addressLine1",
                "addresses.0.city",
                "addresses.0.state",
                "addresses.0.postalCode",
            ]
        );
    }
}
