//! Human-readable order numbers.
//!
//! Format: `ORD-<unix millis>-<suffix>` where the suffix is `0..=999`. The
//! millisecond timestamp plus a random suffix keeps collisions unlikely but
//! not impossible; the database carries a unique index as the backstop.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`OrderNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    #[error("order number must start with ORD-")]
    MissingPrefix,
    #[error("order number timestamp must be digits")]
    InvalidTimestamp,
    #[error("order number suffix must be a number between 0 and 999")]
    InvalidSuffix,
}

/// An order number such as `ORD-1718035200000-42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    const PREFIX: &'static str = "ORD-";

    /// Largest allowed suffix.
    pub const MAX_SUFFIX: u16 = 999;

    /// Build an order number from a creation time and a suffix.
    ///
    /// Suffixes above [`Self::MAX_SUFFIX`] wrap modulo 1000.
    #[must_use]
    pub fn generate(now: DateTime<Utc>, suffix: u16) -> Self {
        let suffix = suffix % (Self::MAX_SUFFIX + 1);
        Self(format!("{}{}-{suffix}", Self::PREFIX, now.timestamp_millis()))
    }

    /// Parse and validate an existing order number.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderNumberError`] if the string is not in
    /// `ORD-<digits>-<0..999>` form.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let rest = s
            .strip_prefix(Self::PREFIX)
            .ok_or(OrderNumberError::MissingPrefix)?;
        let (millis, suffix) = rest
            .split_once('-')
            .ok_or(OrderNumberError::InvalidSuffix)?;

        if millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderNumberError::InvalidTimestamp);
        }

        let valid_suffix = !suffix.is_empty()
            && suffix.len() <= 3
            && suffix.bytes().all(|b| b.is_ascii_digit());
        if !valid_suffix {
            return Err(OrderNumberError::InvalidSuffix);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> Self {
        number.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_generate_format() {
        let now = Utc.timestamp_millis_opt(1_718_035_200_123).unwrap();
        let number = OrderNumber::generate(now, 42);
        assert_eq!(number.as_str(), "ORD-1718035200123-42");
        assert!(OrderNumber::parse(number.as_str()).is_ok());
    }

    #[test]
    fn test_generate_wraps_suffix() {
        let now = Utc.timestamp_millis_opt(1).unwrap();
        assert_eq!(OrderNumber::generate(now, 1999).as_str(), "ORD-1-999");
        assert_eq!(OrderNumber::generate(now, 1000).as_str(), "ORD-1-0");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(
            OrderNumber::parse("INV-1-1"),
            Err(OrderNumberError::MissingPrefix)
        );
        assert_eq!(
            OrderNumber::parse("ORD-abc-1"),
            Err(OrderNumberError::InvalidTimestamp)
        );
        assert_eq!(
            OrderNumber::parse("ORD-123-1000"),
            Err(OrderNumberError::InvalidSuffix)
        );
        assert_eq!(
            OrderNumber::parse("ORD-123"),
            Err(OrderNumberError::InvalidSuffix)
        );
    }
}
