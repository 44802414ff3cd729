//! Integer-cent money amounts.
//!
//! Every price, subtotal, tax, shipping, and total in the shop is stored as a
//! whole number of cents. `$10.99` is `Cents(1099)`.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors raised by money arithmetic.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is negative where only non-negative amounts are allowed.
    #[error("amount cannot be negative (got {0})")]
    Negative(i64),
    /// Arithmetic overflowed `i64`.
    #[error("amount overflowed")]
    Overflow,
}

/// An amount of money in cents.
///
/// The wrapper itself allows negative values so that deserialization never
/// loses information; use [`Cents::ensure_non_negative`] where the domain
/// requires `>= 0`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cents(i64);

impl Cents {
    /// Zero cents.
    pub const ZERO: Self = Self(0);

    /// Create an amount from a number of cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// The raw number of cents.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// The amount in major units as a two-place decimal (`1099` becomes `10.99`).
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Returns `self` if it is zero or positive.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` for negative amounts.
    pub const fn ensure_non_negative(self) -> Result<Self, MoneyError> {
        if self.0 < 0 {
            Err(MoneyError::Negative(self.0))
        } else {
            Ok(self)
        }
    }

    /// Add two amounts.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` if the sum does not fit in `i64`.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.0.checked_add(other.0).map(Self).ok_or(MoneyError::Overflow)
    }

    /// Multiply a unit price by a quantity.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` if the product does not fit in `i64`.
    pub fn checked_mul(self, quantity: i32) -> Result<Self, MoneyError> {
        self.0
            .checked_mul(i64::from(quantity))
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }
}

impl fmt::Display for Cents {
    /// Formats as a dollar amount, e.g. `$10.99` or `-$0.50`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self.to_decimal();
        if amount.is_sign_negative() {
            write!(f, "-${:.2}", amount.abs())
        } else {
            write!(f, "${amount:.2}")
        }
    }
}

impl From<i64> for Cents {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl From<Cents> for i64 {
    fn from(cents: Cents) -> Self {
        cents.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Cents {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Cents {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Cents {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Cents::new(1099).to_string(), "$10.99");
        assert_eq!(Cents::new(5).to_string(), "$0.05");
        assert_eq!(Cents::ZERO.to_string(), "$0.00");
        assert_eq!(Cents::new(-50).to_string(), "-$0.50");
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(Cents::new(1099).to_decimal(), Decimal::new(1099, 2));
    }

    #[test]
    fn test_ensure_non_negative() {
        assert!(Cents::ZERO.ensure_non_negative().is_ok());
        assert_eq!(
            Cents::new(-1).ensure_non_negative(),
            Err(MoneyError::Negative(-1))
        );
    }

    #[test]
    fn test_line_total_arithmetic() {
        let line = Cents::new(1099).checked_mul(3).unwrap();
        assert_eq!(line, Cents::new(3297));
        let total = line.checked_add(Cents::new(500)).unwrap();
        assert_eq!(total.as_i64(), 3797);
        assert_eq!(
            Cents::new(i64::MAX).checked_add(Cents::new(1)),
            Err(MoneyError::Overflow)
        );
    }
}
