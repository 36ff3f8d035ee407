//! Type-safe price representation using decimal arithmetic.
//!
//! All money amounts go through [`rust_decimal::Decimal`] so that cart math
//! never touches floating point.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero price in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency_code,
        }
    }

    /// Total amount for `quantity` units at this price.
    #[must_use]
    pub fn line_total(&self, quantity: u32) -> Decimal {
        self.amount * Decimal::from(quantity)
    }

    /// Apply a percentage discount (0-100) and return the reduced price.
    ///
    /// Out-of-range percentages are clamped, so a discount can never turn a
    /// price negative or raise it.
    #[must_use]
    pub fn with_discount_percent(&self, percent: Decimal) -> Self {
        let percent = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
        let factor = (Decimal::ONE_HUNDRED - percent) / Decimal::ONE_HUNDRED;
        Self {
            amount: self.amount * factor,
            currency_code: self.currency_code,
        }
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let price = Price::new(Decimal::new(1050, 2), CurrencyCode::USD);
        assert_eq!(price.line_total(3), Decimal::new(3150, 2));
    }

    #[test]
    fn test_line_total_zero_quantity() {
        let price = Price::new(Decimal::new(999, 2), CurrencyCode::USD);
        assert_eq!(price.line_total(0), Decimal::ZERO);
    }

    #[test]
    fn test_discount_percent() {
        let price = Price::new(Decimal::new(10000, 2), CurrencyCode::USD);
        let discounted = price.with_discount_percent(Decimal::from(25));
        assert_eq!(discounted.amount, Decimal::new(7500, 2));
    }

    #[test]
    fn test_discount_percent_clamped() {
        let price = Price::new(Decimal::new(10000, 2), CurrencyCode::USD);
        assert_eq!(
            price.with_discount_percent(Decimal::from(150)).amount,
            Decimal::ZERO
        );
        assert_eq!(
            price.with_discount_percent(Decimal::from(-10)).amount,
            price.amount
        );
    }
}
