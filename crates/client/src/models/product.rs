//! Product as the storefront displays and sells it.

use rust_decimal::Decimal;

use pomelo_core::{Price, ProductId};

/// A product with server-reported stock, as last fetched.
///
/// `stock` is whatever the backend reported at fetch time; the cart and
/// catalog keep their own locally reconciled copies of it between fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    /// Undiscounted unit price.
    pub price: Price,
    /// Percentage discount (0-100) currently applied, if any.
    pub discount_percent: Option<Decimal>,
    /// Server-reported available quantity.
    pub stock: u32,
    /// Inactive products are listed but cannot be purchased.
    pub active: bool,
    pub image_url: Option<String>,
}

impl Product {
    /// Unit price after any discount.
    #[must_use]
    pub fn effective_price(&self) -> Price {
        self.discount_percent
            .map_or(self.price, |percent| self.price.with_discount_percent(percent))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pomelo_core::CurrencyCode;

    use super::*;

    fn product(discount: Option<Decimal>) -> Product {
        Product {
            id: ProductId::new("p1"),
            title: "Widget".to_owned(),
            price: Price::new(Decimal::new(2000, 2), CurrencyCode::USD),
            discount_percent: discount,
            stock: 5,
            active: true,
            image_url: None,
        }
    }

    #[test]
    fn test_effective_price_without_discount() {
        let p = product(None);
        assert_eq!(p.effective_price(), p.price);
    }

    #[test]
    fn test_effective_price_with_discount() {
        let p = product(Some(Decimal::from(50)));
        assert_eq!(p.effective_price().amount, Decimal::new(1000, 2));
    }
}
