//! Locally cached product lists.
//!
//! Fetched products are cached with a TTL so views can render without a
//! round-trip. The cache also participates in stock reconciliation: after
//! a purchase completes, displayed stock numbers are decremented locally
//! so they stay consistent until the next authoritative fetch.

use std::time::Duration;

use moka::sync::Cache;

use pomelo_core::ProductId;

use crate::api::types::OrderLine;
use crate::api::{ApiError, CommerceBackend};
use crate::models::Product;

/// TTL-bounded cache of products keyed by id.
pub struct ProductCatalog {
    cache: Cache<ProductId, Product>,
}

impl ProductCatalog {
    /// Create a catalog holding up to `capacity` products for `ttl` each.
    #[must_use]
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Cache a fetched product.
    pub fn insert(&self, product: Product) {
        self.cache.insert(product.id.clone(), product);
    }

    /// The cached product, if present and fresh.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<Product> {
        self.cache.get(id)
    }

    /// Fetch the full product listing and cache it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend request fails; the cache keeps
    /// whatever it already held.
    pub async fn refresh_all<B: CommerceBackend>(
        &self,
        backend: &B,
    ) -> Result<Vec<Product>, ApiError> {
        let products: Vec<Product> = backend
            .fetch_products()
            .await?
            .into_iter()
            .map(Product::from)
            .collect();

        for product in &products {
            self.insert(product.clone());
        }

        Ok(products)
    }

    /// Fetch one product and cache it.
    ///
    /// A response whose id does not match the requested id is stale (the
    /// request it answers no longer applies) and is discarded, returning
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend request fails.
    pub async fn refresh_product<B: CommerceBackend>(
        &self,
        backend: &B,
        id: &ProductId,
    ) -> Result<Option<Product>, ApiError> {
        let product = Product::from(backend.fetch_product(id).await?);

        if product.id != *id {
            tracing::warn!(
                requested = %id,
                received = %product.id,
                "ignoring product response for a different id"
            );
            return Ok(None);
        }

        self.insert(product.clone());
        Ok(Some(product))
    }

    /// Decrement cached displayed stock by the purchased quantities.
    ///
    /// Floors at 0; products not in the cache are skipped.
    pub fn reconcile_stock(&self, purchased: &[OrderLine]) {
        for purchase in purchased {
            if let Some(mut product) = self.cache.get(&purchase.product_id) {
                product.stock = product.stock.saturating_sub(purchase.quantity);
                self.cache.insert(purchase.product_id.clone(), product);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pomelo_core::{CurrencyCode, Price};
    use rust_decimal::Decimal;

    use super::*;

    fn catalog() -> ProductCatalog {
        ProductCatalog::new(Duration::from_secs(300), 16)
    }

    fn product(id: &str, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Price::new(Decimal::new(1000, 2), CurrencyCode::USD),
            discount_percent: None,
            stock,
            active: true,
            image_url: None,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let catalog = catalog();
        catalog.insert(product("p1", 5));

        assert_eq!(catalog.get(&ProductId::new("p1")).unwrap().stock, 5);
        assert!(catalog.get(&ProductId::new("p2")).is_none());
    }

    #[test]
    fn test_reconcile_stock_floors_at_zero() {
        let catalog = catalog();
        catalog.insert(product("p1", 5));
        catalog.insert(product("p2", 1));

        catalog.reconcile_stock(&[
            OrderLine {
                product_id: ProductId::new("p1"),
                quantity: 2,
            },
            OrderLine {
                product_id: ProductId::new("p2"),
                quantity: 3,
            },
            OrderLine {
                product_id: ProductId::new("uncached"),
                quantity: 1,
            },
        ]);

        assert_eq!(catalog.get(&ProductId::new("p1")).unwrap().stock, 3);
        assert_eq!(catalog.get(&ProductId::new("p2")).unwrap().stock, 0);
    }
}
