//! Cart state engine.
//!
//! The engine is the only component that mutates cart contents. Every
//! mutation is a single synchronous step: validate, update in memory,
//! persist the whole snapshot, return. No partial state is ever
//! observable, and no mutation can leave a line with `quantity < 1` or
//! `quantity > stock_at_last_known`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pomelo_core::{Price, ProductId};

use crate::api::types::OrderLine;
use crate::models::Product;
use crate::store::{SessionStore, keys};

/// Presentation metadata carried on a line for display purposes only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDisplay {
    pub title: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// One product's quantity commitment within the in-progress purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    /// Effective (discounted) unit price at the time the line was added.
    pub unit_price: Price,
    /// Always >= 1; a line that would reach 0 is removed instead.
    pub quantity: u32,
    /// Stock as last reported by the backend for this product.
    pub stock_at_last_known: u32,
    pub display: LineDisplay,
}

impl CartLine {
    /// Total price of this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.line_total(self.quantity)
    }
}

/// Errors that can occur during cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The requested quantity exceeds the known available stock.
    ///
    /// The triggering mutation is rejected; all other state is untouched.
    #[error("requested quantity exceeds available stock ({available} left)")]
    StockExceeded {
        /// Stock the backend last reported for the product.
        available: u32,
    },
}

/// Owns the in-progress purchase lines and their invariants.
pub struct CartEngine {
    lines: Vec<CartLine>,
    store: SessionStore,
}

impl CartEngine {
    /// Restore the cart persisted in `store`, or start empty.
    ///
    /// A snapshot that cannot be parsed is discarded with a warning; lines
    /// that violate the quantity invariants are dropped or clamped rather
    /// than kept inconsistent.
    #[must_use]
    pub fn restore(store: SessionStore) -> Self {
        let mut engine = Self {
            lines: Vec::new(),
            store,
        };

        let Some(raw) = engine.store.get(keys::CART) else {
            return engine;
        };

        match serde_json::from_str::<Vec<CartLine>>(&raw) {
            Ok(stored) => {
                engine.lines = sanitize(stored);
                engine.persist();
            }
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable cart snapshot");
                engine.store.remove(keys::CART);
            }
        }

        engine
    }

    // =========================================================================
    // Read-only views
    // =========================================================================

    /// The current lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for a product, if present.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines
            .iter()
            .fold(0, |total, line| total.saturating_add(line.quantity))
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// The lines as order submission input.
    #[must_use]
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.lines
            .iter()
            .map(|line| OrderLine {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
            })
            .collect()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `requested` units of `product`, merging with an existing line.
    ///
    /// The line's `stock_at_last_known`, price, and display data are
    /// refreshed from `product` on success. Requesting zero units is a
    /// no-op. Inactive products reject like sold-out ones.
    ///
    /// # Errors
    ///
    /// Returns `CartError::StockExceeded` if the merged quantity would
    /// exceed the product's reported stock; the cart is left unchanged.
    pub fn add_line(&mut self, product: &Product, requested: u32) -> Result<(), CartError> {
        if requested == 0 {
            return Ok(());
        }

        let available = if product.active { product.stock } else { 0 };
        let position = self
            .lines
            .iter()
            .position(|line| line.product_id == product.id);
        let current = position
            .and_then(|index| self.lines.get(index))
            .map_or(0, |line| line.quantity);

        let proposed = current.saturating_add(requested);
        if proposed > available {
            return Err(CartError::StockExceeded { available });
        }

        let unit_price = product.effective_price();
        let display = LineDisplay {
            title: product.title.clone(),
            image_url: product.image_url.clone(),
        };

        if let Some(line) = position.and_then(|index| self.lines.get_mut(index)) {
            line.quantity = proposed;
            line.stock_at_last_known = product.stock;
            line.unit_price = unit_price;
            line.display = display;
        } else {
            self.lines.push(CartLine {
                product_id: product.id.clone(),
                unit_price,
                quantity: proposed,
                stock_at_last_known: product.stock,
                display,
            });
        }

        self.persist();
        Ok(())
    }

    /// Adjust a line's quantity by `delta`.
    ///
    /// A missing line is a no-op. A result below 1 removes the line; a
    /// line never floors at zero-with-a-line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::StockExceeded` if the new quantity would exceed
    /// the line's last known stock; the quantity is left unchanged.
    pub fn change_quantity(&mut self, product_id: &ProductId, delta: i64) -> Result<(), CartError> {
        let Some(index) = self
            .lines
            .iter()
            .position(|line| &line.product_id == product_id)
        else {
            return Ok(());
        };
        let Some(line) = self.lines.get(index) else {
            return Ok(());
        };

        let new_quantity = i64::from(line.quantity) + delta;
        if new_quantity > i64::from(line.stock_at_last_known) {
            return Err(CartError::StockExceeded {
                available: line.stock_at_last_known,
            });
        }

        if new_quantity < 1 {
            self.lines.remove(index);
        } else if let (Some(line), Ok(quantity)) =
            (self.lines.get_mut(index), u32::try_from(new_quantity))
        {
            line.quantity = quantity;
        }

        self.persist();
        Ok(())
    }

    /// Delete a line unconditionally. Absent lines are a no-op.
    pub fn remove_line(&mut self, product_id: &ProductId) {
        self.lines.retain(|line| &line.product_id != product_id);
        self.persist();
    }

    /// Empty the cart and remove its persisted snapshot. Idempotent.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.persist();
    }

    /// Apply a stock decrease (e.g., a completed purchase) to the lines.
    ///
    /// Each affected line's `stock_at_last_known` drops by the purchased
    /// quantity, floored at 0. Quantities reconcile downward to the new
    /// stock; lines whose stock reaches 0 are removed.
    pub fn reconcile_stock(&mut self, purchased: &[OrderLine]) {
        for purchase in purchased {
            if let Some(line) = self
                .lines
                .iter_mut()
                .find(|line| line.product_id == purchase.product_id)
            {
                line.stock_at_last_known =
                    line.stock_at_last_known.saturating_sub(purchase.quantity);
                if line.quantity > line.stock_at_last_known {
                    tracing::debug!(
                        product_id = %line.product_id,
                        stock = line.stock_at_last_known,
                        "reconciling cart quantity down to stock"
                    );
                    line.quantity = line.stock_at_last_known;
                }
            }
        }

        self.lines.retain(|line| line.quantity >= 1);
        self.persist();
    }

    /// Persist the full snapshot; an empty cart removes the entry instead.
    fn persist(&self) {
        if self.lines.is_empty() {
            self.store.remove(keys::CART);
            return;
        }

        match serde_json::to_string(&self.lines) {
            Ok(snapshot) => self.store.put(keys::CART, &snapshot),
            Err(err) => tracing::warn!(error = %err, "failed to serialize cart snapshot"),
        }
    }
}

/// Drop or clamp restored lines that violate the invariants.
fn sanitize(stored: Vec<CartLine>) -> Vec<CartLine> {
    let mut lines: Vec<CartLine> = Vec::with_capacity(stored.len());

    for mut line in stored {
        if line.quantity == 0 || line.stock_at_last_known == 0 {
            tracing::debug!(product_id = %line.product_id, "dropping invalid restored cart line");
            continue;
        }
        if lines.iter().any(|kept| kept.product_id == line.product_id) {
            tracing::debug!(product_id = %line.product_id, "dropping duplicate restored cart line");
            continue;
        }
        if line.quantity > line.stock_at_last_known {
            line.quantity = line.stock_at_last_known;
        }
        lines.push(line);
    }

    lines
}
