//! Wire types for the commerce backend's REST API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pomelo_core::{CurrencyCode, OrderId, Price, ProductId};

use crate::models::Product;

/// Login request body.
#[derive(Debug, Serialize)]
pub struct AuthRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Login response body.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    /// Opaque bearer token; identity claims are decoded client-side.
    pub token: String,
}

/// Response from the token confirmation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUserResponse {
    pub email: String,
    #[serde(default)]
    pub authorities: Vec<String>,
}

/// Product as the backend reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductPayload {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
    /// Percentage discount (0-100) currently applied, if any.
    #[serde(default)]
    pub discount: Option<Decimal>,
    pub stock: u32,
    pub active: bool,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl From<ProductPayload> for Product {
    fn from(payload: ProductPayload) -> Self {
        Self {
            id: payload.id,
            title: payload.title,
            price: Price::new(payload.price, payload.currency),
            discount_percent: payload.discount,
            stock: payload.stock,
            active: payload.active,
            image_url: payload.image_url,
        }
    }
}

/// One product's quantity within an order.
///
/// Used both as submission input and as the backend's echo of what it
/// accepted, which is why it round-trips through serde.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Order submission request body.
#[derive(Debug, Serialize)]
pub struct OrderRequest<'a> {
    pub lines: &'a [OrderLine],
}

/// Response from the order submission endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    /// Echo of the accepted line items.
    pub lines: Vec<OrderLine>,
}
