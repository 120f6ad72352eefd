//! Catalog product type.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A purchasable product as returned by `GET /products`.
///
/// Immutable once fetched; the catalog snapshot owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Backend identifier.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Category the product belongs to.
    pub category: String,
    /// Unit price.
    pub cost: Price,
    /// Aggregate rating out of five.
    #[serde(default)]
    pub rating: f32,
    /// Product image URL.
    #[serde(rename = "image")]
    pub image_url: String,
}
