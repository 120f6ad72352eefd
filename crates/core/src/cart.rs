//! Cart assembly and valuation.
//!
//! The backend stores a sparse cart (`productId` + `qty` pairs). Rendering it
//! needs the full product data, so the cart is joined against the current
//! catalog snapshot every time either side changes.

use serde::{Deserialize, Serialize};

use crate::types::{Price, Product, ProductId};

/// A cart entry as exchanged with `GET /cart` and `POST /cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    pub qty: u32,
}

impl CartEntry {
    /// Create a new cart entry.
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, qty: u32) -> Self {
        Self {
            product_id: product_id.into(),
            qty,
        }
    }
}

/// A cart entry enriched with its product's fields.
///
/// Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub cost: Price,
    pub rating: f32,
    pub image_url: String,
    pub qty: u32,
}

impl CartLineItem {
    /// Line total (`cost × qty`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.cost.times(self.qty)
    }

    fn from_parts(entry: &CartEntry, product: &Product) -> Self {
        Self {
            product_id: entry.product_id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            cost: product.cost,
            rating: product.rating,
            image_url: product.image_url.clone(),
            qty: entry.qty,
        }
    }
}

/// Join cart entries against the catalog.
///
/// Output follows the order of `cart`. Each entry takes the first product with
/// a matching ID; entries with no matching product are dropped. An absent cart
/// and an empty cart both produce an empty list.
#[must_use]
pub fn generate_cart_items_from(
    cart: Option<&[CartEntry]>,
    products: &[Product],
) -> Vec<CartLineItem> {
    let Some(cart) = cart else {
        return Vec::new();
    };

    cart.iter()
        .filter_map(|entry| {
            products
                .iter()
                .find(|product| product.id == entry.product_id)
                .map(|product| CartLineItem::from_parts(entry, product))
        })
        .collect()
}

/// Sum of `cost × qty` over all items. Zero for an empty cart.
#[must_use]
pub fn total_cart_value(items: &[CartLineItem]) -> Price {
    items.iter().map(CartLineItem::line_total).sum()
}

/// Total number of units across all items.
#[must_use]
pub fn total_item_count(items: &[CartLineItem]) -> u64 {
    items.iter().map(|item| u64::from(item.qty)).sum()
}

/// Whether a product already has a line in the cart.
#[must_use]
pub fn is_item_in_cart(items: &[CartLineItem], product_id: &ProductId) -> bool {
    items.iter().any(|item| &item.product_id == product_id)
}

/// Rendered cart state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineItem>,
    pub total: Price,
    pub item_count: u64,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assemble and value a cart in one step.
    #[must_use]
    pub fn from_parts(cart: Option<&[CartEntry]>, products: &[Product]) -> Self {
        let items = generate_cart_items_from(cart, products);
        Self::from_items(items)
    }

    /// Wrap already-assembled line items.
    #[must_use]
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        let total = total_cart_value(&items);
        let item_count = total_item_count(&items);
        Self {
            items,
            total,
            item_count,
        }
    }

    /// Whether the empty-cart view should be shown.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a product already has a line in this cart.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        is_item_in_cart(&self.items, product_id)
    }

    /// Current quantity of a product, zero if absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.items
            .iter()
            .find(|item| &item.product_id == product_id)
            .map_or(0, |item| item.qty)
    }
}
