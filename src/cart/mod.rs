//! The buyer's cart: one line per product, persisted to a slot after every change.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Category, ProductEntity};

pub mod sessions;
pub mod slot;

pub use slot::{CartSlot, MemorySlot};

/// The product as it was when it went into the cart. Its price is the one charged at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartProduct {
    pub id: i32,
    pub name: String,
    #[schema(value_type = String, example = "2.99")]
    pub price: BigDecimal,
    pub image_url: String,
    pub description: String,
    pub category: Category,
}

impl From<&ProductEntity> for CartProduct {
    fn from(product: &ProductEntity) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price.clone(),
            image_url: product.image_url.clone(),
            description: product.description.clone(),
            category: product.category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product: CartProduct,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> BigDecimal {
        &self.product.price * BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub total_items: u64,
    #[schema(value_type = String, example = "19.42")]
    pub subtotal: BigDecimal,
}

pub struct Cart<S: CartSlot> {
    lines: Vec<CartLine>,
    slot: S,
}

impl<S: CartSlot> Cart<S> {
    /// Rehydrates the cart from `slot`. Unreadable or malformed content yields an empty cart.
    pub fn open(slot: S) -> Self {
        let lines = match slot.load() {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CartLine>>(&raw) {
                Ok(lines) => lines.into_iter().filter(|line| line.quantity > 0).collect(),
                Err(err) => {
                    tracing::warn!("Failed to parse saved cart: {}", err);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!("Failed to read saved cart: {}", err);
                Vec::new()
            }
        };

        Self { lines, slot }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn add_item(&mut self, product: CartProduct, quantity: u32) {
        if quantity == 0 {
            return;
        }

        match self.lines.iter_mut().find(|line| line.product.id == product.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(CartLine { product, quantity }),
        }
        self.persist();
    }

    /// Sets the quantity exactly; zero or below removes the line.
    pub fn update_quantity(&mut self, product_id: i32, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(product_id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product.id == product_id)
        {
            line.quantity = quantity;
            self.persist();
        }
    }

    pub fn remove_item(&mut self, product_id: i32) {
        let before = self.lines.len();
        self.lines.retain(|line| line.product.id != product_id);
        if self.lines.len() != before {
            self.persist();
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.persist();
    }

    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn subtotal(&self) -> BigDecimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary {
            lines: self.lines.clone(),
            total_items: self.total_items(),
            subtotal: self.subtotal(),
        }
    }

    fn persist(&self) {
        let raw = match serde_json::to_string(&self.lines) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::error!("Failed to serialize cart: {}", err);
                return;
            }
        };
        if let Err(err) = self.slot.store(&raw) {
            tracing::error!("Failed to save cart: {}", err);
        }
    }
}
