//! Cart lines and cart operations.
//!
//! [`Cart`] holds the pure state transitions. It knows nothing about
//! sessions, storage, or subscribers; `CartStore` layers those on top.

use serde::{Deserialize, Serialize};

use quickcart_core::{Price, Product, ProductId};

/// One product in the cart with its cached display data.
///
/// Title, price, and thumbnail are copied from the product when it is first
/// added and never refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product identifier, unique within the cart.
    #[serde(rename = "id")]
    pub product_id: ProductId,
    /// Cached product title.
    pub title: String,
    /// Cached unit price.
    #[serde(rename = "price")]
    pub unit_price: Price,
    /// Quantity, at least 1.
    pub quantity: u32,
    /// Cached thumbnail URL.
    #[serde(rename = "thumbnail", default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl CartLine {
    /// A new line with quantity 1.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            title: product.title.clone(),
            unit_price: product.price,
            quantity: 1,
            thumbnail_url: product.thumbnail_url().map(str::to_string),
        }
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Externally visible cart state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartState {
    Empty,
    NonEmpty,
}

/// Published by the cart store after every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartEvent {
    /// Sum of quantities across all lines.
    pub item_count: u32,
    pub state: CartState,
}

/// An ordered list of cart lines keyed by product ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a cart from stored lines, restoring the cart invariants.
    ///
    /// Lines with quantity 0 are dropped and repeated product IDs are merged
    /// into the first occurrence.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            if line.quantity == 0 {
                continue;
            }
            match cart.position(&line.product_id) {
                Some(idx) => {
                    if let Some(existing) = cart.lines.get_mut(idx) {
                        existing.quantity = existing.quantity.saturating_add(line.quantity);
                    }
                }
                None => cart.lines.push(line),
            }
        }
        cart
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up a line by product.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product_id == product_id)
    }

    /// Add one unit of `product`, creating the line if needed.
    pub fn add(&mut self, product: &Product) {
        match self.lines.iter_mut().find(|line| line.product_id == product.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine::from_product(product)),
        }
    }

    /// Overwrite a line's quantity, removing it when `quantity <= 0`.
    ///
    /// Returns `true` if the cart changed. Unknown products are ignored.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> bool {
        let Some(idx) = self.position(product_id) else {
            return false;
        };

        if quantity <= 0 {
            self.lines.remove(idx);
            return true;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.lines.get_mut(idx) {
            Some(line) if line.quantity != quantity => {
                line.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Remove a line. Returns `true` if it was present.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        match self.position(product_id) {
            Some(idx) => {
                self.lines.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of line totals; zero when empty.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn state(&self) -> CartState {
        if self.is_empty() {
            CartState::Empty
        } else {
            CartState::NonEmpty
        }
    }

    /// Snapshot for subscribers.
    #[must_use]
    pub fn event(&self) -> CartEvent {
        CartEvent {
            item_count: self.item_count(),
            state: self.state(),
        }
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| &line.product_id == product_id)
    }
}
