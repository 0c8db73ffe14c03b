//! Shopping cart held in client-side session state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::ProductId;

/// Errors returned by cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Quantities added to the cart must be positive.
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    /// The product has no line in the cart.
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),
}

/// One cart line.
///
/// Name, price and image are captured when the product is added and are not
/// refreshed from the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Parcel weight per unit, when the product declared one.
    #[serde(default)]
    pub weight_kg: Option<Decimal>,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Cart contents: at most one line per product, every quantity >= 1.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl From<Vec<CartItem>> for Cart {
    /// Rebuild a cart from stored lines, merging duplicates and dropping
    /// empty lines.
    fn from(lines: Vec<CartItem>) -> Self {
        let mut cart = Self::default();
        for line in lines {
            if line.quantity == 0 {
                continue;
            }
            if let Some(existing) = cart.line_mut(line.product_id) {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            } else {
                cart.items.push(line);
            }
        }
        cart
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl Cart {
    fn line_mut(&mut self, id: ProductId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.product_id == id)
    }

    /// Add `quantity` units of `product`, merging with an existing line.
    ///
    /// Returns the resulting quantity of that line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] when `quantity` is zero.
    pub fn add(
        &mut self,
        product: &Product,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<u32, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        if let Some(line) = self.line_mut(product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
            return Ok(line.quantity);
        }
        self.items.push(CartItem {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity,
            image_url: product.image_url.clone(),
            weight_kg: product.weight_kg(),
            added_at: now,
        });
        Ok(quantity)
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if the product has no line.
    pub fn set_quantity(&mut self, id: ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return if self.remove(id) {
                Ok(())
            } else {
                Err(CartError::NotInCart(id))
            };
        }
        let line = self.line_mut(id).ok_or(CartError::NotInCart(id))?;
        line.quantity = quantity;
        Ok(())
    }

    /// Take one unit off a line; removing the last unit removes the line.
    ///
    /// Returns the remaining quantity (zero when the line was removed).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if the product has no line.
    pub fn decrement(&mut self, id: ProductId) -> Result<u32, CartError> {
        let line = self.line_mut(id).ok_or(CartError::NotInCart(id))?;
        if line.quantity > 1 {
            line.quantity -= 1;
            return Ok(line.quantity);
        }
        self.remove(id);
        Ok(0)
    }

    /// Remove a line entirely. Returns whether a line was removed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == id)
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Sum of line totals at captured prices.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Parcel weight in kilograms; lines without a weight count 1 kg per unit.
    #[must_use]
    pub fn total_weight(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.weight_kg.unwrap_or(Decimal::ONE) * Decimal::from(item.quantity))
            .sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;

    #[test]
    fn test_adding_twice_increments_quantity() {
        let mut cart = Cart::default();
        let p = product(1, "meteor", 1000, 0);
        assert_eq!(cart.add(&p, 1, Utc::now()).unwrap(), 1);
        assert_eq!(cart.add(&p, 2, Utc::now()).unwrap(), 3);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal(), Decimal::new(3000, 0));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut cart = Cart::default();
        let p = product(1, "meteor", 1000, 0);
        assert_eq!(cart.add(&p, 0, Utc::now()), Err(CartError::InvalidQuantity));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_removing_last_unit_removes_line() {
        let mut cart = Cart::default();
        let p = product(1, "meteor", 1000, 0);
        cart.add(&p, 2, Utc::now()).unwrap();
        assert_eq!(cart.decrement(p.id).unwrap(), 1);
        assert_eq!(cart.decrement(p.id).unwrap(), 0);
        assert!(cart.get(p.id).is_none());
        assert_eq!(cart.decrement(p.id), Err(CartError::NotInCart(p.id)));
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::default();
        let p = product(7, "mk", 10, 0);
        cart.add(&p, 4, Utc::now()).unwrap();
        cart.set_quantity(p.id, 2).unwrap();
        assert_eq!(cart.get(p.id).unwrap().quantity, 2);
        cart.set_quantity(p.id, 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_price_captured_at_add_time() {
        let mut cart = Cart::default();
        let mut p = product(1, "meteor", 1000, 0);
        cart.add(&p, 1, Utc::now()).unwrap();
        p.price = Decimal::new(2000, 0);
        cart.add(&p, 1, Utc::now()).unwrap();
        assert_eq!(cart.get(p.id).unwrap().price, Decimal::new(1000, 0));
    }

    #[test]
    fn test_total_weight_defaults_to_one_kg_per_unit() {
        let mut cart = Cart::default();
        let mut heavy = product(1, "meteor", 1, 0);
        heavy
            .specifications
            .insert(crate::catalog::WEIGHT_SPEC_KEY.to_string(), "30".to_string());
        cart.add(&heavy, 2, Utc::now()).unwrap();
        cart.add(&product(2, "mk", 1, 0), 3, Utc::now()).unwrap();
        assert_eq!(cart.total_weight(), Decimal::new(63, 0));
    }

    #[test]
    fn test_serde_roundtrip_preserves_lines() {
        let mut cart = Cart::default();
        cart.add(&product(2, "mk", 500, 0), 2, Utc::now()).unwrap();
        cart.add(&product(1, "meteor", 1000, 0), 1, Utc::now()).unwrap();
        let json = serde_json::to_string(&cart).unwrap();
        let parsed: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cart);
    }

    #[test]
    fn test_deserialize_normalizes_duplicates_and_empty_lines() {
        let mut cart = Cart::default();
        cart.add(&product(1, "mk", 10, 0), 1, Utc::now()).unwrap();
        let line = cart.items()[0].clone();
        let mut empty = line.clone();
        empty.product_id = ProductId::new(2);
        empty.quantity = 0;
        let json = serde_json::to_string(&vec![line.clone(), line, empty]).unwrap();
        let parsed: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.items().len(), 1);
        assert_eq!(parsed.item_count(), 2);
    }
}
