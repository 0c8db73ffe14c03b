use chrono::Utc;
use hearth_core::ProductId;
use hearth_core::catalog::Product;
use hearth_core::session::{Cart, CartError, CartItem};
use rust_decimal::Decimal;
use tracing::debug;

use super::StoreContext;
use crate::events::StoreEvent;
use crate::storage::keys;

/// The shopper's cart.
pub struct CartStore {
    cart: Cart,
    ctx: StoreContext,
}

impl CartStore {
    /// Load the cart from storage.
    #[must_use]
    pub fn load(ctx: StoreContext) -> Self {
        let cart = ctx.load(keys::CART);
        Self { cart, ctx }
    }

    /// Add units of a product. Returns the line's new quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for zero.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<u32, CartError> {
        let quantity = self.cart.add(product, quantity, Utc::now())?;
        debug!(product_id = %product.id, quantity, "Cart line updated");
        self.changed();
        Ok(quantity)
    }

    /// Set a line's quantity; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] for unknown lines.
    pub fn set_quantity(&mut self, id: ProductId, quantity: u32) -> Result<(), CartError> {
        self.cart.set_quantity(id, quantity)?;
        self.changed();
        Ok(())
    }

    /// Take one unit off a line. Returns the remaining quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] for unknown lines.
    pub fn decrement(&mut self, id: ProductId) -> Result<u32, CartError> {
        let remaining = self.cart.decrement(id)?;
        self.changed();
        Ok(remaining)
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let removed = self.cart.remove(id);
        if removed {
            self.changed();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.cart.clear();
        self.changed();
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.cart.item_count()
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.cart.subtotal()
    }

    #[must_use]
    pub fn total_weight(&self) -> Decimal {
        self.cart.total_weight()
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    fn changed(&self) {
        self.ctx.persist(keys::CART, &self.cart);
        self.ctx.publish(StoreEvent::CartChanged {
            item_count: self.cart.item_count(),
            subtotal: self.cart.subtotal(),
        });
    }
}
