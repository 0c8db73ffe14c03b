use hearth_core::ProductId;
use hearth_core::session::{ComparisonError, ComparisonSet};

use super::StoreContext;
use crate::events::StoreEvent;
use crate::storage::keys;

/// Products picked for side-by-side comparison.
pub struct ComparisonStore {
    set: ComparisonSet,
    ctx: StoreContext,
}

impl ComparisonStore {
    #[must_use]
    pub fn load(ctx: StoreContext) -> Self {
        let set = ctx.load(keys::COMPARISON);
        Self { set, ctx }
    }

    /// # Errors
    ///
    /// Returns [`ComparisonError`] when the set is full or already holds `id`;
    /// nothing is persisted in that case.
    pub fn add(&mut self, id: ProductId) -> Result<(), ComparisonError> {
        self.set.add(id)?;
        self.changed();
        Ok(())
    }

    pub fn remove(&mut self, id: ProductId) -> bool {
        let removed = self.set.remove(id);
        if removed {
            self.changed();
        }
        removed
    }

    /// Returns whether `id` is compared afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ComparisonError::Full`] when adding to a full set.
    pub fn toggle(&mut self, id: ProductId) -> Result<bool, ComparisonError> {
        let now_present = self.set.toggle(id)?;
        self.changed();
        Ok(now_present)
    }

    pub fn clear(&mut self) {
        self.set.clear();
        self.changed();
    }

    #[must_use]
    pub fn ids(&self) -> &[ProductId] {
        self.set.ids()
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.set.contains(id)
    }

    fn changed(&self) {
        self.ctx.persist(keys::COMPARISON, &self.set);
        self.ctx.publish(StoreEvent::ComparisonChanged {
            ids: self.set.ids().to_vec(),
        });
    }
}
