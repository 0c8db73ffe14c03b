//! Product comparison set.

use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Maximum number of products compared side by side.
pub const MAX_COMPARED: usize = 4;

/// Errors returned by comparison mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ComparisonError {
    #[error("comparison already holds {max} products")]
    Full { max: usize },
    #[error("product {0} is already being compared")]
    AlreadyPresent(ProductId),
}

/// Ordered set of up to [`MAX_COMPARED`] distinct product ids.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ProductId>", into = "Vec<ProductId>")]
pub struct ComparisonSet {
    ids: Vec<ProductId>,
}

impl From<Vec<ProductId>> for ComparisonSet {
    fn from(raw: Vec<ProductId>) -> Self {
        let mut set = Self::default();
        for id in raw {
            // duplicates and overflow from a corrupted store are dropped
            let _ = set.add(id);
        }
        set
    }
}

impl From<ComparisonSet> for Vec<ProductId> {
    fn from(set: ComparisonSet) -> Self {
        set.ids
    }
}

impl ComparisonSet {
    /// Add a product. The set is left unchanged on error.
    ///
    /// # Errors
    ///
    /// [`ComparisonError::AlreadyPresent`] for duplicates,
    /// [`ComparisonError::Full`] when [`MAX_COMPARED`] products are present.
    pub fn add(&mut self, id: ProductId) -> Result<(), ComparisonError> {
        if self.contains(id) {
            return Err(ComparisonError::AlreadyPresent(id));
        }
        if self.ids.len() >= MAX_COMPARED {
            return Err(ComparisonError::Full { max: MAX_COMPARED });
        }
        self.ids.push(id);
        Ok(())
    }

    /// Remove a product. Returns whether it was present.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|&existing| existing != id);
        self.ids.len() != before
    }

    /// Remove if present, add otherwise. Returns whether it is now present.
    ///
    /// # Errors
    ///
    /// [`ComparisonError::Full`] when adding to a full set.
    pub fn toggle(&mut self, id: ProductId) -> Result<bool, ComparisonError> {
        if self.remove(id) {
            return Ok(false);
        }
        self.add(id)?;
        Ok(true)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.ids.contains(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[must_use]
    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.ids.len() >= MAX_COMPARED
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn full_set() -> ComparisonSet {
        let mut set = ComparisonSet::default();
        for i in 1..=4 {
            set.add(ProductId::new(i)).unwrap();
        }
        set
    }

    #[test]
    fn test_fifth_product_rejected() {
        let mut set = full_set();
        assert_eq!(
            set.add(ProductId::new(5)),
            Err(ComparisonError::Full { max: 4 })
        );
        assert_eq!(set.len(), 4);
        assert!(!set.contains(ProductId::new(5)));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut set = ComparisonSet::default();
        set.add(ProductId::new(1)).unwrap();
        assert_eq!(
            set.add(ProductId::new(1)),
            Err(ComparisonError::AlreadyPresent(ProductId::new(1)))
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_toggle() {
        let mut set = ComparisonSet::default();
        assert!(set.toggle(ProductId::new(3)).unwrap());
        assert!(!set.toggle(ProductId::new(3)).unwrap());
        assert!(set.is_empty());
    }

    #[test]
    fn test_serde_roundtrip_keeps_order() {
        let set = full_set();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "[1,2,3,4]");
        let parsed: ComparisonSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn test_deserialize_drops_overflow() {
        let parsed: ComparisonSet = serde_json::from_str("[1,1,2,3,4,5]").unwrap();
        assert_eq!(parsed.ids().len(), 4);
        assert!(!parsed.contains(ProductId::new(5)));
    }
}
