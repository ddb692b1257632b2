//! Harvest items produced by crops.

use serde::{Deserialize, Serialize};

/// The two item classes a crop can drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestItem {
    /// The crop's produce (grain, fruit, ...).
    Primary,
    /// Seeds that can be replanted.
    Seed,
}

/// A counted stack of a named item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Which item class this stack belongs to.
    pub kind: HarvestItem,
    /// Species-specific item name (e.g. `"oats"`, `"oat_seeds"`).
    pub item: String,
    /// Number of items in the stack.
    pub count: u32,
}

impl ItemStack {
    /// Create a stack.
    pub fn new(kind: HarvestItem, item: impl Into<String>, count: u32) -> Self {
        Self {
            kind,
            item: item.into(),
            count,
        }
    }

    /// Whether the stack holds nothing.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stack() {
        assert!(ItemStack::new(HarvestItem::Primary, "oats", 0).is_empty());
        assert!(!ItemStack::new(HarvestItem::Seed, "oat_seeds", 1).is_empty());
    }
}
