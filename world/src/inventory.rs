//! Consumable counts.

use overheat_core::{ActionError, InventoryCounts, PowerupKind};

/// Counts of every consumable held by the player. Counts never go negative.
#[derive(Clone, Debug, Default)]
pub struct Inventory {
    counts: InventoryCounts,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one unit and returns the new count.
    pub fn credit(&mut self, kind: PowerupKind) -> u32 {
        let count = self.count_mut(kind);
        *count = count.saturating_add(1);
        *count
    }

    /// Spends one unit, returning the remaining count.
    ///
    /// Fails without mutation when no units are held.
    pub fn try_consume(&mut self, kind: PowerupKind) -> Result<u32, ActionError> {
        let count = self.count_mut(kind);
        if *count == 0 {
            return Err(ActionError::InsufficientInventory(kind));
        }
        *count -= 1;
        Ok(*count)
    }

    /// Snapshot of every count.
    #[must_use]
    pub const fn counts(&self) -> InventoryCounts {
        self.counts
    }

    fn count_mut(&mut self, kind: PowerupKind) -> &mut u32 {
        match kind {
            PowerupKind::Cool => &mut self.counts.cool,
            PowerupKind::Freeze => &mut self.counts.freeze,
            PowerupKind::Clear => &mut self.counts.clear,
        }
    }
}
