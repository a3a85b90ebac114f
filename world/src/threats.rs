//! Authoritative threat storage.
//!
//! Threats live in a slot arena. Freed slots are recycled through a free
//! list, and every reuse bumps the slot generation so stale identifiers keep
//! missing instead of hitting the newcomer.

use std::time::Duration;

use overheat_core::{ThreatCategory, ThreatId, ThreatSnapshot, ThreatView};

/// A single active threat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Threat {
    /// Identifier allocated by the registry.
    pub id: ThreatId,
    /// Category of the threat.
    pub category: ThreatCategory,
    /// Presentation variant from the category pool.
    pub variant: u32,
    /// Session time at which the threat leaves on its own, if ever.
    pub expires_at: Option<Duration>,
}

impl Threat {
    fn snapshot(&self) -> ThreatSnapshot {
        ThreatSnapshot {
            id: self.id,
            category: self.category,
            variant: self.variant,
            expires_at: self.expires_at,
        }
    }
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    threat: Option<Threat>,
}

/// Owns the set of active threats.
#[derive(Clone, Debug, Default)]
pub struct ThreatRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    active: usize,
}

impl ThreatRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new threat and returns its identifier.
    pub fn insert(
        &mut self,
        category: ThreatCategory,
        variant: u32,
        expires_at: Option<Duration>,
    ) -> ThreatId {
        let slot_index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    threat: None,
                });
                u32::try_from(self.slots.len() - 1).unwrap_or(u32::MAX)
            }
        };

        let slot = &mut self.slots[slot_index as usize];
        let id = ThreatId::new(slot_index, slot.generation);
        slot.threat = Some(Threat {
            id,
            category,
            variant,
            expires_at,
        });
        self.active += 1;
        id
    }

    /// Retrieves an active threat.
    #[must_use]
    pub fn get(&self, id: ThreatId) -> Option<&Threat> {
        self.slots
            .get(id.slot() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.threat.as_ref())
    }

    /// Removes a threat. Removing an identifier that is not active is a no-op.
    pub fn remove(&mut self, id: ThreatId) -> Option<Threat> {
        let slot = self.slots.get_mut(id.slot() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let threat = slot.threat.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.slot());
        self.active -= 1;
        Some(threat)
    }

    /// Removes every threat, returning them in identifier order.
    pub fn remove_all(&mut self) -> Vec<Threat> {
        let ids: Vec<ThreatId> = self.iter().map(|threat| threat.id).collect();
        ids.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Removes every threat whose deadline is at or before `now`.
    pub fn expire(&mut self, now: Duration) -> Vec<Threat> {
        let due: Vec<ThreatId> = self
            .iter()
            .filter(|threat| threat.expires_at.is_some_and(|deadline| deadline <= now))
            .map(|threat| threat.id)
            .collect();
        due.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Iterator over active threats in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Threat> {
        self.slots.iter().filter_map(|slot| slot.threat.as_ref())
    }

    /// Number of active threats.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.active
    }

    /// Whether no threats are active.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Captures a read-only view of the active threats.
    #[must_use]
    pub fn view(&self) -> ThreatView {
        ThreatView::from_snapshots(self.iter().map(Threat::snapshot).collect())
    }
}
