#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Overheat.

use std::time::Duration;

use overheat_core::{
    Command, EffectConfig, Event, RemovalCause, SessionConfig, ThreatCatalog, ThreatCategory,
};
use tracing::{debug, trace};

mod effects;
pub mod heat;
pub mod inventory;
pub mod threats;

use heat::{HeatEngine, HeatTick};
use inventory::Inventory;
use threats::ThreatRegistry;

/// Represents the authoritative state of a single session.
#[derive(Debug)]
pub struct World {
    clock: Duration,
    heat: HeatEngine,
    threats: ThreatRegistry,
    inventory: Inventory,
    catalog: ThreatCatalog,
    effects: EffectConfig,
}

impl World {
    /// Creates a fresh world from the provided session configuration.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            clock: Duration::ZERO,
            heat: HeatEngine::new(&config.heat),
            threats: ThreatRegistry::new(),
            inventory: Inventory::new(),
            catalog: config.threats.clone(),
            effects: config.effects.clone(),
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });

            for threat in world.threats.expire(world.clock) {
                trace!(threat = %threat.id, category = %threat.category, "threat expired");
                out_events.push(Event::ThreatRemoved {
                    threat: threat.id,
                    category: threat.category,
                    cause: RemovalCause::Expired,
                });
            }
        }
        Command::SpawnThreat { category, variant } => {
            let expires_at = world
                .catalog
                .lifetime(category)
                .map(|lifetime| world.clock.saturating_add(lifetime));
            let threat = world.threats.insert(category, variant, expires_at);
            debug!(%threat, %category, variant, "threat spawned");
            out_events.push(Event::ThreatSpawned {
                threat,
                category,
                variant,
                expires_at,
            });
        }
        Command::CloseThreat { threat } => {
            let Some(removed) = world.threats.remove(threat) else {
                debug!(%threat, "close ignored for inactive threat");
                out_events.push(Event::ThreatCloseRejected { threat });
                return;
            };

            out_events.push(Event::ThreatRemoved {
                threat,
                category: removed.category,
                cause: RemovalCause::Closed,
            });

            let cooling = world.effects.close_cooling;
            match removed.category {
                ThreatCategory::Benign => effects::cool(world, cooling, out_events),
                ThreatCategory::Hazard => out_events.push(Event::HazardTriggered { threat }),
                ThreatCategory::Swarm => {
                    effects::cool(world, cooling, out_events);
                    out_events.push(Event::SwarmReleased { threat });
                }
            }
        }
        Command::IntegrateHeat { dt } => {
            let before = world.heat.heat();
            match world.heat.tick(dt, world.threats.len()) {
                HeatTick::Frozen => {}
                HeatTick::Thawed => out_events.push(Event::HeatThawed),
                HeatTick::Warmed { overheated } => {
                    let heat = world.heat.heat();
                    if heat != before {
                        out_events.push(Event::HeatChanged { heat });
                    }
                    if overheated {
                        out_events.push(Event::Overheated);
                    }
                }
            }
        }
        Command::CreditInventory { kind } => {
            let count = world.inventory.credit(kind);
            debug!(%kind, count, "inventory credited");
            out_events.push(Event::InventoryCredited { kind, count });
        }
        Command::ConsumeInventory { kind } => effects::consume(world, kind, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use overheat_core::{InventoryCounts, ThreatId, ThreatSnapshot, ThreatView};

    use super::World;

    /// Session time accumulated through [`overheat_core::Command::Tick`].
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Current heat.
    #[must_use]
    pub fn heat(world: &World) -> f32 {
        world.heat.heat()
    }

    /// Heat at which the machine overheats.
    #[must_use]
    pub fn heat_max(world: &World) -> f32 {
        world.heat.max()
    }

    /// Heat scaled into `0.0..=1.0`.
    #[must_use]
    pub fn heat_normalized(world: &World) -> f32 {
        world.heat.normalized()
    }

    /// Whether passive heat gain is suspended.
    #[must_use]
    pub fn is_frozen(world: &World) -> bool {
        world.heat.is_frozen()
    }

    /// Freeze time left.
    #[must_use]
    pub fn freeze_remaining(world: &World) -> Duration {
        world.heat.freeze_remaining()
    }

    /// Captures a read-only view of the active threats.
    #[must_use]
    pub fn threat_view(world: &World) -> ThreatView {
        world.threats.view()
    }

    /// Snapshot of a single active threat.
    #[must_use]
    pub fn threat(world: &World, id: ThreatId) -> Option<ThreatSnapshot> {
        world.threats.get(id).map(|threat| ThreatSnapshot {
            id: threat.id,
            category: threat.category,
            variant: threat.variant,
            expires_at: threat.expires_at,
        })
    }

    /// Number of active threats.
    #[must_use]
    pub fn active_threat_count(world: &World) -> usize {
        world.threats.len()
    }

    /// Counts of every consumable held.
    #[must_use]
    pub fn inventory(world: &World) -> InventoryCounts {
        world.inventory.counts()
    }
}
