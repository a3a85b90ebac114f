//! Consumable effects executed against heat and the threat registry.

use overheat_core::{Event, PowerupKind, RemovalCause};
use tracing::{debug, warn};

use crate::World;

/// Spends one unit of `kind` and applies its effect.
pub(crate) fn consume(world: &mut World, kind: PowerupKind, out_events: &mut Vec<Event>) {
    if let Err(error) = world.inventory.try_consume(kind) {
        warn!(%kind, %error, "consume rejected");
        out_events.push(Event::ConsumeRejected { kind });
        return;
    }

    match kind {
        PowerupKind::Cool => {
            let amount = world.effects.cool_amount;
            cool(world, amount, out_events);
        }
        PowerupKind::Freeze => {
            let remaining = world.heat.apply_freeze(world.effects.freeze_duration());
            out_events.push(Event::HeatFrozen { remaining });
        }
        PowerupKind::Clear => {
            let removed = world.threats.remove_all();
            debug!(count = removed.len(), "clear effect removed threats");
            for threat in removed {
                out_events.push(Event::ThreatRemoved {
                    threat: threat.id,
                    category: threat.category,
                    cause: RemovalCause::Cleared,
                });
            }

            let bonus = world.effects.clear_bonus;
            if bonus > 0.0 {
                cool(world, bonus, out_events);
            }
            if world.effects.clear_resets_difficulty {
                out_events.push(Event::DifficultyReset);
            }
        }
    }

    out_events.push(Event::EffectApplied { kind });
}

/// Removes `amount` heat and reports the change.
pub(crate) fn cool(world: &mut World, amount: f32, out_events: &mut Vec<Event>) {
    let before = world.heat.heat();
    let heat = world.heat.apply_delta(-amount);
    if heat != before {
        out_events.push(Event::HeatChanged { heat });
    }
}
