//! Scripted players used by headless runs.

use std::time::Duration;

use clap::ValueEnum;
use overheat_core::{Event, PowerupKind, RemovalCause, ThreatCategory};
use overheat_session::{BestTimeStore, SessionController};

/// Behaviour of the scripted player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Strategy {
    /// Never acts; the machine overheats on its own.
    Idle,
    /// Closes safe threats, catches centred items and spends consumables.
    Reflex,
}

/// Tallies of what happened during a single run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct RunStats {
    pub(crate) spawned: u32,
    pub(crate) closed: u32,
    pub(crate) expired: u32,
    pub(crate) caught: u32,
    pub(crate) consumed: u32,
}

impl RunStats {
    /// Folds a session event into the tallies.
    pub(crate) fn observe(&mut self, event: &Event) {
        match event {
            Event::ThreatSpawned { .. } => self.spawned += 1,
            Event::ThreatRemoved { cause, .. } => match cause {
                RemovalCause::Closed => self.closed += 1,
                RemovalCause::Expired => self.expired += 1,
                RemovalCause::Cleared => {}
            },
            Event::PowerupCaught { .. } => self.caught += 1,
            Event::EffectApplied { .. } => self.consumed += 1,
            _ => {}
        }
    }
}

/// Scripted player with a fixed reaction time.
#[derive(Debug)]
pub(crate) struct Autopilot {
    strategy: Strategy,
    reaction: Duration,
    since_close: Duration,
}

impl Autopilot {
    pub(crate) fn new(strategy: Strategy, reaction: Duration) -> Self {
        Self {
            strategy,
            reaction,
            since_close: Duration::ZERO,
        }
    }

    /// Issues at most one action of each kind for the upcoming tick.
    pub(crate) fn act<S: BestTimeStore>(&mut self, session: &mut SessionController<S>, dt: Duration) {
        if self.strategy == Strategy::Idle {
            return;
        }

        self.since_close = self.since_close.saturating_add(dt);
        if self.since_close >= self.reaction {
            let target = session
                .active_threats()
                .iter()
                .find(|threat| threat.category != ThreatCategory::Hazard)
                .map(|threat| threat.id);
            if let Some(threat) = target {
                let _ = session.request_close_threat(threat);
                self.since_close = Duration::ZERO;
            }
        }

        let hit_zone = session.config().powerups.hit_zone_half_width;
        if let Some(item) = session.active_powerup_item() {
            if item.position.abs() <= hit_zone * 0.5 {
                let _ = session.request_catch_attempt();
            }
        }

        let counts = session.inventory_counts();
        if counts.clear > 0 && session.active_threats().len() >= 12 {
            let _ = session.request_consume(PowerupKind::Clear);
        }
        if counts.freeze > 0 && !session.is_frozen() && session.heat_normalized() >= 0.6 {
            let _ = session.request_consume(PowerupKind::Freeze);
        }
        if counts.cool > 0 && session.heat_normalized() >= 0.8 {
            let _ = session.request_consume(PowerupKind::Cool);
        }
    }

    /// Clears per-run state after a restart.
    pub(crate) fn reset(&mut self) {
        self.since_close = Duration::ZERO;
    }
}
