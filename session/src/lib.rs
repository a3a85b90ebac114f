#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session orchestration for Overheat.
//!
//! [`SessionController`] owns the world, the systems and the shared random
//! stream. Time only moves through [`SessionController::advance`], and every
//! player action resolves synchronously against the same state. Within one
//! `advance` the order is fixed: clock and auto-expiry, spawning, heat,
//! catch minigame, termination.

use std::time::Duration;

use overheat_core::{
    ActionError, CatchOutcome, CloseOutcome, Command, EndReason, EndStage, Event,
    InventoryCounts, Lifecycle, PowerupKind, PowerupSnapshot, SessionConfig, ThreatCategory,
    ThreatId, ThreatView,
};
use overheat_system_end_sequence::EndSequence;
use overheat_system_powerup_catch::PowerupCatch;
use overheat_system_spawning::Spawning;
use overheat_world::{self as world, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

mod best_time;

pub use best_time::{BestTimeStore, FileBestTimeStore, MemoryBestTimeStore, StoreError};
pub use overheat_core::ConfigError;

/// Failures raised while creating a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The configuration violates a numeric invariant.
    #[error("invalid session configuration")]
    Config(#[from] ConfigError),
}

/// State rebuilt from scratch for every run.
#[derive(Debug)]
struct Run {
    rng: ChaCha8Rng,
    world: World,
    spawning: Spawning,
    powerups: PowerupCatch,
    end_sequence: EndSequence,
    lifecycle: Lifecycle,
    end_reason: Option<EndReason>,
}

impl Run {
    fn new(config: &SessionConfig, index: u32, out: &mut Vec<Event>) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(derive_run_seed(config.seed, index));
        let mut spawning = Spawning::new(&config.spawning, &config.threats);
        spawning.drain_notices(out);
        let powerups = PowerupCatch::new(&config.powerups, &mut rng);

        Self {
            rng,
            world: World::new(config),
            spawning,
            powerups,
            end_sequence: EndSequence::new(&config.end_sequence),
            lifecycle: Lifecycle::Running,
            end_reason: None,
        }
    }
}

/// Drives a single player's sessions from start to finish and across restarts.
#[derive(Debug)]
pub struct SessionController<S: BestTimeStore> {
    config: SessionConfig,
    store: S,
    best: Duration,
    run_index: u32,
    run: Run,
    paused: bool,
    events: Vec<Event>,
}

impl<S: BestTimeStore> SessionController<S> {
    /// Validates `config`, loads the best time from `store` and starts running.
    pub fn new(config: SessionConfig, mut store: S) -> Result<Self, SessionError> {
        config.validate()?;

        let best = match store.load() {
            Ok(best) => best.unwrap_or(Duration::ZERO),
            Err(error) => {
                warn!(%error, "best time unavailable; starting without a record");
                Duration::ZERO
            }
        };

        let mut events = Vec::new();
        let run = Run::new(&config, 0, &mut events);
        info!(seed = config.seed, best = best.as_secs_f32(), "session started");

        Ok(Self {
            config,
            store,
            best,
            run_index: 0,
            run,
            paused: false,
            events,
        })
    }

    /// Advances the session by `dt`.
    ///
    /// Running sessions ignore time while paused; the end sequence keeps
    /// playing regardless. Over sessions ignore time entirely.
    pub fn advance(&mut self, dt: Duration) {
        match self.run.lifecycle {
            Lifecycle::Running if !self.paused => self.advance_running(dt),
            Lifecycle::Running | Lifecycle::Over => {}
            Lifecycle::Ending => self.advance_ending(dt),
        }
    }

    /// Closes an active threat.
    pub fn request_close_threat(&mut self, threat: ThreatId) -> Result<CloseOutcome, ActionError> {
        self.ensure_running("close threat")?;

        let run = &mut self.run;
        let mut events = Vec::new();
        world::apply(&mut run.world, Command::CloseThreat { threat }, &mut events);

        let mut outcome = CloseOutcome::Removed;
        for event in &events {
            match event {
                Event::ThreatCloseRejected { .. } => {
                    warn!(%threat, "close rejected: threat is not active");
                    return Err(ActionError::NotFound(threat));
                }
                Event::HazardTriggered { .. } => outcome = CloseOutcome::HazardEnded,
                Event::SwarmReleased { .. } => {
                    outcome = CloseOutcome::SwarmBurst { spawned: 0 };
                }
                _ => {}
            }
        }

        if let CloseOutcome::SwarmBurst { .. } = outcome {
            let count = run.spawning.burst_size(&mut run.rng);
            let mut commands = Vec::new();
            let spawned = run.spawning.spawn_multiple(
                count,
                ThreatCategory::Benign,
                &mut run.rng,
                &mut commands,
            );
            for command in commands {
                world::apply(&mut run.world, command, &mut events);
            }
            debug!(%threat, spawned, "swarm burst released");
            outcome = CloseOutcome::SwarmBurst { spawned };
        }

        self.events.append(&mut events);
        if outcome == CloseOutcome::HazardEnded {
            self.begin_ending(EndReason::HazardClicked);
        }
        Ok(outcome)
    }

    /// Spends one unit of `kind` and applies its effect.
    pub fn request_consume(&mut self, kind: PowerupKind) -> Result<(), ActionError> {
        self.ensure_running("consume")?;

        let run = &mut self.run;
        let mut events = Vec::new();
        world::apply(&mut run.world, Command::ConsumeInventory { kind }, &mut events);
        if events.contains(&Event::ConsumeRejected { kind }) {
            return Err(ActionError::InsufficientInventory(kind));
        }

        let mut commands = Vec::new();
        run.spawning.handle(&events, &mut run.rng, &mut commands);
        for command in commands {
            world::apply(&mut run.world, command, &mut events);
        }

        debug!(%kind, "consumable applied");
        self.events.append(&mut events);
        Ok(())
    }

    /// Resolves a catch attempt against the travelling powerup.
    pub fn request_catch_attempt(&mut self) -> Result<CatchOutcome, ActionError> {
        self.ensure_running("catch attempt")?;

        let run = &mut self.run;
        let mut commands = Vec::new();
        let mut events = Vec::new();
        let outcome = run
            .powerups
            .attempt_catch(&mut commands, &mut events)
            .map_err(|error| {
                debug!(%error, "catch attempt ignored");
                error
            })?;
        for command in commands {
            world::apply(&mut run.world, command, &mut events);
        }

        self.events.append(&mut events);
        Ok(outcome)
    }

    /// Replaces the finished session with a fresh one. Only accepted once the
    /// session is over.
    pub fn request_restart(&mut self) -> Result<(), ActionError> {
        if self.run.lifecycle != Lifecycle::Over {
            warn!(lifecycle = %self.run.lifecycle, "restart rejected");
            return Err(ActionError::SessionInactive(self.run.lifecycle));
        }

        self.run_index = self.run_index.wrapping_add(1);
        self.paused = false;
        self.run = Run::new(&self.config, self.run_index, &mut self.events);
        info!(run = self.run_index, "session restarted");
        self.events.push(Event::SessionRestarted {
            run: self.run_index,
        });
        Ok(())
    }

    /// Suspends or resumes simulation time while running.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            debug!(paused, "pause toggled");
        }
        self.paused = paused;
    }

    /// Takes every event emitted since the previous call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Heat scaled into `0.0..=1.0`.
    #[must_use]
    pub fn heat_normalized(&self) -> f32 {
        query::heat_normalized(&self.run.world)
    }

    /// Raw heat value.
    #[must_use]
    pub fn heat(&self) -> f32 {
        query::heat(&self.run.world)
    }

    /// How far normalized heat sits above the intensity threshold, in `0.0..=1.0`.
    #[must_use]
    pub fn heat_intensity(&self) -> f32 {
        let threshold = self.config.heat.intensity_threshold;
        let heat = self.heat_normalized();
        if heat <= threshold {
            return 0.0;
        }
        if threshold >= 1.0 {
            return 1.0;
        }
        ((heat - threshold) / (1.0 - threshold)).min(1.0)
    }

    /// Whether passive heat gain is suspended by a freeze.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        query::is_frozen(&self.run.world)
    }

    /// Time survived in the current run.
    #[must_use]
    pub fn elapsed_time(&self) -> Duration {
        query::clock(&self.run.world)
    }

    /// Best time across all runs, including the persisted record.
    #[must_use]
    pub fn best_time(&self) -> Duration {
        self.best
    }

    /// Counts of every consumable held.
    #[must_use]
    pub fn inventory_counts(&self) -> InventoryCounts {
        query::inventory(&self.run.world)
    }

    /// Active threats in identifier order.
    #[must_use]
    pub fn active_threats(&self) -> ThreatView {
        query::threat_view(&self.run.world)
    }

    /// The catch item currently on the bar.
    #[must_use]
    pub fn active_powerup_item(&self) -> Option<PowerupSnapshot> {
        self.run.powerups.item()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.run.lifecycle
    }

    /// Why the current run ended, once it has.
    #[must_use]
    pub fn end_reason(&self) -> Option<EndReason> {
        self.run.end_reason
    }

    /// End sequence stage currently playing.
    #[must_use]
    pub fn end_stage(&self) -> Option<EndStage> {
        self.run.end_sequence.stage()
    }

    /// Fraction of the current end stage that has elapsed.
    #[must_use]
    pub fn end_stage_progress(&self) -> f32 {
        self.run.end_sequence.progress()
    }

    /// Difficulty time driving the spawn interval.
    #[must_use]
    pub fn difficulty_time(&self) -> Duration {
        self.run.spawning.difficulty_time()
    }

    /// Interval between scheduled spawns at the current difficulty.
    #[must_use]
    pub fn current_spawn_interval(&self) -> Duration {
        self.run.spawning.current_interval()
    }

    /// Whether simulation time is suspended.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Zero-based index of the current run.
    #[must_use]
    pub fn run_index(&self) -> u32 {
        self.run_index
    }

    /// Configuration the session was created with.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Backing best-time store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn advance_running(&mut self, dt: Duration) {
        let run = &mut self.run;
        let mut events = Vec::new();
        world::apply(&mut run.world, Command::Tick { dt }, &mut events);

        let mut commands = Vec::new();
        run.spawning.handle(&events, &mut run.rng, &mut commands);
        run.spawning.drain_notices(&mut events);
        for command in commands {
            world::apply(&mut run.world, command, &mut events);
        }

        let heat_start = events.len();
        world::apply(&mut run.world, Command::IntegrateHeat { dt }, &mut events);
        let overheated = events[heat_start..].contains(&Event::Overheated);

        let mut powerup_events = Vec::new();
        run.powerups
            .handle(&events, &mut run.rng, &mut powerup_events);
        events.append(&mut powerup_events);

        self.events.append(&mut events);
        if overheated {
            self.begin_ending(EndReason::Overheated);
        }
    }

    fn advance_ending(&mut self, dt: Duration) {
        let mut stage_events = Vec::new();
        let complete = self.run.end_sequence.advance(dt, &mut stage_events);
        self.publish_stages(stage_events);

        if complete {
            self.run.lifecycle = Lifecycle::Over;
            let elapsed = self.elapsed_time();
            let reason = self.run.end_reason.unwrap_or(EndReason::Overheated);
            info!(?reason, elapsed = elapsed.as_secs_f32(), "session over");
            self.events.push(Event::SessionOver {
                reason,
                elapsed,
                best: self.best,
            });
        }
    }

    fn begin_ending(&mut self, reason: EndReason) {
        if self.run.lifecycle != Lifecycle::Running {
            return;
        }

        let elapsed = self.elapsed_time();
        self.run.lifecycle = Lifecycle::Ending;
        self.run.end_reason = Some(reason);
        info!(?reason, elapsed = elapsed.as_secs_f32(), "session ending");
        self.events.push(Event::SessionEnding { reason, elapsed });

        if elapsed > self.best {
            self.best = elapsed;
            if let Err(error) = self.store.save(elapsed) {
                warn!(%error, "failed to persist best time");
            }
            info!(best = elapsed.as_secs_f32(), "new best time");
            self.events.push(Event::BestTimeRecorded { best: elapsed });
        }

        let mut stage_events = Vec::new();
        self.run.end_sequence.begin(&mut stage_events);
        self.publish_stages(stage_events);
    }

    fn publish_stages(&mut self, stage_events: Vec<Event>) {
        let elapsed = self.elapsed_time();
        let best = self.best;
        for event in stage_events {
            let reveal = event
                == Event::EndStageEntered {
                    stage: EndStage::Summary,
                };
            self.events.push(event);
            if reveal {
                self.events.push(Event::SummaryRevealed { elapsed, best });
            }
        }
    }

    fn ensure_running(&self, action: &'static str) -> Result<(), ActionError> {
        if self.run.lifecycle == Lifecycle::Running {
            return Ok(());
        }
        warn!(action, lifecycle = %self.run.lifecycle, "action rejected");
        Err(ActionError::SessionInactive(self.run.lifecycle))
    }
}

/// Derives the random stream seed of run `index` from the configured seed.
#[must_use]
pub fn derive_run_seed(seed: u64, index: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(index.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_seeds_differ_per_run_and_repeat_per_seed() {
        assert_eq!(derive_run_seed(7, 0), derive_run_seed(7, 0));
        assert_ne!(derive_run_seed(7, 0), derive_run_seed(7, 1));
        assert_ne!(derive_run_seed(7, 0), derive_run_seed(8, 0));
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let mut config = SessionConfig::default();
        config.heat.max = 0.0;
        let result = SessionController::new(config, MemoryBestTimeStore::default());
        assert!(matches!(result, Err(SessionError::Config(_))));
    }

    #[test]
    fn intensity_tracks_heat_above_threshold() {
        let mut config = SessionConfig::default();
        config.heat.initial = 80.0;
        let session = SessionController::new(config, MemoryBestTimeStore::default()).unwrap();
        assert!((session.heat_intensity() - 0.5).abs() < 1e-5);

        let mut config = SessionConfig::default();
        config.heat.initial = 50.0;
        let session = SessionController::new(config, MemoryBestTimeStore::default()).unwrap();
        assert_eq!(session.heat_intensity(), 0.0);
    }
}
