#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn scheduler responsible for emitting threat spawn commands.
//!
//! The scheduler keeps two clocks: a spawn timer that restarts after every
//! scheduled spawn, and a difficulty clock that shortens the interval between
//! spawns until it reaches its floor. Both restart on
//! [`Event::DifficultyReset`].

use std::time::Duration;

use overheat_core::{
    config::seconds, weighting::pick_weighted, Command, Event, SelectionTable, SpawnConfig,
    ThreatCatalog, ThreatCategory,
};
use rand::Rng;
use tracing::{debug, warn};

/// A category that can be spawned together with its selection data.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    category: ThreatCategory,
    weight: f32,
    variants: u32,
}

/// Pure system that emits spawn commands as session time advances.
#[derive(Debug)]
pub struct Spawning {
    base_interval: f32,
    min_interval: f32,
    ramp_per_second: f32,
    burst_min: u32,
    burst_max: u32,
    candidates: Vec<Candidate>,
    spawn_timer: Duration,
    difficulty_time: Duration,
    degraded_reported: bool,
    notices: Vec<Event>,
}

impl Spawning {
    /// Creates a scheduler for the provided cadence and catalog.
    ///
    /// Categories whose variant pool is empty are excluded for the lifetime of
    /// the scheduler and reported once through [`Spawning::drain_notices`].
    #[must_use]
    pub fn new(config: &SpawnConfig, catalog: &ThreatCatalog) -> Self {
        let mut candidates = Vec::with_capacity(ThreatCategory::ALL.len());
        let mut notices = Vec::new();

        for category in ThreatCategory::ALL {
            let kind = catalog.get(category);
            if kind.variants.is_empty() {
                warn!(%category, "threat category has no variants and is excluded from spawning");
                notices.push(Event::CategoryUnavailable { category });
                continue;
            }
            candidates.push(Candidate {
                category,
                weight: kind.weight,
                variants: u32::try_from(kind.variants.len()).unwrap_or(u32::MAX),
            });
        }

        Self {
            base_interval: config.base_interval_secs,
            min_interval: config.min_interval_secs,
            ramp_per_second: config.ramp_per_second.max(0.0),
            burst_min: config.swarm_burst_min,
            burst_max: config.swarm_burst_max,
            candidates,
            spawn_timer: Duration::ZERO,
            difficulty_time: Duration::ZERO,
            degraded_reported: false,
            notices,
        }
    }

    /// Consumes events and emits at most one scheduled spawn command.
    pub fn handle<R: Rng + ?Sized>(
        &mut self,
        events: &[Event],
        rng: &mut R,
        out: &mut Vec<Command>,
    ) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => accumulated = accumulated.saturating_add(*dt),
                Event::DifficultyReset => {
                    debug!(
                        difficulty = self.difficulty_time.as_secs_f32(),
                        "difficulty ramp restarted"
                    );
                    self.spawn_timer = Duration::ZERO;
                    self.difficulty_time = Duration::ZERO;
                    accumulated = Duration::ZERO;
                }
                _ => {}
            }
        }

        if accumulated.is_zero() {
            return;
        }

        self.spawn_timer = self.spawn_timer.saturating_add(accumulated);
        self.difficulty_time = self.difficulty_time.saturating_add(accumulated);

        if self.spawn_timer < self.current_interval() {
            return;
        }
        self.spawn_timer = Duration::ZERO;

        if let Some(candidate) = self.select_candidate(rng) {
            out.push(Self::spawn_command(candidate, rng));
        }
    }

    /// Emits `count` spawn commands of `category`, bypassing weights and timers.
    ///
    /// An unavailable category falls back to a weighted pick among the
    /// available ones for every unit. Returns the number of commands emitted.
    pub fn spawn_multiple<R: Rng + ?Sized>(
        &mut self,
        count: u32,
        category: ThreatCategory,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) -> u32 {
        let requested = self
            .candidates
            .iter()
            .find(|candidate| candidate.category == category)
            .copied();

        let mut emitted = 0;
        for _ in 0..count {
            let candidate = match requested {
                Some(candidate) => candidate,
                None => match self.select_candidate(rng) {
                    Some(candidate) => candidate,
                    None => break,
                },
            };
            out.push(Self::spawn_command(candidate, rng));
            emitted += 1;
        }
        emitted
    }

    /// Draws the size of a swarm burst.
    pub fn burst_size<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if self.burst_max <= self.burst_min {
            return self.burst_min;
        }
        rng.gen_range(self.burst_min..self.burst_max)
    }

    /// Interval between scheduled spawns at the current difficulty.
    #[must_use]
    pub fn current_interval(&self) -> Duration {
        self.interval_at(self.difficulty_time)
    }

    /// Interval between scheduled spawns after `difficulty_time` of ramping.
    #[must_use]
    pub fn interval_at(&self, difficulty_time: Duration) -> Duration {
        let ramped = self.base_interval - self.ramp_per_second * difficulty_time.as_secs_f32();
        seconds(ramped.max(self.min_interval))
    }

    /// Difficulty time accumulated since the last reset.
    #[must_use]
    pub const fn difficulty_time(&self) -> Duration {
        self.difficulty_time
    }

    /// Time accumulated towards the next scheduled spawn.
    #[must_use]
    pub const fn spawn_timer(&self) -> Duration {
        self.spawn_timer
    }

    /// Categories eligible for spawning.
    pub fn available_categories(&self) -> impl Iterator<Item = ThreatCategory> + '_ {
        self.candidates.iter().map(|candidate| candidate.category)
    }

    /// Moves pending configuration notices into `out`.
    pub fn drain_notices(&mut self, out: &mut Vec<Event>) {
        out.append(&mut self.notices);
    }

    fn select_candidate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Candidate> {
        let weights: Vec<f32> = self
            .candidates
            .iter()
            .map(|candidate| candidate.weight)
            .collect();
        let pick = pick_weighted(rng, &weights)?;

        if pick.degraded && !self.degraded_reported {
            warn!("threat weights sum to zero; falling back to uniform selection");
            self.degraded_reported = true;
            self.notices.push(Event::WeightsDegraded {
                table: SelectionTable::Threats,
            });
        }

        self.candidates.get(pick.index).copied()
    }

    fn spawn_command<R: Rng + ?Sized>(candidate: Candidate, rng: &mut R) -> Command {
        Command::SpawnThreat {
            category: candidate.category,
            variant: rng.gen_range(0..candidate.variants),
        }
    }
}
