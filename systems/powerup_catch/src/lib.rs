#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Catch minigame that grants consumables for well-timed input.
//!
//! A single item at a time travels across a bar whose centre is the hit
//! zone. Positions are measured from that centre, so the bar spans
//! `-bar_half_width..=bar_half_width`. An item that reaches the far edge
//! untouched is discarded without penalty.

use std::time::Duration;

use overheat_core::{
    config::seconds, weighting::pick_weighted, ActionError, CatchOutcome, Command, Event,
    PowerupConfig, PowerupKind, PowerupPhase, PowerupSnapshot, SelectionTable,
};
use rand::Rng;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Item {
    kind: PowerupKind,
    position: f32,
    speed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Idle { delay: Duration },
    Traveling { item: Item },
    Collecting { item: Item, remaining: Duration },
    Missing { item: Item, remaining: Duration },
}

/// Computes the visibility of an item at `position`.
///
/// Opacity is `1.0` on a plateau around the hit zone whose half-width is
/// `(1 - edge_fade_fraction) * bar_half_width`, and falls linearly to `0.0`
/// at either bar edge.
#[must_use]
pub fn opacity_at(position: f32, bar_half_width: f32, edge_fade_fraction: f32) -> f32 {
    let distance = position.abs();
    let plateau = (1.0 - edge_fade_fraction.max(0.0).min(1.0)) * bar_half_width;
    if distance <= plateau {
        return 1.0;
    }
    if distance >= bar_half_width {
        return 0.0;
    }
    ((bar_half_width - distance) / (bar_half_width - plateau)).max(0.0).min(1.0)
}

/// Timing state machine for the catch minigame.
#[derive(Debug)]
pub struct PowerupCatch {
    config: PowerupConfig,
    phase: Phase,
    degraded_reported: bool,
}

impl PowerupCatch {
    /// Creates an idle minigame waiting for its first item.
    pub fn new<R: Rng + ?Sized>(config: &PowerupConfig, rng: &mut R) -> Self {
        let delay = match config.first_delay_secs {
            Some(first) => seconds(first),
            None => draw_delay(config, rng),
        };
        Self {
            config: config.clone(),
            phase: Phase::Idle { delay },
            degraded_reported: false,
        }
    }

    /// Advances the minigame by the time reported in `events`.
    ///
    /// At most one item is launched per call. Time left over after a phase
    /// ends carries into the next phase.
    pub fn handle<R: Rng + ?Sized>(&mut self, events: &[Event], rng: &mut R, out: &mut Vec<Event>) {
        let mut remaining = Duration::ZERO;
        let mut ticked = false;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                remaining = remaining.saturating_add(*dt);
                ticked = true;
            }
        }
        if !ticked {
            return;
        }

        let mut launched = false;
        loop {
            match self.phase {
                Phase::Idle { delay } => {
                    if launched || remaining < delay {
                        self.phase = Phase::Idle {
                            delay: delay.saturating_sub(remaining),
                        };
                        return;
                    }
                    remaining -= delay;
                    self.launch(rng, out);
                    launched = true;
                }
                Phase::Traveling { mut item } => {
                    let sign = self.config.direction.sign();
                    let to_edge = (self.config.bar_half_width - sign * item.position).max(0.0);
                    let travel = item.speed * remaining.as_secs_f32();
                    if travel < to_edge {
                        item.position += sign * travel;
                        self.phase = Phase::Traveling { item };
                        return;
                    }

                    remaining = remaining.saturating_sub(seconds(to_edge / item.speed));
                    debug!(kind = %item.kind, "powerup escaped");
                    out.push(Event::PowerupEscaped { kind: item.kind });
                    self.retire(rng, out);
                }
                Phase::Collecting {
                    item,
                    remaining: window,
                } => {
                    if remaining < window {
                        self.phase = Phase::Collecting {
                            item,
                            remaining: window - remaining,
                        };
                        return;
                    }
                    remaining -= window;
                    self.retire(rng, out);
                }
                Phase::Missing {
                    item,
                    remaining: window,
                } => {
                    if remaining < window {
                        self.phase = Phase::Missing {
                            item,
                            remaining: window - remaining,
                        };
                        return;
                    }
                    remaining -= window;
                    self.retire(rng, out);
                }
            }
        }
    }

    /// Resolves a catch attempt against the travelling item.
    ///
    /// A hit credits one unit of the item's consumable through `commands`.
    /// Attempts while no item is travelling are rejected without effect.
    pub fn attempt_catch(
        &mut self,
        commands: &mut Vec<Command>,
        out: &mut Vec<Event>,
    ) -> Result<CatchOutcome, ActionError> {
        let Phase::Traveling { item } = self.phase else {
            return Err(ActionError::NoActiveItem);
        };

        if item.position.abs() <= self.config.hit_zone_half_width {
            debug!(kind = %item.kind, position = item.position, "powerup caught");
            commands.push(Command::CreditInventory { kind: item.kind });
            out.push(Event::PowerupCaught { kind: item.kind });
            self.phase = Phase::Collecting {
                item,
                remaining: seconds(self.config.collect_window_secs),
            };
            Ok(CatchOutcome::Caught(item.kind))
        } else {
            debug!(kind = %item.kind, position = item.position, "powerup missed");
            out.push(Event::PowerupMissed { kind: item.kind });
            self.phase = Phase::Missing {
                item,
                remaining: seconds(self.config.miss_window_secs),
            };
            Ok(CatchOutcome::Missed)
        }
    }

    /// Snapshot of the current item, if one is on the bar.
    #[must_use]
    pub fn item(&self) -> Option<PowerupSnapshot> {
        let (item, phase) = match self.phase {
            Phase::Idle { .. } => return None,
            Phase::Traveling { item } => (item, PowerupPhase::Traveling),
            Phase::Collecting { item, .. } => (item, PowerupPhase::Collecting),
            Phase::Missing { item, .. } => (item, PowerupPhase::Missing),
        };
        Some(PowerupSnapshot {
            kind: item.kind,
            position: item.position,
            opacity: opacity_at(
                item.position,
                self.config.bar_half_width,
                self.config.edge_fade_fraction,
            ),
            phase,
        })
    }

    /// Time until the next item launches, when the bar is empty.
    #[must_use]
    pub fn time_until_launch(&self) -> Option<Duration> {
        match self.phase {
            Phase::Idle { delay } => Some(delay),
            _ => None,
        }
    }

    fn launch<R: Rng + ?Sized>(&mut self, rng: &mut R, out: &mut Vec<Event>) {
        let weights = PowerupKind::ALL.map(|kind| self.config.weights.get(kind));
        let kind = match pick_weighted(rng, &weights) {
            Some(pick) => {
                if pick.degraded && !self.degraded_reported {
                    warn!("powerup weights sum to zero; falling back to uniform selection");
                    self.degraded_reported = true;
                    out.push(Event::WeightsDegraded {
                        table: SelectionTable::Powerups,
                    });
                }
                PowerupKind::ALL[pick.index]
            }
            None => PowerupKind::Cool,
        };

        let speed = draw_between(rng, self.config.min_speed, self.config.max_speed);
        let start = -self.config.direction.sign() * self.config.bar_half_width;
        debug!(%kind, speed, "powerup launched");
        out.push(Event::PowerupSpawned { kind, speed });
        self.phase = Phase::Traveling {
            item: Item {
                kind,
                position: start,
                speed,
            },
        };
    }

    fn retire<R: Rng + ?Sized>(&mut self, rng: &mut R, out: &mut Vec<Event>) {
        out.push(Event::PowerupRetired);
        self.phase = Phase::Idle {
            delay: draw_delay(&self.config, rng),
        };
    }
}

fn draw_delay<R: Rng + ?Sized>(config: &PowerupConfig, rng: &mut R) -> Duration {
    seconds(draw_between(rng, config.min_delay_secs, config.max_delay_secs))
}

fn draw_between<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if min.is_finite() && max.is_finite() && max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_is_full_on_the_plateau() {
        assert_eq!(opacity_at(0.0, 420.0, 0.25), 1.0);
        assert_eq!(opacity_at(315.0, 420.0, 0.25), 1.0);
        assert_eq!(opacity_at(-315.0, 420.0, 0.25), 1.0);
    }

    #[test]
    fn opacity_fades_linearly_to_the_edges() {
        assert_eq!(opacity_at(420.0, 420.0, 0.25), 0.0);
        assert_eq!(opacity_at(-420.0, 420.0, 0.25), 0.0);
        assert!((opacity_at(367.5, 420.0, 0.25) - 0.5).abs() < 1e-5);
        assert!((opacity_at(-367.5, 420.0, 0.25) - 0.5).abs() < 1e-5);
        assert!(opacity_at(500.0, 420.0, 0.25) == 0.0);
    }

    #[test]
    fn opacity_without_fade_is_a_step() {
        assert_eq!(opacity_at(419.0, 420.0, 0.0), 1.0);
        assert_eq!(opacity_at(420.0, 420.0, 0.0), 1.0);
        assert_eq!(opacity_at(421.0, 420.0, 0.0), 0.0);
    }

    #[test]
    fn full_fade_peaks_only_at_the_centre() {
        assert_eq!(opacity_at(0.0, 420.0, 1.0), 1.0);
        assert!((opacity_at(210.0, 420.0, 1.0) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn non_finite_bounds_fall_back_to_the_lower_one() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(3);
        assert_eq!(draw_between(&mut rng, 300.0, f32::INFINITY), 300.0);
        assert!(draw_between(&mut rng, f32::NEG_INFINITY, 10.0).is_infinite());
        let drawn = draw_between(&mut rng, 4.0, 10.0);
        assert!((4.0..=10.0).contains(&drawn));
    }
}
