//! Heat integration, clamping, and freeze handling.

use std::time::Duration;

use overheat_core::HeatConfig;

/// Outcome of integrating passive heat for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeatTick {
    /// A freeze suppressed passive gain and is still running.
    Frozen,
    /// A freeze ran out during this tick; heat was not integrated.
    Thawed,
    /// Passive gain was integrated.
    Warmed {
        /// Whether the clamped heat sits at its maximum.
        overheated: bool,
    },
}

/// Integrates and clamps the heat resource.
///
/// Heat always lies within `0..=max`. A freeze suppresses passive gain only;
/// explicit deltas apply regardless.
#[derive(Clone, Debug)]
pub struct HeatEngine {
    heat: f32,
    max: f32,
    base_rate: f32,
    per_threat_rate: f32,
    frozen: bool,
    freeze_remaining: Duration,
}

impl HeatEngine {
    /// Creates an engine at the configured starting heat.
    #[must_use]
    pub fn new(config: &HeatConfig) -> Self {
        let max = if config.max.is_finite() && config.max > 0.0 {
            config.max
        } else {
            HeatConfig::default().max
        };
        let mut engine = Self {
            heat: 0.0,
            max,
            base_rate: config.base_rate,
            per_threat_rate: config.per_threat_rate,
            frozen: false,
            freeze_remaining: Duration::ZERO,
        };
        engine.heat = engine.clamp(config.initial);
        engine
    }

    /// Advances passive heat by `dt` with `active_threats` contributing.
    pub fn tick(&mut self, dt: Duration, active_threats: usize) -> HeatTick {
        if self.frozen {
            self.freeze_remaining = self.freeze_remaining.saturating_sub(dt);
            if self.freeze_remaining.is_zero() {
                self.frozen = false;
                return HeatTick::Thawed;
            }
            return HeatTick::Frozen;
        }

        let rate = self.base_rate + active_threats as f32 * self.per_threat_rate;
        self.heat = self.clamp(self.heat + rate * dt.as_secs_f32());
        HeatTick::Warmed {
            overheated: self.heat >= self.max,
        }
    }

    /// Adjusts heat by `amount` and clamps, returning the new heat.
    pub fn apply_delta(&mut self, amount: f32) -> f32 {
        self.heat = self.clamp(self.heat + amount);
        self.heat
    }

    /// Suspends passive gain for at least `duration`.
    ///
    /// The remaining freeze becomes the longer of the current remainder and
    /// `duration`; freezes never stack. Returns the resulting remainder.
    pub fn apply_freeze(&mut self, duration: Duration) -> Duration {
        self.frozen = true;
        self.freeze_remaining = self.freeze_remaining.max(duration);
        if self.freeze_remaining.is_zero() {
            self.frozen = false;
        }
        self.freeze_remaining
    }

    /// Current heat.
    #[must_use]
    pub const fn heat(&self) -> f32 {
        self.heat
    }

    /// Heat at which the machine overheats.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Heat scaled into `0.0..=1.0`.
    #[must_use]
    pub fn normalized(&self) -> f32 {
        (self.heat / self.max).clamp(0.0, 1.0)
    }

    /// Whether passive gain is suspended.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Freeze time left.
    #[must_use]
    pub const fn freeze_remaining(&self) -> Duration {
        self.freeze_remaining
    }

    fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return 0.0;
        }
        value.max(0.0).min(self.max)
    }
}
