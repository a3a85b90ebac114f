//! Tunable parameters for a session.
//!
//! Every value the simulation reads lives in [`SessionConfig`]. Defaults
//! reproduce the shipped balance; hosts may load overrides from any serde
//! format. Durations are expressed as fractional seconds so configuration
//! files stay readable.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{EndStage, PowerupKind, ThreatCategory};

/// Largest accepted upper bound of a swarm burst.
pub const MAX_SWARM_BURST: u32 = 256;

/// Aggregated configuration for every subsystem of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seed of the shared random stream. Restarts derive fresh streams from it.
    pub seed: u64,
    /// Heat accumulation parameters.
    pub heat: HeatConfig,
    /// Spawn cadence and difficulty ramp.
    pub spawning: SpawnConfig,
    /// Per-category threat definitions.
    pub threats: ThreatCatalog,
    /// Consumable and close effects.
    pub effects: EffectConfig,
    /// Catch minigame parameters.
    pub powerups: PowerupConfig,
    /// Stage lengths of the end sequence.
    pub end_sequence: EndSequenceConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 0x0e7a_11ed_c0ff_ee00,
            heat: HeatConfig::default(),
            spawning: SpawnConfig::default(),
            threats: ThreatCatalog::default(),
            effects: EffectConfig::default(),
            powerups: PowerupConfig::default(),
            end_sequence: EndSequenceConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Checks numeric invariants that the simulation relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let heat = &self.heat;
        positive("heat.max", heat.max)?;
        non_negative("heat.base_rate", heat.base_rate)?;
        non_negative("heat.per_threat_rate", heat.per_threat_rate)?;
        unit_range("heat.intensity_threshold", heat.intensity_threshold)?;
        if !(0.0..=heat.max).contains(&heat.initial) {
            return Err(ConfigError::InitialHeatOutOfRange {
                initial: heat.initial,
                max: heat.max,
            });
        }

        let spawning = &self.spawning;
        positive("spawning.min_interval_secs", spawning.min_interval_secs)?;
        positive("spawning.base_interval_secs", spawning.base_interval_secs)?;
        non_negative("spawning.ramp_per_second", spawning.ramp_per_second)?;
        if spawning.swarm_burst_min >= spawning.swarm_burst_max {
            return Err(ConfigError::InvertedRange {
                field: "spawning.swarm_burst",
            });
        }
        if spawning.swarm_burst_max > MAX_SWARM_BURST {
            return Err(ConfigError::TooLarge {
                field: "spawning.swarm_burst_max",
                value: spawning.swarm_burst_max,
                limit: MAX_SWARM_BURST,
            });
        }

        for category in ThreatCategory::ALL {
            let kind = self.threats.get(category);
            if !kind.weight.is_finite() || kind.weight < 0.0 {
                return Err(ConfigError::Negative {
                    field: "threats.weight",
                    value: kind.weight,
                });
            }
            if let Some(expiry) = kind.expire_after_secs {
                positive("threats.expire_after_secs", expiry)?;
            }
        }

        let effects = &self.effects;
        non_negative("effects.close_cooling", effects.close_cooling)?;
        non_negative("effects.cool_amount", effects.cool_amount)?;
        non_negative("effects.freeze_secs", effects.freeze_secs)?;
        non_negative("effects.clear_bonus", effects.clear_bonus)?;

        let powerups = &self.powerups;
        for kind in PowerupKind::ALL {
            let weight = powerups.weights.get(kind);
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::Negative {
                    field: "powerups.weights",
                    value: weight,
                });
            }
        }
        if let Some(first) = powerups.first_delay_secs {
            non_negative("powerups.first_delay_secs", first)?;
        }
        non_negative("powerups.min_delay_secs", powerups.min_delay_secs)?;
        non_negative("powerups.max_delay_secs", powerups.max_delay_secs)?;
        if powerups.min_delay_secs > powerups.max_delay_secs {
            return Err(ConfigError::InvertedRange {
                field: "powerups.delay",
            });
        }
        positive("powerups.min_speed", powerups.min_speed)?;
        positive("powerups.max_speed", powerups.max_speed)?;
        if powerups.min_speed > powerups.max_speed {
            return Err(ConfigError::InvertedRange {
                field: "powerups.speed",
            });
        }
        positive("powerups.bar_half_width", powerups.bar_half_width)?;
        non_negative("powerups.hit_zone_half_width", powerups.hit_zone_half_width)?;
        unit_range("powerups.edge_fade_fraction", powerups.edge_fade_fraction)?;
        non_negative("powerups.collect_window_secs", powerups.collect_window_secs)?;
        non_negative("powerups.miss_window_secs", powerups.miss_window_secs)?;

        for stage in EndStage::ORDER {
            non_negative("end_sequence", self.end_sequence.seconds(stage))?;
        }

        Ok(())
    }
}

/// Heat accumulation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatConfig {
    /// Heat at session start.
    pub initial: f32,
    /// Heat at which the machine overheats.
    pub max: f32,
    /// Passive gain per second.
    pub base_rate: f32,
    /// Additional gain per second for every active threat.
    pub per_threat_rate: f32,
    /// Normalized heat at which presentation intensity starts to rise.
    pub intensity_threshold: f32,
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            initial: 30.0,
            max: 100.0,
            base_rate: 1.5,
            per_threat_rate: 0.15,
            intensity_threshold: 0.6,
        }
    }
}

/// Spawn cadence and difficulty ramp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Interval between spawns at zero difficulty time.
    pub base_interval_secs: f32,
    /// Lower bound of the interval regardless of difficulty.
    pub min_interval_secs: f32,
    /// Interval reduction per second of difficulty time.
    pub ramp_per_second: f32,
    /// Smallest burst released by a swarm (inclusive).
    pub swarm_burst_min: u32,
    /// Upper bound of a swarm burst (exclusive).
    pub swarm_burst_max: u32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            base_interval_secs: 1.2,
            min_interval_secs: 0.6,
            ramp_per_second: 0.004,
            swarm_burst_min: 5,
            swarm_burst_max: 16,
        }
    }
}

/// Definition of a single threat category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatKindConfig {
    /// Relative weight used by the spawn scheduler.
    pub weight: f32,
    /// Presentation variants; an empty pool excludes the category.
    pub variants: Vec<String>,
    /// Lifetime after which the threat leaves on its own.
    pub expire_after_secs: Option<f32>,
}

impl Default for ThreatKindConfig {
    fn default() -> Self {
        Self {
            weight: 1.0,
            variants: Vec::new(),
            expire_after_secs: None,
        }
    }
}

/// Threat definitions for every category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatCatalog {
    /// Benign threats.
    pub benign: ThreatKindConfig,
    /// Hazard threats.
    pub hazard: ThreatKindConfig,
    /// Swarm threats.
    pub swarm: ThreatKindConfig,
}

impl ThreatCatalog {
    /// Definition of the provided category.
    #[must_use]
    pub fn get(&self, category: ThreatCategory) -> &ThreatKindConfig {
        match category {
            ThreatCategory::Benign => &self.benign,
            ThreatCategory::Hazard => &self.hazard,
            ThreatCategory::Swarm => &self.swarm,
        }
    }

    /// Auto-expiry lifetime of the provided category, if any.
    #[must_use]
    pub fn lifetime(&self, category: ThreatCategory) -> Option<Duration> {
        self.get(category).expire_after_secs.map(seconds)
    }
}

impl Default for ThreatCatalog {
    fn default() -> Self {
        Self {
            benign: ThreatKindConfig {
                weight: 6.0,
                variants: names(&[
                    "prize_winner",
                    "hot_deals",
                    "download_more_ram",
                    "free_cruise",
                    "toolbar_offer",
                ]),
                expire_after_secs: None,
            },
            hazard: ThreatKindConfig {
                weight: 1.0,
                variants: names(&["malware_bomb"]),
                expire_after_secs: Some(6.0),
            },
            swarm: ThreatKindConfig {
                weight: 1.0,
                variants: names(&["cascade"]),
                expire_after_secs: Some(6.0),
            },
        }
    }
}

/// Heat effects of closing threats and spending consumables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Heat removed when a benign or swarm threat is closed.
    pub close_cooling: f32,
    /// Heat removed by [`PowerupKind::Cool`].
    pub cool_amount: f32,
    /// Freeze length granted by [`PowerupKind::Freeze`].
    pub freeze_secs: f32,
    /// Heat removed by [`PowerupKind::Clear`] in addition to clearing threats.
    pub clear_bonus: f32,
    /// Whether [`PowerupKind::Clear`] also restarts the difficulty ramp.
    pub clear_resets_difficulty: bool,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            close_cooling: 1.0,
            cool_amount: 18.0,
            freeze_secs: 6.0,
            clear_bonus: 0.0,
            clear_resets_difficulty: true,
        }
    }
}

impl EffectConfig {
    /// Freeze length as a duration.
    #[must_use]
    pub fn freeze_duration(&self) -> Duration {
        seconds(self.freeze_secs)
    }
}

/// Edge the catch item travels toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelDirection {
    /// Enters at the right edge and leaves at the left edge.
    RightToLeft,
    /// Enters at the left edge and leaves at the right edge.
    LeftToRight,
}

impl TravelDirection {
    /// Sign of the velocity along the bar.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::RightToLeft => -1.0,
            Self::LeftToRight => 1.0,
        }
    }
}

/// Relative weights of the consumables granted by the catch minigame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerupWeights {
    /// Weight of [`PowerupKind::Cool`].
    pub cool: f32,
    /// Weight of [`PowerupKind::Freeze`].
    pub freeze: f32,
    /// Weight of [`PowerupKind::Clear`].
    pub clear: f32,
}

impl PowerupWeights {
    /// Weight of the provided consumable.
    #[must_use]
    pub const fn get(&self, kind: PowerupKind) -> f32 {
        match kind {
            PowerupKind::Cool => self.cool,
            PowerupKind::Freeze => self.freeze,
            PowerupKind::Clear => self.clear,
        }
    }
}

impl Default for PowerupWeights {
    fn default() -> Self {
        Self {
            cool: 0.35,
            freeze: 0.5,
            clear: 0.15,
        }
    }
}

/// Catch minigame parameters. Positions are measured from the hit-zone centre.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerupConfig {
    /// Consumable weights for spawned items.
    pub weights: PowerupWeights,
    /// Delay before the first item; `None` draws it like every later delay.
    pub first_delay_secs: Option<f32>,
    /// Lower bound of the idle delay between items.
    pub min_delay_secs: f32,
    /// Upper bound of the idle delay between items.
    pub max_delay_secs: f32,
    /// Lower bound of the travel speed.
    pub min_speed: f32,
    /// Upper bound of the travel speed.
    pub max_speed: f32,
    /// Distance from the hit-zone centre to either bar edge.
    pub bar_half_width: f32,
    /// Half-width of the hit zone.
    pub hit_zone_half_width: f32,
    /// Fraction of the half-bar over which the item fades at each edge.
    pub edge_fade_fraction: f32,
    /// Direction of travel.
    pub direction: TravelDirection,
    /// Length of the terminal window after a successful catch.
    pub collect_window_secs: f32,
    /// Length of the terminal window after a failed catch.
    pub miss_window_secs: f32,
}

impl Default for PowerupConfig {
    fn default() -> Self {
        Self {
            weights: PowerupWeights::default(),
            first_delay_secs: Some(7.0),
            min_delay_secs: 4.0,
            max_delay_secs: 10.0,
            min_speed: 300.0,
            max_speed: 520.0,
            bar_half_width: 420.0,
            hit_zone_half_width: 40.0,
            edge_fade_fraction: 0.25,
            direction: TravelDirection::RightToLeft,
            collect_window_secs: 0.3,
            miss_window_secs: 0.3,
        }
    }
}

/// Length of every end sequence stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndSequenceConfig {
    /// [`EndStage::AmbientAudioStop`] length.
    pub audio_stop_secs: f32,
    /// [`EndStage::ShakeFlash`] length.
    pub shake_flash_secs: f32,
    /// [`EndStage::Blackout`] length.
    pub blackout_secs: f32,
    /// [`EndStage::Summary`] length.
    pub summary_secs: f32,
    /// [`EndStage::Freeze`] length.
    pub freeze_secs: f32,
}

impl EndSequenceConfig {
    /// Configured length of a stage in seconds.
    #[must_use]
    pub const fn seconds(&self, stage: EndStage) -> f32 {
        match stage {
            EndStage::AmbientAudioStop => self.audio_stop_secs,
            EndStage::ShakeFlash => self.shake_flash_secs,
            EndStage::Blackout => self.blackout_secs,
            EndStage::Summary => self.summary_secs,
            EndStage::Freeze => self.freeze_secs,
        }
    }

    /// Stage lengths in execution order.
    #[must_use]
    pub fn durations(&self) -> [Duration; 5] {
        EndStage::ORDER.map(|stage| seconds(self.seconds(stage)))
    }
}

impl Default for EndSequenceConfig {
    fn default() -> Self {
        Self {
            audio_stop_secs: 0.1,
            shake_flash_secs: 0.5,
            blackout_secs: 0.8,
            summary_secs: 0.6,
            freeze_secs: 0.2,
        }
    }
}

/// Configuration values rejected by [`SessionConfig::validate`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A value that must be strictly positive was not.
    #[error("{field} must be positive, got {value}")]
    NonPositive {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: f32,
    },
    /// A value that must not be negative was.
    #[error("{field} must not be negative, got {value}")]
    Negative {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: f32,
    },
    /// A value that must lie within `0.0..=1.0` did not.
    #[error("{field} must lie within 0..=1, got {value}")]
    OutOfUnitRange {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: f32,
    },
    /// A lower bound exceeds its upper bound.
    #[error("{field} range is inverted")]
    InvertedRange {
        /// Offending range.
        field: &'static str,
    },
    /// A count exceeds the largest value the simulation accepts.
    #[error("{field} must not exceed {limit}, got {value}")]
    TooLarge {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: u32,
        /// Largest accepted value.
        limit: u32,
    },
    /// The starting heat lies outside `0..=max`.
    #[error("initial heat {initial} lies outside 0..={max}")]
    InitialHeatOutOfRange {
        /// Configured starting heat.
        initial: f32,
        /// Configured maximum heat.
        max: f32,
    },
}

/// Converts fractional seconds into a duration, mapping invalid input to zero.
#[must_use]
pub fn seconds(value: f32) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::try_from_secs_f32(value).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn unit_range(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { field, value })
    }
}
