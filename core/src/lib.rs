#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Overheat engine.
//!
//! This crate defines the message surface that connects the session
//! controller, the authoritative world, and pure systems. The session submits
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and presentation layers to react to. Systems consume event
//! streams, query immutable snapshots, and respond with new command batches.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod weighting;

pub use config::{
    ConfigError, EffectConfig, EndSequenceConfig, HeatConfig, PowerupConfig, PowerupWeights,
    SessionConfig, SpawnConfig, ThreatCatalog, ThreatKindConfig, TravelDirection,
    MAX_SWARM_BURST,
};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the session clock and retires threats whose deadline passed.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a threat of the provided category enters the registry.
    SpawnThreat {
        /// Category assigned to the new threat.
        category: ThreatCategory,
        /// Index into the category's presentation variant pool.
        variant: u32,
    },
    /// Requests that the player-facing close action resolves a threat.
    CloseThreat {
        /// Identifier of the threat being closed.
        threat: ThreatId,
    },
    /// Integrates passive heat for the provided slice of time.
    IntegrateHeat {
        /// Duration of simulated time to integrate.
        dt: Duration,
    },
    /// Adds a single unit of the provided consumable to the inventory.
    CreditInventory {
        /// Consumable being credited.
        kind: PowerupKind,
    },
    /// Spends a single unit of the provided consumable and applies its effect.
    ConsumeInventory {
        /// Consumable being spent.
        kind: PowerupKind,
    },
}

/// Events broadcast by the world and systems after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the session clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a threat entered the registry.
    ThreatSpawned {
        /// Identifier allocated to the threat.
        threat: ThreatId,
        /// Category of the new threat.
        category: ThreatCategory,
        /// Presentation variant chosen from the category pool.
        variant: u32,
        /// Session time at which the threat leaves on its own, if ever.
        expires_at: Option<Duration>,
    },
    /// Confirms that a threat left the registry.
    ThreatRemoved {
        /// Identifier of the removed threat.
        threat: ThreatId,
        /// Category of the removed threat.
        category: ThreatCategory,
        /// What caused the removal.
        cause: RemovalCause,
    },
    /// Reports that a close request referenced a threat that is not active.
    ThreatCloseRejected {
        /// Identifier provided in the request.
        threat: ThreatId,
    },
    /// Reports that the player closed a hazard threat.
    HazardTriggered {
        /// Identifier of the hazard that was closed.
        threat: ThreatId,
    },
    /// Reports that the player closed a swarm threat and a burst is owed.
    SwarmReleased {
        /// Identifier of the swarm that was closed.
        threat: ThreatId,
    },
    /// Announces the heat value after it changed.
    HeatChanged {
        /// Heat after clamping.
        heat: f32,
    },
    /// Announces that passive heat reached its maximum.
    Overheated,
    /// Announces that passive heat gain is suspended.
    HeatFrozen {
        /// Remaining freeze time after the effect was applied.
        remaining: Duration,
    },
    /// Announces that a freeze ran out and passive heat gain resumed.
    HeatThawed,
    /// Confirms that a consumable was added to the inventory.
    InventoryCredited {
        /// Consumable that was credited.
        kind: PowerupKind,
        /// Count held after crediting.
        count: u32,
    },
    /// Confirms that a consumable was spent and its effect applied.
    EffectApplied {
        /// Consumable whose effect was applied.
        kind: PowerupKind,
    },
    /// Reports that a consume request found no units to spend.
    ConsumeRejected {
        /// Consumable requested.
        kind: PowerupKind,
    },
    /// Announces that the spawn scheduler's difficulty ramp restarted.
    DifficultyReset,
    /// Reports that a threat category has no source pool and will never spawn.
    CategoryUnavailable {
        /// Category excluded from spawning.
        category: ThreatCategory,
    },
    /// Reports that a weighted draw fell back to uniform selection.
    WeightsDegraded {
        /// Which selection table degraded.
        table: SelectionTable,
    },
    /// Confirms that a catch item started travelling along the bar.
    PowerupSpawned {
        /// Consumable the item grants when caught.
        kind: PowerupKind,
        /// Travel speed in bar units per second.
        speed: f32,
    },
    /// Confirms that a catch attempt landed inside the hit zone.
    PowerupCaught {
        /// Consumable granted by the item.
        kind: PowerupKind,
    },
    /// Reports that a catch attempt landed outside the hit zone.
    PowerupMissed {
        /// Consumable the item would have granted.
        kind: PowerupKind,
    },
    /// Reports that an item crossed the far edge without a catch attempt.
    PowerupEscaped {
        /// Consumable the item would have granted.
        kind: PowerupKind,
    },
    /// Announces that the catch bar is empty again.
    PowerupRetired,
    /// Announces that the session stopped running and the end sequence began.
    SessionEnding {
        /// Condition that ended the session.
        reason: EndReason,
        /// Survived time at the moment the session ended.
        elapsed: Duration,
    },
    /// Announces that the persisted best time was overwritten.
    BestTimeRecorded {
        /// New best time.
        best: Duration,
    },
    /// Announces that the end sequence entered a stage.
    EndStageEntered {
        /// Stage that became active.
        stage: EndStage,
    },
    /// Announces that the summary should be shown to the player.
    SummaryRevealed {
        /// Survived time of the finished session.
        elapsed: Duration,
        /// Best time after the session was recorded.
        best: Duration,
    },
    /// Announces that the end sequence completed and only restart remains.
    SessionOver {
        /// Condition that ended the session.
        reason: EndReason,
        /// Survived time of the finished session.
        elapsed: Duration,
        /// Best time after the session was recorded.
        best: Duration,
    },
    /// Announces that a fresh session replaced the previous one.
    SessionRestarted {
        /// Zero-based index of the run that started.
        run: u32,
    },
}

/// Unique identifier assigned to a threat.
///
/// Identifiers carry the generation of the registry slot they were allocated
/// from, so an identifier never aliases a later threat that reuses the slot.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ThreatId {
    slot: u32,
    generation: u32,
}

impl ThreatId {
    /// Creates a new threat identifier from a slot index and generation.
    #[must_use]
    pub const fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    /// Registry slot that stores the threat.
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Generation of the slot at allocation time.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ThreatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.slot, self.generation)
    }
}

/// Categories of threats with fixed close semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatCategory {
    /// Closing cools the machine slightly.
    Benign,
    /// Closing ends the session.
    Hazard,
    /// Closing cools slightly and releases a burst of benign threats.
    Swarm,
}

impl ThreatCategory {
    /// Every category in declaration order.
    pub const ALL: [ThreatCategory; 3] = [Self::Benign, Self::Hazard, Self::Swarm];

    /// Lower-case name used in logs and configuration.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Benign => "benign",
            Self::Hazard => "hazard",
            Self::Swarm => "swarm",
        }
    }
}

impl fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Consumable effect categories held in the inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerupKind {
    /// Removes a fixed amount of heat.
    Cool,
    /// Suspends passive heat gain for a while.
    Freeze,
    /// Removes every active threat.
    Clear,
}

impl PowerupKind {
    /// Every consumable in declaration order.
    pub const ALL: [PowerupKind; 3] = [Self::Cool, Self::Freeze, Self::Clear];

    /// Lower-case name used in logs and configuration.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cool => "cool",
            Self::Freeze => "freeze",
            Self::Clear => "clear",
        }
    }
}

impl fmt::Display for PowerupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle of a single session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Simulation advances and accepts player actions.
    Running,
    /// The end sequence plays; no simulation input is accepted.
    Ending,
    /// Terminal until restarted.
    Over,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "running",
            Self::Ending => "ending",
            Self::Over => "over",
        };
        f.write_str(name)
    }
}

/// Condition that moved a session out of [`Lifecycle::Running`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndReason {
    /// The player closed a hazard threat.
    HazardClicked,
    /// Passive heat reached its maximum.
    Overheated,
}

impl EndReason {
    /// Short line suitable for the session summary.
    #[must_use]
    pub const fn headline(self) -> &'static str {
        match self {
            Self::HazardClicked => "you clicked a malware bomb!",
            Self::Overheated => "your machine overheated!",
        }
    }
}

/// Named stages of the end sequence in the order they run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EndStage {
    /// Ambient audio is told to stop.
    AmbientAudioStop,
    /// Screen shake and flash feedback window.
    ShakeFlash,
    /// Cross-fade toward a blackout.
    Blackout,
    /// The summary with elapsed and best time is revealed.
    Summary,
    /// Simulation ticking is frozen before the session is over.
    Freeze,
}

impl EndStage {
    /// Every stage in execution order.
    pub const ORDER: [EndStage; 5] = [
        Self::AmbientAudioStop,
        Self::ShakeFlash,
        Self::Blackout,
        Self::Summary,
        Self::Freeze,
    ];

    /// Position of the stage within [`EndStage::ORDER`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::AmbientAudioStop => 0,
            Self::ShakeFlash => 1,
            Self::Blackout => 2,
            Self::Summary => 3,
            Self::Freeze => 4,
        }
    }

    /// Stage that follows this one, if any.
    #[must_use]
    pub fn next(self) -> Option<EndStage> {
        Self::ORDER.get(self.index() + 1).copied()
    }
}

/// Reasons a threat may leave the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemovalCause {
    /// The player closed it.
    Closed,
    /// Its auto-expiry deadline passed.
    Expired,
    /// A clear effect removed it.
    Cleared,
}

/// Weighted selection tables that may degrade to uniform draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SelectionTable {
    /// Threat category weights used by the spawn scheduler.
    Threats,
    /// Consumable weights used by the catch minigame.
    Powerups,
}

/// Phase of the single catch item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PowerupPhase {
    /// Moving along the bar and awaiting a catch attempt.
    Traveling,
    /// Caught; playing a short terminal window.
    Collecting,
    /// Catch attempt failed; playing a short terminal window.
    Missing,
}

/// Immutable representation of a single threat used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThreatSnapshot {
    /// Identifier allocated to the threat.
    pub id: ThreatId,
    /// Category of the threat.
    pub category: ThreatCategory,
    /// Presentation variant chosen from the category pool.
    pub variant: u32,
    /// Session time at which the threat leaves on its own, if ever.
    pub expires_at: Option<Duration>,
}

/// Read-only snapshot describing all active threats.
#[derive(Clone, Debug, Default)]
pub struct ThreatView {
    snapshots: Vec<ThreatSnapshot>,
}

impl ThreatView {
    /// Creates a new threat view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ThreatSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ThreatSnapshot> {
        self.snapshots.iter()
    }

    /// Number of active threats captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no threats were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Number of captured threats in the provided category.
    #[must_use]
    pub fn count_of(&self, category: ThreatCategory) -> usize {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.category == category)
            .count()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ThreatSnapshot> {
        self.snapshots
    }
}

/// Counts of every consumable held by the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct InventoryCounts {
    /// Units of [`PowerupKind::Cool`].
    pub cool: u32,
    /// Units of [`PowerupKind::Freeze`].
    pub freeze: u32,
    /// Units of [`PowerupKind::Clear`].
    pub clear: u32,
}

impl InventoryCounts {
    /// Count held for the provided consumable.
    #[must_use]
    pub const fn get(&self, kind: PowerupKind) -> u32 {
        match kind {
            PowerupKind::Cool => self.cool,
            PowerupKind::Freeze => self.freeze,
            PowerupKind::Clear => self.clear,
        }
    }

    /// Sum of all counts.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.cool
            .saturating_add(self.freeze)
            .saturating_add(self.clear)
    }
}

/// Immutable representation of the catch item used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowerupSnapshot {
    /// Consumable the item grants.
    pub kind: PowerupKind,
    /// Horizontal position relative to the hit-zone centre.
    pub position: f32,
    /// Visibility derived from the position, in `0.0..=1.0`.
    pub opacity: f32,
    /// Current phase of the item.
    pub phase: PowerupPhase,
}

/// Successful results of closing a threat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseOutcome {
    /// A benign threat was removed and the machine cooled.
    Removed,
    /// A hazard was closed and the session is ending.
    HazardEnded,
    /// A swarm was closed and released a burst of benign threats.
    SwarmBurst {
        /// Number of threats released by the burst.
        spawned: u32,
    },
}

/// Decisive results of a catch attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatchOutcome {
    /// The item was inside the hit zone and its consumable was credited.
    Caught(PowerupKind),
    /// The item was outside the hit zone.
    Missed,
}

/// Reasons a player action may be rejected. Rejections never mutate state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The referenced threat is not in the registry.
    #[error("threat {0} is not active")]
    NotFound(ThreatId),
    /// No units of the requested consumable are held.
    #[error("no {0} units left in the inventory")]
    InsufficientInventory(PowerupKind),
    /// No catch item is awaiting a decision.
    #[error("no catch item is awaiting an attempt")]
    NoActiveItem,
    /// The session lifecycle does not accept the action.
    #[error("action is not accepted while the session is {0}")]
    SessionInactive(Lifecycle),
}

/// Formats a duration as a zero-padded `mm:ss` clock.
#[must_use]
pub fn format_clock(duration: Duration) -> String {
    let seconds = duration.as_secs();
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
