#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-order end-of-session sequence.
//!
//! Stages run in [`EndStage::ORDER`], each for its configured length. Time
//! left over when a stage ends carries into the next one, so the total length
//! of the sequence does not depend on the tick cadence. Zero-length stages are
//! still entered.

use std::time::Duration;

use overheat_core::{EndSequenceConfig, EndStage, Event};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Dormant,
    Playing { stage: EndStage, elapsed: Duration },
    Complete,
}

/// Stage counters for the end sequence.
#[derive(Clone, Debug)]
pub struct EndSequence {
    durations: [Duration; 5],
    state: State,
}

impl EndSequence {
    /// Creates a dormant sequence using the configured stage lengths.
    #[must_use]
    pub fn new(config: &EndSequenceConfig) -> Self {
        Self {
            durations: config.durations(),
            state: State::Dormant,
        }
    }

    /// Enters the first stage. Has no effect once the sequence has begun.
    pub fn begin(&mut self, out: &mut Vec<Event>) {
        if self.state != State::Dormant {
            return;
        }
        let stage = EndStage::ORDER[0];
        self.state = State::Playing {
            stage,
            elapsed: Duration::ZERO,
        };
        debug!(?stage, "end stage entered");
        out.push(Event::EndStageEntered { stage });
    }

    /// Advances the active stage by `dt`, entering later stages as earlier ones
    /// run out. Returns `true` once the final stage has completed.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<Event>) -> bool {
        let State::Playing { mut stage, elapsed } = self.state else {
            return self.state == State::Complete;
        };

        let mut elapsed = elapsed.saturating_add(dt);
        loop {
            let length = self.length(stage);
            if elapsed < length {
                self.state = State::Playing { stage, elapsed };
                return false;
            }
            elapsed -= length;

            match stage.next() {
                Some(next) => {
                    stage = next;
                    debug!(?stage, "end stage entered");
                    out.push(Event::EndStageEntered { stage });
                }
                None => {
                    self.state = State::Complete;
                    return true;
                }
            }
        }
    }

    /// Stage currently playing.
    #[must_use]
    pub fn stage(&self) -> Option<EndStage> {
        match self.state {
            State::Playing { stage, .. } => Some(stage),
            State::Dormant | State::Complete => None,
        }
    }

    /// Fraction of the current stage that has elapsed, in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        match self.state {
            State::Dormant => 0.0,
            State::Complete => 1.0,
            State::Playing { stage, elapsed } => {
                let length = self.length(stage);
                if length.is_zero() {
                    1.0
                } else {
                    (elapsed.as_secs_f32() / length.as_secs_f32()).min(1.0)
                }
            }
        }
    }

    /// Whether the sequence has begun.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state != State::Dormant
    }

    /// Whether every stage has completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == State::Complete
    }

    fn length(&self, stage: EndStage) -> Duration {
        self.durations[stage.index()]
    }
}
