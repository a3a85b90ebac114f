use std::time::Duration;

use overheat_core::{Event, Lifecycle, PowerupKind, SessionConfig, ThreatCategory};
use overheat_session::{MemoryBestTimeStore, SessionController};

#[derive(Debug, PartialEq)]
struct Replay {
    events: Vec<Event>,
    elapsed: Duration,
    heat: f32,
    restarts: u32,
}

/// Plays two full runs with a fixed reflex script and records everything.
///
/// The script closes benign threats for the first minute of each run and then
/// lets the machine overheat.
fn replay(seed: u64) -> Replay {
    let config = SessionConfig {
        seed,
        ..SessionConfig::default()
    };
    let mut session = SessionController::new(config, MemoryBestTimeStore::default())
        .expect("default configuration is valid");
    let mut events = Vec::new();
    let mut restarts = 0;

    for step in 0..6_000u32 {
        match session.lifecycle() {
            Lifecycle::Running => {
                if step % 3 == 0 && session.elapsed_time() < Duration::from_secs(60) {
                    let oldest_benign = session
                        .active_threats()
                        .iter()
                        .find(|threat| threat.category == ThreatCategory::Benign)
                        .map(|threat| threat.id);
                    if let Some(threat) = oldest_benign {
                        let _ = session.request_close_threat(threat);
                    }
                }
                if let Some(item) = session.active_powerup_item() {
                    if item.position.abs() < 25.0 {
                        let _ = session.request_catch_attempt();
                    }
                }
                if session.heat_normalized() > 0.8 {
                    let _ = session.request_consume(PowerupKind::Cool);
                }
            }
            Lifecycle::Ending => {}
            Lifecycle::Over => {
                if restarts == 1 {
                    break;
                }
                session.request_restart().expect("restart accepted once over");
                restarts += 1;
            }
        }

        session.advance(Duration::from_millis(50));
        events.extend(session.drain_events());
    }

    Replay {
        events,
        elapsed: session.elapsed_time(),
        heat: session.heat(),
        restarts,
    }
}

#[test]
fn identical_seeds_replay_identically() {
    let first = replay(0x0bad_cafe);
    let second = replay(0x0bad_cafe);

    assert!(!first.events.is_empty());
    assert_eq!(first, second);
}

#[test]
fn different_seeds_diverge() {
    let first = replay(1);
    let second = replay(2);

    assert_ne!(first.events, second.events);
}

#[test]
fn scripted_play_reaches_over_and_restarts() {
    let outcome = replay(42);

    assert_eq!(outcome.restarts, 1);
    assert!(outcome
        .events
        .iter()
        .any(|event| matches!(event, Event::SessionRestarted { run: 1 })));
    let overs = outcome
        .events
        .iter()
        .filter(|event| matches!(event, Event::SessionOver { .. }))
        .count();
    assert_eq!(overs, 2);
}
