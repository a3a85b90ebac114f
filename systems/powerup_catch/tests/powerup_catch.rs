use std::time::Duration;

use overheat_core::{
    ActionError, CatchOutcome, Command, Event, PowerupConfig, PowerupKind, PowerupPhase,
    PowerupWeights, SelectionTable, TravelDirection,
};
use overheat_system_powerup_catch::PowerupCatch;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn steady_config() -> PowerupConfig {
    PowerupConfig {
        first_delay_secs: Some(0.0),
        min_delay_secs: 5.0,
        max_delay_secs: 5.0,
        min_speed: 100.0,
        max_speed: 100.0,
        ..PowerupConfig::default()
    }
}

fn advance(game: &mut PowerupCatch, rng: &mut ChaCha8Rng, dt: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    game.handle(&[Event::TimeAdvanced { dt }], rng, &mut events);
    events
}

#[test]
fn catch_outcome_is_decided_by_the_hit_zone() {
    let config = steady_config();
    let mut caught = 0;
    let mut missed = 0;

    for step in 0..84u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(step);
        let mut game = PowerupCatch::new(&config, &mut rng);
        let _ = advance(&mut game, &mut rng, Duration::ZERO);
        let _ = advance(&mut game, &mut rng, Duration::from_millis(step * 100));

        let item = game.item().expect("item should still be travelling");
        assert_eq!(item.phase, PowerupPhase::Traveling);

        let mut commands = Vec::new();
        let mut events = Vec::new();
        let outcome = game
            .attempt_catch(&mut commands, &mut events)
            .expect("travelling item accepts an attempt");

        if item.position.abs() <= config.hit_zone_half_width {
            assert_eq!(outcome, CatchOutcome::Caught(item.kind));
            assert_eq!(commands, vec![Command::CreditInventory { kind: item.kind }]);
            caught += 1;
        } else {
            assert_eq!(outcome, CatchOutcome::Missed);
            assert!(commands.is_empty());
            missed += 1;
        }
    }

    assert!(caught > 0, "some attempts should land in the hit zone");
    assert!(missed > 0, "some attempts should land outside the hit zone");
}

#[test]
fn only_one_decision_is_accepted_per_item() {
    let config = steady_config();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut game = PowerupCatch::new(&config, &mut rng);
    let _ = advance(&mut game, &mut rng, Duration::from_millis(4_200));

    let mut commands = Vec::new();
    let mut events = Vec::new();
    let first = game.attempt_catch(&mut commands, &mut events);
    assert!(matches!(first, Ok(CatchOutcome::Caught(_))));
    assert_eq!(
        game.item().map(|item| item.phase),
        Some(PowerupPhase::Collecting)
    );

    let second = game.attempt_catch(&mut commands, &mut events);
    assert_eq!(second, Err(ActionError::NoActiveItem));
    assert_eq!(commands.len(), 1);
}

#[test]
fn terminal_window_returns_to_idle() {
    let config = steady_config();
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut game = PowerupCatch::new(&config, &mut rng);
    let _ = advance(&mut game, &mut rng, Duration::from_secs(1));

    let mut commands = Vec::new();
    let mut events = Vec::new();
    assert_eq!(
        game.attempt_catch(&mut commands, &mut events),
        Ok(CatchOutcome::Missed)
    );

    let events = advance(&mut game, &mut rng, Duration::from_secs(1));
    assert_eq!(events, vec![Event::PowerupRetired]);
    assert!(game.item().is_none());
    assert!(game.time_until_launch().is_some());
}

#[test]
fn untouched_item_escapes_without_effect() {
    let config = steady_config();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut game = PowerupCatch::new(&config, &mut rng);
    let launched = advance(&mut game, &mut rng, Duration::ZERO);
    let kind = match launched.as_slice() {
        [Event::PowerupSpawned { kind, .. }] => *kind,
        other => panic!("unexpected events: {other:?}"),
    };

    let events = advance(&mut game, &mut rng, Duration::from_secs(9));
    assert_eq!(
        events,
        vec![Event::PowerupEscaped { kind }, Event::PowerupRetired]
    );
    assert!(game.item().is_none());

    let mut commands = Vec::new();
    let mut events = Vec::new();
    assert_eq!(
        game.attempt_catch(&mut commands, &mut events),
        Err(ActionError::NoActiveItem)
    );
    assert!(commands.is_empty());
}

#[test]
fn first_item_waits_for_the_first_delay() {
    let config = PowerupConfig {
        first_delay_secs: Some(7.0),
        ..steady_config()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut game = PowerupCatch::new(&config, &mut rng);

    let events = advance(&mut game, &mut rng, Duration::from_millis(6_900));
    assert!(events.is_empty());
    assert!(game.item().is_none());

    let events = advance(&mut game, &mut rng, Duration::from_millis(200));
    assert!(matches!(events.as_slice(), [Event::PowerupSpawned { .. }]));
    let item = game.item().expect("item launched");
    assert!((item.position - 410.0).abs() < 1e-3);
}

#[test]
fn items_enter_from_the_configured_edge() {
    let config = PowerupConfig {
        direction: TravelDirection::LeftToRight,
        ..steady_config()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut game = PowerupCatch::new(&config, &mut rng);
    let _ = advance(&mut game, &mut rng, Duration::ZERO);

    let item = game.item().expect("item launched");
    assert_eq!(item.position, -config.bar_half_width);
    assert_eq!(item.opacity, 0.0);

    let _ = advance(&mut game, &mut rng, Duration::from_secs(1));
    let item = game.item().expect("item travelling");
    assert!((item.position + 320.0).abs() < 1e-3);
}

#[test]
fn never_more_than_one_item_on_the_bar() {
    let config = PowerupConfig {
        first_delay_secs: None,
        min_delay_secs: 0.0,
        max_delay_secs: 0.5,
        min_speed: 2_000.0,
        max_speed: 5_000.0,
        ..PowerupConfig::default()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let mut game = PowerupCatch::new(&config, &mut rng);

    let mut on_bar = 0i32;
    for step in 0..2_000u64 {
        let dt = Duration::from_millis(step % 7 * 40);
        for event in advance(&mut game, &mut rng, dt) {
            match event {
                Event::PowerupSpawned { .. } => on_bar += 1,
                Event::PowerupRetired => on_bar -= 1,
                _ => {}
            }
            assert!((0..=1).contains(&on_bar), "item count {on_bar} at step {step}");
        }
        assert_eq!(game.item().is_some(), on_bar == 1);
    }
}

#[test]
fn zero_weights_fall_back_to_uniform_kinds() {
    let config = PowerupConfig {
        weights: PowerupWeights {
            cool: 0.0,
            freeze: 0.0,
            clear: 0.0,
        },
        min_delay_secs: 0.0,
        max_delay_secs: 0.0,
        ..steady_config()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut game = PowerupCatch::new(&config, &mut rng);

    let mut kinds = Vec::new();
    let mut degraded = 0;
    for _ in 0..300 {
        for event in advance(&mut game, &mut rng, Duration::from_secs(9)) {
            match event {
                Event::PowerupSpawned { kind, .. } => kinds.push(kind),
                Event::WeightsDegraded {
                    table: SelectionTable::Powerups,
                } => degraded += 1,
                _ => {}
            }
        }
    }

    assert_eq!(degraded, 1);
    for kind in PowerupKind::ALL {
        assert!(kinds.contains(&kind), "{kind} never launched");
    }
}

#[test]
fn single_weight_always_wins() {
    let config = PowerupConfig {
        weights: PowerupWeights {
            cool: 0.0,
            freeze: 1.0,
            clear: 0.0,
        },
        ..steady_config()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let mut game = PowerupCatch::new(&config, &mut rng);

    for _ in 0..100 {
        for event in advance(&mut game, &mut rng, Duration::from_secs(3)) {
            if let Event::PowerupSpawned { kind, .. } = event {
                assert_eq!(kind, PowerupKind::Freeze);
            }
        }
    }
}
