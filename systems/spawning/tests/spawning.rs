use std::time::Duration;

use overheat_core::{
    Command, Event, SelectionTable, SessionConfig, SpawnConfig, ThreatCatalog, ThreatCategory,
};
use overheat_system_spawning::Spawning;
use overheat_world::{self as world, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn tick(dt: Duration) -> [Event; 1] {
    [Event::TimeAdvanced { dt }]
}

fn spawned_category(command: &Command) -> ThreatCategory {
    match command {
        Command::SpawnThreat { category, .. } => *category,
        other => panic!("unexpected command emitted: {other:?}"),
    }
}

fn draw_categories(catalog: &ThreatCatalog, draws: usize, seed: u64) -> Vec<ThreatCategory> {
    let mut spawning = Spawning::new(&SpawnConfig::default(), catalog);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut commands = Vec::new();
    for _ in 0..draws {
        spawning.handle(&tick(Duration::from_secs(2)), &mut rng, &mut commands);
    }
    assert_eq!(commands.len(), draws, "every long tick schedules one spawn");
    commands.iter().map(spawned_category).collect()
}

#[test]
fn interval_is_non_increasing_and_floored() {
    let spawning = Spawning::new(&SpawnConfig::default(), &ThreatCatalog::default());
    let floor = spawning.interval_at(Duration::from_secs(3_600));

    let mut previous = spawning.interval_at(Duration::ZERO);
    for millis in (0..400_000u64).step_by(250) {
        let interval = spawning.interval_at(Duration::from_millis(millis));
        assert!(interval <= previous, "interval grew at {millis}ms");
        assert!(interval >= floor, "interval fell below the floor at {millis}ms");
        previous = interval;
    }
    assert_eq!(previous, floor);
}

#[test]
fn category_proportions_follow_weights() {
    let draws = 8_000;
    let categories = draw_categories(&ThreatCatalog::default(), draws, 0x5eed);

    let share = |category: ThreatCategory| {
        categories.iter().filter(|drawn| **drawn == category).count() as f64 / draws as f64
    };

    assert!((share(ThreatCategory::Benign) - 0.75).abs() < 0.03);
    assert!((share(ThreatCategory::Hazard) - 0.125).abs() < 0.02);
    assert!((share(ThreatCategory::Swarm) - 0.125).abs() < 0.02);
}

#[test]
fn zero_weight_category_is_never_selected() {
    let mut catalog = ThreatCatalog::default();
    catalog.hazard.weight = 0.0;

    let categories = draw_categories(&catalog, 3_000, 42);
    assert!(!categories.contains(&ThreatCategory::Hazard));
    assert!(categories.contains(&ThreatCategory::Swarm));
}

#[test]
fn category_without_variants_is_excluded_and_reported_once() {
    let mut catalog = ThreatCatalog::default();
    catalog.swarm.variants.clear();

    let mut spawning = Spawning::new(&SpawnConfig::default(), &catalog);
    let mut notices = Vec::new();
    spawning.drain_notices(&mut notices);
    assert_eq!(
        notices,
        vec![Event::CategoryUnavailable {
            category: ThreatCategory::Swarm
        }]
    );

    notices.clear();
    spawning.drain_notices(&mut notices);
    assert!(notices.is_empty(), "exclusion is reported only once");

    let categories = draw_categories(&catalog, 2_000, 9);
    assert!(!categories.contains(&ThreatCategory::Swarm));
}

#[test]
fn all_zero_weights_degrade_to_uniform_and_report_once() {
    let mut catalog = ThreatCatalog::default();
    catalog.benign.weight = 0.0;
    catalog.hazard.weight = 0.0;
    catalog.swarm.weight = 0.0;

    let mut spawning = Spawning::new(&SpawnConfig::default(), &catalog);
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let mut commands = Vec::new();
    for _ in 0..600 {
        spawning.handle(&tick(Duration::from_secs(2)), &mut rng, &mut commands);
    }

    for category in ThreatCategory::ALL {
        assert!(commands
            .iter()
            .any(|command| spawned_category(command) == category));
    }

    let mut notices = Vec::new();
    spawning.drain_notices(&mut notices);
    assert_eq!(
        notices,
        vec![Event::WeightsDegraded {
            table: SelectionTable::Threats
        }]
    );
}

#[test]
fn no_categories_means_no_spawns() {
    let mut catalog = ThreatCatalog::default();
    catalog.benign.variants.clear();
    catalog.hazard.variants.clear();
    catalog.swarm.variants.clear();

    let mut spawning = Spawning::new(&SpawnConfig::default(), &catalog);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut commands = Vec::new();
    spawning.handle(&tick(Duration::from_secs(5)), &mut rng, &mut commands);
    let burst = spawning.spawn_multiple(8, ThreatCategory::Benign, &mut rng, &mut commands);

    assert_eq!(burst, 0);
    assert!(commands.is_empty());
}

#[test]
fn difficulty_reset_restarts_both_clocks() {
    let mut spawning = Spawning::new(&SpawnConfig::default(), &ThreatCatalog::default());
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut commands = Vec::new();

    for _ in 0..60 {
        spawning.handle(&tick(Duration::from_secs(1)), &mut rng, &mut commands);
    }
    assert_eq!(spawning.difficulty_time(), Duration::from_secs(60));
    assert!(spawning.current_interval() < spawning.interval_at(Duration::ZERO));

    spawning.handle(&[Event::DifficultyReset], &mut rng, &mut commands);

    assert_eq!(spawning.difficulty_time(), Duration::ZERO);
    assert_eq!(spawning.spawn_timer(), Duration::ZERO);
    assert_eq!(
        spawning.current_interval(),
        spawning.interval_at(Duration::ZERO)
    );
}

#[test]
fn spawn_multiple_adds_exactly_the_requested_benign_threats() {
    let config = SessionConfig::default();
    let mut world = World::new(&config);
    let mut events = Vec::new();

    for category in [ThreatCategory::Hazard, ThreatCategory::Swarm] {
        world::apply(
            &mut world,
            Command::SpawnThreat {
                category,
                variant: 0,
            },
            &mut events,
        );
    }
    let before = query::threat_view(&world).into_vec();

    let mut spawning = Spawning::new(&config.spawning, &config.threats);
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut commands = Vec::new();
    let spawned = spawning.spawn_multiple(10, ThreatCategory::Benign, &mut rng, &mut commands);
    assert_eq!(spawned, 10);

    for command in commands {
        world::apply(&mut world, command, &mut events);
    }

    let view = query::threat_view(&world);
    assert_eq!(view.len(), 12);
    assert_eq!(view.count_of(ThreatCategory::Benign), 10);
    for threat in before {
        assert_eq!(query::threat(&world, threat.id), Some(threat));
    }
}

#[test]
fn spawn_multiple_for_unavailable_category_uses_available_one() {
    let mut catalog = ThreatCatalog::default();
    catalog.benign.variants.clear();
    catalog.hazard.weight = 0.0;

    let mut spawning = Spawning::new(&SpawnConfig::default(), &catalog);
    let mut rng = ChaCha8Rng::seed_from_u64(23);
    let mut commands = Vec::new();
    let spawned = spawning.spawn_multiple(6, ThreatCategory::Benign, &mut rng, &mut commands);

    assert_eq!(spawned, 6);
    assert!(commands
        .iter()
        .all(|command| spawned_category(command) == ThreatCategory::Swarm));
}

#[test]
fn fallback_burst_draws_a_category_per_unit() {
    let mut catalog = ThreatCatalog::default();
    catalog.benign.variants.clear();
    catalog.hazard.weight = 1.0;
    catalog.swarm.weight = 1.0;

    let mut mixed = 0;
    for seed in 0..20 {
        let mut spawning = Spawning::new(&SpawnConfig::default(), &catalog);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut commands = Vec::new();
        let spawned =
            spawning.spawn_multiple(12, ThreatCategory::Benign, &mut rng, &mut commands);
        assert_eq!(spawned, 12);
        assert_eq!(commands.len(), 12);

        let hazards = commands
            .iter()
            .filter(|command| spawned_category(command) == ThreatCategory::Hazard)
            .count();
        if hazards > 0 && hazards < commands.len() {
            mixed += 1;
        }
    }

    assert!(mixed >= 15, "only {mixed} of 20 bursts mixed categories");
}

#[test]
fn identical_seeds_replay_identically() {
    let run = |seed| draw_categories(&ThreatCatalog::default(), 500, seed);
    assert_eq!(run(77), run(77));
}
