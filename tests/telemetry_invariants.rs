//! ---
//! fmon_section: "15-testing-qa-runbook"
//! fmon_subsection: "integration-tests"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Long seeded runs checking dataset invariants across ticks and scenarios."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use fmon_common::SimulationConfig;
use fmon_sim::{
    FactoryDataset, MachineState, ManualClock, NotificationKind, Priority, Scenario,
    ScriptedEntropy, SeededEntropy, TelemetryGenerator, ZoneStatus,
};

fn start_time() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-11-29T21:40:00+00:00").unwrap()
}

fn seeded(seed: u64) -> (TelemetryGenerator, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start_time()));
    let generator = TelemetryGenerator::new(
        &SimulationConfig::default(),
        Box::new(SeededEntropy::from_seed(seed)),
        clock.clone(),
    );
    (generator, clock)
}

fn assert_invariants(dataset: &FactoryDataset) {
    for zone in dataset.zones() {
        assert!(
            zone.current_personnel() <= zone.max_capacity() + 3,
            "{} holds {} of {}",
            zone.id,
            zone.current_personnel(),
            zone.max_capacity()
        );
        assert_eq!(
            zone.status(),
            ZoneStatus::from_occupancy(zone.current_personnel(), zone.max_capacity())
        );
        for id in zone.action_ids() {
            assert!(
                dataset.actions().iter().any(|action| &action.id == id),
                "zone {} references evicted action {}",
                zone.id,
                id
            );
        }
    }
    for machine in dataset.machines() {
        if machine.state == MachineState::Running {
            assert!((70.0..=100.0).contains(&machine.efficiency));
        }
    }
    assert_eq!(dataset.stats().total_personnel, dataset.total_personnel());
    assert!(dataset.actions().len() <= 50);
    assert!(dataset.notifications().len() <= 30);
    assert!(dataset.energy().hourly().len() <= 24);
    assert!(dataset.energy().peak_usage() >= dataset.energy().current_usage());

    let actions: Vec<_> = dataset.actions().iter().map(|a| a.timestamp).collect();
    assert!(actions.windows(2).all(|pair| pair[0] >= pair[1]));
    let notifications: Vec<_> = dataset.notifications().iter().map(|n| n.timestamp).collect();
    assert!(notifications.windows(2).all(|pair| pair[0] >= pair[1]));

    let hourly: Vec<_> = dataset.energy().hourly().iter().collect();
    let mean = hourly.iter().map(|s| s.usage).sum::<f64>() / hourly.len() as f64;
    assert!((dataset.energy().average_usage() - mean).abs() < 1e-6);
}

#[test]
fn seeded_runs_preserve_invariants() {
    for seed in [1_u64, 42, 2024] {
        let (generator, clock) = seeded(seed);
        for tick in 1..=3_000_u64 {
            clock.advance(generator.tick_interval());
            generator.tick();
            if tick % 97 == 0 {
                let scenario = Scenario::ALL[(tick / 97) as usize % Scenario::ALL.len()];
                generator.trigger_scenario(scenario);
            }
            if tick % 400 == 0 {
                generator.mark_all_notifications_read();
            }
            generator.inspect(assert_invariants);
        }
        assert_eq!(generator.ticks_completed(), 3_000);
    }
}

#[test]
fn energy_window_rolls_hour_by_hour() {
    let (generator, clock) = seeded(5);
    let mut previous_oldest = generator.inspect(|d| d.energy().hourly().oldest().unwrap().hour.clone());
    for _ in 0..30 {
        clock.advance(Duration::from_secs(3600));
        generator.tick();
        let (len, oldest, latest) = generator.inspect(|d| {
            let hourly = d.energy().hourly();
            (
                hourly.len(),
                hourly.oldest().unwrap().hour.clone(),
                hourly.latest().unwrap().hour.clone(),
            )
        });
        assert_eq!(len, 24);
        assert_ne!(oldest, previous_oldest);
        let now = generator.snapshot().taken_at.format("%H:00").to_string();
        assert_eq!(latest, now);
        previous_oldest = oldest;
    }
}

#[test]
fn fixed_entropy_tick_keeps_derived_totals() {
    let clock = Arc::new(ManualClock::new(start_time()));
    let generator = TelemetryGenerator::new(
        &SimulationConfig::default(),
        Box::new(ScriptedEntropy::constant(0.5)),
        clock,
    );
    for _ in 0..10 {
        generator.tick();
        generator.inspect(|dataset| {
            assert_eq!(dataset.stats().total_personnel, dataset.total_personnel());
            assert_eq!(
                dataset.stats().alerts_today as usize,
                dataset.unread_alert_count()
            );
        });
    }
}

#[test]
fn normal_after_emergency_is_idempotent() {
    let (generator, _) = seeded(11);
    generator.trigger_scenario(Scenario::Emergency);
    let first = generator.trigger_scenario(Scenario::Normal);
    let after_first = generator.snapshot().dataset;
    let second = generator.trigger_scenario(Scenario::Normal);
    let after_second = generator.snapshot().dataset;

    assert_eq!(first.affected_zones, second.affected_zones);
    assert_eq!(after_first.stats(), after_second.stats());
    assert_eq!(after_first.zones(), after_second.zones());
    for zone in after_second.zones() {
        assert_eq!(zone.status(), ZoneStatus::Normal);
        assert_eq!(
            zone.current_personnel(),
            (f64::from(zone.max_capacity()) * 0.8).floor() as u32
        );
    }
    assert_eq!(after_second.stats().system_efficiency, 92.0);
    assert_eq!(after_second.energy().current_usage(), 750.0);
}

#[test]
fn every_emergency_raises_a_critical_zone_and_alert() {
    let (generator, _) = seeded(99);
    for _ in 0..25 {
        let report = generator.trigger_scenario(Scenario::Emergency);
        generator.inspect(|dataset| {
            let zone = dataset.zone(&report.affected_zones[0]).unwrap();
            assert_eq!(zone.status(), ZoneStatus::Critical);
            let newest = dataset.notifications().newest().unwrap();
            assert_eq!(newest.kind, NotificationKind::Error);
            assert_eq!(newest.priority, Priority::High);
            assert!(!newest.read);
            assert_invariants(dataset);
        });
        generator.trigger_scenario(Scenario::Normal);
    }
}

#[test]
fn snapshots_serialize_with_snake_case_enums() {
    let (generator, _) = seeded(3);
    generator.trigger_scenario(Scenario::ProductionPeak);
    let value = serde_json::to_value(generator.snapshot()).unwrap();
    let zones = value["dataset"]["zones"].as_array().unwrap();
    assert_eq!(zones.len(), 5);
    assert_eq!(value["dataset"]["notifications"]["entries"][0]["kind"], "success");
    assert_eq!(value["dataset"]["machines"][3]["state"], "maintenance");
}
