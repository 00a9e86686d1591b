//! ---
//! fmon_section: "15-testing-qa-runbook"
//! fmon_subsection: "integration-tests"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Integration tests for generator start/stop and listener fan-out."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use fmon_common::SimulationConfig;
use fmon_sim::{ListenerId, ManualClock, Scenario, ScriptedEntropy, TelemetryGenerator};

fn start_time() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-11-29T08:00:00+07:00").unwrap()
}

fn generator_with_interval(interval: Duration) -> TelemetryGenerator {
    let config = SimulationConfig {
        tick_interval: interval,
        ..SimulationConfig::default()
    };
    TelemetryGenerator::new(
        &config,
        Box::new(ScriptedEntropy::new([0.42, 0.17, 0.93, 0.5, 0.66])),
        Arc::new(ManualClock::new(start_time())),
    )
}

fn counting(generator: &TelemetryGenerator) -> (ListenerId, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let observed = count.clone();
    let id = generator.add_listener(move || {
        observed.fetch_add(1, Ordering::SeqCst);
    });
    (id, count)
}

#[tokio::test(start_paused = true)]
async fn double_start_runs_a_single_ticker() {
    let generator = generator_with_interval(Duration::from_secs(15));
    let (_, count) = counting(&generator);

    assert!(generator.start().unwrap());
    assert!(!generator.start().unwrap());
    tokio::time::sleep(Duration::from_secs(61)).await;

    assert_eq!(count.load(Ordering::SeqCst), 4);
    assert_eq!(generator.ticks_completed(), 4);
    generator.stop();
}

#[tokio::test(start_paused = true)]
async fn stop_silences_listeners() {
    let generator = generator_with_interval(Duration::from_secs(15));
    let (_, count) = counting(&generator);

    generator.start().unwrap();
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);

    assert!(generator.stop());
    assert!(!generator.stop());
    tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert!(!generator.is_running());
}

#[tokio::test(start_paused = true)]
async fn restart_after_stop_resumes_ticking() {
    let generator = generator_with_interval(Duration::from_secs(15));
    let (_, count) = counting(&generator);

    generator.start().unwrap();
    tokio::time::sleep(Duration::from_secs(16)).await;
    generator.stop();
    assert!(generator.start().unwrap());
    tokio::time::sleep(Duration::from_secs(14)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);
    generator.stop();
}

#[tokio::test(start_paused = true)]
async fn removed_listener_stops_receiving_ticks() {
    let generator = generator_with_interval(Duration::from_secs(15));
    let (first, a) = counting(&generator);
    let (_, b) = counting(&generator);

    generator.start().unwrap();
    tokio::time::sleep(Duration::from_secs(16)).await;
    assert_eq!((a.load(Ordering::SeqCst), b.load(Ordering::SeqCst)), (1, 1));

    assert!(generator.remove_listener(first));
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!((a.load(Ordering::SeqCst), b.load(Ordering::SeqCst)), (1, 2));
    generator.stop();
}

#[tokio::test(start_paused = true)]
async fn panicking_listener_does_not_stop_the_ticker() {
    let generator = generator_with_interval(Duration::from_secs(15));
    generator.add_listener(|| panic!("listener failure under test"));
    let (_, count) = counting(&generator);

    generator.start().unwrap();
    tokio::time::sleep(Duration::from_secs(46)).await;
    assert_eq!(count.load(Ordering::SeqCst), 3);
    assert!(generator.is_running());
    generator.stop();
}

#[tokio::test(start_paused = true)]
async fn scenarios_interleave_with_ticks() {
    let generator = generator_with_interval(Duration::from_secs(15));
    let (_, count) = counting(&generator);

    generator.start().unwrap();
    let report = generator.trigger_scenario(Scenario::Emergency);
    assert_eq!(report.fan_out.delivered, 1);
    tokio::time::sleep(Duration::from_secs(16)).await;
    generator.trigger_scenario_named("normal").unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 3);
    assert_eq!(generator.ticks_completed(), 1);
    generator.stop();
}

#[test]
fn start_requires_a_runtime() {
    let generator = generator_with_interval(Duration::from_secs(15));
    assert!(generator.start().is_err());
    assert!(!generator.is_running());
    assert!(!generator.stop());
}
