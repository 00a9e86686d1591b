//! ---
//! fmon_section: "11-simulation"
//! fmon_subsection: "01-bootstrap"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Offline telemetry generator producing deterministic tick streams."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, Local};
use clap::{Parser, ValueEnum};
use fmon_common::{AppConfig, SimulationConfig};
use fmon_sim::{
    FactorySnapshot, MachineState, ManualClock, Scenario, SeededEntropy, TelemetryGenerator,
    ZoneStatus,
};
use serde::Serialize;

const DEFAULT_SEED: u64 = 0x5EED_F00D;
/// Upper bound on records reserved up front; longer runs grow on demand.
const MAX_PREALLOCATED_TICKS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

/// A scenario to trigger once the given tick has completed. Tick 0 applies
/// before the first tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledScenario {
    after_tick: u64,
    scenario: Scenario,
}

fn parse_scheduled_scenario(raw: &str) -> Result<ScheduledScenario, String> {
    let (tick, name) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected TICK:NAME, got '{raw}'"))?;
    let after_tick = tick
        .trim()
        .parse::<u64>()
        .map_err(|err| format!("invalid tick '{tick}': {err}"))?;
    let scenario = Scenario::parse(name).map_err(|err| err.to_string())?;
    Ok(ScheduledScenario {
        after_tick,
        scenario,
    })
}

fn parse_start(raw: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(raw).map_err(|err| format!("invalid RFC 3339 time '{raw}': {err}"))
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Run the FMON telemetry generator offline and export its tick stream",
    long_about = None
)]
struct Cli {
    /// Number of ticks to simulate
    #[arg(long, default_value_t = 20)]
    ticks: u64,

    /// Random seed for the generator
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated wall-clock start (RFC 3339). Defaults to the current local time.
    #[arg(long, value_parser = parse_start)]
    start: Option<DateTime<FixedOffset>>,

    /// Simulated seconds between ticks
    #[arg(long)]
    tick_interval_secs: Option<u64>,

    /// Trigger a scenario after a tick, as TICK:NAME. May be repeated.
    #[arg(long = "scenario", value_name = "TICK:NAME", value_parser = parse_scheduled_scenario)]
    scenarios: Vec<ScheduledScenario>,

    /// Configuration file supplying simulation tuning
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file path. Use '-' for stdout.
    #[arg(long, default_value = "-")]
    output: PathBuf,

    /// Explicit output format when extension is ambiguous
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

/// One exported tick.
#[derive(Debug, Clone, Serialize)]
struct TickRecord {
    scenarios: Vec<Scenario>,
    snapshot: FactorySnapshot,
}

/// Flat per-tick summary written in CSV mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct SummaryRow {
    tick: u64,
    timestamp: String,
    scenarios: String,
    total_personnel: u32,
    active_zones: u32,
    critical_zones: usize,
    system_efficiency: f64,
    defects_detected: u32,
    alerts_today: u32,
    unread_notifications: usize,
    energy_current: f64,
    energy_peak: f64,
    energy_average: f64,
    machines_running: usize,
    actions_logged: usize,
    notifications_logged: usize,
}

impl From<&TickRecord> for SummaryRow {
    fn from(record: &TickRecord) -> Self {
        let dataset = &record.snapshot.dataset;
        let stats = dataset.stats();
        SummaryRow {
            tick: record.snapshot.tick,
            timestamp: record.snapshot.taken_at.to_rfc3339(),
            scenarios: record
                .scenarios
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join("|"),
            total_personnel: stats.total_personnel,
            active_zones: stats.active_zones,
            critical_zones: dataset
                .zones()
                .iter()
                .filter(|zone| zone.status() == ZoneStatus::Critical)
                .count(),
            system_efficiency: stats.system_efficiency,
            defects_detected: stats.today_defects_detected,
            alerts_today: stats.alerts_today,
            unread_notifications: dataset.unread_count(),
            energy_current: dataset.energy().current_usage(),
            energy_peak: dataset.energy().peak_usage(),
            energy_average: dataset.energy().average_usage(),
            machines_running: dataset
                .machines()
                .iter()
                .filter(|machine| machine.state == MachineState::Running)
                .count(),
            actions_logged: dataset.actions().len(),
            notifications_logged: dataset.notifications().len(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = determine_format(&cli.output, cli.format)?;
    let records = simulate(&cli)?;

    match format {
        OutputFormat::Csv => write_csv(&cli.output, &records)?,
        OutputFormat::Json => write_json(&cli.output, &records)?,
    }

    if cli.output.as_os_str() != "-" {
        eprintln!(
            "generated {} ticks -> {}",
            records.len().saturating_sub(1),
            cli.output.display()
        );
    }
    Ok(())
}

fn determine_format(path: &Path, override_format: Option<OutputFormat>) -> Result<OutputFormat> {
    if let Some(format) = override_format {
        return Ok(format);
    }
    if path.as_os_str() == "-" {
        return Ok(OutputFormat::Json);
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("csv") => Ok(OutputFormat::Csv),
        _ => Ok(OutputFormat::Json),
    }
}

fn simulation_config(cli: &Cli) -> Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(&[path])?.simulation,
        None => SimulationConfig::default(),
    };
    if let Some(secs) = cli.tick_interval_secs {
        if secs == 0 {
            return Err(anyhow!("tick-interval-secs must be greater than zero"));
        }
        config.tick_interval = Duration::from_secs(secs);
    }
    Ok(config)
}

/// Run the generator against a manual clock. The first record is the initial
/// state (tick 0); each further record follows one tick.
fn simulate(cli: &Cli) -> Result<Vec<TickRecord>> {
    let config = simulation_config(cli)?;
    let start = cli.start.unwrap_or_else(|| {
        let now = Local::now();
        now.with_timezone(now.offset())
    });
    let clock = Arc::new(ManualClock::new(start));
    let seed = cli.seed.or(config.random_seed).unwrap_or(DEFAULT_SEED);
    let generator = TelemetryGenerator::new(
        &config,
        Box::new(SeededEntropy::from_seed(seed)),
        clock.clone(),
    );

    let mut records = Vec::with_capacity(record_capacity(cli.ticks));
    records.push(TickRecord {
        scenarios: apply_scheduled(&generator, &cli.scenarios, 0)?,
        snapshot: generator.snapshot(),
    });
    for tick in 1..=cli.ticks {
        clock.advance(config.tick_interval);
        generator.tick();
        records.push(TickRecord {
            scenarios: apply_scheduled(&generator, &cli.scenarios, tick)?,
            snapshot: generator.snapshot(),
        });
    }
    Ok(records)
}

fn record_capacity(ticks: u64) -> usize {
    ticks.min(MAX_PREALLOCATED_TICKS) as usize + 1
}

fn apply_scheduled(
    generator: &TelemetryGenerator,
    scheduled: &[ScheduledScenario],
    tick: u64,
) -> Result<Vec<Scenario>> {
    let mut applied = Vec::new();
    for entry in scheduled.iter().filter(|entry| entry.after_tick == tick) {
        let report = generator.trigger_scenario(entry.scenario);
        if !report.fan_out.is_clean() {
            return Err(anyhow!("scenario {} listener failure", entry.scenario));
        }
        applied.push(entry.scenario);
    }
    Ok(applied)
}

fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    if path.as_os_str() == "-" {
        Ok(Box::new(io::stdout()))
    } else {
        Ok(Box::new(File::create(path).with_context(|| {
            format!("failed to create output file {}", path.display())
        })?))
    }
}

fn write_csv(path: &Path, records: &[TickRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(open_output(path)?);
    for record in records {
        writer.serialize(SummaryRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(path: &Path, records: &[TickRecord]) -> Result<()> {
    let mut writer = open_output(path)?;
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
