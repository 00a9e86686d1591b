//! ---
//! fmon_section: "01-core-functionality"
//! fmon_subsection: "binary"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Binary entrypoint for the FMON daemon."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use fmon_common::{init_tracing, AppConfig, SimulationConfig};
use fmon_logging::{log_system_event, LogContext, SystemEventOutcome};
use fmon_sim::{FactoryDataset, Scenario, TelemetryGenerator, ZoneStatus};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

const SERVICE_NAME: &str = "fmond";

#[derive(Debug, Parser)]
#[command(
    author,
    version = concat!("FMON ", env!("CARGO_PKG_VERSION")),
    about = "FMON factory telemetry daemon",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Override the random seed from configuration")]
    seed: Option<u64>,

    #[arg(long, help = "Override the tick interval in seconds")]
    tick_interval_secs: Option<u64>,

    #[arg(long, value_name = "NAME", help = "Scenario to trigger right after start")]
    scenario: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the telemetry generator until interrupted")]
    Run,
    #[command(about = "Print the baseline dataset as JSON and exit")]
    Snapshot,
}

/// One line of operator input read from stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OperatorCommand {
    Scenario(Scenario),
    Tick,
    Read(String),
    ReadAll,
    Snapshot,
    Quit,
}

impl OperatorCommand {
    /// `Ok(None)` for blank lines.
    fn parse(line: &str) -> Result<Option<Self>> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Ok(None);
        };
        let command = match verb {
            "tick" => OperatorCommand::Tick,
            "read" => {
                let id = parts
                    .next()
                    .ok_or_else(|| anyhow!("usage: read <notification-id>"))?;
                OperatorCommand::Read(id.to_owned())
            }
            "read-all" => OperatorCommand::ReadAll,
            "snapshot" => OperatorCommand::Snapshot,
            "quit" | "exit" => OperatorCommand::Quit,
            other => OperatorCommand::Scenario(Scenario::parse(other)?),
        };
        if parts.next().is_some() {
            return Err(anyhow!("unexpected arguments after '{verb}'"));
        }
        Ok(Some(command))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/fmon.toml"));
    candidates.push(PathBuf::from("configs/fmon.dev.toml"));

    let loaded = AppConfig::load_or_default(&candidates)?;
    let config = loaded.config;
    init_tracing(SERVICE_NAME, &config.logging)?;
    match &loaded.source {
        Some(path) => info!(config_path = %path.display(), "configuration loaded"),
        None => info!("no configuration file found; using built-in defaults"),
    }

    let simulation = apply_overrides(config.simulation, &cli)?;
    let generator = TelemetryGenerator::from_config(&simulation);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_daemon(generator, cli.scenario.as_deref()).await,
        Commands::Snapshot => {
            println!("{}", serde_json::to_string_pretty(&generator.snapshot())?);
            Ok(())
        }
    }
}

fn apply_overrides(mut simulation: SimulationConfig, cli: &Cli) -> Result<SimulationConfig> {
    if let Some(seed) = cli.seed {
        simulation.random_seed = Some(seed);
    }
    if let Some(secs) = cli.tick_interval_secs {
        simulation.tick_interval = Duration::from_secs(secs);
    }
    simulation.validate()?;
    Ok(simulation)
}

async fn run_daemon(generator: TelemetryGenerator, initial_scenario: Option<&str>) -> Result<()> {
    let observer = generator.clone();
    let listener = generator.add_listener(move || observer.inspect(log_summary));

    generator.start()?;
    if let Some(name) = initial_scenario {
        generator.trigger_scenario_named(name)?;
    }
    info!(
        interval_secs = generator.tick_interval().as_secs(),
        "daemon running; reading operator commands from stdin"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut console_open = true;
    loop {
        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("ctrl-c received; shutting down");
                break;
            }
            line = lines.next_line(), if console_open => {
                match line? {
                    Some(line) => match OperatorCommand::parse(&line) {
                        Ok(Some(command)) => {
                            if !execute(&generator, command)? {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(err) => warn!(input = %line.trim(), error = %err, "ignoring operator command"),
                    },
                    None => {
                        info!("stdin closed; waiting for ctrl-c");
                        console_open = false;
                    }
                }
            }
        }
    }

    generator.stop();
    generator.remove_listener(listener);
    log_system_event(
        Some(&LogContext::new().with_tick(generator.ticks_completed())),
        "daemon.shutdown",
        "fmond stopped",
        SystemEventOutcome::Success,
    );
    Ok(())
}

/// Returns `false` when the daemon should exit.
fn execute(generator: &TelemetryGenerator, command: OperatorCommand) -> Result<bool> {
    match command {
        OperatorCommand::Scenario(scenario) => {
            let report = generator.trigger_scenario(scenario);
            info!(
                scenario = %scenario,
                zones = ?report.affected_zones,
                listeners = report.fan_out.delivered,
                "scenario triggered"
            );
        }
        OperatorCommand::Tick => {
            let report = generator.tick();
            info!(tick = report.tick, "manual tick");
        }
        OperatorCommand::Read(id) => {
            if generator.mark_notification_read(&id) {
                info!(notification = %id, "notification marked read");
            } else {
                warn!(notification = %id, "unknown notification");
            }
        }
        OperatorCommand::ReadAll => {
            let changed = generator.mark_all_notifications_read();
            info!(changed, "all notifications marked read");
        }
        OperatorCommand::Snapshot => {
            println!("{}", serde_json::to_string_pretty(&generator.snapshot())?);
        }
        OperatorCommand::Quit => return Ok(false),
    }
    Ok(true)
}

fn log_summary(dataset: &FactoryDataset) {
    let stats = dataset.stats();
    let critical = dataset
        .zones()
        .iter()
        .filter(|zone| zone.status() == ZoneStatus::Critical)
        .count();
    info!(
        personnel = stats.total_personnel,
        active_zones = stats.active_zones,
        critical_zones = critical,
        efficiency = stats.system_efficiency,
        defects = stats.today_defects_detected,
        alerts = stats.alerts_today,
        energy_kw = dataset.energy().current_usage(),
        unread = dataset.unread_count(),
        "factory state updated"
    );
}
