//! ---
//! fmon_section: "03-logging"
//! fmon_subsection: "module"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Structured logging adapters and sinks."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Structured logging context shared by the generator and its binaries.

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

/// Initialize a baseline tracing subscriber suitable for development and tests.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer())
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Zone identifier associated with the log event.
    pub zone: Option<&'a str>,
    /// Scenario name when the event originates from a scenario trigger.
    pub scenario: Option<&'a str>,
    /// Tick sequence number.
    pub tick: Option<u64>,
    /// Listener handle when the event concerns a registered observer.
    pub listener: Option<u64>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a zone identifier.
    pub fn with_zone(mut self, zone: &'a str) -> Self {
        self.zone = Some(zone);
        self
    }

    /// Attach a scenario name.
    pub fn with_scenario(mut self, scenario: &'a str) -> Self {
        self.scenario = Some(scenario);
        self
    }

    /// Attach a tick value.
    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = Some(tick);
        self
    }

    /// Attach a listener handle.
    pub fn with_listener(mut self, listener: u64) -> Self {
        self.listener = Some(listener);
        self
    }
}

/// High-level outcome used when emitting lifecycle log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEventOutcome {
    /// The operation completed successfully.
    Success,
    /// The operation failed or was aborted.
    Fault,
}

impl SystemEventOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            SystemEventOutcome::Success => "success",
            SystemEventOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized system event with a success/fault outcome.
pub fn log_system_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: SystemEventOutcome,
) {
    let default = LogContext::default();
    let ctx = context.unwrap_or(&default);
    // `tracing::event!` needs a constant level, so branch per outcome.
    match outcome {
        SystemEventOutcome::Success => tracing::event!(
            Level::INFO,
            event,
            outcome = outcome.as_str(),
            zone = ctx.zone.unwrap_or(""),
            scenario = ctx.scenario.unwrap_or(""),
            tick = ctx.tick.unwrap_or_default(),
            listener = ctx.listener.unwrap_or_default(),
            message = %message
        ),
        SystemEventOutcome::Fault => tracing::event!(
            Level::ERROR,
            event,
            outcome = outcome.as_str(),
            zone = ctx.zone.unwrap_or(""),
            scenario = ctx.scenario.unwrap_or(""),
            tick = ctx.tick.unwrap_or_default(),
            listener = ctx.listener.unwrap_or_default(),
            message = %message
        ),
    }
}
