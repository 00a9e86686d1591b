//! ---
//! fmon_section: "11-simulation"
//! fmon_subsection: "01-bootstrap"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Simulation module exports and shared types."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
//! Simulated factory telemetry for the FMON dashboard.
//!
//! [`TelemetryGenerator`] owns the factory dataset, mutates it on a fixed tick,
//! applies operator scenarios and notifies registered listeners after each change.

pub mod clock;
pub mod cycle;
pub mod dataset;
pub mod energy;
pub mod entropy;
pub mod error;
pub mod generator;
pub mod listeners;
pub mod model;
pub mod scenario;
pub mod templates;
pub mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use cycle::CycleOutcome;
pub use dataset::FactoryDataset;
pub use energy::{EnergySample, EnergyUsage};
pub use entropy::{Entropy, ScriptedEntropy, SeededEntropy};
pub use error::SimError;
pub use generator::{FactorySnapshot, ScenarioReport, TelemetryGenerator, TickReport};
pub use listeners::{FanOut, Listener, ListenerFailure, ListenerId};
pub use model::{
    Action, ActionKind, AggregateStats, Machine, MachineState, MachineTransition, NewNotification,
    Notification, NotificationKind, Priority, Zone, ZoneStatus,
};
pub use scenario::Scenario;
pub use window::{RollingLog, RollingWindow};
