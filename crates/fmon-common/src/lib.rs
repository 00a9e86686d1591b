//! ---
//! fmon_section: "01-core-functionality"
//! fmon_subsection: "module"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Shared primitives and utilities for the simulator runtime."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
//! Core shared primitives for the FMON workspace.
//! This crate exposes configuration loading, tracing initialisation, and the
//! shift/hour helpers consumed by the generator and its binaries.

pub mod config;
pub mod logging;
pub mod time;

pub use config::{AppConfig, LoadedAppConfig, LoggingConfig, SimulationConfig, TuningConfig};
pub use logging::{init_tracing, LogFormat};
pub use time::{hour_label, offset_from_minutes, Shift};
