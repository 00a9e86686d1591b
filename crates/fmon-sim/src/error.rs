//! ---
//! fmon_section: "11-simulation"
//! fmon_subsection: "errors"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Error types surfaced by the telemetry generator."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
use fmon_rt::RtError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("unknown scenario '{0}' (expected emergency, maintenance, production_peak or normal)")]
    InvalidScenario(String),
    #[error("tick scheduler unavailable: {0}")]
    Scheduler(#[from] RtError),
}
