//! ---
//! fmon_section: "01-core-functionality"
//! fmon_subsection: "module"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Runtime helpers supporting the telemetry generator."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
//! Periodic scheduling helpers for the FMON runtime.

pub mod scheduling;

pub use scheduling::{PeriodicTask, RateLimiter, RtError};
