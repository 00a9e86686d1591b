//! ---
//! fmon_section: "11-simulation"
//! fmon_subsection: "energy"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Plant energy consumption model and rolling hourly window."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
use std::f64::consts::PI;

use chrono::{DateTime, FixedOffset, Timelike};
use fmon_common::{hour_label, Shift};
use serde::{Deserialize, Serialize};

use crate::window::RollingWindow;

/// Night load band is `[NIGHT_BASE, NIGHT_BASE + NIGHT_SPAN)`.
pub const NIGHT_BASE: f64 = 400.0;
pub const NIGHT_SPAN: f64 = 100.0;

/// Draw applied by the production peak scenario.
pub const PEAK_BOOST: f64 = 200.0;
pub const PEAK_CEILING: f64 = 1200.0;
/// Plant load the normal scenario resets to.
pub const NORMAL_USAGE: f64 = 750.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySample {
    /// Hour bucket label, e.g. `"14:00"`.
    pub hour: String,
    pub usage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyUsage {
    current_usage: f64,
    peak_usage: f64,
    average_usage: f64,
    hourly: RollingWindow<EnergySample>,
}

/// Typical load for `hour`. `night_unit` in `[0, 1)` positions the value in the
/// night band and is ignored outside it.
pub fn shift_baseline(hour: u32, night_unit: f64) -> f64 {
    match Shift::for_hour(hour) {
        Shift::Day => 750.0 + ((f64::from(hour) - 6.0) * PI / 12.0).sin() * 150.0,
        Shift::Evening => 600.0 + ((f64::from(hour) - 19.0) * PI / 5.0).sin() * 100.0,
        Shift::Night => NIGHT_BASE + night_unit * NIGHT_SPAN,
    }
}

impl EnergyUsage {
    pub fn new(capacity: usize) -> Self {
        Self {
            current_usage: 0.0,
            peak_usage: 0.0,
            average_usage: 0.0,
            hourly: RollingWindow::new(capacity),
        }
    }

    /// Window of `capacity` hourly buckets ending the hour before `now`, filled
    /// from the shift baseline with night hours at the band midpoint.
    pub fn baseline(now: DateTime<FixedOffset>, capacity: usize) -> Self {
        let mut usage = Self::new(capacity);
        let hours = usage.hourly.capacity() as u32;
        let current_hour = now.hour();
        for back in (1..=hours).rev() {
            let hour = (current_hour + 24 * (1 + back / 24) - back) % 24;
            let sample = EnergySample {
                hour: hour_label(hour),
                usage: shift_baseline(hour, 0.5),
            };
            usage.hourly.push(sample);
        }
        let latest = usage.hourly.latest().map(|s| s.usage).unwrap_or_default();
        usage.current_usage = latest;
        usage.peak_usage = usage
            .hourly
            .iter()
            .map(|s| s.usage)
            .fold(latest, f64::max);
        usage.recompute_average();
        usage
    }

    pub fn current_usage(&self) -> f64 {
        self.current_usage
    }

    pub fn peak_usage(&self) -> f64 {
        self.peak_usage
    }

    pub fn average_usage(&self) -> f64 {
        self.average_usage
    }

    /// Oldest-first hourly buckets.
    pub fn hourly(&self) -> &RollingWindow<EnergySample> {
        &self.hourly
    }

    /// Record a reading for the bucket labelled `hour`. The newest bucket is updated
    /// in place when it carries the same label, otherwise a bucket is appended.
    /// Returns the bucket evicted from the window, if any.
    pub(crate) fn record(&mut self, hour: String, usage: f64) -> Option<EnergySample> {
        self.set_current(usage);
        let evicted = match self.hourly.latest_mut() {
            Some(latest) if latest.hour == hour => {
                latest.usage = usage;
                None
            }
            _ => self.hourly.push(EnergySample { hour, usage }),
        };
        self.recompute_average();
        evicted
    }

    /// Raise current usage by `boost` up to `ceiling`; the hourly window is untouched.
    pub(crate) fn boost(&mut self, boost: f64, ceiling: f64) {
        self.set_current((self.current_usage + boost).min(ceiling));
    }

    /// Overwrite current usage; peak still never drops below it.
    pub(crate) fn set_current(&mut self, usage: f64) {
        self.current_usage = usage;
        self.peak_usage = self.peak_usage.max(usage);
    }

    fn recompute_average(&mut self) {
        let len = self.hourly.len();
        self.average_usage = if len == 0 {
            0.0
        } else {
            self.hourly.iter().map(|s| s.usage).sum::<f64>() / len as f64
        };
    }
}
