//! ---
//! fmon_section: "01-core-functionality"
//! fmon_subsection: "module"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Shared primitives and utilities for the simulator runtime."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

/// Factory shift covering a given hour of the site-local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    /// 06:00 through 18:59.
    Day,
    /// 19:00 through 23:59.
    Evening,
    /// 00:00 through 05:59, used for maintenance windows.
    Night,
}

impl Shift {
    pub fn for_hour(hour: u32) -> Self {
        match hour {
            6..=18 => Shift::Day,
            19..=23 => Shift::Evening,
            _ => Shift::Night,
        }
    }
}

/// Render an hour bucket label such as `"07:00"`.
pub fn hour_label(hour: u32) -> String {
    format!("{:02}:00", hour % 24)
}

/// Convert a configured offset in minutes into a [`FixedOffset`].
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_boundaries() {
        assert_eq!(Shift::for_hour(5), Shift::Night);
        assert_eq!(Shift::for_hour(6), Shift::Day);
        assert_eq!(Shift::for_hour(18), Shift::Day);
        assert_eq!(Shift::for_hour(19), Shift::Evening);
        assert_eq!(Shift::for_hour(23), Shift::Evening);
        assert_eq!(Shift::for_hour(0), Shift::Night);
    }

    #[test]
    fn hour_labels_are_zero_padded() {
        assert_eq!(hour_label(7), "07:00");
        assert_eq!(hour_label(23), "23:00");
        assert_eq!(hour_label(24), "00:00");
    }

    #[test]
    fn offsets_convert_minutes() {
        assert_eq!(offset_from_minutes(420).unwrap().local_minus_utc(), 25_200);
        assert!(offset_from_minutes(i32::MAX).is_none());
    }
}
