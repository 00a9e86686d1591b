//! ---
//! fmon_section: "11-simulation"
//! fmon_subsection: "generator"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Wall-clock abstraction used for timestamps and hour-of-day logic."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Local, Utc};
use parking_lot::Mutex;

/// Current local time. Hour-of-day decisions use the offset carried by the result.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Reads the system clock, in the host's local zone unless an offset is pinned.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    offset: Option<FixedOffset>,
}

impl SystemClock {
    pub fn local() -> Self {
        Self { offset: None }
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            offset: Some(offset),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.offset {
            Some(offset) => Utc::now().with_timezone(&offset),
            None => {
                let now = Local::now();
                now.with_timezone(now.offset())
            }
        }
    }
}

/// Test clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: std::time::Duration) {
        let step = ChronoDuration::from_std(by).unwrap_or(ChronoDuration::zero());
        let mut now = self.now.lock();
        *now += step;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn manual_clock_advances() {
        let start = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 11, 29, 10, 59, 50)
            .unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);
        clock.advance(std::time::Duration::from_secs(15));
        assert_eq!(clock.now().hour(), 11);
        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn pinned_offset_is_reported() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let clock = SystemClock::with_offset(offset);
        assert_eq!(*clock.now().offset(), offset);
    }
}
