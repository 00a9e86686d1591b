//! ---
//! fmon_section: "11-simulation"
//! fmon_subsection: "model"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Factory entities owned by the telemetry generator."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Occupancy status of a zone, always derived from personnel and capacity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ZoneStatus {
    Normal,
    Warning,
    Critical,
}

impl ZoneStatus {
    /// Above 100% utilisation is critical, above 90% is a warning.
    pub fn from_occupancy(current: u32, capacity: u32) -> Self {
        if capacity == 0 {
            return if current > 0 {
                ZoneStatus::Critical
            } else {
                ZoneStatus::Normal
            };
        }
        let utilization = f64::from(current) / f64::from(capacity);
        if utilization > 1.0 {
            ZoneStatus::Critical
        } else if utilization > 0.9 {
            ZoneStatus::Warning
        } else {
            ZoneStatus::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub department: String,
    current_personnel: u32,
    max_capacity: u32,
    status: ZoneStatus,
    /// Newest-first ids of logged actions concerning this zone.
    action_ids: Vec<String>,
}

impl Zone {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        department: impl Into<String>,
        current_personnel: u32,
        max_capacity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            department: department.into(),
            current_personnel,
            max_capacity,
            status: ZoneStatus::from_occupancy(current_personnel, max_capacity),
            action_ids: Vec::new(),
        }
    }

    pub fn current_personnel(&self) -> u32 {
        self.current_personnel
    }

    pub fn max_capacity(&self) -> u32 {
        self.max_capacity
    }

    pub fn status(&self) -> ZoneStatus {
        self.status
    }

    pub fn action_ids(&self) -> &[String] {
        &self.action_ids
    }

    pub fn utilization(&self) -> f64 {
        if self.max_capacity == 0 {
            return 0.0;
        }
        f64::from(self.current_personnel) / f64::from(self.max_capacity)
    }

    /// Upper personnel bound for this zone given the allowed overflow.
    pub fn personnel_ceiling(&self, overflow: u32) -> u32 {
        self.max_capacity.saturating_add(overflow)
    }

    /// Set personnel clamped to `[0, max_capacity + overflow]` and recompute status.
    pub(crate) fn set_personnel(&mut self, personnel: i64, overflow: u32) {
        let ceiling = i64::from(self.personnel_ceiling(overflow));
        self.current_personnel = personnel.clamp(0, ceiling) as u32;
        self.status = ZoneStatus::from_occupancy(self.current_personnel, self.max_capacity);
    }

    pub(crate) fn link_action(&mut self, action_id: &str) {
        self.action_ids.insert(0, action_id.to_owned());
    }

    pub(crate) fn unlink_actions(&mut self, evicted: &[String]) {
        if evicted.is_empty() {
            return;
        }
        self.action_ids.retain(|id| !evicted.contains(id));
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    Entry,
    Exit,
    TaskStart,
    TaskComplete,
    Alert,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Entry,
        ActionKind::Exit,
        ActionKind::TaskStart,
        ActionKind::TaskComplete,
        ActionKind::Alert,
    ];
}

/// Event log entry describing personnel or system activity in a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub kind: ActionKind,
    pub person_id: String,
    pub person_name: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub zone_id: String,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
    Success,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 4] = [
        NotificationKind::Info,
        NotificationKind::Warning,
        NotificationKind::Error,
        NotificationKind::Success,
    ];

    /// Warning and error notifications count towards the dashboard alert total.
    pub fn is_alert(&self) -> bool {
        matches!(self, NotificationKind::Warning | NotificationKind::Error)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    pub priority: Priority,
}

impl Notification {
    pub fn is_unread_alert(&self) -> bool {
        !self.read && self.kind.is_alert()
    }
}

/// Caller-supplied content for a notification; id and timestamp are assigned on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub priority: Priority,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MachineState {
    Running,
    Idle,
    Maintenance,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
    pub name: String,
    pub state: MachineState,
    /// Percentage in `[0, 100]`.
    pub efficiency: f64,
    pub last_maintenance: NaiveDate,
    pub next_maintenance: NaiveDate,
}

/// A machine state change observed during a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineTransition {
    pub machine_id: String,
    pub from: MachineState,
    pub to: MachineState,
    pub efficiency: f64,
}

/// Dashboard totals. `total_personnel`, `active_zones`, and `alerts_today` are derived
/// from zone and notification state; the rest move only on ticks and scenario resets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_personnel: u32,
    pub active_zones: u32,
    pub today_defects_detected: u32,
    pub system_efficiency: f64,
    pub alerts_today: u32,
}
