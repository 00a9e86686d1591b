//! ---
//! fmon_section: "11-simulation"
//! fmon_subsection: "dataset"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "In-memory factory dataset owned by the telemetry generator."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, NaiveDate, Utc};
use fmon_common::TuningConfig;
use serde::Serialize;
use uuid::Uuid;

use crate::energy::EnergyUsage;
use crate::model::{
    Action, ActionKind, AggregateStats, Machine, MachineState, NewNotification, Notification,
    NotificationKind, Priority, Zone,
};
use crate::window::RollingLog;

/// Every entity the dashboard reads. Only the generator mutates it.
#[derive(Debug, Clone, Serialize)]
pub struct FactoryDataset {
    zones: Vec<Zone>,
    actions: RollingLog<Action>,
    notifications: RollingLog<Notification>,
    machines: Vec<Machine>,
    energy: EnergyUsage,
    stats: AggregateStats,
}

pub(crate) fn action_id() -> String {
    format!("action-{}", Uuid::new_v4().simple())
}

pub(crate) fn notification_id() -> String {
    format!("notif-{}", Uuid::new_v4().simple())
}

impl FactoryDataset {
    /// Seed dataset used at generator start-up. Relative timestamps and maintenance
    /// dates are anchored to `now`.
    pub fn baseline(now: DateTime<FixedOffset>, tuning: &TuningConfig) -> Self {
        let instant = now.with_timezone(&Utc);
        let minutes_ago = |m: i64| instant - ChronoDuration::minutes(m);
        let today = now.date_naive();
        let days = |d: i64| today + ChronoDuration::days(d);

        let zones = vec![
            Zone::new("zone-1", "Assembly Line A", "Production", 24, 30),
            Zone::new("zone-2", "Quality Control", "QC", 8, 10),
            Zone::new("zone-3", "Packaging", "Production", 15, 12),
            Zone::new("zone-4", "Warehouse", "Logistics", 18, 25),
            Zone::new("zone-5", "Maintenance", "Engineering", 6, 8),
        ];

        let seed_actions = [
            (
                "action-1",
                ActionKind::Entry,
                "emp-001",
                "John Smith",
                5,
                "Entered Assembly Line A",
                "zone-1",
            ),
            (
                "action-2",
                ActionKind::TaskComplete,
                "emp-002",
                "Sarah Johnson",
                15,
                "Completed quality inspection batch #QC-2024-1129-001",
                "zone-2",
            ),
            (
                "action-3",
                ActionKind::Alert,
                "emp-003",
                "Mike Wilson",
                25,
                "Zone capacity exceeded - immediate action required",
                "zone-3",
            ),
            (
                "action-4",
                ActionKind::Exit,
                "emp-004",
                "Lisa Chen",
                35,
                "Exited Warehouse for break",
                "zone-4",
            ),
        ];

        let seed_notifications = [
            (
                "notif-1",
                NotificationKind::Warning,
                "Zone Capacity Alert",
                "Packaging zone is operating over capacity (15/12)",
                10,
                false,
                Priority::High,
            ),
            (
                "notif-2",
                NotificationKind::Info,
                "Shift Change Reminder",
                "Next shift change in 30 minutes",
                20,
                false,
                Priority::Medium,
            ),
            (
                "notif-3",
                NotificationKind::Success,
                "Quality Target Achieved",
                "Daily quality target of 95% achieved",
                45,
                true,
                Priority::Low,
            ),
            (
                "notif-4",
                NotificationKind::Error,
                "Equipment Alert",
                "Machine #A-001 requires maintenance attention",
                60,
                false,
                Priority::High,
            ),
        ];

        let machine = |id: &str,
                       name: &str,
                       state: MachineState,
                       efficiency: f64,
                       last: NaiveDate,
                       next: NaiveDate| Machine {
            id: id.to_owned(),
            name: name.to_owned(),
            state,
            efficiency,
            last_maintenance: last,
            next_maintenance: next,
        };
        let machines = vec![
            machine("CNC-001", "CNC Machine A1", MachineState::Running, 94.5, days(-12), days(18)),
            machine("CNC-002", "CNC Machine A2", MachineState::Running, 88.3, days(-20), days(10)),
            machine("ROB-001", "Welding Robot R1", MachineState::Running, 91.7, days(-7), days(23)),
            machine("PRS-001", "Hydraulic Press P1", MachineState::Maintenance, 0.0, days(0), days(30)),
            machine("CNV-001", "Conveyor Line C1", MachineState::Warning, 78.4, days(-28), days(2)),
            machine("PKG-001", "Packaging Unit K1", MachineState::Idle, 0.0, days(-15), days(15)),
        ];

        let mut dataset = Self {
            zones,
            actions: RollingLog::new(tuning.action_log_capacity),
            notifications: RollingLog::from_newest_first(
                tuning.notification_log_capacity,
                seed_notifications.into_iter().map(
                    |(id, kind, title, message, age, read, priority)| Notification {
                        id: id.to_owned(),
                        kind,
                        title: title.to_owned(),
                        message: message.to_owned(),
                        timestamp: minutes_ago(age),
                        read,
                        priority,
                    },
                ),
            ),
            machines,
            energy: EnergyUsage::baseline(now, tuning.energy_window_capacity),
            stats: AggregateStats {
                total_personnel: 0,
                active_zones: 0,
                today_defects_detected: 23,
                system_efficiency: 94.2,
                alerts_today: 0,
            },
        };

        // Oldest first so the log ends up newest-first with zone links in step.
        for (id, kind, person_id, person_name, age, description, zone_id) in
            seed_actions.into_iter().rev()
        {
            dataset.record_action(Action {
                id: id.to_owned(),
                kind,
                person_id: person_id.to_owned(),
                person_name: person_name.to_owned(),
                timestamp: minutes_ago(age),
                description: description.to_owned(),
                zone_id: zone_id.to_owned(),
            });
        }
        dataset.refresh_derived_stats();
        dataset
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone(&self, id: &str) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.id == id)
    }

    /// Newest-first action log.
    pub fn actions(&self) -> &RollingLog<Action> {
        &self.actions
    }

    /// Newest-first notification log.
    pub fn notifications(&self) -> &RollingLog<Notification> {
        &self.notifications
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn energy(&self) -> &EnergyUsage {
        &self.energy
    }

    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    pub fn total_personnel(&self) -> u32 {
        self.zones.iter().map(Zone::current_personnel).sum()
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn unread_alert_count(&self) -> usize {
        self.notifications
            .iter()
            .filter(|n| n.is_unread_alert())
            .count()
    }

    pub(crate) fn zones_mut(&mut self) -> &mut [Zone] {
        &mut self.zones
    }

    pub(crate) fn machines_mut(&mut self) -> &mut [Machine] {
        &mut self.machines
    }

    pub(crate) fn energy_mut(&mut self) -> &mut EnergyUsage {
        &mut self.energy
    }

    pub(crate) fn stats_mut(&mut self) -> &mut AggregateStats {
        &mut self.stats
    }

    /// Recompute the totals that are pure functions of zone and notification state.
    pub(crate) fn refresh_derived_stats(&mut self) {
        self.stats.total_personnel = self.total_personnel();
        self.stats.active_zones = self
            .zones
            .iter()
            .filter(|zone| zone.current_personnel() > 0)
            .count() as u32;
        self.stats.alerts_today = self.unread_alert_count() as u32;
    }

    /// Prepend an action, link it to its zone and drop references to evicted entries.
    pub(crate) fn record_action(&mut self, action: Action) {
        let action_id = action.id.clone();
        let zone_id = action.zone_id.clone();
        let evicted: Vec<String> = self
            .actions
            .push(action)
            .into_iter()
            .map(|evicted| evicted.id)
            .collect();
        if let Some(zone) = self.zones.iter_mut().find(|zone| zone.id == zone_id) {
            zone.link_action(&action_id);
        }
        for zone in &mut self.zones {
            zone.unlink_actions(&evicted);
        }
    }

    /// Prepend a fresh unread notification and return its id.
    pub(crate) fn record_notification(
        &mut self,
        notification: NewNotification,
        timestamp: DateTime<Utc>,
    ) -> String {
        let id = notification_id();
        self.notifications.push(Notification {
            id: id.clone(),
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            timestamp,
            read: false,
            priority: notification.priority,
        });
        id
    }

    /// Returns `false` when no notification has this id.
    pub(crate) fn mark_notification_read(&mut self, id: &str) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    /// Returns how many notifications changed from unread to read.
    pub(crate) fn mark_all_notifications_read(&mut self) -> usize {
        let mut changed = 0;
        for notification in self.notifications.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            changed += 1;
        }
        changed
    }
}
