//! ---
//! fmon_section: "11-simulation"
//! fmon_subsection: "scenarios"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Operator-triggered demo scenarios applied to the factory dataset."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use fmon_common::TuningConfig;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::dataset::{action_id, FactoryDataset};
use crate::energy::{NORMAL_USAGE, PEAK_BOOST, PEAK_CEILING};
use crate::entropy::Entropy;
use crate::error::SimError;
use crate::model::{Action, ActionKind, NewNotification, NotificationKind, Priority};

const EMERGENCY_SURPLUS: u32 = 2;
const MAINTENANCE_REINFORCEMENT: u32 = 3;
const PEAK_REINFORCEMENT: u32 = 5;
const PEAK_EFFICIENCY_BOOST: f64 = 5.0;
const NORMAL_OCCUPANCY: f64 = 0.8;
const NORMAL_EFFICIENCY: f64 = 92.0;

const MAINTENANCE_DEPARTMENT: &str = "Engineering";
const PRODUCTION_DEPARTMENT: &str = "Production";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Scenario {
    Emergency,
    Maintenance,
    ProductionPeak,
    Normal,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Emergency,
        Scenario::Maintenance,
        Scenario::ProductionPeak,
        Scenario::Normal,
    ];

    /// Parse a scenario name, trimming surrounding whitespace.
    pub fn parse(name: &str) -> Result<Self, SimError> {
        Scenario::from_str(name.trim()).map_err(|_| SimError::InvalidScenario(name.to_owned()))
    }

    /// Apply the scenario and refresh derived stats. Returns the ids of zones whose
    /// personnel were targeted.
    pub(crate) fn apply(
        self,
        dataset: &mut FactoryDataset,
        entropy: &mut dyn Entropy,
        tuning: &TuningConfig,
        now: DateTime<FixedOffset>,
    ) -> Vec<String> {
        let timestamp = now.with_timezone(&Utc);
        let affected = match self {
            Scenario::Emergency => emergency(dataset, entropy, tuning, timestamp),
            Scenario::Maintenance => maintenance(dataset, tuning, timestamp),
            Scenario::ProductionPeak => production_peak(dataset, tuning, timestamp),
            Scenario::Normal => normal(dataset, tuning),
        };
        dataset.refresh_derived_stats();
        affected
    }
}

fn emergency(
    dataset: &mut FactoryDataset,
    entropy: &mut dyn Entropy,
    tuning: &TuningConfig,
    timestamp: DateTime<Utc>,
) -> Vec<String> {
    if dataset.zones().is_empty() {
        return Vec::new();
    }
    let index = entropy.pick_index(dataset.zones().len());
    let zone = &mut dataset.zones_mut()[index];
    let surge = zone
        .max_capacity()
        .saturating_add(EMERGENCY_SURPLUS)
        .max(zone.current_personnel());
    zone.set_personnel(i64::from(surge), tuning.personnel_overflow);
    let (zone_id, zone_name) = (zone.id.clone(), zone.name.clone());

    dataset.record_notification(
        NewNotification {
            kind: NotificationKind::Error,
            title: "EMERGENCY ALERT".to_owned(),
            message: format!("Critical situation in {zone_name} - Immediate evacuation required"),
            priority: Priority::High,
        },
        timestamp,
    );
    dataset.record_action(Action {
        id: action_id(),
        kind: ActionKind::Alert,
        person_id: "system".to_owned(),
        person_name: "System Alert".to_owned(),
        timestamp,
        description: format!("Emergency protocol activated in {zone_name}"),
        zone_id: zone_id.clone(),
    });
    vec![zone_id]
}

fn maintenance(
    dataset: &mut FactoryDataset,
    tuning: &TuningConfig,
    timestamp: DateTime<Utc>,
) -> Vec<String> {
    let mut affected = Vec::new();
    for zone in dataset
        .zones_mut()
        .iter_mut()
        .filter(|zone| zone.department == MAINTENANCE_DEPARTMENT)
    {
        let reinforced = (zone.current_personnel() + MAINTENANCE_REINFORCEMENT)
            .max(zone.max_capacity().saturating_sub(1));
        zone.set_personnel(i64::from(reinforced), tuning.personnel_overflow);
        affected.push(zone.id.clone());
    }
    dataset.record_notification(
        NewNotification {
            kind: NotificationKind::Info,
            title: "Scheduled Maintenance".to_owned(),
            message: "Major maintenance operation starting - increased engineering personnel deployed"
                .to_owned(),
            priority: Priority::Medium,
        },
        timestamp,
    );
    affected
}

fn production_peak(
    dataset: &mut FactoryDataset,
    tuning: &TuningConfig,
    timestamp: DateTime<Utc>,
) -> Vec<String> {
    let mut affected = Vec::new();
    for zone in dataset
        .zones_mut()
        .iter_mut()
        .filter(|zone| zone.department == PRODUCTION_DEPARTMENT)
    {
        // Zones already at or over capacity are left alone.
        if zone.current_personnel() < zone.max_capacity() {
            let staffed = (zone.current_personnel() + PEAK_REINFORCEMENT).min(zone.max_capacity());
            zone.set_personnel(i64::from(staffed), tuning.personnel_overflow);
            affected.push(zone.id.clone());
        }
    }

    let stats = dataset.stats_mut();
    stats.system_efficiency =
        (stats.system_efficiency + PEAK_EFFICIENCY_BOOST).min(tuning.system_efficiency_max);
    dataset.energy_mut().boost(PEAK_BOOST, PEAK_CEILING);

    dataset.record_notification(
        NewNotification {
            kind: NotificationKind::Success,
            title: "Peak Production Mode".to_owned(),
            message: "High-demand production period activated - all systems optimized".to_owned(),
            priority: Priority::Low,
        },
        timestamp,
    );
    affected
}

fn normal(dataset: &mut FactoryDataset, tuning: &TuningConfig) -> Vec<String> {
    let mut affected = Vec::new();
    for zone in dataset.zones_mut() {
        let settled = (f64::from(zone.max_capacity()) * NORMAL_OCCUPANCY).floor() as i64;
        zone.set_personnel(settled, tuning.personnel_overflow);
        affected.push(zone.id.clone());
    }
    dataset.stats_mut().system_efficiency = NORMAL_EFFICIENCY;
    dataset.energy_mut().set_current(NORMAL_USAGE);
    affected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::ScriptedEntropy;
    use crate::model::ZoneStatus;
    use chrono::TimeZone;

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 11, 29, 10, 0, 0)
            .unwrap()
    }

    fn setup() -> (FactoryDataset, TuningConfig) {
        let tuning = TuningConfig::default();
        (FactoryDataset::baseline(now(), &tuning), tuning)
    }

    #[test]
    fn parse_accepts_known_names_only() {
        assert_eq!(Scenario::parse("emergency").unwrap(), Scenario::Emergency);
        assert_eq!(
            Scenario::parse(" production_peak\n").unwrap(),
            Scenario::ProductionPeak
        );
        assert_eq!(
            Scenario::parse("meltdown").unwrap_err(),
            SimError::InvalidScenario("meltdown".into())
        );
        assert!(Scenario::parse("Emergency").is_err());
        for scenario in Scenario::ALL {
            assert_eq!(Scenario::parse(scenario.as_ref()).unwrap(), scenario);
        }
    }

    #[test]
    fn emergency_makes_a_zone_critical_and_alerts() {
        for draw in [0.0, 0.3, 0.99] {
            let (mut dataset, tuning) = setup();
            let mut entropy = ScriptedEntropy::constant(draw);
            let affected =
                Scenario::Emergency.apply(&mut dataset, &mut entropy, &tuning, now());
            assert_eq!(affected.len(), 1);
            let zone = dataset.zone(&affected[0]).unwrap();
            assert_eq!(zone.status(), ZoneStatus::Critical);
            assert!(zone.current_personnel() >= zone.max_capacity() + 2);
            assert!(zone.current_personnel() <= zone.max_capacity() + 3);

            let alert = dataset.notifications().newest().unwrap();
            assert_eq!(alert.title, "EMERGENCY ALERT");
            assert_eq!(alert.kind, NotificationKind::Error);
            assert_eq!(alert.priority, Priority::High);
            assert!(alert.message.contains(&zone.name));

            let action = dataset.actions().newest().unwrap();
            assert_eq!(action.kind, ActionKind::Alert);
            assert_eq!(action.person_name, "System Alert");
            assert_eq!(action.zone_id, zone.id);
            assert_eq!(zone.action_ids()[0], action.id);
            assert_eq!(dataset.stats().alerts_today, 3);
        }
    }

    #[test]
    fn emergency_keeps_larger_crowds() {
        let (mut dataset, tuning) = setup();
        // zone-3 already holds 15 of 12; the surge target 14 must not lower it.
        let mut entropy = ScriptedEntropy::constant(0.5);
        let affected = Scenario::Emergency.apply(&mut dataset, &mut entropy, &tuning, now());
        assert_eq!(affected, ["zone-3"]);
        assert_eq!(dataset.zone("zone-3").unwrap().current_personnel(), 15);
    }

    #[test]
    fn maintenance_reinforces_engineering() {
        let (mut dataset, tuning) = setup();
        let mut entropy = ScriptedEntropy::constant(0.5);
        let affected = Scenario::Maintenance.apply(&mut dataset, &mut entropy, &tuning, now());
        assert_eq!(affected, ["zone-5"]);
        let zone = dataset.zone("zone-5").unwrap();
        assert_eq!(zone.current_personnel(), 9);
        assert_eq!(zone.status(), ZoneStatus::Critical);
        let notice = dataset.notifications().newest().unwrap();
        assert_eq!(notice.title, "Scheduled Maintenance");
        assert_eq!(notice.priority, Priority::Medium);
        assert_eq!(entropy.drawn(), 0);
    }

    #[test]
    fn production_peak_fills_production_zones() {
        let (mut dataset, tuning) = setup();
        let usage_before = dataset.energy().current_usage();
        let mut entropy = ScriptedEntropy::constant(0.5);
        let affected =
            Scenario::ProductionPeak.apply(&mut dataset, &mut entropy, &tuning, now());
        assert_eq!(affected, ["zone-1"]);
        assert_eq!(dataset.zone("zone-1").unwrap().current_personnel(), 29);
        assert_eq!(dataset.zone("zone-3").unwrap().current_personnel(), 15);
        assert_eq!(dataset.stats().system_efficiency, 98.0);
        assert_eq!(
            dataset.energy().current_usage(),
            (usage_before + 200.0).min(1200.0)
        );
        assert!(dataset.energy().peak_usage() >= dataset.energy().current_usage());
        assert_eq!(dataset.stats().total_personnel, dataset.total_personnel());
        assert_eq!(
            dataset.notifications().newest().unwrap().title,
            "Peak Production Mode"
        );
    }

    #[test]
    fn normal_is_idempotent() {
        let (mut dataset, tuning) = setup();
        let mut entropy = ScriptedEntropy::constant(0.5);
        Scenario::Emergency.apply(&mut dataset, &mut entropy, &tuning, now());
        let notifications = dataset.notifications().len();
        for _ in 0..2 {
            Scenario::Normal.apply(&mut dataset, &mut entropy, &tuning, now());
            for zone in dataset.zones() {
                let expected = (f64::from(zone.max_capacity()) * 0.8).floor() as u32;
                assert_eq!(zone.current_personnel(), expected);
                assert_eq!(zone.status(), ZoneStatus::Normal);
            }
            assert_eq!(dataset.stats().system_efficiency, 92.0);
            assert_eq!(dataset.energy().current_usage(), 750.0);
        }
        assert_eq!(dataset.notifications().len(), notifications);
        assert_eq!(dataset.stats().total_personnel, 24 + 8 + 9 + 20 + 6);
    }
}
