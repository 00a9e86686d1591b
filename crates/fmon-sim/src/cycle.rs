//! ---
//! fmon_section: "11-simulation"
//! fmon_subsection: "generator"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Per-tick update cycle applied to the factory dataset."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
//! One tick mutates the dataset in a fixed order: zone personnel, aggregate stats,
//! machines, energy, then an optional action and an optional notification. Later
//! steps observe earlier writes. Every random decision is drawn from the supplied
//! [`Entropy`] in that same order.

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use fmon_common::{hour_label, Shift, TuningConfig};
use serde::Serialize;

use crate::dataset::{action_id, FactoryDataset};
use crate::energy::{shift_baseline, EnergySample};
use crate::entropy::Entropy;
use crate::model::{
    Action, ActionKind, MachineState, MachineTransition, NewNotification, Notification,
    NotificationKind, Priority,
};
use crate::templates::{
    action_descriptions, notification_templates, EMPLOYEE_NUMBER_RANGE, PERSONNEL_NAMES,
};

/// What a single cycle changed, for logging and offline output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleOutcome {
    /// Zones whose personnel count moved.
    pub zones_changed: usize,
    pub defect_detected: bool,
    pub machine_transitions: Vec<MachineTransition>,
    pub energy_usage: f64,
    pub energy_evicted: Option<EnergySample>,
    pub action: Option<Action>,
    pub notification: Option<Notification>,
}

pub fn run_cycle(
    dataset: &mut FactoryDataset,
    entropy: &mut dyn Entropy,
    tuning: &TuningConfig,
    now: DateTime<FixedOffset>,
) -> CycleOutcome {
    let zones_changed = drift_personnel(dataset, entropy, tuning);
    let defect_detected = refresh_stats(dataset, entropy, tuning);
    let machine_transitions = drift_machines(dataset, entropy, tuning);
    let (energy_usage, energy_evicted) = update_energy(dataset, entropy, tuning, now);
    let action = maybe_generate_action(dataset, entropy, tuning, now);
    let notification = maybe_generate_notification(dataset, entropy, tuning, now);
    CycleOutcome {
        zones_changed,
        defect_detected,
        machine_transitions,
        energy_usage,
        energy_evicted,
        action,
        notification,
    }
}

/// Move each zone by a uniform integer in `[-delta_max, +delta_max]`.
fn drift_personnel(
    dataset: &mut FactoryDataset,
    entropy: &mut dyn Entropy,
    tuning: &TuningConfig,
) -> usize {
    let delta_max = i64::from(tuning.personnel_delta_max);
    let choices = (2 * delta_max + 1) as usize;
    let mut changed = 0;
    for zone in dataset.zones_mut() {
        let delta = entropy.pick_index(choices) as i64 - delta_max;
        let before = zone.current_personnel();
        zone.set_personnel(i64::from(before) + delta, tuning.personnel_overflow);
        if zone.current_personnel() != before {
            changed += 1;
        }
    }
    changed
}

/// Returns whether a defect was counted this tick.
fn refresh_stats(
    dataset: &mut FactoryDataset,
    entropy: &mut dyn Entropy,
    tuning: &TuningConfig,
) -> bool {
    dataset.refresh_derived_stats();
    let stats = dataset.stats_mut();
    let drift = entropy.centered(tuning.system_efficiency_step);
    stats.system_efficiency = (stats.system_efficiency + drift)
        .clamp(tuning.system_efficiency_min, tuning.system_efficiency_max);
    let defect = entropy.chance(tuning.defect_probability);
    if defect {
        stats.today_defects_detected = stats.today_defects_detected.saturating_add(1);
    }
    defect
}

fn drift_machines(
    dataset: &mut FactoryDataset,
    entropy: &mut dyn Entropy,
    tuning: &TuningConfig,
) -> Vec<MachineTransition> {
    let mut transitions = Vec::new();
    for machine in dataset.machines_mut() {
        let from = machine.state;
        match machine.state {
            MachineState::Running => {
                machine.efficiency = (machine.efficiency
                    + entropy.centered(tuning.machine_efficiency_step))
                .clamp(tuning.machine_efficiency_min, tuning.machine_efficiency_max);
                let flagged = entropy.chance(tuning.machine_warning_probability);
                if flagged && machine.efficiency < tuning.machine_warning_threshold {
                    machine.state = MachineState::Warning;
                }
            }
            MachineState::Maintenance => {
                if entropy.chance(tuning.maintenance_recovery_probability) {
                    let span = tuning.machine_efficiency_max - tuning.maintenance_restart_min;
                    machine.state = MachineState::Running;
                    machine.efficiency = tuning.maintenance_restart_min + entropy.next_unit() * span;
                }
            }
            MachineState::Warning => {
                if entropy.chance(tuning.warning_recovery_probability) {
                    machine.state = MachineState::Running;
                    machine.efficiency = machine.efficiency.max(tuning.warning_recovery_floor);
                }
            }
            MachineState::Idle | MachineState::Error => {}
        }
        if machine.state != from {
            transitions.push(MachineTransition {
                machine_id: machine.id.clone(),
                from,
                to: machine.state,
                efficiency: machine.efficiency,
            });
        }
    }
    transitions
}

fn update_energy(
    dataset: &mut FactoryDataset,
    entropy: &mut dyn Entropy,
    tuning: &TuningConfig,
    now: DateTime<FixedOffset>,
) -> (f64, Option<EnergySample>) {
    let hour = now.hour();
    let night_unit = match Shift::for_hour(hour) {
        Shift::Night => entropy.next_unit(),
        Shift::Day | Shift::Evening => 0.0,
    };
    let base = shift_baseline(hour, night_unit);
    let usage = (base + entropy.centered(tuning.energy_noise)).max(tuning.energy_floor);
    let evicted = dataset.energy_mut().record(hour_label(hour), usage);
    (usage, evicted)
}

fn maybe_generate_action(
    dataset: &mut FactoryDataset,
    entropy: &mut dyn Entropy,
    tuning: &TuningConfig,
    now: DateTime<FixedOffset>,
) -> Option<Action> {
    if !entropy.chance(tuning.action_probability) || dataset.zones().is_empty() {
        return None;
    }
    let kind = ActionKind::ALL[entropy.pick_index(ActionKind::ALL.len())];
    let zone = &dataset.zones()[entropy.pick_index(dataset.zones().len())];
    let person_name = PERSONNEL_NAMES[entropy.pick_index(PERSONNEL_NAMES.len())];
    let descriptions = action_descriptions(kind);
    let description = descriptions[entropy.pick_index(descriptions.len())];
    let employee = entropy.pick_index(EMPLOYEE_NUMBER_RANGE);

    let action = Action {
        id: action_id(),
        kind,
        person_id: format!("emp-{employee:03}"),
        person_name: person_name.to_owned(),
        timestamp: now.with_timezone(&Utc),
        description: format!("{description} - {}", zone.name),
        zone_id: zone.id.clone(),
    };
    dataset.record_action(action.clone());
    Some(action)
}

fn maybe_generate_notification(
    dataset: &mut FactoryDataset,
    entropy: &mut dyn Entropy,
    tuning: &TuningConfig,
    now: DateTime<FixedOffset>,
) -> Option<Notification> {
    if !entropy.chance(tuning.notification_probability) {
        return None;
    }
    let kind = NotificationKind::ALL[entropy.pick_index(NotificationKind::ALL.len())];
    let templates = notification_templates(kind);
    let template = templates[entropy.pick_index(templates.len())];
    let priority = match kind {
        NotificationKind::Error => Priority::High,
        NotificationKind::Warning => Priority::Medium,
        NotificationKind::Info | NotificationKind::Success => {
            Priority::ALL[entropy.pick_index(Priority::ALL.len())]
        }
    };
    let id = dataset.record_notification(
        NewNotification {
            kind,
            title: template.title.to_owned(),
            message: template.message.to_owned(),
            priority,
        },
        now.with_timezone(&Utc),
    );
    dataset.notifications().iter().find(|n| n.id == id).cloned()
}
