//! ---
//! fmon_section: "11-simulation"
//! fmon_subsection: "templates"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Text pools used for generated actions and notifications."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
use crate::model::{ActionKind, NotificationKind};

pub const PERSONNEL_NAMES: [&str; 10] = [
    "Alex Johnson",
    "Maria Santos",
    "David Lee",
    "Sarah Wilson",
    "Tom Brown",
    "Jessica Davis",
    "Mark Rodriguez",
    "Lisa Kim",
    "Ryan Taylor",
    "Amy Chen",
];

/// Exclusive upper bound of generated employee numbers.
pub const EMPLOYEE_NUMBER_RANGE: usize = 1000;

pub fn action_descriptions(kind: ActionKind) -> &'static [&'static str] {
    match kind {
        ActionKind::Entry => &[
            "Entered for shift change",
            "Arrived for scheduled maintenance",
            "Entered for quality inspection",
            "Started overtime shift",
        ],
        ActionKind::Exit => &[
            "Exited for lunch break",
            "Completed shift duties",
            "Left for meeting",
            "Exited for emergency response",
        ],
        ActionKind::TaskStart => &[
            "Started quality control procedure",
            "Initiated equipment calibration",
            "Began inventory audit",
            "Started safety inspection",
        ],
        ActionKind::TaskComplete => &[
            "Completed production batch",
            "Finished maintenance procedure",
            "Quality check passed",
            "Safety inspection completed",
        ],
        ActionKind::Alert => &[
            "Equipment alarm triggered",
            "Quality threshold exceeded",
            "Safety protocol activated",
            "Maintenance required",
        ],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationTemplate {
    pub title: &'static str,
    pub message: &'static str,
}

const fn template(title: &'static str, message: &'static str) -> NotificationTemplate {
    NotificationTemplate { title, message }
}

const INFO_TEMPLATES: [NotificationTemplate; 3] = [
    template("Shift Change Reminder", "Next shift change in 30 minutes"),
    template("Training Session", "Safety training session starting soon"),
    template("Production Update", "Daily production target on track"),
];

const WARNING_TEMPLATES: [NotificationTemplate; 3] = [
    template("Zone Capacity Alert", "Zone approaching maximum capacity"),
    template("Equipment Attention", "Machine efficiency below optimal range"),
    template("Maintenance Due", "Preventive maintenance scheduled"),
];

const ERROR_TEMPLATES: [NotificationTemplate; 3] = [
    template(
        "Equipment Malfunction",
        "Critical equipment requires immediate attention",
    ),
    template("Safety Alert", "Safety protocol breach detected"),
    template("System Error", "System component failure detected"),
];

const SUCCESS_TEMPLATES: [NotificationTemplate; 3] = [
    template("Quality Target Met", "Daily quality target achieved"),
    template(
        "Maintenance Complete",
        "Scheduled maintenance completed successfully",
    ),
    template(
        "Production Milestone",
        "Production milestone reached ahead of schedule",
    ),
];

pub fn notification_templates(kind: NotificationKind) -> &'static [NotificationTemplate] {
    match kind {
        NotificationKind::Info => &INFO_TEMPLATES,
        NotificationKind::Warning => &WARNING_TEMPLATES,
        NotificationKind::Error => &ERROR_TEMPLATES,
        NotificationKind::Success => &SUCCESS_TEMPLATES,
    }
}
