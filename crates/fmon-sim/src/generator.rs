//! ---
//! fmon_section: "11-simulation"
//! fmon_subsection: "generator"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Telemetry generator owning the factory dataset, ticker and listeners."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
use std::fmt;
use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use fmon_common::{offset_from_minutes, SimulationConfig, TuningConfig};
use fmon_logging::{fmon_debug, fmon_error, fmon_warn, log_system_event, LogContext, SystemEventOutcome};
use fmon_rt::PeriodicTask;
use parking_lot::Mutex;
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::cycle::{run_cycle, CycleOutcome};
use crate::dataset::FactoryDataset;
use crate::entropy::{Entropy, SeededEntropy};
use crate::error::SimError;
use crate::listeners::{panic_message, FanOut, ListenerId, ListenerRegistry};
use crate::model::NewNotification;
use crate::scenario::Scenario;

const TICK_TASK_NAME: &str = "fmon-telemetry-tick";

/// Result of one update cycle and its fan-out.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    /// 1-based count of cycles completed by this generator.
    pub tick: u64,
    pub at: DateTime<FixedOffset>,
    pub cycle: CycleOutcome,
    pub fan_out: FanOut,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub affected_zones: Vec<String>,
    pub fan_out: FanOut,
}

/// Point-in-time copy of the dataset.
#[derive(Debug, Clone, Serialize)]
pub struct FactorySnapshot {
    pub tick: u64,
    pub taken_at: DateTime<FixedOffset>,
    pub dataset: FactoryDataset,
}

struct SimulationState {
    dataset: FactoryDataset,
    entropy: Box<dyn Entropy>,
    ticks: u64,
}

struct Shared {
    state: Mutex<SimulationState>,
    listeners: ListenerRegistry,
    ticker: Mutex<Option<PeriodicTask>>,
    clock: Arc<dyn Clock>,
    tuning: TuningConfig,
    tick_interval: Duration,
}

/// Owner of the simulated factory. Clones share one dataset, one listener
/// registry and one ticker.
///
/// Every mutation happens under a single lock which is released before
/// listeners run, so a listener may read through [`TelemetryGenerator::snapshot`]
/// or [`TelemetryGenerator::inspect`]. Listeners must not call mutating operations.
#[derive(Clone)]
pub struct TelemetryGenerator {
    shared: Arc<Shared>,
}

impl fmt::Debug for TelemetryGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryGenerator")
            .field("tick_interval", &self.shared.tick_interval)
            .field("running", &self.is_running())
            .field("ticks", &self.ticks_completed())
            .field("listeners", &self.shared.listeners)
            .finish()
    }
}

impl TelemetryGenerator {
    /// Build from the baseline dataset anchored at `clock.now()`.
    pub fn new(config: &SimulationConfig, entropy: Box<dyn Entropy>, clock: Arc<dyn Clock>) -> Self {
        let dataset = FactoryDataset::baseline(clock.now(), &config.tuning);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SimulationState {
                    dataset,
                    entropy,
                    ticks: 0,
                }),
                listeners: ListenerRegistry::default(),
                ticker: Mutex::new(None),
                clock,
                tuning: config.tuning.clone(),
                tick_interval: config.tick_interval,
            }),
        }
    }

    /// Seeded entropy when `random_seed` is set, and the system clock at the
    /// configured site offset.
    pub fn from_config(config: &SimulationConfig) -> Self {
        let clock = match config.utc_offset_minutes.and_then(offset_from_minutes) {
            Some(offset) => SystemClock::with_offset(offset),
            None => SystemClock::local(),
        };
        Self::new(
            config,
            Box::new(SeededEntropy::from_optional_seed(config.random_seed)),
            Arc::new(clock),
        )
    }

    pub fn tick_interval(&self) -> Duration {
        self.shared.tick_interval
    }

    pub fn tuning(&self) -> &TuningConfig {
        &self.shared.tuning
    }

    /// Begin ticking on the current tokio runtime. Returns `Ok(false)` when
    /// already running. The first tick fires one full interval after start.
    ///
    /// A tick that panics halts the ticker; `start` may then be called again.
    pub fn start(&self) -> Result<bool, SimError> {
        let mut ticker = self.shared.ticker.lock();
        if let Some(task) = ticker.as_ref() {
            if !task.is_finished() {
                return Ok(false);
            }
            fmon_warn!(
                "previous ticker halted after {} ticks; restarting",
                task.ticks_fired()
            );
            *ticker = None;
        }
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let task = PeriodicTask::spawn(TICK_TASK_NAME, self.shared.tick_interval, move |_| {
            match weak.upgrade() {
                Some(shared) => {
                    let generator = TelemetryGenerator { shared };
                    match panic::catch_unwind(AssertUnwindSafe(|| generator.tick())) {
                        Ok(_) => ControlFlow::Continue(()),
                        Err(payload) => {
                            fmon_error!(
                                context =
                                    LogContext::new().with_tick(generator.ticks_completed() + 1),
                                "tick panicked, ticker halted: {}",
                                panic_message(payload.as_ref())
                            );
                            ControlFlow::Break(())
                        }
                    }
                }
                None => ControlFlow::Break(()),
            }
        });
        let task = match task {
            Ok(task) => task,
            Err(err) => {
                log_system_event(
                    None,
                    "generator.start",
                    &format!("unable to schedule ticks: {err}"),
                    SystemEventOutcome::Fault,
                );
                return Err(err.into());
            }
        };
        *ticker = Some(task);
        log_system_event(
            None,
            "generator.start",
            &format!(
                "telemetry generator started with {}s interval",
                self.shared.tick_interval.as_secs_f64()
            ),
            SystemEventOutcome::Success,
        );
        Ok(true)
    }

    /// Cancel future ticks. Returns `false` when not running. A tick already in
    /// progress completes.
    pub fn stop(&self) -> bool {
        let Some(task) = self.shared.ticker.lock().take() else {
            return false;
        };
        if task.is_finished() {
            return false;
        }
        task.cancel();
        log_system_event(
            Some(&LogContext::new().with_tick(self.ticks_completed())),
            "generator.stop",
            &format!("telemetry generator stopped after {} ticks", task.ticks_fired()),
            SystemEventOutcome::Success,
        );
        true
    }

    pub fn is_running(&self) -> bool {
        self.shared
            .ticker
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.listeners.add(Arc::new(listener))
    }

    /// Returns `false` when `id` is unknown or already removed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    /// Run one update cycle now, then notify listeners once.
    pub fn tick(&self) -> TickReport {
        let now = self.shared.clock.now();
        let (tick, cycle) = {
            let mut guard = self.shared.state.lock();
            let state = &mut *guard;
            let cycle = run_cycle(
                &mut state.dataset,
                state.entropy.as_mut(),
                &self.shared.tuning,
                now,
            );
            state.ticks += 1;
            (state.ticks, cycle)
        };

        let fan_out = self.shared.listeners.notify(Some(tick));
        fmon_debug!(
            context = LogContext::new().with_tick(tick),
            "tick complete: zones_changed={} transitions={} energy={:.1} action={} notification={} listeners={}",
            cycle.zones_changed,
            cycle.machine_transitions.len(),
            cycle.energy_usage,
            cycle.action.is_some(),
            cycle.notification.is_some(),
            fan_out.delivered
        );
        TickReport {
            tick,
            at: now,
            cycle,
            fan_out,
        }
    }

    /// Apply `scenario`, then notify listeners once.
    pub fn trigger_scenario(&self, scenario: Scenario) -> ScenarioReport {
        let now = self.shared.clock.now();
        let affected_zones = {
            let mut guard = self.shared.state.lock();
            let state = &mut *guard;
            scenario.apply(
                &mut state.dataset,
                state.entropy.as_mut(),
                &self.shared.tuning,
                now,
            )
        };

        let fan_out = self.shared.listeners.notify(None);
        let ctx = LogContext::new().with_scenario(scenario.as_ref());
        let ctx = match affected_zones.as_slice() {
            [zone] => ctx.with_zone(zone),
            _ => ctx,
        };
        log_system_event(
            Some(&ctx),
            "scenario.applied",
            &format!(
                "scenario {} applied to {} zone(s)",
                scenario,
                affected_zones.len()
            ),
            SystemEventOutcome::Success,
        );
        ScenarioReport {
            scenario,
            affected_zones,
            fan_out,
        }
    }

    /// Like [`TelemetryGenerator::trigger_scenario`], rejecting unknown names.
    pub fn trigger_scenario_named(&self, name: &str) -> Result<ScenarioReport, SimError> {
        match Scenario::parse(name) {
            Ok(scenario) => Ok(self.trigger_scenario(scenario)),
            Err(err) => {
                fmon_warn!(context = LogContext::new().with_scenario(name), "{}", err);
                Err(err)
            }
        }
    }

    pub fn ticks_completed(&self) -> u64 {
        self.shared.state.lock().ticks
    }

    pub fn snapshot(&self) -> FactorySnapshot {
        let taken_at = self.shared.clock.now();
        let state = self.shared.state.lock();
        FactorySnapshot {
            tick: state.ticks,
            taken_at,
            dataset: state.dataset.clone(),
        }
    }

    /// Borrow the dataset without cloning. The generator lock is held for the
    /// duration of `f`.
    pub fn inspect<R>(&self, f: impl FnOnce(&FactoryDataset) -> R) -> R {
        f(&self.shared.state.lock().dataset)
    }

    /// Mark one notification read. Returns `false` for an unknown id.
    pub fn mark_notification_read(&self, id: &str) -> bool {
        let mut state = self.shared.state.lock();
        let found = state.dataset.mark_notification_read(id);
        state.dataset.refresh_derived_stats();
        found
    }

    /// Mark every notification read, returning how many changed.
    pub fn mark_all_notifications_read(&self) -> usize {
        let mut state = self.shared.state.lock();
        let changed = state.dataset.mark_all_notifications_read();
        state.dataset.refresh_derived_stats();
        changed
    }

    /// Prepend an operator-supplied notification and return its id.
    pub fn push_notification(&self, notification: NewNotification) -> String {
        let timestamp = self.shared.clock.now().with_timezone(&Utc);
        let mut state = self.shared.state.lock();
        let id = state.dataset.record_notification(notification, timestamp);
        state.dataset.refresh_derived_stats();
        id
    }

    pub fn unread_count(&self) -> usize {
        self.shared.state.lock().dataset.unread_count()
    }
}
