//! ---
//! fmon_section: "01-core-functionality"
//! fmon_subsection: "module"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Runtime helpers supporting the telemetry generator."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RtError {
    #[error("no tokio runtime is available on this thread")]
    NoRuntime,
    #[error("periodic task period must be greater than zero")]
    ZeroPeriod,
}

/// Async rate limiter whose first tick completes one full period after creation.
#[derive(Debug)]
pub struct RateLimiter {
    interval: tokio::time::Interval,
}

impl RateLimiter {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub async fn tick(&mut self) -> Instant {
        self.interval.tick().await
    }
}

/// A repeating task running `body` once per period until cancelled.
///
/// Cancellation is observed between invocations only; a running `body` always completes.
/// Dropping the handle cancels the task as well.
#[derive(Debug)]
pub struct PeriodicTask {
    name: String,
    period: Duration,
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<()>,
    fired: Arc<AtomicU64>,
}

impl PeriodicTask {
    /// Spawn on the current tokio runtime. `body` receives the 1-based invocation
    /// number and may end the task by returning [`ControlFlow::Break`].
    pub fn spawn<F>(name: impl Into<String>, period: Duration, mut body: F) -> Result<Self, RtError>
    where
        F: FnMut(u64) -> ControlFlow<()> + Send + 'static,
    {
        if period.is_zero() {
            return Err(RtError::ZeroPeriod);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| RtError::NoRuntime)?;
        let name = name.into();
        let (shutdown, mut shutdown_rx) = broadcast::channel(1);
        let fired = Arc::new(AtomicU64::new(0));

        let task_name = name.clone();
        let task_fired = fired.clone();
        let task = runtime.spawn(async move {
            let mut limiter = RateLimiter::new(period);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        debug!(task = %task_name, "periodic task cancelled");
                        break;
                    }
                    _ = limiter.tick() => {
                        let sequence = task_fired.fetch_add(1, Ordering::SeqCst) + 1;
                        if body(sequence).is_break() {
                            debug!(task = %task_name, sequence, "periodic task finished");
                            break;
                        }
                    }
                }
            }
        });
        debug!(task = %name, period_ms = period.as_millis() as u64, "periodic task spawned");

        Ok(Self {
            name,
            period,
            shutdown,
            task,
            fired,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of times `body` has been invoked so far.
    pub fn ticks_fired(&self) -> u64 {
        self.fired.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the task to stop before its next invocation.
    pub fn cancel(&self) {
        // A send error only means the task already exited.
        let _ = self.shutdown.send(());
    }

    /// Cancel and wait for the task to exit.
    pub async fn shutdown(self) {
        self.cancel();
        if let Err(err) = self.task.await {
            warn!(task = %self.name, error = %err, "periodic task join error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn first_tick_fires_after_one_period() {
        let count = Arc::new(AtomicUsize::new(0));
        let observed = count.clone();
        let task = PeriodicTask::spawn("test", Duration::from_secs(15), move |_| {
            observed.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        })
        .unwrap();

        tokio::time::sleep(Duration::from_secs(14)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(task.ticks_fired(), 3);
        task.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_future_ticks() {
        let count = Arc::new(AtomicUsize::new(0));
        let observed = count.clone();
        let task = PeriodicTask::spawn("test", Duration::from_secs(1), move |_| {
            observed.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        })
        .unwrap();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        task.shutdown().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn body_can_end_the_task() {
        let task = PeriodicTask::spawn("test", Duration::from_secs(1), |sequence| {
            if sequence >= 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(task.is_finished());
        assert_eq!(task.ticks_fired(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_cancels() {
        let count = Arc::new(AtomicUsize::new(0));
        let observed = count.clone();
        let task = PeriodicTask::spawn("test", Duration::from_secs(1), move |_| {
            observed.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        })
        .unwrap();
        drop(task);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn spawn_outside_runtime_fails() {
        let err = PeriodicTask::spawn("test", Duration::from_secs(1), |_| ControlFlow::Continue(()))
            .unwrap_err();
        assert_eq!(err, RtError::NoRuntime);
    }

    #[tokio::test]
    async fn zero_period_is_rejected() {
        let err = PeriodicTask::spawn("test", Duration::ZERO, |_| ControlFlow::Continue(()))
            .unwrap_err();
        assert_eq!(err, RtError::ZeroPeriod);
    }
}
