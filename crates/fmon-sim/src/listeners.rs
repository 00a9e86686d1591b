//! ---
//! fmon_section: "11-simulation"
//! fmon_subsection: "listeners"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Change listener registry with isolated fan-out."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fmon_logging::{fmon_debug, fmon_error, LogContext};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

/// Zero-argument change callback. Runs on the ticking thread with no generator
/// lock held; it should return quickly.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Stable handle returned on registration and used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{listener} panicked: {message}")]
pub struct ListenerFailure {
    pub listener: ListenerId,
    pub message: String,
}

/// Result of notifying every registered listener once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FanOut {
    pub delivered: usize,
    pub failures: Vec<ListenerFailure>,
}

impl FanOut {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<IndexMap<ListenerId, Listener>>,
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(IndexMap::new()),
        }
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

impl ListenerRegistry {
    pub fn add(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().insert(id, listener);
        fmon_debug!(
            context = LogContext::new().with_listener(id.get()),
            "listener registered"
        );
        id
    }

    /// Returns `false` when `id` was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let removed = self.listeners.lock().shift_remove(&id).is_some();
        if removed {
            fmon_debug!(
                context = LogContext::new().with_listener(id.get()),
                "listener removed"
            );
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// Invoke every listener registered at call time. A panicking listener is
    /// logged and reported; the rest are still invoked.
    pub fn notify(&self, tick: Option<u64>) -> FanOut {
        let snapshot: Vec<(ListenerId, Listener)> = self
            .listeners
            .lock()
            .iter()
            .map(|(id, listener)| (*id, listener.clone()))
            .collect();

        let mut fan_out = FanOut::default();
        for (id, listener) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener())) {
                Ok(()) => fan_out.delivered += 1,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    let mut ctx = LogContext::new().with_listener(id.get());
                    if let Some(tick) = tick {
                        ctx = ctx.with_tick(tick);
                    }
                    fmon_error!(context = ctx, "listener panicked: {}", message);
                    fan_out.failures.push(ListenerFailure {
                        listener: id,
                        message,
                    });
                }
            }
        }
        fan_out
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
