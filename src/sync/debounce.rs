//! Trailing-edge debounce timer
//!
//! The owner holds the handle. Scheduling replaces whatever was pending, so
//! a burst of calls ends in one run, `delay` after the last call. Dropping
//! the handle cancels the pending run.
//!
//! Tasks are expected to block (they write to a store), so once the delay
//! elapses they run on tokio's blocking pool rather than a runtime worker.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

type Task = Box<dyn FnOnce() + Send + 'static>;

enum Pending {
    /// Waiting on the runtime's timer
    Timer(JoinHandle<()>),
    /// No runtime to wait on; held until the owner flushes or cancels
    Deferred(Task),
}

/// A cancellable, reschedulable delayed task.
pub struct Debouncer {
    delay: Duration,
    pending: Option<Pending>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `task` once `delay` has elapsed since this call, unless another
    /// call or [`cancel`](Self::cancel) comes first.
    ///
    /// Outside a tokio runtime there is no timer to wait on: the latest task
    /// is held, never run, until `cancel`. Owners write their final state in
    /// their own flush.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        self.pending = Some(match Handle::try_current() {
            Ok(handle) => {
                // Deadline is fixed now, not when the spawned task is first polled
                let deadline = Instant::now() + self.delay;
                Pending::Timer(handle.spawn(async move {
                    sleep_until(deadline).await;
                    // An abort from here on leaves the write to finish
                    let _ = tokio::task::spawn_blocking(task).await;
                }))
            }
            Err(_) => {
                debug!("no async runtime available, deferring task until flush");
                Pending::Deferred(Box::new(task))
            }
        });
    }

    /// Cancel the pending run. Returns true if one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(Pending::Timer(handle)) if !handle.is_finished() => {
                handle.abort();
                true
            }
            Some(Pending::Deferred(_)) => true,
            _ => false,
        }
    }

    /// True while a scheduled run has not yet completed.
    pub fn is_pending(&self) -> bool {
        match &self.pending {
            Some(Pending::Timer(handle)) => !handle.is_finished(),
            Some(Pending::Deferred(_)) => true,
            None => false,
        }
    }
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
