use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// One-way stop flag shared by every loop in the simulation.
///
/// Sleeping loops wait on it with a timeout so a trigger wakes them early.
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    triggered: Mutex<bool>,
    condvar: Condvar,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        *self.triggered.lock() = true;
        self.condvar.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.triggered.lock()
    }

    /// Waits up to `timeout`. Returns `true` if shutdown was (or already had
    /// been) triggered, i.e. the wait ended early.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut triggered = self.triggered.lock();
        while !*triggered {
            if self.condvar.wait_until(&mut triggered, deadline).timed_out() {
                break;
            }
        }
        *triggered
    }
}
