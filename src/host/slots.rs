//! Concurrency slots
//!
//! Bounds how many parallel test bodies run at the same time.

use parking_lot::{Condvar, Mutex};

/// Counting semaphore over running test bodies
pub(crate) struct Slots {
    running: Mutex<usize>,
    available: Condvar,
    max: usize,
}

impl Slots {
    pub(crate) fn new(max: usize) -> Self {
        Self {
            running: Mutex::new(0),
            available: Condvar::new(),
            max: max.max(1),
        }
    }

    /// Take a slot, blocking while all of them are in use
    pub(crate) fn acquire(&self) {
        let mut running = self.running.lock();
        while *running >= self.max {
            self.available.wait(&mut running);
        }
        *running += 1;
    }

    pub(crate) fn release(&self) {
        let mut running = self.running.lock();
        *running = running.saturating_sub(1);
        self.available.notify_one();
    }

    #[cfg(test)]
    pub(crate) fn running(&self) -> usize {
        *self.running.lock()
    }

    pub(crate) fn max(&self) -> usize {
        self.max
    }
}
