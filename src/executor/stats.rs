//! Executor statistics.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Executor statistics.
#[derive(Debug, Default)]
pub struct ExecutorStats {
    /// Total tasks submitted.
    pub tasks_submitted: AtomicUsize,
    /// Total tasks completed successfully.
    pub tasks_completed: AtomicUsize,
    /// Total tasks that failed (error or panic).
    pub tasks_failed: AtomicUsize,
    /// Total tasks cancelled before completion.
    pub tasks_cancelled: AtomicUsize,
    /// Total advance steps taken.
    pub steps_taken: AtomicUsize,
    /// Total wakes that enqueued an id.
    pub wakes_delivered: AtomicUsize,
    /// Total wakes suppressed as duplicates.
    pub wakes_suppressed: AtomicUsize,
    /// Loop iterations that found the wake queue empty.
    pub idle_spins: AtomicUsize,
}

impl ExecutorStats {
    /// Record a submitted task.
    #[inline]
    pub fn record_submitted(&self) {
        self.tasks_submitted.fetch_add(1, Ordering::SeqCst);
    }

    /// Record one advance step.
    #[inline]
    pub fn record_step(&self) {
        self.steps_taken.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a task leaving the live set.
    #[inline]
    pub fn record_completed(&self, success: bool) {
        if success {
            self.tasks_completed.fetch_add(1, Ordering::SeqCst);
        } else {
            self.tasks_failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Record a cancelled task.
    #[inline]
    pub fn record_cancelled(&self) {
        self.tasks_cancelled.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a wake.
    #[inline]
    pub fn record_wake(&self, delivered: bool) {
        if delivered {
            self.wakes_delivered.fetch_add(1, Ordering::SeqCst);
        } else {
            self.wakes_suppressed.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Record an idle loop iteration.
    #[inline]
    pub fn record_idle_spin(&self) {
        self.idle_spins.fetch_add(1, Ordering::SeqCst);
    }

    /// Fraction of wakes that actually enqueued an id.
    pub fn wake_delivery_rate(&self) -> f64 {
        let delivered = self.wakes_delivered.load(Ordering::SeqCst);
        let suppressed = self.wakes_suppressed.load(Ordering::SeqCst);
        let total = delivered + suppressed;
        if total == 0 {
            return 1.0;
        }
        delivered as f64 / total as f64
    }
}
