//! Waker adapter for suspended tasks.
//!
//! A [`WakerHandle`] lets a suspended computation signal "I am ready to
//! make progress" without touching executor internals. It captures only a
//! task id, the shared wake queue and the task's wake gate; it has no
//! access to the task's data.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::task::{Wake, Waker};

use tracing::trace;

use super::queue::WakeQueue;
use super::stats::ExecutorStats;
use super::task::TaskId;

/// Capability handle that re-enqueues one task's id onto the wake queue.
///
/// Cloneable and sendable to other threads (e.g. a timer thread). Waking is
/// idempotent per suspension: the wake gate suppresses duplicate enqueues
/// until the executor re-arms it right before the next advance.
#[derive(Debug, Clone)]
pub struct WakerHandle {
    /// Id of the task this handle wakes.
    id: TaskId,
    /// Shared wake queue (producer side).
    queue: Arc<WakeQueue>,
    /// Wake gate shared with the task slot; `true` while the id is queued.
    queued: Arc<AtomicBool>,
    /// Executor statistics, for wake accounting.
    stats: Arc<ExecutorStats>,
}

impl WakerHandle {
    /// Create a handle for the given task.
    pub(crate) fn new(
        id: TaskId,
        queue: Arc<WakeQueue>,
        queued: Arc<AtomicBool>,
        stats: Arc<ExecutorStats>,
    ) -> Self {
        Self {
            id,
            queue,
            queued,
            stats,
        }
    }

    /// Id of the task this handle wakes.
    #[inline]
    pub fn task_id(&self) -> TaskId {
        self.id
    }

    /// Request that the task be advanced again.
    ///
    /// Returns `true` if the id was enqueued, `false` if the task was
    /// already queued and the wake was suppressed as a duplicate.
    pub fn wake(&self) -> bool {
        if self.queued.swap(true, Ordering::SeqCst) {
            trace!("duplicate wake suppressed for {}", self.id);
            self.stats.record_wake(false);
            return false;
        }
        trace!("wake delivered for {}", self.id);
        self.queue.push(self.id);
        self.stats.record_wake(true);
        true
    }

    /// Build a standard [`Waker`] backed by this handle, for driving
    /// ordinary `Future`s through the executor.
    pub fn to_waker(&self) -> Waker {
        Waker::from(Arc::new(self.clone()))
    }
}

impl Wake for WakerHandle {
    fn wake(self: Arc<Self>) {
        WakerHandle::wake(&self);
    }

    fn wake_by_ref(self: &Arc<Self>) {
        WakerHandle::wake(self);
    }
}
