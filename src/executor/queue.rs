//! Wake queue for the executor
//!
//! Multi-producer, single-consumer queue of ready task ids.

use std::collections::VecDeque;

use parking_lot::Mutex;
use smallvec::SmallVec;

use super::task::TaskId;

/// Batch of task ids drained in one executor iteration.
pub type DrainBatch = SmallVec<[TaskId; 8]>;

/// A thread-safe FIFO queue of task ids ready to be advanced.
///
/// Wakers push from any thread; the executor loop is the only consumer.
/// The mutex serializes concurrent pushes so the consumer never observes a
/// partially written batch.
#[derive(Debug, Default)]
pub struct WakeQueue {
    /// Inner deque protected by mutex
    inner: Mutex<VecDeque<TaskId>>,
}

impl WakeQueue {
    /// Create a new empty wake queue.
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Push a task id to the back of the queue.
    ///
    /// Safe to call from any thread, including while the executor is
    /// draining; the id lands in the next batch.
    #[inline]
    pub fn push(
        &self,
        id: TaskId,
    ) {
        let mut inner = self.inner.lock();
        inner.push_back(id);
    }

    /// Atomically drain all currently queued ids, in FIFO order.
    ///
    /// Used once per executor loop iteration. Ids pushed after the drain
    /// begins are left for the next iteration.
    pub fn pop_all(&self) -> DrainBatch {
        let mut inner = self.inner.lock();
        inner.drain(..).collect()
    }

    /// Get the number of queued ids.
    #[inline]
    pub fn len(&self) -> usize {
        let inner = self.inner.lock();
        inner.len()
    }

    /// Check if the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        let inner = self.inner.lock();
        inner.is_empty()
    }
}
