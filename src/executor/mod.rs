//! Cooperative single-threaded task executor
//!
//! This module provides the [`Executor`], a waker-driven poll loop that
//! drives submitted step computations to completion. Suspended tasks hold a
//! [`WakerHandle`]; firing it re-enqueues the task id onto the shared
//! [`WakeQueue`], and the executor drains that queue once per iteration and
//! advances each drained task by one step.

pub mod future;
pub mod queue;
pub mod stats;
pub mod task;
pub mod waker;

pub use future::future_computation;
pub use queue::{DrainBatch, WakeQueue};
pub use stats::ExecutorStats;
pub use task::{
    Computation, Step, TaskError, TaskId, TaskIdGenerator, TaskOutcome, TaskSlot, TaskState,
};
pub use waker::WakerHandle;

use std::future::Future;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use task::Advance;

/// Executor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// How long to park when the wake queue is empty but suspended tasks
    /// remain (an external waker may fire from another thread).
    pub idle_timeout: Duration,
    /// Give up after this many consecutive idle iterations with no
    /// progress. `None` waits indefinitely.
    pub stall_limit: Option<usize>,
    /// Catch panics inside a task's advance and convert them into a
    /// per-task failure. When disabled, a panic unwinds out of
    /// [`Executor::run_until_complete`].
    pub catch_panics: bool,
    /// Fail a task once it has been advanced this many times. Guards
    /// against runaway self-waking tasks. `None` disables the budget.
    pub max_steps: Option<usize>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_millis(1),
            stall_limit: None,
            catch_panics: true,
            max_steps: None,
        }
    }
}

/// Fatal executor failures.
///
/// Per-task failures are *not* represented here; they are isolated into the
/// failing task's [`TaskOutcome`]. These errors terminate the run loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    /// The exactly-once scheduling invariant was broken: a drained id
    /// referred to a task still marked running.
    #[error("wake queue corrupted: {id} drained while still running")]
    WakeQueueCorrupted {
        /// The task observed in running state.
        id: TaskId,
    },
    /// Suspended tasks remain but no waker fired within the configured
    /// stall limit.
    #[error("executor stalled with {} suspended task(s) and no pending wakes", pending.len())]
    Stalled {
        /// Ids of the tasks still suspended when the executor gave up.
        pending: Vec<TaskId>,
    },
}

/// Waker-driven executor for step computations producing values of type `T`.
///
/// The executor itself is single-threaded: it is the only consumer of the
/// wake queue and the only code that advances tasks. Waker handles may be
/// cloned onto other threads and fired concurrently.
#[derive(Debug)]
pub struct Executor<T> {
    /// Configuration.
    config: ExecutorConfig,
    /// Shared wake queue (the only shared mutable resource).
    queue: Arc<WakeQueue>,
    /// Live task set, in submission order.
    tasks: IndexMap<TaskId, TaskSlot<T>>,
    /// Outcomes of tasks that left the live set.
    outcomes: IndexMap<TaskId, TaskOutcome<T>>,
    /// Task ID generator.
    id_generator: TaskIdGenerator,
    /// Statistics.
    stats: Arc<ExecutorStats>,
}

impl<T: Send + 'static> Executor<T> {
    /// Create a new executor with default config.
    #[inline]
    pub fn new() -> Self {
        Self::with_config(ExecutorConfig::default())
    }

    /// Create an executor with custom configuration.
    pub fn with_config(config: ExecutorConfig) -> Self {
        Self {
            config,
            queue: Arc::new(WakeQueue::new()),
            tasks: IndexMap::new(),
            outcomes: IndexMap::new(),
            id_generator: TaskIdGenerator::new(),
            stats: Arc::new(ExecutorStats::default()),
        }
    }

    /// Submit a step computation; it is enqueued for its first advance.
    pub fn submit<F>(
        &mut self,
        computation: F,
    ) -> TaskId
    where
        F: FnMut(&WakerHandle) -> Result<Step<T>, TaskError> + Send + 'static,
    {
        self.submit_boxed(Box::new(computation))
    }

    /// Submit an already boxed computation.
    pub fn submit_boxed(
        &mut self,
        computation: Computation<T>,
    ) -> TaskId {
        let id = self.id_generator.next();
        let slot = TaskSlot::new(id, computation);
        self.tasks.insert(id, slot);
        // The slot's wake gate starts set, matching this initial enqueue.
        self.queue.push(id);
        self.stats.record_submitted();
        debug!("submitted {}", id);
        id
    }

    /// Submit a standard future, driven one `poll` per advance.
    pub fn spawn_future<F>(
        &mut self,
        future: F,
    ) -> TaskId
    where
        F: Future<Output = T> + Send + 'static,
    {
        self.submit_boxed(future_computation(future))
    }

    /// Drive all live tasks until the live set is empty.
    ///
    /// Each iteration drains the wake queue and advances the drained tasks
    /// in FIFO order. Tasks that complete (or fail) leave the live set;
    /// suspended tasks are left alone until their waker fires. When the
    /// drain comes back empty the loop parks for
    /// [`ExecutorConfig::idle_timeout`] and tries again, counting idle
    /// iterations against [`ExecutorConfig::stall_limit`].
    ///
    /// Per-task failures (errors, panics) are isolated into that task's
    /// outcome; only fatal conditions surface as `Err` here.
    pub fn run_until_complete(&mut self) -> Result<(), ExecutorError> {
        let mut idle_spins = 0usize;

        while !self.tasks.is_empty() {
            let drained = self.queue.pop_all();

            if drained.is_empty() {
                // Suspended tasks remain; an external waker may still fire.
                self.stats.record_idle_spin();
                idle_spins += 1;
                if let Some(limit) = self.config.stall_limit {
                    if idle_spins >= limit {
                        let pending: Vec<TaskId> = self.tasks.keys().copied().collect();
                        error!(
                            "giving up after {} idle iterations; {} task(s) still suspended",
                            idle_spins,
                            pending.len()
                        );
                        return Err(ExecutorError::Stalled { pending });
                    }
                }
                thread::sleep(self.config.idle_timeout);
                continue;
            }

            idle_spins = 0;
            trace!("drained {} ready id(s)", drained.len());
            for id in drained {
                self.advance_one(id)?;
            }
        }

        debug!("all tasks settled, executor idle");
        Ok(())
    }

    /// Advance a single drained task by one step.
    fn advance_one(
        &mut self,
        id: TaskId,
    ) -> Result<(), ExecutorError> {
        let Some(slot) = self.tasks.get_mut(&id) else {
            // Late wake for a task that already completed or was cancelled.
            trace!("ignoring wake for settled {}", id);
            return Ok(());
        };

        if slot.state() == TaskState::Running {
            // Defensive invariant check: the loop is the only code that
            // advances tasks, so a drained id can only be observed mid-
            // advance if an unwind escaped a previous advance or something
            // external corrupted the queue. Exactly-once scheduling is
            // gone either way, which is fatal.
            error!("{} drained while still running, aborting run loop", id);
            return Err(ExecutorError::WakeQueueCorrupted { id });
        }

        // Re-arm the wake gate before polling so a wake that lands during
        // the advance enqueues the id for the next iteration.
        slot.clear_queued();

        let advance = if let Some(max) = self.config.max_steps.filter(|max| slot.steps() >= *max) {
            slot.fail(TaskError::StepBudgetExhausted(max))
        } else {
            self.stats.record_step();
            let handle = WakerHandle::new(
                id,
                self.queue.clone(),
                slot.queued_flag(),
                self.stats.clone(),
            );
            slot.advance(&handle, self.config.catch_panics)
        };

        match advance {
            Advance::Completed(outcome) => {
                match &outcome {
                    Ok(_) => debug!("{} completed after {} step(s)", id, slot.steps()),
                    Err(err) => debug!("{} failed: {}", id, err),
                }
                self.stats.record_completed(outcome.is_ok());
                self.tasks.shift_remove(&id);
                self.outcomes.insert(id, outcome);
            }
            Advance::Suspended => {
                trace!("{} suspended", id);
            }
        }

        Ok(())
    }

    /// Cancel a live task, discarding its suspended state.
    ///
    /// Best-effort abandonment: the computation receives no signal, its
    /// state is simply dropped. Returns `false` if the task already
    /// settled.
    pub fn cancel(
        &mut self,
        id: TaskId,
    ) -> bool {
        match self.tasks.shift_remove(&id) {
            Some(_) => {
                debug!("cancelled {}", id);
                self.stats.record_cancelled();
                self.outcomes.insert(id, Err(TaskError::Cancelled));
                true
            }
            None => false,
        }
    }

    /// Current state of a task, live or settled.
    pub fn state(
        &self,
        id: TaskId,
    ) -> Option<TaskState> {
        if let Some(slot) = self.tasks.get(&id) {
            return Some(slot.state());
        }
        self.outcomes.get(&id).map(|outcome| match outcome {
            Ok(_) => TaskState::Finished,
            Err(TaskError::Cancelled) => TaskState::Cancelled,
            Err(_) => TaskState::Failed,
        })
    }

    /// Borrow a settled task's outcome.
    #[inline]
    pub fn outcome(
        &self,
        id: TaskId,
    ) -> Option<&TaskOutcome<T>> {
        self.outcomes.get(&id)
    }

    /// Take ownership of a settled task's outcome.
    #[inline]
    pub fn take_outcome(
        &mut self,
        id: TaskId,
    ) -> Option<TaskOutcome<T>> {
        self.outcomes.shift_remove(&id)
    }

    /// Number of tasks still live (ready or suspended).
    #[inline]
    pub fn live_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Number of ids currently sitting in the wake queue.
    #[inline]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Get statistics.
    #[inline]
    pub fn stats(&self) -> &Arc<ExecutorStats> {
        &self.stats
    }

    /// Get the configuration.
    #[inline]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Force a live task's state to `Running`, to exercise the queue
    /// integrity check from tests.
    #[cfg(test)]
    pub(crate) fn mark_running(
        &self,
        id: TaskId,
    ) {
        if let Some(slot) = self.tasks.get(&id) {
            slot.set_state(TaskState::Running);
        }
    }
}

impl<T: Send + 'static> Default for Executor<T> {
    fn default() -> Self {
        Self::new()
    }
}
