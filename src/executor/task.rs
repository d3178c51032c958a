//! Task definitions for the executor.
//!
//! This module defines task slots that can be submitted to and advanced by
//! the executor loop, together with the step result and failure types.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{
    atomic::{AtomicBool, AtomicU8, Ordering},
    Arc,
};

use super::waker::WakerHandle;

/// Unique task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub usize);

impl TaskId {
    /// Get the inner value.
    #[inline]
    pub fn inner(&self) -> usize {
        self.0
    }
}

impl From<usize> for TaskId {
    fn from(val: usize) -> Self {
        Self(val)
    }
}

impl From<TaskId> for usize {
    fn from(val: TaskId) -> Self {
        val.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "Task({})", self.0)
    }
}

/// Task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Task is queued for its first advance.
    Ready,
    /// Task is currently being advanced.
    Running,
    /// Task yielded and is waiting for its waker to fire.
    Suspended,
    /// Task has completed successfully.
    Finished,
    /// Task has failed.
    Failed,
    /// Task was cancelled.
    Cancelled,
}

impl TaskState {
    /// Convert from u8 (for atomic storage).
    #[inline]
    pub fn from_u8(val: u8) -> Self {
        match val {
            0 => TaskState::Ready,
            1 => TaskState::Running,
            2 => TaskState::Suspended,
            3 => TaskState::Finished,
            4 => TaskState::Failed,
            5 => TaskState::Cancelled,
            _ => TaskState::Ready,
        }
    }

    /// Convert to u8 (for atomic storage).
    #[inline]
    pub fn as_u8(&self) -> u8 {
        match self {
            TaskState::Ready => 0,
            TaskState::Running => 1,
            TaskState::Suspended => 2,
            TaskState::Finished => 3,
            TaskState::Failed => 4,
            TaskState::Cancelled => 5,
        }
    }
}

/// Failure attached to a single task. Never propagated to other tasks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The computation signalled an error.
    #[error("task failed: {0}")]
    Failed(String),
    /// The computation panicked during an advance.
    #[error("task panicked: {0}")]
    Panicked(String),
    /// The executor exhausted the configured step budget for this task.
    #[error("task exceeded its step budget of {0}")]
    StepBudgetExhausted(usize),
    /// The task was cancelled before it completed.
    #[error("task was cancelled")]
    Cancelled,
}

/// Result of advancing a computation by one step.
#[derive(Debug)]
pub enum Step<T> {
    /// The computation finished and produced its output.
    Complete(T),
    /// The computation yielded; it will re-enqueue itself via its waker.
    Suspend,
}

/// Final outcome of a task.
pub type TaskOutcome<T> = Result<T, TaskError>;

/// A resumable computation: advanced one step at a time, given a waker
/// handle to re-schedule itself with after suspending.
pub type Computation<T> = Box<dyn FnMut(&WakerHandle) -> Result<Step<T>, TaskError> + Send>;

/// Outcome of one [`TaskSlot::advance`] call, as seen by the executor loop.
pub(crate) enum Advance<T> {
    /// The task left the live set with this outcome.
    Completed(TaskOutcome<T>),
    /// The task suspended; its waker will re-enqueue it later.
    Suspended,
}

/// A slot holding one task's suspended computation.
pub struct TaskSlot<T> {
    /// Unique task ID.
    id: TaskId,
    /// Task name for debugging.
    name: String,
    /// Current state (atomic for thread-safe access).
    state: AtomicU8,
    /// The suspended computation. `None` once the task has completed.
    computation: Option<Computation<T>>,
    /// Wake gate shared with every waker handle minted for this task.
    /// `true` while the id sits in the wake queue.
    queued: Arc<AtomicBool>,
    /// Number of advances taken so far.
    steps: usize,
}

impl<T> std::fmt::Debug for TaskSlot<T> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TaskSlot")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state())
            .field("steps", &self.steps)
            .finish()
    }
}

impl<T> TaskSlot<T> {
    /// Create a new slot for a freshly submitted computation.
    ///
    /// The slot starts in `Ready` state with its wake gate set: the
    /// executor enqueues the id at submit time, so the task is already
    /// "queued" from the waker's point of view.
    pub(crate) fn new(
        id: TaskId,
        computation: Computation<T>,
    ) -> Self {
        Self {
            id,
            name: format!("Task({})", id.inner()),
            state: AtomicU8::new(TaskState::Ready as u8),
            computation: Some(computation),
            queued: Arc::new(AtomicBool::new(true)),
            steps: 0,
        }
    }

    /// Get the task ID.
    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Get the task name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current state.
    #[inline]
    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Set the task state.
    #[inline]
    pub fn set_state(
        &self,
        state: TaskState,
    ) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }

    /// Number of advances this task has taken.
    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Shared wake gate for this task's waker handles.
    #[inline]
    pub(crate) fn queued_flag(&self) -> Arc<AtomicBool> {
        self.queued.clone()
    }

    /// Re-arm the wake gate. Called by the executor right before an
    /// advance, so a wake that fires during the advance enqueues again.
    #[inline]
    pub(crate) fn clear_queued(&self) {
        self.queued.store(false, Ordering::SeqCst);
    }

    /// Advance the computation by one step.
    ///
    /// A panic inside the computation is caught (when `catch_panics` is
    /// set) and converted into a [`TaskError::Panicked`] outcome for this
    /// task only.
    pub(crate) fn advance(
        &mut self,
        waker: &WakerHandle,
        catch_panics: bool,
    ) -> Advance<T> {
        let Some(mut computation) = self.computation.take() else {
            // A settled slot must never linger in the live set; settle it
            // as a failure rather than suspending it forever.
            self.set_state(TaskState::Failed);
            return Advance::Completed(Err(TaskError::Failed(
                "advanced after its computation was consumed".into(),
            )));
        };

        self.set_state(TaskState::Running);
        self.steps += 1;

        let stepped = if catch_panics {
            panic::catch_unwind(AssertUnwindSafe(|| computation(waker)))
        } else {
            Ok(computation(waker))
        };

        match stepped {
            Ok(Ok(Step::Complete(value))) => {
                self.set_state(TaskState::Finished);
                Advance::Completed(Ok(value))
            }
            Ok(Ok(Step::Suspend)) => {
                self.computation = Some(computation);
                self.set_state(TaskState::Suspended);
                Advance::Suspended
            }
            Ok(Err(err)) => {
                self.set_state(TaskState::Failed);
                Advance::Completed(Err(err))
            }
            Err(payload) => {
                self.set_state(TaskState::Failed);
                Advance::Completed(Err(TaskError::Panicked(panic_message(payload.as_ref()))))
            }
        }
    }

    /// Fail the task without advancing it (step budget enforcement).
    pub(crate) fn fail(
        &mut self,
        err: TaskError,
    ) -> Advance<T> {
        self.computation = None;
        self.set_state(TaskState::Failed);
        Advance::Completed(Err(err))
    }
}

/// Extract a readable message from a panic payload.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Iterator for generating task IDs.
#[derive(Debug)]
pub struct TaskIdGenerator {
    next_id: usize,
}

impl TaskIdGenerator {
    /// Create a new task ID generator.
    #[inline]
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Generate the next task ID.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        TaskId(id)
    }
}

impl Default for TaskIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
