//! Steplight
//!
//! A cooperative single-threaded task executor. Tasks are resumable step
//! computations; each suspended task owns a waker handle that re-enqueues
//! its id onto a shared wake queue, and the executor loop drains that queue
//! and advances tasks one step at a time until every task has completed.
//!
//! # Example
//!
//! ```
//! use steplight::{Executor, Step};
//!
//! let mut executor = Executor::new();
//! let id = executor.submit(|_waker| Ok(Step::Complete(21 * 2)));
//! executor.run_until_complete().unwrap();
//! assert_eq!(executor.take_outcome(id), Some(Ok(42)));
//! ```

#![doc(html_root_url = "https://docs.rs/steplight")]
#![warn(rust_2018_idioms)]

// Public modules
pub mod executor;

// Utility modules
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};
pub use thiserror::Error;

pub use executor::{
    Executor, ExecutorConfig, ExecutorError, ExecutorStats, Step, TaskError, TaskId, TaskState,
    WakerHandle,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "steplight";
