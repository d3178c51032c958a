//! Adapter from standard `Future`s to step computations.
//!
//! A pinned future becomes a computation whose single advance step is one
//! `poll` call: `Poll::Ready` maps to [`Step::Complete`], `Poll::Pending`
//! to [`Step::Suspend`]. The poll context's waker is backed by the task's
//! [`WakerHandle`], so anything that clones and wakes the standard waker
//! re-enqueues the task as usual.

use std::future::Future;
use std::task::{Context, Poll};

use super::task::{Computation, Step};
use super::waker::WakerHandle;

/// Wrap a future into a resumable step computation.
pub fn future_computation<T, F>(future: F) -> Computation<T>
where
    F: Future<Output = T> + Send + 'static,
    T: 'static,
{
    let mut future = Box::pin(future);
    Box::new(move |handle: &WakerHandle| {
        let waker = handle.to_waker();
        let mut cx = Context::from_waker(&waker);
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(value) => Ok(Step::Complete(value)),
            Poll::Pending => Ok(Step::Suspend),
        }
    })
}
