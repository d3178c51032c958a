//! End-to-end lifecycle scenarios through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use steplight::{Executor, Step, TaskState};

#[test]
fn mixed_workload_settles_every_task() {
    steplight::util::logger::init();

    let mut executor = Executor::new();
    let advances = Arc::new(AtomicUsize::new(0));

    // A spread of immediate and multi-step tasks.
    let mut ids = Vec::new();
    for i in 0..20usize {
        let advances = advances.clone();
        let mut remaining = i % 4;
        ids.push(executor.submit(move |waker| {
            advances.fetch_add(1, Ordering::SeqCst);
            if remaining > 0 {
                remaining -= 1;
                waker.wake();
                Ok(Step::Suspend)
            } else {
                Ok(Step::Complete(i))
            }
        }));
    }

    executor.run_until_complete().unwrap();

    for (i, id) in ids.into_iter().enumerate() {
        assert_eq!(executor.state(id), Some(TaskState::Finished));
        assert_eq!(executor.take_outcome(id), Some(Ok(i)));
    }
    assert_eq!(executor.live_tasks(), 0);
    assert_eq!(executor.queue_len(), 0);
    // 20 tasks yielding 0..=3 times each: 5 * (1 + 2 + 3 + 4) advances.
    assert_eq!(advances.load(Ordering::SeqCst), 50);

    let stats = executor.stats();
    assert_eq!(stats.tasks_submitted.load(Ordering::SeqCst), 20);
    assert_eq!(stats.tasks_completed.load(Ordering::SeqCst), 20);
    assert_eq!(stats.steps_taken.load(Ordering::SeqCst), 50);
}

#[test]
fn futures_and_step_tasks_share_one_executor() {
    async fn double(x: u32) -> u32 {
        x * 2
    }

    let mut executor = Executor::new();
    let from_future = executor.spawn_future(double(21));
    let from_step = executor.submit(|_| Ok(Step::Complete(11)));

    executor.run_until_complete().unwrap();

    assert_eq!(executor.take_outcome(from_future), Some(Ok(42)));
    assert_eq!(executor.take_outcome(from_step), Some(Ok(11)));
}

#[test]
fn executor_is_reusable_after_a_run() {
    let mut executor = Executor::new();
    let first = executor.submit(|_| Ok(Step::Complete(1)));
    executor.run_until_complete().unwrap();

    let second = executor.submit(|_| Ok(Step::Complete(2)));
    executor.run_until_complete().unwrap();

    assert_eq!(executor.take_outcome(first), Some(Ok(1)));
    assert_eq!(executor.take_outcome(second), Some(Ok(2)));
    assert_ne!(first, second);
}
