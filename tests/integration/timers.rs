//! Cross-thread wakes: waker handles fired from background threads.

use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use steplight::{Executor, Step, WakerHandle};

/// Submit `count` tasks that each hand their waker to a background timer
/// thread and suspend; the timers fire after staggered delays.
#[test]
fn staggered_timer_threads_wake_every_task() {
    let mut executor = Executor::new();
    let (tx, rx) = mpsc::channel::<(usize, WakerHandle)>();

    let count = 5usize;
    let mut ids = Vec::new();
    for i in 0..count {
        let tx = tx.clone();
        let mut parked = false;
        ids.push(executor.submit(move |waker| {
            if !parked {
                parked = true;
                tx.send((i, waker.clone())).unwrap();
                Ok(Step::Suspend)
            } else {
                Ok(Step::Complete(i))
            }
        }));
    }
    drop(tx);

    let timer = thread::spawn(move || {
        let mut handles: Vec<_> = (0..count).map(|_| rx.recv().unwrap()).collect();
        // Fire in reverse submission order, staggered.
        handles.sort_by_key(|(i, _)| std::cmp::Reverse(*i));
        for (_, handle) in handles {
            thread::sleep(Duration::from_millis(2));
            handle.wake();
        }
    });

    executor.run_until_complete().unwrap();
    timer.join().unwrap();

    for (i, id) in ids.into_iter().enumerate() {
        assert_eq!(executor.take_outcome(id), Some(Ok(i)));
    }
}

#[test]
fn redundant_timer_wakes_are_suppressed_not_fatal() {
    let mut executor = Executor::new();
    let (tx, rx) = mpsc::channel::<WakerHandle>();

    let mut parked = false;
    let id = executor.submit(move |waker| {
        if !parked {
            parked = true;
            tx.send(waker.clone()).unwrap();
            Ok(Step::Suspend)
        } else {
            Ok(Step::Complete(1))
        }
    });

    let timer = thread::spawn(move || {
        let handle = rx.recv().unwrap();
        thread::sleep(Duration::from_millis(3));
        // Hammer the waker; only the first wake per suspension lands.
        for _ in 0..10 {
            handle.wake();
        }
    });

    executor.run_until_complete().unwrap();
    timer.join().unwrap();

    assert_eq!(executor.take_outcome(id), Some(Ok(1)));
    let stats = executor.stats();
    let delivered = stats.wakes_delivered.load(Ordering::SeqCst);
    let suppressed = stats.wakes_suppressed.load(Ordering::SeqCst);
    assert_eq!(delivered + suppressed, 10);
    assert!(suppressed >= 8);
}
