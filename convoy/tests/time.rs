use convoy::task;
use convoy::time::{sleep, timeout};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[convoy::test]
async fn sleep_waits_at_least_its_duration() {
    let start = Instant::now();
    sleep(Duration::from_millis(50)).await;

    assert!(start.elapsed() >= Duration::from_millis(50));
}

#[convoy::test]
async fn zero_sleep_is_immediate() {
    let start = Instant::now();
    sleep(Duration::ZERO).await;

    assert!(start.elapsed() < Duration::from_millis(10));
}

#[convoy::test]
async fn timeout_returns_the_output_before_the_deadline() {
    let handle = task::spawn(async {
        sleep(Duration::from_millis(10)).await;
        123
    });

    assert_eq!(timeout(Duration::from_millis(200), handle).await, Ok(123));
}

#[convoy::test]
async fn timeout_reports_the_elapsed_deadline() {
    let handle = task::spawn(async {
        sleep(Duration::from_millis(200)).await;
        456
    });

    let elapsed = timeout(Duration::from_millis(20), handle).await.unwrap_err();

    assert_eq!(elapsed.after(), Duration::from_millis(20));
}

#[convoy::test(worker_threads = 1)]
async fn yield_now_lets_other_tasks_run() {
    let flag = Arc::new(AtomicBool::new(false));

    let setter = flag.clone();
    let handle = task::spawn(async move {
        setter.store(true, Ordering::SeqCst);
    });

    while !flag.load(Ordering::SeqCst) {
        convoy::yield_now().await;
    }

    handle.await;
}
