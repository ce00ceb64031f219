use convoy::batch::{Outcome, Rejection, Task, TaskState};
use convoy::time::sleep;
use convoy::{Scheduler, submit, with_deadline};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

fn sleeper(ms: u64) -> Task<u64, String> {
    Task::new(move |_token| async move {
        sleep(Duration::from_millis(ms)).await;
        Ok(ms)
    })
}

fn timed_out<T>(ms: u64) -> Outcome<T, String> {
    Outcome::Rejected(Rejection::Timeout {
        after: Duration::from_millis(ms),
    })
}

#[convoy::test]
async fn deadline_rejects_a_slow_operation() {
    let mut task = with_deadline(sleeper(100), Duration::from_millis(50));
    let token = task.token().clone();

    let outcome = task.start().unwrap().await;

    assert_eq!(outcome, timed_out(50));
    assert!(outcome.is_timeout());
    assert_eq!(task.state(), TaskState::Rejected);
    assert!(token.is_cancelled());
}

#[convoy::test]
async fn deadline_has_no_effect_on_a_fast_operation() {
    let mut task = with_deadline(sleeper(10), Duration::from_millis(50));
    let handle = task.handle();

    assert_eq!(task.start().unwrap().await, Outcome::Fulfilled(10));

    sleep(Duration::from_millis(80)).await;

    assert_eq!(handle.state(), TaskState::Fulfilled);
    assert!(!task.token().is_cancelled());
}

#[convoy::test]
async fn deadline_runs_the_cancel_hook() {
    let hooked = Arc::new(AtomicBool::new(false));

    let flag = hooked.clone();
    let task = with_deadline(sleeper(200), Duration::from_millis(20)).on_cancel(move || {
        flag.store(true, Ordering::SeqCst);
    });

    assert_eq!(submit(vec![task], 1).unwrap().all_settled().await, vec![timed_out(20)]);
    assert!(hooked.load(Ordering::SeqCst));
}

#[convoy::test]
async fn batch_deadline_expires_running_and_backlogged_tasks() {
    let batch = Scheduler::new()
        .batch_deadline(Duration::from_millis(50))
        .submit(vec![sleeper(10), sleeper(200), sleeper(200)], 1)
        .unwrap();

    assert_eq!(
        batch.all_settled().await,
        vec![Outcome::Fulfilled(10), timed_out(50), timed_out(50)]
    );
}

#[convoy::test]
async fn batch_deadline_after_completion_changes_nothing() {
    let batch = Scheduler::new()
        .batch_deadline(Duration::from_millis(30))
        .submit(vec![sleeper(5), sleeper(5)], 2)
        .unwrap();
    let tasks = batch.tasks().to_vec();

    assert_eq!(
        batch.all_settled().await,
        vec![Outcome::Fulfilled(5), Outcome::Fulfilled(5)]
    );

    sleep(Duration::from_millis(60)).await;
    assert!(tasks.iter().all(|task| task.state() == TaskState::Fulfilled));
}
