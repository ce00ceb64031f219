use convoy::batch::{Outcome, Task, TaskState};
use convoy::task::spawn;
use convoy::time::{sleep, timeout};
use convoy::{CancellationToken, Error, Scheduler, submit};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

fn sleeper(ms: u64) -> Task<u64, String> {
    Task::new(move |_token| async move {
        sleep(Duration::from_millis(ms)).await;
        Ok(ms)
    })
}

#[convoy::test]
async fn cancelling_after_settlement_is_a_no_op() {
    let batch = submit(vec![sleeper(5)], 1).unwrap();
    let token = batch.token().clone();
    let task = batch.tasks()[0].clone();

    let outcomes = batch.all_settled().await;

    token.cancel();

    assert_eq!(outcomes, vec![Outcome::Fulfilled(5)]);
    assert_eq!(task.state(), TaskState::Fulfilled);
    assert!(matches!(
        task.request_cancel(),
        Err(Error::AlreadySettled { state: TaskState::Fulfilled, .. })
    ));
}

#[convoy::test]
async fn batch_cancel_stops_running_and_backlogged_tasks() {
    let hooks = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let hooks = hooks.clone();
            sleeper(10_000).on_cancel(move || {
                hooks.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    let batch = submit(tasks, 2).unwrap();
    sleep(Duration::from_millis(20)).await;

    batch.cancel();
    batch.cancel();

    let outcomes = timeout(Duration::from_secs(1), batch.all_settled())
        .await
        .unwrap();

    assert_eq!(outcomes, vec![Outcome::Cancelled; 4]);
    // Only the two running tasks had a hook to interrupt.
    assert_eq!(hooks.load(Ordering::SeqCst), 2);
}

#[convoy::test]
async fn backlogged_task_cancel_is_reported_without_waiting_for_a_slot() {
    let batch = submit(vec![sleeper(500), sleeper(10)], 1).unwrap();
    let queued = batch.tasks()[1].clone();

    queued.request_cancel().unwrap();
    sleep(Duration::from_millis(20)).await;

    let progress = batch.progress();
    assert_eq!(progress.settled, 1);
    assert_eq!(progress.backlog, 0);
    assert_eq!(progress.running, 1);

    let first = timeout(Duration::from_millis(150), batch.first_settled()).await;
    assert_eq!(first, Ok(Outcome::Cancelled));
}

#[convoy::test]
async fn cancelling_one_task_leaves_its_siblings_alone() {
    let batch = submit(vec![sleeper(50), sleeper(50), sleeper(50)], 3).unwrap();

    batch.tasks()[1].request_cancel().unwrap();

    assert_eq!(
        batch.all_settled().await,
        vec![Outcome::Fulfilled(50), Outcome::Cancelled, Outcome::Fulfilled(50)]
    );
}

#[convoy::test]
async fn caller_token_cancels_the_batch_but_not_the_reverse() {
    let shutdown = CancellationToken::new();
    let scheduler = Scheduler::new().cancel_with(&shutdown);

    let first = scheduler.submit(vec![sleeper(10_000)], 1).unwrap();
    first.cancel();
    assert!(!shutdown.is_cancelled());
    assert_eq!(first.all_settled().await, vec![Outcome::Cancelled]);

    let second = scheduler.submit(vec![sleeper(10_000), sleeper(10_000)], 1).unwrap();
    shutdown.cancel();
    assert_eq!(
        second.all_settled().await,
        vec![Outcome::Cancelled, Outcome::Cancelled]
    );
}

#[convoy::test]
async fn operations_observe_their_token() {
    let observed = Arc::new(AtomicBool::new(false));

    let flag = observed.clone();
    let task: Task<(), String> = Task::new(move |token| async move {
        spawn(async move {
            token.cancelled().await;
            flag.store(true, Ordering::SeqCst);
        });

        sleep(Duration::from_secs(10)).await;
        Ok(())
    });

    let batch = submit(vec![task], 1).unwrap();
    sleep(Duration::from_millis(20)).await;
    batch.cancel();

    assert_eq!(batch.all_settled().await, vec![Outcome::Cancelled]);

    sleep(Duration::from_millis(20)).await;
    assert!(observed.load(Ordering::SeqCst));
}

#[convoy::test]
async fn dropping_the_handle_does_not_cancel() {
    let done = Arc::new(AtomicBool::new(false));

    let flag = done.clone();
    let task: Task<(), String> = Task::new(move |_token| async move {
        sleep(Duration::from_millis(20)).await;
        flag.store(true, Ordering::SeqCst);
        Ok(())
    });

    drop(submit(vec![task], 1).unwrap());
    sleep(Duration::from_millis(80)).await;

    assert!(done.load(Ordering::SeqCst));
}
