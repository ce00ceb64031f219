use convoy::batch::{Failure, Outcome, Rejection, Task};
use convoy::submit;
use convoy::time::{sleep, timeout};

use std::time::Duration;

fn delayed<T: Send + 'static>(ms: u64, result: Result<T, &'static str>) -> Task<T, &'static str> {
    Task::new(move |_token| async move {
        sleep(Duration::from_millis(ms)).await;
        result
    })
}

fn rejected<T>(reason: &'static str) -> Outcome<T, &'static str> {
    Outcome::Rejected(Rejection::Error(reason))
}

#[convoy::test]
async fn all_settled_follows_submission_order() {
    let tasks = [300, 100, 200].map(|ms| delayed(ms, Ok(ms)));

    let outcomes = submit(tasks, 3).unwrap().all_settled().await;

    assert_eq!(
        outcomes,
        vec![
            Outcome::Fulfilled(300),
            Outcome::Fulfilled(100),
            Outcome::Fulfilled(200),
        ]
    );
}

#[convoy::test]
async fn one_failure_does_not_erase_the_others() {
    let cancelled = delayed(10, Ok(3));
    cancelled.request_cancel().unwrap();

    let tasks = vec![delayed(30, Ok(1)), delayed(10, Err("boom")), cancelled];

    let outcomes = submit(tasks, 2).unwrap().all_settled().await;

    assert_eq!(
        outcomes,
        vec![Outcome::Fulfilled(1), rejected("boom"), Outcome::Cancelled]
    );
}

#[convoy::test]
async fn first_fulfilled_skips_rejections() {
    let tasks = vec![delayed(10, Err("a")), delayed(20, Err("b")), delayed(40, Ok("c"))];

    assert_eq!(submit(tasks, 3).unwrap().first_fulfilled().await, Ok("c"));
}

#[convoy::test]
async fn first_fulfilled_ignores_later_outcomes() {
    let tasks = vec![delayed(80, Err("a")), delayed(10, Ok("fast")), delayed(40, Ok("slow"))];

    assert_eq!(submit(tasks, 3).unwrap().first_fulfilled().await, Ok("fast"));
}

#[convoy::test]
async fn first_fulfilled_lists_every_reason_in_submission_order() {
    let tasks: Vec<Task<(), _>> = vec![delayed(40, Err("a")), delayed(10, Err("b"))];

    let failure = submit(tasks, 2).unwrap().first_fulfilled().await.unwrap_err();

    assert_eq!(failure.errors().copied().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(
        failure.reasons(),
        &[
            Failure::Rejected(Rejection::Error("a")),
            Failure::Rejected(Rejection::Error("b")),
        ]
    );
}

#[convoy::test]
async fn first_fulfilled_on_an_empty_batch_fails_at_once() {
    let failure = submit::<u8, &str, _>(Vec::new(), 1)
        .unwrap()
        .first_fulfilled()
        .await
        .unwrap_err();

    assert!(failure.is_empty());
}

#[convoy::test]
async fn first_settled_takes_the_earliest_outcome() {
    let tasks = vec![delayed(100, Ok(1)), delayed(10, Err("fast"))];

    assert_eq!(submit(tasks, 2).unwrap().first_settled().await, rejected("fast"));
}

#[convoy::test]
async fn first_settled_on_an_empty_batch_never_resolves() {
    let batch = submit::<u8, &str, _>(Vec::new(), 1).unwrap();

    assert!(timeout(Duration::from_millis(100), batch.first_settled()).await.is_err());
}

#[convoy::test]
async fn all_settled_on_an_empty_batch_is_empty() {
    let batch = submit::<u8, &str, _>(Vec::new(), 4).unwrap();

    assert!(batch.is_empty());
    assert!(batch.all_settled().await.is_empty());
}
