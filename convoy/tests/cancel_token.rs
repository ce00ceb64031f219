use convoy::CancellationToken;
use convoy::task::spawn;
use convoy::time::{sleep, timeout};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[convoy::test]
async fn cancelled_resolves_once_the_token_is_cancelled() {
    let token = CancellationToken::new();

    let waiter = token.clone();
    let handle = spawn(async move {
        waiter.cancelled().await;
        "stopped"
    });

    sleep(Duration::from_millis(10)).await;
    assert!(!handle.is_finished());

    token.cancel();

    assert_eq!(timeout(Duration::from_millis(200), handle).await, Ok("stopped"));
}

#[convoy::test]
async fn cancelled_is_ready_for_an_already_cancelled_token() {
    let token = CancellationToken::new();
    token.cancel();

    assert!(timeout(Duration::from_millis(50), token.cancelled()).await.is_ok());
}

#[convoy::test]
async fn one_token_fans_out_to_every_subscriber() {
    let token = CancellationToken::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let subscriptions: Vec<_> = (0..8)
        .map(|_| {
            let calls = calls.clone();
            token.subscribe(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    let cancel = token.clone();
    spawn(async move { cancel.cancel() }).await;
    token.cancel();

    assert_eq!(calls.load(Ordering::SeqCst), 8);
    drop(subscriptions);
}

#[convoy::test]
async fn child_tokens_observe_their_parent() {
    let parent = CancellationToken::new();
    let child = parent.child_token();
    let grandchild = child.child_token();

    let waiter = grandchild.clone();
    let handle = spawn(async move { waiter.cancelled().await });

    parent.cancel();

    assert!(timeout(Duration::from_millis(200), handle).await.is_ok());
    assert!(child.is_cancelled());
}
