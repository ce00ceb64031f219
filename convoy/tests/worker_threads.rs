use convoy::RuntimeBuilder;
use convoy::task::spawn;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;

#[test]
fn single_worker_runs_to_completion() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    assert_eq!(rt.block_on(async { 42 }), 42);
}

#[test]
fn workers_run_every_spawned_task() {
    let rt = RuntimeBuilder::new().worker_threads(4).build().unwrap();

    let completed = Arc::new(Mutex::new(HashSet::new()));
    let seen = completed.clone();

    let sum = rt.block_on(async move {
        let handles: Vec<_> = (0..50)
            .map(|i| {
                let seen = seen.clone();
                spawn(async move {
                    seen.lock().unwrap().insert(i);
                    i * 2
                })
            })
            .collect();

        let mut sum = 0;
        for handle in handles {
            sum += handle.await;
        }
        sum
    });

    assert_eq!(sum, (0..50).map(|i| i * 2).sum::<i32>());
    assert_eq!(completed.lock().unwrap().len(), 50);
}

#[test]
fn nested_spawns_resolve() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    let result = rt.block_on(async {
        let outer = spawn(async {
            let inner = spawn(async { 10 });
            inner.await + 20
        });
        outer.await + 30
    });

    assert_eq!(result, 60);
}

#[test]
fn threads_carry_the_configured_name() {
    let rt = RuntimeBuilder::new()
        .worker_threads(2)
        .thread_name("batch")
        .build()
        .unwrap();

    let name = rt.block_on(async { thread::current().name().map(str::to_owned) });

    assert!(name.unwrap_or_default().starts_with("batch-"));
}

#[test]
#[should_panic(expected = "worker_threads must be > 0")]
fn zero_worker_threads_panics() {
    let _ = RuntimeBuilder::new().worker_threads(0).build();
}

#[test]
fn runtimes_can_be_created_one_after_another() {
    for n in 1..=3 {
        let rt = RuntimeBuilder::new().worker_threads(n).build().unwrap();
        assert_eq!(rt.block_on(async move { n * 10 }), n * 10);
    }
}
