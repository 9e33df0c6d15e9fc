// crates/resilience/tests/resilience_tests.rs
//! Integration tests for keyed tasks combined with timeouts

use bookdeck_resilience::{KeyedTasks, ResilienceError, Timeout};
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::test(start_paused = true)]
async fn test_timed_out_task_reports_timeout() {
    let mut tasks = KeyedTasks::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let timeout = Timeout::from_millis(100);

    let generation = tasks.next_generation();
    tasks.spawn("slow", async move {
        let result = timeout.run(std::future::pending::<u32>()).await;
        let _ = tx.send((generation, result));
    });

    let (reported, result) = rx.recv().await.expect("task should report");
    assert_eq!(result, Err(ResilienceError::Timeout(Duration::from_millis(100))));
    assert!(tasks.complete(&"slow", reported));
}

#[tokio::test]
async fn test_late_completion_from_superseded_task_is_rejected() {
    let mut tasks = KeyedTasks::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // First spawn finishes immediately, but is superseded before its
    // completion message is handled.
    let first = tasks.next_generation();
    let first_tx = tx.clone();
    tasks.spawn("start", async move {
        let _ = first_tx.send(first);
    });
    tokio::task::yield_now().await;

    let second = tasks.next_generation();
    tasks.spawn("start", async move {
        let _ = tx.send(second);
    });

    let mut accepted = Vec::new();
    while let Some(generation) = rx.recv().await {
        if tasks.complete(&"start", generation) {
            accepted.push(generation);
        }
    }

    assert_eq!(accepted, vec![second]);
}
