//! Concurrency tests for the pairing queue.

use std::collections::HashSet;
use std::sync::Arc;

use halma_lobby::MatchQueue;
use halma_transport::memory::{self, MemoryConnection};
use halma_transport::Connection;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_enqueue_pairs_every_connection_exactly_once() {
    const CONNECTIONS: usize = 200;
    let queue = Arc::new(MatchQueue::<MemoryConnection>::new());

    let mut tasks = Vec::with_capacity(CONNECTIONS);
    let mut clients = Vec::with_capacity(CONNECTIONS);
    for _ in 0..CONNECTIONS {
        let (conn, client) = memory::pair();
        clients.push(client);
        let queue = Arc::clone(&queue);
        tasks.push(tokio::spawn(async move { queue.enqueue(conn) }));
    }

    let mut paired = HashSet::new();
    let mut pairs = 0;
    for task in tasks {
        if let Some(pairing) = task.await.expect("enqueue task panicked") {
            pairs += 1;
            let (first, second) = pairing.into_tuple();
            assert_ne!(first.id(), second.id());
            assert!(paired.insert(first.id()), "paired twice");
            assert!(paired.insert(second.id()), "paired twice");
        }
    }

    assert_eq!(pairs, CONNECTIONS / 2);
    assert_eq!(paired.len(), CONNECTIONS);
    assert_eq!(queue.waiting(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_odd_arrival_leaves_exactly_one_waiting() {
    let queue = Arc::new(MatchQueue::new());

    let tasks: Vec<_> = (0..101)
        .map(|n| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.enqueue(n) })
        })
        .collect();

    let mut pairs = 0;
    for task in tasks {
        if task.await.unwrap().is_some() {
            pairs += 1;
        }
    }
    assert_eq!(pairs, 50);
    assert_eq!(queue.waiting(), 1);
}
