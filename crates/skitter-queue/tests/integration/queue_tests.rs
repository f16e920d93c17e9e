use chrono::{Duration, Utc};

use skitter_core::queue::{DedupTracker, WorkQueue};

use crate::common::setup_test_queue;

#[tokio::test]
async fn ready_queue_is_fifo_for_a_single_producer() {
    let (queue, _container) = setup_test_queue().await;

    queue.push_ready("first").await.unwrap();
    queue.push_ready("second").await.unwrap();

    assert_eq!(queue.pop_ready().await.unwrap().as_deref(), Some("first"));
    assert_eq!(queue.pop_ready().await.unwrap().as_deref(), Some("second"));
}

#[tokio::test]
async fn pop_ready_on_empty_queue_returns_none() {
    let (queue, _container) = setup_test_queue().await;
    assert_eq!(queue.pop_ready().await.unwrap(), None);
}

#[tokio::test]
async fn claim_on_empty_worker_queue_returns_none_without_error() {
    let (queue, _container) = setup_test_queue().await;
    assert_eq!(queue.claim_worker_rotate().await.unwrap(), None);
}

#[tokio::test]
async fn rotate_claim_cycles_through_ids_in_push_order() {
    let (queue, _container) = setup_test_queue().await;

    for id in [1, 2, 3] {
        queue.push_worker(id).await.unwrap();
    }

    let mut claimed = Vec::new();
    for _ in 0..5 {
        claimed.push(queue.claim_worker_rotate().await.unwrap().unwrap());
    }

    // With no new pushes the same ids cycle indefinitely.
    assert_eq!(claimed, vec![1, 2, 3, 1, 2]);
}

#[tokio::test]
async fn rotate_claim_preserves_queue_membership() {
    let (queue, _container) = setup_test_queue().await;

    for id in [10, 20, 30] {
        queue.push_worker(id).await.unwrap();
    }
    for _ in 0..7 {
        queue.claim_worker_rotate().await.unwrap();
    }

    // Drain by claiming each id exactly once per cycle: the multiset of
    // queued ids is unchanged by any number of rotations.
    let mut remaining = Vec::new();
    for _ in 0..3 {
        remaining.push(queue.claim_worker_rotate().await.unwrap().unwrap());
    }
    remaining.sort_unstable();
    assert_eq!(remaining, vec![10, 20, 30]);
}

#[tokio::test]
async fn single_queued_id_keeps_redelivering() {
    let (queue, _container) = setup_test_queue().await;

    queue.push_worker(42).await.unwrap();

    for _ in 0..4 {
        assert_eq!(queue.claim_worker_rotate().await.unwrap(), Some(42));
    }
}

#[tokio::test]
async fn mark_discovered_is_idempotent() {
    let (queue, _container) = setup_test_queue().await;

    queue.mark_discovered("http://example.com/a").await.unwrap();
    queue.mark_discovered("http://example.com/a").await.unwrap();

    assert!(queue.is_discovered("http://example.com/a").await.unwrap());
    assert!(!queue.is_discovered("http://example.com/b").await.unwrap());
}

#[tokio::test]
async fn visited_range_query_is_time_ordered() {
    let (queue, _container) = setup_test_queue().await;

    let base = Utc::now();
    queue
        .mark_visited("http://example.com/b", base + Duration::seconds(10))
        .await
        .unwrap();
    queue
        .mark_visited("http://example.com/a", base)
        .await
        .unwrap();

    let all = queue
        .visited_between(base - Duration::seconds(1), base + Duration::seconds(11))
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].url, "http://example.com/a");
    assert_eq!(all[1].url, "http://example.com/b");

    let narrow = queue
        .visited_between(base - Duration::seconds(1), base + Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(narrow.len(), 1);
    assert_eq!(narrow[0].url, "http://example.com/a");
}

#[tokio::test]
async fn revisiting_a_url_refreshes_its_timestamp() {
    let (queue, _container) = setup_test_queue().await;

    let first = Utc::now();
    let second = first + Duration::seconds(60);

    queue.mark_visited("http://example.com", first).await.unwrap();
    queue.mark_visited("http://example.com", second).await.unwrap();

    // One entry, carrying the later timestamp.
    let early = queue
        .visited_between(first - Duration::seconds(1), first + Duration::seconds(1))
        .await
        .unwrap();
    assert!(early.is_empty());

    let late = queue
        .visited_between(second - Duration::seconds(1), second + Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(late.len(), 1);
    assert_eq!(late[0].visited_at.timestamp_millis(), second.timestamp_millis());
}
