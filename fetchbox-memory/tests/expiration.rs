//! Tests for ttl expiration and eviction-timer semantics.

use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use fetchbox_backend::{Backend, CacheStore};
use fetchbox_core::{CacheEntry, CacheKey};
use fetchbox_memory::MemoryBackend;
use serde_json::{Value, json};

/// Let pending eviction timers run after the paused clock moved.
async fn run_evictions() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn value_present_before_ttl_absent_after() {
    let backend = MemoryBackend::new();
    let key = CacheKey::new("hello");
    backend
        .set(&key, &json!({"message": "hello"}), Some(Duration::from_millis(1000)))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_millis(500)).await;
    run_evictions().await;
    let value: Option<Value> = backend.get(&key).await.unwrap();
    assert_eq!(value, Some(json!({"message": "hello"})));

    tokio::time::advance(Duration::from_millis(501)).await;
    run_evictions().await;
    let value: Option<Value> = backend.get(&key).await.unwrap();
    assert_eq!(value, None);
    assert!(backend.is_empty());
}

#[tokio::test(start_paused = true)]
async fn infinite_ttl_persists_and_has_no_deadline() {
    let backend = MemoryBackend::new();
    let key = CacheKey::new("pinned");
    backend.set(&key, &42u32, None).await.unwrap();

    tokio::time::advance(Duration::from_secs(3600)).await;
    run_evictions().await;

    let entry: CacheEntry<u32> = backend.get_entry(&key).await.unwrap().unwrap();
    assert_eq!(*entry.data(), 42);
    assert_eq!(entry.expires_at(), None);
}

#[tokio::test(start_paused = true)]
async fn replacement_cancels_prior_timer() {
    let backend = MemoryBackend::new();
    let key = CacheKey::new("replaced");
    backend
        .set(&key, &1u32, Some(Duration::from_millis(1000)))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_millis(200)).await;
    backend
        .set(&key, &2u32, Some(Duration::from_millis(1000)))
        .await
        .unwrap();

    // 1100ms after the first set: the first timer would have fired at
    // 1000ms, but replacement cancelled it. The entry expires at 1200ms.
    tokio::time::advance(Duration::from_millis(900)).await;
    run_evictions().await;
    let value: Option<u32> = backend.get(&key).await.unwrap();
    assert_eq!(value, Some(2));

    tokio::time::advance(Duration::from_millis(150)).await;
    run_evictions().await;
    let value: Option<u32> = backend.get(&key).await.unwrap();
    assert_eq!(value, None);
}

#[tokio::test(start_paused = true)]
async fn zero_ttl_is_immediately_absent() {
    let backend = MemoryBackend::new();
    let key = CacheKey::new("gone");
    backend
        .set(&key, &1u32, Some(Duration::ZERO))
        .await
        .unwrap();

    let value: Option<u32> = backend.get(&key).await.unwrap();
    assert_eq!(value, None);
}

#[tokio::test(start_paused = true)]
async fn lazy_expiration_discards_stale_entry_before_timer() {
    let backend = MemoryBackend::new();
    let key = CacheKey::new("skewed");
    // Plant an entry whose deadline already passed, as if the clock
    // skewed or the timer environment never fired. The eviction task has
    // not been given a chance to run.
    let past = Utc::now() - chrono::Duration::seconds(10);
    let raw = CacheEntry::from_parts(Bytes::from_static(b"1"), past, Some(past));
    backend.write(&key, raw).await.unwrap();
    assert_eq!(backend.len(), 1);

    let value: Option<u32> = backend.get(&key).await.unwrap();
    assert_eq!(value, None);
    assert!(backend.is_empty());
}

#[tokio::test(start_paused = true)]
async fn delete_cancels_timer_and_reports_presence() {
    let backend = MemoryBackend::new();
    let key = CacheKey::new("doomed");
    backend
        .set(&key, &1u32, Some(Duration::from_millis(500)))
        .await
        .unwrap();

    assert!(backend.delete(&key).await.unwrap());
    assert!(!backend.delete(&key).await.unwrap());

    // Re-populate without a ttl; the cancelled timer must not fire
    // against the new value.
    backend.set(&key, &2u32, None).await.unwrap();
    tokio::time::advance(Duration::from_millis(1000)).await;
    run_evictions().await;
    let value: Option<u32> = backend.get(&key).await.unwrap();
    assert_eq!(value, Some(2));
}

#[tokio::test(start_paused = true)]
async fn clear_all_leaves_no_orphan_timers() {
    let backend = MemoryBackend::new();
    for i in 0..3 {
        let key = CacheKey::new(format!("key-{i}"));
        backend
            .set(&key, &i, Some(Duration::from_millis(1000)))
            .await
            .unwrap();
    }

    backend.clear_all().await.unwrap();
    assert!(backend.is_empty());

    // Re-populate one of the cleared keys with an unbounded ttl and move
    // past the original deadlines: a leftover timer firing now must be a
    // no-op.
    let key = CacheKey::new("key-1");
    backend.set(&key, &99u32, None).await.unwrap();
    tokio::time::advance(Duration::from_millis(2000)).await;
    run_evictions().await;
    let value: Option<u32> = backend.get(&key).await.unwrap();
    assert_eq!(value, Some(99));
}

#[tokio::test(start_paused = true)]
async fn cache_hit_round_trips_deep_equal() {
    let backend = MemoryBackend::new();
    let key = CacheKey::new("deep");
    let stored = json!({
        "user": {"id": 7, "roles": ["admin", "ops"]},
        "flags": [true, false, null],
    });
    backend
        .set(&key, &stored, Some(Duration::from_secs(60)))
        .await
        .unwrap();

    let value: Value = backend.get(&key).await.unwrap().unwrap();
    assert_eq!(value, stored);
}

#[tokio::test(start_paused = true)]
async fn later_write_wins_for_same_key() {
    let backend = MemoryBackend::new();
    let key = CacheKey::new("contended");
    backend.set(&key, &"first", None).await.unwrap();
    backend.set(&key, &"second", None).await.unwrap();

    assert_eq!(backend.len(), 1);
    let value: String = backend.get(&key).await.unwrap().unwrap();
    assert_eq!(value, "second");
}
