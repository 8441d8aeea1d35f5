//! Contract: cache freshness and idempotence
//!
//! Repeated resolve calls within the TTL never touch the network;
//! expiry is evaluated against wall-clock time at read time; a warm
//! persistent tier answers a fresh process's first query without a
//! provider call; failures never poison the cache.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::Utc;
use common::*;
use whereami_core::traits::cache_tier::{CacheEntry, CacheTier};
use whereami_core::{CacheStore, Error, FileCacheTier};

#[tokio::test]
async fn resolves_within_ttl_are_idempotent() {
    let (adapter, fetches) = CountingAdapter::new("p1");
    let (coordinator, tracker, _events) = coordinator_with(vec![adapter]);

    let g1 = tracker.next_generation();
    let delivery = coordinator.resolve(g1).await.outcome().await.unwrap();
    let first = delivery.result.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    // Repeated resolves inside the TTL: zero additional network calls
    for _ in 0..5 {
        let generation = tracker.next_generation();
        let resolution = coordinator.resolve(generation).await;
        assert!(resolution.is_cached());
        let cached = resolution.outcome().await.unwrap().result.unwrap();
        assert_eq!(cached, first, "cache round-trip preserves the location");
    }

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn entry_aged_past_ttl_forces_a_fresh_fetch() {
    // TTL=300s; an entry fetched 301s ago is a miss, one fetched 100s
    // ago is a hit.
    let (adapter, fetches) = CountingAdapter::new("p1");
    let cache = CacheStore::memory_only(Duration::from_secs(300));
    cache
        .seed(CacheEntry::with_timestamp(
            lisbon("seed"),
            Utc::now() - chrono::Duration::seconds(301),
        ))
        .await;

    let (coordinator, tracker, _events) = coordinator_over_cache(vec![adapter], cache);

    let generation = tracker.next_generation();
    let resolution = coordinator.resolve(generation).await;
    assert!(!resolution.is_cached(), "expired entry must not be served");

    let delivery = resolution.outcome().await.unwrap();
    assert_eq!(delivery.result.unwrap().provider, "p1");
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn entry_within_ttl_served_with_zero_network_calls() {
    let (adapter, fetches) = CountingAdapter::new("p1");
    let cache = CacheStore::memory_only(Duration::from_secs(300));
    cache
        .seed(CacheEntry::with_timestamp(
            lisbon("seed"),
            Utc::now() - chrono::Duration::seconds(100),
        ))
        .await;

    let (coordinator, tracker, _events) = coordinator_over_cache(vec![adapter], cache);

    let generation = tracker.next_generation();
    let resolution = coordinator.resolve(generation).await;
    assert!(resolution.is_cached());
    let delivery = resolution.outcome().await.unwrap();
    assert_eq!(delivery.result.unwrap().provider, "seed");
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn warm_persistent_tier_answers_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("location.json");

    // A previous process run persisted a location
    {
        let tier = FileCacheTier::new(&path).await.unwrap();
        tier.store(&CacheEntry::new(lisbon("previous-run")))
            .await
            .unwrap();
    }

    // A fresh process: memory tier cold, persistent tier warm
    let (adapter, fetches) = CountingAdapter::new("p1");
    let tier = FileCacheTier::new(&path).await.unwrap();
    let cache = CacheStore::new(Duration::from_secs(300), Some(Box::new(tier)));
    let (coordinator, tracker, _events) = coordinator_over_cache(vec![adapter], cache);

    let generation = tracker.next_generation();
    let resolution = coordinator.resolve(generation).await;
    // Memory was cold, so the first answer is asynchronous...
    assert!(!resolution.is_cached());

    // ...but it comes from the persistent tier, not a provider
    let delivery = resolution.outcome().await.unwrap();
    assert_eq!(delivery.result.unwrap().provider, "previous-run");
    assert_eq!(fetches.load(Ordering::SeqCst), 0);

    // Promotion: the next resolve is a synchronous memory hit
    let generation = tracker.next_generation();
    assert!(coordinator.resolve(generation).await.is_cached());
}

#[tokio::test]
async fn failed_resolution_does_not_poison_the_cache() {
    let (p1, f1) = FailingAdapter::new("p1");
    let (p2, f2) = FailingAdapter::new("p2");
    let (coordinator, tracker, _events) = coordinator_with(vec![p1, p2]);

    let g1 = tracker.next_generation();
    let delivery = coordinator.resolve(g1).await.outcome().await.unwrap();
    assert!(matches!(
        delivery.result,
        Err(Error::AllProvidersExhausted)
    ));

    // The failure was not cached: the next resolve re-attempts the
    // full chain rather than serving a stored error.
    let g2 = tracker.next_generation();
    let resolution = coordinator.resolve(g2).await;
    assert!(!resolution.is_cached());
    resolution.outcome().await.unwrap();

    assert_eq!(f1.load(Ordering::SeqCst), 2);
    assert_eq!(f2.load(Ordering::SeqCst), 2);
}
