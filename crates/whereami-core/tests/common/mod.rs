//! Test doubles and common utilities for resolution contract tests
//!
//! These doubles count calls and let tests hold a fetch open, so the
//! single-flight and stale-delivery guarantees can be observed rather
//! than assumed.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::sync::mpsc;

use whereami_core::config::FetchConfig;
use whereami_core::coordinator::{CoordinatorEvent, ResolutionCoordinator};
use whereami_core::location::Location;
use whereami_core::traits::provider::{ProviderAdapter, ProviderFailure, ProviderResult};
use whereami_core::{CacheStore, ProviderChain, QuerySessionTracker};

/// Canonical successful location used across tests
pub fn lisbon(provider: &str) -> Location {
    let mut loc = Location::new(provider);
    loc.city = Some("Lisbon".to_string());
    loc.country_code = Some("PT".to_string());
    loc.latitude = Some(38.72);
    loc.longitude = Some(-9.14);
    loc
}

/// Adapter that succeeds immediately and counts fetches
pub struct CountingAdapter {
    name: &'static str,
    location: Location,
    fetches: Arc<AtomicUsize>,
}

impl CountingAdapter {
    pub fn new(name: &'static str) -> (Box<Self>, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let adapter = Box::new(Self {
            name,
            location: lisbon(name),
            fetches: Arc::clone(&fetches),
        });
        (adapter, fetches)
    }
}

#[async_trait]
impl ProviderAdapter for CountingAdapter {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self) -> ProviderResult {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        ProviderResult::Success(self.location.clone())
    }
}

/// Adapter whose fetch blocks until the test releases it
///
/// Lets a test attach further resolve calls, or issue newer
/// generations, while a fetch is verifiably still in flight.
pub struct GatedAdapter {
    name: &'static str,
    location: Location,
    fetches: Arc<AtomicUsize>,
    gate: Arc<Notify>,
}

impl GatedAdapter {
    pub fn new(name: &'static str) -> (Box<Self>, Arc<Notify>, Arc<AtomicUsize>) {
        let gate = Arc::new(Notify::new());
        let fetches = Arc::new(AtomicUsize::new(0));
        let adapter = Box::new(Self {
            name,
            location: lisbon(name),
            fetches: Arc::clone(&fetches),
            gate: Arc::clone(&gate),
        });
        (adapter, gate, fetches)
    }
}

#[async_trait]
impl ProviderAdapter for GatedAdapter {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self) -> ProviderResult {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        ProviderResult::Success(self.location.clone())
    }
}

/// Adapter that always fails, counting attempts
pub struct FailingAdapter {
    name: &'static str,
    fetches: Arc<AtomicUsize>,
}

impl FailingAdapter {
    pub fn new(name: &'static str) -> (Box<Self>, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let adapter = Box::new(Self {
            name,
            fetches: Arc::clone(&fetches),
        });
        (adapter, fetches)
    }
}

#[async_trait]
impl ProviderAdapter for FailingAdapter {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self) -> ProviderResult {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        ProviderResult::Failure(ProviderFailure::unreachable("connection refused"))
    }
}

/// Adapter that blocks until released, then fails
pub struct GatedFailingAdapter {
    name: &'static str,
    fetches: Arc<AtomicUsize>,
    gate: Arc<Notify>,
}

impl GatedFailingAdapter {
    pub fn new(name: &'static str) -> (Box<Self>, Arc<Notify>, Arc<AtomicUsize>) {
        let gate = Arc::new(Notify::new());
        let fetches = Arc::new(AtomicUsize::new(0));
        let adapter = Box::new(Self {
            name,
            fetches: Arc::clone(&fetches),
            gate: Arc::clone(&gate),
        });
        (adapter, gate, fetches)
    }
}

#[async_trait]
impl ProviderAdapter for GatedFailingAdapter {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self) -> ProviderResult {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        ProviderResult::Failure(ProviderFailure::unreachable("connection refused"))
    }
}

/// Adapter that is reachable but returns no usable fields
pub struct EmptyAdapter {
    name: &'static str,
    fetches: Arc<AtomicUsize>,
}

impl EmptyAdapter {
    pub fn new(name: &'static str) -> (Box<Self>, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let adapter = Box::new(Self {
            name,
            fetches: Arc::clone(&fetches),
        });
        (adapter, fetches)
    }
}

#[async_trait]
impl ProviderAdapter for EmptyAdapter {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self) -> ProviderResult {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        ProviderResult::Empty
    }
}

/// Build a coordinator over the given adapters with a memory-only cache
pub fn coordinator_with(
    adapters: Vec<Box<dyn ProviderAdapter>>,
) -> (
    Arc<ResolutionCoordinator>,
    Arc<QuerySessionTracker>,
    mpsc::Receiver<CoordinatorEvent>,
) {
    coordinator_over_cache(
        adapters,
        CacheStore::memory_only(std::time::Duration::from_secs(300)),
    )
}

/// Build a coordinator over a caller-prepared cache store
pub fn coordinator_over_cache(
    adapters: Vec<Box<dyn ProviderAdapter>>,
    cache: CacheStore,
) -> (
    Arc<ResolutionCoordinator>,
    Arc<QuerySessionTracker>,
    mpsc::Receiver<CoordinatorEvent>,
) {
    let chain = ProviderChain::new(adapters).expect("chain construction succeeds");
    let tracker = Arc::new(QuerySessionTracker::new());
    let (coordinator, events) =
        ResolutionCoordinator::new(chain, cache, Arc::clone(&tracker), &FetchConfig::default());
    (Arc::new(coordinator), tracker, events)
}

/// Drain currently queued coordinator events
pub fn drain_events(events: &mut mpsc::Receiver<CoordinatorEvent>) -> Vec<CoordinatorEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}
