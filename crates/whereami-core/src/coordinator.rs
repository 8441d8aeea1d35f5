//! Resolution coordinator
//!
//! The coordinator orchestrates one resolution cycle at a time:
//!
//! ```text
//! ┌──────────────┐   generation    ┌─────────────────────┐
//! │ host query   │───────────────▶│ ResolutionCoordinator│
//! └──────────────┘                 └─────────────────────┘
//!                                     │          │
//!                         cache hit?  │          │ miss: single fetch
//!                                     ▼          ▼
//!                              ┌───────────┐  ┌───────────────┐
//!                              │ CacheStore│  │ ProviderChain │
//!                              └───────────┘  └───────────────┘
//! ```
//!
//! State machine per cycle: `Idle → Fetching → {Delivered | Superseded}`.
//!
//! - A memory-tier cache hit resolves synchronously; a hit is never
//!   stale because TTL already bounds its freshness.
//! - On a miss, at most one fetch is ever in flight. Requests arriving
//!   while a fetch runs attach as additional waiters of the same fetch
//!   and raise its effective generation.
//! - At completion time (not launch time) the fetch's generation is
//!   checked against the session tracker. A stale fetch delivers
//!   nothing: its waiters observe a closed channel. Its value still
//!   populates the cache for future requests; only the display side
//!   effect is suppressed.
//!
//! The in-flight state is guarded by a single mutex; the foreground
//! `resolve` path never performs network or disk I/O.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::chain::ProviderChain;
use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::location::Location;
use crate::tracker::QuerySessionTracker;

/// Diagnostic events emitted by the coordinator
///
/// Best-effort: when the channel is full the event is dropped with a
/// warning rather than blocking resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    /// A resolve call was answered from cache
    CacheHit { generation: u64 },
    /// A background fetch was launched
    FetchStarted { generation: u64 },
    /// A resolve call attached to an already-running fetch
    WaiterAttached { generation: u64 },
    /// A fetch completed while still the latest generation
    Delivered { generation: u64, provider: String },
    /// A fetch failed terminally for its generation
    FetchFailed { generation: u64, error: String },
    /// A fetch completed after being superseded; result suppressed
    Superseded { generation: u64 },
}

/// A resolution outcome tagged with the generation it belongs to
///
/// Callers discard a delivery whose generation is no longer the latest.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub generation: u64,
    pub result: Result<Location>,
}

/// Immediate answer from [`ResolutionCoordinator::resolve`]
pub enum Resolution {
    /// Cache hit: the location is already known
    Cached(Delivery),
    /// Fetch in progress: the caller shows a placeholder and awaits
    /// the receiver; a closed channel means the fetch was superseded
    Pending(oneshot::Receiver<Delivery>),
}

impl Resolution {
    /// True for the synchronous cache-hit variant
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached(_))
    }

    /// Await the final delivery
    ///
    /// Returns `None` when the underlying fetch was superseded by a
    /// newer generation and its result suppressed.
    pub async fn outcome(self) -> Option<Delivery> {
        match self {
            Self::Cached(delivery) => Some(delivery),
            Self::Pending(rx) => rx.await.ok(),
        }
    }
}

/// Shared in-flight fetch state
enum FetchState {
    Idle,
    Fetching {
        /// Newest generation attached to this fetch
        generation: u64,
        waiters: Vec<oneshot::Sender<Delivery>>,
    },
}

/// Orchestrates cache, chain, and staleness checks for all resolve calls
pub struct ResolutionCoordinator {
    chain: Arc<ProviderChain>,
    cache: Arc<CacheStore>,
    tracker: Arc<QuerySessionTracker>,
    state: Arc<Mutex<FetchState>>,
    outer_timeout: Option<Duration>,
    event_tx: mpsc::Sender<CoordinatorEvent>,
}

impl ResolutionCoordinator {
    /// Create a coordinator
    ///
    /// Returns the coordinator and a receiver of diagnostic events.
    pub fn new(
        chain: ProviderChain,
        cache: CacheStore,
        tracker: Arc<QuerySessionTracker>,
        config: &FetchConfig,
    ) -> (Self, mpsc::Receiver<CoordinatorEvent>) {
        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let coordinator = Self {
            chain: Arc::new(chain),
            cache: Arc::new(cache),
            tracker,
            state: Arc::new(Mutex::new(FetchState::Idle)),
            outer_timeout: config.outer_timeout_secs.map(Duration::from_secs),
            event_tx: tx,
        };

        (coordinator, rx)
    }

    /// The session tracker shared with the host
    pub fn tracker(&self) -> &Arc<QuerySessionTracker> {
        &self.tracker
    }

    /// Resolve the current location for a query generation
    ///
    /// Never blocks on network or disk: a memory-tier hit returns
    /// synchronously, a miss returns [`Resolution::Pending`]
    /// immediately while the fetch runs in the background.
    pub async fn resolve(&self, generation: u64) -> Resolution {
        if let Some(entry) = self.cache.read_memory().await {
            debug!(generation, "cache hit, resolving synchronously");
            emit(&self.event_tx, CoordinatorEvent::CacheHit { generation });
            return Resolution::Cached(Delivery {
                generation,
                result: Ok(entry.location),
            });
        }

        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock().await;
        match &mut *state {
            FetchState::Fetching {
                generation: in_flight,
                waiters,
            } => {
                // Single-flight: attach to the running fetch and raise
                // its effective generation.
                *in_flight = (*in_flight).max(generation);
                waiters.push(tx);
                debug!(generation, "attached waiter to in-flight fetch");
                emit(
                    &self.event_tx,
                    CoordinatorEvent::WaiterAttached { generation },
                );
            }
            FetchState::Idle => {
                *state = FetchState::Fetching {
                    generation,
                    waiters: vec![tx],
                };
                emit(&self.event_tx, CoordinatorEvent::FetchStarted { generation });
                self.spawn_fetch();
            }
        }

        Resolution::Pending(rx)
    }

    /// Launch the background fetch for the current `Fetching` state
    fn spawn_fetch(&self) {
        let chain = Arc::clone(&self.chain);
        let cache = Arc::clone(&self.cache);
        let tracker = Arc::clone(&self.tracker);
        let state = Arc::clone(&self.state);
        let event_tx = self.event_tx.clone();
        let outer_timeout = self.outer_timeout;

        tokio::spawn(async move {
            // Consult the full cache first: a valid persistent-tier
            // entry (warm start) makes the network round-trip
            // unnecessary and is promoted into memory.
            let result = match cache.read().await {
                Some(entry) => Ok(entry.location),
                None => {
                    let fetched = run_chain(&chain, outer_timeout).await;
                    if let Ok(location) = &fetched {
                        // Write-through happens regardless of staleness:
                        // a superseded fetch still warms the cache for
                        // future requests.
                        cache.write(location.clone()).await;
                    }
                    fetched
                }
            };

            // Completion: take the waiters and return to Idle under the
            // lock, then check staleness at delivery time.
            let (generation, waiters) = {
                let mut guard = state.lock().await;
                match std::mem::replace(&mut *guard, FetchState::Idle) {
                    FetchState::Fetching {
                        generation,
                        waiters,
                    } => (generation, waiters),
                    FetchState::Idle => {
                        warn!("fetch completed with no in-flight state recorded");
                        return;
                    }
                }
            };

            if tracker.is_latest(generation) {
                match &result {
                    Ok(location) => emit(
                        &event_tx,
                        CoordinatorEvent::Delivered {
                            generation,
                            provider: location.provider.clone(),
                        },
                    ),
                    Err(e) => emit(
                        &event_tx,
                        CoordinatorEvent::FetchFailed {
                            generation,
                            error: e.to_string(),
                        },
                    ),
                }

                for waiter in waiters {
                    let _ = waiter.send(Delivery {
                        generation,
                        result: result.clone(),
                    });
                }
            } else {
                // Stale-write protection: a newer query owns the
                // display now. Dropping the waiters closes their
                // channels without emitting a result.
                debug!(generation, latest = tracker.latest(), "fetch superseded");
                emit(&event_tx, CoordinatorEvent::Superseded { generation });
            }
        });
    }
}

/// Run the provider chain, bounded by the optional outer timeout
///
/// Outer-timeout expiry is treated identically to chain exhaustion.
/// There is no mid-flight cancellation of the HTTP call itself; the
/// timeout only bounds how long waiters can be kept pending.
async fn run_chain(chain: &ProviderChain, outer_timeout: Option<Duration>) -> Result<Location> {
    match outer_timeout {
        Some(limit) => match tokio::time::timeout(limit, chain.resolve()).await {
            Ok(result) => result,
            Err(_) => {
                warn!("provider chain exceeded outer timeout of {:?}", limit);
                Err(Error::AllProvidersExhausted)
            }
        },
        None => chain.resolve().await,
    }
}

/// Emit a diagnostic event without blocking resolution
fn emit(event_tx: &mpsc::Sender<CoordinatorEvent>, event: CoordinatorEvent) {
    if event_tx.try_send(event).is_err() {
        warn!("coordinator event channel full, dropping event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::provider::{ProviderAdapter, ProviderResult};
    use async_trait::async_trait;

    struct StaticAdapter(Location);

    #[async_trait]
    impl ProviderAdapter for StaticAdapter {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch(&self) -> ProviderResult {
            ProviderResult::Success(self.0.clone())
        }
    }

    fn lisbon() -> Location {
        let mut loc = Location::new("static");
        loc.city = Some("Lisbon".to_string());
        loc.country_code = Some("PT".to_string());
        loc
    }

    fn coordinator() -> (ResolutionCoordinator, mpsc::Receiver<CoordinatorEvent>) {
        let chain = ProviderChain::new(vec![Box::new(StaticAdapter(lisbon()))]).unwrap();
        let cache = CacheStore::memory_only(Duration::from_secs(300));
        let tracker = Arc::new(QuerySessionTracker::new());
        ResolutionCoordinator::new(chain, cache, tracker, &FetchConfig::default())
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let (coordinator, mut events) = coordinator();
        let tracker = Arc::clone(coordinator.tracker());

        let g1 = tracker.next_generation();
        let resolution = coordinator.resolve(g1).await;
        assert!(!resolution.is_cached());

        let delivery = resolution.outcome().await.expect("delivered");
        assert_eq!(delivery.generation, g1);
        assert_eq!(delivery.result.unwrap().city.as_deref(), Some("Lisbon"));

        // Second resolve within TTL is a synchronous cache hit
        let g2 = tracker.next_generation();
        let resolution = coordinator.resolve(g2).await;
        assert!(resolution.is_cached());
        let delivery = resolution.outcome().await.unwrap();
        assert_eq!(delivery.generation, g2);

        assert_eq!(
            events.recv().await,
            Some(CoordinatorEvent::FetchStarted { generation: g1 })
        );
        assert_eq!(
            events.recv().await,
            Some(CoordinatorEvent::Delivered {
                generation: g1,
                provider: "static".to_string()
            })
        );
        assert_eq!(
            events.recv().await,
            Some(CoordinatorEvent::CacheHit { generation: g2 })
        );
    }

    #[tokio::test]
    async fn cached_delivery_tagged_with_current_generation() {
        let (coordinator, _events) = coordinator();
        let tracker = Arc::clone(coordinator.tracker());

        let g1 = tracker.next_generation();
        coordinator.resolve(g1).await.outcome().await.unwrap();

        let g2 = tracker.next_generation();
        let delivery = coordinator.resolve(g2).await.outcome().await.unwrap();
        // A cache hit is never stale: it carries the caller's generation
        assert_eq!(delivery.generation, g2);
    }
}
