//! Debounced product search.
//!
//! Every input change cancels the previously scheduled search and schedules a
//! new one after a quiet period. Only the search that survives the quiet
//! period reaches the backend.
//!
//! Superseding a search also aborts its task when the request is already in
//! flight, and results are tagged with a generation number. A slow response
//! to an old query can never overwrite the results of a newer one.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use qkart_core::Product;

use crate::api::{ApiClient, ApiError};

/// Backend used by the debouncer.
pub trait ProductSearch: Send + Sync + 'static {
    /// Search the catalog. An empty query returns everything.
    fn search(&self, text: &str) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;
}

impl ProductSearch for ApiClient {
    fn search(&self, text: &str) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send {
        self.search_products(text)
    }
}

/// Result of one completed search.
#[derive(Debug, Clone, Default)]
pub enum SearchOutcome {
    /// Nothing has completed yet.
    #[default]
    Idle,
    /// Products matching the query.
    Results(Vec<Product>),
    /// The search failed.
    Failed(Arc<ApiError>),
}

/// The latest published search.
#[derive(Debug, Clone, Default)]
pub struct SearchUpdate {
    /// Increases with every scheduled search.
    pub generation: u64,
    /// Query that produced this outcome.
    pub query: String,
    pub outcome: SearchOutcome,
}

/// Coalesces rapid input into a single delayed search.
///
/// Holds at most one scheduled task. Dropping the debouncer cancels it.
pub struct SearchDebouncer<B: ProductSearch> {
    backend: Arc<B>,
    delay: Duration,
    query: String,
    pending: Option<JoinHandle<()>>,
    latest: Arc<AtomicU64>,
    results: Arc<watch::Sender<SearchUpdate>>,
}

impl<B: ProductSearch> SearchDebouncer<B> {
    /// Create a debouncer that waits `delay` after the last input.
    #[must_use]
    pub fn new(backend: B, delay: Duration) -> Self {
        Self::with_shared(Arc::new(backend), delay)
    }

    /// Create a debouncer over a shared backend.
    #[must_use]
    pub fn with_shared(backend: Arc<B>, delay: Duration) -> Self {
        let (results, _) = watch::channel(SearchUpdate::default());
        Self {
            backend,
            delay,
            query: String::new(),
            pending: None,
            latest: Arc::new(AtomicU64::new(0)),
            results: Arc::new(results),
        }
    }

    /// Quiet period before a search is issued.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Receive published results. Only the newest search is ever published.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchUpdate> {
        self.results.subscribe()
    }

    /// Whether a search is scheduled or in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Latest input text.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Handle an input change: cancel any pending search and schedule
    /// `text` after the quiet period.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn input(&mut self, text: impl Into<String>) {
        self.query = text.into();
        self.schedule(self.delay);
    }

    /// Cancel the pending timer and search for the latest input now.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn flush(&mut self) {
        self.schedule(Duration::ZERO);
    }

    /// Cancel the pending search, if any, without scheduling another.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        // Anything still running is now stale
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    fn schedule(&mut self, delay: Duration) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }

        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let text = self.query.clone();
        let backend = Arc::clone(&self.backend);
        let latest = Arc::clone(&self.latest);
        let results = Arc::clone(&self.results);

        self.pending = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            run_search(backend.as_ref(), text, generation, &latest, &results).await;
        }));
    }
}

impl<B: ProductSearch> Drop for SearchDebouncer<B> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

async fn run_search<B: ProductSearch>(
    backend: &B,
    text: String,
    generation: u64,
    latest: &AtomicU64,
    results: &watch::Sender<SearchUpdate>,
) {
    debug!(generation, query = %text, "Issuing debounced search");

    let outcome = match backend.search(&text).await {
        Ok(products) => SearchOutcome::Results(products),
        Err(e) => {
            warn!(error = %e, query = %text, "Search failed");
            SearchOutcome::Failed(Arc::new(e))
        }
    };

    if latest.load(Ordering::SeqCst) != generation {
        debug!(generation, "Discarding stale search result");
        return;
    }

    results.send_if_modified(|current| {
        if generation <= current.generation {
            return false;
        }
        *current = SearchUpdate {
            generation,
            query: text,
            outcome,
        };
        true
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use qkart_core::{Price, ProductId};

    /// Records every query and answers after a per-query latency.
    #[derive(Default)]
    struct FakeSearch {
        calls: Mutex<Vec<String>>,
        slow_query: Option<(String, Duration)>,
    }

    impl FakeSearch {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl ProductSearch for FakeSearch {
        async fn search(&self, text: &str) -> Result<Vec<Product>, ApiError> {
            self.calls.lock().push(text.to_string());

            if let Some((slow, latency)) = &self.slow_query
                && slow == text
            {
                tokio::time::sleep(*latency).await;
            }

            Ok(vec![Product {
                id: ProductId::new(text),
                name: text.to_string(),
                category: "Sports".to_string(),
                cost: Price::new(100),
                rating: 5.0,
                image_url: String::new(),
            }])
        }
    }

    const DELAY: Duration = Duration::from_millis(300);

    fn debouncer(fake: FakeSearch) -> (SearchDebouncer<FakeSearch>, Arc<FakeSearch>) {
        let fake = Arc::new(fake);
        (SearchDebouncer::with_shared(Arc::clone(&fake), DELAY), fake)
    }

    async fn settle() {
        tokio::time::sleep(DELAY * 2).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_issues_single_search_with_last_value() {
        let (mut debouncer, fake) = debouncer(FakeSearch::default());

        for text in ["s", "sm", "sma", "smas", "smash"] {
            debouncer.input(text);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        settle().await;

        assert_eq!(fake.calls(), vec!["smash".to_string()]);
        assert_eq!(debouncer.subscribe().borrow().query, "smash");
    }

    #[tokio::test(start_paused = true)]
    async fn test_separated_inputs_each_search() {
        let (mut debouncer, fake) = debouncer(FakeSearch::default());

        debouncer.input("smash");
        settle().await;
        debouncer.input("watch");
        settle().await;

        assert_eq!(fake.calls(), vec!["smash".to_string(), "watch".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_continued_typing_replaces_query() {
        let (mut debouncer, fake) = debouncer(FakeSearch::default());

        debouncer.input("smash");
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.input("smasher");
        settle().await;

        assert_eq!(fake.calls(), vec!["smasher".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_fires_before_quiet_period() {
        let (mut debouncer, fake) = debouncer(FakeSearch::default());

        debouncer.input("smash");
        tokio::time::sleep(DELAY - Duration::from_millis(1)).await;

        assert!(fake.calls().is_empty());
        assert!(debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_query_is_searched() {
        let (mut debouncer, fake) = debouncer(FakeSearch::default());

        debouncer.input("");
        settle().await;

        assert_eq!(fake.calls(), vec![String::new()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_never_overwrites_newer() {
        let (mut debouncer, fake) = debouncer(FakeSearch {
            slow_query: Some(("slow".to_string(), Duration::from_secs(5))),
            ..FakeSearch::default()
        });
        let rx = debouncer.subscribe();

        debouncer.input("slow");
        settle().await; // "slow" is now in flight
        debouncer.input("fast");
        settle().await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(fake.calls(), vec!["slow".to_string(), "fast".to_string()]);
        let update = rx.borrow().clone();
        assert_eq!(update.query, "fast");
        assert!(matches!(update.outcome, SearchOutcome::Results(ref p) if p.len() == 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_skips_delay() {
        let (mut debouncer, fake) = debouncer(FakeSearch::default());

        debouncer.input("smash");
        debouncer.flush();
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(fake.calls(), vec!["smash".to_string()]);
        assert!(!debouncer.is_pending());
    }

    #[test]
    #[should_panic(expected = "runtime")]
    fn test_input_outside_runtime_panics() {
        let mut debouncer = SearchDebouncer::new(FakeSearch::default(), DELAY);
        debouncer.input("smash");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop_abort_pending() {
        let (mut debouncer, fake) = debouncer(FakeSearch::default());

        debouncer.input("smash");
        debouncer.cancel();
        settle().await;
        assert!(fake.calls().is_empty());

        debouncer.input("watch");
        drop(debouncer);
        settle().await;
        assert!(fake.calls().is_empty());
    }
}
