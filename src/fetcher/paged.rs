use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::source::{PageSource, UsageRecorder};
use super::state::{FetchError, FetchState};

/// The (query, page) pair a fetch was issued for.
struct Ticket<Q> {
    generation: u64,
    query: Q,
    page: u32,
}

struct FetcherInner<S: PageSource> {
    source: S,
    recorder: Option<Arc<dyn UsageRecorder<S::Item>>>,
    current: Mutex<Option<Ticket<S::Query>>>,
    state: watch::Sender<FetchState<S::Item>>,
}

/// Keeps a [`FetchState`] in sync with the most recently observed (query, page).
///
/// Every change of the pair issues one request. Results are applied only if
/// the pair they were issued for is still the current one when they arrive, so
/// a slow response can never overwrite a newer one. The superseded request
/// itself is not cancelled.
pub struct PagedFetcher<S: PageSource> {
    inner: Arc<FetcherInner<S>>,
}

impl<S: PageSource> Clone for PagedFetcher<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: PageSource> PagedFetcher<S> {
    pub fn new(source: S) -> Self {
        Self::build(source, None)
    }

    pub fn with_recorder(source: S, recorder: Arc<dyn UsageRecorder<S::Item>>) -> Self {
        Self::build(source, Some(recorder))
    }

    fn build(source: S, recorder: Option<Arc<dyn UsageRecorder<S::Item>>>) -> Self {
        let (state, _) = watch::channel(FetchState::default());
        Self {
            inner: Arc::new(FetcherInner {
                source,
                recorder,
                current: Mutex::new(None),
                state,
            }),
        }
    }

    /// Point the fetcher at a (query, page) pair.
    ///
    /// Returns the spawned fetch task, or None when the pair is unchanged.
    /// Pages below 1 are treated as page 1.
    pub async fn observe(&self, query: S::Query, page: u32) -> Option<JoinHandle<()>> {
        let page = page.max(1);

        let generation = {
            let mut current = self.inner.current.lock().await;
            let generation = match current.as_ref() {
                Some(t) if t.query == query && t.page == page => return None,
                Some(t) => t.generation + 1,
                None => 1,
            };
            *current = Some(Ticket {
                generation,
                query: query.clone(),
                page,
            });

            let loading = self.inner.state.borrow().to_loading();
            self.inner.state.send_replace(loading);
            generation
        };

        debug!("Fetching {:?} page {} (generation {})", query, page, generation);

        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(async move {
            inner.run(generation, query, page).await;
        }))
    }

    pub fn state(&self) -> FetchState<S::Item> {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState<S::Item>> {
        self.inner.state.subscribe()
    }

    /// The pair most recently passed to [`observe`](Self::observe).
    pub async fn current(&self) -> Option<(S::Query, u32)> {
        let current = self.inner.current.lock().await;
        current.as_ref().map(|t| (t.query.clone(), t.page))
    }
}

impl<S: PageSource> FetcherInner<S> {
    async fn run(&self, generation: u64, query: S::Query, page: u32) {
        let (next, first_item) = match self.source.fetch_page(&query, page).await {
            Ok(result) => {
                let first_item = result.items.first().cloned();
                (
                    FetchState::loaded(result.items, page, result.total_pages),
                    first_item,
                )
            }
            Err(e) => {
                error!("Error fetching {:?} page {}: {}", query, page, e);
                (FetchState::failed(FetchError::FetchFailed), None)
            }
        };

        if !self.apply(generation, next).await {
            debug!("Discarding stale result for {:?} page {}", query, page);
        }

        if page != 1 {
            return;
        }
        let (Some(recorder), Some(term), Some(item)) = (
            self.recorder.as_ref(),
            self.source.usage_term(&query),
            first_item,
        ) else {
            return;
        };
        if let Err(e) = recorder.record(term, &item).await {
            warn!("Error updating search count for {:?}: {}", term, e);
        }
    }

    async fn apply(&self, generation: u64, next: FetchState<S::Item>) -> bool {
        let current = self.current.lock().await;
        match current.as_ref() {
            Some(t) if t.generation == generation => {
                self.state.send_replace(next);
                true
            }
            _ => false,
        }
    }
}
