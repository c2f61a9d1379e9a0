use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::catalog::{Movie, MovieCatalog};
use crate::db::KeyValueStore;
use crate::favorites::Favorites;
use crate::fetcher::{DiscoverSource, PagedFetcher, SearchSource, UsageRecorder};

/// Per-browser state: the search listing, the filtered listing and favorites.
pub struct BrowseSession {
    pub id: String,
    pub search: PagedFetcher<SearchSource>,
    pub discover: PagedFetcher<DiscoverSource>,
    pub favorites: Favorites,
    last_used: AtomicI64,
}

impl BrowseSession {
    fn touch(&self) {
        self.last_used.store(Utc::now().timestamp(), Ordering::Relaxed);
    }

    pub fn last_used(&self) -> i64 {
        self.last_used.load(Ordering::Relaxed)
    }
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<BrowseSession>>>,
    // Favorites write locks by store key, outliving pruned sessions that
    // are still referenced.
    favorite_locks: std::sync::Mutex<HashMap<String, Weak<Mutex<()>>>>,
    catalog: Arc<dyn MovieCatalog>,
    recorder: Arc<dyn UsageRecorder<Movie>>,
    store: Arc<dyn KeyValueStore>,
}

impl SessionRegistry {
    pub fn new(
        catalog: Arc<dyn MovieCatalog>,
        recorder: Arc<dyn UsageRecorder<Movie>>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            favorite_locks: std::sync::Mutex::new(HashMap::new()),
            catalog,
            recorder,
            store,
        }
    }

    pub async fn create(&self) -> Arc<BrowseSession> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.get_or_create(&id).await
    }

    /// Look up a session, creating it on first use.
    pub async fn get_or_create(&self, id: &str) -> Arc<BrowseSession> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(id) {
                session.touch();
                return Arc::clone(session);
            }
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                info!("New browse session {}", id);
                Arc::new(self.new_session(id))
            })
            .clone();
        session.touch();
        session
    }

    fn new_session(&self, id: &str) -> BrowseSession {
        BrowseSession {
            id: id.to_string(),
            search: PagedFetcher::with_recorder(
                SearchSource::new(Arc::clone(&self.catalog)),
                Arc::clone(&self.recorder),
            ),
            discover: PagedFetcher::new(DiscoverSource::new(Arc::clone(&self.catalog))),
            favorites: self.favorites(id),
            last_used: AtomicI64::new(Utc::now().timestamp()),
        }
    }

    fn favorites(&self, session_id: &str) -> Favorites {
        let key = Favorites::session_key(session_id);
        let mut locks = self
            .favorite_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let lock = match locks.get(&key).and_then(Weak::upgrade) {
            Some(lock) => lock,
            None => {
                let lock = Arc::new(Mutex::new(()));
                locks.insert(key.clone(), Arc::downgrade(&lock));
                lock
            }
        };
        Favorites::with_lock(Arc::clone(&self.store), key, lock)
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Forget sessions unused for longer than `max_idle_secs`. Stored
    /// favorites are kept. Returns the number of sessions removed.
    pub async fn prune_idle(&self, max_idle_secs: u64) -> usize {
        let max_idle = i64::try_from(max_idle_secs).unwrap_or(i64::MAX);
        let cutoff = Utc::now().timestamp().saturating_sub(max_idle);
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.last_used() >= cutoff);
        let removed = before - sessions.len();
        drop(sessions);

        self.favorite_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .retain(|_, lock| lock.strong_count() > 0);
        removed
    }

    pub fn start_background_prune(self: Arc<Self>, max_idle_secs: u64) {
        tokio::spawn(async move {
            let period = (max_idle_secs / 4).max(60);
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(period));
            loop {
                interval.tick().await;
                let removed = self.prune_idle(max_idle_secs).await;
                if removed > 0 {
                    info!("Pruned {} idle browse sessions", removed);
                }
            }
        });
    }
}
