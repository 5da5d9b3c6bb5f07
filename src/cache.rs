// Local cache of chat session summaries

use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::models::chat::Session;

/// Thread-safe cache of the session list.
///
/// The server is authoritative; this only keeps the last listing around for
/// display and for picking the most recent session.
pub struct SessionCache {
    /// Sessions indexed by id, tagged with their position in the server listing
    cache: Arc<DashMap<String, (usize, Session)>>,

    /// Unix timestamp of the last update, 0 if never updated
    last_update: Arc<AtomicI64>,

    /// Cache TTL in seconds
    cache_ttl: i64,
}

impl SessionCache {
    pub fn new(cache_ttl: u64) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            last_update: Arc::new(AtomicI64::new(0)),
            cache_ttl: cache_ttl as i64,
        }
    }

    /// Replace the cache with a fresh listing
    pub fn update(&self, sessions: Vec<Session>) {
        tracing::debug!("Updating session cache. Found {} sessions.", sessions.len());

        self.cache.clear();
        for (position, session) in sessions.into_iter().enumerate() {
            self.cache
                .insert(session.session_id.clone(), (position, session));
        }

        self.last_update
            .store(Utc::now().timestamp(), Ordering::SeqCst);
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.cache.get(session_id).map(|entry| entry.value().1.clone())
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.cache.contains_key(session_id)
    }

    /// All sessions in server order
    pub fn sessions(&self) -> Vec<Session> {
        let mut entries: Vec<(usize, Session)> =
            self.cache.iter().map(|entry| entry.value().clone()).collect();
        entries.sort_by_key(|(position, _)| *position);
        entries.into_iter().map(|(_, session)| session).collect()
    }

    /// Most recent session: the last one in server order
    pub fn latest(&self) -> Option<Session> {
        self.cache
            .iter()
            .max_by_key(|entry| entry.value().0)
            .map(|entry| entry.value().1.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn is_stale(&self) -> bool {
        let last = self.last_update.load(Ordering::SeqCst);
        if last == 0 {
            return true; // No update yet, consider stale
        }
        Utc::now().timestamp() - last > self.cache_ttl
    }

    /// Forget everything (logout)
    pub fn clear(&self) {
        self.cache.clear();
        self.last_update.store(0, Ordering::SeqCst);
    }
}

impl Clone for SessionCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            last_update: Arc::clone(&self.last_update),
            cache_ttl: self.cache_ttl,
        }
    }
}
