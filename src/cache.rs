use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::web::Bytes;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

struct CacheEntry {
    data: Bytes,
    expires_at: Instant,
}

/// In-memory TTL cache of encoded report bodies.
///
/// Cloning shares the same map. Values are replaced whole, so a reader
/// sees either the old body or the new one.
#[derive(Clone)]
pub struct ResultCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached body for `key`, if present and not yet expired.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.data.clone())
    }

    pub async fn set(&self, key: impl Into<String>, data: Bytes) {
        let entry = CacheEntry {
            data,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.write().await.insert(key.into(), entry);
    }

    /// Drop expired entries. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    /// Stored entries, expired ones included until the next purge.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Purge expired entries every `every` until the runtime shuts down.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // First tick fires immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = cache.purge_expired().await;
                if removed > 0 {
                    log::debug!("cache sweeper removed {removed} expired entries");
                }
            }
        })
    }
}
