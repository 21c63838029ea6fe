//! Time-bounded cache for video detail lookups.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::VideoItem;

/// How long a cached detail stays valid.
pub const DETAIL_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    data: VideoItem,
    timestamp: Instant,
}

/// Detail cache keyed by `"{source_id}-{video_id}"`.
///
/// Entries are checked on read; an expired entry is never returned and is
/// simply overwritten by the next insert.
#[derive(Debug, Clone)]
pub struct DetailCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl DetailCache {
    /// Creates a cache with the default five-minute TTL.
    pub fn new() -> Self {
        Self::with_ttl(DETAIL_CACHE_TTL)
    }

    /// Creates a cache with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Builds the cache key for a detail lookup.
    pub fn key(source_id: &str, video_id: &str) -> String {
        format!("{}-{}", source_id, video_id)
    }

    /// Returns the cached detail if it is still fresh.
    pub async fn get(&self, source_id: &str, video_id: &str) -> Option<VideoItem> {
        let entries = self.entries.read().await;
        entries
            .get(&Self::key(source_id, video_id))
            .filter(|entry| entry.timestamp.elapsed() < self.ttl)
            .map(|entry| entry.data.clone())
    }

    /// Stores a detail, replacing any previous entry.
    pub async fn insert(&self, source_id: &str, video_id: &str, data: VideoItem) {
        let mut entries = self.entries.write().await;
        entries.insert(
            Self::key(source_id, video_id),
            CacheEntry {
                data,
                timestamp: Instant::now(),
            },
        );
    }

    /// Number of stored entries, fresh or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for DetailCache {
    fn default() -> Self {
        Self::new()
    }
}
