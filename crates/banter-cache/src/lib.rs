// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-through TTL cache for chatroom listings.
//!
//! Keys follow the `user:{userId}:chatrooms` scheme; values are the
//! JSON-serialized ordered list of [`ChatroomSummary`] entries (no message
//! bodies). A hit within the TTL never touches the store; a miss loads,
//! populates, and returns.
//!
//! Invalidation happens on every mutating write (chatroom creation, user
//! message send, worker AI append), so a fresh listing is at most one
//! load away after any change.

use std::future::Future;
use std::time::Duration;

use banter_core::types::ChatroomSummary;
use banter_core::BanterError;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

/// Cache key for a user's chatroom listing.
pub fn listing_key(user_id: &str) -> String {
    format!("user:{user_id}:chatrooms")
}

struct Entry {
    payload: String,
    expires_at: Instant,
}

/// In-process read-through cache for chatroom listings.
pub struct ListingCache {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl ListingCache {
    /// Create a cache whose entries expire after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Return the cached listing, loading it through `load` on a miss.
    ///
    /// Expired entries count as misses and are replaced by the fresh load.
    pub async fn get_or_load<F, Fut>(
        &self,
        user_id: &str,
        load: F,
    ) -> Result<Vec<ChatroomSummary>, BanterError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ChatroomSummary>, BanterError>>,
    {
        let key = listing_key(user_id);

        if let Some(entry) = self.entries.get(&key) {
            if entry.expires_at > Instant::now() {
                debug!(key = key.as_str(), "listing cache hit");
                return serde_json::from_str(&entry.payload).map_err(|e| {
                    BanterError::Internal(format!("corrupt cache entry for {key}: {e}"))
                });
            }
        }

        debug!(key = key.as_str(), "listing cache miss");
        let summaries = load().await?;

        let payload = serde_json::to_string(&summaries)
            .map_err(|e| BanterError::Internal(format!("serialize listing for {key}: {e}")))?;
        self.entries.insert(
            key,
            Entry {
                payload,
                expires_at: Instant::now() + self.ttl,
            },
        );

        Ok(summaries)
    }

    /// Drop the cached listing for a user.
    pub fn invalidate(&self, user_id: &str) {
        let key = listing_key(user_id);
        if self.entries.remove(&key).is_some() {
            debug!(key = key.as_str(), "listing cache invalidated");
        }
    }

    /// Whether a fresh entry exists for the user.
    pub fn contains(&self, user_id: &str) -> bool {
        self.entries
            .get(&listing_key(user_id))
            .map(|entry| entry.expires_at > Instant::now())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn summary(id: &str) -> ChatroomSummary {
        ChatroomSummary {
            id: id.to_string(),
            title: "New Chat".to_string(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn second_read_within_ttl_skips_loader() {
        let cache = ListingCache::new(Duration::from_secs(600));
        let loads = AtomicUsize::new(0);

        for _ in 0..2 {
            let result = cache
                .get_or_load("user-1", || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![summary("room-1")])
                })
                .await
                .unwrap();
            assert_eq!(result.len(), 1);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_loads_again() {
        let cache = ListingCache::new(Duration::from_secs(600));
        let loads = AtomicUsize::new(0);

        let load = || async {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(vec![summary("room-1")])
        };

        cache.get_or_load("user-1", load).await.unwrap();
        cache.get_or_load("user-1", load).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(601)).await;
        cache.get_or_load("user-1", load).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_reload() {
        let cache = ListingCache::new(Duration::from_secs(600));
        let loads = AtomicUsize::new(0);

        let load = || async {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(vec![summary("room-1")])
        };

        cache.get_or_load("user-1", load).await.unwrap();
        assert!(cache.contains("user-1"));

        cache.invalidate("user-1");
        assert!(!cache.contains("user-1"));

        cache.get_or_load("user-1", load).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn users_have_independent_entries() {
        let cache = ListingCache::new(Duration::from_secs(600));

        cache
            .get_or_load("user-1", || async { Ok(vec![summary("a")]) })
            .await
            .unwrap();
        let other = cache
            .get_or_load("user-2", || async { Ok(vec![summary("b"), summary("c")]) })
            .await
            .unwrap();

        assert_eq!(other.len(), 2);
        cache.invalidate("user-1");
        assert!(cache.contains("user-2"));
    }

    #[test]
    fn key_scheme_matches_reference() {
        assert_eq!(listing_key("u-42"), "user:u-42:chatrooms");
    }
}
