//! Cache freshness policy.
//!
//! `ReadCache` is the only component that talks to a [`CacheStore`]. It
//! implements read-through with explicit invalidation and absorbs every
//! store failure at this boundary: a broken cache degrades reads to the
//! authoritative store and turns invalidations into no-ops, never into
//! request failures. Callers therefore see infallible operations.

use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::store::{CacheStore, CacheStoreError};

const METRIC_CACHE_HIT: &str = "foglio_cache_hit_total";
const METRIC_CACHE_MISS: &str = "foglio_cache_miss_total";
const METRIC_CACHE_ERROR: &str = "foglio_cache_error_total";
const METRIC_CACHE_INVALIDATE: &str = "foglio_cache_invalidate_total";

/// Read-through, write-invalidate policy over an injected store.
#[derive(Clone)]
pub struct ReadCache {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl ReadCache {
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up and decode a cached projection.
    ///
    /// Returns `None` on a true miss, on any store failure, and on a payload
    /// that no longer decodes into `T` (the entry is then dropped so the
    /// next populate rewrites it).
    pub async fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        if !self.config.is_enabled() {
            return None;
        }

        let payload = match self.store.get(key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                counter!(METRIC_CACHE_MISS).increment(1);
                return None;
            }
            Err(err) => {
                self.absorb(key, "get", &err);
                return None;
            }
        };

        match serde_json::from_slice(&payload) {
            Ok(value) => {
                counter!(METRIC_CACHE_HIT).increment(1);
                Some(value)
            }
            Err(err) => {
                self.absorb(key, "decode", &CacheStoreError::payload(err.to_string()));
                let _ = self.store.delete(key).await;
                None
            }
        }
    }

    /// Encode and store a projection under `key` with the configured TTL.
    /// Best-effort: failures are absorbed.
    pub async fn put_json<T: Serialize>(&self, key: &CacheKey, value: &T) {
        if !self.config.is_enabled() {
            return;
        }

        let payload = match serde_json::to_vec(value) {
            Ok(encoded) => Bytes::from(encoded),
            Err(err) => {
                self.absorb(key, "encode", &CacheStoreError::payload(err.to_string()));
                return;
            }
        };

        if let Err(err) = self.store.set(key, payload, self.config.ttl()).await {
            self.absorb(key, "set", &err);
        }
    }

    /// Drop a single entry. Best-effort.
    pub async fn invalidate(&self, key: &CacheKey) {
        if !self.config.is_enabled() {
            return;
        }

        match self.store.delete(key).await {
            Ok(()) => {
                counter!(METRIC_CACHE_INVALIDATE).increment(1);
                debug!(cache_key = %key, "Cache entry invalidated");
            }
            Err(err) => self.absorb(key, "delete", &err),
        }
    }

    /// Drop every entry a write to `post_id` could have staled.
    ///
    /// The list entry is included because its items embed comment counts.
    /// The three deletes are independent; partial failure leaves the TTL as
    /// the staleness ceiling for whichever entry survived.
    pub async fn invalidate_post_scope(&self, post_id: Uuid) {
        self.invalidate(&CacheKey::PostDetail(post_id)).await;
        self.invalidate(&CacheKey::PostComments(post_id)).await;
        self.invalidate(&CacheKey::PostsList).await;
    }

    /// Clear the whole namespace. Used for full resets, not per-request work.
    pub async fn invalidate_all(&self) {
        if !self.config.is_enabled() {
            return;
        }

        match self.store.clear().await {
            Ok(()) => {
                counter!(METRIC_CACHE_INVALIDATE).increment(1);
                debug!("Cache cleared");
            }
            Err(err) => self.absorb(&CacheKey::PostsList, "clear", &err),
        }
    }

    fn absorb(&self, key: &CacheKey, op: &'static str, err: &CacheStoreError) {
        counter!(METRIC_CACHE_ERROR).increment(1);
        warn!(
            cache_key = %key,
            family = key.family(),
            op,
            error = %err,
            "Cache operation failed; continuing without cache"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde::Deserialize;

    use super::super::store::MemoryStore;
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Probe {
        value: u32,
    }

    struct FailingStore;

    #[async_trait]
    impl CacheStore for FailingStore {
        async fn get(&self, _key: &CacheKey) -> Result<Option<Bytes>, CacheStoreError> {
            Err(CacheStoreError::unavailable("get refused"))
        }

        async fn set(
            &self,
            _key: &CacheKey,
            _value: Bytes,
            _ttl: Duration,
        ) -> Result<(), CacheStoreError> {
            Err(CacheStoreError::unavailable("set refused"))
        }

        async fn delete(&self, _key: &CacheKey) -> Result<(), CacheStoreError> {
            Err(CacheStoreError::unavailable("delete refused"))
        }

        async fn clear(&self) -> Result<(), CacheStoreError> {
            Err(CacheStoreError::unavailable("clear refused"))
        }
    }

    fn memory_cache() -> ReadCache {
        let config = CacheConfig::default();
        ReadCache::new(Arc::new(MemoryStore::new(&config)), config)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = memory_cache();
        let key = CacheKey::PostsList;

        assert_eq!(cache.get_json::<Probe>(&key).await, None);

        cache.put_json(&key, &Probe { value: 7 }).await;
        assert_eq!(
            cache.get_json::<Probe>(&key).await,
            Some(Probe { value: 7 })
        );
    }

    #[tokio::test]
    async fn invalidate_drops_the_entry() {
        let cache = memory_cache();
        let key = CacheKey::PostDetail(Uuid::new_v4());

        cache.put_json(&key, &Probe { value: 1 }).await;
        cache.invalidate(&key).await;

        assert_eq!(cache.get_json::<Probe>(&key).await, None);
    }

    #[tokio::test]
    async fn post_scope_invalidation_covers_all_three_families() {
        let cache = memory_cache();
        let post_id = Uuid::new_v4();
        let other_id = Uuid::new_v4();

        cache.put_json(&CacheKey::PostsList, &Probe { value: 1 }).await;
        cache
            .put_json(&CacheKey::PostDetail(post_id), &Probe { value: 2 })
            .await;
        cache
            .put_json(&CacheKey::PostComments(post_id), &Probe { value: 3 })
            .await;
        cache
            .put_json(&CacheKey::PostDetail(other_id), &Probe { value: 4 })
            .await;

        cache.invalidate_post_scope(post_id).await;

        assert_eq!(cache.get_json::<Probe>(&CacheKey::PostsList).await, None);
        assert_eq!(
            cache.get_json::<Probe>(&CacheKey::PostDetail(post_id)).await,
            None
        );
        assert_eq!(
            cache
                .get_json::<Probe>(&CacheKey::PostComments(post_id))
                .await,
            None
        );
        // unrelated posts keep their entries
        assert_eq!(
            cache.get_json::<Probe>(&CacheKey::PostDetail(other_id)).await,
            Some(Probe { value: 4 })
        );
    }

    #[tokio::test]
    async fn store_failures_are_absorbed() {
        let cache = ReadCache::new(Arc::new(FailingStore), CacheConfig::default());
        let key = CacheKey::PostsList;

        assert_eq!(cache.get_json::<Probe>(&key).await, None);
        cache.put_json(&key, &Probe { value: 9 }).await;
        cache.invalidate(&key).await;
        cache.invalidate_post_scope(Uuid::new_v4()).await;
        cache.invalidate_all().await;
    }

    #[tokio::test]
    async fn undecodable_payload_reads_as_miss_and_is_evicted() {
        let config = CacheConfig::default();
        let store = Arc::new(MemoryStore::new(&config));
        let cache = ReadCache::new(store.clone(), config);
        let key = CacheKey::PostsList;

        store
            .set(&key, Bytes::from_static(b"not json"), Duration::from_secs(300))
            .await
            .expect("direct set should succeed");

        assert_eq!(cache.get_json::<Probe>(&key).await, None);
        assert!(
            store.get(&key).await.expect("direct get").is_none(),
            "bad payload should have been evicted"
        );
    }

    #[tokio::test]
    async fn disabled_cache_skips_reads_and_writes() {
        let config = CacheConfig {
            enabled: false,
            ..Default::default()
        };
        let store = Arc::new(MemoryStore::new(&config));
        let cache = ReadCache::new(store.clone(), config);
        let key = CacheKey::PostsList;

        cache.put_json(&key, &Probe { value: 5 }).await;
        assert!(store.is_empty());
        assert_eq!(cache.get_json::<Probe>(&key).await, None);
    }
}
