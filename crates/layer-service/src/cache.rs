//! Process-lifetime memoization of transformation results per WebMap id.
//!
//! Entries never expire; they are dropped only by [`LayerConfigCache::clear`].
//! Concurrent requests for the same WebMap share one in-flight load.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info};
use webmap_common::{LayerConfig, WebMapResult};

/// Shared, immutable result of one transformation.
pub type CachedLayers = Arc<Vec<LayerConfig>>;

type Slot = Arc<OnceCell<CachedLayers>>;

/// Counters for [`LayerConfigCache::get_or_load`].
#[derive(Debug, Default)]
pub struct LayerConfigCacheStats {
    /// Lookups answered from a completed entry
    pub hits: AtomicU64,
    /// Lookups that had to load or wait for a load
    pub misses: AtomicU64,
}

impl LayerConfigCacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

/// Memoized layer records keyed by WebMap id.
#[derive(Default)]
pub struct LayerConfigCache {
    slots: RwLock<HashMap<String, Slot>>,
    stats: LayerConfigCacheStats,
}

impl LayerConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed entry for `webmap_id`, if any. In-flight loads are not awaited.
    pub async fn get(&self, webmap_id: &str) -> Option<CachedLayers> {
        let slots = self.slots.read().await;
        slots.get(webmap_id).and_then(|slot| slot.get().cloned())
    }

    /// Store a result, replacing any previous entry.
    pub async fn set(&self, webmap_id: &str, layers: Vec<LayerConfig>) -> CachedLayers {
        let layers = Arc::new(layers);
        let slot = Arc::new(OnceCell::new_with(Some(layers.clone())));
        self.slots.write().await.insert(webmap_id.to_string(), slot);
        debug!(webmap_id, count = layers.len(), "Cached layer configs");
        layers
    }

    /// Drop one entry, or every entry when `webmap_id` is `None`.
    pub async fn clear(&self, webmap_id: Option<&str>) {
        let mut slots = self.slots.write().await;
        match webmap_id {
            Some(id) => {
                slots.remove(id);
                info!(webmap_id = id, "Cleared cached layer configs");
            }
            None => {
                let count = slots.len();
                slots.clear();
                info!(entries = count, "Cleared all cached layer configs");
            }
        }
    }

    /// Return the cached entry or run `loader` once for all concurrent callers.
    ///
    /// A failed load is returned to the caller that ran it and leaves the
    /// slot empty, so the next caller loads again.
    pub async fn get_or_load<F, Fut>(&self, webmap_id: &str, loader: F) -> WebMapResult<CachedLayers>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = WebMapResult<Vec<LayerConfig>>>,
    {
        let slot = self.slot(webmap_id).await;

        if let Some(layers) = slot.get() {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            debug!(
                webmap_id,
                hit_rate = self.stats.hit_rate(),
                "Layer config cache hit"
            );
            return Ok(layers.clone());
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        debug!(webmap_id, "Layer config cache miss");

        let layers = slot
            .get_or_try_init(move || async move { loader().await.map(Arc::new) })
            .await?
            .clone();
        Ok(layers)
    }

    async fn slot(&self, webmap_id: &str) -> Slot {
        if let Some(slot) = self.slots.read().await.get(webmap_id) {
            return slot.clone();
        }
        self.slots
            .write()
            .await
            .entry(webmap_id.to_string())
            .or_default()
            .clone()
    }

    /// Number of completed entries.
    pub async fn len(&self) -> usize {
        self.slots
            .read()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn stats(&self) -> &LayerConfigCacheStats {
        &self.stats
    }
}
