// Generation store - the current static/api generations over a cache storage
// Author: kelexine (https://github.com/kelexine)

use crate::cache::models::{CacheStats, GenerationKind};
use crate::cache::storage::CacheStorage;
use crate::config::GenerationConfig;
use crate::error::Result;
use crate::metrics;
use crate::models::{FetchResponse, InterceptedRequest};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// View of the cache storage through one generation set.
///
/// Cloning is cheap; background cache writes carry their own clone.
#[derive(Clone)]
pub struct GenerationStore {
    storage: Arc<dyn CacheStorage>,
    config: Arc<GenerationConfig>,
    stats: Arc<RwLock<CacheStats>>,
}

impl GenerationStore {
    pub fn new(storage: Arc<dyn CacheStorage>, config: Arc<GenerationConfig>) -> Self {
        Self {
            storage,
            config,
            stats: Arc::new(RwLock::new(CacheStats::default())),
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Name of the current generation of `kind`
    pub fn name(&self, kind: GenerationKind) -> &str {
        match kind {
            GenerationKind::Static => &self.config.static_name,
            GenerationKind::Api => &self.config.api_name,
        }
    }

    /// Create both current generations if they do not exist yet.
    pub async fn open_current(&self) -> Result<()> {
        self.storage.open(&self.config.static_name).await?;
        self.storage.open(&self.config.api_name).await?;
        Ok(())
    }

    /// Look up `request` in the current generation of `kind`.
    ///
    /// A failing lookup is treated as a miss.
    pub async fn lookup(&self, kind: GenerationKind, request: &InterceptedRequest) -> Option<FetchResponse> {
        let found = match self.storage.open(self.name(kind)).await {
            Ok(generation) => generation.match_request(request).await,
            Err(e) => Err(e),
        };

        match found {
            Ok(Some(response)) => {
                debug!("Cache hit in {} generation: {}", kind.as_str(), request.key());
                self.stats.write().await.hits += 1;
                metrics::record_cache_hit(kind.as_str());
                Some(response)
            }
            Ok(None) => {
                debug!("Cache miss in {} generation: {}", kind.as_str(), request.key());
                self.stats.write().await.misses += 1;
                metrics::record_cache_miss(kind.as_str());
                None
            }
            Err(e) => {
                warn!("Cache lookup failed for {}: {}", request.key(), e);
                self.stats.write().await.misses += 1;
                metrics::record_cache_miss(kind.as_str());
                None
            }
        }
    }

    /// Write a snapshot into the current generation of `kind`.
    pub async fn put(&self, kind: GenerationKind, request: &InterceptedRequest, response: FetchResponse) -> Result<()> {
        let generation = self.storage.open(self.name(kind)).await?;
        let result = generation.put(request, response).await;

        match &result {
            Ok(()) => {
                self.stats.write().await.writes += 1;
                metrics::update_cache_entries(kind.as_str(), generation.len().await);
            }
            Err(_) => self.stats.write().await.write_failures += 1,
        }
        metrics::record_cache_write(kind.as_str(), result.is_ok());
        result
    }

    /// Fire-and-forget write. Failures (quota, evicted generation) are logged
    /// and dropped; they never reach the response already handed out.
    pub fn spawn_put(&self, kind: GenerationKind, request: InterceptedRequest, response: FetchResponse) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            if let Err(e) = store.put(kind, &request, response).await {
                warn!("Cache write to {} generation failed for {}: {}", kind.as_str(), request.key(), e);
            }
        })
    }

    /// Write every manifest entry into the static generation, all or nothing.
    pub async fn precache(&self, entries: Vec<(InterceptedRequest, FetchResponse)>) -> Result<()> {
        let count = entries.len();
        let generation = self.storage.open(&self.config.static_name).await?;
        generation.put_all(entries).await?;
        self.stats.write().await.writes += count as u64;
        metrics::update_cache_entries(GenerationKind::Static.as_str(), generation.len().await);
        info!("Pre-cached {} static resources into '{}'", count, self.config.static_name);
        Ok(())
    }

    /// Delete every generation outside the whitelist. Returns the deleted names.
    pub async fn evict_superseded(&self) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for name in self.storage.keys().await? {
            if self.config.is_whitelisted(&name) {
                continue;
            }
            info!("Deleting old cache: {}", name);
            if self.storage.delete(&name).await? {
                metrics::record_generation_evicted();
                deleted.push(name);
            }
        }
        self.stats.write().await.evictions += deleted.len() as u64;
        Ok(deleted)
    }

    /// Entry counts of the current generations (static, api).
    pub async fn entry_counts(&self) -> Result<(usize, usize)> {
        let static_gen = self.storage.open(&self.config.static_name).await?;
        let api_gen = self.storage.open(&self.config.api_name).await?;
        Ok((static_gen.len().await, api_gen.len().await))
    }

    /// Get cache statistics
    pub async fn get_stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }
}
