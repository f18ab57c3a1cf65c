// Cache storage boundary and the in-memory generation store
// Author: kelexine (https://github.com/kelexine)

use crate::error::{OfflineError, Result};
use crate::models::{FetchResponse, InterceptedRequest, RequestKey};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A named collection of request -> response snapshots.
#[async_trait]
pub trait CacheGeneration: Send + Sync {
    fn name(&self) -> &str;

    /// Look up a snapshot. Non-GET requests never match.
    async fn match_request(&self, request: &InterceptedRequest) -> Result<Option<FetchResponse>>;

    /// Store a snapshot, replacing any previous one for the same identity.
    /// Only GET requests may be stored.
    async fn put(&self, request: &InterceptedRequest, response: FetchResponse) -> Result<()>;

    /// Store several snapshots at once. Either every entry is written or none is.
    async fn put_all(&self, entries: Vec<(InterceptedRequest, FetchResponse)>) -> Result<()>;

    async fn len(&self) -> usize;
}

/// The platform cache: opens, lists and deletes generations by name.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a generation, creating it when missing.
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheGeneration>>;

    /// Names of all existing generations.
    async fn keys(&self) -> Result<Vec<String>>;

    async fn has(&self, name: &str) -> Result<bool>;

    /// Delete a generation. Handles already opened keep working on the
    /// detached entries but are no longer reachable by name.
    async fn delete(&self, name: &str) -> Result<bool>;
}

/// One in-memory generation. Every get/put is atomic per entry.
pub struct MemoryGeneration {
    name: String,
    max_entries: Option<usize>,
    entries: RwLock<HashMap<RequestKey, FetchResponse>>,
}

impl MemoryGeneration {
    fn new(name: &str, max_entries: Option<usize>) -> Self {
        Self {
            name: name.to_string(),
            max_entries,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn check_storable(&self, request: &InterceptedRequest) -> Result<RequestKey> {
        let key = request.key();
        if !key.is_get() {
            return Err(OfflineError::Cache(format!(
                "refusing to store non-GET request {}",
                key
            )));
        }
        Ok(key)
    }

    fn check_quota(&self, entries: &HashMap<RequestKey, FetchResponse>, new_keys: &[RequestKey]) -> Result<()> {
        if let Some(max) = self.max_entries {
            let added = new_keys.iter().filter(|k| !entries.contains_key(*k)).count();
            if entries.len() + added > max {
                return Err(OfflineError::Cache(format!(
                    "quota exceeded for generation '{}' ({} entries)",
                    self.name, max
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CacheGeneration for MemoryGeneration {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, request: &InterceptedRequest) -> Result<Option<FetchResponse>> {
        let key = request.key();
        if !key.is_get() {
            return Ok(None);
        }
        Ok(self.entries.read().get(&key).cloned())
    }

    async fn put(&self, request: &InterceptedRequest, response: FetchResponse) -> Result<()> {
        let key = self.check_storable(request)?;
        let mut entries = self.entries.write();
        self.check_quota(&entries, std::slice::from_ref(&key))?;
        debug!("[{}] put {}", self.name, key);
        entries.insert(key, response);
        Ok(())
    }

    async fn put_all(&self, batch: Vec<(InterceptedRequest, FetchResponse)>) -> Result<()> {
        let keys = batch
            .iter()
            .map(|(req, _)| self.check_storable(req))
            .collect::<Result<Vec<_>>>()?;

        let mut entries = self.entries.write();
        self.check_quota(&entries, &keys)?;
        for (key, (_, response)) in keys.into_iter().zip(batch) {
            entries.insert(key, response);
        }
        Ok(())
    }

    async fn len(&self) -> usize {
        self.entries.read().len()
    }
}

/// Process-local cache storage.
#[derive(Default)]
pub struct MemoryCacheStorage {
    max_entries: Option<usize>,
    generations: RwLock<HashMap<String, Arc<MemoryGeneration>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit every generation to `max_entries`; writes beyond it fail.
    pub fn with_quota(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
            generations: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheGeneration>> {
        let mut generations = self.generations.write();
        let generation = generations
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!("Creating cache generation '{}'", name);
                Arc::new(MemoryGeneration::new(name, self.max_entries))
            })
            .clone();
        Ok(generation)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.generations.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(self.generations.read().contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        Ok(self.generations.write().remove(name).is_some())
    }
}
