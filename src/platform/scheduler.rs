// Deferred sync scheduler
// Author: kelexine (https://github.com/kelexine)
//
// Holds at most one pending intent per tag. A background loop waits for
// intents, probes the upstream with exponential backoff until it answers,
// then fires every pending tag once.

use super::{Network, SyncScheduler};
use crate::config::SyncConfig;
use crate::error::{OfflineError, Result};
use crate::models::InterceptedRequest;
use crate::utils::retry;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info};

pub struct SyncManager {
    pending: Mutex<BTreeSet<String>>,
    wake: Notify,
}

impl SyncManager {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(BTreeSet::new()),
            wake: Notify::new(),
        }
    }

    /// Remove and return every pending tag.
    pub fn take_pending(&self) -> Vec<String> {
        std::mem::take(&mut *self.pending.lock()).into_iter().collect()
    }

    /// Run the connectivity loop forever, sending each fired tag to `fired`.
    ///
    /// Returns when the receiving side of `fired` is dropped.
    pub async fn run(
        self: Arc<Self>,
        network: Arc<dyn Network>,
        probe: InterceptedRequest,
        config: SyncConfig,
        fired: mpsc::Sender<String>,
    ) {
        loop {
            if self.pending.lock().is_empty() {
                self.wake.notified().await;
                continue;
            }

            debug!("Sync intents pending, probing {}", probe.url);
            retry::wait_until_reachable(network.as_ref(), &probe, &config).await;

            for tag in self.take_pending() {
                info!("Firing sync event '{}'", tag);
                if fired.send(tag).await.is_err() {
                    debug!("Sync receiver dropped, stopping scheduler loop");
                    return;
                }
            }
        }
    }
}

impl Default for SyncManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SyncScheduler for SyncManager {
    async fn register(&self, tag: &str) -> Result<bool> {
        if tag.is_empty() {
            return Err(OfflineError::SyncRegistration("empty sync tag".to_string()));
        }
        let inserted = self.pending.lock().insert(tag.to_string());
        if inserted {
            // notify_one stores a permit, so a loop not yet waiting still wakes
            self.wake.notify_one();
        }
        Ok(inserted)
    }

    async fn pending(&self) -> Vec<String> {
        self.pending.lock().iter().cloned().collect()
    }
}
