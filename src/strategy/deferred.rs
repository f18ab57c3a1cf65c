// Deferred retry trigger for mutating API requests
// Author: kelexine (https://github.com/kelexine)

use crate::metrics;
use crate::models::InterceptedRequest;
use crate::platform::{Network, SyncScheduler};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Issues its own attempt of a mutating request and, when that attempt
/// cannot reach the network, registers the sync tag with the scheduler.
///
/// Only the trigger is recorded. The request itself is not stored and will
/// not be re-sent when the sync event fires.
#[derive(Clone)]
pub struct DeferredRetryTrigger {
    network: Arc<dyn Network>,
    scheduler: Arc<dyn SyncScheduler>,
    tag: String,
}

impl DeferredRetryTrigger {
    pub fn new(network: Arc<dyn Network>, scheduler: Arc<dyn SyncScheduler>, tag: impl Into<String>) -> Self {
        Self {
            network,
            scheduler,
            tag: tag.into(),
        }
    }

    pub fn spawn(&self, request: InterceptedRequest) -> JoinHandle<()> {
        let trigger = self.clone();
        tokio::spawn(async move { trigger.attempt(&request).await })
    }

    async fn attempt(&self, request: &InterceptedRequest) {
        let Err(e) = self.network.fetch(request).await else {
            return;
        };
        debug!("Mutating request {} failed offline: {}", request.key(), e);

        match self.scheduler.register(&self.tag).await {
            Ok(true) => {
                info!("Background sync registered for {} request", request.method);
                metrics::record_sync_registration(&self.tag, "registered");
            }
            Ok(false) => {
                debug!("Sync '{}' already pending", self.tag);
                metrics::record_sync_registration(&self.tag, "collapsed");
            }
            Err(e) => {
                warn!("Background sync registration failed: {}", e);
                metrics::record_sync_registration(&self.tag, "failed");
            }
        }
    }
}
