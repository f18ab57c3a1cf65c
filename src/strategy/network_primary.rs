// Network-primary strategy with cache fallback for API requests
// Author: kelexine (https://github.com/kelexine)

use super::{Background, ResponseSource};
use crate::cache::{GenerationKind, GenerationStore};
use crate::error::{OfflineError, Result};
use crate::models::{FetchResponse, InterceptedRequest};
use crate::platform::Network;
use http::Method;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Fetch result plus the cache write it triggered, if any.
type Refresh = Result<(FetchResponse, Option<JoinHandle<()>>)>;

/// Stale-while-revalidate variant: a cached API response is returned at once
/// while the network fetch runs on and refreshes the API generation.
#[derive(Clone)]
pub struct NetworkPrimary {
    store: GenerationStore,
    network: Arc<dyn Network>,
}

impl NetworkPrimary {
    pub fn new(store: GenerationStore, network: Arc<dyn Network>) -> Self {
        Self { store, network }
    }

    /// Start the network fetch as its own task. A successful GET is written
    /// into the API generation without holding up the response.
    fn spawn_refresh(&self, request: &InterceptedRequest) -> JoinHandle<Refresh> {
        let network = self.network.clone();
        let store = self.store.clone();
        let request = request.clone();

        tokio::spawn(async move {
            let response = network.fetch(&request).await?;
            let write = if response.ok() && request.method == Method::GET {
                Some(store.spawn_put(GenerationKind::Api, request, response.clone()))
            } else {
                None
            };
            Ok((response, write))
        })
    }

    pub async fn handle(&self, request: &InterceptedRequest) -> (Result<FetchResponse>, ResponseSource, Background) {
        let mut background = Background::default();

        // Read the cache before the refresh can overwrite the entry
        let cached = self.store.lookup(GenerationKind::Api, request).await;
        let refresh = self.spawn_refresh(request);

        if let Some(cached) = cached {
            let key = request.key();
            background.push(tokio::spawn(async move {
                match refresh.await {
                    Ok(Ok((_, Some(write)))) => {
                        if let Err(e) = write.await {
                            warn!("API cache write for {} did not complete: {}", key, e);
                        }
                    }
                    Ok(Ok((response, None))) => {
                        debug!("Refresh of {} returned {}, cache left as is", key, response.status);
                    }
                    Ok(Err(e)) => debug!("Refresh of {} failed, cached copy stays: {}", key, e),
                    Err(e) => warn!("Refresh task for {} did not complete: {}", key, e),
                }
            }));
            return (Ok(cached), ResponseSource::Cache, background);
        }

        let failure = match refresh.await {
            Ok(Ok((response, write))) => {
                if let Some(write) = write {
                    background.push(write);
                }
                return (Ok(response), ResponseSource::Network, background);
            }
            Ok(Err(e)) => e,
            Err(e) => OfflineError::Internal(format!("refresh task failed: {}", e)),
        };

        if request.is_read_only() {
            debug!("No cache and no network for {}: {}", request.key(), failure);
            (
                Ok(FetchResponse::offline_api(&self.store.config().offline_api_message)),
                ResponseSource::OfflineFallback,
                background,
            )
        } else {
            debug!("Passing network failure through for {}: {}", request.key(), failure);
            (Err(failure), ResponseSource::Failed, background)
        }
    }
}
