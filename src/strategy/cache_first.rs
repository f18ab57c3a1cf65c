// Cache-first strategy for static resources
// Author: kelexine (https://github.com/kelexine)

use super::{Background, ResponseSource};
use crate::cache::{GenerationKind, GenerationStore};
use crate::models::{FetchResponse, InterceptedRequest};
use crate::platform::Network;
use http::Method;
use std::sync::Arc;
use tracing::debug;

/// Serves from the static generation; only goes to the network on a miss.
#[derive(Clone)]
pub struct CacheFirst {
    store: GenerationStore,
    network: Arc<dyn Network>,
}

impl CacheFirst {
    pub fn new(store: GenerationStore, network: Arc<dyn Network>) -> Self {
        Self { store, network }
    }

    /// Never fails: an unreachable network yields the plain-text offline notice.
    pub async fn handle(&self, request: &InterceptedRequest) -> (FetchResponse, ResponseSource, Background) {
        let mut background = Background::default();

        if let Some(cached) = self.store.lookup(GenerationKind::Static, request).await {
            return (cached, ResponseSource::Cache, background);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_static_cacheable() && request.method == Method::GET {
                    background.push(self.store.spawn_put(
                        GenerationKind::Static,
                        request.clone(),
                        response.clone(),
                    ));
                } else {
                    debug!(
                        "Not caching {} (status {}, type {}, redirected {})",
                        request.key(),
                        response.status,
                        response.response_type.as_str(),
                        response.redirected
                    );
                }
                (response, ResponseSource::Network, background)
            }
            Err(e) => {
                debug!("Static fetch failed, serving offline notice: {}", e);
                (
                    FetchResponse::offline_page(&self.store.config().offline_page_text),
                    ResponseSource::OfflineFallback,
                    background,
                )
            }
        }
    }
}
