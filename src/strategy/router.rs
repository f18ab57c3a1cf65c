// Strategy router
// Author: kelexine (https://github.com/kelexine)

use super::{Background, CacheFirst, DeferredRetryTrigger, FetchOutcome, NetworkPrimary, Route};
use crate::cache::GenerationStore;
use crate::config::GenerationConfig;
use crate::metrics;
use crate::models::InterceptedRequest;
use crate::platform::{Network, SyncScheduler};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Classify by URL path alone. The method never changes the route.
pub fn classify(config: &GenerationConfig, request: &InterceptedRequest) -> Route {
    if request.path().starts_with(&config.api_prefix) {
        Route::Api
    } else {
        Route::Static
    }
}

/// Dispatches intercepted requests to the strategy for their route.
pub struct StrategyRouter {
    config: Arc<GenerationConfig>,
    cache_first: CacheFirst,
    network_primary: NetworkPrimary,
    deferred: DeferredRetryTrigger,
}

impl StrategyRouter {
    pub fn new(store: GenerationStore, network: Arc<dyn Network>, scheduler: Arc<dyn SyncScheduler>) -> Self {
        let config = Arc::new(store.config().clone());
        Self {
            cache_first: CacheFirst::new(store.clone(), network.clone()),
            network_primary: NetworkPrimary::new(store, network.clone()),
            deferred: DeferredRetryTrigger::new(network, scheduler, config.sync_tag.clone()),
            config,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Produce exactly one response for `request`.
    pub async fn handle(&self, request: InterceptedRequest) -> FetchOutcome {
        let started = Instant::now();
        let route = classify(&self.config, &request);
        let mut background = Background::default();

        debug!("Routing {} {} -> {}", request.method, request.url, route.as_str());

        if route == Route::Api && request.is_mutating() {
            background.push(self.deferred.spawn(request.clone()));
        }

        let (response, source, strategy_background) = match route {
            Route::Static => {
                let (response, source, bg) = self.cache_first.handle(&request).await;
                (Ok(response), source, bg)
            }
            Route::Api => self.network_primary.handle(&request).await,
        };
        background.extend(strategy_background);

        let status = response.as_ref().map(|r| r.status.as_u16()).unwrap_or(0);
        metrics::record_request(route.as_str(), source.as_str(), status, started.elapsed().as_secs_f64());

        FetchOutcome {
            route,
            source,
            response,
            background,
        }
    }
}
