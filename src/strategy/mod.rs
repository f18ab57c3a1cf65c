//! Request-interception decision engine.
//!
//! Every intercepted request is classified by [`router::classify`] and
//! answered by exactly one strategy:
//!
//! - `cache_first`: static assets, served from the static generation
//!   whenever an entry exists.
//! - `network_primary`: API calls, answered from the API generation at once
//!   when possible while a network fetch refreshes it.
//! - `deferred`: side path for mutating API calls that registers a sync
//!   intent when the network is down.
//!
//! A strategy hands back the response together with a [`Background`] handle
//! on the work it left running (cache writes, refresh fetches, retry
//! attempts). The two complete independently; nothing orders a cache write
//! before or after the response reaches the caller.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod cache_first;
pub mod deferred;
pub mod network_primary;
pub mod router;

pub use cache_first::CacheFirst;
pub use deferred::DeferredRetryTrigger;
pub use network_primary::NetworkPrimary;
pub use router::{classify, StrategyRouter};

use crate::error::Result;
use crate::models::FetchResponse;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::warn;

/// Which strategy an intercepted request was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Static,
    Api,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Static => "static",
            Route::Api => "api",
        }
    }
}

/// Where the response handed to the caller came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
    /// Synthetic offline notice or offline JSON error
    OfflineFallback,
    /// The network failure was passed through to the caller
    Failed,
    /// No worker was active; the request went straight to the network
    Passthrough,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Cache => "cache",
            ResponseSource::Network => "network",
            ResponseSource::OfflineFallback => "offline_fallback",
            ResponseSource::Failed => "failed",
            ResponseSource::Passthrough => "passthrough",
        }
    }
}

/// Work a strategy left running after producing its response.
///
/// Dropping a `Background` detaches the tasks; they still run to completion.
#[derive(Debug, Default)]
pub struct Background {
    tasks: Vec<JoinHandle<()>>,
}

impl Background {
    pub fn push(&mut self, task: JoinHandle<()>) {
        self.tasks.push(task);
    }

    pub fn extend(&mut self, other: Background) {
        self.tasks.extend(other.tasks);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every background task to finish.
    pub async fn settle(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!("Background task did not complete: {}", e);
            }
        }
    }
}

/// Result of one intercepted request.
#[derive(Debug)]
pub struct FetchOutcome {
    pub route: Route,
    pub source: ResponseSource,
    /// `Err` only when a network failure is passed through to the caller.
    pub response: Result<FetchResponse>,
    pub background: Background,
}
