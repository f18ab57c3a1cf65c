//! Boundaries between the interception core and its host.
//!
//! The strategies and the lifecycle controller only ever talk to the traits
//! defined here, so the decision logic runs the same against the real
//! upstream and against in-process stubs.
//!
//! - `network`: upstream fetches over reqwest
//! - `scheduler`: deferred sync intents and the connectivity probe
//! - `clients`: registered foreground clients and message delivery
//! - `notifications`: notifications shown for push events
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod clients;
pub mod network;
pub mod notifications;
pub mod scheduler;

pub use clients::ClientRegistry;
pub use network::HttpNetwork;
pub use notifications::NotificationCenter;
pub use scheduler::SyncManager;

use crate::cache::CacheStorage;
use crate::error::Result;
use crate::models::{ClientMessage, FetchResponse, InterceptedRequest, Notification, NotificationOptions};
use async_trait::async_trait;
use std::sync::Arc;

/// Network boundary. `Err` means the request never produced a response
/// (connection refused, DNS, timeout); HTTP error statuses are `Ok`.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<FetchResponse>;
}

/// Deferred-execution scheduler.
#[async_trait]
pub trait SyncScheduler: Send + Sync {
    /// Register a sync intent. Returns `false` when an intent with the same
    /// tag was already pending and this call collapsed into it.
    async fn register(&self, tag: &str) -> Result<bool>;

    /// Tags registered and not yet fired.
    async fn pending(&self) -> Vec<String>;
}

/// Foreground clients controlled by the worker.
#[async_trait]
pub trait Clients: Send + Sync {
    /// Post to every controlled client. Returns how many received it.
    async fn broadcast(&self, message: ClientMessage) -> usize;

    /// Post to one client. Returns `false` when it is gone.
    async fn post_message(&self, client_id: &str, message: ClientMessage) -> bool;

    /// Take control of every connected client. Returns how many were claimed.
    async fn claim(&self) -> usize;

    /// Focus a client on `url`, returning the client that was asked to.
    async fn open_window(&self, url: &str) -> Result<Option<String>>;
}

/// System notification surface.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, title: &str, options: NotificationOptions) -> Result<Notification>;

    /// Dismiss a notification, returning it if it was on display.
    async fn close(&self, id: &str) -> Option<Notification>;

    async fn list(&self) -> Vec<Notification>;
}

/// Everything a worker instance needs from its host.
#[derive(Clone)]
pub struct Platform {
    pub storage: Arc<dyn CacheStorage>,
    pub network: Arc<dyn Network>,
    pub scheduler: Arc<dyn SyncScheduler>,
    pub clients: Arc<dyn Clients>,
    pub notifier: Arc<dyn Notifier>,
}
