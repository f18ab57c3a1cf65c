// Worker: dispatch table from platform events to handlers
// Author: kelexine (https://github.com/kelexine)

use crate::cache::{CacheStats, GenerationStore};
use crate::config::GenerationConfig;
use crate::error::{OfflineError, Result};
use crate::lifecycle::{ActivationReport, LifecycleController, WorkerState};
use crate::metrics;
use crate::models::{ClientCommand, InterceptedRequest, Notification};
use crate::platform::Platform;
use crate::strategy::{Background, FetchOutcome, ResponseSource, Route, StrategyRouter};
use bytes::Bytes;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{info, warn};
use url::Url;

/// Events the host delivers to the worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// Install a generation set, then activate it immediately.
    Install(Arc<GenerationConfig>),
    Fetch(InterceptedRequest),
    Sync { tag: String },
    Push { data: Option<Bytes> },
    NotificationClick { notification_id: String },
    Message { client_id: String, command: ClientCommand },
}

impl WorkerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerEvent::Install(_) => "install",
            WorkerEvent::Fetch(_) => "fetch",
            WorkerEvent::Sync { .. } => "sync",
            WorkerEvent::Push { .. } => "push",
            WorkerEvent::NotificationClick { .. } => "notificationclick",
            WorkerEvent::Message { .. } => "message",
        }
    }
}

/// What handling an event produced.
#[derive(Debug)]
pub enum EventOutcome {
    Activated(ActivationReport),
    Fetched(FetchOutcome),
    Synced { notified: Option<usize> },
    NotificationShown(Notification),
    ClientFocused(Option<String>),
    MessageHandled { announced_version: Option<String> },
}

/// A generation set that made it through install.
struct Registration {
    router: StrategyRouter,
    controller: LifecycleController,
}

/// The background context: routes every event to its handler and owns the
/// active generation set.
///
/// Only one install/activate sequence runs at a time. While a new set is
/// installing, the previously active one keeps serving; if the install
/// fails, it stays in control.
pub struct OfflineWorker {
    platform: Platform,
    base_url: Url,
    active: RwLock<Option<Arc<Registration>>>,
    lifecycle_lock: Mutex<()>,
}

impl OfflineWorker {
    pub fn new(platform: Platform, base_url: Url) -> Self {
        Self {
            platform,
            base_url,
            active: RwLock::new(None),
            lifecycle_lock: Mutex::new(()),
        }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn active(&self) -> Option<Arc<Registration>> {
        self.active.read().clone()
    }

    fn require_active(&self) -> Result<Arc<Registration>> {
        self.active().ok_or(OfflineError::NotActive)
    }

    pub fn state(&self) -> Option<WorkerState> {
        self.active().map(|r| r.controller.state())
    }

    pub fn active_config(&self) -> Option<GenerationConfig> {
        self.active().map(|r| r.router.config().clone())
    }

    pub async fn cache_stats(&self) -> Option<CacheStats> {
        match self.active() {
            Some(registration) => Some(registration.controller.store().get_stats().await),
            None => None,
        }
    }

    pub async fn entry_counts(&self) -> Option<(usize, usize)> {
        let registration = self.active()?;
        registration.controller.store().entry_counts().await.ok()
    }

    /// Single entry point for every platform event.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome> {
        match event {
            WorkerEvent::Install(config) => self.install(config).await.map(EventOutcome::Activated),
            WorkerEvent::Fetch(request) => Ok(EventOutcome::Fetched(self.fetch(request).await)),
            WorkerEvent::Sync { tag } => {
                let registration = self.require_active()?;
                let notified = registration.controller.on_sync(&tag).await;
                Ok(EventOutcome::Synced { notified })
            }
            WorkerEvent::Push { data } => {
                let registration = self.require_active()?;
                let notification = registration.controller.on_push(data.as_deref()).await?;
                Ok(EventOutcome::NotificationShown(notification))
            }
            WorkerEvent::NotificationClick { notification_id } => {
                let registration = self.require_active()?;
                let focused = registration
                    .controller
                    .on_notification_click(&notification_id)
                    .await?;
                Ok(EventOutcome::ClientFocused(focused))
            }
            WorkerEvent::Message { client_id, command } => {
                let registration = self.require_active()?;
                let announced_version = registration.controller.on_message(&client_id, command).await;
                Ok(EventOutcome::MessageHandled { announced_version })
            }
        }
    }

    /// Install `config`, skip waiting and activate it.
    pub async fn install(&self, config: Arc<GenerationConfig>) -> Result<ActivationReport> {
        let _guard = self.lifecycle_lock.lock().await;

        let store = GenerationStore::new(self.platform.storage.clone(), config);
        let controller = LifecycleController::new(store.clone(), self.platform.clone(), self.base_url.clone());

        if let Err(e) = controller.install().await {
            if self.active().is_some() {
                warn!("Install failed, previous generation stays in control");
            }
            return Err(e);
        }

        let report = controller.activate().await?;
        let router = StrategyRouter::new(store, self.platform.network.clone(), self.platform.scheduler.clone());
        let previous = self
            .active
            .write()
            .replace(Arc::new(Registration { router, controller }));

        if let Some(previous) = previous {
            previous.controller.make_redundant();
        }
        info!("Generation set active, evicted {:?}", report.evicted);
        Ok(report)
    }

    /// Intercept one request. Without an active generation set the request
    /// goes straight to the network.
    pub async fn fetch(&self, request: InterceptedRequest) -> FetchOutcome {
        if let Some(registration) = self.active() {
            return registration.router.handle(request).await;
        }

        let started = Instant::now();
        let route = Route::Static;
        let response = self.platform.network.fetch(&request).await;
        let status = response.as_ref().map(|r| r.status.as_u16()).unwrap_or(0);
        metrics::record_request("uncontrolled", ResponseSource::Passthrough.as_str(), status, started.elapsed().as_secs_f64());

        FetchOutcome {
            route,
            source: ResponseSource::Passthrough,
            response,
            background: Background::default(),
        }
    }
}
