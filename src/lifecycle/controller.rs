// Install/activate lifecycle and background event handlers
// Author: kelexine (https://github.com/kelexine)

use super::WorkerState;
use crate::cache::GenerationStore;
use crate::error::{OfflineError, Result};
use crate::metrics;
use crate::models::{ClientCommand, ClientMessage, InterceptedRequest, Notification, PushPayload, VersionInfo};
use crate::platform::Platform;
use futures::future::join_all;
use http::Method;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use url::Url;

/// What activation cleaned up and took over.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivationReport {
    pub evicted: Vec<String>,
    pub claimed_clients: usize,
}

/// Drives one generation set through install and activation and handles the
/// events that run outside request interception: sync, push, notification
/// clicks and client messages.
pub struct LifecycleController {
    store: GenerationStore,
    platform: Platform,
    base_url: Url,
    state: RwLock<WorkerState>,
}

impl LifecycleController {
    pub fn new(store: GenerationStore, platform: Platform, base_url: Url) -> Self {
        Self {
            store,
            platform,
            base_url,
            state: RwLock::new(WorkerState::Installing),
        }
    }

    pub fn state(&self) -> WorkerState {
        *self.state.read()
    }

    pub fn store(&self) -> &GenerationStore {
        &self.store
    }

    fn transition(&self, next: WorkerState) -> Result<()> {
        let mut state = self.state.write();
        if !state.can_transition_to(next) {
            return Err(OfflineError::Internal(format!(
                "invalid lifecycle transition {} -> {}",
                *state, next
            )));
        }
        info!("Worker '{}': {} -> {}", self.store.config().static_name, *state, next);
        *state = next;
        metrics::record_lifecycle(next.as_str());
        Ok(())
    }

    /// Mark this instance as superseded or failed.
    pub fn make_redundant(&self) {
        if let Err(e) = self.transition(WorkerState::Redundant) {
            debug!("{}", e);
        }
    }

    /// Create both generations and pre-cache the static manifest.
    ///
    /// Every manifest entry must come back `ok`; otherwise nothing is written
    /// and the instance becomes redundant.
    pub async fn install(&self) -> Result<()> {
        match self.precache_manifest().await {
            Ok(()) => self.transition(WorkerState::Installed),
            Err(e) => {
                error!("Cache addAll failed: {}", e);
                self.make_redundant();
                Err(e)
            }
        }
    }

    async fn precache_manifest(&self) -> Result<()> {
        let config = self.store.config();
        self.store.open_current().await?;
        info!("Caching {} static resources", config.manifest.len());

        let requests = config
            .manifest
            .iter()
            .map(|target| InterceptedRequest::resolve(Method::GET, &self.base_url, target))
            .collect::<Result<Vec<_>>>()?;

        let network = &self.platform.network;
        let responses = join_all(requests.iter().map(|req| network.fetch(req))).await;

        let mut entries = Vec::with_capacity(requests.len());
        for (request, response) in requests.into_iter().zip(responses) {
            let response = response.map_err(|e| OfflineError::Install(e.to_string()))?;
            if !response.ok() {
                return Err(OfflineError::Install(format!(
                    "{} answered {}",
                    request.url, response.status
                )));
            }
            entries.push((request, response));
        }

        self.store.precache(entries).await
    }

    /// Evict superseded generations and claim every client.
    pub async fn activate(&self) -> Result<ActivationReport> {
        self.transition(WorkerState::Activating)?;

        let evicted = match self.store.evict_superseded().await {
            Ok(evicted) => evicted,
            Err(e) => {
                self.make_redundant();
                return Err(e);
            }
        };
        let claimed_clients = self.platform.clients.claim().await;

        self.transition(WorkerState::Active)?;
        Ok(ActivationReport {
            evicted,
            claimed_clients,
        })
    }

    /// Sync fired. Nothing is replayed; clients are told the sync happened.
    /// Returns how many clients were notified, `None` for unknown tags.
    pub async fn on_sync(&self, tag: &str) -> Option<usize> {
        let config = self.store.config();
        if tag != config.sync_tag {
            debug!("Ignoring sync event with unknown tag '{}'", tag);
            return None;
        }
        info!("Background sync triggered");
        let notified = self
            .platform
            .clients
            .broadcast(ClientMessage::SyncComplete {
                message: config.sync_complete_message.clone(),
            })
            .await;
        Some(notified)
    }

    /// Show a notification for a push event.
    pub async fn on_push(&self, data: Option<&[u8]>) -> Result<Notification> {
        let config = self.store.config();
        let (title, options) = PushPayload::parse(data)
            .into_notification(&config.push_defaults, &config.notification_icon, &config.notification_badge);
        self.platform.notifier.show(&title, options).await
    }

    /// Dismiss the notification and focus a client on its url.
    pub async fn on_notification_click(&self, notification_id: &str) -> Result<Option<String>> {
        let notification = self
            .platform
            .notifier
            .close(notification_id)
            .await
            .ok_or_else(|| OfflineError::NotificationNotFound(notification_id.to_string()))?;
        self.platform
            .clients
            .open_window(&notification.options.data.url)
            .await
    }

    /// Handle a message from a client. Returns the version announced to it, if any.
    pub async fn on_message(&self, client_id: &str, command: ClientCommand) -> Option<String> {
        match command {
            ClientCommand::CheckUpdate => match self.check_for_update(client_id).await {
                Ok(announced) => announced,
                Err(e) => {
                    error!("Error checking for update: {}", e);
                    None
                }
            },
        }
    }

    async fn check_for_update(&self, client_id: &str) -> Result<Option<String>> {
        let config = self.store.config();
        let request = InterceptedRequest::resolve(Method::GET, &self.base_url, &config.version_endpoint)?;
        let response = self.platform.network.fetch(&request).await?;
        let info: VersionInfo = response.json_body()?;

        if info.version == config.static_name {
            debug!("Running generation '{}' is current", info.version);
            return Ok(None);
        }

        let delivered = self
            .platform
            .clients
            .post_message(
                client_id,
                ClientMessage::UpdateAvailable {
                    version: info.version.clone(),
                },
            )
            .await;
        if !delivered {
            warn!("Client {} went away before the update notice", client_id);
        }
        Ok(Some(info.version))
    }
}
