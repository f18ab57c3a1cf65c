// Registry of connected foreground clients
// Author: kelexine (https://github.com/kelexine)

use super::Clients;
use crate::error::Result;
use crate::metrics;
use crate::models::ClientMessage;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info};

struct ClientEntry {
    sender: mpsc::UnboundedSender<ClientMessage>,
    url: Option<String>,
    controlled: bool,
    /// Registration order, used to pick the most recent client to focus
    seq: u64,
}

/// Connected clients, each with a message channel.
///
/// Clients that connect before activation stay uncontrolled until
/// [`Clients::claim`]; after the first claim every new client is controlled
/// on arrival.
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<String, ClientEntry>>,
    claimed: AtomicBool,
    next_seq: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client and return the receiving end of its message channel.
    /// Re-registering an id replaces the previous channel.
    pub fn register(&self, client_id: &str, url: Option<String>) -> mpsc::UnboundedReceiver<ClientMessage> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let entry = ClientEntry {
            sender,
            url,
            controlled: self.claimed.load(Ordering::SeqCst),
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
        };
        debug!("Client {} connected (controlled: {})", client_id, entry.controlled);
        self.clients.write().insert(client_id.to_string(), entry);
        receiver
    }

    pub fn unregister(&self, client_id: &str) {
        if self.clients.write().remove(client_id).is_some() {
            debug!("Client {} disconnected", client_id);
        }
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_controlled(&self, client_id: &str) -> bool {
        self.clients.read().get(client_id).map(|c| c.controlled).unwrap_or(false)
    }

    /// Send to one entry, pruning it when its receiver is gone.
    fn deliver(&self, client_id: &str, message: ClientMessage) -> bool {
        let delivered = match self.clients.read().get(client_id) {
            Some(entry) => entry.sender.send(message.clone()).is_ok(),
            None => false,
        };
        if !delivered {
            self.unregister(client_id);
        }
        metrics::record_client_message(message.kind(), delivered);
        delivered
    }
}

#[async_trait]
impl Clients for ClientRegistry {
    async fn broadcast(&self, message: ClientMessage) -> usize {
        let targets: Vec<String> = self
            .clients
            .read()
            .iter()
            .filter(|(_, c)| c.controlled)
            .map(|(id, _)| id.clone())
            .collect();

        let delivered = targets
            .iter()
            .filter(|id| self.deliver(id, message.clone()))
            .count();
        debug!("Broadcast {} to {} clients", message.kind(), delivered);
        delivered
    }

    async fn post_message(&self, client_id: &str, message: ClientMessage) -> bool {
        self.deliver(client_id, message)
    }

    async fn claim(&self) -> usize {
        self.claimed.store(true, Ordering::SeqCst);
        let mut clients = self.clients.write();
        let mut claimed = 0;
        for entry in clients.values_mut().filter(|c| !c.controlled) {
            entry.controlled = true;
            claimed += 1;
        }
        info!("Claimed {} clients", claimed);
        claimed
    }

    async fn open_window(&self, url: &str) -> Result<Option<String>> {
        // Prefer a client already showing the url, else the newest one
        let target = {
            let clients = self.clients.read();
            clients
                .iter()
                .find(|(_, c)| c.url.as_deref() == Some(url))
                .or_else(|| clients.iter().max_by_key(|(_, c)| c.seq))
                .map(|(id, _)| id.clone())
        };

        let Some(client_id) = target else {
            info!("No client connected to open {}", url);
            return Ok(None);
        };

        let delivered = self.deliver(&client_id, ClientMessage::Navigate { url: url.to_string() });
        if delivered {
            if let Some(entry) = self.clients.write().get_mut(&client_id) {
                entry.url = Some(url.to_string());
            }
            Ok(Some(client_id))
        } else {
            Ok(None)
        }
    }
}
