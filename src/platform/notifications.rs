// Notification surface for push events
// Author: kelexine (https://github.com/kelexine)

use super::Notifier;
use crate::error::Result;
use crate::models::{Notification, NotificationOptions};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info};

/// Keeps the notifications currently on display, keyed by id.
#[derive(Default)]
pub struct NotificationCenter {
    shown: RwLock<HashMap<String, Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Notifier for NotificationCenter {
    async fn show(&self, title: &str, options: NotificationOptions) -> Result<Notification> {
        let notification = Notification {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            options,
            shown_at: chrono::Utc::now(),
        };
        info!(
            "Showing notification '{}': {} -> {}",
            notification.title, notification.options.body, notification.options.data.url
        );
        self.shown
            .write()
            .insert(notification.id.clone(), notification.clone());
        Ok(notification)
    }

    async fn close(&self, id: &str) -> Option<Notification> {
        let closed = self.shown.write().remove(id);
        if closed.is_some() {
            debug!("Closed notification {}", id);
        }
        closed
    }

    async fn list(&self) -> Vec<Notification> {
        let mut all: Vec<Notification> = self.shown.read().values().cloned().collect();
        all.sort_by_key(|n| n.shown_at);
        all
    }
}
