// Client messages, push payloads and notifications
// Author: kelexine (https://github.com/kelexine)

use crate::config::PushDefaults;
use serde::{Deserialize, Serialize};

/// Message sent from the background controller to foreground clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    SyncComplete { message: String },
    UpdateAvailable { version: String },
    /// Ask a client to focus itself on `url` (notification click).
    Navigate { url: String },
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::SyncComplete { .. } => "sync-complete",
            ClientMessage::UpdateAvailable { .. } => "update-available",
            ClientMessage::Navigate { .. } => "navigate",
        }
    }
}

/// Message sent by a client to the background controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientCommand {
    CheckUpdate,
}

/// Body of `/api/version`.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    pub version: String,
}

/// Payload delivered with a push event. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub url: Option<String>,
}

impl PushPayload {
    /// Parse raw push data. Absent or malformed data yields the empty payload,
    /// which resolves to the configured defaults.
    pub fn parse(data: Option<&[u8]>) -> Self {
        match data {
            Some(bytes) if !bytes.is_empty() => serde_json::from_slice(bytes).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed push payload: {}", e);
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    pub fn into_notification(self, defaults: &PushDefaults, icon: &str, badge: &str) -> (String, NotificationOptions) {
        let options = NotificationOptions {
            body: self.body.unwrap_or_else(|| defaults.body.clone()),
            icon: icon.to_string(),
            badge: badge.to_string(),
            data: NotificationData {
                url: self.url.unwrap_or_else(|| defaults.url.clone()),
            },
        };
        (self.title.unwrap_or_else(|| defaults.title.clone()), options)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub data: NotificationData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    pub url: String,
}

/// A notification currently on display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub options: NotificationOptions,
    pub shown_at: chrono::DateTime<chrono::Utc>,
}
