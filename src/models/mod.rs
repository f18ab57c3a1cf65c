//! Data models shared by the interception core.
//!
//! - `request`: intercepted requests and their canonical cache identity
//! - `response`: immutable response snapshots and synthetic fallbacks
//! - `messages`: client messages, push payloads and notifications

// Author: kelexine (https://github.com/kelexine)

pub mod messages;
pub mod request;
pub mod response;

pub use messages::{
    ClientCommand, ClientMessage, Notification, NotificationData, NotificationOptions,
    PushPayload, VersionInfo,
};
pub use request::{InterceptedRequest, RequestKey};
pub use response::{FetchResponse, ResponseType};
