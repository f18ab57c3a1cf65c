//! Axum-based interception server.
//!
//! The dashboard page is pointed at this server instead of the application
//! server. Every request it makes lands in the fallback handler and goes
//! through the worker's strategy router; a handful of control routes under
//! `/__offline/` carry the background messaging (client event streams,
//! client messages, push delivery, notification clicks, manual sync).
//!
//! # Components
//!
//! - `handlers`: interception fallback and the control endpoints.
//! - `middleware`: request ID tracking.
//! - `routes`: router assembly and shared state.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use handlers::SOURCE_HEADER;
pub use routes::{create_router, AppState};
