// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{
    events_handler, health_handler, intercept_handler, message_handler, metrics_handler,
    notification_click_handler, notifications_handler, push_handler, sync_handler,
};
use super::middleware::request_id_layers;
use crate::config::AppConfig;
use crate::platform::{ClientRegistry, NotificationCenter, SyncManager};
use crate::worker::OfflineWorker;
use axum::{routing::{get, post}, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub worker: Arc<OfflineWorker>,
    pub clients: Arc<ClientRegistry>,
    pub notifier: Arc<NotificationCenter>,
    pub scheduler: Arc<SyncManager>,
}

pub fn create_router(state: AppState) -> Router {
    let (set_request_id, propagate_request_id) = request_id_layers();
    let body_limit = state.config.server.body_limit_bytes;

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/__offline/events", get(events_handler))
        .route("/__offline/message", post(message_handler))
        .route("/__offline/push", post(push_handler))
        .route("/__offline/notifications", get(notifications_handler))
        .route("/__offline/notifications/:id/click", post(notification_click_handler))
        .route("/__offline/sync/:tag", post(sync_handler))
        // Everything else belongs to the dashboard and is intercepted
        .fallback(intercept_handler)
        .layer(tower_http::limit::RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state)
}
