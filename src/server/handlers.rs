// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::error::{OfflineError, Result};
use crate::models::{ClientCommand, FetchResponse, InterceptedRequest};
use crate::platform::{Notifier, SyncScheduler};
use crate::strategy::ResponseSource;
use crate::worker::{EventOutcome, WorkerEvent};
use axum::{
    body::{Body, Bytes},
    extract::{Path, Query, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};

/// Header telling the page where its response came from.
pub const SOURCE_HEADER: &str = "x-firecache-source";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HashMap<String, HealthCheck>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = HashMap::new();
    let mut overall_status = HealthStatus::Healthy;

    // Worker lifecycle
    let worker_check = match (state.worker.state(), state.worker.active_config()) {
        (Some(worker_state), Some(config)) => HealthCheck {
            status: "ok".to_string(),
            message: format!("{} ({} / {})", worker_state, config.static_name, config.api_name),
        },
        _ => {
            overall_status = HealthStatus::Unhealthy;
            HealthCheck {
                status: "error".to_string(),
                message: "No active generation, requests pass through uncached".to_string(),
            }
        }
    };
    checks.insert("worker".to_string(), worker_check);

    // Cache generations
    if let (Some((static_entries, api_entries)), Some(stats)) =
        (state.worker.entry_counts().await, state.worker.cache_stats().await)
    {
        let cache_check = HealthCheck {
            status: if stats.write_failures > 0 { "warning" } else { "ok" }.to_string(),
            message: format!(
                "{} static / {} api entries, {} hits, {} misses, {} write failures",
                static_entries, api_entries, stats.hits, stats.misses, stats.write_failures
            ),
        };
        checks.insert("cache".to_string(), cache_check);
    }

    // Pending sync intents
    let pending = state.scheduler.pending().await;
    let sync_check = if pending.is_empty() {
        HealthCheck {
            status: "ok".to_string(),
            message: "No pending sync".to_string(),
        }
    } else {
        if matches!(overall_status, HealthStatus::Healthy) {
            overall_status = HealthStatus::Degraded;
        }
        HealthCheck {
            status: "warning".to_string(),
            message: format!("Waiting for connectivity: {}", pending.join(", ")),
        }
    };
    checks.insert("sync".to_string(), sync_check);

    checks.insert(
        "clients".to_string(),
        HealthCheck {
            status: "ok".to_string(),
            message: format!("{} connected", state.clients.len()),
        },
    );

    Json(HealthResponse {
        status: overall_status,
        checks,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::gather_metrics(),
    )
}

/// Fallback handler: every request not addressed to the control routes is
/// intercepted and answered by the worker.
pub async fn intercept_handler(State(state): State<AppState>, request: Request) -> Result<Response> {
    let (parts, body) = request.into_parts();

    let body = axum::body::to_bytes(body, state.config.server.body_limit_bytes)
        .await
        .map_err(|e| OfflineError::InvalidRequest(format!("request body: {}", e)))?;

    // Keep the upstream origin; only path and query come from the page
    let mut url = state.worker.base_url().clone();
    url.set_path(parts.uri.path());
    url.set_query(parts.uri.query());

    let request = InterceptedRequest::new(parts.method, url)
        .with_headers(parts.headers)
        .with_body(body);

    let outcome = state.worker.fetch(request).await;
    debug!(
        "Answered {} request from {} ({} background tasks)",
        outcome.route.as_str(),
        outcome.source.as_str(),
        outcome.background.len()
    );

    // Background work is detached and keeps running after the reply
    Ok(into_http_response(outcome.response?, outcome.source))
}

fn into_http_response(response: FetchResponse, source: ResponseSource) -> Response {
    let mut headers = response.headers;
    headers.remove(header::CONTENT_LENGTH);
    headers.insert(SOURCE_HEADER, HeaderValue::from_static(source.as_str()));

    let mut http_response = Response::new(Body::from(response.body));
    *http_response.status_mut() = response.status;
    *http_response.headers_mut() = headers;
    http_response
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub client_id: Option<String>,
    pub url: Option<String>,
}

/// Removes the client from the registry when its event stream is dropped.
struct ClientGuard {
    registry: Arc<crate::platform::ClientRegistry>,
    client_id: String,
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.registry.unregister(&self.client_id);
    }
}

/// SSE stream of client messages. Connecting registers the client.
pub async fn events_handler(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let client_id = query
        .client_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let mut receiver = state.clients.register(&client_id, query.url);
    let registry = state.clients.clone();

    let stream = async_stream::stream! {
        let _guard = ClientGuard { registry, client_id: client_id.clone() };
        yield Ok(Event::default()
            .event("registered")
            .data(json!({ "client_id": client_id }).to_string()));

        while let Some(message) = receiver.recv().await {
            match Event::default().event(message.kind()).json_data(&message) {
                Ok(event) => yield Ok(event),
                Err(e) => warn!("Dropping unserializable client message: {}", e),
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
pub struct ClientMessageRequest {
    pub client_id: String,
    #[serde(flatten)]
    pub command: ClientCommand,
}

/// Client -> worker message. Always accepted; results reach the client over
/// its event stream, failures are only logged.
pub async fn message_handler(
    State(state): State<AppState>,
    Json(request): Json<ClientMessageRequest>,
) -> StatusCode {
    let event = WorkerEvent::Message {
        client_id: request.client_id,
        command: request.command,
    };
    if let Err(e) = state.worker.dispatch(event).await {
        warn!("Client message not handled: {}", e);
    }
    StatusCode::ACCEPTED
}

pub async fn push_handler(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let data = if body.is_empty() { None } else { Some(body) };
    match state.worker.dispatch(WorkerEvent::Push { data }).await? {
        EventOutcome::NotificationShown(notification) => {
            Ok((StatusCode::CREATED, Json(notification)).into_response())
        }
        other => Err(unexpected(other)),
    }
}

pub async fn notifications_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.notifier.list().await)
}

pub async fn notification_click_handler(
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
) -> Result<Response> {
    match state
        .worker
        .dispatch(WorkerEvent::NotificationClick { notification_id })
        .await?
    {
        EventOutcome::ClientFocused(client_id) => {
            Ok(Json(json!({ "focused_client": client_id })).into_response())
        }
        other => Err(unexpected(other)),
    }
}

/// Fire a sync event by hand, as the scheduler would.
pub async fn sync_handler(State(state): State<AppState>, Path(tag): Path<String>) -> Result<Response> {
    match state.worker.dispatch(WorkerEvent::Sync { tag }).await? {
        EventOutcome::Synced { notified } => Ok(Json(json!({ "notified": notified })).into_response()),
        other => Err(unexpected(other)),
    }
}

fn unexpected(outcome: EventOutcome) -> OfflineError {
    OfflineError::Internal(format!("unexpected event outcome: {:?}", outcome))
}
