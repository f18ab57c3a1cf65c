// Lifecycle and worker event tests
// Author: kelexine (https://github.com/kelexine)

mod common;

use common::*;
use firecache::cache::{CacheGeneration, CacheStorage, GenerationKind};
use firecache::config::GenerationConfig;
use firecache::error::OfflineError;
use firecache::lifecycle::{LifecycleController, WorkerState};
use firecache::models::{ClientCommand, ClientMessage, FetchResponse};
use firecache::platform::{Notifier, SyncScheduler};
use firecache::strategy::ResponseSource;
use firecache::worker::{EventOutcome, WorkerEvent};
use http::StatusCode;
use std::sync::Arc;

async fn install(harness: &Harness, config: GenerationConfig) -> firecache::error::Result<EventOutcome> {
    harness.worker.dispatch(WorkerEvent::Install(Arc::new(config))).await
}

// ============================================================================
// INSTALL & ACTIVATE
// ============================================================================

#[tokio::test]
async fn test_install_precaches_manifest() {
    let network = dashboard_network();
    let harness = Harness::new(network.clone());

    let outcome = install(&harness, test_config()).await.unwrap();
    assert!(matches!(outcome, EventOutcome::Activated(_)));
    assert_eq!(harness.worker.state(), Some(WorkerState::Active));
    assert_eq!(harness.worker.entry_counts().await, Some((2, 0)));

    // Offline, both manifest pages come from the static generation
    network.set_online(false);
    for path in ["/", "/fires"] {
        let outcome = harness.worker.fetch(get(path)).await;
        assert_eq!(outcome.source, ResponseSource::Cache, "{}", path);
    }
}

#[tokio::test]
async fn test_install_fails_when_any_manifest_entry_fails() {
    let network = dashboard_network();
    let harness = Harness::new(network.clone());
    let config = GenerationConfig {
        manifest: vec!["/".to_string(), "/missing.css".to_string()],
        ..Default::default()
    };

    let err = install(&harness, config).await.unwrap_err();
    assert!(matches!(err, OfflineError::Install(_)));
    assert_eq!(harness.worker.state(), None);

    // Nothing was written, not even the entry that succeeded
    let generation = harness.storage.open("forest-fires-cache-v2").await.unwrap();
    assert_eq!(generation.len().await, 0);

    // Without an active set requests pass straight through
    let outcome = harness.worker.fetch(get("/")).await;
    assert_eq!(outcome.source, ResponseSource::Passthrough);
    assert_eq!(outcome.response.unwrap().text(), "<h1>Dashboard</h1>");
}

#[tokio::test]
async fn test_install_fails_offline() {
    let network = dashboard_network();
    network.set_online(false);
    let harness = Harness::new(network);

    let err = install(&harness, test_config()).await.unwrap_err();
    assert!(matches!(err, OfflineError::Install(_)));
}

#[tokio::test]
async fn test_failed_reinstall_keeps_previous_set() {
    let network = dashboard_network();
    let harness = Harness::new(network.clone());
    install(&harness, test_config()).await.unwrap();

    let next = GenerationConfig {
        static_name: "forest-fires-cache-v3".to_string(),
        api_name: "forest-fires-api-cache-v3".to_string(),
        manifest: vec!["/gone".to_string()],
        ..Default::default()
    };
    assert!(install(&harness, next).await.is_err());

    assert_eq!(harness.worker.state(), Some(WorkerState::Active));
    let active = harness.worker.active_config().unwrap();
    assert_eq!(active.static_name, "forest-fires-cache-v2");
    assert!(harness.storage.has("forest-fires-cache-v2").await.unwrap());
}

#[tokio::test]
async fn test_activation_evicts_only_superseded_generations() {
    let harness = Harness::new(dashboard_network());
    for name in ["forest-fires-cache-v1", "forest-fires-api-cache-v1", "unrelated-cache"] {
        harness.storage.open(name).await.unwrap();
    }

    let EventOutcome::Activated(report) = install(&harness, test_config()).await.unwrap() else {
        panic!("expected activation");
    };

    let mut evicted = report.evicted.clone();
    evicted.sort();
    assert_eq!(
        evicted,
        vec!["forest-fires-api-cache-v1", "forest-fires-cache-v1", "unrelated-cache"]
    );
    assert_eq!(
        harness.storage.keys().await.unwrap(),
        vec!["forest-fires-api-cache-v2", "forest-fires-cache-v2"]
    );
}

#[tokio::test]
async fn test_upgrade_replaces_active_generation_set() {
    let network = dashboard_network();
    network.route_json("/api/fires", r#"{"count":3}"#);
    network.route("/logs", FetchResponse::new(StatusCode::OK, "<h1>Logs</h1>"));
    let harness = Harness::new(network.clone());
    install(&harness, test_config()).await.unwrap();

    let warm = harness.worker.fetch(get("/api/fires")).await;
    assert_eq!(warm.source, ResponseSource::Network);
    warm.background.settle().await;

    let next = GenerationConfig {
        static_name: "forest-fires-cache-v3".to_string(),
        api_name: "forest-fires-api-cache-v3".to_string(),
        manifest: vec!["/logs".to_string()],
        ..Default::default()
    };
    let EventOutcome::Activated(report) = install(&harness, next).await.unwrap() else {
        panic!("expected activation");
    };

    let mut evicted = report.evicted.clone();
    evicted.sort();
    assert_eq!(evicted, vec!["forest-fires-api-cache-v2", "forest-fires-cache-v2"]);
    assert_eq!(
        harness.storage.keys().await.unwrap(),
        vec!["forest-fires-api-cache-v3", "forest-fires-cache-v3"]
    );
    assert_eq!(harness.worker.state(), Some(WorkerState::Active));
    assert_eq!(harness.worker.active_config().unwrap().static_name, "forest-fires-cache-v3");
    assert_eq!(harness.worker.entry_counts().await, Some((1, 0)));

    // Entries only the v2 set held are gone with it
    network.set_online(false);
    let page = harness.worker.fetch(get("/fires")).await;
    assert_eq!(page.source, ResponseSource::OfflineFallback);
    let api = harness.worker.fetch(get("/api/fires")).await;
    assert_eq!(api.source, ResponseSource::OfflineFallback);
    assert_eq!(api.response.unwrap().status, StatusCode::SERVICE_UNAVAILABLE);

    let logs = harness.worker.fetch(get("/logs")).await;
    assert_eq!(logs.source, ResponseSource::Cache);
}

#[tokio::test]
async fn test_superseded_controller_becomes_redundant() {
    let harness = Harness::new(dashboard_network());
    let store = harness.store();
    let controller = LifecycleController::new(store, harness.worker.platform().clone(), base());

    controller.install().await.unwrap();
    controller.activate().await.unwrap();
    assert_eq!(controller.state(), WorkerState::Active);

    controller.make_redundant();
    assert_eq!(controller.state(), WorkerState::Redundant);
}

#[tokio::test]
async fn test_activation_claims_open_clients() {
    let harness = Harness::new(dashboard_network());
    let _rx = harness.clients.register("tab-1", Some("/".to_string()));
    assert!(!harness.clients.is_controlled("tab-1"));

    let EventOutcome::Activated(report) = install(&harness, test_config()).await.unwrap() else {
        panic!("expected activation");
    };
    assert_eq!(report.claimed_clients, 1);
    assert!(harness.clients.is_controlled("tab-1"));

    // Clients that arrive later are controlled from the start
    let _rx2 = harness.clients.register("tab-2", None);
    assert!(harness.clients.is_controlled("tab-2"));
}

#[tokio::test]
async fn test_events_before_install_are_rejected() {
    let harness = Harness::new(dashboard_network());
    let err = harness
        .worker
        .dispatch(WorkerEvent::Sync {
            tag: "sync-fires".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OfflineError::NotActive));
}

// ============================================================================
// SYNC
// ============================================================================

#[tokio::test]
async fn test_sync_broadcasts_completion_to_controlled_clients() {
    let harness = Harness::new(dashboard_network());
    let mut rx = harness.clients.register("tab-1", None);
    install(&harness, test_config()).await.unwrap();

    let outcome = harness
        .worker
        .dispatch(WorkerEvent::Sync {
            tag: "sync-fires".to_string(),
        })
        .await
        .unwrap();
    assert!(matches!(outcome, EventOutcome::Synced { notified: Some(1) }));
    assert_eq!(
        rx.recv().await.unwrap(),
        ClientMessage::SyncComplete {
            message: "Data synchronized".to_string()
        }
    );
}

#[tokio::test]
async fn test_sync_with_other_tag_is_ignored() {
    let harness = Harness::new(dashboard_network());
    let mut rx = harness.clients.register("tab-1", None);
    install(&harness, test_config()).await.unwrap();

    let outcome = harness
        .worker
        .dispatch(WorkerEvent::Sync {
            tag: "sync-logs".to_string(),
        })
        .await
        .unwrap();
    assert!(matches!(outcome, EventOutcome::Synced { notified: None }));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_sync_manager_fires_pending_tag_once_reachable() {
    let network = dashboard_network();
    let harness = Harness::new(network.clone());
    harness.scheduler.register("sync-fires").await.unwrap();

    let (tx, mut rx) = tokio::sync::mpsc::channel(4);
    let config = firecache::config::SyncConfig {
        initial_interval_ms: 5,
        ..Default::default()
    };
    let scheduler = harness.scheduler.clone();
    let task = tokio::spawn(scheduler.run(network, get("/api/version"), config, tx));

    assert_eq!(rx.recv().await.unwrap(), "sync-fires");
    assert!(harness.scheduler.pending().await.is_empty());
    task.abort();
}

// ============================================================================
// PUSH & NOTIFICATION CLICK
// ============================================================================

#[tokio::test]
async fn test_push_then_click_focuses_client_on_payload_url() {
    let harness = Harness::new(dashboard_network());
    let mut rx = harness.clients.register("tab-1", Some("/".to_string()));
    install(&harness, test_config()).await.unwrap();

    let payload = br#"{"title":"X","body":"Y","url":"/fires"}"#;
    let EventOutcome::NotificationShown(notification) = harness
        .worker
        .dispatch(WorkerEvent::Push {
            data: Some(bytes::Bytes::from_static(payload)),
        })
        .await
        .unwrap()
    else {
        panic!("expected a notification");
    };
    assert_eq!(notification.title, "X");
    assert_eq!(notification.options.body, "Y");
    assert_eq!(notification.options.icon, "/static/icon-192.png");
    assert_eq!(notification.options.badge, "/static/icon-192.png");

    let outcome = harness
        .worker
        .dispatch(WorkerEvent::NotificationClick {
            notification_id: notification.id.clone(),
        })
        .await
        .unwrap();
    assert!(matches!(outcome, EventOutcome::ClientFocused(Some(ref id)) if id == "tab-1"));
    assert_eq!(
        rx.recv().await.unwrap(),
        ClientMessage::Navigate {
            url: "/fires".to_string()
        }
    );
    assert!(harness.notifier.list().await.is_empty());
}

#[tokio::test]
async fn test_push_uses_configured_icon_and_badge() {
    let harness = Harness::new(dashboard_network());
    let config = GenerationConfig {
        notification_icon: "/static/icon-512.png".to_string(),
        notification_badge: "/static/badge-72.png".to_string(),
        ..test_config()
    };
    install(&harness, config).await.unwrap();

    let EventOutcome::NotificationShown(notification) =
        harness.worker.dispatch(WorkerEvent::Push { data: None }).await.unwrap()
    else {
        panic!("expected a notification");
    };
    assert_eq!(notification.options.icon, "/static/icon-512.png");
    assert_eq!(notification.options.badge, "/static/badge-72.png");
}

#[tokio::test]
async fn test_push_without_payload_uses_defaults() {
    let harness = Harness::new(dashboard_network());
    install(&harness, test_config()).await.unwrap();

    for data in [None, Some(bytes::Bytes::from_static(b"not json"))] {
        let EventOutcome::NotificationShown(notification) =
            harness.worker.dispatch(WorkerEvent::Push { data }).await.unwrap()
        else {
            panic!("expected a notification");
        };
        assert_eq!(notification.title, "Update");
        assert_eq!(notification.options.body, "Data updated");
        assert_eq!(notification.options.data.url, "/fires");
    }
    assert_eq!(harness.notifier.list().await.len(), 2);
}

#[tokio::test]
async fn test_click_on_unknown_notification() {
    let harness = Harness::new(dashboard_network());
    install(&harness, test_config()).await.unwrap();

    let err = harness
        .worker
        .dispatch(WorkerEvent::NotificationClick {
            notification_id: "nope".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OfflineError::NotificationNotFound(_)));
}

// ============================================================================
// CHECK_UPDATE
// ============================================================================

async fn check_update(harness: &Harness, client_id: &str) -> Option<String> {
    let outcome = harness
        .worker
        .dispatch(WorkerEvent::Message {
            client_id: client_id.to_string(),
            command: ClientCommand::CheckUpdate,
        })
        .await
        .unwrap();
    match outcome {
        EventOutcome::MessageHandled { announced_version } => announced_version,
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_check_update_announces_new_version_to_sender_only() {
    let network = dashboard_network();
    network.route_json("/api/version", r#"{"version":"forest-fires-cache-v3"}"#);
    let harness = Harness::new(network);
    let mut asking = harness.clients.register("tab-1", None);
    let mut other = harness.clients.register("tab-2", None);
    install(&harness, test_config()).await.unwrap();

    assert_eq!(check_update(&harness, "tab-1").await.as_deref(), Some("forest-fires-cache-v3"));
    assert_eq!(
        asking.recv().await.unwrap(),
        ClientMessage::UpdateAvailable {
            version: "forest-fires-cache-v3".to_string()
        }
    );
    assert!(other.try_recv().is_err());
}

#[tokio::test]
async fn test_check_update_with_current_version_is_silent() {
    let harness = Harness::new(dashboard_network());
    let mut rx = harness.clients.register("tab-1", None);
    install(&harness, test_config()).await.unwrap();

    assert_eq!(check_update(&harness, "tab-1").await, None);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_check_update_failures_are_swallowed() {
    let network = dashboard_network();
    let harness = Harness::new(network.clone());
    install(&harness, test_config()).await.unwrap();

    network.route("/api/version", FetchResponse::new(StatusCode::OK, "<html>"));
    assert_eq!(check_update(&harness, "tab-1").await, None);

    network.set_online(false);
    assert_eq!(check_update(&harness, "tab-1").await, None);
}

#[tokio::test]
async fn test_version_endpoint_is_cached_like_any_api_read() {
    let network = dashboard_network();
    let harness = Harness::new(network);
    install(&harness, test_config()).await.unwrap();

    let outcome = harness.worker.fetch(get("/api/version")).await;
    outcome.background.settle().await;

    let cached = harness
        .store()
        .lookup(GenerationKind::Api, &get("/api/version"))
        .await;
    assert!(cached.is_some());
}
