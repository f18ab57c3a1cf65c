// Shared test harness: a scriptable network and a wired-up worker
// Author: kelexine (https://github.com/kelexine)

#![allow(dead_code)]

use async_trait::async_trait;
use firecache::cache::{CacheStorage, GenerationStore, MemoryCacheStorage};
use firecache::config::{AppConfig, GenerationConfig};
use firecache::error::{OfflineError, Result};
use firecache::models::{FetchResponse, InterceptedRequest};
use firecache::platform::{
    ClientRegistry, Network, NotificationCenter, Platform, SyncManager, SyncScheduler,
};
use firecache::server::AppState;
use firecache::strategy::StrategyRouter;
use firecache::worker::OfflineWorker;
use http::{Method, StatusCode};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use url::Url;

pub const BASE: &str = "http://dashboard.local:8000/";

pub fn base() -> Url {
    Url::parse(BASE).unwrap()
}

pub fn get(path: &str) -> InterceptedRequest {
    InterceptedRequest::resolve(Method::GET, &base(), path).unwrap()
}

pub fn post(path: &str, body: &str) -> InterceptedRequest {
    InterceptedRequest::resolve(Method::POST, &base(), path)
        .unwrap()
        .with_body(body.to_string())
}

pub fn url(path: &str) -> String {
    base().join(path).unwrap().to_string()
}

/// Network double: answers from a route table, can be switched offline and
/// can hold every fetch until released.
pub struct StubNetwork {
    routes: Mutex<HashMap<String, FetchResponse>>,
    online: AtomicBool,
    calls: Mutex<Vec<(Method, String)>>,
    held: watch::Sender<bool>,
}

impl StubNetwork {
    pub fn new() -> Arc<Self> {
        let (held, _) = watch::channel(false);
        Arc::new(Self {
            routes: Mutex::new(HashMap::new()),
            online: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
            held,
        })
    }

    /// Serve `response` for `target` (path or absolute URL).
    pub fn route(&self, target: &str, response: FetchResponse) {
        self.routes.lock().unwrap().insert(url(target), response);
    }

    pub fn route_json(&self, target: &str, body: &str) {
        self.route(
            target,
            FetchResponse::new(StatusCode::OK, body.to_string()).with_header(
                http::header::CONTENT_TYPE,
                http::HeaderValue::from_static("application/json"),
            ),
        );
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Block every fetch until [`StubNetwork::release`].
    pub fn hold(&self) {
        self.held.send_replace(true);
    }

    pub fn release(&self) {
        self.held.send_replace(false);
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, method: &Method, target: &str) -> usize {
        let target = url(target);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, u)| m == method && *u == target)
            .count()
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<FetchResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((request.method.clone(), request.url.to_string()));

        let mut held = self.held.subscribe();
        loop {
            let is_held = *held.borrow();
            if !is_held || held.changed().await.is_err() {
                break;
            }
        }

        if !self.online.load(Ordering::SeqCst) {
            return Err(OfflineError::Network(format!(
                "{} {}: connection refused",
                request.method, request.url
            )));
        }

        let response = self.routes.lock().unwrap().get(request.url.as_str()).cloned();
        Ok(response.unwrap_or_else(|| FetchResponse::new(StatusCode::NOT_FOUND, "not found")))
    }
}

/// Scheduler that always refuses registration.
pub struct BrokenScheduler;

#[async_trait]
impl SyncScheduler for BrokenScheduler {
    async fn register(&self, tag: &str) -> Result<bool> {
        Err(OfflineError::SyncRegistration(format!("{}: quota", tag)))
    }

    async fn pending(&self) -> Vec<String> {
        Vec::new()
    }
}

pub fn test_config() -> GenerationConfig {
    GenerationConfig {
        manifest: vec!["/".to_string(), "/fires".to_string()],
        ..Default::default()
    }
}

/// A worker wired to in-process platform parts.
pub struct Harness {
    pub network: Arc<StubNetwork>,
    pub storage: Arc<MemoryCacheStorage>,
    pub scheduler: Arc<SyncManager>,
    pub clients: Arc<ClientRegistry>,
    pub notifier: Arc<NotificationCenter>,
    pub worker: Arc<OfflineWorker>,
}

impl Harness {
    pub fn new(network: Arc<StubNetwork>) -> Self {
        Self::with_storage(network, Arc::new(MemoryCacheStorage::new()))
    }

    pub fn with_storage(network: Arc<StubNetwork>, storage: Arc<MemoryCacheStorage>) -> Self {
        let scheduler = Arc::new(SyncManager::new());
        let clients = Arc::new(ClientRegistry::new());
        let notifier = Arc::new(NotificationCenter::new());
        let platform = Platform {
            storage: storage.clone(),
            network: network.clone(),
            scheduler: scheduler.clone(),
            clients: clients.clone(),
            notifier: notifier.clone(),
        };
        let worker = Arc::new(OfflineWorker::new(platform, base()));
        Self {
            network,
            storage,
            scheduler,
            clients,
            notifier,
            worker,
        }
    }

    /// Router over the default test generation set, without installing it.
    pub fn router(&self) -> StrategyRouter {
        let storage: Arc<dyn CacheStorage> = self.storage.clone();
        let store = GenerationStore::new(storage, Arc::new(test_config()));
        StrategyRouter::new(store, self.network.clone(), self.scheduler.clone())
    }

    pub fn store(&self) -> GenerationStore {
        GenerationStore::new(self.storage.clone(), Arc::new(test_config()))
    }

    /// Server state sharing this harness' worker and platform parts.
    pub fn app_state(&self) -> AppState {
        let mut config = AppConfig::default();
        config.upstream.base_url = BASE.to_string();
        config.generations = test_config();
        AppState {
            config,
            worker: self.worker.clone(),
            clients: self.clients.clone(),
            notifier: self.notifier.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

/// A network with the test manifest routed.
pub fn dashboard_network() -> Arc<StubNetwork> {
    let network = StubNetwork::new();
    network.route("/", FetchResponse::new(StatusCode::OK, "<h1>Dashboard</h1>"));
    network.route("/fires", FetchResponse::new(StatusCode::OK, "<h1>Fires</h1>"));
    network.route_json("/api/version", r#"{"version":"forest-fires-cache-v2"}"#);
    network
}
