// firecache - Offline-resilience layer for the forest-fire monitoring dashboard
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use firecache::cli::Args;
use firecache::config::AppConfig;
use firecache::models::InterceptedRequest;
use firecache::platform::{ClientRegistry, HttpNetwork, Network, NotificationCenter, Platform, SyncManager};
use firecache::server::{create_router, AppState};
use firecache::utils::logging;
use firecache::worker::{OfflineWorker, WorkerEvent};
use firecache::cache::MemoryCacheStorage;
use http::Method;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use url::Url;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    args.apply(&mut config);
    config.validate()?;

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting firecache v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Platform adapters
    let base_url = Url::parse(&config.upstream.base_url)?;
    let network: Arc<dyn Network> = Arc::new(HttpNetwork::new(&config.upstream)?);
    let scheduler = Arc::new(SyncManager::new());
    let clients = Arc::new(ClientRegistry::new());
    let notifier = Arc::new(NotificationCenter::new());
    let platform = Platform {
        storage: Arc::new(MemoryCacheStorage::new()),
        network: network.clone(),
        scheduler: scheduler.clone(),
        clients: clients.clone(),
        notifier: notifier.clone(),
    };
    let worker = Arc::new(OfflineWorker::new(platform, base_url.clone()));

    // Phase 4: Install and activate the configured generation set
    info!(
        "Installing generations '{}' / '{}' against {}",
        config.generations.static_name, config.generations.api_name, base_url
    );
    let generations = Arc::new(config.generations.clone());
    if let Err(e) = worker.dispatch(WorkerEvent::Install(generations)).await {
        warn!("Install failed, serving uncached until restart: {}", e);
    }

    // Phase 5: Background sync loop
    let (fired_tx, mut fired_rx) = mpsc::channel::<String>(16);
    let probe = InterceptedRequest::resolve(Method::GET, &base_url, &config.sync.probe_path)?;
    tokio::spawn(scheduler.clone().run(network, probe, config.sync.clone(), fired_tx));
    {
        let worker = worker.clone();
        tokio::spawn(async move {
            while let Some(tag) = fired_rx.recv().await {
                if let Err(e) = worker.dispatch(WorkerEvent::Sync { tag }).await {
                    error!("Sync event failed: {}", e);
                }
            }
        });
    }

    // Phase 6: Build and start HTTP server
    let state = AppState {
        config: config.clone(),
        worker,
        clients,
        notifier,
        scheduler,
    };
    let app = create_router(state);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("Intercepting on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 7: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
