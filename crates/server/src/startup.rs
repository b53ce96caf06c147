use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::{AppConfig, StoreBackend, StoreConfig};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::storage::{KvStore, MemoryStore, RedisStore};
use service::AppServices;

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the configured key-value backend.
pub async fn build_store(cfg: &StoreConfig) -> Result<Arc<dyn KvStore>, StartupError> {
    match cfg.backend {
        StoreBackend::Redis => {
            let store = RedisStore::connect(&cfg.redis_url)
                .await
                .map_err(|e| StartupError::Store(e.to_string()))?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => match cfg.snapshot_path.as_deref() {
            Some(path) => {
                let store: Arc<dyn KvStore> = MemoryStore::with_snapshot(path)
                    .await
                    .map_err(|e| StartupError::Store(e.to_string()))?;
                Ok(store)
            }
            None => {
                warn!("memory store without snapshot_path; data is lost on restart");
                let store: Arc<dyn KvStore> = MemoryStore::new();
                Ok(store)
            }
        },
    }
}

/// Store plus services, with the bootstrap admin key seeded when configured.
pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    let store = build_store(&cfg.store).await?;
    let services = AppServices::new(store);
    if let Some(key) = cfg.store.bootstrap_admin_key.as_deref() {
        services
            .api_keys
            .set("bootstrap", key)
            .await
            .map_err(|e| StartupError::Store(e.to_string()))?;
        info!("bootstrap admin api key installed");
    }
    Ok(ServerState::new(services))
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

/// Public entry: build the app and serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    common::env::ensure_env(cfg.store.snapshot_path.as_deref()).await?;

    let state = build_state(&cfg).await?;
    let backend = state.backend_name();
    let app: Router = routes::build_router(state, build_cors());

    let addr = bind_addr(&cfg)?;
    info!(%addr, store = backend, "starting directory server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
