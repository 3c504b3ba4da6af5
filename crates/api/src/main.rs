use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use patchwright_api::config::ServerConfig;
use patchwright_api::engine::PatchEngine;
use patchwright_api::router::build_app_router;
use patchwright_api::state::AppState;
use patchwright_core::resolver::{SnapshotResolver, TimeoutResolver};
use patchwright_store::PatchRegistry;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "patchwright_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Registry ---
    let registry = PatchRegistry::open(&config.patches_dir).expect("Patch registry root is unusable");
    tracing::info!(root = %registry.root().display(), "Patch registry opened");

    // --- Content resolver ---
    let resolver = TimeoutResolver::new(
        SnapshotResolver::new(&config.repo_snapshot_dir),
        config.resolver_timeout(),
    );
    tracing::info!(
        snapshots = %config.repo_snapshot_dir.display(),
        timeout_ms = config.resolver_timeout_ms,
        "Content resolver configured",
    );

    // --- Engine ---
    let engine = PatchEngine::new(registry, Arc::new(resolver))
        .with_fuzz_tolerance(config.fuzz_tolerance)
        .with_duplicate_policy(config.duplicate_policy);

    // --- Router ---
    let state = AppState::new(engine, config.clone());
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    let stopping = Arc::new(Notify::new());
    let server = axum::serve(listener, app).with_graceful_shutdown({
        let stopping = Arc::clone(&stopping);
        async move {
            shutdown_signal().await;
            stopping.notify_one();
        }
    });
    let drain_deadline = async {
        stopping.notified().await;
        tokio::time::sleep(Duration::from_secs(config.shutdown_timeout_secs)).await;
    };

    tokio::select! {
        result = server.into_future() => result.expect("Server error"),
        () = drain_deadline => {
            tracing::warn!(
                timeout_secs = config.shutdown_timeout_secs,
                "Shutdown timeout elapsed, abandoning in-flight requests",
            );
        }
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
