use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gigsync_db::{ChangeScope, MemoryStore, PgStore, RecordStore};
use gigsync_events::EventBus;
use gigsync_platforms::{default_registry, MockRemote};
use gigsync_workflow::{WorkflowConfig, WorkflowEngine};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gigsync_api::config::ServerConfig;
use gigsync_api::router::build_app_router;
use gigsync_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gigsync_api=debug,gigsync_workflow=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let workflow_config = WorkflowConfig::from_env();
    let config = ServerConfig::from_env().fit_to_workflow(&workflow_config);
    tracing::info!(
        host = %config.host,
        port = %config.port,
        request_timeout_secs = config.request_timeout_secs,
        platform_concurrency = workflow_config.platform_concurrency,
        platform_timeout = ?workflow_config.platform_timeout,
        "Loaded configuration"
    );

    // --- Record store ---
    let store: Arc<dyn RecordStore> = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = gigsync_db::create_pool(&database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            gigsync_db::health_check(&pool)
                .await
                .expect("Database health check failed");

            gigsync_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Arc::new(
                PgStore::start(pool)
                    .await
                    .expect("Failed to start Postgres change listener"),
            )
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    // --- Platforms ---
    let registry = default_registry(Arc::new(MockRemote::new()))
        .expect("Failed to register platform modules");
    tracing::info!(platforms = registry.len(), "Platform registry ready");

    // --- Workflow ---
    let event_bus = Arc::new(EventBus::default());
    let engine = Arc::new(WorkflowEngine::new(
        Arc::clone(&store),
        Arc::new(registry),
        Arc::clone(&event_bus),
        workflow_config,
    ));

    // Merge changes made by other processes into the status cache.
    let sync_cancel = CancellationToken::new();
    let sync_handle = engine
        .synchronizer()
        .spawn(ChangeScope::everything(), sync_cancel.clone());

    // --- Router ---
    let state = AppState::new(Arc::clone(&engine), config.clone());
    let app = build_app_router(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sync_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sync_handle).await;
    tracing::info!("Status synchronizer stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM on Unix.
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
