use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aurora_nexus::{
    api,
    auth::SessionStore,
    config::{Config, StorageBackend},
    registry::FileRegistry,
    storage::{Database, KeyValueStore, MemoryStore},
    AppState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "gcp" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_stackdriver::layer())
                .init();
        }
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "aurora-nexus starting");

    // Load configuration
    let config = Config::load()?;

    // Initialize the key-value backend
    let kv: Arc<dyn KeyValueStore> = match config.storage.backend {
        StorageBackend::Redb => {
            let db = Database::open(&config.storage.data_dir)?;
            info!("Database opened at: {}", config.storage.data_dir);
            Arc::new(db)
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage backend");
            Arc::new(MemoryStore::new())
        }
    };

    // Load both stores from the backend
    let sessions = SessionStore::open(Arc::clone(&kv), &config.auth)?;
    let files = FileRegistry::open(kv);
    info!(
        accounts = sessions.users().len(),
        files = files.files().len(),
        restored_session = sessions.is_authenticated(),
        "Stores loaded"
    );

    // Create shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        files,
        sessions,
    });

    // Build and start the HTTP server
    let app = api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.node.bind_address).await?;
    info!("Listening on: {}", config.node.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
