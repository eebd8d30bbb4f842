use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tasker_recorder::api::{routes::create_router, state::AppState};
use tasker_recorder::config::RecorderConfig;
use tasker_recorder::recording::{RecorderControl, SessionManager};
use tasker_recorder::store::{MemoryScreenshotStore, MemoryStore, ScreenshotStore, SqliteStore, StepStore};

/// How often the durable store checks for writes from other processes
const STORE_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = RecorderConfig::from_env();
    config.validate()?;

    let (steps, screenshots) = open_stores(&config);
    let session = Arc::new(SessionManager::new(steps));
    let state = Arc::new(AppState::new(RecorderControl::new(session, screenshots)));

    // Build router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Tasker Recorder starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// SQLite when a database path is configured and opens, memory otherwise
fn open_stores(config: &RecorderConfig) -> (Arc<dyn StepStore>, Arc<dyn ScreenshotStore>) {
    if let Some(path) = &config.db_path {
        match SqliteStore::open(path) {
            Ok(store) => {
                tracing::info!("Recording store opened at {}", path.display());
                let store = Arc::new(store);
                store.spawn_change_poller(STORE_POLL_INTERVAL);
                return (store.clone(), store);
            }
            Err(e) => {
                tracing::error!("Failed to open recording store at {}: {}", path.display(), e);
            }
        }
    }

    tracing::warn!("Using in-memory recording store; sessions will not survive a restart");
    (Arc::new(MemoryStore::new()), Arc::new(MemoryScreenshotStore::new()))
}
