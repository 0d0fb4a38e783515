//! # Taskdeck Sweeper
//!
//! Standalone trash sweeper binary. Connects to the same database as the API
//! and permanently deletes projects and tasks whose trash retention has
//! expired, once per hour.
//!
//! The API server also runs the sweeper in-process; this binary exists for
//! deployments that prefer retention enforcement in its own process.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://... cargo run -p taskdeck-sweeper
//! ```

use taskdeck_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use taskdeck_sweeper::scheduler::SweepScheduler;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskdeck_sweeper=info,taskdeck_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Taskdeck Sweeper v{} starting...", env!("CARGO_PKG_VERSION"));

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    let pool = create_pool(DatabaseConfig {
        url: database_url,
        ..Default::default()
    })
    .await?;

    let cancel = CancellationToken::new();
    let handle = SweepScheduler::new().spawn(pool.clone(), cancel.clone());

    tracing::info!("Sweeper running, press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping sweeper...");

    cancel.cancel();
    let _ = handle.await;

    close_pool(pool).await;
    tracing::info!("Sweeper stopped");

    Ok(())
}
