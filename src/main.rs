//! Idolboard API Server
//!
//! Run with: cargo run --bin idolboard
//!
//! Configuration is read from `$IDOLBOARD_CONFIG`, the user config directory,
//! or `./config.toml`, with `IDOLBOARD_*` environment overrides applied on
//! top. `RUST_LOG` overrides the configured log level.

use idolboard::activity::ActivityLog;
use idolboard::analytics::WeeklyActiveUsers;
use idolboard::api::{serve, AppState};
use idolboard::config::{Config, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();
    init_tracing(&config.logging);

    tracing::info!("Starting Idolboard API server v{}", env!("CARGO_PKG_VERSION"));

    let zone = config.analytics.zone()?;
    tracing::info!("Reporting time zone: {}", zone);
    tracing::info!("Data directory: {:?}", config.storage.data_dir);

    let log = ActivityLog::open_in_dir(&config.storage.data_dir, config.storage.sync_mode)?;
    tracing::info!(
        "Activity log opened: {} records at {:?}",
        log.entry_count(),
        log.path()
    );

    let state = AppState::new(log, WeeklyActiveUsers::new(zone), config.api.clone());

    tracing::info!("Starting server on {}", config.api.addr());
    serve(state.clone(), &config.api).await?;

    tracing::info!("Syncing activity log...");
    state.activity_log.lock().await.sync()?;
    tracing::info!("Idolboard API server stopped");

    Ok(())
}

/// Install the global subscriber in pretty or JSON format
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("idolboard={},tower_http=info", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
