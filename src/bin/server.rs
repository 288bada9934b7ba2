use std::error::Error;
use std::sync::Arc;

use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use pagepulse::checker::HttpFetcher;
use pagepulse::db::store::Store;
use pagepulse::notifications::service::NotificationService;
use pagepulse::scheduler::CheckScheduler;
use pagepulse::server::config::ServerConfig;
use pagepulse::web::{AppState, create_axum_router};

const CHECK_CYCLE_SECONDS: u64 = 60;

fn init_logging() {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily("logs", "pagepulse.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    // Default to `info` level if RUST_LOG is not set.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    init_logging();

    let config = Arc::new(ServerConfig::from_env()?);
    let store = Arc::new(Store::open(&config.data_dir)?);
    info!(path = %config.data_dir.display(), "Store loaded.");

    let notifications = NotificationService::spawn(&config);
    let fetcher = Arc::new(HttpFetcher::new());
    let scheduler = Arc::new(CheckScheduler::new(
        store.clone(),
        fetcher,
        notifications,
    ));
    tokio::spawn(scheduler.clone().start_periodic_checks(CHECK_CYCLE_SECONDS));

    let state = Arc::new(AppState {
        store,
        scheduler,
        config: config.clone(),
    });
    let app = create_axum_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "PagePulse listening.");
    axum::serve(listener, app).await?;

    Ok(())
}
