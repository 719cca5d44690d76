//! Application entry point for manga-sync.
//!
//! Loads the database and keeps tracked titles reconciled in the background
//! from the scraper snapshots found under `PROVIDERS_PATH`.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use dotenv::dotenv;
use log::debug;
use log::info;
use log::warn;
use manga_sync::config::Config;
use manga_sync::database::Database;
use manga_sync::database::store::JsonFileStore;
use manga_sync::event::NewChaptersEvent;
use manga_sync::event::event_bus::EventBus;
use manga_sync::logging::setup_logging;
use manga_sync::provider::json_dir_provider::JsonDirProvider;
use manga_sync::provider::providers::Providers;
use manga_sync::service::Services;
use manga_sync::subscriber::log_subscriber::LogSubscriber;
use manga_sync::task::refresh_publisher::RefreshPublisher;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let init_start = Instant::now();
    let config = load_config().await?;
    let event_bus = Arc::new(EventBus::new());

    let db = setup_database(&config, init_start).await?;
    let services = Arc::new(Services::new(db, config.merge_mode));
    let providers = setup_providers(&config).await?;

    setup_subscribers(event_bus.clone());
    setup_publishers(&config, &services, providers, event_bus, init_start)?;

    run(init_start).await
}

async fn load_config() -> Result<Arc<Config>> {
    debug!("Loading configuration...");
    let mut config = Config::new();
    config.load()?;
    let config = Arc::new(config);
    setup_logging(&config)?;
    info!("Starting manga-sync...");
    Ok(config)
}

async fn setup_database(config: &Config, init_start: Instant) -> Result<Arc<Database>> {
    debug!("Setting up Database...");
    let store = Arc::new(JsonFileStore::new(&config.db_path));
    let db = Arc::new(Database::open(store).await?);
    info!(
        "Database setup complete ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );
    Ok(db)
}

async fn setup_providers(config: &Config) -> Result<Arc<Providers>> {
    debug!("Setting up Providers...");
    let mut providers = Providers::new();
    for provider in JsonDirProvider::discover(&config.providers_path).await? {
        providers.add_provider(Arc::new(provider));
    }
    Ok(Arc::new(providers))
}

fn setup_subscribers(event_bus: Arc<EventBus>) {
    debug!("Setting up Subscribers...");
    event_bus.register_subcriber::<NewChaptersEvent, _>(Arc::new(LogSubscriber::new()));
}

fn setup_publishers(
    config: &Config,
    services: &Services,
    providers: Arc<Providers>,
    event_bus: Arc<EventBus>,
    init_start: Instant,
) -> Result<()> {
    if !config.features.refresh_task {
        return Ok(());
    }
    if providers.is_empty() {
        warn!("No providers registered. Refresh task not started.");
        return Ok(());
    }
    debug!("Setting up Publishers...");

    RefreshPublisher::new(
        services.reconcile.clone(),
        providers,
        event_bus,
        config.poll_interval,
    )
    .start()?;

    info!(
        "Publishers setup complete ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );
    Ok(())
}

async fn run(init_start: Instant) -> Result<()> {
    info!(
        "manga-sync is up in {:.2}s. Press Ctrl+C to stop.",
        init_start.elapsed().as_secs_f64()
    );

    tokio::signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down.");

    Ok(())
}
