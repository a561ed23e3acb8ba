pub mod bot;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod services;

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bot::Bot;
use clients::{HttpRenderClient, TelegramClient};
pub use config::Config;
use db::Store;
use services::{GenerationService, InMemorySessionStore, SeaOrmEntitlementService};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("init") {
        Config::create_default_if_missing()?;
        println!("Config file created. Edit config.toml and run again.");
        return Ok(());
    }

    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    info!("Vidra v{} starting...", env!("CARGO_PKG_VERSION"));

    let store = Store::new(&config.general.database_path)
        .await
        .context("Failed to open the user database")?;

    let transport: Arc<dyn clients::ChatTransport> =
        Arc::new(TelegramClient::new(&config.telegram.token));
    let renderer: Arc<dyn clients::RenderClient> =
        Arc::new(HttpRenderClient::new(config.renderer.clone()));
    let entitlements: Arc<dyn services::EntitlementService> =
        Arc::new(SeaOrmEntitlementService::new(store));
    let sessions: Arc<dyn services::SessionStore> = Arc::new(InMemorySessionStore::new());

    let generator = Arc::new(GenerationService::new(
        Arc::clone(&transport),
        renderer,
        Arc::clone(&entitlements),
        Arc::clone(&sessions),
    ));

    let bot = Arc::new(Bot::new(
        transport,
        entitlements,
        sessions,
        generator,
        config.telegram.admin_user_id.clone(),
        config.telegram.poll_timeout_secs,
    ));

    let bot_handle = tokio::spawn(async move {
        if let Err(e) = bot.run().await {
            error!("Bot loop error: {}", e);
        }
    });

    info!("Running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }

    bot_handle.abort();
    info!("Stopped");

    Ok(())
}
