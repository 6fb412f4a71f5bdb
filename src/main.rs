use anyhow::{Context, Result};
use std::time::Duration;
use teradict::config::Config;
use teradict::i18n::LocalizationStore;
use teradict::panlex::PanlexClient;
use teradict::server::{self, AppState};
use teradict::views::Views;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("teradict=info".parse()?),
        )
        .init();

    info!("Starting TeraDict");

    let config = Config::from_env()?;

    // Abort startup if any localization file is unreadable or malformed
    let locales = LocalizationStore::load(&config.i18n_dir)
        .context("Failed to load localization files")?;

    let views = Views::new(&config.base_href, &config.url_root)
        .context("Failed to compile templates")?;

    let api = PanlexClient::new(
        config.panlex_api_url.clone(),
        Duration::from_secs(config.api_timeout_secs),
    )
    .context("Failed to create HTTP client")?;
    info!("Using PanLex API at {}", api.base_url());

    let state = AppState::new(locales, views, api);
    let app = server::router(state, &config.static_dir, &config.url_root);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    let home = if config.url_root.is_empty() { "/" } else { config.url_root.as_str() };
    info!("✓ Listening on http://{}{}", addr, home);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
