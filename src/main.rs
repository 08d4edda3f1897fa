use fitstudio::api::{create_routes, AppState};
use fitstudio::config::{AppConfig, CatalogSeeder};
use fitstudio::services::mailer_from_config;
use fitstudio::storage::Store;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    if config.is_production() && config.jwt_secret == AppConfig::default().jwt_secret {
        anyhow::bail!("JWT_SECRET must be set in production");
    }

    let store = Store::connect(&config.storage).await?;

    if config.seed_catalog {
        CatalogSeeder::new(store.clone()).seed_all().await?;
    }

    let mailer = mailer_from_config(config.smtp.as_ref());
    let address = config.server_address();
    let environment = config.environment.clone();

    let app = create_routes(AppState::new(config, store, mailer));

    let listener = TcpListener::bind(&address).await?;
    info!("FitStudio server starting on http://{} ({})", address, environment);
    info!("Health check available at http://{}/health", address);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
