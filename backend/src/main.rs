//! Booking core entry-point: loads settings, wires adapters and runs until
//! interrupted.

mod server;

use color_eyre::eyre::{Context, Result};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::BookingSettings;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = BookingSettings::load().wrap_err("failed to load booking settings")?;
    let service = server::start(&settings).await?;
    info!(
        persistent = settings.database_url.is_some(),
        "booking core started"
    );

    tokio::signal::ctrl_c()
        .await
        .wrap_err("failed to listen for shutdown signal")?;
    info!("shutdown requested");
    drop(service.registry);
    service.cache_worker.shutdown().await;
    Ok(())
}
