//! Apply the embedded booking schema migrations to a PostgreSQL database.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;

use booking::outbound::persistence::run_migrations;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `booking-migrate` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "booking-migrate",
    about = "Apply pending booking schema migrations",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `BOOKING_DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let database_url =
        resolve_database_url(args.database_url, env::var("BOOKING_DATABASE_URL").ok())?;

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build migration runtime")?;
    let applied = runtime
        .block_on(run_migrations(&database_url))
        .wrap_err("failed to apply migrations")?;
    info!(applied, "migrations complete");
    Ok(())
}

fn resolve_database_url(flag: Option<String>, from_env: Option<String>) -> Result<String> {
    flag.or(from_env)
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| {
            eyre!("missing database URL: pass --database-url or set BOOKING_DATABASE_URL")
        })
}
