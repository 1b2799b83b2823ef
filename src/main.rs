use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pindown::app::AppContext;
use pindown::cli::{commands, Cli};
use pindown::config::{RunConfig, Settings};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_directive()));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let settings = Settings::load(cli.config.as_deref())?;
    let config = RunConfig::from_cli(&cli, settings)?;

    let ctx = AppContext::new(&config)?;
    commands::sync(&ctx).context("Sync failed")?;

    Ok(())
}
