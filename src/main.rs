//! azstore - Azure Blob Storage provisioning for an image registry
//!
//! Runs a single provisioning, teardown or status invocation against a
//! storage state file.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use azstore::cli::Cli;
use azstore::config::settings::{load_settings, Settings};
use azstore::Result;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Settings come first since they can turn on debug logging
    let settings = match load_settings(cli.settings.as_deref()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(cli.debug || settings.debug);

    // Execute the command
    if let Err(e) = run(cli, settings).await {
        error!("Error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, settings: Settings) -> Result<()> {
    info!("Starting azstore");

    cli.execute(settings).await?;

    Ok(())
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "azstore=debug" } else { "azstore=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
