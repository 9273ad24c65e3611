use clap::Parser;
use poly_ticker::cli::{Cli, Commands};
use poly_ticker::config::Config;
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration; only a missing file falls back to the bundled defaults
    if !Path::new(&cli.config).exists() {
        eprintln!("Warning: {} not found, using default configuration", cli.config);
    }
    let config = Config::load_or_bundled(&cli.config)?;

    // Initialize telemetry
    poly_ticker::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting ticker ingestion");
            args.execute(&config).await?;
        }
        Commands::Resolve(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
