//! CLI interface for poly-ticker
//!
//! Provides subcommands for:
//! - `run`: Stream tickers for the current (or next) slot into the sink
//! - `resolve`: Resolve a slot's markets and print the token registry
//! - `config`: Show the effective configuration

mod resolve;
mod run;

pub use resolve::ResolveArgs;
pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "poly-ticker")]
#[command(about = "Best bid/ask ticker cache for Polymarket 15-minute up/down markets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream tickers into the configured sink
    Run(RunArgs),
    /// Resolve markets and print the token registry
    Resolve(ResolveArgs),
    /// Show configuration
    Config,
}
