//! scout CLI - Entry point
//!
//! Usage: scout <command> [options]

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scout::cli::{Cli, Commands};
use scout::config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON/YAML output on stdout stays clean
    let filter = if cli.verbose {
        EnvFilter::new("scout=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone();
    let config = || Config::load_with(config_path.as_deref().map(Path::new));

    match cli.command {
        Commands::Init(args) => scout::cli::init::run(args),
        Commands::Config(args) => scout::cli::config::run(args),
        Commands::Save(args) => scout::cli::save::run(args, &config()?),
        Commands::Show(args) => scout::cli::show::run(args, &config()?),
        Commands::Dupes(args) => scout::cli::dupes::run(args, &config()?),
        Commands::Resolve(args) => scout::cli::resolve::run(args, &config()?),
        Commands::Flag(args) => scout::cli::flag::run(args, &config()?),
        Commands::Decide(args) => scout::cli::decide::run(args, &config()?),
        Commands::Missing(args) => scout::cli::missing::run(args, &config()?),
        Commands::Stats(args) => scout::cli::stats::run(args, &config()?),
    }
}
