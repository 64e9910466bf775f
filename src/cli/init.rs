//! `scout init` command
//!
//! Creates a `.scout/` directory with a default config and an empty data
//! directory.
//!
//! # Usage
//! ```bash
//! scout init                    # Initialize in current directory
//! scout init ~/job-search       # Initialize in specific path
//! scout init --global           # Initialize ~/.scout
//! ```

use anyhow::{bail, Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

use crate::config::{Config, SCOUT_DIR};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path to initialize (default: current directory)
    pub path: Option<PathBuf>,

    /// Initialize global ~/.scout
    #[arg(long)]
    pub global: bool,

    /// Rewrite config even if already initialized
    #[arg(short, long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let scout_dir = if args.global {
        Config::global_dir().context("Could not determine home directory")?
    } else {
        args.path
            .unwrap_or_else(|| PathBuf::from("."))
            .join(SCOUT_DIR)
    };

    if scout_dir.exists() && !args.force {
        bail!(
            "{} already exists. Use --force to reinitialize.",
            scout_dir.display()
        );
    }

    println!("🚀 Initializing scout in: {}", scout_dir.display());

    let data_dir = scout_dir.join("data").join("companies");
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    let config_path = scout_dir.join("config.toml");
    Config::default().save_to(&config_path)?;

    println!("\n✅ Initialized scout");
    println!("   Config: {}", config_path.display());
    println!("   Data:   {}", scout_dir.join("data").display());
    println!("\nNext steps:");
    println!("  scout save \"Acme Corp\" --file research.yaml");
    println!("  scout dupes");
    println!("  scout resolve --dry-run");

    Ok(())
}
