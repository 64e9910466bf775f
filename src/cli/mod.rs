//! CLI module - Command definitions and handlers

use clap::{Parser, Subcommand};

pub mod config;
pub mod decide;
pub mod dupes;
pub mod flag;
pub mod init;
pub mod missing;
pub mod resolve;
pub mod save;
pub mod show;
pub mod stats;
pub mod utils;

/// scout - employer research knowledge base
///
/// Collects facts about prospective employers, keeps them free of
/// near-duplicates, and tracks green/red flags and a decision per company.
#[derive(Parser, Debug)]
#[command(name = "scout")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, env = "SCOUT_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new scout directory
    Init(init::InitArgs),

    /// Merge new research into a company's record
    Save(save::SaveArgs),

    /// Show a company's record
    Show(show::ShowArgs),

    /// List near-duplicate facts for review
    Dupes(dupes::DupesArgs),

    /// Merge near-duplicate facts
    Resolve(resolve::ResolveArgs),

    /// Add a green or red flag
    Flag(flag::FlagArgs),

    /// Record the go/no-go decision
    Decide(decide::DecideArgs),

    /// Note critical data still missing for a decision
    Missing(missing::MissingArgs),

    /// Per-company overview
    Stats(stats::StatsArgs),

    /// Get or set configuration
    Config(config::ConfigArgs),
}
