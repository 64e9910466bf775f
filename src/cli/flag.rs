//! `scout flag` command
//!
//! Appends a green or red flag for one mountain element. Flags accumulate;
//! nothing is merged.
//!
//! # Usage
//! ```bash
//! scout flag "Acme Corp" rope_team_confidence strong "Manager has 10y tenure"
//! scout flag "Acme Corp" mountain_range_terrain dealbreaker "Runway < 6 months" \
//!     --impact "Layoffs likely" --confidence high
//! ```

use anyhow::Result;
use clap::Args;

use crate::config::Config;
use crate::core::flags::{FlagEntry, FlagStore, MountainElement, Polarity, Severity};

use super::utils::open_repository;

#[derive(Args, Debug)]
pub struct FlagArgs {
    /// Company name
    pub company: String,

    /// Mountain element (e.g. rope_team_confidence)
    pub element: String,

    /// critical | strong (green), dealbreaker | concerning (red)
    pub severity: String,

    /// The observation
    pub flag: String,

    /// What it means for you
    #[arg(long, default_value = "")]
    pub impact: String,

    /// How sure you are
    #[arg(long, default_value = "")]
    pub confidence: String,
}

pub fn run(args: FlagArgs, config: &Config) -> Result<()> {
    let element: MountainElement = args.element.parse()?;
    let severity: Severity = args.severity.parse()?;

    let repo = open_repository(config)?;
    let entry = FlagEntry::new(args.flag)
        .with_impact(args.impact)
        .with_confidence(args.confidence);

    let flags = FlagStore::new(&repo).add_flag(&args.company, severity, element, entry)?;

    let marker = match severity.polarity() {
        Polarity::Green => "🟢",
        Polarity::Red => "🔴",
    };
    println!("{} Added {} flag to {} / {}", marker, severity, flags.company, element);
    println!(
        "   Totals: {} green, {} red",
        flags.count(Polarity::Green),
        flags.count(Polarity::Red)
    );

    Ok(())
}
