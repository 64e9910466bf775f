//! `scout decide` command
//!
//! Sets the decision for a company, replacing any earlier one.
//!
//! # Usage
//! ```bash
//! scout decide "Acme Corp" yes high --reasoning "Funded, strong team"
//! scout decide "Acme Corp" maybe low
//! ```

use anyhow::Result;
use clap::Args;

use crate::config::Config;
use crate::core::flags::{DecisionConfidence, FlagStore, Outcome};

use super::utils::open_repository;

#[derive(Args, Debug)]
pub struct DecideArgs {
    /// Company name
    pub company: String,

    /// yes | no | maybe
    pub outcome: String,

    /// high | medium | low
    pub confidence: String,

    /// Why
    #[arg(short, long)]
    pub reasoning: Option<String>,
}

pub fn run(args: DecideArgs, config: &Config) -> Result<()> {
    let outcome: Outcome = args.outcome.parse()?;
    let confidence: DecisionConfidence = args.confidence.parse()?;

    let repo = open_repository(config)?;
    let flags =
        FlagStore::new(&repo).set_decision(&args.company, outcome, confidence, args.reasoning)?;

    println!(
        "✅ Decision for {}: {} ({} confidence)",
        flags.company, outcome, confidence
    );
    if let Some(reasoning) = flags.decision.as_ref().and_then(|d| d.reasoning.as_deref()) {
        println!("   {}", reasoning);
    }

    Ok(())
}
