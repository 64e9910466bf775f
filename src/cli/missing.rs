//! `scout missing` command
//!
//! Records a piece of data the decision still depends on.

use anyhow::Result;
use clap::Args;

use crate::config::Config;
use crate::core::flags::FlagStore;

use super::utils::open_repository;

#[derive(Args, Debug)]
pub struct MissingArgs {
    /// Company name
    pub company: String,

    /// What is missing (e.g. "Attrition in engineering")
    pub item: String,
}

pub fn run(args: MissingArgs, config: &Config) -> Result<()> {
    let repo = open_repository(config)?;
    let flags = FlagStore::new(&repo).add_missing_data(&args.company, &args.item)?;

    println!("📝 {} missing critical data item(s) for {}:", flags.missing_critical_data.len(), flags.company);
    for item in &flags.missing_critical_data {
        println!("   - {}", item);
    }

    Ok(())
}
