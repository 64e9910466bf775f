//! `scout save` command
//!
//! Merges a YAML research document into a company's record. Facts are
//! appended as-is; run `scout dupes` / `scout resolve` afterwards to clean up.
//!
//! # Usage
//! ```bash
//! scout save "Acme Corp" --file acme-research.yaml
//! scout save "Acme Corp" --file interview.yaml --insider
//! cat research.yaml | scout save "Acme Corp" --file -
//! ```

use std::io::Read;

use anyhow::{Context, Result};
use clap::Args;

use crate::config::Config;
use crate::core::record::{Fact, InsiderFact, ResearchFact};
use crate::core::repository::Repository;

use super::utils::open_repository;

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Company name
    pub company: String,

    /// YAML document with new research (`-` for stdin)
    #[arg(short, long)]
    pub file: String,

    /// Document holds insider facts
    #[arg(long)]
    pub insider: bool,
}

pub fn run(args: SaveArgs, config: &Config) -> Result<()> {
    let content = read_input(&args.file)?;
    let repo = open_repository(config)?;

    if args.insider {
        save_kind::<InsiderFact>(&repo, &args.company, &content)
    } else {
        save_kind::<Fact>(&repo, &args.company, &content)
    }
}

fn save_kind<F: ResearchFact>(repo: &Repository, company: &str, content: &str) -> Result<()> {
    let partial = Repository::parse_partial::<F>(content)
        .with_context(|| format!("Rejected research for {}", company))?;
    let incoming = partial.categories.total_facts();

    let record = repo.save(company, partial)?;

    println!("✅ Saved {} new fact(s) to {} ({})", incoming, record.company, F::KIND);
    println!("   Total facts: {}", record.summary.total_facts_found);
    println!("   Completeness: {}", record.summary.information_completeness);
    if incoming > 0 {
        println!("\nRun `scout dupes \"{}\"` to review possible duplicates.", company);
    }

    Ok(())
}

fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))
    }
}
