//! `scout resolve` command
//!
//! Collapses near-duplicate facts. Always previews first, then asks before
//! writing unless `-y` is given.
//!
//! # Usage
//! ```bash
//! scout resolve --dry-run                   # preview every company
//! scout resolve "Acme Corp" --threshold 85  # one company, looser match
//! scout resolve "Acme Corp" -y              # no prompt
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use dialoguer::Confirm;

use crate::config::Config;
use crate::core::record::{Fact, InsiderFact, ResearchFact};
use crate::core::repository::Repository;
use crate::core::resolver::{resolve, resolve_all, ChangeReport};

use super::utils::{format_score, open_repository};

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Company name (default: all companies, each resolved separately)
    pub company: Option<String>,

    /// Minimum similarity 0-100 (default: dedup.merge_threshold)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Resolve insider facts instead of public facts
    #[arg(long)]
    pub insider: bool,

    /// Show what would be merged without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

pub fn run(args: ResolveArgs, config: &Config) -> Result<()> {
    let repo = open_repository(config)?;
    let threshold = args.threshold.unwrap_or(config.dedup.merge_threshold);

    if args.insider {
        run_kind::<InsiderFact>(&repo, &args, threshold)
    } else {
        run_kind::<Fact>(&repo, &args, threshold)
    }
}

fn run_kind<F: ResearchFact>(repo: &Repository, args: &ResolveArgs, threshold: f64) -> Result<()> {
    let preview = run_pass::<F>(repo, args.company.as_deref(), threshold, true)?;
    let pending: usize = preview.iter().map(|r| r.merges.len()).sum();

    for report in preview.iter().filter(|r| !r.is_empty()) {
        print_report(report);
    }

    if pending == 0 {
        println!("✨ Nothing to merge at threshold {}.", threshold);
        return Ok(());
    }

    if args.dry_run {
        println!("\nℹ️  Dry run - {} fact(s) would be removed, nothing written.", pending);
        return Ok(());
    }

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove {} duplicate fact(s)?", pending))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let applied = run_pass::<F>(repo, args.company.as_deref(), threshold, false)?;
    let removed: usize = applied.iter().map(|r| r.merges.len()).sum();
    println!("🗑️  Removed {} duplicate fact(s).", removed);

    Ok(())
}

fn run_pass<F: ResearchFact>(
    repo: &Repository,
    company: Option<&str>,
    threshold: f64,
    dry_run: bool,
) -> Result<Vec<ChangeReport<F>>> {
    Ok(match company {
        Some(company) => vec![resolve::<F>(repo, company, threshold, dry_run)?],
        None => resolve_all::<F>(repo, threshold, dry_run)?,
    })
}

fn print_report<F: ResearchFact>(report: &ChangeReport<F>) {
    println!(
        "\n🧹 {} ({} -> {} facts)",
        report.company.bold(),
        report.facts_before,
        report.facts_after
    );

    for merge in &report.merges {
        println!("  {} {}", "keep  ".green(), merge.kept.fact.text());
        println!(
            "  {} {}  [{} @ {}]",
            "remove".red(),
            merge.removed.fact.text(),
            format_score(merge.score),
            merge.removed.location
        );
    }

    for skip in &report.skipped_by_guard {
        println!(
            "  {} {} <-> {}  [{}: {}]",
            "skip  ".yellow(),
            skip.a.location,
            skip.b.location,
            format_score(skip.score),
            skip.conflict
        );
    }
}
