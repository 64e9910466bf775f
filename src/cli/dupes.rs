//! `scout dupes` command
//!
//! Lists near-duplicate fact pairs for manual review. Read-only.
//!
//! # Usage
//! ```bash
//! scout dupes                       # every company
//! scout dupes "Acme Corp"           # one company
//! scout dupes --threshold 90        # only clear duplicates
//! scout dupes --insider --json
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use crate::config::Config;
use crate::core::record::{Fact, InsiderFact, ResearchFact};
use crate::core::report::{list, list_all, DuplicateReport};
use crate::core::repository::Repository;

use super::utils::{format_score, open_repository, print_fact};

#[derive(Args, Debug)]
pub struct DupesArgs {
    /// Company name (default: all companies, each scanned separately)
    pub company: Option<String>,

    /// Minimum similarity 0-100 (default: dedup.report_threshold)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Scan insider facts instead of public facts
    #[arg(long)]
    pub insider: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct PairRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Band")]
    band: String,
    #[tabled(rename = "Fact A")]
    a: String,
    #[tabled(rename = "Fact B")]
    b: String,
    #[tabled(rename = "Auto-merge")]
    merge: String,
}

pub fn run(args: DupesArgs, config: &Config) -> Result<()> {
    let repo = open_repository(config)?;
    let threshold = args.threshold.unwrap_or(config.dedup.report_threshold);

    if args.insider {
        run_kind::<InsiderFact>(&repo, &args, threshold)
    } else {
        run_kind::<Fact>(&repo, &args, threshold)
    }
}

fn run_kind<F: ResearchFact>(repo: &Repository, args: &DupesArgs, threshold: f64) -> Result<()> {
    let reports: Vec<DuplicateReport<F>> = match &args.company {
        Some(company) => vec![list(repo, company, threshold)?],
        None => list_all(repo, threshold)?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    if reports.iter().all(|r| r.is_empty()) {
        println!(
            "✨ No duplicate candidates at threshold {} across {} compan{}.",
            threshold,
            reports.len(),
            if reports.len() == 1 { "y" } else { "ies" }
        );
        return Ok(());
    }

    for report in reports.iter().filter(|r| !r.is_empty()) {
        print_report(report);
    }

    Ok(())
}

fn print_report<F: ResearchFact>(report: &DuplicateReport<F>) {
    println!(
        "\n🔎 {} - {} candidate(s) among {} facts (threshold {})",
        report.company.bold(),
        report.entries.len(),
        report.total_facts,
        report.threshold
    );

    let rows: Vec<PairRow> = report
        .entries
        .iter()
        .enumerate()
        .map(|(i, entry)| PairRow {
            index: i + 1,
            score: format!("{:.2}", entry.score),
            band: entry.band.to_string(),
            a: entry.a.location.to_string(),
            b: entry.b.location.to_string(),
            merge: match &entry.guard {
                Some(conflict) => format!("no ({})", conflict),
                None => "yes".to_string(),
            },
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    for (i, entry) in report.entries.iter().enumerate() {
        println!("\n[{}] similarity {}", i + 1, format_score(entry.score));
        print_fact(Some(entry.a.location), &entry.a.fact, 2);
        print_fact(Some(entry.b.location), &entry.b.fact, 2);
        if let Some(conflict) = &entry.guard {
            println!("  {} {}", "⚠ guard:".yellow(), conflict);
        }
    }

    if report.guarded() > 0 {
        println!(
            "\n{} pair(s) need manual review; `scout resolve` will skip them.",
            report.guarded()
        );
    }
}
