//! Stats command - Per-company overview

use std::collections::BTreeSet;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::config::Config;
use crate::core::flags::{FlagStore, Polarity};
use crate::core::record::{Fact, InsiderFact, RecordKind};
use crate::core::repository::Repository;

use super::utils::open_repository;

/// Stats command arguments
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct CompanyRow {
    #[tabled(rename = "Company")]
    company: String,
    #[tabled(rename = "Facts")]
    facts: usize,
    #[tabled(rename = "Insider")]
    insider_facts: usize,
    #[tabled(rename = "Completeness")]
    completeness: String,
    #[tabled(rename = "Green")]
    green_flags: usize,
    #[tabled(rename = "Red")]
    red_flags: usize,
    #[tabled(rename = "Decision")]
    decision: String,
}

/// Print one row per company that has any research on disk
pub fn run(args: StatsArgs, config: &Config) -> Result<()> {
    let repo = open_repository(config)?;
    let rows = collect_rows(&repo)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No companies yet. Add research with `scout save`.");
        println!("\n📁 Data: {}", repo.data_dir().display());
        return Ok(());
    }

    println!("📊 Research Overview\n");
    let total: usize = rows.iter().map(|r| r.facts + r.insider_facts).sum();
    let companies = rows.len();
    println!("{}", Table::new(rows).with(Style::rounded()));
    println!("\n  {} companies, {} facts", companies, total);
    println!("\n📁 Data: {}", repo.data_dir().display());

    Ok(())
}

fn collect_rows(repo: &Repository) -> Result<Vec<CompanyRow>> {
    let mut companies = BTreeSet::new();
    for kind in [RecordKind::Facts, RecordKind::InsiderFacts, RecordKind::Flags] {
        companies.extend(repo.companies(kind)?);
    }

    let flag_store = FlagStore::new(repo);
    let mut rows = Vec::new();

    for slug in companies {
        let public = if repo.exists(&slug, RecordKind::Facts) {
            Some(repo.load::<Fact>(&slug)?)
        } else {
            None
        };
        let insider = if repo.exists(&slug, RecordKind::InsiderFacts) {
            Some(repo.load::<InsiderFact>(&slug)?)
        } else {
            None
        };
        let flags = if repo.exists(&slug, RecordKind::Flags) {
            Some(flag_store.load(&slug)?)
        } else {
            None
        };

        let company = public
            .as_ref()
            .map(|r| r.company.clone())
            .or_else(|| insider.as_ref().map(|r| r.company.clone()))
            .or_else(|| flags.as_ref().map(|f| f.company.clone()))
            .unwrap_or_else(|| slug.clone());

        rows.push(CompanyRow {
            company,
            facts: public.as_ref().map_or(0, |r| r.total_facts()),
            insider_facts: insider.as_ref().map_or(0, |r| r.total_facts()),
            completeness: public
                .as_ref()
                .map_or_else(|| "-".to_string(), |r| r.summary.information_completeness.to_string()),
            green_flags: flags.as_ref().map_or(0, |f| f.count(Polarity::Green)),
            red_flags: flags.as_ref().map_or(0, |f| f.count(Polarity::Red)),
            decision: flags
                .as_ref()
                .and_then(|f| f.decision.as_ref())
                .map_or_else(|| "-".to_string(), |d| format!("{} ({})", d.outcome, d.confidence)),
        });
    }

    Ok(rows)
}
