//! `scout show` command
//!
//! Prints a company's record.
//!
//! # Usage
//! ```bash
//! scout show "Acme Corp"
//! scout show "Acme Corp" --insider
//! scout show "Acme Corp" --format yaml
//! scout show "Acme Corp" --category technical_culture
//! ```

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;

use crate::config::Config;
use crate::core::record::{CategoryName, CompanyRecord, Fact, InsiderFact, ResearchFact};

use super::utils::{open_repository, print_fact};

#[derive(ValueEnum, Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
    Yaml,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Company name
    pub company: String,

    /// Show the insider facts record
    #[arg(long)]
    pub insider: bool,

    /// Only this category (e.g. financial_health)
    #[arg(long)]
    pub category: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

pub fn run(args: ShowArgs, config: &Config) -> Result<()> {
    let category = args
        .category
        .as_deref()
        .map(str::parse::<CategoryName>)
        .transpose()?;
    let repo = open_repository(config)?;

    if args.insider {
        print_record(&repo.load::<InsiderFact>(&args.company)?, category, &args.format)
    } else {
        print_record(&repo.load::<Fact>(&args.company)?, category, &args.format)
    }
}

fn print_record<F: ResearchFact>(
    record: &CompanyRecord<F>,
    category: Option<CategoryName>,
    format: &OutputFormat,
) -> Result<()> {
    match (format, category) {
        (OutputFormat::Json, Some(name)) => {
            println!("{}", serde_json::to_string_pretty(record.categories.get(name))?)
        }
        (OutputFormat::Json, None) => println!("{}", serde_json::to_string_pretty(record)?),
        (OutputFormat::Yaml, Some(name)) => {
            print!("{}", serde_yaml::to_string(record.categories.get(name))?)
        }
        (OutputFormat::Yaml, None) => print!("{}", serde_yaml::to_string(record)?),
        (OutputFormat::Pretty, _) => print_pretty(record, category),
    }
    Ok(())
}

fn print_pretty<F: ResearchFact>(record: &CompanyRecord<F>, only: Option<CategoryName>) {
    println!("\n{}", format!("🏢 {} ({})", record.company, F::KIND).bold());
    println!("   Record date:  {}", record.record_date);
    println!("   Total facts:  {}", record.summary.total_facts_found);
    println!("   Completeness: {}", record.summary.information_completeness);

    for (name, category) in record.categories.iter() {
        if only.is_some_and(|o| o != name) {
            continue;
        }
        println!(
            "\n{} ({})",
            name.to_string().cyan().bold(),
            category.facts_found.len()
        );

        if category.facts_found.is_empty() {
            println!("  {}", "(no facts)".dimmed());
        }
        for fact in &category.facts_found {
            print_fact(None, fact, 2);
        }

        if !category.missing_information.is_empty() {
            println!("  {}", "Missing:".yellow());
            for item in &category.missing_information {
                println!("    - {}", item);
            }
        }
    }
}
