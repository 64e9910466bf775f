//! CLI utility functions
//!
//! Helpers shared across commands: opening the repository and printing
//! facts the same way everywhere.

use anyhow::Result;
use colored::Colorize;

use crate::config::Config;
use crate::core::record::{FactLocation, ResearchFact};
use crate::core::repository::Repository;
use crate::core::similarity::Band;

/// Open the repository for the configured data directory
pub fn open_repository(config: &Config) -> Result<Repository> {
    let data_dir = config.data_dir();
    tracing::debug!(data_dir = %data_dir.display(), "Opening repository");
    Ok(Repository::new(data_dir))
}

/// Print one fact with all of its fields, indented
pub fn print_fact<F: ResearchFact>(location: Option<FactLocation>, fact: &F, indent: usize) {
    let pad = " ".repeat(indent);
    match location {
        Some(location) => println!("{}{} {}", pad, location.to_string().dimmed(), fact.text()),
        None => println!("{}{}", pad, fact.text()),
    }
    println!(
        "{}  source: {} | date: {} | confidence: {}",
        pad,
        if fact.source().is_empty() { "-" } else { fact.source() },
        fact.date(),
        fact.confidence()
    );
    for (name, value) in fact.extra_fields() {
        println!("{}  {}: {}", pad, name, value);
    }
}

/// Score with two decimals, coloured by band
pub fn format_score(score: f64) -> String {
    let text = format!("{:.2}", score);
    match Band::classify(score) {
        Band::Clear => text.red().bold().to_string(),
        Band::Likely => text.yellow().to_string(),
        Band::Below => text.normal().to_string(),
    }
}
