//! Duplicate report - read-only listing for manual review
//!
//! Projects similarity candidates onto the full facts they point at, and
//! annotates each pair with what the conflict guard would say. Never writes.

use serde::Serialize;

use super::error::Result;
use super::record::{CompanyRecord, ResearchFact};
use super::repository::Repository;
use super::resolver::{conflict_guard, GuardConflict, LocatedFact};
use super::similarity::{scan, Band, Candidate};

/// One candidate pair with both facts in full
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry<F> {
    pub score: f64,
    pub band: Band,
    pub a: LocatedFact<F>,
    pub b: LocatedFact<F>,
    /// Set when the resolver would refuse to merge this pair
    pub guard: Option<GuardConflict>,
}

impl<F> ReportEntry<F> {
    pub fn auto_mergeable(&self) -> bool {
        self.guard.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateReport<F> {
    pub company: String,
    pub threshold: f64,
    pub total_facts: usize,
    pub entries: Vec<ReportEntry<F>>,
}

impl<F> DuplicateReport<F> {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn guarded(&self) -> usize {
        self.entries.iter().filter(|e| e.guard.is_some()).count()
    }
}

/// Attach full facts and guard verdicts to scored candidates
fn project<F: ResearchFact>(
    record: &CompanyRecord<F>,
    candidates: Vec<Candidate>,
    threshold: f64,
) -> DuplicateReport<F> {
    let entries = candidates
        .into_iter()
        .filter_map(|candidate| {
            let fact_a = record.fact_at(candidate.a)?;
            let fact_b = record.fact_at(candidate.b)?;
            Some(ReportEntry {
                score: candidate.score,
                band: candidate.band(),
                guard: conflict_guard(fact_a.text(), fact_b.text()),
                a: LocatedFact {
                    location: candidate.a,
                    fact: fact_a.clone(),
                },
                b: LocatedFact {
                    location: candidate.b,
                    fact: fact_b.clone(),
                },
            })
        })
        .collect();

    DuplicateReport {
        company: record.company.clone(),
        threshold,
        total_facts: record.total_facts(),
        entries,
    }
}

/// Candidate listing for one company
pub fn list<F: ResearchFact>(
    repo: &Repository,
    company: &str,
    threshold: f64,
) -> Result<DuplicateReport<F>> {
    list_scoped(repo, Some(company), threshold).map(|mut reports| {
        reports.pop().unwrap_or_else(|| DuplicateReport {
            company: company.to_string(),
            threshold,
            total_facts: 0,
            entries: Vec::new(),
        })
    })
}

/// Candidate listings for every company, each scanned on its own
pub fn list_all<F: ResearchFact>(repo: &Repository, threshold: f64) -> Result<Vec<DuplicateReport<F>>> {
    list_scoped(repo, None, threshold)
}

fn list_scoped<F: ResearchFact>(
    repo: &Repository,
    company: Option<&str>,
    threshold: f64,
) -> Result<Vec<DuplicateReport<F>>> {
    Ok(scan::<F>(repo, company, threshold)?
        .into_iter()
        .map(|s| project(&s.record, s.candidates, threshold))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{CategoryName, Confidence, Fact, PartialRecord, RecordKind};
    use chrono::NaiveDate;
    use std::fs;

    fn fact(text: &str) -> Fact {
        Fact::new(
            text,
            "Annual report",
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            Confidence::ExplicitStatement,
        )
    }

    #[test]
    fn test_list_is_read_only() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let repo = Repository::new(dir.path());
        repo.save(
            "Acme",
            PartialRecord::new()
                .with_fact(CategoryName::FinancialHealth, fact("Revenue grew to $10M in 2023"))
                .with_fact(CategoryName::FinancialHealth, fact("Revenue grew to $12M in 2024"))
                .with_fact(CategoryName::MarketPosition, fact("Leader in payroll software"))
                .with_fact(CategoryName::OrganizationalStability, fact("Leader in payroll software")),
        )?;
        let path = repo.record_path("Acme", RecordKind::Facts)?;
        let before = fs::read_to_string(&path)?;

        let report = list::<Fact>(&repo, "Acme", 85.0)?;
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.guarded(), 1);
        assert_eq!(report.total_facts, 4);

        let clear = &report.entries[0];
        assert_eq!(clear.band, Band::Clear);
        assert!(clear.auto_mergeable());
        assert_eq!(clear.a.location.category, CategoryName::MarketPosition);
        assert_eq!(clear.b.fact.text, "Leader in payroll software");

        assert_eq!(fs::read_to_string(&path)?, before);
        Ok(())
    }

    #[test]
    fn test_list_missing_company() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::new(dir.path());
        assert!(list::<Fact>(&repo, "Nobody", 85.0).unwrap_err().is_not_found());
    }
}
