//! Merge resolver - collapse near-duplicate facts
//!
//! For every candidate pair from the similarity scan the resolver either
//! merges (keeps one fact, drops the other) or skips.
//!
//! # Rules
//! 1. Pairs touching a fact already removed in this pass are skipped
//! 2. Conflict guard: differing amounts or differing years block the merge
//! 3. Survivor: longer text, then more `;`-separated sources, then the
//!    earlier fact in encounter order
//!
//! A dry run computes the same report without writing.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use super::error::Result;
use super::record::{CompanyRecord, FactLocation, ResearchFact};
use super::repository::Repository;
use super::similarity::{check_threshold, find_candidates, Candidate};

static NUMBER_PATTERN: OnceLock<Regex> = OnceLock::new();

fn number_pattern() -> &'static Regex {
    NUMBER_PATTERN.get_or_init(|| {
        Regex::new(r"\d+(?:,\d{3})*(?:\.\d+)?").expect("number pattern is a valid regex")
    })
}

/// Numbers found in a fact text, split into years and everything else
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumericTokens {
    pub amounts: BTreeSet<String>,
    pub years: BTreeSet<String>,
}

impl NumericTokens {
    pub fn extract(text: &str) -> Self {
        let mut tokens = Self::default();

        for m in number_pattern().find_iter(text) {
            let raw = m.as_str();
            if is_year(raw) {
                tokens.years.insert(raw.to_string());
            } else {
                tokens.amounts.insert(normalize_number(raw));
            }
        }

        tokens
    }
}

fn is_year(raw: &str) -> bool {
    raw.len() == 4
        && raw.chars().all(|c| c.is_ascii_digit())
        && (raw.starts_with("19") || raw.starts_with("20"))
}

/// Strip thousands separators and trailing decimal zeros: `1,200.50` -> `1200.5`
fn normalize_number(raw: &str) -> String {
    let plain = raw.replace(',', "");
    match plain.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                whole.to_string()
            } else {
                format!("{}.{}", whole, frac)
            }
        }
        None => plain,
    }
}

/// Which class of numeric token disagreed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Amounts,
    Years,
}

/// Why the guard refused a merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardConflict {
    pub kind: ConflictKind,
    pub a: Vec<String>,
    pub b: Vec<String>,
}

impl fmt::Display for GuardConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            ConflictKind::Amounts => "amounts",
            ConflictKind::Years => "years",
        };
        write!(f, "{} differ: {{{}}} vs {{{}}}", label, self.a.join(", "), self.b.join(", "))
    }
}

/// Check two texts for numeric disagreement
///
/// A class conflicts only when both texts carry tokens of that class and
/// the sets differ. A class present on one side only is extra detail.
pub fn conflict_guard(a: &str, b: &str) -> Option<GuardConflict> {
    let left = NumericTokens::extract(a);
    let right = NumericTokens::extract(b);

    let classes = [
        (ConflictKind::Amounts, &left.amounts, &right.amounts),
        (ConflictKind::Years, &left.years, &right.years),
    ];

    let conflict = classes.into_iter().find_map(|(kind, x, y)| {
        (!x.is_empty() && !y.is_empty() && x != y).then(|| GuardConflict {
            kind,
            a: x.iter().cloned().collect(),
            b: y.iter().cloned().collect(),
        })
    });
    conflict
}

/// Which of two facts survives a merge
///
/// Returns `true` when `a` is kept. `a` must precede `b` in encounter order.
pub fn keep_first<F: ResearchFact>(a: &F, b: &F) -> bool {
    let len_a = a.text().chars().count();
    let len_b = b.text().chars().count();
    if len_a != len_b {
        return len_a > len_b;
    }

    let sources_a = a.source_count();
    let sources_b = b.source_count();
    if sources_a != sources_b {
        return sources_a > sources_b;
    }

    true
}

/// A fact with its position, as reported
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocatedFact<F> {
    pub location: FactLocation,
    pub fact: F,
}

/// One collapsed pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Merge<F> {
    pub score: f64,
    pub kept: LocatedFact<F>,
    pub removed: LocatedFact<F>,
}

/// One pair the conflict guard refused
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardSkip<F> {
    pub score: f64,
    pub a: LocatedFact<F>,
    pub b: LocatedFact<F>,
    pub conflict: GuardConflict,
}

/// Outcome of a resolver pass over one company
///
/// Locations refer to the record as it was before the pass.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeReport<F> {
    pub company: String,
    pub threshold: f64,
    pub dry_run: bool,
    pub merges: Vec<Merge<F>>,
    pub skipped_by_guard: Vec<GuardSkip<F>>,
    pub facts_before: usize,
    pub facts_after: usize,
}

impl<F> ChangeReport<F> {
    pub fn kept(&self) -> impl Iterator<Item = &LocatedFact<F>> {
        self.merges.iter().map(|m| &m.kept)
    }

    pub fn removed(&self) -> impl Iterator<Item = &LocatedFact<F>> {
        self.merges.iter().map(|m| &m.removed)
    }

    pub fn is_empty(&self) -> bool {
        self.merges.is_empty() && self.skipped_by_guard.is_empty()
    }
}

/// Decide every candidate in `record` without touching storage
pub fn plan<F: ResearchFact>(record: &CompanyRecord<F>, threshold: f64) -> ChangeReport<F> {
    let candidates = find_candidates(record, threshold);
    let mut removed: HashSet<FactLocation> = HashSet::new();
    let mut merges = Vec::new();
    let mut skipped_by_guard = Vec::new();

    for Candidate { a, b, score } in candidates {
        if score < threshold || removed.contains(&a) || removed.contains(&b) {
            continue;
        }
        let (Some(fact_a), Some(fact_b)) = (record.fact_at(a), record.fact_at(b)) else {
            continue;
        };

        let located_a = LocatedFact {
            location: a,
            fact: fact_a.clone(),
        };
        let located_b = LocatedFact {
            location: b,
            fact: fact_b.clone(),
        };

        if let Some(conflict) = conflict_guard(fact_a.text(), fact_b.text()) {
            debug!(%a, %b, score, %conflict, "Conflict guard skipped pair");
            skipped_by_guard.push(GuardSkip {
                score,
                a: located_a,
                b: located_b,
                conflict,
            });
            continue;
        }

        let (kept, loser) = if keep_first(fact_a, fact_b) {
            (located_a, located_b)
        } else {
            (located_b, located_a)
        };
        removed.insert(loser.location);
        merges.push(Merge {
            score,
            kept,
            removed: loser,
        });
    }

    let facts_before = record.total_facts();
    ChangeReport {
        company: record.company.clone(),
        threshold,
        dry_run: true,
        facts_after: facts_before - removed.len(),
        facts_before,
        merges,
        skipped_by_guard,
    }
}

/// Run the resolver over one company
///
/// With `dry_run` the report is returned and nothing is written.
pub fn resolve<F: ResearchFact>(
    repo: &Repository,
    company: &str,
    threshold: f64,
    dry_run: bool,
) -> Result<ChangeReport<F>> {
    check_threshold(threshold)?;

    let mut record = repo.load::<F>(company)?;
    let mut report = plan(&record, threshold);
    report.dry_run = dry_run;

    if dry_run || report.merges.is_empty() {
        return Ok(report);
    }

    let losers: Vec<FactLocation> = report.removed().map(|f| f.location).collect();
    record.remove_facts(&losers);
    let written = repo.write(company, record)?;
    report.facts_after = written.summary.total_facts_found;

    info!(
        company,
        removed = losers.len(),
        guarded = report.skipped_by_guard.len(),
        facts = report.facts_after,
        "Duplicate facts merged"
    );

    Ok(report)
}

/// Run the resolver over every company with a record of fact type `F`
pub fn resolve_all<F: ResearchFact>(
    repo: &Repository,
    threshold: f64,
    dry_run: bool,
) -> Result<Vec<ChangeReport<F>>> {
    repo.companies(F::KIND)?
        .iter()
        .map(|company| resolve::<F>(repo, company, threshold, dry_run))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{CategoryName, Confidence, Fact, PartialRecord};
    use chrono::NaiveDate;

    fn fact(text: &str, source: &str) -> Fact {
        Fact::new(
            text,
            source,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            Confidence::ExplicitStatement,
        )
    }

    fn seeded(facts: Vec<(CategoryName, Fact)>) -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::new(dir.path());
        let mut partial = PartialRecord::new();
        for (category, fact) in facts {
            partial = partial.with_fact(category, fact);
        }
        repo.save("Acme", partial).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_numeric_tokens() {
        let tokens = NumericTokens::extract("Revenue of $1,200.50M in 2023, up 40% from 2022");
        assert_eq!(
            tokens.amounts,
            ["1200.5", "40"].into_iter().map(String::from).collect()
        );
        assert_eq!(
            tokens.years,
            ["2022", "2023"].into_iter().map(String::from).collect()
        );
    }

    #[test]
    fn test_guard_blocks_different_figures() {
        let conflict = conflict_guard(
            "Revenue grew to $10M in 2023",
            "Revenue grew to $12M in 2024",
        )
        .unwrap();
        assert_eq!(conflict.kind, ConflictKind::Amounts);
    }

    #[test]
    fn test_guard_blocks_different_years_only() {
        let conflict = conflict_guard("Reorg announced in 2022", "Reorg announced in 2023").unwrap();
        assert_eq!(conflict.kind, ConflictKind::Years);
    }

    #[test]
    fn test_guard_allows_added_year() {
        assert!(conflict_guard(
            "Raised $50M Series B led by Acme Ventures",
            "Raised $50M Series B led by Acme Ventures in March 2024",
        )
        .is_none());
    }

    #[test]
    fn test_survivor_prefers_longer_text() {
        let short = fact("Profitable", "a; b; c");
        let long = fact("Profitable since 2021", "a");
        assert!(!keep_first(&short, &long));
        assert!(keep_first(&long, &short));
    }

    #[test]
    fn test_survivor_prefers_more_sources_on_tie() {
        let one = fact("Profitable", "Blog");
        let two = fact("profitable", "Blog; 10-K");
        assert!(!keep_first(&one, &two));
    }

    #[test]
    fn test_survivor_first_on_full_tie() {
        let a = fact("Profitable", "Blog");
        let b = fact("profitable", "News");
        assert!(keep_first(&a, &b));
    }

    #[test]
    fn test_series_b_scenario() -> anyhow::Result<()> {
        let (_dir, repo) = seeded(vec![
            (
                CategoryName::FinancialHealth,
                fact("Raised $50M Series B led by Acme Ventures", "TechCrunch"),
            ),
            (
                CategoryName::FinancialHealth,
                fact("Raised $50M Series B led by Acme Ventures in March 2024", "Press release"),
            ),
            (CategoryName::TechnicalCulture, fact("Monorepo with Bazel", "Blog")),
        ]);
        let before = repo.load::<Fact>("Acme")?.summary.total_facts_found;

        let report = resolve::<Fact>(&repo, "Acme", 85.0, false)?;
        assert_eq!(report.merges.len(), 1);
        assert_eq!(
            report.merges[0].kept.fact.text,
            "Raised $50M Series B led by Acme Ventures in March 2024"
        );
        assert_eq!(
            report.merges[0].removed.fact.text,
            "Raised $50M Series B led by Acme Ventures"
        );

        let after = repo.load::<Fact>("Acme")?;
        assert_eq!(after.summary.total_facts_found, before - 1);
        assert_eq!(after.categories.financial_health.facts_found.len(), 1);
        Ok(())
    }

    #[test]
    fn test_guarded_pair_never_merged() -> anyhow::Result<()> {
        let (_dir, repo) = seeded(vec![
            (CategoryName::FinancialHealth, fact("Revenue grew to $10M in 2023", "10-K")),
            (CategoryName::FinancialHealth, fact("Revenue grew to $12M in 2024", "10-K")),
        ]);

        for threshold in [0.0, 50.0, 85.0, 90.0] {
            let report = resolve::<Fact>(&repo, "Acme", threshold, false)?;
            assert!(report.merges.is_empty());
            assert_eq!(report.skipped_by_guard.len(), 1);
        }
        assert_eq!(repo.load::<Fact>("Acme")?.total_facts(), 2);
        Ok(())
    }

    #[test]
    fn test_dry_run_does_not_write() -> anyhow::Result<()> {
        let (_dir, repo) = seeded(vec![
            (CategoryName::MarketPosition, fact("Market leader in payroll software", "G2")),
            (CategoryName::MarketPosition, fact("Market leader in payroll software", "Gartner")),
        ]);

        let report = resolve::<Fact>(&repo, "Acme", 90.0, true)?;
        assert!(report.dry_run);
        assert_eq!(report.removed().count(), 1);
        assert_eq!(report.facts_after, 1);
        assert_eq!(repo.load::<Fact>("Acme")?.total_facts(), 2);
        Ok(())
    }

    #[test]
    fn test_second_pass_removes_nothing() -> anyhow::Result<()> {
        let (_dir, repo) = seeded(vec![
            (CategoryName::MarketPosition, fact("Market leader in payroll software", "G2")),
            (CategoryName::MarketPosition, fact("Market leader in payroll software.", "G2")),
            (CategoryName::OrganizationalStability, fact("market leader in payroll software", "Blog")),
            (CategoryName::FinancialHealth, fact("Revenue grew to $10M in 2023", "10-K")),
            (CategoryName::FinancialHealth, fact("Revenue grew to $12M in 2024", "10-K")),
        ]);

        let first = resolve::<Fact>(&repo, "Acme", 85.0, false)?;
        assert_eq!(first.removed().count(), 2);

        let second = resolve::<Fact>(&repo, "Acme", 85.0, false)?;
        assert_eq!(second.removed().count(), 0);
        assert_eq!(repo.load::<Fact>("Acme")?.total_facts(), 3);
        Ok(())
    }

    #[test]
    fn test_below_threshold_untouched() -> anyhow::Result<()> {
        let (_dir, repo) = seeded(vec![
            (CategoryName::TechnicalCulture, fact("Weekly on-call rotation", "Glassdoor")),
            (CategoryName::TechnicalCulture, fact("Strong code review culture", "Blog")),
        ]);

        let report = resolve::<Fact>(&repo, "Acme", 85.0, false)?;
        assert!(report.is_empty());
        Ok(())
    }

    #[test]
    fn test_punctuation_only_facts_survive() -> anyhow::Result<()> {
        let (_dir, repo) = seeded(vec![
            (CategoryName::TechnicalCulture, fact("???", "Notes")),
            (CategoryName::TechnicalCulture, fact("--", "Notes")),
        ]);

        let report = resolve::<Fact>(&repo, "Acme", 50.0, false)?;
        assert!(report.merges.is_empty());
        assert_eq!(repo.load::<Fact>("Acme")?.total_facts(), 2);
        Ok(())
    }

    #[test]
    fn test_resolve_all_per_company() -> anyhow::Result<()> {
        let (_dir, repo) = seeded(vec![
            (CategoryName::MarketPosition, fact("Market leader in payroll software", "G2")),
        ]);
        repo.save(
            "Globex",
            PartialRecord::new()
                .with_fact(CategoryName::MarketPosition, fact("Market leader in payroll software", "G2")),
        )?;

        let reports = resolve_all::<Fact>(&repo, 85.0, false)?;
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.merges.is_empty()));
        Ok(())
    }
}
