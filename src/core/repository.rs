//! Repository - YAML record store with merge-on-save
//!
//! One directory per company under `<data_dir>/companies/<slug>/`, one YAML
//! document per record kind (`facts.yaml`, `insider_facts.yaml`,
//! `flags.yaml`).
//!
//! # Key Points
//! - `save` merges: fact lists are concatenated (never deduplicated here),
//!   missing information is unioned by exact text
//! - Input is parsed and validated before anything touches disk, so a
//!   rejected save leaves the persisted record as it was
//! - Writes go to a temp file in the same directory, then rename

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::{Error, Result};
use super::record::{
    dedup_preserving_order, CategoryName, CompanyRecord, PartialRecord, RecordKind, ResearchFact,
};

const COMPANIES_DIR: &str = "companies";

/// Handle on a data directory
///
/// Passed explicitly into every operation; there is no process-wide store.
#[derive(Debug, Clone)]
pub struct Repository {
    data_dir: PathBuf,
}

impl Repository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn company_dir(&self, company: &str) -> Result<PathBuf> {
        let slug = slugify(company);
        if slug.is_empty() {
            return Err(Error::Validation(format!(
                "Company name '{}' has no usable characters",
                company
            )));
        }
        Ok(self.data_dir.join(COMPANIES_DIR).join(slug))
    }

    pub fn record_path(&self, company: &str, kind: RecordKind) -> Result<PathBuf> {
        Ok(self.company_dir(company)?.join(kind.file_name()))
    }

    pub fn exists(&self, company: &str, kind: RecordKind) -> bool {
        self.record_path(company, kind)
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    /// Load the persisted record of fact type `F`
    ///
    /// # Errors
    /// `NotFound` when the company has no record of this kind.
    pub fn load<F: ResearchFact>(&self, company: &str) -> Result<CompanyRecord<F>> {
        let path = self.record_path(company, F::KIND)?;
        if !path.exists() {
            return Err(Error::not_found(F::KIND.to_string(), company));
        }

        let mut record: CompanyRecord<F> = read_document(&path)?;
        record.validate()?;

        let counted = record.total_facts();
        if record.summary.total_facts_found != counted {
            warn!(
                company,
                stored = record.summary.total_facts_found,
                counted,
                "Summary count out of date, correcting"
            );
            record.refresh_summary();
        }

        Ok(record)
    }

    /// Merge new research into the company's record and persist the result
    ///
    /// Creates the record on first save.
    pub fn save<F: ResearchFact>(
        &self,
        company: &str,
        partial: PartialRecord<F>,
    ) -> Result<CompanyRecord<F>> {
        partial.validate()?;
        let kind = F::KIND;

        let record = match self.load::<F>(company) {
            Ok(mut existing) => {
                let before = existing.total_facts();
                merge(&mut existing, partial);
                info!(
                    company,
                    kind = %kind,
                    before,
                    after = existing.total_facts(),
                    "Merged research into existing record"
                );
                existing
            }
            Err(e) if e.is_not_found() => {
                let record = partial.into_record(company, today());
                info!(
                    company,
                    kind = %kind,
                    facts = record.total_facts(),
                    "Created new record"
                );
                record
            }
            Err(e) => return Err(e),
        };

        self.write(company, record)
    }

    /// Replace the persisted record wholesale
    ///
    /// The summary count is recomputed before writing. Used by the merge
    /// resolver, which must not go through merge-on-save.
    pub fn write<F: ResearchFact>(
        &self,
        company: &str,
        mut record: CompanyRecord<F>,
    ) -> Result<CompanyRecord<F>> {
        record.refresh_summary();
        record.validate()?;

        let path = self.record_path(company, F::KIND)?;
        write_document(&path, &record)?;
        debug!(path = %path.display(), facts = record.total_facts(), "Record written");

        Ok(record)
    }

    /// Slugs of companies holding a document of `kind`, sorted
    pub fn companies(&self, kind: RecordKind) -> Result<Vec<String>> {
        let root = self.data_dir.join(COMPANIES_DIR);
        if !root.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&root).map_err(|e| Error::io(&root, e))?;
        let mut companies = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&root, e))?;
            let path = entry.path();
            if path.is_dir() && path.join(kind.file_name()).exists() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    companies.push(name.to_string());
                }
            }
        }
        companies.sort();
        Ok(companies)
    }

    /// Parse incoming research text into a partial record
    ///
    /// Parse failures (unknown category, bad enum, bad date) are `Validation`.
    pub fn parse_partial<F: ResearchFact>(text: &str) -> Result<PartialRecord<F>> {
        let partial: PartialRecord<F> =
            serde_yaml::from_str(text).map_err(|e| Error::Validation(e.to_string()))?;
        partial.validate()?;
        Ok(partial)
    }
}

/// Fold `partial` into `existing`
fn merge<F: ResearchFact>(existing: &mut CompanyRecord<F>, partial: PartialRecord<F>) {
    let completeness = partial.completeness();
    let PartialRecord {
        record_date,
        mut categories,
        ..
    } = partial;

    for name in CategoryName::ALL {
        let incoming = std::mem::take(categories.get_mut(name));
        let target = existing.categories.get_mut(name);

        target.facts_found.extend(incoming.facts_found);
        target.missing_information.extend(incoming.missing_information);
        dedup_preserving_order(&mut target.missing_information);
    }

    if let Some(completeness) = completeness {
        existing.summary.information_completeness = completeness;
    }
    if let Some(date) = record_date {
        existing.record_date = date;
    }
    existing.refresh_summary();
}

/// Directory-safe form of a company name
///
/// Lowercase ASCII alphanumerics; any other run of characters becomes a
/// single `-`. Applying it twice gives the same result.
pub fn slugify(company: &str) -> String {
    let mut slug = String::with_capacity(company.len());
    let mut pending_dash = false;

    for c in company.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_yaml::from_str(&content)
        .map_err(|e| Error::Validation(format!("{}: {}", path.display(), e)))
}

pub(crate) fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_yaml::to_string(value).map_err(|e| Error::Serialize(e.to_string()))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let tmp = path.with_extension("yaml.tmp");
    fs::write(&tmp, content).map_err(|e| Error::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| Error::io(path, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{Completeness, Confidence, Fact, InsiderFact, InsiderFactType};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fact(text: &str) -> Fact {
        Fact::new(text, "Crunchbase", date(2024, 3, 1), Confidence::ExplicitStatement)
    }

    fn open() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::new(dir.path());
        (dir, repo)
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Acme Corp."), "acme-corp");
        assert_eq!(slugify("  Foo & Bar, Inc "), "foo-bar-inc");
        assert_eq!(slugify(&slugify("Foo & Bar")), slugify("Foo & Bar"));
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let (_dir, repo) = open();
        let err = repo.load::<Fact>("Nobody").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_first_save_creates_record() -> anyhow::Result<()> {
        let (_dir, repo) = open();

        let partial = PartialRecord::new()
            .with_date(date(2024, 4, 1))
            .with_fact(CategoryName::FinancialHealth, fact("Profitable since 2022"))
            .with_missing(CategoryName::MarketPosition, "Market share");

        let saved = repo.save("Acme", partial)?;
        assert_eq!(saved.company, "Acme");
        assert_eq!(saved.summary.total_facts_found, 1);
        assert!(repo.exists("Acme", RecordKind::Facts));

        Ok(())
    }

    #[test]
    fn test_round_trip() -> anyhow::Result<()> {
        let (_dir, repo) = open();

        let mut record: CompanyRecord<Fact> = CompanyRecord::new("Acme", date(2024, 4, 1));
        record.push(CategoryName::FinancialHealth, fact("Profitable since 2022"));
        record.push(CategoryName::TechnicalCulture, fact("Uses Rust in production"));
        record.categories.market_position.missing_information = vec!["Competitors".into()];
        record.summary.information_completeness = Completeness::Medium;

        let partial: PartialRecord<Fact> = Repository::parse_partial(&serde_yaml::to_string(&record)?)?;
        repo.save("Acme", partial)?;

        assert_eq!(repo.load::<Fact>("Acme")?, record);
        Ok(())
    }

    #[test]
    fn test_merge_concatenates_without_dedup() -> anyhow::Result<()> {
        let (_dir, repo) = open();

        let first = PartialRecord::new()
            .with_fact(CategoryName::FinancialHealth, fact("Raised $50M Series B"))
            .with_missing(CategoryName::FinancialHealth, "Burn rate")
            .with_completeness(Completeness::Low);
        repo.save("Acme", first)?;

        let second = PartialRecord::new()
            .with_date(date(2024, 9, 1))
            .with_fact(CategoryName::FinancialHealth, fact("Raised $50M Series B"))
            .with_fact(CategoryName::MarketPosition, fact("Top 3 vendor"))
            .with_missing(CategoryName::FinancialHealth, "Burn rate")
            .with_missing(CategoryName::FinancialHealth, "Runway");
        let merged = repo.save("Acme", second)?;

        let finance = &merged.categories.financial_health;
        assert_eq!(finance.facts_found.len(), 2);
        assert_eq!(
            finance.missing_information,
            vec!["Burn rate".to_string(), "Runway".to_string()]
        );
        assert_eq!(merged.summary.total_facts_found, 3);
        assert_eq!(merged.record_date, date(2024, 9, 1));
        // Completeness retained when not supplied
        assert_eq!(merged.summary.information_completeness, Completeness::Low);

        Ok(())
    }

    #[test]
    fn test_merge_total_never_decreases() -> anyhow::Result<()> {
        let (_dir, repo) = open();
        repo.save(
            "Acme",
            PartialRecord::new().with_fact(CategoryName::FinancialHealth, fact("a")),
        )?;
        let before = repo.load::<Fact>("Acme")?.summary.total_facts_found;

        let after = repo
            .save(
                "Acme",
                PartialRecord::new().with_fact(CategoryName::TechnicalCulture, fact("b")),
            )?
            .summary
            .total_facts_found;

        assert!(after >= before);
        Ok(())
    }

    #[test]
    fn test_unknown_category_leaves_record_unchanged() -> anyhow::Result<()> {
        let (_dir, repo) = open();
        repo.save(
            "Acme",
            PartialRecord::new().with_fact(CategoryName::FinancialHealth, fact("a")),
        )?;
        let path = repo.record_path("Acme", RecordKind::Facts)?;
        let before = fs::read_to_string(&path)?;

        let yaml = r#"
categories:
  gossip:
    facts_found:
      - text: CEO drives a boat
        source: Forum
        date: 2024-01-01
        confidence: implied
"#;
        let err = Repository::parse_partial::<Fact>(yaml).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(fs::read_to_string(&path)?, before);

        Ok(())
    }

    #[test]
    fn test_unparsable_date_is_validation_error() {
        let yaml = r#"
record_date: 2024-13-45
"#;
        let err = Repository::parse_partial::<Fact>(yaml).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_empty_fact_text_rejected_by_save() {
        let (_dir, repo) = open();
        let err = repo
            .save(
                "Acme",
                PartialRecord::new().with_fact(CategoryName::FinancialHealth, fact("  ")),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(!repo.exists("Acme", RecordKind::Facts));
    }

    #[test]
    fn test_insider_and_public_records_are_separate() -> anyhow::Result<()> {
        let (_dir, repo) = open();
        repo.save(
            "Acme",
            PartialRecord::new().with_fact(CategoryName::FinancialHealth, fact("public")),
        )?;

        let insider = InsiderFact {
            context: Some("Ex-employee call".to_string()),
            ..InsiderFact::new(fact("Layoffs rumoured for Q3"), InsiderFactType::Subjective)
        };
        repo.save(
            "Acme",
            PartialRecord::new().with_fact(CategoryName::OrganizationalStability, insider),
        )?;

        assert_eq!(repo.load::<Fact>("Acme")?.total_facts(), 1);
        let loaded = repo.load::<InsiderFact>("Acme")?;
        assert_eq!(loaded.total_facts(), 1);
        assert_eq!(
            loaded.categories.organizational_stability.facts_found[0]
                .context
                .as_deref(),
            Some("Ex-employee call")
        );

        Ok(())
    }

    #[test]
    fn test_unknown_fact_type_is_validation_error() {
        let yaml = r#"
categories:
  organizational_stability:
    facts_found:
      - text: Reorg every six months
        source: Former manager
        date: 2024-02-01
        confidence: firsthand_account
        fact_type: rumour
"#;
        let err = Repository::parse_partial::<InsiderFact>(yaml).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_insider_record_round_trip_keeps_context() -> anyhow::Result<()> {
        let (_dir, repo) = open();
        let yaml = r#"
record_date: 2024-06-01
categories:
  technical_culture:
    facts_found:
      - text: On-call rotation is weekly
        source: Engineer interview
        date: 2024-05-10
        confidence: firsthand_account
        fact_type: objective
        context: Coffee chat
      - text: Leadership dismisses tech debt
        source: Ex-employee
        date: 2024-05-12
        confidence: implied
        fact_type: subjective
"#;
        let saved = repo.save("Acme", Repository::parse_partial::<InsiderFact>(yaml)?)?;
        let loaded = repo.load::<InsiderFact>("Acme")?;
        assert_eq!(loaded, saved);

        let facts = &loaded.categories.technical_culture.facts_found;
        assert_eq!(facts[0].context.as_deref(), Some("Coffee chat"));
        assert_eq!(facts[0].fact_type, InsiderFactType::Objective);
        assert_eq!(facts[1].context, None);

        repo.write("Acme", loaded.clone())?;
        assert_eq!(repo.load::<InsiderFact>("Acme")?, loaded);
        Ok(())
    }

    #[test]
    fn test_load_corrects_stale_summary() -> anyhow::Result<()> {
        let (_dir, repo) = open();
        let mut record: CompanyRecord<Fact> = CompanyRecord::new("Acme", date(2024, 1, 1));
        record.push(CategoryName::FinancialHealth, fact("a"));
        record.summary.total_facts_found = 7;

        let path = repo.record_path("Acme", RecordKind::Facts)?;
        write_document(&path, &record)?;

        assert_eq!(repo.load::<Fact>("Acme")?.summary.total_facts_found, 1);
        Ok(())
    }

    #[test]
    fn test_companies_lists_by_kind() -> anyhow::Result<()> {
        let (_dir, repo) = open();
        repo.save(
            "Beta Labs",
            PartialRecord::new().with_fact(CategoryName::FinancialHealth, fact("a")),
        )?;
        repo.save(
            "Acme",
            PartialRecord::new().with_fact(CategoryName::FinancialHealth, fact("a")),
        )?;

        assert_eq!(repo.companies(RecordKind::Facts)?, vec!["acme", "beta-labs"]);
        assert!(repo.companies(RecordKind::InsiderFacts)?.is_empty());
        Ok(())
    }
}
