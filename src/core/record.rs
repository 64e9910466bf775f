//! Record model - typed company research records
//!
//! A company has one record per kind: public research facts and insider
//! interview facts. Both share the same shape: four fixed categories, each
//! holding an ordered list of facts plus the information still missing.
//!
//! # Key Properties
//! - **Fixed categories**: exactly four, enforced by the struct layout and
//!   `deny_unknown_fields` on parse
//! - **Closed enums**: confidence, insider fact type and completeness are
//!   rejected at parse time when unknown
//! - **Count invariant**: `summary.total_facts_found` is recomputed on every
//!   write, never trusted from input

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

/// How a fact was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Stated outright by the source
    ExplicitStatement,
    /// Inferred from the source
    Implied,
    /// Reported by someone who saw it
    FirsthandAccount,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::ExplicitStatement => write!(f, "explicit_statement"),
            Confidence::Implied => write!(f, "implied"),
            Confidence::FirsthandAccount => write!(f, "firsthand_account"),
        }
    }
}

/// Whether an insider statement is verifiable or an opinion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsiderFactType {
    Objective,
    Subjective,
}

impl fmt::Display for InsiderFactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsiderFactType::Objective => write!(f, "objective"),
            InsiderFactType::Subjective => write!(f, "subjective"),
        }
    }
}

/// Overall coverage of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Completeness {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for Completeness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completeness::Low => write!(f, "low"),
            Completeness::Medium => write!(f, "medium"),
            Completeness::High => write!(f, "high"),
        }
    }
}

/// One of the four research categories
///
/// Declaration order is the encounter order used when scanning a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryName {
    FinancialHealth,
    MarketPosition,
    OrganizationalStability,
    TechnicalCulture,
}

impl CategoryName {
    pub const ALL: [CategoryName; 4] = [
        CategoryName::FinancialHealth,
        CategoryName::MarketPosition,
        CategoryName::OrganizationalStability,
        CategoryName::TechnicalCulture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryName::FinancialHealth => "financial_health",
            CategoryName::MarketPosition => "market_position",
            CategoryName::OrganizationalStability => "organizational_stability",
            CategoryName::TechnicalCulture => "technical_culture",
        }
    }
}

impl fmt::Display for CategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CategoryName::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| Error::Validation(format!("Unknown category: {}", s)))
    }
}

/// Which persisted document a record type lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Facts,
    InsiderFacts,
    Flags,
}

impl RecordKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            RecordKind::Facts => "facts.yaml",
            RecordKind::InsiderFacts => "insider_facts.yaml",
            RecordKind::Flags => "flags.yaml",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Facts => write!(f, "facts"),
            RecordKind::InsiderFacts => write!(f, "insider facts"),
            RecordKind::Flags => write!(f, "flags"),
        }
    }
}

/// Common view over public and insider facts
///
/// The similarity engine and resolver only ever see facts through this trait.
pub trait ResearchFact: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned {
    /// Document this fact type is persisted in
    const KIND: RecordKind;

    fn text(&self) -> &str;
    fn source(&self) -> &str;
    fn date(&self) -> NaiveDate;
    fn confidence(&self) -> Confidence;

    /// Number of `;`-separated, non-blank sources
    fn source_count(&self) -> usize {
        self.source()
            .split(';')
            .filter(|s| !s.trim().is_empty())
            .count()
    }

    /// Kind-specific fields beyond the common four, for display
    fn extra_fields(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn validate(&self) -> Result<()> {
        if self.text().trim().is_empty() {
            return Err(Error::Validation("Fact text cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// A sourced, dated statement from public research
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub text: String,
    #[serde(default)]
    pub source: String,
    pub date: NaiveDate,
    pub confidence: Confidence,
}

impl Fact {
    pub fn new(
        text: impl Into<String>,
        source: impl Into<String>,
        date: NaiveDate,
        confidence: Confidence,
    ) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            date,
            confidence,
        }
    }
}

impl ResearchFact for Fact {
    const KIND: RecordKind = RecordKind::Facts;

    fn text(&self) -> &str {
        &self.text
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn confidence(&self) -> Confidence {
        self.confidence
    }
}

/// A fact gathered from an insider conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsiderFact {
    pub text: String,
    #[serde(default)]
    pub source: String,
    pub date: NaiveDate,
    pub confidence: Confidence,
    pub fact_type: InsiderFactType,
    /// Free-text setting of the conversation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl InsiderFact {
    pub fn new(fact: Fact, fact_type: InsiderFactType) -> Self {
        Self {
            text: fact.text,
            source: fact.source,
            date: fact.date,
            confidence: fact.confidence,
            fact_type,
            context: None,
        }
    }
}

impl ResearchFact for InsiderFact {
    const KIND: RecordKind = RecordKind::InsiderFacts;

    fn text(&self) -> &str {
        &self.text
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn confidence(&self) -> Confidence {
        self.confidence
    }

    fn extra_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("fact_type", self.fact_type.to_string())];
        if let Some(context) = &self.context {
            fields.push(("context", context.clone()));
        }
        fields
    }
}

/// Position of a fact inside a record
///
/// Ordering is encounter order: category order first, then list index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactLocation {
    pub category: CategoryName,
    pub index: usize,
}

impl FactLocation {
    pub fn new(category: CategoryName, index: usize) -> Self {
        Self { category, index }
    }
}

impl fmt::Display for FactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.category, self.index)
    }
}

/// Facts and open questions for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category<F> {
    #[serde(default = "Vec::new")]
    pub facts_found: Vec<F>,
    #[serde(default)]
    pub missing_information: Vec<String>,
}

impl<F> Default for Category<F> {
    fn default() -> Self {
        Self {
            facts_found: Vec::new(),
            missing_information: Vec::new(),
        }
    }
}

impl<F> Category<F> {
    pub fn is_empty(&self) -> bool {
        self.facts_found.is_empty() && self.missing_information.is_empty()
    }
}

/// The four fixed categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Categories<F> {
    #[serde(default = "Category::default")]
    pub financial_health: Category<F>,
    #[serde(default = "Category::default")]
    pub market_position: Category<F>,
    #[serde(default = "Category::default")]
    pub organizational_stability: Category<F>,
    #[serde(default = "Category::default")]
    pub technical_culture: Category<F>,
}

impl<F> Default for Categories<F> {
    fn default() -> Self {
        Self {
            financial_health: Category::default(),
            market_position: Category::default(),
            organizational_stability: Category::default(),
            technical_culture: Category::default(),
        }
    }
}

impl<F> Categories<F> {
    pub fn get(&self, name: CategoryName) -> &Category<F> {
        match name {
            CategoryName::FinancialHealth => &self.financial_health,
            CategoryName::MarketPosition => &self.market_position,
            CategoryName::OrganizationalStability => &self.organizational_stability,
            CategoryName::TechnicalCulture => &self.technical_culture,
        }
    }

    pub fn get_mut(&mut self, name: CategoryName) -> &mut Category<F> {
        match name {
            CategoryName::FinancialHealth => &mut self.financial_health,
            CategoryName::MarketPosition => &mut self.market_position,
            CategoryName::OrganizationalStability => &mut self.organizational_stability,
            CategoryName::TechnicalCulture => &mut self.technical_culture,
        }
    }

    /// Categories in encounter order
    pub fn iter(&self) -> impl Iterator<Item = (CategoryName, &Category<F>)> {
        CategoryName::ALL.into_iter().map(move |name| (name, self.get(name)))
    }

    pub fn total_facts(&self) -> usize {
        self.iter().map(|(_, c)| c.facts_found.len()).sum()
    }
}

/// Record-level counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Summary {
    pub total_facts_found: usize,
    #[serde(default)]
    pub information_completeness: Completeness,
}

/// A company's accumulated research of one kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord<F> {
    pub company: String,
    pub record_date: NaiveDate,
    pub categories: Categories<F>,
    pub summary: Summary,
}

impl<F: ResearchFact> CompanyRecord<F> {
    pub fn new(company: impl Into<String>, record_date: NaiveDate) -> Self {
        Self {
            company: company.into(),
            record_date,
            categories: Categories::default(),
            summary: Summary::default(),
        }
    }

    /// Append a fact to a category
    pub fn push(&mut self, category: CategoryName, fact: F) {
        self.categories.get_mut(category).facts_found.push(fact);
        self.refresh_summary();
    }

    pub fn total_facts(&self) -> usize {
        self.categories.total_facts()
    }

    /// Re-derive `total_facts_found` from the category lists
    pub fn refresh_summary(&mut self) {
        self.summary.total_facts_found = self.categories.total_facts();
    }

    pub fn fact_at(&self, location: FactLocation) -> Option<&F> {
        self.categories
            .get(location.category)
            .facts_found
            .get(location.index)
    }

    /// Every fact with its location, in encounter order
    pub fn facts(&self) -> impl Iterator<Item = (FactLocation, &F)> {
        self.categories.iter().flat_map(|(name, category)| {
            category
                .facts_found
                .iter()
                .enumerate()
                .map(move |(index, fact)| (FactLocation::new(name, index), fact))
        })
    }

    /// Drop the facts at the given locations; returns how many were removed
    pub fn remove_facts(&mut self, locations: &[FactLocation]) -> usize {
        let mut sorted = locations.to_vec();
        sorted.sort();
        sorted.dedup();

        let mut removed = 0;
        // Highest index first so earlier indices stay valid
        for location in sorted.into_iter().rev() {
            let list = &mut self.categories.get_mut(location.category).facts_found;
            if location.index < list.len() {
                list.remove(location.index);
                removed += 1;
            }
        }
        self.refresh_summary();
        removed
    }

    pub fn validate(&self) -> Result<()> {
        if self.company.trim().is_empty() {
            return Err(Error::Validation("Company name cannot be empty".to_string()));
        }
        for (location, fact) in self.facts() {
            fact.validate().map_err(|e| at_location(e, location))?;
        }
        Ok(())
    }
}

/// Summary fields as they may appear in incoming research
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PartialSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_facts_found: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub information_completeness: Option<Completeness>,
}

/// New research to be merged into a company's record
///
/// Every field is optional; a full `CompanyRecord` document also parses as a
/// partial record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialRecord<F> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_date: Option<NaiveDate>,
    #[serde(default = "Categories::default")]
    pub categories: Categories<F>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<PartialSummary>,
}

impl<F> Default for PartialRecord<F> {
    fn default() -> Self {
        Self {
            company: None,
            record_date: None,
            categories: Categories::default(),
            summary: None,
        }
    }
}

impl<F: ResearchFact> PartialRecord<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.record_date = Some(date);
        self
    }

    pub fn with_completeness(mut self, completeness: Completeness) -> Self {
        self.summary
            .get_or_insert_with(PartialSummary::default)
            .information_completeness = Some(completeness);
        self
    }

    pub fn with_fact(mut self, category: CategoryName, fact: F) -> Self {
        self.categories.get_mut(category).facts_found.push(fact);
        self
    }

    pub fn with_missing(mut self, category: CategoryName, item: impl Into<String>) -> Self {
        self.categories
            .get_mut(category)
            .missing_information
            .push(item.into());
        self
    }

    pub fn completeness(&self) -> Option<Completeness> {
        self.summary.as_ref().and_then(|s| s.information_completeness)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, category) in self.categories.iter() {
            for (index, fact) in category.facts_found.iter().enumerate() {
                fact.validate()
                    .map_err(|e| at_location(e, FactLocation::new(name, index)))?;
            }
        }
        Ok(())
    }

    /// Turn into a complete record for a company seen for the first time
    pub fn into_record(self, company: impl Into<String>, today: NaiveDate) -> CompanyRecord<F> {
        let completeness = self.completeness().unwrap_or_default();
        let mut categories = self.categories;
        for name in CategoryName::ALL {
            dedup_preserving_order(&mut categories.get_mut(name).missing_information);
        }

        let mut record = CompanyRecord {
            company: company.into(),
            record_date: self.record_date.unwrap_or(today),
            categories,
            summary: Summary {
                total_facts_found: 0,
                information_completeness: completeness,
            },
        };
        record.refresh_summary();
        record
    }
}

fn at_location(err: Error, location: FactLocation) -> Error {
    match err {
        Error::Validation(msg) => Error::Validation(format!("{} ({})", msg, location)),
        other => other,
    }
}

/// Remove exact-text repeats, keeping the first occurrence
pub(crate) fn dedup_preserving_order(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_category_name_roundtrip() {
        for name in CategoryName::ALL {
            assert_eq!(name.as_str().parse::<CategoryName>().unwrap(), name);
        }
        assert!("culture".parse::<CategoryName>().is_err());
    }

    #[test]
    fn test_source_count() {
        let fact = Fact::new("x", "Crunchbase; TechCrunch;  ; Blog", date(2024, 1, 1), Confidence::Implied);
        assert_eq!(fact.source_count(), 3);

        let empty = Fact::new("x", "", date(2024, 1, 1), Confidence::Implied);
        assert_eq!(empty.source_count(), 0);
    }

    #[test]
    fn test_empty_text_rejected() {
        let fact = Fact::new("   ", "src", date(2024, 1, 1), Confidence::Implied);
        assert!(matches!(fact.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_unknown_category_rejected_at_parse() {
        let yaml = r#"
categories:
  financial_health:
    facts_found: []
  hiring_vibes:
    facts_found: []
"#;
        let parsed: std::result::Result<PartialRecord<Fact>, _> = serde_yaml::from_str(yaml);
        let err = parsed.unwrap_err().to_string();
        assert!(err.contains("hiring_vibes"));
    }

    #[test]
    fn test_invalid_confidence_rejected_at_parse() {
        let yaml = r#"
text: Profitable since 2021
source: Annual report
date: 2024-02-01
confidence: gut_feeling
"#;
        assert!(serde_yaml::from_str::<Fact>(yaml).is_err());
    }

    #[test]
    fn test_insider_fact_parse() {
        let yaml = r#"
text: On-call rotation is weekly
source: Engineer interview
date: 2024-05-10
confidence: firsthand_account
fact_type: objective
context: Coffee chat
"#;
        let fact: InsiderFact = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(fact.fact_type, InsiderFactType::Objective);
        assert_eq!(fact.context.as_deref(), Some("Coffee chat"));
    }

    #[test]
    fn test_remove_facts_updates_summary() {
        let mut record: CompanyRecord<Fact> = CompanyRecord::new("Acme", date(2024, 1, 1));
        for text in ["a", "b", "c"] {
            record.push(
                CategoryName::MarketPosition,
                Fact::new(text, "s", date(2024, 1, 1), Confidence::Implied),
            );
        }
        assert_eq!(record.summary.total_facts_found, 3);

        let removed = record.remove_facts(&[
            FactLocation::new(CategoryName::MarketPosition, 0),
            FactLocation::new(CategoryName::MarketPosition, 2),
        ]);
        assert_eq!(removed, 2);
        assert_eq!(record.summary.total_facts_found, 1);
        assert_eq!(record.categories.market_position.facts_found[0].text, "b");
    }

    #[test]
    fn test_facts_encounter_order() {
        let mut record: CompanyRecord<Fact> = CompanyRecord::new("Acme", date(2024, 1, 1));
        let f = |t: &str| Fact::new(t, "s", date(2024, 1, 1), Confidence::Implied);
        record.push(CategoryName::TechnicalCulture, f("tech"));
        record.push(CategoryName::FinancialHealth, f("money"));

        let order: Vec<_> = record.facts().map(|(_, fact)| fact.text.clone()).collect();
        assert_eq!(order, vec!["money", "tech"]);
    }

    #[test]
    fn test_into_record_dedups_missing_information() {
        let partial: PartialRecord<Fact> = PartialRecord::new()
            .with_missing(CategoryName::FinancialHealth, "Runway")
            .with_missing(CategoryName::FinancialHealth, "Runway")
            .with_completeness(Completeness::Medium);

        let record = partial.into_record("Acme", date(2024, 6, 1));
        assert_eq!(
            record.categories.financial_health.missing_information,
            vec!["Runway".to_string()]
        );
        assert_eq!(record.record_date, date(2024, 6, 1));
        assert_eq!(record.summary.information_completeness, Completeness::Medium);
    }
}
