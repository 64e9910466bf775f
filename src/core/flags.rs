//! Flags - green/red signals and the go/no-go decision
//!
//! Flags are grouped by the five mountain elements and by severity. They are
//! append-only: the evaluation is expected to accumulate distinct
//! observations, so nothing here deduplicates. The decision is a single slot
//! that each `set_decision` overwrites.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{Error, Result};
use super::record::RecordKind;
use super::repository::{read_document, write_document, Repository};

/// Evaluation dimension for flags (distinct from research categories)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountainElement {
    MountainRangeTerrain,
    ChosenPeakAlignment,
    RopeTeamConfidence,
    DailyClimbingExperience,
    StoryCoherence,
}

impl MountainElement {
    pub const ALL: [MountainElement; 5] = [
        MountainElement::MountainRangeTerrain,
        MountainElement::ChosenPeakAlignment,
        MountainElement::RopeTeamConfidence,
        MountainElement::DailyClimbingExperience,
        MountainElement::StoryCoherence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MountainElement::MountainRangeTerrain => "mountain_range_terrain",
            MountainElement::ChosenPeakAlignment => "chosen_peak_alignment",
            MountainElement::RopeTeamConfidence => "rope_team_confidence",
            MountainElement::DailyClimbingExperience => "daily_climbing_experience",
            MountainElement::StoryCoherence => "story_coherence",
        }
    }
}

impl fmt::Display for MountainElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MountainElement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MountainElement::ALL
            .into_iter()
            .find(|e| e.as_str() == s.trim())
            .ok_or_else(|| Error::Validation(format!("Unknown mountain element: {}", s)))
    }
}

/// Green or red
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Green,
    Red,
}

/// Flag severity; each belongs to exactly one polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Green: must-have match
    Critical,
    /// Green: clear positive
    Strong,
    /// Red: walk away
    Dealbreaker,
    /// Red: worth probing
    Concerning,
}

impl Severity {
    pub fn polarity(&self) -> Polarity {
        match self {
            Severity::Critical | Severity::Strong => Polarity::Green,
            Severity::Dealbreaker | Severity::Concerning => Polarity::Red,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Strong => write!(f, "strong"),
            Severity::Dealbreaker => write!(f, "dealbreaker"),
            Severity::Concerning => write!(f, "concerning"),
        }
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "strong" => Ok(Severity::Strong),
            "dealbreaker" => Ok(Severity::Dealbreaker),
            "concerning" => Ok(Severity::Concerning),
            _ => Err(Error::Validation(format!("Unknown severity: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Yes,
    No,
    Maybe,
}

impl FromStr for Outcome {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "YES" => Ok(Outcome::Yes),
            "NO" => Ok(Outcome::No),
            "MAYBE" => Ok(Outcome::Maybe),
            _ => Err(Error::Validation(format!("Unknown outcome: {}", s))),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Yes => write!(f, "YES"),
            Outcome::No => write!(f, "NO"),
            Outcome::Maybe => write!(f, "MAYBE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DecisionConfidence {
    High,
    Medium,
    Low,
}

impl FromStr for DecisionConfidence {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "HIGH" => Ok(DecisionConfidence::High),
            "MEDIUM" => Ok(DecisionConfidence::Medium),
            "LOW" => Ok(DecisionConfidence::Low),
            _ => Err(Error::Validation(format!("Unknown decision confidence: {}", s))),
        }
    }
}

impl fmt::Display for DecisionConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionConfidence::High => write!(f, "HIGH"),
            DecisionConfidence::Medium => write!(f, "MEDIUM"),
            DecisionConfidence::Low => write!(f, "LOW"),
        }
    }
}

/// The go/no-go call for a company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub outcome: Outcome,
    pub confidence: DecisionConfidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// A single observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagEntry {
    pub flag: String,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub confidence: String,
}

impl FlagEntry {
    pub fn new(flag: impl Into<String>) -> Self {
        Self {
            flag: flag.into(),
            impact: String::new(),
            confidence: String::new(),
        }
    }

    pub fn with_impact(mut self, impact: impl Into<String>) -> Self {
        self.impact = impact.into();
        self
    }

    pub fn with_confidence(mut self, confidence: impl Into<String>) -> Self {
        self.confidence = confidence.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GreenFlags {
    #[serde(default)]
    pub critical: Vec<FlagEntry>,
    #[serde(default)]
    pub strong: Vec<FlagEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RedFlags {
    #[serde(default)]
    pub dealbreaker: Vec<FlagEntry>,
    #[serde(default)]
    pub concerning: Vec<FlagEntry>,
}

/// One value per mountain element
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerElement<T> {
    #[serde(default)]
    pub mountain_range_terrain: T,
    #[serde(default)]
    pub chosen_peak_alignment: T,
    #[serde(default)]
    pub rope_team_confidence: T,
    #[serde(default)]
    pub daily_climbing_experience: T,
    #[serde(default)]
    pub story_coherence: T,
}

impl<T> PerElement<T> {
    pub fn get(&self, element: MountainElement) -> &T {
        match element {
            MountainElement::MountainRangeTerrain => &self.mountain_range_terrain,
            MountainElement::ChosenPeakAlignment => &self.chosen_peak_alignment,
            MountainElement::RopeTeamConfidence => &self.rope_team_confidence,
            MountainElement::DailyClimbingExperience => &self.daily_climbing_experience,
            MountainElement::StoryCoherence => &self.story_coherence,
        }
    }

    pub fn get_mut(&mut self, element: MountainElement) -> &mut T {
        match element {
            MountainElement::MountainRangeTerrain => &mut self.mountain_range_terrain,
            MountainElement::ChosenPeakAlignment => &mut self.chosen_peak_alignment,
            MountainElement::RopeTeamConfidence => &mut self.rope_team_confidence,
            MountainElement::DailyClimbingExperience => &mut self.daily_climbing_experience,
            MountainElement::StoryCoherence => &mut self.story_coherence,
        }
    }
}

/// Flags, missing data and decision for one company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSet {
    pub company: String,
    pub evaluation_date: NaiveDate,
    #[serde(default)]
    pub green_flags: PerElement<GreenFlags>,
    #[serde(default)]
    pub red_flags: PerElement<RedFlags>,
    #[serde(default)]
    pub missing_critical_data: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
}

impl FlagSet {
    pub fn new(company: impl Into<String>, evaluation_date: NaiveDate) -> Self {
        Self {
            company: company.into(),
            evaluation_date,
            green_flags: PerElement::default(),
            red_flags: PerElement::default(),
            missing_critical_data: Vec::new(),
            decision: None,
        }
    }

    /// The list a flag of this element and severity goes into
    pub fn slot(&self, element: MountainElement, severity: Severity) -> &[FlagEntry] {
        match severity {
            Severity::Critical => &self.green_flags.get(element).critical,
            Severity::Strong => &self.green_flags.get(element).strong,
            Severity::Dealbreaker => &self.red_flags.get(element).dealbreaker,
            Severity::Concerning => &self.red_flags.get(element).concerning,
        }
    }

    fn slot_mut(&mut self, element: MountainElement, severity: Severity) -> &mut Vec<FlagEntry> {
        match severity {
            Severity::Critical => &mut self.green_flags.get_mut(element).critical,
            Severity::Strong => &mut self.green_flags.get_mut(element).strong,
            Severity::Dealbreaker => &mut self.red_flags.get_mut(element).dealbreaker,
            Severity::Concerning => &mut self.red_flags.get_mut(element).concerning,
        }
    }

    pub fn count(&self, polarity: Polarity) -> usize {
        MountainElement::ALL
            .iter()
            .map(|&element| match polarity {
                Polarity::Green => {
                    let g = self.green_flags.get(element);
                    g.critical.len() + g.strong.len()
                }
                Polarity::Red => {
                    let r = self.red_flags.get(element);
                    r.dealbreaker.len() + r.concerning.len()
                }
            })
            .sum()
    }
}

/// Flag persistence on top of a repository's data directory
pub struct FlagStore<'a> {
    repo: &'a Repository,
}

impl<'a> FlagStore<'a> {
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    pub fn load(&self, company: &str) -> Result<FlagSet> {
        let path = self.repo.record_path(company, RecordKind::Flags)?;
        if !path.exists() {
            return Err(Error::not_found(RecordKind::Flags.to_string(), company));
        }
        read_document(&path)
    }

    fn load_or_new(&self, company: &str) -> Result<FlagSet> {
        match self.load(company) {
            Err(e) if e.is_not_found() => Ok(FlagSet::new(company, Local::now().date_naive())),
            other => other,
        }
    }

    fn store(&self, company: &str, flags: &FlagSet) -> Result<()> {
        let path = self.repo.record_path(company, RecordKind::Flags)?;
        write_document(&path, flags)
    }

    /// Append a flag; existing flags are never merged or replaced
    pub fn add_flag(
        &self,
        company: &str,
        severity: Severity,
        element: MountainElement,
        entry: FlagEntry,
    ) -> Result<FlagSet> {
        if entry.flag.trim().is_empty() {
            return Err(Error::Validation("Flag text cannot be empty".to_string()));
        }

        let mut flags = self.load_or_new(company)?;
        flags.slot_mut(element, severity).push(entry);
        self.store(company, &flags)?;

        info!(company, %element, %severity, "Flag added");
        Ok(flags)
    }

    /// Set the decision, replacing any earlier one
    pub fn set_decision(
        &self,
        company: &str,
        outcome: Outcome,
        confidence: DecisionConfidence,
        reasoning: Option<String>,
    ) -> Result<FlagSet> {
        let mut flags = self.load_or_new(company)?;
        if let Some(previous) = &flags.decision {
            info!(company, previous = %previous.outcome, new = %outcome, "Replacing decision");
        }
        flags.decision = Some(Decision {
            outcome,
            confidence,
            reasoning: reasoning.filter(|r| !r.trim().is_empty()),
        });
        self.store(company, &flags)?;
        Ok(flags)
    }

    /// Note a piece of data the decision is still waiting on
    pub fn add_missing_data(&self, company: &str, item: &str) -> Result<FlagSet> {
        let item = item.trim();
        if item.is_empty() {
            return Err(Error::Validation("Missing data item cannot be empty".to_string()));
        }

        let mut flags = self.load_or_new(company)?;
        if !flags.missing_critical_data.iter().any(|m| m == item) {
            flags.missing_critical_data.push(item.to_string());
            self.store(company, &flags)?;
        }
        Ok(flags)
    }
}
