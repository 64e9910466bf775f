//! Similarity - near-duplicate detection within a company
//!
//! Fact texts are compared with a token-sort ratio: both texts are
//! lowercased, stripped to alphanumeric tokens, the tokens sorted and
//! re-joined, and the results scored by indel distance (insertions and
//! deletions only) on a 0-100 scale.
//!
//! # Key Points
//! - Only `text` is compared; source, date and confidence are ignored here
//! - Every pair within one company is scored, across categories too
//! - Companies are never compared with each other
//! - O(n^2) pairs, fine for the tens to low hundreds of facts per company

use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::error::{Error, Result};
use super::record::{CompanyRecord, FactLocation, ResearchFact};
use super::repository::Repository;

/// Lower bound of the "clear duplicate" band
pub const CLEAR_DUPLICATE: f64 = 90.0;

/// Lower bound of the "likely duplicate" band
pub const LIKELY_DUPLICATE: f64 = 85.0;

/// Classification used by reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Clear,
    Likely,
    Below,
}

impl Band {
    pub fn classify(score: f64) -> Self {
        if score >= CLEAR_DUPLICATE {
            Band::Clear
        } else if score >= LIKELY_DUPLICATE {
            Band::Likely
        } else {
            Band::Below
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Band::Clear => write!(f, "clear duplicate"),
            Band::Likely => write!(f, "likely duplicate"),
            Band::Below => write!(f, "distinct"),
        }
    }
}

/// Lowercase, keep alphanumeric tokens, sort them, join with single spaces
pub fn token_sort_key(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Indel ratio of two strings, 0-100
///
/// `100 * (1 - indel / (len_a + len_b))` where `indel = len_a + len_b - 2 * lcs`.
/// Two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let lcs = lcs_len(a, b);
    100.0 * (2 * lcs) as f64 / total as f64
}

/// Longest common subsequence length, single-row DP
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diag = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diag + 1
            } else {
                above.max(row[j])
            };
            diag = above;
        }
    }
    row[b.len()]
}

/// Token-order-tolerant similarity of two fact texts, 0-100
///
/// A text with no alphanumeric token scores 0 against anything except the
/// very same text.
pub fn similarity(a: &str, b: &str) -> f64 {
    let key_a: Vec<char> = token_sort_key(a).chars().collect();
    let key_b: Vec<char> = token_sort_key(b).chars().collect();
    keyed_score(a, &key_a, b, &key_b)
}

fn keyed_score(raw_a: &str, key_a: &[char], raw_b: &str, key_b: &[char]) -> f64 {
    if key_a.is_empty() || key_b.is_empty() {
        return if raw_a.trim() == raw_b.trim() { 100.0 } else { 0.0 };
    }
    ratio_chars(key_a, key_b)
}

/// A pair of facts scoring at or above the threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Earlier fact in encounter order
    pub a: FactLocation,
    pub b: FactLocation,
    pub score: f64,
}

impl Candidate {
    pub fn band(&self) -> Band {
        Band::classify(self.score)
    }
}

/// Candidates found in one company's record
#[derive(Debug, Clone)]
pub struct CompanyScan<F> {
    pub company: String,
    pub record: CompanyRecord<F>,
    pub candidates: Vec<Candidate>,
}

pub fn check_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&threshold) {
        return Err(Error::Validation(format!(
            "Threshold must be between 0 and 100, got {}",
            threshold
        )));
    }
    Ok(())
}

/// Score every pair of facts in `record` and keep those `>= threshold`
///
/// Sorted by descending score, then encounter order.
pub fn find_candidates<F: ResearchFact>(
    record: &CompanyRecord<F>,
    threshold: f64,
) -> Vec<Candidate> {
    let keyed: Vec<(FactLocation, &str, Vec<char>)> = record
        .facts()
        .map(|(location, fact)| {
            (location, fact.text(), token_sort_key(fact.text()).chars().collect())
        })
        .collect();

    let mut candidates = Vec::new();
    for (i, (loc_a, raw_a, key_a)) in keyed.iter().enumerate() {
        for (loc_b, raw_b, key_b) in &keyed[i + 1..] {
            let score = keyed_score(raw_a, key_a, raw_b, key_b);
            if score >= threshold {
                candidates.push(Candidate {
                    a: *loc_a,
                    b: *loc_b,
                    score,
                });
            }
        }
    }

    candidates.sort_by(|x, y| {
        y.score
            .total_cmp(&x.score)
            .then_with(|| x.a.cmp(&y.a))
            .then_with(|| x.b.cmp(&y.b))
    });

    debug!(
        company = %record.company,
        facts = keyed.len(),
        candidates = candidates.len(),
        threshold,
        "Similarity scan finished"
    );

    candidates
}

/// Scan one company, or every company holding a record of fact type `F`
///
/// Each company is scanned on its own; facts are never compared across
/// companies.
pub fn scan<F: ResearchFact>(
    repo: &Repository,
    company: Option<&str>,
    threshold: f64,
) -> Result<Vec<CompanyScan<F>>> {
    check_threshold(threshold)?;

    let companies = match company {
        Some(name) => vec![name.to_string()],
        None => repo.companies(F::KIND)?,
    };

    companies
        .into_iter()
        .map(|name| {
            let record = repo.load::<F>(&name)?;
            let candidates = find_candidates(&record, threshold);
            Ok(CompanyScan {
                company: record.company.clone(),
                record,
                candidates,
            })
        })
        .collect()
}
