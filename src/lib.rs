//! scout - employer research knowledge base
//!
//! Accumulates sourced facts about prospective employers, from public
//! research and insider conversations, plus green/red flags and a decision.
//!
//! ## Key Concepts
//!
//! - **Merge-on-save**: new research is appended to a company's record,
//!   never deduplicated on the way in
//! - **Maintenance pass**: near-duplicate facts are found by fuzzy text
//!   similarity and collapsed, guarded against differing figures and years
//! - **Explicit context**: every operation takes a `Repository` handle on a
//!   data directory; there is no global store

pub mod cli;
pub mod config;
pub mod core;

pub use core::error::{Error, Result};
pub use core::flags::{FlagSet, FlagStore};
pub use core::record::{CompanyRecord, Fact, InsiderFact, PartialRecord};
pub use core::repository::Repository;
