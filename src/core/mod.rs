//! Core module - Business logic
//!
//! Record model, YAML repository, duplicate detection and resolution, flags.

pub mod error;
pub mod flags;
pub mod record;
pub mod report;
pub mod repository;
pub mod resolver;
pub mod similarity;
