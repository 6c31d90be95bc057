//! dbtlens Core
//!
//! Core domain model with stable, versioned types.
//! Never rename finding codes - they are part of the public API.

pub mod config;
pub mod model;
pub mod report;

pub use config::{Config, ConfigError, RuleConfig};
pub use model::{Finding, FindingCode, MaterializationType, Model, Recommendation, Severity};
pub use report::{Report, ReportMetadata, ReportSummary, ReportVersion, SeverityCounts};
