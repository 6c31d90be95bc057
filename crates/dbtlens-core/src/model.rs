//! Core data model: models, findings, recommendations
//!
//! IMPORTANT: Finding codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::hash::{Hash, Hasher};

/// dbt materialization types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterializationType {
    /// Full table rebuild on every run
    Table,

    /// Database view, no data materialized
    View,

    /// Only new or changed records are processed per run
    Incremental,

    /// Inlined into downstream models, never materialized
    Ephemeral,

    /// Type-2 style history capture
    Snapshot,

    /// CSV-loaded static data
    Seed,
}

impl MaterializationType {
    /// Parse a manifest `config.materialized` value.
    ///
    /// Unknown strings fall back to `View` - a malformed manifest must
    /// never abort analysis.
    pub fn parse(value: &str) -> Self {
        match value {
            "table" => Self::Table,
            "view" => Self::View,
            "incremental" => Self::Incremental,
            "ephemeral" => Self::Ephemeral,
            "snapshot" => Self::Snapshot,
            "seed" => Self::Seed,
            _ => Self::View,
        }
    }

    /// Get the materialization as its manifest string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::View => "view",
            Self::Incremental => "incremental",
            Self::Ephemeral => "ephemeral",
            Self::Snapshot => "snapshot",
            Self::Seed => "seed",
        }
    }
}

impl std::fmt::Display for MaterializationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Finding severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - should be reviewed but not blocking
    Warn,

    /// Error - critical issue that deserves immediate attention
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A dbt model node with metadata and optional run telemetry
///
/// Identity is the manifest `unique_id`; two models are equal iff their
/// `unique_id` matches, and hashing follows the same rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    /// Display name (not unique across packages)
    pub name: String,

    /// Stable identifier (e.g. "model.my_project.users")
    pub unique_id: String,

    /// Resource type from the manifest (always "model" after filtering)
    pub resource_type: String,

    /// Relative path to the SQL file
    pub path: String,

    /// Materialization strategy
    pub materialization: MaterializationType,

    /// Database name
    pub database: Option<String>,

    /// Schema name
    pub schema: Option<String>,

    /// Model tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Free-form meta mapping from the manifest
    #[serde(default)]
    pub meta: Map<String, Value>,

    /// Execution time in seconds, absent until run results are merged
    pub execution_time: Option<f64>,

    /// Rows affected by the last run, absent until run results are merged
    pub rows_affected: Option<u64>,

    /// Last run status, absent until run results are merged
    pub status: Option<String>,

    /// Direct upstream model ids, recomputed from the graph
    #[serde(default)]
    pub upstream_models: Vec<String>,

    /// Direct downstream model ids, recomputed from the graph
    #[serde(default)]
    pub downstream_models: Vec<String>,

    /// Compiled SQL from the manifest, if present
    pub compiled_sql: Option<String>,

    /// Raw SQL from the manifest, if present
    pub raw_sql: Option<String>,
}

impl Model {
    /// Create a model with the given identity and materialization.
    ///
    /// All optional metadata and telemetry start absent.
    pub fn new(
        name: impl Into<String>,
        unique_id: impl Into<String>,
        materialization: MaterializationType,
    ) -> Self {
        Self {
            name: name.into(),
            unique_id: unique_id.into(),
            resource_type: "model".to_string(),
            path: String::new(),
            materialization,
            database: None,
            schema: None,
            tags: Vec::new(),
            meta: Map::new(),
            execution_time: None,
            rows_affected: None,
            status: None,
            upstream_models: Vec::new(),
            downstream_models: Vec::new(),
            compiled_sql: None,
            raw_sql: None,
        }
    }

    /// Whether any run telemetry has been merged onto this model
    pub fn has_telemetry(&self) -> bool {
        self.execution_time.is_some() || self.rows_affected.is_some()
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.unique_id == other.unique_id
    }
}

impl Eq for Model {}

impl Hash for Model {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.unique_id.hash(state);
    }
}

/// Finding code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    /// Slow or large model that is not materialized incrementally
    HeavyNonIncrementalModel,

    /// Model with no downstream dependents
    DeadModel,

    /// Model whose transitive upstream set exceeds the configured depth
    DeepDepChain,

    /// Slow model with many direct dependents
    FanOutHeavyModel,
}

impl FindingCode {
    /// Get the finding code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HeavyNonIncrementalModel => "HEAVY_NON_INCREMENTAL_MODEL",
            Self::DeadModel => "DEAD_MODEL",
            Self::DeepDepChain => "DEEP_DEP_CHAIN",
            Self::FanOutHeavyModel => "FAN_OUT_HEAVY_MODEL",
        }
    }
}

impl std::fmt::Display for FindingCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single detected issue, produced by one rule for one model
///
/// Findings are immutable once created and carry no reference back to the
/// graph they were derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Which rule produced this finding
    pub code: FindingCode,

    /// Severity level
    pub severity: Severity,

    /// Display name of the affected model
    pub model_name: String,

    /// Short headline
    pub title: String,

    /// What was detected
    pub description: String,

    /// Why it matters
    pub rationale: String,

    /// What to do about it
    pub suggested_action: String,

    /// Structured patch hint, if the rule can propose one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposed_changes: Option<Value>,

    /// Rule-specific numeric/string facts, used later for sorting
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// An aggregated, prioritized action item grouping same-rule findings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Stable recommendation identifier
    pub id: String,

    /// Short headline
    pub title: String,

    /// Detailed description, may embed a top-N model list
    pub description: String,

    /// Severity of consequence, free text
    pub impact: String,

    /// Cost of fix, free text
    pub effort: String,

    /// Member findings, ordered by rule-specific priority
    #[serde(default)]
    pub findings: Vec<Finding>,

    /// Example snippets for the worst offenders, may be empty
    #[serde(default)]
    pub code_snippets: Vec<String>,

    /// Fixed per rule type; higher = more urgent
    pub priority: u32,
}
