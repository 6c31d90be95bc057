//! dbt run_results.json parsing and telemetry merge
//!
//! Overlays per-run performance numbers onto graph models by unique_id.
//! Records for ids not present in the graph are skipped without error,
//! and models never touched by a record keep absent telemetry - absence
//! must stay distinguishable from a true zero.

use crate::dag::ProjectDag;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// dbt run_results.json structure (subset of fields we care about)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResults {
    /// Per-node run records
    #[serde(default)]
    pub results: Vec<RunResult>,
}

impl RunResults {
    /// Load run results from file
    pub fn from_file(path: &Path) -> Result<Self, RunResultsError> {
        if !path.exists() {
            return Err(RunResultsError::NotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| RunResultsError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_str(&contents)
    }

    /// Parse run results from JSON string
    pub fn from_str(json: &str) -> Result<Self, RunResultsError> {
        serde_json::from_str(json).map_err(|e| RunResultsError::ParseError(e.to_string()))
    }
}

/// One node's run record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Identity of the node this record belongs to
    #[serde(default)]
    pub unique_id: Option<String>,

    /// Run status (e.g., "success", "error")
    #[serde(default)]
    pub status: Option<String>,

    /// Execution time in seconds
    #[serde(default)]
    pub execution_time: Option<f64>,

    /// Adapter-specific response payload
    #[serde(default)]
    pub adapter_response: AdapterResponse,
}

/// Adapter-specific sub-structure carrying the row count
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdapterResponse {
    /// Rows affected by the run
    #[serde(default)]
    pub rows_affected: Option<u64>,
}

/// Merge run telemetry into the graph's models.
///
/// For each record whose unique_id matches a model, the model's
/// execution_time, status, and rows_affected are overwritten. Unknown
/// ids (tests, snapshots, stale records) are skipped.
pub fn merge_run_results(dag: &mut ProjectDag, run_results: &RunResults) {
    for result in &run_results.results {
        let Some(unique_id) = &result.unique_id else {
            continue;
        };

        let Some(model) = dag.get_mut(unique_id) else {
            continue;
        };

        model.execution_time = result.execution_time;
        model.status = result.status.clone();
        model.rows_affected = result.adapter_response.rows_affected;
    }
}

/// Run results parsing errors
#[derive(Debug, thiserror::Error)]
pub enum RunResultsError {
    #[error("Run results not found at {0}")]
    NotFound(String),

    #[error("Failed to read run results file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse run results JSON: {0}")]
    ParseError(String),
}
