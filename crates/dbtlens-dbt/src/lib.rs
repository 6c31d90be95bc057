//! dbt artifact parsing and DAG construction
//!
//! This crate handles:
//! - Parsing manifest.json (dbt-generated artifacts)
//! - Parsing run_results.json (per-run telemetry)
//! - Building the project dependency graph (DAG)
//! - Merging telemetry onto graph models
//! - Loading a project end to end

pub mod dag;
pub mod manifest;
pub mod project;
pub mod run_results;

pub use dag::ProjectDag;
pub use manifest::{DependsOn, Manifest, ManifestError, ManifestNode, NodeConfig};
pub use project::{DbtProject, ProjectError};
pub use run_results::{merge_run_results, AdapterResponse, RunResult, RunResults, RunResultsError};
