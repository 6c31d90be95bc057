//! Project loading: manifest -> graph -> telemetry merge

use crate::dag::ProjectDag;
use crate::manifest::{Manifest, ManifestError};
use crate::run_results::{merge_run_results, RunResults, RunResultsError};
use dbtlens_core::Model;
use std::path::{Path, PathBuf};

/// A loaded dbt project: resolved artifact paths plus the built graph
#[derive(Debug, Clone)]
pub struct DbtProject {
    /// dbt project directory
    pub project_path: PathBuf,

    /// Resolved manifest.json location
    pub manifest_path: PathBuf,

    /// Resolved run_results.json location, if telemetry was requested
    pub run_results_path: Option<PathBuf>,

    dag: ProjectDag,
}

impl DbtProject {
    /// Load a project: parse the manifest, build the graph, and merge
    /// run telemetry when available.
    ///
    /// The manifest defaults to `<project>/manifest.json` and is the one
    /// required input; a missing manifest is a fatal `NotFound` error. A
    /// missing optional run-results file means no enrichment, not an
    /// error.
    pub fn load(
        project_path: &Path,
        manifest_path: Option<PathBuf>,
        run_results_path: Option<PathBuf>,
    ) -> Result<Self, ProjectError> {
        let manifest_path = manifest_path.unwrap_or_else(|| project_path.join("manifest.json"));

        let manifest = Manifest::from_file(&manifest_path)?;
        let mut dag = ProjectDag::from_manifest(&manifest);

        if let Some(path) = &run_results_path {
            if path.exists() {
                let run_results = RunResults::from_file(path)?;
                merge_run_results(&mut dag, &run_results);
            }
        }

        Ok(Self {
            project_path: project_path.to_path_buf(),
            manifest_path,
            run_results_path,
            dag,
        })
    }

    /// The project dependency graph
    pub fn dag(&self) -> &ProjectDag {
        &self.dag
    }

    /// Iterate all models in the project
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.dag.models()
    }

    /// Get a model by its display name (not unique_id)
    pub fn get_model_by_name(&self, name: &str) -> Option<&Model> {
        self.dag.get_model_by_name(name)
    }
}

/// Project loading errors
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    RunResults(#[from] RunResultsError),
}
