//! dbt manifest.json parsing
//!
//! Parses dbt-generated manifest.json to extract model nodes and their
//! dependencies. Only the fields the analyzer consumes are modeled; the
//! JSON names match the dbt artifact schema exactly.

use dbtlens_core::{MaterializationType, Model};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// dbt manifest.json structure (subset of fields we care about)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Model, test, seed, and snapshot nodes keyed by unique_id
    #[serde(default)]
    pub nodes: HashMap<String, ManifestNode>,
}

impl Manifest {
    /// Load manifest from file
    ///
    /// A missing file is the one fatal input condition and is reported as
    /// a distinct `NotFound` error.
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_str(&contents)
    }

    /// Parse manifest from JSON string
    pub fn from_str(json: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(json).map_err(|e| ManifestError::ParseError(e.to_string()))
    }

    /// Get all model nodes (filters out tests, seeds, snapshots, etc.)
    pub fn models(&self) -> impl Iterator<Item = (&String, &ManifestNode)> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.resource_type == "model")
    }

    /// Get a specific node by unique_id
    pub fn get_node(&self, unique_id: &str) -> Option<&ManifestNode> {
        self.nodes.get(unique_id)
    }
}

/// A node in the manifest (model, test, snapshot, etc.)
///
/// Every field is defaulted so that partial or older-schema manifests
/// still parse; a node the analyzer cannot use is filtered, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestNode {
    /// Node name (e.g., "users")
    #[serde(default)]
    pub name: String,

    /// Resource type (model, test, snapshot, etc.)
    #[serde(default)]
    pub resource_type: String,

    /// Relative path to the SQL file
    #[serde(default)]
    pub path: String,

    /// Node configuration
    #[serde(default)]
    pub config: NodeConfig,

    /// Database name
    #[serde(default)]
    pub database: Option<String>,

    /// Schema name
    #[serde(default)]
    pub schema: Option<String>,

    /// Node tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Free-form meta mapping
    #[serde(default)]
    pub meta: Map<String, Value>,

    /// Compiled SQL text, if the manifest carries it
    #[serde(default)]
    pub compiled_sql: Option<String>,

    /// Raw SQL text, if the manifest carries it
    #[serde(default)]
    pub raw_sql: Option<String>,

    /// Dependencies
    #[serde(default)]
    pub depends_on: DependsOn,
}

impl ManifestNode {
    /// Convert this manifest node into an analyzer model.
    ///
    /// The map key is the authoritative identity. An unknown
    /// `config.materialized` value degrades to `view`.
    pub fn to_model(&self, unique_id: &str) -> Model {
        let materialization = self
            .config
            .materialized
            .as_deref()
            .map(MaterializationType::parse)
            .unwrap_or(MaterializationType::View);

        let mut model = Model::new(self.name.clone(), unique_id, materialization);
        model.resource_type = if self.resource_type.is_empty() {
            "model".to_string()
        } else {
            self.resource_type.clone()
        };
        model.path = self.path.clone();
        model.database = self.database.clone();
        model.schema = self.schema.clone();
        model.tags = self.tags.clone();
        model.meta = self.meta.clone();
        model.compiled_sql = self.compiled_sql.clone();
        model.raw_sql = self.raw_sql.clone();
        model
    }
}

/// Node configuration (from dbt_project.yml or model config)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Materialization type
    #[serde(default)]
    pub materialized: Option<String>,
}

/// Dependencies structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependsOn {
    /// List of node unique_ids this node depends on
    #[serde(default)]
    pub nodes: Vec<String>,
}

/// Manifest parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Manifest not found at {0}")]
    NotFound(String),

    #[error("Failed to read manifest file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse manifest JSON: {0}")]
    ParseError(String),
}
