//! Dependency graph (DAG) construction and traversal
//!
//! Builds forward and reverse adjacency for the project's model graph.
//! Edges point parent -> child (upstream -> downstream): a child reads the
//! output of its parents. Every query is total - an unknown id yields an
//! empty result, never an error.

use crate::manifest::Manifest;
use dbtlens_core::Model;
use std::collections::{HashMap, HashSet, VecDeque};

/// The project dependency graph, owning its model records
///
/// Models iterate in insertion order (re-inserting an existing id keeps
/// its original position), so scans and report listings are deterministic.
#[derive(Debug, Clone, Default)]
pub struct ProjectDag {
    /// Model records keyed by unique_id
    models: HashMap<String, Model>,

    /// Insertion order of model ids
    order: Vec<String>,

    /// Reverse edges: node -> nodes it depends on (parents)
    parents: HashMap<String, Vec<String>>,

    /// Forward edges: node -> nodes that depend on it (children)
    children: HashMap<String, Vec<String>>,
}

impl ProjectDag {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from a manifest.
    ///
    /// First pass adds every `resource_type == "model"` node; second pass
    /// adds edges from `depends_on.nodes`, keeping only parents that are
    /// themselves model nodes already in the graph. Cached relationship
    /// projections are refreshed before returning.
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let mut dag = Self::new();

        let mut model_ids: Vec<String> = manifest.models().map(|(id, _)| id.clone()).collect();
        model_ids.sort();

        for node_id in &model_ids {
            if let Some(node) = manifest.get_node(node_id) {
                dag.add_model(node.to_model(node_id));
            }
        }

        for node_id in &model_ids {
            if let Some(node) = manifest.get_node(node_id) {
                for parent_id in &node.depends_on.nodes {
                    // Sources, seeds, and unknown ids are not graph nodes
                    if parent_id.starts_with("model.") {
                        dag.add_dependency(parent_id, node_id);
                    }
                }
            }
        }

        dag.refresh_relationships();
        dag
    }

    /// Add a model, keyed by its unique_id.
    ///
    /// Inserting an existing id replaces the record (last write wins) and
    /// keeps its edges and insertion-order position.
    pub fn add_model(&mut self, model: Model) {
        let unique_id = model.unique_id.clone();
        if !self.models.contains_key(&unique_id) {
            self.order.push(unique_id.clone());
        }
        self.models.insert(unique_id, model);
    }

    /// Add a dependency edge from parent to child.
    ///
    /// No-ops unless both endpoints are present; duplicate edges are
    /// ignored. Cycles are not validated - traversals are bounded by
    /// visited sets instead.
    pub fn add_dependency(&mut self, parent_id: &str, child_id: &str) {
        if !self.models.contains_key(parent_id) || !self.models.contains_key(child_id) {
            return;
        }

        let children = self.children.entry(parent_id.to_string()).or_default();
        if children.iter().any(|c| c == child_id) {
            return;
        }
        children.push(child_id.to_string());

        self.parents
            .entry(child_id.to_string())
            .or_default()
            .push(parent_id.to_string());
    }

    /// Get a model by its unique_id
    pub fn get(&self, unique_id: &str) -> Option<&Model> {
        self.models.get(unique_id)
    }

    /// Get a model by its display name (not unique_id)
    pub fn get_model_by_name(&self, name: &str) -> Option<&Model> {
        self.models().find(|m| m.name == name)
    }

    /// Mutable access for telemetry merging
    pub(crate) fn get_mut(&mut self, unique_id: &str) -> Option<&mut Model> {
        self.models.get_mut(unique_id)
    }

    /// Iterate models in insertion order
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.order.iter().filter_map(|id| self.models.get(id))
    }

    /// Number of models in the graph
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the graph has no models
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Direct upstream (parent) ids; empty if the id is unknown
    pub fn upstream(&self, unique_id: &str) -> Vec<String> {
        self.parents.get(unique_id).cloned().unwrap_or_default()
    }

    /// Direct downstream (child) ids; empty if the id is unknown
    pub fn downstream(&self, unique_id: &str) -> Vec<String> {
        self.children.get(unique_id).cloned().unwrap_or_default()
    }

    /// All transitive upstream ids (ancestor closure)
    pub fn all_upstream(&self, unique_id: &str) -> HashSet<String> {
        self.closure(unique_id, &self.parents)
    }

    /// All transitive downstream ids (descendant closure)
    ///
    /// This is the "blast radius": every model affected if this one
    /// changes.
    pub fn all_downstream(&self, unique_id: &str) -> HashSet<String> {
        self.closure(unique_id, &self.children)
    }

    /// BFS closure over one edge direction, bounded by a visited set
    fn closure(&self, start: &str, edges: &HashMap<String, Vec<String>>) -> HashSet<String> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();

        if let Some(next) = edges.get(start) {
            for id in next {
                queue.push_back(id.clone());
            }
        }

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }

            if let Some(next) = edges.get(&current) {
                for id in next {
                    if !visited.contains(id) {
                        queue.push_back(id.clone());
                    }
                }
            }
        }

        visited
    }

    /// Minimum number of edges on a directed path source -> target.
    ///
    /// `None` if either id is unknown or the target is unreachable.
    /// Unweighted BFS.
    pub fn path_length(&self, source_id: &str, target_id: &str) -> Option<usize> {
        if !self.models.contains_key(source_id) || !self.models.contains_key(target_id) {
            return None;
        }
        if source_id == target_id {
            return Some(0);
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        visited.insert(source_id);
        queue.push_back((source_id, 0));

        while let Some((current, dist)) = queue.pop_front() {
            if let Some(next) = self.children.get(current) {
                for id in next {
                    if id == target_id {
                        return Some(dist + 1);
                    }
                    if visited.insert(id) {
                        queue.push_back((id, dist + 1));
                    }
                }
            }
        }

        None
    }

    /// Maximum over all reachable descendants of the shortest distance
    /// from `unique_id` to that descendant; 0 if the id is unknown or has
    /// no descendants.
    ///
    /// NOTE: this is deliberately NOT the graph-theoretic longest path.
    /// A node reachable both directly and through a longer chain counts
    /// at its shortest distance.
    pub fn longest_path_from(&self, unique_id: &str) -> usize {
        let descendants = self.all_downstream(unique_id);

        descendants
            .iter()
            .filter_map(|desc| self.path_length(unique_id, desc))
            .max()
            .unwrap_or(0)
    }

    /// Recompute every model's cached upstream/downstream projections
    /// from the current edges.
    ///
    /// Must run after any bulk edge-insertion phase, before rule
    /// evaluation.
    pub fn refresh_relationships(&mut self) {
        for id in &self.order {
            let upstream = self.parents.get(id).cloned().unwrap_or_default();
            let downstream = self.children.get(id).cloned().unwrap_or_default();
            if let Some(model) = self.models.get_mut(id) {
                model.upstream_models = upstream;
                model.downstream_models = downstream;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbtlens_core::MaterializationType;
    use pretty_assertions::assert_eq;

    fn model(id: &str) -> Model {
        let name = id.rsplit('.').next().unwrap_or(id).to_string();
        Model::new(name, id, MaterializationType::View)
    }

    /// stg_a -> int_a -> fct_a
    ///        \-> fct_a (direct shortcut)
    fn diamond() -> ProjectDag {
        let mut dag = ProjectDag::new();
        for id in ["model.p.stg_a", "model.p.int_a", "model.p.fct_a"] {
            dag.add_model(model(id));
        }
        dag.add_dependency("model.p.stg_a", "model.p.int_a");
        dag.add_dependency("model.p.int_a", "model.p.fct_a");
        dag.add_dependency("model.p.stg_a", "model.p.fct_a");
        dag.refresh_relationships();
        dag
    }

    #[test]
    fn closures_are_transitive() {
        let dag = diamond();

        let up = dag.all_upstream("model.p.fct_a");
        assert!(up.contains("model.p.stg_a"));
        assert!(up.contains("model.p.int_a"));
        assert_eq!(up.len(), 2);

        let down = dag.all_downstream("model.p.stg_a");
        assert!(down.contains("model.p.int_a"));
        assert!(down.contains("model.p.fct_a"));
        assert_eq!(down.len(), 2);
    }

    #[test]
    fn unknown_ids_yield_empty_results() {
        let dag = diamond();

        assert!(dag.upstream("model.p.missing").is_empty());
        assert!(dag.downstream("model.p.missing").is_empty());
        assert!(dag.all_upstream("model.p.missing").is_empty());
        assert_eq!(dag.path_length("model.p.missing", "model.p.fct_a"), None);
        assert_eq!(dag.path_length("model.p.stg_a", "model.p.missing"), None);
        assert_eq!(dag.longest_path_from("model.p.missing"), 0);
    }

    #[test]
    fn path_length_is_shortest() {
        let dag = diamond();

        // stg_a reaches fct_a directly (1) and via int_a (2)
        assert_eq!(dag.path_length("model.p.stg_a", "model.p.fct_a"), Some(1));
        assert_eq!(dag.path_length("model.p.stg_a", "model.p.stg_a"), Some(0));
        assert_eq!(dag.path_length("model.p.fct_a", "model.p.stg_a"), None);
    }

    #[test]
    fn longest_path_takes_max_of_shortest_distances() {
        let dag = diamond();

        // Descendants of stg_a are int_a (dist 1) and fct_a (shortest
        // dist 1, despite the 2-edge chain), so the result is 1, not 2.
        assert_eq!(dag.longest_path_from("model.p.stg_a"), 1);
        assert_eq!(dag.longest_path_from("model.p.int_a"), 1);
        assert_eq!(dag.longest_path_from("model.p.fct_a"), 0);
    }

    #[test]
    fn dangling_and_duplicate_edges_are_ignored() {
        let mut dag = ProjectDag::new();
        dag.add_model(model("model.p.a"));
        dag.add_model(model("model.p.b"));

        dag.add_dependency("model.p.a", "model.p.ghost");
        dag.add_dependency("model.p.ghost", "model.p.b");
        dag.add_dependency("model.p.a", "model.p.b");
        dag.add_dependency("model.p.a", "model.p.b");

        assert_eq!(dag.downstream("model.p.a"), vec!["model.p.b"]);
        assert_eq!(dag.upstream("model.p.b"), vec!["model.p.a"]);
    }

    #[test]
    fn reinsert_keeps_position_and_edges() {
        let mut dag = ProjectDag::new();
        dag.add_model(model("model.p.a"));
        dag.add_model(model("model.p.b"));
        dag.add_dependency("model.p.a", "model.p.b");

        let mut replacement = model("model.p.a");
        replacement.name = "a_v2".to_string();
        dag.add_model(replacement);

        let names: Vec<&str> = dag.models().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a_v2", "b"]);
        assert_eq!(dag.downstream("model.p.a"), vec!["model.p.b"]);
    }

    #[test]
    fn refresh_populates_model_projections() {
        let dag = diamond();

        let fct = dag.get("model.p.fct_a").unwrap();
        let mut upstream = fct.upstream_models.clone();
        upstream.sort();
        assert_eq!(upstream, vec!["model.p.int_a", "model.p.stg_a"]);
        assert!(fct.downstream_models.is_empty());
    }

    #[test]
    fn cyclic_edges_do_not_hang_traversal() {
        let mut dag = ProjectDag::new();
        dag.add_model(model("model.p.a"));
        dag.add_model(model("model.p.b"));
        dag.add_dependency("model.p.a", "model.p.b");
        dag.add_dependency("model.p.b", "model.p.a");

        let down = dag.all_downstream("model.p.a");
        assert!(down.contains("model.p.b"));
        // A cycle makes the start reachable from itself
        assert!(down.contains("model.p.a"));
        assert_eq!(dag.longest_path_from("model.p.a"), 1);
    }
}
