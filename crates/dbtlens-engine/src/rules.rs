//! Analysis rules over the project graph
//!
//! Four independent scans, each a pure function of `(dag, config)`.
//! Evaluation order does not affect output, and a model with absent
//! telemetry is silently skipped by telemetry-dependent rules.

use dbtlens_core::{Finding, FindingCode, MaterializationType, RuleConfig, Severity};
use dbtlens_dbt::ProjectDag;
use serde_json::{json, Map};

fn fmt_seconds(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v}s"),
        None => "n/a".to_string(),
    }
}

fn fmt_rows(value: Option<u64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "n/a".to_string(),
    }
}

/// Identify heavy models that should be incremental.
///
/// A model qualifies when it is not already incremental, has telemetry,
/// and crosses either the execution-time or the rows-affected threshold.
pub fn check_heavy_non_incremental_models(dag: &ProjectDag, config: &RuleConfig) -> Vec<Finding> {
    let mut findings = Vec::new();

    for model in dag.models() {
        if model.materialization == MaterializationType::Incremental {
            continue;
        }

        if !model.has_telemetry() {
            continue;
        }

        let is_slow = model
            .execution_time
            .is_some_and(|t| t >= config.min_execution_time_seconds);
        let is_large = model
            .rows_affected
            .is_some_and(|r| r >= config.min_rows_for_heavy);

        if !is_slow && !is_large {
            continue;
        }

        let mut metadata = Map::new();
        metadata.insert("execution_time".to_string(), json!(model.execution_time));
        metadata.insert("rows_affected".to_string(), json!(model.rows_affected));
        metadata.insert(
            "current_materialization".to_string(),
            json!(model.materialization.as_str()),
        );

        findings.push(Finding {
            code: FindingCode::HeavyNonIncrementalModel,
            severity: Severity::Warn,
            model_name: model.name.clone(),
            title: format!(
                "Heavy model '{}' should consider incremental materialization",
                model.name
            ),
            description: format!(
                "Model '{}' is materialized as '{}' but has significant size/execution time \
                 (execution: {}, rows: {}). Consider using incremental materialization.",
                model.name,
                model.materialization,
                fmt_seconds(model.execution_time),
                fmt_rows(model.rows_affected),
            ),
            rationale: "Large or slow-running models benefit from incremental materialization, \
                        which only processes new or changed records instead of rebuilding the \
                        entire table on each run. This can significantly reduce compute costs \
                        and runtime."
                .to_string(),
            suggested_action: format!(
                "Convert '{}' to incremental materialization. Add \
                 `config(materialized='incremental', unique_key='your_key')` to the model \
                 and implement `is_incremental()` logic to filter for new records.",
                model.name
            ),
            proposed_changes: Some(json!({
                "materialization": "incremental",
                "requires_unique_key": true,
                "requires_incremental_logic": true,
            })),
            metadata,
        });
    }

    findings
}

/// Identify models with no downstream dependents.
///
/// These may be legitimate end-points (dashboards, exports) or dead
/// code; the finding is informational either way.
pub fn check_dead_models(dag: &ProjectDag, _config: &RuleConfig) -> Vec<Finding> {
    let mut findings = Vec::new();

    for model in dag.models() {
        let downstream = dag.downstream(&model.unique_id);
        if !downstream.is_empty() {
            continue;
        }

        let mut metadata = Map::new();
        metadata.insert("downstream_count".to_string(), json!(0));
        metadata.insert(
            "upstream_count".to_string(),
            json!(dag.upstream(&model.unique_id).len()),
        );

        findings.push(Finding {
            code: FindingCode::DeadModel,
            severity: Severity::Info,
            model_name: model.name.clone(),
            title: format!("Model '{}' has no downstream dependents", model.name),
            description: format!(
                "Model '{}' is not referenced by any other models. It may be unused or a \
                 legitimate end-point (dashboard, export, etc.).",
                model.name
            ),
            rationale: "Models with no downstream dependents may be: (1) legitimate end-points \
                        consumed by BI tools or exports, (2) work-in-progress models, or \
                        (3) truly dead code that should be removed. Review to determine which \
                        case applies."
                .to_string(),
            suggested_action: format!(
                "Review model '{}' to determine if it's still needed. If it's consumed \
                 externally (BI tool, data export), consider adding it to an exposure. \
                 If unused, consider archiving or removing it.",
                model.name
            ),
            proposed_changes: None,
            metadata,
        });
    }

    findings
}

/// Identify models whose transitive upstream set is too large.
///
/// Depth here is the SIZE of the ancestor set, not the longest chain -
/// preserved source semantics.
pub fn check_deep_dependency_chains(dag: &ProjectDag, config: &RuleConfig) -> Vec<Finding> {
    let mut findings = Vec::new();

    for model in dag.models() {
        let all_upstream = dag.all_upstream(&model.unique_id);
        let max_depth = all_upstream.len();

        if max_depth <= config.max_dependency_depth {
            continue;
        }

        let longest_downstream = dag.longest_path_from(&model.unique_id);

        let mut metadata = Map::new();
        metadata.insert("upstream_depth".to_string(), json!(max_depth));
        metadata.insert("downstream_depth".to_string(), json!(longest_downstream));
        metadata.insert("total_upstream_models".to_string(), json!(all_upstream.len()));

        findings.push(Finding {
            code: FindingCode::DeepDepChain,
            severity: Severity::Warn,
            model_name: model.name.clone(),
            title: format!("Model '{}' has deep dependency chain", model.name),
            description: format!(
                "Model '{}' has {} upstream dependencies, exceeding the recommended maximum \
                 of {}. Deep dependency chains can make debugging difficult and increase \
                 fragility.",
                model.name, max_depth, config.max_dependency_depth
            ),
            rationale: "Deep dependency chains make it harder to understand data lineage, \
                        debug issues, and modify models without breaking downstream \
                        dependencies. Consider consolidating intermediate transformations or \
                        introducing strategic materialization points."
                .to_string(),
            suggested_action: format!(
                "Review the dependency chain for '{}'. Consider: (1) consolidating some \
                 intermediate models, (2) materializing key intermediate models as tables \
                 for better performance, or (3) refactoring the transformation logic.",
                model.name
            ),
            proposed_changes: None,
            metadata,
        });
    }

    findings
}

/// Identify slow models with many direct dependents.
///
/// These are the pipeline's critical bottlenecks: every downstream model
/// waits on them.
pub fn check_fan_out_heavy_models(dag: &ProjectDag, config: &RuleConfig) -> Vec<Finding> {
    let mut findings = Vec::new();

    for model in dag.models() {
        let Some(execution_time) = model.execution_time else {
            continue;
        };

        let downstream = dag.downstream(&model.unique_id);
        let downstream_count = downstream.len();

        let is_heavy = execution_time >= config.min_execution_time_seconds;
        if !is_heavy || downstream_count < config.min_downstream_count {
            continue;
        }

        let mut metadata = Map::new();
        metadata.insert("execution_time".to_string(), json!(execution_time));
        metadata.insert("downstream_count".to_string(), json!(downstream_count));
        metadata.insert("downstream_models".to_string(), json!(downstream));

        findings.push(Finding {
            code: FindingCode::FanOutHeavyModel,
            severity: Severity::Error,
            model_name: model.name.clone(),
            title: format!(
                "Critical bottleneck: '{}' is slow with {} dependents",
                model.name, downstream_count
            ),
            description: format!(
                "Model '{}' takes {}s to run and has {} downstream dependents. This is a \
                 critical bottleneck that affects many downstream models.",
                model.name, execution_time, downstream_count
            ),
            rationale: "Models that are both slow and heavily depended upon create \
                        bottlenecks in the DAG. Optimizing these models has the highest \
                        impact on overall pipeline performance and developer productivity."
                .to_string(),
            suggested_action: format!(
                "Prioritize optimizing '{}'. Consider: (1) adding indexes or optimizing SQL, \
                 (2) converting to incremental materialization, (3) pre-aggregating data, or \
                 (4) splitting into smaller, focused models.",
                model.name
            ),
            proposed_changes: None,
            metadata,
        });
    }

    findings
}

/// Run all analysis rules on a graph.
///
/// Rules share no state; the concatenation order is fixed but running a
/// subset is equivalent to filtering this output by finding code.
pub fn run_all_rules(dag: &ProjectDag, config: &RuleConfig) -> Vec<Finding> {
    let rules: [fn(&ProjectDag, &RuleConfig) -> Vec<Finding>; 4] = [
        check_heavy_non_incremental_models,
        check_dead_models,
        check_deep_dependency_chains,
        check_fan_out_heavy_models,
    ];

    let mut all_findings = Vec::new();
    for rule in rules {
        all_findings.extend(rule(dag, config));
    }

    all_findings
}
