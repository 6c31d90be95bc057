//! Recommendation aggregation
//!
//! Groups findings by rule code, ranks each bucket with a rule-specific
//! scoring function, and assigns the fixed per-rule priority. Each
//! recommendation carries its whole bucket in scan order; the sorts only
//! pick which findings feed snippets and description listings.

use dbtlens_core::{Finding, FindingCode, Recommendation};
use serde_json::Value;
use std::cmp::Reverse;

fn metadata_f64(finding: &Finding, key: &str) -> f64 {
    finding.metadata.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn metadata_u64(finding: &Finding, key: &str) -> u64 {
    finding.metadata.get(key).and_then(Value::as_u64).unwrap_or(0)
}

/// Example config for converting a model to incremental materialization
fn incremental_config_snippet(model_name: &str) -> String {
    format!(
        r#"-- In models/.../{model_name}.sql
{{{{
  config(
    materialized='incremental',
    unique_key='id',  -- Replace with your actual unique key
    on_schema_change='fail'
  )
}}}}

SELECT
  *
FROM source_table
{{% if is_incremental() %}}
  -- This filter will only run on incremental runs
  WHERE updated_at > (SELECT MAX(updated_at) FROM {{{{ this }}}})
{{% endif %}}"#
    )
}

fn incrementalize_heavy_models(findings: Vec<Finding>) -> Recommendation {
    // Worst offenders first: execution time, then rows affected
    let mut sorted: Vec<&Finding> = findings.iter().collect();
    sorted.sort_by(|a, b| {
        let ka = (metadata_f64(a, "execution_time"), metadata_f64(a, "rows_affected"));
        let kb = (metadata_f64(b, "execution_time"), metadata_f64(b, "rows_affected"));
        kb.0.total_cmp(&ka.0).then(kb.1.total_cmp(&ka.1))
    });

    let code_snippets: Vec<String> = sorted
        .iter()
        .take(3)
        .map(|f| incremental_config_snippet(&f.model_name))
        .collect();

    Recommendation {
        id: "REC_INCREMENTALIZE_HEAVY_MODELS".to_string(),
        title: "Convert Heavy Models to Incremental Materialization".to_string(),
        description: format!(
            "Found {} models that would benefit from incremental materialization. These \
             models are slow or process large datasets but currently rebuild completely \
             on each run.",
            findings.len()
        ),
        impact: "HIGH - Incremental materialization can reduce run times by 80-95% for \
                 large tables that receive regular updates. This directly reduces compute \
                 costs and enables more frequent data refreshes."
            .to_string(),
        effort: "MEDIUM - Requires adding incremental config and implementing \
                 is_incremental() logic to filter for new/changed records. Testing is \
                 critical to ensure data correctness."
            .to_string(),
        findings,
        code_snippets,
        priority: 10,
    }
}

fn optimize_bottleneck_models(findings: Vec<Finding>) -> Recommendation {
    // Rank by downstream count weighted by execution time
    let mut sorted: Vec<&Finding> = findings.iter().collect();
    sorted.sort_by(|a, b| {
        let ka = metadata_u64(a, "downstream_count") as f64 * metadata_f64(a, "execution_time");
        let kb = metadata_u64(b, "downstream_count") as f64 * metadata_f64(b, "execution_time");
        kb.total_cmp(&ka)
    });

    let model_list: Vec<String> = sorted
        .iter()
        .take(5)
        .map(|f| format!("- {}", f.model_name))
        .collect();

    Recommendation {
        id: "REC_OPTIMIZE_BOTTLENECK_MODELS".to_string(),
        title: "Optimize Critical Bottleneck Models".to_string(),
        description: format!(
            "Found {} models that are both slow and heavily depended upon. These create \
             pipeline bottlenecks affecting many downstream models.\n\nTop bottlenecks:\n{}",
            findings.len(),
            model_list.join("\n")
        ),
        impact: "CRITICAL - These bottlenecks affect the entire pipeline. Optimizing them \
                 improves build times for all downstream models and enables parallel \
                 execution."
            .to_string(),
        effort: "HIGH - Requires SQL optimization, potentially adding indexes, converting \
                 to incremental, or architectural changes."
            .to_string(),
        findings,
        code_snippets: Vec::new(),
        priority: 9,
    }
}

fn review_unused_models(findings: Vec<Finding>) -> Recommendation {
    let model_list: Vec<String> = findings
        .iter()
        .take(10)
        .map(|f| format!("- {}", f.model_name))
        .collect();

    Recommendation {
        id: "REC_REVIEW_UNUSED_MODELS".to_string(),
        title: "Review and Clean Up Unused Models".to_string(),
        description: format!(
            "Found {} models with no downstream dependents. These may be unused or \
             legitimate endpoints.\n\nModels to review:\n{}",
            findings.len(),
            model_list.join("\n")
        ),
        impact: "LOW-MEDIUM - Removing unused models reduces maintenance burden, build \
                 times, and warehouse costs. However, verify they're truly unused before \
                 removal."
            .to_string(),
        effort: "LOW - Review each model to confirm it's unused, then archive or delete. \
                 Consider adding dbt exposures for models consumed by BI tools."
            .to_string(),
        findings,
        code_snippets: Vec::new(),
        priority: 3,
    }
}

fn simplify_dependency_chains(findings: Vec<Finding>) -> Recommendation {
    let mut sorted: Vec<&Finding> = findings.iter().collect();
    sorted.sort_by_key(|f| Reverse(metadata_u64(f, "upstream_depth")));

    let model_list: Vec<String> = sorted
        .iter()
        .take(5)
        .map(|f| format!("- {} (depth: {})", f.model_name, metadata_u64(f, "upstream_depth")))
        .collect();

    Recommendation {
        id: "REC_SIMPLIFY_DEPENDENCY_CHAINS".to_string(),
        title: "Simplify Deep Dependency Chains".to_string(),
        description: format!(
            "Found {} models with deep dependency chains. These can be hard to maintain \
             and debug.\n\nDeepest chains:\n{}",
            findings.len(),
            model_list.join("\n")
        ),
        impact: "MEDIUM - Simplifying dependency chains improves maintainability and makes \
                 debugging easier. Can also enable better parallelization."
            .to_string(),
        effort: "MEDIUM-HIGH - May require refactoring model logic or consolidating \
                 intermediate transformations."
            .to_string(),
        findings,
        code_snippets: Vec::new(),
        priority: 5,
    }
}

/// Generate high-level recommendations from findings.
///
/// Buckets are processed in a fixed order (heavy, fan-out, dead, deep);
/// the final list is stably sorted by priority descending, so ties keep
/// bucket order. Empty input yields empty output.
pub fn generate_recommendations(findings: &[Finding]) -> Vec<Recommendation> {
    if findings.is_empty() {
        return Vec::new();
    }

    let mut heavy = Vec::new();
    let mut fanout = Vec::new();
    let mut dead = Vec::new();
    let mut deep = Vec::new();

    for finding in findings {
        match finding.code {
            FindingCode::HeavyNonIncrementalModel => heavy.push(finding.clone()),
            FindingCode::FanOutHeavyModel => fanout.push(finding.clone()),
            FindingCode::DeadModel => dead.push(finding.clone()),
            FindingCode::DeepDepChain => deep.push(finding.clone()),
        }
    }

    let mut recommendations = Vec::new();

    if !heavy.is_empty() {
        recommendations.push(incrementalize_heavy_models(heavy));
    }
    if !fanout.is_empty() {
        recommendations.push(optimize_bottleneck_models(fanout));
    }
    if !dead.is_empty() {
        recommendations.push(review_unused_models(dead));
    }
    if !deep.is_empty() {
        recommendations.push(simplify_dependency_chains(deep));
    }

    recommendations.sort_by_key(|r| Reverse(r.priority));

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbtlens_core::Severity;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Map};

    fn finding(code: FindingCode, model_name: &str, metadata: Map<String, Value>) -> Finding {
        Finding {
            code,
            severity: Severity::Info,
            model_name: model_name.to_string(),
            title: String::new(),
            description: String::new(),
            rationale: String::new(),
            suggested_action: String::new(),
            proposed_changes: None,
            metadata,
        }
    }

    fn heavy_finding(name: &str, execution_time: f64, rows: u64) -> Finding {
        let mut metadata = Map::new();
        metadata.insert("execution_time".to_string(), json!(execution_time));
        metadata.insert("rows_affected".to_string(), json!(rows));
        finding(FindingCode::HeavyNonIncrementalModel, name, metadata)
    }

    #[test]
    fn empty_findings_yield_no_recommendations() {
        assert!(generate_recommendations(&[]).is_empty());
    }

    #[test]
    fn priorities_are_non_increasing() {
        let mut deep_meta = Map::new();
        deep_meta.insert("upstream_depth".to_string(), json!(12));

        let mut fanout_meta = Map::new();
        fanout_meta.insert("downstream_count".to_string(), json!(4));
        fanout_meta.insert("execution_time".to_string(), json!(90.0));

        let findings = vec![
            finding(FindingCode::DeadModel, "orphan", Map::new()),
            finding(FindingCode::DeepDepChain, "deep", deep_meta),
            finding(FindingCode::FanOutHeavyModel, "hub", fanout_meta),
            heavy_finding("big", 300.0, 1_000_000),
        ];

        let recommendations = generate_recommendations(&findings);
        assert_eq!(recommendations.len(), 4);

        let priorities: Vec<u32> = recommendations.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![10, 9, 5, 3]);

        let ids: Vec<&str> = recommendations.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "REC_INCREMENTALIZE_HEAVY_MODELS",
                "REC_OPTIMIZE_BOTTLENECK_MODELS",
                "REC_SIMPLIFY_DEPENDENCY_CHAINS",
                "REC_REVIEW_UNUSED_MODELS",
            ]
        );
    }

    #[test]
    fn snippets_cover_the_three_worst_heavy_models() {
        let findings = vec![
            heavy_finding("mild", 70.0, 0),
            heavy_finding("worst", 900.0, 500_000),
            heavy_finding("bad", 300.0, 0),
            heavy_finding("meh", 65.0, 0),
        ];

        let recommendations = generate_recommendations(&findings);
        let rec = &recommendations[0];

        assert_eq!(rec.code_snippets.len(), 3);
        assert!(rec.code_snippets[0].contains("worst"));
        assert!(rec.code_snippets[1].contains("bad"));
        assert!(rec.code_snippets[2].contains("mild"));

        // The recommendation still carries the whole bucket in scan order
        let carried: Vec<&str> = rec.findings.iter().map(|f| f.model_name.as_str()).collect();
        assert_eq!(carried, vec!["mild", "worst", "bad", "meh"]);
    }

    #[test]
    fn rows_break_execution_time_ties() {
        let findings = vec![
            heavy_finding("few_rows", 100.0, 10),
            heavy_finding("many_rows", 100.0, 10_000_000),
        ];

        let recommendations = generate_recommendations(&findings);
        assert!(recommendations[0].code_snippets[0].contains("many_rows"));
    }

    #[test]
    fn dead_model_description_lists_first_ten() {
        let findings: Vec<Finding> = (0..12)
            .map(|i| finding(FindingCode::DeadModel, &format!("orphan_{i}"), Map::new()))
            .collect();

        let recommendations = generate_recommendations(&findings);
        let rec = &recommendations[0];

        assert_eq!(rec.findings.len(), 12);
        assert!(rec.description.contains("orphan_9"));
        assert!(!rec.description.contains("orphan_10"));
    }

    #[test]
    fn snippet_keeps_jinja_braces() {
        let snippet = incremental_config_snippet("fct_orders");
        assert!(snippet.contains("-- In models/.../fct_orders.sql"));
        assert!(snippet.contains("{{\n  config("));
        assert!(snippet.contains("{% if is_incremental() %}"));
        assert!(snippet.contains("{{ this }}"));
    }
}
