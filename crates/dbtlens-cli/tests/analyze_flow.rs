//! End-to-end analyze flow: artifacts on disk -> report files

use dbtlens_core::{Report, ReportMetadata, RuleConfig};
use dbtlens_dbt::{DbtProject, ManifestError, ProjectError};
use dbtlens_engine::{generate_recommendations, run_all_rules};

const MANIFEST_JSON: &str = r#"{
    "nodes": {
        "model.shop.stg_orders": {
            "name": "stg_orders",
            "resource_type": "model",
            "config": {"materialized": "view"},
            "depends_on": {"nodes": []}
        },
        "model.shop.fct_orders": {
            "name": "fct_orders",
            "resource_type": "model",
            "config": {"materialized": "table"},
            "depends_on": {"nodes": ["model.shop.stg_orders"]}
        }
    }
}"#;

const RUN_RESULTS_JSON: &str = r#"{
    "results": [
        {
            "unique_id": "model.shop.fct_orders",
            "status": "success",
            "execution_time": 125.7,
            "adapter_response": {"rows_affected": 250000}
        }
    ]
}"#;

#[test]
fn analysis_writes_a_stable_json_report() {
    let project_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    std::fs::write(project_dir.path().join("manifest.json"), MANIFEST_JSON).unwrap();
    std::fs::write(project_dir.path().join("run_results.json"), RUN_RESULTS_JSON).unwrap();

    let project = DbtProject::load(
        project_dir.path(),
        None,
        Some(project_dir.path().join("run_results.json")),
    )
    .unwrap();

    let rules = RuleConfig::default();
    let findings = run_all_rules(project.dag(), &rules);
    let recommendations = generate_recommendations(&findings);

    let report = Report::from_analysis(
        ReportMetadata {
            project_path: project.project_path.display().to_string(),
            manifest_path: project.manifest_path.display().to_string(),
        },
        project.dag().len(),
        findings,
        recommendations,
    );

    let json_path = output_dir.path().join("analysis_report.json");
    report.save_to_file(&json_path).unwrap();

    let written = std::fs::read_to_string(&json_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();

    assert_eq!(parsed["version"]["major"], 1);
    assert_eq!(parsed["summary"]["total_models"], 2);
    // fct_orders is heavy (warn) and dead (info); stg_orders feeds it
    assert_eq!(parsed["summary"]["findings_by_severity"]["warn"], 1);
    assert!(parsed["findings"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f["code"] == "HEAVY_NON_INCREMENTAL_MODEL"));
    assert!(parsed["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["id"] == "REC_INCREMENTALIZE_HEAVY_MODELS"));

    // Round-trip through the stable schema
    let reloaded: Report = serde_json::from_str(&written).unwrap();
    assert_eq!(reloaded, report);
}

#[test]
fn missing_manifest_is_a_distinct_fatal_error() {
    let empty_dir = tempfile::tempdir().unwrap();
    let err = DbtProject::load(empty_dir.path(), None, None).unwrap_err();

    assert!(matches!(
        err,
        ProjectError::Manifest(ManifestError::NotFound(_))
    ));
    assert!(err.to_string().contains("Manifest not found"));
}
