//! Markdown report rendering
//!
//! Pure presentation over a finished report; consumes the graph only for
//! the execution-time table.

use dbtlens_core::{Report, Severity};
use dbtlens_dbt::ProjectDag;

/// Render the full Markdown report
pub fn generate_markdown_report(dag: &ProjectDag, report: &Report) -> String {
    let mut md = String::new();

    md.push_str("# dbt Pipeline Analysis Report\n\n");
    md.push_str(&format!("**Generated:** {}\n\n", report.timestamp));
    md.push_str(&format!("**Project:** `{}`\n\n", report.metadata.project_path));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- **Total Models:** {}\n", report.summary.total_models));
    md.push_str(&format!("- **Total Findings:** {}\n", report.summary.total_findings));
    md.push_str(&format!(
        "- **Total Recommendations:** {}\n\n",
        report.summary.total_recommendations
    ));

    let severity = &report.summary.findings_by_severity;
    md.push_str("**Findings by Severity:**\n");
    md.push_str(&format!("- 🔴 ERROR: {}\n", severity.error));
    md.push_str(&format!("- ⚠️ WARN: {}\n", severity.warn));
    md.push_str(&format!("- ℹ️ INFO: {}\n\n", severity.info));

    push_recommendations(&mut md, report);
    push_findings(&mut md, report);
    push_performance_table(&mut md, dag);

    md
}

fn push_recommendations(md: &mut String, report: &Report) {
    md.push_str("## Recommendations\n\n");

    if report.recommendations.is_empty() {
        md.push_str("✅ No recommendations - your dbt project looks good!\n\n");
        return;
    }

    for (i, rec) in report.recommendations.iter().enumerate() {
        md.push_str(&format!("### {}. {}\n\n", i + 1, rec.title));
        md.push_str(&format!("**Priority:** {}\n\n", rec.priority));
        md.push_str(&format!("**Impact:** {}\n\n", rec.impact));
        md.push_str(&format!("**Effort:** {}\n\n", rec.effort));
        md.push_str("**Description:**\n\n");
        md.push_str(&rec.description);
        md.push_str("\n\n");

        if !rec.code_snippets.is_empty() {
            md.push_str("**Code Examples:**\n\n");
            for snippet in &rec.code_snippets {
                md.push_str("```sql\n");
                md.push_str(snippet);
                md.push_str("\n```\n\n");
            }
        }

        md.push_str(&format!("*Affects {} model(s)*\n\n", rec.findings.len()));
    }
}

fn push_findings(md: &mut String, report: &Report) {
    md.push_str("## Findings by Severity\n\n");

    if report.findings.is_empty() {
        md.push_str("✅ No findings - your dbt project looks good!\n\n");
        return;
    }

    let sections = [
        (Severity::Error, "### 🔴 ERROR\n\n", true),
        (Severity::Warn, "### ⚠️ WARN\n\n", true),
        (Severity::Info, "### ℹ️ INFO\n\n", false),
    ];

    for (severity, header, with_action) in sections {
        let findings: Vec<_> = report
            .findings
            .iter()
            .filter(|f| f.severity == severity)
            .collect();

        if findings.is_empty() {
            continue;
        }

        md.push_str(header);
        for finding in findings {
            md.push_str(&format!("#### {}\n\n", finding.title));
            md.push_str(&format!("**Model:** `{}`\n\n", finding.model_name));
            md.push_str(&format!("**Description:** {}\n\n", finding.description));
            if with_action {
                md.push_str(&format!(
                    "**Suggested Action:** {}\n\n",
                    finding.suggested_action
                ));
            }
        }
    }
}

fn push_performance_table(md: &mut String, dag: &ProjectDag) {
    let mut with_telemetry: Vec<_> = dag
        .models()
        .filter(|m| m.execution_time.is_some())
        .collect();

    if with_telemetry.is_empty() {
        return;
    }

    with_telemetry.sort_by(|a, b| {
        b.execution_time
            .unwrap_or(0.0)
            .total_cmp(&a.execution_time.unwrap_or(0.0))
    });

    md.push_str("## Top Models by Execution Time\n\n");
    md.push_str("| Model | Materialization | Execution Time | Rows Affected |\n");
    md.push_str("|-------|----------------|----------------|---------------|\n");

    for model in with_telemetry.iter().take(10) {
        let exec_time = model
            .execution_time
            .map(|t| format!("{t:.2}s"))
            .unwrap_or_else(|| "N/A".to_string());
        let rows = model
            .rows_affected
            .map(group_thousands)
            .unwrap_or_else(|| "N/A".to_string());

        md.push_str(&format!(
            "| `{}` | {} | {} | {} |\n",
            model.name, model.materialization, exec_time, rows
        ));
    }

    md.push('\n');
}

/// Format an integer with comma thousand separators
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbtlens_core::{MaterializationType, Model, ReportMetadata, RuleConfig};
    use dbtlens_engine::{generate_recommendations, run_all_rules};

    fn analyzed_report() -> (ProjectDag, Report) {
        let mut dag = ProjectDag::new();
        let mut mart = Model::new("fct_orders", "model.shop.fct_orders", MaterializationType::Table);
        mart.execution_time = Some(125.7);
        mart.rows_affected = Some(1_250_000);
        dag.add_model(mart);
        dag.refresh_relationships();

        let findings = run_all_rules(&dag, &RuleConfig::default());
        let recommendations = generate_recommendations(&findings);
        let report = Report::from_analysis(
            ReportMetadata {
                project_path: "/tmp/shop".to_string(),
                manifest_path: "/tmp/shop/manifest.json".to_string(),
            },
            dag.len(),
            findings,
            recommendations,
        );
        (dag, report)
    }

    #[test]
    fn renders_all_sections() {
        let (dag, report) = analyzed_report();
        let md = generate_markdown_report(&dag, &report);

        assert!(md.contains("# dbt Pipeline Analysis Report"));
        assert!(md.contains("**Project:** `/tmp/shop`"));
        assert!(md.contains("## Recommendations"));
        assert!(md.contains("```sql"));
        assert!(md.contains("## Findings by Severity"));
        assert!(md.contains("## Top Models by Execution Time"));
        assert!(md.contains("| `fct_orders` | table | 125.70s | 1,250,000 |"));
    }

    #[test]
    fn empty_report_renders_clean_bill() {
        let dag = ProjectDag::new();
        let report = Report::from_analysis(ReportMetadata::default(), 0, Vec::new(), Vec::new());
        let md = generate_markdown_report(&dag, &report);

        assert!(md.contains("✅ No recommendations"));
        assert!(md.contains("✅ No findings"));
        assert!(!md.contains("## Top Models by Execution Time"));
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }
}
