//! Report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use crate::model::{Finding, Recommendation, Severity};
use serde::{Deserialize, Serialize};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Where the analyzed artifacts came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// dbt project directory
    pub project_path: String,

    /// manifest.json location
    pub manifest_path: String,
}

/// Finding counts broken down by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    /// Number of error findings
    pub error: usize,

    /// Number of warn findings
    pub warn: usize,

    /// Number of info findings
    pub info: usize,
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of models in the analyzed graph
    pub total_models: usize,

    /// Total number of findings
    pub total_findings: usize,

    /// Total number of recommendations
    pub total_recommendations: usize,

    /// Findings broken down by severity
    pub findings_by_severity: SeverityCounts,
}

/// Analysis report (analysis_report.json v1)
///
/// This is the stable output format.
/// All fields are versioned and backward-compatible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (RFC 3339)
    pub timestamp: String,

    /// Input artifact locations
    pub metadata: ReportMetadata,

    /// Summary statistics
    pub summary: ReportSummary,

    /// All findings, in rule-evaluation order
    pub findings: Vec<Finding>,

    /// Recommendations, sorted by priority descending
    pub recommendations: Vec<Recommendation>,
}

impl Report {
    /// Create a new empty report
    pub fn new() -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            metadata: ReportMetadata::default(),
            summary: ReportSummary::default(),
            findings: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    /// Build a report from a completed analysis run
    pub fn from_analysis(
        metadata: ReportMetadata,
        total_models: usize,
        findings: Vec<Finding>,
        recommendations: Vec<Recommendation>,
    ) -> Self {
        let findings_by_severity = SeverityCounts {
            error: findings.iter().filter(|f| f.severity == Severity::Error).count(),
            warn: findings.iter().filter(|f| f.severity == Severity::Warn).count(),
            info: findings.iter().filter(|f| f.severity == Severity::Info).count(),
        };

        let summary = ReportSummary {
            total_models,
            total_findings: findings.len(),
            total_recommendations: recommendations.len(),
            findings_by_severity,
        };

        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            metadata,
            summary,
            findings,
            recommendations,
        }
    }

    /// Check if the report has any error-severity findings
    pub fn has_errors(&self) -> bool {
        self.summary.findings_by_severity.error > 0
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Finding, FindingCode, Severity};
    use serde_json::Map;

    fn finding(code: FindingCode, severity: Severity) -> Finding {
        Finding {
            code,
            severity,
            model_name: "m".to_string(),
            title: String::new(),
            description: String::new(),
            rationale: String::new(),
            suggested_action: String::new(),
            proposed_changes: None,
            metadata: Map::new(),
        }
    }

    #[test]
    fn empty_report() {
        let report = Report::new();
        assert_eq!(report.version, ReportVersion::CURRENT);
        assert_eq!(report.summary.total_findings, 0);
        assert!(!report.has_errors());
    }

    #[test]
    fn report_counts_by_severity() {
        let findings = vec![
            finding(FindingCode::FanOutHeavyModel, Severity::Error),
            finding(FindingCode::DeadModel, Severity::Info),
            finding(FindingCode::DeepDepChain, Severity::Warn),
        ];

        let report = Report::from_analysis(ReportMetadata::default(), 12, findings, Vec::new());

        assert_eq!(report.summary.total_models, 12);
        assert_eq!(report.summary.total_findings, 3);
        assert_eq!(report.summary.findings_by_severity.error, 1);
        assert_eq!(report.summary.findings_by_severity.warn, 1);
        assert_eq!(report.summary.findings_by_severity.info, 1);
        assert!(report.has_errors());
    }

    #[test]
    fn report_serialization() {
        let report = Report::new();
        let json = report.to_json().unwrap();
        assert!(json.contains("\"version\""));
        assert!(json.contains("\"findings\""));
        assert!(json.contains("\"recommendations\""));
    }
}
