//! JSON report: the scan report as is, minus diagnostics below the
//! configured severity.

use anyhow::{Context, Result};

use super::{ReportConfig, ReportFormat, ReportGenerator};
use crate::scanner::ScanReport;

#[derive(Debug, Default)]
pub struct JsonReporter {
    compact: bool,
}

impl JsonReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact() -> Self {
        Self { compact: true }
    }
}

impl ReportGenerator for JsonReporter {
    fn generate_report(&self, report: &ScanReport, config: &ReportConfig) -> Result<String> {
        let filtered;
        let report = if config.min_severity.is_some() {
            let mut copy = report.clone();
            copy.diagnostics.retain(|d| config.accepts(d));
            filtered = copy;
            &filtered
        } else {
            report
        };

        let json = if self.compact {
            serde_json::to_string(report)
        } else {
            serde_json::to_string_pretty(report)
        };
        json.context("Failed to serialize scan report")
    }

    fn supported_format() -> ReportFormat {
        ReportFormat::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostic, DiagnosticKind, Severity};
    use crate::scanner::ScanStats;
    use std::collections::BTreeMap;

    #[test]
    fn test_json_report_filters_by_severity() {
        let report = ScanReport {
            started_at: chrono::Utc::now(),
            duration_ms: 3,
            files: Vec::new(),
            diagnostics: vec![
                Diagnostic::at_line(DiagnosticKind::IncludeNotFound, "a.dxl", 2, "x.inc"),
                Diagnostic::at_line(DiagnosticKind::SystemCall, "a.dxl", 5, "system(x)"),
            ],
            stats: ScanStats::default(),
            dependencies: BTreeMap::new(),
        };
        let config = ReportConfig {
            format: ReportFormat::Json,
            min_severity: Some(Severity::Error),
            ..ReportConfig::default()
        };

        let json = JsonReporter::compact().generate_report(&report, &config).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let diagnostics = value["diagnostics"].as_array().unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0]["code"], "DXL010");
        assert_eq!(diagnostics[0]["severity"], "error");
        assert_eq!(diagnostics[0]["location"]["line"], 2);
        assert_eq!(value["duration_ms"], 3);
    }
}
