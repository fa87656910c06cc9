/*!
# Reports Module

Rendering of a finished [`ScanReport`].

## Supported formats:
- **Text** - grouped by file and by category, for the console
- **JSON** - the whole report, for tooling

## Usage:

```rust,ignore
use dxl_analyzer::reports::{ReportFormat, ReportManager};

let report = scanner.scan(&candidates);
let text = ReportManager::new().generate_report(&report, ReportFormat::Text)?;
println!("{}", text);
```
*/

pub mod json;
pub mod text;

pub use json::JsonReporter;
pub use text::TextReporter;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::diagnostics::{Diagnostic, Severity};
use crate::scanner::ScanReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(anyhow::anyhow!("Unknown report format: {}", s)),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "Text"),
            ReportFormat::Json => write!(f, "JSON"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub format: ReportFormat,
    /// Only diagnostics at least this severe are rendered.
    pub min_severity: Option<Severity>,
    pub use_colors: bool,
    /// Text only: list the files without diagnostics too.
    pub include_clean_files: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::Text,
            min_severity: None,
            use_colors: false,
            include_clean_files: false,
        }
    }
}

impl ReportConfig {
    pub fn accepts(&self, diagnostic: &Diagnostic) -> bool {
        // Severity orders from Error down to Hint
        self.min_severity
            .map(|min| diagnostic.severity <= min)
            .unwrap_or(true)
    }
}

pub trait ReportGenerator {
    fn generate_report(&self, report: &ScanReport, config: &ReportConfig) -> Result<String>;

    fn supported_format() -> ReportFormat;
}

pub struct ReportManager {
    default_config: ReportConfig,
}

impl ReportManager {
    pub fn new() -> Self {
        Self {
            default_config: ReportConfig::default(),
        }
    }

    pub fn with_config(config: ReportConfig) -> Self {
        Self {
            default_config: config,
        }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.default_config
    }

    pub fn generate_report(&self, report: &ScanReport, format: ReportFormat) -> Result<String> {
        let config = ReportConfig {
            format,
            ..self.default_config.clone()
        };
        self.generate_with_config(report, &config)
    }

    pub fn generate_with_config(&self, report: &ScanReport, config: &ReportConfig) -> Result<String> {
        match config.format {
            ReportFormat::Text => TextReporter::new().generate_report(report, config),
            ReportFormat::Json => JsonReporter::new().generate_report(report, config),
        }
    }

    pub fn save_report<P: AsRef<Path>>(
        &self,
        report: &ScanReport,
        format: ReportFormat,
        output_path: P,
    ) -> Result<()> {
        let content = self.generate_report(report, format)?;
        std::fs::write(&output_path, content)?;
        tracing::info!(
            "Generated {} report: {}",
            format,
            output_path.as_ref().display()
        );
        Ok(())
    }
}

impl Default for ReportManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::scanner::{ScanConfig, Scanner};

    #[test]
    fn test_report_format_parsing() {
        assert_eq!("json".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!("TEXT".parse::<ReportFormat>().unwrap(), ReportFormat::Text);
        assert!("sarif".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_min_severity_filter() {
        let config = ReportConfig {
            min_severity: Some(Severity::Warning),
            ..ReportConfig::default()
        };
        let error = Diagnostic::at_line(DiagnosticKind::IncludeNotFound, "a.dxl", 1, "x.inc");
        let info = Diagnostic::at_line(DiagnosticKind::SystemCall, "a.dxl", 2, "system(x)");
        assert!(config.accepts(&error));
        assert!(!config.accepts(&info));
        assert!(ReportConfig::default().accepts(&info));
    }

    #[test]
    fn test_save_report_writes_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let report = Scanner::new(ScanConfig::default()).scan(&[]);

        ReportManager::new()
            .save_report(&report, ReportFormat::Json, &path)
            .unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value.is_object());
    }
}
