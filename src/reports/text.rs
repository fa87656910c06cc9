/*!
# Text Reporter

Console report: a summary, then the diagnostics grouped by file and, inside
each file, by category. Files keep scan order, categories keep the order of
their first diagnostic.

```text
DXL Scan Report
==================================================
Summary:
  Files scanned: 2 (1 included, 0 failed)
  Issues: 2  Errors: 1  Warnings: 1  Info: 0

scripts/main.dxl
  [include]
    3: error [DXL010] Path not found or not valid: lib/missing.inc
```
*/

use anyhow::Result;
use colored::{ColoredString, Colorize};
use std::fmt::Write;
use std::path::Path;

use super::{ReportConfig, ReportFormat, ReportGenerator};
use crate::diagnostics::{Category, Diagnostic, Severity};
use crate::scanner::ScanReport;

pub struct TextReporter {
    use_colors: bool,
}

impl TextReporter {
    pub fn new() -> Self {
        Self { use_colors: false }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.use_colors {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn severity_label(&self, severity: Severity) -> String {
        let label = severity.to_string();
        match severity {
            Severity::Error => self.paint(&label, |s| s.red().bold()),
            Severity::Warning => self.paint(&label, |s| s.yellow()),
            Severity::Info => self.paint(&label, |s| s.blue()),
            Severity::Hint => self.paint(&label, |s| s.dimmed()),
        }
    }

    fn write_header(&self, out: &mut String) -> Result<()> {
        writeln!(out, "{}", self.paint("DXL Scan Report", |s| s.bold().cyan()))?;
        writeln!(out, "{}", "=".repeat(50))?;
        Ok(())
    }

    fn write_summary(&self, out: &mut String, report: &ScanReport) -> Result<()> {
        let stats = &report.stats;
        writeln!(out, "{}", self.paint("Summary:", |s| s.bold()))?;
        writeln!(
            out,
            "  Files scanned: {} ({} included, {} failed)",
            stats.files_scanned, stats.files_included, stats.files_failed
        )?;
        writeln!(
            out,
            "  Lines: {}  Functions: {}  Calls: {}  Includes: {} ({} unresolved)",
            stats.total_lines,
            stats.functions_declared,
            stats.function_calls,
            stats.includes,
            stats.unresolved_includes
        )?;
        writeln!(
            out,
            "  Issues: {}  Errors: {}  Warnings: {}  Info: {}",
            stats.total_issues(),
            self.paint(&stats.errors.to_string(), |s| s.red()),
            self.paint(&stats.warnings.to_string(), |s| s.yellow()),
            stats.infos + stats.hints
        )?;
        writeln!(out)?;
        Ok(())
    }

    fn write_file(
        &self,
        out: &mut String,
        path: &Path,
        diagnostics: &[&Diagnostic],
        executable: bool,
    ) -> Result<()> {
        let name = path.display().to_string();
        let marker = if executable { " (executable)" } else { "" };
        writeln!(out, "{}{}", self.paint(&name, |s| s.bold()), marker)?;

        let mut categories: Vec<(Category, Vec<&Diagnostic>)> = Vec::new();
        for diagnostic in diagnostics.iter().copied() {
            let category = diagnostic.category();
            match categories.iter_mut().find(|(c, _)| *c == category) {
                Some((_, group)) => group.push(diagnostic),
                None => categories.push((category, vec![diagnostic])),
            }
        }

        for (category, group) in categories {
            writeln!(out, "  [{}]", self.paint(&category.to_string(), |s| s.cyan()))?;
            for diagnostic in group {
                let location = diagnostic.location.to_string();
                let prefix = if location.is_empty() {
                    String::new()
                } else {
                    format!("{}: ", location)
                };
                writeln!(
                    out,
                    "    {}{} [{}] {}: {}",
                    prefix,
                    self.severity_label(diagnostic.severity),
                    diagnostic.code,
                    diagnostic.message,
                    diagnostic.subject
                )?;
                for related in &diagnostic.related {
                    writeln!(out, "      {} {}", self.paint("see", |s| s.dimmed()), related)?;
                }
                if let Some(suggestion) = &diagnostic.suggestion {
                    writeln!(out, "      {} {}", self.paint("fix:", |s| s.green()), suggestion)?;
                }
            }
        }
        writeln!(out)?;
        Ok(())
    }
}

impl Default for TextReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for TextReporter {
    fn generate_report(&self, report: &ScanReport, config: &ReportConfig) -> Result<String> {
        let reporter = TextReporter::with_colors(self.use_colors || config.use_colors);
        let mut out = String::new();
        reporter.write_header(&mut out)?;
        reporter.write_summary(&mut out, report)?;

        let mut order: Vec<&Path> = report.files.iter().map(|f| f.path.as_path()).collect();
        for diagnostic in &report.diagnostics {
            if !order.contains(&diagnostic.file.as_path()) {
                order.push(diagnostic.file.as_path());
            }
        }

        for path in order {
            let diagnostics: Vec<&Diagnostic> = report
                .diagnostics_for(path)
                .filter(|d| config.accepts(d))
                .collect();
            if diagnostics.is_empty() && !config.include_clean_files {
                continue;
            }
            let executable = report.file(path).map(|f| f.executable).unwrap_or(false);
            reporter.write_file(&mut out, path, &diagnostics, executable)?;
        }

        if report.diagnostics.is_empty() {
            writeln!(out, "{}", reporter.paint("No issues found", |s| s.green()))?;
        }
        Ok(out)
    }

    fn supported_format() -> ReportFormat {
        ReportFormat::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::scanner::{ScanStats, ScanReport};
    use std::collections::BTreeMap;

    fn report(diagnostics: Vec<Diagnostic>) -> ScanReport {
        ScanReport {
            started_at: chrono::Utc::now(),
            duration_ms: 0,
            files: Vec::new(),
            diagnostics,
            stats: ScanStats::default(),
            dependencies: BTreeMap::new(),
        }
    }

    #[test]
    fn test_grouped_by_file_and_category() {
        let report = report(vec![
            Diagnostic::at_line(DiagnosticKind::IncludeNotFound, "a.dxl", 2, "x.inc"),
            Diagnostic::at_line(DiagnosticKind::SystemCall, "a.dxl", 5, "system(\"dir\")"),
            Diagnostic::at_line(DiagnosticKind::IncludeNotFound, "a.dxl", 3, "y.inc"),
            Diagnostic::at_line(DiagnosticKind::NullStringInit, "b.dxl", 1, "null"),
        ]);

        let text = TextReporter::new()
            .generate_report(&report, &ReportConfig::default())
            .unwrap();

        let a = text.find("a.dxl").unwrap();
        let b = text.find("b.dxl").unwrap();
        assert!(a < b);
        let include = text.find("[include]").unwrap();
        let system = text.find("[system]").unwrap();
        let second_include = text.find("3: error [DXL010]").unwrap();
        assert!(include < second_include && second_include < system);
        assert!(text.contains("1: warning [DXL040] Use \"\" instead of null: null"));
    }

    #[test]
    fn test_empty_report() {
        let text = TextReporter::new()
            .generate_report(&report(Vec::new()), &ReportConfig::default())
            .unwrap();
        assert!(text.contains("No issues found"));
    }
}
