/*!
# Issue Detector

The fixed rule set applied to classifier, resolver and function-table output.

Per-file checks run in a fixed order: includes, string initialisation,
system calls, pragmas. Duplicate filenames are checked per file against the
candidate list. The corpus checks (unused and redeclared functions,
identical content) run once every file has been scanned.
*/

use std::path::Path;

use crate::analyzer::{Classification, ContentIndex, CorpusTables, FilenameIndex, FunctionTable};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticLocation, RelatedLocation};
use crate::resolver::ResolvedInclude;

use super::config::RulesConfig;

/// Pragma inserted when a file with includes has none.
pub const DEFAULT_PRAGMA: &str = "pragma runLim, 0";

/// Everything the per-file checks look at.
#[derive(Debug, Clone, Copy)]
pub struct FileAnalysis<'a> {
    pub path: &'a Path,
    pub classification: &'a Classification,
    pub includes: &'a [ResolvedInclude],
}

#[derive(Debug, Clone, Default)]
pub struct IssueDetector {
    rules: RulesConfig,
}

impl IssueDetector {
    pub fn new(rules: RulesConfig) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    fn emit(&self, out: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
        if let Some(diagnostic) = self.rules.apply(diagnostic) {
            out.push(diagnostic);
        }
    }

    /// Include, string-initialisation, system-call and pragma checks.
    pub fn check_file(&self, file: &FileAnalysis<'_>) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        self.check_includes(file, &mut out);
        self.check_string_inits(file, &mut out);
        self.check_system_calls(file, &mut out);
        self.check_pragmas(file, &mut out);
        out
    }

    fn check_includes(&self, file: &FileAnalysis<'_>, out: &mut Vec<Diagnostic>) {
        for include in file.includes.iter().filter(|i| i.is_not_found()) {
            self.emit(
                out,
                Diagnostic::at_line(
                    DiagnosticKind::IncludeNotFound,
                    file.path,
                    include.line,
                    include.raw_path.as_str(),
                ),
            );
        }

        for include in file.includes {
            let Some(resolved) = &include.resolved_path else {
                continue;
            };
            let subject = resolved.to_string_lossy().into_owned();
            if include.malformed {
                self.emit(
                    out,
                    Diagnostic::at_line(
                        DiagnosticKind::MalformedIncludePath,
                        file.path,
                        include.line,
                        subject.as_str(),
                    ),
                );
            }
            if !include.legal {
                self.emit(
                    out,
                    Diagnostic::at_line(
                        DiagnosticKind::IllegalIncludePath,
                        file.path,
                        include.line,
                        subject.as_str(),
                    )
                    .with_message(format!("Illegal path ({} root)", include.root_kind)),
                );
            }
        }
    }

    fn check_string_inits(&self, file: &FileAnalysis<'_>, out: &mut Vec<Diagnostic>) {
        let classification = file.classification;
        for init in classification.string_inits.iter().filter(|o| o.text == "null") {
            self.emit(
                out,
                Diagnostic::at_line(DiagnosticKind::NullStringInit, file.path, init.line, "null")
                    .with_suggestion("\"\""),
            );
        }
        for init in &classification.loop_string_inits {
            self.emit(
                out,
                Diagnostic::at_line(
                    DiagnosticKind::StringInitInLoop,
                    file.path,
                    init.line,
                    init.text.trim(),
                ),
            );
        }
    }

    fn check_system_calls(&self, file: &FileAnalysis<'_>, out: &mut Vec<Diagnostic>) {
        for call in &file.classification.system_calls {
            self.emit(
                out,
                Diagnostic::at_line(
                    DiagnosticKind::SystemCall,
                    file.path,
                    call.line,
                    call.text.as_str(),
                ),
            );
        }
    }

    fn check_pragmas(&self, file: &FileAnalysis<'_>, out: &mut Vec<Diagnostic>) {
        let classification = file.classification;
        let first_include = classification.includes.first_line();
        let last_pragma = classification.last_pragma_line();

        match (first_include, last_pragma) {
            (Some(include_line), Some(pragma_line)) if pragma_line > include_line => {
                let subject = classification
                    .pragmas
                    .iter()
                    .rev()
                    .find(|p| p.line == pragma_line)
                    .map(|p| p.text.clone())
                    .unwrap_or_default();
                self.emit(
                    out,
                    Diagnostic::at_line(
                        DiagnosticKind::PragmaAfterInclude,
                        file.path,
                        pragma_line,
                        subject,
                    )
                    .with_suggestion(format!("move it above the include on line {}", include_line)),
                );
            }
            (Some(include_line), None) => {
                self.emit(
                    out,
                    Diagnostic::at_line(
                        DiagnosticKind::PragmaMissing,
                        file.path,
                        include_line,
                        DEFAULT_PRAGMA,
                    )
                    .with_suggestion(DEFAULT_PRAGMA),
                );
            }
            _ => {}
        }

        for pragma in &classification.pragmas {
            if pragma.text.contains("xflags") {
                self.emit(
                    out,
                    Diagnostic::at_line(
                        DiagnosticKind::ForbiddenPragma,
                        file.path,
                        pragma.line,
                        pragma.text.as_str(),
                    ),
                );
            } else if pragma.text.contains("runLim") {
                if let Some(limit) = pragma_argument(&pragma.text) {
                    if limit != 0 {
                        self.emit(
                            out,
                            Diagnostic::at_line(
                                DiagnosticKind::NonZeroRunLimit,
                                file.path,
                                pragma.line,
                                pragma.text.as_str(),
                            )
                            .with_suggestion(DEFAULT_PRAGMA),
                        );
                    }
                }
            }
        }
    }

    /// "Same filename" against every other candidate sharing the basename.
    pub fn check_duplicate_filename(&self, path: &Path, index: &FilenameIndex) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for other in index.others(path) {
            self.emit(
                &mut out,
                Diagnostic::for_file(DiagnosticKind::DuplicateFilename, path)
                    .with_related([RelatedLocation::file(other)])
                    .with_message(format!("Same filename as {}", other.display())),
            );
        }
        out
    }

    /// Checks that need the whole corpus.
    pub fn check_corpus(&self, tables: &CorpusTables) -> Vec<Diagnostic> {
        let mut out = self.check_never_called(&tables.functions);
        out.extend(self.check_redeclared(&tables.functions));
        out.extend(self.check_duplicate_content(&tables.contents));
        out
    }

    pub fn check_never_called(&self, functions: &FunctionTable) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for record in functions.never_called() {
            let Some(first) = record.declared_lines.first() else {
                continue;
            };
            let related = record
                .declared_lines
                .iter()
                .skip(1)
                .map(|site| RelatedLocation::line(&site.file, site.line));
            self.emit(
                &mut out,
                Diagnostic::at_line(
                    DiagnosticKind::DeclaredNeverCalled,
                    &first.file,
                    first.line,
                    record.name.as_str(),
                )
                .with_related(related),
            );
        }
        out
    }

    /// One diagnostic per name, attached to the file of its first declaration.
    pub fn check_redeclared(&self, functions: &FunctionTable) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for record in functions.duplicates() {
            let Some(first) = record.declared_lines.first() else {
                continue;
            };
            let lines_in_file: Vec<usize> = record
                .declared_lines
                .iter()
                .filter(|site| site.file == first.file)
                .map(|site| site.line)
                .collect();
            let related = record
                .declared_lines
                .iter()
                .map(|site| RelatedLocation::line(&site.file, site.line));
            self.emit(
                &mut out,
                Diagnostic::new(
                    DiagnosticKind::DuplicateDeclaration,
                    &first.file,
                    DiagnosticLocation::Lines(lines_in_file),
                    record.name.as_str(),
                )
                .with_related(related),
            );
        }
        out
    }

    pub fn check_duplicate_content(&self, contents: &ContentIndex) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for (path, others) in contents.duplicates() {
            self.emit(
                &mut out,
                Diagnostic::for_file(DiagnosticKind::DuplicateContent, path)
                    .with_related(others.into_iter().map(RelatedLocation::file)),
            );
        }
        out
    }
}

/// Numeric argument of `pragma key, N`. `None` when absent or not a number.
fn pragma_argument(text: &str) -> Option<i64> {
    let (_, arg) = text.split_once(',')?;
    arg.trim().parse().ok()
}

/// Runs every check over a finished corpus: per-file checks in file order,
/// then the corpus checks.
pub fn detect_issues(
    files: &[FileAnalysis<'_>],
    tables: &CorpusTables,
    rules: &RulesConfig,
) -> Vec<Diagnostic> {
    let detector = IssueDetector::new(rules.clone());
    let mut out = Vec::new();
    for file in files {
        out.extend(detector.check_file(file));
        out.extend(detector.check_duplicate_filename(file.path, &tables.filenames));
    }
    out.extend(detector.check_corpus(tables));
    out
}
