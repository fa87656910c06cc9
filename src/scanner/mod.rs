/*!
# Batch scanner

Drives the per-file pipeline over a list of candidate files and collects the
cross-file tables the corpus checks need.

For every candidate, in order:

1. size check (oversize files stop here with a single diagnostic)
2. read and decode
3. tokenize and classify
4. resolve the include directives
5. per-file checks (includes, string initialisation, system calls, pragmas)
6. duplicate-filename check against the candidate list
7. declarations and calls into the function table, content into the hash index

Resolved include files that are not candidates themselves get the per-file
checks once, right after the first file that pulls them in. Their own
includes are resolved but not followed.

```rust,no_run
use dxl_analyzer::scanner::{ScanConfig, Scanner};

let scanner = Scanner::new(ScanConfig::default());
let candidates = scanner.collect_from(&["scripts".into()]);
let report = scanner.scan(&candidates);
println!("{} issues", report.diagnostics.len());
```
*/

pub mod config;
pub mod hashing;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::analyzer::{classify, Classification, CorpusTables, FilenameIndex};
use crate::core::{check_size, read_dxl_file, LineIndex, ScanError};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Severity};
use crate::parser::{extract_declarations, Lexer, Token, TokenStats};
use crate::resolver::{resolve_include, ResolvedInclude, SearchRoots};
use crate::rules::{FileAnalysis, IssueDetector};

pub use config::{RootsConfig, ScanConfig, DEFAULT_FALLBACK_LIBRARY};
pub use hashing::{ContentHasher, Sha1Hasher};

/// How far a file got through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Candidate file, every check applied.
    Scanned,
    /// Reached through an include, per-file checks only.
    Included,
    Oversize,
    Unreadable,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    /// Meant to be run directly by the host tool.
    pub executable: bool,
    pub lines: usize,
    pub token_stats: TokenStats,
    /// Characters the tokenizer could not match.
    pub skipped_chars: usize,
    pub includes: Vec<ResolvedInclude>,
    pub declarations: BTreeMap<String, Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl FileReport {
    fn failed(path: &Path, status: FileStatus) -> Self {
        Self {
            path: path.to_path_buf(),
            status,
            executable: false,
            lines: 0,
            token_stats: TokenStats::default(),
            skipped_chars: 0,
            includes: Vec::new(),
            declarations: BTreeMap::new(),
            hash: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStats {
    pub files_scanned: usize,
    pub files_included: usize,
    pub files_failed: usize,
    pub executable_files: usize,
    pub total_lines: usize,
    pub functions_declared: usize,
    pub function_calls: usize,
    pub includes: usize,
    pub unresolved_includes: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub hints: usize,
    pub tokens: TokenStats,
}

impl ScanStats {
    pub fn total_issues(&self) -> usize {
        self.errors + self.warnings + self.infos + self.hints
    }
}

/// Result of one scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub files: Vec<FileReport>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: ScanStats,
    /// Resolved include file -> files including it.
    pub dependencies: BTreeMap<PathBuf, Vec<PathBuf>>,
}

impl ScanReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn diagnostics_for<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.file == path)
    }

    pub fn file(&self, path: &Path) -> Option<&FileReport> {
        self.files.iter().find(|f| f.path == path)
    }
}

pub struct Scanner<H: ContentHasher = Sha1Hasher> {
    config: ScanConfig,
    roots: SearchRoots,
    detector: IssueDetector,
    hasher: H,
}

impl Scanner<Sha1Hasher> {
    pub fn new(config: ScanConfig) -> Self {
        Self::with_hasher(config, Sha1Hasher)
    }
}

impl<H: ContentHasher> Scanner<H> {
    pub fn with_hasher(config: ScanConfig, hasher: H) -> Self {
        let roots = config.search_roots();
        let detector = IssueDetector::new(config.rules_config());
        Self {
            config,
            roots,
            detector,
            hasher,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn roots(&self) -> &SearchRoots {
        &self.roots
    }

    /// Candidate files under the configured roots.
    pub fn collect_candidates(&self) -> Vec<PathBuf> {
        self.collect_from(&self.config.candidate_roots())
    }

    /// Candidate files from explicit paths: files are taken as given,
    /// directories are walked for files with an accepted extension.
    /// Sorted and without duplicates.
    pub fn collect_from(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for path in paths {
            if path.is_file() {
                files.push(path.clone());
                continue;
            }
            if !path.is_dir() {
                warn!("Path not found: {}", path.display());
                continue;
            }
            for entry in WalkDir::new(path).follow_links(true) {
                match entry {
                    Ok(entry) if entry.file_type().is_file() => {
                        if self.config.accepts(entry.path()) {
                            files.push(entry.into_path());
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Failed to walk {}: {}", path.display(), e),
                }
            }
        }
        files.sort();
        files.dedup();
        files
    }

    pub fn scan(&self, candidates: &[PathBuf]) -> ScanReport {
        self.scan_with_progress(candidates, |_| {})
    }

    /// Scans `candidates` in order, calling `on_file` before each one.
    pub fn scan_with_progress<F>(&self, candidates: &[PathBuf], mut on_file: F) -> ScanReport
    where
        F: FnMut(&Path),
    {
        let started_at = Utc::now();
        let start = Instant::now();
        info!("Scanning {} files", candidates.len());

        let mut session = ScanSession::new(self, candidates);
        for path in candidates {
            on_file(path);
            session.scan_candidate(path);
        }

        info!("Running corpus checks");
        let corpus = self.detector.check_corpus(&session.tables);
        session.diagnostics.extend(corpus);

        let report = session.finish(started_at, start.elapsed().as_millis() as u64);
        info!(
            "Scan finished: {} files, {} issues in {} ms",
            report.files.len(),
            report.diagnostics.len(),
            report.duration_ms
        );
        report
    }
}

/// What one pass over a readable file produced.
struct Analyzed {
    text: String,
    tokens: Vec<Token>,
    skipped: usize,
    classification: Classification,
    includes: Vec<ResolvedInclude>,
}

/// Mutable state of one running scan.
struct ScanSession<'s, H: ContentHasher> {
    scanner: &'s Scanner<H>,
    candidates: HashSet<PathBuf>,
    filenames: FilenameIndex,
    tables: CorpusTables,
    checked: HashSet<PathBuf>,
    files: Vec<FileReport>,
    diagnostics: Vec<Diagnostic>,
    dependencies: BTreeMap<PathBuf, Vec<PathBuf>>,
    sidecars: HashMap<PathBuf, Vec<String>>,
}

impl<'s, H: ContentHasher> ScanSession<'s, H> {
    fn new(scanner: &'s Scanner<H>, candidates: &[PathBuf]) -> Self {
        Self {
            scanner,
            candidates: candidates.iter().cloned().collect(),
            filenames: FilenameIndex::from_paths(candidates),
            tables: CorpusTables::new(),
            checked: HashSet::new(),
            files: Vec::new(),
            diagnostics: Vec::new(),
            dependencies: BTreeMap::new(),
            sidecars: HashMap::new(),
        }
    }

    fn scan_candidate(&mut self, path: &Path) {
        if !self.checked.insert(path.to_path_buf()) {
            return;
        }
        debug!("Scanning {}", path.display());

        let Some(analyzed) = self.analyze(path) else {
            return;
        };

        let detector = &self.scanner.detector;
        let file = FileAnalysis {
            path,
            classification: &analyzed.classification,
            includes: &analyzed.includes,
        };
        self.diagnostics.extend(detector.check_file(&file));
        self.diagnostics
            .extend(detector.check_duplicate_filename(path, &self.filenames));

        let declarations = extract_declarations(&analyzed.text);
        self.tables.functions.add_declarations(path, &declarations);
        self.tables
            .functions
            .add_calls(path, &analyzed.classification.calls);

        let pending = self.record(path, FileStatus::Scanned, analyzed, declarations);

        for include in pending {
            if !self.candidates.contains(&include) {
                self.scan_included(&include);
            }
        }
    }

    /// Per-file checks only, for a file reached through an include.
    fn scan_included(&mut self, path: &Path) {
        if !self.checked.insert(path.to_path_buf()) {
            return;
        }
        debug!("Checking included file {}", path.display());

        let Some(analyzed) = self.analyze(path) else {
            return;
        };
        let file = FileAnalysis {
            path,
            classification: &analyzed.classification,
            includes: &analyzed.includes,
        };
        self.diagnostics
            .extend(self.scanner.detector.check_file(&file));
        self.record(path, FileStatus::Included, analyzed, BTreeMap::new());
    }

    /// Size check, read, tokenize, classify, resolve. Failures become
    /// diagnostics and `None`.
    fn analyze(&mut self, path: &Path) -> Option<Analyzed> {
        let limit = self.scanner.config.max_file_size;
        let text = check_size(path, limit).and_then(|_| read_dxl_file(path));
        let text = match text {
            Ok(text) => text,
            Err(err) => {
                self.fail(path, err);
                return None;
            }
        };

        let mut lexer = Lexer::new(&text);
        let tokens: Vec<Token> = lexer.by_ref().collect();
        let skipped = lexer.skipped();
        if skipped > 0 {
            debug!("{}: skipped {} unrecognised characters", path.display(), skipped);
        }

        let classification = classify(tokens.iter().cloned());
        let includes: Vec<ResolvedInclude> = classification
            .includes
            .iter()
            .map(|directive| resolve_include(&directive.raw_path, directive.line, &self.scanner.roots))
            .collect();
        debug!(
            "{}: {} tokens, {} includes, {} calls",
            path.display(),
            tokens.len(),
            includes.len(),
            classification.calls.len()
        );

        Some(Analyzed {
            text,
            tokens,
            skipped,
            classification,
            includes,
        })
    }

    fn fail(&mut self, path: &Path, err: ScanError) {
        let (kind, status) = match &err {
            ScanError::Oversize { .. } => (DiagnosticKind::OversizeFile, FileStatus::Oversize),
            ScanError::Read { .. } => {
                warn!("{}", err);
                (DiagnosticKind::UnreadableFile, FileStatus::Unreadable)
            }
        };
        let diagnostic = Diagnostic::for_file(kind, path).with_message(err.to_string());
        if let Some(diagnostic) = self.scanner.detector.rules().apply(diagnostic) {
            self.diagnostics.push(diagnostic);
        }
        self.files.push(FileReport::failed(path, status));
    }

    /// Stores the file report and returns the linkable include targets in
    /// directive order.
    fn record(
        &mut self,
        path: &Path,
        status: FileStatus,
        analyzed: Analyzed,
        declarations: BTreeMap<String, Vec<usize>>,
    ) -> Vec<PathBuf> {
        let hash = self.scanner.hasher.hash(analyzed.text.as_bytes());
        self.tables.contents.add(path, hash.clone());

        let mut pending = Vec::new();
        for include in analyzed.includes.iter().filter(|i| i.is_linkable()) {
            let Some(target) = &include.resolved_path else {
                continue;
            };
            let dependents = self.dependencies.entry(target.clone()).or_default();
            if !dependents.iter().any(|p| p == path) {
                dependents.push(path.to_path_buf());
            }
            if !pending.contains(target) {
                pending.push(target.clone());
            }
        }

        let executable = self.is_executable(path, &analyzed.classification);
        self.files.push(FileReport {
            path: path.to_path_buf(),
            status,
            executable,
            lines: LineIndex::new(&analyzed.text).line_count(),
            token_stats: TokenStats::from_tokens(&analyzed.tokens),
            skipped_chars: analyzed.skipped,
            includes: analyzed.includes,
            declarations,
            hash: Some(hash),
        });
        pending
    }

    /// Comment marker, a directory listed as extra, or the file stem in a
    /// `.idx` file next to it.
    fn is_executable(&mut self, path: &Path, classification: &Classification) -> bool {
        if classification.executable_marker {
            return true;
        }
        if self
            .scanner
            .config
            .roots
            .extra
            .iter()
            .any(|dir| path.starts_with(dir))
        {
            return true;
        }
        let (Some(dir), Some(stem)) = (path.parent(), path.file_stem()) else {
            return false;
        };
        let stem = stem.to_string_lossy();
        self.sidecar_contents(dir)
            .iter()
            .any(|content| content.contains(&*stem))
    }

    fn sidecar_contents(&mut self, dir: &Path) -> &[String] {
        self.sidecars
            .entry(dir.to_path_buf())
            .or_insert_with(|| read_sidecars(dir))
    }

    fn finish(self, started_at: DateTime<Utc>, duration_ms: u64) -> ScanReport {
        let mut stats = ScanStats {
            functions_declared: self.tables.functions.declared_count(),
            function_calls: self.tables.functions.call_count(),
            ..ScanStats::default()
        };
        for file in &self.files {
            match file.status {
                FileStatus::Scanned => stats.files_scanned += 1,
                FileStatus::Included => stats.files_included += 1,
                FileStatus::Oversize | FileStatus::Unreadable => stats.files_failed += 1,
            }
            if file.executable {
                stats.executable_files += 1;
            }
            stats.total_lines += file.lines;
            stats.includes += file.includes.len();
            stats.unresolved_includes += file.includes.iter().filter(|i| i.is_not_found()).count();
            stats.tokens.merge(&file.token_stats);
        }
        for diagnostic in &self.diagnostics {
            match diagnostic.severity {
                Severity::Error => stats.errors += 1,
                Severity::Warning => stats.warnings += 1,
                Severity::Info => stats.infos += 1,
                Severity::Hint => stats.hints += 1,
            }
        }

        ScanReport {
            started_at,
            duration_ms,
            files: self.files,
            diagnostics: self.diagnostics,
            stats,
            dependencies: self.dependencies,
        }
    }
}

/// Contents of every `.idx` file directly inside `dir`.
fn read_sidecars(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut contents = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("idx") {
            continue;
        }
        match std::fs::read(&path) {
            Ok(bytes) => contents.push(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => warn!("Failed to read index file {}: {}", path.display(), e),
        }
    }
    contents
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn scanner_for(dir: &Path) -> Scanner {
        let mut config = ScanConfig::default();
        config.roots.primary = vec![dir.to_path_buf()];
        Scanner::new(config)
    }

    #[test]
    fn test_collect_candidates_sorted_by_extension() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b.dxl", "");
        write(tmp.path(), "a.dxl", "");
        write(tmp.path(), "lib/c.inc", "");
        write(tmp.path(), "sub/d.dxl", "");

        let scanner = scanner_for(tmp.path());
        let names: Vec<_> = scanner
            .collect_candidates()
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.dxl"),
                PathBuf::from("b.dxl"),
                PathBuf::from("sub").join("d.dxl"),
            ]
        );
    }

    #[test]
    fn test_included_file_is_checked_once() {
        let tmp = TempDir::new().unwrap();
        let lib = write(tmp.path(), "lib.inc", "string s = null\n");
        let a = write(
            tmp.path(),
            "a.dxl",
            "pragma runLim, 0\n#include <lib.inc>\n",
        );
        let b = write(
            tmp.path(),
            "b.dxl",
            "pragma runLim, 0\n#include <lib.inc>\n",
        );

        let scanner = scanner_for(tmp.path());
        let report = scanner.scan(&[a.clone(), b.clone()]);

        let lib_diags: Vec<_> = report.diagnostics_for(&lib).collect();
        assert_eq!(lib_diags.len(), 1);
        assert_eq!(lib_diags[0].kind, DiagnosticKind::NullStringInit);
        assert_eq!(report.file(&lib).unwrap().status, FileStatus::Included);
        assert_eq!(report.dependencies[&lib], vec![a, b]);
        assert_eq!(report.stats.files_scanned, 2);
        assert_eq!(report.stats.files_included, 1);
    }

    #[test]
    fn test_unreadable_file_does_not_stop_scan() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("gone.dxl");
        let ok = write(tmp.path(), "ok.dxl", "int x = 1\n");

        let report = scanner_for(tmp.path()).scan(&[missing.clone(), ok.clone()]);
        let kinds: Vec<_> = report.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::UnreadableFile]);
        assert_eq!(report.file(&missing).unwrap().status, FileStatus::Unreadable);
        assert_eq!(report.file(&ok).unwrap().status, FileStatus::Scanned);
        assert!(report.has_errors());
    }

    #[test]
    fn test_executable_from_sidecar_and_extra() {
        let tmp = TempDir::new().unwrap();
        let listed = write(tmp.path(), "menu/run.dxl", "int x\n");
        let unlisted = write(tmp.path(), "menu/helper.dxl", "int y\n");
        write(tmp.path(), "menu/menu.idx", "run Run the tool\n");
        let extra = write(tmp.path(), "tools/any.dxl", "int z\n");

        let mut config = ScanConfig::default();
        config.roots.extra = vec![tmp.path().join("tools")];
        let report = Scanner::new(config).scan(&[listed.clone(), unlisted.clone(), extra.clone()]);

        assert!(report.file(&listed).unwrap().executable);
        assert!(!report.file(&unlisted).unwrap().executable);
        assert!(report.file(&extra).unwrap().executable);
        assert_eq!(report.stats.executable_files, 2);
    }

    #[test]
    fn test_identical_content_across_files() {
        let tmp = TempDir::new().unwrap();
        let a = write(tmp.path(), "a.dxl", "int x = 1\n");
        let b = write(tmp.path(), "b.dxl", "int x = 1\n");

        let report = scanner_for(tmp.path()).scan(&[a.clone(), b.clone()]);
        let dup: Vec<_> = report
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::DuplicateContent)
            .collect();
        assert_eq!(dup.len(), 2);
        assert_eq!(dup[0].file, a);
        assert_eq!(dup[1].file, b);
        assert_eq!(report.file(&a).unwrap().hash, report.file(&b).unwrap().hash);
    }
}
