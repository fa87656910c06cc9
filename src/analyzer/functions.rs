//! Corpus-wide function tables: declarations from the whole-text pass,
//! calls from classified tokens.
//!
//! Both tables only grow. Questions about them ("declared twice?",
//! "never called?") are meaningful only once every file has been added.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use super::classifier::Occurrence;

/// A line in a specific file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSite {
    pub file: PathBuf,
    pub line: usize,
}

impl SourceSite {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,
    /// Every declaration in the order it was added; repeats are kept.
    pub declared_lines: Vec<SourceSite>,
    pub call_sites: Vec<SourceSite>,
}

impl FunctionRecord {
    pub fn is_redeclared(&self) -> bool {
        self.declared_lines.len() > 1
    }

    pub fn is_called(&self) -> bool {
        !self.call_sites.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    declarations: BTreeMap<String, Vec<SourceSite>>,
    calls: HashMap<String, Vec<SourceSite>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the result of [`extract_declarations`](crate::parser::extract_declarations)
    /// for one file.
    pub fn add_declarations(&mut self, file: &Path, declarations: &BTreeMap<String, Vec<usize>>) {
        for (name, lines) in declarations {
            let sites = self.declarations.entry(name.clone()).or_default();
            sites.extend(lines.iter().map(|&line| SourceSite::new(file, line)));
        }
    }

    /// Adds the classified calls of one file.
    pub fn add_calls(&mut self, file: &Path, calls: &[Occurrence]) {
        for call in calls {
            self.calls
                .entry(call.text.clone())
                .or_default()
                .push(SourceSite::new(file, call.line));
        }
    }

    pub fn record(&self, name: &str) -> Option<FunctionRecord> {
        self.declarations.get(name).map(|sites| FunctionRecord {
            name: name.to_string(),
            declared_lines: sites.clone(),
            call_sites: self.calls.get(name).cloned().unwrap_or_default(),
        })
    }

    /// One record per declared name, sorted by name.
    pub fn records(&self) -> Vec<FunctionRecord> {
        self.declarations
            .keys()
            .filter_map(|name| self.record(name))
            .collect()
    }

    /// Names declared more than once across the corpus.
    pub fn duplicates(&self) -> Vec<FunctionRecord> {
        self.records()
            .into_iter()
            .filter(FunctionRecord::is_redeclared)
            .collect()
    }

    /// Declared names with no call anywhere in the corpus.
    pub fn never_called(&self) -> Vec<FunctionRecord> {
        self.records()
            .into_iter()
            .filter(|r| !r.is_called())
            .collect()
    }

    pub fn is_called(&self, name: &str) -> bool {
        self.calls.contains_key(name)
    }

    pub fn declared_count(&self) -> usize {
        self.declarations.len()
    }

    pub fn call_count(&self) -> usize {
        self.calls.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decls(entries: &[(&str, &[usize])]) -> BTreeMap<String, Vec<usize>> {
        entries
            .iter()
            .map(|(name, lines)| (name.to_string(), lines.to_vec()))
            .collect()
    }

    #[test]
    fn test_duplicates_across_files() {
        let mut table = FunctionTable::new();
        table.add_declarations(Path::new("a.dxl"), &decls(&[("foo", &[3]), ("bar", &[9])]));
        assert!(table.duplicates().is_empty());

        table.add_declarations(Path::new("b.dxl"), &decls(&[("foo", &[12])]));
        let dups = table.duplicates();
        assert_eq!(dups.len(), 1);
        assert_eq!(
            dups[0].declared_lines,
            vec![SourceSite::new("a.dxl", 3), SourceSite::new("b.dxl", 12)]
        );
    }

    #[test]
    fn test_duplicate_within_one_file() {
        let mut table = FunctionTable::new();
        table.add_declarations(Path::new("a.dxl"), &decls(&[("foo", &[3, 20, 41])]));
        let dups = table.duplicates();
        assert_eq!(dups[0].declared_lines.len(), 3);
    }

    #[test]
    fn test_never_called_uses_whole_corpus() {
        let mut table = FunctionTable::new();
        table.add_declarations(Path::new("lib.inc"), &decls(&[("helper", &[1]), ("unused", &[5])]));
        table.add_calls(Path::new("lib.inc"), &[]);

        let names: Vec<String> = table.never_called().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["helper".to_string(), "unused".to_string()]);

        table.add_calls(Path::new("main.dxl"), &[Occurrence::new("helper", 7)]);
        let names: Vec<String> = table.never_called().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["unused".to_string()]);
        assert_eq!(table.record("helper").unwrap().call_sites, vec![SourceSite::new("main.dxl", 7)]);
    }

    #[test]
    fn test_counts() {
        let mut table = FunctionTable::new();
        table.add_declarations(Path::new("a.dxl"), &decls(&[("f", &[1, 2])]));
        table.add_calls(Path::new("a.dxl"), &[Occurrence::new("g", 3), Occurrence::new("g", 4)]);
        assert_eq!(table.declared_count(), 1);
        assert_eq!(table.call_count(), 2);
        assert!(table.is_called("g"));
        assert!(table.record("g").is_none());
    }
}
