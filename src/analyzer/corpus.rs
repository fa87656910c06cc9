//! Cross-file tables accumulated over a whole scan.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use super::functions::FunctionTable;

/// Candidate files grouped by basename.
#[derive(Debug, Clone, Default)]
pub struct FilenameIndex {
    by_name: BTreeMap<String, Vec<PathBuf>>,
}

impl FilenameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_paths<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> Self {
        let mut index = Self::new();
        for path in paths {
            index.add(path);
        }
        index
    }

    pub fn add(&mut self, path: &Path) {
        let Some(name) = path.file_name() else {
            return;
        };
        let entry = self
            .by_name
            .entry(name.to_string_lossy().into_owned())
            .or_default();
        if !entry.iter().any(|p| p == path) {
            entry.push(path.to_path_buf());
        }
    }

    /// Other files with the same basename as `path`.
    pub fn others(&self, path: &Path) -> Vec<&PathBuf> {
        let Some(name) = path.file_name() else {
            return Vec::new();
        };
        let name = name.to_string_lossy();
        self.by_name
            .get(&*name)
            .map(|paths| paths.iter().filter(|p| p.as_path() != path).collect())
            .unwrap_or_default()
    }

    pub fn duplicated_names(&self) -> impl Iterator<Item = (&String, &Vec<PathBuf>)> {
        self.by_name.iter().filter(|(_, paths)| paths.len() > 1)
    }
}

/// Scanned files grouped by content hash.
#[derive(Debug, Clone, Default)]
pub struct ContentIndex {
    by_hash: BTreeMap<String, Vec<PathBuf>>,
    hash_of: HashMap<PathBuf, String>,
    order: Vec<PathBuf>,
}

impl ContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the hash of a file. A path is only recorded once.
    pub fn add(&mut self, path: &Path, hash: impl Into<String>) {
        if self.hash_of.contains_key(path) {
            return;
        }
        let hash = hash.into();
        self.order.push(path.to_path_buf());
        self.hash_of.insert(path.to_path_buf(), hash.clone());
        self.by_hash.entry(hash).or_default().push(path.to_path_buf());
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.hash_of.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Each hashed path that shares its hash, with the other paths, in the
    /// order the paths were added.
    pub fn duplicates(&self) -> Vec<(&PathBuf, Vec<&PathBuf>)> {
        let mut out = Vec::new();
        for path in &self.order {
            let group = self
                .hash_of
                .get(path)
                .and_then(|hash| self.by_hash.get(hash));
            if let Some(group) = group.filter(|paths| paths.len() > 1) {
                let others = group.iter().filter(|p| *p != path).collect();
                out.push((path, others));
            }
        }
        out
    }
}

/// Everything the corpus-level checks need.
#[derive(Debug, Clone, Default)]
pub struct CorpusTables {
    pub functions: FunctionTable,
    pub filenames: FilenameIndex,
    pub contents: ContentIndex,
}

impl CorpusTables {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filename_index_others() {
        let paths = vec![
            PathBuf::from("menu/a/tool.dxl"),
            PathBuf::from("menu/b/tool.dxl"),
            PathBuf::from("menu/c/other.dxl"),
        ];
        let index = FilenameIndex::from_paths(&paths);

        assert_eq!(index.others(&paths[0]), vec![&paths[1]]);
        assert!(index.others(&paths[2]).is_empty());
        assert_eq!(index.duplicated_names().count(), 1);
    }

    #[test]
    fn test_content_duplicates() {
        let mut index = ContentIndex::new();
        index.add(Path::new("a.inc"), "h1");
        index.add(Path::new("b.inc"), "h2");
        index.add(Path::new("c.inc"), "h1");
        index.add(Path::new("a.inc"), "h1");

        let dups = index.duplicates();
        assert_eq!(dups.len(), 2);
        assert_eq!(dups[0].0, &PathBuf::from("a.inc"));
        assert_eq!(dups[0].1, vec![&PathBuf::from("c.inc")]);
        assert_eq!(dups[1].0, &PathBuf::from("c.inc"));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_content_duplicates_over_large_corpus() {
        let mut index = ContentIndex::new();
        for i in 0..20_000 {
            let path = PathBuf::from(format!("lib/f{}.inc", i));
            index.add(&path, format!("h{}", i % 10_000));
            index.add(&path, "ignored");
        }

        let dups = index.duplicates();
        assert_eq!(index.len(), 20_000);
        assert_eq!(dups.len(), 20_000);
        assert_eq!(dups[0].1, vec![&PathBuf::from("lib/f10000.inc")]);
        assert!(index.contains(Path::new("lib/f19999.inc")));
    }
}
