/*!
# Include Resolver

Resolves the raw target of an include directive to at most one file on disk
and classifies the root it was found under.

Resolution is a single hop: the resolver never opens the included file.
Given the same roots and the same file system it always returns the same
answer.

Search order for a relative path:

1. every directory of every root group, in the order given (group 0 is the
   primary root, group 1 the secondary root, later groups are other roots);
2. the fallback library directory.

Absolute paths are accepted when they exist and classified by the root
group that contains them.
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Prefixes of include targets that are placeholders expanded by the host
/// tool at run time and so never resolve on disk.
pub const DEFAULT_ALLOW_PREFIXES: &[&str] = &["utils", "%%Path%%", "%%templatePath%%"];

/// The root an include was resolved under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RootKind {
    PrimaryRoot,
    SecondaryRoot,
    /// Any root group after the second, or no configured root at all.
    OtherRoot,
    FallbackLibraryRoot,
    /// Linkable for reports but not a legal include location.
    DisplayOnlyRoot,
    Unresolved,
}

impl RootKind {
    pub fn is_legal(&self) -> bool {
        matches!(
            self,
            RootKind::PrimaryRoot | RootKind::SecondaryRoot | RootKind::FallbackLibraryRoot
        )
    }

    /// Resolved files that reports may link to and that get scanned.
    pub fn is_linkable(&self) -> bool {
        self.is_legal() || *self == RootKind::DisplayOnlyRoot
    }

    fn from_group(index: usize) -> Self {
        match index {
            0 => RootKind::PrimaryRoot,
            1 => RootKind::SecondaryRoot,
            _ => RootKind::OtherRoot,
        }
    }
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RootKind::PrimaryRoot => "primary",
            RootKind::SecondaryRoot => "secondary",
            RootKind::OtherRoot => "other",
            RootKind::FallbackLibraryRoot => "fallback library",
            RootKind::DisplayOnlyRoot => "display only",
            RootKind::Unresolved => "unresolved",
        };
        f.write_str(name)
    }
}

/// Ordered search roots for include resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRoots {
    /// Root groups in priority order; each group is a list of directories.
    pub ordered: Vec<Vec<PathBuf>>,
    pub fallback_library: Option<PathBuf>,
    pub display_only: Vec<PathBuf>,
    pub allow_prefixes: Vec<String>,
}

impl Default for SearchRoots {
    fn default() -> Self {
        Self {
            ordered: Vec::new(),
            fallback_library: None,
            display_only: Vec::new(),
            allow_prefixes: DEFAULT_ALLOW_PREFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SearchRoots {
    pub fn new(ordered: Vec<Vec<PathBuf>>) -> Self {
        Self {
            ordered,
            ..Self::default()
        }
    }

    pub fn with_fallback_library(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_library = Some(dir.into());
        self
    }

    pub fn with_display_only(mut self, dir: impl Into<PathBuf>) -> Self {
        self.display_only.push(dir.into());
        self
    }

    pub fn is_allow_listed(&self, raw_path: &str) -> bool {
        self.allow_prefixes
            .iter()
            .any(|prefix| raw_path.starts_with(prefix.as_str()))
    }

    /// Kind of an already resolved path, by the roots that contain it.
    pub fn classify_path(&self, path: &Path) -> RootKind {
        if self.display_only.iter().any(|dir| path.starts_with(dir)) {
            return RootKind::DisplayOnlyRoot;
        }
        if let Some(index) = self
            .ordered
            .iter()
            .position(|group| group.iter().any(|dir| path.starts_with(dir)))
        {
            return RootKind::from_group(index);
        }
        match &self.fallback_library {
            Some(dir) if path.starts_with(dir) => RootKind::FallbackLibraryRoot,
            _ => RootKind::OtherRoot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInclude {
    pub raw_path: String,
    pub line: usize,
    pub resolved_path: Option<PathBuf>,
    pub root_kind: RootKind,
    pub legal: bool,
    /// The resolved path contains a doubled separator.
    pub malformed: bool,
    /// Unresolved, but the raw path is a known placeholder.
    pub allow_listed: bool,
}

impl ResolvedInclude {
    pub fn is_resolved(&self) -> bool {
        self.resolved_path.is_some()
    }

    /// Unresolved and not excused by the allow-list.
    pub fn is_not_found(&self) -> bool {
        !self.is_resolved() && !self.allow_listed
    }

    pub fn is_linkable(&self) -> bool {
        self.is_resolved() && self.root_kind.is_linkable()
    }
}

/// Resolves one include target.
pub fn resolve_include(raw_path: &str, line: usize, roots: &SearchRoots) -> ResolvedInclude {
    let relative = normalize_separators(raw_path.strip_prefix('\\').unwrap_or(raw_path));
    let candidate = Path::new(&relative);

    let found = if candidate.is_absolute() {
        candidate
            .exists()
            .then(|| (candidate.to_path_buf(), roots.classify_path(candidate)))
    } else {
        search_roots(candidate, roots)
    };

    let result = match found {
        Some((path, kind)) => {
            let kind = if roots.display_only.iter().any(|dir| path.starts_with(dir)) {
                RootKind::DisplayOnlyRoot
            } else {
                kind
            };
            ResolvedInclude {
                raw_path: raw_path.to_string(),
                line,
                malformed: has_doubled_separator(&path),
                legal: kind.is_legal(),
                root_kind: kind,
                resolved_path: Some(path),
                allow_listed: false,
            }
        }
        None => ResolvedInclude {
            raw_path: raw_path.to_string(),
            line,
            resolved_path: None,
            root_kind: RootKind::Unresolved,
            legal: false,
            malformed: false,
            allow_listed: roots.is_allow_listed(raw_path),
        },
    };

    tracing::trace!(
        raw = raw_path,
        kind = %result.root_kind,
        "include resolved"
    );
    result
}

fn search_roots(relative: &Path, roots: &SearchRoots) -> Option<(PathBuf, RootKind)> {
    for (index, group) in roots.ordered.iter().enumerate() {
        for dir in group {
            let path = dir.join(relative);
            if path.exists() {
                return Some((path, RootKind::from_group(index)));
            }
        }
    }

    let library = roots.fallback_library.as_ref()?;
    let path = library.join(relative);
    path.exists()
        .then_some((path, RootKind::FallbackLibraryRoot))
}

/// Include targets are written with Windows separators; elsewhere they are
/// read with `/`.
fn normalize_separators(path: &str) -> String {
    if cfg!(windows) {
        path.to_string()
    } else {
        path.replace('\\', "/")
    }
}

fn has_doubled_separator(path: &Path) -> bool {
    let text = path.to_string_lossy();
    text.contains("\\\\") || text.contains("//")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        primary: PathBuf,
        secondary: PathBuf,
        library: PathBuf,
        display: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let make = |name: &str| {
                let dir = tmp.path().join(name);
                fs::create_dir_all(&dir).unwrap();
                dir
            };
            let primary = make("project");
            let secondary = make("addins");
            let library = make("lib");
            let display = make("readonly");
            Self {
                _tmp: tmp,
                primary,
                secondary,
                library,
                display,
            }
        }

        fn roots(&self) -> SearchRoots {
            SearchRoots::new(vec![vec![self.primary.clone()], vec![self.secondary.clone()]])
                .with_fallback_library(&self.library)
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "// include\n").unwrap();
    }

    #[test]
    fn test_primary_wins_over_secondary() {
        let fx = Fixture::new();
        touch(&fx.primary.join("foo.inc"));
        touch(&fx.secondary.join("foo.inc"));

        let r = resolve_include("foo.inc", 4, &fx.roots());
        assert_eq!(r.root_kind, RootKind::PrimaryRoot);
        assert_eq!(r.resolved_path, Some(fx.primary.join("foo.inc")));
        assert!(r.legal);
        assert_eq!(r.line, 4);
    }

    #[test]
    fn test_secondary_root() {
        let fx = Fixture::new();
        touch(&fx.secondary.join("foo.inc"));

        let r = resolve_include("foo.inc", 1, &fx.roots());
        assert_eq!(r.root_kind, RootKind::SecondaryRoot);
        assert!(r.legal);
        assert!(!r.malformed);
    }

    #[test]
    fn test_fallback_library() {
        let fx = Fixture::new();
        touch(&fx.library.join("standard/a.inc"));

        let r = resolve_include("standard/a.inc", 1, &fx.roots());
        assert_eq!(r.root_kind, RootKind::FallbackLibraryRoot);
        assert!(r.legal);
    }

    #[test]
    fn test_leading_backslash_and_windows_separators() {
        let fx = Fixture::new();
        touch(&fx.primary.join("sub/foo.inc"));

        let r = resolve_include("\\sub\\foo.inc", 1, &fx.roots());
        assert_eq!(r.root_kind, RootKind::PrimaryRoot);
        assert_eq!(r.raw_path, "\\sub\\foo.inc");
    }

    #[test]
    fn test_unresolved_and_allow_listed() {
        let fx = Fixture::new();
        let missing = resolve_include("missing.inc", 2, &fx.roots());
        assert_eq!(missing.root_kind, RootKind::Unresolved);
        assert!(missing.is_not_found());
        assert!(!missing.legal);

        let placeholder = resolve_include("%%Path%%/x.inc", 3, &fx.roots());
        assert!(placeholder.allow_listed);
        assert!(!placeholder.is_not_found());
    }

    #[test]
    fn test_third_group_is_illegal() {
        let fx = Fixture::new();
        let other = fx._tmp.path().join("other");
        touch(&other.join("x.inc"));
        let mut roots = fx.roots();
        roots.ordered.push(vec![other]);

        let r = resolve_include("x.inc", 1, &roots);
        assert_eq!(r.root_kind, RootKind::OtherRoot);
        assert!(!r.legal);
        assert!(!r.is_linkable());
    }

    #[test]
    fn test_display_only_root_is_linkable_but_illegal() {
        let fx = Fixture::new();
        touch(&fx.display.join("x.inc"));
        let roots = fx.roots().with_display_only(&fx.display);
        let mut roots = roots;
        roots.ordered.push(vec![fx.display.clone()]);

        let r = resolve_include("x.inc", 1, &roots);
        assert_eq!(r.root_kind, RootKind::DisplayOnlyRoot);
        assert!(!r.legal);
        assert!(r.is_linkable());
    }

    #[test]
    fn test_absolute_path() {
        let fx = Fixture::new();
        let inside = fx.secondary.join("abs.inc");
        touch(&inside);
        let r = resolve_include(&inside.to_string_lossy(), 1, &fx.roots());
        assert_eq!(r.root_kind, RootKind::SecondaryRoot);
        assert!(r.legal);

        let outside = fx._tmp.path().join("elsewhere/abs.inc");
        touch(&outside);
        let r = resolve_include(&outside.to_string_lossy(), 1, &fx.roots());
        assert_eq!(r.root_kind, RootKind::OtherRoot);
        assert!(!r.legal);

        let gone = fx._tmp.path().join("nope.inc");
        let r = resolve_include(&gone.to_string_lossy(), 1, &fx.roots());
        assert_eq!(r.root_kind, RootKind::Unresolved);
    }

    #[test]
    fn test_doubled_separator_is_malformed() {
        let fx = Fixture::new();
        touch(&fx.primary.join("sub/foo.inc"));

        let r = resolve_include("sub\\\\foo.inc", 1, &fx.roots());
        assert!(r.is_resolved());
        assert!(r.malformed);
        assert!(r.legal);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let fx = Fixture::new();
        touch(&fx.secondary.join("foo.inc"));
        let roots = fx.roots();
        assert_eq!(
            resolve_include("foo.inc", 1, &roots),
            resolve_include("foo.inc", 1, &roots)
        );
    }
}
