/*!
# Scan configuration

Roots, limits and rule settings for a batch scan, loaded from TOML or YAML.

```toml
max_file_size = 500000
extensions = ["dxl"]

[roots]
primary = ["D:/dxl/project"]
secondary = ["D:/dxl/addins"]
fallback_library = "D:/AppX64/IBM/Rational/DOORS/9.6/lib/dxl"
display_only = ["R:/"]

[rules.DXL030]
enabled = false
```
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::DEFAULT_MAX_FILE_SIZE;
use crate::resolver::{SearchRoots, DEFAULT_ALLOW_PREFIXES};
use crate::rules::{RuleConfig, RulesConfig};

/// Library directory of a default host tool installation.
pub const DEFAULT_FALLBACK_LIBRARY: &str = "D:/AppX64/IBM/Rational/DOORS/9.6/lib/dxl";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootsConfig {
    /// First include search root group.
    #[serde(default)]
    pub primary: Vec<PathBuf>,
    /// Second include search root group.
    #[serde(default)]
    pub secondary: Vec<PathBuf>,
    /// Directories whose files are always executable by the host tool.
    #[serde(default)]
    pub extra: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_library: Option<PathBuf>,
    #[serde(default)]
    pub display_only: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Unresolved include paths starting with one of these are not reported.
    #[serde(default = "default_allow_prefixes")]
    pub unresolved_allow_prefixes: Vec<String>,

    #[serde(default)]
    pub roots: RootsConfig,

    /// Per-rule settings keyed by diagnostic code.
    #[serde(default = "default_rules")]
    pub rules: BTreeMap<String, RuleConfig>,
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_extensions() -> Vec<String> {
    vec!["dxl".to_string()]
}

fn default_allow_prefixes() -> Vec<String> {
    DEFAULT_ALLOW_PREFIXES.iter().map(|s| s.to_string()).collect()
}

fn default_rules() -> BTreeMap<String, RuleConfig> {
    RulesConfig::default().rules
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            extensions: default_extensions(),
            unresolved_allow_prefixes: default_allow_prefixes(),
            roots: RootsConfig::default(),
            rules: default_rules(),
        }
    }
}

impl ScanConfig {
    /// Configuration written by `config init`.
    pub fn example() -> Self {
        Self {
            roots: RootsConfig {
                primary: vec![PathBuf::from("project")],
                secondary: vec![PathBuf::from("addins")],
                extra: Vec::new(),
                fallback_library: Some(PathBuf::from(DEFAULT_FALLBACK_LIBRARY)),
                display_only: Vec::new(),
            },
            ..Self::default()
        }
    }

    /// Loads a TOML or YAML file, chosen by extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scan config from {}", path.display()))?;

        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config from {}", path.display()))?,
            _ => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config from {}", path.display()))?,
        };

        for warning in config.rules_config().validate() {
            tracing::warn!("{}", warning);
        }
        Ok(config)
    }

    /// The rule table as a [`RulesConfig`].
    pub fn rules_config(&self) -> RulesConfig {
        RulesConfig {
            rules: self.rules.clone(),
            ..RulesConfig::default()
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize scan config to TOML")?;
        std::fs::write(&path, content).with_context(|| {
            format!("Failed to write scan config to {}", path.as_ref().display())
        })?;
        Ok(())
    }

    /// Whether `path` has one of the configured extensions.
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    /// Include search roots. Directories that do not exist are dropped with
    /// a warning.
    pub fn search_roots(&self) -> SearchRoots {
        let existing = |dirs: &[PathBuf]| -> Vec<PathBuf> {
            dirs.iter()
                .filter(|dir| {
                    let ok = dir.is_dir();
                    if !ok {
                        tracing::warn!("Root directory not found: {}", dir.display());
                    }
                    ok
                })
                .cloned()
                .collect()
        };

        let fallback_library = self
            .roots
            .fallback_library
            .clone()
            .filter(|dir| dir.is_dir());
        if fallback_library.is_none() {
            if let Some(dir) = &self.roots.fallback_library {
                tracing::debug!("Fallback library not available: {}", dir.display());
            }
        }

        SearchRoots {
            ordered: vec![existing(&self.roots.primary), existing(&self.roots.secondary)],
            fallback_library,
            display_only: self.roots.display_only.clone(),
            allow_prefixes: self.unresolved_allow_prefixes.clone(),
        }
    }

    /// Directories walked for candidate files when no explicit list is given.
    pub fn candidate_roots(&self) -> Vec<PathBuf> {
        self.roots
            .primary
            .iter()
            .chain(self.roots.secondary.iter())
            .chain(self.roots.extra.iter())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.max_file_size, 500_000);
        assert_eq!(config.extensions, vec!["dxl".to_string()]);
        assert_eq!(config.unresolved_allow_prefixes.len(), 3);
        assert!(config.accepts(Path::new("a/b.DXL")));
        assert!(!config.accepts(Path::new("a/b.inc")));
        assert!(!config.accepts(Path::new("a/noext")));
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "extensions = [\"dxl\", \"inc\"]\n[roots]\nprimary = [\"p\"]\n[rules.DXL030]\nenabled = false"
        )
        .unwrap();

        let config = ScanConfig::load(file.path()).unwrap();
        assert_eq!(config.max_file_size, 500_000);
        assert_eq!(config.roots.primary, vec![PathBuf::from("p")]);
        assert!(config.accepts(Path::new("x.inc")));
        let rules = config.rules_config();
        assert!(!rules.is_enabled(crate::diagnostics::DiagnosticKind::SystemCall));
        assert!(rules.is_enabled(crate::diagnostics::DiagnosticKind::IncludeNotFound));
    }

    #[test]
    fn test_save_and_load() {
        let config = ScanConfig::example();
        let file = NamedTempFile::new().unwrap();
        config.save_to_file(file.path()).unwrap();
        assert_eq!(ScanConfig::load(file.path()).unwrap(), config);
    }

    #[test]
    fn test_missing_roots_are_dropped() {
        let tmp = TempDir::new().unwrap();
        let mut config = ScanConfig::default();
        config.roots.primary = vec![tmp.path().to_path_buf(), tmp.path().join("missing")];
        config.roots.fallback_library = Some(tmp.path().join("nolib"));

        let roots = config.search_roots();
        assert_eq!(roots.ordered[0], vec![tmp.path().to_path_buf()]);
        assert!(roots.ordered[1].is_empty());
        assert_eq!(roots.fallback_library, None);
    }
}
