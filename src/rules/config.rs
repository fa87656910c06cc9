/*!
# Rules Configuration System

Per-rule `enabled` / `severity` settings keyed by diagnostic code, loaded
from TOML or YAML.

```toml
version = "1.0"

[rules.DXL030]
enabled = false

[rules.DXL041]
enabled = true
severity = "warning"
```
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Severity};

/// Configuration for a single rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Overrides the default severity of the rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_true() -> bool {
    true
}

impl RuleConfig {
    fn for_kind(kind: DiagnosticKind) -> Self {
        Self {
            enabled: kind.enabled_by_default(),
            severity: Some(kind.default_severity()),
            description: Some(kind.title().to_string()),
        }
    }
}

/// Global rules configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_version")]
    pub version: String,

    /// Rule configurations by diagnostic code
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for RulesConfig {
    fn default() -> Self {
        let rules = DiagnosticKind::ALL
            .iter()
            .map(|kind| (kind.code().to_string(), RuleConfig::for_kind(*kind)))
            .collect();
        Self {
            version: default_version(),
            rules,
        }
    }
}

impl RulesConfig {
    /// Loads a TOML or YAML file, chosen by extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::load_from_yaml(path),
            _ => Self::load_from_file(path),
        }
    }

    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read rules config from {}",
                path.as_ref().display()
            )
        })?;

        let config: Self = toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse TOML config from {}",
                path.as_ref().display()
            )
        })?;

        for warning in config.validate() {
            tracing::warn!("{}", warning);
        }
        Ok(config)
    }

    /// Load configuration from YAML file
    pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read rules config from {}",
                path.as_ref().display()
            )
        })?;

        let config: Self = serde_yaml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse YAML config from {}",
                path.as_ref().display()
            )
        })?;

        for warning in config.validate() {
            tracing::warn!("{}", warning);
        }
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize rules config to TOML")?;

        std::fs::write(&path, content).with_context(|| {
            format!(
                "Failed to write rules config to {}",
                path.as_ref().display()
            )
        })?;

        Ok(())
    }

    pub fn get_rule(&self, code: &str) -> Option<&RuleConfig> {
        self.rules.get(code)
    }

    /// Rules missing from the table fall back to the kind's default.
    pub fn is_enabled(&self, kind: DiagnosticKind) -> bool {
        self.get_rule(kind.code())
            .map(|rule| rule.enabled)
            .unwrap_or_else(|| kind.enabled_by_default())
    }

    pub fn severity(&self, kind: DiagnosticKind) -> Severity {
        self.get_rule(kind.code())
            .and_then(|rule| rule.severity)
            .unwrap_or_else(|| kind.default_severity())
    }

    /// Drops diagnostics of disabled rules and applies severity overrides.
    pub fn apply(&self, diagnostic: Diagnostic) -> Option<Diagnostic> {
        if !self.is_enabled(diagnostic.kind) {
            return None;
        }
        let severity = self.severity(diagnostic.kind);
        Some(diagnostic.with_severity(severity))
    }

    /// Unknown rule codes, returned as warnings.
    pub fn validate(&self) -> Vec<String> {
        self.rules
            .keys()
            .filter(|code| DiagnosticKind::from_code(code).is_none())
            .map(|code| format!("Unknown rule '{}' in configuration", code))
            .collect()
    }

    /// Create example configuration file
    pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<()> {
        Self::default().save_to_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = RulesConfig::default();
        assert_eq!(config.rules.len(), DiagnosticKind::ALL.len());
        assert!(config.is_enabled(DiagnosticKind::NullStringInit));
        assert!(!config.is_enabled(DiagnosticKind::StringInitInLoop));
        assert_eq!(config.severity(DiagnosticKind::SystemCall), Severity::Info);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_config_file_roundtrip() {
        let config = RulesConfig::default();
        let temp_file = NamedTempFile::new().unwrap();
        config.save_to_file(temp_file.path()).unwrap();

        let loaded = RulesConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[rules.DXL030]\nenabled = false\n\n[rules.DXL041]\nseverity = \"warning\""
        )
        .unwrap();

        let config = RulesConfig::load_from_file(file.path()).unwrap();
        assert!(!config.is_enabled(DiagnosticKind::SystemCall));
        assert!(config.is_enabled(DiagnosticKind::StringInitInLoop));
        assert_eq!(
            config.severity(DiagnosticKind::StringInitInLoop),
            Severity::Warning
        );
        // not in the file: defaults
        assert!(config.is_enabled(DiagnosticKind::IncludeNotFound));
        assert_eq!(config.severity(DiagnosticKind::IncludeNotFound), Severity::Error);
    }

    #[test]
    fn test_yaml_config() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "rules:\n  DXL050:\n    severity: error\n  XYZ:\n    enabled: true").unwrap();

        let config = RulesConfig::load(file.path()).unwrap();
        assert_eq!(config.severity(DiagnosticKind::DuplicateFilename), Severity::Error);
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn test_apply() {
        let mut config = RulesConfig::default();
        config.rules.insert(
            "DXL030".to_string(),
            RuleConfig {
                enabled: true,
                severity: Some(Severity::Error),
                description: None,
            },
        );

        let diag = Diagnostic::at_line(DiagnosticKind::SystemCall, "a.dxl", 1, "system(x)");
        assert_eq!(config.apply(diag).unwrap().severity, Severity::Error);

        let loop_diag = Diagnostic::at_line(DiagnosticKind::StringInitInLoop, "a.dxl", 1, "");
        assert!(config.apply(loop_diag).is_none());
    }
}
