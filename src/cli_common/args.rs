//! Command-line argument groups shared by the subcommands.

use clap::Args;
use std::path::PathBuf;

use crate::scanner::ScanConfig;

/// Include search roots given on the command line. Each flag adds to the
/// roots already in the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct RootArgs {
    /// First include search root (repeatable)
    #[arg(long = "primary-root", value_name = "DIR")]
    pub primary: Vec<PathBuf>,

    /// Second include search root (repeatable)
    #[arg(long = "secondary-root", value_name = "DIR")]
    pub secondary: Vec<PathBuf>,

    /// Directory whose scripts are executable by the host tool (repeatable)
    #[arg(long = "extra-root", value_name = "DIR")]
    pub extra: Vec<PathBuf>,

    /// Library directory searched after every other root
    #[arg(long = "fallback-library", value_name = "DIR")]
    pub fallback_library: Option<PathBuf>,

    /// Directory whose includes are linked but reported as illegal (repeatable)
    #[arg(long = "display-only", value_name = "DIR")]
    pub display_only: Vec<PathBuf>,
}

impl RootArgs {
    pub fn apply_to(&self, config: &mut ScanConfig) {
        let roots = &mut config.roots;
        roots.primary.extend(self.primary.iter().cloned());
        roots.secondary.extend(self.secondary.iter().cloned());
        roots.extra.extend(self.extra.iter().cloned());
        roots.display_only.extend(self.display_only.iter().cloned());
        if let Some(dir) = &self.fallback_library {
            roots.fallback_library = Some(dir.clone());
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,

    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Hide diagnostics less severe than this (error, warning, info, hint)
    #[arg(long, value_name = "SEVERITY")]
    pub min_severity: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_args_extend_config() {
        let mut config = ScanConfig::default();
        config.roots.primary = vec![PathBuf::from("from-config")];

        let args = RootArgs {
            primary: vec![PathBuf::from("cli")],
            fallback_library: Some(PathBuf::from("lib")),
            ..RootArgs::default()
        };
        args.apply_to(&mut config);

        assert_eq!(
            config.roots.primary,
            vec![PathBuf::from("from-config"), PathBuf::from("cli")]
        );
        assert_eq!(config.roots.fallback_library, Some(PathBuf::from("lib")));
    }
}
