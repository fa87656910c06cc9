//! Shared CLI helpers: logging setup, console messages, arguments and output.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub mod args;
pub mod output;
pub mod progress;

pub use args::{OutputArgs, RootArgs};
pub use output::{OutputFormat, OutputWriter};
pub use progress::scan_progress;

/// DEBUG with `verbose`, INFO otherwise. `RUST_LOG` is honoured.
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// WARN and ERROR only.
pub fn init_minimal_logging() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.green());
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "!".yellow(), message.yellow());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.red());
}

pub fn validate_path(path: &Path, description: &str) -> Result<()> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "{} does not exist: {}",
            description,
            path.display()
        ));
    }
    Ok(())
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(1)), "1.000s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
    }

    #[test]
    fn test_validate_path() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(validate_path(dir.path(), "Root").is_ok());
        let err = validate_path(&dir.path().join("nope"), "Root").unwrap_err();
        assert!(err.to_string().starts_with("Root does not exist"));
    }
}
