/*!
# DXL Analyzer CLI

Command-line interface for the DXL script scanner.
*/

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::{style, Term};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use dxl_analyzer::cli_common::{
    self, scan_progress, OutputArgs, OutputFormat, OutputWriter, RootArgs,
};
use dxl_analyzer::diagnostics::{DiagnosticKind, Severity};
use dxl_analyzer::parser::{extract_declarations, Lexer, Token, TokenStats};
use dxl_analyzer::reports::{ReportConfig, ReportFormat, ReportManager};
use dxl_analyzer::rules::RulesConfig;
use dxl_analyzer::scanner::{ScanConfig, Scanner};
use dxl_analyzer::{classify, core::read_dxl_file};

#[derive(Parser)]
#[command(
    name = "dxl-analyzer",
    version = env!("CARGO_PKG_VERSION"),
    about = "Static scanner for DXL scripts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only warnings and errors in the log, no progress bar
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan DXL files and report issues
    Scan {
        /// Files or directories to scan (the configured roots if empty)
        paths: Vec<PathBuf>,

        /// Scan configuration file (TOML or YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Rules configuration file, replaces the rules of the scan configuration
        #[arg(long)]
        rules_config: Option<PathBuf>,

        /// Files larger than this many bytes are not scanned
        #[arg(long)]
        max_file_size: Option<u64>,

        #[command(flatten)]
        roots: RootArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the classified token stream of one file
    Tokens {
        /// DXL file
        file: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Print token statistics only
        #[arg(long)]
        stats: bool,
    },

    /// Rules management commands
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },

    /// Scan configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum RulesCommands {
    /// List every rule with its code and default severity
    List {
        /// Rules configuration to show instead of the defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write a rules configuration with every rule at its default
    Init {
        #[arg(default_value = "dxl-rules.toml")]
        output: PathBuf,
    },

    /// Check a rules configuration for unknown rule codes
    Validate { config: PathBuf },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write an example scan configuration
    Init {
        #[arg(default_value = "dxl-analyzer.toml")]
        output: PathBuf,
    },

    /// Print the effective scan configuration
    Show {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.quiet {
        cli_common::init_minimal_logging()?;
    } else {
        cli_common::init_logging(cli.verbose)?;
    }

    match cli.command {
        Commands::Scan {
            paths,
            config,
            rules_config,
            max_file_size,
            roots,
            output,
        } => {
            let has_errors = scan_command(
                &paths,
                config.as_deref(),
                rules_config.as_deref(),
                max_file_size,
                &roots,
                &output,
                cli.quiet,
            )?;
            if has_errors {
                std::process::exit(1);
            }
        }
        Commands::Tokens {
            file,
            format,
            stats,
        } => tokens_command(&file, &format, stats)?,
        Commands::Rules { command } => rules_command(command)?,
        Commands::Config { command } => config_command(command)?,
    }

    Ok(())
}

fn load_scan_config(path: Option<&Path>) -> Result<ScanConfig> {
    match path {
        Some(path) => ScanConfig::load(path)
            .with_context(|| format!("Failed to load scan configuration from {}", path.display())),
        None => Ok(ScanConfig::default()),
    }
}

/// Returns whether any error-level diagnostic was reported.
fn scan_command(
    paths: &[PathBuf],
    config_path: Option<&Path>,
    rules_path: Option<&Path>,
    max_file_size: Option<u64>,
    roots: &RootArgs,
    output: &OutputArgs,
    quiet: bool,
) -> Result<bool> {
    let start = Instant::now();
    let mut config = load_scan_config(config_path)?;
    roots.apply_to(&mut config);
    if let Some(size) = max_file_size {
        config.max_file_size = size;
    }
    if let Some(path) = rules_path {
        config.rules = RulesConfig::load(path)
            .with_context(|| format!("Failed to load rules from {}", path.display()))?
            .rules;
    }

    let format: ReportFormat = output.format.parse()?;
    let min_severity = output
        .min_severity
        .as_deref()
        .map(|s| s.parse::<Severity>().map_err(anyhow::Error::msg))
        .transpose()?;

    for path in paths {
        cli_common::validate_path(path, "Scan path")?;
    }

    let scanner = Scanner::new(config);
    let candidates = if paths.is_empty() {
        scanner.collect_candidates()
    } else {
        scanner.collect_from(paths)
    };
    if candidates.is_empty() {
        cli_common::print_warning("No DXL files found");
    }

    let pb = scan_progress(candidates.len(), quiet);
    let report = scanner.scan_with_progress(&candidates, |path| {
        pb.inc(1);
        if let Some(name) = path.file_name() {
            pb.set_message(name.to_string_lossy().into_owned());
        }
    });
    pb.finish_and_clear();

    let to_terminal = output.output.is_none();
    let report_config = ReportConfig {
        format,
        min_severity,
        use_colors: to_terminal && !output.no_color && Term::stdout().features().colors_supported(),
        include_clean_files: false,
    };
    let rendered = ReportManager::with_config(report_config.clone())
        .generate_with_config(&report, &report_config)?;

    let out_format = match format {
        ReportFormat::Json => OutputFormat::Json,
        ReportFormat::Text => OutputFormat::Text,
    };
    let mut writer = OutputWriter::create(output.output.as_deref(), out_format)?;
    writer.write_str(&rendered)?;
    writer.flush()?;

    if let Some(path) = &output.output {
        cli_common::print_success(&format!("Report written to {}", path.display()));
    }
    if report.stats.errors > 0 {
        cli_common::print_error(&format!("{} error(s) found", report.stats.errors));
    }
    info!(
        "Scanned {} files in {}",
        candidates.len(),
        cli_common::format_duration(start.elapsed())
    );

    Ok(report.has_errors())
}

fn tokens_command(file: &Path, format: &str, stats_only: bool) -> Result<()> {
    let format: OutputFormat = format.parse()?;
    cli_common::validate_path(file, "DXL file")?;
    let text = read_dxl_file(file)?;

    let mut lexer = Lexer::new(&text);
    let tokens: Vec<Token> = lexer.by_ref().collect();
    let skipped = lexer.skipped();
    let stats = TokenStats::from_tokens(&tokens);
    let classification = classify(tokens);

    let mut writer = OutputWriter::stdout(format);
    match format {
        OutputFormat::Json if stats_only => writer.write_object(&stats)?,
        OutputFormat::Json => writer.write_object(&classification)?,
        OutputFormat::Text => {
            if !stats_only {
                writer.write_header(&file.display().to_string())?;
                let rows = classification
                    .tokens
                    .iter()
                    .map(|t| {
                        vec![
                            format!("{}:{}", t.token.line, t.token.column),
                            t.token.kind.to_string(),
                            t.tag.map(|tag| format!("{:?}", tag)).unwrap_or_default(),
                            t.token.text.replace('\n', "\\n"),
                        ]
                    })
                    .collect();
                writer.write_table(&["pos", "kind", "tag", "text"], rows)?;

                writer.write_header("Declarations")?;
                for (name, lines) in extract_declarations(&text) {
                    let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
                    writer.write_line(&format!("  {} ({})", name, lines.join(", ")))?;
                }
                writer.write_line(&format!(
                    "\nExecutable marker: {}",
                    classification.executable_marker
                ))?;
            }
            writer.write_line(&stats.to_string())?;
            if skipped > 0 {
                writer.write_line(&format!("Skipped characters: {}", skipped))?;
            }
        }
    }
    writer.flush()
}

fn rules_command(command: RulesCommands) -> Result<()> {
    let term = Term::stdout();

    match command {
        RulesCommands::List { config } => {
            let rules = match config {
                Some(path) => RulesConfig::load(&path)?,
                None => RulesConfig::default(),
            };
            term.write_line(&format!("{}", style("DXL rules").bold().cyan()))?;
            for kind in DiagnosticKind::ALL.iter() {
                let enabled = rules.is_enabled(*kind);
                let state = if enabled {
                    style("on ").green()
                } else {
                    style("off").dim()
                };
                term.write_line(&format!(
                    "  {} {} {:<8} {:<22} {}",
                    style(kind.code()).bold(),
                    state,
                    rules.severity(*kind).to_string(),
                    kind.category().to_string(),
                    kind.title()
                ))?;
            }
        }

        RulesCommands::Init { output } => {
            RulesConfig::create_example_config(&output)?;
            term.write_line(&format!(
                "Rules configuration created: {}",
                style(output.display()).green()
            ))?;
        }

        RulesCommands::Validate { config } => {
            let rules = RulesConfig::load(&config)?;
            let warnings = rules.validate();
            if warnings.is_empty() {
                term.write_line(&format!("{}", style("Configuration is valid").green()))?;
            } else {
                term.write_line(&format!("{}", style("Configuration has warnings:").yellow()))?;
                for warning in &warnings {
                    term.write_line(&format!("  - {}", style(warning).yellow()))?;
                }
            }
        }
    }

    Ok(())
}

fn config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Init { output } => {
            ScanConfig::example().save_to_file(&output)?;
            cli_common::print_success(&format!(
                "Scan configuration created: {}",
                output.display()
            ));
        }
        ConfigCommands::Show { config } => {
            let config = load_scan_config(config.as_deref())?;
            let content =
                toml::to_string_pretty(&config).context("Failed to serialize scan configuration")?;
            println!("{}", content);
        }
    }
    Ok(())
}
