//! Writing command output to stdout or a file.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow::anyhow!("Unknown output format: {}", s)),
        }
    }
}

pub struct OutputWriter {
    writer: Box<dyn Write>,
    format: OutputFormat,
}

impl OutputWriter {
    pub fn stdout(format: OutputFormat) -> Self {
        Self {
            writer: Box::new(io::stdout()),
            format,
        }
    }

    pub fn file(path: &Path, format: OutputFormat) -> Result<Self> {
        super::ensure_parent_dir(path)?;
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        Ok(Self {
            writer: Box::new(file),
            format,
        })
    }

    /// File when a path is given, stdout otherwise.
    pub fn create(path: Option<&Path>, format: OutputFormat) -> Result<Self> {
        match path {
            Some(path) => Self::file(path, format),
            None => Ok(Self::stdout(format)),
        }
    }

    pub fn write_object<T: Serialize>(&mut self, obj: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(obj)?;
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    pub fn write_str(&mut self, text: &str) -> Result<()> {
        write!(self.writer, "{}", text)?;
        Ok(())
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }

    pub fn write_header(&mut self, header: &str) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                writeln!(self.writer, "\n{}", header.bold().blue())?;
                writeln!(self.writer, "{}", "=".repeat(header.len()).blue())?;
            }
            OutputFormat::Json => writeln!(self.writer, "{}", header)?,
        }
        Ok(())
    }

    /// Column-aligned table, for text output.
    pub fn write_table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        let mut widths = headers.iter().map(|h| h.len()).collect::<Vec<_>>();
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        for (i, header) in headers.iter().enumerate() {
            if i > 0 {
                write!(self.writer, " | ")?;
            }
            write!(self.writer, "{:width$}", header, width = widths[i])?;
        }
        writeln!(self.writer)?;

        for (i, width) in widths.iter().enumerate() {
            if i > 0 {
                write!(self.writer, "-+-")?;
            }
            write!(self.writer, "{}", "-".repeat(*width))?;
        }
        writeln!(self.writer)?;

        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(self.writer, " | ")?;
                }
                match widths.get(i) {
                    Some(width) => write!(self.writer, "{:width$}", cell, width = *width)?,
                    None => write!(self.writer, "{}", cell)?,
                }
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
