/*!
# Error System for DXL Analyzer

Failures that stop the processing of a single file. Configuration loading
reports through `anyhow`, and missing roots are only warned about. Findings about the scanned code are never errors: they are
[`Diagnostic`](crate::diagnostics::Diagnostic) records.
*/

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is {size} bytes, above the {limit} byte limit")]
    Oversize { path: PathBuf, size: u64, limit: u64 },
}

impl ScanError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScanError::Read {
            path: path.into(),
            source,
        }
    }
}

pub type ScanResult<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_file() {
        let err = ScanError::read(
            "lib/a.inc",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.to_string(), "failed to read lib/a.inc: gone");
        assert!(std::error::Error::source(&err).is_some());

        let err = ScanError::Oversize {
            path: PathBuf::from("big.dxl"),
            size: 500_001,
            limit: 500_000,
        };
        assert_eq!(
            err.to_string(),
            "big.dxl is 500001 bytes, above the 500000 byte limit"
        );
    }
}
