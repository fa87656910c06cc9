//! File system helpers: size-capped, encoding-tolerant readers for DXL files.

use std::fs;
use std::path::Path;

use super::errors::{ScanError, ScanResult};

/// Size above which a file is rejected before tokenization.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 500_000;

/// Returns the on-disk size of `path` in bytes.
pub fn file_size(path: &Path) -> ScanResult<u64> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| ScanError::read(path, e))
}

/// Fails with [`ScanError::Oversize`] when the file is larger than `limit`.
pub fn check_size(path: &Path, limit: u64) -> ScanResult<u64> {
    let size = file_size(path)?;
    if size > limit {
        return Err(ScanError::Oversize {
            path: path.to_path_buf(),
            size,
            limit,
        });
    }
    Ok(size)
}

/// Reads a DXL file as text.
///
/// UTF-16 files are recognised by their BOM. Everything else is tried as
/// UTF-8 first and decoded as Windows-1252 when that fails, which is what
/// scripts saved by the host tool on Windows usually are.
pub fn read_dxl_file(path: &Path) -> ScanResult<String> {
    let bytes = fs::read(path).map_err(|e| ScanError::read(path, e))?;
    Ok(decode_bytes(&bytes))
}

pub fn decode_bytes(bytes: &[u8]) -> String {
    let decoded = match bytes {
        [0xFF, 0xFE, ..] => {
            let (text, _, had_errors) = encoding_rs::UTF_16LE.decode(bytes);
            if had_errors {
                tracing::warn!("Errors detected while decoding UTF-16LE file");
            }
            text.into_owned()
        }
        [0xFE, 0xFF, ..] => {
            let (text, _, had_errors) = encoding_rs::UTF_16BE.decode(bytes);
            if had_errors {
                tracing::warn!("Errors detected while decoding UTF-16BE file");
            }
            text.into_owned()
        }
        _ => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => {
                tracing::debug!("UTF-8 decoding failed, falling back to Windows-1252");
                let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
                text.into_owned()
            }
        },
    };
    strip_bom(&decoded).to_string()
}

fn strip_bom(input: &str) -> &str {
    input.strip_prefix('\u{FEFF}').unwrap_or(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_strip_bom() {
        assert_eq!(strip_bom("\u{FEFF}pragma runLim, 0"), "pragma runLim, 0");
        assert_eq!(strip_bom("int x"), "int x");
        assert_eq!(strip_bom(""), "");
    }

    #[test]
    fn test_windows_1252_fallback() {
        // "é" in Windows-1252 is a lone 0xE9, invalid as UTF-8
        let text = decode_bytes(b"// caf\xE9\nint x = 1");
        assert!(text.starts_with("// café"));
    }

    #[test]
    fn test_check_size_rejects_large_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[b'x'; 64]).unwrap();

        assert_eq!(check_size(file.path(), 64).unwrap(), 64);
        match check_size(file.path(), 63) {
            Err(ScanError::Oversize { size, limit, .. }) => {
                assert_eq!(size, 64);
                assert_eq!(limit, 63);
            }
            other => panic!("expected oversize error, got {:?}", other),
        }
    }
}
