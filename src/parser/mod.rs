/*!
# DXL Parser

Lexical layer of the analyzer: the tokenizer, the reserved word tables and
the whole-text declaration pass.

## Usage

```rust
use dxl_analyzer::parser::{tokenize, extract_declarations, TokenKind};

let text = "pragma runLim, 0\nvoid hello() { print(\"hi\") }\n";
let tokens = tokenize(text);
assert_eq!(tokens[0].kind, TokenKind::Pragma);

let declarations = extract_declarations(text);
assert_eq!(declarations["hello"], vec![2]);
```
*/

pub mod declarations;
pub mod keywords;
pub mod lexer;

pub use declarations::{declaration_matches, extract_declarations, DeclarationMatch};
pub use lexer::{tokenize, Lexer, Token, TokenCategory, TokenKind, TokenStats};

use anyhow::{Context, Result};
use std::path::Path;

use crate::core::read_dxl_file;

/// Reads and tokenizes a single file.
pub fn tokenize_file<P: AsRef<Path>>(path: P) -> Result<Vec<Token>> {
    let content = read_dxl_file(path.as_ref())
        .with_context(|| format!("Failed to read file: {}", path.as_ref().display()))?;
    Ok(tokenize(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("t.dxl");
        std::fs::write(&path, "int x = 1\n").unwrap();

        let tokens = tokenize_file(&path).unwrap();
        assert_eq!(tokens.len(), 4);
        assert!(tokenize_file(dir.path().join("missing.dxl")).is_err());
    }
}
