/*!
# Function declaration extraction

A whole-text pattern pass, independent of the token stream: a type keyword,
a name, a parameter list on the same line and a brace-delimited body.

The body pattern stops at the first closing brace, so a body with nested
blocks is cut short at the inner `}`. The declaration itself is still
found; only the reported body range is truncated.
*/

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::LineIndex;

static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(bool|char|int|string|real|void|Object|Module)[ \t]+(?P<name>[A-Za-z0-9_]*)[ \t]?\([^\n]*\)\s*\{[^}]*\}",
    )
    .expect("valid regex")
});

/// One matched declaration with its position in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationMatch {
    pub name: String,
    pub return_type: String,
    pub line: usize,
    pub body_end_line: usize,
}

/// All declarations in source order, repeats included.
pub fn declaration_matches(text: &str) -> Vec<DeclarationMatch> {
    let index = LineIndex::new(text);
    let mut matches = Vec::new();

    for caps in DECLARATION.captures_iter(text) {
        let (Some(whole), Some(kind), Some(name)) = (caps.get(0), caps.get(1), caps.name("name"))
        else {
            continue;
        };
        if name.as_str().is_empty() {
            continue;
        }
        matches.push(DeclarationMatch {
            name: name.as_str().to_string(),
            return_type: kind.as_str().to_string(),
            line: index.line_of(name.start()),
            body_end_line: index.line_of(whole.end() - 1),
        });
    }

    matches
}

/// Name to declaration lines. A name declared twice keeps both lines.
pub fn extract_declarations(text: &str) -> BTreeMap<String, Vec<usize>> {
    let mut table: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for decl in declaration_matches(text) {
        table.entry(decl.name).or_default().push(decl.line);
    }
    table
}
