/*!
# Source position types (Position, LineIndex)

Location types shared by the tokenizer, the declaration pass and diagnostics.
Lines are 1-based, columns are 0-based byte offsets from the start of the line.
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Position in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }

    /// First byte of a file
    pub fn start() -> Self {
        Self::new(1, 0, 0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Line index for fast offset->(line,column) mapping.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offsets where each line starts.
    line_starts: Arc<Vec<usize>>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = Vec::with_capacity(text.len() / 32 + 1);
        starts.push(0usize);
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        Self { line_starts: Arc::new(starts) }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn to_position(&self, offset: usize) -> Position {
        // last line_start <= offset
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_at) => insert_at - 1,
        };
        let line_start = self.line_starts[idx];
        Position::new(idx + 1, offset - line_start, offset)
    }

    /// 1-based line containing `offset`
    pub fn line_of(&self, offset: usize) -> usize {
        self.to_position(offset).line
    }
}
