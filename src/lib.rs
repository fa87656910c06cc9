/*!
# DXL Analyzer

Static scanner for DXL, the C-like scripting language of a requirements
management tool. It tokenizes scripts, classifies the tokens in context,
builds corpus-wide function tables, resolves `#include` directives against
ordered search roots and reports rule violations.

## Architecture

```text
DXL Analyzer
├── Parser       - hybrid tokenizer, keywords, declaration pass
├── Analyzer     - context classifier, function and corpus tables
├── Resolver     - include resolution against search roots
├── Diagnostics  - diagnostic kinds, codes, locations
├── Rules        - issue detector and rule configuration
├── Scanner      - batch driver, scan configuration, content hashing
└── Reports      - text and JSON output
```

## Usage

### CLI
```bash
# Scan the roots of a configuration file
dxl-analyzer scan --config dxl-analyzer.toml

# Scan a directory with two root groups, JSON output
dxl-analyzer scan scripts --primary-root scripts --secondary-root addins --format json

# Classified tokens of one file
dxl-analyzer tokens scripts/main.dxl

# Rules
dxl-analyzer rules list
dxl-analyzer rules init dxl-rules.toml
```

### Library
```rust
use dxl_analyzer::{classify, extract_declarations, tokenize};

let text = "pragma runLim, 0\n#include <lib/util.inc>\nvoid run() { print(\"x\") }\nrun()\n";
let classification = classify(tokenize(text));

assert_eq!(classification.pragmas.len(), 1);
assert_eq!(classification.includes.len(), 1);
assert_eq!(extract_declarations(text)["run"], vec![3]);
```
*/

pub mod analyzer;
pub mod cli_common;
pub mod core;
pub mod diagnostics;
pub mod parser;
pub mod reports;
pub mod resolver;
pub mod rules;
pub mod scanner;

pub use analyzer::{classify, Classification, CorpusTables, FunctionTable};
pub use core::{ScanError, ScanResult};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use parser::{extract_declarations, tokenize, Token, TokenKind};
pub use reports::{ReportFormat, ReportManager};
pub use resolver::{resolve_include, ResolvedInclude, RootKind, SearchRoots};
pub use rules::{detect_issues, IssueDetector, RulesConfig};
pub use scanner::{ScanConfig, ScanReport, Scanner};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
