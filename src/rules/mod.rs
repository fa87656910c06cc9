/*!
# Rules for DXL Analyzer

The issue detector and its configuration.

Every rule is identified by the code of the diagnostic it produces
(`DXL001`..`DXL061`) and can be disabled or given another severity in a
TOML or YAML file.

## Usage

```rust,ignore
use dxl_analyzer::rules::{IssueDetector, RulesConfig};

let config = RulesConfig::load("dxl-rules.toml")?;
let detector = IssueDetector::new(config);
let diagnostics = detector.check_file(&file);
```
*/

pub mod config;
pub mod detector;

pub use config::{RuleConfig, RulesConfig};
pub use detector::{detect_issues, FileAnalysis, IssueDetector, DEFAULT_PRAGMA};
