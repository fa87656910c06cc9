//! Diagnostic records produced by the issue detector and the scanner.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        };
        f.write_str(s)
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            "info" | "information" => Ok(Severity::Info),
            "hint" => Ok(Severity::Hint),
            other => Err(format!("Unknown severity: {}", other)),
        }
    }
}

/// Report grouping of diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    File,
    Pragma,
    Include,
    System,
    StringInitialization,
    Duplication,
    IncludeDuplication,
    Function,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::File => "file",
            Category::Pragma => "pragma",
            Category::Include => "include",
            Category::System => "system",
            Category::StringInitialization => "string initialization",
            Category::Duplication => "duplication",
            Category::IncludeDuplication => "include duplication",
            Category::Function => "function",
        };
        f.write_str(s)
    }
}

/// Diagnostic codes
pub mod codes {
    pub const OVERSIZE_FILE: &str = "DXL001";
    pub const UNREADABLE_FILE: &str = "DXL002";
    pub const INCLUDE_NOT_FOUND: &str = "DXL010";
    pub const ILLEGAL_INCLUDE_PATH: &str = "DXL011";
    pub const MALFORMED_INCLUDE_PATH: &str = "DXL012";
    pub const PRAGMA_MISSING: &str = "DXL020";
    pub const PRAGMA_AFTER_INCLUDE: &str = "DXL021";
    pub const FORBIDDEN_PRAGMA: &str = "DXL022";
    pub const NON_ZERO_RUN_LIMIT: &str = "DXL023";
    pub const SYSTEM_CALL: &str = "DXL030";
    pub const NULL_STRING_INIT: &str = "DXL040";
    pub const STRING_INIT_IN_LOOP: &str = "DXL041";
    pub const DUPLICATE_FILENAME: &str = "DXL050";
    pub const DUPLICATE_CONTENT: &str = "DXL051";
    pub const DUPLICATE_DECLARATION: &str = "DXL060";
    pub const DECLARED_NEVER_CALLED: &str = "DXL061";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    OversizeFile,
    UnreadableFile,
    IncludeNotFound,
    IllegalIncludePath,
    MalformedIncludePath,
    PragmaMissing,
    PragmaAfterInclude,
    ForbiddenPragma,
    NonZeroRunLimit,
    SystemCall,
    NullStringInit,
    StringInitInLoop,
    DuplicateFilename,
    DuplicateContent,
    DuplicateDeclaration,
    DeclaredNeverCalled,
}

impl DiagnosticKind {
    pub const ALL: [DiagnosticKind; 16] = [
        DiagnosticKind::OversizeFile,
        DiagnosticKind::UnreadableFile,
        DiagnosticKind::IncludeNotFound,
        DiagnosticKind::IllegalIncludePath,
        DiagnosticKind::MalformedIncludePath,
        DiagnosticKind::PragmaMissing,
        DiagnosticKind::PragmaAfterInclude,
        DiagnosticKind::ForbiddenPragma,
        DiagnosticKind::NonZeroRunLimit,
        DiagnosticKind::SystemCall,
        DiagnosticKind::NullStringInit,
        DiagnosticKind::StringInitInLoop,
        DiagnosticKind::DuplicateFilename,
        DiagnosticKind::DuplicateContent,
        DiagnosticKind::DuplicateDeclaration,
        DiagnosticKind::DeclaredNeverCalled,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::OversizeFile => codes::OVERSIZE_FILE,
            DiagnosticKind::UnreadableFile => codes::UNREADABLE_FILE,
            DiagnosticKind::IncludeNotFound => codes::INCLUDE_NOT_FOUND,
            DiagnosticKind::IllegalIncludePath => codes::ILLEGAL_INCLUDE_PATH,
            DiagnosticKind::MalformedIncludePath => codes::MALFORMED_INCLUDE_PATH,
            DiagnosticKind::PragmaMissing => codes::PRAGMA_MISSING,
            DiagnosticKind::PragmaAfterInclude => codes::PRAGMA_AFTER_INCLUDE,
            DiagnosticKind::ForbiddenPragma => codes::FORBIDDEN_PRAGMA,
            DiagnosticKind::NonZeroRunLimit => codes::NON_ZERO_RUN_LIMIT,
            DiagnosticKind::SystemCall => codes::SYSTEM_CALL,
            DiagnosticKind::NullStringInit => codes::NULL_STRING_INIT,
            DiagnosticKind::StringInitInLoop => codes::STRING_INIT_IN_LOOP,
            DiagnosticKind::DuplicateFilename => codes::DUPLICATE_FILENAME,
            DiagnosticKind::DuplicateContent => codes::DUPLICATE_CONTENT,
            DiagnosticKind::DuplicateDeclaration => codes::DUPLICATE_DECLARATION,
            DiagnosticKind::DeclaredNeverCalled => codes::DECLARED_NEVER_CALLED,
        }
    }

    pub fn from_code(code: &str) -> Option<DiagnosticKind> {
        Self::ALL.iter().copied().find(|kind| kind.code() == code)
    }

    pub fn category(&self) -> Category {
        match self {
            DiagnosticKind::OversizeFile | DiagnosticKind::UnreadableFile => Category::File,
            DiagnosticKind::IncludeNotFound
            | DiagnosticKind::IllegalIncludePath
            | DiagnosticKind::MalformedIncludePath => Category::Include,
            DiagnosticKind::PragmaMissing
            | DiagnosticKind::PragmaAfterInclude
            | DiagnosticKind::ForbiddenPragma
            | DiagnosticKind::NonZeroRunLimit => Category::Pragma,
            DiagnosticKind::SystemCall => Category::System,
            DiagnosticKind::NullStringInit | DiagnosticKind::StringInitInLoop => {
                Category::StringInitialization
            }
            DiagnosticKind::DuplicateFilename => Category::Duplication,
            DiagnosticKind::DuplicateContent => Category::IncludeDuplication,
            DiagnosticKind::DuplicateDeclaration | DiagnosticKind::DeclaredNeverCalled => {
                Category::Function
            }
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            DiagnosticKind::OversizeFile
            | DiagnosticKind::UnreadableFile
            | DiagnosticKind::IncludeNotFound
            | DiagnosticKind::IllegalIncludePath
            | DiagnosticKind::ForbiddenPragma
            | DiagnosticKind::NonZeroRunLimit => Severity::Error,
            DiagnosticKind::MalformedIncludePath
            | DiagnosticKind::PragmaMissing
            | DiagnosticKind::PragmaAfterInclude
            | DiagnosticKind::NullStringInit
            | DiagnosticKind::DuplicateFilename
            | DiagnosticKind::DuplicateContent
            | DiagnosticKind::DuplicateDeclaration => Severity::Warning,
            DiagnosticKind::SystemCall | DiagnosticKind::DeclaredNeverCalled => Severity::Info,
            DiagnosticKind::StringInitInLoop => Severity::Hint,
        }
    }

    /// Rules that produce nothing unless switched on in the configuration.
    pub fn enabled_by_default(&self) -> bool {
        *self != DiagnosticKind::StringInitInLoop
    }

    /// Default message of the diagnostic.
    pub fn title(&self) -> &'static str {
        match self {
            DiagnosticKind::OversizeFile => "File too big",
            DiagnosticKind::UnreadableFile => "File could not be read",
            DiagnosticKind::IncludeNotFound => "Path not found or not valid",
            DiagnosticKind::IllegalIncludePath => "Illegal path",
            DiagnosticKind::MalformedIncludePath => "Double Backslash",
            DiagnosticKind::PragmaMissing => "Not defined",
            DiagnosticKind::PragmaAfterInclude => "Must be defined before includes",
            DiagnosticKind::ForbiddenPragma => "Pragma xflags forbidden",
            DiagnosticKind::NonZeroRunLimit => "Execution cycle not 0",
            DiagnosticKind::SystemCall => "System Call",
            DiagnosticKind::NullStringInit => "Use \"\" instead of null",
            DiagnosticKind::StringInitInLoop => "String initialization in loop",
            DiagnosticKind::DuplicateFilename => "Same filename",
            DiagnosticKind::DuplicateContent => "Identical content",
            DiagnosticKind::DuplicateDeclaration => {
                "Function defined more than once with the same name"
            }
            DiagnosticKind::DeclaredNeverCalled => "Function defined but never called",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Where in a file a diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticLocation {
    /// The file as a whole.
    File,
    Line(usize),
    Lines(Vec<usize>),
}

impl DiagnosticLocation {
    pub fn first_line(&self) -> Option<usize> {
        match self {
            DiagnosticLocation::File => None,
            DiagnosticLocation::Line(line) => Some(*line),
            DiagnosticLocation::Lines(lines) => lines.iter().copied().min(),
        }
    }
}

impl fmt::Display for DiagnosticLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLocation::File => Ok(()),
            DiagnosticLocation::Line(line) => write!(f, "{}", line),
            DiagnosticLocation::Lines(lines) => {
                let joined: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
                write!(f, "{}", joined.join(","))
            }
        }
    }
}

/// Another file, and optionally a line in it, that a diagnostic refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedLocation {
    pub file: PathBuf,
    pub line: Option<usize>,
}

impl RelatedLocation {
    pub fn file(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            line: None,
        }
    }

    pub fn line(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
        }
    }
}

impl fmt::Display for RelatedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.file.display(), line),
            None => write!(f, "{}", self.file.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub code: String,
    pub severity: Severity,
    pub file: PathBuf,
    pub location: DiagnosticLocation,
    pub message: String,
    /// Token text or path the diagnostic is about.
    pub subject: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<RelatedLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        file: impl Into<PathBuf>,
        location: DiagnosticLocation,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            code: kind.code().to_string(),
            severity: kind.default_severity(),
            file: file.into(),
            location,
            message: kind.title().to_string(),
            subject: subject.into(),
            related: Vec::new(),
            suggestion: None,
        }
    }

    pub fn at_line(
        kind: DiagnosticKind,
        file: impl Into<PathBuf>,
        line: usize,
        subject: impl Into<String>,
    ) -> Self {
        Self::new(kind, file, DiagnosticLocation::Line(line), subject)
    }

    pub fn for_file(kind: DiagnosticKind, file: &Path) -> Self {
        Self::new(
            kind,
            file,
            DiagnosticLocation::File,
            file.to_string_lossy().into_owned(),
        )
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_related(mut self, related: impl IntoIterator<Item = RelatedLocation>) -> Self {
        self.related.extend(related);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn line(&self) -> Option<usize> {
        self.location.first_line()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file.display())?;
        if let Some(line) = self.location.first_line() {
            write!(f, ":{}", line)?;
        }
        write!(
            f,
            ": {} [{}] {}: {}",
            self.severity, self.code, self.message, self.subject
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<&str> = DiagnosticKind::ALL.iter().map(|k| k.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), DiagnosticKind::ALL.len());
    }

    #[test]
    fn test_from_code() {
        assert_eq!(
            DiagnosticKind::from_code("DXL040"),
            Some(DiagnosticKind::NullStringInit)
        );
        assert_eq!(DiagnosticKind::from_code("DXL999"), None);
    }

    #[test]
    fn test_diagnostic_builder() {
        let diag = Diagnostic::at_line(DiagnosticKind::PragmaMissing, "a.dxl", 3, "")
            .with_suggestion("pragma runLim, 0")
            .with_severity(Severity::Error)
            .with_related([RelatedLocation::line("b.dxl", 9)]);

        assert_eq!(diag.code, "DXL020");
        assert_eq!(diag.message, "Not defined");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.line(), Some(3));
        assert_eq!(diag.suggestion.as_deref(), Some("pragma runLim, 0"));
        assert_eq!(diag.related[0].to_string(), "b.dxl:9");
    }

    #[test]
    fn test_display() {
        let diag = Diagnostic::at_line(DiagnosticKind::SystemCall, "a.dxl", 7, "system(\"dir\")");
        assert_eq!(
            diag.to_string(),
            "a.dxl:7: info [DXL030] System Call: system(\"dir\")"
        );
        let whole = Diagnostic::for_file(DiagnosticKind::OversizeFile, Path::new("big.dxl"));
        assert_eq!(whole.to_string(), "big.dxl: error [DXL001] File too big: big.dxl");
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("Warning".parse::<Severity>(), Ok(Severity::Warning));
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_lines_location() {
        let loc = DiagnosticLocation::Lines(vec![12, 3]);
        assert_eq!(loc.first_line(), Some(3));
        assert_eq!(loc.to_string(), "12,3");
    }
}
