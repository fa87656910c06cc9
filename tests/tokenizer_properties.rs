//! Line accounting, determinism and classification properties of the
//! tokenizer and classifier over realistic scripts.

use pretty_assertions::assert_eq;
use std::path::Path;
use std::time::{Duration, Instant};

use dxl_analyzer::analyzer::CorpusTables;
use dxl_analyzer::parser::{Lexer, Token};
use dxl_analyzer::resolver::SearchRoots;
use dxl_analyzer::rules::FileAnalysis;
use dxl_analyzer::{
    classify, detect_issues, resolve_include, tokenize, DiagnosticKind, RulesConfig, TokenKind,
};

const SAMPLES: &[&str] = &[
    "",
    "\n\n\n",
    "int x = 1\r\nint y = 2\r\n",
    "// header\n/* multi\n   line\n   comment */\nvoid f() {\n}\n",
    "// continued \\\n   comment\nint z\n",
    "pragma runLim, 0\n#include <lib/a.inc>\nstring s = \"\"\nfor (i = 0; i < 3; i++) {\n  string t = null\n}\n",
    "Module m = current\nObject o = first m\nprint(o.\"Object Text\" \"\")\n/* trailing",
    "x = 'c' + L'\\n' ??? $ @\n§ unknown ¤\n",
];

#[test]
fn test_line_numbers_never_decrease() {
    for text in SAMPLES {
        let tokens = tokenize(text);
        for pair in tokens.windows(2) {
            assert!(
                pair[0].line <= pair[1].line,
                "line went backwards in {:?}: {:?} then {:?}",
                text,
                pair[0],
                pair[1]
            );
        }
    }
}

#[test]
fn test_lexer_accounts_for_every_newline() {
    for text in SAMPLES {
        let mut lexer = Lexer::new(text);
        let tokens: Vec<_> = lexer.by_ref().collect();
        let newlines = text.matches('\n').count();
        assert_eq!(lexer.line() - 1, newlines, "in {:?}", text);

        // the last token ends on the line the newline count says
        if let Some(last) = tokens.last() {
            let trailing = text.trim_end_matches(|c: char| c.is_whitespace());
            let last_line = 1 + trailing.matches('\n').count();
            assert_eq!(last.line + last.newline_count(), last_line, "in {:?}", text);
        }
    }
}

/// Tokenizes `line`, failing when it takes longer than `budget`.
fn assert_tokenizes_within(line: &str, budget: Duration) -> Vec<Token> {
    let start = Instant::now();
    let tokens = tokenize(line);
    let elapsed = start.elapsed();
    assert!(
        elapsed < budget,
        "{} bytes on one line took {:?}",
        line.len(),
        elapsed
    );
    tokens
}

#[test]
fn test_long_single_line_tokenizes_in_linear_time() {
    let words = "a ".repeat(50_000);
    let tokens = assert_tokenizes_within(&words, Duration::from_secs(30));
    assert_eq!(tokens.len(), 50_000);
    assert!(tokens.iter().all(|t| t.line == 1));
    assert_eq!(tokens.last().unwrap().column, 99_998);

    for (unit, per_unit) in [("a < b + f(x) {} c[1] = d; ", 17), ("g() {} s[] ", 8)] {
        let line = unit.repeat(4_000);
        let tokens = assert_tokenizes_within(&line, Duration::from_secs(30));
        assert_eq!(tokens.len(), per_unit * 4_000);

        let expected: Vec<TokenKind> = tokenize(unit).iter().map(|t| t.kind).collect();
        assert_eq!(expected.len(), per_unit);
        for (chunk, token) in tokens.iter().enumerate() {
            assert_eq!(token.kind, expected[chunk % per_unit]);
        }
    }
}

#[test]
fn test_multiline_comment_keeps_following_lines() {
    let tokens = tokenize("/* a\nb\nc */ int x\nx = 1");
    assert_eq!(tokens[0].newline_count(), 2);
    let x = tokens.iter().rev().find(|t| t.text == "x").unwrap();
    assert_eq!(x.line, 4);
}

#[test]
fn test_unknown_characters_are_skipped() {
    let mut lexer = Lexer::new("int a ¤ = $ 1");
    let texts: Vec<String> = lexer.by_ref().map(|t| t.text).collect();
    assert_eq!(texts, vec!["int", "a", "=", "1"]);
    assert_eq!(lexer.skipped(), 2);
}

#[test]
fn test_tokenize_and_classify_are_deterministic() {
    for text in SAMPLES {
        let first = tokenize(text);
        let second = tokenize(text);
        assert_eq!(first, second);

        let a = serde_json::to_string(&classify(first)).unwrap();
        let b = serde_json::to_string(&classify(second)).unwrap();
        assert_eq!(a, b);
    }
}

fn diagnostics_for(text: &str) -> Vec<dxl_analyzer::Diagnostic> {
    let classification = classify(tokenize(text));
    let roots = SearchRoots::default();
    let includes: Vec<_> = classification
        .includes
        .iter()
        .map(|d| resolve_include(&d.raw_path, d.line, &roots))
        .collect();
    let file = FileAnalysis {
        path: Path::new("script.dxl"),
        classification: &classification,
        includes: &includes,
    };
    detect_issues(&[file], &CorpusTables::default(), &RulesConfig::default())
}

#[test]
fn test_null_string_init_reported_once_at_its_line() {
    let diags = diagnostics_for("int a = 0\n\nstring x = null;\n");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, DiagnosticKind::NullStringInit);
    assert_eq!(diags[0].line(), Some(3));
}

#[test]
fn test_detect_issues_is_repeatable() {
    let text = "#include <x.inc>\npragma xflags, 2\nsystem \"cmd\"\nstring s = null\n";
    assert_eq!(diagnostics_for(text), diagnostics_for(text));
}

#[test]
fn test_executable_marker_needs_comment_pair_at_start() {
    assert!(classify(tokenize("// x\n/* y */\nint a")).executable_marker);
    assert!(classify(tokenize("// x\n/* y */")).executable_marker);
    assert!(!classify(tokenize("int a\n// x\n/* y */")).executable_marker);
    assert!(!classify(tokenize("/* y */\n// x")).executable_marker);
}

#[test]
fn test_empty_corpus_tables_report_nothing() {
    let tables = CorpusTables::new();
    assert!(detect_issues(&[], &tables, &RulesConfig::default()).is_empty());
}
