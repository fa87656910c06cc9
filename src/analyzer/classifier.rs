/*!
# Context Classifier

One forward pass over a token stream that attaches a semantic tag to the
tokens that matter for the issue checks and collects them into side tables.

The only context carried from token to token is a [`ClassifierState`]
(what the previous token was) and a [`LoopScope`]. Both live in a
[`Classifier`] built fresh for every file, so nothing leaks from one file
to the next.
*/

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::parser::keywords;
use crate::parser::{Token, TokenKind};

/// Semantic tag attached to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticTag {
    IncludeTarget,
    PragmaDirective,
    StringInitializer,
    SystemCall,
    FunctionCall,
    FunctionDeclarationHeader,
    ExecutableMarker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedToken {
    #[serde(flatten)]
    pub token: Token,
    pub tag: Option<SemanticTag>,
}

/// A recorded token text and the line it started on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub text: String,
    pub line: usize,
}

impl Occurrence {
    pub fn new(text: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeDirective {
    pub raw_path: String,
    pub line: usize,
}

/// Include directives of one file keyed by raw path.
///
/// A path seen twice keeps its first position in iteration order but takes
/// the line of the later occurrence.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IncludeTable {
    entries: Vec<IncludeDirective>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl IncludeTable {
    pub fn insert(&mut self, raw_path: impl Into<String>, line: usize) {
        let raw_path = raw_path.into();
        match self.index.get(&raw_path) {
            Some(&slot) => self.entries[slot].line = line,
            None => {
                self.index.insert(raw_path.clone(), self.entries.len());
                self.entries.push(IncludeDirective { raw_path, line });
            }
        }
    }

    pub fn get(&self, raw_path: &str) -> Option<&IncludeDirective> {
        self.index.get(raw_path).map(|&slot| &self.entries[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &IncludeDirective> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Smallest line among the recorded directives.
    pub fn first_line(&self) -> Option<usize> {
        self.entries.iter().map(|d| d.line).min()
    }
}

/// What the previous token was, as far as classification cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierState {
    /// No token seen yet.
    #[default]
    Start,
    /// The first token of the file was a line comment.
    AfterLeadingLineComment,
    AfterInclude,
    AfterStringInitHeader,
    AfterTypeKeyword,
    Plain,
}

impl ClassifierState {
    /// State after consuming a token of `kind`.
    pub fn next(self, kind: TokenKind) -> ClassifierState {
        match kind {
            TokenKind::LineComment if self == ClassifierState::Start => {
                ClassifierState::AfterLeadingLineComment
            }
            TokenKind::Include => ClassifierState::AfterInclude,
            TokenKind::StringInit => ClassifierState::AfterStringInitHeader,
            kind if keywords::is_type_keyword(kind) => ClassifierState::AfterTypeKeyword,
            _ => ClassifierState::Plain,
        }
    }
}

/// Brace depth of the innermost `for`/`while` body.
///
/// `for` or `while` arms the scope; braces only count while armed and the
/// scope disarms when the depth falls back to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopScope {
    pending: bool,
    depth: usize,
}

impl LoopScope {
    pub fn observe(&mut self, kind: TokenKind) {
        match kind {
            TokenKind::For | TokenKind::While => self.pending = true,
            TokenKind::LBrace if self.pending => self.depth += 1,
            TokenKind::RBrace if self.pending => {
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 {
                    self.pending = false;
                }
            }
            _ => {}
        }
    }

    pub fn active(&self) -> bool {
        self.depth > 0
    }
}

/// Classifier output for one file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    pub tokens: Vec<AnnotatedToken>,
    pub includes: IncludeTable,
    pub pragmas: Vec<Occurrence>,
    pub system_calls: Vec<Occurrence>,
    /// Values assigned by string-initializer headers.
    pub string_inits: Vec<Occurrence>,
    /// String-initializer headers seen inside a loop body.
    pub loop_string_inits: Vec<Occurrence>,
    /// Callee names of classified calls.
    pub calls: Vec<Occurrence>,
    pub executable_marker: bool,
}

impl Classification {
    /// Largest line among the pragma directives.
    pub fn last_pragma_line(&self) -> Option<usize> {
        self.pragmas.iter().map(|p| p.line).max()
    }

    pub fn tagged(&self, tag: SemanticTag) -> impl Iterator<Item = &AnnotatedToken> {
        self.tokens.iter().filter(move |t| t.tag == Some(tag))
    }
}

/// Per-file classification automaton.
#[derive(Debug, Default)]
pub struct Classifier {
    state: ClassifierState,
    loop_scope: LoopScope,
    out: Classification,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ClassifierState {
        self.state
    }

    /// Classifies one token and advances the state.
    pub fn push(&mut self, token: Token) {
        let kind = token.kind;
        let line = token.line;
        let mut tag = None;

        self.loop_scope.observe(kind);

        match self.state {
            ClassifierState::AfterInclude
                if matches!(kind, TokenKind::IncludePath | TokenKind::StringConst) =>
            {
                self.out.includes.insert(strip_delimiters(&token.text), line);
                tag = Some(SemanticTag::IncludeTarget);
            }
            ClassifierState::AfterStringInitHeader => {
                self.out
                    .string_inits
                    .push(Occurrence::new(token.text.as_str(), line));
                tag = Some(SemanticTag::StringInitializer);
            }
            ClassifierState::AfterLeadingLineComment if kind == TokenKind::BlockComment => {
                self.out.executable_marker = true;
                tag = Some(SemanticTag::ExecutableMarker);
            }
            _ => {}
        }

        match kind {
            TokenKind::StringInit if self.loop_scope.active() => {
                self.out
                    .loop_string_inits
                    .push(Occurrence::new(token.text.as_str(), line));
            }
            TokenKind::Pragma => {
                self.out.pragmas.push(Occurrence::new(token.text.as_str(), line));
                tag = tag.or(Some(SemanticTag::PragmaDirective));
            }
            TokenKind::SysCall => {
                self.out
                    .system_calls
                    .push(Occurrence::new(token.text.as_str(), line));
                tag = tag.or(Some(SemanticTag::SystemCall));
            }
            TokenKind::Function => {
                let callee = callee_name(&token.text);
                let is_system = callee.starts_with("system");
                if is_system {
                    self.out
                        .system_calls
                        .push(Occurrence::new(token.text.as_str(), line));
                }

                if self.state == ClassifierState::AfterTypeKeyword {
                    tag = tag.or(Some(SemanticTag::FunctionDeclarationHeader));
                } else {
                    self.out.calls.push(Occurrence::new(callee, line));
                    tag = tag.or(Some(if is_system {
                        SemanticTag::SystemCall
                    } else {
                        SemanticTag::FunctionCall
                    }));
                }
            }
            _ => {}
        }

        self.state = self.state.next(kind);
        self.out.tokens.push(AnnotatedToken { token, tag });
    }

    pub fn finish(self) -> Classification {
        self.out
    }
}

/// Classifies a token stream with a fresh automaton.
pub fn classify<I>(tokens: I) -> Classification
where
    I: IntoIterator<Item = Token>,
{
    let mut classifier = Classifier::new();
    for token in tokens {
        classifier.push(token);
    }
    classifier.finish()
}

/// Name part of a call-shaped token: everything before the first `(`.
pub fn callee_name(text: &str) -> &str {
    text.split('(').next().unwrap_or(text).trim()
}

fn strip_delimiters(text: &str) -> &str {
    let inner = text
        .strip_prefix(|c: char| c == '<' || c == '"')
        .and_then(|t| t.strip_suffix(|c: char| c == '>' || c == '"'));
    inner.unwrap_or(text)
}
