/*!
# DXL Tokenizer

Converts DXL source text into a flat, ordered sequence of tokens.

Matching happens in two tiers at every position:

1. a prioritized list of line-oriented heuristic patterns (string
   initialisation headers, array definitions, system calls, pragmas,
   call-shaped expressions and comments), each anchored at the cursor;
2. a logos-generated scanner for identifiers, literals, operators and
   delimiters, applied to the remainder when no heuristic matches.

Whitespace separates tokens and is never emitted. Characters that match
nothing are skipped and counted. Identifiers that spell a reserved word
are reclassified with [`keywords::lookup`](super::keywords::lookup).
*/

use logos::Logos;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::keywords;

/// DXL token kinds.
///
/// Variants with a logos attribute are produced by the generated scanner.
/// The heuristic kinds and the reserved words are assigned by [`Lexer`].
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Heuristic, line-oriented constructs
    StringInit,
    ArrayDef,
    SysCall,
    Pragma,
    Function,
    LineComment,
    BlockComment,

    // Preprocessor
    #[token("#include")]
    Include,
    #[regex(r"<[^0-9>\n][^>;)+\n]+>")]
    IncludePath,

    // Identifiers and literals
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,
    #[regex(r"[0-9]+([uU][lL]|[lL][uU]|[uU]|[lL])?")]
    IntConst,
    #[regex(r"([0-9]*\.[0-9]+([eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+|[0-9]+\.([eE][+-]?[0-9]+)?)[lLfF]?")]
    FloatConst,
    #[regex(r"L?'([^'\\\n]|\\.)*'")]
    CharConst,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringConst,

    // Base reserved words
    And,
    Bool,
    Break,
    By,
    Case,
    Char,
    Const,
    Continue,
    Default,
    Do,
    Else,
    ElseIf,
    Enum,
    For,
    If,
    In,
    Int,
    Or,
    Real,
    Return,
    Sizeof,
    Static,
    Struct,
    String,
    Switch,
    Then,
    Union,
    Void,
    While,

    // Domain reserved words
    Module,
    Object,
    Skip,
    Buffer,
    Template,
    ModuleVersion,
    Date,
    Link,
    LinkRef,
    Stream,
    Regexp,
    AttrDef,
    Db,
    Dbe,

    // Operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Times,
    #[token("/")]
    Divide,
    #[token("%")]
    Mod,
    #[token("|")]
    BitOr,
    #[token("&")]
    BitAnd,
    #[token("~")]
    BitNot,
    #[token("^")]
    BitXor,
    #[token("<<")]
    LShift,
    #[token(">>")]
    RShift,
    #[token("||")]
    LogOr,
    #[token("&&")]
    LogAnd,
    #[token("!")]
    LogNot,
    #[token("<>")]
    LtGt,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("==")]
    Eq,
    #[token("!=")]
    Ne,

    // Assignment and link operators
    #[token("=")]
    Equals,
    #[token("*=")]
    TimesEqual,
    #[token("/=")]
    DivEqual,
    #[token("%=")]
    ModEqual,
    #[token("+=")]
    PlusEqual,
    #[token("-=")]
    MinusEqual,
    #[token("<<=")]
    LShiftEqual,
    #[token(">>=")]
    RShiftEqual,
    #[token("&=")]
    AndEqual,
    #[token("|=")]
    OrEqual,
    #[token("^=")]
    XorEqual,
    #[token("<-")]
    InLink,
    #[token("..")]
    Range,
    #[token("::")]
    Scope,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Period,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
}

/// Coarse grouping of token kinds, used for statistics and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenCategory {
    Keyword,
    Identifier,
    Literal,
    Operator,
    Delimiter,
    Comment,
    Directive,
    Call,
}

impl TokenKind {
    /// Upper-case name used in token dumps.
    pub fn as_str(&self) -> &'static str {
        use TokenKind::*;
        match self {
            StringInit => "STRING_INIT",
            ArrayDef => "ARRAY_DEF",
            SysCall => "SYS_CALL",
            Pragma => "PRAGMA",
            Function => "FUNCTION",
            LineComment => "CPP_COMMENT",
            BlockComment => "C_COMMENT",
            Include => "INCLUDE",
            IncludePath => "INCLUDE_PATH",
            Identifier => "ID",
            IntConst => "ICONST",
            FloatConst => "FCONST",
            CharConst => "CCONST",
            StringConst => "SCONST",
            And => "AND",
            Bool => "BOOL",
            Break => "BREAK",
            By => "BY",
            Case => "CASE",
            Char => "CHAR",
            Const => "CONST",
            Continue => "CONTINUE",
            Default => "DEFAULT",
            Do => "DO",
            Else => "ELSE",
            ElseIf => "ELSEIF",
            Enum => "ENUM",
            For => "FOR",
            If => "IF",
            In => "IN",
            Int => "INT",
            Or => "OR",
            Real => "REAL",
            Return => "RETURN",
            Sizeof => "SIZEOF",
            Static => "STATIC",
            Struct => "STRUCT",
            String => "STRING",
            Switch => "SWITCH",
            Then => "THEN",
            Union => "UNION",
            Void => "VOID",
            While => "WHILE",
            Module => "MODULE",
            Object => "OBJECT",
            Skip => "SKIP",
            Buffer => "BUFFER",
            Template => "TEMPLATE",
            ModuleVersion => "MODULEVERSION",
            Date => "DATE",
            Link => "LINK",
            LinkRef => "LINKREF",
            Stream => "STREAM",
            Regexp => "REGEXP",
            AttrDef => "ATTRDEF",
            Db => "DB",
            Dbe => "DBE",
            Plus => "PLUS",
            Minus => "MINUS",
            Times => "TIMES",
            Divide => "DIVIDE",
            Mod => "MOD",
            BitOr => "OR_BIT",
            BitAnd => "AND_BIT",
            BitNot => "NOT_BIT",
            BitXor => "XOR",
            LShift => "LSHIFT",
            RShift => "RSHIFT",
            LogOr => "LOR",
            LogAnd => "LAND",
            LogNot => "LNOT",
            LtGt => "LTGT",
            Lt => "LT",
            Le => "LE",
            Gt => "GT",
            Ge => "GE",
            Eq => "EQ",
            Ne => "NE",
            Equals => "EQUALS",
            TimesEqual => "TIMESEQUAL",
            DivEqual => "DIVEQUAL",
            ModEqual => "MODEQUAL",
            PlusEqual => "PLUSEQUAL",
            MinusEqual => "MINUSEQUAL",
            LShiftEqual => "LSHIFTEQUAL",
            RShiftEqual => "RSHIFTEQUAL",
            AndEqual => "ANDEQUAL",
            OrEqual => "OREQUAL",
            XorEqual => "XOREQUAL",
            InLink => "INLINK",
            Range => "RANGE",
            Scope => "SCOPE",
            LParen => "LPAREN",
            RParen => "RPAREN",
            LBracket => "LBRACKET",
            RBracket => "RBRACKET",
            LBrace => "LBRACE",
            RBrace => "RBRACE",
            Comma => "COMMA",
            Period => "PERIOD",
            Semi => "SEMI",
            Colon => "COLON",
        }
    }

    pub fn category(&self) -> TokenCategory {
        use TokenKind::*;
        match self {
            StringInit | ArrayDef | Pragma | Include | IncludePath => TokenCategory::Directive,
            SysCall | Function => TokenCategory::Call,
            LineComment | BlockComment => TokenCategory::Comment,
            Identifier => TokenCategory::Identifier,
            IntConst | FloatConst | CharConst | StringConst => TokenCategory::Literal,
            LParen | RParen | LBracket | RBracket | LBrace | RBrace | Comma | Period | Semi
            | Colon => TokenCategory::Delimiter,
            kind if kind.is_keyword() => TokenCategory::Keyword,
            _ => TokenCategory::Operator,
        }
    }

    pub fn is_keyword(&self) -> bool {
        keywords::lookup(self.keyword_text()).is_some()
    }

    fn keyword_text(&self) -> &'static str {
        keywords::BASE_KEYWORDS
            .iter()
            .chain(keywords::DOMAIN_KEYWORDS.iter())
            .find(|(_, kind)| kind == self)
            .map(|(text, _)| *text)
            .unwrap_or("")
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lexical token. `line` is 1-based, `column` is the 0-based byte offset
/// from the start of that line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
        }
    }

    /// Number of line breaks inside the token text.
    pub fn newline_count(&self) -> usize {
        self.text.matches('\n').count()
    }
}

static STRING_INIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\Astring\s+[A-Za-z0-9_]+\s*=\s*").expect("valid regex"));
static ARRAY_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A([^\n]*)\[\]\s*=\s*\{[^\n]*\}").expect("valid regex"));
static SYS_CALL_LEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\Asystem(?:[ \t]?\([^\n]*\)|[ \t]?"[^\n]*"|[ \t][^\n]*)"#).expect("valid regex")
});
static SYS_CALL_ANYWHERE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A(?:win32SystemWait_[^\n]*|addMenu\b|allowNetworkMonitor\b)").expect("valid regex")
});
static PRAGMA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\Apragma\s(?:xflags|runLim|stack|encoding)(?:,[ \t]?[A-Za-z0-9_"-]*)?"#)
        .expect("valid regex")
});
static CALL_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A([A-Za-z0-9_]+)\s?\(").expect("valid regex"));
static LINE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A//[^\n\\]*(?:\\\s*[^\n\\]*)*").expect("valid regex"));
static BLOCK_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A(?s:/\*.*?\*/)").expect("valid regex"));

/// Facts about one source line that the line-oriented heuristics need.
/// Computed once per line, so a long line costs linear time overall.
#[derive(Debug, Clone, Copy)]
struct LineScan {
    start: usize,
    /// Offset of the `[` of the last array definition on the line and the
    /// end of that definition.
    array_def: Option<(usize, usize)>,
    /// End of the last `)` on the line that is not followed by `{`.
    call_close: Option<usize>,
}

impl LineScan {
    fn new(source: &str, start: usize) -> Self {
        let end = source[start..]
            .find('\n')
            .map_or(source.len(), |i| start + i);

        let array_def = if source[start..end].contains("[]") {
            ARRAY_DEF
                .captures(&source[start..])
                .and_then(|c| Some((start + c.get(1)?.end(), start + c.get(0)?.end())))
        } else {
            None
        };

        Self {
            start,
            array_def,
            call_close: last_call_close(source, start, end),
        }
    }
}

/// Streaming tokenizer over one source text.
///
/// A fresh `Lexer` is created per file; it borrows the text and yields
/// [`Token`]s in source order.
pub struct Lexer<'src> {
    source: &'src str,
    pos: usize,
    line: usize,
    line_start: usize,
    /// Only blanks between `line_start` and the cursor.
    at_line_start: bool,
    skipped: usize,
    line_scan: Option<LineScan>,
    /// Start of the last `*/` in the source.
    last_block_close: Option<usize>,
    /// First byte at or after some earlier `<` that ends an include path.
    include_stop: Option<usize>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            line_start: 0,
            at_line_start: true,
            skipped: 0,
            line_scan: None,
            last_block_close: source.rfind("*/"),
            include_stop: None,
        }
    }

    /// Characters skipped so far because nothing matched them.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Current 1-based line of the cursor.
    pub fn line(&self) -> usize {
        self.line
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.source.as_bytes();
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                    self.line_start = self.pos;
                    self.at_line_start = true;
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                0x0b | 0x0c => {
                    self.pos += 1;
                    self.at_line_start = false;
                }
                _ => break,
            }
        }
    }

    fn line_scan(&mut self) -> LineScan {
        let (source, start) = (self.source, self.line_start);
        match self.line_scan {
            Some(scan) if scan.start == start => scan,
            _ => *self.line_scan.insert(LineScan::new(source, start)),
        }
    }

    fn match_heuristic(&mut self, rest: &str) -> Option<(TokenKind, usize)> {
        if let Some(m) = STRING_INIT.find(rest) {
            return Some((TokenKind::StringInit, m.end()));
        }
        if let Some(len) = self.match_array_def() {
            return Some((TokenKind::ArrayDef, len));
        }
        if self.at_line_start {
            if let Some(m) = SYS_CALL_LEADING.find(rest) {
                return Some((TokenKind::SysCall, m.end()));
            }
        }
        if let Some(m) = SYS_CALL_ANYWHERE.find(rest) {
            return Some((TokenKind::SysCall, m.end()));
        }
        if let Some(m) = PRAGMA.find(rest) {
            return Some((TokenKind::Pragma, m.end()));
        }
        if let Some(len) = self.match_call(rest) {
            return Some((TokenKind::Function, len));
        }
        if let Some(m) = LINE_COMMENT.find(rest) {
            return Some((TokenKind::LineComment, m.end()));
        }
        if rest.starts_with("/*") && self.last_block_close.is_some_and(|i| i >= self.pos + 2) {
            if let Some(m) = BLOCK_COMMENT.find(rest) {
                return Some((TokenKind::BlockComment, m.end()));
            }
        }
        None
    }

    /// Everything from the cursor through the last array definition of the
    /// line, when that definition's `[]` is not behind the cursor.
    fn match_array_def(&mut self) -> Option<usize> {
        let pos = self.pos;
        let (bracket, end) = self.line_scan().array_def?;
        (pos <= bracket).then(|| end - pos)
    }

    /// A name, optional blank, `(`, then the longest stretch of the line up
    /// to a `)` that is not followed by `{`. Control-flow keywords never match.
    fn match_call(&mut self, rest: &str) -> Option<usize> {
        let head = CALL_HEAD.captures(rest)?;
        if keywords::is_control_flow(head.get(1)?.as_str()) {
            return None;
        }

        let head = head.get(0)?.as_str();
        let open_end = head.len();
        if head.contains('\n') {
            // `(` sits on the next line
            let line_end = rest[open_end..]
                .find('\n')
                .map_or(rest.len(), |i| open_end + i);
            return last_call_close(rest, open_end, line_end);
        }

        let pos = self.pos;
        let close = self.line_scan().call_close?;
        (close > pos + open_end).then(|| close - pos)
    }

    /// The text the lexeme scanner may look at. An include path ends at the
    /// first `>`, `;`, `)`, `+` or newline after its first character, so a
    /// `<` never needs more than that.
    fn lexeme_window(&mut self, rest: &'src str) -> &'src str {
        if !rest.starts_with('<') {
            return rest;
        }
        let from = self.pos + 2;
        let stop = match self.include_stop {
            Some(stop) if stop >= from => stop,
            _ => {
                let bytes = self.source.as_bytes();
                let stop = bytes
                    .get(from..)
                    .and_then(|tail| {
                        tail.iter()
                            .position(|b| matches!(b, b'>' | b';' | b')' | b'+' | b'\n'))
                    })
                    .map_or(bytes.len(), |i| from + i);
                self.include_stop = Some(stop);
                stop
            }
        };
        &rest[..(stop + 1).min(self.source.len()) - self.pos]
    }

    fn emit(&mut self, kind: TokenKind, len: usize) -> Token {
        let text = &self.source[self.pos..self.pos + len];
        let kind = match kind {
            TokenKind::Identifier => keywords::lookup(text).unwrap_or(kind),
            other => other,
        };
        let token = Token::new(kind, text, self.line, self.pos - self.line_start);

        self.at_line_start = false;
        let newlines = text.matches('\n').count();
        if newlines > 0 {
            self.line += newlines;
            if let Some(last) = text.rfind('\n') {
                self.line_start = self.pos + last + 1;
                self.at_line_start = text[last + 1..]
                    .bytes()
                    .all(|b| b == b' ' || b == b'\t' || b == b'\r');
            }
        }
        self.pos += len;
        token
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            self.skip_whitespace();
            if self.pos >= self.source.len() {
                return None;
            }

            let source = self.source;
            let rest = &source[self.pos..];
            let matched = match self.match_heuristic(rest) {
                Some(found) => Some(found),
                None => match_lexeme(self.lexeme_window(rest)),
            };
            match matched {
                Some((kind, len)) if len > 0 => return Some(self.emit(kind, len)),
                _ => {
                    let width = rest.chars().next().map_or(1, char::len_utf8);
                    tracing::trace!(
                        line = self.line,
                        "skipping illegal character {:?}",
                        &rest[..width]
                    );
                    self.pos += width;
                    self.skipped += 1;
                    self.at_line_start = false;
                }
            }
        }
    }
}

/// End of the last `)` in `text[from..to]` that is not followed by `{`.
fn last_call_close(text: &str, from: usize, to: usize) -> Option<usize> {
    text[from..to]
        .rmatch_indices(')')
        .map(|(i, _)| from + i + 1)
        .find(|&close_end| !text[close_end..].trim_start().starts_with('{'))
}

fn match_lexeme(rest: &str) -> Option<(TokenKind, usize)> {
    let mut lex = TokenKind::lexer(rest);
    match lex.next() {
        Some(Ok(kind)) if lex.span().start == 0 => Some((kind, lex.span().end)),
        _ => None,
    }
}

/// Tokenizes a whole text. Never fails; unmatched characters are skipped.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(text);
    let tokens: Vec<Token> = lexer.by_ref().collect();
    if lexer.skipped() > 0 {
        tracing::debug!(skipped = lexer.skipped(), "illegal characters skipped");
    }
    tokens
}

/// Token statistics for analysis and reporting
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStats {
    pub total: usize,
    pub keywords: usize,
    pub identifiers: usize,
    pub literals: usize,
    pub operators: usize,
    pub delimiters: usize,
    pub comments: usize,
    pub directives: usize,
    pub calls: usize,
}

impl TokenStats {
    pub fn from_tokens(tokens: &[Token]) -> Self {
        let mut stats = TokenStats::default();
        for token in tokens {
            stats.add(token.kind);
        }
        stats
    }

    pub fn add(&mut self, kind: TokenKind) {
        self.total += 1;
        match kind.category() {
            TokenCategory::Keyword => self.keywords += 1,
            TokenCategory::Identifier => self.identifiers += 1,
            TokenCategory::Literal => self.literals += 1,
            TokenCategory::Operator => self.operators += 1,
            TokenCategory::Delimiter => self.delimiters += 1,
            TokenCategory::Comment => self.comments += 1,
            TokenCategory::Directive => self.directives += 1,
            TokenCategory::Call => self.calls += 1,
        }
    }

    pub fn merge(&mut self, other: &TokenStats) {
        self.total += other.total;
        self.keywords += other.keywords;
        self.identifiers += other.identifiers;
        self.literals += other.literals;
        self.operators += other.operators;
        self.delimiters += other.delimiters;
        self.comments += other.comments;
        self.directives += other.directives;
        self.calls += other.calls;
    }
}

impl fmt::Display for TokenStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Token Statistics:")?;
        writeln!(f, "  Total tokens: {}", self.total)?;
        writeln!(f, "  Keywords: {}", self.keywords)?;
        writeln!(f, "  Identifiers: {}", self.identifiers)?;
        writeln!(f, "  Literals: {}", self.literals)?;
        writeln!(f, "  Operators: {}", self.operators)?;
        writeln!(f, "  Delimiters: {}", self.delimiters)?;
        writeln!(f, "  Comments: {}", self.comments)?;
        writeln!(f, "  Directives: {}", self.directives)?;
        writeln!(f, "  Calls: {}", self.calls)?;
        Ok(())
    }
}
