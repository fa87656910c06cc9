//! Reserved words of the DXL language.
//!
//! Two tiers: the C-like base keywords, always lower case, and the
//! domain keywords of the host tool, which are title-cased (`ModuleVersion`)
//! except for the fixed-case `DB` and `DBE`.

use super::lexer::TokenKind;

pub const BASE_KEYWORDS: &[(&str, TokenKind)] = &[
    ("and", TokenKind::And),
    ("bool", TokenKind::Bool),
    ("break", TokenKind::Break),
    ("by", TokenKind::By),
    ("case", TokenKind::Case),
    ("char", TokenKind::Char),
    ("const", TokenKind::Const),
    ("continue", TokenKind::Continue),
    ("default", TokenKind::Default),
    ("do", TokenKind::Do),
    ("else", TokenKind::Else),
    ("elseif", TokenKind::ElseIf),
    ("enum", TokenKind::Enum),
    ("for", TokenKind::For),
    ("if", TokenKind::If),
    ("in", TokenKind::In),
    ("int", TokenKind::Int),
    ("or", TokenKind::Or),
    ("real", TokenKind::Real),
    ("return", TokenKind::Return),
    ("sizeof", TokenKind::Sizeof),
    ("static", TokenKind::Static),
    ("struct", TokenKind::Struct),
    ("string", TokenKind::String),
    ("switch", TokenKind::Switch),
    ("then", TokenKind::Then),
    ("union", TokenKind::Union),
    ("void", TokenKind::Void),
    ("while", TokenKind::While),
];

pub const DOMAIN_KEYWORDS: &[(&str, TokenKind)] = &[
    ("Module", TokenKind::Module),
    ("Object", TokenKind::Object),
    ("Skip", TokenKind::Skip),
    ("Buffer", TokenKind::Buffer),
    ("Template", TokenKind::Template),
    ("ModuleVersion", TokenKind::ModuleVersion),
    ("Date", TokenKind::Date),
    ("Link", TokenKind::Link),
    ("LinkRef", TokenKind::LinkRef),
    ("Stream", TokenKind::Stream),
    ("Regexp", TokenKind::Regexp),
    ("AttrDef", TokenKind::AttrDef),
    ("DB", TokenKind::Db),
    ("DBE", TokenKind::Dbe),
];

/// Names that look like calls but are statements: `if (x)`, `while (y)`.
pub const CONTROL_FLOW: &[&str] = &["if", "else", "for", "while"];

/// Type names that turn a following call-shaped token into a declaration.
pub const TYPE_KEYWORDS: &[TokenKind] = &[
    TokenKind::Bool,
    TokenKind::Char,
    TokenKind::Int,
    TokenKind::String,
    TokenKind::Real,
    TokenKind::Void,
    TokenKind::Object,
    TokenKind::Module,
];

/// Case-sensitive reserved word lookup.
pub fn lookup(word: &str) -> Option<TokenKind> {
    BASE_KEYWORDS
        .iter()
        .chain(DOMAIN_KEYWORDS.iter())
        .find(|(text, _)| *text == word)
        .map(|(_, kind)| *kind)
}

pub fn is_type_keyword(kind: TokenKind) -> bool {
    TYPE_KEYWORDS.contains(&kind)
}

pub fn is_control_flow(name: &str) -> bool {
    CONTROL_FLOW.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_keywords_are_lower_case_only() {
        assert_eq!(lookup("while"), Some(TokenKind::While));
        assert_eq!(lookup("While"), None);
        assert_eq!(lookup("WHILE"), None);
    }

    #[test]
    fn test_domain_keywords_keep_their_case() {
        assert_eq!(lookup("Module"), Some(TokenKind::Module));
        assert_eq!(lookup("module"), None);
        assert_eq!(lookup("ModuleVersion"), Some(TokenKind::ModuleVersion));
        assert_eq!(lookup("DB"), Some(TokenKind::Db));
        assert_eq!(lookup("Db"), None);
    }

    #[test]
    fn test_type_keywords() {
        assert!(is_type_keyword(TokenKind::Void));
        assert!(is_type_keyword(TokenKind::Object));
        assert!(!is_type_keyword(TokenKind::Skip));
        assert!(!is_type_keyword(TokenKind::Identifier));
    }
}
