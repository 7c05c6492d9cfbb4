use serde::{Deserialize, Serialize};
use std::fmt;

/// A single token from the source text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Character offset where the token starts (0-indexed)
    pub offset: usize,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, offset: usize, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            offset,
            line,
            column,
        }
    }
}

/// All possible token types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Integer literal (`42`, `-7`, `42L`)
    Integer(i64),
    /// Floating-point literal (`1.5`, `-0.25`, `3D`)
    Float(f64),
    /// `true` or `false`
    Bool(bool),
    /// Quoted string with escapes already removed
    Text(String),
    /// Any other bare atom
    Word(String),

    // Delimiters
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,

    /// End of input
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::Float(x) => write!(f, "{:?}", x),
            TokenKind::Bool(b) => write!(f, "{}", b),
            TokenKind::Text(s) => write!(f, "\"{}\"", s),
            TokenKind::Word(w) => write!(f, "{}", w),
            TokenKind::LeftBracket => write!(f, "["),
            TokenKind::RightBracket => write!(f, "]"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}
