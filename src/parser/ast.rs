use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Parsed expression: an atom or a bracketed sequence of expressions
///
/// Sequences share their elements through an `Arc` so that argument
/// iterators and closures can hold on to a body without copying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Integer literal
    Int(i64),
    /// Floating-point literal
    Float(f64),
    /// `true` / `false`
    Bool(bool),
    /// Bare word such as a function name
    Word(String),
    /// Quoted string
    Text(String),
    /// Bracketed group `[head arg ...]`
    Sequence(Arc<[Expression]>),
}

impl Expression {
    /// Builds a sequence expression
    pub fn sequence(items: Vec<Expression>) -> Self {
        Expression::Sequence(items.into())
    }

    /// Builds a word atom
    pub fn word(name: impl Into<String>) -> Self {
        Expression::Word(name.into())
    }

    /// Returns true for anything that is not a sequence
    pub fn is_atom(&self) -> bool {
        !matches!(self, Expression::Sequence(_))
    }

    /// Name carried by a word or string atom
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Expression::Word(s) | Expression::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Int(n) => write!(f, "{}", n),
            // Debug keeps a decimal point or an exponent, both read back as floats
            Expression::Float(x) => write!(f, "{:?}", x),
            Expression::Bool(b) => write!(f, "{}", b),
            Expression::Word(w) => write!(f, "{}", w),
            Expression::Text(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        write!(f, "\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, "\"")
            }
            Expression::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}
