//! Expression parser module
//!
//! Parses the bracketed syntax into [`Expression`] trees and reports
//! unbalanced input as either malformed or still open.

mod ast;
mod sexpr_parser;

pub use ast::Expression;
pub use sexpr_parser::{parse, ExpressionParser};
