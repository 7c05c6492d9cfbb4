//! Lexical analysis for itrex
//!
//! Converts source text into a stream of tokens. Every token records the
//! character offset it starts at so the parser can report how much of the
//! input it consumed.

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{Token, TokenKind};
