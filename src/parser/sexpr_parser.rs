use super::ast::Expression;
use crate::error::{Error, Result};
use crate::lexer::{Scanner, Token, TokenKind};

/// Recursive-descent parser for bracketed expressions
///
/// The parser keeps a cursor into the token stream. [`position`](Self::position)
/// reports the character offset of the next unread token, which equals the
/// source length once everything has been consumed.
pub struct ExpressionParser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
}

impl ExpressionParser {
    /// Creates a parser over already scanned tokens
    ///
    /// The token list must end with an `Eof` token, as produced by [`Scanner::scan_tokens`].
    pub fn new(tokens: Vec<Token>) -> Self {
        ExpressionParser {
            tokens,
            current: 0,
            depth: 0,
        }
    }

    /// Scans `source` and creates a parser over it
    pub fn from_source(source: &str) -> Result<Self> {
        let tokens = Scanner::new(source).scan_tokens()?;
        Ok(Self::new(tokens))
    }

    /// Parses the next top-level expression, or `None` when the input is used up
    pub fn parse_next(&mut self) -> Result<Option<Expression>> {
        if self.is_at_end() {
            return Ok(None);
        }
        self.depth = 0;
        self.parse_expression().map(Some)
    }

    /// Parses every remaining top-level expression
    pub fn parse_all(&mut self) -> Result<Vec<Expression>> {
        let mut expressions = Vec::new();
        while let Some(expr) = self.parse_next()? {
            expressions.push(expr);
        }
        Ok(expressions)
    }

    /// Character offset of the next unread token
    pub fn position(&self) -> usize {
        self.peek().offset
    }

    /// True once every token has been consumed
    pub fn is_consumed(&self) -> bool {
        self.is_at_end()
    }

    fn parse_expression(&mut self) -> Result<Expression> {
        let token = self.advance();
        match token.kind {
            TokenKind::LeftBracket => self.parse_sequence(),
            TokenKind::RightBracket => Err(Error::MalformedExpression {
                position: token.offset,
                message: "unmatched ]".to_string(),
            }),
            TokenKind::Integer(n) => Ok(Expression::Int(n)),
            TokenKind::Float(x) => Ok(Expression::Float(x)),
            TokenKind::Bool(b) => Ok(Expression::Bool(b)),
            TokenKind::Text(s) => Ok(Expression::Text(s)),
            TokenKind::Word(w) => Ok(Expression::Word(w)),
            TokenKind::Eof => Err(Error::UnclosedGroup { open: self.depth }),
        }
    }

    fn parse_sequence(&mut self) -> Result<Expression> {
        self.depth += 1;
        let mut items = Vec::new();

        loop {
            match self.peek().kind {
                TokenKind::RightBracket => {
                    self.advance();
                    self.depth -= 1;
                    return Ok(Expression::sequence(items));
                }
                TokenKind::Eof => return Err(Error::UnclosedGroup { open: self.depth }),
                _ => items.push(self.parse_expression()?),
            }
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        // scan_tokens always terminates the stream with Eof
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }
}

/// Parses the first expression in `text`
///
/// Returns the expression and the cursor position after it. Trailing
/// whitespace is skipped, so `position == text.chars().count()` means the
/// input was fully consumed.
pub fn parse(text: &str) -> Result<(Expression, usize)> {
    let mut parser = ExpressionParser::from_source(text)?;
    match parser.parse_next()? {
        Some(expr) => Ok((expr, parser.position())),
        None => Err(Error::MalformedExpression {
            position: parser.position(),
            message: "empty input".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let (expr, position) = parse("[if [gt 2 1] \"yes\" no]").unwrap();
        assert_eq!(position, 22);
        assert_eq!(
            expr,
            Expression::sequence(vec![
                Expression::word("if"),
                Expression::sequence(vec![
                    Expression::word("gt"),
                    Expression::Int(2),
                    Expression::Int(1),
                ]),
                Expression::Text("yes".to_string()),
                Expression::word("no"),
            ])
        );
    }

    #[test]
    fn test_unclosed_group() {
        match parse("[gt 1") {
            Err(Error::UnclosedGroup { open }) => assert_eq!(open, 1),
            other => panic!("expected UnclosedGroup, got {:?}", other),
        }
        match parse("[a [b [c]") {
            Err(Error::UnclosedGroup { open }) => assert_eq!(open, 2),
            other => panic!("expected UnclosedGroup, got {:?}", other),
        }
    }

    #[test]
    fn test_unmatched_close_is_malformed() {
        assert!(matches!(
            parse("]"),
            Err(Error::MalformedExpression { position: 0, .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            parse("   "),
            Err(Error::MalformedExpression { .. })
        ));
    }

    #[test]
    fn test_position_stops_after_first_expression() {
        let (_, position) = parse("[a] [b]").unwrap();
        assert_eq!(position, 4);

        let (_, position) = parse("[a]   \n").unwrap();
        assert_eq!(position, 7);
    }

    #[test]
    fn test_parse_all() {
        let mut parser = ExpressionParser::from_source("1 [b] \"c\"").unwrap();
        let all = parser.parse_all().unwrap();
        assert_eq!(all.len(), 3);
        assert!(parser.is_consumed());
    }

    #[test]
    fn test_trailing_close_after_complete_expression() {
        let mut parser = ExpressionParser::from_source("[a]]").unwrap();
        assert!(parser.parse_next().unwrap().is_some());
        assert!(matches!(
            parser.parse_next(),
            Err(Error::MalformedExpression { position: 3, .. })
        ));
    }
}
