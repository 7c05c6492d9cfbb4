use super::token::{Token, TokenKind};
use crate::error::{Error, Result};

/// Scanner for the bracketed expression syntax
///
/// Atoms are separated by whitespace or commas. `[` and `]` delimit groups,
/// `"` delimits strings, and inside a string `\` makes the following
/// character literal.
pub struct Scanner {
    /// Source text as character vector
    source: Vec<char>,
    /// Accumulated tokens
    tokens: Vec<Token>,
    /// Start position of current token
    start: usize,
    /// Current position in source
    current: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// Column where the current token started
    start_column: usize,
    /// Line where the current token started
    start_line: usize,
    /// Brackets opened and not yet closed
    depth: usize,
}

impl Scanner {
    /// Creates a new scanner from source text
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            start_column: 1,
            start_line: 1,
            depth: 0,
        }
    }

    /// Number of characters in the source
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// True when the source is empty
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Scans all tokens and returns them, terminated by an `Eof` token whose
    /// offset is the source length
    ///
    /// An unterminated string is reported as [`Error::UnclosedGroup`] since more
    /// input may still close it.
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.source.len(),
            self.line,
            self.column,
        ));

        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self) -> Result<()> {
        let c = self.advance();

        match c {
            // Separators
            ',' => {}
            c if c.is_whitespace() => {}

            '[' => {
                self.depth += 1;
                self.add_token(TokenKind::LeftBracket);
            }
            ']' => {
                self.depth = self.depth.saturating_sub(1);
                self.add_token(TokenKind::RightBracket);
            }

            '"' => self.scan_string()?,

            _ => self.scan_atom()?,
        }

        Ok(())
    }

    fn scan_string(&mut self) -> Result<()> {
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != '"' {
            if self.peek() == '\\' {
                self.advance();
                if self.is_at_end() {
                    break;
                }
            }
            value.push(self.advance());
        }

        if self.is_at_end() {
            return Err(Error::UnclosedGroup {
                open: self.depth + 1,
            });
        }

        self.advance(); // Closing "

        self.add_token(TokenKind::Text(value));
        Ok(())
    }

    fn scan_atom(&mut self) -> Result<()> {
        while !self.is_at_end() && !is_delimiter(self.peek()) {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let kind = classify_atom(&text).map_err(|message| Error::MalformedExpression {
            position: self.start,
            message,
        })?;

        self.add_token(kind);
        Ok(())
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme: String = self.source[self.start..self.current].iter().collect();
        self.tokens.push(Token::new(
            kind,
            lexeme,
            self.start,
            self.start_line,
            self.start_column,
        ));
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '[' | ']' | '"' | ',')
}

/// Decides what a bare atom is.
///
/// `-?\d+\.\d+`, `-?\d+[dD]` and either mantissa form followed by an
/// `[eE][+-]?\d+` exponent are floats, `-?\d+[lL]?` are integers,
/// `true`/`false` are booleans and everything else is a word.
fn classify_atom(text: &str) -> std::result::Result<TokenKind, String> {
    match text {
        "true" => return Ok(TokenKind::Bool(true)),
        "false" => return Ok(TokenKind::Bool(false)),
        _ => {}
    }

    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    let is_mantissa = |s: &str| match s.split_once('.') {
        Some((whole, fraction)) => all_digits(whole) && all_digits(fraction),
        None => all_digits(s),
    };

    if let Some((mantissa, exponent)) = unsigned.split_once(['e', 'E']) {
        let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
        if is_mantissa(mantissa) && all_digits(exponent) {
            return text
                .parse()
                .map(TokenKind::Float)
                .map_err(|_| format!("invalid decimal literal {}", text));
        }
        return Ok(TokenKind::Word(text.to_string()));
    }

    if let Some((whole, fraction)) = unsigned.split_once('.') {
        if all_digits(whole) && all_digits(fraction) {
            return text
                .parse()
                .map(TokenKind::Float)
                .map_err(|_| format!("invalid decimal literal {}", text));
        }
        return Ok(TokenKind::Word(text.to_string()));
    }

    if let Some(digits) = unsigned.strip_suffix(['d', 'D']) {
        if all_digits(digits) {
            return text[..text.len() - 1]
                .parse()
                .map(TokenKind::Float)
                .map_err(|_| format!("invalid decimal literal {}", text));
        }
    }

    let (number, suffixed) = match unsigned.strip_suffix(['l', 'L']) {
        Some(digits) => (digits, true),
        None => (unsigned, false),
    };
    if all_digits(number) {
        let literal = if suffixed {
            &text[..text.len() - 1]
        } else {
            text
        };
        return literal
            .parse()
            .map(TokenKind::Integer)
            .map_err(|_| format!("integer literal {} out of range", text));
    }

    Ok(TokenKind::Word(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_group() {
        let mut scanner = Scanner::new("[add 1 2]");
        let tokens = scanner.scan_tokens().unwrap();

        assert_eq!(tokens.len(), 6); // [ add 1 2 ] EOF
        assert_eq!(tokens[0].kind, TokenKind::LeftBracket);
        assert_eq!(tokens[1].kind, TokenKind::Word("add".to_string()));
        assert_eq!(tokens[2].kind, TokenKind::Integer(1));
        assert_eq!(tokens[3].kind, TokenKind::Integer(2));
        assert_eq!(tokens[4].kind, TokenKind::RightBracket);
        assert_eq!(tokens[5].kind, TokenKind::Eof);
        assert_eq!(tokens[5].offset, 9);
    }

    #[test]
    fn test_number_forms() {
        let mut scanner = Scanner::new("1 -2 3L 4.5 -0.5 6d 7D x1 1x - 1.x");
        let kinds: Vec<TokenKind> = scanner
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect();

        assert_eq!(
            kinds,
            vec![
                TokenKind::Integer(1),
                TokenKind::Integer(-2),
                TokenKind::Integer(3),
                TokenKind::Float(4.5),
                TokenKind::Float(-0.5),
                TokenKind::Float(6.0),
                TokenKind::Float(7.0),
                TokenKind::Word("x1".to_string()),
                TokenKind::Word("1x".to_string()),
                TokenKind::Word("-".to_string()),
                TokenKind::Word("1.x".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_exponent_forms() {
        let mut scanner = Scanner::new("1e20 1e-5 -2.5E+3 1.5e300 e5 1e 1e+ 2.e3 else");
        let kinds: Vec<TokenKind> = scanner
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect();

        assert_eq!(
            kinds,
            vec![
                TokenKind::Float(1e20),
                TokenKind::Float(1e-5),
                TokenKind::Float(-2500.0),
                TokenKind::Float(1.5e300),
                TokenKind::Word("e5".to_string()),
                TokenKind::Word("1e".to_string()),
                TokenKind::Word("1e+".to_string()),
                TokenKind::Word("2.e3".to_string()),
                TokenKind::Word("else".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_commas_separate() {
        let mut scanner = Scanner::new("[list 1,2 , 3]");
        let tokens = scanner.scan_tokens().unwrap();
        assert_eq!(tokens.len(), 7);
    }

    #[test]
    fn test_string_escapes() {
        let mut scanner = Scanner::new(r#""a \"quoted\" [bracket] \\ back""#);
        let tokens = scanner.scan_tokens().unwrap();
        assert_eq!(
            tokens[0].kind,
            TokenKind::Text(r#"a "quoted" [bracket] \ back"#.to_string())
        );
    }

    #[test]
    fn test_unterminated_string_is_unclosed() {
        let mut scanner = Scanner::new("[print \"abc");
        match scanner.scan_tokens() {
            Err(Error::UnclosedGroup { open }) => assert_eq!(open, 2),
            other => panic!("expected UnclosedGroup, got {:?}", other),
        }
    }

    #[test]
    fn test_integer_overflow_is_malformed() {
        let mut scanner = Scanner::new("99999999999999999999");
        assert!(matches!(
            scanner.scan_tokens(),
            Err(Error::MalformedExpression { position: 0, .. })
        ));
    }

    #[test]
    fn test_dotted_words() {
        let mut scanner = Scanner::new("[log.info dict.get | =>]");
        let tokens = scanner.scan_tokens().unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Word("log.info".to_string()));
        assert_eq!(tokens[2].kind, TokenKind::Word("dict.get".to_string()));
        assert_eq!(tokens[3].kind, TokenKind::Word("|".to_string()));
        assert_eq!(tokens[4].kind, TokenKind::Word("=>".to_string()));
    }
}
