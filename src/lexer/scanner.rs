use super::token::{Keyword, Literal, Symbol, Token, TokenKind};
use crate::error::{Error, Result};

/// Scanner for Cambridge-style pseudocode source text
///
/// Single left-to-right pass. Lexical classes are tried in priority order:
/// whitespace and comments are discarded, multi-character symbols (`<-`,
/// `<>`, `<=`, `>=`) are matched before their one-character prefixes, and
/// identifier-shaped lexemes are checked against the reserved-word table
/// before being classified as identifiers. Newlines carry no tokens; the
/// language's statement boundaries are keyword-encoded.
pub struct Scanner {
    /// Source code as character vector
    source: Vec<char>,
    /// Accumulated tokens
    tokens: Vec<Token>,
    /// Start position of the current token
    start: usize,
    /// Current position in source
    current: usize,
    /// Current line number (0-indexed)
    line: usize,
    /// Offset of the character following the most recent newline
    line_start: usize,
}

impl Scanner {
    /// Creates a new scanner from source code
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 0,
            line_start: 0,
        }
    }

    /// Scans all tokens and returns them, terminated by an Eof sentinel
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>> {
        tracing::debug!(chars = self.source.len(), "tokenizing source");

        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.start = self.current;
        self.push_token(TokenKind::Eof);

        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self) -> Result<()> {
        let c = self.advance();

        match c {
            ' ' | '\t' | '\r' => {}

            '\n' => {
                self.line += 1;
                self.line_start = self.current;
            }

            // Comments: `// ...`, `# ...` to end of line, `/* ... */` block
            '#' => self.skip_line_comment(),
            '/' => {
                if self.match_char('/') {
                    self.skip_line_comment();
                } else if self.match_char('*') {
                    self.skip_block_comment()?;
                } else {
                    self.push_token(TokenKind::Symbol(Symbol::Div));
                }
            }

            '(' => self.push_token(TokenKind::Symbol(Symbol::LeftParen)),
            ')' => self.push_token(TokenKind::Symbol(Symbol::RightParen)),
            '[' => self.push_token(TokenKind::Symbol(Symbol::LeftBracket)),
            ']' => self.push_token(TokenKind::Symbol(Symbol::RightBracket)),
            ',' => self.push_token(TokenKind::Symbol(Symbol::Comma)),
            ':' => self.push_token(TokenKind::Symbol(Symbol::Colon)),
            '=' => self.push_token(TokenKind::Symbol(Symbol::Equal)),
            '+' => self.push_token(TokenKind::Symbol(Symbol::Add)),
            '-' => self.push_token(TokenKind::Symbol(Symbol::Sub)),
            '*' => self.push_token(TokenKind::Symbol(Symbol::Mul)),
            '^' => self.push_token(TokenKind::Symbol(Symbol::Pow)),

            // Two-character symbols are matched greedily before their
            // one-character prefixes
            '<' => {
                if self.match_char('-') {
                    self.push_token(TokenKind::Symbol(Symbol::Assign));
                } else if self.match_char('>') {
                    self.push_token(TokenKind::Symbol(Symbol::NotEqual));
                } else if self.match_char('=') {
                    self.push_token(TokenKind::Symbol(Symbol::LessEqual));
                } else {
                    self.push_token(TokenKind::Symbol(Symbol::Less));
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.push_token(TokenKind::Symbol(Symbol::GreaterEqual));
                } else {
                    self.push_token(TokenKind::Symbol(Symbol::Greater));
                }
            }

            '"' => self.scan_string()?,

            c if c.is_ascii_digit() => self.scan_number()?,

            // Identifier-shaped lexemes; reserved words win
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_word(),

            _ => {
                return Err(Error::LexError {
                    line: self.line,
                    column: self.start - self.line_start,
                    character: c,
                });
            }
        }

        Ok(())
    }

    fn skip_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        loop {
            if self.is_at_end() {
                return Err(Error::InvalidLiteral {
                    line: self.line,
                    column: self.start - self.line_start,
                    message: "unterminated block comment".to_string(),
                });
            }
            let c = self.advance();
            if c == '\n' {
                self.line += 1;
                self.line_start = self.current;
            } else if c == '*' && self.match_char('/') {
                return Ok(());
            }
        }
    }

    fn scan_string(&mut self) -> Result<()> {
        // Positions are anchored at the opening quote so an unterminated
        // string reports where it began, not where the input ran out
        let (line, column) = (self.line, self.start - self.line_start);
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != '"' {
            if self.peek() == '\\' {
                // A bad escape points at its own backslash, not the quote
                let (escape_line, escape_column) = (self.line, self.current - self.line_start);
                self.advance();
                if self.is_at_end() {
                    break;
                }
                let escaped = self.advance();
                match escaped {
                    'n' => value.push('\n'),
                    '\\' => value.push('\\'),
                    '"' => value.push('"'),
                    _ => {
                        return Err(Error::InvalidLiteral {
                            line: escape_line,
                            column: escape_column,
                            message: format!("invalid escape sequence \\{}", escaped),
                        });
                    }
                }
            } else {
                let c = self.advance();
                if c == '\n' {
                    self.line += 1;
                    self.line_start = self.current;
                }
                value.push(c);
            }
        }

        if self.is_at_end() {
            return Err(Error::InvalidLiteral {
                line,
                column,
                message: "unterminated string".to_string(),
            });
        }

        self.advance(); // closing "
        self.push_token(TokenKind::Literal(Literal::Str(value)));
        Ok(())
    }

    fn scan_number(&mut self) -> Result<()> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let mut is_real = false;
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_real = true;
            self.advance(); // consume .
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let column = self.start - self.line_start;

        let literal = if is_real {
            let value: f64 = text.parse().map_err(|_| Error::InvalidLiteral {
                line: self.line,
                column,
                message: format!("invalid real literal {}", text),
            })?;
            Literal::Real(value)
        } else {
            let value: i64 = text.parse().map_err(|_| Error::InvalidLiteral {
                line: self.line,
                column,
                message: format!("invalid integer literal {}", text),
            })?;
            Literal::Integer(value)
        };

        self.push_token(TokenKind::Literal(literal));
        Ok(())
    }

    fn scan_word(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();

        let kind = match Keyword::lookup(&text) {
            Some(Keyword::True) => TokenKind::Literal(Literal::Boolean(true)),
            Some(Keyword::False) => TokenKind::Literal(Literal::Boolean(false)),
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier(text),
        };

        self.push_token(kind);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1]
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.current += 1;
            true
        }
    }

    fn push_token(&mut self, kind: TokenKind) {
        let column = self.start.saturating_sub(self.line_start);
        self.tokens.push(Token::new(kind, self.line, column));
    }
}

/// Convenience entry point: tokenize a complete source string
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Scanner::new(source).scan_tokens()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_statement() {
        let tokens = tokenize("DECLARE Counter : INTEGER").unwrap();
        assert_eq!(tokens.len(), 5); // DECLARE Counter : INTEGER EOF
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Declare));
        assert_eq!(tokens[1].kind, TokenKind::Identifier("Counter".to_string()));
        assert_eq!(tokens[2].kind, TokenKind::Symbol(Symbol::Colon));
        assert_eq!(tokens[3].kind, TokenKind::Keyword(Keyword::Integer));
        assert_eq!(tokens[4].kind, TokenKind::Eof);
    }

    #[test]
    fn test_assignment_arrow() {
        let tokens = tokenize("x <- 5").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Symbol(Symbol::Assign));
        assert_eq!(tokens[2].kind, TokenKind::Literal(Literal::Integer(5)));
    }

    #[test]
    fn test_two_char_symbols_before_prefixes() {
        let tokens = tokenize("<- <> <= >= < >").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds[..6],
            [
                TokenKind::Symbol(Symbol::Assign),
                TokenKind::Symbol(Symbol::NotEqual),
                TokenKind::Symbol(Symbol::LessEqual),
                TokenKind::Symbol(Symbol::GreaterEqual),
                TokenKind::Symbol(Symbol::Less),
                TokenKind::Symbol(Symbol::Greater),
            ]
        );
    }

    #[test]
    fn test_numeric_literals() {
        let tokens = tokenize("42 3.25").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Literal(Literal::Integer(42)));
        assert_eq!(tokens[1].kind, TokenKind::Literal(Literal::Real(3.25)));
    }

    #[test]
    fn test_string_escapes_decoded() {
        let tokens = tokenize(r#""a\"b\nc\\d""#).unwrap();
        assert_eq!(
            tokens[0].kind,
            TokenKind::Literal(Literal::Str("a\"b\nc\\d".to_string()))
        );
    }

    #[test]
    fn test_booleans_are_literals() {
        let tokens = tokenize("TRUE FALSE").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Literal(Literal::Boolean(true)));
        assert_eq!(tokens[1].kind, TokenKind::Literal(Literal::Boolean(false)));
    }

    #[test]
    fn test_comments_discarded() {
        let tokens = tokenize("// line\n# hash\n/* block\nstill */ OUTPUT 1").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Output));
        assert_eq!(tokens[1].kind, TokenKind::Literal(Literal::Integer(1)));
    }

    #[test]
    fn test_positions_zero_based() {
        let tokens = tokenize("OUTPUT 1\nOUTPUT 2").unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (0, 0));
        assert_eq!((tokens[1].line, tokens[1].column), (0, 7));
        assert_eq!((tokens[2].line, tokens[2].column), (1, 0));
        assert_eq!((tokens[3].line, tokens[3].column), (1, 7));
    }

    #[test]
    fn test_invalid_character_reports_location() {
        let err = tokenize("OUTPUT 1\n  ;").unwrap_err();
        assert_eq!(
            err,
            Error::LexError {
                line: 1,
                column: 2,
                character: ';'
            }
        );
    }

    #[test]
    fn test_unterminated_string_reports_opening_quote() {
        let err = tokenize("OUTPUT \"abc").unwrap_err();
        match err {
            Error::InvalidLiteral { line, column, .. } => {
                assert_eq!((line, column), (0, 7));
            }
            other => panic!("expected InvalidLiteral, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_escape_reports_the_backslash() {
        // OUTPUT "ab\q" -- backslash sits at column 10
        let err = tokenize("OUTPUT \"ab\\q\"").unwrap_err();
        match err {
            Error::InvalidLiteral { line, column, .. } => {
                assert_eq!((line, column), (0, 10));
            }
            other => panic!("expected InvalidLiteral, got {:?}", other),
        }
    }

    #[test]
    fn test_identifiers_take_digits_and_underscores() {
        let tokens = tokenize("total_2 x1").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier("total_2".to_string()));
        assert_eq!(tokens[1].kind, TokenKind::Identifier("x1".to_string()));
    }

    #[test]
    fn test_keywords_case_sensitive() {
        let tokens = tokenize("while WHILE").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier("while".to_string()));
        assert_eq!(tokens[1].kind, TokenKind::Keyword(Keyword::While));
    }
}
