use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Line number where the token starts (0-indexed)
    pub line: usize,
    /// Column number where the token starts (0-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Token { kind, line, column }
    }

    /// Human-readable source location, for error messages
    pub fn location(&self) -> String {
        format!("line {} column {}", self.line, self.column)
    }
}

/// All possible token payloads in camscript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    /// Reserved word
    Keyword(Keyword),
    /// Punctuation or operator symbol
    Symbol(Symbol),
    /// Literal value, parsed eagerly at lex time
    Literal(Literal),
    /// Any identifier-shaped lexeme that is not a reserved word
    Identifier(String),
    /// End-of-input sentinel
    Eof,
}

/// Literal payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Integer literal
    Integer(i64),
    /// Real (floating-point) literal
    Real(f64),
    /// String literal with escapes already decoded
    Str(String),
    /// Boolean literal (from the TRUE/FALSE keywords)
    Boolean(bool),
}

/// Reserved words, matched case-sensitively against identifier-shaped lexemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Keyword {
    Procedure,
    EndProcedure,
    Function,
    Returns,
    EndFunction,
    If,
    Then,
    Else,
    EndIf,
    Case,
    Of,
    Otherwise,
    EndCase,
    For,
    To,
    Step,
    Next,
    Repeat,
    Until,
    While,
    Do,
    EndWhile,
    Declare,
    Constant,
    Input,
    Output,
    Return,
    OpenFile,
    ReadFile,
    WriteFile,
    CloseFile,
    Call,
    Array,
    Integer,
    Real,
    Char,
    String,
    Boolean,
    Read,
    Write,
    True,
    False,
    Or,
    And,
    Not,
}

/// Punctuation and operator symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Symbol {
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    Assign,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

lazy_static! {
    /// Reserved-word table: source spelling to keyword
    static ref KEYWORDS: HashMap<&'static str, Keyword> = {
        let mut m = HashMap::new();
        m.insert("PROCEDURE", Keyword::Procedure);
        m.insert("ENDPROCEDURE", Keyword::EndProcedure);
        m.insert("FUNCTION", Keyword::Function);
        m.insert("RETURNS", Keyword::Returns);
        m.insert("ENDFUNCTION", Keyword::EndFunction);
        m.insert("IF", Keyword::If);
        m.insert("THEN", Keyword::Then);
        m.insert("ELSE", Keyword::Else);
        m.insert("ENDIF", Keyword::EndIf);
        m.insert("CASE", Keyword::Case);
        m.insert("OF", Keyword::Of);
        m.insert("OTHERWISE", Keyword::Otherwise);
        m.insert("ENDCASE", Keyword::EndCase);
        m.insert("FOR", Keyword::For);
        m.insert("TO", Keyword::To);
        m.insert("STEP", Keyword::Step);
        m.insert("NEXT", Keyword::Next);
        m.insert("REPEAT", Keyword::Repeat);
        m.insert("UNTIL", Keyword::Until);
        m.insert("WHILE", Keyword::While);
        m.insert("DO", Keyword::Do);
        m.insert("ENDWHILE", Keyword::EndWhile);
        m.insert("DECLARE", Keyword::Declare);
        m.insert("CONSTANT", Keyword::Constant);
        m.insert("INPUT", Keyword::Input);
        m.insert("OUTPUT", Keyword::Output);
        m.insert("RETURN", Keyword::Return);
        m.insert("OPENFILE", Keyword::OpenFile);
        m.insert("READFILE", Keyword::ReadFile);
        m.insert("WRITEFILE", Keyword::WriteFile);
        m.insert("CLOSEFILE", Keyword::CloseFile);
        m.insert("CALL", Keyword::Call);
        m.insert("ARRAY", Keyword::Array);
        m.insert("INTEGER", Keyword::Integer);
        m.insert("REAL", Keyword::Real);
        m.insert("CHAR", Keyword::Char);
        m.insert("STRING", Keyword::String);
        m.insert("BOOLEAN", Keyword::Boolean);
        m.insert("READ", Keyword::Read);
        m.insert("WRITE", Keyword::Write);
        m.insert("TRUE", Keyword::True);
        m.insert("FALSE", Keyword::False);
        m.insert("OR", Keyword::Or);
        m.insert("AND", Keyword::And);
        m.insert("NOT", Keyword::Not);
        m
    };
}

impl Keyword {
    /// Look up a lexeme in the reserved-word table
    pub fn lookup(lexeme: &str) -> Option<Keyword> {
        KEYWORDS.get(lexeme).copied()
    }
}

impl Symbol {
    /// Source spelling of the symbol
    pub fn as_str(&self) -> &'static str {
        match self {
            Symbol::LeftParen => "(",
            Symbol::RightParen => ")",
            Symbol::LeftBracket => "[",
            Symbol::RightBracket => "]",
            Symbol::Comma => ",",
            Symbol::Colon => ":",
            Symbol::Assign => "<-",
            Symbol::Equal => "=",
            Symbol::NotEqual => "<>",
            Symbol::Less => "<",
            Symbol::LessEqual => "<=",
            Symbol::Greater => ">",
            Symbol::GreaterEqual => ">=",
            Symbol::Add => "+",
            Symbol::Sub => "-",
            Symbol::Mul => "*",
            Symbol::Div => "/",
            Symbol::Pow => "^",
        }
    }
}

/// Something a token can be compared against without constructing a full
/// [`Token`].
///
/// The parser matches the token stream against bare [`Keyword`] and
/// [`Symbol`] constants (`parser.match_token(Keyword::If)`). Comparison is an
/// explicit predicate rather than an `==` overload so that the
/// context-sensitive semantics stay visible at the call site.
pub trait TokenPattern: fmt::Display {
    /// Does `token` match this pattern?
    fn matches(&self, token: &Token) -> bool;
}

impl TokenPattern for Keyword {
    fn matches(&self, token: &Token) -> bool {
        matches!(&token.kind, TokenKind::Keyword(kw) if kw == self)
    }
}

impl TokenPattern for Symbol {
    fn matches(&self, token: &Token) -> bool {
        matches!(&token.kind, TokenKind::Symbol(sym) if sym == self)
    }
}

impl TokenPattern for &TokenKind {
    fn matches(&self, token: &Token) -> bool {
        token.kind == **self
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Keywords display as their source spelling
        let spelling = KEYWORDS
            .iter()
            .find(|(_, kw)| **kw == *self)
            .map(|(s, _)| *s)
            .unwrap_or("<keyword>");
        write!(f, "{}", spelling)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Real(r) => write!(f, "{}", r),
            Literal::Str(s) => write!(f, "\"{}\"", s),
            Literal::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenKind::Keyword(kw) => write!(f, "{}", kw),
            TokenKind::Symbol(sym) => write!(f, "`{}`", sym),
            TokenKind::Literal(lit) => write!(f, "{}", lit),
            TokenKind::Identifier(name) => write!(f, "{}", name),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(Keyword::lookup("DECLARE"), Some(Keyword::Declare));
        assert_eq!(Keyword::lookup("ENDWHILE"), Some(Keyword::EndWhile));
        // Reserved words are case-sensitive exact matches
        assert_eq!(Keyword::lookup("declare"), None);
        assert_eq!(Keyword::lookup("counter"), None);
    }

    #[test]
    fn test_pattern_matches_keyword() {
        let token = Token::new(TokenKind::Keyword(Keyword::If), 0, 0);
        assert!(Keyword::If.matches(&token));
        assert!(!Keyword::Then.matches(&token));
        assert!(!Symbol::Assign.matches(&token));
    }

    #[test]
    fn test_pattern_matches_symbol() {
        let token = Token::new(TokenKind::Symbol(Symbol::Assign), 1, 4);
        assert!(Symbol::Assign.matches(&token));
        assert!(!Symbol::Less.matches(&token));
    }

    #[test]
    fn test_display() {
        assert_eq!(Keyword::EndProcedure.to_string(), "ENDPROCEDURE");
        assert_eq!(Symbol::NotEqual.to_string(), "<>");
        assert_eq!(Literal::Boolean(true).to_string(), "TRUE");
        assert_eq!(TokenKind::Eof.to_string(), "end of input");
    }
}
