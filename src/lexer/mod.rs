//! Lexical analysis: raw source text to located tokens

mod scanner;
mod token;

pub use scanner::{tokenize, Scanner};
pub use token::{Keyword, Literal, Symbol, Token, TokenKind, TokenPattern};
