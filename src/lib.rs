//! # Camscript - A Cambridge Pseudocode Interpreter
//!
//! [![License: MIT](https://img.shields.io/badge/License-MIT-yellow.svg)](https://opensource.org/licenses/MIT)
//!
//! An interpreter for the **teaching pseudocode** used in Cambridge-style
//! computer science courses: `DECLARE`/`CONSTANT` declarations, `IF`/`CASE`
//! selection, `FOR`/`WHILE`/`REPEAT` loops, procedures and functions,
//! `INPUT`/`OUTPUT` and line-oriented file statements, executed by direct
//! tree walking.
//!
//! ## Quick Start
//!
//! Run a program from a string, feeding it input and capturing its output:
//!
//! ```rust
//! use camscript::run_source;
//!
//! # fn main() -> camscript::Result<()> {
//! let code = "DECLARE i : INTEGER\n\
//!             FOR i <- 1 TO 3\n\
//!                 OUTPUT \"square of \", i, \" is \", i * i\n\
//!             NEXT i";
//!
//! let output = run_source(code, "")?;
//! assert_eq!(output.lines().count(), 3);
//! assert!(output.starts_with("square of 1 is 1\n"));
//! # Ok(())
//! # }
//! ```
//!
//! ### Driving the stages yourself
//!
//! The pipeline is three independent stages; each is usable on its own:
//!
//! ```rust
//! use camscript::{tokenize, parse_expression, Interpreter, Value};
//!
//! # fn main() -> camscript::Result<()> {
//! let tokens = tokenize("1 + 2 * 3")?;
//! let expr = parse_expression(tokens)?;
//!
//! let mut interpreter = Interpreter::new();
//! assert_eq!(interpreter.eval(&expr)?, Value::Integer(7));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Source Code → Scanner → Tokens → Parser → AST → Interpreter → Output
//! ```
//!
//! - [`Scanner`] / [`tokenize`] - turns source text into position-tagged
//!   tokens
//! - [`Parser`] / [`parse_program`] - recursive-descent parse into the
//!   syntax tree
//! - [`Interpreter`] - walks the tree against a [`VariableState`], with
//!   injectable input/output streams
//!
//! ## Error Handling
//!
//! Every stage reports through one [`Error`] enum; lex and parse errors
//! carry 0-based line/column positions:
//!
//! ```rust
//! use camscript::{run_source, Error};
//!
//! match run_source("OUTPUT x", "") {
//!     Err(Error::UndefinedName { name }) => assert_eq!(name, "x"),
//!     other => panic!("expected an undefined-name error, got {other:?}"),
//! }
//! ```

/// Version of the camscript interpreter
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;

pub use error::{Error, ErrorStage, Result};
pub use lexer::{tokenize, Keyword, Literal, Scanner, Symbol, Token, TokenKind};
pub use parser::{
    parse_expression, parse_program, parse_statement, Expression, Parser, Program, Statement,
};
pub use runtime::{run_source, Interpreter, Value, VariableState};
