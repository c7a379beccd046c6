//! Error types for the camscript interpreter

use thiserror::Error;

/// camscript interpreter errors
///
/// Every pipeline stage reports through this enum. Errors are fatal to the
/// current run: lexing stops at the first bad character, parsing at the first
/// grammar violation, evaluation at the offending statement.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Lex errors
    /// Unrecognised character in the source text
    ///
    /// **Triggered by:** any character outside the lexical grammar
    /// **Example:** `DECLARE x ; INTEGER` (`;` is not a camscript symbol)
    #[error("Invalid character {character:?} at line {line}, column {column}")]
    LexError {
        /// 0-based line of the offending character
        line: usize,
        /// 0-based column of the offending character
        column: usize,
        /// The character itself
        character: char,
    },

    /// Malformed literal (unterminated string, bad escape, unparsable number)
    #[error("Invalid literal at line {line}, column {column}: {message}")]
    InvalidLiteral {
        /// 0-based line of the literal's first character
        line: usize,
        /// 0-based column of the literal's first character
        column: usize,
        /// What was wrong with it
        message: String,
    },

    // Parse errors
    /// A specific token was expected and something else was found
    #[error("Expected {expected} at line {line}, column {column}, found {found}")]
    UnexpectedToken {
        /// Description of the expected token or token category
        expected: String,
        /// Display form of the token actually found
        found: String,
        /// 0-based line of the actual token
        line: usize,
        /// 0-based column of the actual token
        column: usize,
    },

    /// Token stream ended while a construct was still open
    #[error("Unexpected end of input: expected {expected}")]
    UnexpectedEof {
        /// Description of what the parser was looking for
        expected: String,
    },

    /// Tokens left over after a standalone expression/statement parse
    #[error("Extra token {found} at line {line}, column {column}")]
    TrailingTokens {
        /// Display form of the first leftover token
        found: String,
        /// 0-based line of that token
        line: usize,
        /// 0-based column of that token
        column: usize,
    },

    // Runtime errors
    /// Reference to a name that was never declared
    ///
    /// **Triggered by:** reading or assigning a name with no prior
    /// `DECLARE`/`CONSTANT`/parameter binding
    #[error("Name {name} is not declared")]
    UndefinedName {
        /// The undeclared name
        name: String,
    },

    /// Read of a declared variable that has never been assigned
    ///
    /// Declared-but-unset is a distinct state from "zero value"; reading it
    /// is an error, not a default.
    #[error("Name {name} has no value")]
    UnassignedVariable {
        /// The unset variable's name
        name: String,
    },

    /// Assignment to something that is not a legal target
    ///
    /// **Example:** writing through an array index, or assigning a constant
    #[error("Invalid assignment target: {reason}")]
    InvalidAssignmentTarget {
        /// Why the target was rejected
        reason: String,
    },

    /// Operand or coercion type mismatch
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type
        expected: String,
        /// Actual type
        got: String,
    },

    /// Array subscript outside the declared bounds
    #[error("Index {index} out of bounds for dimension {lower}:{upper}")]
    IndexOutOfBounds {
        /// The subscript that was used
        index: i64,
        /// Declared lower bound
        lower: i64,
        /// Declared upper bound
        upper: i64,
    },

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Statement form the interpreter does not support
    ///
    /// Unsupported constructs fail loudly; they are never a silent no-op.
    #[error("Unsupported construct: {construct}")]
    UnsupportedConstruct {
        /// Description of the construct
        construct: String,
    },

    /// A function body finished without executing a `RETURN`
    #[error("Function {name} ended without returning a value")]
    MissingReturn {
        /// Function name
        name: String,
    },

    /// File operation on a file that was never opened, or opened in the
    /// wrong mode
    #[error("File error for {name}: {message}")]
    FileError {
        /// File name as written in the program
        name: String,
        /// What went wrong
        message: String,
    },

    /// Host I/O failure during INPUT/OUTPUT or file statements
    #[error("I/O error: {0}")]
    IoError(String),

    // Resource guards
    /// Nesting or call depth exceeded the configured limit
    ///
    /// Reported instead of exhausting the host stack on pathologically
    /// nested expressions or runaway recursion.
    #[error("Recursion limit exceeded (max: {limit})")]
    RecursionLimit {
        /// Maximum allowed depth
        limit: usize,
    },
}

/// Pipeline stage an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStage {
    /// Lexical analysis
    Lex,
    /// Parsing
    Parse,
    /// Evaluation
    Runtime,
}

impl Error {
    /// Classify which pipeline stage produced this error
    pub fn stage(&self) -> ErrorStage {
        match self {
            Error::LexError { .. } | Error::InvalidLiteral { .. } => ErrorStage::Lex,
            Error::UnexpectedToken { .. }
            | Error::UnexpectedEof { .. }
            | Error::TrailingTokens { .. } => ErrorStage::Parse,
            _ => ErrorStage::Runtime,
        }
    }

    /// Source location carried by the error, if it has one
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            Error::LexError { line, column, .. }
            | Error::InvalidLiteral { line, column, .. }
            | Error::UnexpectedToken { line, column, .. }
            | Error::TrailingTokens { line, column, .. } => Some((*line, *column)),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

/// Result type for camscript operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_classification() {
        let lex = Error::LexError {
            line: 0,
            column: 3,
            character: ';',
        };
        assert_eq!(lex.stage(), ErrorStage::Lex);

        let parse = Error::UnexpectedEof {
            expected: "ENDIF".to_string(),
        };
        assert_eq!(parse.stage(), ErrorStage::Parse);

        let runtime = Error::UndefinedName {
            name: "x".to_string(),
        };
        assert_eq!(runtime.stage(), ErrorStage::Runtime);
    }

    #[test]
    fn test_location() {
        let err = Error::UnexpectedToken {
            expected: "THEN".to_string(),
            found: "ELSE".to_string(),
            line: 2,
            column: 7,
        };
        assert_eq!(err.location(), Some((2, 7)));
        assert_eq!(Error::DivisionByZero.location(), None);
    }
}
