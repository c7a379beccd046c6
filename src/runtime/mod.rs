//! Values, name bindings and the tree-walking interpreter

pub mod interpreter;
pub mod state;
pub mod value;

pub use interpreter::{run_source, Interpreter, MAX_CALL_DEPTH, MAX_STATEMENT_DEPTH};
pub use state::{DeclaredType, Subprogram, Variable, VariableState};
pub use value::{ArrayValue, Value};
