//! Syntax tree and recursive-descent parser

pub mod ast;
#[allow(clippy::module_inception)]
pub mod parser;

pub use ast::{
    ArrayTypeExpr, Assignable, BinaryOp, CaseLabel, Expression, FileMode, Ident, Parameter,
    PrimitiveType, Program, Statement, TypeExpr, UnaryOp,
};
pub use parser::{parse_expression, parse_program, parse_statement, Parser, MAX_EXPRESSION_DEPTH};
