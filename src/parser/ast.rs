use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lexer::Literal;

/// Complete camscript program: the AST root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Top-level statements in source order
    pub statements: Vec<Statement>,
}

/// A source-located identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    /// The identifier's name
    pub name: String,
    /// 0-based line of the identifier token
    pub line: usize,
    /// 0-based column of the identifier token
    pub column: usize,
}

/// Expressions
///
/// A strict immutable tree: nodes own their children, no sharing, no cycles.
/// Consumed by exhaustive `match` in the interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Literal value carried over from its token
    Literal(Literal),
    /// Variable or constant reference
    Identifier(Ident),
    /// Prefix operator application
    UnaryOp {
        /// Operator to apply
        op: UnaryOp,
        /// Operand expression
        operand: Box<Expression>,
    },
    /// Infix operator application
    BinaryOp {
        /// Operator to apply
        op: BinaryOp,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
    /// Function call: `callee(args...)`
    FunctionCall {
        /// Expression in call position
        callee: Box<Expression>,
        /// Arguments, left to right
        args: Vec<Expression>,
    },
    /// Array subscript: `array[i, j, ...]`, one index per dimension
    ArrayIndex {
        /// Expression being indexed
        array: Box<Expression>,
        /// Index expressions, one per dimension
        indices: Vec<Expression>,
    },
}

/// Expressions legal as assignment targets
///
/// Exactly `Identifier` and `ArrayIndex` — a marker sub-variant of
/// [`Expression`], not a separate hierarchy. `INPUT`, `FOR` and the left side
/// of `<-` all demand one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Assignable {
    /// Plain variable target
    Variable(Ident),
    /// Array element target
    Index {
        /// The array variable
        array: Ident,
        /// Index expressions, one per dimension
        indices: Vec<Expression>,
    },
}

impl Assignable {
    /// Name of the underlying variable
    pub fn name(&self) -> &str {
        match self {
            Assignable::Variable(ident) => &ident.name,
            Assignable::Index { array, .. } => &array.name,
        }
    }
}

impl TryFrom<Expression> for Assignable {
    type Error = Expression;

    /// Narrow an expression to an assignable target, returning the original
    /// expression on failure so the caller can report it
    fn try_from(expr: Expression) -> std::result::Result<Self, Expression> {
        match expr {
            Expression::Identifier(ident) => Ok(Assignable::Variable(ident)),
            Expression::ArrayIndex { array, indices } => match *array {
                Expression::Identifier(ident) => Ok(Assignable::Index {
                    array: ident,
                    indices,
                }),
                other => Err(Expression::ArrayIndex {
                    array: Box::new(other),
                    indices,
                }),
            },
            other => Err(other),
        }
    }
}

/// Binary operators
///
/// `And`/`Or` are deliberately not short-circuiting: both operands are
/// evaluated before the operator is applied, matching the source language's
/// reference behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/) — always yields a REAL
    Div,
    /// Exponentiation (^)
    Pow,
    /// Equality (=)
    Eq,
    /// Inequality (<>)
    NotEq,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    LtEq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    GtEq,
    /// Logical AND (both operands evaluated)
    And,
    /// Logical OR (both operands evaluated)
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Arithmetic negation (-x)
    Neg,
    /// Logical NOT
    Not,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "NOT"),
        }
    }
}

/// Primitive data types of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum PrimitiveType {
    Integer,
    Real,
    Char,
    String,
    Boolean,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            PrimitiveType::Integer => "INTEGER",
            PrimitiveType::Real => "REAL",
            PrimitiveType::Char => "CHAR",
            PrimitiveType::String => "STRING",
            PrimitiveType::Boolean => "BOOLEAN",
        };
        write!(f, "{}", s)
    }
}

/// Array type as written in a declaration
///
/// Bounds are expressions, not constants: they are evaluated once against the
/// current scope when the declaration executes, then cached as immutable
/// extents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayTypeExpr {
    /// Element type
    pub element: PrimitiveType,
    /// `(lower, upper)` bound expressions, one pair per dimension
    pub bounds: Vec<(Expression, Expression)>,
}

/// A declared type: primitive or array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    /// Scalar type
    Primitive(PrimitiveType),
    /// Array type with expression bounds
    Array(ArrayTypeExpr),
}

/// Subprogram parameter: `name : Type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: Ident,
    /// Declared type
    pub ty: TypeExpr,
}

/// A `CASE OF` branch label: a literal or a bare identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CaseLabel {
    /// Literal label, compared by value
    Literal(Literal),
    /// Identifier label, resolved then compared by value
    Identifier(Ident),
}

/// File access mode in `OPENFILE ... FOR READ|WRITE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileMode {
    /// Line-oriented reading
    Read,
    /// Truncating line-oriented writing
    Write,
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `DECLARE name : Type`
    VariableDecl {
        /// Variable name
        name: Ident,
        /// Declared type
        ty: TypeExpr,
    },

    /// `CONSTANT name <- literal`
    ConstantDecl {
        /// Constant name
        name: Ident,
        /// Literal value
        value: Literal,
    },

    /// `target <- expression`
    Assignment {
        /// Assignment target
        target: Assignable,
        /// Value expression
        value: Expression,
    },

    /// `IF cond THEN ... [ELSE ...] ENDIF`
    If {
        /// Condition, must evaluate to BOOLEAN
        condition: Expression,
        /// Statements run when the condition holds
        then_branch: Vec<Statement>,
        /// Statements run otherwise, if an ELSE was written
        else_branch: Option<Vec<Statement>>,
    },

    /// `CASE OF expr ... ENDCASE`
    Case {
        /// Selector, evaluated once
        expr: Expression,
        /// `(label, statement)` branches in source order
        cases: Vec<(CaseLabel, Statement)>,
        /// Optional OTHERWISE branch
        otherwise: Option<Box<Statement>>,
    },

    /// `FOR var <- start TO end [STEP step] ... NEXT [var]`
    ///
    /// Loop condition is the literal `current <= end` regardless of the sign
    /// of STEP; a negative STEP with start <= end does not terminate.
    For {
        /// Loop variable (must be an assignable target)
        variable: Assignable,
        /// Start value, evaluated once at entry
        start: Expression,
        /// End value, evaluated once at entry
        end: Expression,
        /// Optional step, defaults to 1
        step: Option<Expression>,
        /// Loop body
        body: Vec<Statement>,
    },

    /// `WHILE cond DO ... ENDWHILE`
    While {
        /// Condition, re-evaluated before each iteration
        condition: Expression,
        /// Loop body
        body: Vec<Statement>,
    },

    /// `REPEAT ... UNTIL cond` — body runs at least once
    RepeatUntil {
        /// Loop body
        body: Vec<Statement>,
        /// Exit condition, checked after each iteration
        condition: Expression,
    },

    /// `INPUT target` — blocking line read, coerced to the declared type
    Input {
        /// Target of the read
        target: Assignable,
    },

    /// `OUTPUT expr {, expr}` — values concatenated, one trailing newline
    Output {
        /// Value expressions, evaluated left to right
        values: Vec<Expression>,
    },

    /// `PROCEDURE name [(params)] ... ENDPROCEDURE`
    ProcedureDecl {
        /// Procedure name
        name: Ident,
        /// Parameter list, `None` when no parentheses were written
        params: Option<Vec<Parameter>>,
        /// Procedure body
        body: Vec<Statement>,
    },

    /// `FUNCTION name [(params)] RETURNS Type ... ENDFUNCTION`
    FunctionDecl {
        /// Function name
        name: Ident,
        /// Parameter list, `None` when no parentheses were written
        params: Option<Vec<Parameter>>,
        /// Declared return type
        return_type: TypeExpr,
        /// Function body
        body: Vec<Statement>,
    },

    /// `CALL name [(args)]`
    ProcedureCall {
        /// Procedure name
        name: Ident,
        /// Arguments, `None` when no parentheses were written
        args: Option<Vec<Expression>>,
    },

    /// `RETURN expr`
    Return {
        /// Value to return
        value: Expression,
    },

    /// `OPENFILE "name" FOR READ|WRITE`
    FileOpen {
        /// File name literal
        file: String,
        /// Access mode
        mode: FileMode,
    },

    /// `READFILE "name", target`
    FileRead {
        /// File name literal
        file: String,
        /// Target of the read line
        target: Assignable,
    },

    /// `WRITEFILE "name", expr`
    FileWrite {
        /// File name literal
        file: String,
        /// Value written as one line
        value: Expression,
    },

    /// `CLOSEFILE "name"`
    FileClose {
        /// File name literal
        file: String,
    },
}
