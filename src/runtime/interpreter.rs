//! Tree-walking interpreter
//!
//! Executes the syntax tree directly against a [`VariableState`]. Statements
//! report a [`Flow`] signal so `RETURN` can unwind a function body without a
//! sentinel error; everything else propagates through `Result`.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::parser::{
    Assignable, BinaryOp, CaseLabel, Expression, FileMode, Parameter, Program, Statement,
    TypeExpr, UnaryOp,
};
use crate::runtime::state::{widen, DeclaredType, Subprogram, VariableState};
use crate::runtime::value::{ArrayValue, Value};

/// Maximum nested subprogram calls before giving up
///
/// Guards runaway recursion with a reported error instead of a native stack
/// overflow.
pub const MAX_CALL_DEPTH: usize = 256;

/// Maximum statement nesting the interpreter will enter
///
/// Counts every active `exec` frame, across subprogram calls included, so
/// a hand-built tree of nested blocks errors out instead of exhausting the
/// native stack.
pub const MAX_STATEMENT_DEPTH: usize = 500;

/// Control signal returned by statement execution
#[derive(Debug, Clone, PartialEq)]
enum Flow {
    /// Continue with the next statement
    Normal,
    /// Unwind to the nearest function call with this value
    Return(Value),
}

/// An open file from `OPENFILE`, keyed by its name literal
enum FileHandle {
    Reader(BufReader<File>),
    Writer(File),
}

/// The interpreter: name bindings, open files, and the I/O collaborators
///
/// Input and output are injected streams so tests can drive `INPUT` and
/// capture `OUTPUT`; the default constructor wires them to stdin/stdout.
pub struct Interpreter {
    state: VariableState,
    files: HashMap<String, FileHandle>,
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
    call_depth: usize,
    statement_depth: usize,
}

impl Interpreter {
    /// Interpreter talking to stdin/stdout
    pub fn new() -> Self {
        Interpreter::with_io(
            Box::new(BufReader::new(io::stdin())),
            Box::new(io::stdout()),
        )
    }

    /// Interpreter over caller-supplied input and output streams
    pub fn with_io(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        Interpreter {
            state: VariableState::new(),
            files: HashMap::new(),
            input,
            output,
            call_depth: 0,
            statement_depth: 0,
        }
    }

    /// Run a whole program
    ///
    /// Execution halts at the first failing statement. A `RETURN` reaching
    /// the top level is an error, not an exit.
    pub fn execute(&mut self, program: &Program) -> Result<()> {
        debug!(statements = program.statements.len(), "executing program");
        match self.run_block(&program.statements)? {
            Flow::Normal => Ok(()),
            Flow::Return(_) => Err(Error::UnsupportedConstruct {
                construct: "RETURN outside a function".to_string(),
            }),
        }
    }

    fn run_block(&mut self, statements: &[Statement]) -> Result<Flow> {
        for statement in statements {
            match self.exec(statement)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, statement: &Statement) -> Result<Flow> {
        if self.statement_depth >= MAX_STATEMENT_DEPTH {
            return Err(Error::RecursionLimit {
                limit: MAX_STATEMENT_DEPTH,
            });
        }
        self.statement_depth += 1;
        let result = self.exec_inner(statement);
        self.statement_depth -= 1;
        result
    }

    fn exec_inner(&mut self, statement: &Statement) -> Result<Flow> {
        trace!(statement = ?std::mem::discriminant(statement), "exec");
        match statement {
            Statement::VariableDecl { name, ty } => {
                self.declare_variable(&name.name, ty)?;
                Ok(Flow::Normal)
            }
            Statement::ConstantDecl { name, value } => {
                self.state
                    .declare_constant(&name.name, Value::from(value.clone()));
                Ok(Flow::Normal)
            }
            Statement::Assignment { target, value } => {
                let value = self.eval(value)?;
                self.assign(target, value)?;
                Ok(Flow::Normal)
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval(condition)?.as_bool()? {
                    self.run_block(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.run_block(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Statement::Case {
                expr,
                cases,
                otherwise,
            } => self.exec_case(expr, cases, otherwise.as_deref()),
            Statement::For {
                variable,
                start,
                end,
                step,
                body,
            } => self.exec_for(variable, start, end, step.as_ref(), body),
            Statement::While { condition, body } => {
                while self.eval(condition)?.as_bool()? {
                    match self.run_block(body)? {
                        Flow::Normal => {}
                        flow => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::RepeatUntil { body, condition } => {
                loop {
                    match self.run_block(body)? {
                        Flow::Normal => {}
                        flow => return Ok(flow),
                    }
                    if self.eval(condition)?.as_bool()? {
                        return Ok(Flow::Normal);
                    }
                }
            }
            Statement::Input { target } => {
                let mut line = String::new();
                self.input.read_line(&mut line)?;
                self.assign_input(target, &line)?;
                Ok(Flow::Normal)
            }
            Statement::Output { values } => {
                let mut rendered = String::new();
                for value in values {
                    rendered.push_str(&self.eval(value)?.to_string());
                }
                writeln!(self.output, "{rendered}")?;
                self.output.flush()?;
                Ok(Flow::Normal)
            }
            Statement::ProcedureDecl { name, params, body } => {
                self.state.define_procedure(
                    &name.name,
                    Subprogram {
                        params: params.clone(),
                        return_type: None,
                        body: body.clone(),
                    },
                );
                Ok(Flow::Normal)
            }
            Statement::FunctionDecl {
                name,
                params,
                return_type,
                body,
            } => {
                self.state.define_function(
                    &name.name,
                    Subprogram {
                        params: params.clone(),
                        return_type: Some(return_type.clone()),
                        body: body.clone(),
                    },
                );
                Ok(Flow::Normal)
            }
            Statement::ProcedureCall { name, args } => {
                let procedure = self.state.procedure(&name.name)?;
                let args = match args {
                    Some(args) => self.eval_all(args)?,
                    None => Vec::new(),
                };
                match self.call_subprogram(&name.name, &procedure, args)? {
                    Flow::Normal => Ok(Flow::Normal),
                    Flow::Return(_) => Err(Error::UnsupportedConstruct {
                        construct: "RETURN outside a function".to_string(),
                    }),
                }
            }
            Statement::Return { value } => {
                let value = self.eval(value)?;
                Ok(Flow::Return(value))
            }
            Statement::FileOpen { file, mode } => {
                self.open_file(file, *mode)?;
                Ok(Flow::Normal)
            }
            Statement::FileRead { file, target } => {
                let line = self.read_file_line(file)?;
                self.assign_input(target, &line)?;
                Ok(Flow::Normal)
            }
            Statement::FileWrite { file, value } => {
                let value = self.eval(value)?;
                self.write_file_line(file, &value)?;
                Ok(Flow::Normal)
            }
            Statement::FileClose { file } => {
                self.files.remove(file).ok_or_else(|| Error::FileError {
                    name: file.clone(),
                    message: "file is not open".to_string(),
                })?;
                Ok(Flow::Normal)
            }
        }
    }

    // ----- declarations and assignment -----

    fn declare_variable(&mut self, name: &str, ty: &TypeExpr) -> Result<()> {
        match ty {
            TypeExpr::Primitive(primitive) => {
                self.state
                    .declare(name, DeclaredType::Primitive(*primitive), None);
            }
            TypeExpr::Array(array) => {
                // Bounds are expressions, evaluated once here and cached as
                // immutable extents
                let mut extents = Vec::with_capacity(array.bounds.len());
                for (lower, upper) in &array.bounds {
                    let lower = self.eval(lower)?.as_int()?;
                    let upper = self.eval(upper)?.as_int()?;
                    extents.push((lower, upper));
                }
                let storage = ArrayValue::new(array.element, extents.clone())?;
                self.state.declare(
                    name,
                    DeclaredType::Array {
                        element: array.element,
                        extents,
                    },
                    Some(Value::Array(storage)),
                );
            }
        }
        Ok(())
    }

    fn assign(&mut self, target: &Assignable, value: Value) -> Result<()> {
        match target {
            Assignable::Variable(ident) => self.state.assign(&ident.name, value),
            // Explicitly unsupported, never a silent no-op
            Assignable::Index { array, .. } => Err(Error::InvalidAssignmentTarget {
                reason: format!("cannot assign through an index of {}", array.name),
            }),
        }
    }

    /// Coerce one raw input line to the target's declared type and assign it
    fn assign_input(&mut self, target: &Assignable, line: &str) -> Result<()> {
        let name = match target {
            Assignable::Variable(ident) => &ident.name,
            Assignable::Index { array, .. } => {
                return Err(Error::InvalidAssignmentTarget {
                    reason: format!("cannot assign through an index of {}", array.name),
                })
            }
        };
        let ty = match self.state.variable(name)?.ty {
            DeclaredType::Primitive(primitive) => primitive,
            DeclaredType::Array { .. } => {
                return Err(Error::TypeMismatch {
                    expected: "scalar variable".to_string(),
                    got: "ARRAY".to_string(),
                })
            }
        };
        let line = line.trim_end_matches(['\n', '\r']);
        let value = Value::coerce_input(ty, line)?;
        self.state.assign(name, value)
    }

    // ----- control statements -----

    fn exec_case(
        &mut self,
        expr: &Expression,
        cases: &[(CaseLabel, Statement)],
        otherwise: Option<&Statement>,
    ) -> Result<Flow> {
        let selector = self.eval(expr)?;
        for (label, statement) in cases {
            let label_value = match label {
                CaseLabel::Literal(literal) => Value::from(literal.clone()),
                CaseLabel::Identifier(ident) => self.state.read(&ident.name)?.clone(),
            };
            // First match wins; there is no fall-through
            if values_equal(&selector, &label_value) {
                return self.exec(statement);
            }
        }
        match otherwise {
            Some(statement) => self.exec(statement),
            None => Ok(Flow::Normal),
        }
    }

    /// `FOR` counts with the literal condition `current <= end`
    ///
    /// A negative STEP with start > end therefore runs zero iterations, and a
    /// negative STEP with start <= end never terminates on its own.
    fn exec_for(
        &mut self,
        variable: &Assignable,
        start: &Expression,
        end: &Expression,
        step: Option<&Expression>,
        body: &[Statement],
    ) -> Result<Flow> {
        let start = self.eval(start)?.as_int()?;
        let end = self.eval(end)?.as_int()?;
        let step = match step {
            Some(step) => self.eval(step)?.as_int()?,
            None => 1,
        };
        let mut current = start;
        while current <= end {
            self.assign(variable, Value::Integer(current))?;
            match self.run_block(body)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
            // A counter past i64::MAX has passed every representable end
            current = match current.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }
        Ok(Flow::Normal)
    }

    // ----- subprograms -----

    fn call_subprogram(
        &mut self,
        name: &str,
        subprogram: &Rc<Subprogram>,
        args: Vec<Value>,
    ) -> Result<Flow> {
        let params: &[Parameter] = subprogram.params.as_deref().unwrap_or(&[]);
        if params.len() != args.len() {
            return Err(Error::TypeMismatch {
                expected: format!("{} arguments to {name}", params.len()),
                got: args.len().to_string(),
            });
        }
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(Error::RecursionLimit {
                limit: MAX_CALL_DEPTH,
            });
        }
        self.call_depth += 1;
        self.state.push_frame();
        let result = self.bind_and_run(params, args, &subprogram.body);
        self.state.pop_frame();
        self.call_depth -= 1;
        result
    }

    fn bind_and_run(
        &mut self,
        params: &[Parameter],
        args: Vec<Value>,
        body: &[Statement],
    ) -> Result<Flow> {
        for (param, value) in params.iter().zip(args) {
            let (ty, value) = match &param.ty {
                TypeExpr::Primitive(primitive) => (
                    DeclaredType::Primitive(*primitive),
                    widen(value, *primitive)?,
                ),
                TypeExpr::Array(array) => match value {
                    Value::Array(storage) => (
                        DeclaredType::Array {
                            element: array.element,
                            extents: storage.extents.clone(),
                        },
                        Value::Array(storage),
                    ),
                    other => {
                        return Err(Error::TypeMismatch {
                            expected: "ARRAY".to_string(),
                            got: other.type_name().to_string(),
                        })
                    }
                },
            };
            self.state.declare(&param.name.name, ty, Some(value));
        }
        self.run_block(body)
    }

    fn invoke_function(&mut self, name: &str, args: &[Expression]) -> Result<Value> {
        let function = self.state.function(name)?;
        let args = self.eval_all(args)?;
        match self.call_subprogram(name, &function, args)? {
            Flow::Return(value) => match &function.return_type {
                Some(TypeExpr::Primitive(primitive)) => widen(value, *primitive),
                _ => Ok(value),
            },
            Flow::Normal => Err(Error::MissingReturn {
                name: name.to_string(),
            }),
        }
    }

    // ----- file statements -----

    fn open_file(&mut self, name: &str, mode: FileMode) -> Result<()> {
        if self.files.contains_key(name) {
            return Err(Error::FileError {
                name: name.to_string(),
                message: "file is already open".to_string(),
            });
        }
        let file_error = |err: io::Error| Error::FileError {
            name: name.to_string(),
            message: err.to_string(),
        };
        let handle = match mode {
            FileMode::Read => FileHandle::Reader(BufReader::new(
                File::open(name).map_err(file_error)?,
            )),
            FileMode::Write => FileHandle::Writer(File::create(name).map_err(file_error)?),
        };
        self.files.insert(name.to_string(), handle);
        Ok(())
    }

    fn read_file_line(&mut self, name: &str) -> Result<String> {
        let handle = self.files.get_mut(name).ok_or_else(|| Error::FileError {
            name: name.to_string(),
            message: "file is not open".to_string(),
        })?;
        let reader = match handle {
            FileHandle::Reader(reader) => reader,
            FileHandle::Writer(_) => {
                return Err(Error::FileError {
                    name: name.to_string(),
                    message: "file is open for WRITE".to_string(),
                })
            }
        };
        let mut line = String::new();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            return Err(Error::FileError {
                name: name.to_string(),
                message: "end of file".to_string(),
            });
        }
        Ok(line)
    }

    fn write_file_line(&mut self, name: &str, value: &Value) -> Result<()> {
        let handle = self.files.get_mut(name).ok_or_else(|| Error::FileError {
            name: name.to_string(),
            message: "file is not open".to_string(),
        })?;
        match handle {
            FileHandle::Writer(file) => {
                writeln!(file, "{value}")?;
                Ok(())
            }
            FileHandle::Reader(_) => Err(Error::FileError {
                name: name.to_string(),
                message: "file is open for READ".to_string(),
            }),
        }
    }

    // ----- expressions -----

    /// Evaluate one expression to a value
    pub fn eval(&mut self, expr: &Expression) -> Result<Value> {
        match expr {
            Expression::Literal(literal) => Ok(Value::from(literal.clone())),
            Expression::Identifier(ident) => Ok(self.state.read(&ident.name)?.clone()),
            Expression::UnaryOp { op, operand } => {
                let operand = self.eval(operand)?;
                apply_unary(*op, operand)
            }
            // Both operands are always evaluated; AND/OR do not short-circuit
            Expression::BinaryOp { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                apply_binary(*op, left, right)
            }
            Expression::FunctionCall { callee, args } => match callee.as_ref() {
                Expression::Identifier(ident) => self.invoke_function(&ident.name, args),
                _ => Err(Error::TypeMismatch {
                    expected: "function name".to_string(),
                    got: "expression".to_string(),
                }),
            },
            Expression::ArrayIndex { array, indices } => {
                let base = self.eval(array)?;
                let indices = self
                    .eval_all(indices)?
                    .iter()
                    .map(Value::as_int)
                    .collect::<Result<Vec<i64>>>()?;
                let described = match array.as_ref() {
                    Expression::Identifier(ident) => ident.name.clone(),
                    _ => "array element".to_string(),
                };
                index_value(&base, &indices, &described)
            }
        }
    }

    fn eval_all(&mut self, exprs: &[Expression]) -> Result<Vec<Value>> {
        exprs.iter().map(|expr| self.eval(expr)).collect()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

/// Lex, parse and execute `source` in one shot, feeding it `input` as its
/// standard input and capturing everything it outputs
///
/// Convenience runner for embedding and tests; the CLI wires real streams
/// through [`Interpreter::with_io`] instead.
pub fn run_source(source: &str, input: &str) -> Result<String> {
    let tokens = crate::lexer::tokenize(source)?;
    let program = crate::parser::parse_program(tokens)?;
    let buffer = Rc::new(RefCell::new(Vec::new()));
    let mut interpreter = Interpreter::with_io(
        Box::new(io::Cursor::new(input.to_string())),
        Box::new(SharedWriter(Rc::clone(&buffer))),
    );
    interpreter.execute(&program)?;
    let bytes = buffer.borrow().clone();
    String::from_utf8(bytes).map_err(|_| Error::IoError("output was not valid UTF-8".to_string()))
}

/// Writer handle over a buffer the caller keeps a reference to
struct SharedWriter(Rc<RefCell<Vec<u8>>>);

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Value equality for `=`/`<>` and CASE labels: numeric values compare across
/// INTEGER/REAL, everything else by exact variant
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Integer(x), Value::Real(y)) | (Value::Real(y), Value::Integer(x)) => {
            *x as f64 == *y
        }
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Result<Ordering> {
    let mismatch = || Error::TypeMismatch {
        expected: a.type_name().to_string(),
        got: b.type_name().to_string(),
    };
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => Ok(x.cmp(y)),
        (Value::Char(x), Value::Char(y)) => Ok(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::Integer(_) | Value::Real(_), Value::Integer(_) | Value::Real(_)) => {
            let x = a.as_real()?;
            let y = b.as_real()?;
            x.partial_cmp(&y).ok_or_else(mismatch)
        }
        _ => Err(mismatch()),
    }
}

fn apply_unary(op: UnaryOp, operand: Value) -> Result<Value> {
    match op {
        UnaryOp::Neg => match operand {
            Value::Integer(n) => match n.checked_neg() {
                Some(negated) => Ok(Value::Integer(negated)),
                None => Ok(Value::Real(-(n as f64))),
            },
            Value::Real(r) => Ok(Value::Real(-r)),
            other => Err(Error::TypeMismatch {
                expected: "INTEGER or REAL".to_string(),
                got: other.type_name().to_string(),
            }),
        },
        UnaryOp::Not => Ok(Value::Boolean(!operand.as_bool()?)),
    }
}

fn apply_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    match op {
        BinaryOp::Add => arithmetic(left, right, i64::checked_add, |x, y| x + y),
        BinaryOp::Sub => arithmetic(left, right, i64::checked_sub, |x, y| x - y),
        BinaryOp::Mul => arithmetic(left, right, i64::checked_mul, |x, y| x * y),
        // Division always yields REAL
        BinaryOp::Div => {
            let x = left.as_real()?;
            let y = right.as_real()?;
            if y == 0.0 {
                return Err(Error::DivisionByZero);
            }
            Ok(Value::Real(x / y))
        }
        BinaryOp::Pow => power(left, right),
        BinaryOp::Eq => Ok(Value::Boolean(values_equal(&left, &right))),
        BinaryOp::NotEq => Ok(Value::Boolean(!values_equal(&left, &right))),
        BinaryOp::Lt => Ok(Value::Boolean(compare(&left, &right)? == Ordering::Less)),
        BinaryOp::LtEq => Ok(Value::Boolean(compare(&left, &right)? != Ordering::Greater)),
        BinaryOp::Gt => Ok(Value::Boolean(compare(&left, &right)? == Ordering::Greater)),
        BinaryOp::GtEq => Ok(Value::Boolean(compare(&left, &right)? != Ordering::Less)),
        BinaryOp::And => Ok(Value::Boolean(left.as_bool()? && right.as_bool()?)),
        BinaryOp::Or => Ok(Value::Boolean(left.as_bool()? || right.as_bool()?)),
    }
}

/// Apply an arithmetic operator, staying in INTEGER when both operands are
/// integers and widening to REAL otherwise
///
/// An integer result that overflows i64 widens to REAL instead of
/// panicking, the same fallback `power` uses.
fn arithmetic(
    left: Value,
    right: Value,
    int_op: impl FnOnce(i64, i64) -> Option<i64>,
    real_op: impl FnOnce(f64, f64) -> f64,
) -> Result<Value> {
    if let (Value::Integer(x), Value::Integer(y)) = (&left, &right) {
        if let Some(result) = int_op(*x, *y) {
            return Ok(Value::Integer(result));
        }
    }
    Ok(Value::Real(real_op(left.as_real()?, right.as_real()?)))
}

/// `^`: integer result for an integer base and non-negative integer
/// exponent (falling back to REAL on overflow), REAL otherwise
fn power(left: Value, right: Value) -> Result<Value> {
    if let (Value::Integer(base), Value::Integer(exp)) = (&left, &right) {
        if *exp >= 0 {
            if let Ok(exp) = u32::try_from(*exp) {
                if let Some(result) = base.checked_pow(exp) {
                    return Ok(Value::Integer(result));
                }
            }
        }
    }
    let x = left.as_real()?;
    let y = right.as_real()?;
    Ok(Value::Real(x.powf(y)))
}

/// Subscript a value: arrays index by their extents, strings index 1-based
/// and yield CHAR
fn index_value(base: &Value, indices: &[i64], described: &str) -> Result<Value> {
    match base {
        Value::Array(array) => match array.get(indices)? {
            Some(value) => Ok(value.clone()),
            None => Err(Error::UnassignedVariable {
                name: format!(
                    "{described}[{}]",
                    indices
                        .iter()
                        .map(|i| i.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }),
        },
        Value::Str(s) => {
            let [index] = indices else {
                return Err(Error::TypeMismatch {
                    expected: "1 string index".to_string(),
                    got: indices.len().to_string(),
                });
            };
            let length = s.chars().count() as i64;
            if *index < 1 || *index > length {
                return Err(Error::IndexOutOfBounds {
                    index: *index,
                    lower: 1,
                    upper: length,
                });
            }
            let c = s.chars().nth((*index - 1) as usize);
            // bounds check above guarantees the character exists
            Ok(Value::Char(c.unwrap_or('\0')))
        }
        other => Err(Error::TypeMismatch {
            expected: "ARRAY or STRING".to_string(),
            got: other.type_name().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{tokenize, Literal};
    use crate::parser::parse_expression;

    fn eval_str(source: &str) -> Result<Value> {
        let expr = parse_expression(tokenize(source).unwrap()).unwrap();
        Interpreter::with_io(Box::new(io::empty()), Box::new(io::sink())).eval(&expr)
    }

    /// Run a program with the given stdin, returning captured stdout
    fn run_with_input(source: &str, input: &str) -> Result<String> {
        run_source(source, input)
    }

    fn run(source: &str) -> Result<String> {
        run_with_input(source, "")
    }

    #[test]
    fn precedence_and_grouping() {
        assert_eq!(eval_str("1 + 2 * 3").unwrap(), Value::Integer(7));
        assert_eq!(eval_str("(1 + 2) * 3").unwrap(), Value::Integer(9));
        assert_eq!(eval_str("10 - 3 - 2").unwrap(), Value::Integer(5));
    }

    #[test]
    fn boolean_operators() {
        assert_eq!(
            eval_str("TRUE OR FALSE AND FALSE").unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(eval_str("NOT TRUE").unwrap(), Value::Boolean(false));
    }

    #[test]
    fn division_always_yields_real() {
        assert_eq!(eval_str("7 / 2").unwrap(), Value::Real(3.5));
        assert_eq!(eval_str("4 / 2").unwrap(), Value::Real(2.0));
        assert!(matches!(eval_str("1 / 0"), Err(Error::DivisionByZero)));
    }

    #[test]
    fn power_stays_integer_when_it_can() {
        assert_eq!(eval_str("2 ^ 10").unwrap(), Value::Integer(1024));
        assert_eq!(eval_str("2 ^ -1").unwrap(), Value::Real(0.5));
    }

    #[test]
    fn numeric_comparison_crosses_types() {
        assert_eq!(eval_str("1 = 1.0").unwrap(), Value::Boolean(true));
        assert_eq!(eval_str("2 > 1.5").unwrap(), Value::Boolean(true));
    }

    #[test]
    fn assignment_contract() {
        assert_eq!(
            run("DECLARE x : INTEGER\nx <- 5\nOUTPUT x").unwrap(),
            "5\n"
        );
        assert!(matches!(
            run("y <- 5"),
            Err(Error::UndefinedName { .. })
        ));
    }

    #[test]
    fn unset_read_is_distinct_from_undeclared() {
        assert!(matches!(
            run("DECLARE x : INTEGER\nOUTPUT x"),
            Err(Error::UnassignedVariable { .. })
        ));
        assert!(matches!(run("OUTPUT x"), Err(Error::UndefinedName { .. })));
    }

    #[test]
    fn output_concatenates_without_separator() {
        assert_eq!(
            run("OUTPUT \"n = \", 1 + 1, \"!\"").unwrap(),
            "n = 2!\n"
        );
    }

    #[test]
    fn if_else_selects_one_branch() {
        let source = "DECLARE x : INTEGER\nx <- 3\nIF x > 2 THEN\nOUTPUT \"big\"\nELSE\nOUTPUT \"small\"\nENDIF";
        assert_eq!(run(source).unwrap(), "big\n");
    }

    #[test]
    fn for_runs_inclusive_bounds() {
        let source = "DECLARE i : INTEGER\nFOR i <- 1 TO 3\nOUTPUT i\nNEXT i";
        assert_eq!(run(source).unwrap(), "1\n2\n3\n");
    }

    #[test]
    fn for_with_start_past_end_runs_zero_times() {
        let source = "DECLARE i : INTEGER\nFOR i <- 5 TO 1\nOUTPUT i\nNEXT i\nOUTPUT \"done\"";
        assert_eq!(run(source).unwrap(), "done\n");
    }

    #[test]
    fn for_step_two() {
        let source = "DECLARE i : INTEGER\nFOR i <- 1 TO 6 STEP 2\nOUTPUT i\nNEXT i";
        assert_eq!(run(source).unwrap(), "1\n3\n5\n");
    }

    #[test]
    fn while_and_repeat() {
        let source = "DECLARE n : INTEGER\nn <- 3\nWHILE n > 0 DO\nOUTPUT n\nn <- n - 1\nENDWHILE";
        assert_eq!(run(source).unwrap(), "3\n2\n1\n");
        let source = "DECLARE n : INTEGER\nn <- 0\nREPEAT\nOUTPUT n\nn <- n + 1\nUNTIL n >= 2";
        assert_eq!(run(source).unwrap(), "0\n1\n");
    }

    #[test]
    fn case_matches_first_then_otherwise() {
        let source = "DECLARE x : INTEGER\nx <- 2\nCASE OF x\n1 : OUTPUT \"one\"\n2 : OUTPUT \"two\"\nOTHERWISE : OUTPUT \"many\"\nENDCASE";
        assert_eq!(run(source).unwrap(), "two\n");
        let source = "DECLARE x : INTEGER\nx <- 9\nCASE OF x\n1 : OUTPUT \"one\"\nOTHERWISE : OUTPUT \"many\"\nENDCASE";
        assert_eq!(run(source).unwrap(), "many\n");
    }

    #[test]
    fn input_coerces_to_declared_type() {
        let source = "DECLARE n : INTEGER\nINPUT n\nOUTPUT n * 2";
        assert_eq!(run_with_input(source, "21\n").unwrap(), "42\n");
        assert!(matches!(
            run_with_input(source, "abc\n"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn constants_are_readable_but_not_assignable() {
        assert_eq!(run("CONSTANT Pi <- 3.14\nOUTPUT Pi").unwrap(), "3.14\n");
        assert!(matches!(
            run("CONSTANT Pi <- 3.14\nPi <- 3.0"),
            Err(Error::InvalidAssignmentTarget { .. })
        ));
    }

    #[test]
    fn procedure_call_binds_parameters() {
        let source = "PROCEDURE Shout(msg : STRING)\nOUTPUT msg, \"!\"\nENDPROCEDURE\nCALL Shout(\"hi\")";
        assert_eq!(run(source).unwrap(), "hi!\n");
    }

    #[test]
    fn function_returns_a_value() {
        let source = "FUNCTION Add(a : INTEGER, b : INTEGER) RETURNS INTEGER\nRETURN a + b\nENDFUNCTION\nOUTPUT Add(2, 3)";
        assert_eq!(run(source).unwrap(), "5\n");
    }

    #[test]
    fn function_without_return_fails() {
        let source = "FUNCTION Nothing() RETURNS INTEGER\nOUTPUT \"hi\"\nENDFUNCTION\nOUTPUT Nothing()";
        assert!(matches!(run(source), Err(Error::MissingReturn { .. })));
    }

    #[test]
    fn locals_do_not_leak_between_calls() {
        let source = "PROCEDURE P\nDECLARE t : INTEGER\nt <- 1\nENDPROCEDURE\nCALL P\nOUTPUT t";
        assert!(matches!(run(source), Err(Error::UndefinedName { .. })));
    }

    #[test]
    fn recursion_works_up_to_the_limit() {
        let source = "FUNCTION Fact(n : INTEGER) RETURNS INTEGER\nIF n <= 1 THEN\nRETURN 1\nELSE\nRETURN n * Fact(n - 1)\nENDIF\nENDFUNCTION\nOUTPUT Fact(5)";
        assert_eq!(run(source).unwrap(), "120\n");
        let source = "FUNCTION Loop(n : INTEGER) RETURNS INTEGER\nRETURN Loop(n + 1)\nENDFUNCTION\nOUTPUT Loop(0)";
        assert!(matches!(run(source), Err(Error::RecursionLimit { .. })));
    }

    #[test]
    fn deeply_nested_blocks_hit_the_statement_depth_limit() {
        let mut statement = Statement::Output {
            values: vec![Expression::Literal(Literal::Integer(1))],
        };
        for _ in 0..(MAX_STATEMENT_DEPTH + 10) {
            statement = Statement::If {
                condition: Expression::Literal(Literal::Boolean(true)),
                then_branch: vec![statement],
                else_branch: None,
            };
        }
        let program = Program {
            statements: vec![statement],
        };
        let mut interpreter =
            Interpreter::with_io(Box::new(io::empty()), Box::new(io::sink()));
        assert!(matches!(
            interpreter.execute(&program),
            Err(Error::RecursionLimit {
                limit: MAX_STATEMENT_DEPTH
            })
        ));
    }

    #[test]
    fn integer_overflow_widens_to_real() {
        assert_eq!(
            run("OUTPUT 9223372036854775807 + 1").unwrap(),
            "9223372036854775808.0\n"
        );
        assert_eq!(
            run("OUTPUT 4611686018427387904 * 4").unwrap(),
            "18446744073709551616.0\n"
        );
        assert_eq!(
            run("OUTPUT -(0 - 9223372036854775807 - 1)").unwrap(),
            "9223372036854775808.0\n"
        );
    }

    #[test]
    fn for_loop_stops_when_the_counter_cannot_advance() {
        let source =
            "DECLARE i : INTEGER\nFOR i <- 9223372036854775806 TO 9223372036854775807\nOUTPUT i\nNEXT i";
        assert_eq!(
            run(source).unwrap(),
            "9223372036854775806\n9223372036854775807\n"
        );
    }

    #[test]
    fn return_at_top_level_is_unsupported() {
        assert!(matches!(
            run("RETURN 1"),
            Err(Error::UnsupportedConstruct { .. })
        ));
    }

    #[test]
    fn array_index_assignment_is_rejected() {
        let source = "DECLARE Grid : ARRAY[1:3] OF INTEGER\nGrid[1] <- 5";
        assert!(matches!(
            run(source),
            Err(Error::InvalidAssignmentTarget { .. })
        ));
    }

    #[test]
    fn reading_an_unset_array_element_is_unassigned() {
        let source = "DECLARE Grid : ARRAY[1:3] OF INTEGER\nOUTPUT Grid[2]";
        assert!(matches!(run(source), Err(Error::UnassignedVariable { .. })));
    }

    #[test]
    fn array_index_out_of_bounds() {
        let source = "DECLARE Grid : ARRAY[1:3] OF INTEGER\nOUTPUT Grid[4]";
        assert!(matches!(run(source), Err(Error::IndexOutOfBounds { .. })));
    }

    #[test]
    fn string_indexing_yields_char() {
        let source = "DECLARE s : STRING\ns <- \"abc\"\nOUTPUT s[2]";
        assert_eq!(run(source).unwrap(), "b\n");
    }

    #[test]
    fn case_label_can_be_a_constant() {
        let source = "CONSTANT Two <- 2\nDECLARE x : INTEGER\nx <- 2\nCASE OF x\nTwo : OUTPUT \"two\"\nENDCASE";
        assert_eq!(run(source).unwrap(), "two\n");
    }

    #[test]
    fn file_round_trip() {
        let dir = std::env::temp_dir().join(format!("camscript-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.txt");
        let path = path.to_str().unwrap();
        let source = format!(
            "OPENFILE \"{path}\" FOR WRITE\nWRITEFILE \"{path}\", 42\nCLOSEFILE \"{path}\"\n\
             DECLARE line : STRING\nOPENFILE \"{path}\" FOR READ\nREADFILE \"{path}\", line\n\
             CLOSEFILE \"{path}\"\nOUTPUT line"
        );
        assert_eq!(run(&source).unwrap(), "42\n");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn file_statements_demand_an_open_file() {
        assert!(matches!(
            run("CLOSEFILE \"nope.txt\""),
            Err(Error::FileError { .. })
        ));
        assert!(matches!(
            run("WRITEFILE \"nope.txt\", 1"),
            Err(Error::FileError { .. })
        ));
    }
}
