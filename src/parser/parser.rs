//! Recursive-descent parser
//!
//! Turns the token stream into the syntax tree in a single forward pass with
//! one token of lookahead. Statement forms are dispatched on their leading
//! keyword; expressions use one method per precedence level, from `OR` at the
//! loosest down to call/index chains at the tightest.

use tracing::debug;

use crate::error::{Error, Result};
use crate::lexer::{Keyword, Literal, Symbol, Token, TokenKind, TokenPattern};
use crate::parser::ast::{
    ArrayTypeExpr, Assignable, BinaryOp, CaseLabel, Expression, FileMode, Ident, Parameter,
    PrimitiveType, Program, Statement, TypeExpr, UnaryOp,
};

/// Maximum expression and statement nesting depth before the parser bails
/// out
///
/// Keeps pathological input (thousands of opening parentheses, chained
/// `NOT`s, or deeply nested `IF` blocks) from overflowing the native stack.
pub const MAX_EXPRESSION_DEPTH: usize = 200;

/// Single-pass parser over a scanned token stream
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
}

impl Parser {
    /// Create a parser over `tokens`
    ///
    /// A trailing EOF token is appended when missing, so hand-built token
    /// lists behave the same as scanner output.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        let needs_eof = !matches!(
            tokens.last().map(|t| &t.kind),
            Some(TokenKind::Eof)
        );
        if needs_eof {
            let (line, column) = tokens
                .last()
                .map(|t| (t.line, t.column + 1))
                .unwrap_or((0, 0));
            tokens.push(Token::new(TokenKind::Eof, line, column));
        }
        Parser {
            tokens,
            current: 0,
            depth: 0,
        }
    }

    /// Parse the whole stream as a program
    pub fn parse(&mut self) -> Result<Program> {
        debug!(tokens = self.tokens.len(), "parsing program");
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.statement()?);
        }
        debug!(statements = statements.len(), "parse complete");
        Ok(Program { statements })
    }

    // ----- cursor primitives -----

    fn peek(&self) -> &Token {
        // new() guarantees a trailing EOF, so the cursor never runs past it
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    /// True when the next token matches `pattern`, without consuming it
    fn check<P: TokenPattern>(&self, pattern: P) -> bool {
        pattern.matches(self.peek())
    }

    /// Consume the next token if it matches `pattern`
    fn match_token<P: TokenPattern + Copy>(&mut self, pattern: P) -> bool {
        if self.check(pattern) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Demand that the next token matches `pattern`
    fn consume<P: TokenPattern + Copy>(&mut self, pattern: P) -> Result<Token> {
        if self.check(pattern) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&pattern.to_string()))
        }
    }

    /// Build the error for an unwanted token at the cursor
    fn unexpected(&self, expected: &str) -> Error {
        let token = self.peek();
        if matches!(token.kind, TokenKind::Eof) {
            Error::UnexpectedEof {
                expected: expected.to_string(),
            }
        } else {
            Error::UnexpectedToken {
                expected: expected.to_string(),
                found: token.kind.to_string(),
                line: token.line,
                column: token.column,
            }
        }
    }

    /// Run `f` speculatively: on failure the cursor is restored and the error
    /// is swallowed
    fn try_parse<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Option<T> {
        let saved = self.current;
        match f(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.current = saved;
                None
            }
        }
    }

    /// Guard a recursive descent step against runaway nesting
    fn descend<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_EXPRESSION_DEPTH {
            return Err(Error::RecursionLimit {
                limit: MAX_EXPRESSION_DEPTH,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // ----- small terminals -----

    fn identifier(&mut self, expected: &str) -> Result<Ident> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Ident {
                    name,
                    line: token.line,
                    column: token.column,
                })
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn literal(&mut self) -> Result<Literal> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Literal(lit) => {
                self.advance();
                Ok(lit)
            }
            _ => Err(self.unexpected("literal")),
        }
    }

    /// A string literal in statement position, e.g. the file name of
    /// `OPENFILE`
    fn string_literal(&mut self) -> Result<String> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Literal(Literal::Str(s)) => {
                self.advance();
                Ok(s)
            }
            _ => Err(self.unexpected("string literal")),
        }
    }

    // ----- statements -----

    fn statement(&mut self) -> Result<Statement> {
        // Nested blocks recurse through here as well, so they share the
        // same depth budget as expressions
        self.descend(Self::statement_inner)
    }

    fn statement_inner(&mut self) -> Result<Statement> {
        let keyword = match self.peek().kind {
            TokenKind::Keyword(kw) => Some(kw),
            _ => None,
        };
        match keyword {
            Some(Keyword::Declare) => self.declare_statement(),
            Some(Keyword::Constant) => self.constant_statement(),
            Some(Keyword::If) => self.if_statement(),
            Some(Keyword::Case) => self.case_statement(),
            Some(Keyword::For) => self.for_statement(),
            Some(Keyword::While) => self.while_statement(),
            Some(Keyword::Repeat) => self.repeat_statement(),
            Some(Keyword::Input) => self.input_statement(),
            Some(Keyword::Output) => self.output_statement(),
            Some(Keyword::Procedure) => self.procedure_declaration(),
            Some(Keyword::Function) => self.function_declaration(),
            Some(Keyword::Call) => self.call_statement(),
            Some(Keyword::Return) => self.return_statement(),
            Some(Keyword::OpenFile) => self.open_file_statement(),
            Some(Keyword::ReadFile) => self.read_file_statement(),
            Some(Keyword::WriteFile) => self.write_file_statement(),
            Some(Keyword::CloseFile) => self.close_file_statement(),
            _ => self.assignment_statement(),
        }
    }

    /// Parse statements until one of `terminators` is at the cursor
    ///
    /// The terminator itself is left for the caller to consume, so `IF` can
    /// stop at either `ELSE` or `ENDIF` and then look at which one it got.
    fn block(&mut self, terminators: &[Keyword]) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            if self.is_at_end() {
                let expected = terminators
                    .iter()
                    .map(|kw| kw.to_string())
                    .collect::<Vec<_>>()
                    .join(" or ");
                return Err(Error::UnexpectedEof { expected });
            }
            if terminators.iter().any(|kw| kw.matches(self.peek())) {
                return Ok(statements);
            }
            statements.push(self.statement()?);
        }
    }

    /// `DECLARE name : Type`
    fn declare_statement(&mut self) -> Result<Statement> {
        self.consume(Keyword::Declare)?;
        let name = self.identifier("variable name")?;
        self.consume(Symbol::Colon)?;
        let ty = self.type_expr()?;
        Ok(Statement::VariableDecl { name, ty })
    }

    /// `CONSTANT name <- literal`
    fn constant_statement(&mut self) -> Result<Statement> {
        self.consume(Keyword::Constant)?;
        let name = self.identifier("constant name")?;
        self.consume(Symbol::Assign)?;
        let value = self.literal()?;
        Ok(Statement::ConstantDecl { name, value })
    }

    /// `IF cond THEN ... [ELSE ...] ENDIF`
    fn if_statement(&mut self) -> Result<Statement> {
        self.consume(Keyword::If)?;
        let condition = self.expression()?;
        self.consume(Keyword::Then)?;
        let then_branch = self.block(&[Keyword::Else, Keyword::EndIf])?;
        let else_branch = if self.match_token(Keyword::Else) {
            Some(self.block(&[Keyword::EndIf])?)
        } else {
            None
        };
        self.consume(Keyword::EndIf)?;
        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// `CASE OF expr { label : stmt } [OTHERWISE : stmt] ENDCASE`
    fn case_statement(&mut self) -> Result<Statement> {
        self.consume(Keyword::Case)?;
        self.consume(Keyword::Of)?;
        let expr = self.expression()?;
        let mut cases = Vec::new();
        let mut otherwise = None;
        loop {
            if self.match_token(Keyword::EndCase) {
                break;
            }
            if self.match_token(Keyword::Otherwise) {
                self.consume(Symbol::Colon)?;
                otherwise = Some(Box::new(self.statement()?));
                self.consume(Keyword::EndCase)?;
                break;
            }
            let label = self.case_label()?;
            self.consume(Symbol::Colon)?;
            let statement = self.statement()?;
            cases.push((label, statement));
        }
        Ok(Statement::Case {
            expr,
            cases,
            otherwise,
        })
    }

    fn case_label(&mut self) -> Result<CaseLabel> {
        if let Some(lit) = self.try_parse(Self::literal) {
            return Ok(CaseLabel::Literal(lit));
        }
        self.identifier("case label").map(CaseLabel::Identifier)
    }

    /// `FOR var <- start TO end [STEP step] ... NEXT [var]`
    fn for_statement(&mut self) -> Result<Statement> {
        self.consume(Keyword::For)?;
        let variable = self.assignable("loop variable")?;
        self.consume(Symbol::Assign)?;
        let start = self.expression()?;
        self.consume(Keyword::To)?;
        let end = self.expression()?;
        let step = if self.match_token(Keyword::Step) {
            Some(self.expression()?)
        } else {
            None
        };
        let body = self.block(&[Keyword::Next])?;
        self.consume(Keyword::Next)?;
        // `NEXT i` must close the loop it names
        if let TokenKind::Identifier(_) = self.peek().kind {
            let closing = self.identifier("loop variable")?;
            if closing.name != variable.name() {
                return Err(Error::UnexpectedToken {
                    expected: variable.name().to_string(),
                    found: closing.name,
                    line: closing.line,
                    column: closing.column,
                });
            }
        }
        Ok(Statement::For {
            variable,
            start,
            end,
            step,
            body,
        })
    }

    /// `WHILE cond [DO] ... ENDWHILE` — the `DO` is tolerated but optional
    fn while_statement(&mut self) -> Result<Statement> {
        self.consume(Keyword::While)?;
        let condition = self.expression()?;
        self.match_token(Keyword::Do);
        let body = self.block(&[Keyword::EndWhile])?;
        self.consume(Keyword::EndWhile)?;
        Ok(Statement::While { condition, body })
    }

    /// `REPEAT ... UNTIL cond`
    fn repeat_statement(&mut self) -> Result<Statement> {
        self.consume(Keyword::Repeat)?;
        let body = self.block(&[Keyword::Until])?;
        self.consume(Keyword::Until)?;
        let condition = self.expression()?;
        Ok(Statement::RepeatUntil { body, condition })
    }

    /// `INPUT target`
    fn input_statement(&mut self) -> Result<Statement> {
        self.consume(Keyword::Input)?;
        let target = self.assignable("input target")?;
        Ok(Statement::Input { target })
    }

    /// `OUTPUT expr {, expr}`
    fn output_statement(&mut self) -> Result<Statement> {
        self.consume(Keyword::Output)?;
        let mut values = vec![self.expression()?];
        while self.match_token(Symbol::Comma) {
            values.push(self.expression()?);
        }
        Ok(Statement::Output { values })
    }

    /// `PROCEDURE name [(params)] ... ENDPROCEDURE`
    fn procedure_declaration(&mut self) -> Result<Statement> {
        self.consume(Keyword::Procedure)?;
        let name = self.identifier("procedure name")?;
        let params = self.parameter_list()?;
        let body = self.block(&[Keyword::EndProcedure])?;
        self.consume(Keyword::EndProcedure)?;
        Ok(Statement::ProcedureDecl { name, params, body })
    }

    /// `FUNCTION name [(params)] RETURNS Type ... ENDFUNCTION`
    fn function_declaration(&mut self) -> Result<Statement> {
        self.consume(Keyword::Function)?;
        let name = self.identifier("function name")?;
        let params = self.parameter_list()?;
        self.consume(Keyword::Returns)?;
        let return_type = self.type_expr()?;
        let body = self.block(&[Keyword::EndFunction])?;
        self.consume(Keyword::EndFunction)?;
        Ok(Statement::FunctionDecl {
            name,
            params,
            return_type,
            body,
        })
    }

    /// Optional parenthesised `name : Type` list; `None` when no parentheses
    /// were written at all
    fn parameter_list(&mut self) -> Result<Option<Vec<Parameter>>> {
        if !self.match_token(Symbol::LeftParen) {
            return Ok(None);
        }
        let mut params = Vec::new();
        if !self.check(Symbol::RightParen) {
            loop {
                let name = self.identifier("parameter name")?;
                self.consume(Symbol::Colon)?;
                let ty = self.type_expr()?;
                params.push(Parameter { name, ty });
                if !self.match_token(Symbol::Comma) {
                    break;
                }
            }
        }
        self.consume(Symbol::RightParen)?;
        Ok(Some(params))
    }

    /// `CALL name [(args)]`
    fn call_statement(&mut self) -> Result<Statement> {
        self.consume(Keyword::Call)?;
        let name = self.identifier("procedure name")?;
        let args = if self.match_token(Symbol::LeftParen) {
            let args = self.arguments(Symbol::RightParen)?;
            self.consume(Symbol::RightParen)?;
            Some(args)
        } else {
            None
        };
        Ok(Statement::ProcedureCall { name, args })
    }

    /// `RETURN expr`
    fn return_statement(&mut self) -> Result<Statement> {
        self.consume(Keyword::Return)?;
        let value = self.expression()?;
        Ok(Statement::Return { value })
    }

    /// `OPENFILE "name" FOR READ|WRITE`
    fn open_file_statement(&mut self) -> Result<Statement> {
        self.consume(Keyword::OpenFile)?;
        let file = self.string_literal()?;
        self.consume(Keyword::For)?;
        let mode = if self.match_token(Keyword::Read) {
            FileMode::Read
        } else if self.match_token(Keyword::Write) {
            FileMode::Write
        } else {
            return Err(self.unexpected("READ or WRITE"));
        };
        Ok(Statement::FileOpen { file, mode })
    }

    /// `READFILE "name", target`
    fn read_file_statement(&mut self) -> Result<Statement> {
        self.consume(Keyword::ReadFile)?;
        let file = self.string_literal()?;
        self.consume(Symbol::Comma)?;
        let target = self.assignable("read target")?;
        Ok(Statement::FileRead { file, target })
    }

    /// `WRITEFILE "name", expr`
    fn write_file_statement(&mut self) -> Result<Statement> {
        self.consume(Keyword::WriteFile)?;
        let file = self.string_literal()?;
        self.consume(Symbol::Comma)?;
        let value = self.expression()?;
        Ok(Statement::FileWrite { file, value })
    }

    /// `CLOSEFILE "name"`
    fn close_file_statement(&mut self) -> Result<Statement> {
        self.consume(Keyword::CloseFile)?;
        let file = self.string_literal()?;
        Ok(Statement::FileClose { file })
    }

    /// `target <- expr` — the fallthrough when no statement keyword matched
    fn assignment_statement(&mut self) -> Result<Statement> {
        let target = self.assignable("statement")?;
        self.consume(Symbol::Assign)?;
        let value = self.expression()?;
        Ok(Statement::Assignment { target, value })
    }

    /// Parse a call-level expression and narrow it to an assignment target
    fn assignable(&mut self, expected: &str) -> Result<Assignable> {
        let token = self.peek().clone();
        let expr = self.call()?;
        Assignable::try_from(expr).map_err(|_| Error::UnexpectedToken {
            expected: expected.to_string(),
            found: token.kind.to_string(),
            line: token.line,
            column: token.column,
        })
    }

    // ----- types -----

    /// A type annotation: a primitive name or `ARRAY[bounds] OF primitive`
    fn type_expr(&mut self) -> Result<TypeExpr> {
        if let Some(primitive) = self.try_parse(Self::primitive_type) {
            return Ok(TypeExpr::Primitive(primitive));
        }
        self.array_type().map(TypeExpr::Array)
    }

    fn primitive_type(&mut self) -> Result<PrimitiveType> {
        let primitive = match self.peek().kind {
            TokenKind::Keyword(Keyword::Integer) => PrimitiveType::Integer,
            TokenKind::Keyword(Keyword::Real) => PrimitiveType::Real,
            TokenKind::Keyword(Keyword::Char) => PrimitiveType::Char,
            TokenKind::Keyword(Keyword::String) => PrimitiveType::String,
            TokenKind::Keyword(Keyword::Boolean) => PrimitiveType::Boolean,
            _ => return Err(self.unexpected("type")),
        };
        self.advance();
        Ok(primitive)
    }

    /// `ARRAY[lo:hi {, lo:hi}] OF primitive`
    fn array_type(&mut self) -> Result<ArrayTypeExpr> {
        self.consume(Keyword::Array)?;
        self.consume(Symbol::LeftBracket)?;
        let mut bounds = Vec::new();
        loop {
            let lower = self.expression()?;
            self.consume(Symbol::Colon)?;
            let upper = self.expression()?;
            bounds.push((lower, upper));
            if !self.match_token(Symbol::Comma) {
                break;
            }
        }
        self.consume(Symbol::RightBracket)?;
        self.consume(Keyword::Of)?;
        let element = self.primitive_type()?;
        Ok(ArrayTypeExpr { element, bounds })
    }

    // ----- expressions, loosest precedence first -----

    fn expression(&mut self) -> Result<Expression> {
        self.descend(Self::logic_or)
    }

    fn logic_or(&mut self) -> Result<Expression> {
        let mut left = self.logic_and()?;
        while self.match_token(Keyword::Or) {
            let right = self.logic_and()?;
            left = Expression::BinaryOp {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn logic_and(&mut self) -> Result<Expression> {
        let mut left = self.logic_not()?;
        while self.match_token(Keyword::And) {
            let right = self.logic_not()?;
            left = Expression::BinaryOp {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// Right-associative prefix `NOT`
    fn logic_not(&mut self) -> Result<Expression> {
        if self.match_token(Keyword::Not) {
            let operand = self.descend(Self::logic_not)?;
            return Ok(Expression::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expression> {
        let mut left = self.term()?;
        loop {
            let op = if self.match_token(Symbol::Equal) {
                BinaryOp::Eq
            } else if self.match_token(Symbol::NotEqual) {
                BinaryOp::NotEq
            } else if self.match_token(Symbol::LessEqual) {
                BinaryOp::LtEq
            } else if self.match_token(Symbol::Less) {
                BinaryOp::Lt
            } else if self.match_token(Symbol::GreaterEqual) {
                BinaryOp::GtEq
            } else if self.match_token(Symbol::Greater) {
                BinaryOp::Gt
            } else {
                return Ok(left);
            };
            let right = self.term()?;
            left = Expression::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn term(&mut self) -> Result<Expression> {
        let mut left = self.factor()?;
        loop {
            let op = if self.match_token(Symbol::Add) {
                BinaryOp::Add
            } else if self.match_token(Symbol::Sub) {
                BinaryOp::Sub
            } else {
                return Ok(left);
            };
            let right = self.factor()?;
            left = Expression::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn factor(&mut self) -> Result<Expression> {
        let mut left = self.unary()?;
        loop {
            let op = if self.match_token(Symbol::Mul) {
                BinaryOp::Mul
            } else if self.match_token(Symbol::Div) {
                BinaryOp::Div
            } else {
                return Ok(left);
            };
            let right = self.unary()?;
            left = Expression::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    /// Prefix minus, binding tighter than `*` and `/`
    fn unary(&mut self) -> Result<Expression> {
        if self.match_token(Symbol::Sub) {
            let operand = self.descend(Self::unary)?;
            return Ok(Expression::UnaryOp {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.power()
    }

    /// Right-associative `^`: `2 ^ 3 ^ 2` is `2 ^ (3 ^ 2)`
    fn power(&mut self) -> Result<Expression> {
        let base = self.call()?;
        if self.match_token(Symbol::Pow) {
            let exponent = self.descend(Self::unary)?;
            return Ok(Expression::BinaryOp {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    /// Greedy postfix call and subscript chains over a primary
    fn call(&mut self) -> Result<Expression> {
        let mut expr = self.primary()?;
        loop {
            if self.match_token(Symbol::LeftParen) {
                let args = self.arguments(Symbol::RightParen)?;
                self.consume(Symbol::RightParen)?;
                expr = Expression::FunctionCall {
                    callee: Box::new(expr),
                    args,
                };
            } else if self.match_token(Symbol::LeftBracket) {
                let indices = self.arguments(Symbol::RightBracket)?;
                self.consume(Symbol::RightBracket)?;
                expr = Expression::ArrayIndex {
                    array: Box::new(expr),
                    indices,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma-separated, possibly-empty expression list up to `closer`
    ///
    /// Does not consume the closer.
    fn arguments(&mut self, closer: Symbol) -> Result<Vec<Expression>> {
        let mut args = Vec::new();
        if self.check(closer) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if !self.match_token(Symbol::Comma) {
                return Ok(args);
            }
        }
    }

    fn primary(&mut self) -> Result<Expression> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Symbol(Symbol::LeftParen) => {
                self.advance();
                let expr = self.expression()?;
                self.consume(Symbol::RightParen)?;
                Ok(expr)
            }
            TokenKind::Literal(lit) => {
                self.advance();
                Ok(Expression::Literal(lit))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expression::Identifier(Ident {
                    name,
                    line: token.line,
                    column: token.column,
                }))
            }
            _ => Err(self.unexpected("expression")),
        }
    }
}

/// Parse a complete token stream into a program
pub fn parse_program(tokens: Vec<Token>) -> Result<Program> {
    Parser::new(tokens).parse()
}

/// Parse a token stream as a single expression, rejecting leftovers
pub fn parse_expression(tokens: Vec<Token>) -> Result<Expression> {
    let mut parser = Parser::new(tokens);
    let expr = parser.expression()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parse a token stream as a single statement, rejecting leftovers
pub fn parse_statement(tokens: Vec<Token>) -> Result<Statement> {
    let mut parser = Parser::new(tokens);
    let statement = parser.statement()?;
    parser.expect_end()?;
    Ok(statement)
}

impl Parser {
    /// Demand that nothing but EOF remains
    fn expect_end(&self) -> Result<()> {
        let token = self.peek();
        if matches!(token.kind, TokenKind::Eof) {
            Ok(())
        } else {
            Err(Error::TrailingTokens {
                found: token.kind.to_string(),
                line: token.line,
                column: token.column,
            })
        }
    }
}
