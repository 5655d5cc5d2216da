//! Tree-walking evaluator.
//!
//! Executes a statement sequence against an environment chain, consulting
//! the resolver's [`Locals`] table to choose between exact-depth access
//! for locals and by-name lookup in the globals. The first runtime error
//! unwinds out of [`Interpreter::interpret`] and aborts the remaining
//! statements of that invocation; output already printed stays printed.
//!
//! `return` is control flow, not failure: statement execution yields a
//! [`Control`] outcome, and the function-call boundary is the only place
//! that intercepts `Control::Return`. Keeping it out of the error channel
//! means it can never reach an error reporter, and every
//! statement-executing function is explicit about propagating it.

use std::cell::RefCell;
use std::io::{self, Stdout, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::environment::{self, Environment};
use crate::error::{LoxError, Result};
use crate::resolver::Locals;
use crate::token::{Token, TokenType};
use crate::value::{is_equal, is_truthy, LoxFunction, Value};

/// Maximum number of simultaneously active user-function frames. Lox
/// recursion is bounded explicitly so runaway programs fail with a
/// reportable runtime error instead of exhausting the host stack.
pub const MAX_CALL_DEPTH: usize = 1024;

/// Remaining host stack below which a call grows the stack, and the size
/// of each new segment. A debug-build Lox frame costs far more native
/// stack than a release one, so the depth limit alone cannot keep
/// `MAX_CALL_DEPTH` frames inside an arbitrary host stack.
const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;

/// Outcome of executing one statement: either fall through to the next
/// statement, or unwind to the nearest enclosing function call carrying
/// the return value.
#[derive(Debug)]
pub enum Control<'a> {
    Normal,
    Return(Value<'a>),
}

/// The evaluator. `'a` ties it to the token/AST storage it executes;
/// `W` is the sink `print` writes to (stdout in the binary, a buffer in
/// tests).
pub struct Interpreter<'a, W: Write = Stdout> {
    globals: Rc<RefCell<Environment<'a>>>,
    environment: Rc<RefCell<Environment<'a>>>,
    locals: Locals,
    call_depth: usize,
    out: W,
}

impl<'a> Interpreter<'a, Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl<'a> Default for Interpreter<'a, Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, W: Write> Interpreter<'a, W> {
    /// An interpreter whose `print` statements write to `out`.
    pub fn with_output(out: W) -> Self {
        info!("Initializing interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: Locals::new(),
            call_depth: 0,
            out,
        }
    }

    /// The root environment, for the host to install native bindings into
    /// before running a program.
    pub fn globals(&self) -> Rc<RefCell<Environment<'a>>> {
        Rc::clone(&self.globals)
    }

    /// The output sink (for callers that buffered it).
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Execute a program against the resolver's table. At most one
    /// runtime error per invocation: the first aborts the rest.
    pub fn interpret(&mut self, statements: &'a [Stmt<'a>], locals: Locals) -> Result<()> {
        debug!(
            "Interpreting {} statement(s), {} resolved local(s)",
            statements.len(),
            locals.len()
        );

        self.locals = locals;

        for stmt in statements {
            match self.execute(stmt)? {
                Control::Normal => {}

                // Top-level `return` is rejected by the resolver; if a
                // caller skipped that pass, stop the program here rather
                // than invent a frame to unwind to.
                Control::Return(_) => break,
            }
        }

        info!("Interpretation completed");

        Ok(())
    }

    // ───────────────────────── statements ─────────────────────────

    fn execute(&mut self, stmt: &'a Stmt<'a>) -> Result<Control<'a>> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(Control::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                writeln!(self.out, "{}", value).map_err(LoxError::from)?;

                Ok(Control::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(name.lexeme, value);

                Ok(Control::Normal)
            }

            Stmt::Block(statements) => {
                let child = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                self.execute_block(statements, child)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Control::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    match self.execute(body)? {
                        Control::Normal => {}
                        ret @ Control::Return(_) => return Ok(ret),
                    }
                }

                Ok(Control::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);

                // capture the *defining* environment, not the caller's
                let function = Value::Function(Rc::new(LoxFunction {
                    declaration: decl,
                    closure: Rc::clone(&self.environment),
                }));

                self.environment
                    .borrow_mut()
                    .define(decl.name.lexeme, function);

                Ok(Control::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Control::Return(value))
            }
        }
    }

    /// Run `statements` with `env` as the current environment, restoring
    /// the previous one on every exit path — normal completion, runtime
    /// error, and the `Return` unwind alike.
    fn execute_block(
        &mut self,
        statements: &'a [Stmt<'a>],
        env: Rc<RefCell<Environment<'a>>>,
    ) -> Result<Control<'a>> {
        let previous = std::mem::replace(&mut self.environment, env);

        let mut outcome = Ok(Control::Normal);

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Control::Normal) => {}

                other => {
                    outcome = other;
                    break;
                }
            }
        }

        self.environment = previous;

        outcome
    }

    // ───────────────────────── expressions ────────────────────────

    fn evaluate(&mut self, expr: &'a Expr<'a>) -> Result<Value<'a>> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::Str(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(
                            operator.line,
                            "Operand must be a number.",
                        )),
                    },

                    TokenType::BANG => Ok(Value::Bool(!is_truthy(&right))),

                    _ => unreachable!("parser only emits '!' and '-' as unary operators"),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                // operands evaluate left to right, both before the check
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;

                self.binary_op(&left, operator, &right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                // short-circuit: the operand *value* is the result, not
                // a coerced boolean
                let short_circuits = match operator.token_type {
                    TokenType::OR => is_truthy(&left),
                    _ => !is_truthy(&left), // AND
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(*id) {
                    Some(depth) => {
                        environment::assign_at(
                            &self.environment,
                            depth,
                            name.lexeme,
                            value.clone(),
                        );
                    }

                    // no table entry: the target is (or must be) a global
                    None => {
                        self.globals.borrow_mut().assign(name, value.clone())?;
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut args: Vec<Value<'a>> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                self.invoke(callee, paren, args)
            }
        }
    }

    fn binary_op(
        &self,
        left: &Value<'a>,
        operator: &Token<'_>,
        right: &Value<'a>,
    ) -> Result<Value<'a>> {
        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = self.number_operands(left, operator, right)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = self.number_operands(left, operator, right)?;
                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                let (a, b) = self.number_operands(left, operator, right)?;

                // a distinct error, never IEEE infinity/NaN
                if b == 0.0 {
                    return Err(LoxError::runtime(operator.line, "Division by zero."));
                }

                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = self.number_operands(left, operator, right)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = self.number_operands(left, operator, right)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = self.number_operands(left, operator, right)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = self.number_operands(left, operator, right)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(is_equal(left, right))),

            TokenType::BANG_EQUAL => Ok(Value::Bool(!is_equal(left, right))),

            _ => unreachable!("parser only emits binary operators here"),
        }
    }

    fn number_operands(
        &self,
        left: &Value<'a>,
        operator: &Token<'_>,
        right: &Value<'a>,
    ) -> Result<(f64, f64)> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
            _ => Err(LoxError::runtime(
                operator.line,
                "Operands must be numbers.",
            )),
        }
    }

    /// Resolved references use the exact-depth fast path against the
    /// current environment; everything else is a global, looked up
    /// dynamically by name.
    fn look_up_variable(&self, id: ExprId, name: &'a Token<'a>) -> Result<Value<'a>> {
        match self.locals.get(id) {
            Some(depth) => Ok(environment::get_at(&self.environment, depth, name.lexeme)),
            None => self.globals.borrow().get(name),
        }
    }

    fn invoke(
        &mut self,
        callee: Value<'a>,
        paren: &Token<'_>,
        args: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        match callee {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);

                if args.len() != arity {
                    return Err(LoxError::runtime(
                        paren.line,
                        format!("Expected {} arguments but got {}.", arity, args.len()),
                    ));
                }

                func(&args).map_err(|msg| LoxError::runtime(paren.line, msg))
            }

            Value::Function(fun) => {
                debug!("Calling function '{}'", fun.name());

                // arity is checked before any of the body runs
                if args.len() != fun.arity() {
                    return Err(LoxError::runtime(
                        paren.line,
                        format!("Expected {} arguments but got {}.", fun.arity(), args.len()),
                    ));
                }

                self.call_function(&fun, args, paren.line)
            }

            _ => Err(LoxError::runtime(
                paren.line,
                "Can only call functions and classes.",
            )),
        }
    }

    /// Invoke a user function: fresh frame enclosed by the *captured*
    /// environment, parameters bound to arguments in order, body run as a
    /// block. `Control::Return` stops here and becomes the call's value.
    fn call_function(
        &mut self,
        fun: &LoxFunction<'a>,
        args: Vec<Value<'a>>,
        line: usize,
    ) -> Result<Value<'a>> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(LoxError::runtime(line, "Stack overflow."));
        }

        let frame = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &fun.closure,
        ))));

        for (param, arg) in fun.declaration.params.iter().zip(args) {
            frame.borrow_mut().define(param.lexeme, arg);
        }

        self.call_depth += 1;
        let outcome = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.execute_block(&fun.declaration.body, frame)
        });
        self.call_depth -= 1;

        match outcome? {
            Control::Return(value) => Ok(value),
            Control::Normal => Ok(Value::Nil),
        }
    }
}
