//! Static scope resolution.
//!
//! One AST walk that mirrors the evaluator's scope discipline exactly
//! (blocks and function bodies open and close scopes) and does three
//! things:
//!
//! 1. Computes, for every local variable reference, the number of
//!    lexical scopes between the reference and its declaration — the
//!    "hop count" the evaluator uses for exact-depth environment access.
//! 2. Leaves global references out of the table entirely: globals stay
//!    dynamically looked up by name at runtime, which is what lets a
//!    function mention a global declared after it.
//! 3. Reports static scoping errors (reading a local inside its own
//!    initializer, redeclaring a name in the same block, `return`
//!    outside a function) without aborting the walk.
//!
//! The resolver never touches a runtime [`crate::environment::Environment`];
//! it simulates scoping with its own stack of name→state maps. Its output
//! is keyed by [`ExprId`] — node identity, not structural equality — so two
//! occurrences of `x` always get independent entries.

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::error::LoxError;
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;

/// Resolution table: node identity → scope hop count. Only references
/// that resolve to a non-global scope have entries; a lookup miss means
/// "global, resolve by name at runtime".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locals {
    depths: HashMap<ExprId, usize>,
}

impl Locals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ExprId) -> Option<usize> {
        self.depths.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    fn insert(&mut self, id: ExprId, depth: usize) {
        self.depths.insert(id, depth);
    }
}

/// Declaration state of a name inside one scope frame. Two-phase so that
/// `var a = a;` can be caught: the name exists (Declared) while its
/// initializer resolves, and only becomes readable (Defined) afterwards.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum VarState {
    Declared,
    Defined,
}

/// Are we inside a user function? Gates the `return` placement check.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
}

pub struct Resolver<'a> {
    scopes: Vec<HashMap<&'a str, VarState>>,
    current_function: FunctionType,
    locals: Locals,
    errors: Vec<LoxError>,
}

impl<'a> Resolver<'a> {
    pub fn new() -> Self {
        info!("Resolver instantiated");

        Resolver {
            scopes: Vec::new(),
            current_function: FunctionType::None,
            locals: Locals::new(),
            errors: Vec::new(),
        }
    }

    /// Walk all top-level statements and return the resolution table plus
    /// any static errors found along the way. The table is complete even
    /// when errors were reported; the caller decides whether to run.
    pub fn resolve(mut self, statements: &[Stmt<'a>]) -> (Locals, Vec<LoxError>) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        (self.locals, self.errors)
    }

    // ───────────────────────── statements ─────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt<'a>) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                self.end_scope();
            }

            // declare → resolve initializer → define, in that order, so
            // the initializer sees the name as not-yet-readable
            Stmt::Var { name, initializer } => {
                self.declare(name);

                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                self.define(name);
            }

            // the function's own name is declared+defined before its body
            // resolves, so recursion works
            Stmt::Function(decl) => {
                self.declare(decl.name);
                self.define(decl.name);

                self.resolve_function(decl);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.report(LoxError::resolve(
                        keyword.line,
                        "Can't return from top-level code.",
                    ));
                }

                if let Some(expr) = value {
                    self.resolve_expr(expr);
                }
            }
        }
    }

    // ───────────────────────── expressions ────────────────────────

    fn resolve_expr(&mut self, expr: &Expr<'a>) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(name.lexeme) == Some(&VarState::Declared) {
                        self.report(LoxError::resolve(
                            name.line,
                            "Can't read local variable in its own initializer.",
                        ));
                    }
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // RHS first, then the target binding
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }
        }
    }

    /// Fresh scope for a function's parameters + body, with the current
    /// function kind swapped for the duration.
    fn resolve_function(&mut self, decl: &FunctionDecl<'a>) {
        let enclosing = self.current_function;
        self.current_function = FunctionType::Function;

        self.begin_scope();

        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }

        for stmt in &decl.body {
            self.resolve_stmt(stmt);
        }

        self.end_scope();

        self.current_function = enclosing;
    }

    // ───────────────────────── scope management ───────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Mark the name present-but-unreadable in the innermost scope. At
    /// global depth (no scope frames) this is a no-op: globals are not
    /// tracked statically.
    fn declare(&mut self, name: &Token<'a>) {
        let redeclared = match self.scopes.last() {
            Some(scope) => scope.contains_key(name.lexeme),
            None => return,
        };

        if redeclared {
            self.report(LoxError::resolve(
                name.line,
                "Already a variable with this name in this scope.",
            ));
        }

        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme, VarState::Declared);
        }
    }

    fn define(&mut self, name: &Token<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme, VarState::Defined);
        }
    }

    /// Record this reference as a local at the number of frames crossed
    /// before the declaring scope, innermost first. Not found in any
    /// frame ⇒ no entry: the evaluator falls back to the globals.
    fn resolve_local(&mut self, id: ExprId, name: &Token<'a>) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                self.locals.insert(id, depth);

                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }

    fn report(&mut self, error: LoxError) {
        self.errors.push(error);
    }
}

impl Default for Resolver<'_> {
    fn default() -> Self {
        Self::new()
    }
}
