//! Runtime values.
//!
//! The callable variants form the closed set the language needs: a native
//! function is a bare fn pointer with a declared arity, and a user function
//! borrows its AST declaration and holds the environment captured at
//! definition time. That captured reference — not the caller's environment —
//! is what makes closures work.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::environment::Environment;

/// Signature of a host-supplied native function. The `Err` string becomes
/// a runtime error at the call site.
pub type NativeFn<'a> = fn(&[Value<'a>]) -> Result<Value<'a>, String>;

#[derive(Debug, Clone)]
pub enum Value<'a> {
    Number(f64),
    Str(String),
    Bool(bool),
    Nil,

    /// Host-supplied built-in (e.g. `clock`).
    NativeFunction {
        name: String,
        arity: usize,
        func: NativeFn<'a>,
    },

    /// User-defined function with its captured defining environment.
    Function(Rc<LoxFunction<'a>>),
}

/// A closure: the declaration it was created from plus the environment
/// that was current at its definition.
#[derive(Debug)]
pub struct LoxFunction<'a> {
    pub declaration: &'a FunctionDecl<'a>,
    pub closure: Rc<RefCell<Environment<'a>>>,
}

impl<'a> LoxFunction<'a> {
    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    pub fn name(&self) -> &str {
        self.declaration.name.lexeme
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // integral numbers render without the trailing ".0"; `{:.0}`
            // keeps full precision for magnitudes past the i64 range
            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::Str(s) => write!(f, "{}", s),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Nil => write!(f, "nil"),

            Value::NativeFunction { name, .. } => write!(f, "<native fn {}>", name),

            Value::Function(fun) => write!(f, "<fn {}>", fun.name()),
        }
    }
}

/// `nil` and `false` are falsey; every other value, `0` and `""`
/// included, is truthy.
pub fn is_truthy(value: &Value<'_>) -> bool {
    match value {
        Value::Nil => false,
        Value::Bool(b) => *b,
        _ => true,
    }
}

/// Value equality: `nil` equals only `nil`; numbers, strings and booleans
/// compare by value; differently-typed operands are never equal. Callables
/// compare by identity (same native pointer / same closure object).
pub fn is_equal<'a>(left: &Value<'a>, right: &Value<'a>) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) => true,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (
            Value::NativeFunction { func: a, .. },
            Value::NativeFunction { func: b, .. },
        ) => a == b,
        _ => false,
    }
}
