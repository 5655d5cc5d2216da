//! Runtime scope chain.
//!
//! An [`Environment`] is a mutable name→value map plus an optional link to
//! the enclosing environment. Frames are shared, not copied: every closure
//! and call frame that captured an environment holds an
//! `Rc<RefCell<Environment>>` to the same frame, which is what gives
//! closures live access to their defining scope. A frame dies when the
//! last closure or call frame referencing it drops.
//!
//! Two access paths exist. `get`/`assign` search this frame then each
//! enclosing frame outward — the dynamic path used for globals. `get_at`/
//! `assign_at` jump exactly `depth` links and touch only that frame's own
//! bindings, never searching further: the resolver has already proven the
//! name lives there, so a miss on this path is a resolver defect and
//! panics instead of surfacing as a user error.

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Environment<'a> {
    values: HashMap<String, Value<'a>>,
    enclosing: Option<Rc<RefCell<Environment<'a>>>>,
}

impl<'a> Environment<'a> {
    /// A root (global) environment with no enclosing frame.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// A child frame of `enclosing`, created on block entry and per call.
    pub fn with_enclosing(enclosing: Rc<RefCell<Environment<'a>>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in *this* frame, shadowing any outer binding. Always
    /// succeeds; re-defining in the same frame overwrites.
    pub fn define(&mut self, name: &str, value: Value<'a>) {
        self.values.insert(name.to_string(), value);
    }

    /// Dynamic lookup: this frame, then outward. Fails with "Undefined
    /// variable" if no frame binds the name.
    pub fn get(&self, name: &Token<'_>) -> Result<Value<'a>> {
        if let Some(value) = self.values.get(name.lexeme) {
            return Ok(value.clone());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get(name),
            None => Err(LoxError::runtime(
                name.line,
                format!("Undefined variable '{}'.", name.lexeme),
            )),
        }
    }

    /// Dynamic assignment: mutate the first binding found walking
    /// outward. Unlike `define`, never creates a binding.
    pub fn assign(&mut self, name: &Token<'_>, value: Value<'a>) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name.lexeme) {
            *slot = value;

            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value),
            None => Err(LoxError::runtime(
                name.line,
                format!("Undefined variable '{}'.", name.lexeme),
            )),
        }
    }
}

/// Read a binding at exactly `depth` hops from `env`; no outward search
/// beyond that frame.
pub fn get_at<'a>(env: &Rc<RefCell<Environment<'a>>>, depth: usize, name: &str) -> Value<'a> {
    ancestor(env, depth)
        .borrow()
        .values
        .get(name)
        .cloned()
        .expect("resolved local missing from its frame")
}

/// Overwrite a binding at exactly `depth` hops from `env`.
pub fn assign_at<'a>(
    env: &Rc<RefCell<Environment<'a>>>,
    depth: usize,
    name: &str,
    value: Value<'a>,
) {
    let frame = ancestor(env, depth);
    let mut frame = frame.borrow_mut();

    let slot = frame
        .values
        .get_mut(name)
        .expect("resolved local missing from its frame");

    *slot = value;
}

/// The frame exactly `depth` enclosing links away. The resolver mirrors
/// the evaluator's scope discipline, so the chain is always long enough.
fn ancestor<'a>(
    env: &Rc<RefCell<Environment<'a>>>,
    depth: usize,
) -> Rc<RefCell<Environment<'a>>> {
    let mut frame = Rc::clone(env);

    for _ in 0..depth {
        let next = frame
            .borrow()
            .enclosing
            .as_ref()
            .expect("environment chain shorter than resolved depth")
            .clone();

        frame = next;
    }

    frame
}
