use std::cell::RefCell;
use std::rc::Rc;

use loxide::environment::{assign_at, get_at, Environment};
use loxide::token::{Token, TokenType};
use loxide::value::Value;

fn name(lexeme: &str) -> Token<'_> {
    Token::new(TokenType::IDENTIFIER, lexeme, 1)
}

fn frame<'a>(enclosing: &Rc<RefCell<Environment<'a>>>) -> Rc<RefCell<Environment<'a>>> {
    Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
        enclosing,
    ))))
}

#[test]
fn dynamic_lookup_walks_the_chain_outward() {
    let root = Rc::new(RefCell::new(Environment::new()));
    root.borrow_mut().define("a", Value::Number(1.0));

    let child = frame(&root);
    child.borrow_mut().define("b", Value::Number(2.0));

    // own binding first, then the enclosing frame
    assert!(matches!(
        child.borrow().get(&name("b")),
        Ok(Value::Number(n)) if n == 2.0
    ));
    assert!(matches!(
        child.borrow().get(&name("a")),
        Ok(Value::Number(n)) if n == 1.0
    ));
}

#[test]
fn assign_mutates_but_never_creates_a_binding() {
    let root = Rc::new(RefCell::new(Environment::new()));
    root.borrow_mut().define("a", Value::Number(1.0));

    let child = frame(&root);

    // writes through the child land in the frame that binds the name
    child
        .borrow_mut()
        .assign(&name("a"), Value::Number(5.0))
        .expect("a is bound in the root");
    assert!(matches!(
        root.borrow().get(&name("a")),
        Ok(Value::Number(n)) if n == 5.0
    ));

    let err = child
        .borrow_mut()
        .assign(&name("ghost"), Value::Nil)
        .expect_err("unbound names are not created");
    assert!(err.to_string().contains("Undefined variable 'ghost'."));
}

#[test]
fn exact_depth_access_skips_shadowing_frames() {
    let root = Rc::new(RefCell::new(Environment::new()));
    root.borrow_mut().define("a", Value::Number(1.0));

    let child = frame(&root);
    child.borrow_mut().define("a", Value::Number(2.0));

    // depth selects the frame; the shadow in between is invisible
    assert!(matches!(get_at(&child, 0, "a"), Value::Number(n) if n == 2.0));
    assert!(matches!(get_at(&child, 1, "a"), Value::Number(n) if n == 1.0));

    assign_at(&child, 1, "a", Value::Number(9.0));
    assert!(matches!(get_at(&child, 1, "a"), Value::Number(n) if n == 9.0));
    assert!(matches!(get_at(&child, 0, "a"), Value::Number(n) if n == 2.0));
}

#[test]
#[should_panic(expected = "resolved local missing from its frame")]
fn get_at_panics_when_the_resolved_slot_is_missing() {
    let root = Rc::new(RefCell::new(Environment::new()));

    get_at(&root, 0, "ghost");
}

#[test]
#[should_panic(expected = "resolved local missing from its frame")]
fn assign_at_panics_when_the_resolved_slot_is_missing() {
    let root = Rc::new(RefCell::new(Environment::new()));

    assign_at(&root, 0, "ghost", Value::Nil);
}
