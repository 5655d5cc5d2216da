use loxide::error::LoxError;
use loxide::interpreter::Interpreter;
use loxide::parser::Parser;
use loxide::resolver::Resolver;
use loxide::scanner::scan;
use loxide::value::Value;

/// Run a program end to end with a buffered output sink. Returns
/// everything `print` wrote plus the runtime outcome. Static errors are
/// not expected by callers of this helper.
fn run(source: &str) -> (String, Result<(), LoxError>) {
    let (tokens, lex_errors) = scan(source.as_bytes());
    assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);

    let mut parser = Parser::new(&tokens);
    let statements = parser.parse();
    assert!(parser.errors().is_empty(), "parse errors: {:?}", parser.errors());

    let (locals, resolve_errors) = Resolver::new().resolve(&statements);
    assert!(resolve_errors.is_empty(), "resolve errors: {:?}", resolve_errors);

    let mut interpreter = Interpreter::with_output(Vec::new());
    let result = interpreter.interpret(&statements, locals);
    let output = String::from_utf8(interpreter.output().clone()).expect("utf-8 output");

    (output, result)
}

/// Assert a clean run and return the printed output.
fn run_ok(source: &str) -> String {
    let (output, result) = run(source);
    assert!(result.is_ok(), "unexpected runtime error: {:?}", result);

    output
}

/// Assert the run fails and return (output-so-far, error display).
fn run_err(source: &str) -> (String, String) {
    let (output, result) = run(source);
    let err = result.expect_err("expected a runtime error");

    (output, err.to_string())
}

// ───────────────────────── arithmetic & printing ─────────────────────────

#[test]
fn arithmetic_follows_precedence() {
    assert_eq!(run_ok("print 1 + 2 * 3;"), "7\n");
    assert_eq!(run_ok("print (1 + 2) * 3;"), "9\n");
}

#[test]
fn numbers_print_without_trailing_point_zero() {
    assert_eq!(run_ok("print 4 / 2;"), "2\n");
    assert_eq!(run_ok("print 2.5;"), "2.5\n");
    assert_eq!(run_ok("print -0.5 + 1;"), "0.5\n");
}

#[test]
fn integral_numbers_beyond_i64_print_exactly() {
    assert_eq!(
        run_ok("print 100000000000000000000;"),
        "100000000000000000000\n"
    );
    assert_eq!(
        run_ok("print -100000000000000000000;"),
        "-100000000000000000000\n"
    );
}

#[test]
fn nil_and_booleans_print_their_names() {
    assert_eq!(run_ok("print nil; print true; print false;"), "nil\ntrue\nfalse\n");
}

#[test]
fn string_concatenation() {
    assert_eq!(run_ok(r#"print "foo" + "bar";"#), "foobar\n");
}

#[test]
fn plus_rejects_mixed_operands() {
    let (_, err) = run_err(r#"print 1 + "a";"#);
    assert!(err.contains("Operands must be two numbers or two strings."));
}

#[test]
fn arithmetic_rejects_non_numbers() {
    let (_, err) = run_err(r#"print "a" * 2;"#);
    assert!(err.contains("Operands must be numbers."));

    let (_, err) = run_err(r#"print nil < 1;"#);
    assert!(err.contains("Operands must be numbers."));
}

#[test]
fn unary_minus_requires_a_number() {
    let (_, err) = run_err(r#"print -"a";"#);
    assert!(err.contains("Operand must be a number."));
}

#[test]
fn division_by_zero_is_a_runtime_error_not_infinity() {
    let (output, err) = run_err("print 1 / 0;");

    assert_eq!(output, "");
    assert!(err.contains("Division by zero."));
}

#[test]
fn runtime_error_carries_its_line_marker() {
    let (_, err) = run_err("print 1;\nprint 1 / 0;");
    assert!(err.ends_with("[line 2]"), "got: {}", err);
}

// ───────────────────────── truthiness & equality ─────────────────────────

#[test]
fn zero_and_empty_string_are_truthy() {
    assert_eq!(run_ok(r#"if (0) print "y"; else print "n";"#), "y\n");
    assert_eq!(run_ok(r#"if ("") print "y"; else print "n";"#), "y\n");
    assert_eq!(run_ok("if (nil) print 1; else print 2;"), "2\n");
    assert_eq!(run_ok("print !nil; print !0;"), "true\nfalse\n");
}

#[test]
fn equality_semantics() {
    assert_eq!(run_ok("print nil == nil;"), "true\n");
    assert_eq!(run_ok("print nil == false;"), "false\n");
    assert_eq!(run_ok("print 1 == 1;"), "true\n");
    assert_eq!(run_ok(r#"print "a" == "a";"#), "true\n");
    assert_eq!(run_ok(r#"print 1 == "1";"#), "false\n");
    assert_eq!(run_ok("print 1 != 2;"), "true\n");
}

// ───────────────────────── logical operators ─────────────────────────

#[test]
fn logical_operators_return_operand_values() {
    assert_eq!(run_ok(r#"print "a" or "b";"#), "a\n");
    assert_eq!(run_ok(r#"print nil or "b";"#), "b\n");
    assert_eq!(run_ok(r#"print nil and "b";"#), "nil\n");
    assert_eq!(run_ok(r#"print 1 and 2;"#), "2\n");
}

#[test]
fn logical_operators_short_circuit_the_right_side() {
    // the right-hand calls would blow up if evaluated
    assert_eq!(run_ok("print 1 or missing();"), "1\n");
    assert_eq!(run_ok("print false and missing();"), "false\n");
}

// ───────────────────────── variables & scoping ─────────────────────────

#[test]
fn var_without_initializer_is_nil() {
    assert_eq!(run_ok("var a; print a;"), "nil\n");
}

#[test]
fn shadowing_restores_the_outer_binding_after_the_block() {
    assert_eq!(
        run_ok("var a = 1; { var a = 2; print a; } print a;"),
        "2\n1\n"
    );
}

#[test]
fn inner_blocks_read_and_write_enclosing_locals() {
    assert_eq!(
        run_ok("{ var a = 1; { a = a + 1; print a; } print a; }"),
        "2\n2\n"
    );
}

#[test]
fn undefined_variable_read_fails() {
    let (_, err) = run_err("print ghost;");
    assert!(err.contains("Undefined variable 'ghost'."));
}

#[test]
fn undefined_variable_assignment_fails() {
    let (_, err) = run_err("ghost = 1;");
    assert!(err.contains("Undefined variable 'ghost'."));
}

#[test]
fn global_assignment_stores_evaluated_value() {
    // the fallback path must store the computed value, not re-evaluate
    assert_eq!(run_ok("var g = 1; g = 2 + 3; print g;"), "5\n");

    // and the assignment expression itself yields that value
    assert_eq!(run_ok("var g = 1; print g = 40 + 2;"), "42\n");
}

#[test]
fn globals_bind_late_by_name() {
    // g is defined after f is declared but before f is called
    assert_eq!(run_ok("fun f() { print g; } var g = 1; f();"), "1\n");
}

// ───────────────────────── control flow ─────────────────────────

#[test]
fn while_loop_runs_until_falsey() {
    assert_eq!(
        run_ok("var i = 0; while (i < 3) { print i; i = i + 1; }"),
        "0\n1\n2\n"
    );
}

#[test]
fn for_loop_prints_and_scopes_its_variable() {
    assert_eq!(
        run_ok("for (var i = 0; i < 3; i = i + 1) print i;"),
        "0\n1\n2\n"
    );

    // the loop variable is confined to the desugared block
    let (output, err) = run_err("for (var i = 0; i < 3; i = i + 1) print i;\nprint i;");
    assert_eq!(output, "0\n1\n2\n");
    assert!(err.contains("Undefined variable 'i'."));
}

#[test]
fn if_executes_exactly_one_branch() {
    assert_eq!(run_ok("if (1 < 2) print \"a\"; else print \"b\";"), "a\n");
    assert_eq!(run_ok("if (2 < 1) print \"a\"; else print \"b\";"), "b\n");
}

// ───────────────────────── functions & closures ─────────────────────────

#[test]
fn function_call_returns_its_value() {
    assert_eq!(
        run_ok("fun add(a, b) { return a + b; } print add(1, 2);"),
        "3\n"
    );
}

#[test]
fn function_without_return_yields_nil() {
    assert_eq!(run_ok("fun noop() {} print noop();"), "nil\n");
}

#[test]
fn return_unwinds_out_of_nested_blocks_and_loops() {
    assert_eq!(
        run_ok("fun f() { while (true) { { return 7; } } } print f();"),
        "7\n"
    );
}

#[test]
fn return_restores_scopes_along_the_unwind_path() {
    // after the early return from deep nesting, outer locals still work
    assert_eq!(
        run_ok(
            "var a = 1;\n\
             fun f() { { { return 2; } } }\n\
             print f();\n\
             print a;"
        ),
        "2\n1\n"
    );
}

#[test]
fn recursion_works() {
    assert_eq!(
        run_ok(
            "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }\n\
             print fib(10);"
        ),
        "55\n"
    );
}

#[test]
fn closures_capture_the_defining_environment_by_reference() {
    let source = "\
fun makeCounter() {
  var count = 0;
  fun increment() {
    count = count + 1;
    return count;
  }
  return increment;
}
var a = makeCounter();
var b = makeCounter();
print a();
print a();
print b();
print a();";

    // a's counter keeps climbing; b's is independent
    assert_eq!(run_ok(source), "1\n2\n1\n3\n");
}

#[test]
fn closures_share_a_captured_environment() {
    let source = "\
var get;
var set;
fun main() {
  var state = 0;
  fun getter() { return state; }
  fun setter(v) { state = v; }
  get = getter;
  set = setter;
}
main();
set(9);
print get();";

    // one frame, two closures: writes through one are visible to the other
    assert_eq!(run_ok(source), "9\n");
}

#[test]
fn functions_print_their_names() {
    assert_eq!(run_ok("fun f() {} print f;"), "<fn f>\n");
}

#[test]
fn wrong_arity_fails_before_the_body_runs() {
    let (output, err) = run_err("fun f(a, b) { print \"ran\"; } f(1);");

    assert_eq!(output, "");
    assert!(err.contains("Expected 2 arguments but got 1."));
}

#[test]
fn calling_a_non_callable_fails() {
    let (_, err) = run_err("var x = 1; x();");
    assert!(err.contains("Can only call functions and classes."));
}

#[test]
fn arguments_evaluate_left_to_right() {
    let source = "\
var trace = \"\";
fun tag(label, v) { trace = trace + label; return v; }
fun pair(a, b) { return a + b; }
print pair(tag(\"L\", 1), tag(\"R\", 2));
print trace;";

    assert_eq!(run_ok(source), "3\nLR\n");
}

#[test]
fn callables_compare_by_identity() {
    let source = "\
fun f() {}
fun g() {}
var h = f;
print f == h;
print f == f;
print f == g;";

    // same closure object twice, then two distinct declarations
    assert_eq!(run_ok(source), "true\ntrue\nfalse\n");
}

#[test]
fn deep_recursion_within_the_limit_succeeds() {
    // close to the frame limit; must complete without faulting the
    // host stack whatever the build profile
    let source = "\
fun count(n) {
  if (n == 0) return 0;
  return count(n - 1);
}
print count(1000);";

    assert_eq!(run_ok(source), "0\n");
}

#[test]
fn unbounded_recursion_hits_the_depth_guard() {
    let (_, err) = run_err("fun f() { return f(); } f();");
    assert!(err.contains("Stack overflow."));
}

// ───────────────────────── runtime errors & aborts ─────────────────────────

#[test]
fn first_runtime_error_aborts_but_keeps_prior_output() {
    let (output, err) = run_err("print 1; print 1 / 0; print 2;");

    // no rollback of what already printed, nothing after the error
    assert_eq!(output, "1\n");
    assert!(err.contains("Division by zero."));
}

// ───────────────────────── native functions ─────────────────────────

#[test]
fn host_registered_natives_are_callable() {
    let (tokens, _) = scan(b"print answer();");
    let mut parser = Parser::new(&tokens);
    let statements = parser.parse();
    let (locals, _) = Resolver::new().resolve(&statements);

    let mut interpreter = Interpreter::with_output(Vec::new());
    interpreter.globals().borrow_mut().define(
        "answer",
        Value::NativeFunction {
            name: "answer".to_string(),
            arity: 0,
            func: |_args| Ok(Value::Number(42.0)),
        },
    );

    interpreter
        .interpret(&statements, locals)
        .expect("native call should succeed");

    assert_eq!(
        String::from_utf8(interpreter.output().clone()).unwrap(),
        "42\n"
    );
}

#[test]
fn native_arity_is_enforced() {
    let (tokens, _) = scan(b"answer(1);");
    let mut parser = Parser::new(&tokens);
    let statements = parser.parse();
    let (locals, _) = Resolver::new().resolve(&statements);

    let mut interpreter = Interpreter::with_output(Vec::new());
    interpreter.globals().borrow_mut().define(
        "answer",
        Value::NativeFunction {
            name: "answer".to_string(),
            arity: 0,
            func: |_args| Ok(Value::Number(42.0)),
        },
    );

    let err = interpreter
        .interpret(&statements, locals)
        .expect_err("arity mismatch should fail");

    assert!(err.to_string().contains("Expected 0 arguments but got 1."));
}
