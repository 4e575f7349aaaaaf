//! End-to-end behaviour tests: run real source text through the full
//! scan → parse → resolve → interpret pipeline and check observable output.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use rslox::error::LoxError;
use rslox::interpreter::Interpreter;
use rslox::parser::Parser;
use rslox::resolver::Resolver;
use rslox::scanner::Scanner;

/// A `Write` sink the test keeps a handle to after moving it into the
/// interpreter.
#[derive(Clone, Default)]
struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run a program, returning whatever it printed plus the final outcome.
fn run(source: &str) -> (String, Result<(), LoxError>) {
    let (tokens, lex_errors) = Scanner::scan_all(source);
    assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);

    let statements = Parser::new(tokens).parse().expect("program should parse");
    let locals = Resolver::new()
        .resolve(&statements)
        .expect("program should resolve");

    let sink = SharedOutput::default();
    let mut interpreter = Interpreter::with_output(Box::new(sink.clone()));
    let result = interpreter.interpret(&statements, locals);

    let printed = String::from_utf8(sink.0.borrow().clone()).expect("output is UTF-8");
    (printed, result)
}

fn run_ok(source: &str) -> String {
    let (printed, result) = run(source);
    result.expect("program should run without a runtime error");
    printed
}

fn run_err(source: &str) -> (String, LoxError) {
    let (printed, result) = run(source);
    (printed, result.expect_err("program should hit a runtime error"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Expressions and printing
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn prints_simple_arithmetic() {
    assert_eq!(run_ok("print 1 + 2;"), "3\n");
}

#[test]
fn string_concatenation() {
    assert_eq!(run_ok("print \"foo\" + \"bar\";"), "foobar\n");
}

#[test]
fn integral_results_drop_the_fraction() {
    assert_eq!(run_ok("print 6 / 2;"), "3\n");
    assert_eq!(run_ok("print 1 / 4;"), "0.25\n");
}

#[test]
fn division_by_zero_follows_ieee754() {
    assert_eq!(run_ok("print 1 / 0;"), "inf\n");
}

#[test]
fn truthiness_and_equality_matrix() {
    let out = run_ok(
        "print !nil;\n\
         print !0;\n\
         print !\"\";\n\
         print nil == nil;\n\
         print 1 == \"1\";",
    );
    assert_eq!(out, "true\nfalse\nfalse\ntrue\nfalse\n");
}

#[test]
fn logical_operators_return_the_deciding_operand() {
    let out = run_ok(
        "print \"hi\" or 2;\n\
         print nil or \"yes\";\n\
         print nil and 1;\n\
         print 1 and 2;",
    );
    assert_eq!(out, "hi\nyes\nnil\n2\n");
}

#[test]
fn logical_operators_short_circuit_side_effects() {
    // The right operand must not run when the left decides the result.
    let out = run_ok(
        "fun boom() { print \"evaluated\"; return true; }\n\
         var a = true or boom();\n\
         var b = false and boom();\n\
         print a; print b;",
    );
    assert_eq!(out, "true\nfalse\n");
}

// ─────────────────────────────────────────────────────────────────────────────
// Scoping and closures
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn block_shadowing_is_scoped_to_the_block() {
    let out = run_ok("var a = \"a\"; { var a = \"b\"; print a; } print a;");
    assert_eq!(out, "b\na\n");
}

#[test]
fn inner_reference_binds_to_nearest_enclosing_declaration() {
    let out = run_ok(
        "var x = \"outer\";\n\
         {\n\
           fun show() { print x; }\n\
           show();\n\
           var x = \"inner\";\n\
           show();\n\
         }",
    );
    // `show` resolved `x` to the outer binding once; the later shadowing
    // declaration must not re-bind it.
    assert_eq!(out, "outer\nouter\n");
}

#[test]
fn closures_capture_the_scope_not_a_snapshot() {
    let out = run_ok(
        "fun makeCounter() {\n\
           var i = 0;\n\
           fun count() { i = i + 1; print i; }\n\
           return count;\n\
         }\n\
         var counter = makeCounter();\n\
         counter();\n\
         counter();",
    );
    assert_eq!(out, "1\n2\n");
}

#[test]
fn each_iteration_scope_is_a_fresh_binding() {
    let out = run_ok(
        "var f1; var f2;\n\
         { var i = 1; fun f() { print i; } f1 = f; }\n\
         { var i = 2; fun f() { print i; } f2 = f; }\n\
         f1();\n\
         f2();",
    );
    assert_eq!(out, "1\n2\n");
}

#[test]
fn forward_reference_between_top_level_functions() {
    let out = run_ok(
        "fun callLater() { return later(); }\n\
         fun later() { return 42; }\n\
         print callLater();",
    );
    assert_eq!(out, "42\n");
}

#[test]
fn recursive_fibonacci() {
    let out = run_ok(
        "fun fib(n) {\n\
           if (n < 2) return n;\n\
           return fib(n - 1) + fib(n - 2);\n\
         }\n\
         print fib(10);",
    );
    assert_eq!(out, "55\n");
}

#[test]
fn for_loop_desugars_and_runs() {
    let out = run_ok("var s = 0; for (var i = 1; i <= 10; i = i + 1) s = s + i; print s;");
    assert_eq!(out, "55\n");
}

#[test]
fn return_unwinds_exactly_one_function_activation() {
    let out = run_ok(
        "fun outer() {\n\
           fun inner() { return \"inner\"; }\n\
           inner();\n\
           return \"outer\";\n\
         }\n\
         print outer();",
    );
    assert_eq!(out, "outer\n");
}

#[test]
fn assignment_is_an_expression_yielding_the_value() {
    assert_eq!(run_ok("var a = 1; print a = 2; print a;"), "2\n2\n");
}

// ─────────────────────────────────────────────────────────────────────────────
// Classes
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn fields_and_bound_methods() {
    let out = run_ok(
        "class Cake {\n\
           taste() { return \"The \" + this.flavor + \" cake is delicious!\"; }\n\
         }\n\
         var cake = Cake();\n\
         cake.flavor = \"chocolate\";\n\
         print cake.taste();",
    );
    assert_eq!(out, "The chocolate cake is delicious!\n");
}

#[test]
fn methods_stay_bound_when_detached() {
    let out = run_ok(
        "class Person { sayName() { print this.name; } }\n\
         var jane = Person();\n\
         jane.name = \"Jane\";\n\
         var method = jane.sayName;\n\
         method();",
    );
    assert_eq!(out, "Jane\n");
}

#[test]
fn constructor_stores_arguments_and_yields_the_instance() {
    let out = run_ok(
        "class C { init(x) { this.x = x; } }\n\
         print C(1).x;",
    );
    assert_eq!(out, "1\n");
}

#[test]
fn bare_return_in_init_still_yields_the_instance() {
    let out = run_ok(
        "class C {\n\
           init(x) {\n\
             this.x = x;\n\
             return;\n\
             this.x = 999;\n\
           }\n\
         }\n\
         print C(1).x;",
    );
    assert_eq!(out, "1\n");
}

#[test]
fn calling_init_directly_returns_this() {
    let out = run_ok(
        "class C { init() { this.x = 1; } }\n\
         var c = C();\n\
         print c.init() == c;",
    );
    assert_eq!(out, "true\n");
}

#[test]
fn inherited_methods_dispatch_dynamically() {
    let out = run_ok(
        "class A { f() { return \"A\"; } g() { return \"g\"; } }\n\
         class B < A { f() { return \"B\"; } }\n\
         print B().f();\n\
         print B().g();",
    );
    assert_eq!(out, "B\ng\n");
}

#[test]
fn super_calls_the_immediate_superclass_version() {
    let out = run_ok(
        "class A { f() { return 1; } }\n\
         class B < A { f() { return super.f() + 1; } }\n\
         print B().f();",
    );
    assert_eq!(out, "2\n");
}

#[test]
fn super_ignores_further_overriding_below_it() {
    let out = run_ok(
        "class A { method() { print \"A method\"; } }\n\
         class B < A {\n\
           method() { print \"B method\"; }\n\
           test() { super.method(); }\n\
         }\n\
         class C < B {}\n\
         C().test();",
    );
    assert_eq!(out, "A method\n");
}

#[test]
fn class_arity_comes_from_init() {
    let (_, err) = run_err("class C { init(a, b) {} } C(1);");
    assert!(err
        .to_string()
        .contains("Expected 2 arguments but got 1."));
}

#[test]
fn instances_print_their_class_name() {
    let out = run_ok("class Foo {} print Foo; print Foo();");
    assert_eq!(out, "Foo\nFoo instance\n");
}

// ─────────────────────────────────────────────────────────────────────────────
// Runtime errors
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn arity_mismatch_names_expected_and_actual() {
    let (_, err) = run_err("fun f(a, b) {} f(1);");
    assert!(err.to_string().contains("Expected 2 arguments but got 1."));
}

#[test]
fn undefined_variable_reports_its_source_position() {
    let (_, err) = run_err("var a = 1;\n  missing;");
    match err {
        LoxError::Runtime { line, col, message } => {
            assert_eq!((line, col), (2, 3));
            assert!(message.contains("Undefined variable 'missing'."));
        }
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

#[test]
fn runtime_error_aborts_the_remaining_statements() {
    let (printed, err) = run_err("print 1; missing; print 2;");
    assert_eq!(printed, "1\n");
    assert!(err.to_string().contains("Undefined variable"));
}

#[test]
fn arithmetic_requires_numbers() {
    let (_, err) = run_err("print 1 + \"a\";");
    assert!(err
        .to_string()
        .contains("Operands must be two numbers or two strings."));

    let (_, err) = run_err("print -\"a\";");
    assert!(err.to_string().contains("Operand must be a number."));

    let (_, err) = run_err("print 1 < \"a\";");
    assert!(err.to_string().contains("Operands must be numbers."));
}

#[test]
fn only_callables_can_be_called() {
    let (_, err) = run_err("\"not a fn\"();");
    assert!(err
        .to_string()
        .contains("Can only call functions and classes."));
}

#[test]
fn property_access_requires_an_instance() {
    let (_, err) = run_err("var a = 1; print a.b;");
    assert!(err.to_string().contains("Only instances have properties."));

    let (_, err) = run_err("var a = 1; a.b = 2;");
    assert!(err.to_string().contains("Only instances have fields."));
}

#[test]
fn undefined_property_is_a_runtime_error() {
    let (_, err) = run_err("class Foo {} print Foo().bar;");
    assert!(err.to_string().contains("Undefined property 'bar'."));
}

#[test]
fn superclass_must_be_a_class() {
    let (_, err) = run_err("var NotAClass = \"so not\"; class Sub < NotAClass {}");
    assert!(err.to_string().contains("Superclass must be a class."));
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline properties
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn resolving_the_same_tree_twice_is_idempotent() {
    let source = "var a = 1;\n\
                  fun f(x) { { var y = x; return y + a; } }\n\
                  print f(2);";

    let (tokens, errors) = Scanner::scan_all(source);
    assert!(errors.is_empty());
    let statements = Parser::new(tokens).parse().expect("parses");

    let first = Resolver::new().resolve(&statements).expect("resolves");
    let second = Resolver::new().resolve(&statements).expect("resolves");
    assert_eq!(first, second);

    let run_with = |locals: std::collections::HashMap<usize, usize>| {
        let sink = SharedOutput::default();
        let mut interpreter = Interpreter::with_output(Box::new(sink.clone()));
        interpreter.interpret(&statements, locals).expect("runs");
        let out = String::from_utf8(sink.0.borrow().clone()).unwrap();
        out
    };

    assert_eq!(run_with(first), run_with(second));
}

#[test]
fn clock_is_predefined_and_returns_a_number() {
    // clock() is a number of seconds; comparing it against itself
    // exercises the native-call plumbing without flakiness.
    let out = run_ok("var t = clock(); print t >= 0; print t == t;");
    assert_eq!(out, "true\ntrue\n");
}
