//! Semantic validation: control-flow placement rules and exhaustive
//! return checking.

use a7c::pipeline::{run, CompileMode, CompileRequest};

fn check(src: &str) -> a7c::pipeline::CompileOutcome {
    run(&CompileRequest {
        content: src.to_string(),
        input_path: "validate_test.a7".to_string(),
        mode: CompileMode::Semantic,
        backend: "c".to_string(),
    })
}

#[test]
fn break_outside_a_loop_is_rejected() {
    let outcome = check("main :: fn() { break }");
    assert!(!outcome.ok);
}

#[test]
fn break_inside_a_while_loop_is_fine() {
    let outcome = check("main :: fn() { while true { break } }");
    assert!(outcome.ok, "{:?}", outcome.failure_message);
}

#[test]
fn fall_outside_a_match_case_is_rejected() {
    let outcome = check("main :: fn() { fall }");
    assert!(!outcome.ok);
}

#[test]
fn non_void_function_must_return_on_every_path() {
    let outcome = check("get :: fn() i32 { if true { ret 1 } }");
    assert!(!outcome.ok);
}

#[test]
fn non_void_function_returning_on_every_branch_is_fine() {
    let outcome = check("get :: fn() i32 { if true { ret 1 } else { ret 0 } }");
    assert!(outcome.ok, "{:?}", outcome.failure_message);
}

#[test]
fn void_function_returning_a_value_is_rejected() {
    let outcome = check("main :: fn() { ret 1 }");
    assert!(!outcome.ok);
}

#[test]
fn defer_inside_a_function_body_is_fine() {
    let outcome = check(r#"main :: fn() { defer io.println("bye") }"#);
    assert!(outcome.ok, "{:?}", outcome.failure_message);
}
