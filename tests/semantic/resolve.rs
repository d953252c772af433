//! Name resolution: forward references, duplicate declarations, and
//! shadowing across scopes.

use a7c::pipeline::{run, CompileMode, CompileRequest};

fn check(src: &str) -> a7c::pipeline::CompileOutcome {
    run(&CompileRequest {
        content: src.to_string(),
        input_path: "resolve_test.a7".to_string(),
        mode: CompileMode::Semantic,
        backend: "c".to_string(),
    })
}

#[test]
fn forward_reference_to_a_later_function_resolves() {
    let outcome = check("caller :: fn() { helper() }\nhelper :: fn() {}");
    assert!(outcome.ok, "{:?}", outcome.failure_message);
}

#[test]
fn reference_to_an_undefined_name_is_reported() {
    let outcome = check("main :: fn() { missing() }");
    assert!(!outcome.ok);
}

#[test]
fn duplicate_top_level_declaration_is_reported() {
    let outcome = check("x :: 1\nx :: 2");
    assert!(!outcome.ok);
}

#[test]
fn shadowing_in_a_nested_block_is_not_a_duplicate() {
    let outcome = check("main :: fn() { x := 1\n{ x := 2 } }");
    assert!(outcome.ok, "{:?}", outcome.failure_message);
}

#[test]
fn for_in_binds_the_iterator_name_in_its_body() {
    let outcome = check("main :: fn() { items := [1, 2, 3]\nfor item in items { } }");
    assert!(outcome.ok, "{:?}", outcome.failure_message);
}
