//! Type checking: assignment compatibility, operand typing, and the
//! two-phase signature-then-body ordering that lets forward references
//! type-check correctly.

use a7c::pipeline::{run, CompileMode, CompileRequest};

fn check(src: &str) -> a7c::pipeline::CompileOutcome {
    run(&CompileRequest {
        content: src.to_string(),
        input_path: "typeck_test.a7".to_string(),
        mode: CompileMode::Semantic,
        backend: "c".to_string(),
    })
}

#[test]
fn well_typed_arithmetic_passes() {
    let outcome = check("main :: fn() { x := 1 + 2 }");
    assert!(outcome.ok, "{:?}", outcome.failure_message);
}

#[test]
fn mismatched_binary_operand_types_are_rejected() {
    let outcome = check(r#"main :: fn() { x := 1 + "two" }"#);
    assert!(!outcome.ok);
    assert!(outcome.diagnostics.iter().any(|d| d.message.contains("Binary operands must be the same numeric type")));
}

#[test]
fn assigning_a_string_to_an_i32_variable_is_rejected() {
    let outcome = check(r#"main :: fn() { x: i32 = 1\nx = "hi" }"#.replace("\\n", "\n").as_str());
    assert!(!outcome.ok);
}

#[test]
fn calling_with_the_wrong_argument_count_is_rejected() {
    let outcome = check("add :: fn(a: i32, b: i32) i32 { ret a + b }\nmain :: fn() { add(1) }");
    assert!(!outcome.ok);
    assert!(outcome.diagnostics.iter().any(|d| d.message.contains("Expected 2 argument(s), got 1")));
}

#[test]
fn a_function_that_returns_the_wrong_type_is_rejected() {
    let outcome = check(r#"get :: fn() i32 { ret "not a number" }"#);
    assert!(!outcome.ok);
}

#[test]
fn forward_reference_between_top_level_functions_type_checks() {
    let outcome = check("caller :: fn() i32 { ret helper() }\nhelper :: fn() i32 { ret 1 }");
    assert!(outcome.ok, "{:?}", outcome.failure_message);
}

#[test]
fn struct_field_type_mismatch_is_rejected() {
    let outcome = check(r#"Point :: struct { x: i32 }
main :: fn() { p := Point{ x: "nope" } }"#);
    assert!(!outcome.ok);
}
