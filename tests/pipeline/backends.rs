//! Backend selection and generated-output sanity for each registered
//! codegen target.

use a7c::pipeline::{run, CompileMode, CompileRequest, ExitCode};

fn request(backend: &str) -> CompileRequest {
    CompileRequest {
        content: "add :: fn(a: i32, b: i32) i32 { ret a + b }".to_string(),
        input_path: "backend_test.a7".to_string(),
        mode: CompileMode::Compile,
        backend: backend.to_string(),
    }
}

#[test]
fn c_backend_emits_a_function_with_the_declared_name() {
    let outcome = run(&request("c"));
    assert!(outcome.ok, "{:?}", outcome.failure_message);
    let code = outcome.generated_code.expect("generated code");
    assert!(code.contains("add"));
}

#[test]
fn zig_backend_emits_a_function_with_the_declared_name() {
    let outcome = run(&request("zig"));
    assert!(outcome.ok, "{:?}", outcome.failure_message);
    let code = outcome.generated_code.expect("generated code");
    assert!(code.contains("add"));
}

#[test]
fn unregistered_backend_name_fails_with_a_codegen_exit_code() {
    let outcome = run(&request("rust"));
    assert!(!outcome.ok);
    assert_eq!(outcome.exit_code, ExitCode::Codegen);
}

#[test]
fn c_and_zig_backends_disagree_on_surface_syntax() {
    let c_code = run(&request("c")).generated_code.expect("c output");
    let zig_code = run(&request("zig")).generated_code.expect("zig output");
    assert_ne!(c_code, zig_code);
}
