//! The JSON-facing report (`CompileOutcome::to_report`) and the
//! diagnostic rendering contract it carries for failed compiles.

use a7c::pipeline::{run, CompileMode, CompileRequest};

fn request(content: &str, mode: CompileMode) -> CompileRequest {
    CompileRequest {
        content: content.to_string(),
        input_path: "report_test.a7".to_string(),
        mode,
        backend: "c".to_string(),
    }
}

#[test]
fn successful_compile_reports_schema_version_and_ok_status() {
    let outcome = run(&request("main :: fn() { ret }", CompileMode::Compile));
    assert!(outcome.ok, "{:?}", outcome.failure_message);
    let report = outcome.to_report(&[]);
    assert_eq!(report.schema_version, "2.0");
    assert_eq!(report.status, "ok");
    assert!(report.error.is_none());
    assert!(report.stages.contains_key("codegen"));
}

#[test]
fn failed_compile_reports_an_error_with_a_rendered_detail() {
    let source = "main :: fn() { ret unknown_name }";
    let lines: Vec<String> = source.lines().map(|s| s.to_string()).collect();
    let outcome = run(&request(source, CompileMode::Semantic));
    assert!(!outcome.ok);
    let report = outcome.to_report(&lines);
    assert_eq!(report.status, "error");
    let error = report.error.expect("error report present");
    assert!(!error.details.is_empty());
    assert!(error.details[0].starts_with("error: "));
    assert!(error.details[0].contains("[line"));
}

#[test]
fn diagnostic_rendering_points_at_the_offending_line_and_column() {
    let source = "main :: fn() { ret unknown_name }";
    let outcome = run(&request(source, CompileMode::Semantic));
    assert!(!outcome.ok);
    let diagnostic = &outcome.diagnostics[0];
    let rendered = diagnostic.render(&[source.to_string()]);
    assert!(rendered.contains("error: "));
    assert!(rendered.contains(&format!("line {}", diagnostic.span.start_line)));
}
