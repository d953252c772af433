//! Markdown documentation report, written by the driver's `--doc-out`
//! flag. Summarizes one compilation: source stats, the stage table,
//! every module-level declaration, and (on failure) the diagnostics that
//! stopped the pipeline — the same information the reference
//! implementation's console formatter prints to a terminal, rendered as
//! a file a reviewer can read without running the compiler again.

use crate::ast::{Ast, NodeKind};
use crate::diagnostics::render_all;
use crate::pipeline::{CompileOutcome, CompileRequest};

pub fn render(request: &CompileRequest, outcome: &CompileOutcome, source_lines: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Compilation report: {}\n\n", request.input_path));
    out.push_str(&format!("- Mode: `{}`\n", outcome.mode.as_str()));
    out.push_str(&format!("- Backend: `{}`\n", outcome.backend));
    out.push_str(&format!("- Status: {}\n", if outcome.ok { "success" } else { "failed" }));
    out.push_str(&format!("- Timing: {} ms\n\n", outcome.timing_ms));

    out.push_str("## Stages\n\n");
    out.push_str("| Stage | Status | Detail |\n");
    out.push_str("|---|---|---|\n");
    for (name, stage) in &outcome.stages {
        out.push_str(&format!("| {name} | {} | {} |\n", if stage.ok { "ok" } else { "failed" }, stage.detail));
    }
    out.push('\n');

    if let Some(ast) = &outcome.ast {
        out.push_str("## Module declarations\n\n");
        render_declarations(ast, &mut out);
        out.push('\n');
    }

    if !outcome.ok {
        out.push_str("## Diagnostics\n\n");
        if outcome.diagnostics.is_empty() {
            if let Some(message) = &outcome.failure_message {
                out.push_str(&format!("{message}\n"));
            }
        } else {
            out.push_str("```\n");
            out.push_str(&render_all(&outcome.diagnostics, source_lines));
            out.push_str("\n```\n");
        }
    }

    out
}

fn render_declarations(ast: &Ast, out: &mut String) {
    let NodeKind::Program { declarations } = ast.kind(ast.root) else {
        return;
    };
    if declarations.is_empty() {
        out.push_str("_none_\n");
        return;
    }
    for decl in declarations {
        let line = match ast.kind(*decl) {
            NodeKind::Function { name, params, .. } => {
                let name = name.clone().unwrap_or_else(|| "<anonymous>".to_string());
                format!("- `fn {name}` ({} param(s))", params.len())
            }
            NodeKind::Struct { name, fields, .. } => format!("- `struct {name}` ({} field(s))", fields.len()),
            NodeKind::Enum { name, variants } => format!("- `enum {name}` ({} variant(s))", variants.len()),
            NodeKind::Union { name, fields, .. } => format!("- `union {name}` ({} field(s))", fields.len()),
            NodeKind::Const { name, .. } => format!("- `const {name}`"),
            NodeKind::Import { path, alias } => match alias {
                Some(alias) => format!("- `import {path} as {alias}`"),
                None => format!("- `import {path}`"),
            },
            other => format!("- _unexpected top-level node_ `{}`", other.tag()),
        };
        out.push_str(&line);
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{run, CompileMode};

    fn request(content: &str, mode: CompileMode) -> CompileRequest {
        CompileRequest {
            content: content.to_string(),
            input_path: "doc_test.a7".to_string(),
            mode,
            backend: "c".to_string(),
        }
    }

    #[test]
    fn successful_compile_lists_declarations() {
        let req = request("add :: fn(a: i32, b: i32) i32 { ret a + b }", CompileMode::Ast);
        let outcome = run(&req);
        let report = render(&req, &outcome, &[]);
        assert!(report.contains("fn add"));
        assert!(report.contains("Status: success"));
    }

    #[test]
    fn failed_compile_includes_diagnostics_section() {
        let req = request("x := `", CompileMode::Pipeline);
        let outcome = run(&req);
        let report = render(&req, &outcome, &req.content.lines().map(|s| s.to_string()).collect::<Vec<_>>());
        assert!(report.contains("Status: failed"));
        assert!(report.contains("## Diagnostics"));
    }
}
