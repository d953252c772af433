//! Pipeline orchestration: pure functions that run source text through
//! tokenize → parse → name resolution → type checking → validation →
//! preprocess → codegen, stopping at whichever stage a caller asked for
//! and short-circuiting at the first stage that fails.
//!
//! This module does no I/O — it takes source text already read into
//! memory and returns a structured [`CompileOutcome`]; reading the input
//! file, writing `output_path`/`doc_path`, and mapping the result onto a
//! process exit code are the driver binary's job.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;

use crate::ast::Ast;
use crate::backend::get_backend;
use crate::diagnostics::Diagnostic;
use crate::error::SemanticError;
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::preprocess::{preprocess, PreprocessReport};
use crate::resolve::resolve_names;
use crate::stdlib::{default_registry, StdlibRegistry};
use crate::symbol::SymbolTable;
use crate::token::{Token, TokenKind};
use crate::typeck::{check_types, TypeMap};
use crate::validate::validate;

/// How far through the pipeline a request should run, mirroring the
/// driver's `--stage` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileMode {
    /// Stop after tokenizing.
    Tokens,
    /// Stop after parsing.
    Ast,
    /// Stop after the three semantic passes.
    Semantic,
    /// Run preprocess + codegen but don't write an output file.
    Pipeline,
    /// Full pipeline, writing `output_path`.
    Compile,
    /// Full pipeline plus a Markdown documentation report.
    Doc,
}

impl std::str::FromStr for CompileMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tokens" => Ok(CompileMode::Tokens),
            "ast" => Ok(CompileMode::Ast),
            "semantic" => Ok(CompileMode::Semantic),
            "pipeline" => Ok(CompileMode::Pipeline),
            "compile" => Ok(CompileMode::Compile),
            "doc" => Ok(CompileMode::Doc),
            other => Err(format!("unknown stage: {other}")),
        }
    }
}

impl CompileMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CompileMode::Tokens => "tokens",
            CompileMode::Ast => "ast",
            CompileMode::Semantic => "semantic",
            CompileMode::Pipeline => "pipeline",
            CompileMode::Compile => "compile",
            CompileMode::Doc => "doc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown format: {other}")),
        }
    }
}

/// Maps onto the driver's process exit status. `Success` is `0`; every
/// failure category gets its own code so a caller scripting the driver
/// can tell a parse error from a codegen error without scraping stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Usage = 2,
    Io = 3,
    Tokenize = 4,
    Parse = 5,
    Semantic = 6,
    Codegen = 7,
    Internal = 8,
}

/// A single request into the pipeline. `content` is the already-read
/// source text; `input_path` is carried through for diagnostics and the
/// JSON report's `input` field, not opened by this module.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    pub content: String,
    pub input_path: String,
    pub mode: CompileMode,
    pub backend: String,
}

impl Default for CompileRequest {
    fn default() -> Self {
        CompileRequest {
            content: String::new(),
            input_path: "<memory>".to_string(),
            mode: CompileMode::Compile,
            backend: "c".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub ok: bool,
    pub detail: String,
}

/// What the pipeline produced, independent of presentation — the driver
/// binary turns this into a JSON payload, a human-readable summary, or a
/// process exit code as its `--format`/use site demands.
#[derive(Debug, Clone)]
pub struct CompileOutcome {
    pub ok: bool,
    pub exit_code: ExitCode,
    pub mode: CompileMode,
    pub input_path: String,
    pub backend: String,
    pub timing_ms: u128,
    pub stages: Vec<(&'static str, StageReport)>,
    pub tokens: Option<Vec<Token>>,
    pub ast: Option<Ast>,
    pub symbol_table: Option<SymbolTable>,
    pub type_map: Option<TypeMap>,
    pub preprocess_report: Option<PreprocessReport>,
    pub generated_code: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub failure_message: Option<String>,
}

impl CompileOutcome {
    fn new(request: &CompileRequest) -> Self {
        CompileOutcome {
            ok: false,
            exit_code: ExitCode::Internal,
            mode: request.mode,
            input_path: request.input_path.clone(),
            backend: request.backend.clone(),
            timing_ms: 0,
            stages: Vec::new(),
            tokens: None,
            ast: None,
            symbol_table: None,
            type_map: None,
            preprocess_report: None,
            generated_code: None,
            diagnostics: Vec::new(),
            failure_message: None,
        }
    }

    /// The JSON schema v2.0 report payload the `--format json` driver
    /// path serializes directly.
    pub fn to_report(&self, source_lines: &[String]) -> CompileReport {
        CompileReport {
            schema_version: "2.0".to_string(),
            mode: self.mode.as_str().to_string(),
            status: if self.ok { "ok".to_string() } else { "error".to_string() },
            input: self.input_path.clone(),
            backend: self.backend.clone(),
            timing_ms: self.timing_ms,
            stages: self
                .stages
                .iter()
                .map(|(name, report)| (name.to_string(), report.clone()))
                .collect(),
            artifacts: Artifacts {
                output_path: None,
                doc_path: None,
            },
            error: if self.ok {
                None
            } else {
                Some(ErrorReport {
                    category: self.diagnostics.first().map(|d| format!("{:?}", d.category)).unwrap_or_else(|| "internal".to_string()),
                    message: self.failure_message.clone().unwrap_or_default(),
                    details: self.diagnostics.iter().map(|d| d.render(source_lines)).collect(),
                    span: self.diagnostics.first().map(|d| d.span.start_line),
                })
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Artifacts {
    pub output_path: Option<String>,
    pub doc_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub category: String,
    pub message: String,
    pub details: Vec<String>,
    pub span: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompileReport {
    pub schema_version: String,
    pub mode: String,
    pub status: String,
    pub input: String,
    pub backend: String,
    pub timing_ms: u128,
    pub stages: BTreeMap<String, StageReport>,
    pub artifacts: Artifacts,
    pub error: Option<ErrorReport>,
}

/// Runs `request` through as much of the pipeline as its `mode` calls
/// for, stopping at the first stage whose errors are non-empty.
pub fn run(request: &CompileRequest) -> CompileOutcome {
    run_with_registry(request, &default_registry())
}

pub fn run_with_registry(request: &CompileRequest, registry: &StdlibRegistry) -> CompileOutcome {
    let start = Instant::now();
    let mut outcome = CompileOutcome::new(request);
    let source_lines: Vec<String> = request.content.lines().map(|s| s.to_string()).collect();

    let tokens = match tokenize(&request.content, Some(&request.input_path)) {
        Ok(tokens) => tokens,
        Err(err) => {
            outcome.diagnostics.push(Diagnostic::from(&err));
            outcome.failure_message = Some(err.message.clone());
            outcome.stages.push(("tokenize", StageReport { ok: false, detail: err.message }));
            outcome.exit_code = ExitCode::Tokenize;
            outcome.timing_ms = start.elapsed().as_millis();
            return outcome;
        }
    };
    let non_eof_count = tokens.iter().filter(|t| t.kind != TokenKind::Eof).count();
    outcome.stages.push(("tokenize", StageReport { ok: true, detail: format!("{non_eof_count} tokens") }));

    if request.mode == CompileMode::Tokens {
        outcome.tokens = Some(tokens);
        outcome.ok = true;
        outcome.exit_code = ExitCode::Success;
        outcome.timing_ms = start.elapsed().as_millis();
        return outcome;
    }

    let mut ast = match parse(tokens.clone(), Some(&request.input_path), &source_lines) {
        Ok(ast) => ast,
        Err(err) => {
            outcome.diagnostics.push(Diagnostic::from(&err));
            outcome.failure_message = Some(err.message.clone());
            outcome.stages.push(("parse", StageReport { ok: false, detail: err.message }));
            outcome.exit_code = ExitCode::Parse;
            outcome.timing_ms = start.elapsed().as_millis();
            return outcome;
        }
    };
    outcome.stages.push(("parse", StageReport { ok: true, detail: format!("{} nodes", ast.len()) }));
    outcome.tokens = Some(tokens);

    if request.mode == CompileMode::Ast {
        outcome.ast = Some(ast);
        outcome.ok = true;
        outcome.exit_code = ExitCode::Success;
        outcome.timing_ms = start.elapsed().as_millis();
        return outcome;
    }

    let (mut table, mut errors) = resolve_names(&mut ast);
    let name_resolution_ok = errors.is_empty();
    let (type_map, type_errors) = if name_resolution_ok {
        check_types(&mut ast, &mut table)
    } else {
        (TypeMap::default(), Vec::new())
    };
    let type_check_ok = type_errors.is_empty();
    errors.extend(type_errors);
    let validation_errors = if name_resolution_ok && type_check_ok { validate(&ast) } else { Vec::new() };
    errors.extend(validation_errors);

    let semantic_ok = errors.is_empty();
    outcome.stages.push((
        "semantic",
        StageReport {
            ok: semantic_ok,
            detail: format!("{} error(s) across 3 passes", errors.len()),
        },
    ));

    if !semantic_ok {
        record_semantic_errors(&mut outcome, &errors);
        outcome.exit_code = ExitCode::Semantic;
        outcome.timing_ms = start.elapsed().as_millis();
        return outcome;
    }

    outcome.symbol_table = Some(table.clone());
    outcome.type_map = Some(type_map);

    if request.mode == CompileMode::Semantic {
        outcome.ast = Some(ast);
        outcome.ok = true;
        outcome.exit_code = ExitCode::Success;
        outcome.timing_ms = start.elapsed().as_millis();
        return outcome;
    }

    let report = preprocess(&mut ast, &table, registry);
    outcome.stages.push((
        "preprocess",
        StageReport {
            ok: true,
            detail: format!("{} change(s)", report.changes_made),
        },
    ));
    outcome.preprocess_report = Some(report);

    let backend = match get_backend(&request.backend) {
        Some(backend) => backend,
        None => {
            let message = format!("unknown backend: {}", request.backend);
            outcome.failure_message = Some(message.clone());
            outcome.stages.push(("codegen", StageReport { ok: false, detail: message }));
            outcome.exit_code = ExitCode::Codegen;
            outcome.timing_ms = start.elapsed().as_millis();
            return outcome;
        }
    };

    match backend.generate(&ast, &table, registry) {
        Ok(code) => {
            outcome.stages.push(("codegen", StageReport { ok: true, detail: format!("{} bytes", code.len()) }));
            outcome.generated_code = Some(code);
        }
        Err(err) => {
            outcome.diagnostics.push(Diagnostic::from(&err));
            outcome.failure_message = Some(err.message.clone());
            outcome.stages.push(("codegen", StageReport { ok: false, detail: err.message }));
            outcome.exit_code = ExitCode::Codegen;
            outcome.timing_ms = start.elapsed().as_millis();
            return outcome;
        }
    }

    outcome.ast = Some(ast);
    outcome.ok = true;
    outcome.exit_code = ExitCode::Success;
    outcome.timing_ms = start.elapsed().as_millis();
    outcome
}

fn record_semantic_errors(outcome: &mut CompileOutcome, errors: &[SemanticError]) {
    outcome.diagnostics.extend(errors.iter().map(|e| Diagnostic::from(e)));
    outcome.failure_message = Some(format!("semantic analysis failed with {} error(s)", errors.len()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content: &str, mode: CompileMode) -> CompileRequest {
        CompileRequest {
            content: content.to_string(),
            input_path: "test.a7".to_string(),
            mode,
            backend: "c".to_string(),
        }
    }

    #[test]
    fn tokens_mode_stops_after_tokenizing() {
        let outcome = run(&request("x :: 1", CompileMode::Tokens));
        assert!(outcome.ok);
        assert!(outcome.tokens.is_some());
        assert!(outcome.ast.is_none());
        assert_eq!(outcome.stages.len(), 1);
    }

    #[test]
    fn ast_mode_stops_after_parsing() {
        let outcome = run(&request("x :: 1", CompileMode::Ast));
        assert!(outcome.ok);
        assert!(outcome.ast.is_some());
        assert!(outcome.symbol_table.is_none());
    }

    #[test]
    fn semantic_mode_runs_three_passes_and_stops() {
        let outcome = run(&request("x :: 1", CompileMode::Semantic));
        assert!(outcome.ok);
        assert!(outcome.symbol_table.is_some());
        assert!(outcome.generated_code.is_none());
    }

    #[test]
    fn pipeline_mode_produces_generated_code() {
        let source = "main :: fn() { ret }";
        let outcome = run(&request(source, CompileMode::Pipeline));
        assert!(outcome.ok, "expected success, got {:?}", outcome.failure_message);
        assert!(outcome.generated_code.is_some());
    }

    #[test]
    fn tokenize_failure_short_circuits_with_tokenize_exit_code() {
        let outcome = run(&request("x := `", CompileMode::Pipeline));
        assert!(!outcome.ok);
        assert_eq!(outcome.exit_code, ExitCode::Tokenize);
    }

    #[test]
    fn semantic_failure_short_circuits_before_codegen() {
        let outcome = run(&request("main :: fn() { ret unknown_name }", CompileMode::Pipeline));
        assert!(!outcome.ok);
        assert_eq!(outcome.exit_code, ExitCode::Semantic);
        assert!(outcome.generated_code.is_none());
    }

    #[test]
    fn unknown_backend_yields_codegen_exit_code() {
        let mut req = request("main :: fn() { ret }", CompileMode::Pipeline);
        req.backend = "rust".to_string();
        let outcome = run(&req);
        assert!(!outcome.ok);
        assert_eq!(outcome.exit_code, ExitCode::Codegen);
    }

    #[test]
    fn stage_modes_round_trip_through_from_str() {
        assert_eq!("tokens".parse::<CompileMode>().unwrap(), CompileMode::Tokens);
        assert_eq!("compile".parse::<CompileMode>().unwrap(), CompileMode::Compile);
        assert!("nonsense".parse::<CompileMode>().is_err());
    }

    #[test]
    fn output_format_round_trips_through_from_str() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn json_report_includes_schema_version_and_status() {
        let outcome = run(&request("x :: 1", CompileMode::Ast));
        let report = outcome.to_report(&[]);
        assert_eq!(report.schema_version, "2.0");
        assert_eq!(report.status, "ok");
    }
}
