//! # A7 Compiler Driver
//!
//! A thin CLI wrapper around [`a7c::pipeline`] that reads a `.a7` file,
//! runs it through as much of the pipeline as `--stage` calls for, and
//! writes the result to stdout, an output file, or both.
//!
//! ## Design Philosophy
//!
//! This binary follows the same separation the library crate draws
//! everywhere else:
//!
//! - **CLI layer** (this file): argument parsing, file I/O, exit codes.
//! - **Pipeline layer** (`a7c::pipeline`): pure stage orchestration with
//!   no side effects, fully testable without a filesystem.
//!
//! ## Usage Examples
//!
//! ```bash
//! # Compile to C (the default backend) and write out next to the source
//! a7c main.a7
//!
//! # Stop after semantic analysis, don't generate code
//! a7c --stage semantic main.a7
//!
//! # Machine-readable output for tooling
//! a7c --stage pipeline --format json main.a7
//!
//! # Target Zig instead of C, write to a specific path
//! a7c --backend zig -o build/main.zig main.a7
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Parser;

use a7c::pipeline::{self, CompileMode, CompileRequest, ExitCode, OutputFormat};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the .a7 source file to compile
    path: Option<String>,

    /// How far through the pipeline to run: tokens, ast, semantic, pipeline, compile, doc
    #[arg(long, short, default_value = "compile")]
    stage: String,

    /// Output presentation: human or json
    #[arg(long, short, default_value = "human")]
    format: String,

    /// Target backend: c or zig
    #[arg(long, default_value = "c")]
    backend: String,

    /// Output file path (defaults to the input path with the backend's extension)
    #[arg(long, short)]
    output: Option<String>,

    /// Write a Markdown documentation report alongside compilation
    #[arg(long = "doc-out")]
    doc_out: Option<String>,

    /// Print the full pipeline (tokens, AST, semantic results, generated code)
    #[arg(long, short)]
    verbose: bool,

    /// List available stages, formats, and backends
    #[arg(long)]
    help_stages: bool,
}

fn main() {
    let args = Args::parse();

    if args.help_stages {
        print_help_stages();
        std::process::exit(ExitCode::Success as i32);
    }

    let path = match args.path {
        Some(p) => p,
        None => {
            eprintln!("error: a source path is required");
            eprintln!("Use --help-stages to see available stages, formats, and backends");
            std::process::exit(ExitCode::Usage as i32);
        }
    };

    let mode: CompileMode = match args.stage.parse() {
        Ok(mode) => mode,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("valid stages: tokens, ast, semantic, pipeline, compile, doc");
            std::process::exit(ExitCode::Usage as i32);
        }
    };

    let format: OutputFormat = match args.format.parse() {
        Ok(format) => format,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("valid formats: human, json");
            std::process::exit(ExitCode::Usage as i32);
        }
    };

    if a7c::backend::get_backend(&args.backend).is_none() {
        eprintln!(
            "error: unknown backend '{}' (available: {})",
            args.backend,
            a7c::backend::list_backends().join(", ")
        );
        std::process::exit(ExitCode::Usage as i32);
    }

    let source_path = Path::new(&path);
    if source_path.extension().and_then(|e| e.to_str()) != Some("a7") {
        eprintln!("error: expected a .a7 file, got: {path}");
        std::process::exit(ExitCode::Io as i32);
    }

    let content = match fs::read_to_string(source_path) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("error: could not read {path}: {err}");
            std::process::exit(ExitCode::Io as i32);
        }
    };

    let request = CompileRequest {
        content,
        input_path: path.clone(),
        mode,
        backend: args.backend.clone(),
    };

    let outcome = pipeline::run(&request);
    let source_lines: Vec<String> = request.content.lines().map(|s| s.to_string()).collect();

    let mut output_path: Option<String> = None;
    if outcome.ok && matches!(mode, CompileMode::Compile) {
        if let Some(code) = &outcome.generated_code {
            let resolved = args.output.clone().unwrap_or_else(|| default_output_path(source_path, &args.backend));
            if let Err(err) = write_with_parent_dirs(&resolved, code) {
                eprintln!("error: failed to write output file: {err}");
                std::process::exit(ExitCode::Io as i32);
            }
            output_path = Some(resolved);
        }
    }

    let mut doc_path: Option<String> = None;
    if outcome.ok {
        if let Some(doc_out) = &args.doc_out {
            let resolved = if doc_out == "auto" {
                source_path.with_extension("md").to_string_lossy().to_string()
            } else {
                doc_out.clone()
            };
            let report = a7c::doc::render(&request, &outcome, &source_lines);
            if let Err(err) = write_with_parent_dirs(&resolved, &report) {
                eprintln!("error: failed to write documentation file: {err}");
                std::process::exit(ExitCode::Io as i32);
            }
            doc_path = Some(resolved);
        }
    }

    match format {
        OutputFormat::Json => {
            let mut report = outcome.to_report(&source_lines);
            report.artifacts.output_path = output_path.clone();
            report.artifacts.doc_path = doc_path.clone();
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(err) => eprintln!("error: failed to serialize report: {err}"),
            }
        }
        OutputFormat::Human => print_human(&outcome, &source_lines, output_path.as_deref(), doc_path.as_deref(), args.verbose),
    }

    let _ = io::stdout().flush();
    std::process::exit(outcome.exit_code as i32);
}

fn print_human(outcome: &pipeline::CompileOutcome, source_lines: &[String], output_path: Option<&str>, doc_path: Option<&str>, verbose: bool) {
    if !outcome.ok {
        if !outcome.diagnostics.is_empty() {
            let _ = a7c::diagnostics::print_all(&outcome.diagnostics, source_lines);
        } else if let Some(message) = &outcome.failure_message {
            eprintln!("error: {message}");
        }
        return;
    }

    if verbose {
        for (name, stage) in &outcome.stages {
            println!("✓ {name}: {}", stage.detail);
        }
    }

    match outcome.mode {
        CompileMode::Tokens | CompileMode::Ast => {
            println!("✓ {} ({} stage complete)", outcome.input_path, outcome.mode.as_str());
        }
        CompileMode::Semantic => {
            println!("✓ semantic analysis passed ({} pass(es))", outcome.stages.len());
        }
        CompileMode::Pipeline => {
            println!("✓ pipeline complete for {} (no file written)", outcome.input_path);
        }
        CompileMode::Compile => {
            if let Some(path) = output_path {
                println!("✓ {} → {}", outcome.input_path, path);
            }
        }
        CompileMode::Doc => {
            println!("✓ documentation generated for {}", outcome.input_path);
        }
    }

    if let Some(path) = doc_path {
        println!("📄 documentation written to {path}");
    }
}

fn default_output_path(source_path: &Path, backend: &str) -> String {
    let extension = a7c::backend::get_backend(backend).map(|b| b.file_extension()).unwrap_or("out");
    source_path.with_extension(extension).to_string_lossy().to_string()
}

fn write_with_parent_dirs(path: &str, content: &str) -> io::Result<()> {
    let path = PathBuf::from(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)
}

fn print_help_stages() {
    println!("AVAILABLE STAGES:");
    println!("  {:<12} stop after tokenizing", "tokens");
    println!("  {:<12} stop after parsing", "ast");
    println!("  {:<12} stop after name resolution, type checking, and validation", "semantic");
    println!("  {:<12} run preprocess + codegen but don't write a file", "pipeline");
    println!("  {:<12} full pipeline, writing the output file", "compile");
    println!("  {:<12} full pipeline plus a Markdown documentation report", "doc");

    println!("\nAVAILABLE FORMATS:");
    println!("  {:<12} colorized source frames for a terminal", "human");
    println!("  {:<12} schema v2.0 report for tooling", "json");

    println!("\nAVAILABLE BACKENDS:");
    for name in a7c::backend::list_backends() {
        println!("  {name:<12}");
    }
}
