//! Phase 6.2: the emitter contract.
//!
//! The core never implements a backend's own codegen strategy; it only
//! promises the invariants a backend may trust once `preprocess` has run
//! (every expression typed, every stdlib call canonicalized, every
//! mutable/used/shadowed annotation in place). `Backend` is the seam: a
//! small trait plus a registry function, mirroring the reference
//! implementation's pluggable-backend module so a caller asks for
//! `"c"`/`"zig"` by name rather than importing a concrete generator type.

mod c;
mod render;
mod zig;

use crate::ast::Ast;
use crate::error::CodegenError;
use crate::stdlib::StdlibRegistry;
use crate::symbol::SymbolTable;

/// Implemented once per target language. `generate` receives the
/// preprocessed AST, the registry backend name it should key stdlib
/// lookups under (`"c"` or `"zig"`), and the symbol table for resolving
/// struct/enum names from their `SymbolId`.
pub trait Backend {
    fn name(&self) -> &'static str;
    fn file_extension(&self) -> &'static str;
    fn generate(&self, ast: &Ast, table: &SymbolTable, registry: &StdlibRegistry) -> Result<String, CodegenError>;
}

/// Resolves a backend by name, the way the driver CLI's `--backend` flag
/// (or the JSON schema's `backend` field) selects one.
pub fn get_backend(name: &str) -> Option<Box<dyn Backend>> {
    match name {
        "c" => Some(Box::new(c::CBackend)),
        "zig" => Some(Box::new(zig::ZigBackend)),
        _ => None,
    }
}

pub fn list_backends() -> Vec<&'static str> {
    vec!["c", "zig"]
}

/// Shared output-buffer bookkeeping every backend's `generate` builds on:
/// an indentation level plus a `write`/`writeln` pair that prefixes new
/// lines with the current indent, the same bookkeeping the reference
/// implementation's generator base class keeps per emitted file.
pub(crate) struct Emitter {
    buffer: String,
    indent: usize,
    at_line_start: bool,
}

impl Emitter {
    pub(crate) fn new() -> Self {
        Emitter {
            buffer: String::new(),
            indent: 0,
            at_line_start: true,
        }
    }

    pub(crate) fn indent_in(&mut self) {
        self.indent += 1;
    }

    pub(crate) fn indent_out(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub(crate) fn write(&mut self, text: &str) {
        if self.at_line_start {
            self.buffer.push_str(&"    ".repeat(self.indent));
        }
        self.buffer.push_str(text);
        self.at_line_start = false;
    }

    pub(crate) fn newline(&mut self) {
        self.buffer.push('\n');
        self.at_line_start = true;
    }

    pub(crate) fn writeln(&mut self, text: &str) {
        self.write(text);
        self.newline();
    }

    pub(crate) fn finish(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_backend_names_resolve() {
        assert!(get_backend("c").is_some());
        assert!(get_backend("zig").is_some());
        assert!(get_backend("rust").is_none());
    }

    #[test]
    fn emitter_indents_new_lines_only() {
        let mut emitter = Emitter::new();
        emitter.write("fn main() {");
        emitter.newline();
        emitter.indent_in();
        emitter.writeln("return;");
        emitter.indent_out();
        emitter.writeln("}");
        assert_eq!(emitter.finish(), "fn main() {\n    return;\n}\n");
    }
}
