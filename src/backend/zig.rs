//! Reference Zig backend.
//!
//! Mirrors [`super::c::CBackend`]'s structure through the shared
//! [`render`] walk, differing only in spelling: Zig's own fixed-width
//! primitive names, `var`/`const` declarations, and stdlib calls resolved
//! through the registry's `"zig"` mapping (`math.sqrt` becomes `@sqrt`,
//! `println` becomes `std.debug.print`).

use crate::ast::Ast;
use crate::error::CodegenError;
use crate::stdlib::StdlibRegistry;
use crate::symbol::SymbolTable;
use crate::types::Primitive;

use super::render::{self, Syntax};
use super::Backend;

pub(crate) struct ZigBackend;

impl Backend for ZigBackend {
    fn name(&self) -> &'static str {
        "zig"
    }

    fn file_extension(&self) -> &'static str {
        "zig"
    }

    fn generate(&self, ast: &Ast, table: &SymbolTable, registry: &StdlibRegistry) -> Result<String, CodegenError> {
        let mut out = String::from("const std = @import(\"std\");\n\n");
        out.push_str(&render::generate(&ZigSyntax, ast, table, registry)?);
        Ok(out)
    }
}

struct ZigSyntax;

impl Syntax for ZigSyntax {
    fn key(&self) -> &'static str {
        "zig"
    }

    fn primitive_name(&self, p: Primitive) -> &'static str {
        match p {
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::Isize => "isize",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::Usize => "usize",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::Bool => "bool",
            Primitive::Char => "u8",
            Primitive::String => "[]const u8",
        }
    }

    fn var_keyword(&self, mutable: bool) -> &'static str {
        if mutable {
            "var"
        } else {
            "const"
        }
    }

    fn declare(&self, name: &str, ty: &str, mutable: bool) -> String {
        format!("{} {name}: {ty}", self.var_keyword(mutable))
    }

    fn function_prelude(&self, name: &str, params: &str, ret: &str) -> String {
        format!("fn {name}({params}) {ret} ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_extension_and_name_are_zig() {
        let backend = ZigBackend;
        assert_eq!(backend.name(), "zig");
        assert_eq!(backend.file_extension(), "zig");
    }

    #[test]
    fn primitive_names_use_zig_spelling() {
        assert_eq!(ZigSyntax.primitive_name(Primitive::I32), "i32");
        assert_eq!(ZigSyntax.primitive_name(Primitive::String), "[]const u8");
    }

    #[test]
    fn declare_uses_var_or_const_keyword() {
        assert_eq!(ZigSyntax.declare("x", "i32", true), "var x: i32");
        assert_eq!(ZigSyntax.declare("x", "i32", false), "const x: i32");
    }
}
