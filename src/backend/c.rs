//! Reference C backend.
//!
//! Emits plain C99: primitives map onto `<stdint.h>` fixed-width types,
//! `struct`/`union`/`enum` declarations keep their source field order, and
//! stdlib calls go through the registry's `"c"` mapping (`println` becomes
//! `printf`, `math.sqrt` becomes `sqrt`). This is a reference emitter, not
//! a production one: it assumes the AST it's handed already passed through
//! [`crate::preprocess::preprocess`], so every call is canonicalized and
//! every declaration has an `emit_name` free of shadowing collisions.

use crate::ast::Ast;
use crate::error::CodegenError;
use crate::stdlib::StdlibRegistry;
use crate::symbol::SymbolTable;
use crate::types::Primitive;

use super::render::{self, Syntax};
use super::Backend;

pub(crate) struct CBackend;

impl Backend for CBackend {
    fn name(&self) -> &'static str {
        "c"
    }

    fn file_extension(&self) -> &'static str {
        "c"
    }

    fn generate(&self, ast: &Ast, table: &SymbolTable, registry: &StdlibRegistry) -> Result<String, CodegenError> {
        let mut out = String::from("#include <stdint.h>\n#include <stdbool.h>\n#include <stddef.h>\n\n");
        out.push_str(&render::generate(&CSyntax, ast, table, registry)?);
        Ok(out)
    }
}

struct CSyntax;

impl Syntax for CSyntax {
    fn key(&self) -> &'static str {
        "c"
    }

    fn primitive_name(&self, p: Primitive) -> &'static str {
        match p {
            Primitive::I8 => "int8_t",
            Primitive::I16 => "int16_t",
            Primitive::I32 => "int32_t",
            Primitive::I64 => "int64_t",
            Primitive::Isize => "intptr_t",
            Primitive::U8 => "uint8_t",
            Primitive::U16 => "uint16_t",
            Primitive::U32 => "uint32_t",
            Primitive::U64 => "uint64_t",
            Primitive::Usize => "size_t",
            Primitive::F32 => "float",
            Primitive::F64 => "double",
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::String => "const char*",
        }
    }

    fn var_keyword(&self, mutable: bool) -> &'static str {
        if mutable {
            ""
        } else {
            "const"
        }
    }

    fn declare(&self, name: &str, ty: &str, mutable: bool) -> String {
        if mutable {
            format!("{ty} {name}")
        } else {
            format!("const {ty} {name}")
        }
    }

    fn function_prelude(&self, name: &str, params: &str, ret: &str) -> String {
        format!("{ret} {name}({params}) ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_extension_and_name_are_c() {
        let backend = CBackend;
        assert_eq!(backend.name(), "c");
        assert_eq!(backend.file_extension(), "c");
    }

    #[test]
    fn primitive_names_use_stdint_types() {
        assert_eq!(CSyntax.primitive_name(Primitive::I32), "int32_t");
        assert_eq!(CSyntax.primitive_name(Primitive::Usize), "size_t");
        assert_eq!(CSyntax.primitive_name(Primitive::String), "const char*");
    }

    #[test]
    fn declare_mutable_drops_const() {
        assert_eq!(CSyntax.declare("x", "int32_t", true), "int32_t x");
        assert_eq!(CSyntax.declare("x", "int32_t", false), "const int32_t x");
    }
}
