//! The type-checker's value domain.
//!
//! `Type` is a tagged value with structural equality for everything except
//! nominal kinds (`Struct`/`Enum`/`Union`), which compare by declaring
//! symbol id so two structurally identical struct definitions stay
//! distinct types.

use serde::{Deserialize, Serialize};

use crate::symbol::SymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Primitive {
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Bool,
    Char,
    String,
}

impl Primitive {
    pub fn is_integer(self) -> bool {
        !matches!(self, Primitive::F32 | Primitive::F64 | Primitive::Bool | Primitive::Char | Primitive::String)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Primitive::F32 | Primitive::F64)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn name(self) -> &'static str {
        match self {
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
            Primitive::Char => "char",
            Primitive::String => "string",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "i8" => Primitive::I8,
            "i16" => Primitive::I16,
            "i32" => Primitive::I32,
            "i64" => Primitive::I64,
            "isize" => Primitive::Isize,
            "u8" => Primitive::U8,
            "u16" => Primitive::U16,
            "u32" => Primitive::U32,
            "u64" => Primitive::U64,
            "usize" => Primitive::Usize,
            "f32" => Primitive::F32,
            "f64" => Primitive::F64,
            "bool" => Primitive::Bool,
            "char" => Primitive::Char,
            "string" => Primitive::String,
            _ => return None,
        })
    }
}

/// A size expression recorded on an `ARRAY` type. Only a constant-folded
/// integer literal is usable as an actual array length; until folding runs
/// it is carried as the AST node that computes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArraySize {
    Known(u64),
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Primitive(Primitive),
    Struct(SymbolId),
    Enum(SymbolId),
    Union(SymbolId, bool),
    Array(Box<Type>, ArraySize),
    Slice(Box<Type>),
    Pointer(Box<Type>),
    Function(Vec<Type>, Box<Type>),
    GenericParam(String),
    Void,
    Unknown,
    Nil,
}

impl Type {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Primitive(p) if p.is_numeric())
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Primitive(p) if p.is_integer())
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    /// Assignment compatibility: identity, plus `NIL` into any pointer.
    /// Numeric widening is deliberately not implicit here.
    pub fn assignable_from(&self, other: &Type) -> bool {
        if self == other {
            return true;
        }
        matches!((self, other), (Type::Pointer(_), Type::Nil))
    }

    pub fn display(&self) -> String {
        match self {
            Type::Primitive(p) => p.name().to_string(),
            Type::Struct(id) => format!("struct#{}", id.0),
            Type::Enum(id) => format!("enum#{}", id.0),
            Type::Union(id, tagged) => format!("union#{}{}", id.0, if *tagged { "(tagged)" } else { "" }),
            Type::Array(elem, size) => match size {
                ArraySize::Known(n) => format!("[{n}]{}", elem.display()),
                ArraySize::Unresolved => format!("[?]{}", elem.display()),
            },
            Type::Slice(elem) => format!("[]{}", elem.display()),
            Type::Pointer(target) => format!("ref {}", target.display()),
            Type::Function(params, ret) => {
                let params = params.iter().map(Type::display).collect::<Vec<_>>().join(", ");
                format!("fn({params}) {}", ret.display())
            }
            Type::GenericParam(name) => format!("${name}"),
            Type::Void => "void".to_string(),
            Type::Unknown => "?".to_string(),
            Type::Nil => "nil".to_string(),
        }
    }
}
