//! Shared expression/statement rendering logic both reference backends
//! drive, parameterized over the handful of spellings that actually
//! differ between a C-family and a Zig-family syntax (type names,
//! declaration keywords, call syntax). Everything else — operator
//! spelling, control-flow shape, struct-literal field order — is close
//! enough between the two that duplicating it per backend would just be
//! copy-paste drift waiting to happen.

use crate::ast::{Ast, BinaryOp, LiteralKind, NodeId, NodeKind, UnaryOp};
use crate::error::CodegenError;
use crate::stdlib::StdlibRegistry;
use crate::symbol::SymbolTable;
use crate::types::{Primitive, Type};

use super::Emitter;

/// The small set of spellings that differ between backends. Everything
/// else in this module is backend-agnostic.
pub(crate) trait Syntax {
    fn key(&self) -> &'static str;
    fn primitive_name(&self, p: Primitive) -> &'static str;
    fn var_keyword(&self, mutable: bool) -> &'static str;
    /// Declares `name` with `ty`, e.g. `int x` (C) or `var x: i32` (Zig).
    fn declare(&self, name: &str, ty: &str, mutable: bool) -> String;
    fn function_prelude(&self, name: &str, params: &str, ret: &str) -> String;
}

pub(crate) fn generate(
    syntax: &dyn Syntax,
    ast: &Ast,
    table: &SymbolTable,
    registry: &StdlibRegistry,
) -> Result<String, CodegenError> {
    let NodeKind::Program { declarations } = ast.kind(ast.root) else {
        return Err(CodegenError {
            span: None,
            message: "root node is not a PROGRAM".to_string(),
        });
    };

    let mut out = Emitter::new();
    for decl in declarations {
        render_declaration(syntax, ast, table, registry, &mut out, *decl)?;
        out.newline();
    }
    Ok(out.finish())
}

fn render_declaration(
    syntax: &dyn Syntax,
    ast: &Ast,
    table: &SymbolTable,
    registry: &StdlibRegistry,
    out: &mut Emitter,
    id: NodeId,
) -> Result<(), CodegenError> {
    match ast.kind(id).clone() {
        NodeKind::Function {
            name,
            params,
            return_type,
            body,
            ..
        } => {
            let name = name.unwrap_or_else(|| format!("anon_{}", id.0));
            let rendered_params = params
                .iter()
                .map(|p| match ast.kind(*p) {
                    NodeKind::Parameter { name, type_node } => {
                        let ty = type_name(syntax, ast, *type_node);
                        syntax.declare(name, &ty, false)
                    }
                    _ => String::new(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            let ret = match return_type {
                Some(t) => type_name(syntax, ast, t),
                None => "void".to_string(),
            };
            out.writeln(&syntax.function_prelude(&name, &rendered_params, &ret));
            if let Some(body) = body {
                render_block(syntax, ast, table, registry, out, body)?;
            } else {
                out.writeln(";");
            }
            Ok(())
        }
        NodeKind::Const { name, value } => {
            let expr = render_expr(syntax, ast, table, registry, value)?;
            out.writeln(&format!("{} {} = {};", syntax.var_keyword(false), name, expr));
            Ok(())
        }
        NodeKind::Struct { name, fields, .. } => {
            out.writeln(&format!("struct {name} {{"));
            out.indent_in();
            for field in fields {
                if let NodeKind::Field { name, type_node } = ast.kind(field) {
                    let ty = type_name(syntax, ast, *type_node);
                    out.writeln(&format!("{};", syntax.declare(name, &ty, false)));
                }
            }
            out.indent_out();
            out.writeln("};");
            Ok(())
        }
        NodeKind::Enum { name, variants } => {
            out.writeln(&format!("enum {name} {{"));
            out.indent_in();
            for variant in variants {
                if let NodeKind::EnumVariant { name, .. } = ast.kind(variant) {
                    out.writeln(&format!("{name},"));
                }
            }
            out.indent_out();
            out.writeln("};");
            Ok(())
        }
        NodeKind::Union { name, fields, .. } => {
            out.writeln(&format!("union {name} {{"));
            out.indent_in();
            for field in fields {
                if let NodeKind::Field { name, type_node } = ast.kind(field) {
                    let ty = type_name(syntax, ast, *type_node);
                    out.writeln(&format!("{};", syntax.declare(name, &ty, false)));
                }
            }
            out.indent_out();
            out.writeln("};");
            Ok(())
        }
        NodeKind::Import { .. } => Ok(()),
        other => Err(CodegenError {
            span: Some(ast.span(id)),
            message: format!("unexpected top-level node {}", other.tag()),
        }),
    }
}

fn type_name(syntax: &dyn Syntax, ast: &Ast, id: NodeId) -> String {
    match ast.kind(id).clone() {
        NodeKind::TypePrimitive { name } => Primitive::from_name(&name)
            .map(|p| syntax.primitive_name(p).to_string())
            .unwrap_or(name),
        NodeKind::TypeIdentifier { name } => name,
        NodeKind::TypeArray { element, .. } => format!("{}[]", type_name(syntax, ast, element)),
        NodeKind::TypeSlice { element } => format!("{}[]", type_name(syntax, ast, element)),
        NodeKind::TypePointer { target } => format!("{}*", type_name(syntax, ast, target)),
        NodeKind::TypeFunction { .. } => "void*".to_string(),
        NodeKind::TypeStruct { .. } => "struct".to_string(),
        NodeKind::TypeGeneric { name } => name,
        _ => "void".to_string(),
    }
}

fn render_block(
    syntax: &dyn Syntax,
    ast: &Ast,
    table: &SymbolTable,
    registry: &StdlibRegistry,
    out: &mut Emitter,
    id: NodeId,
) -> Result<(), CodegenError> {
    out.writeln("{");
    out.indent_in();
    let NodeKind::Block { statements } = ast.kind(id).clone() else {
        return Err(CodegenError {
            span: Some(ast.span(id)),
            message: "expected BLOCK".to_string(),
        });
    };
    for stmt in statements {
        render_statement(syntax, ast, table, registry, out, stmt)?;
    }
    out.indent_out();
    out.writeln("}");
    Ok(())
}

/// Statement rendering recurses through nested blocks/if/while bodies.
/// This mirrors the parser's own recursive-descent, which already bounds
/// this depth by source structure — the same argument that lets the
/// parser recurse applies symmetrically to walking back out of the tree
/// it built.
fn render_statement(
    syntax: &dyn Syntax,
    ast: &Ast,
    table: &SymbolTable,
    registry: &StdlibRegistry,
    out: &mut Emitter,
    id: NodeId,
) -> Result<(), CodegenError> {
    match ast.kind(id).clone() {
        NodeKind::Var { name, value, .. } => {
            let data = ast.get(id);
            let emit_name = data.emit_name.clone().unwrap_or_else(|| name.clone());
            let ty = data
                .resolved_type
                .as_ref()
                .map(|t| display_type(syntax, t))
                .unwrap_or_else(|| "auto".to_string());
            let expr = render_expr(syntax, ast, table, registry, value)?;
            out.writeln(&format!("{} = {};", syntax.declare(&emit_name, &ty, data.is_mutable), expr));
        }
        NodeKind::Return { value } => match value {
            Some(v) => {
                let expr = render_expr(syntax, ast, table, registry, v)?;
                out.writeln(&format!("return {expr};"));
            }
            None => out.writeln("return;"),
        },
        NodeKind::Break => out.writeln("break;"),
        NodeKind::Continue => out.writeln("continue;"),
        NodeKind::Fall => out.writeln("/* fall */"),
        NodeKind::ExpressionStmt { expression } => {
            let expr = render_expr(syntax, ast, table, registry, expression)?;
            out.writeln(&format!("{expr};"));
        }
        NodeKind::Assignment { target, op, value } => {
            let target_expr = render_expr(syntax, ast, table, registry, target)?;
            let value_expr = render_expr(syntax, ast, table, registry, value)?;
            out.writeln(&format!("{target_expr} {} {value_expr};", assign_op_str(op)));
        }
        NodeKind::IfStmt {
            condition,
            then_block,
            else_block,
        } => {
            let cond = render_expr(syntax, ast, table, registry, condition)?;
            out.writeln(&format!("if ({cond}) "));
            render_block(syntax, ast, table, registry, out, then_block)?;
            if let Some(else_block) = else_block {
                out.writeln("else ");
                if matches!(ast.kind(else_block), NodeKind::IfStmt { .. }) {
                    render_statement(syntax, ast, table, registry, out, else_block)?;
                } else {
                    render_block(syntax, ast, table, registry, out, else_block)?;
                }
            }
        }
        NodeKind::While { condition, body } => {
            let cond = render_expr(syntax, ast, table, registry, condition)?;
            out.writeln(&format!("while ({cond}) "));
            render_block(syntax, ast, table, registry, out, body)?;
        }
        NodeKind::For {
            init,
            condition,
            update,
            body,
        } => {
            let init_str = match init {
                Some(i) => render_statement_inline(syntax, ast, table, registry, i)?,
                None => String::new(),
            };
            let cond_str = match condition {
                Some(c) => render_expr(syntax, ast, table, registry, c)?,
                None => String::new(),
            };
            let update_str = match update {
                Some(u) => render_statement_inline(syntax, ast, table, registry, u)?,
                None => String::new(),
            };
            out.writeln(&format!("for ({init_str}; {cond_str}; {update_str}) "));
            render_block(syntax, ast, table, registry, out, body)?;
        }
        NodeKind::ForIn { iterator, iterable, body } => {
            let iter_expr = render_expr(syntax, ast, table, registry, iterable)?;
            out.writeln(&format!("for ({iterator} in {iter_expr}) "));
            render_block(syntax, ast, table, registry, out, body)?;
        }
        NodeKind::ForInIndexed {
            index_name,
            value_name,
            iterable,
            body,
        } => {
            let iter_expr = render_expr(syntax, ast, table, registry, iterable)?;
            out.writeln(&format!("for ({index_name}, {value_name} in {iter_expr}) "));
            render_block(syntax, ast, table, registry, out, body)?;
        }
        NodeKind::Block { .. } => render_block(syntax, ast, table, registry, out, id)?,
        NodeKind::Defer { statement } => {
            out.write("defer ");
            render_statement(syntax, ast, table, registry, out, statement)?;
        }
        NodeKind::Del { target } => {
            let expr = render_expr(syntax, ast, table, registry, target)?;
            out.writeln(&format!("free({expr});"));
        }
        NodeKind::Function { .. } => {
            render_declaration(syntax, ast, table, registry, out, id)?;
        }
        NodeKind::Match { scrutinee, cases, else_branch } => {
            let scrutinee_expr = render_expr(syntax, ast, table, registry, scrutinee)?;
            out.writeln(&format!("switch ({scrutinee_expr}) {{"));
            out.indent_in();
            for case in cases {
                if let NodeKind::CaseBranch { patterns, body } = ast.kind(case).clone() {
                    let labels = patterns
                        .iter()
                        .map(|p| render_pattern(syntax, ast, table, registry, *p))
                        .collect::<Result<Vec<_>, _>>()?
                        .join(", ");
                    out.writeln(&format!("case {labels}:"));
                    out.indent_in();
                    render_statement(syntax, ast, table, registry, out, body)?;
                    out.writeln("break;");
                    out.indent_out();
                }
            }
            if let Some(else_branch) = else_branch {
                out.writeln("default:");
                out.indent_in();
                render_statement(syntax, ast, table, registry, out, else_branch)?;
                out.indent_out();
            }
            out.indent_out();
            out.writeln("}");
        }
        other => {
            return Err(CodegenError {
                span: Some(ast.span(id)),
                message: format!("statement kind {} not supported by this reference backend", other.tag()),
            })
        }
    }
    Ok(())
}

fn render_statement_inline(
    syntax: &dyn Syntax,
    ast: &Ast,
    table: &SymbolTable,
    registry: &StdlibRegistry,
    id: NodeId,
) -> Result<String, CodegenError> {
    let mut out = Emitter::new();
    render_statement(syntax, ast, table, registry, &mut out, id)?;
    Ok(out.finish().trim_end_matches([';', '\n']).to_string())
}

fn render_pattern(
    syntax: &dyn Syntax,
    ast: &Ast,
    table: &SymbolTable,
    registry: &StdlibRegistry,
    id: NodeId,
) -> Result<String, CodegenError> {
    match ast.kind(id).clone() {
        NodeKind::PatternLiteral { literal } => render_expr(syntax, ast, table, registry, literal),
        NodeKind::PatternIdentifier { name } => Ok(name),
        NodeKind::PatternEnum { enum_name, variant_name } => Ok(format!("{enum_name}_{variant_name}")),
        NodeKind::PatternRange { start, end } => {
            let start_expr = render_expr(syntax, ast, table, registry, start)?;
            let end_expr = render_expr(syntax, ast, table, registry, end)?;
            Ok(format!("{start_expr}...{end_expr}"))
        }
        other => Err(CodegenError {
            span: Some(ast.span(id)),
            message: format!("pattern kind {} not supported", other.tag()),
        }),
    }
}

fn render_expr(
    syntax: &dyn Syntax,
    ast: &Ast,
    table: &SymbolTable,
    registry: &StdlibRegistry,
    id: NodeId,
) -> Result<String, CodegenError> {
    match ast.kind(id).clone() {
        NodeKind::Literal { kind, raw_text } => Ok(render_literal(kind, &raw_text)),
        NodeKind::Identifier { .. } => {
            let data = ast.get(id);
            let name = data.emit_name.clone().unwrap_or_else(|| match ast.kind(id) {
                NodeKind::Identifier { name } => name.clone(),
                _ => unreachable!(),
            });
            let _ = table;
            Ok(name)
        }
        NodeKind::Binary { op, left, right } => {
            let l = render_expr(syntax, ast, table, registry, left)?;
            let r = render_expr(syntax, ast, table, registry, right)?;
            Ok(format!("({l} {} {r})", binary_op_str(op)))
        }
        NodeKind::Unary { op, operand } => {
            let operand_expr = render_expr(syntax, ast, table, registry, operand)?;
            Ok(format!("{}{operand_expr}", unary_op_str(op)))
        }
        NodeKind::Call { callee, args } => {
            let rendered_args = args
                .iter()
                .map(|a| render_expr(syntax, ast, table, registry, *a))
                .collect::<Result<Vec<_>, _>>()?
                .join(", ");
            let name = match &ast.get(callee).stdlib_canonical {
                Some(canonical) => registry
                    .get_backend_mapping(canonical, syntax.key())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| canonical.clone()),
                None => render_expr(syntax, ast, table, registry, callee)?,
            };
            Ok(format!("{name}({rendered_args})"))
        }
        NodeKind::Index { base, index } => {
            let base_expr = render_expr(syntax, ast, table, registry, base)?;
            let index_expr = render_expr(syntax, ast, table, registry, index)?;
            Ok(format!("{base_expr}[{index_expr}]"))
        }
        NodeKind::Slice { base, start, end } => {
            let base_expr = render_expr(syntax, ast, table, registry, base)?;
            let start_expr = match start {
                Some(s) => render_expr(syntax, ast, table, registry, s)?,
                None => "0".to_string(),
            };
            let end_expr = match end {
                Some(e) => render_expr(syntax, ast, table, registry, e)?,
                None => "len".to_string(),
            };
            Ok(format!("{base_expr}[{start_expr}..{end_expr}]"))
        }
        NodeKind::FieldAccess { base, field } => {
            let base_expr = render_expr(syntax, ast, table, registry, base)?;
            Ok(format!("{base_expr}.{field}"))
        }
        NodeKind::AddressOf { operand } => {
            let operand_expr = render_expr(syntax, ast, table, registry, operand)?;
            Ok(format!("&{operand_expr}"))
        }
        NodeKind::Deref { operand } => {
            let operand_expr = render_expr(syntax, ast, table, registry, operand)?;
            Ok(format!("(*{operand_expr})"))
        }
        NodeKind::Cast { target_type, value } => {
            let ty = type_name(syntax, ast, target_type);
            let value_expr = render_expr(syntax, ast, table, registry, value)?;
            Ok(format!("(({ty}){value_expr})"))
        }
        NodeKind::NewExpr { target_type } => {
            let ty = type_name(syntax, ast, target_type);
            Ok(format!("alloc({ty})"))
        }
        NodeKind::StructInit { type_name: struct_name, fields } => {
            let rendered_fields = fields
                .iter()
                .map(|f| match ast.kind(*f).clone() {
                    NodeKind::FieldInit { name, value } => {
                        let value_expr = render_expr(syntax, ast, table, registry, value)?;
                        Ok(match name {
                            Some(name) => format!(".{name} = {value_expr}"),
                            None => value_expr,
                        })
                    }
                    _ => Ok(String::new()),
                })
                .collect::<Result<Vec<_>, CodegenError>>()?
                .join(", ");
            Ok(format!("({struct_name}) {{ {rendered_fields} }}"))
        }
        NodeKind::ArrayInit { elements } => {
            let rendered = elements
                .iter()
                .map(|e| render_expr(syntax, ast, table, registry, *e))
                .collect::<Result<Vec<_>, _>>()?
                .join(", ");
            Ok(format!("{{ {rendered} }}"))
        }
        NodeKind::IfExpr {
            condition,
            then_block,
            else_block,
        } => {
            let cond = render_expr(syntax, ast, table, registry, condition)?;
            let then_expr = render_expr(syntax, ast, table, registry, then_block)?;
            let else_expr = render_expr(syntax, ast, table, registry, else_block)?;
            Ok(format!("({cond} ? {then_expr} : {else_expr})"))
        }
        other => Err(CodegenError {
            span: Some(ast.span(id)),
            message: format!("expression kind {} not supported by this reference backend", other.tag()),
        }),
    }
}

fn render_literal(kind: LiteralKind, raw_text: &str) -> String {
    match kind {
        LiteralKind::String => format!("\"{raw_text}\""),
        LiteralKind::Char => format!("'{raw_text}'"),
        LiteralKind::Nil => "NULL".to_string(),
        LiteralKind::Boolean | LiteralKind::Integer | LiteralKind::Float => raw_text.to_string(),
    }
}

fn display_type(syntax: &dyn Syntax, t: &Type) -> String {
    match t {
        Type::Primitive(p) => syntax.primitive_name(*p).to_string(),
        Type::Pointer(inner) => format!("{}*", display_type(syntax, inner)),
        Type::Array(elem, _) | Type::Slice(elem) => format!("{}[]", display_type(syntax, elem)),
        other => other.display(),
    }
}

fn binary_op_str(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        BinaryOp::BitAnd => "&",
        BinaryOp::BitOr => "|",
        BinaryOp::BitXor => "^",
        BinaryOp::Shl => "<<",
        BinaryOp::Shr => ">>",
    }
}

fn unary_op_str(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Neg => "-",
        UnaryOp::Not => "!",
        UnaryOp::BitNot => "~",
    }
}

fn assign_op_str(op: crate::ast::AssignOp) -> &'static str {
    use crate::ast::AssignOp;
    match op {
        AssignOp::Assign => "=",
        AssignOp::AddAssign => "+=",
        AssignOp::SubAssign => "-=",
        AssignOp::MulAssign => "*=",
        AssignOp::DivAssign => "/=",
        AssignOp::ModAssign => "%=",
        AssignOp::AndAssign => "&=",
        AssignOp::OrAssign => "|=",
        AssignOp::XorAssign => "^=",
        AssignOp::ShlAssign => "<<=",
        AssignOp::ShrAssign => ">>=",
    }
}
