//! Phase 3b: type checker.
//!
//! Runs in two passes. The first is a flat scan over top-level
//! declarations that computes function/struct/enum/union *signatures*
//! only (param and return types, field and variant shapes) — shallow and
//! order-independent, so forward references between top-level
//! declarations (`main` calling a `helper` declared later in the file)
//! resolve correctly. The second walks each function body bottom-up,
//! computing and writing `resolved_type` for every expression, using an
//! explicit post-order stack rather than host recursion (expression
//! trees are exactly the deeply-nested case the traversal contract rules
//! out relying on the call stack for — only the function-in-function
//! entry point below recurses, and that nesting is bounded by source
//! structure).

use std::collections::HashMap;

use crate::ast::{Ast, BinaryOp, LiteralKind, NodeId, NodeKind, UnaryOp};
use crate::error::{SemanticError, SemanticErrorKind};
use crate::symbol::{SymbolId, SymbolKind, SymbolTable};
use crate::types::{ArraySize, Primitive, Type};

/// A read-only snapshot of every node's computed type, taken once type
/// checking completes. The authoritative copy lives on each AST node's
/// `resolved_type` field; this exists for callers that want a `NodeId ->
/// Type` view without walking the tree themselves.
#[derive(Debug, Clone, Default)]
pub struct TypeMap {
    types: HashMap<NodeId, Type>,
}

impl TypeMap {
    pub fn get(&self, id: NodeId) -> Option<&Type> {
        self.types.get(&id)
    }
}

pub fn check_types(ast: &mut Ast, table: &mut SymbolTable) -> (TypeMap, Vec<SemanticError>) {
    let mut checker = TypeChecker {
        ast,
        table,
        errors: Vec::new(),
        nominal_cache: HashMap::new(),
    };
    checker.run();
    let mut types = HashMap::new();
    for i in 0..checker.ast.len() {
        let id = NodeId(i as u32);
        if let Some(t) = checker.ast.get(id).resolved_type.clone() {
            types.insert(id, t);
        }
    }
    (TypeMap { types }, checker.errors)
}

#[derive(Clone)]
enum Nominal {
    Struct(Vec<(String, Type)>),
    Union(Vec<(String, Type)>, bool),
    Enum(Vec<String>),
}

struct TypeChecker<'a> {
    ast: &'a mut Ast,
    table: &'a mut SymbolTable,
    errors: Vec<SemanticError>,
    nominal_cache: HashMap<SymbolId, Nominal>,
}

impl<'a> TypeChecker<'a> {
    fn run(&mut self) {
        let declarations = match self.ast.kind(self.ast.root) {
            NodeKind::Program { declarations } => declarations.clone(),
            _ => return,
        };
        for decl in &declarations {
            self.compute_signature_for(*decl);
        }
        for decl in &declarations {
            if matches!(self.ast.kind(*decl), NodeKind::Function { body: Some(_), .. }) {
                self.check_function_body(*decl);
            }
            if matches!(self.ast.kind(*decl), NodeKind::Const { .. } | NodeKind::Var { .. }) {
                self.check_stmt_tree(*decl, None);
            }
        }
    }

    fn error(&mut self, node: NodeId, message: impl Into<String>) {
        let span = self.ast.span(node);
        self.errors.push(SemanticError::new(SemanticErrorKind::TypeCheck, span, message.into()));
    }

    fn type_of(&self, id: NodeId) -> Type {
        self.ast.get(id).resolved_type.clone().unwrap_or(Type::Unknown)
    }

    fn set_type(&mut self, id: NodeId, t: Type) {
        self.ast.get_mut(id).resolved_type = Some(t);
    }

    // ---- signatures -------------------------------------------------

    fn compute_signature_for(&mut self, decl: NodeId) {
        if self.ast.get(decl).resolved_type.is_some() {
            return;
        }
        match self.ast.kind(decl).clone() {
            NodeKind::Function { params, return_type, .. } => {
                let mut param_types = Vec::with_capacity(params.len());
                for param in &params {
                    if let NodeKind::Parameter { type_node, .. } = self.ast.kind(*param).clone() {
                        let t = self.type_of_type_node(type_node);
                        self.set_type(*param, t.clone());
                        param_types.push(t);
                    }
                }
                let ret = return_type.map(|r| self.type_of_type_node(r)).unwrap_or(Type::Void);
                self.set_type(decl, Type::Function(param_types, Box::new(ret)));
            }
            NodeKind::Struct { name, .. } | NodeKind::Enum { name, .. } | NodeKind::Union { name, .. } => {
                if let Some(sym) = self.ast.get(decl).resolved_symbol.or_else(|| self.table.lookup(self.table.root(), &name)) {
                    let t = self.nominal_type_for_symbol(sym);
                    self.set_type(decl, t);
                }
            }
            _ => {}
        }
    }

    fn nominal_type_for_symbol(&mut self, symbol: SymbolId) -> Type {
        match self.table.symbol(symbol).kind {
            SymbolKind::Struct => Type::Struct(symbol),
            SymbolKind::Enum => Type::Enum(symbol),
            SymbolKind::Union => {
                let decl = self.table.symbol(symbol).declaration;
                let tagged = matches!(self.ast.kind(decl), NodeKind::Union { is_tagged: true, .. });
                Type::Union(symbol, tagged)
            }
            _ => Type::Unknown,
        }
    }

    fn nominal_of(&mut self, symbol: SymbolId) -> Nominal {
        if let Some(n) = self.nominal_cache.get(&symbol) {
            return n.clone();
        }
        let decl = self.table.symbol(symbol).declaration;
        let nominal = match self.ast.kind(decl).clone() {
            NodeKind::Struct { fields, .. } => Nominal::Struct(self.field_types(&fields)),
            NodeKind::Union { fields, is_tagged, .. } => Nominal::Union(self.field_types(&fields), is_tagged),
            NodeKind::Enum { variants, .. } => Nominal::Enum(
                variants
                    .iter()
                    .filter_map(|v| match self.ast.kind(*v).clone() {
                        NodeKind::EnumVariant { name, .. } => Some(name),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => Nominal::Struct(Vec::new()),
        };
        self.nominal_cache.insert(symbol, nominal.clone());
        nominal
    }

    fn field_types(&mut self, fields: &[NodeId]) -> Vec<(String, Type)> {
        fields
            .iter()
            .filter_map(|f| match self.ast.kind(*f).clone() {
                NodeKind::Field { name, type_node } => Some((name, self.type_of_type_node(type_node))),
                _ => None,
            })
            .collect()
    }

    fn type_of_type_node(&mut self, node: NodeId) -> Type {
        match self.ast.kind(node).clone() {
            NodeKind::TypePrimitive { name } => Primitive::from_name(&name).map(Type::Primitive).unwrap_or(Type::Unknown),
            NodeKind::TypeIdentifier { .. } => match self.ast.get(node).resolved_symbol {
                Some(sym) => self.nominal_type_for_symbol(sym),
                None => Type::Unknown,
            },
            NodeKind::TypeArray { element, size } => {
                let elem = self.type_of_type_node(element);
                Type::Array(Box::new(elem), self.eval_array_size(size))
            }
            NodeKind::TypeSlice { element } => Type::Slice(Box::new(self.type_of_type_node(element))),
            NodeKind::TypePointer { target } => Type::Pointer(Box::new(self.type_of_type_node(target))),
            NodeKind::TypeFunction { params, return_type } => {
                let params = params.iter().map(|p| self.type_of_type_node(*p)).collect();
                let ret = return_type.map(|r| self.type_of_type_node(r)).unwrap_or(Type::Void);
                Type::Function(params, Box::new(ret))
            }
            NodeKind::TypeStruct { .. } => Type::Unknown,
            NodeKind::TypeGeneric { name } => Type::GenericParam(name),
            _ => Type::Unknown,
        }
    }

    fn eval_array_size(&self, node: NodeId) -> ArraySize {
        match self.ast.kind(node) {
            NodeKind::Literal { kind: LiteralKind::Integer, raw_text } => {
                raw_text.replace('_', "").parse::<u64>().map(ArraySize::Known).unwrap_or(ArraySize::Unresolved)
            }
            _ => ArraySize::Unresolved,
        }
    }

    // ---- bodies -------------------------------------------------------

    fn check_function_body(&mut self, func_id: NodeId) {
        let (body, return_type) = match self.ast.kind(func_id).clone() {
            NodeKind::Function { body: Some(b), return_type, .. } => (b, return_type),
            _ => return,
        };
        let expected = return_type.map(|r| self.type_of_type_node(r));
        if let NodeKind::Block { statements } = self.ast.kind(body).clone() {
            for stmt in &statements {
                if matches!(self.ast.kind(*stmt), NodeKind::Function { .. }) {
                    self.compute_signature_for(*stmt);
                }
            }
        }
        self.check_stmt_tree(body, expected);
    }

    /// Bottom-up, iterative: every node is visited twice (unvisited, then
    /// visited) via an explicit stack, with children pushed in reverse so
    /// the leftmost subtree is fully processed — and so its declarations
    /// are typed — before its right siblings are visited.
    fn check_stmt_tree(&mut self, root: NodeId, return_type: Option<Type>) {
        let mut stack: Vec<(NodeId, bool)> = vec![(root, false)];
        while let Some((id, visited)) = stack.pop() {
            if visited {
                self.apply(id, &return_type);
                continue;
            }
            if id != root {
                if let NodeKind::Function { .. } = self.ast.kind(id) {
                    self.check_function_body(id);
                    continue;
                }
            }
            stack.push((id, true));
            for child in self.ast.structural_children(id).into_iter().rev() {
                stack.push((child, false));
            }
        }
    }

    fn apply(&mut self, id: NodeId, return_type: &Option<Type>) {
        match self.ast.kind(id).clone() {
            NodeKind::Literal { kind, .. } => {
                let t = match kind {
                    LiteralKind::Integer => Type::Primitive(Primitive::I32),
                    LiteralKind::Float => Type::Primitive(Primitive::F64),
                    LiteralKind::Boolean => Type::Primitive(Primitive::Bool),
                    LiteralKind::Char => Type::Primitive(Primitive::Char),
                    LiteralKind::String => Type::Primitive(Primitive::String),
                    LiteralKind::Nil => Type::Nil,
                };
                self.set_type(id, t);
            }
            NodeKind::Identifier { .. } => {
                let t = match self.ast.get(id).resolved_symbol {
                    Some(sym) => self.type_of_declared_symbol(sym),
                    None => Type::Unknown,
                };
                self.set_type(id, t);
            }
            NodeKind::Binary { op, left, right } => self.check_binary(id, op, left, right),
            NodeKind::Unary { op, operand } => self.check_unary(id, op, operand),
            NodeKind::AddressOf { operand } => {
                let t = self.type_of(operand);
                self.set_type(id, Type::Pointer(Box::new(t)));
            }
            NodeKind::Deref { operand } => {
                let t = self.type_of(operand);
                match t {
                    Type::Pointer(inner) => self.set_type(id, *inner),
                    Type::Unknown => self.set_type(id, Type::Unknown),
                    other => {
                        self.error(id, format!("'.val' on non-pointer type '{}'", other.display()));
                        self.set_type(id, Type::Unknown);
                    }
                }
            }
            NodeKind::FieldAccess { base, field } => self.check_field_access(id, base, &field),
            NodeKind::Index { base, index } => self.check_index(id, base, index),
            NodeKind::Slice { base, .. } => {
                let t = self.type_of(base);
                self.set_type(id, t);
            }
            NodeKind::Call { callee, args } => self.check_call(id, callee, &args),
            NodeKind::Cast { target_type, value } => self.check_cast(id, target_type, value),
            NodeKind::NewExpr { target_type } => {
                let t = self.type_of_type_node(target_type);
                self.set_type(id, Type::Pointer(Box::new(t)));
            }
            NodeKind::StructInit { type_name, fields } => self.check_struct_init(id, &type_name, &fields),
            NodeKind::ArrayInit { elements } => self.check_array_init(id, &elements),
            NodeKind::FieldInit { value, .. } => {
                let t = self.type_of(value);
                self.set_type(id, t);
            }
            NodeKind::IfExpr { then_block, else_block, .. } => self.check_if_expr(id, then_block, else_block),
            NodeKind::Var { explicit_type, value, .. } => self.check_var(id, explicit_type, value),
            NodeKind::Const { value, .. } => {
                let t = self.type_of(value);
                self.set_type(id, t);
                if let Some(sym) = self.ast.get(id).resolved_symbol {
                    self.table.symbol_mut(sym).resolved_type = Some(self.type_of(id));
                }
            }
            NodeKind::Assignment { target, value, .. } => self.check_assignment(id, target, value),
            NodeKind::Return { value } => self.check_return(id, value, return_type),
            NodeKind::Del { target } => self.check_del(id, target),
            NodeKind::Match { cases, .. } => self.check_match(id, &cases),
            NodeKind::Struct { .. } | NodeKind::Enum { .. } | NodeKind::Union { .. } => {
                self.compute_signature_for(id);
            }
            _ => {}
        }
    }

    fn type_of_declared_symbol(&mut self, sym: SymbolId) -> Type {
        let decl = self.table.symbol(sym).declaration;
        let from_node = self.ast.get(decl).resolved_type.clone();
        if let Some(t) = from_node {
            return t;
        }
        self.table.symbol(sym).resolved_type.clone().unwrap_or(Type::Unknown)
    }

    fn check_binary(&mut self, id: NodeId, op: BinaryOp, left: NodeId, right: NodeId) {
        let lt = self.type_of(left);
        let rt = self.type_of(right);
        if lt == Type::Unknown || rt == Type::Unknown {
            self.set_type(id, Type::Unknown);
            return;
        }
        let result = match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                if lt.is_numeric() && lt == rt {
                    lt.clone()
                } else {
                    self.error(id, format!("Binary operands must be the same numeric type, got '{}' and '{}'", lt.display(), rt.display()));
                    Type::Unknown
                }
            }
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                if lt == rt {
                    Type::Primitive(Primitive::Bool)
                } else {
                    self.error(id, format!("Comparison operands must be the same type, got '{}' and '{}'", lt.display(), rt.display()));
                    Type::Unknown
                }
            }
            BinaryOp::And | BinaryOp::Or => {
                if lt == Type::Primitive(Primitive::Bool) && rt == Type::Primitive(Primitive::Bool) {
                    Type::Primitive(Primitive::Bool)
                } else {
                    self.error(id, "Logical operands must be 'bool'");
                    Type::Unknown
                }
            }
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr => {
                if lt.is_integer() && lt == rt {
                    lt.clone()
                } else {
                    self.error(id, format!("Bitwise operands must be the same integer type, got '{}' and '{}'", lt.display(), rt.display()));
                    Type::Unknown
                }
            }
        };
        self.set_type(id, result);
    }

    fn check_unary(&mut self, id: NodeId, op: UnaryOp, operand: NodeId) {
        let t = self.type_of(operand);
        if t == Type::Unknown {
            self.set_type(id, Type::Unknown);
            return;
        }
        let result = match op {
            UnaryOp::Neg => {
                if t.is_numeric() {
                    t.clone()
                } else {
                    self.error(id, format!("'-' requires a numeric operand, got '{}'", t.display()));
                    Type::Unknown
                }
            }
            UnaryOp::Not => {
                if t == Type::Primitive(Primitive::Bool) {
                    Type::Primitive(Primitive::Bool)
                } else {
                    self.error(id, "'not' requires a 'bool' operand");
                    Type::Unknown
                }
            }
            UnaryOp::BitNot => {
                if t.is_integer() {
                    t.clone()
                } else {
                    self.error(id, format!("'~' requires an integer operand, got '{}'", t.display()));
                    Type::Unknown
                }
            }
        };
        self.set_type(id, result);
    }

    fn check_field_access(&mut self, id: NodeId, base: NodeId, field: &str) {
        let base_type = self.type_of(base);
        let sym = match &base_type {
            Type::Struct(s) | Type::Union(s, _) => Some(*s),
            Type::Unknown => {
                self.set_type(id, Type::Unknown);
                return;
            }
            other => {
                self.error(id, format!("Field access on non-struct/union type '{}'", other.display()));
                self.set_type(id, Type::Unknown);
                return;
            }
        };
        let Some(sym) = sym else { return };
        let nominal = self.nominal_of(sym);
        let fields = match &nominal {
            Nominal::Struct(f) | Nominal::Union(f, _) => f,
            Nominal::Enum(_) => {
                self.error(id, "Field access on an enum type");
                self.set_type(id, Type::Unknown);
                return;
            }
        };
        match fields.iter().find(|(name, _)| name == field) {
            Some((_, t)) => self.set_type(id, t.clone()),
            None => {
                self.error(id, format!("Unknown field '{field}'"));
                self.set_type(id, Type::Unknown);
            }
        }
    }

    fn check_index(&mut self, id: NodeId, base: NodeId, index: NodeId) {
        let base_type = self.type_of(base);
        let idx_type = self.type_of(index);
        if idx_type != Type::Unknown && !idx_type.is_integer() {
            self.error(id, format!("Index must be an integer, got '{}'", idx_type.display()));
        }
        match base_type {
            Type::Array(elem, _) | Type::Slice(elem) => self.set_type(id, *elem),
            Type::Unknown => self.set_type(id, Type::Unknown),
            other => {
                self.error(id, format!("Cannot index non-array/slice type '{}'", other.display()));
                self.set_type(id, Type::Unknown);
            }
        }
    }

    fn check_call(&mut self, id: NodeId, callee: NodeId, args: &[NodeId]) {
        let callee_type = self.type_of(callee);
        match callee_type {
            Type::Function(params, ret) => {
                if params.len() != args.len() {
                    self.error(id, format!("Expected {} argument(s), got {}", params.len(), args.len()));
                } else {
                    for (param_ty, arg) in params.iter().zip(args.iter()) {
                        let arg_ty = self.type_of(*arg);
                        if arg_ty != Type::Unknown && *param_ty != Type::Unknown && !param_ty.assignable_from(&arg_ty) {
                            self.error(*arg, format!("Argument type '{}' is not compatible with parameter type '{}'", arg_ty.display(), param_ty.display()));
                        }
                    }
                }
                self.set_type(id, *ret);
            }
            Type::Unknown => self.set_type(id, Type::Unknown),
            other => {
                self.error(id, format!("Cannot call non-function type '{}'", other.display()));
                self.set_type(id, Type::Unknown);
            }
        }
    }

    fn check_cast(&mut self, id: NodeId, target_type: NodeId, value: NodeId) {
        let target = self.type_of_type_node(target_type);
        let source = self.type_of(value);
        let ok = source == Type::Unknown
            || target == Type::Unknown
            || (source.is_numeric() && target.is_numeric())
            || (source.is_pointer() && target.is_pointer())
            || (matches!(source, Type::Enum(_)) && target.is_integer())
            || (source.is_integer() && matches!(target, Type::Enum(_)));
        if !ok {
            self.error(id, format!("Cannot cast '{}' to '{}'", source.display(), target.display()));
        }
        self.set_type(id, target);
    }

    fn check_struct_init(&mut self, id: NodeId, type_name: &str, fields: &[NodeId]) {
        let sym = self.table.lookup(self.table.root(), type_name);
        let Some(sym) = sym else {
            self.error(id, format!("Undefined type '{type_name}'"));
            self.set_type(id, Type::Unknown);
            return;
        };
        let nominal = self.nominal_of(sym);
        let struct_fields = match &nominal {
            Nominal::Struct(f) => f.clone(),
            _ => {
                self.error(id, format!("'{type_name}' is not a struct"));
                self.set_type(id, Type::Unknown);
                return;
            }
        };
        for (i, field) in fields.iter().enumerate() {
            let (field_name, value) = match self.ast.kind(*field).clone() {
                NodeKind::FieldInit { name, value } => (name, value),
                _ => continue,
            };
            let expected = match &field_name {
                Some(name) => struct_fields.iter().find(|(n, _)| n == name).map(|(_, t)| t.clone()),
                None => struct_fields.get(i).map(|(_, t)| t.clone()),
            };
            let value_type = self.type_of(value);
            match (field_name, expected) {
                (Some(name), None) => self.error(*field, format!("Struct '{type_name}' has no field '{name}'")),
                (None, None) => {}
                (_, Some(expected)) => {
                    if value_type != Type::Unknown && expected != Type::Unknown && !expected.assignable_from(&value_type) {
                        self.error(*field, format!("Field expects type '{}', got '{}'", expected.display(), value_type.display()));
                    }
                }
            }
        }
        self.set_type(id, Type::Struct(sym));
    }

    fn check_array_init(&mut self, id: NodeId, elements: &[NodeId]) {
        if elements.is_empty() {
            self.set_type(id, Type::Array(Box::new(Type::Unknown), ArraySize::Known(0)));
            return;
        }
        let first = self.type_of(elements[0]);
        for elem in &elements[1..] {
            let t = self.type_of(*elem);
            if t != Type::Unknown && first != Type::Unknown && t != first {
                self.error(*elem, format!("Array elements must share a type: expected '{}', got '{}'", first.display(), t.display()));
            }
        }
        self.set_type(id, Type::Array(Box::new(first), ArraySize::Known(elements.len() as u64)));
    }

    fn check_if_expr(&mut self, id: NodeId, then_block: NodeId, else_block: NodeId) {
        let then_ty = self.type_of(then_block);
        let else_ty = self.type_of(else_block);
        if then_ty != Type::Unknown && else_ty != Type::Unknown && then_ty != else_ty {
            self.error(id, format!("'if' branches have different types: '{}' and '{}'", then_ty.display(), else_ty.display()));
            self.set_type(id, Type::Unknown);
        } else {
            self.set_type(id, if then_ty != Type::Unknown { then_ty } else { else_ty });
        }
    }

    fn check_var(&mut self, id: NodeId, explicit_type: Option<NodeId>, value: NodeId) {
        let value_type = self.type_of(value);
        let final_type = match explicit_type {
            Some(t) => {
                let declared = self.type_of_type_node(t);
                if value_type != Type::Unknown && declared != Type::Unknown && !declared.assignable_from(&value_type) {
                    self.error(id, format!("Cannot assign '{}' to a variable of type '{}'", value_type.display(), declared.display()));
                }
                declared
            }
            None => value_type,
        };
        self.set_type(id, final_type.clone());
        if let Some(sym) = self.ast.get(id).resolved_symbol {
            self.table.symbol_mut(sym).resolved_type = Some(final_type);
        }
    }

    fn check_assignment(&mut self, id: NodeId, target: NodeId, value: NodeId) {
        let target_type = self.type_of(target);
        let value_type = self.type_of(value);
        if target_type != Type::Unknown && value_type != Type::Unknown && !target_type.assignable_from(&value_type) {
            self.error(id, format!("Cannot assign '{}' to '{}'", value_type.display(), target_type.display()));
        }
        self.set_type(id, target_type);
    }

    fn check_return(&mut self, id: NodeId, value: Option<NodeId>, expected: &Option<Type>) {
        match (value, expected) {
            (Some(v), Some(expected_ty)) => {
                let vt = self.type_of(v);
                if vt != Type::Unknown && *expected_ty != Type::Unknown && !expected_ty.assignable_from(&vt) {
                    self.error(id, format!("Function returns '{}', got '{}'", expected_ty.display(), vt.display()));
                }
            }
            (Some(_), None) => self.error(id, "Void function cannot return a value"),
            (None, Some(expected_ty)) if *expected_ty != Type::Void => {
                self.error(id, format!("Function must return a value of type '{}'", expected_ty.display()));
            }
            _ => {}
        }
    }

    fn check_del(&mut self, id: NodeId, target: NodeId) {
        let t = self.type_of(target);
        if t != Type::Unknown && !t.is_pointer() {
            self.error(id, format!("'del' target must be a pointer, got '{}'", t.display()));
        }
    }

    fn check_match(&mut self, id: NodeId, cases: &[NodeId]) {
        let mut case_type: Option<Type> = None;
        for case in cases {
            if let NodeKind::CaseBranch { body, .. } = self.ast.kind(*case).clone() {
                let t = self.type_of(body);
                if t == Type::Unknown {
                    continue;
                }
                match &case_type {
                    None => case_type = Some(t),
                    Some(existing) if *existing != t => {
                        self.error(*case, format!("Match case bodies have different types: '{}' and '{}'", existing.display(), t.display()));
                    }
                    _ => {}
                }
            }
        }
        self.set_type(id, case_type.unwrap_or(Type::Void));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use crate::resolve::resolve_names;

    fn check(src: &str) -> Vec<SemanticError> {
        let tokens = tokenize(src, None).expect("tokenizes");
        let lines: Vec<String> = src.lines().map(|s| s.to_string()).collect();
        let mut ast = parse(tokens, None, &lines).expect("parses");
        let (mut table, resolve_errors) = resolve_names(&mut ast);
        assert!(resolve_errors.is_empty(), "{resolve_errors:?}");
        let (_, errors) = check_types(&mut ast, &mut table);
        errors
    }

    #[test]
    fn integer_literal_defaults_to_i32() {
        let tokens = tokenize("main :: fn() { x := 1 }", None).unwrap();
        let lines: Vec<String> = "main :: fn() { x := 1 }".lines().map(|s| s.to_string()).collect();
        let mut ast = parse(tokens, None, &lines).unwrap();
        let (mut table, _) = resolve_names(&mut ast);
        check_types(&mut ast, &mut table);
        for i in 0..ast.len() {
            if let NodeKind::Literal { kind: LiteralKind::Integer, .. } = ast.kind(NodeId(i as u32)) {
                assert_eq!(ast.get(NodeId(i as u32)).resolved_type, Some(Type::Primitive(Primitive::I32)));
            }
        }
    }

    #[test]
    fn mismatched_binary_operand_types_is_an_error() {
        let errors = check("main :: fn() { x := 1 y := 1.0 z := x + y }");
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].message.contains("same numeric type"));
    }

    #[test]
    fn call_arity_mismatch_is_an_error() {
        let errors = check("take :: fn(a: i32) { } main :: fn() { take() }");
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].message.contains("Expected 1 argument"));
    }

    #[test]
    fn forward_referenced_function_call_type_checks() {
        let errors = check("main :: fn() { x := helper(1) } helper :: fn(a: i32) i32 { ret a }");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn field_access_on_struct_resolves_field_type() {
        let errors = check("Point :: struct { x: i32 } main :: fn() { p := Point { x: 1 } y := p.x }");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn field_access_on_unknown_field_is_an_error() {
        let errors = check("Point :: struct { x: i32 } main :: fn() { p := Point { x: 1 } y := p.z }");
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].message.contains("Unknown field 'z'"));
    }

    #[test]
    fn nil_is_assignable_to_pointer_type() {
        let errors = check("main :: fn() { p: ref i32 = nil }");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn address_of_produces_pointer_type() {
        let tokens = tokenize("main :: fn() { x := 1 p := x.adr }", None).unwrap();
        let lines: Vec<String> = "main :: fn() { x := 1 p := x.adr }".lines().map(|s| s.to_string()).collect();
        let mut ast = parse(tokens, None, &lines).unwrap();
        let (mut table, _) = resolve_names(&mut ast);
        let (_, errors) = check_types(&mut ast, &mut table);
        assert!(errors.is_empty(), "{errors:?}");
    }
}
