//! Phase 4: the AST preprocessor.
//!
//! Nine sub-passes that lower sugar, resolve stdlib calls, normalize
//! struct inits, and annotate the tree (mutation/usage/shadowing/hoisting)
//! in preparation for the emitter.
//!
//! `expr.adr`/`expr.val` pointer sugar is parsed directly into
//! `ADDRESS_OF`/`DEREF` nodes rather than surfacing as a `FIELD_ACCESS`
//! the preprocessor has to recognize afterward — both are sanctioned
//! readings of the same grammar, and parsing them as operators means one
//! fewer tree rewrite has to happen here. Constant folding still runs as
//! its own bottom-up walk, immediately after struct-def collection, so a
//! folded array-size expression is available to anything downstream that
//! wants it. Every walk here is iterative: an explicit `Vec`-backed stack
//! of `(NodeId, visited)` frames stands in for the call stack a recursive
//! visitor would use — deeply nested expressions and block chains must
//! not depend on host recursion.

use std::collections::{HashMap, HashSet};

use crate::ast::{Ast, BinaryOp, LiteralKind, NodeId, NodeKind, UnaryOp};
use crate::stdlib::StdlibRegistry;
use crate::symbol::SymbolTable;
use crate::types::Primitive;

/// What the preprocessor produced, beyond the mutated AST: the struct
/// field-order table (handy for an emitter that wants to re-derive
/// positional layout) and a change counter tests use to assert idempotence.
#[derive(Debug, Clone, Default)]
pub struct PreprocessReport {
    pub changes_made: usize,
    pub struct_fields: HashMap<String, Vec<String>>,
}

/// Runs every sub-pass over `ast` in place. `table` resolves identifiers to
/// their declaring node for mutation/usage analysis; `registry` backs
/// stdlib-call resolution. The type checker already wrote `resolved_type`
/// onto every node directly, so there is no separate type map parameter —
/// passes that need a node's type read `ast.get(id).resolved_type`.
pub fn preprocess(ast: &mut Ast, table: &SymbolTable, registry: &StdlibRegistry) -> PreprocessReport {
    let mut pp = Preprocessor {
        ast,
        table,
        registry,
        changes: 0,
    };
    pp.run()
}

struct Preprocessor<'a> {
    ast: &'a mut Ast,
    table: &'a SymbolTable,
    registry: &'a StdlibRegistry,
    changes: usize,
}

impl<'a> Preprocessor<'a> {
    fn run(&mut self) -> PreprocessReport {
        let struct_fields = self.collect_struct_defs();
        self.fold_constants_tree();
        self.resolve_stdlib_calls();
        self.normalize_struct_inits(&struct_fields);
        self.analyze_mutation();
        self.analyze_usage();
        self.backfill_literal_types();
        self.resolve_shadowing_all_functions();
        self.hoist_nested_functions();

        PreprocessReport {
            changes_made: self.changes,
            struct_fields,
        }
    }

    // ---- sub-pass 1: struct definition collection ---------------------

    /// A flat arena scan rather than a tree walk: struct declarations can
    /// appear at module scope or as a statement inside a function body,
    /// and every one of them is a live `NodeData` entry regardless of
    /// where it's reachable from, so scanning the whole arena once finds
    /// them all without needing to know the shapes that can contain one.
    fn collect_struct_defs(&self) -> HashMap<String, Vec<String>> {
        let mut defs = HashMap::new();
        for i in 0..self.ast.len() {
            let id = NodeId(i as u32);
            if let NodeKind::Struct { name, fields, .. } = self.ast.kind(id) {
                let field_names = fields
                    .iter()
                    .filter_map(|f| match self.ast.kind(*f) {
                        NodeKind::Field { name, .. } => Some(name.clone()),
                        _ => None,
                    })
                    .collect();
                defs.insert(name.clone(), field_names);
            }
        }
        defs
    }

    // ---- sub-pass 2: constant folding -----------------------------------

    /// Single post-order walk over the whole program. Each node is pushed
    /// twice: once unvisited (to schedule its children), once visited (to
    /// fold it once every child below it has already been folded).
    /// Replacements are written back through `Ast::replace` by id, so a
    /// parent that already pushed a child's id onto the stack sees the
    /// replacement the next time it reads that child.
    fn fold_constants_tree(&mut self) {
        let root = self.ast.root;
        let mut stack: Vec<(NodeId, bool)> = vec![(root, false)];
        while let Some((id, visited)) = stack.pop() {
            if visited {
                self.fold_constant(id);
                continue;
            }
            stack.push((id, true));
            for child in self.ast.structural_children(id).into_iter().rev() {
                stack.push((child, false));
            }
        }
    }

    fn fold_constant(&mut self, id: NodeId) {
        match self.ast.kind(id).clone() {
            NodeKind::Unary { op, operand } => self.fold_unary(id, op, operand),
            NodeKind::Binary { op, left, right } => self.fold_binary(id, op, left, right),
            _ => {}
        }
    }

    fn literal_of(&self, id: NodeId) -> Option<(LiteralKind, String)> {
        match self.ast.kind(id) {
            NodeKind::Literal { kind, raw_text } => Some((*kind, raw_text.clone())),
            _ => None,
        }
    }

    fn fold_unary(&mut self, id: NodeId, op: UnaryOp, operand: NodeId) {
        let Some((kind, text)) = self.literal_of(operand) else { return };
        let span = self.ast.span(id);
        match (op, kind) {
            (UnaryOp::Neg, LiteralKind::Integer) => {
                if let Some(v) = parse_int(&text) {
                    if let Some(negated) = v.checked_neg() {
                        self.replace_with_literal(id, span, LiteralKind::Integer, negated.to_string());
                    }
                }
            }
            (UnaryOp::Neg, LiteralKind::Float) => {
                if let Some(v) = text.parse::<f64>().ok() {
                    self.replace_with_literal(id, span, LiteralKind::Float, format_float(-v));
                }
            }
            (UnaryOp::Not, LiteralKind::Boolean) => {
                let negated = text != "true";
                self.replace_with_literal(id, span, LiteralKind::Boolean, negated.to_string());
            }
            _ => {}
        }
    }

    fn fold_binary(&mut self, id: NodeId, op: BinaryOp, left: NodeId, right: NodeId) {
        let Some((lk, lt)) = self.literal_of(left) else { return };
        let Some((rk, rt)) = self.literal_of(right) else { return };
        if lk != rk {
            return;
        }
        let span = self.ast.span(id);
        match lk {
            LiteralKind::Integer => {
                let (Some(a), Some(b)) = (parse_int(&lt), parse_int(&rt)) else { return };
                let result = match op {
                    BinaryOp::Add => a.checked_add(b),
                    BinaryOp::Sub => a.checked_sub(b),
                    BinaryOp::Mul => a.checked_mul(b),
                    BinaryOp::Div if b != 0 => a.checked_div(b),
                    BinaryOp::Mod if b != 0 => a.checked_rem(b),
                    _ => None,
                };
                if let Some(v) = result {
                    self.replace_with_literal(id, span, LiteralKind::Integer, v.to_string());
                }
            }
            LiteralKind::Float => {
                let (Ok(a), Ok(b)) = (lt.parse::<f64>(), rt.parse::<f64>()) else { return };
                let result = match op {
                    BinaryOp::Add => Some(a + b),
                    BinaryOp::Sub => Some(a - b),
                    BinaryOp::Mul => Some(a * b),
                    BinaryOp::Div if b != 0.0 => Some(a / b),
                    _ => None,
                };
                if let Some(v) = result {
                    if v.is_finite() {
                        self.replace_with_literal(id, span, LiteralKind::Float, format_float(v));
                    }
                }
            }
            _ => {}
        }
    }

    fn replace_with_literal(&mut self, id: NodeId, span: crate::span::Span, kind: LiteralKind, raw_text: String) {
        self.ast.replace(id, span, NodeKind::Literal { kind, raw_text });
        self.changes += 1;
    }

    // ---- sub-pass 3: stdlib-call resolution ----------------------------

    fn resolve_stdlib_calls(&mut self) {
        for i in 0..self.ast.len() {
            let id = NodeId(i as u32);
            let NodeKind::Call { callee, .. } = self.ast.kind(id).clone() else { continue };
            if self.ast.get(id).stdlib_canonical.is_some() {
                continue;
            }
            let canonical = match self.ast.kind(callee).clone() {
                NodeKind::FieldAccess { base, field } => match self.ast.kind(base) {
                    NodeKind::Identifier { name } => self
                        .registry
                        .resolve_call(name, &field)
                        .map(|f| f.canonical.clone()),
                    _ => None,
                },
                NodeKind::Identifier { name } => self.registry.resolve_builtin(&name).map(|f| f.canonical.clone()),
                _ => None,
            };
            if let Some(canonical) = canonical {
                self.ast.get_mut(id).stdlib_canonical = Some(canonical);
                self.changes += 1;
            }
        }
    }

    // ---- sub-pass 4: struct-init normalization --------------------------

    fn normalize_struct_inits(&mut self, struct_fields: &HashMap<String, Vec<String>>) {
        for i in 0..self.ast.len() {
            let id = NodeId(i as u32);
            let NodeKind::StructInit { type_name, fields } = self.ast.kind(id).clone() else { continue };
            let Some(field_names) = struct_fields.get(&type_name) else { continue };
            let has_unnamed = fields.iter().any(|f| matches!(self.ast.kind(*f), NodeKind::FieldInit { name: None, .. }));
            if !has_unnamed || fields.len() > field_names.len() {
                continue;
            }
            for (index, field_id) in fields.iter().enumerate() {
                let NodeKind::FieldInit { name: None, value } = self.ast.kind(*field_id).clone() else { continue };
                let Some(assigned) = field_names.get(index) else { continue };
                let span = self.ast.span(*field_id);
                self.ast.replace(*field_id, span, NodeKind::FieldInit { name: Some(assigned.clone()), value });
                self.changes += 1;
            }
        }
    }

    // ---- sub-pass 5: mutation analysis ----------------------------------

    /// For every `ASSIGNMENT`, chases the target through `INDEX`/
    /// `FIELD_ACCESS`/`DEREF` down to its root identifier and, if that
    /// identifier's declaration is a `VAR`, marks it mutable. Scanning the
    /// whole arena for `ASSIGNMENT` nodes is equivalent to "per function"
    /// here: a declaration's node id is only ever reachable from the one
    /// function scope that owns it, so there is nothing to conflate across
    /// functions by doing this in a single global pass.
    fn analyze_mutation(&mut self) {
        for i in 0..self.ast.len() {
            let id = NodeId(i as u32);
            let NodeKind::Assignment { target, .. } = self.ast.kind(id).clone() else { continue };
            let Some(root_ident) = self.root_identifier(target) else { continue };
            let Some(symbol) = self.ast.get(root_ident).resolved_symbol else { continue };
            let decl = self.table.symbol(symbol).declaration;
            if matches!(self.ast.kind(decl), NodeKind::Var { .. }) && !self.ast.get(decl).is_mutable {
                self.ast.get_mut(decl).is_mutable = true;
                self.changes += 1;
            }
        }
    }

    /// Walks down an lvalue expression (`a[i].field.val = ...`) to the
    /// `IDENTIFIER` at its root.
    fn root_identifier(&self, mut node: NodeId) -> Option<NodeId> {
        loop {
            match self.ast.kind(node) {
                NodeKind::Identifier { .. } => return Some(node),
                NodeKind::Index { base, .. } => node = *base,
                NodeKind::FieldAccess { base, .. } => node = *base,
                NodeKind::Deref { operand } => node = *operand,
                NodeKind::AddressOf { operand } => node = *operand,
                _ => return None,
            }
        }
    }

    // ---- sub-pass 6: usage analysis -------------------------------------

    /// Marks every `PARAMETER`/`VAR` referenced by an `IDENTIFIER` or
    /// `TYPE_IDENTIFIER` anywhere in the program as used.
    fn analyze_usage(&mut self) {
        for i in 0..self.ast.len() {
            let id = NodeId(i as u32);
            let is_reference = matches!(self.ast.kind(id), NodeKind::Identifier { .. } | NodeKind::TypeIdentifier { .. });
            if !is_reference {
                continue;
            }
            let Some(symbol) = self.ast.get(id).resolved_symbol else { continue };
            let decl = self.table.symbol(symbol).declaration;
            if matches!(self.ast.kind(decl), NodeKind::Var { .. } | NodeKind::Parameter { .. }) && !self.ast.get(decl).is_used {
                self.ast.get_mut(decl).is_used = true;
                self.changes += 1;
            }
        }
    }

    // ---- sub-pass 7: type annotation backfill ---------------------------

    /// A mutable `VAR` with no explicit type whose initializer is a bare
    /// literal gets a default primitive written into `resolved_type`. The
    /// type checker already computed the same type while checking the
    /// declaration; this only matters for a preprocessor run against an
    /// AST that skipped type checking (e.g. a hand-built tree in a test),
    /// which is why it's idempotent against the normal pipeline.
    fn backfill_literal_types(&mut self) {
        for i in 0..self.ast.len() {
            let id = NodeId(i as u32);
            let NodeKind::Var { explicit_type: None, value, .. } = self.ast.kind(id).clone() else { continue };
            if !self.ast.get(id).is_mutable {
                continue;
            }
            if self.ast.get(id).resolved_type.is_some() {
                continue;
            }
            let NodeKind::Literal { kind, .. } = self.ast.kind(value) else { continue };
            let default = match kind {
                LiteralKind::Integer => Primitive::I32,
                LiteralKind::Float => Primitive::F64,
                LiteralKind::Boolean => Primitive::Bool,
                LiteralKind::Char => Primitive::Char,
                LiteralKind::String => Primitive::String,
                LiteralKind::Nil => continue,
            };
            self.ast.get_mut(id).resolved_type = Some(crate::types::Type::Primitive(default));
            self.changes += 1;
        }
    }

    // ---- sub-pass 8: shadowing resolution --------------------------------

    /// Runs independently over every `FUNCTION` node in the arena (top
    /// level and nested — nested functions haven't been hoisted out of
    /// their enclosing body yet, so they're still ordinary nodes the arena
    /// scan finds on its own). Each function gets its own fresh scope
    /// stack and emitted-name set; shadowing renames never cross a
    /// function boundary.
    fn resolve_shadowing_all_functions(&mut self) {
        let function_bodies: Vec<NodeId> = (0..self.ast.len())
            .map(|i| NodeId(i as u32))
            .filter_map(|id| match self.ast.kind(id) {
                NodeKind::Function { body: Some(body), .. } => Some(*body),
                _ => None,
            })
            .collect();
        for body in function_bodies {
            self.resolve_shadowing_in_function(body);
        }
    }

    fn resolve_shadowing_in_function(&mut self, body: NodeId) {
        let mut scopes: Vec<HashSet<String>> = vec![HashSet::new()];
        let mut emitted: HashSet<String> = HashSet::new();

        enum Frame {
            Enter(NodeId),
            PopScope,
        }

        let mut stack = vec![Frame::Enter(body)];
        while let Some(frame) = stack.pop() {
            let id = match frame {
                Frame::PopScope => {
                    scopes.pop();
                    continue;
                }
                Frame::Enter(id) => id,
            };

            // A nested function is processed by its own top-level call to
            // this method; don't descend into it here.
            if matches!(self.ast.kind(id), NodeKind::Function { .. }) {
                continue;
            }

            if let NodeKind::Block { statements } = self.ast.kind(id).clone() {
                scopes.push(HashSet::new());
                stack.push(Frame::PopScope);
                for stmt in statements.iter().rev() {
                    stack.push(Frame::Enter(*stmt));
                }
                continue;
            }

            if let NodeKind::CaseBranch { body: case_body, .. } = self.ast.kind(id).clone() {
                scopes.push(HashSet::new());
                stack.push(Frame::PopScope);
                stack.push(Frame::Enter(case_body));
                continue;
            }

            if let NodeKind::Var { name, .. } = self.ast.kind(id).clone() {
                self.apply_shadow(id, &name, &mut scopes, &mut emitted);
            }

            for child in self.ast.structural_children(id).into_iter().rev() {
                stack.push(Frame::Enter(child));
            }
        }
    }

    /// Registers `name`'s declaration at `id` in the innermost scope,
    /// assigning `emit_name = name_1, name_2, ...` if `name` is already
    /// bound in any *outer* scope (shadowing an inner re-declaration of
    /// the same name at the same scope level is a duplicate caught by the
    /// resolver already, not a rename case here).
    fn apply_shadow(&mut self, id: NodeId, name: &str, scopes: &mut [HashSet<String>], emitted: &mut HashSet<String>) {
        let shadows_outer = scopes[..scopes.len() - 1].iter().any(|s| s.contains(name));
        if shadows_outer {
            let mut suffix = 1;
            let mut candidate = format!("{name}_{suffix}");
            while emitted.contains(&candidate) {
                suffix += 1;
                candidate = format!("{name}_{suffix}");
            }
            self.ast.get_mut(id).emit_name = Some(candidate.clone());
            emitted.insert(candidate);
        } else {
            emitted.insert(name.to_string());
        }
        scopes.last_mut().expect("at least one scope on the stack").insert(name.to_string());
    }

    // ---- sub-pass 9: nested-function hoisting ---------------------------

    /// Any `FUNCTION` reachable as a statement inside another function's
    /// body (rather than only as a top-level `PROGRAM` declaration) is
    /// marked `hoisted`; the emitter decides where it actually lands.
    fn hoist_nested_functions(&mut self) {
        let top_level: HashSet<NodeId> = match self.ast.kind(self.ast.root).clone() {
            NodeKind::Program { declarations } => declarations.into_iter().collect(),
            _ => HashSet::new(),
        };
        for i in 0..self.ast.len() {
            let id = NodeId(i as u32);
            if matches!(self.ast.kind(id), NodeKind::Function { .. }) && !top_level.contains(&id) && !self.ast.get(id).hoisted {
                self.ast.get_mut(id).hoisted = true;
                self.changes += 1;
            }
        }
    }
}

/// Parses an integer literal's raw lexeme (decimal, `0x`/`0b`/`0o`
/// prefixed) into an `i64`, the same widths the lexer's number scanner
/// accepts. Underscores are stripped defensively even though the grammar
/// doesn't currently emit them, matching the type checker's array-size
/// evaluator.
fn parse_int(text: &str) -> Option<i64> {
    let text = text.replace('_', "");
    if let Some(rest) = text.strip_prefix("0x") {
        return i64::from_str_radix(rest, 16).ok();
    }
    if let Some(rest) = text.strip_prefix("0b") {
        return i64::from_str_radix(rest, 2).ok();
    }
    if let Some(rest) = text.strip_prefix("0o") {
        return i64::from_str_radix(rest, 8).ok();
    }
    text.parse::<i64>().ok()
}

/// Formats a folded float the way a systems-dialect emitter wants to see
/// it: `14` rather than `14.0` is fine for an integer-valued float, since
/// the node still carries `LiteralKind::Float` and the emitter decides the
/// literal suffix.
fn format_float(value: f64) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use crate::resolve::resolve_names;
    use crate::stdlib::default_registry;
    use crate::typeck::check_types;
    use crate::validate::validate;

    fn compile(src: &str) -> (Ast, SymbolTable, PreprocessReport) {
        let tokens = tokenize(src, None).expect("tokenizes");
        let lines: Vec<String> = src.lines().map(|s| s.to_string()).collect();
        let mut ast = parse(tokens, None, &lines).expect("parses");
        let (mut table, errors) = resolve_names(&mut ast);
        assert!(errors.is_empty(), "{errors:?}");
        let (_, errors) = check_types(&mut ast, &mut table);
        assert!(errors.is_empty(), "{errors:?}");
        let errors = validate(&ast);
        assert!(errors.is_empty(), "{errors:?}");
        let registry = default_registry();
        let report = preprocess(&mut ast, &table, &registry);
        (ast, table, report)
    }

    #[test]
    fn constant_folds_arithmetic_with_precedence() {
        let (ast, _, _) = compile("k :: 2 + 3 * 4");
        let NodeKind::Program { declarations } = ast.kind(ast.root).clone() else { panic!() };
        let NodeKind::Const { value, .. } = ast.kind(declarations[0]).clone() else { panic!() };
        assert!(matches!(ast.kind(value), NodeKind::Literal { kind: LiteralKind::Integer, raw_text } if raw_text == "14"));
    }

    #[test]
    fn division_by_zero_is_left_unfolded() {
        let (ast, _, _) = compile("k :: 1 / 0");
        let NodeKind::Program { declarations } = ast.kind(ast.root).clone() else { panic!() };
        let NodeKind::Const { value, .. } = ast.kind(declarations[0]).clone() else { panic!() };
        assert!(matches!(ast.kind(value), NodeKind::Binary { .. }));
    }

    #[test]
    fn pointer_sugar_never_reaches_preprocessing_as_field_access() {
        let (ast, _, _) = compile("main :: fn() { x := 1 p := x.adr y := p.val }");
        for i in 0..ast.len() {
            let id = NodeId(i as u32);
            if let NodeKind::FieldAccess { field, .. } = ast.kind(id) {
                assert!(field != "adr" && field != "val", "parser should already lower pointer sugar");
            }
        }
    }

    #[test]
    fn shadowing_rename_applies_only_to_inner_declaration() {
        let (ast, _, _) = compile("main :: fn() { x := 1\n{ x := 2 } }");
        let NodeKind::Program { declarations } = ast.kind(ast.root).clone() else { panic!() };
        let NodeKind::Function { body: Some(body), .. } = ast.kind(declarations[0]).clone() else { panic!() };
        let NodeKind::Block { statements } = ast.kind(body).clone() else { panic!() };
        let outer = statements[0];
        assert!(ast.get(outer).emit_name.is_none());
        let NodeKind::Block { statements: inner_stmts } = ast.kind(statements[1]).clone() else { panic!() };
        assert_eq!(ast.get(inner_stmts[0]).emit_name.as_deref(), Some("x_1"));
    }

    #[test]
    fn mutation_analysis_marks_assigned_var_mutable() {
        let (ast, _, _) = compile("main :: fn() { x := 1\nx = 2 }");
        let NodeKind::Program { declarations } = ast.kind(ast.root).clone() else { panic!() };
        let NodeKind::Function { body: Some(body), .. } = ast.kind(declarations[0]).clone() else { panic!() };
        let NodeKind::Block { statements } = ast.kind(body).clone() else { panic!() };
        assert!(ast.get(statements[0]).is_mutable);
    }

    #[test]
    fn usage_analysis_marks_referenced_parameter_used() {
        let (ast, _, _) = compile("add :: fn(a: i32, b: i32) i32 { ret a + b }");
        let NodeKind::Program { declarations } = ast.kind(ast.root).clone() else { panic!() };
        let NodeKind::Function { params, .. } = ast.kind(declarations[0]).clone() else { panic!() };
        assert!(ast.get(params[0]).is_used);
        assert!(ast.get(params[1]).is_used);
    }

    #[test]
    fn unused_parameter_is_not_marked_used() {
        let (ast, _, _) = compile("ignore :: fn(a: i32) { }");
        let NodeKind::Program { declarations } = ast.kind(ast.root).clone() else { panic!() };
        let NodeKind::Function { params, .. } = ast.kind(declarations[0]).clone() else { panic!() };
        assert!(!ast.get(params[0]).is_used);
    }

    #[test]
    fn struct_init_positional_fields_get_named() {
        let src = "Point :: struct { x: i32, y: i32 } main :: fn() { p := Point{1, 2} }";
        let (ast, _, _) = compile(src);
        let mut found = false;
        for i in 0..ast.len() {
            if let NodeKind::StructInit { type_name, fields } = ast.kind(NodeId(i as u32)) {
                if type_name == "Point" {
                    found = true;
                    for field in fields {
                        assert!(matches!(ast.kind(*field), NodeKind::FieldInit { name: Some(_), .. }));
                    }
                }
            }
        }
        assert!(found);
    }

    #[test]
    fn oversized_positional_init_is_left_unchanged() {
        let src = "Point :: struct { x: i32 } main :: fn() { p := Point{1, 2} }";
        let tokens = tokenize(src, None).expect("tokenizes");
        let lines: Vec<String> = src.lines().map(|s| s.to_string()).collect();
        let mut ast = parse(tokens, None, &lines).expect("parses");
        let (table, _) = resolve_names(&mut ast);
        let registry = default_registry();
        preprocess(&mut ast, &table, &registry);
        let mut found = false;
        for i in 0..ast.len() {
            if let NodeKind::StructInit { type_name, fields } = ast.kind(NodeId(i as u32)) {
                if type_name == "Point" {
                    found = true;
                    assert!(matches!(ast.kind(fields[0]), NodeKind::FieldInit { name: None, .. }));
                }
            }
        }
        assert!(found);
    }

    #[test]
    fn stdlib_call_gets_canonical_name() {
        let (ast, _, _) = compile("main :: fn() { io.println(\"hi\") }");
        let mut found = false;
        for i in 0..ast.len() {
            if let NodeKind::Call { .. } = ast.kind(NodeId(i as u32)) {
                if let Some(canonical) = &ast.get(NodeId(i as u32)).stdlib_canonical {
                    assert_eq!(canonical, "std.io.println");
                    found = true;
                }
            }
        }
        assert!(found);
    }

    #[test]
    fn nested_function_is_hoisted() {
        let (ast, _, _) = compile("main :: fn() { helper :: fn() { } helper() }");
        let NodeKind::Program { declarations } = ast.kind(ast.root).clone() else { panic!() };
        let NodeKind::Function { body: Some(body), .. } = ast.kind(declarations[0]).clone() else { panic!() };
        let NodeKind::Block { statements } = ast.kind(body).clone() else { panic!() };
        assert!(matches!(ast.kind(statements[0]), NodeKind::Function { .. }));
        assert!(ast.get(statements[0]).hoisted);
        assert!(!ast.get(declarations[0]).hoisted);
    }

    #[test]
    fn idempotent_on_an_already_preprocessed_ast() {
        let src = "Point :: struct { x: i32, y: i32 } main :: fn() { p := Point{1, 2}\nx := 1\nx = 2\nio.println(\"hi\") }";
        let tokens = tokenize(src, None).expect("tokenizes");
        let lines: Vec<String> = src.lines().map(|s| s.to_string()).collect();
        let mut ast = parse(tokens, None, &lines).expect("parses");
        let (mut table, errors) = resolve_names(&mut ast);
        assert!(errors.is_empty(), "{errors:?}");
        let (_, errors) = check_types(&mut ast, &mut table);
        assert!(errors.is_empty(), "{errors:?}");
        let registry = default_registry();
        let first = preprocess(&mut ast, &table, &registry);
        assert!(first.changes_made > 0);
        let second = preprocess(&mut ast, &table, &registry);
        assert_eq!(second.changes_made, 0);
    }
}
