//! Phase 3a: name resolution.
//!
//! Two passes over the program: first every top-level declaration is
//! registered in the module scope so forward references between
//! functions, structs, enums, unions and consts all resolve regardless of
//! declaration order; then each declaration's body is walked, pushing a
//! scope per function/block/loop/match-case and binding every
//! `IDENTIFIER`/`TYPE_IDENTIFIER` it finds to the nearest matching symbol.
//!
//! The walk itself never recurses on the host stack for expression trees
//! — only the handful of statement-level entry points (function bodies,
//! nested function statements) do, and that nesting is bounded by source
//! structure, not by expression depth. Expression subtrees are resolved
//! with a flat `Vec`-backed stack driven by [`Ast::structural_children`].

use ego_tree::NodeId as ScopeNodeId;

use crate::ast::{Ast, NodeId, NodeKind};
use crate::error::{SemanticError, SemanticErrorKind};
use crate::stdlib::{default_registry, StdlibRegistry};
use crate::symbol::{ScopeKind, SymbolKind, SymbolTable};

pub fn resolve_names(ast: &mut Ast) -> (SymbolTable, Vec<SemanticError>) {
    let mut resolver = Resolver {
        ast,
        table: SymbolTable::new(),
        errors: Vec::new(),
        registry: default_registry(),
    };
    resolver.run();
    (resolver.table, resolver.errors)
}

struct Resolver<'a> {
    ast: &'a mut Ast,
    table: SymbolTable,
    errors: Vec<SemanticError>,
    /// Call targets that name a stdlib module or builtin (`io.println`,
    /// bare `println`) reference no declared symbol and are exempted from
    /// "undefined name" reporting here; `preprocess` resolves them against
    /// the same registry once semantic analysis has passed.
    registry: StdlibRegistry,
}

impl<'a> Resolver<'a> {
    fn run(&mut self) {
        let root = self.ast.root;
        let declarations = match self.ast.kind(root) {
            NodeKind::Program { declarations } => declarations.clone(),
            _ => return,
        };
        let module_scope = self.table.root();
        for decl in &declarations {
            self.declare_top_level(*decl, module_scope);
        }
        for decl in &declarations {
            self.resolve_declaration_body(*decl, module_scope);
        }
    }

    fn error(&mut self, node: NodeId, message: impl Into<String>) {
        let span = self.ast.span(node);
        self.errors.push(SemanticError::new(SemanticErrorKind::NameResolution, span, message.into()));
    }

    /// Declares `name` in `scope`, pointing the symbol's `declaration` at
    /// `node`. When `node` is itself the declaring construct (a `VAR`,
    /// `PARAMETER`, `FUNCTION`, ...) this also stamps `resolved_symbol`
    /// back onto that node, so the type checker can later look up "my own
    /// symbol" without a second table scan. For declarations with no
    /// single dedicated node (a `FOR_IN`'s bound names), the stamp is
    /// harmless but unused.
    fn declare_or_error(
        &mut self,
        scope: ScopeNodeId,
        node: NodeId,
        name: &str,
        kind: SymbolKind,
        is_public: bool,
    ) {
        match self.table.declare(scope, name, kind, node, None, is_public) {
            Some(sym) => self.ast.get_mut(node).resolved_symbol = Some(sym),
            None => self.error(node, format!("Duplicate declaration of '{name}'")),
        }
    }

    fn declare_top_level(&mut self, decl: NodeId, scope: ScopeNodeId) {
        match self.ast.kind(decl).clone() {
            NodeKind::Struct { name, .. } => self.declare_or_error(scope, decl, &name, SymbolKind::Struct, true),
            NodeKind::Enum { name, .. } => self.declare_or_error(scope, decl, &name, SymbolKind::Enum, true),
            NodeKind::Union { name, .. } => self.declare_or_error(scope, decl, &name, SymbolKind::Union, true),
            NodeKind::Function { name: Some(name), .. } => {
                self.declare_or_error(scope, decl, &name, SymbolKind::Function, true)
            }
            NodeKind::Function { name: None, .. } => {}
            NodeKind::Const { name, .. } => self.declare_or_error(scope, decl, &name, SymbolKind::Constant, true),
            NodeKind::Var { name, .. } => self.declare_or_error(scope, decl, &name, SymbolKind::Variable, true),
            NodeKind::Import { path, alias } => {
                let name = alias.unwrap_or_else(|| path.rsplit('.').next().unwrap_or(&path).to_string());
                self.declare_or_error(scope, decl, &name, SymbolKind::ImportAlias, false);
            }
            _ => {}
        }
    }

    fn resolve_declaration_body(&mut self, decl: NodeId, scope: ScopeNodeId) {
        match self.ast.kind(decl).clone() {
            NodeKind::Function { .. } => self.resolve_function(decl, scope),
            NodeKind::Const { value, .. } => self.resolve_expr_tree(value, scope),
            NodeKind::Var { explicit_type, value, .. } => {
                if let Some(t) = explicit_type {
                    self.resolve_expr_tree(t, scope);
                }
                self.resolve_expr_tree(value, scope);
            }
            NodeKind::Struct { fields, .. } | NodeKind::Union { fields, .. } => {
                for field in fields {
                    self.resolve_expr_tree(field, scope);
                }
            }
            NodeKind::Enum { variants, .. } => {
                for variant in variants {
                    if let NodeKind::EnumVariant { value: Some(v), .. } = self.ast.kind(variant).clone() {
                        self.resolve_expr_tree(v, scope);
                    }
                }
            }
            _ => {}
        }
    }

    fn resolve_function(&mut self, func_id: NodeId, parent_scope: ScopeNodeId) {
        let scope = self.table.push_scope(parent_scope, ScopeKind::Function);
        let (generic_params, params, return_type, body) = match self.ast.kind(func_id).clone() {
            NodeKind::Function { generic_params, params, return_type, body, .. } => {
                (generic_params, params, return_type, body)
            }
            _ => return,
        };
        for gp in &generic_params {
            if let NodeKind::GenericParam { name } = self.ast.kind(*gp).clone() {
                self.declare_or_error(scope, *gp, &name, SymbolKind::GenericParam, false);
            }
        }
        for param in &params {
            if let NodeKind::Parameter { name, type_node } = self.ast.kind(*param).clone() {
                self.declare_or_error(scope, *param, &name, SymbolKind::Parameter, false);
                self.resolve_expr_tree(type_node, scope);
            }
        }
        if let Some(rt) = return_type {
            self.resolve_expr_tree(rt, scope);
        }
        if let Some(body) = body {
            self.resolve_block(body, scope);
        }
    }

    fn resolve_block(&mut self, block_id: NodeId, parent_scope: ScopeNodeId) {
        let scope = self.table.push_scope(parent_scope, ScopeKind::Block);
        let statements = match self.ast.kind(block_id).clone() {
            NodeKind::Block { statements } => statements,
            _ => return,
        };
        for stmt in statements {
            self.resolve_statement(stmt, scope);
        }
    }

    /// Resolves `id` as a statement, pushing its own block scope first if
    /// it is itself a `BLOCK` (the single-statement arm of an `if`/`while`
    /// without braces still gets a scope of its own).
    fn resolve_body_stmt(&mut self, id: NodeId, scope: ScopeNodeId) {
        if matches!(self.ast.kind(id), NodeKind::Block { .. }) {
            self.resolve_block(id, scope);
        } else {
            self.resolve_statement(id, scope);
        }
    }

    fn resolve_statement(&mut self, id: NodeId, scope: ScopeNodeId) {
        match self.ast.kind(id).clone() {
            NodeKind::Var { name, explicit_type, value } => {
                self.resolve_expr_tree(value, scope);
                if let Some(t) = explicit_type {
                    self.resolve_expr_tree(t, scope);
                }
                self.declare_or_error(scope, id, &name, SymbolKind::Variable, false);
            }
            NodeKind::Const { name, value } => {
                self.resolve_expr_tree(value, scope);
                self.declare_or_error(scope, id, &name, SymbolKind::Constant, false);
            }
            NodeKind::Struct { name, fields, .. } => {
                for field in &fields {
                    self.resolve_expr_tree(*field, scope);
                }
                self.declare_or_error(scope, id, &name, SymbolKind::Struct, false);
            }
            NodeKind::Block { .. } => self.resolve_block(id, scope),
            NodeKind::IfStmt { condition, then_block, else_block } => {
                self.resolve_expr_tree(condition, scope);
                self.resolve_body_stmt(then_block, scope);
                if let Some(e) = else_block {
                    self.resolve_body_stmt(e, scope);
                }
            }
            NodeKind::While { condition, body } => {
                self.resolve_expr_tree(condition, scope);
                let loop_scope = self.table.push_scope(scope, ScopeKind::Loop);
                self.resolve_body_stmt(body, loop_scope);
            }
            NodeKind::For { init, condition, update, body } => {
                let for_scope = self.table.push_scope(scope, ScopeKind::Loop);
                if let Some(i) = init {
                    self.resolve_statement(i, for_scope);
                }
                if let Some(c) = condition {
                    self.resolve_expr_tree(c, for_scope);
                }
                if let Some(u) = update {
                    self.resolve_statement(u, for_scope);
                }
                self.resolve_body_stmt(body, for_scope);
            }
            NodeKind::ForIn { iterator, iterable, body } => {
                self.resolve_expr_tree(iterable, scope);
                let loop_scope = self.table.push_scope(scope, ScopeKind::Loop);
                self.declare_or_error(loop_scope, id, &iterator, SymbolKind::Variable, false);
                self.resolve_body_stmt(body, loop_scope);
            }
            NodeKind::ForInIndexed { index_name, value_name, iterable, body } => {
                self.resolve_expr_tree(iterable, scope);
                let loop_scope = self.table.push_scope(scope, ScopeKind::Loop);
                self.declare_or_error(loop_scope, id, &index_name, SymbolKind::Variable, false);
                self.declare_or_error(loop_scope, id, &value_name, SymbolKind::Variable, false);
                self.resolve_body_stmt(body, loop_scope);
            }
            NodeKind::Match { scrutinee, cases, else_branch } => {
                self.resolve_expr_tree(scrutinee, scope);
                for case in cases {
                    let case_scope = self.table.push_scope(scope, ScopeKind::MatchCase);
                    if let NodeKind::CaseBranch { patterns, body } = self.ast.kind(case).clone() {
                        for pattern in patterns {
                            self.resolve_pattern(pattern, case_scope, case);
                        }
                        self.resolve_body_stmt(body, case_scope);
                    }
                }
                if let Some(e) = else_branch {
                    let else_scope = self.table.push_scope(scope, ScopeKind::MatchCase);
                    self.resolve_body_stmt(e, else_scope);
                }
            }
            NodeKind::Return { value } => {
                if let Some(v) = value {
                    self.resolve_expr_tree(v, scope);
                }
            }
            NodeKind::Break | NodeKind::Continue | NodeKind::Fall => {}
            NodeKind::Defer { statement } => self.resolve_statement(statement, scope),
            NodeKind::Del { target } => self.resolve_expr_tree(target, scope),
            NodeKind::ExpressionStmt { expression } => self.resolve_expr_tree(expression, scope),
            NodeKind::Assignment { target, value, .. } => {
                self.resolve_expr_tree(target, scope);
                self.resolve_expr_tree(value, scope);
            }
            NodeKind::Function { name, .. } => {
                if let Some(name) = name {
                    self.declare_or_error(scope, id, &name, SymbolKind::Function, false);
                }
                self.resolve_function(id, scope);
            }
            _ => {}
        }
    }

    /// A pattern binds a fresh name in `PATTERN_IDENTIFIER`; everything
    /// else only references existing names (literals, enum variant tags).
    fn resolve_pattern(&mut self, pattern: NodeId, scope: ScopeNodeId, case: NodeId) {
        match self.ast.kind(pattern).clone() {
            NodeKind::PatternIdentifier { name } => {
                self.declare_or_error(scope, case, &name, SymbolKind::Variable, false);
            }
            NodeKind::PatternLiteral { literal } => self.resolve_expr_tree(literal, scope),
            NodeKind::PatternRange { start, end } => {
                self.resolve_expr_tree(start, scope);
                self.resolve_expr_tree(end, scope);
            }
            NodeKind::PatternEnum { .. } => {}
            _ => {}
        }
    }

    /// Binds every `IDENTIFIER`/`TYPE_IDENTIFIER` reachable from `root`,
    /// using an explicit stack rather than host recursion — expression
    /// trees are exactly the deeply-nested case the traversal contract
    /// rules out relying on the call stack for.
    fn resolve_expr_tree(&mut self, root: NodeId, scope: ScopeNodeId) {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match self.ast.kind(node).clone() {
                NodeKind::Identifier { name } => match self.table.lookup(scope, &name) {
                    Some(symbol) => self.ast.get_mut(node).resolved_symbol = Some(symbol),
                    None => self.error(node, format!("Undefined name '{name}'")),
                },
                NodeKind::TypeIdentifier { name } => match self.lookup_nominal(scope, &name) {
                    Some(symbol) => self.ast.get_mut(node).resolved_symbol = Some(symbol),
                    None => self.error(node, format!("Undefined type '{name}'")),
                },
                NodeKind::StructInit { type_name, .. } => {
                    if self.lookup_nominal(scope, &type_name).is_none() {
                        self.error(node, format!("Undefined type '{type_name}'"));
                    }
                }
                NodeKind::Call { callee, args } => {
                    if !self.is_stdlib_callee(callee) {
                        stack.push(callee);
                    }
                    stack.extend(args);
                    continue;
                }
                _ => {}
            }
            stack.extend(self.ast.structural_children(node));
        }
    }

    /// Whether `callee` names a registered stdlib builtin (`println`) or a
    /// `module.function` stdlib call (`io.println`). Such names never get
    /// a module-scope declaration, so the generic identifier walk must not
    /// visit them.
    fn is_stdlib_callee(&self, callee: NodeId) -> bool {
        match self.ast.kind(callee).clone() {
            NodeKind::Identifier { name } => self.registry.resolve_builtin(&name).is_some(),
            NodeKind::FieldAccess { base, field } => match self.ast.kind(base) {
                NodeKind::Identifier { name } => self.registry.resolve_call(name, &field).is_some(),
                _ => false,
            },
            _ => false,
        }
    }

    fn lookup_nominal(&self, scope: ScopeNodeId, name: &str) -> Option<crate::symbol::SymbolId> {
        let symbol = self.table.lookup(scope, name)?;
        let kind = self.table.symbol(symbol).kind;
        matches!(kind, SymbolKind::Struct | SymbolKind::Enum | SymbolKind::Union).then_some(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn resolve(src: &str) -> (SymbolTable, Vec<SemanticError>) {
        let tokens = tokenize(src, None).expect("tokenizes");
        let lines: Vec<String> = src.lines().map(|s| s.to_string()).collect();
        let mut ast = parse(tokens, None, &lines).expect("parses");
        resolve_names(&mut ast)
    }

    #[test]
    fn resolves_local_variable_reference() {
        let (_, errors) = resolve("main :: fn() { x := 1 y := x }");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn reports_undefined_name() {
        let (_, errors) = resolve("main :: fn() { y := x }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Undefined name 'x'"));
    }

    #[test]
    fn forward_reference_to_later_function_resolves() {
        let (_, errors) = resolve("main :: fn() { helper() } helper :: fn() { }");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn duplicate_top_level_declaration_reported() {
        let (_, errors) = resolve("dup :: fn() { } dup :: fn() { }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Duplicate declaration of 'dup'"));
    }

    #[test]
    fn shadowing_inner_block_is_not_a_duplicate() {
        let (_, errors) = resolve("main :: fn() { x := 1 if true { x := 2 } }");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn for_in_binds_iterator_name() {
        let (_, errors) = resolve("main :: fn() { items := 1 for item in items { y := item } }");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn type_identifier_resolves_against_nominal_symbols_only() {
        let (_, errors) = resolve("Point :: struct { x: i32 } make :: fn(p: Point) { }");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn type_identifier_referencing_a_function_is_an_error() {
        let (_, errors) = resolve("notype :: fn() { } make :: fn(p: notype) { }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Undefined type 'notype'"));
    }

    #[test]
    fn qualified_stdlib_call_does_not_need_a_declared_module() {
        let (_, errors) = resolve(r#"main :: fn() { io.println("hi") }"#);
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn bare_stdlib_builtin_call_does_not_need_a_declaration() {
        let (_, errors) = resolve("main :: fn() { x := sqrt_f64(2.0) }");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn a_field_access_on_an_unrelated_unknown_name_is_still_reported() {
        let (_, errors) = resolve("main :: fn() { y := missing.field }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Undefined name 'missing'"));
    }
}
