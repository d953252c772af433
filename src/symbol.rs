//! Symbol table: a scope tree plus the symbol records each scope owns.
//!
//! Scopes are homogeneous (`Scope` is the same shape at every level), which
//! is exactly the case `ego_tree::Tree` fits — unlike the AST, whose nodes
//! are heterogeneous per kind. Child scopes reach their parent only through
//! `ego_tree`'s own node-id back-reference; nothing here stores an owning
//! pointer upward.

use std::collections::HashMap;

use ego_tree::{NodeId as ScopeNodeId, Tree};
use serde::{Deserialize, Serialize};

use crate::ast::NodeId;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeKind {
    Module,
    Function,
    Block,
    Loop,
    MatchCase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    Variable,
    Constant,
    Parameter,
    Function,
    Struct,
    Enum,
    Union,
    EnumVariant,
    GenericParam,
    ImportAlias,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub declaration: NodeId,
    pub resolved_type: Option<Type>,
    pub is_public: bool,
}

/// A single scope: an ordered name-to-symbol map plus the markers the
/// semantic validator consults (is this scope inside a loop? a function?).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scope {
    pub kind_slot: Option<ScopeKind>,
    names: Vec<String>,
    bindings: HashMap<String, SymbolId>,
    pub in_loop: bool,
    pub in_function: bool,
    pub in_match_case: bool,
}

impl Scope {
    fn new(kind: ScopeKind, in_loop: bool, in_function: bool, in_match_case: bool) -> Self {
        Scope {
            kind_slot: Some(kind),
            names: Vec::new(),
            bindings: HashMap::new(),
            in_loop,
            in_function,
            in_match_case,
        }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind_slot.expect("scope always initialized with a kind")
    }

    pub fn declare(&mut self, name: &str, id: SymbolId) -> bool {
        if self.bindings.contains_key(name) {
            return false;
        }
        self.names.push(name.to_string());
        self.bindings.insert(name.to_string(), id);
        true
    }

    pub fn get_local(&self, name: &str) -> Option<SymbolId> {
        self.bindings.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// The full symbol table for one compilation unit: the scope tree plus
/// the flat symbol arena every scope's bindings index into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolTable {
    scopes: Tree<Scope>,
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: Tree::new(Scope::new(ScopeKind::Module, false, false, false)),
            symbols: Vec::new(),
        }
    }

    pub fn root(&self) -> ScopeNodeId {
        self.scopes.root().id()
    }

    /// Pushes a child scope under `parent`, inheriting the loop/function/
    /// match-case markers unless this scope itself establishes one.
    pub fn push_scope(&mut self, parent: ScopeNodeId, kind: ScopeKind) -> ScopeNodeId {
        let (parent_in_loop, parent_in_function, parent_in_match_case) = {
            let parent_ref = self.scopes.get(parent).expect("valid parent scope id");
            (
                parent_ref.value().in_loop,
                parent_ref.value().in_function,
                parent_ref.value().in_match_case,
            )
        };
        let in_loop = parent_in_loop || kind == ScopeKind::Loop;
        let in_function = parent_in_function || kind == ScopeKind::Function;
        let in_match_case = matches!(kind, ScopeKind::MatchCase) || (parent_in_match_case && kind == ScopeKind::Block);
        let child = Scope::new(kind, in_loop, in_function, in_match_case);
        let mut parent_mut = self.scopes.get_mut(parent).expect("valid parent scope id");
        parent_mut.append(child).id()
    }

    pub fn scope(&self, id: ScopeNodeId) -> &Scope {
        self.scopes.get(id).expect("valid scope id").value()
    }

    pub fn scope_mut(&mut self, id: ScopeNodeId) -> &mut Scope {
        self.scopes.get_mut(id).expect("valid scope id").into_value()
    }

    pub fn parent_of(&self, id: ScopeNodeId) -> Option<ScopeNodeId> {
        self.scopes.get(id).and_then(|n| n.parent()).map(|n| n.id())
    }

    /// Declares a new symbol in `scope`; returns `None` on a duplicate name
    /// at the same scope level (the caller reports `Duplicate declaration`).
    pub fn declare(
        &mut self,
        scope: ScopeNodeId,
        name: &str,
        kind: SymbolKind,
        declaration: NodeId,
        resolved_type: Option<Type>,
        is_public: bool,
    ) -> Option<SymbolId> {
        let id = SymbolId(self.symbols.len() as u32);
        if !self.scope_mut(scope).declare(name, id) {
            return None;
        }
        self.symbols.push(Symbol {
            id,
            name: name.to_string(),
            kind,
            declaration,
            resolved_type,
            is_public,
        });
        Some(id)
    }

    /// Nearest-scope-first lookup, walking parent links to the root.
    pub fn lookup(&self, scope: ScopeNodeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(s) = current {
            if let Some(id) = self.scope(s).get_local(name) {
                return Some(id);
            }
            current = self.parent_of(s);
        }
        None
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeId;

    #[test]
    fn nearest_scope_wins_on_shadowing() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let outer = table.declare(root, "x", SymbolKind::Variable, NodeId(0), None, false).unwrap();
        let block = table.push_scope(root, ScopeKind::Block);
        let inner = table.declare(block, "x", SymbolKind::Variable, NodeId(1), None, false).unwrap();

        assert_eq!(table.lookup(block, "x"), Some(inner));
        assert_eq!(table.lookup(root, "x"), Some(outer));
    }

    #[test]
    fn duplicate_declaration_in_same_scope_rejected() {
        let mut table = SymbolTable::new();
        let root = table.root();
        assert!(table.declare(root, "x", SymbolKind::Variable, NodeId(0), None, false).is_some());
        assert!(table.declare(root, "x", SymbolKind::Variable, NodeId(1), None, false).is_none());
    }

    #[test]
    fn loop_marker_propagates_to_nested_blocks() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let loop_scope = table.push_scope(root, ScopeKind::Loop);
        let body = table.push_scope(loop_scope, ScopeKind::Block);
        assert!(table.scope(body).in_loop);
        assert!(!table.scope(root).in_loop);
    }
}
