//! The AST: a flat arena of nodes indexed by [`NodeId`].
//!
//! The source grammar's "one record, many optional fields" node shape is
//! represented here as a common header plus a [`NodeKind`] enum whose
//! variants carry exactly the fields they use. Substructure is expressed as
//! `NodeId`/`Vec<NodeId>` edges into the same arena rather than owned boxes,
//! so the tree has no ownership cycles and later passes can replace a node
//! in place by index without disturbing anyone holding its id.

pub mod kind;

pub use kind::{AssignOp, BinaryOp, LiteralKind, NodeKind, UnaryOp};

use serde::{Deserialize, Serialize};

use crate::span::Span;
use crate::symbol::SymbolId;
use crate::types::Type;

/// An index into an [`Ast`]'s node arena. Stable across mutation: replacing
/// a node's contents (constant folding, sugar lowering) keeps its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Header fields shared by every node kind, annotated in place by the
/// later passes (type checker, preprocessor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub span: Span,
    pub kind: NodeKind,
    pub resolved_type: Option<Type>,
    /// For `IDENTIFIER`/`TYPE_IDENTIFIER` nodes: the symbol the name resolver
    /// bound this reference to.
    pub resolved_symbol: Option<SymbolId>,
    pub is_mutable: bool,
    pub is_used: bool,
    pub emit_name: Option<String>,
    pub hoisted: bool,
    pub stdlib_canonical: Option<String>,
    pub is_public: bool,
}

impl NodeData {
    fn new(span: Span, kind: NodeKind) -> Self {
        NodeData {
            span,
            kind,
            resolved_type: None,
            resolved_symbol: None,
            is_mutable: false,
            is_used: false,
            emit_name: None,
            hoisted: false,
            stdlib_canonical: None,
            is_public: false,
        }
    }
}

/// The AST arena. Owns every node produced by the parser for one
/// compilation unit; `root` names the `PROGRAM` node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ast {
    nodes: Vec<NodeData>,
    pub root: NodeId,
}

impl Ast {
    /// An arena with no nodes yet. The parser allocates declarations
    /// bottom-up and only knows the `PROGRAM` node's contents once every
    /// child has been parsed, so the root is set via [`Ast::set_root`]
    /// once parsing completes rather than fixed at construction time.
    pub fn empty() -> Self {
        Ast {
            nodes: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    /// Allocates a new node and returns its id.
    pub fn alloc(&mut self, span: Span, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData::new(span, kind));
        id
    }

    pub fn get(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.get(id).span
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.get(id).kind
    }

    /// Replaces a node's kind and span in place, preserving its id and
    /// letting already-held ids keep pointing at the (now different) node.
    /// Used by constant folding and field-sugar lowering.
    pub fn replace(&mut self, id: NodeId, span: Span, kind: NodeKind) {
        let data = self.get_mut(id);
        data.span = span;
        data.kind = kind;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The direct structural children of `id`, in source order. This is
    /// the generic-walk surface every iterative pass (mutation/usage/
    /// shadowing analysis, bottom-up transforms) drives off of, replacing
    /// the dynamic-attribute iteration a duck-typed AST would rely on.
    pub fn structural_children(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id).kind.structural_children()
    }
}
