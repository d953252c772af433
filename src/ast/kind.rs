//! Node-kind variants and their per-kind fields.

use serde::{Deserialize, Serialize};

use super::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    Integer,
    Float,
    Boolean,
    Char,
    String,
    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
}

/// The discriminated payload of an AST node. Every variant listed in the
/// data model has a corresponding entry here; `structural_children`
/// provides the generic child-walk the preprocessor's passes drive off of.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    Program {
        declarations: Vec<NodeId>,
    },
    Import {
        path: String,
        alias: Option<String>,
    },
    Const {
        name: String,
        value: NodeId,
    },
    Var {
        name: String,
        explicit_type: Option<NodeId>,
        value: NodeId,
    },
    Function {
        name: Option<String>,
        generic_params: Vec<NodeId>,
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: Option<NodeId>,
    },
    Parameter {
        name: String,
        type_node: NodeId,
    },
    GenericParam {
        name: String,
    },
    Struct {
        name: String,
        generic_params: Vec<NodeId>,
        fields: Vec<NodeId>,
    },
    Enum {
        name: String,
        variants: Vec<NodeId>,
    },
    EnumVariant {
        name: String,
        value: Option<NodeId>,
    },
    Union {
        name: String,
        fields: Vec<NodeId>,
        is_tagged: bool,
    },
    Field {
        name: String,
        type_node: NodeId,
    },
    Block {
        statements: Vec<NodeId>,
    },
    IfStmt {
        condition: NodeId,
        then_block: NodeId,
        else_block: Option<NodeId>,
    },
    IfExpr {
        condition: NodeId,
        then_block: NodeId,
        else_block: NodeId,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
    For {
        init: Option<NodeId>,
        condition: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ForIn {
        iterator: String,
        iterable: NodeId,
        body: NodeId,
    },
    ForInIndexed {
        index_name: String,
        value_name: String,
        iterable: NodeId,
        body: NodeId,
    },
    Match {
        scrutinee: NodeId,
        cases: Vec<NodeId>,
        else_branch: Option<NodeId>,
    },
    CaseBranch {
        patterns: Vec<NodeId>,
        body: NodeId,
    },
    PatternLiteral {
        literal: NodeId,
    },
    PatternIdentifier {
        name: String,
    },
    PatternEnum {
        enum_name: String,
        variant_name: String,
    },
    PatternRange {
        start: NodeId,
        end: NodeId,
    },
    Return {
        value: Option<NodeId>,
    },
    Break,
    Continue,
    Fall,
    Defer {
        statement: NodeId,
    },
    Del {
        target: NodeId,
    },
    ExpressionStmt {
        expression: NodeId,
    },
    Assignment {
        target: NodeId,
        op: AssignOp,
        value: NodeId,
    },
    Literal {
        kind: LiteralKind,
        raw_text: String,
    },
    Identifier {
        name: String,
    },
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Call {
        callee: NodeId,
        args: Vec<NodeId>,
    },
    Index {
        base: NodeId,
        index: NodeId,
    },
    Slice {
        base: NodeId,
        start: Option<NodeId>,
        end: Option<NodeId>,
    },
    FieldAccess {
        base: NodeId,
        field: String,
    },
    AddressOf {
        operand: NodeId,
    },
    Deref {
        operand: NodeId,
    },
    Cast {
        target_type: NodeId,
        value: NodeId,
    },
    NewExpr {
        target_type: NodeId,
    },
    StructInit {
        type_name: String,
        fields: Vec<NodeId>,
    },
    FieldInit {
        name: Option<String>,
        value: NodeId,
    },
    ArrayInit {
        elements: Vec<NodeId>,
    },
    TypePrimitive {
        name: String,
    },
    TypeIdentifier {
        name: String,
    },
    TypeArray {
        element: NodeId,
        size: NodeId,
    },
    TypeSlice {
        element: NodeId,
    },
    TypePointer {
        target: NodeId,
    },
    TypeFunction {
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
    },
    TypeStruct {
        fields: Vec<NodeId>,
    },
    TypeGeneric {
        name: String,
    },
}

impl NodeKind {
    /// A human-readable discriminant name, used by `--format json` output
    /// and by diagnostics that reference "a CALL node" etc.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Program { .. } => "PROGRAM",
            NodeKind::Import { .. } => "IMPORT",
            NodeKind::Const { .. } => "CONST",
            NodeKind::Var { .. } => "VAR",
            NodeKind::Function { .. } => "FUNCTION",
            NodeKind::Parameter { .. } => "PARAMETER",
            NodeKind::GenericParam { .. } => "GENERIC_PARAM",
            NodeKind::Struct { .. } => "STRUCT",
            NodeKind::Enum { .. } => "ENUM",
            NodeKind::EnumVariant { .. } => "ENUM_VARIANT",
            NodeKind::Union { .. } => "UNION",
            NodeKind::Field { .. } => "FIELD",
            NodeKind::Block { .. } => "BLOCK",
            NodeKind::IfStmt { .. } => "IF_STMT",
            NodeKind::IfExpr { .. } => "IF_EXPR",
            NodeKind::While { .. } => "WHILE",
            NodeKind::For { .. } => "FOR",
            NodeKind::ForIn { .. } => "FOR_IN",
            NodeKind::ForInIndexed { .. } => "FOR_IN_INDEXED",
            NodeKind::Match { .. } => "MATCH",
            NodeKind::CaseBranch { .. } => "CASE_BRANCH",
            NodeKind::PatternLiteral { .. } => "PATTERN_LITERAL",
            NodeKind::PatternIdentifier { .. } => "PATTERN_IDENTIFIER",
            NodeKind::PatternEnum { .. } => "PATTERN_ENUM",
            NodeKind::PatternRange { .. } => "PATTERN_RANGE",
            NodeKind::Return { .. } => "RETURN",
            NodeKind::Break => "BREAK",
            NodeKind::Continue => "CONTINUE",
            NodeKind::Fall => "FALL",
            NodeKind::Defer { .. } => "DEFER",
            NodeKind::Del { .. } => "DEL",
            NodeKind::ExpressionStmt { .. } => "EXPRESSION_STMT",
            NodeKind::Assignment { .. } => "ASSIGNMENT",
            NodeKind::Literal { .. } => "LITERAL",
            NodeKind::Identifier { .. } => "IDENTIFIER",
            NodeKind::Binary { .. } => "BINARY",
            NodeKind::Unary { .. } => "UNARY",
            NodeKind::Call { .. } => "CALL",
            NodeKind::Index { .. } => "INDEX",
            NodeKind::Slice { .. } => "SLICE",
            NodeKind::FieldAccess { .. } => "FIELD_ACCESS",
            NodeKind::AddressOf { .. } => "ADDRESS_OF",
            NodeKind::Deref { .. } => "DEREF",
            NodeKind::Cast { .. } => "CAST",
            NodeKind::NewExpr { .. } => "NEW_EXPR",
            NodeKind::StructInit { .. } => "STRUCT_INIT",
            NodeKind::FieldInit { .. } => "FIELD_INIT",
            NodeKind::ArrayInit { .. } => "ARRAY_INIT",
            NodeKind::TypePrimitive { .. } => "TYPE_PRIMITIVE",
            NodeKind::TypeIdentifier { .. } => "TYPE_IDENTIFIER",
            NodeKind::TypeArray { .. } => "TYPE_ARRAY",
            NodeKind::TypeSlice { .. } => "TYPE_SLICE",
            NodeKind::TypePointer { .. } => "TYPE_POINTER",
            NodeKind::TypeFunction { .. } => "TYPE_FUNCTION",
            NodeKind::TypeStruct { .. } => "TYPE_STRUCT",
            NodeKind::TypeGeneric { .. } => "TYPE_GENERIC",
        }
    }

    /// Direct structural (AST-owned) children, in source order. This is
    /// consulted by every generic iterative walk; it deliberately omits
    /// type-annotation edges that point at shared type nodes already
    /// reachable elsewhere only when that would create a double-visit
    /// hazard — in practice every edge here is a genuine tree edge.
    pub fn structural_children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Program { declarations } => declarations.clone(),
            NodeKind::Import { .. } => vec![],
            NodeKind::Const { value, .. } => vec![*value],
            NodeKind::Var {
                explicit_type,
                value,
                ..
            } => opt_then(*explicit_type, vec![*value]),
            NodeKind::Function {
                generic_params,
                params,
                return_type,
                body,
                ..
            } => {
                let mut children = generic_params.clone();
                children.extend(params.iter().copied());
                if let Some(rt) = return_type {
                    children.push(*rt);
                }
                if let Some(b) = body {
                    children.push(*b);
                }
                children
            }
            NodeKind::Parameter { type_node, .. } => vec![*type_node],
            NodeKind::GenericParam { .. } => vec![],
            NodeKind::Struct {
                generic_params,
                fields,
                ..
            } => {
                let mut children = generic_params.clone();
                children.extend(fields.iter().copied());
                children
            }
            NodeKind::Enum { variants, .. } => variants.clone(),
            NodeKind::EnumVariant { value, .. } => opt_vec(*value),
            NodeKind::Union { fields, .. } => fields.clone(),
            NodeKind::Field { type_node, .. } => vec![*type_node],
            NodeKind::Block { statements } => statements.clone(),
            NodeKind::IfStmt {
                condition,
                then_block,
                else_block,
            } => opt_then(*else_block, vec![*condition, *then_block]),
            NodeKind::IfExpr {
                condition,
                then_block,
                else_block,
            } => vec![*condition, *then_block, *else_block],
            NodeKind::While { condition, body } => vec![*condition, *body],
            NodeKind::For {
                init,
                condition,
                update,
                body,
            } => {
                let mut children = Vec::new();
                children.extend(init.iter().copied());
                children.extend(condition.iter().copied());
                children.extend(update.iter().copied());
                children.push(*body);
                children
            }
            NodeKind::ForIn { iterable, body, .. } => vec![*iterable, *body],
            NodeKind::ForInIndexed { iterable, body, .. } => vec![*iterable, *body],
            NodeKind::Match {
                scrutinee,
                cases,
                else_branch,
            } => {
                let mut children = vec![*scrutinee];
                children.extend(cases.iter().copied());
                children.extend(else_branch.iter().copied());
                children
            }
            NodeKind::CaseBranch { patterns, body } => {
                let mut children = patterns.clone();
                children.push(*body);
                children
            }
            NodeKind::PatternLiteral { literal } => vec![*literal],
            NodeKind::PatternIdentifier { .. } => vec![],
            NodeKind::PatternEnum { .. } => vec![],
            NodeKind::PatternRange { start, end } => vec![*start, *end],
            NodeKind::Return { value } => opt_vec(*value),
            NodeKind::Break | NodeKind::Continue | NodeKind::Fall => vec![],
            NodeKind::Defer { statement } => vec![*statement],
            NodeKind::Del { target } => vec![*target],
            NodeKind::ExpressionStmt { expression } => vec![*expression],
            NodeKind::Assignment { target, value, .. } => vec![*target, *value],
            NodeKind::Literal { .. } => vec![],
            NodeKind::Identifier { .. } => vec![],
            NodeKind::Binary { left, right, .. } => vec![*left, *right],
            NodeKind::Unary { operand, .. } => vec![*operand],
            NodeKind::Call { callee, args } => {
                let mut children = vec![*callee];
                children.extend(args.iter().copied());
                children
            }
            NodeKind::Index { base, index } => vec![*base, *index],
            NodeKind::Slice { base, start, end } => {
                let mut children = vec![*base];
                children.extend(start.iter().copied());
                children.extend(end.iter().copied());
                children
            }
            NodeKind::FieldAccess { base, .. } => vec![*base],
            NodeKind::AddressOf { operand } => vec![*operand],
            NodeKind::Deref { operand } => vec![*operand],
            NodeKind::Cast { target_type, value } => vec![*target_type, *value],
            NodeKind::NewExpr { target_type } => vec![*target_type],
            NodeKind::StructInit { fields, .. } => fields.clone(),
            NodeKind::FieldInit { value, .. } => vec![*value],
            NodeKind::ArrayInit { elements } => elements.clone(),
            NodeKind::TypePrimitive { .. } => vec![],
            NodeKind::TypeIdentifier { .. } => vec![],
            NodeKind::TypeArray { element, size } => vec![*element, *size],
            NodeKind::TypeSlice { element } => vec![*element],
            NodeKind::TypePointer { target } => vec![*target],
            NodeKind::TypeFunction {
                params,
                return_type,
            } => {
                let mut children = params.clone();
                children.extend(return_type.iter().copied());
                children
            }
            NodeKind::TypeStruct { fields } => fields.clone(),
            NodeKind::TypeGeneric { .. } => vec![],
        }
    }
}

fn opt_vec(id: Option<NodeId>) -> Vec<NodeId> {
    id.into_iter().collect()
}

fn opt_then(id: Option<NodeId>, mut rest: Vec<NodeId>) -> Vec<NodeId> {
    rest.extend(id);
    rest
}
