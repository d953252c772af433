//! Expression precedence and the struct-literal/block disambiguation rule.

use a7c::ast::{BinaryOp, NodeKind};
use a7c::lexer::tokenize;
use a7c::parser::parse;

fn parse_expr_body(expr_src: &str) -> a7c::ast::Ast {
    let src = format!("main :: fn() {{ result := {expr_src} }}");
    let tokens = tokenize(&src, None).expect("tokenizes");
    parse(tokens, None, &[]).expect("parses")
}

fn value_node(ast: &a7c::ast::Ast) -> a7c::ast::NodeId {
    let NodeKind::Program { declarations } = ast.kind(ast.root) else { panic!("not a program") };
    let NodeKind::Function { body, .. } = ast.kind(declarations[0]) else { panic!("not a function") };
    let NodeKind::Block { statements } = ast.kind(body.unwrap()) else { panic!("not a block") };
    let NodeKind::Var { value, .. } = ast.kind(statements[0]) else { panic!("not a var") };
    *value
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let ast = parse_expr_body("1 + 2 * 3");
    let root = value_node(&ast);
    let NodeKind::Binary { op, left, right } = ast.kind(root) else { panic!("not binary") };
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(ast.kind(*left), NodeKind::Literal { .. }));
    assert!(matches!(ast.kind(*right), NodeKind::Binary { op: BinaryOp::Mul, .. }));
}

#[test]
fn comparison_binds_looser_than_arithmetic() {
    let ast = parse_expr_body("1 + 2 == 3");
    let root = value_node(&ast);
    assert!(matches!(ast.kind(root), NodeKind::Binary { op: BinaryOp::Eq, .. }));
}

#[test]
fn and_binds_tighter_than_or() {
    let ast = parse_expr_body("true or false and true");
    let root = value_node(&ast);
    let NodeKind::Binary { op, right, .. } = ast.kind(root) else { panic!("not binary") };
    assert_eq!(*op, BinaryOp::Or);
    assert!(matches!(ast.kind(*right), NodeKind::Binary { op: BinaryOp::And, .. }));
}

#[test]
fn struct_literal_after_identifier_parses_as_a_struct_init() {
    let ast = parse_expr_body("Point{ x: 1, y: 2 }");
    let root = value_node(&ast);
    assert!(matches!(ast.kind(root), NodeKind::StructInit { .. }));
}

#[test]
fn identifier_brace_after_if_is_a_block_not_a_struct_literal() {
    let src = "main :: fn() { if Flag { ret 1 } }";
    let tokens = tokenize(src, None).expect("tokenizes");
    let ast = parse(tokens, None, &[]).expect("parses");
    let NodeKind::Program { declarations } = ast.kind(ast.root) else { panic!("not a program") };
    let NodeKind::Function { body, .. } = ast.kind(declarations[0]) else { panic!("not a function") };
    let NodeKind::Block { statements } = ast.kind(body.unwrap()) else { panic!("not a block") };
    let NodeKind::IfStmt { condition, .. } = ast.kind(statements[0]) else { panic!("not an if") };
    assert!(matches!(ast.kind(*condition), NodeKind::Identifier { .. }));
}
