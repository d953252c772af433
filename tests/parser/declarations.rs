//! Top-level declaration grammar: `Name :: ...` and `Name := expr`, never
//! the bare `fn`/`struct` spelling a C-family reader might expect.

use a7c::ast::NodeKind;
use a7c::lexer::tokenize;
use a7c::parser::parse;

fn parse_source(src: &str) -> a7c::ast::Ast {
    let tokens = tokenize(src, None).expect("tokenizes");
    parse(tokens, None, &[]).expect("parses")
}

#[test]
fn function_declaration_uses_double_colon() {
    let ast = parse_source("main :: fn() {}");
    let NodeKind::Program { declarations } = ast.kind(ast.root) else { panic!("not a program") };
    assert_eq!(declarations.len(), 1);
    let NodeKind::Function { name, params, .. } = ast.kind(declarations[0]) else { panic!("not a function") };
    assert_eq!(name.as_deref(), Some("main"));
    assert!(params.is_empty());
}

#[test]
fn bare_fn_without_a_name_is_rejected() {
    let tokens = tokenize("fn() {}", None).expect("tokenizes");
    let result = parse(tokens, None, &[]);
    assert!(result.is_err(), "C-style bare fn declarations are not valid A7 syntax");
}

#[test]
fn struct_declaration_uses_double_colon() {
    let ast = parse_source("Point :: struct { x: i32, y: i32 }");
    let NodeKind::Program { declarations } = ast.kind(ast.root) else { panic!("not a program") };
    let NodeKind::Struct { name, fields, .. } = ast.kind(declarations[0]) else { panic!("not a struct") };
    assert_eq!(name, "Point");
    assert_eq!(fields.len(), 2);
}

#[test]
fn top_level_var_uses_walrus_style_declare() {
    let ast = parse_source("count := 0");
    let NodeKind::Program { declarations } = ast.kind(ast.root) else { panic!("not a program") };
    assert!(matches!(ast.kind(declarations[0]), NodeKind::Var { .. }));
}

#[test]
fn const_declaration_folds_into_a_const_node() {
    let ast = parse_source("pi :: 3");
    let NodeKind::Program { declarations } = ast.kind(ast.root) else { panic!("not a program") };
    let NodeKind::Const { name, .. } = ast.kind(declarations[0]) else { panic!("not a const") };
    assert_eq!(name, "pi");
}

#[test]
fn deeply_nested_if_else_does_not_overflow_the_parser_stack() {
    let mut src = String::from("main :: fn() {\n");
    for _ in 0..400 {
        src.push_str("if true {\n");
    }
    src.push_str("ret 0\n");
    for _ in 0..400 {
        src.push_str("}\n");
    }
    src.push_str("}\n");
    let tokens = tokenize(&src, None).expect("tokenizes");
    let _ = parse(tokens, None, &[]).expect("deep nesting parses without a stack overflow");
}
