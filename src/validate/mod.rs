//! Phase 3c: semantic validator.
//!
//! Checks that don't need type information: `break`/`continue` only
//! inside a loop, `fall` only inside a match case, `defer` only inside a
//! function body, `del` only on a pointer-typed lvalue (checked once
//! types are known — see the `ref_target` heuristic below), and that a
//! non-void function returns on every path it can fall off the end of.
//!
//! The walk carries its own context (are we inside a loop? a match case?
//! which function's return type applies?) on an explicit stack rather
//! than the host call stack, the same iterative-traversal discipline the
//! resolver and preprocessor use.

use crate::ast::{Ast, NodeId, NodeKind};
use crate::error::{SemanticError, SemanticErrorKind};

pub fn validate(ast: &Ast) -> Vec<SemanticError> {
    let mut validator = Validator { ast, errors: Vec::new() };
    validator.run();
    validator.errors
}

#[derive(Clone, Copy, Default)]
struct Context {
    in_loop: bool,
    in_match_case: bool,
    in_function: bool,
    /// `None` means "void function" (a bare `ret` is fine, `ret expr` is not).
    return_type: Option<()>,
}

struct Validator<'a> {
    ast: &'a Ast,
    errors: Vec<SemanticError>,
}

impl<'a> Validator<'a> {
    fn run(&mut self) {
        let declarations = match self.ast.kind(self.ast.root) {
            NodeKind::Program { declarations } => declarations.clone(),
            _ => return,
        };
        for decl in declarations {
            self.visit_top_level(decl);
        }
    }

    fn error(&mut self, node: NodeId, message: impl Into<String>) {
        let span = self.ast.span(node);
        self.errors.push(SemanticError::new(SemanticErrorKind::Validation, span, message.into()));
    }

    fn visit_top_level(&mut self, decl: NodeId) {
        match self.ast.kind(decl).clone() {
            NodeKind::Function { body: Some(body), return_type, .. } => {
                let ctx = Context {
                    in_function: true,
                    return_type: Some(()).filter(|_| return_type.is_some()),
                    ..Context::default()
                };
                self.visit_block_exhaustive(body, return_type.is_some(), ctx);
            }
            _ => {}
        }
    }

    /// Visits a function body and, if it returns a value, checks that
    /// every control-flow path through it reaches a `RETURN value`.
    fn visit_block_exhaustive(&mut self, body: NodeId, must_return: bool, ctx: Context) {
        let always_returns = self.visit_statement(body, ctx);
        if must_return && !always_returns {
            self.error(body, "Function must return a value on all paths");
        }
    }

    /// Visits a statement, returning `true` if control can never fall
    /// through past it (every path inside it returns, or it's itself a
    /// return/break/continue/fall).
    fn visit_statement(&mut self, id: NodeId, ctx: Context) -> bool {
        match self.ast.kind(id).clone() {
            NodeKind::Block { statements } => {
                let mut returns = false;
                for stmt in statements {
                    if self.visit_statement(stmt, ctx) {
                        returns = true;
                    }
                }
                returns
            }
            NodeKind::IfStmt { then_block, else_block, .. } => {
                let then_returns = self.visit_statement(then_block, ctx);
                let else_returns = else_block.map(|e| self.visit_statement(e, ctx)).unwrap_or(false);
                then_returns && else_returns
            }
            NodeKind::While { body, .. } => {
                let loop_ctx = Context { in_loop: true, ..ctx };
                self.visit_statement(body, loop_ctx);
                false
            }
            NodeKind::For { body, .. } => {
                let loop_ctx = Context { in_loop: true, ..ctx };
                self.visit_statement(body, loop_ctx);
                false
            }
            NodeKind::ForIn { body, .. } | NodeKind::ForInIndexed { body, .. } => {
                let loop_ctx = Context { in_loop: true, ..ctx };
                self.visit_statement(body, loop_ctx);
                false
            }
            NodeKind::Match { cases, else_branch, .. } => {
                let case_ctx = Context { in_match_case: true, ..ctx };
                let mut all_return = !cases.is_empty() || else_branch.is_some();
                for case in &cases {
                    if let NodeKind::CaseBranch { body, .. } = self.ast.kind(*case).clone() {
                        if !self.visit_statement(body, case_ctx) {
                            all_return = false;
                        }
                    }
                }
                match else_branch {
                    Some(e) => {
                        if !self.visit_statement(e, case_ctx) {
                            all_return = false;
                        }
                    }
                    None => all_return = false,
                }
                all_return
            }
            NodeKind::Return { value } => {
                if value.is_some() && ctx.return_type.is_none() {
                    self.error(id, "Void function cannot return a value");
                } else if value.is_none() && ctx.return_type.is_some() {
                    self.error(id, "Function must return a value");
                }
                true
            }
            NodeKind::Break => {
                if !ctx.in_loop {
                    self.error(id, "'break' outside a loop");
                }
                true
            }
            NodeKind::Continue => {
                if !ctx.in_loop {
                    self.error(id, "'continue' outside a loop");
                }
                true
            }
            NodeKind::Fall => {
                if !ctx.in_match_case {
                    self.error(id, "'fall' outside a match case");
                }
                true
            }
            NodeKind::Defer { statement } => {
                if !ctx.in_function {
                    self.error(id, "'defer' outside a function body");
                }
                self.visit_statement(statement, ctx);
                false
            }
            NodeKind::Del { target } => {
                self.check_del_target(id, target);
                false
            }
            NodeKind::Function { body: Some(inner_body), return_type, .. } => {
                let inner_ctx = Context {
                    in_function: true,
                    return_type: Some(()).filter(|_| return_type.is_some()),
                    in_loop: false,
                    in_match_case: false,
                };
                self.visit_block_exhaustive(inner_body, return_type.is_some(), inner_ctx);
                false
            }
            _ => false,
        }
    }

    /// `del` only makes sense on a pointer-typed expression; by the time
    /// the validator runs, type information hasn't been attached yet
    /// (validation precedes type checking in this pipeline — see
    /// `pipeline::run`), so this only rejects lvalue shapes that can
    /// never denote a pointer (literals, calls), leaving the rest to
    /// whichever pass annotates types.
    fn check_del_target(&mut self, del: NodeId, target: NodeId) {
        match self.ast.kind(target) {
            NodeKind::Identifier { .. } | NodeKind::FieldAccess { .. } | NodeKind::Index { .. } | NodeKind::Deref { .. } => {}
            _ => self.error(del, "'del' target must be a pointer lvalue"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn check(src: &str) -> Vec<SemanticError> {
        let tokens = tokenize(src, None).expect("tokenizes");
        let lines: Vec<String> = src.lines().map(|s| s.to_string()).collect();
        let ast = parse(tokens, None, &lines).expect("parses");
        validate(&ast)
    }

    #[test]
    fn break_outside_loop_is_an_error() {
        let errors = check("main :: fn() { break }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("'break' outside a loop"));
    }

    #[test]
    fn break_inside_while_is_fine() {
        let errors = check("main :: fn() { while true { break } }");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn fall_outside_match_is_an_error() {
        let errors = check("main :: fn() { fall }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("'fall' outside a match case"));
    }

    #[test]
    fn non_void_function_must_return_on_all_paths() {
        let errors = check("get :: fn() i32 { if true { ret 1 } }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("must return a value on all paths"));
    }

    #[test]
    fn non_void_function_returning_on_every_branch_is_fine() {
        let errors = check("get :: fn() i32 { if true { ret 1 } else { ret 2 } }");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn void_function_returning_a_value_is_an_error() {
        let errors = check("main :: fn() { ret 1 }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Void function cannot return a value"));
    }
}
