//! Phase 2: recursive-descent parser.
//!
//! Builds a [`crate::ast::Ast`] from a token stream using ordinary
//! Rust-stack recursion — unlike every later pass, which walks an
//! already-built tree and must do so iteratively, the parser's own
//! recursion depth is bounded by source nesting, and the host stack
//! comfortably covers it.

use crate::ast::{Ast, AssignOp, BinaryOp, LiteralKind, NodeId, NodeKind, UnaryOp};
use crate::error::ParseError;
use crate::span::Span;
use crate::token::{is_primitive_type_keyword, Token, TokenKind};

const MAX_DECLARATION_ITERATIONS: usize = 1000;
const MAX_SYNCHRONIZE_SKIP: usize = 100;
const STRUCT_LITERAL_LOOKBACK: usize = 8;

/// Parses a complete token stream into an AST. `filename`/`source_lines`
/// are accepted for parity with the driver-to-core contract; the parser
/// itself only needs them to build a richer eventual diagnostic once it is
/// rendered (spans already carry line/column independent of the text).
pub fn parse(
    tokens: Vec<Token>,
    _filename: Option<&str>,
    _source_lines: &[String],
) -> Result<Ast, ParseError> {
    Parser::new(tokens).parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
    ast: Ast,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        let mut parser = Parser {
            tokens,
            position: 0,
            ast: Ast::empty(),
        };
        parser.skip_terminators();
        parser
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn peek(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.position + offset)
            .unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn check_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current().kind)
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, ParseError> {
        if !self.check(kind) {
            return Err(self.error_at_current(message));
        }
        Ok(self.advance())
    }

    fn error_at_current(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.current().span(), message.into())
    }

    fn skip_terminators(&mut self) {
        while self.check(TokenKind::Terminator) {
            self.advance();
        }
    }

    fn at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// Looks back up to [`STRUCT_LITERAL_LOOKBACK`] tokens for one of
    /// `if`/`while`/`for`/`match`/`else`; if found, a following `Name{`
    /// is the start of that construct's block, not a struct literal.
    fn should_parse_struct_literal(&self) -> bool {
        let lookback = STRUCT_LITERAL_LOOKBACK.min(self.position);
        for i in 1..=lookback {
            if self.position < i {
                break;
            }
            let prev = &self.tokens[self.position - i];
            if matches!(
                prev.kind,
                TokenKind::If | TokenKind::While | TokenKind::For | TokenKind::Match | TokenKind::Else
            ) {
                return false;
            }
        }
        true
    }

    // ---- top level ----------------------------------------------------

    fn parse_program(mut self) -> Result<Ast, ParseError> {
        let mut declarations = Vec::new();
        self.skip_terminators();

        let mut iterations = 0;
        while !self.at_end() && iterations < MAX_DECLARATION_ITERATIONS {
            iterations += 1;
            let prev_position = self.position;

            match self.parse_declaration() {
                Ok(Some(decl)) => {
                    declarations.push(decl);
                    self.skip_terminators();
                    if self.position <= prev_position && !self.at_end() {
                        self.advance();
                    }
                }
                Ok(None) => {
                    self.skip_terminators();
                }
                Err(e) => {
                    if declarations.is_empty() {
                        return Err(e);
                    }
                    if declarations.len() == 1 && e.message.contains("Expected declaration") {
                        return Err(self.error_at_current(format!(
                            "Unexpected token '{}' after parsing complete program",
                            self.current().lexeme
                        )));
                    }
                    if e.message.contains("Expected expression after") {
                        return Err(e);
                    }
                    self.synchronize();
                    if self.position <= prev_position && !self.at_end() {
                        self.advance();
                    }
                }
            }
        }

        if !self.at_end() {
            return Err(self.error_at_current(format!(
                "Unexpected token '{}' after parsing complete program",
                self.current().lexeme
            )));
        }

        let span = declarations
            .first()
            .map(|d| self.ast.span(*d))
            .unwrap_or_else(|| Span::point(1, 1));
        let root = self.ast.alloc(span, NodeKind::Program { declarations });
        self.ast.set_root(root);
        Ok(self.ast)
    }

    fn synchronize(&mut self) {
        let mut skipped = 0;
        while !self.at_end() && skipped < MAX_SYNCHRONIZE_SKIP {
            if self.check(TokenKind::Terminator) {
                self.advance();
                return;
            }
            if self.check_any(&[TokenKind::Fn, TokenKind::Struct, TokenKind::Enum, TokenKind::Pub, TokenKind::Import]) {
                return;
            }
            if self.check(TokenKind::Identifier)
                && matches!(self.peek(1).kind, TokenKind::DeclareConst | TokenKind::DeclareVar)
            {
                return;
            }
            self.advance();
            skipped += 1;
        }
        if skipped >= MAX_SYNCHRONIZE_SKIP && !self.at_end() {
            self.position = self.tokens.len() - 1;
        }
    }

    fn parse_declaration(&mut self) -> Result<Option<NodeId>, ParseError> {
        self.skip_terminators();
        if self.at_end() {
            return Ok(None);
        }

        let mut is_public = false;
        if self.check(TokenKind::Pub) {
            is_public = true;
            self.advance();
        }

        if self.check(TokenKind::Import) {
            return self.parse_import(is_public).map(Some);
        }

        if self.check(TokenKind::Identifier) {
            match self.peek(1).kind {
                TokenKind::DeclareConst => return self.parse_const_or_type_decl(is_public).map(Some),
                TokenKind::DeclareVar => return self.parse_var_decl(is_public).map(Some),
                _ => {}
            }
        }

        if self.check(TokenKind::Fn) {
            let tok = self.advance();
            return Err(ParseError::new(tok.span(), "Function declarations must have names"));
        }

        Err(self.error_at_current("Expected declaration (constant, variable, or function)"))
    }

    fn parse_import(&mut self, is_public: bool) -> Result<NodeId, ParseError> {
        let _ = is_public;
        let import_tok = self.consume(TokenKind::Import, "Expected 'import'")?;
        if self.check(TokenKind::StringLiteral) {
            let path_tok = self.advance();
            let path = strip_quotes(&path_tok.lexeme);
            return Ok(self.ast.alloc(import_tok.span(), NodeKind::Import { path, alias: None }));
        }
        Err(self.error_at_current("Expected module path after import"))
    }

    fn parse_const_or_type_decl(&mut self, is_public: bool) -> Result<NodeId, ParseError> {
        let name_tok = self.consume(TokenKind::Identifier, "Expected identifier")?;
        let name = name_tok.lexeme.clone();
        self.consume(TokenKind::DeclareConst, "Expected '::'")?;

        if self.check(TokenKind::Fn) {
            return self.parse_function_decl(Some(name), is_public, name_tok.span());
        }
        if self.check(TokenKind::Struct) {
            return self.parse_struct_decl(name, is_public, name_tok.span());
        }
        if self.check(TokenKind::Enum) {
            return self.parse_enum_decl(name, is_public, name_tok.span());
        }
        if self.check(TokenKind::Union) {
            return self.parse_union_decl(name, is_public, name_tok.span());
        }
        if self.check(TokenKind::Import) {
            self.advance();
            if self.check(TokenKind::StringLiteral) {
                let path_tok = self.advance();
                let path = strip_quotes(&path_tok.lexeme);
                return Ok(self.ast.alloc(
                    name_tok.span(),
                    NodeKind::Import {
                        path,
                        alias: Some(name),
                    },
                ));
            }
            return Err(self.error_at_current("Expected module path after import"));
        }

        let value = self.parse_expression()?;
        Ok(self.ast.alloc(name_tok.span(), NodeKind::Const { name, value }))
    }

    fn parse_var_decl(&mut self, is_public: bool) -> Result<NodeId, ParseError> {
        let _ = is_public;
        let name_tok = self.consume(TokenKind::Identifier, "Expected identifier")?;
        self.consume(TokenKind::DeclareVar, "Expected ':='")?;
        let value = self.parse_expression()?;
        Ok(self.ast.alloc(
            name_tok.span(),
            NodeKind::Var {
                name: name_tok.lexeme,
                explicit_type: None,
                value,
            },
        ))
    }

    fn parse_function_decl(
        &mut self,
        name: Option<String>,
        is_public: bool,
        span: Span,
    ) -> Result<NodeId, ParseError> {
        let _ = is_public;
        self.consume(TokenKind::Fn, "Expected 'fn'")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'fn'")?;
        let (generic_params, params) = self.parse_mixed_parameters()?;

        let mut return_type = None;
        if !self.check(TokenKind::LeftBrace) && self.starts_type() {
            return_type = Some(self.parse_type()?);
        }

        if !self.check(TokenKind::LeftBrace) {
            return Err(self.error_at_current("Expected function body after function signature"));
        }
        let body = self.parse_block()?;

        Ok(self.ast.alloc(
            span,
            NodeKind::Function {
                name,
                generic_params,
                params,
                return_type,
                body: Some(body),
            },
        ))
    }

    fn parse_mixed_parameters(&mut self) -> Result<(Vec<NodeId>, Vec<NodeId>), ParseError> {
        let mut generic_params = Vec::new();
        let mut params = Vec::new();

        while !self.check(TokenKind::RightParen) && !self.at_end() {
            self.skip_terminators();
            if self.check(TokenKind::RightParen) {
                break;
            }
            if self.check(TokenKind::GenericType) {
                let tok = self.advance();
                let name = tok.lexeme.trim_start_matches('$').to_string();
                generic_params.push(self.ast.alloc(tok.span(), NodeKind::GenericParam { name }));
            } else {
                params.push(self.parse_parameter()?);
            }

            if self.check(TokenKind::Comma) {
                self.advance();
            } else if !self.check(TokenKind::RightParen) {
                break;
            }
        }

        self.skip_terminators();
        self.consume(TokenKind::RightParen, "Expected ')'")?;
        Ok((generic_params, params))
    }

    fn parse_generic_parameters(&mut self) -> Result<Vec<NodeId>, ParseError> {
        let mut params = Vec::new();
        self.consume(TokenKind::LeftParen, "Expected '('")?;
        while !self.check(TokenKind::RightParen) && !self.at_end() {
            if self.check(TokenKind::GenericType) {
                let tok = self.advance();
                let name = tok.lexeme.trim_start_matches('$').to_string();
                params.push(self.ast.alloc(tok.span(), NodeKind::GenericParam { name }));
            }
            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')'")?;
        Ok(params)
    }

    fn parse_parameter(&mut self) -> Result<NodeId, ParseError> {
        let name_tok = self.consume(TokenKind::Identifier, "Expected parameter name")?;
        self.consume(TokenKind::Colon, "Expected ':' after parameter name")?;
        let type_node = self.parse_type()?;
        Ok(self.ast.alloc(
            name_tok.span(),
            NodeKind::Parameter {
                name: name_tok.lexeme,
                type_node,
            },
        ))
    }

    fn starts_type(&self) -> bool {
        is_primitive_type_keyword(self.current().kind)
            || matches!(
                self.current().kind,
                TokenKind::Identifier
                    | TokenKind::GenericType
                    | TokenKind::Ref
                    | TokenKind::LeftBracket
                    | TokenKind::Fn
                    | TokenKind::Struct
            )
    }

    fn parse_type(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span();

        if self.check(TokenKind::Ref) {
            self.advance();
            let target = self.parse_type()?;
            return Ok(self.ast.alloc(start, NodeKind::TypePointer { target }));
        }

        if self.check(TokenKind::LeftBracket) {
            self.advance();
            let size = if !self.check(TokenKind::RightBracket) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.consume(TokenKind::RightBracket, "Expected ']'")?;
            let element = self.parse_type()?;
            return Ok(match size {
                Some(size) => self.ast.alloc(start, NodeKind::TypeArray { element, size }),
                None => self.ast.alloc(start, NodeKind::TypeSlice { element }),
            });
        }

        if self.check(TokenKind::Fn) {
            self.advance();
            self.consume(TokenKind::LeftParen, "Expected '(' in function type")?;
            let mut params = Vec::new();
            if !self.check(TokenKind::RightParen) {
                params.push(self.parse_type()?);
                while self.check(TokenKind::Comma) {
                    self.advance();
                    params.push(self.parse_type()?);
                }
            }
            self.consume(TokenKind::RightParen, "Expected ')' in function type")?;
            let return_type = if self.starts_type() { Some(self.parse_type()?) } else { None };
            return Ok(self.ast.alloc(start, NodeKind::TypeFunction { params, return_type }));
        }

        if self.check(TokenKind::GenericType) {
            let tok = self.advance();
            let name = tok.lexeme.trim_start_matches('$').to_string();
            return Ok(self.ast.alloc(start, NodeKind::TypeGeneric { name }));
        }

        if self.check(TokenKind::Struct) {
            self.advance();
            self.consume(TokenKind::LeftBrace, "Expected '{' in inline struct type")?;
            let mut fields = Vec::new();
            while !self.check(TokenKind::RightBrace) && !self.at_end() {
                self.skip_terminators();
                if self.check(TokenKind::RightBrace) {
                    break;
                }
                let field_name = self.consume(TokenKind::Identifier, "Expected field name")?;
                self.consume(TokenKind::Colon, "Expected ':' after field name")?;
                let field_type = self.parse_type()?;
                fields.push(self.ast.alloc(
                    field_name.span(),
                    NodeKind::Field {
                        name: field_name.lexeme,
                        type_node: field_type,
                    },
                ));
                if self.check(TokenKind::Comma) {
                    self.advance();
                }
                self.skip_terminators();
            }
            self.consume(TokenKind::RightBrace, "Expected '}'")?;
            return Ok(self.ast.alloc(start, NodeKind::TypeStruct { fields }));
        }

        if self.check(TokenKind::Identifier) {
            let tok = self.advance();
            return Ok(self.ast.alloc(start, NodeKind::TypeIdentifier { name: tok.lexeme }));
        }

        if is_primitive_type_keyword(self.current().kind) {
            let tok = self.advance();
            return Ok(self.ast.alloc(start, NodeKind::TypePrimitive { name: tok.lexeme }));
        }

        Err(self.error_at_current("Expected type"))
    }

    // ---- statements -----------------------------------------------------

    fn parse_block(&mut self) -> Result<NodeId, ParseError> {
        let start = self.consume(TokenKind::LeftBrace, "Expected '{'")?;
        let mut statements = Vec::new();
        self.skip_terminators();

        while !self.check(TokenKind::RightBrace) && !self.at_end() {
            if let Some(stmt) = self.parse_statement()? {
                statements.push(stmt);
            }
            self.skip_terminators();
        }

        let end = self.consume(TokenKind::RightBrace, "Expected '}'")?;
        Ok(self.ast.alloc(start.span().merge(end.span()), NodeKind::Block { statements }))
    }

    fn parse_statement(&mut self) -> Result<Option<NodeId>, ParseError> {
        let start = self.current().span();

        if self.check(TokenKind::Ret) {
            self.advance();
            let value = if !self.check_any(&[TokenKind::Terminator, TokenKind::RightBrace]) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            return Ok(Some(self.ast.alloc(start, NodeKind::Return { value })));
        }

        if self.check(TokenKind::Break) {
            self.advance();
            return Ok(Some(self.ast.alloc(start, NodeKind::Break)));
        }
        if self.check(TokenKind::Continue) {
            self.advance();
            return Ok(Some(self.ast.alloc(start, NodeKind::Continue)));
        }
        if self.check(TokenKind::Fall) {
            self.advance();
            return Ok(Some(self.ast.alloc(start, NodeKind::Fall)));
        }

        if self.check(TokenKind::Match) {
            return self.parse_match_statement().map(Some);
        }
        if self.check(TokenKind::Defer) {
            self.advance();
            let statement = self.parse_statement()?.ok_or_else(|| {
                ParseError::new(start, "Expected statement after 'defer'")
            })?;
            return Ok(Some(self.ast.alloc(start, NodeKind::Defer { statement })));
        }
        if self.check(TokenKind::Del) {
            self.advance();
            let target = self.parse_expression()?;
            return Ok(Some(self.ast.alloc(start, NodeKind::Del { target })));
        }
        if self.check(TokenKind::If) {
            return self.parse_if_statement().map(Some);
        }
        if self.check(TokenKind::While) {
            return self.parse_while_statement().map(Some);
        }
        if self.check(TokenKind::For) {
            return self.parse_for_statement().map(Some);
        }
        if self.check(TokenKind::LeftBrace) {
            return self.parse_block().map(Some);
        }

        if self.check(TokenKind::Identifier) {
            match self.peek(1).kind {
                TokenKind::DeclareVar => {
                    let name_tok = self.advance();
                    self.consume(TokenKind::DeclareVar, "Expected ':='")?;
                    let value = self.parse_expression()?;
                    return Ok(Some(self.ast.alloc(
                        name_tok.span(),
                        NodeKind::Var {
                            name: name_tok.lexeme,
                            explicit_type: None,
                            value,
                        },
                    )));
                }
                TokenKind::Colon => {
                    let name_tok = self.advance();
                    self.consume(TokenKind::Colon, "Expected ':'")?;
                    let explicit_type = self.parse_type()?;
                    self.consume(TokenKind::Assign, "Expected '=' after explicit type")?;
                    let value = self.parse_expression()?;
                    return Ok(Some(self.ast.alloc(
                        name_tok.span(),
                        NodeKind::Var {
                            name: name_tok.lexeme,
                            explicit_type: Some(explicit_type),
                            value,
                        },
                    )));
                }
                TokenKind::DeclareConst => {
                    let name_tok = self.advance();
                    self.consume(TokenKind::DeclareConst, "Expected '::'")?;
                    let name = name_tok.lexeme.clone();
                    if self.check(TokenKind::Fn) {
                        return self.parse_function_decl(Some(name), false, name_tok.span()).map(Some);
                    }
                    if self.check(TokenKind::Struct) {
                        return self.parse_struct_decl(name, false, name_tok.span()).map(Some);
                    }
                    if self.check(TokenKind::Enum) {
                        return self.parse_enum_decl(name, false, name_tok.span()).map(Some);
                    }
                    if self.check(TokenKind::Union) {
                        return self.parse_union_decl(name, false, name_tok.span()).map(Some);
                    }
                    let value = self.parse_expression()?;
                    return Ok(Some(self.ast.alloc(name_tok.span(), NodeKind::Const { name, value })));
                }
                _ => {}
            }
        }

        self.parse_expression_or_assignment().map(Some)
    }

    fn parse_if_statement(&mut self) -> Result<NodeId, ParseError> {
        let start = self.consume(TokenKind::If, "Expected 'if'")?.span();
        let condition = self.parse_expression()?;
        let then_block = self.parse_statement()?.ok_or_else(|| ParseError::new(start, "Expected statement after 'if' condition"))?;

        let else_block = if self.check(TokenKind::Else) {
            self.advance();
            Some(self.parse_statement()?.ok_or_else(|| ParseError::new(start, "Expected statement after 'else'"))?)
        } else {
            None
        };

        Ok(self.ast.alloc(
            start,
            NodeKind::IfStmt {
                condition,
                then_block,
                else_block,
            },
        ))
    }

    fn parse_while_statement(&mut self) -> Result<NodeId, ParseError> {
        let start = self.consume(TokenKind::While, "Expected 'while'")?.span();
        let condition = self.parse_expression()?;
        let body = self.parse_statement()?.ok_or_else(|| ParseError::new(start, "Expected statement after 'while' condition"))?;
        Ok(self.ast.alloc(start, NodeKind::While { condition, body }))
    }

    fn parse_for_statement(&mut self) -> Result<NodeId, ParseError> {
        let start = self.consume(TokenKind::For, "Expected 'for'")?.span();

        if self.check(TokenKind::LeftBrace) {
            let body = self.parse_block()?;
            return Ok(self.ast.alloc(
                start,
                NodeKind::For {
                    init: None,
                    condition: None,
                    update: None,
                    body,
                },
            ));
        }

        if self.check(TokenKind::Identifier) {
            let first = self.advance();

            if self.check(TokenKind::Comma) {
                self.advance();
                let second = self.consume(TokenKind::Identifier, "Expected identifier after comma in for loop")?;
                self.consume(TokenKind::In, "Expected 'in' keyword in for loop")?;
                let iterable = self.parse_expression()?;
                let body = self.parse_block()?;
                return Ok(self.ast.alloc(
                    start,
                    NodeKind::ForInIndexed {
                        index_name: first.lexeme,
                        value_name: second.lexeme,
                        iterable,
                        body,
                    },
                ));
            }

            if self.check(TokenKind::In) {
                self.advance();
                let iterable = self.parse_expression()?;
                let body = self.parse_block()?;
                return Ok(self.ast.alloc(
                    start,
                    NodeKind::ForIn {
                        iterator: first.lexeme,
                        iterable,
                        body,
                    },
                ));
            }

            // C-style: backtrack to the identifier and parse init;cond;update.
            self.position -= 1;

            let init = if self.peek(1).kind == TokenKind::DeclareVar {
                let name_tok = self.advance();
                self.consume(TokenKind::DeclareVar, "Expected ':='")?;
                let value = self.parse_expression()?;
                Some(self.ast.alloc(
                    name_tok.span(),
                    NodeKind::Var {
                        name: name_tok.lexeme,
                        explicit_type: None,
                        value,
                    },
                ))
            } else {
                Some(self.parse_expression_or_assignment()?)
            };

            self.consume(TokenKind::Terminator, "Expected ';' or newline in for loop")?;
            let condition = Some(self.parse_expression()?);
            self.consume(TokenKind::Terminator, "Expected ';' or newline in for loop")?;
            let update = Some(self.parse_expression_or_assignment()?);
            let body = self.parse_block()?;

            return Ok(self.ast.alloc(
                start,
                NodeKind::For {
                    init,
                    condition,
                    update,
                    body,
                },
            ));
        }

        Err(self.error_at_current("Expected identifier or '{' after 'for' keyword"))
    }

    fn parse_expression_or_assignment(&mut self) -> Result<NodeId, ParseError> {
        let expr = self.parse_expression()?;

        const ASSIGN_OPS: &[(TokenKind, AssignOp)] = &[
            (TokenKind::Assign, AssignOp::Assign),
            (TokenKind::PlusAssign, AssignOp::AddAssign),
            (TokenKind::MinusAssign, AssignOp::SubAssign),
            (TokenKind::StarAssign, AssignOp::MulAssign),
            (TokenKind::SlashAssign, AssignOp::DivAssign),
            (TokenKind::PercentAssign, AssignOp::ModAssign),
            (TokenKind::AmpersandAssign, AssignOp::AndAssign),
            (TokenKind::PipeAssign, AssignOp::OrAssign),
            (TokenKind::CaretAssign, AssignOp::XorAssign),
            (TokenKind::LeftShiftAssign, AssignOp::ShlAssign),
            (TokenKind::RightShiftAssign, AssignOp::ShrAssign),
        ];

        if let Some((_, op)) = ASSIGN_OPS.iter().find(|(k, _)| self.check(*k)) {
            let op = *op;
            self.advance();
            let value = self.parse_expression()?;
            let span = self.ast.span(expr);
            return Ok(self.ast.alloc(span, NodeKind::Assignment { target: expr, op, value }));
        }

        if !self.is_valid_expression_statement(expr) {
            let span = self.ast.span(expr);
            return match self.ast.kind(expr) {
                NodeKind::Identifier { name } => {
                    if self.current().kind.is_literal() {
                        Err(ParseError::new(span, "Missing assignment operator (:= or =) between identifier and value"))
                    } else {
                        Err(ParseError::new(span, format!("Identifier '{name}' cannot be used as a statement")))
                    }
                }
                other => Err(ParseError::new(span, format!("Expression of type {} cannot be used as a statement", other.tag()))),
            };
        }

        let span = self.ast.span(expr);
        Ok(self.ast.alloc(span, NodeKind::ExpressionStmt { expression: expr }))
    }

    fn is_valid_expression_statement(&self, expr: NodeId) -> bool {
        !matches!(self.ast.kind(expr), NodeKind::Literal { .. } | NodeKind::Identifier { .. })
    }

    // ---- expressions ----------------------------------------------------

    fn parse_expression(&mut self) -> Result<NodeId, ParseError> {
        self.parse_binary_expression(0)
    }

    fn parse_binary_expression(&mut self, min_precedence: u8) -> Result<NodeId, ParseError> {
        let mut left = self.parse_unary_expression()?;

        loop {
            let Some(op) = binary_op_for(self.current().kind) else { break };
            let precedence = binary_precedence(op);
            if precedence < min_precedence {
                break;
            }

            let op_tok = self.advance();
            if self.at_end()
                || self.check_any(&[
                    TokenKind::Terminator,
                    TokenKind::RightParen,
                    TokenKind::RightBrace,
                    TokenKind::RightBracket,
                    TokenKind::Comma,
                ])
            {
                return Err(ParseError::new(
                    self.current().span(),
                    format!("Expected expression after '{}' operator", op_tok.lexeme),
                ));
            }

            let right = self.parse_binary_expression(precedence + 1)?;
            let span = self.ast.span(left).merge(self.ast.span(right));
            left = self.ast.alloc(span, NodeKind::Binary { op, left, right });
        }

        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span();
        let op = match self.current().kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary_expression()?;
            return Ok(self.ast.alloc(start, NodeKind::Unary { op, operand }));
        }

        self.parse_postfix_expression()
    }

    fn parse_postfix_expression(&mut self) -> Result<NodeId, ParseError> {
        let mut expr = self.parse_primary_expression()?;

        loop {
            if self.check(TokenKind::LeftParen) {
                expr = self.parse_call_expression(expr)?;
            } else if self.check(TokenKind::LeftBracket) {
                expr = self.parse_index_expression(expr)?;
            } else if self.check(TokenKind::Dot) {
                expr = self.parse_field_or_deref_expression(expr)?;
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_call_expression(&mut self, callee: NodeId) -> Result<NodeId, ParseError> {
        let span = self.ast.span(callee);
        self.consume(TokenKind::LeftParen, "Expected '('")?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            args.push(self.parse_expression()?);
            while self.check(TokenKind::Comma) {
                self.advance();
                args.push(self.parse_expression()?);
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')'")?;
        Ok(self.ast.alloc(span, NodeKind::Call { callee, args }))
    }

    fn parse_index_expression(&mut self, base: NodeId) -> Result<NodeId, ParseError> {
        let span = self.ast.span(base);
        self.consume(TokenKind::LeftBracket, "Expected '['")?;

        if self.check(TokenKind::DotDot) {
            self.advance();
            let end = if !self.check(TokenKind::RightBracket) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.consume(TokenKind::RightBracket, "Expected ']'")?;
            return Ok(self.ast.alloc(span, NodeKind::Slice { base, start: None, end }));
        }

        let index = self.parse_expression()?;

        if self.check(TokenKind::DotDot) {
            self.advance();
            let end = if !self.check(TokenKind::RightBracket) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.consume(TokenKind::RightBracket, "Expected ']'")?;
            return Ok(self.ast.alloc(
                span,
                NodeKind::Slice {
                    base,
                    start: Some(index),
                    end,
                },
            ));
        }

        self.consume(TokenKind::RightBracket, "Expected ']'")?;
        Ok(self.ast.alloc(span, NodeKind::Index { base, index }))
    }

    fn parse_field_or_deref_expression(&mut self, base: NodeId) -> Result<NodeId, ParseError> {
        let span = self.ast.span(base);
        self.consume(TokenKind::Dot, "Expected '.'")?;
        let field_tok = self.consume(TokenKind::Identifier, "Expected field name after '.'")?;

        Ok(match field_tok.lexeme.as_str() {
            "adr" => self.ast.alloc(span, NodeKind::AddressOf { operand: base }),
            "val" => self.ast.alloc(span, NodeKind::Deref { operand: base }),
            _ => self.ast.alloc(
                span,
                NodeKind::FieldAccess {
                    base,
                    field: field_tok.lexeme,
                },
            ),
        })
    }

    fn parse_primary_expression(&mut self) -> Result<NodeId, ParseError> {
        let start_tok = self.current().clone();

        if start_tok.kind.is_literal() {
            self.advance();
            return Ok(self.alloc_literal(&start_tok));
        }

        if self.check(TokenKind::LeftBracket) {
            return self.parse_array_literal();
        }

        if self.check(TokenKind::New) {
            self.advance();
            let target_type = self.parse_type()?;
            return Ok(self.ast.alloc(start_tok.span(), NodeKind::NewExpr { target_type }));
        }

        if self.check(TokenKind::Identifier) {
            let name = self.advance().lexeme;

            if name == "cast" && self.check(TokenKind::LeftParen) {
                return self.parse_cast_expression(start_tok.span());
            }

            if self.check(TokenKind::LeftBrace) && self.should_parse_struct_literal() {
                return self.parse_struct_literal(name, start_tok.span());
            }

            return Ok(self.ast.alloc(start_tok.span(), NodeKind::Identifier { name }));
        }

        if self.check(TokenKind::LeftParen) {
            self.advance();
            let expr = self.parse_expression()?;
            self.consume(TokenKind::RightParen, "Expected ')'")?;
            return Ok(expr);
        }

        if self.check(TokenKind::If) {
            return self.parse_if_expression();
        }

        Err(self.error_at_current("Expected expression"))
    }

    fn alloc_literal(&mut self, tok: &Token) -> NodeId {
        let kind = match tok.kind {
            TokenKind::IntegerLiteral => LiteralKind::Integer,
            TokenKind::FloatLiteral => LiteralKind::Float,
            TokenKind::StringLiteral => LiteralKind::String,
            TokenKind::CharLiteral => LiteralKind::Char,
            TokenKind::TrueLiteral | TokenKind::FalseLiteral => LiteralKind::Boolean,
            TokenKind::NilLiteral => LiteralKind::Nil,
            _ => unreachable!("alloc_literal called on a non-literal token"),
        };
        self.ast.alloc(
            tok.span(),
            NodeKind::Literal {
                kind,
                raw_text: tok.lexeme.clone(),
            },
        )
    }

    fn parse_cast_expression(&mut self, span: Span) -> Result<NodeId, ParseError> {
        self.advance(); // '('
        let target_type = self.parse_type()?;
        self.consume(TokenKind::Comma, "Expected ',' after type in cast expression")?;
        let value = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after cast expression")?;
        Ok(self.ast.alloc(span, NodeKind::Cast { target_type, value }))
    }

    fn parse_if_expression(&mut self) -> Result<NodeId, ParseError> {
        let start = self.consume(TokenKind::If, "Expected 'if'")?.span();
        let condition = self.parse_expression()?;
        self.consume(TokenKind::LeftBrace, "Expected '{' in if expression")?;
        let then_block = self.parse_expression()?;
        self.consume(TokenKind::RightBrace, "Expected '}' in if expression")?;

        self.consume(TokenKind::Else, "Expected 'else' in if expression")?;
        self.consume(TokenKind::LeftBrace, "Expected '{' in if expression")?;
        let else_block = self.parse_expression()?;
        self.consume(TokenKind::RightBrace, "Expected '}' in if expression")?;

        Ok(self.ast.alloc(
            start,
            NodeKind::IfExpr {
                condition,
                then_block,
                else_block,
            },
        ))
    }

    fn parse_array_literal(&mut self) -> Result<NodeId, ParseError> {
        let start = self.consume(TokenKind::LeftBracket, "Expected '['")?.span();
        let mut elements = Vec::new();

        if !self.check(TokenKind::RightBracket) {
            elements.push(self.parse_expression()?);
            while self.check(TokenKind::Comma) {
                self.advance();
                if self.check(TokenKind::RightBracket) {
                    break;
                }
                elements.push(self.parse_expression()?);
            }
        }

        self.consume(TokenKind::RightBracket, "Expected ']'")?;
        Ok(self.ast.alloc(start, NodeKind::ArrayInit { elements }))
    }

    fn parse_struct_literal(&mut self, type_name: String, span: Span) -> Result<NodeId, ParseError> {
        self.consume(TokenKind::LeftBrace, "Expected '{'")?;
        let mut fields = Vec::new();
        self.skip_terminators();

        if !self.check(TokenKind::RightBrace) {
            let named = self.check(TokenKind::Identifier) && self.peek(1).kind == TokenKind::Colon;

            loop {
                let field = if named {
                    let name_tok = self.consume(TokenKind::Identifier, "Expected field name")?;
                    self.consume(TokenKind::Colon, "Expected ':' after field name")?;
                    let value = self.parse_expression()?;
                    self.ast.alloc(
                        name_tok.span(),
                        NodeKind::FieldInit {
                            name: Some(name_tok.lexeme),
                            value,
                        },
                    )
                } else {
                    let value = self.parse_expression()?;
                    let value_span = self.ast.span(value);
                    self.ast.alloc(value_span, NodeKind::FieldInit { name: None, value })
                };
                fields.push(field);

                if self.check(TokenKind::Comma) {
                    self.advance();
                    self.skip_terminators();
                    if self.check(TokenKind::RightBrace) {
                        break;
                    }
                } else {
                    break;
                }
            }
        }

        self.skip_terminators();
        self.consume(TokenKind::RightBrace, "Expected '}'")?;
        Ok(self.ast.alloc(span, NodeKind::StructInit { type_name, fields }))
    }

    fn parse_struct_decl(&mut self, name: String, is_public: bool, span: Span) -> Result<NodeId, ParseError> {
        self.consume(TokenKind::Struct, "Expected 'struct'")?;

        let generic_params = if self.check(TokenKind::LeftParen) && self.peek(1).kind == TokenKind::GenericType {
            self.parse_generic_parameters()?
        } else {
            Vec::new()
        };

        self.consume(TokenKind::LeftBrace, "Expected '{'")?;
        let mut fields = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.at_end() {
            self.skip_terminators();
            if self.check(TokenKind::RightBrace) {
                break;
            }
            let name_tok = self.consume(TokenKind::Identifier, "Expected field name")?;
            self.consume(TokenKind::Colon, "Expected ':' after field name")?;
            let type_node = self.parse_type()?;
            fields.push(self.ast.alloc(
                name_tok.span(),
                NodeKind::Field {
                    name: name_tok.lexeme,
                    type_node,
                },
            ));
            if self.check(TokenKind::Comma) {
                self.advance();
            }
            self.skip_terminators();
        }

        self.consume(TokenKind::RightBrace, "Expected '}'")?;
        let _ = is_public;
        let node = self.ast.alloc(
            span,
            NodeKind::Struct {
                name,
                generic_params,
                fields,
            },
        );
        self.ast.get_mut(node).is_public = is_public;
        Ok(node)
    }

    fn parse_enum_decl(&mut self, name: String, is_public: bool, span: Span) -> Result<NodeId, ParseError> {
        self.consume(TokenKind::Enum, "Expected 'enum'")?;
        self.consume(TokenKind::LeftBrace, "Expected '{'")?;
        let mut variants = Vec::new();
        self.skip_terminators();

        while !self.check(TokenKind::RightBrace) && !self.at_end() {
            let name_tok = self.consume(TokenKind::Identifier, "Expected variant name")?;
            let value = if self.check(TokenKind::Assign) {
                self.advance();
                Some(self.parse_expression()?)
            } else {
                None
            };
            variants.push(self.ast.alloc(
                name_tok.span(),
                NodeKind::EnumVariant {
                    name: name_tok.lexeme,
                    value,
                },
            ));
            if self.check(TokenKind::Comma) {
                self.advance();
            }
            self.skip_terminators();
        }

        self.consume(TokenKind::RightBrace, "Expected '}'")?;
        let node = self.ast.alloc(span, NodeKind::Enum { name, variants });
        self.ast.get_mut(node).is_public = is_public;
        Ok(node)
    }

    fn parse_union_decl(&mut self, name: String, is_public: bool, span: Span) -> Result<NodeId, ParseError> {
        self.consume(TokenKind::Union, "Expected 'union'")?;

        let mut is_tagged = false;
        if self.check(TokenKind::LeftParen) {
            self.advance();
            if self.check(TokenKind::Identifier) && self.current().lexeme == "tag" {
                is_tagged = true;
                self.advance();
            }
            self.consume(TokenKind::RightParen, "Expected ')'")?;
        }

        self.consume(TokenKind::LeftBrace, "Expected '{'")?;
        let mut fields = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.at_end() {
            let name_tok = self.consume(TokenKind::Identifier, "Expected field name")?;
            self.consume(TokenKind::Colon, "Expected ':' after field name")?;
            let type_node = self.parse_type()?;
            fields.push(self.ast.alloc(
                name_tok.span(),
                NodeKind::Field {
                    name: name_tok.lexeme,
                    type_node,
                },
            ));
            if self.check(TokenKind::Comma) {
                self.advance();
            }
            self.skip_terminators();
        }

        self.consume(TokenKind::RightBrace, "Expected '}'")?;
        let node = self.ast.alloc(
            span,
            NodeKind::Union {
                name,
                fields,
                is_tagged,
            },
        );
        self.ast.get_mut(node).is_public = is_public;
        Ok(node)
    }

    // ---- patterns / match ------------------------------------------------

    fn parse_pattern(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span();
        let pattern = self.parse_primary_pattern()?;

        if self.check(TokenKind::DotDot) {
            self.advance();
            let end = self.parse_primary_pattern()?;
            return Ok(self.ast.alloc(start, NodeKind::PatternRange { start: pattern, end }));
        }

        Ok(pattern)
    }

    fn parse_primary_pattern(&mut self) -> Result<NodeId, ParseError> {
        let start_tok = self.current().clone();

        if start_tok.kind.is_literal() && start_tok.kind != TokenKind::TrueLiteral && start_tok.kind != TokenKind::FalseLiteral && start_tok.kind != TokenKind::NilLiteral {
            self.advance();
            let literal = self.alloc_literal(&start_tok);
            return Ok(self.ast.alloc(start_tok.span(), NodeKind::PatternLiteral { literal }));
        }

        if self.check(TokenKind::Identifier) {
            let first = self.advance();
            if self.check(TokenKind::Dot) {
                self.advance();
                let variant_tok = self.consume(TokenKind::Identifier, "Expected identifier after '.' in pattern")?;
                return Ok(self.ast.alloc(
                    start_tok.span(),
                    NodeKind::PatternEnum {
                        enum_name: first.lexeme,
                        variant_name: variant_tok.lexeme,
                    },
                ));
            }
            return Ok(self.ast.alloc(start_tok.span(), NodeKind::PatternIdentifier { name: first.lexeme }));
        }

        Err(self.error_at_current("Expected pattern"))
    }

    fn parse_match_statement(&mut self) -> Result<NodeId, ParseError> {
        let start = self.consume(TokenKind::Match, "Expected 'match'")?.span();
        let scrutinee = self.parse_expression()?;
        self.consume(TokenKind::LeftBrace, "Expected '{'")?;

        let mut cases = Vec::new();
        let mut else_branch = None;

        while !self.check(TokenKind::RightBrace) && !self.at_end() {
            if self.check(TokenKind::Case) {
                let case_tok = self.advance();
                let mut patterns = vec![self.parse_pattern()?];
                while self.check(TokenKind::Comma) {
                    self.advance();
                    patterns.push(self.parse_pattern()?);
                }
                self.consume(TokenKind::Colon, "Expected ':' after case pattern(s)")?;
                let body = self
                    .parse_statement()?
                    .ok_or_else(|| ParseError::new(case_tok.span(), "Expected statement after case pattern"))?;
                cases.push(self.ast.alloc(case_tok.span(), NodeKind::CaseBranch { patterns, body }));
            } else if self.check(TokenKind::Else) {
                let else_tok = self.advance();
                self.consume(TokenKind::Colon, "Expected ':' after 'else'")?;
                let body = self
                    .parse_statement()?
                    .ok_or_else(|| ParseError::new(else_tok.span(), "Expected statement after 'else:'"))?;
                else_branch = Some(body);
            } else {
                return Err(self.error_at_current("Expected 'case' or 'else' in match body"));
            }
            self.skip_terminators();
        }

        self.consume(TokenKind::RightBrace, "Expected '}'")?;
        Ok(self.ast.alloc(
            start,
            NodeKind::Match {
                scrutinee,
                cases,
                else_branch,
            },
        ))
    }
}

fn strip_quotes(lexeme: &str) -> String {
    lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(lexeme)
        .to_string()
}

fn binary_op_for(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Or => BinaryOp::Or,
        TokenKind::And => BinaryOp::And,
        TokenKind::Equal => BinaryOp::Eq,
        TokenKind::NotEqual => BinaryOp::Ne,
        TokenKind::Less => BinaryOp::Lt,
        TokenKind::LessEqual => BinaryOp::Le,
        TokenKind::Greater => BinaryOp::Gt,
        TokenKind::GreaterEqual => BinaryOp::Ge,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::Ampersand => BinaryOp::BitAnd,
        TokenKind::LeftShift => BinaryOp::Shl,
        TokenKind::RightShift => BinaryOp::Shr,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        _ => return None,
    })
}

/// Precedence order per the grammar (low to high): `or`; `and`; `==`/`!=`;
/// relational; `|`; `^`; `&`; shifts; `+`/`-`; `*`/`/`/`%`.
fn binary_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 1,
        BinaryOp::And => 2,
        BinaryOp::Eq | BinaryOp::Ne => 3,
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 4,
        BinaryOp::BitOr => 5,
        BinaryOp::BitXor => 6,
        BinaryOp::BitAnd => 7,
        BinaryOp::Shl | BinaryOp::Shr => 8,
        BinaryOp::Add | BinaryOp::Sub => 9,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_src(src: &str) -> Ast {
        let tokens = tokenize(src, None).unwrap();
        parse(tokens, None, &[]).unwrap()
    }

    #[test]
    fn minimal_program() {
        let ast = parse_src("main :: fn() {}");
        match ast.kind(ast.root) {
            NodeKind::Program { declarations } => {
                assert_eq!(declarations.len(), 1);
                match ast.kind(declarations[0]) {
                    NodeKind::Function { name, body, .. } => {
                        assert_eq!(name.as_deref(), Some("main"));
                        assert!(body.is_some());
                    }
                    other => panic!("expected FUNCTION, got {:?}", other.tag()),
                }
            }
            other => panic!("expected PROGRAM, got {:?}", other.tag()),
        }
    }

    #[test]
    fn struct_literal_vs_block_disambiguation() {
        let ast = parse_src("main :: fn() { if true { x := 1 } }");
        let NodeKind::Program { declarations } = ast.kind(ast.root) else { unreachable!() };
        let NodeKind::Function { body, .. } = ast.kind(declarations[0]) else { unreachable!() };
        let NodeKind::Block { statements } = ast.kind(body.unwrap()) else { unreachable!() };
        assert_eq!(statements.len(), 1);
        let NodeKind::IfStmt { then_block, .. } = ast.kind(statements[0]) else {
            panic!("expected IF_STMT")
        };
        let NodeKind::Block { statements: inner } = ast.kind(*then_block) else {
            panic!("then-branch should be a BLOCK, not a struct literal")
        };
        assert_eq!(inner.len(), 1);
        assert!(matches!(ast.kind(inner[0]), NodeKind::Var { name, .. } if name == "x"));
    }

    #[test]
    fn range_for_loop() {
        let ast = parse_src("main :: fn() { arr := [1,2,3]\nfor v in arr { } }");
        let NodeKind::Program { declarations } = ast.kind(ast.root) else { unreachable!() };
        let NodeKind::Function { body, .. } = ast.kind(declarations[0]) else { unreachable!() };
        let NodeKind::Block { statements } = ast.kind(body.unwrap()) else { unreachable!() };
        assert!(matches!(ast.kind(statements[1]), NodeKind::ForIn { iterator, .. } if iterator == "v"));
    }

    #[test]
    fn constant_expression_parses() {
        let ast = parse_src("k :: 2 + 3 * 4");
        let NodeKind::Program { declarations } = ast.kind(ast.root) else { unreachable!() };
        assert!(matches!(ast.kind(declarations[0]), NodeKind::Const { name, .. } if name == "k"));
    }

    #[test]
    fn deeply_nested_if_else_does_not_overflow_parser_stack() {
        let mut src = String::from("main :: fn() {\n");
        for _ in 0..30 {
            src.push_str("if true {\n");
        }
        for _ in 0..30 {
            src.push_str("}\n");
        }
        src.push('}');
        let _ = parse_src(&src);
    }
}
