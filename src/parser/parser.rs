//! Recursive descent parser for the host language
//!
//! Builds the typed tree of [`crate::syntax::ast`] directly from tokens.
//! Parsing stops at the first syntax error.

use std::sync::Arc;

use smol_str::SmolStr;

use crate::base::{FileEntry, FileSet, Pos, Span};
use crate::syntax::ast::*;

use super::ParseError;
use super::lexer::{Comment, Token, TokenKind, tokenize};

type PResult<T> = Result<T, ParseError>;

/// Parse one source file, registering it in `fset`.
pub fn parse_file(fset: &FileSet, name: &str, src: &str) -> PResult<SourceFile> {
    let file = fset.add_file(name, src);
    let mut parser = Parser::new(src, file)?;
    parser.parse_source_file()
}

/// Parse a standalone expression (or type expression), registering the text
/// in `fset` under `name`.
pub fn parse_expr(fset: &FileSet, name: &str, src: &str) -> PResult<Expr> {
    let file = fset.add_file(name, src);
    let mut parser = Parser::new(src, file)?;
    let expr = parser.parse_expr()?;
    parser.eat(TokenKind::Semicolon);
    if !parser.at_eof() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

/// The parser state
struct Parser<'a> {
    src: &'a str,
    file: Arc<FileEntry>,
    tokens: Vec<Token<'a>>,
    comments: Vec<Comment<'a>>,
    pos: usize,
    prev_end: u32,
    /// Below zero inside control clause headers, where a `{` opens the body
    /// rather than a composite literal.
    expr_lev: i32,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, file: Arc<FileEntry>) -> PResult<Self> {
        let lexed = tokenize(src).map_err(|err| {
            ParseError::new(file.position(file.pos(err.offset)), "invalid character")
        })?;
        Ok(Self {
            src,
            file,
            tokens: lexed.tokens,
            comments: lexed.comments,
            pos: 0,
            prev_end: 0,
            expr_lev: 0,
        })
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek(&self) -> Option<TokenKind> {
        self.current().map(|t| t.kind)
    }

    fn nth(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn offset(&self) -> u32 {
        self.current()
            .map(|t| t.offset)
            .unwrap_or(self.src.len() as u32)
    }

    fn start(&self) -> Pos {
        self.file.pos(self.offset())
    }

    fn span_from(&self, start: Pos) -> Span {
        Span::new(start, self.file.pos(self.prev_end))
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    fn bump(&mut self) -> PResult<Token<'a>> {
        let token = self
            .current()
            .ok_or_else(|| self.error("unexpected end of file"))?;
        self.pos += 1;
        self.prev_end = token.end();
        Ok(token)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            self.prev_end = self.tokens[self.pos - 1].end();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> PResult<Token<'a>> {
        if self.at(kind) {
            self.bump()
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    /// A terminator, which may be omitted before a closing `)` or `}`.
    fn expect_semi(&mut self) -> PResult<()> {
        if self.eat(TokenKind::Semicolon)
            || self.at(TokenKind::RParen)
            || self.at(TokenKind::RBrace)
            || self.at_eof()
        {
            Ok(())
        } else {
            Err(self.error("expected ';' or newline"))
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let found = match self.current() {
            Some(token) if token.kind == TokenKind::Semicolon && token.text != ";" => {
                "newline".to_string()
            }
            Some(token) => format!("'{}'", token.text),
            None => "EOF".to_string(),
        };
        let message = format!("{}, found {found}", message.into());
        ParseError::new(self.file.position(self.start()), message)
    }

    fn ident(&mut self) -> PResult<Ident> {
        let token = self.expect(TokenKind::Ident, "identifier")?;
        Ok(self.make_ident(token))
    }

    fn make_ident(&self, token: Token<'a>) -> Ident {
        Ident {
            id: NodeId::fresh(),
            pos: self.file.pos(token.offset),
            end: self.file.pos(token.end()),
            name: SmolStr::new(token.text),
        }
    }

    fn ident_list(&mut self) -> PResult<Vec<Ident>> {
        let mut names = vec![self.ident()?];
        while self.eat(TokenKind::Comma) {
            names.push(self.ident()?);
        }
        Ok(names)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// The comment group ending on the line right above `offset`.
    fn doc_before(&self, offset: u32) -> Option<String> {
        let mut cursor = offset as usize;
        let mut lines = Vec::new();
        for comment in self.comments.iter().rev() {
            let start = comment.offset as usize;
            let end = start + comment.text.len();
            if end > cursor {
                continue;
            }
            let gap = &self.src[end..cursor];
            if !gap.chars().all(char::is_whitespace) || gap.matches('\n').count() > 1 {
                break;
            }
            lines.push(strip_comment(comment.text));
            cursor = start;
        }
        if lines.is_empty() {
            return None;
        }
        lines.reverse();
        Some(lines.join("\n"))
    }

    // =========================================================================
    // Files and declarations
    // =========================================================================

    fn parse_source_file(&mut self) -> PResult<SourceFile> {
        let start = self.file.pos(0);
        self.expect(TokenKind::Package, "'package'")?;
        let package_name = self.ident()?;
        self.expect_semi()?;

        let mut decls = Vec::new();
        while self.at(TokenKind::Import) {
            decls.push(Decl::Gen(self.parse_gen_decl()?));
            self.expect_semi()?;
        }
        while !self.at_eof() {
            let decl = match self.peek() {
                Some(TokenKind::Func) => Decl::Func(self.parse_func_decl()?),
                Some(TokenKind::Var | TokenKind::Const | TokenKind::Type) => {
                    Decl::Gen(self.parse_gen_decl()?)
                }
                Some(TokenKind::Import) => {
                    return Err(self.error("imports must appear before other declarations"));
                }
                _ => return Err(self.error("expected declaration")),
            };
            decls.push(decl);
            self.expect_semi()?;
        }

        Ok(SourceFile {
            id: NodeId::fresh(),
            span: Span::new(start, self.file.pos(self.src.len() as u32)),
            name: self.file.name().clone(),
            package_name,
            decls,
        })
    }

    fn parse_gen_decl(&mut self) -> PResult<GenDecl> {
        let keyword = self.bump()?;
        let start = self.file.pos(keyword.offset);
        let kind = match keyword.kind {
            TokenKind::Import => DeclKind::Import,
            TokenKind::Const => DeclKind::Const,
            TokenKind::Var => DeclKind::Var,
            _ => DeclKind::Type,
        };

        let mut specs = Vec::new();
        if self.eat(TokenKind::LParen) {
            while !self.at(TokenKind::RParen) && !self.at_eof() {
                let doc_offset = self.offset();
                specs.push(self.parse_spec(kind, doc_offset)?);
                self.expect_semi()?;
            }
            self.expect(TokenKind::RParen, "')'")?;
        } else {
            specs.push(self.parse_spec(kind, keyword.offset)?);
        }

        Ok(GenDecl {
            id: NodeId::fresh(),
            span: self.span_from(start),
            kind,
            specs,
        })
    }

    fn parse_spec(&mut self, kind: DeclKind, doc_offset: u32) -> PResult<Spec> {
        let start = self.start();
        match kind {
            DeclKind::Import => {
                let name = match self.peek() {
                    Some(TokenKind::Ident) => Some(self.ident()?),
                    Some(TokenKind::Dot) => {
                        let dot = self.bump()?;
                        Some(self.make_ident(dot))
                    }
                    _ => None,
                };
                let path = self.expect(TokenKind::String, "import path")?;
                let path = self.basic_lit(path, LitKind::String);
                Ok(Spec::Import(ImportSpec {
                    id: NodeId::fresh(),
                    span: self.span_from(start),
                    name,
                    path: Expr::BasicLit(path),
                    doc: self.doc_before(doc_offset),
                }))
            }
            DeclKind::Type => {
                let name = self.ident()?;
                let alias = self.eat(TokenKind::Eq);
                let ty = self.parse_type()?;
                Ok(Spec::Type(TypeSpec {
                    id: NodeId::fresh(),
                    span: self.span_from(start),
                    name,
                    alias,
                    ty,
                }))
            }
            DeclKind::Const | DeclKind::Var => {
                let names = self.ident_list()?;
                let ty = if !self.at(TokenKind::Eq)
                    && !self.at(TokenKind::Semicolon)
                    && !self.at(TokenKind::RParen)
                {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                let values = if self.eat(TokenKind::Eq) {
                    self.parse_expr_list()?
                } else {
                    Vec::new()
                };
                if kind == DeclKind::Var && ty.is_none() && values.is_empty() {
                    return Err(self.error("expected type or initializer"));
                }
                Ok(Spec::Value(ValueSpec {
                    id: NodeId::fresh(),
                    span: self.span_from(start),
                    names,
                    ty,
                    values,
                }))
            }
        }
    }

    fn parse_func_decl(&mut self) -> PResult<FuncDecl> {
        let start = self.start();
        self.expect(TokenKind::Func, "'func'")?;

        let recv = if self.at(TokenKind::LParen) {
            let mut fields = self.parse_parameters()?;
            if fields.len() != 1 || fields[0].arity() != 1 {
                return Err(self.error("method has multiple receivers"));
            }
            fields.pop()
        } else {
            None
        };

        let name = self.ident()?;
        let ty = self.parse_signature(self.start())?;
        let body = if self.at(TokenKind::LBrace) {
            Some(self.parse_body()?)
        } else {
            None
        };

        Ok(FuncDecl {
            id: NodeId::fresh(),
            span: self.span_from(start),
            recv,
            name,
            ty,
            body,
        })
    }

    // =========================================================================
    // Signatures
    // =========================================================================

    fn parse_signature(&mut self, start: Pos) -> PResult<FuncType> {
        let params = self.parse_parameters()?;
        let results = if self.at(TokenKind::LParen) {
            self.parse_parameters()?
        } else if self.at_type_start() {
            let ty = self.parse_type()?;
            vec![Field {
                id: NodeId::fresh(),
                span: ty.span(),
                names: Vec::new(),
                ty,
            }]
        } else {
            Vec::new()
        };
        Ok(FuncType {
            id: NodeId::fresh(),
            span: self.span_from(start),
            params,
            results,
        })
    }

    /// `(a, b int, c string)` or `(int, string)`.
    fn parse_parameters(&mut self) -> PResult<Vec<Field>> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut entries: Vec<(Expr, Option<Expr>)> = Vec::new();
        while !self.at(TokenKind::RParen) {
            let first = self.parse_type()?;
            let ty = if !self.at(TokenKind::Comma) && !self.at(TokenKind::RParen) {
                Some(self.parse_type()?)
            } else {
                None
            };
            entries.push((first, ty));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        if entries.iter().all(|(_, ty)| ty.is_none()) {
            return Ok(entries
                .into_iter()
                .map(|(ty, _)| Field {
                    id: NodeId::fresh(),
                    span: ty.span(),
                    names: Vec::new(),
                    ty,
                })
                .collect());
        }

        let mut fields = Vec::new();
        let mut pending: Vec<Ident> = Vec::new();
        for (first, ty) in entries {
            let Expr::Ident(name) = first else {
                return Err(self.error("mixed named and unnamed parameters"));
            };
            pending.push(name);
            if let Some(ty) = ty {
                let span = Span::new(pending[0].pos, ty.span().end);
                fields.push(Field {
                    id: NodeId::fresh(),
                    span,
                    names: std::mem::take(&mut pending),
                    ty,
                });
            }
        }
        if !pending.is_empty() {
            return Err(self.error("mixed named and unnamed parameters"));
        }
        Ok(fields)
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn at_type_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                TokenKind::Ident
                    | TokenKind::Star
                    | TokenKind::LBracket
                    | TokenKind::Map
                    | TokenKind::Struct
                    | TokenKind::Interface
                    | TokenKind::Func
                    | TokenKind::LParen
            )
        )
    }

    fn parse_type(&mut self) -> PResult<Expr> {
        let start = self.start();
        match self.peek() {
            Some(TokenKind::Ident) => self.parse_type_name(),
            Some(TokenKind::Star) => {
                self.bump()?;
                let x = self.parse_type()?;
                Ok(Expr::Star(Box::new(StarExpr {
                    id: NodeId::fresh(),
                    span: self.span_from(start),
                    x,
                })))
            }
            Some(TokenKind::LParen) => {
                self.bump()?;
                let x = self.parse_type()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Expr::Paren(Box::new(ParenExpr {
                    id: NodeId::fresh(),
                    span: self.span_from(start),
                    x,
                })))
            }
            Some(TokenKind::LBracket) => self.parse_array_type(),
            Some(TokenKind::Map) => self.parse_map_type(),
            Some(TokenKind::Struct) => self.parse_struct_type(),
            Some(TokenKind::Interface) => self.parse_interface_type(),
            Some(TokenKind::Func) => {
                self.bump()?;
                let ty = self.parse_signature(start)?;
                Ok(Expr::FuncType(Box::new(ty)))
            }
            _ => Err(self.error("expected type")),
        }
    }

    fn parse_type_name(&mut self) -> PResult<Expr> {
        let start = self.start();
        let name = self.ident()?;
        if self.at(TokenKind::Dot) && self.nth(1) == Some(TokenKind::Ident) {
            self.bump()?;
            let sel = self.ident()?;
            return Ok(Expr::Selector(Box::new(SelectorExpr {
                id: NodeId::fresh(),
                span: self.span_from(start),
                x: Expr::Ident(name),
                sel,
            })));
        }
        Ok(Expr::Ident(name))
    }

    fn parse_array_type(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.expect(TokenKind::LBracket, "'['")?;
        let len = if self.at(TokenKind::RBracket) {
            None
        } else {
            self.expr_lev += 1;
            let len = self.parse_expr();
            self.expr_lev -= 1;
            Some(len?)
        };
        self.expect(TokenKind::RBracket, "']'")?;
        let elem = self.parse_type()?;
        Ok(Expr::ArrayType(Box::new(ArrayType {
            id: NodeId::fresh(),
            span: self.span_from(start),
            len,
            elem,
        })))
    }

    fn parse_map_type(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.expect(TokenKind::Map, "'map'")?;
        self.expect(TokenKind::LBracket, "'['")?;
        let key = self.parse_type()?;
        self.expect(TokenKind::RBracket, "']'")?;
        let value = self.parse_type()?;
        Ok(Expr::MapType(Box::new(MapType {
            id: NodeId::fresh(),
            span: self.span_from(start),
            key,
            value,
        })))
    }

    fn parse_struct_type(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.expect(TokenKind::Struct, "'struct'")?;
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at_eof() {
            let field_start = self.start();
            let embedded = self.at(TokenKind::Star)
                || (self.at(TokenKind::Ident)
                    && matches!(
                        self.nth(1),
                        Some(
                            TokenKind::Semicolon
                                | TokenKind::RBrace
                                | TokenKind::Dot
                                | TokenKind::String
                        )
                    ));
            let (names, ty) = if embedded {
                (Vec::new(), self.parse_type()?)
            } else {
                let names = self.ident_list()?;
                (names, self.parse_type()?)
            };
            // Tags carry no meaning for analysis.
            self.eat(TokenKind::String);
            fields.push(Field {
                id: NodeId::fresh(),
                span: self.span_from(field_start),
                names,
                ty,
            });
            self.expect_semi()?;
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Expr::StructType(Box::new(StructType {
            id: NodeId::fresh(),
            span: self.span_from(start),
            fields,
        })))
    }

    fn parse_interface_type(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.expect(TokenKind::Interface, "'interface'")?;
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut methods = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at_eof() {
            let method_start = self.start();
            if self.at(TokenKind::Ident) && self.nth(1) == Some(TokenKind::LParen) {
                let name = self.ident()?;
                let sig = self.parse_signature(self.start())?;
                methods.push(Field {
                    id: NodeId::fresh(),
                    span: self.span_from(method_start),
                    names: vec![name],
                    ty: Expr::FuncType(Box::new(sig)),
                });
            } else {
                let ty = self.parse_type_name()?;
                methods.push(Field {
                    id: NodeId::fresh(),
                    span: self.span_from(method_start),
                    names: Vec::new(),
                    ty,
                });
            }
            self.expect_semi()?;
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Expr::InterfaceType(Box::new(InterfaceType {
            id: NodeId::fresh(),
            span: self.span_from(start),
            methods,
        })))
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// A function body; composite literals are allowed again inside.
    fn parse_body(&mut self) -> PResult<Block> {
        let saved = std::mem::replace(&mut self.expr_lev, 0);
        let block = self.parse_block();
        self.expr_lev = saved;
        block
    }

    fn parse_block(&mut self) -> PResult<Block> {
        let start = self.start();
        self.expect(TokenKind::LBrace, "'{'")?;
        let stmts = self.parse_stmt_list()?;
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Block {
            id: NodeId::fresh(),
            span: self.span_from(start),
            stmts,
        })
    }

    fn parse_stmt_list(&mut self) -> PResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !matches!(
            self.peek(),
            None | Some(TokenKind::RBrace | TokenKind::Case | TokenKind::Default)
        ) {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            stmts.push(self.parse_stmt()?);
            self.expect_semi()?;
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> PResult<Stmt> {
        let start = self.start();
        match self.peek() {
            Some(TokenKind::Var | TokenKind::Const | TokenKind::Type) => {
                let decl = self.parse_gen_decl()?;
                Ok(Stmt::Decl(Box::new(DeclStmt {
                    id: NodeId::fresh(),
                    span: decl.span,
                    decl,
                })))
            }
            Some(TokenKind::Return) => {
                self.bump()?;
                let results = if self.at(TokenKind::Semicolon) || self.at(TokenKind::RBrace) {
                    Vec::new()
                } else {
                    self.parse_expr_list()?
                };
                Ok(Stmt::Return(Box::new(ReturnStmt {
                    id: NodeId::fresh(),
                    span: self.span_from(start),
                    results,
                })))
            }
            Some(TokenKind::Break | TokenKind::Continue | TokenKind::Fallthrough) => {
                let token = self.bump()?;
                Ok(Stmt::Branch(Box::new(BranchStmt {
                    id: NodeId::fresh(),
                    span: self.span_from(start),
                    is_break: token.kind == TokenKind::Break,
                })))
            }
            Some(TokenKind::LBrace) => Ok(Stmt::Block(Box::new(self.parse_block()?))),
            Some(TokenKind::If) => self.parse_if_stmt(),
            Some(TokenKind::For) => self.parse_for_stmt(),
            Some(TokenKind::Switch) => self.parse_switch_stmt(),
            Some(TokenKind::Go | TokenKind::Defer) => {
                let token = self.bump()?;
                let call = self.parse_expr()?;
                if !matches!(call.unparen(), Expr::Call(_)) {
                    return Err(self.error("expression in go/defer must be a function call"));
                }
                Ok(Stmt::Deferred(Box::new(DeferredCallStmt {
                    id: NodeId::fresh(),
                    span: self.span_from(start),
                    is_go: token.kind == TokenKind::Go,
                    call,
                })))
            }
            _ => self.parse_simple_stmt(),
        }
    }

    fn parse_simple_stmt(&mut self) -> PResult<Stmt> {
        let start = self.start();
        let lhs = self.parse_expr_list()?;

        let op = match self.peek() {
            Some(TokenKind::ColonEq) => Some(AssignOp::Define),
            Some(TokenKind::Eq) => Some(AssignOp::Assign),
            Some(kind) => compound_assign_op(kind).map(AssignOp::Compound),
            None => None,
        };
        if let Some(op) = op {
            self.bump()?;
            let rhs = self.parse_expr_list()?;
            if op == AssignOp::Define && lhs.iter().any(|e| e.as_ident().is_none()) {
                return Err(self.error("non-name on left side of :="));
            }
            return Ok(Stmt::Assign(Box::new(AssignStmt {
                id: NodeId::fresh(),
                span: self.span_from(start),
                lhs,
                op,
                rhs,
            })));
        }

        let x = single(lhs).ok_or_else(|| self.error("expected 1 expression"))?;
        if self.at(TokenKind::PlusPlus) || self.at(TokenKind::MinusMinus) {
            let token = self.bump()?;
            return Ok(Stmt::IncDec(Box::new(IncDecStmt {
                id: NodeId::fresh(),
                span: self.span_from(start),
                x,
                inc: token.kind == TokenKind::PlusPlus,
            })));
        }
        Ok(Stmt::Expr(Box::new(ExprStmt {
            id: NodeId::fresh(),
            span: self.span_from(start),
            x,
        })))
    }

    fn parse_if_stmt(&mut self) -> PResult<Stmt> {
        let start = self.start();
        self.expect(TokenKind::If, "'if'")?;

        let saved = std::mem::replace(&mut self.expr_lev, -1);
        let header = self.parse_if_header();
        self.expr_lev = saved;
        let (init, cond) = header?;

        let body = self.parse_block()?;
        let els = if self.eat(TokenKind::Else) {
            match self.peek() {
                Some(TokenKind::If) => Some(self.parse_if_stmt()?),
                Some(TokenKind::LBrace) => Some(Stmt::Block(Box::new(self.parse_block()?))),
                _ => return Err(self.error("expected if statement or block")),
            }
        } else {
            None
        };

        Ok(Stmt::If(Box::new(IfStmt {
            id: NodeId::fresh(),
            span: self.span_from(start),
            init,
            cond,
            body,
            els,
        })))
    }

    fn parse_if_header(&mut self) -> PResult<(Option<Stmt>, Expr)> {
        let first = self.parse_simple_stmt()?;
        if self.eat(TokenKind::Semicolon) {
            let cond = self.parse_expr()?;
            return Ok((Some(first), cond));
        }
        match first {
            Stmt::Expr(stmt) => Ok((None, stmt.x)),
            _ => Err(self.error("expected condition")),
        }
    }

    fn parse_for_stmt(&mut self) -> PResult<Stmt> {
        let start = self.start();
        self.expect(TokenKind::For, "'for'")?;

        let saved = std::mem::replace(&mut self.expr_lev, -1);
        let header = self.parse_for_header();
        self.expr_lev = saved;
        let (init, cond, post) = header?;

        let body = self.parse_block()?;
        Ok(Stmt::For(Box::new(ForStmt {
            id: NodeId::fresh(),
            span: self.span_from(start),
            init,
            cond,
            post,
            body,
        })))
    }

    #[allow(clippy::type_complexity)]
    fn parse_for_header(&mut self) -> PResult<(Option<Stmt>, Option<Expr>, Option<Stmt>)> {
        if self.at(TokenKind::LBrace) {
            return Ok((None, None, None));
        }
        let init = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_simple_stmt()?)
        };
        if self.at(TokenKind::LBrace) {
            return match init {
                Some(Stmt::Expr(stmt)) => Ok((None, Some(stmt.x), None)),
                _ => Err(self.error("expected for loop condition")),
            };
        }
        self.expect(TokenKind::Semicolon, "';'")?;
        let cond = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon, "';'")?;
        let post = if self.at(TokenKind::LBrace) {
            None
        } else {
            Some(self.parse_simple_stmt()?)
        };
        Ok((init, cond, post))
    }

    fn parse_switch_stmt(&mut self) -> PResult<Stmt> {
        let start = self.start();
        self.expect(TokenKind::Switch, "'switch'")?;

        let saved = std::mem::replace(&mut self.expr_lev, -1);
        let header = self.parse_switch_header();
        self.expr_lev = saved;
        let (init, tag) = header?;

        self.expect(TokenKind::LBrace, "'{'")?;
        let mut clauses = Vec::new();
        while self.at(TokenKind::Case) || self.at(TokenKind::Default) {
            clauses.push(self.parse_case_clause()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        let span = self.span_from(start);

        // `switch [x :=] y.(type)` becomes a type switch.
        let type_switch = match &tag {
            Some(Stmt::Expr(stmt)) if is_type_guard(&stmt.x) => true,
            Some(Stmt::Assign(stmt)) => {
                stmt.op == AssignOp::Define
                    && stmt.lhs.len() == 1
                    && stmt.rhs.len() == 1
                    && is_type_guard(&stmt.rhs[0])
            }
            _ => false,
        };

        if type_switch {
            let (binding, guard) = match tag {
                Some(Stmt::Assign(stmt)) => {
                    let stmt = *stmt;
                    let binding = stmt.lhs.into_iter().next().and_then(|e| match e {
                        Expr::Ident(ident) => Some(ident),
                        _ => None,
                    });
                    let guard = single(stmt.rhs).ok_or_else(|| self.error("expected type guard"))?;
                    (binding, guard)
                }
                Some(Stmt::Expr(stmt)) => (None, stmt.x),
                _ => return Err(self.error("expected type guard")),
            };
            return Ok(Stmt::TypeSwitch(Box::new(TypeSwitchStmt {
                id: NodeId::fresh(),
                span,
                init,
                binding,
                guard,
                clauses,
            })));
        }

        let tag = match tag {
            None => None,
            Some(Stmt::Expr(stmt)) => Some(stmt.x),
            Some(_) => return Err(self.error("switch expression must be an expression")),
        };
        Ok(Stmt::Switch(Box::new(SwitchStmt {
            id: NodeId::fresh(),
            span,
            init,
            tag,
            clauses,
        })))
    }

    fn parse_switch_header(&mut self) -> PResult<(Option<Stmt>, Option<Stmt>)> {
        if self.at(TokenKind::LBrace) {
            return Ok((None, None));
        }
        let first = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_simple_stmt()?)
        };
        if self.eat(TokenKind::Semicolon) {
            let tag = if self.at(TokenKind::LBrace) {
                None
            } else {
                Some(self.parse_simple_stmt()?)
            };
            return Ok((first, tag));
        }
        Ok((None, first))
    }

    fn parse_case_clause(&mut self) -> PResult<CaseClause> {
        let start = self.start();
        let list = if self.eat(TokenKind::Default) {
            Vec::new()
        } else {
            self.expect(TokenKind::Case, "'case'")?;
            self.parse_expr_list()?
        };
        self.expect(TokenKind::Colon, "':'")?;
        let body = self.parse_stmt_list()?;
        Ok(CaseClause {
            id: NodeId::fresh(),
            span: self.span_from(start),
            list,
            body,
        })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expr_list(&mut self) -> PResult<Vec<Expr>> {
        let mut list = vec![self.parse_expr()?];
        while self.eat(TokenKind::Comma) {
            list.push(self.parse_expr()?);
        }
        Ok(list)
    }

    fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_binary_expr(1)
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> PResult<Expr> {
        let mut x = self.parse_unary_expr()?;
        while let Some(op) = self.peek().and_then(binary_op) {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.bump()?;
            let y = self.parse_binary_expr(prec + 1)?;
            let span = x.span().cover(y.span());
            x = Expr::Binary(Box::new(BinaryExpr {
                id: NodeId::fresh(),
                span,
                op,
                x,
                y,
            }));
        }
        Ok(x)
    }

    fn parse_unary_expr(&mut self) -> PResult<Expr> {
        let start = self.start();
        let op = match self.peek() {
            Some(TokenKind::Minus) => Some(UnaryOp::Neg),
            Some(TokenKind::Plus) => Some(UnaryOp::Plus),
            Some(TokenKind::Bang) => Some(UnaryOp::Not),
            Some(TokenKind::Caret) => Some(UnaryOp::BitNot),
            Some(TokenKind::Amp) => Some(UnaryOp::Addr),
            Some(TokenKind::Star) => {
                self.bump()?;
                let x = self.parse_unary_expr()?;
                return Ok(Expr::Star(Box::new(StarExpr {
                    id: NodeId::fresh(),
                    span: self.span_from(start),
                    x,
                })));
            }
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_primary_expr();
        };
        self.bump()?;
        let x = self.parse_unary_expr()?;
        Ok(Expr::Unary(Box::new(UnaryExpr {
            id: NodeId::fresh(),
            span: self.span_from(start),
            op,
            x,
        })))
    }

    fn parse_operand(&mut self) -> PResult<Expr> {
        let start = self.start();
        match self.peek() {
            Some(TokenKind::Ident) => Ok(Expr::Ident(self.ident()?)),
            Some(TokenKind::Int) => self.literal(LitKind::Int),
            Some(TokenKind::Float) => self.literal(LitKind::Float),
            Some(TokenKind::Char) => self.literal(LitKind::Char),
            Some(TokenKind::String) => self.literal(LitKind::String),
            Some(TokenKind::LParen) => {
                self.bump()?;
                self.expr_lev += 1;
                let x = self.parse_expr();
                self.expr_lev -= 1;
                let x = x?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Expr::Paren(Box::new(ParenExpr {
                    id: NodeId::fresh(),
                    span: self.span_from(start),
                    x,
                })))
            }
            Some(TokenKind::Func) => {
                self.bump()?;
                let ty = self.parse_signature(start)?;
                if !self.at(TokenKind::LBrace) {
                    return Ok(Expr::FuncType(Box::new(ty)));
                }
                let body = self.parse_body()?;
                Ok(Expr::FuncLit(Box::new(FuncLit {
                    id: NodeId::fresh(),
                    span: self.span_from(start),
                    ty,
                    body,
                })))
            }
            Some(
                TokenKind::LBracket | TokenKind::Map | TokenKind::Struct | TokenKind::Interface,
            ) => self.parse_type(),
            _ => Err(self.error("expected expression")),
        }
    }

    fn literal(&mut self, kind: LitKind) -> PResult<Expr> {
        let token = self.bump()?;
        Ok(Expr::BasicLit(self.basic_lit(token, kind)))
    }

    fn basic_lit(&self, token: Token<'a>, kind: LitKind) -> BasicLit {
        BasicLit {
            id: NodeId::fresh(),
            span: Span::new(self.file.pos(token.offset), self.file.pos(token.end())),
            kind,
            value: SmolStr::new(token.text),
        }
    }

    fn parse_primary_expr(&mut self) -> PResult<Expr> {
        let start = self.start();
        let mut x = self.parse_operand()?;
        loop {
            match self.peek() {
                Some(TokenKind::Dot) => {
                    self.bump()?;
                    if self.eat(TokenKind::LParen) {
                        let ty = if self.eat(TokenKind::Type) {
                            None
                        } else {
                            Some(self.parse_type()?)
                        };
                        self.expect(TokenKind::RParen, "')'")?;
                        x = Expr::TypeAssert(Box::new(TypeAssertExpr {
                            id: NodeId::fresh(),
                            span: self.span_from(start),
                            x,
                            ty,
                        }));
                    } else {
                        let sel = self.ident()?;
                        x = Expr::Selector(Box::new(SelectorExpr {
                            id: NodeId::fresh(),
                            span: self.span_from(start),
                            x,
                            sel,
                        }));
                    }
                }
                Some(TokenKind::LBracket) => {
                    self.bump()?;
                    self.expr_lev += 1;
                    let index = self.parse_expr();
                    self.expr_lev -= 1;
                    let index = index?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    x = Expr::Index(Box::new(IndexExpr {
                        id: NodeId::fresh(),
                        span: self.span_from(start),
                        x,
                        index,
                    }));
                }
                Some(TokenKind::LParen) => {
                    self.bump()?;
                    self.expr_lev += 1;
                    let args = self.parse_call_args();
                    self.expr_lev -= 1;
                    let args = args?;
                    self.expect(TokenKind::RParen, "')'")?;
                    x = Expr::Call(Box::new(CallExpr {
                        id: NodeId::fresh(),
                        span: self.span_from(start),
                        fun: x,
                        args,
                    }));
                }
                Some(TokenKind::LBrace) if self.expr_lev >= 0 && is_literal_type(&x) => {
                    x = self.parse_composite_lit(start, x)?;
                }
                _ => return Ok(x),
            }
        }
    }

    fn parse_call_args(&mut self) -> PResult<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.at(TokenKind::RParen) {
            args.push(self.parse_expr()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(args)
    }

    fn parse_composite_lit(&mut self, start: Pos, ty: Expr) -> PResult<Expr> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let saved = std::mem::replace(&mut self.expr_lev, 0);
        let elts = self.parse_composite_elements();
        self.expr_lev = saved;
        let elts = elts?;
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Expr::CompositeLit(Box::new(CompositeLit {
            id: NodeId::fresh(),
            span: self.span_from(start),
            ty,
            elts,
        })))
    }

    fn parse_composite_elements(&mut self) -> PResult<Vec<Expr>> {
        let mut elts = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let key = self.parse_expr()?;
            let elt = if self.eat(TokenKind::Colon) {
                let value = self.parse_expr()?;
                let span = key.span().cover(value.span());
                Expr::KeyValue(Box::new(KeyValueExpr {
                    id: NodeId::fresh(),
                    span,
                    key,
                    value,
                }))
            } else {
                key
            };
            elts.push(elt);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(elts)
    }
}

fn single(mut list: Vec<Expr>) -> Option<Expr> {
    if list.len() == 1 { list.pop() } else { None }
}

fn is_type_guard(expr: &Expr) -> bool {
    matches!(expr, Expr::TypeAssert(assert) if assert.ty.is_none())
}

fn is_literal_type(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(_) | Expr::ArrayType(_) | Expr::MapType(_) | Expr::StructType(_) => true,
        Expr::Selector(sel) => matches!(sel.x, Expr::Ident(_)),
        _ => false,
    }
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::PipePipe => BinaryOp::LogOr,
        TokenKind::AmpAmp => BinaryOp::LogAnd,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::BangEq => BinaryOp::Ne,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::Le,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::Ge,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Pipe => BinaryOp::Or,
        TokenKind::Caret => BinaryOp::Xor,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Rem,
        TokenKind::Shl => BinaryOp::Shl,
        TokenKind::Shr => BinaryOp::Shr,
        TokenKind::Amp => BinaryOp::And,
        TokenKind::AndNot => BinaryOp::AndNot,
        _ => return None,
    })
}

fn compound_assign_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::AddAssign => BinaryOp::Add,
        TokenKind::SubAssign => BinaryOp::Sub,
        TokenKind::MulAssign => BinaryOp::Mul,
        TokenKind::DivAssign => BinaryOp::Div,
        TokenKind::RemAssign => BinaryOp::Rem,
        TokenKind::AndAssign => BinaryOp::And,
        TokenKind::OrAssign => BinaryOp::Or,
        TokenKind::XorAssign => BinaryOp::Xor,
        TokenKind::ShlAssign => BinaryOp::Shl,
        TokenKind::ShrAssign => BinaryOp::Shr,
        TokenKind::AndNotAssign => BinaryOp::AndNot,
        _ => return None,
    })
}

fn strip_comment(text: &str) -> String {
    if let Some(line) = text.strip_prefix("//") {
        return line.strip_prefix(' ').unwrap_or(line).to_string();
    }
    text.trim_start_matches("/*")
        .trim_end_matches("*/")
        .trim()
        .to_string()
}
