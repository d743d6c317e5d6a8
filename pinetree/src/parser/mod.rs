//! Recursive-descent parser producing the AST

use std::rc::Rc;

use crate::ast::*;
use crate::error::{CompileError, Result};
use crate::lexer::Token;

#[cfg(test)]
mod tests;

/// Parse tokens into a program
pub fn parse(_filename: &str, source: &str, tokens: Vec<(Token, Span)>) -> Result<Program> {
    let mut parser = Parser::new(tokens, source.len());
    parser.program()
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    eof: Span,
}

impl Parser {
    fn new(tokens: Vec<(Token, Span)>, len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            eof: Span::new(len, len),
        }
    }

    // ---- token cursor ----

    fn peek(&self) -> Option<&Token> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(t, _)| t)
    }

    fn span(&self) -> Span {
        self.tokens.get(self.pos).map(|(_, s)| *s).unwrap_or(self.eof)
    }

    fn prev_span(&self) -> Span {
        if self.pos == 0 {
            return Span::new(0, 0);
        }
        self.tokens
            .get(self.pos - 1)
            .map(|(_, s)| *s)
            .unwrap_or(self.eof)
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<Span> {
        if self.eat(token) {
            Ok(self.prev_span())
        } else {
            Err(self.unexpected(&format!("'{token}'")))
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn is_ident(&self, n: usize, text: &str) -> bool {
        matches!(self.peek_at(n), Some(Token::Ident(s)) if s == text)
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        match self.peek() {
            Some(found) => CompileError::parser(
                format!("expected {expected}, found '{found}'"),
                self.span(),
            ),
            None => CompileError::parser(
                format!("expected {expected}, found end of input"),
                self.eof,
            ),
        }
    }

    /// Length of a type reference (`T` or `T[]`) starting `n` tokens ahead
    fn type_len_at(&self, n: usize) -> Option<usize> {
        match self.peek_at(n) {
            Some(Token::Ident(_)) => {
                if self.peek_at(n + 1) == Some(&Token::LBracket)
                    && self.peek_at(n + 2) == Some(&Token::RBracket)
                {
                    Some(3)
                } else {
                    Some(1)
                }
            }
            _ => None,
        }
    }

    /// `Type name` ahead, optionally followed by `next`
    fn typed_name_ahead(&self, next: Option<&Token>) -> bool {
        let Some(len) = self.type_len_at(0) else {
            return false;
        };
        if !matches!(self.peek_at(len), Some(Token::Ident(_))) {
            return false;
        }
        match next {
            Some(token) => self.peek_at(len + 1) == Some(token),
            None => true,
        }
    }

    fn parse_type(&mut self) -> Result<String> {
        let name = self.expect_ident()?;
        if self.check(&Token::LBracket) && self.peek_at(1) == Some(&Token::RBracket) {
            self.pos += 2;
            return Ok("array".to_string());
        }
        Ok(name)
    }

    // ---- declarations ----

    fn program(&mut self) -> Result<Program> {
        let mut nodes = Vec::new();
        while self.peek().is_some() {
            nodes.push(self.node()?);
        }
        Ok(Program { nodes })
    }

    fn node(&mut self) -> Result<Spanned<Node>> {
        let start = self.span();
        let mut offset = 0;
        while matches!(
            self.peek_at(offset),
            Some(Token::Public | Token::Private | Token::Protected | Token::Static)
        ) {
            offset += 1;
        }

        if self.peek_at(offset) == Some(&Token::Class) {
            let class = self.class_decl()?;
            return Ok(Spanned::new(Node::Class(Rc::new(class)), start.to(self.prev_span())));
        }

        let is_method = offset > 0 || self.typed_name_ahead(Some(&Token::LParen));
        if is_method {
            let (visibility, is_static) = self.modifiers();
            let return_type = self.parse_type()?;
            let name = self.expect_ident()?;
            let method = self.method_rest(name, return_type, visibility, is_static, start)?;
            return Ok(Spanned::new(Node::Method(Rc::new(method)), start.to(self.prev_span())));
        }

        let stmt = self.statement()?;
        Ok(Spanned::new(Node::Stmt(stmt.node), stmt.span))
    }

    fn visibility(&mut self) -> Visibility {
        let mut visibility = Visibility::Public;
        loop {
            match self.peek() {
                Some(Token::Public) => visibility = Visibility::Public,
                Some(Token::Private) => visibility = Visibility::Private,
                Some(Token::Protected) => visibility = Visibility::Protected,
                _ => return visibility,
            }
            self.pos += 1;
        }
    }

    /// Visibility and `static`, in either order
    fn modifiers(&mut self) -> (Visibility, bool) {
        let mut visibility = Visibility::Public;
        let mut is_static = false;
        loop {
            match self.peek() {
                Some(Token::Static) => {
                    self.pos += 1;
                    is_static = true;
                }
                Some(Token::Public | Token::Private | Token::Protected) => {
                    visibility = self.visibility();
                }
                _ => return (visibility, is_static),
            }
        }
    }

    fn class_decl(&mut self) -> Result<ClassDecl> {
        let start = self.span();
        let visibility = self.visibility();
        self.expect(&Token::Class)?;
        let name = self.expect_ident()?;
        let supertype = if self.eat(&Token::Extends) {
            Some(self.expect_ident()?)
        } else {
            None
        };

        let mut class = ClassDecl {
            name,
            supertype,
            visibility,
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            span: start,
        };

        self.expect(&Token::LBrace)?;
        while !self.eat(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(self.unexpected("'}'"));
            }
            self.class_member(&mut class)?;
        }
        class.span = start.to(self.prev_span());
        Ok(class)
    }

    fn class_member(&mut self, class: &mut ClassDecl) -> Result<()> {
        let start = self.span();
        let (visibility, is_static) = self.modifiers();

        if self.is_ident(0, &class.name) && self.peek_at(1) == Some(&Token::LParen) {
            self.pos += 1;
            let params = self.params()?;
            let preconditions = self.preconditions()?;
            let body = self.block()?;
            class.constructors.push(Rc::new(ConstructorDecl {
                visibility,
                params,
                preconditions,
                body,
                span: start.to(self.prev_span()),
            }));
            return Ok(());
        }

        let ty = self.parse_type()?;
        let name = self.expect_ident()?;
        match self.peek() {
            Some(Token::LParen) => {
                let method = self.method_rest(name, ty, visibility, is_static, start)?;
                class.methods.push(Rc::new(method));
            }
            Some(Token::LBrace) => {
                self.pos += 1;
                if !self.is_ident(0, "get") {
                    return Err(self.unexpected("'get'"));
                }
                self.pos += 1;
                let getter = self.block()?;
                let setter = if self.is_ident(0, "set") {
                    self.pos += 1;
                    Some(self.block()?)
                } else {
                    None
                };
                self.expect(&Token::RBrace)?;
                class.properties.push(Rc::new(PropertyDecl {
                    name,
                    ty,
                    visibility,
                    getter,
                    setter,
                }));
            }
            _ => {
                let value = if self.eat(&Token::Eq) {
                    Some(self.expr()?)
                } else {
                    None
                };
                self.expect(&Token::Semi)?;
                class.fields.push(FieldDecl {
                    name,
                    ty,
                    visibility,
                    is_static,
                    value,
                });
            }
        }
        Ok(())
    }

    fn method_rest(
        &mut self,
        name: String,
        return_type: String,
        visibility: Visibility,
        is_static: bool,
        start: Span,
    ) -> Result<MethodDecl> {
        let params = self.params()?;
        let preconditions = self.preconditions()?;
        let body = self.block()?;
        Ok(MethodDecl {
            name,
            return_type,
            visibility,
            is_static,
            params,
            preconditions,
            body,
            span: start.to(self.prev_span()),
        })
    }

    fn params(&mut self) -> Result<Vec<Param>> {
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(params);
        }
        loop {
            let ty = if self.eat(&Token::Var) {
                "var".to_string()
            } else {
                self.parse_type()?
            };
            let name = self.expect_ident()?;
            params.push(Param { name, ty });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen)?;
        Ok(params)
    }

    fn preconditions(&mut self) -> Result<Vec<Precondition>> {
        let mut preconditions = Vec::new();
        while self.eat(&Token::Requires) {
            self.expect(&Token::LParen)?;
            let condition = self.expr()?;
            let message = if self.eat(&Token::Comma) {
                match self.peek() {
                    Some(Token::StringLit(s)) => {
                        let message = s.clone();
                        self.pos += 1;
                        Some(message)
                    }
                    _ => return Err(self.unexpected("precondition message")),
                }
            } else {
                None
            };
            self.expect(&Token::RParen)?;
            preconditions.push(Precondition { condition, message });
        }
        Ok(preconditions)
    }

    // ---- statements ----

    fn block(&mut self) -> Result<Block> {
        self.expect(&Token::LBrace)?;
        let mut stmts = Vec::new();
        while !self.eat(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(self.unexpected("'}'"));
            }
            stmts.push(self.statement()?);
        }
        Ok(Block::new(stmts))
    }

    fn statement(&mut self) -> Result<Spanned<Stmt>> {
        let start = self.span();
        let stmt = match self.peek() {
            Some(Token::LBrace) => Stmt::Block(self.block()?),
            Some(Token::Semi) => {
                self.pos += 1;
                Stmt::Empty
            }
            Some(Token::Var) => {
                let decl = self.var_decl()?;
                self.expect(&Token::Semi)?;
                decl
            }
            Some(Token::If) => self.if_stmt()?,
            Some(Token::While) => {
                self.pos += 1;
                self.expect(&Token::LParen)?;
                let predicate = self.expr()?;
                self.expect(&Token::RParen)?;
                let body = self.statement()?.boxed();
                Stmt::While { predicate, body }
            }
            Some(Token::For) => self.for_stmt()?,
            Some(Token::Return) => {
                self.pos += 1;
                let value = if self.check(&Token::Semi) {
                    None
                } else {
                    Some(self.expr()?)
                };
                self.expect(&Token::Semi)?;
                Stmt::Return(value)
            }
            Some(Token::Try) => {
                self.pos += 1;
                let body = self.block()?;
                self.expect(&Token::Catch)?;
                let variable = if self.eat(&Token::LParen) {
                    let name = self.expect_ident()?;
                    self.expect(&Token::RParen)?;
                    Some(name)
                } else {
                    None
                };
                let catch = CatchClause {
                    variable,
                    body: self.block()?,
                };
                Stmt::Try { body, catch }
            }
            Some(Token::Raise) => {
                self.pos += 1;
                let value = self.expr()?;
                self.expect(&Token::Semi)?;
                Stmt::Raise(value)
            }
            Some(Token::Import) => {
                self.pos += 1;
                let mut path = self.expect_ident()?;
                while self.eat(&Token::Dot) {
                    path.push('.');
                    path.push_str(&self.expect_ident()?);
                }
                self.expect(&Token::Semi)?;
                Stmt::Import(path)
            }
            _ if self.typed_name_ahead(None) => {
                let decl = self.var_decl()?;
                self.expect(&Token::Semi)?;
                decl
            }
            _ => {
                let expr = self.expr()?;
                self.expect(&Token::Semi)?;
                Stmt::Expr(expr)
            }
        };
        Ok(Spanned::new(stmt, start.to(self.prev_span())))
    }

    /// `var x [= e]` or `Type x [= e]`, without the terminator
    fn var_decl(&mut self) -> Result<Stmt> {
        let ty = if self.eat(&Token::Var) {
            None
        } else {
            Some(self.parse_type()?)
        };
        let name = self.expect_ident()?;
        let value = if self.eat(&Token::Eq) {
            Some(self.expr()?)
        } else {
            None
        };
        Ok(Stmt::VarDecl { name, ty, value })
    }

    fn if_stmt(&mut self) -> Result<Stmt> {
        self.expect(&Token::If)?;
        self.expect(&Token::LParen)?;
        let predicate = self.expr()?;
        self.expect(&Token::RParen)?;
        let body = self.statement()?.boxed();
        let else_body = if self.eat(&Token::Else) {
            Some(self.statement()?.boxed())
        } else {
            None
        };
        Ok(Stmt::If {
            predicate,
            body,
            else_body,
        })
    }

    fn for_stmt(&mut self) -> Result<Stmt> {
        self.expect(&Token::For)?;
        self.expect(&Token::LParen)?;

        let init = if self.check(&Token::Semi) {
            None
        } else {
            let start = self.span();
            let stmt = if self.check(&Token::Var) || self.typed_name_ahead(None) {
                self.var_decl()?
            } else {
                Stmt::Expr(self.expr()?)
            };
            Some(Spanned::new(stmt, start.to(self.prev_span())).boxed())
        };
        self.expect(&Token::Semi)?;

        let predicate = if self.check(&Token::Semi) {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect(&Token::Semi)?;

        let increment = if self.check(&Token::RParen) {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect(&Token::RParen)?;

        let body = self.statement()?.boxed();
        Ok(Stmt::For {
            init,
            predicate,
            increment,
            body,
        })
    }

    // ---- expressions ----

    fn expr(&mut self) -> Result<Spanned<Expr>> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Spanned<Expr>> {
        let target = self.or_expr()?;
        let op = match self.peek() {
            Some(Token::Eq) => AssignOp::Assign,
            Some(Token::PlusEq) => AssignOp::Add,
            Some(Token::MinusEq) => AssignOp::Subtract,
            Some(Token::StarEq) => AssignOp::Multiply,
            Some(Token::SlashEq) => AssignOp::Divide,
            _ => return Ok(target),
        };
        if !is_assignable(&target.node) {
            return Err(CompileError::parser("invalid assignment target", target.span));
        }
        self.pos += 1;
        let value = self.assignment()?;
        let span = target.span.to(value.span);
        Ok(Spanned::new(
            Expr::Assign {
                target: target.boxed(),
                op,
                value: value.boxed(),
            },
            span,
        ))
    }

    fn or_expr(&mut self) -> Result<Spanned<Expr>> {
        let mut left = self.and_expr()?;
        while self.eat(&Token::PipePipe) {
            let right = self.and_expr()?;
            left = logical(left, LogicOp::Or, right);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Spanned<Expr>> {
        let mut left = self.comparison()?;
        while self.eat(&Token::AmpAmp) {
            let right = self.comparison()?;
            left = logical(left, LogicOp::And, right);
        }
        Ok(left)
    }

    fn comparison(&mut self) -> Result<Spanned<Expr>> {
        let mut left = self.bitwise()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => LogicOp::Equals,
                Some(Token::NotEq) => LogicOp::NotEquals,
                Some(Token::Lt) => LogicOp::Less,
                Some(Token::Gt) => LogicOp::Greater,
                Some(Token::LtEq) => LogicOp::LessEq,
                Some(Token::GtEq) => LogicOp::GreaterEq,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.bitwise()?;
            left = logical(left, op, right);
        }
    }

    fn bitwise(&mut self) -> Result<Spanned<Expr>> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Amp) => BitOp::And,
                Some(Token::Pipe) => BitOp::Or,
                Some(Token::Caret) => BitOp::Xor,
                Some(Token::LtLt) => BitOp::ShiftLeft,
                Some(Token::GtGt) => BitOp::ShiftRight,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.additive()?;
            let span = left.span.to(right.span);
            left = Spanned::new(
                Expr::Bitwise {
                    left: left.boxed(),
                    op,
                    right: right.boxed(),
                },
                span,
            );
        }
    }

    fn additive(&mut self) -> Result<Spanned<Expr>> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithOp::Add,
                Some(Token::Minus) => ArithOp::Subtract,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.multiplicative()?;
            left = arithmetic(left, op, right);
        }
    }

    fn multiplicative(&mut self) -> Result<Spanned<Expr>> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => ArithOp::Multiply,
                Some(Token::Slash) => ArithOp::Divide,
                Some(Token::Percent) => ArithOp::Modulo,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = arithmetic(left, op, right);
        }
    }

    fn unary(&mut self) -> Result<Spanned<Expr>> {
        let start = self.span();
        let op = match self.peek() {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Negate,
            Some(Token::PlusPlus) => UnaryOp::Increment,
            Some(Token::MinusMinus) => UnaryOp::Decrement,
            _ => return self.postfix(),
        };
        self.pos += 1;
        let operand = self.unary()?;
        let span = start.to(operand.span);

        if op == UnaryOp::Negate {
            match operand.node {
                Expr::Literal(Literal::Int(n)) => {
                    return Ok(Spanned::new(Expr::Literal(Literal::Int(n.wrapping_neg())), span));
                }
                Expr::Literal(Literal::Float(n)) => {
                    return Ok(Spanned::new(Expr::Literal(Literal::Float(-n)), span));
                }
                _ => {}
            }
        }

        Ok(Spanned::new(
            Expr::Unary {
                op,
                prefix: true,
                operand: operand.boxed(),
            },
            span,
        ))
    }

    fn postfix(&mut self) -> Result<Spanned<Expr>> {
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    let seg_start = self.span();
                    let name = self.expect_ident()?;
                    let segment = if self.check(&Token::LParen) {
                        Segment::Call(Call {
                            name,
                            args: self.args()?,
                        })
                    } else {
                        Segment::Field(name)
                    };
                    expr = push_segment(expr, Spanned::new(segment, seg_start.to(self.prev_span())));
                }
                Some(Token::LBracket) => {
                    let seg_start = self.span();
                    self.pos += 1;
                    let index = self.expr()?;
                    self.expect(&Token::RBracket)?;
                    let span = expr.span.to(self.prev_span());
                    expr = match expr.node {
                        Expr::Chain { .. } => push_segment(
                            expr,
                            Spanned::new(
                                Segment::Index(index.boxed()),
                                seg_start.to(self.prev_span()),
                            ),
                        ),
                        _ => Spanned::new(
                            Expr::Index {
                                target: expr.boxed(),
                                index: index.boxed(),
                            },
                            span,
                        ),
                    };
                }
                Some(Token::PlusPlus | Token::MinusMinus) => {
                    let op = if self.check(&Token::PlusPlus) {
                        UnaryOp::Increment
                    } else {
                        UnaryOp::Decrement
                    };
                    self.pos += 1;
                    let span = expr.span.to(self.prev_span());
                    expr = Spanned::new(
                        Expr::Unary {
                            op,
                            prefix: false,
                            operand: expr.boxed(),
                        },
                        span,
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn args(&mut self) -> Result<Vec<Spanned<Expr>>> {
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen)?;
        Ok(args)
    }

    fn primary(&mut self) -> Result<Spanned<Expr>> {
        let start = self.span();
        let expr = match self.peek().cloned() {
            Some(Token::IntLit(n)) => {
                self.pos += 1;
                Expr::Literal(Literal::Int(n))
            }
            Some(Token::FloatLit(n)) => {
                self.pos += 1;
                Expr::Literal(Literal::Float(n))
            }
            Some(Token::StringLit(s)) => {
                self.pos += 1;
                Expr::Literal(Literal::Str(s))
            }
            Some(Token::True) => {
                self.pos += 1;
                Expr::Literal(Literal::Bool(true))
            }
            Some(Token::False) => {
                self.pos += 1;
                Expr::Literal(Literal::Bool(false))
            }
            Some(Token::Null) => {
                self.pos += 1;
                Expr::Literal(Literal::Null)
            }
            Some(Token::Ident(name)) => {
                if self.peek_at(1) == Some(&Token::FatArrow) {
                    self.pos += 2;
                    let params = vec![Param {
                        name,
                        ty: "var".to_string(),
                    }];
                    self.lambda_body(params)?
                } else if self.peek_at(1) == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.args()?;
                    Expr::Call(Call { name, args })
                } else {
                    self.pos += 1;
                    Expr::Ident(name)
                }
            }
            Some(Token::New) => {
                self.pos += 1;
                let ty = self.expect_ident()?;
                if self.eat(&Token::LBracket) {
                    let size = self.expr()?;
                    self.expect(&Token::RBracket)?;
                    Expr::NewArray {
                        element: ty,
                        size: size.boxed(),
                    }
                } else {
                    let args = self.args()?;
                    Expr::New { ty, args }
                }
            }
            Some(Token::LParen) if self.lambda_ahead() => {
                let params = self.lambda_params()?;
                self.expect(&Token::FatArrow)?;
                self.lambda_body(params)?
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.expr()?;
                self.expect(&Token::RParen)?;
                return Ok(Spanned::new(inner.node, start.to(self.prev_span())));
            }
            _ => return Err(self.unexpected("expression")),
        };
        Ok(Spanned::new(expr, start.to(self.prev_span())))
    }

    /// Lambda parameter lists are a parenthesized group directly followed by `=>`
    fn lambda_ahead(&self) -> bool {
        let mut depth = 0usize;
        let mut n = 0;
        while let Some(token) = self.peek_at(n) {
            match token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self.peek_at(n + 1) == Some(&Token::FatArrow);
                    }
                }
                _ => {}
            }
            n += 1;
        }
        false
    }

    /// `()`, `(a, b)`, `(int a, var b)`
    fn lambda_params(&mut self) -> Result<Vec<Param>> {
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(params);
        }
        loop {
            let param = if self.eat(&Token::Var) {
                Param {
                    name: self.expect_ident()?,
                    ty: "var".to_string(),
                }
            } else if self.typed_name_ahead(None) {
                let ty = self.parse_type()?;
                Param {
                    name: self.expect_ident()?,
                    ty,
                }
            } else {
                Param {
                    name: self.expect_ident()?,
                    ty: "var".to_string(),
                }
            };
            params.push(param);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen)?;
        Ok(params)
    }

    fn lambda_body(&mut self, params: Vec<Param>) -> Result<Expr> {
        let body = if self.check(&Token::LBrace) {
            LambdaBody::Block(self.block()?)
        } else {
            LambdaBody::Expr(self.expr()?.boxed())
        };
        Ok(Expr::Lambda(Rc::new(LambdaExpr { params, body })))
    }
}

fn is_assignable(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(_) | Expr::Index { .. } => true,
        Expr::Chain { segments, .. } => matches!(
            segments.last().map(|s| &s.node),
            Some(Segment::Field(_) | Segment::Index(_))
        ),
        _ => false,
    }
}

fn push_segment(expr: Spanned<Expr>, segment: Spanned<Segment>) -> Spanned<Expr> {
    let span = expr.span.to(segment.span);
    match expr.node {
        Expr::Chain { root, mut segments } => {
            segments.push(segment);
            Spanned::new(Expr::Chain { root, segments }, span)
        }
        node => Spanned::new(
            Expr::Chain {
                root: Spanned::new(node, expr.span).boxed(),
                segments: vec![segment],
            },
            span,
        ),
    }
}

fn logical(left: Spanned<Expr>, op: LogicOp, right: Spanned<Expr>) -> Spanned<Expr> {
    let span = left.span.to(right.span);
    Spanned::new(
        Expr::Logical {
            left: left.boxed(),
            op,
            right: right.boxed(),
        },
        span,
    )
}

fn arithmetic(left: Spanned<Expr>, op: ArithOp, right: Spanned<Expr>) -> Spanned<Expr> {
    let span = left.span.to(right.span);
    Spanned::new(
        Expr::Arithmetic {
            left: left.boxed(),
            op,
            right: right.boxed(),
        },
        span,
    )
}
