//! Recursive-descent parser producing a [`Program`]

use std::rc::Rc;

use super::ast::{
    AssignOp, BinaryOp, DeclKind, Expr, FunctionBody, FunctionDef, Literal, LogicalOp, Program,
    Stmt, UnaryOp, UpdateOp,
};
use super::error::{ScriptError, ScriptResult};
use super::lexer::{Keyword, Punct, Token, TokenKind, tokenize};

/// Deepest statement or expression nesting accepted from source text
pub const MAX_NESTING: usize = 128;

/// Parse source text into a program
pub fn parse(source: &str) -> ScriptResult<Program> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        loops: 0,
    };
    let mut body = Vec::new();
    while !parser.at_eof() {
        body.push(parser.statement()?);
    }
    Ok(Program { body })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Open statements, expressions and operator chains under the cursor
    depth: usize,
    /// Enclosing loops within the current function body
    loops: usize,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        kind
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    fn is_punct(&self, p: Punct) -> bool {
        matches!(self.peek(), TokenKind::Punct(q) if *q == p)
    }

    fn is_keyword(&self, k: Keyword) -> bool {
        matches!(self.peek(), TokenKind::Keyword(q) if *q == k)
    }

    fn eat_punct(&mut self, p: Punct) -> bool {
        if self.is_punct(p) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        let token = self.current();
        ScriptError::syntax(token.line, token.column, message)
    }

    fn unexpected(&self) -> ScriptError {
        self.error(format!("unexpected {}", self.peek().describe()))
    }

    fn expect_punct(&mut self, p: Punct) -> ScriptResult<()> {
        if self.eat_punct(p) {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected '{}' but found {}",
                p.as_str(),
                self.peek().describe()
            )))
        }
    }

    fn expect_ident(&mut self) -> ScriptResult<String> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(self.error(format!("expected identifier but found {}", other.describe()))),
        }
    }

    /// Identifier or keyword used as a property name
    fn property_name(&mut self) -> ScriptResult<String> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            TokenKind::Keyword(k) => {
                self.advance();
                Ok(k.as_str().to_string())
            }
            other => Err(self.error(format!(
                "expected property name but found {}",
                other.describe()
            ))),
        }
    }

    fn end_statement(&mut self) {
        self.eat_punct(Punct::Semicolon);
    }

    fn previous_line(&self) -> usize {
        self.tokens[self.pos.saturating_sub(1)].line
    }

    fn deeper(&mut self) -> ScriptResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error(format!(
                "program is nested more than {} levels deep",
                MAX_NESTING
            )));
        }
        Ok(())
    }

    fn nested<T>(&mut self, f: fn(&mut Self) -> ScriptResult<T>) -> ScriptResult<T> {
        self.deeper()?;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Parse a loop body, allowing `break` and `continue` inside it
    fn loop_body(&mut self) -> ScriptResult<Box<Stmt>> {
        self.loops += 1;
        let body = self.statement();
        self.loops -= 1;
        Ok(Box::new(body?))
    }

    /// Parse a function body with no enclosing loop
    fn function_scope<T>(&mut self, f: fn(&mut Self) -> ScriptResult<T>) -> ScriptResult<T> {
        let loops = std::mem::take(&mut self.loops);
        let result = f(self);
        self.loops = loops;
        result
    }

    // Statements

    fn statement(&mut self) -> ScriptResult<Stmt> {
        self.nested(Self::bare_statement)
    }

    fn bare_statement(&mut self) -> ScriptResult<Stmt> {
        match self.peek() {
            TokenKind::Punct(Punct::LBrace) => Ok(Stmt::Block(self.block()?)),
            TokenKind::Punct(Punct::Semicolon) => {
                self.advance();
                Ok(Stmt::Empty)
            }
            TokenKind::Keyword(Keyword::Const) => self.declaration(DeclKind::Const),
            TokenKind::Keyword(Keyword::Let) => self.declaration(DeclKind::Let),
            TokenKind::Keyword(Keyword::Var) => self.declaration(DeclKind::Var),
            TokenKind::Keyword(Keyword::Function)
                if matches!(self.peek_at(1), TokenKind::Ident(_)) =>
            {
                self.advance();
                let def = self.function_rest(true)?;
                Ok(Stmt::Function(Rc::new(def)))
            }
            TokenKind::Keyword(Keyword::Return) => {
                self.advance();
                let value = if self.is_punct(Punct::Semicolon)
                    || self.is_punct(Punct::RBrace)
                    || self.at_eof()
                {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.end_statement();
                Ok(Stmt::Return(value))
            }
            TokenKind::Keyword(Keyword::If) => {
                self.advance();
                self.expect_punct(Punct::LParen)?;
                let cond = self.expression()?;
                self.expect_punct(Punct::RParen)?;
                let then = Box::new(self.statement()?);
                let otherwise = if self.is_keyword(Keyword::Else) {
                    self.advance();
                    Some(Box::new(self.statement()?))
                } else {
                    None
                };
                Ok(Stmt::If {
                    cond,
                    then,
                    otherwise,
                })
            }
            TokenKind::Keyword(Keyword::For) => self.for_loop(),
            TokenKind::Keyword(Keyword::While) => {
                self.advance();
                self.expect_punct(Punct::LParen)?;
                let cond = self.expression()?;
                self.expect_punct(Punct::RParen)?;
                let body = self.loop_body()?;
                Ok(Stmt::While { cond, body })
            }
            TokenKind::Keyword(word @ (Keyword::Break | Keyword::Continue)) => {
                let word = *word;
                if self.loops == 0 {
                    return Err(self.error(format!(
                        "'{}' is only valid inside a loop",
                        word.as_str()
                    )));
                }
                self.advance();
                self.end_statement();
                Ok(if word == Keyword::Break {
                    Stmt::Break
                } else {
                    Stmt::Continue
                })
            }
            TokenKind::Keyword(Keyword::Throw) => {
                self.advance();
                let value = self.expression()?;
                self.end_statement();
                Ok(Stmt::Throw(value))
            }
            _ => {
                let expr = self.expression()?;
                self.end_statement();
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn block(&mut self) -> ScriptResult<Vec<Stmt>> {
        self.expect_punct(Punct::LBrace)?;
        let mut body = Vec::new();
        while !self.is_punct(Punct::RBrace) {
            if self.at_eof() {
                return Err(self.error("expected '}' before end of input"));
            }
            body.push(self.statement()?);
        }
        self.advance();
        Ok(body)
    }

    fn declaration(&mut self, kind: DeclKind) -> ScriptResult<Stmt> {
        let stmt = self.declaration_list(kind)?;
        self.end_statement();
        Ok(stmt)
    }

    /// Bindings of a declaration, without the terminating `;`
    fn declaration_list(&mut self, kind: DeclKind) -> ScriptResult<Stmt> {
        self.advance();
        let mut bindings = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let init = if self.eat_punct(Punct::Assign) {
                Some(self.assignment()?)
            } else {
                if kind == DeclKind::Const {
                    return Err(self.error(format!(
                        "missing initializer in const declaration of '{}'",
                        name
                    )));
                }
                None
            };
            bindings.push((name, init));
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        Ok(Stmt::Declare { kind, bindings })
    }

    fn decl_kind(&self) -> Option<DeclKind> {
        match self.peek() {
            TokenKind::Keyword(Keyword::Const) => Some(DeclKind::Const),
            TokenKind::Keyword(Keyword::Let) => Some(DeclKind::Let),
            TokenKind::Keyword(Keyword::Var) => Some(DeclKind::Var),
            _ => None,
        }
    }

    /// `for (const x of items)` or `for (init; cond; update)`
    fn for_loop(&mut self) -> ScriptResult<Stmt> {
        self.advance();
        self.expect_punct(Punct::LParen)?;
        let kind = self.decl_kind();
        let is_for_of = matches!(self.peek_at(1), TokenKind::Ident(_))
            && matches!(self.peek_at(2), TokenKind::Ident(word) if word == "of");
        if let (true, Some(kind)) = (is_for_of, kind.clone()) {
            self.advance();
            let name = self.expect_ident()?;
            self.advance();
            let iterable = self.expression()?;
            self.expect_punct(Punct::RParen)?;
            let body = self.loop_body()?;
            return Ok(Stmt::ForOf {
                kind,
                name,
                iterable,
                body,
            });
        }

        let init = if self.is_punct(Punct::Semicolon) {
            None
        } else if let Some(kind) = kind {
            Some(Box::new(self.declaration_list(kind)?))
        } else {
            Some(Box::new(Stmt::Expr(self.expression()?)))
        };
        self.expect_punct(Punct::Semicolon)?;
        let cond = if self.is_punct(Punct::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_punct(Punct::Semicolon)?;
        let update = if self.is_punct(Punct::RParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_punct(Punct::RParen)?;
        let body = self.loop_body()?;
        Ok(Stmt::For {
            init,
            cond,
            update,
            body,
        })
    }

    /// Parse `name? (params) { body }` after the `function` keyword
    fn function_rest(&mut self, named: bool) -> ScriptResult<FunctionDef> {
        let name = if named || matches!(self.peek(), TokenKind::Ident(_)) {
            Some(self.expect_ident()?)
        } else {
            None
        };
        self.expect_punct(Punct::LParen)?;
        let params = self.param_list()?;
        let body = FunctionBody::Block(self.function_scope(Self::block)?);
        Ok(FunctionDef { name, params, body })
    }

    /// Parameters up to and including the closing `)`
    fn param_list(&mut self) -> ScriptResult<Vec<String>> {
        let mut params = Vec::new();
        if self.eat_punct(Punct::RParen) {
            return Ok(params);
        }
        loop {
            params.push(self.expect_ident()?);
            if self.eat_punct(Punct::RParen) {
                return Ok(params);
            }
            self.expect_punct(Punct::Comma)?;
            if self.eat_punct(Punct::RParen) {
                return Ok(params);
            }
        }
    }

    // Expressions

    fn expression(&mut self) -> ScriptResult<Expr> {
        self.assignment()
    }

    /// Whether the tokens at the cursor start `(a, b) =>`
    fn arrow_ahead(&self) -> bool {
        let mut offset = 1;
        let mut expect_ident = true;
        loop {
            match self.peek_at(offset) {
                TokenKind::Punct(Punct::RParen) => {
                    return matches!(self.peek_at(offset + 1), TokenKind::Punct(Punct::Arrow));
                }
                TokenKind::Ident(_) if expect_ident => expect_ident = false,
                TokenKind::Punct(Punct::Comma) if !expect_ident => expect_ident = true,
                _ => return false,
            }
            offset += 1;
        }
    }

    fn arrow_body(&mut self, params: Vec<String>) -> ScriptResult<Expr> {
        let body = if self.is_punct(Punct::LBrace) {
            FunctionBody::Block(self.function_scope(Self::block)?)
        } else {
            FunctionBody::Expr(Box::new(self.assignment()?))
        };
        Ok(Expr::Function(Rc::new(FunctionDef {
            name: None,
            params,
            body,
        })))
    }

    fn assignment(&mut self) -> ScriptResult<Expr> {
        self.nested(Self::bare_assignment)
    }

    fn bare_assignment(&mut self) -> ScriptResult<Expr> {
        if let TokenKind::Ident(name) = self.peek().clone() {
            if matches!(self.peek_at(1), TokenKind::Punct(Punct::Arrow)) {
                self.advance();
                self.advance();
                return self.arrow_body(vec![name]);
            }
        }
        if self.is_punct(Punct::LParen) && self.arrow_ahead() {
            self.advance();
            let params = self.param_list()?;
            self.expect_punct(Punct::Arrow)?;
            return self.arrow_body(params);
        }

        let target = self.conditional()?;
        let op = match self.peek() {
            TokenKind::Punct(Punct::Assign) => AssignOp::Set,
            TokenKind::Punct(Punct::PlusAssign) => AssignOp::Add,
            TokenKind::Punct(Punct::MinusAssign) => AssignOp::Sub,
            _ => return Ok(target),
        };
        if !matches!(
            target,
            Expr::Ident(_) | Expr::Member { .. } | Expr::Index { .. }
        ) {
            return Err(self.error("invalid assignment target"));
        }
        self.advance();
        let value = self.assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn conditional(&mut self) -> ScriptResult<Expr> {
        let cond = self.nullish()?;
        if !self.eat_punct(Punct::Question) {
            return Ok(cond);
        }
        let then = self.assignment()?;
        self.expect_punct(Punct::Colon)?;
        let otherwise = self.assignment()?;
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn nullish(&mut self) -> ScriptResult<Expr> {
        let base = self.depth;
        let mut left = self.logical_or()?;
        while self.eat_punct(Punct::QuestionQuestion) {
            self.deeper()?;
            let right = self.logical_or()?;
            left = Expr::Logical {
                op: LogicalOp::Nullish,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = base;
        Ok(left)
    }

    fn logical_or(&mut self) -> ScriptResult<Expr> {
        let base = self.depth;
        let mut left = self.logical_and()?;
        while self.eat_punct(Punct::OrOr) {
            self.deeper()?;
            let right = self.logical_and()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = base;
        Ok(left)
    }

    fn logical_and(&mut self) -> ScriptResult<Expr> {
        let base = self.depth;
        let mut left = self.equality()?;
        while self.eat_punct(Punct::AndAnd) {
            self.deeper()?;
            let right = self.equality()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = base;
        Ok(left)
    }

    fn binary_level(
        &mut self,
        ops: &[(Punct, BinaryOp)],
        next: fn(&mut Self) -> ScriptResult<Expr>,
    ) -> ScriptResult<Expr> {
        let base = self.depth;
        let mut left = next(self)?;
        'outer: loop {
            for (punct, op) in ops {
                if self.eat_punct(*punct) {
                    self.deeper()?;
                    let right = next(self)?;
                    left = Expr::Binary {
                        op: *op,
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                    continue 'outer;
                }
            }
            self.depth = base;
            return Ok(left);
        }
    }

    fn equality(&mut self) -> ScriptResult<Expr> {
        self.binary_level(
            &[
                (Punct::StrictEq, BinaryOp::StrictEq),
                (Punct::StrictNotEq, BinaryOp::StrictNotEq),
                (Punct::Eq, BinaryOp::Eq),
                (Punct::NotEq, BinaryOp::NotEq),
            ],
            Self::relational,
        )
    }

    fn relational(&mut self) -> ScriptResult<Expr> {
        self.binary_level(
            &[
                (Punct::Lt, BinaryOp::Lt),
                (Punct::Le, BinaryOp::Le),
                (Punct::Gt, BinaryOp::Gt),
                (Punct::Ge, BinaryOp::Ge),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> ScriptResult<Expr> {
        self.binary_level(
            &[(Punct::Plus, BinaryOp::Add), (Punct::Minus, BinaryOp::Sub)],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> ScriptResult<Expr> {
        self.binary_level(
            &[
                (Punct::Star, BinaryOp::Mul),
                (Punct::Slash, BinaryOp::Div),
                (Punct::Percent, BinaryOp::Rem),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> ScriptResult<Expr> {
        let update = match self.peek() {
            TokenKind::Punct(Punct::PlusPlus) => Some(UpdateOp::Increment),
            TokenKind::Punct(Punct::MinusMinus) => Some(UpdateOp::Decrement),
            _ => None,
        };
        if let Some(op) = update {
            self.advance();
            let target = self.nested(Self::unary)?;
            return self.update(op, true, target);
        }

        let op = match self.peek() {
            TokenKind::Punct(Punct::Bang) => UnaryOp::Not,
            TokenKind::Punct(Punct::Minus) => UnaryOp::Neg,
            TokenKind::Punct(Punct::Plus) => UnaryOp::Plus,
            TokenKind::Keyword(Keyword::Typeof) => UnaryOp::Typeof,
            _ => return self.postfix_update(),
        };
        self.advance();
        let operand = self.nested(Self::unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn update(&self, op: UpdateOp, prefix: bool, target: Expr) -> ScriptResult<Expr> {
        if !matches!(
            target,
            Expr::Ident(_) | Expr::Member { .. } | Expr::Index { .. }
        ) {
            return Err(self.error("invalid update target"));
        }
        Ok(Expr::Update {
            op,
            prefix,
            target: Box::new(target),
        })
    }

    fn postfix_update(&mut self) -> ScriptResult<Expr> {
        let expr = self.postfix()?;
        let op = match self.peek() {
            TokenKind::Punct(Punct::PlusPlus) => UpdateOp::Increment,
            TokenKind::Punct(Punct::MinusMinus) => UpdateOp::Decrement,
            _ => return Ok(expr),
        };
        // A line break before `++` ends the statement
        if self.current().line != self.previous_line() {
            return Ok(expr);
        }
        self.advance();
        self.update(op, false, expr)
    }

    fn postfix(&mut self) -> ScriptResult<Expr> {
        let base = self.depth;
        let mut expr = self.primary()?;
        loop {
            if !matches!(
                self.peek(),
                TokenKind::Punct(Punct::Dot | Punct::QuestionDot | Punct::LBracket | Punct::LParen)
            ) {
                self.depth = base;
                return Ok(expr);
            }
            self.deeper()?;
            if self.eat_punct(Punct::Dot) {
                let property = self.property_name()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                    optional: false,
                };
            } else if self.eat_punct(Punct::QuestionDot) {
                if self.eat_punct(Punct::LBracket) {
                    let index = self.expression()?;
                    self.expect_punct(Punct::RBracket)?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        optional: true,
                    };
                } else if self.eat_punct(Punct::LParen) {
                    let args = self.arguments()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        optional: true,
                    };
                } else {
                    let property = self.property_name()?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                        optional: true,
                    };
                }
            } else if self.eat_punct(Punct::LBracket) {
                let index = self.expression()?;
                self.expect_punct(Punct::RBracket)?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    optional: false,
                };
            } else if self.eat_punct(Punct::LParen) {
                let args = self.arguments()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    optional: false,
                };
            } else {
                self.depth = base;
                return Ok(expr);
            }
        }
    }

    /// Call arguments after the opening `(`
    fn arguments(&mut self) -> ScriptResult<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.eat_punct(Punct::RParen) {
            args.push(self.assignment()?);
            if !self.is_punct(Punct::RParen) {
                self.expect_punct(Punct::Comma)?;
            }
        }
        Ok(args)
    }

    fn primary(&mut self) -> ScriptResult<Expr> {
        match self.peek().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Number(n)))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Literal(Literal::Str(s)))
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::Ident(name))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(false)))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            TokenKind::Keyword(Keyword::Undefined) => {
                self.advance();
                Ok(Expr::Literal(Literal::Undefined))
            }
            TokenKind::Keyword(Keyword::Function) => {
                self.advance();
                let def = self.function_rest(false)?;
                Ok(Expr::Function(Rc::new(def)))
            }
            TokenKind::Keyword(Keyword::New) => {
                self.advance();
                let callee = self.expect_ident()?;
                let args = if self.eat_punct(Punct::LParen) {
                    self.arguments()?
                } else {
                    Vec::new()
                };
                Ok(Expr::New { callee, args })
            }
            TokenKind::Punct(Punct::LParen) => {
                self.advance();
                let expr = self.expression()?;
                self.expect_punct(Punct::RParen)?;
                Ok(expr)
            }
            TokenKind::Punct(Punct::LBracket) => {
                self.advance();
                let mut items = Vec::new();
                while !self.eat_punct(Punct::RBracket) {
                    items.push(self.assignment()?);
                    if !self.is_punct(Punct::RBracket) {
                        self.expect_punct(Punct::Comma)?;
                    }
                }
                Ok(Expr::Array(items))
            }
            TokenKind::Punct(Punct::LBrace) => self.object_literal(),
            _ => Err(self.unexpected()),
        }
    }

    fn object_literal(&mut self) -> ScriptResult<Expr> {
        self.expect_punct(Punct::LBrace)?;
        let mut entries = Vec::new();
        while !self.eat_punct(Punct::RBrace) {
            let (key, shorthand_ok) = match self.advance() {
                TokenKind::Ident(name) => (name, true),
                TokenKind::Str(s) => (s, false),
                TokenKind::Number(n) => (super::value::number_to_string(n), false),
                TokenKind::Keyword(k) => (k.as_str().to_string(), false),
                other => {
                    return Err(self.error(format!(
                        "expected property name but found {}",
                        other.describe()
                    )));
                }
            };
            if self.eat_punct(Punct::Colon) {
                entries.push((key, self.assignment()?));
            } else if shorthand_ok {
                entries.push((key.clone(), Expr::Ident(key)));
            } else {
                return Err(self.error(format!("expected ':' after property '{}'", key)));
            }
            if !self.is_punct(Punct::RBrace) {
                self.expect_punct(Punct::Comma)?;
            }
        }
        Ok(Expr::Object(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_expr(source: &str) -> Expr {
        let program = parse(source).unwrap();
        match program.body.into_iter().next() {
            Some(Stmt::Expr(expr)) => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expr("1 + 2 * 3");
        let Expr::Binary { op, right, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_arrow_functions() {
        let expr = parse_expr("items.map(item => item.x)");
        let Expr::Call { args, .. } = expr else {
            panic!("expected call");
        };
        let Expr::Function(def) = &args[0] else {
            panic!("expected function argument");
        };
        assert_eq!(def.params, vec!["item"]);
        assert!(matches!(def.body, FunctionBody::Expr(_)));

        let expr = parse_expr("((a, b) => { return a + b; })");
        let Expr::Function(def) = expr else {
            panic!("expected function");
        };
        assert_eq!(def.params, vec!["a", "b"]);
        assert!(matches!(def.body, FunctionBody::Block(_)));
    }

    #[test]
    fn test_parenthesized_expression_is_not_arrow() {
        let expr = parse_expr("(a + b) * c");
        assert!(matches!(expr, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_generated_program_shape() {
        let program = parse(
            "const dispatch = {\n  a: function(x) { return x; }\n};\n\nfunction convertData(data) {\n  return {\n    // Input: x: string\n    a: dispatch.a(data.x)\n  };\n}",
        )
        .unwrap();
        assert_eq!(program.body.len(), 2);
        assert!(matches!(program.body[0], Stmt::Declare { kind: DeclKind::Const, .. }));
        assert!(matches!(program.body[1], Stmt::Function(_)));
    }

    #[test]
    fn test_object_literal_keys() {
        let expr = parse_expr("({ a, \"first name\": 1, 2: x, default: y, })");
        let Expr::Object(entries) = expr else {
            panic!("expected object");
        };
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "first name", "2", "default"]);
    }

    #[test]
    fn test_statements() {
        let program = parse(
            "let total = 0; for (const p of pages) { if (p > 1) total += p; else { total -= 1 } } throw new Error('x')",
        )
        .unwrap();
        assert_eq!(program.body.len(), 3);
        assert!(matches!(program.body[1], Stmt::ForOf { .. }));
        assert!(matches!(program.body[2], Stmt::Throw(_)));
    }

    #[test]
    fn test_optional_chaining() {
        let expr = parse_expr("a?.b?.[0]");
        assert!(matches!(expr, Expr::Index { optional: true, .. }));
    }

    #[test]
    fn test_syntax_errors() {
        let err = parse("return x +").unwrap_err();
        assert!(err.is_syntax());

        let err = parse("function f(a { }").unwrap_err();
        assert!(err.to_string().contains("expected"));

        let err = parse("const x;").unwrap_err();
        assert!(err.to_string().contains("missing initializer"));

        let err = parse("1 = 2").unwrap_err();
        assert!(err.to_string().contains("invalid assignment target"));

        let err = parse("{ a: 1").unwrap_err();
        assert!(err.is_syntax());

        let err = parse("for (let i = 0 i < 3; i++) {}").unwrap_err();
        assert!(err.to_string().contains("expected ';'"));

        let err = parse("function f(x) { break; }").unwrap_err();
        assert!(err.to_string().contains("'break' is only valid inside a loop"));

        let err = parse("while (x) { const f = () => { continue; }; }").unwrap_err();
        assert!(err.to_string().contains("'continue' is only valid inside a loop"));

        let err = parse("f()++").unwrap_err();
        assert!(err.to_string().contains("invalid update target"));
    }

    #[test]
    fn test_loops() {
        let program = parse(
            "for (let i = 0; i < n; i++) { if (i > 2) break; } while (j--) continue; for (;;) {}",
        )
        .unwrap();
        assert_eq!(program.body.len(), 3);
        let Stmt::For {
            init,
            cond,
            update,
            ..
        } = &program.body[0]
        else {
            panic!("expected for loop");
        };
        assert!(matches!(init.as_deref(), Some(Stmt::Declare { kind: DeclKind::Let, .. })));
        assert!(matches!(cond, Some(Expr::Binary { op: BinaryOp::Lt, .. })));
        assert!(matches!(
            update,
            Some(Expr::Update {
                op: UpdateOp::Increment,
                prefix: false,
                ..
            })
        ));
        assert!(matches!(program.body[1], Stmt::While { .. }));
        assert!(matches!(
            program.body[2],
            Stmt::For {
                init: None,
                cond: None,
                update: None,
                ..
            }
        ));
    }

    #[test]
    fn test_update_expressions() {
        assert!(matches!(
            parse_expr("--counts[k]"),
            Expr::Update {
                op: UpdateOp::Decrement,
                prefix: true,
                ..
            }
        ));

        // `++` after a line break applies to the next statement
        let program = parse("a\n++b").unwrap();
        assert_eq!(program.body.len(), 2);
        assert!(matches!(
            program.body[1],
            Stmt::Expr(Expr::Update { prefix: true, .. })
        ));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let source = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        let err = parse(&source).unwrap_err();
        assert!(err.is_syntax());
        assert!(err.to_string().contains("nested more than 128 levels"));

        let long_sum = vec!["1"; 10_000].join(" + ");
        assert!(parse(&long_sum).unwrap_err().is_syntax());

        let long_chain = format!("a{}", ".b".repeat(10_000));
        assert!(parse(&long_chain).unwrap_err().is_syntax());

        let blocks = format!("{}{}", "{".repeat(10_000), "}".repeat(10_000));
        assert!(parse(&blocks).unwrap_err().is_syntax());

        let nested = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert!(parse(&nested).is_ok());
    }

    #[test]
    fn test_return_without_value() {
        let program = parse("function f() { return; }").unwrap();
        let Stmt::Function(def) = &program.body[0] else {
            panic!("expected function");
        };
        let FunctionBody::Block(body) = &def.body else {
            panic!("expected block body");
        };
        assert_eq!(body[0], Stmt::Return(None));
    }
}
