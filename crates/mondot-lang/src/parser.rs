use crate::ast::{Expr, Handler, Program, Stmt, Unit};
use crate::error::ParseError;
use crate::lexer::{Lexer, Token, TokenKind};

/// Parse a whole source file into a [`Program`].
pub fn parse_program(src: &str) -> Result<Program, ParseError> {
    Parser::new(src)?.program()
}

/// Recursive-descent parser over the token stream.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur: Token,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(src);
        let cur = lexer.next_token()?;
        Ok(Self { lexer, cur })
    }

    fn bump(&mut self) -> Result<(), ParseError> {
        self.cur = self.lexer.next_token()?;
        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.cur.line, self.cur.col)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ParseError> {
        if self.cur.kind == kind {
            self.bump()
        } else {
            Err(self.error(format!("expected {}, got {:?}", what, self.cur.kind)))
        }
    }

    fn ident(&mut self, what: &str) -> Result<String, ParseError> {
        match &self.cur.kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.bump()?;
                Ok(name)
            }
            other => Err(self.error(format!("expected {}, got {:?}", what, other))),
        }
    }

    pub fn program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::default();
        while self.cur.kind != TokenKind::Eof {
            if self.cur.kind != TokenKind::KwUnit {
                return Err(self.error("expected `unit` at top level"));
            }
            program.units.push(self.unit()?);
        }
        Ok(program)
    }

    fn unit(&mut self) -> Result<Unit, ParseError> {
        self.expect(TokenKind::KwUnit, "`unit`")?;
        let name = self.ident("unit name")?;
        self.expect(TokenKind::LBrace, "`{`")?;
        let mut handlers = Vec::new();
        while self.cur.kind != TokenKind::RBrace {
            if self.cur.kind != TokenKind::KwOn {
                return Err(self.error("expected `on` inside unit"));
            }
            handlers.push(self.handler()?);
        }
        self.expect(TokenKind::RBrace, "`}`")?;
        Ok(Unit { name, handlers })
    }

    fn handler(&mut self) -> Result<Handler, ParseError> {
        self.expect(TokenKind::KwOn, "`on`")?;
        let name = self.ident("event name")?;
        self.expect(TokenKind::Arrow, "`->`")?;
        let params = self.param_list()?;

        let mut body = Vec::new();
        while self.cur.kind != TokenKind::KwEnd {
            if self.cur.kind == TokenKind::Semicolon {
                self.bump()?;
                continue;
            }
            body.push(self.statement()?);
        }
        self.expect(TokenKind::KwEnd, "`end`")?;
        Ok(Handler { name, params, body })
    }

    fn param_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect(TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        if self.cur.kind != TokenKind::RParen {
            params.push(self.ident("parameter name")?);
            while self.cur.kind == TokenKind::Comma {
                self.bump()?;
                params.push(self.ident("parameter name")?);
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(params)
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        match &self.cur.kind {
            TokenKind::KwLocal => {
                self.bump()?;
                let name = self.ident("identifier after `local`")?;
                let init = if self.cur.kind == TokenKind::Equal {
                    self.bump()?;
                    Some(self.expression()?)
                } else {
                    None
                };
                self.expect(TokenKind::Semicolon, "`;`")?;
                Ok(Stmt::Local { name, init })
            }
            TokenKind::KwIf => self.if_statement(),
            TokenKind::KwWhile => {
                self.bump()?;
                self.expect(TokenKind::LParen, "`(`")?;
                let cond = self.expression()?;
                self.expect(TokenKind::RParen, "`)`")?;
                let body = self.block_until(&[TokenKind::KwEnd])?;
                self.expect(TokenKind::KwEnd, "`end`")?;
                Ok(Stmt::While { cond, body })
            }
            TokenKind::KwForeach => {
                self.bump()?;
                let var = self.ident("identifier after `foreach`")?;
                self.expect(TokenKind::KwIn, "`in`")?;
                let iter = self.expression()?;
                let body = self.block_until(&[TokenKind::KwEnd])?;
                self.expect(TokenKind::KwEnd, "`end`")?;
                Ok(Stmt::Foreach { var, iter, body })
            }
            TokenKind::KwReturn => {
                self.bump()?;
                let expr = self.expression()?;
                self.expect(TokenKind::Semicolon, "`;`")?;
                Ok(Stmt::Return(expr))
            }
            TokenKind::Ident(_) => {
                let name = self.ident("identifier")?;
                match self.cur.kind {
                    TokenKind::Equal => {
                        self.bump()?;
                        let expr = self.expression()?;
                        self.expect(TokenKind::Semicolon, "`;`")?;
                        Ok(Stmt::Assign { name, expr })
                    }
                    TokenKind::LParen => {
                        let call = self.call_expr(name)?;
                        self.expect(TokenKind::Semicolon, "`;`")?;
                        Ok(Stmt::Expr(call))
                    }
                    _ => Err(self.error(format!(
                        "expected `=` or `(` after identifier, got {:?}",
                        self.cur.kind
                    ))),
                }
            }
            // A bare literal in statement position parses; the compiler
            // rejects it as a non-call expression statement.
            TokenKind::Number(_) | TokenKind::Str(_) => {
                let expr = self.expression()?;
                self.expect(TokenKind::Semicolon, "`;`")?;
                Ok(Stmt::Expr(expr))
            }
            other => Err(self.error(format!("unexpected token in statement: {:?}", other))),
        }
    }

    fn if_statement(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::KwIf, "`if`")?;
        self.expect(TokenKind::LParen, "`(`")?;
        let cond = self.expression()?;
        self.expect(TokenKind::RParen, "`)`")?;
        let then_body =
            self.block_until(&[TokenKind::KwElseif, TokenKind::KwElse, TokenKind::KwEnd])?;

        let mut elseifs = Vec::new();
        while self.cur.kind == TokenKind::KwElseif {
            self.bump()?;
            self.expect(TokenKind::LParen, "`(`")?;
            let econd = self.expression()?;
            self.expect(TokenKind::RParen, "`)`")?;
            let ebody =
                self.block_until(&[TokenKind::KwElseif, TokenKind::KwElse, TokenKind::KwEnd])?;
            elseifs.push((econd, ebody));
        }

        let else_body = if self.cur.kind == TokenKind::KwElse {
            self.bump()?;
            self.block_until(&[TokenKind::KwEnd])?
        } else {
            Vec::new()
        };

        self.expect(TokenKind::KwEnd, "`end`")?;
        Ok(Stmt::If {
            cond,
            then_body,
            elseifs,
            else_body,
        })
    }

    fn block_until(&mut self, stops: &[TokenKind]) -> Result<Vec<Stmt>, ParseError> {
        let mut body = Vec::new();
        while !stops.contains(&self.cur.kind) {
            if self.cur.kind == TokenKind::Eof {
                return Err(self.error("unexpected end of input in block"));
            }
            body.push(self.statement()?);
        }
        Ok(body)
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        match self.cur.kind.clone() {
            TokenKind::Number(n) => {
                self.bump()?;
                Ok(Expr::Number(n))
            }
            TokenKind::Str(s) => {
                self.bump()?;
                Ok(Expr::Str(s))
            }
            TokenKind::True => {
                self.bump()?;
                Ok(Expr::Bool(true))
            }
            TokenKind::False => {
                self.bump()?;
                Ok(Expr::Bool(false))
            }
            TokenKind::Nil => {
                self.bump()?;
                Ok(Expr::Nil)
            }
            TokenKind::Ident(name) => {
                self.bump()?;
                if self.cur.kind == TokenKind::LParen {
                    self.call_expr(name)
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            TokenKind::LParen => self.func_literal(),
            other => Err(self.error(format!("expected expression, got {:?}", other))),
        }
    }

    fn call_expr(&mut self, name: String) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        if self.cur.kind != TokenKind::RParen {
            args.push(self.expression()?);
            while self.cur.kind == TokenKind::Comma {
                self.bump()?;
                args.push(self.expression()?);
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(Expr::Call { name, args })
    }

    /// `(p1, p2) stmts... end` - accepted here, rejected by the compiler.
    fn func_literal(&mut self) -> Result<Expr, ParseError> {
        let params = self.param_list()?;
        let body = self.block_until(&[TokenKind::KwEnd])?;
        self.expect(TokenKind::KwEnd, "`end`")?;
        Ok(Expr::Func { params, body })
    }
}
