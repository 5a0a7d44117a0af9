//! Recursive-descent parser.
//!
//! Precedence climbs, loosest to tightest, per spec.md §6.1:
//! `||` < `&&` < `==`/`!=` < relational < additive < multiplicative < unary.
//! Dangling `else` always binds to the nearest unmatched `if`, which falls
//! out for free here: `parse_stmt` greedily consumes a trailing `else` right
//! after parsing the `if`'s then-branch, before returning to any enclosing
//! caller.

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};
use kirc_util::{Span, Symbol};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn span(&self) -> Span {
        self.tokens[self.pos].span
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn describe(kind: &TokenKind) -> String {
        format!("{kind:?}")
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if *self.peek() == kind {
            Ok(self.bump())
        } else if *self.peek() == TokenKind::Eof {
            Err(ParseError::UnexpectedEof {
                expected: Self::describe(&kind),
            })
        } else {
            Err(ParseError::UnexpectedToken {
                found: Self::describe(self.peek()),
                expected: Self::describe(&kind),
            })
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self) -> Result<(Symbol, Span), ParseError> {
        let span = self.span();
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.bump();
                Ok((Symbol::intern(&name), span))
            }
            TokenKind::Eof => Err(ParseError::UnexpectedEof {
                expected: "identifier".into(),
            }),
            other => Err(ParseError::UnexpectedToken {
                found: Self::describe(&other),
                expected: "identifier".into(),
            }),
        }
    }

    pub fn parse_comp_unit(mut self) -> Result<CompUnit, ParseError> {
        let mut items = Vec::new();
        while *self.peek() != TokenKind::Eof {
            items.push(self.parse_item()?);
        }
        Ok(CompUnit { items })
    }

    fn parse_item(&mut self) -> Result<Item, ParseError> {
        if *self.peek() == TokenKind::KwConst {
            return Ok(Item::Decl(self.parse_const_decl()?));
        }

        let start = self.span();
        let ret_ty = self.parse_type()?;
        let (name, _) = self.expect_ident()?;

        if self.eat(&TokenKind::LParen) {
            let mut params = Vec::new();
            if *self.peek() != TokenKind::RParen {
                loop {
                    self.parse_type()?;
                    let (pname, pspan) = self.expect_ident()?;
                    params.push(Param {
                        name: pname,
                        span: pspan,
                    });
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen)?;
            let body = self.parse_block()?;
            let span = start.to(body.span);
            Ok(Item::Func(FuncDef {
                name,
                ret_ty,
                params,
                body,
                span,
            }))
        } else {
            // Top-level variable declaration: `int x, y = 1;`.
            let mut defs = vec![self.parse_var_def(name, start)?];
            while self.eat(&TokenKind::Comma) {
                let (dname, dspan) = self.expect_ident()?;
                defs.push(self.parse_var_def(dname, dspan)?);
            }
            self.expect(TokenKind::Semi)?;
            Ok(Item::Decl(Decl::Var(VarDecl { defs })))
        }
    }

    fn parse_type(&mut self) -> Result<Type, ParseError> {
        if self.eat(&TokenKind::KwInt) {
            Ok(Type::Int)
        } else if self.eat(&TokenKind::KwVoid) {
            Ok(Type::Void)
        } else {
            Err(ParseError::UnexpectedToken {
                found: Self::describe(self.peek()),
                expected: "'int' or 'void'".into(),
            })
        }
    }

    fn parse_const_decl(&mut self) -> Result<Decl, ParseError> {
        self.expect(TokenKind::KwConst)?;
        self.parse_type()?;
        let mut defs = Vec::new();
        loop {
            let (name, span) = self.expect_ident()?;
            self.expect(TokenKind::Assign)?;
            let init = self.parse_expr()?;
            defs.push(ConstDef { name, init, span });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Semi)?;
        Ok(Decl::Const(ConstDecl { defs }))
    }

    fn parse_var_def(&mut self, name: Symbol, span: Span) -> Result<VarDef, ParseError> {
        let init = if self.eat(&TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(VarDef { name, init, span })
    }

    fn parse_var_decl(&mut self) -> Result<Decl, ParseError> {
        self.parse_type()?;
        let (name, span) = self.expect_ident()?;
        let mut defs = vec![self.parse_var_def(name, span)?];
        while self.eat(&TokenKind::Comma) {
            let (dname, dspan) = self.expect_ident()?;
            defs.push(self.parse_var_def(dname, dspan)?);
        }
        self.expect(TokenKind::Semi)?;
        Ok(Decl::Var(VarDecl { defs }))
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let start = self.span();
        self.expect(TokenKind::LBrace)?;
        let mut items = Vec::new();
        while *self.peek() != TokenKind::RBrace {
            items.push(self.parse_block_item()?);
        }
        let end_tok = self.expect(TokenKind::RBrace)?;
        Ok(Block {
            items,
            span: start.to(end_tok.span),
        })
    }

    fn parse_block_item(&mut self) -> Result<BlockItem, ParseError> {
        match self.peek() {
            TokenKind::KwConst => Ok(BlockItem::Decl(self.parse_const_decl()?)),
            TokenKind::KwInt | TokenKind::KwVoid => Ok(BlockItem::Decl(self.parse_var_decl()?)),
            _ => Ok(BlockItem::Stmt(self.parse_stmt()?)),
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek().clone() {
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Semi => {
                self.bump();
                Ok(Stmt::Expr(None))
            }
            TokenKind::KwIf => {
                let start = self.span();
                self.bump();
                self.expect(TokenKind::LParen)?;
                let cond = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                let then_branch = Box::new(self.parse_stmt()?);
                let else_branch = if self.eat(&TokenKind::KwElse) {
                    Some(Box::new(self.parse_stmt()?))
                } else {
                    None
                };
                let _ = start;
                Ok(Stmt::If {
                    cond,
                    then_branch,
                    else_branch,
                })
            }
            TokenKind::KwWhile => {
                self.bump();
                self.expect(TokenKind::LParen)?;
                let cond = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                let body = Box::new(self.parse_stmt()?);
                Ok(Stmt::While { cond, body })
            }
            TokenKind::KwBreak => {
                let span = self.span();
                self.bump();
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::Break(span))
            }
            TokenKind::KwContinue => {
                let span = self.span();
                self.bump();
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::Continue(span))
            }
            TokenKind::KwReturn => {
                let span = self.span();
                self.bump();
                let value = if *self.peek() == TokenKind::Semi {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::Return { value, span })
            }
            _ => self.parse_assign_or_expr_stmt(),
        }
    }

    /// Disambiguates `lval = expr;` from a bare expression statement by
    /// speculatively parsing an expression, then checking for a following
    /// `=` with the expression reduced to a plain identifier.
    fn parse_assign_or_expr_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        let expr = self.parse_expr()?;
        if let TokenKind::Assign = self.peek() {
            if let Expr::LVal(name, _) = expr {
                self.bump();
                let rhs = self.parse_expr()?;
                let end_tok = self.expect(TokenKind::Semi)?;
                return Ok(Stmt::Assign {
                    lval: name,
                    expr: rhs,
                    span: start.to(end_tok.span),
                });
            }
        }
        self.expect(TokenKind::Semi)?;
        Ok(Stmt::Expr(Some(expr)))
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_lor()
    }

    fn parse_lor(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_land()?;
        while self.eat(&TokenKind::OrOr) {
            let rhs = self.parse_land()?;
            let span = lhs.span().to(rhs.span());
            lhs = Expr::Binary {
                op: BinOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_land(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_eq()?;
        while self.eat(&TokenKind::AndAnd) {
            let rhs = self.parse_eq()?;
            let span = lhs.span().to(rhs.span());
            lhs = Expr::Binary {
                op: BinOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_eq(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_rel()?;
        loop {
            let op = match self.peek() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::Ne => BinOp::Ne,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_rel()?;
            let span = lhs.span().to(rhs.span());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_rel(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_add()?;
        loop {
            let op = match self.peek() {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Ge => BinOp::Ge,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_add()?;
            let span = lhs.span().to(rhs.span());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_add(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_mul()?;
            let span = lhs.span().to(rhs.span());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_unary()?;
            let span = lhs.span().to(rhs.span());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        let op = match self.peek() {
            TokenKind::Plus => Some(UnOp::Plus),
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Not => Some(UnOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let expr = Box::new(self.parse_unary()?);
            let span = start.to(expr.span());
            Ok(Expr::Unary { op, expr, span })
        } else {
            self.parse_primary()
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        match self.peek().clone() {
            TokenKind::Int(value) => {
                self.bump();
                Ok(Expr::IntLit(value, start))
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                self.bump();
                let sym = Symbol::intern(&name);
                if self.eat(&TokenKind::LParen) {
                    let mut args = Vec::new();
                    if *self.peek() != TokenKind::RParen {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let end_tok = self.expect(TokenKind::RParen)?;
                    Ok(Expr::Call {
                        name: sym,
                        args,
                        span: start.to(end_tok.span),
                    })
                } else {
                    Ok(Expr::LVal(sym, start))
                }
            }
            TokenKind::Eof => Err(ParseError::UnexpectedEof {
                expected: "expression".into(),
            }),
            other => Err(ParseError::UnexpectedToken {
                found: Self::describe(&other),
                expected: "expression".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse(src: &str) -> CompUnit {
        Parser::new(lex(src).unwrap()).parse_comp_unit().unwrap()
    }

    #[test]
    fn parses_minimal_function() {
        let unit = parse("int main() { return 0; }");
        assert_eq!(unit.items.len(), 1);
        match &unit.items[0] {
            Item::Func(f) => assert_eq!(f.ret_ty, Type::Int),
            _ => panic!("expected function"),
        }
    }

    #[test]
    fn dangling_else_binds_to_nearest_if() {
        let unit = parse(
            "int main() { if (1) if (2) return 1; else return 2; return 0; }",
        );
        let Item::Func(f) = &unit.items[0] else {
            panic!("expected function")
        };
        let BlockItem::Stmt(Stmt::If { then_branch, .. }) = &f.body.items[0] else {
            panic!("expected if statement")
        };
        match then_branch.as_ref() {
            Stmt::If { else_branch, .. } => assert!(else_branch.is_some()),
            _ => panic!("expected nested if to own the else"),
        }
    }

    #[test]
    fn respects_operator_precedence() {
        let unit = parse("int main() { return 1 + 2 * 3 == 7 && 1 || 0; }");
        let Item::Func(f) = &unit.items[0] else {
            panic!("expected function")
        };
        assert_eq!(f.body.items.len(), 1);
    }

    #[test]
    fn parses_assignment_vs_expression_statement() {
        let unit = parse("int main() { int x; x = 1; x; return x; }");
        let Item::Func(f) = &unit.items[0] else {
            panic!("expected function")
        };
        assert!(matches!(
            f.body.items[1],
            BlockItem::Stmt(Stmt::Assign { .. })
        ));
        assert!(matches!(
            f.body.items[2],
            BlockItem::Stmt(Stmt::Expr(Some(_)))
        ));
    }
}
