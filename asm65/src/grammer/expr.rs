use super::ast::{Expr, Item};
use super::parsercore::Parser;
use super::token::{Token, TokenKind};
use crate::dialect::ops::{Assoc, BinaryInfo};
use crate::dialect::DialectConfig;
use crate::error::Error;

/// Parse one expression from the front of `tokens`, returning the tokens
/// that follow it.
pub fn parse_expression<'t>(
    tokens: &'t [Token],
    dialect: &DialectConfig,
) -> Result<(Expr, &'t [Token]), Error> {
    let mut parser = Parser::new(tokens, dialect, &[]);
    let expr = parser.parse_expr()?;
    if let Some(diag) = parser.take_diags().into_iter().next() {
        return Err(diag.error);
    }
    Ok((expr, &tokens[parser.position()..]))
}

// ----------------------------------------------------------------------------
// Precedence climbing
// ----------------------------------------------------------------------------

impl<'a> Parser<'a> {
    pub fn parse_expr(&mut self) -> Result<Expr, Error> {
        self.parse_prec(0)
    }

    fn parse_prec(&mut self, min: u8) -> Result<Expr, Error> {
        let mut lhs = self.parse_prefix()?;
        while let Some(info) = self.peek().and_then(|t| self.binary_of(t)) {
            if info.prec < min {
                break;
            }
            self.next();
            let next_min = match info.assoc {
                Assoc::Left => info.prec + 1,
                Assoc::Right => info.prec,
            };
            let rhs = self.parse_prec(next_min)?;
            let span = lhs.span().to(rhs.span());
            lhs = Expr::Binary(info.op, Box::new(lhs), Box::new(rhs), span);
        }
        Ok(lhs)
    }

    /// Binary meaning of a token in infix position
    fn binary_of(&self, token: &Token) -> Option<BinaryInfo> {
        let key = match &token.kind {
            TokenKind::Operator(op) => op.clone(),
            TokenKind::Symbol(word) => word.to_ascii_lowercase(),
            // A lone `-`/`+` between operands lexes as an anonymous mark
            TokenKind::Anon(mark) if mark.count == 1 => mark.sign?.to_string(),
            _ => return None,
        };
        self.dialect.binary.get(key.as_str()).copied()
    }

    fn parse_prefix(&mut self) -> Result<Expr, Error> {
        let token = self
            .next()
            .ok_or_else(|| Error::Expected("expression".into()))?;
        let span = token.span;
        match &token.kind {
            TokenKind::Number(n) => Ok(Expr::Number(*n, span)),
            TokenKind::Text(s) => Ok(Expr::Text(s.clone(), span)),
            TokenKind::Anon(mark) => Ok(Expr::Anon(*mark, span)),
            TokenKind::Symbol(name) | TokenKind::Keyword(name) => {
                let call = self.dialect.has_functions()
                    && self.peek().is_some_and(|t| t.is_op("(") && token.touches(t));
                if call {
                    return self.parse_call(name.clone(), token);
                }
                match &token.kind {
                    TokenKind::Symbol(_) => Ok(Expr::Symbol(name.clone(), span)),
                    _ => Err(Error::UnexpectedToken(name.clone())),
                }
            }
            TokenKind::Operator(op) => {
                if op == self.dialect.lex.pc_symbol {
                    return Ok(Expr::Pc(span));
                }
                let Some(info) = self.dialect.unary.get(op.as_str()).copied() else {
                    return Err(Error::UnexpectedToken(op.clone()));
                };
                if let Some(close) = info.close {
                    let inner = self.parse_prec(0)?;
                    return match self.expect_op(close) {
                        Ok(end) => Ok(Expr::Group(Box::new(inner), span.to(end.span))),
                        Err(e) => {
                            // Missing closer ends this operand only
                            let at = self.span();
                            self.error(at, e);
                            self.recover();
                            Ok(Expr::Group(Box::new(inner), span))
                        }
                    };
                }
                let operand = self.parse_prec(info.prec)?;
                let span = span.to(operand.span());
                Ok(Expr::Unary(info.op, Box::new(operand), span))
            }
            _ => Err(Error::UnexpectedToken(token.text())),
        }
    }

    fn parse_call(&mut self, name: String, token: &Token) -> Result<Expr, Error> {
        self.expect_op("(")?;
        let mut args = Vec::new();
        if !self.check_op(")") {
            args.push(self.parse_expr()?);
            while self.consume_op(",") {
                args.push(self.parse_expr()?);
            }
        }
        let end = self.expect_op(")")?;
        Ok(Expr::Call(name, args, token.span.to(end.span)))
    }

    /// Skip to the next top-level comma
    fn recover(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Operator(op) if matches!(op.as_str(), "(" | "[" | "{") => depth += 1,
                TokenKind::Operator(op) if matches!(op.as_str(), ")" | "]" | "}") => {
                    depth = depth.saturating_sub(1)
                }
                TokenKind::Operator(op) if op == "," && depth == 0 => return,
                _ => {}
            }
            self.next();
        }
    }

    /// Data list element: a lone string or an expression
    pub fn parse_item(&mut self) -> Result<Item, Error> {
        if let Some(token) = self.peek() {
            if let TokenKind::Text(s) = &token.kind {
                let lone = self
                    .peek_nth(1)
                    .map_or(true, |next| next.is_op(",") || next.is_op("}"));
                if lone {
                    self.next();
                    return Ok(Item::Text(s.clone(), token.span));
                }
            }
        }
        Ok(Item::Expr(self.parse_expr()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::ops::{BinaryOp, UnaryOp};
    use crate::dialect::{get_dialect, DialectId};
    use crate::grammer::lexer::tokenize;

    fn parse(text: &str, id: DialectId) -> Expr {
        let dialect = get_dialect(id);
        let tokens = tokenize(text, dialect).tokens;
        parse_expression(&tokens, dialect).unwrap().0
    }

    #[test]
    fn test() {
        match parse("1+2*3", DialectId::Acme) {
            Expr::Binary(BinaryOp::Add, _, r, _) => {
                assert!(matches!(*r, Expr::Binary(BinaryOp::Mul, ..)))
            }
            e => panic!("unexpected {:?}", e),
        }
        assert!(matches!(
            parse(".not. 1", DialectId::Ca65),
            Expr::Unary(UnaryOp::Not, ..)
        ));
        assert!(matches!(
            parse("^label", DialectId::Acme),
            Expr::Unary(UnaryOp::Bank, ..)
        ));
        assert!(matches!(
            parse("a ^ b", DialectId::Ca65),
            Expr::Binary(BinaryOp::Xor, ..)
        ));
        assert!(matches!(
            parse("min(1, 2)", DialectId::Kick),
            Expr::Call(..)
        ));
    }
}
