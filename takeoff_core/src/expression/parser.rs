//! Recursive-descent parser producing an [`Expr`] tree.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | power
//! power   := postfix ('^' unary)?
//! postfix := primary '%'*
//! primary := NUMBER | IDENT | IDENT '(' args? ')' | '(' expr ')'
//! ```

use super::lexer::{tokenize, Spanned, Token};
use super::ExprError;

/// Most tokens a formula may have
pub const MAX_TOKENS: usize = 1024;
/// Deepest nesting of parentheses, calls, signs and exponents
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Negate(Box<Expr>),
    Percent(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

/// Parse a formula into an expression tree.
pub fn parse(src: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(ExprError::Empty);
    }
    if tokens.len() > MAX_TOKENS {
        return Err(ExprError::TooLong(MAX_TOKENS));
    }
    let mut parser = Parser {
        tokens,
        index: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    if let Some(extra) = parser.peek() {
        return Err(ExprError::UnexpectedToken {
            found: extra.token.describe(),
            pos: extra.pos,
        });
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    index: usize,
    depth: usize,
}

impl Parser {
    /// Run `f` one nesting level deeper.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ExprError>) -> Result<T, ExprError> {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.index)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.peek().map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let next = self.tokens.get(self.index).cloned();
        if next.is_some() {
            self.index += 1;
        }
        next
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExprError> {
        match self.advance() {
            Some(s) if s.token == expected => Ok(()),
            Some(s) => Err(ExprError::UnexpectedToken {
                found: s.token.describe(),
                pos: s.pos,
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.term()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        match self.peek_token() {
            Some(Token::Minus) => {
                self.advance();
                Ok(Expr::Negate(Box::new(self.nested(Self::unary)?)))
            }
            Some(Token::Plus) => {
                self.advance();
                self.nested(Self::unary)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, ExprError> {
        let base = self.postfix()?;
        if self.peek_token() == Some(&Token::Caret) {
            self.advance();
            // right-associative: 2^3^2 = 2^(3^2)
            let exponent = self.nested(Self::unary)?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.primary()?;
        while self.peek_token() == Some(&Token::Percent) {
            self.advance();
            expr = Expr::Percent(Box::new(expr));
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let Some(next) = self.advance() else {
            return Err(ExprError::UnexpectedEnd);
        };
        match next.token {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Ident(name) => {
                if self.peek_token() == Some(&Token::LParen) {
                    self.advance();
                    let args = self.nested(Self::arguments)?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            Token::LParen => {
                let inner = self.nested(Self::expr)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            other => Err(ExprError::UnexpectedToken {
                found: other.describe(),
                pos: next.pos,
            }),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if self.peek_token() == Some(&Token::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.advance() {
                Some(Spanned { token: Token::Comma, .. }) => continue,
                Some(Spanned { token: Token::RParen, .. }) => break,
                Some(s) => {
                    return Err(ExprError::UnexpectedToken {
                        found: s.token.describe(),
                        pos: s.pos,
                    })
                }
                None => return Err(ExprError::UnexpectedEnd),
            }
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Number(n))
    }

    #[test]
    fn test_precedence() {
        let expr = parse("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                lhs: num(1.0),
                rhs: Box::new(Expr::Binary { op: BinaryOp::Mul, lhs: num(2.0), rhs: num(3.0) }),
            }
        );
    }

    #[test]
    fn test_negation_binds_looser_than_power() {
        let expr = parse("-2^2").unwrap();
        assert_eq!(
            expr,
            Expr::Negate(Box::new(Expr::Binary { op: BinaryOp::Pow, lhs: num(2.0), rhs: num(2.0) }))
        );
    }

    #[test]
    fn test_call_arguments() {
        let expr = parse("max(width, 10)").unwrap();
        assert_eq!(
            expr,
            Expr::Call {
                name: "max".into(),
                args: vec![Expr::Variable("width".into()), Expr::Number(10.0)],
            }
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse("   "), Err(ExprError::Empty));
        assert_eq!(parse("width *"), Err(ExprError::UnexpectedEnd));
        assert_eq!(parse("(width"), Err(ExprError::UnexpectedEnd));
        assert!(matches!(parse("width depth"), Err(ExprError::UnexpectedToken { .. })));
        assert!(matches!(parse("* 2"), Err(ExprError::UnexpectedToken { .. })));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |levels: usize| format!("{}width{}", "(".repeat(levels), ")".repeat(levels));
        assert_eq!(parse(&nested(MAX_DEPTH)), Ok(Expr::Variable("width".into())));
        assert_eq!(parse(&nested(MAX_DEPTH + 1)), Err(ExprError::TooDeep(MAX_DEPTH)));
        assert_eq!(parse(&format!("{}1", "-".repeat(MAX_DEPTH + 1))), Err(ExprError::TooDeep(MAX_DEPTH)));
        assert_eq!(parse(&format!("{}1", "2^".repeat(MAX_DEPTH + 1))), Err(ExprError::TooDeep(MAX_DEPTH)));
    }

    #[test]
    fn test_length_limit() {
        assert!(parse(&nested_calls(10)).is_ok());
        assert_eq!(parse(&"(".repeat(100_000)), Err(ExprError::TooLong(MAX_TOKENS)));
        let long_sum = format!("1{}", "+1".repeat(MAX_TOKENS));
        assert_eq!(parse(&long_sum), Err(ExprError::TooLong(MAX_TOKENS)));
    }

    fn nested_calls(levels: usize) -> String {
        format!("{}1{}", "abs(".repeat(levels), ")".repeat(levels))
    }
}
