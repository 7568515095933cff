//! Precedence-climbing parser over the formula grammar.
//!
//! ```text
//! sequence    := expr (';' expr)* ';'?
//! expr        := or ('?' expr ':' expr)?
//! or          := and ('||' and)*
//! and         := equality ('&&' equality)*
//! equality    := compare (('==' | '!=') compare)*
//! compare     := additive (('<' | '<=' | '>' | '>=') additive)*
//! additive    := term (('+' | '-') term)*
//! term        := unary (('*' | '/' | '%') unary)*
//! unary       := ('-' | '+' | '!') unary | primary
//! primary     := number | '(' expr ')' | (a|b) '.' ident call?
//!              | 'Math' '.' ident call | 'v' '[' expr ']' | true | false
//! ```

use super::FormulaError;
use super::ast::{BinaryOp, Expr, Operand, UnaryOp};
use super::lexer::{Spanned, Token, tokenize};

/// Deepest nesting of sub-expressions and prefix operators accepted.
const MAX_DEPTH: usize = 64;

pub(super) fn parse(source: &str) -> Result<Expr, FormulaError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
        depth: 0,
    };
    let expr = parser.sequence()?;
    match parser.peek() {
        None => Ok(expr),
        Some(_) => Err(parser.error("unexpected token")),
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(_, at)| *at)
    }

    fn error(&self, message: &'static str) -> FormulaError {
        FormulaError::Parse {
            position: self.position(),
            message,
        }
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, message: &'static str) -> Result<(), FormulaError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn sequence(&mut self) -> Result<Expr, FormulaError> {
        let mut items = vec![self.expr()?];
        while self.eat(&Token::Semicolon) {
            if self.peek().is_none() {
                break;
            }
            items.push(self.expr()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::Sequence(items)
        })
    }

    fn nested(&mut self, parse: fn(&mut Self) -> Result<Expr, FormulaError>) -> Result<Expr, FormulaError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("formula nested too deeply"));
        }
        self.depth += 1;
        let expr = parse(self);
        self.depth -= 1;
        expr
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        self.nested(Self::conditional)
    }

    fn conditional(&mut self) -> Result<Expr, FormulaError> {
        let cond = self.binary(0)?;
        if self.eat(&Token::Question) {
            let then = self.expr()?;
            self.expect(&Token::Colon, "expected ':' in conditional")?;
            let otherwise = self.expr()?;
            return Ok(Expr::Conditional(
                Box::new(cond),
                Box::new(then),
                Box::new(otherwise),
            ));
        }
        Ok(cond)
    }

    fn binary_op(token: &Token) -> Option<(BinaryOp, u8)> {
        let op = match token {
            Token::OrOr => (BinaryOp::Or, 0),
            Token::AndAnd => (BinaryOp::And, 1),
            Token::EqEq => (BinaryOp::Eq, 2),
            Token::NotEq => (BinaryOp::Ne, 2),
            Token::Lt => (BinaryOp::Lt, 3),
            Token::Le => (BinaryOp::Le, 3),
            Token::Gt => (BinaryOp::Gt, 3),
            Token::Ge => (BinaryOp::Ge, 3),
            Token::Plus => (BinaryOp::Add, 4),
            Token::Minus => (BinaryOp::Sub, 4),
            Token::Star => (BinaryOp::Mul, 5),
            Token::Slash => (BinaryOp::Div, 5),
            Token::Percent => (BinaryOp::Rem, 5),
            _ => return None,
        };
        Some(op)
    }

    /// Left-associative binary operators at or above `min_level`.
    fn binary(&mut self, min_level: u8) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        while let Some((op, level)) = self.peek().and_then(Self::binary_op) {
            if level < min_level {
                break;
            }
            self.pos += 1;
            let rhs = self.binary(level + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Bang) => UnaryOp::Not,
            _ => return self.primary(),
        };
        self.pos += 1;
        Ok(Expr::Unary(op, Box::new(self.nested(Self::unary)?)))
    }

    fn args(&mut self) -> Result<Vec<Expr>, FormulaError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            self.expect(&Token::Comma, "expected ',' or ')'")?;
        }
    }

    fn member_name(&mut self) -> Result<String, FormulaError> {
        self.expect(&Token::Dot, "expected '.'")?;
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name),
            _ => Err(self.error("expected member name")),
        }
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let at = self.position();
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(&Token::RParen, "expected ')'")?;
                Ok(inner)
            }
            Some(Token::Ident(ident)) => match ident.as_str() {
                "a" | "b" => {
                    let operand = if ident == "a" {
                        Operand::Subject
                    } else {
                        Operand::Target
                    };
                    let name = self.member_name()?;
                    if self.eat(&Token::LParen) {
                        let args = self.args()?;
                        Ok(Expr::Method {
                            operand,
                            name,
                            args,
                        })
                    } else {
                        Ok(Expr::Property { operand, name })
                    }
                }
                "Math" => {
                    let name = self.member_name()?;
                    self.expect(&Token::LParen, "expected '(' after Math function")?;
                    let args = self.args()?;
                    Ok(Expr::Math { name, args })
                }
                "v" => {
                    self.expect(&Token::LBracket, "expected '[' after v")?;
                    let index = self.expr()?;
                    self.expect(&Token::RBracket, "expected ']'")?;
                    Ok(Expr::Variable(Box::new(index)))
                }
                "true" => Ok(Expr::Number(1.0)),
                "false" => Ok(Expr::Number(0.0)),
                _ => Err(FormulaError::UnknownIdentifier(ident)),
            },
            _ => Err(FormulaError::Parse {
                position: at,
                message: "expected a value",
            }),
        }
    }
}
