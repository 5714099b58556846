//! Recursive-descent query parser

use super::lexer::{tokenize, Spanned, Token};
use super::{CompareOp, Expr, FieldPath, Function, Projection, SelectQuery};
use crate::error::{Error, Result};
use serde_json::{Number, Value};

const RESERVED: [&str; 11] = [
    "SELECT", "VALUE", "FROM", "WHERE", "AND", "OR", "NOT", "TRUE", "FALSE", "NULL", "COUNT",
];

/// Deepest nesting of parentheses, `NOT` and call arguments
pub(super) const MAX_NESTING: usize = 128;

/// Most `AND`/`OR` operators in one query
pub(super) const MAX_OPERATORS: usize = 1024;

pub(super) fn parse(text: &str) -> Result<SelectQuery> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        operators: 0,
    };
    let query = parser.query()?;
    parser.expect_eof()?;
    Ok(query)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    operators: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos].offset
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].token.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T> {
        Err(Error::invalid_query(self.offset(), message))
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING {
            return self.error(format!("expression nested deeper than {}", MAX_NESTING));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn count_operator(&mut self) -> Result<()> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return self.error(format!("more than {} AND/OR operators", MAX_OPERATORS));
        }
        Ok(())
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Token::Ident(s) if s.eq_ignore_ascii_case(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            self.error(format!("expected {}", keyword))
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<()> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            self.error(format!("expected {}", what))
        }
    }

    fn expect_eof(&self) -> Result<()> {
        match self.peek() {
            Token::Eof => Ok(()),
            _ => self.error("unexpected trailing input"),
        }
    }

    fn query(&mut self) -> Result<SelectQuery> {
        self.expect_keyword("SELECT")?;
        let value = self.eat_keyword("VALUE");

        // Paths in the projection precede the alias declaration, so collect
        // them raw and check them against the alias afterwards.
        let projection_offset = self.offset();
        let raw = self.projection()?;

        self.expect_keyword("FROM")?;
        let alias = match self.advance() {
            Token::Ident(name) if !is_reserved(&name) => name,
            _ => return Err(Error::invalid_query(self.offset(), "expected alias after FROM")),
        };

        let projection = match raw {
            RawProjection::All => Projection::All,
            RawProjection::Count => Projection::Count,
            RawProjection::Fields(fields) => {
                let mut out = Vec::with_capacity(fields.len());
                for (root, path, offset) in fields {
                    if root != alias {
                        return Err(Error::invalid_query(
                            offset,
                            format!("unknown alias '{}'", root),
                        ));
                    }
                    out.push(path);
                }
                Projection::Fields(out)
            }
        };

        if value {
            match &projection {
                Projection::All => {
                    return Err(Error::invalid_query(
                        projection_offset,
                        "SELECT VALUE requires a single expression",
                    ))
                }
                Projection::Fields(fields) if fields.len() != 1 => {
                    return Err(Error::invalid_query(
                        projection_offset,
                        "SELECT VALUE requires a single expression",
                    ))
                }
                _ => {}
            }
        }

        let filter = if self.eat_keyword("WHERE") {
            Some(self.expr(&alias)?)
        } else {
            None
        };

        Ok(SelectQuery {
            value,
            projection,
            alias,
            filter,
        })
    }

    fn projection(&mut self) -> Result<RawProjection> {
        if *self.peek() == Token::Star {
            self.advance();
            return Ok(RawProjection::All);
        }
        if self.at_keyword("COUNT") {
            self.advance();
            self.expect(Token::LParen, "'('")?;
            match self.advance() {
                Token::Star => {}
                Token::Num(n) if n.as_u64() == Some(1) => {}
                _ => return self.error("expected COUNT(1) or COUNT(*)"),
            }
            self.expect(Token::RParen, "')'")?;
            return Ok(RawProjection::Count);
        }

        let mut fields = Vec::new();
        loop {
            let offset = self.offset();
            let root = match self.advance() {
                Token::Ident(name) if !is_reserved(&name) => name,
                _ => return Err(Error::invalid_query(offset, "expected projection")),
            };
            let path = self.path_segments()?;
            fields.push((root, path, offset));
            if *self.peek() == Token::Comma {
                self.advance();
            } else {
                break;
            }
        }
        Ok(RawProjection::Fields(fields))
    }

    /// Segments following an alias: `.ident` or `['name']`, at least one.
    fn path_segments(&mut self) -> Result<FieldPath> {
        let mut segments = Vec::new();
        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    match self.advance() {
                        Token::Ident(name) => segments.push(name),
                        _ => {
                            return Err(Error::invalid_query(
                                self.tokens[self.pos.saturating_sub(1)].offset,
                                "expected field name after '.'",
                            ))
                        }
                    }
                }
                Token::LBracket => {
                    self.advance();
                    match self.advance() {
                        Token::Str(name) => segments.push(name),
                        _ => return self.error("expected quoted field name"),
                    }
                    self.expect(Token::RBracket, "']'")?;
                }
                _ => break,
            }
        }
        match FieldPath::from_segments(segments) {
            Some(path) => Ok(path),
            None => self.error("expected field access on alias"),
        }
    }

    fn expr(&mut self, alias: &str) -> Result<Expr> {
        self.enter()?;
        let expr = self.or_expr(alias);
        self.leave();
        expr
    }

    fn or_expr(&mut self, alias: &str) -> Result<Expr> {
        let mut left = self.and_expr(alias)?;
        while self.eat_keyword("OR") {
            self.count_operator()?;
            let right = self.and_expr(alias)?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self, alias: &str) -> Result<Expr> {
        let mut left = self.not_expr(alias)?;
        while self.eat_keyword("AND") {
            self.count_operator()?;
            let right = self.not_expr(alias)?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn not_expr(&mut self, alias: &str) -> Result<Expr> {
        if self.eat_keyword("NOT") {
            self.enter()?;
            let inner = self.not_expr(alias);
            self.leave();
            return Ok(Expr::Not(Box::new(inner?)));
        }
        self.comparison(alias)
    }

    fn comparison(&mut self, alias: &str) -> Result<Expr> {
        let left = self.operand(alias)?;
        let op = match self.peek() {
            Token::Eq => CompareOp::Eq,
            Token::Ne => CompareOp::Ne,
            Token::Lt => CompareOp::Lt,
            Token::Le => CompareOp::Le,
            Token::Gt => CompareOp::Gt,
            Token::Ge => CompareOp::Ge,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.operand(alias)?;
        Ok(Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn operand(&mut self, alias: &str) -> Result<Expr> {
        let offset = self.offset();
        match self.advance() {
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Num(n) => Ok(Expr::Literal(Value::Number(n))),
            Token::Minus => match self.advance() {
                Token::Num(n) => negate(&n)
                    .map(|n| Expr::Literal(Value::Number(n)))
                    .ok_or_else(|| Error::invalid_query(offset, "number out of range")),
                _ => Err(Error::invalid_query(offset, "expected number after '-'")),
            },
            Token::LParen => {
                let inner = self.expr(alias)?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::Ident(name) => {
                if name.eq_ignore_ascii_case("true") {
                    return Ok(Expr::Literal(Value::Bool(true)));
                }
                if name.eq_ignore_ascii_case("false") {
                    return Ok(Expr::Literal(Value::Bool(false)));
                }
                if name.eq_ignore_ascii_case("null") {
                    return Ok(Expr::Literal(Value::Null));
                }
                if *self.peek() == Token::LParen {
                    return self.call(&name, offset, alias);
                }
                if name != alias {
                    return Err(Error::invalid_query(
                        offset,
                        format!("unknown identifier '{}'", name),
                    ));
                }
                Ok(Expr::Field(self.path_segments()?))
            }
            Token::Eof => Err(Error::invalid_query(offset, "unexpected end of query")),
            _ => Err(Error::invalid_query(offset, "expected operand")),
        }
    }

    fn call(&mut self, name: &str, offset: usize, alias: &str) -> Result<Expr> {
        let func = Function::from_name(name)
            .ok_or_else(|| Error::invalid_query(offset, format!("unknown function '{}'", name)))?;
        self.expect(Token::LParen, "'('")?;
        let mut args = Vec::new();
        if *self.peek() != Token::RParen {
            loop {
                args.push(self.expr(alias)?);
                if *self.peek() == Token::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "')'")?;
        if args.len() != func.arity() {
            return Err(Error::invalid_query(
                offset,
                format!(
                    "{} takes {} argument(s), got {}",
                    func.name(),
                    func.arity(),
                    args.len()
                ),
            ));
        }
        Ok(Expr::Call { func, args })
    }
}

enum RawProjection {
    All,
    Count,
    Fields(Vec<(String, FieldPath, usize)>),
}

fn is_reserved(name: &str) -> bool {
    RESERVED.iter().any(|k| k.eq_ignore_ascii_case(name))
}

fn negate(n: &Number) -> Option<Number> {
    if let Some(u) = n.as_u64() {
        if u <= i64::MAX as u64 {
            return Some(Number::from(-(u as i64)));
        }
    }
    n.as_f64().and_then(|f| Number::from_f64(-f))
}
