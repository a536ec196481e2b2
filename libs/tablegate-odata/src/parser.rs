//! Recursive descent parser for `$filter` expressions.
//!
//! Grammar, lowest to highest precedence:
//!
//! ```text
//! or         := and ( "or" and )*
//! and        := unary ( "and" unary )*
//! unary      := "not" unary | comparison
//! comparison := primary ( ( "eq" | "ne" | "gt" | "ge" | "lt" | "le" ) primary )?
//! primary    := "(" or ")" | ident "(" or ( "," or )* ")" | ident | literal
//! ```
//!
//! `and`/`or` chains are left-associative; parentheses override precedence.
//! Keywords are matched case-insensitively. The parser is schema-agnostic:
//! field references are validated later by [`crate::filter::resolve_filter`].

use crate::Error;
use crate::ast::{CompareOperator, Expr, Value};
use crate::lexer::{SpannedToken, Token, tokenize};

/// Parse a raw `$filter` string into an [`Expr`].
///
/// # Errors
/// Returns [`Error::FilterSyntax`] with the byte offset of the offending
/// token on malformed input.
pub fn parse_filter(raw: &str) -> Result<Expr, Error> {
    let tokens = tokenize(raw)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        input_len: raw.len(),
    };
    let expr = parser.parse_or()?;
    if let Some(tok) = parser.peek() {
        return Err(Error::syntax(
            tok.pos,
            format!("unexpected {} after expression", tok.token.describe()),
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    input_len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Offset to report when input ends unexpectedly.
    fn eof_pos(&self) -> usize {
        self.input_len
    }

    /// Consume the next token if it is the given keyword (case-insensitive).
    fn eat_keyword(&mut self, kw: &str) -> bool {
        if let Some(SpannedToken {
            token: Token::Ident(s),
            ..
        }) = self.peek()
            && s.eq_ignore_ascii_case(kw)
        {
            self.pos += 1;
            return true;
        }
        false
    }

    fn parse_or(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_and()?;
        while self.eat_keyword("or") {
            let right = self.parse_and()?;
            left = left.or(right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_unary()?;
        while self.eat_keyword("and") {
            let right = self.parse_unary()?;
            left = left.and(right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        if self.eat_keyword("not") {
            let inner = self.parse_unary()?;
            return Ok(!inner);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, Error> {
        let left = self.parse_primary()?;
        let Some(op) = self.peek_compare_operator() else {
            return Ok(left);
        };
        self.pos += 1;
        let right = self.parse_primary()?;
        Ok(Expr::Compare(Box::new(left), op, Box::new(right)))
    }

    fn peek_compare_operator(&self) -> Option<CompareOperator> {
        let SpannedToken {
            token: Token::Ident(s),
            ..
        } = self.peek()?
        else {
            return None;
        };
        let op = match s.to_ascii_lowercase().as_str() {
            "eq" => CompareOperator::Eq,
            "ne" => CompareOperator::Ne,
            "gt" => CompareOperator::Gt,
            "ge" => CompareOperator::Ge,
            "lt" => CompareOperator::Lt,
            "le" => CompareOperator::Le,
            _ => return None,
        };
        Some(op)
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let Some(tok) = self.advance() else {
            return Err(Error::syntax(self.eof_pos(), "unexpected end of input"));
        };

        match tok.token {
            Token::LParen => {
                let inner = self.parse_or()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            Token::Ident(name) => {
                if name.eq_ignore_ascii_case("true") {
                    return Ok(Expr::Value(Value::Bool(true)));
                }
                if name.eq_ignore_ascii_case("false") {
                    return Ok(Expr::Value(Value::Bool(false)));
                }
                if name.eq_ignore_ascii_case("null") {
                    return Ok(Expr::Value(Value::Null));
                }
                if matches!(
                    self.peek(),
                    Some(SpannedToken {
                        token: Token::LParen,
                        ..
                    })
                ) {
                    self.pos += 1;
                    return self.parse_function(name);
                }
                Ok(Expr::Identifier(name))
            }
            Token::Str(s) => Ok(Expr::Value(Value::String(s))),
            Token::Number(n) => Ok(Expr::Value(Value::Number(n))),
            Token::RParen | Token::Comma => Err(Error::syntax(
                tok.pos,
                format!("unexpected {}", tok.token.describe()),
            )),
        }
    }

    /// Parse the argument list of `name(...)`; the opening paren is consumed.
    fn parse_function(&mut self, name: String) -> Result<Expr, Error> {
        let mut args = vec![self.parse_or()?];
        while matches!(
            self.peek(),
            Some(SpannedToken {
                token: Token::Comma,
                ..
            })
        ) {
            self.pos += 1;
            args.push(self.parse_or()?);
        }
        self.expect_rparen()?;
        Ok(Expr::Function(name, args))
    }

    fn expect_rparen(&mut self) -> Result<(), Error> {
        match self.advance() {
            Some(SpannedToken {
                token: Token::RParen,
                ..
            }) => Ok(()),
            Some(tok) => Err(Error::syntax(
                tok.pos,
                format!("expected ')', found {}", tok.token.describe()),
            )),
            None => Err(Error::syntax(self.eof_pos(), "expected ')'")),
        }
    }
}
