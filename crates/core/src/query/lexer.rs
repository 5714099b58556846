//! Query tokenizer

use crate::error::{Error, Result};
use serde_json::Number;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Token {
    Ident(String),
    Str(String),
    Num(Number),
    Star,
    Comma,
    Dot,
    Minus,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Eof,
}

#[derive(Debug, Clone)]
pub(super) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub(super) fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;
        let token = match c {
            b'*' => single(&mut pos, Token::Star),
            b',' => single(&mut pos, Token::Comma),
            b'.' => single(&mut pos, Token::Dot),
            b'-' => single(&mut pos, Token::Minus),
            b'(' => single(&mut pos, Token::LParen),
            b')' => single(&mut pos, Token::RParen),
            b'[' => single(&mut pos, Token::LBracket),
            b']' => single(&mut pos, Token::RBracket),
            b'=' => single(&mut pos, Token::Eq),
            b'!' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    pos += 2;
                    Token::Ne
                } else {
                    return Err(Error::invalid_query(pos, "expected '=' after '!'"));
                }
            }
            b'<' => match bytes.get(pos + 1) {
                Some(b'=') => {
                    pos += 2;
                    Token::Le
                }
                Some(b'>') => {
                    pos += 2;
                    Token::Ne
                }
                _ => single(&mut pos, Token::Lt),
            },
            b'>' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    pos += 2;
                    Token::Ge
                } else {
                    single(&mut pos, Token::Gt)
                }
            }
            b'\'' | b'"' => {
                let (s, end) = lex_string(input, pos)?;
                pos = end;
                Token::Str(s)
            }
            b'0'..=b'9' => {
                let (n, end) = lex_number(input, pos)?;
                pos = end;
                Token::Num(n)
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_')
                {
                    pos += 1;
                }
                Token::Ident(input[start..pos].to_string())
            }
            _ => {
                let ch = input[pos..].chars().next().unwrap_or('?');
                return Err(Error::invalid_query(
                    pos,
                    format!("unexpected character '{}'", ch),
                ));
            }
        };
        tokens.push(Spanned {
            token,
            offset: start,
        });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        offset: input.len(),
    });
    Ok(tokens)
}

fn single(pos: &mut usize, token: Token) -> Token {
    *pos += 1;
    token
}

fn lex_string(input: &str, start: usize) -> Result<(String, usize)> {
    let quote = input.as_bytes()[start] as char;
    let mut out = String::new();
    let mut chars = input[start + 1..].char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                let (j, escaped) = chars
                    .next()
                    .ok_or_else(|| Error::invalid_query(start + 1 + i, "unterminated escape"))?;
                out.push(match escaped {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    '\\' | '\'' | '"' | '/' => escaped,
                    other => {
                        return Err(Error::invalid_query(
                            start + 1 + j,
                            format!("unknown escape '\\{}'", other),
                        ))
                    }
                });
            }
            c if c == quote => return Ok((out, start + 1 + i + 1)),
            c => out.push(c),
        }
    }

    Err(Error::invalid_query(start, "unterminated string literal"))
}

fn lex_number(input: &str, start: usize) -> Result<(Number, usize)> {
    let bytes = input.as_bytes();
    let mut pos = start;
    let mut is_float = false;

    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos + 1 < bytes.len() && bytes[pos] == b'.' && bytes[pos + 1].is_ascii_digit() {
        is_float = true;
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp = pos + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            is_float = true;
            pos = exp;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
        }
    }

    let text = &input[start..pos];
    if !is_float {
        if let Ok(n) = text.parse::<u64>() {
            return Ok((Number::from(n), pos));
        }
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(|n| (n, pos))
        .ok_or_else(|| Error::invalid_query(start, format!("invalid number '{}'", text)))
}
