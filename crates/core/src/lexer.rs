//! Tokenizer for type strings.
//!
//! A single left-to-right scan producing a finite token sequence that
//! always ends with [`Token::Eof`]. Identifier classification into node
//! kinds is left to the parser.

use crate::error::InvalidSyntax;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifiers and keywords, distinguished by the consumers.
    Ident(String),
    /// Quoted string literal (content without quotes, escapes resolved)
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    // Punctuation
    Pipe,
    Amp,
    Lt,
    Gt,
    Comma,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Colon,
    /// `::` scope resolution for `Class::CONST`
    DoubleColon,
    Question,
    LBracket,
    RBracket,
    /// `[]` list-of modifier
    ClosedBrackets,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(w) => write!(f, "{}", w),
            Token::Str(s) => write!(f, "'{}'", s),
            Token::Int(n) => write!(f, "{}", n),
            Token::Float(x) => write!(f, "{:?}", x),
            Token::Bool(b) => write!(f, "{}", b),
            Token::Pipe => f.write_str("|"),
            Token::Amp => f.write_str("&"),
            Token::Lt => f.write_str("<"),
            Token::Gt => f.write_str(">"),
            Token::Comma => f.write_str(","),
            Token::LBrace => f.write_str("{"),
            Token::RBrace => f.write_str("}"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Colon => f.write_str(":"),
            Token::DoubleColon => f.write_str("::"),
            Token::Question => f.write_str("?"),
            Token::LBracket => f.write_str("["),
            Token::RBracket => f.write_str("]"),
            Token::ClosedBrackets => f.write_str("[]"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// Char offsets `[start, end)` of a token in the source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}

impl Spanned {
    /// Source text of the token, used for error pointers.
    pub fn text(&self) -> String {
        match &self.token {
            Token::Eof => String::new(),
            other => other.to_string(),
        }
    }
}

pub fn tokenize(src: &str) -> Result<Vec<Spanned>, InvalidSyntax> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut buffer = String::new();
    let mut buffer_start = 0usize;
    let mut pos = 0usize;

    while pos < chars.len() {
        let c = chars[pos];

        if c.is_whitespace() {
            flush(&mut buffer, buffer_start, pos, &mut tokens);
            pos += 1;
            continue;
        }

        if c == '\'' || c == '"' {
            flush(&mut buffer, buffer_start, pos, &mut tokens);
            let start = pos;
            pos += 1;
            let mut s = String::new();
            loop {
                if pos >= chars.len() {
                    return Err(InvalidSyntax::new(
                        "unterminated string literal",
                        src,
                        start,
                        c.to_string(),
                    ));
                }
                let sc = chars[pos];
                if sc == c {
                    pos += 1;
                    break;
                }
                if sc == '\\' && pos + 1 < chars.len() && (chars[pos + 1] == c || chars[pos + 1] == '\\')
                {
                    s.push(chars[pos + 1]);
                    pos += 2;
                    continue;
                }
                s.push(sc);
                pos += 1;
            }
            tokens.push(Spanned {
                token: Token::Str(s),
                span: Span { start, end: pos },
            });
            continue;
        }

        let punct = match c {
            '|' => Some((Token::Pipe, 1)),
            '&' => Some((Token::Amp, 1)),
            '<' => Some((Token::Lt, 1)),
            '>' => Some((Token::Gt, 1)),
            ',' => Some((Token::Comma, 1)),
            '{' => Some((Token::LBrace, 1)),
            '}' => Some((Token::RBrace, 1)),
            '(' => Some((Token::LParen, 1)),
            ')' => Some((Token::RParen, 1)),
            '?' => Some((Token::Question, 1)),
            ']' => Some((Token::RBracket, 1)),
            ':' if chars.get(pos + 1) == Some(&':') => Some((Token::DoubleColon, 2)),
            ':' => Some((Token::Colon, 1)),
            '[' if chars.get(pos + 1) == Some(&']') => Some((Token::ClosedBrackets, 2)),
            '[' => Some((Token::LBracket, 1)),
            _ => None,
        };

        match punct {
            Some((token, width)) => {
                flush(&mut buffer, buffer_start, pos, &mut tokens);
                tokens.push(Spanned {
                    token,
                    span: Span {
                        start: pos,
                        end: pos + width,
                    },
                });
                pos += width;
            }
            None => {
                if buffer.is_empty() {
                    buffer_start = pos;
                }
                buffer.push(c);
                pos += 1;
            }
        }
    }

    flush(&mut buffer, buffer_start, pos, &mut tokens);
    tokens.push(Spanned {
        token: Token::Eof,
        span: Span {
            start: chars.len(),
            end: chars.len(),
        },
    });
    Ok(tokens)
}

fn flush(buffer: &mut String, start: usize, end: usize, tokens: &mut Vec<Spanned>) {
    if buffer.is_empty() {
        return;
    }
    let word = std::mem::take(buffer);
    tokens.push(Spanned {
        token: classify(word),
        span: Span { start, end },
    });
}

fn classify(word: String) -> Token {
    match word.as_str() {
        "true" => return Token::Bool(true),
        "false" => return Token::Bool(false),
        _ => {}
    }
    if is_numeric_literal(&word) {
        if let Ok(n) = word.parse::<i64>() {
            return Token::Int(n);
        }
        if let Ok(x) = word.parse::<f64>() {
            return Token::Float(x);
        }
    }
    Token::Ident(word)
}

/// Decimal integer or float literal, optionally signed, with an optional
/// exponent. Rejects the `inf`/`NaN` spellings `f64::from_str` would accept.
fn is_numeric_literal(word: &str) -> bool {
    let body = word.strip_prefix(['-', '+']).unwrap_or(word);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    let mut parts = mantissa.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next();
    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !digits(int_part) || !frac_part.map_or(true, digits) {
        return false;
    }
    if int_part.is_empty() && frac_part.map_or(true, str::is_empty) {
        return false;
    }
    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(['-', '+']).unwrap_or(exp);
            !exp.is_empty() && digits(exp)
        }
    }
}
