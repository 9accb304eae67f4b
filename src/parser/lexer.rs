//! Tokenizer front end
//!
//! Raw lexing is delegated to the sqlparser tokenizer (PostgreSQL dialect).
//! Its output is folded into a smaller token set: whitespace and comments are
//! dropped, and adjacent operator characters are joined into a single
//! PostgreSQL-style operator so that extension operators such as `<#>` or
//! `<~>` arrive as one token regardless of how the tokenizer split them.
//!
//! `?` bind arguments never reach the tokenizer. The PostgreSQL dialect reads
//! `?` as the start of a JSON operator, so the source is split at every `?`
//! outside of literals and comments and each piece is tokenized on its own.

use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::tokenizer::{Token as SqlToken, Tokenizer};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word { value: String, quoted: bool },
    Number(String),
    String(String),
    Placeholder(String),
    Operator(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Period,
    Colon,
    DoubleColon,
}

impl Token {
    pub fn word(value: &str) -> Self {
        Token::Word {
            value: value.to_string(),
            quoted: false,
        }
    }

    pub fn operator(op: &str) -> Self {
        Token::Operator(op.to_string())
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Word { value, quoted: true } => write!(f, "\"{}\"", value),
            Token::Word { value, .. } => write!(f, "{}", value),
            Token::Number(n) => write!(f, "{}", n),
            Token::String(s) => write!(f, "'{}'", s),
            Token::Placeholder(p) => write!(f, "{}", p),
            Token::Operator(op) => write!(f, "{}", op),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Period => write!(f, "."),
            Token::Colon => write!(f, ":"),
            Token::DoubleColon => write!(f, "::"),
        }
    }
}

const OPERATOR_CHARS: &str = "+-*/<>=~!@#%^&|`";

// An operator may only end in + or - when it also contains one of these
const OPERATOR_SPECIAL_CHARS: &str = "~!@#%^&|`";

fn is_operator_text(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| OPERATOR_CHARS.contains(c))
}

/// Split trailing `+`/`-` off an operator run the way PostgreSQL does,
/// so `=-` lexes as `=` followed by `-`.
fn split_operator(op: String) -> Vec<String> {
    let mut op = op;
    let mut trailing = Vec::new();
    while op.len() > 1
        && (op.ends_with('+') || op.ends_with('-'))
        && !op.chars().any(|c| OPERATOR_SPECIAL_CHARS.contains(c))
    {
        if let Some(last) = op.pop() {
            trailing.push(last.to_string());
        }
    }
    let mut parts = vec![op];
    parts.extend(trailing.into_iter().rev());
    parts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece<'s> {
    Sql(&'s str),
    BindMarker,
}

/// Split `sql` at every `?` that is not inside a quoted literal, a quoted
/// identifier or a comment.
fn split_bind_markers(sql: &str) -> Vec<Piece<'_>> {
    let bytes = sql.as_bytes();
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'?' => {
                pieces.push(Piece::Sql(&sql[start..i]));
                pieces.push(Piece::BindMarker);
                i += 1;
                start = i;
            }
            b'\'' => {
                let escapes = i > 0
                    && matches!(bytes[i - 1], b'e' | b'E')
                    && (i < 2 || !is_identifier_byte(bytes[i - 2]));
                i = skip_quoted(bytes, i, b'\'', escapes);
            }
            b'"' => i = skip_quoted(bytes, i, b'"', false),
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = match sql[i..].find('\n') {
                    Some(offset) => i + offset + 1,
                    None => bytes.len(),
                };
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = match sql[i + 2..].find("*/") {
                    Some(offset) => i + 2 + offset + 2,
                    None => bytes.len(),
                };
            }
            b'$' => i = skip_dollar_quoted(sql, i),
            _ => i += 1,
        }
    }

    pieces.push(Piece::Sql(&sql[start..]));
    pieces
}

fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || !b.is_ascii()
}

/// Index just past the literal opened by the quote at `open`. Doubled quotes
/// stay inside the literal; so do backslash escapes when `escapes` is set.
fn skip_quoted(bytes: &[u8], open: usize, quote: u8, escapes: bool) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        if escapes && bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Index just past a `$tag$ ... $tag$` body starting at `open`, or
/// `open + 1` when the `$` does not open one (`$1`, `$` inside a name).
fn skip_dollar_quoted(sql: &str, open: usize) -> usize {
    let bytes = sql.as_bytes();
    if open > 0 && is_identifier_byte(bytes[open - 1]) {
        return open + 1;
    }
    let rest = &sql[open + 1..];
    let Some(tag_len) = rest.find('$') else {
        return open + 1;
    };
    let tag = &rest[..tag_len];
    let valid_tag = tag
        .chars()
        .enumerate()
        .all(|(n, c)| c == '_' || c.is_alphabetic() || (n > 0 && c.is_ascii_digit()));
    if !valid_tag {
        return open + 1;
    }

    let delimiter = &sql[open..open + tag_len + 2];
    let body = open + delimiter.len();
    match sql[body..].find(delimiter) {
        Some(offset) => body + offset + delimiter.len(),
        None => bytes.len(),
    }
}

/// Tokenize `sql` into the folded token stream used by the grammar.
pub fn tokenize(sql: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut operator_run: Option<String> = None;

    for piece in split_bind_markers(sql) {
        match piece {
            Piece::Sql(text) => fold(text, &mut tokens, &mut operator_run)?,
            Piece::BindMarker => {
                flush_operator(&mut tokens, &mut operator_run);
                tokens.push(Token::Placeholder("?".to_string()));
            }
        }
    }
    flush_operator(&mut tokens, &mut operator_run);

    Ok(tokens)
}

fn flush_operator(tokens: &mut Vec<Token>, operator_run: &mut Option<String>) {
    if let Some(op) = operator_run.take() {
        tokens.extend(split_operator(op).into_iter().map(Token::Operator));
    }
}

fn fold(sql: &str, tokens: &mut Vec<Token>, operator_run: &mut Option<String>) -> Result<()> {
    let dialect = PostgreSqlDialect {};
    let raw = Tokenizer::new(&dialect, sql)
        .tokenize()
        .map_err(|e| Error::Lex(e.to_string()))?;

    for token in raw {
        let folded = match token {
            SqlToken::EOF => break,
            SqlToken::Whitespace(_) => None,
            SqlToken::Word(word) => Some(Token::Word {
                value: word.value,
                quoted: word.quote_style.is_some(),
            }),
            SqlToken::Number(n, _) => Some(Token::Number(n)),
            SqlToken::SingleQuotedString(s) | SqlToken::EscapedStringLiteral(s) => {
                Some(Token::String(s))
            }
            SqlToken::DollarQuotedString(s) => Some(Token::String(s.value)),
            SqlToken::Placeholder(p) => Some(Token::Placeholder(p)),
            SqlToken::LParen => Some(Token::LParen),
            SqlToken::RParen => Some(Token::RParen),
            SqlToken::LBracket => Some(Token::LBracket),
            SqlToken::RBracket => Some(Token::RBracket),
            SqlToken::Comma => Some(Token::Comma),
            SqlToken::SemiColon => Some(Token::Semicolon),
            SqlToken::Period => Some(Token::Period),
            SqlToken::Colon => Some(Token::Colon),
            SqlToken::DoubleColon => Some(Token::DoubleColon),
            other => {
                let text = other.to_string();
                if !is_operator_text(&text) {
                    return Err(Error::Lex(format!("unsupported token `{}`", text)));
                }
                operator_run.get_or_insert_with(String::new).push_str(&text);
                continue;
            }
        };

        flush_operator(tokens, operator_run);
        if let Some(token) = folded {
            tokens.push(token);
        }
    }
    Ok(())
}
