pub mod ast;
pub mod base;
pub mod lexer;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::grammar::{ExtensionPoint, Grammar, Production};
use ast::{Expr, IndexMethod, NamedStatement, StorageParameter, TypeName};
use lexer::Token;

/// Parse every statement in `sql` against `grammar`.
pub fn parse(sql: &str, grammar: &Grammar) -> Result<Vec<NamedStatement>> {
    let tokens = lexer::tokenize(sql)?;
    let mut parser = Parser::new(&tokens, grammar);
    parser.parse_statements()
}

/// Saved parser state for backtracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checkpoint {
    pos: usize,
    args: usize,
}

/// Recursive-descent cursor over a token stream.
///
/// Productions at extension points go through the grammar's rule chains;
/// everything else is the base grammar in [`base`].
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    args: usize,
    grammar: &'a Grammar,
    operands: HashMap<Checkpoint, (Result<Expr>, Checkpoint)>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], grammar: &'a Grammar) -> Self {
        Parser {
            tokens,
            pos: 0,
            args: 0,
            grammar,
            operands: HashMap::new(),
        }
    }

    pub fn grammar(&self) -> &'a Grammar {
        self.grammar
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            args: self.args,
        }
    }

    pub fn rewind(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.args = checkpoint.args;
    }

    /// Run `f`, rewinding if it yields `None`
    pub fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let start = self.checkpoint();
        let result = f(self);
        if result.is_none() {
            self.rewind(start);
        }
        result
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    pub fn peek_nth(&self, n: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + n)
    }

    pub fn next_token(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Allocate the next bind argument position
    pub fn next_argument(&mut self) -> usize {
        let index = self.args;
        self.args += 1;
        index
    }

    pub fn error(&self, message: impl Into<String>) -> Error {
        let found = match self.peek() {
            Some(token) => format!("`{}`", token),
            None => "end of input".to_string(),
        };
        Error::parse(format!("{}, found {}", message.into(), found), self.pos)
    }

    pub fn consume(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, token: &Token) -> Result<()> {
        if self.consume(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`", token)))
        }
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.is_keyword_at(0, keyword)
    }

    pub fn is_keyword_at(&self, n: usize, keyword: &str) -> bool {
        matches!(
            self.peek_nth(n),
            Some(Token::Word { value, quoted: false }) if value.eq_ignore_ascii_case(keyword)
        )
    }

    pub fn parse_keyword(&mut self, keyword: &str) -> bool {
        if self.is_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume all of `keywords` in order, or none of them
    pub fn parse_keywords(&mut self, keywords: &[&str]) -> bool {
        if keywords
            .iter()
            .enumerate()
            .all(|(n, keyword)| self.is_keyword_at(n, keyword))
        {
            self.pos += keywords.len();
            true
        } else {
            false
        }
    }

    pub fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.parse_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", keyword.to_uppercase())))
        }
    }

    pub fn is_operator(&self, op: &str) -> bool {
        matches!(self.peek(), Some(Token::Operator(found)) if found == op)
    }

    pub fn parse_operator(&mut self, op: &str) -> bool {
        if self.is_operator(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Identifier, folded to lower case unless quoted
    pub fn parse_identifier_opt(&mut self) -> Option<String> {
        match self.peek() {
            Some(Token::Word { value, quoted: true }) => {
                self.pos += 1;
                Some(value.clone())
            }
            Some(Token::Word { value, quoted: false }) => {
                self.pos += 1;
                Some(value.to_lowercase())
            }
            _ => None,
        }
    }

    pub fn parse_identifier(&mut self) -> Result<String> {
        self.parse_identifier_opt()
            .ok_or_else(|| self.error("expected identifier"))
    }

    /// Try the extension point's rule chain, newest first, then the base
    /// production. Rewinds on every miss.
    pub fn production(&mut self, point: ExtensionPoint) -> Option<Production> {
        let grammar = self.grammar;
        let start = self.checkpoint();

        for rule in grammar.rules(point) {
            match rule.parse(self) {
                Some(found) if found.point() == point => {
                    debug!(point = %point, layer = rule.layer(), "rule matched");
                    return Some(found);
                }
                Some(found) => {
                    warn!(
                        point = %point,
                        layer = rule.layer(),
                        produced = %found.point(),
                        "ignoring production for another extension point"
                    );
                }
                None => {}
            }
            self.rewind(start);
        }

        let found = base::production(self, point);
        if found.is_none() {
            self.rewind(start);
        }
        found
    }

    pub fn type_name(&mut self) -> Option<TypeName> {
        self.production(ExtensionPoint::TypeName)
            .and_then(Production::into_type_name)
    }

    pub fn extension_expr(&mut self) -> Option<Expr> {
        self.production(ExtensionPoint::ExtensionExpr)
            .and_then(Production::into_expr)
    }

    pub fn index_method(&mut self) -> Option<IndexMethod> {
        self.production(ExtensionPoint::IndexMethod)
            .and_then(Production::into_index_method)
    }

    pub fn storage_parameter(&mut self) -> Option<StorageParameter> {
        self.production(ExtensionPoint::StorageParameter)
            .and_then(Production::into_storage_parameter)
    }

    pub fn storage_parameters(&mut self) -> Option<Vec<StorageParameter>> {
        self.production(ExtensionPoint::StorageParameters)
            .and_then(Production::into_storage_parameters)
    }
}
