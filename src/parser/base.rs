//! Base PostgreSQL grammar
//!
//! Covers the statements needed to exercise the extension points:
//! `CREATE TABLE`, `CREATE INDEX`, `SELECT` and `INSERT`. The five extension
//! point productions at the top of this file are the last link of every rule
//! chain.

use std::sync::Arc;

use super::Parser;
use super::ast::*;
use super::lexer::Token;
use crate::error::Result;
use crate::grammar::{ExtensionPoint, Production};

/// Index access methods built into PostgreSQL
pub const INDEX_METHODS: &[&str] = &["btree", "hash", "gist", "spgist", "gin", "brin"];

/// Index storage parameters built into PostgreSQL
pub const STORAGE_PARAMETERS: &[&str] = &[
    "fillfactor",
    "deduplicate_items",
    "buffering",
    "fastupdate",
    "gin_pending_list_limit",
    "pages_per_range",
    "autosummarize",
];

// Words that end an expression list and never start an alias
const RESERVED: &[&str] = &[
    "select", "from", "where", "order", "by", "limit", "offset", "group", "having", "on", "using",
    "with", "as", "and", "or", "not", "asc", "desc", "values", "is", "null", "like", "union",
    "nulls",
];

/// Base production for `point`
pub fn production(p: &mut Parser<'_>, point: ExtensionPoint) -> Option<Production> {
    match point {
        ExtensionPoint::TypeName => type_name(p).map(Production::TypeName),
        // The base grammar reserves this point for layers and matches nothing
        ExtensionPoint::ExtensionExpr => None,
        ExtensionPoint::IndexMethod => index_method(p).map(Production::IndexMethod),
        ExtensionPoint::StorageParameter => storage_parameter(p).map(Production::StorageParameter),
        ExtensionPoint::StorageParameters => {
            storage_parameters(p).map(Production::StorageParameters)
        }
    }
}

/// `name [ '(' modifier, ... ')' ]`, including the multi-word PostgreSQL
/// spellings such as `double precision` and `timestamp with time zone`.
pub fn type_name(p: &mut Parser<'_>) -> Option<TypeName> {
    p.attempt(|p| {
        let mut name = p.parse_identifier_opt()?;
        let suffix = match name.as_str() {
            "double" if p.parse_keyword("precision") => Some(" precision"),
            "character" | "char" | "bit" if p.parse_keyword("varying") => Some(" varying"),
            "timestamp" | "time" if p.parse_keywords(&["with", "time", "zone"]) => {
                Some(" with time zone")
            }
            "timestamp" | "time" if p.parse_keywords(&["without", "time", "zone"]) => {
                Some(" without time zone")
            }
            _ => None,
        };
        if let Some(suffix) = suffix {
            name.push_str(suffix);
        }
        let modifiers = type_modifiers(p)?;
        Some(TypeName::Named { name, modifiers })
    })
}

/// Optional `'(' number, ... ')'`; `None` when the list is malformed
pub fn type_modifiers(p: &mut Parser<'_>) -> Option<Vec<String>> {
    let mut modifiers = Vec::new();
    if !p.consume(&Token::LParen) {
        return Some(modifiers);
    }
    loop {
        match p.next_token() {
            Some(Token::Number(n)) => modifiers.push(n.clone()),
            _ => return None,
        }
        if p.consume(&Token::RParen) {
            return Some(modifiers);
        }
        if !p.consume(&Token::Comma) {
            return None;
        }
    }
}

pub fn index_method(p: &mut Parser<'_>) -> Option<IndexMethod> {
    let method = INDEX_METHODS.iter().find(|method| p.is_keyword(method))?;
    p.next_token();
    Some(IndexMethod::new(*method))
}

/// `name [ '=' value ]` for the built-in parameters
pub fn storage_parameter(p: &mut Parser<'_>) -> Option<StorageParameter> {
    p.attempt(|p| {
        let name = STORAGE_PARAMETERS.iter().find(|name| p.is_keyword(name))?;
        p.next_token();
        let value = if p.parse_operator("=") {
            Some(storage_value(p)?)
        } else {
            None
        };
        Some(StorageParameter {
            name: name.to_string(),
            value,
        })
    })
}

pub fn storage_value(p: &mut Parser<'_>) -> Option<StorageValue> {
    let value = match p.peek()? {
        Token::Number(n) => StorageValue::Number(n.clone()),
        Token::String(s) => StorageValue::String(s.clone()),
        Token::Word { value, .. } => StorageValue::Word(value.to_lowercase()),
        _ => return None,
    };
    p.next_token();
    Some(value)
}

/// `'(' storage_parameter, ... ')'`, each element through the
/// `storage_parameter` chain
pub fn storage_parameters(p: &mut Parser<'_>) -> Option<Vec<StorageParameter>> {
    p.attempt(|p| {
        if !p.consume(&Token::LParen) {
            return None;
        }
        let mut parameters = vec![p.storage_parameter()?];
        while p.consume(&Token::Comma) {
            parameters.push(p.storage_parameter()?);
        }
        p.consume(&Token::RParen).then_some(parameters)
    })
}

fn is_reserved(token: Option<&Token>) -> bool {
    matches!(
        token,
        Some(Token::Word { value, quoted: false })
            if RESERVED.iter().any(|word| value.eq_ignore_ascii_case(word))
    )
}

impl Parser<'_> {
    pub fn parse_statements(&mut self) -> Result<Vec<NamedStatement>> {
        let mut statements = Vec::new();
        loop {
            while self.consume(&Token::Semicolon) {}
            if self.is_exhausted() {
                return Ok(statements);
            }
            statements.push(self.parse_named_statement()?);
            if !self.is_exhausted() && !self.consume(&Token::Semicolon) {
                return Err(self.error("expected `;`"));
            }
        }
    }

    /// `[label ':'] statement`
    pub fn parse_named_statement(&mut self) -> Result<NamedStatement> {
        let label = match (self.peek(), self.peek_nth(1)) {
            (Some(Token::Word { value, .. }), Some(Token::Colon)) => {
                self.pos_advance(2);
                Some(value.clone())
            }
            _ => None,
        };
        let statement = self.parse_statement()?;
        Ok(NamedStatement { label, statement })
    }

    pub fn parse_statement(&mut self) -> Result<Statement> {
        if self.parse_keyword("create") {
            if self.parse_keyword("table") {
                return self.parse_create_table().map(Statement::CreateTable);
            }
            let unique = self.parse_keyword("unique");
            if self.parse_keyword("index") {
                return self.parse_create_index(unique).map(Statement::CreateIndex);
            }
            return Err(self.error("expected TABLE or INDEX after CREATE"));
        }
        if self.parse_keyword("select") {
            return self.parse_select().map(Statement::Select);
        }
        if self.parse_keyword("insert") {
            return self.parse_insert().map(Statement::Insert);
        }
        Err(self.error("expected a statement"))
    }

    fn parse_create_table(&mut self) -> Result<CreateTable> {
        let if_not_exists = self.parse_keywords(&["if", "not", "exists"]);
        let name = self.parse_identifier()?;
        self.expect(&Token::LParen)?;

        let mut columns = Vec::new();
        let mut primary_key = Vec::new();
        loop {
            if self.parse_keyword("constraint") {
                self.parse_identifier()?;
            }
            if self.parse_keywords(&["primary", "key"]) {
                primary_key = self.parse_identifier_list()?;
            } else if self.parse_keyword("unique") {
                self.parse_identifier_list()?;
            } else {
                columns.push(self.parse_column_def()?);
            }
            if !self.consume(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen)?;

        for column in columns.iter_mut() {
            if primary_key.contains(&column.name) {
                column.primary_key = true;
            }
        }
        Ok(CreateTable {
            name,
            if_not_exists,
            columns,
            primary_key,
        })
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.parse_identifier()?;
        let type_name = self
            .type_name()
            .ok_or_else(|| self.error(format!("expected type name for column {}", name)))?;

        let mut column = ColumnDef {
            name,
            type_name,
            not_null: false,
            primary_key: false,
            default: None,
        };
        loop {
            if self.parse_keywords(&["not", "null"]) {
                column.not_null = true;
            } else if self.parse_keyword("null") {
                column.not_null = false;
            } else if self.parse_keywords(&["primary", "key"]) {
                column.primary_key = true;
            } else if self.parse_keyword("unique") {
                // no effect on typing
            } else if self.parse_keyword("default") {
                column.default = Some(self.parse_operand()?);
            } else if self.parse_keyword("references") {
                self.parse_identifier()?;
                if self.peek() == Some(&Token::LParen) {
                    self.parse_identifier_list()?;
                }
            } else if self.parse_keyword("check") {
                self.expect(&Token::LParen)?;
                self.parse_expr()?;
                self.expect(&Token::RParen)?;
            } else {
                return Ok(column);
            }
        }
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>> {
        self.expect(&Token::LParen)?;
        let mut names = vec![self.parse_identifier()?];
        while self.consume(&Token::Comma) {
            names.push(self.parse_identifier()?);
        }
        self.expect(&Token::RParen)?;
        Ok(names)
    }

    fn parse_create_index(&mut self, unique: bool) -> Result<CreateIndex> {
        self.parse_keyword("concurrently");
        self.parse_keywords(&["if", "not", "exists"]);
        let name = if self.is_keyword("on") {
            None
        } else {
            Some(self.parse_identifier()?)
        };
        self.expect_keyword("on")?;
        self.parse_keyword("only");
        let table = self.parse_identifier()?;

        let method = if self.parse_keyword("using") {
            Some(
                self.index_method()
                    .ok_or_else(|| self.error("unknown index method"))?,
            )
        } else {
            None
        };

        self.expect(&Token::LParen)?;
        let mut columns = vec![self.parse_index_column()?];
        while self.consume(&Token::Comma) {
            columns.push(self.parse_index_column()?);
        }
        self.expect(&Token::RParen)?;

        let parameters = if self.parse_keyword("with") {
            self.storage_parameters()
                .ok_or_else(|| self.error("invalid storage parameters"))?
        } else {
            Vec::new()
        };

        let predicate = if self.parse_keyword("where") {
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(CreateIndex {
            name,
            table,
            unique,
            method,
            columns,
            parameters,
            predicate,
        })
    }

    fn parse_index_column(&mut self) -> Result<IndexColumn> {
        let expr = self.parse_operand()?;
        let opclass = match self.peek() {
            Some(Token::Word { .. }) if !is_reserved(self.peek()) => Some(self.parse_identifier()?),
            _ => None,
        };
        let descending = if self.parse_keyword("desc") {
            true
        } else {
            self.parse_keyword("asc");
            false
        };
        if self.parse_keyword("nulls") && !self.parse_keyword("first") {
            self.expect_keyword("last")?;
        }
        Ok(IndexColumn {
            expr,
            opclass,
            descending,
        })
    }

    fn parse_select(&mut self) -> Result<Select> {
        let distinct = self.parse_keyword("distinct");
        if !distinct {
            self.parse_keyword("all");
        }

        let mut projection = vec![self.parse_select_item()?];
        while self.consume(&Token::Comma) {
            projection.push(self.parse_select_item()?);
        }

        let from = if self.parse_keyword("from") {
            let name = self.parse_identifier()?;
            let alias = self.parse_alias()?;
            Some(TableRef { name, alias })
        } else {
            None
        };

        let selection = if self.parse_keyword("where") {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let mut order_by = Vec::new();
        if self.parse_keywords(&["order", "by"]) {
            loop {
                let expr = self.parse_expr()?;
                let descending = if self.parse_keyword("desc") {
                    true
                } else {
                    self.parse_keyword("asc");
                    false
                };
                order_by.push(OrderByExpr { expr, descending });
                if !self.consume(&Token::Comma) {
                    break;
                }
            }
        }

        let limit = if self.parse_keyword("limit") {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let offset = if self.parse_keyword("offset") {
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(Select {
            distinct,
            projection,
            from,
            selection,
            order_by,
            limit,
            offset,
        })
    }

    fn parse_select_item(&mut self) -> Result<SelectItem> {
        if self.parse_operator("*") {
            return Ok(SelectItem::Wildcard);
        }
        let expr = self.parse_expr()?;
        let alias = self.parse_alias()?;
        Ok(SelectItem::Expr { expr, alias })
    }

    fn parse_alias(&mut self) -> Result<Option<String>> {
        if self.parse_keyword("as") {
            return self.parse_identifier().map(Some);
        }
        match self.peek() {
            Some(Token::Word { .. }) if !is_reserved(self.peek()) => {
                self.parse_identifier().map(Some)
            }
            _ => Ok(None),
        }
    }

    fn parse_insert(&mut self) -> Result<Insert> {
        self.expect_keyword("into")?;
        let table = self.parse_identifier()?;
        let columns = if self.peek() == Some(&Token::LParen) {
            self.parse_identifier_list()?
        } else {
            Vec::new()
        };
        self.expect_keyword("values")?;

        let mut rows = Vec::new();
        loop {
            self.expect(&Token::LParen)?;
            let mut row = vec![self.parse_expr()?];
            while self.consume(&Token::Comma) {
                row.push(self.parse_expr()?);
            }
            self.expect(&Token::RParen)?;
            rows.push(row);
            if !self.consume(&Token::Comma) {
                break;
            }
        }
        Ok(Insert {
            table,
            columns,
            rows,
        })
    }

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.parse_keyword("or") {
            let right = self.parse_and()?;
            left = binary(left, BinaryOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        while self.parse_keyword("and") {
            let right = self.parse_not()?;
            left = binary(left, BinaryOp::And, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.parse_keyword("not") {
            let expr = self.parse_not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                expr: Box::new(expr),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            if self.parse_keyword("is") {
                let negated = self.parse_keyword("not");
                self.expect_keyword("null")?;
                left = Expr::IsNull {
                    expr: Box::new(left),
                    negated,
                };
                continue;
            }
            let op = if self.parse_keyword("like") {
                BinaryOp::Like
            } else if self.parse_keywords(&["not", "like"]) {
                BinaryOp::NotLike
            } else {
                let op = match self.peek() {
                    Some(Token::Operator(op)) => match op.as_str() {
                        "=" => BinaryOp::Eq,
                        "<>" | "!=" => BinaryOp::NotEq,
                        "<" => BinaryOp::Lt,
                        "<=" => BinaryOp::LtEq,
                        ">" => BinaryOp::Gt,
                        ">=" => BinaryOp::GtEq,
                        _ => return Ok(left),
                    },
                    _ => return Ok(left),
                };
                self.next_token();
                op
            };
            let right = self.parse_additive()?;
            left = binary(left, op, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Operator(op)) => match op.as_str() {
                    "+" => BinaryOp::Plus,
                    "-" => BinaryOp::Minus,
                    "||" => BinaryOp::Concat,
                    _ => return Ok(left),
                },
                _ => return Ok(left),
            };
            self.next_token();
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Operator(op)) => match op.as_str() {
                    "*" => BinaryOp::Multiply,
                    "/" => BinaryOp::Divide,
                    "%" => BinaryOp::Modulo,
                    _ => return Ok(left),
                },
                _ => return Ok(left),
            };
            self.next_token();
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = if self.parse_operator("-") {
            UnaryOp::Minus
        } else if self.parse_operator("+") {
            UnaryOp::Plus
        } else {
            return self.parse_primary();
        };
        let expr = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
        })
    }

    /// The `extension_expr` chain gets the first try at every primary
    fn parse_primary(&mut self) -> Result<Expr> {
        if let Some(expr) = self.extension_expr() {
            return Ok(expr);
        }
        self.parse_operand()
    }

    /// An atom with optional `::type` casts. Never consults `extension_expr`,
    /// so layer rules can use it for their operands without recursing.
    ///
    /// Results are memoised by parser state: every `extension_expr` rule and
    /// the base fallback parse the same operand, and nested operands would
    /// otherwise be re-parsed once per attempt at every level.
    pub fn parse_operand(&mut self) -> Result<Expr> {
        let start = self.checkpoint();
        if let Some((result, end)) = self.operands.get(&start).cloned() {
            self.rewind(end);
            return result;
        }
        let result = self.parse_operand_uncached();
        self.operands.insert(start, (result.clone(), self.checkpoint()));
        result
    }

    fn parse_operand_uncached(&mut self) -> Result<Expr> {
        let mut expr = self.parse_atom()?;
        while self.consume(&Token::DoubleColon) {
            let type_name = self
                .type_name()
                .ok_or_else(|| self.error("expected type name after `::`"))?;
            expr = Expr::Cast {
                expr: Box::new(expr),
                type_name,
            };
        }
        Ok(expr)
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        let Some(token) = self.peek() else {
            return Err(self.error("expected expression"));
        };
        match token {
            Token::Number(n) => {
                self.next_token();
                Ok(Expr::Literal(Literal::Number(n.clone())))
            }
            Token::String(s) => {
                self.next_token();
                Ok(Expr::Literal(Literal::String(s.clone())))
            }
            Token::Placeholder(label) => {
                self.next_token();
                Ok(self.bind_arg(label.clone()))
            }
            Token::Colon => match self.peek_nth(1) {
                Some(Token::Word { value, .. }) => {
                    let label = format!(":{}", value);
                    self.pos_advance(2);
                    Ok(self.bind_arg(label))
                }
                _ => Err(self.error("expected argument name after `:`")),
            },
            Token::LParen => {
                self.next_token();
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(Expr::Nested(Box::new(expr)))
            }
            Token::Word { quoted: false, .. } if self.is_keyword("null") => {
                self.next_token();
                Ok(Expr::Literal(Literal::Null))
            }
            Token::Word { quoted: false, .. } if self.is_keyword("true") => {
                self.next_token();
                Ok(Expr::Literal(Literal::Boolean(true)))
            }
            Token::Word { quoted: false, .. } if self.is_keyword("false") => {
                self.next_token();
                Ok(Expr::Literal(Literal::Boolean(false)))
            }
            Token::Word { quoted: false, .. }
                if self.is_keyword("cast") && self.peek_nth(1) == Some(&Token::LParen) =>
            {
                self.pos_advance(2);
                let expr = self.parse_expr()?;
                self.expect_keyword("as")?;
                let type_name = self
                    .type_name()
                    .ok_or_else(|| self.error("expected type name in CAST"))?;
                self.expect(&Token::RParen)?;
                Ok(Expr::Cast {
                    expr: Box::new(expr),
                    type_name,
                })
            }
            Token::Word { .. } => self.parse_name_expr(),
            _ => Err(self.error("expected expression")),
        }
    }

    fn pos_advance(&mut self, n: usize) {
        for _ in 0..n {
            self.next_token();
        }
    }

    fn bind_arg(&mut self, label: String) -> Expr {
        let index = self.next_argument();
        Expr::BindArg(BindArg { index, label })
    }

    /// Column reference, qualified column reference or function call
    fn parse_name_expr(&mut self) -> Result<Expr> {
        let first = self.parse_identifier()?;
        if self.consume(&Token::Period) {
            let name = self.parse_identifier()?;
            return Ok(Expr::Column {
                qualifier: Some(first),
                name,
            });
        }
        if !self.consume(&Token::LParen) {
            return Ok(Expr::Column {
                qualifier: None,
                name: first,
            });
        }

        let mut call = FunctionCall::new(&first, Vec::new());
        if self.consume(&Token::RParen) {
            return Ok(Expr::Function(call));
        }
        if self.is_operator("*") && self.peek_nth(1) == Some(&Token::RParen) {
            self.pos_advance(2);
            call.wildcard = true;
            return Ok(Expr::Function(call));
        }
        call.distinct = self.parse_keyword("distinct");
        call.args.push(self.parse_expr()?);
        while self.consume(&Token::Comma) {
            call.args.push(self.parse_expr()?);
        }
        self.expect(&Token::RParen)?;
        Ok(Expr::Function(call))
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

/// Wrap a layer's node as an expression
pub fn extension_expr(node: impl ExtensionNode) -> Expr {
    Expr::Extension(Arc::new(node))
}

/// Wrap a layer's node as a type name
pub fn extension_type(node: impl ExtensionNode) -> TypeName {
    TypeName::Extension(Arc::new(node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;
    use crate::parser::lexer;

    fn parse_one(sql: &str) -> Statement {
        let grammar = Grammar::new();
        let mut statements = crate::parser::parse(sql, &grammar).unwrap();
        assert_eq!(statements.len(), 1);
        statements.remove(0).statement
    }

    fn base_type(sql: &str) -> Option<TypeName> {
        let grammar = Grammar::new();
        let tokens = lexer::tokenize(sql).unwrap();
        let mut parser = Parser::new(&tokens, &grammar);
        parser.type_name()
    }

    #[test]
    fn test_multi_word_type_names() {
        let cases = [
            ("double precision", "double precision"),
            ("character varying(20)", "character varying"),
            ("timestamp with time zone", "timestamp with time zone"),
            ("TIMESTAMP", "timestamp"),
        ];
        for (sql, expected) in cases {
            match base_type(sql) {
                Some(TypeName::Named { name, .. }) => assert_eq!(name, expected, "{}", sql),
                other => panic!("unexpected {:?} for {}", other, sql),
            }
        }
    }

    #[test]
    fn test_type_modifiers() {
        match base_type("numeric(10, 2)") {
            Some(TypeName::Named { name, modifiers }) => {
                assert_eq!(name, "numeric");
                assert_eq!(modifiers, vec!["10", "2"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(base_type("numeric(10,").is_none());
    }

    #[test]
    fn test_create_table() {
        let Statement::CreateTable(table) = parse_one(
            "CREATE TABLE IF NOT EXISTS items (
                id BIGINT NOT NULL,
                name TEXT DEFAULT 'x',
                score REAL,
                PRIMARY KEY (id)
            )",
        ) else {
            panic!("expected CREATE TABLE");
        };
        assert!(table.if_not_exists);
        assert_eq!(table.name, "items");
        assert_eq!(table.columns.len(), 3);
        assert!(table.columns[0].not_null);
        assert!(table.columns[0].primary_key);
        assert!(table.columns[1].default.is_some());
        assert_eq!(table.primary_key, vec!["id"]);
    }

    #[test]
    fn test_create_index_with_base_parameters() {
        let Statement::CreateIndex(index) =
            parse_one("CREATE INDEX idx ON items USING btree (name DESC) WITH (fillfactor = 70)")
        else {
            panic!("expected CREATE INDEX");
        };
        assert_eq!(index.name.as_deref(), Some("idx"));
        assert_eq!(index.method, Some(IndexMethod::new("btree")));
        assert!(index.columns[0].descending);
        assert_eq!(
            index.parameters,
            vec![StorageParameter {
                name: "fillfactor".to_string(),
                value: Some(StorageValue::Number("70".to_string())),
            }]
        );
    }

    #[test]
    fn test_unknown_index_method_is_a_parse_error() {
        let grammar = Grammar::new();
        let err = crate::parser::parse("CREATE INDEX ON items USING vchordrq (v)", &grammar)
            .unwrap_err();
        assert!(err.to_string().contains("unknown index method"), "{}", err);
    }

    #[test]
    fn test_select_clauses() {
        let Statement::Select(select) = parse_one(
            "SELECT id, lower(name) AS n FROM items i WHERE score >= ? ORDER BY id DESC LIMIT 10",
        ) else {
            panic!("expected SELECT");
        };
        assert_eq!(select.projection.len(), 2);
        assert_eq!(
            select.from,
            Some(TableRef {
                name: "items".to_string(),
                alias: Some("i".to_string()),
            })
        );
        assert!(select.selection.is_some());
        assert!(select.order_by[0].descending);
        assert!(select.limit.is_some());
    }

    #[test]
    fn test_operator_precedence() {
        let Statement::Select(select) = parse_one("SELECT a + b * c = d AND e") else {
            panic!("expected SELECT");
        };
        let SelectItem::Expr { expr, .. } = &select.projection[0] else {
            panic!("expected expression");
        };
        let Expr::Binary { op: BinaryOp::And, left, .. } = expr else {
            panic!("expected AND at the root, got {:?}", expr);
        };
        let Expr::Binary { op: BinaryOp::Eq, left, .. } = left.as_ref() else {
            panic!("expected = under AND");
        };
        assert!(matches!(left.as_ref(), Expr::Binary { op: BinaryOp::Plus, .. }));
    }

    #[test]
    fn test_bind_arguments_are_numbered() {
        let Statement::Insert(insert) = parse_one("INSERT INTO items (id, name) VALUES (?, :name)")
        else {
            panic!("expected INSERT");
        };
        let labels: Vec<_> = insert.rows[0]
            .iter()
            .map(|expr| match expr {
                Expr::BindArg(arg) => (arg.index, arg.label.clone()),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(labels, vec![(0, "?".to_string()), (1, ":name".to_string())]);
    }

    #[test]
    fn test_labels_and_multiple_statements() {
        let grammar = Grammar::new();
        let statements = crate::parser::parse(
            "CREATE TABLE t (id INTEGER);\nselectAll:\nSELECT * FROM t;",
            &grammar,
        )
        .unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].label, None);
        assert_eq!(statements[1].label.as_deref(), Some("selectAll"));
    }

    #[test]
    fn test_casts_and_count_star() {
        let Statement::Select(select) =
            parse_one("SELECT count(*), '1'::integer, CAST(x AS text) FROM t")
        else {
            panic!("expected SELECT");
        };
        let kinds: Vec<_> = select
            .projection
            .iter()
            .map(|item| match item {
                SelectItem::Expr { expr: Expr::Function(call), .. } => {
                    format!("fn:{}:{}", call.name, call.wildcard)
                }
                SelectItem::Expr { expr: Expr::Cast { type_name, .. }, .. } => {
                    format!("cast:{}", type_name)
                }
                other => format!("{:?}", other),
            })
            .collect();
        assert_eq!(kinds, vec!["fn:count:true", "cast:integer", "cast:text"]);
    }

    #[test]
    fn test_unmatched_operator_fails_in_base_grammar() {
        let grammar = Grammar::new();
        let err = crate::parser::parse("SELECT a <-> b FROM t", &grammar).unwrap_err();
        assert!(matches!(err, crate::error::Error::Parse { .. }));
    }
}
