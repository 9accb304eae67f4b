//! VectorChord grammar rules
//!
//! ```text
//! type_name          ::= ( VECTOR | BIT ) [ '(' dimensions ')' ]
//! extension_expr     ::= operand distance_operator operand
//! index_method       ::= vchordrq | vchordg
//! storage_parameter  ::= options '=' string
//! storage_parameters ::= '(' storage_parameter ')'
//! ```

use std::any::Any;
use std::fmt;

use crate::grammar::Production;
use crate::parser::Parser;
use crate::parser::ast::{Expr, ExtensionNode, IndexMethod, StorageParameter, StorageValue};
use crate::parser::base::{extension_expr as wrap_expr, extension_type};
use crate::parser::lexer::Token;

use super::VectorChordModule;

pub const INDEX_METHODS: [&str; 2] = ["vchordrq", "vchordg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorKind {
    Vector,
    Bit,
}

/// `vector(n)` or `bit(n)` column type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorChordTypeName {
    pub kind: VectorKind,
    pub dimensions: Option<String>,
}

impl VectorChordTypeName {
    pub fn is_bit(&self) -> bool {
        self.kind == VectorKind::Bit
    }
}

impl ExtensionNode for VectorChordTypeName {
    fn layer(&self) -> &'static str {
        VectorChordModule::NAME
    }

    fn describe(&self) -> String {
        let base = match self.kind {
            VectorKind::Vector => "vector",
            VectorKind::Bit => "bit",
        };
        match &self.dimensions {
            Some(n) => format!("{}({})", base, n),
            None => base.to_string(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceOperator {
    /// `<->`
    L2,
    /// `<#>`
    NegativeInnerProduct,
    /// `<=>`
    Cosine,
    /// `<+>`
    L1,
    /// `<~>`, binary vectors only
    Hamming,
    /// `<%>`, binary vectors only
    Jaccard,
}

impl DistanceOperator {
    pub const ALL: [DistanceOperator; 6] = [
        DistanceOperator::L2,
        DistanceOperator::NegativeInnerProduct,
        DistanceOperator::Cosine,
        DistanceOperator::L1,
        DistanceOperator::Hamming,
        DistanceOperator::Jaccard,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            DistanceOperator::L2 => "<->",
            DistanceOperator::NegativeInnerProduct => "<#>",
            DistanceOperator::Cosine => "<=>",
            DistanceOperator::L1 => "<+>",
            DistanceOperator::Hamming => "<~>",
            DistanceOperator::Jaccard => "<%>",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }
}

impl fmt::Display for DistanceOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone)]
pub struct DistanceOperatorExpression {
    pub left: Expr,
    pub operator: DistanceOperator,
    pub right: Expr,
}

/// Expression node produced by the `extension_expr` rule.
///
/// The rule always fills in the distance payload; a node without one is
/// malformed and resolving it is an invariant violation.
#[derive(Debug, Clone)]
pub struct VectorChordExtensionExpr {
    pub distance_operator_expression: Option<DistanceOperatorExpression>,
}

impl ExtensionNode for VectorChordExtensionExpr {
    fn layer(&self) -> &'static str {
        VectorChordModule::NAME
    }

    fn describe(&self) -> String {
        match &self.distance_operator_expression {
            Some(distance) => format!("distance operator `{}`", distance.operator),
            None => "vectorchord extension expression".to_string(),
        }
    }

    fn operands(&self) -> Vec<&Expr> {
        match &self.distance_operator_expression {
            Some(distance) => vec![&distance.left, &distance.right],
            None => Vec::new(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn dimensions(p: &mut Parser<'_>) -> Option<Option<String>> {
    if !p.consume(&Token::LParen) {
        return Some(None);
    }
    let n = match p.next_token()? {
        Token::Number(n) => n.clone(),
        _ => return None,
    };
    p.consume(&Token::RParen).then_some(Some(n))
}

pub fn type_name(p: &mut Parser<'_>) -> Option<Production> {
    let kind = if p.parse_keyword("vector") {
        VectorKind::Vector
    } else if p.is_keyword("bit") && !p.is_keyword_at(1, "varying") {
        p.next_token();
        VectorKind::Bit
    } else {
        return None;
    };
    let dimensions = dimensions(p)?;
    Some(Production::TypeName(extension_type(VectorChordTypeName {
        kind,
        dimensions,
    })))
}

pub fn extension_expr(p: &mut Parser<'_>) -> Option<Production> {
    let left = p.parse_operand().ok()?;
    let operator = match p.next_token()? {
        Token::Operator(op) => DistanceOperator::from_symbol(op)?,
        _ => return None,
    };
    let right = p.parse_operand().ok()?;
    Some(Production::Expr(wrap_expr(VectorChordExtensionExpr {
        distance_operator_expression: Some(DistanceOperatorExpression {
            left,
            operator,
            right,
        }),
    })))
}

pub fn index_method(p: &mut Parser<'_>) -> Option<Production> {
    let method = INDEX_METHODS.iter().find(|method| p.is_keyword(method))?;
    p.next_token();
    Some(Production::IndexMethod(IndexMethod::new(*method)))
}

/// `options = '...'`; the value is TOML, usually dollar-quoted
pub fn storage_parameter(p: &mut Parser<'_>) -> Option<Production> {
    options(p).map(Production::StorageParameter)
}

pub fn storage_parameters(p: &mut Parser<'_>) -> Option<Production> {
    if !p.consume(&Token::LParen) {
        return None;
    }
    let parameter = options(p)?;
    p.consume(&Token::RParen)
        .then(|| Production::StorageParameters(vec![parameter]))
}

fn options(p: &mut Parser<'_>) -> Option<StorageParameter> {
    if !p.parse_keyword("options") || !p.parse_operator("=") {
        return None;
    }
    match p.next_token()? {
        Token::String(text) => Some(StorageParameter {
            name: "options".to_string(),
            value: Some(StorageValue::String(text.clone())),
        }),
        _ => None,
    }
}
