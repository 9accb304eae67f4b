//! Point geometry layer
//!
//! A second, independently written dialect module. It shows how layers
//! compose over the same extension points:
//! - `type_name`: the `point` column type
//! - `extension_expr`: `<->` (distance) and `~=` (same as)
//! - functions `magnitude(point)` and `distance(point, point)`
//!
//! Auto-registers via inventory.

use std::any::Any;
use std::fmt;

use vchord_dialect::error::Result;
use vchord_dialect::extensions::DialectModule;
use vchord_dialect::grammar::{ExtensionPoint, Grammar, Production};
use vchord_dialect::parser::Parser;
use vchord_dialect::parser::ast::{Expr, ExtensionNode, FunctionCall, TypeName};
use vchord_dialect::parser::base::{extension_expr as wrap_expr, extension_type};
use vchord_dialect::parser::lexer::Token;
use vchord_dialect::resolver::{ResolveContext, TypeResolver};
use vchord_dialect::types::{DialectType, IntermediateType, PrimitiveType};

/// 2D Cartesian point, carried as its text form `(x,y)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointSqlType {
    Point,
}

impl DialectType for PointSqlType {
    fn name(&self) -> &'static str {
        "point"
    }

    fn dialect(&self) -> &'static str {
        PointModule::NAME
    }

    fn host_type(&self) -> &'static str {
        "String"
    }

    fn bind(&self, index: usize, value: &str) -> String {
        format!("bind_string({}, {})", index, value)
    }

    fn read(&self, index: usize, cursor: &str) -> String {
        format!("{}.get_string({})", cursor, index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointTypeName;

impl ExtensionNode for PointTypeName {
    fn layer(&self) -> &'static str {
        PointModule::NAME
    }

    fn describe(&self) -> String {
        "point".to_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointOperator {
    /// `<->`
    Distance,
    /// `~=`
    Same,
}

impl PointOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            PointOperator::Distance => "<->",
            PointOperator::Same => "~=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<->" => Some(PointOperator::Distance),
            "~=" => Some(PointOperator::Same),
            _ => None,
        }
    }
}

impl fmt::Display for PointOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone)]
pub struct PointExpr {
    pub left: Expr,
    pub operator: PointOperator,
    pub right: Expr,
}

impl ExtensionNode for PointExpr {
    fn layer(&self) -> &'static str {
        PointModule::NAME
    }

    fn describe(&self) -> String {
        format!("point operator `{}`", self.operator)
    }

    fn operands(&self) -> Vec<&Expr> {
        vec![&self.left, &self.right]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn type_name(p: &mut Parser<'_>) -> Option<Production> {
    p.parse_keyword("point")
        .then(|| Production::TypeName(extension_type(PointTypeName)))
}

fn point_expr(p: &mut Parser<'_>) -> Option<Production> {
    let left = p.parse_operand().ok()?;
    let operator = match p.next_token()? {
        Token::Operator(op) => PointOperator::from_symbol(op)?,
        _ => return None,
    };
    let right = p.parse_operand().ok()?;
    Some(Production::Expr(wrap_expr(PointExpr {
        left,
        operator,
        right,
    })))
}

const BOOLEAN_BINARY_TYPES: &[&dyn DialectType] = &[&PointSqlType::Point];

pub struct PointTypeResolver {
    parent: Box<dyn TypeResolver>,
}

impl PointTypeResolver {
    pub fn new(parent: Box<dyn TypeResolver>) -> Self {
        PointTypeResolver { parent }
    }
}

impl TypeResolver for PointTypeResolver {
    fn boolean_binary_candidate_types(&self) -> Vec<&'static dyn DialectType> {
        BOOLEAN_BINARY_TYPES
            .iter()
            .copied()
            .chain(self.parent.boolean_binary_candidate_types())
            .collect()
    }

    fn definition_type(&self, type_name: &TypeName) -> Result<IntermediateType> {
        match type_name {
            TypeName::Extension(node) if node.is::<PointTypeName>() => {
                Ok(IntermediateType::new(&PointSqlType::Point))
            }
            _ => self.parent.definition_type(type_name),
        }
    }

    fn resolved_type(&self, expr: &Expr, cx: &ResolveContext<'_>) -> Result<IntermediateType> {
        if let Expr::Extension(node) = expr
            && let Some(point) = node.downcast_ref::<PointExpr>()
        {
            let ty: &'static dyn DialectType = match point.operator {
                PointOperator::Distance => &PrimitiveType::Real,
                PointOperator::Same => &PrimitiveType::Boolean,
            };
            return Ok(IntermediateType::new(ty));
        }
        self.parent.resolved_type(expr, cx)
    }

    fn function_type(
        &self,
        call: &FunctionCall,
        cx: &ResolveContext<'_>,
    ) -> Result<Option<IntermediateType>> {
        match call.name.to_lowercase().as_str() {
            "magnitude" | "distance" => Ok(Some(IntermediateType::new(&PrimitiveType::Real))),
            _ => self.parent.function_type(call, cx),
        }
    }

    fn function_argument_types(&self, call: &FunctionCall) -> Option<Vec<IntermediateType>> {
        let point = IntermediateType::new(&PointSqlType::Point);
        match call.name.to_lowercase().as_str() {
            "magnitude" => Some(vec![point]),
            "distance" => Some(vec![point.clone(), point]),
            _ => self.parent.function_argument_types(call),
        }
    }
}

/// Point layer module - self-registers with the dialect
#[derive(Debug, Default)]
pub struct PointModule;

impl PointModule {
    pub const NAME: &'static str = "point";

    /// Const singleton instance for inventory registration
    pub const INSTANCE: Self = PointModule;
}

impl DialectModule for PointModule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn setup(&self, grammar: &mut Grammar) {
        tracing::debug!("Installing point grammar rules");
        grammar.install(ExtensionPoint::TypeName, Self::NAME, type_name);
        grammar.install(ExtensionPoint::ExtensionExpr, Self::NAME, point_expr);
    }

    fn type_resolver(&self, parent: Box<dyn TypeResolver>) -> Box<dyn TypeResolver> {
        Box::new(PointTypeResolver::new(parent))
    }
}

// Auto-register this module via inventory
inventory::submit! {
    &PointModule::INSTANCE as &'static dyn DialectModule
}
