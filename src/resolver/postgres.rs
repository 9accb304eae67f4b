use tracing::trace;

use super::{ResolveContext, TypeResolver, encapsulating_type};
use crate::error::{Error, Result};
use crate::parser::ast::{BinaryOp, Expr, FunctionCall, Literal, TypeName, UnaryOp};
use crate::types::{DialectType, IntermediateType, PostgreSqlType, PrimitiveType};

const BOOLEAN_BINARY_TYPES: &[&dyn DialectType] = &[
    &PostgreSqlType::SmallInt,
    &PostgreSqlType::Integer,
    &PostgreSqlType::BigInt,
    &PrimitiveType::Integer,
    &PrimitiveType::Real,
    &PostgreSqlType::Numeric,
    &PrimitiveType::Text,
    &PrimitiveType::Boolean,
    &PrimitiveType::Blob,
    &PostgreSqlType::Date,
    &PostgreSqlType::Time,
    &PostgreSqlType::Timestamp,
    &PostgreSqlType::TimestampTimezone,
    &PostgreSqlType::Interval,
    &PostgreSqlType::Uuid,
    &PostgreSqlType::Jsonb,
];

// Widest first
const NUMERIC_TYPES: &[&dyn DialectType] = &[
    &PrimitiveType::Real,
    &PostgreSqlType::Numeric,
    &PrimitiveType::Integer,
    &PostgreSqlType::BigInt,
    &PostgreSqlType::Integer,
    &PostgreSqlType::SmallInt,
];

/// Default resolver for the base PostgreSQL grammar; the innermost link of
/// every resolver chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgreSqlTypeResolver;

impl PostgreSqlTypeResolver {
    fn named_type(name: &str) -> Option<&'static dyn DialectType> {
        let ty: &'static dyn DialectType = match name {
            "smallint" | "int2" | "smallserial" => &PostgreSqlType::SmallInt,
            "integer" | "int" | "int4" | "serial" => &PostgreSqlType::Integer,
            "bigint" | "int8" | "bigserial" => &PostgreSqlType::BigInt,
            "real" | "float4" | "float8" | "float" | "double precision" => &PrimitiveType::Real,
            "numeric" | "decimal" => &PostgreSqlType::Numeric,
            "text" | "varchar" | "character varying" | "char" | "character" | "name"
            | "citext" => &PrimitiveType::Text,
            "bytea" => &PrimitiveType::Blob,
            "boolean" | "bool" => &PrimitiveType::Boolean,
            "date" => &PostgreSqlType::Date,
            "time" | "time without time zone" | "time with time zone" | "timetz" => {
                &PostgreSqlType::Time
            }
            "timestamp" | "timestamp without time zone" => &PostgreSqlType::Timestamp,
            "timestamptz" | "timestamp with time zone" => &PostgreSqlType::TimestampTimezone,
            "interval" => &PostgreSqlType::Interval,
            "uuid" => &PostgreSqlType::Uuid,
            "json" => &PostgreSqlType::Json,
            "jsonb" => &PostgreSqlType::Jsonb,
            _ => return None,
        };
        Some(ty)
    }

    fn literal_type(literal: &Literal) -> IntermediateType {
        match literal {
            Literal::Number(n) if n.contains(['.', 'e', 'E']) => {
                IntermediateType::new(&PrimitiveType::Real)
            }
            Literal::Number(_) => IntermediateType::new(&PrimitiveType::Integer),
            Literal::String(_) => IntermediateType::new(&PrimitiveType::Text),
            Literal::Boolean(_) => IntermediateType::new(&PrimitiveType::Boolean),
            Literal::Null => IntermediateType::new(&PrimitiveType::Null).as_nullable(),
        }
    }

    fn binary_type(
        left: &Expr,
        op: BinaryOp,
        right: &Expr,
        cx: &ResolveContext<'_>,
    ) -> Result<IntermediateType> {
        let left = cx.resolve(left)?;
        let right = cx.resolve(right)?;
        let nullable = left.nullable || right.nullable;
        let incompatible = || Error::IncompatibleTypes {
            left: left.to_string(),
            right: right.to_string(),
        };

        let ty = if op.is_logical() {
            IntermediateType::new(&PrimitiveType::Boolean)
        } else if op.is_comparison() {
            let candidates = cx.boolean_binary_candidate_types();
            let comparable = [&left, &right].into_iter().all(|ty| {
                ty.is_placeholder() || candidates.iter().any(|candidate| ty.is(*candidate))
            });
            if !comparable {
                return Err(incompatible());
            }
            IntermediateType::new(&PrimitiveType::Boolean)
        } else if op == BinaryOp::Concat {
            IntermediateType::new(&PrimitiveType::Text)
        } else {
            let numeric = [&left, &right].into_iter().all(|ty| {
                ty.is_placeholder() || NUMERIC_TYPES.iter().any(|candidate| ty.is(*candidate))
            });
            if !numeric {
                return Err(incompatible());
            }
            encapsulating_type(&[left.clone(), right.clone()], NUMERIC_TYPES)
                .ok_or_else(incompatible)?
        };
        Ok(if nullable { ty.as_nullable() } else { ty.as_non_null() })
    }

    fn first_argument_type(call: &FunctionCall, cx: &ResolveContext<'_>) -> Result<IntermediateType> {
        let first = call
            .args
            .first()
            .ok_or_else(|| Error::UnknownFunction(format!("{}()", call.name)))?;
        cx.resolve(first)
    }
}

impl TypeResolver for PostgreSqlTypeResolver {
    fn boolean_binary_candidate_types(&self) -> Vec<&'static dyn DialectType> {
        BOOLEAN_BINARY_TYPES.to_vec()
    }

    fn definition_type(&self, type_name: &TypeName) -> Result<IntermediateType> {
        match type_name {
            TypeName::Named { name, .. } => Self::named_type(name)
                .map(IntermediateType::new)
                .ok_or_else(|| Error::UnknownType(name.clone())),
            TypeName::Extension(node) => Err(Error::UnresolvedExtension {
                layer: node.layer().to_string(),
                construct: node.describe(),
            }),
        }
    }

    fn resolved_type(&self, expr: &Expr, cx: &ResolveContext<'_>) -> Result<IntermediateType> {
        trace!(?expr, "resolving expression");
        match expr {
            Expr::Column { qualifier, name } => cx.scope.lookup(qualifier.as_deref(), name),
            Expr::Literal(literal) => Ok(Self::literal_type(literal)),
            Expr::BindArg(_) => Ok(IntermediateType::new(&PrimitiveType::Argument)),
            Expr::Unary { op: UnaryOp::Not, expr } => {
                let inner = cx.resolve(expr)?;
                let ty = IntermediateType::new(&PrimitiveType::Boolean);
                Ok(if inner.nullable { ty.as_nullable() } else { ty })
            }
            Expr::Unary { expr, .. } => cx.resolve(expr),
            Expr::Binary { left, op, right } => Self::binary_type(left, *op, right, cx),
            Expr::IsNull { expr, .. } => {
                cx.resolve(expr)?;
                Ok(IntermediateType::new(&PrimitiveType::Boolean))
            }
            Expr::Cast { expr, type_name } => {
                let inner = cx.resolve(expr)?;
                let ty = cx.definition_type(type_name)?;
                Ok(if inner.nullable { ty.as_nullable() } else { ty })
            }
            Expr::Function(call) => cx
                .function_type(call)?
                .ok_or_else(|| Error::UnknownFunction(call.name.clone())),
            Expr::Nested(inner) => cx.resolve(inner),
            Expr::Extension(node) => Err(Error::UnresolvedExtension {
                layer: node.layer().to_string(),
                construct: node.describe(),
            }),
        }
    }

    fn function_type(
        &self,
        call: &FunctionCall,
        cx: &ResolveContext<'_>,
    ) -> Result<Option<IntermediateType>> {
        let ty = match call.name.to_lowercase().as_str() {
            "count" => IntermediateType::new(&PostgreSqlType::BigInt),
            "lower" | "upper" | "trim" | "btrim" | "ltrim" | "rtrim" | "concat" | "replace"
            | "substring" | "substr" | "left" | "right" | "md5" => {
                IntermediateType::new(&PrimitiveType::Text)
            }
            "length" | "char_length" | "octet_length" => {
                IntermediateType::new(&PostgreSqlType::Integer)
            }
            "abs" | "ceil" | "floor" => Self::first_argument_type(call, cx)?,
            "max" | "min" | "sum" => Self::first_argument_type(call, cx)?.as_nullable(),
            "avg" => IntermediateType::new(&PrimitiveType::Real).as_nullable(),
            "random" => IntermediateType::new(&PrimitiveType::Real),
            "coalesce" => {
                let types = call
                    .args
                    .iter()
                    .map(|arg| cx.resolve(arg))
                    .collect::<Result<Vec<_>>>()?;
                let candidates = cx.boolean_binary_candidate_types();
                let ty = encapsulating_type(&types, &candidates)
                    .ok_or_else(|| Error::UnknownFunction(format!("{}()", call.name)))?;
                if types.iter().any(|ty| !ty.nullable) {
                    ty.as_non_null()
                } else {
                    ty
                }
            }
            "now" | "current_timestamp" => IntermediateType::new(&PostgreSqlType::TimestampTimezone),
            "gen_random_uuid" => IntermediateType::new(&PostgreSqlType::Uuid),
            _ => return Ok(None),
        };
        Ok(Some(ty))
    }

    fn function_argument_types(&self, call: &FunctionCall) -> Option<Vec<IntermediateType>> {
        let text = IntermediateType::new(&PrimitiveType::Text);
        let int = IntermediateType::new(&PostgreSqlType::Integer);
        match call.name.to_lowercase().as_str() {
            "substr" | "substring" => Some(vec![text, int.clone(), int]),
            "left" | "right" => Some(vec![text, int]),
            _ => None,
        }
    }
}
