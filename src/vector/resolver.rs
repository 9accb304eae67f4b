use tracing::trace;

use super::syntax::{VectorChordExtensionExpr, VectorChordTypeName};
use super::types::VectorChordSqlType;
use crate::error::{Error, Result};
use crate::parser::ast::{Expr, ExtensionNode, FunctionCall, TypeName};
use crate::resolver::{ResolveContext, TypeResolver};
use crate::types::{DialectType, IntermediateType, PostgreSqlType, PrimitiveType};

const BOOLEAN_BINARY_TYPES: &[&dyn DialectType] =
    &[&VectorChordSqlType::Vector, &VectorChordSqlType::Bit];

const FUNCTION_SIGNATURES: &[(&str, &dyn DialectType)] = &[
    ("avg", &VectorChordSqlType::Vector),
    ("binary_quantize", &VectorChordSqlType::Bit),
    ("cosine_distance", &PrimitiveType::Real),
    ("inner_product", &PrimitiveType::Real),
    ("l1_distance", &PrimitiveType::Real),
    ("l2_distance", &PrimitiveType::Real),
    ("l2_normalize", &VectorChordSqlType::Vector),
    ("subvector", &VectorChordSqlType::Vector),
    ("sum", &VectorChordSqlType::Vector),
    ("vector_dims", &PostgreSqlType::Integer),
    ("vector_norm", &PrimitiveType::Real),
];

// Functions whose arguments are not all of one type. The others take
// their bind argument types from sibling arguments.
const ARGUMENT_TYPES: &[(&str, &[&dyn DialectType])] = &[
    (
        "subvector",
        &[
            &VectorChordSqlType::Vector,
            &PostgreSqlType::Integer,
            &PostgreSqlType::Integer,
        ],
    ),
    ("vector_dims", &[&VectorChordSqlType::Vector]),
    ("vector_norm", &[&VectorChordSqlType::Vector]),
];

/// Result type of a VectorChord function, matched case-insensitively
pub fn function_signature(name: &str) -> Option<IntermediateType> {
    FUNCTION_SIGNATURES
        .iter()
        .find(|(function, _)| function.eq_ignore_ascii_case(name))
        .map(|(_, ty)| IntermediateType::new(*ty))
}

pub fn argument_types(name: &str) -> Option<Vec<IntermediateType>> {
    ARGUMENT_TYPES
        .iter()
        .find(|(function, _)| function.eq_ignore_ascii_case(name))
        .map(|(_, types)| types.iter().map(|ty| IntermediateType::new(*ty)).collect())
}

/// Decorates a parent resolver with the VectorChord types, distance
/// operators and functions. Anything else is the parent's answer.
pub struct VectorChordTypeResolver {
    parent: Box<dyn TypeResolver>,
}

impl VectorChordTypeResolver {
    pub fn new(parent: Box<dyn TypeResolver>) -> Self {
        VectorChordTypeResolver { parent }
    }

    fn distance_type(expr: &VectorChordExtensionExpr) -> Result<IntermediateType> {
        match &expr.distance_operator_expression {
            Some(_) => Ok(IntermediateType::new(&PrimitiveType::Real)),
            None => Err(Error::InvariantViolation {
                construct: "vectorchord extension expression".to_string(),
                message: "must be a distance operator expression".to_string(),
            }),
        }
    }
}

impl TypeResolver for VectorChordTypeResolver {
    fn boolean_binary_candidate_types(&self) -> Vec<&'static dyn DialectType> {
        BOOLEAN_BINARY_TYPES
            .iter()
            .copied()
            .chain(self.parent.boolean_binary_candidate_types())
            .collect()
    }

    fn definition_type(&self, type_name: &TypeName) -> Result<IntermediateType> {
        if let TypeName::Extension(node) = type_name
            && let Some(vector) = node.downcast_ref::<VectorChordTypeName>()
        {
            let ty: &'static dyn DialectType = if vector.is_bit() {
                &VectorChordSqlType::Bit
            } else {
                &VectorChordSqlType::Vector
            };
            return Ok(IntermediateType::new(ty));
        }
        self.parent.definition_type(type_name)
    }

    fn resolved_type(&self, expr: &Expr, cx: &ResolveContext<'_>) -> Result<IntermediateType> {
        if let Expr::Extension(node) = expr
            && let Some(vector) = node.downcast_ref::<VectorChordExtensionExpr>()
        {
            trace!(construct = %vector.describe(), "resolving distance expression");
            return Self::distance_type(vector);
        }
        self.parent.resolved_type(expr, cx)
    }

    fn function_type(
        &self,
        call: &FunctionCall,
        cx: &ResolveContext<'_>,
    ) -> Result<Option<IntermediateType>> {
        match function_signature(&call.name) {
            Some(ty) => Ok(Some(ty)),
            None => self.parent.function_type(call, cx),
        }
    }

    fn function_argument_types(&self, call: &FunctionCall) -> Option<Vec<IntermediateType>> {
        argument_types(&call.name).or_else(|| self.parent.function_argument_types(call))
    }
}
