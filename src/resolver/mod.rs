//! Type resolution
//!
//! A resolver chain is built by wrapping: each dialect module decorates the
//! resolver it is given and defers whatever it does not recognize. Recursive
//! questions (the type of an operand, of a cast target, of a nested call) go
//! back through [`ResolveContext::root`], so the outermost decorator sees
//! them even when the question is asked deep inside a parent resolver.

pub mod postgres;

use crate::error::{Error, Result};
use crate::parser::ast::{Expr, FunctionCall, TypeName};
use crate::types::{DialectType, IntermediateType, same_type};

pub use postgres::PostgreSqlTypeResolver;

pub trait TypeResolver: Send + Sync {
    /// Types a boolean binary comparison accepts as operands, in priority order
    fn boolean_binary_candidate_types(&self) -> Vec<&'static dyn DialectType>;

    /// Type of a declared column
    fn definition_type(&self, type_name: &TypeName) -> Result<IntermediateType>;

    /// Type of an expression
    fn resolved_type(&self, expr: &Expr, cx: &ResolveContext<'_>) -> Result<IntermediateType>;

    /// Result type of a function call, `None` when no resolver knows it
    fn function_type(
        &self,
        call: &FunctionCall,
        cx: &ResolveContext<'_>,
    ) -> Result<Option<IntermediateType>>;

    /// Positional argument types of a function call, used to type bind
    /// arguments. `None` leaves each argument to its siblings.
    fn function_argument_types(&self, call: &FunctionCall) -> Option<Vec<IntermediateType>>;
}

/// A named relation visible to column references
#[derive(Debug, Clone)]
pub struct Relation {
    pub name: String,
    pub alias: Option<String>,
    pub columns: Vec<(String, IntermediateType)>,
}

impl Relation {
    fn answers_to(&self, qualifier: &str) -> bool {
        self.alias.as_deref() == Some(qualifier) || self.name == qualifier
    }
}

/// Columns visible to an expression
#[derive(Debug, Clone, Default)]
pub struct Scope {
    relations: Vec<Relation>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn lookup(&self, qualifier: Option<&str>, name: &str) -> Result<IntermediateType> {
        self.relations
            .iter()
            .filter(|relation| qualifier.is_none_or(|q| relation.answers_to(q)))
            .flat_map(|relation| relation.columns.iter())
            .find(|(column, _)| column == name)
            .map(|(_, ty)| ty.clone())
            .ok_or_else(|| match qualifier {
                Some(q) => Error::UnknownColumn(format!("{}.{}", q, name)),
                None => Error::UnknownColumn(name.to_string()),
            })
    }
}

/// What every resolver call can see: the full chain and the column scope
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    pub root: &'a dyn TypeResolver,
    pub scope: &'a Scope,
}

impl<'a> ResolveContext<'a> {
    pub fn new(root: &'a dyn TypeResolver, scope: &'a Scope) -> Self {
        ResolveContext { root, scope }
    }

    /// Resolve `expr` through the outermost resolver
    pub fn resolve(&self, expr: &Expr) -> Result<IntermediateType> {
        self.root.resolved_type(expr, self)
    }

    pub fn definition_type(&self, type_name: &TypeName) -> Result<IntermediateType> {
        self.root.definition_type(type_name)
    }

    pub fn function_type(&self, call: &FunctionCall) -> Result<Option<IntermediateType>> {
        self.root.function_type(call, self)
    }

    pub fn boolean_binary_candidate_types(&self) -> Vec<&'static dyn DialectType> {
        self.root.boolean_binary_candidate_types()
    }

    pub fn function_argument_types(&self, call: &FunctionCall) -> Option<Vec<IntermediateType>> {
        self.root.function_argument_types(call)
    }
}

/// The first candidate, in priority order, that any operand resolves to.
/// Placeholders (`NULL`, bind arguments) never decide; the result is
/// nullable when any operand is.
pub fn encapsulating_type(
    types: &[IntermediateType],
    candidates: &[&'static dyn DialectType],
) -> Option<IntermediateType> {
    let nullable = types.iter().any(|ty| ty.nullable);
    let found = candidates.iter().find(|candidate| {
        types
            .iter()
            .filter(|ty| !ty.is_placeholder())
            .any(|ty| same_type(ty.dialect_type, **candidate))
    })?;
    let ty = IntermediateType::new(*found);
    Some(if nullable { ty.as_nullable() } else { ty })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PostgreSqlType, PrimitiveType};

    const NUMERIC: &[&dyn DialectType] = &[
        &PrimitiveType::Real,
        &PostgreSqlType::BigInt,
        &PostgreSqlType::Integer,
    ];

    #[test]
    fn test_encapsulating_type_follows_priority() {
        let types = [
            IntermediateType::new(&PostgreSqlType::Integer),
            IntermediateType::new(&PrimitiveType::Real).as_nullable(),
        ];
        let ty = encapsulating_type(&types, NUMERIC).unwrap();
        assert!(ty.is(&PrimitiveType::Real));
        assert!(ty.nullable);
    }

    #[test]
    fn test_encapsulating_type_skips_placeholders() {
        let types = [
            IntermediateType::new(&PrimitiveType::Argument),
            IntermediateType::new(&PostgreSqlType::BigInt),
        ];
        let ty = encapsulating_type(&types, NUMERIC).unwrap();
        assert_eq!(ty, IntermediateType::new(&PostgreSqlType::BigInt));

        let text = [IntermediateType::new(&PrimitiveType::Text)];
        assert!(encapsulating_type(&text, NUMERIC).is_none());
    }

    #[test]
    fn test_scope_lookup_by_alias_and_name() {
        let scope = Scope::new().with_relation(Relation {
            name: "items".to_string(),
            alias: Some("i".to_string()),
            columns: vec![("id".to_string(), IntermediateType::new(&PostgreSqlType::BigInt))],
        });
        assert!(scope.lookup(None, "id").is_ok());
        assert!(scope.lookup(Some("i"), "id").is_ok());
        assert!(scope.lookup(Some("items"), "id").is_ok());
        assert!(matches!(
            scope.lookup(Some("other"), "id"),
            Err(Error::UnknownColumn(name)) if name == "other.id"
        ));
    }
}
