//! VectorChord / pgvector dialect module
//!
//! Adds `vector(n)` and `bit(n)` column types, the six distance operators
//! (`<->`, `<#>`, `<=>`, `<+>`, `<~>`, `<%>`), the `vchordrq` and `vchordg`
//! index methods with their `options` storage parameter, and the vector
//! function table.

pub mod resolver;
pub mod syntax;
pub mod types;

use crate::extensions::DialectModule;
use crate::grammar::{ExtensionPoint, Grammar};
use crate::resolver::TypeResolver;

pub use resolver::{VectorChordTypeResolver, function_signature};
pub use syntax::{DistanceOperator, VectorChordExtensionExpr, VectorChordTypeName};
pub use types::VectorChordSqlType;

#[derive(Debug, Default)]
pub struct VectorChordModule;

impl VectorChordModule {
    pub const NAME: &'static str = "vectorchord";

    /// Const singleton instance for inventory registration
    pub const INSTANCE: Self = VectorChordModule;
}

impl DialectModule for VectorChordModule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn setup(&self, grammar: &mut Grammar) {
        grammar.install(ExtensionPoint::TypeName, Self::NAME, syntax::type_name);
        grammar.install(ExtensionPoint::ExtensionExpr, Self::NAME, syntax::extension_expr);
        grammar.install(ExtensionPoint::IndexMethod, Self::NAME, syntax::index_method);
        grammar.install(ExtensionPoint::StorageParameter, Self::NAME, syntax::storage_parameter);
        grammar.install(ExtensionPoint::StorageParameters, Self::NAME, syntax::storage_parameters);
    }

    fn type_resolver(&self, parent: Box<dyn TypeResolver>) -> Box<dyn TypeResolver> {
        Box::new(VectorChordTypeResolver::new(parent))
    }
}

#[cfg(feature = "extensions")]
inventory::submit! {
    &VectorChordModule::INSTANCE as &'static dyn DialectModule
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_overrides_every_point() {
        let mut grammar = Grammar::new();
        VectorChordModule.setup(&mut grammar);
        for point in ExtensionPoint::ALL {
            assert!(grammar.is_overridden(point), "{} not overridden", point);
        }
        assert_eq!(grammar.layers(), ["vectorchord"]);
    }

    #[test]
    fn test_setup_twice_stacks_rules() {
        let mut grammar = Grammar::new();
        VectorChordModule.setup(&mut grammar);
        VectorChordModule.setup(&mut grammar);
        assert_eq!(grammar.rules(ExtensionPoint::TypeName).count(), 2);
        assert_eq!(grammar.layers().len(), 1);
    }
}
