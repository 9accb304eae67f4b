//! Dialect modules
//!
//! A dialect module is one grammar layer plus one resolver decorator. The
//! order modules are applied in is the layer order: later modules install
//! their rules on top of earlier ones and wrap their resolvers.

pub mod loader;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::grammar::Grammar;
use crate::resolver::{PostgreSqlTypeResolver, TypeResolver};

pub trait DialectModule: Send + Sync {
    /// Module name (e.g. "vectorchord", "point")
    fn name(&self) -> &'static str;

    /// Install this module's grammar rules
    fn setup(&self, grammar: &mut Grammar);

    /// Wrap `parent` with this module's resolver
    fn type_resolver(&self, parent: Box<dyn TypeResolver>) -> Box<dyn TypeResolver>;
}

/// Every module linked into the binary, in name order
pub fn available_modules() -> Vec<&'static dyn DialectModule> {
    #[cfg(feature = "extensions")]
    let modules = loader::registered_modules();
    #[cfg(not(feature = "extensions"))]
    let modules: Vec<&'static dyn DialectModule> = vec![&crate::vector::VectorChordModule::INSTANCE];
    modules
}

/// Resolve module names to modules, keeping the given order.
///
/// `None` selects every available module.
pub fn select_modules(enabled: Option<&[String]>) -> Result<Vec<&'static dyn DialectModule>> {
    let available = available_modules();
    let Some(enabled) = enabled else {
        return Ok(available);
    };

    let mut selected: Vec<&'static dyn DialectModule> = Vec::with_capacity(enabled.len());
    for name in enabled {
        let module = available
            .iter()
            .find(|module| module.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::UnknownModule(name.clone()))?;
        if selected.iter().any(|m| m.name() == module.name()) {
            debug!("Skipping duplicate module: {}", module.name());
            continue;
        }
        selected.push(*module);
    }
    Ok(selected)
}

/// Install every module's rules into `grammar`, first module lowest
pub fn install_modules(grammar: &mut Grammar, modules: &[&dyn DialectModule]) {
    for module in modules {
        info!("Installing dialect module: {}", module.name());
        module.setup(grammar);
    }
}

/// Decorate the base PostgreSQL resolver with every module, last module
/// outermost
pub fn resolver_chain(modules: &[&dyn DialectModule]) -> Box<dyn TypeResolver> {
    modules.iter().fold(
        Box::new(PostgreSqlTypeResolver) as Box<dyn TypeResolver>,
        |parent, module| module.type_resolver(parent),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectorchord_is_available() {
        assert!(available_modules().iter().any(|m| m.name() == "vectorchord"));
    }

    #[test]
    fn test_select_unknown_module() {
        let enabled = vec!["postgis".to_string()];
        assert!(matches!(
            select_modules(Some(&enabled)),
            Err(Error::UnknownModule(name)) if name == "postgis"
        ));
    }

    #[test]
    fn test_select_deduplicates() {
        let enabled = vec!["vectorchord".to_string(), "VectorChord".to_string()];
        let modules = select_modules(Some(&enabled)).unwrap();
        assert_eq!(modules.len(), 1);
    }
}
