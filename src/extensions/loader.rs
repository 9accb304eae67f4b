#![cfg(feature = "extensions")]
//! Dialect module auto-discovery via inventory
//!
//! Modules self-register with `inventory::submit!`; linking the crate that
//! defines one is enough to make it available.

use super::DialectModule;

inventory::collect!(&'static dyn DialectModule);

/// Registered modules sorted by name, duplicates dropped
pub fn registered_modules() -> Vec<&'static dyn DialectModule> {
    let mut modules: Vec<&'static dyn DialectModule> = inventory::iter::<&'static dyn DialectModule>()
        .copied()
        .collect();
    modules.sort_by_key(|module| module.name());
    modules.dedup_by_key(|module| module.name());
    tracing::debug!(
        "Discovered dialect modules: {:?}",
        modules.iter().map(|m| m.name()).collect::<Vec<_>>()
    );
    modules
}
