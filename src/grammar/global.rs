//! Process-wide grammar registry
//!
//! For hosts with a fixed setup hook and no way to thread a [`Grammar`]
//! through. The state lives for the whole process, so the call order is
//! `reset` then `install` then `snapshot`, once per compilation, from a
//! single thread. Parsing always runs on a snapshot: installs made later do
//! not leak into a compilation that already started.

use std::sync::LazyLock;

use parking_lot::RwLock;

use super::{ExtensionPoint, Grammar, Production};
use crate::parser::Parser;

static GLOBAL: LazyLock<RwLock<Grammar>> = LazyLock::new(|| RwLock::new(Grammar::new()));

pub fn install<F>(point: ExtensionPoint, layer: &str, parse: F)
where
    F: Fn(&mut Parser<'_>) -> Option<Production> + Send + Sync + 'static,
{
    GLOBAL.write().install(point, layer, parse);
}

/// Run `setup` against the global grammar under a single write lock
pub fn configure(setup: impl FnOnce(&mut Grammar)) {
    let mut grammar = GLOBAL.write();
    setup(&mut *grammar);
}

pub fn reset() {
    GLOBAL.write().reset();
}

pub fn snapshot() -> Grammar {
    GLOBAL.read().clone()
}
