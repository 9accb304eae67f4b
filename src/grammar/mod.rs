//! Grammar extension registry
//!
//! The base grammar exposes a fixed set of extension points. Each point owns
//! a chain of rules contributed by grammar layers: the newest rule is tried
//! first, a no-match falls through to the rule installed before it, and the
//! base production is always tried last. Every layer therefore sees
//! everything installed before it as its fallback.

pub mod global;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::parser::Parser;
use crate::parser::ast::{Expr, IndexMethod, StorageParameter, TypeName};

/// A named production of the base grammar that layers may override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtensionPoint {
    TypeName,
    ExtensionExpr,
    IndexMethod,
    StorageParameter,
    StorageParameters,
}

impl ExtensionPoint {
    pub const ALL: [ExtensionPoint; 5] = [
        ExtensionPoint::TypeName,
        ExtensionPoint::ExtensionExpr,
        ExtensionPoint::IndexMethod,
        ExtensionPoint::StorageParameter,
        ExtensionPoint::StorageParameters,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionPoint::TypeName => "type_name",
            ExtensionPoint::ExtensionExpr => "extension_expr",
            ExtensionPoint::IndexMethod => "index_method",
            ExtensionPoint::StorageParameter => "storage_parameter",
            ExtensionPoint::StorageParameters => "storage_parameters",
        }
    }
}

impl fmt::Display for ExtensionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a rule yields when it matches
#[derive(Debug, Clone)]
pub enum Production {
    TypeName(TypeName),
    Expr(Expr),
    IndexMethod(IndexMethod),
    StorageParameter(StorageParameter),
    StorageParameters(Vec<StorageParameter>),
}

impl Production {
    /// The extension point this production can satisfy
    pub fn point(&self) -> ExtensionPoint {
        match self {
            Production::TypeName(_) => ExtensionPoint::TypeName,
            Production::Expr(_) => ExtensionPoint::ExtensionExpr,
            Production::IndexMethod(_) => ExtensionPoint::IndexMethod,
            Production::StorageParameter(_) => ExtensionPoint::StorageParameter,
            Production::StorageParameters(_) => ExtensionPoint::StorageParameters,
        }
    }

    pub fn into_type_name(self) -> Option<TypeName> {
        match self {
            Production::TypeName(type_name) => Some(type_name),
            _ => None,
        }
    }

    pub fn into_expr(self) -> Option<Expr> {
        match self {
            Production::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn into_index_method(self) -> Option<IndexMethod> {
        match self {
            Production::IndexMethod(method) => Some(method),
            _ => None,
        }
    }

    pub fn into_storage_parameter(self) -> Option<StorageParameter> {
        match self {
            Production::StorageParameter(parameter) => Some(parameter),
            _ => None,
        }
    }

    pub fn into_storage_parameters(self) -> Option<Vec<StorageParameter>> {
        match self {
            Production::StorageParameters(parameters) => Some(parameters),
            _ => None,
        }
    }
}

/// A parse function: `None` means no match, and the caller rewinds.
pub type ParseFn = Arc<dyn Fn(&mut Parser<'_>) -> Option<Production> + Send + Sync>;

/// One layer's override of one extension point
#[derive(Clone)]
pub struct Rule {
    layer: String,
    parse: ParseFn,
}

impl Rule {
    pub fn layer(&self) -> &str {
        &self.layer
    }

    pub fn parse(&self, parser: &mut Parser<'_>) -> Option<Production> {
        (self.parse)(parser)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("layer", &self.layer).finish()
    }
}

/// Grammar context: the rule chains installed over the base grammar.
///
/// Built once during setup and passed to every parse. Cloning is cheap, so a
/// compilation unit can take its own snapshot.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    chains: HashMap<ExtensionPoint, Vec<Rule>>,
    layers: Vec<String>,
}

impl Grammar {
    /// The unmodified base grammar
    pub fn new() -> Self {
        Grammar::default()
    }

    /// Install `parse` as the newest rule for `point`.
    ///
    /// Whatever was installed before stays reachable as fallback. Installing
    /// the same layer twice stacks a second copy on top.
    pub fn install<F>(&mut self, point: ExtensionPoint, layer: &str, parse: F)
    where
        F: Fn(&mut Parser<'_>) -> Option<Production> + Send + Sync + 'static,
    {
        self.install_rule(
            point,
            Rule {
                layer: layer.to_string(),
                parse: Arc::new(parse),
            },
        );
    }

    pub fn install_rule(&mut self, point: ExtensionPoint, rule: Rule) {
        debug!(point = %point, layer = %rule.layer, "installing grammar rule");
        if !self.layers.iter().any(|name| name == &rule.layer) {
            self.layers.push(rule.layer.clone());
        }
        self.chains.entry(point).or_default().push(rule);
    }

    /// Drop every installed rule; the grammar behaves as the base grammar.
    pub fn reset(&mut self) {
        debug!(layers = ?self.layers, "resetting grammar");
        self.chains.clear();
        self.layers.clear();
    }

    /// Rules for `point`, newest first
    pub fn rules(&self, point: ExtensionPoint) -> impl Iterator<Item = &Rule> {
        self.chains
            .get(&point)
            .into_iter()
            .flat_map(|rules| rules.iter().rev())
    }

    pub fn is_overridden(&self, point: ExtensionPoint) -> bool {
        self.chains.get(&point).is_some_and(|rules| !rules.is_empty())
    }

    /// Layer names in installation order
    pub fn layers(&self) -> &[String] {
        &self.layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::StorageValue;

    fn method_rule(name: &'static str) -> impl Fn(&mut Parser<'_>) -> Option<Production> + Send + Sync {
        move |p: &mut Parser<'_>| {
            if p.parse_keyword(name) {
                Some(Production::IndexMethod(IndexMethod::new(name)))
            } else {
                None
            }
        }
    }

    fn parse_method(grammar: &Grammar, sql: &str) -> Option<IndexMethod> {
        let tokens = crate::parser::lexer::tokenize(sql).unwrap();
        let mut parser = Parser::new(&tokens, grammar);
        parser.index_method()
    }

    #[test]
    fn test_rules_newest_first() {
        let mut grammar = Grammar::new();
        grammar.install(ExtensionPoint::IndexMethod, "first", method_rule("one"));
        grammar.install(ExtensionPoint::IndexMethod, "second", method_rule("two"));

        let layers: Vec<_> = grammar
            .rules(ExtensionPoint::IndexMethod)
            .map(|rule| rule.layer().to_string())
            .collect();
        assert_eq!(layers, vec!["second", "first"]);
        assert_eq!(grammar.layers(), ["first", "second"]);
    }

    #[test]
    fn test_earlier_layer_still_matches() {
        let mut grammar = Grammar::new();
        grammar.install(ExtensionPoint::IndexMethod, "first", method_rule("one"));
        grammar.install(ExtensionPoint::IndexMethod, "second", method_rule("two"));

        assert_eq!(parse_method(&grammar, "one"), Some(IndexMethod::new("one")));
        assert_eq!(parse_method(&grammar, "two"), Some(IndexMethod::new("two")));
        // base production is the last resort
        assert_eq!(parse_method(&grammar, "btree"), Some(IndexMethod::new("btree")));
        assert_eq!(parse_method(&grammar, "three"), None);
    }

    #[test]
    fn test_newest_layer_wins() {
        let mut grammar = Grammar::new();
        grammar.install(ExtensionPoint::StorageParameter, "first", |p: &mut Parser<'_>| {
            p.parse_keyword("lists").then(|| {
                Production::StorageParameter(StorageParameter {
                    name: "first".to_string(),
                    value: None,
                })
            })
        });
        grammar.install(ExtensionPoint::StorageParameter, "second", |p: &mut Parser<'_>| {
            p.parse_keyword("lists").then(|| {
                Production::StorageParameter(StorageParameter {
                    name: "second".to_string(),
                    value: Some(StorageValue::Word("lists".to_string())),
                })
            })
        });

        let tokens = crate::parser::lexer::tokenize("lists").unwrap();
        let mut parser = Parser::new(&tokens, &grammar);
        let parameter = parser.storage_parameter().unwrap();
        assert_eq!(parameter.name, "second");
    }

    #[test]
    fn test_wrong_production_is_skipped() {
        let mut grammar = Grammar::new();
        grammar.install(ExtensionPoint::IndexMethod, "first", method_rule("one"));
        grammar.install(ExtensionPoint::IndexMethod, "confused", |_: &mut Parser<'_>| {
            Some(Production::Expr(Expr::column("x")))
        });

        assert_eq!(parse_method(&grammar, "one"), Some(IndexMethod::new("one")));
    }

    #[test]
    fn test_reset_restores_base() {
        let mut grammar = Grammar::new();
        grammar.install(ExtensionPoint::IndexMethod, "first", method_rule("one"));
        assert!(grammar.is_overridden(ExtensionPoint::IndexMethod));

        grammar.reset();
        assert!(!grammar.is_overridden(ExtensionPoint::IndexMethod));
        assert!(grammar.layers().is_empty());
        assert_eq!(parse_method(&grammar, "one"), None);
        assert_eq!(parse_method(&grammar, "hash"), Some(IndexMethod::new("hash")));
    }

    #[test]
    fn test_no_match_rewinds() {
        let mut grammar = Grammar::new();
        // consumes a token and then gives up
        grammar.install(ExtensionPoint::IndexMethod, "greedy", |p: &mut Parser<'_>| {
            p.next_token();
            None
        });

        let tokens = crate::parser::lexer::tokenize("gin").unwrap();
        let mut parser = Parser::new(&tokens, &grammar);
        assert_eq!(parser.index_method(), Some(IndexMethod::new("gin")));
        assert!(parser.is_exhausted());
    }
}
