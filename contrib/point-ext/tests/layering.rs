use point_ext::{PointExpr, PointModule, PointSqlType};
use vchord_dialect::compiler::Compiler;
use vchord_dialect::extensions;
use vchord_dialect::parser::ast::{Expr, SelectItem, Statement};
use vchord_dialect::parser::parse;
use vchord_dialect::types::IntermediateType;
use vchord_dialect::vector::{VectorChordExtensionExpr, VectorChordModule, VectorChordSqlType};
use vchord_dialect::{Error, Grammar};

const SCHEMA: &str = "
    CREATE TABLE places (
        id INT PRIMARY KEY,
        location POINT NOT NULL,
        embedding VECTOR(3) NOT NULL
    );
";

fn layered() -> Compiler {
    Compiler::new(&[&PointModule, &VectorChordModule])
}

fn projection(grammar: &Grammar, sql: &str) -> Expr {
    let mut statements = parse(sql, grammar).unwrap();
    let Statement::Select(select) = statements.remove(0).statement else {
        panic!("expected SELECT");
    };
    match select.projection.into_iter().next() {
        Some(SelectItem::Expr { expr, .. }) => expr,
        other => panic!("expected expression, got {:?}", other),
    }
}

#[test]
fn test_earlier_layer_still_parses() {
    let compiler = layered();
    let expr = projection(compiler.grammar(), "SELECT location ~= ? FROM places;");
    let Expr::Extension(node) = expr else {
        panic!("expected extension expression");
    };
    assert!(node.is::<PointExpr>());
}

#[test]
fn test_newest_layer_wins_shared_syntax() {
    let compiler = layered();
    let expr = projection(compiler.grammar(), "SELECT embedding <-> ? FROM places;");
    let Expr::Extension(node) = expr else {
        panic!("expected extension expression");
    };
    assert!(node.is::<VectorChordExtensionExpr>());
}

#[test]
fn test_both_layers_resolve() {
    let unit = layered()
        .compile(&format!(
            "{}
            nearby: SELECT id, location <-> :origin AS meters, location ~= :origin AS same,
                   embedding <=> :query AS score, magnitude(location) AS m
            FROM places
            ORDER BY embedding <=> :query
            LIMIT 10;",
            SCHEMA
        ))
        .unwrap();

    let places = unit.table("places").unwrap();
    assert_eq!(places.columns[1].ty, IntermediateType::new(&PointSqlType::Point));
    assert_eq!(places.columns[2].ty, IntermediateType::new(&VectorChordSqlType::Vector));

    let query = unit.query("nearby").unwrap();
    let types: Vec<String> = query.columns.iter().map(|c| c.ty.to_string()).collect();
    assert_eq!(types, ["int", "real", "boolean", "real", "real"]);

    let arguments: Vec<(&str, String)> = query
        .arguments
        .iter()
        .map(|a| (a.label.as_str(), a.ty.to_string()))
        .collect();
    assert_eq!(
        arguments,
        [
            (":origin", "point".to_string()),
            (":origin", "point".to_string()),
            (":query", "vector".to_string()),
            (":query", "vector".to_string()),
        ]
    );
}

#[test]
fn test_candidates_follow_layer_order() {
    let modules: [&dyn vchord_dialect::DialectModule; 2] = [&PointModule, &VectorChordModule];
    let resolver = extensions::resolver_chain(&modules);
    let names: Vec<&str> = resolver
        .boolean_binary_candidate_types()
        .iter()
        .take(3)
        .map(|ty| ty.name())
        .collect();
    assert_eq!(names, ["vector", "bit", "point"]);
}

#[test]
fn test_point_syntax_needs_point_layer() {
    let err = Compiler::new(&[&VectorChordModule])
        .compile("SELECT 1 ~= 2;")
        .unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}

#[test]
fn test_point_module_is_discovered() {
    let names: Vec<&str> = extensions::available_modules()
        .iter()
        .map(|m| m.name())
        .collect();
    assert_eq!(names, ["point", "vectorchord"]);
}
