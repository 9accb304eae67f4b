mod common;

use common::{SCHEMA, compile, query};
use vchord_dialect::compiler::Compiler;
use vchord_dialect::error::Error;
use vchord_dialect::types::{IntermediateType, PostgreSqlType, PrimitiveType};
use vchord_dialect::vector::{DistanceOperator, VectorChordModule, VectorChordSqlType};

fn real() -> IntermediateType {
    IntermediateType::new(&PrimitiveType::Real)
}

#[test]
fn test_vector_and_bit_columns() {
    let unit = compile("").unwrap();
    let items = unit.table("items").unwrap();
    assert_eq!(
        items.column("embedding").unwrap().ty,
        IntermediateType::new(&VectorChordSqlType::Vector)
    );
    assert_eq!(
        items.column("signature").unwrap().ty,
        IntermediateType::new(&VectorChordSqlType::Bit).as_nullable()
    );
}

#[test]
fn test_each_distance_operator_is_real() {
    for op in DistanceOperator::ALL {
        let column = match op {
            DistanceOperator::Hamming | DistanceOperator::Jaccard => "signature",
            _ => "embedding",
        };
        let sql = format!("nearest: SELECT {} {} ? AS d FROM items;", column, op.symbol());
        let unit = compile(&sql).unwrap();
        let nearest = query(&unit, "nearest");
        assert_eq!(nearest.columns[0].ty, real(), "operator {}", op);
        assert_eq!(nearest.columns[0].reader, "cursor.get_double(0)");
        assert_eq!(nearest.arguments[0].binder, "bind_string(0, arg0)");
    }
}

#[test]
fn test_knn_query() {
    let unit = compile(
        "knn: SELECT id, title, embedding <-> :query AS distance
         FROM items
         WHERE title <> ''
         ORDER BY embedding <-> :query
         LIMIT :k;",
    )
    .unwrap();
    let knn = query(&unit, "knn");

    let columns: Vec<(&str, String)> = knn
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.ty.to_string()))
        .collect();
    assert_eq!(
        columns,
        [
            ("id", "bigint".to_string()),
            ("title", "text".to_string()),
            ("distance", "real".to_string()),
        ]
    );

    let arguments: Vec<String> = knn.arguments.iter().map(|a| a.binder.clone()).collect();
    assert_eq!(
        arguments,
        ["bind_string(0, query)", "bind_string(1, query)", "bind_long(2, k)"]
    );
}

#[test]
fn test_distance_threshold() {
    let unit = compile("SELECT id FROM items WHERE embedding <=> ? < 0.5;").unwrap();
    let argument = &unit.queries[0].arguments[0];
    assert!(argument.ty.is(&VectorChordSqlType::Vector));
}

#[test]
fn test_bind_arguments_next_to_operators() {
    let unit = compile(
        "byId: SELECT id FROM items WHERE id=?;
         knn: SELECT id FROM items ORDER BY embedding<->? LIMIT ?;
         near: SELECT id FROM items WHERE embedding <=> ?<0.5;",
    )
    .unwrap();
    assert!(query(&unit, "byId").arguments[0].ty.is(&PostgreSqlType::BigInt));

    let knn = query(&unit, "knn");
    let binders: Vec<&str> = knn.arguments.iter().map(|a| a.binder.as_str()).collect();
    assert_eq!(binders, ["bind_string(0, arg0)", "bind_long(1, arg1)"]);

    assert!(query(&unit, "near").arguments[0].ty.is(&VectorChordSqlType::Vector));
}

#[test]
fn test_subvector_arguments() {
    let unit = compile("SELECT subvector(embedding, ?, ?) AS head FROM items;").unwrap();
    let head = &unit.queries[0];
    assert!(head.columns[0].ty.is(&VectorChordSqlType::Vector));
    let binders: Vec<&str> = head.arguments.iter().map(|a| a.binder.as_str()).collect();
    assert_eq!(binders, ["bind_int(0, arg0)", "bind_int(1, arg1)"]);
}

#[test]
fn test_deeply_nested_select() {
    let depth = 40;
    let sql = format!(
        "SELECT {}embedding <=> ?{} AS d FROM items;",
        "(".repeat(depth),
        ")".repeat(depth)
    );
    let unit = compile(&sql).unwrap();
    assert_eq!(unit.queries[0].columns[0].ty, real());
}

#[test]
fn test_vector_functions() {
    let unit = compile(
        "stats: SELECT vector_dims(embedding) AS dims, VECTOR_NORM(embedding) AS norm,
                COSINE_DISTANCE(embedding, ?) AS cos, cosine_distance(embedding, ?) AS cos2,
                binary_quantize(embedding) AS bits, avg(embedding) AS centroid
         FROM items;",
    )
    .unwrap();
    let stats = query(&unit, "stats");
    let types: Vec<String> = stats.columns.iter().map(|c| c.ty.to_string()).collect();
    assert_eq!(types, ["int", "real", "real", "real", "bit", "vector"]);
    assert!(stats.columns[0].ty.is(&PostgreSqlType::Integer));
    assert!(stats.arguments.iter().all(|a| a.ty.is(&VectorChordSqlType::Vector)));
}

#[test]
fn test_unknown_function_defers_to_base() {
    let unit = compile("SELECT count(*) AS n, lower(title) AS t FROM items;").unwrap();
    let types: Vec<String> = unit.queries[0].columns.iter().map(|c| c.ty.to_string()).collect();
    assert_eq!(types, ["bigint", "text"]);

    let err = compile("SELECT no_such_function(embedding) FROM items;").unwrap_err();
    assert!(matches!(err, Error::UnknownFunction(name) if name == "no_such_function"));
}

#[test]
fn test_vector_comparison_uses_candidates() {
    assert!(compile("SELECT id FROM items WHERE embedding = ?;").is_ok());
    let err = Compiler::new(&[&VectorChordModule])
        .compile("CREATE TABLE docs (body JSON); SELECT body FROM docs WHERE body = body;")
        .unwrap_err();
    assert!(matches!(err, Error::IncompatibleTypes { .. }));
}

#[test]
fn test_vector_index() {
    let unit = compile(
        "CREATE INDEX items_embedding_idx ON items USING vchordrq (embedding vector_l2_ops)
         WITH (options = $$
residual_quantization = true
[build.internal]
lists = [1000]
$$);
         CREATE INDEX ON items USING vchordg (embedding vector_cosine_ops);
         CREATE INDEX items_title_idx ON items (title) WITH (fillfactor = 70);",
    )
    .unwrap();

    assert_eq!(unit.indexes.len(), 3);
    let rq = &unit.indexes[0];
    assert_eq!(rq.method.as_deref(), Some("vchordrq"));
    assert_eq!(rq.columns, ["embedding"]);
    assert_eq!(rq.parameters[0].name, "options");
    assert!(rq.parameters[0].value.as_deref().unwrap().contains("lists = [1000]"));

    assert_eq!(unit.indexes[1].method.as_deref(), Some("vchordg"));
    assert_eq!(unit.indexes[2].parameters[0].value.as_deref(), Some("70"));
}

#[test]
fn test_index_on_unknown_column() {
    let err = compile("CREATE INDEX ON items USING vchordrq (missing vector_l2_ops);").unwrap_err();
    assert!(matches!(err, Error::UnknownColumn(name) if name == "missing"));
}

#[test]
fn test_insert_vector() {
    let unit = compile(
        "insertItem: INSERT INTO items (title, embedding, signature) VALUES (?, ?::vector, ?);",
    )
    .unwrap();
    let insert = query(&unit, "insertItem");
    let types: Vec<String> = insert.arguments.iter().map(|a| a.ty.to_string()).collect();
    assert_eq!(types, ["text", "vector", "bit?"]);
}

#[test]
fn test_base_grammar_alone_rejects_vector_syntax() {
    let base = Compiler::new(&[]);
    assert!(matches!(
        base.compile("CREATE TABLE t (v TEXT); SELECT v <-> v FROM t;"),
        Err(Error::Parse { .. })
    ));
    assert!(matches!(
        base.compile("CREATE TABLE t (v TEXT); CREATE INDEX ON t USING vchordrq (v);"),
        Err(Error::Parse { .. })
    ));
    assert!(base.compile(SCHEMA).is_err());
}
