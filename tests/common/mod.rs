#![allow(dead_code)]

use vchord_dialect::compiler::{CompiledUnit, Compiler, Query};
use vchord_dialect::vector::VectorChordModule;

pub const SCHEMA: &str = "
CREATE TABLE items (
    id BIGSERIAL PRIMARY KEY,
    title TEXT NOT NULL,
    embedding VECTOR(3) NOT NULL,
    signature BIT(8)
);
";

/// Compile `sql` after the `items` schema with the VectorChord layer
pub fn compile(sql: &str) -> vchord_dialect::Result<CompiledUnit> {
    Compiler::new(&[&VectorChordModule]).compile(&format!("{}{}", SCHEMA, sql))
}

pub fn query<'a>(unit: &'a CompiledUnit, label: &str) -> &'a Query {
    unit.query(label)
        .unwrap_or_else(|| panic!("no query labelled {}", label))
}
