use crate::types::DialectType;

/// Column types added by VectorChord. Both travel as their text
/// representation (`[1,2,3]`, `101`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorChordSqlType {
    Bit,
    Vector,
}

impl DialectType for VectorChordSqlType {
    fn name(&self) -> &'static str {
        match self {
            VectorChordSqlType::Bit => "bit",
            VectorChordSqlType::Vector => "vector",
        }
    }

    fn dialect(&self) -> &'static str {
        "vectorchord"
    }

    fn host_type(&self) -> &'static str {
        "String"
    }

    fn bind(&self, index: usize, value: &str) -> String {
        format!("bind_string({}, {})", index, value)
    }

    fn read(&self, index: usize, cursor: &str) -> String {
        format!("{}.get_string({})", cursor, index)
    }
}
