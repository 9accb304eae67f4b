use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// A value type known to the type system.
///
/// Every dialect type knows how to generate the code that binds a value of
/// this type into a prepared statement parameter and the code that reads it
/// back from a result cursor.
pub trait DialectType: fmt::Debug + Send + Sync {
    /// SQL-facing type name (e.g. "vector", "integer")
    fn name(&self) -> &'static str;

    /// Dialect that owns this type (e.g. "core", "postgresql", "vectorchord")
    fn dialect(&self) -> &'static str;

    /// Type of the value in generated code
    fn host_type(&self) -> &'static str;

    /// Code binding `value` to the parameter at `index`
    fn bind(&self, index: usize, value: &str) -> String;

    /// Code reading column `index` from `cursor`
    fn read(&self, index: usize, cursor: &str) -> String;
}

/// Two dialect types are the same when dialect and name agree.
pub fn same_type(left: &dyn DialectType, right: &dyn DialectType) -> bool {
    left.dialect() == right.dialect() && left.name() == right.name()
}

/// Types every dialect shares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Argument,
    Null,
    Integer,
    Real,
    Text,
    Blob,
    Boolean,
}

impl PrimitiveType {
    fn accessor(&self) -> &'static str {
        match self {
            PrimitiveType::Argument | PrimitiveType::Null => "null",
            PrimitiveType::Integer => "long",
            PrimitiveType::Real => "double",
            PrimitiveType::Text => "string",
            PrimitiveType::Blob => "bytes",
            PrimitiveType::Boolean => "boolean",
        }
    }
}

impl DialectType for PrimitiveType {
    fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Argument => "argument",
            PrimitiveType::Null => "null",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Real => "real",
            PrimitiveType::Text => "text",
            PrimitiveType::Blob => "blob",
            PrimitiveType::Boolean => "boolean",
        }
    }

    fn dialect(&self) -> &'static str {
        "core"
    }

    fn host_type(&self) -> &'static str {
        match self {
            PrimitiveType::Argument | PrimitiveType::Null => "()",
            PrimitiveType::Integer => "i64",
            PrimitiveType::Real => "f64",
            PrimitiveType::Text => "String",
            PrimitiveType::Blob => "Vec<u8>",
            PrimitiveType::Boolean => "bool",
        }
    }

    fn bind(&self, index: usize, value: &str) -> String {
        match self {
            PrimitiveType::Argument | PrimitiveType::Null => format!("bind_null({})", index),
            _ => format!("bind_{}({}, {})", self.accessor(), index, value),
        }
    }

    fn read(&self, index: usize, cursor: &str) -> String {
        format!("{}.get_{}({})", cursor, self.accessor(), index)
    }
}

/// PostgreSQL types with no core equivalent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostgreSqlType {
    SmallInt,
    Integer,
    BigInt,
    Numeric,
    Date,
    Time,
    Timestamp,
    TimestampTimezone,
    Interval,
    Uuid,
    Json,
    Jsonb,
}

impl DialectType for PostgreSqlType {
    fn name(&self) -> &'static str {
        match self {
            PostgreSqlType::SmallInt => "smallint",
            PostgreSqlType::Integer => "int",
            PostgreSqlType::BigInt => "bigint",
            PostgreSqlType::Numeric => "numeric",
            PostgreSqlType::Date => "date",
            PostgreSqlType::Time => "time",
            PostgreSqlType::Timestamp => "timestamp",
            PostgreSqlType::TimestampTimezone => "timestamptz",
            PostgreSqlType::Interval => "interval",
            PostgreSqlType::Uuid => "uuid",
            PostgreSqlType::Json => "json",
            PostgreSqlType::Jsonb => "jsonb",
        }
    }

    fn dialect(&self) -> &'static str {
        "postgresql"
    }

    fn host_type(&self) -> &'static str {
        match self {
            PostgreSqlType::SmallInt => "i16",
            PostgreSqlType::Integer => "i32",
            PostgreSqlType::BigInt => "i64",
            _ => "String",
        }
    }

    fn bind(&self, index: usize, value: &str) -> String {
        match self {
            PostgreSqlType::SmallInt => format!("bind_short({}, {})", index, value),
            PostgreSqlType::Integer => format!("bind_int({}, {})", index, value),
            PostgreSqlType::BigInt => format!("bind_long({}, {})", index, value),
            _ => format!("bind_string({}, {})", index, value),
        }
    }

    fn read(&self, index: usize, cursor: &str) -> String {
        match self {
            PostgreSqlType::SmallInt => format!("{}.get_short({})", cursor, index),
            PostgreSqlType::Integer => format!("{}.get_int({})", cursor, index),
            PostgreSqlType::BigInt => format!("{}.get_long({})", cursor, index),
            _ => format!("{}.get_string({})", cursor, index),
        }
    }
}

/// Result of type resolution for a declaration or expression
#[derive(Debug, Clone)]
pub struct IntermediateType {
    pub dialect_type: &'static dyn DialectType,
    pub nullable: bool,
    pub name: Option<String>,
}

impl IntermediateType {
    pub fn new(dialect_type: &'static dyn DialectType) -> Self {
        IntermediateType {
            dialect_type,
            nullable: false,
            name: None,
        }
    }

    pub fn as_nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn as_non_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// True when this resolves to `dialect_type`, regardless of nullability
    pub fn is(&self, dialect_type: &dyn DialectType) -> bool {
        same_type(self.dialect_type, dialect_type)
    }

    /// Null and argument placeholders carry no usable type
    pub fn is_placeholder(&self) -> bool {
        self.is(&PrimitiveType::Null) || self.is(&PrimitiveType::Argument)
    }

    pub fn type_name(&self) -> &'static str {
        self.dialect_type.name()
    }

    pub fn bind(&self, index: usize, value: &str) -> String {
        self.dialect_type.bind(index, value)
    }

    pub fn read(&self, index: usize, cursor: &str) -> String {
        self.dialect_type.read(index, cursor)
    }
}

impl PartialEq for IntermediateType {
    fn eq(&self, other: &Self) -> bool {
        same_type(self.dialect_type, other.dialect_type) && self.nullable == other.nullable
    }
}

impl fmt::Display for IntermediateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.dialect_type.name())
        } else {
            write!(f, "{}", self.dialect_type.name())
        }
    }
}

// Manual serde impl: the dialect type is a trait object
impl Serialize for IntermediateType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("IntermediateType", 4)?;
        state.serialize_field("type", self.dialect_type.name())?;
        state.serialize_field("dialect", self.dialect_type.dialect())?;
        state.serialize_field("host_type", self.dialect_type.host_type())?;
        state.serialize_field("nullable", &self.nullable)?;
        state.end()
    }
}
