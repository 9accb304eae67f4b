use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Lex error: {0}")]
    Lex(String),

    #[error("Parse error at token {position}: {message}")]
    Parse { message: String, position: usize },

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Table already exists: {0}")]
    DuplicateTable(String),

    #[error("Incompatible types: {left} and {right}")]
    IncompatibleTypes { left: String, right: String },

    #[error("Cannot infer type for argument {0}")]
    UntypedArgument(String),

    #[error("No type resolver understands {construct} from layer {layer}")]
    UnresolvedExtension { layer: String, construct: String },

    #[error("Expected {expected} values, found {found}")]
    ColumnCountMismatch { expected: usize, found: usize },

    #[error("`*` needs a FROM clause")]
    WildcardWithoutFrom,

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Unknown dialect module: {0}")]
    UnknownModule(String),

    /// A node classified as a specific construct lacks the structure that
    /// classification guarantees. Never recovered into a type.
    #[error("Internal invariant violated in {construct}: {message}")]
    InvariantViolation { construct: String, message: String },
}

impl Error {
    pub fn parse(message: impl Into<String>, position: usize) -> Self {
        Error::Parse {
            message: message.into(),
            position,
        }
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::InvariantViolation { .. })
    }
}
