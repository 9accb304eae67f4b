use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A node contributed by a grammar layer.
///
/// The base grammar treats these as opaque; the layer's type resolver
/// classifies them again by downcasting.
pub trait ExtensionNode: fmt::Debug + Send + Sync + 'static {
    /// Name of the layer that produced the node
    fn layer(&self) -> &'static str;

    /// Short description used in diagnostics
    fn describe(&self) -> String;

    /// Child expressions, used for bind argument inference
    fn operands(&self) -> Vec<&Expr> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any;
}

impl dyn ExtensionNode {
    pub fn downcast_ref<T: ExtensionNode>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: ExtensionNode>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

pub type ExtensionRef = Arc<dyn ExtensionNode>;

/// A statement with its optional `label:` prefix
#[derive(Debug, Clone)]
pub struct NamedStatement {
    pub label: Option<String>,
    pub statement: Statement,
}

#[derive(Debug, Clone)]
pub enum Statement {
    CreateTable(CreateTable),
    CreateIndex(CreateIndex),
    Select(Select),
    Insert(Insert),
}

#[derive(Debug, Clone)]
pub struct CreateTable {
    pub name: String,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub type_name: TypeName,
    pub not_null: bool,
    pub primary_key: bool,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct CreateIndex {
    pub name: Option<String>,
    pub table: String,
    pub unique: bool,
    pub method: Option<IndexMethod>,
    pub columns: Vec<IndexColumn>,
    pub parameters: Vec<StorageParameter>,
    pub predicate: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct IndexColumn {
    pub expr: Expr,
    pub opclass: Option<String>,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMethod {
    pub name: String,
}

impl IndexMethod {
    pub fn new(name: impl Into<String>) -> Self {
        IndexMethod { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageParameter {
    pub name: String,
    pub value: Option<StorageValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageValue {
    Number(String),
    String(String),
    Word(String),
}

#[derive(Debug, Clone)]
pub struct Select {
    pub distinct: bool,
    pub projection: Vec<SelectItem>,
    pub from: Option<TableRef>,
    pub selection: Option<Expr>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
}

#[derive(Debug, Clone)]
pub enum SelectItem {
    Wildcard,
    Expr { expr: Expr, alias: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub descending: bool,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Expr>>,
}

#[derive(Debug, Clone)]
pub enum TypeName {
    Named { name: String, modifiers: Vec<String> },
    Extension(ExtensionRef),
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Named { name, modifiers } if modifiers.is_empty() => write!(f, "{}", name),
            TypeName::Named { name, modifiers } => write!(f, "{}({})", name, modifiers.join(", ")),
            TypeName::Extension(node) => write!(f, "{}", node.describe()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Column {
        qualifier: Option<String>,
        name: String,
    },
    Literal(Literal),
    BindArg(BindArg),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
    Cast {
        expr: Box<Expr>,
        type_name: TypeName,
    },
    Function(FunctionCall),
    Nested(Box<Expr>),
    Extension(ExtensionRef),
}

impl Expr {
    pub fn column(name: &str) -> Self {
        Expr::Column {
            qualifier: None,
            name: name.to_string(),
        }
    }

    /// Name a result column gets when no alias is given
    pub fn default_name(&self) -> String {
        match self {
            Expr::Column { name, .. } => name.clone(),
            Expr::Function(call) => call.name.clone(),
            Expr::Cast { expr, .. } | Expr::Nested(expr) => expr.default_name(),
            _ => "?column?".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Number(String),
    String(String),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindArg {
    /// Zero-based position among the statement's arguments
    pub index: usize,
    /// Source spelling: `?`, `$1` or `:name`
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Like,
    NotLike,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Concat,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
                | BinaryOp::Like
                | BinaryOp::NotLike
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Like => "LIKE",
            BinaryOp::NotLike => "NOT LIKE",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Concat => "||",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub distinct: bool,
    /// `count(*)`
    pub wildcard: bool,
}

impl FunctionCall {
    pub fn new(name: &str, args: Vec<Expr>) -> Self {
        FunctionCall {
            name: name.to_string(),
            args,
            distinct: false,
            wildcard: false,
        }
    }
}
