//! Compiler host
//!
//! Drives a compilation unit: parse with the layered grammar, track the
//! schema declared so far, and type every result column and bind argument
//! through the resolver chain.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extensions::{self, DialectModule};
use crate::grammar::Grammar;
use crate::parser::{self, ast::*};
use crate::resolver::{Relation, ResolveContext, Scope, TypeResolver};
use crate::types::{IntermediateType, PostgreSqlType, PrimitiveType};

const CURSOR: &str = "cursor";

#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: IntermediateType,
}

#[derive(Debug, Clone, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    fn relation(&self, alias: Option<&String>) -> Relation {
        Relation {
            name: self.name.clone(),
            alias: alias.cloned(),
            columns: self
                .columns
                .iter()
                .map(|column| (column.name.clone(), column.ty.clone()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexParameter {
    pub name: String,
    pub value: Option<String>,
}

impl From<&StorageParameter> for IndexParameter {
    fn from(parameter: &StorageParameter) -> Self {
        let value = parameter.value.as_ref().map(|value| match value {
            StorageValue::Number(v) | StorageValue::String(v) | StorageValue::Word(v) => v.clone(),
        });
        IndexParameter {
            name: parameter.name.clone(),
            value,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Index {
    pub name: Option<String>,
    pub table: String,
    pub method: Option<String>,
    pub columns: Vec<String>,
    pub parameters: Vec<IndexParameter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Select,
    Insert,
}

/// A typed result column with the code reading it from a cursor
#[derive(Debug, Clone, Serialize)]
pub struct ResultColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: IntermediateType,
    pub reader: String,
}

/// A typed bind argument with the code binding it
#[derive(Debug, Clone, Serialize)]
pub struct Argument {
    pub index: usize,
    pub label: String,
    #[serde(rename = "type")]
    pub ty: IntermediateType,
    pub binder: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Query {
    pub label: Option<String>,
    pub kind: QueryKind,
    pub columns: Vec<ResultColumn>,
    pub arguments: Vec<Argument>,
}

/// Everything one SQL source declares
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompiledUnit {
    pub tables: Vec<Table>,
    pub indexes: Vec<Index>,
    pub queries: Vec<Query>,
}

impl CompiledUnit {
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .iter()
            .find(|table| table.name == name)
            .ok_or_else(|| Error::UnknownTable(name.to_string()))
    }

    pub fn query(&self, label: &str) -> Option<&Query> {
        self.queries
            .iter()
            .find(|query| query.label.as_deref() == Some(label))
    }
}

pub struct Compiler {
    grammar: Grammar,
    resolver: Box<dyn TypeResolver>,
    modules: Vec<&'static str>,
}

impl Compiler {
    /// Layer `modules` over the base grammar, first module lowest
    pub fn new(modules: &[&dyn DialectModule]) -> Self {
        let mut grammar = Grammar::new();
        extensions::install_modules(&mut grammar, modules);
        Compiler::with_grammar(grammar, modules)
    }

    /// Use an already built grammar (e.g. a global snapshot) with the
    /// resolvers of `modules`
    pub fn with_grammar(grammar: Grammar, modules: &[&dyn DialectModule]) -> Self {
        let names: Vec<&'static str> = modules.iter().map(|module| module.name()).collect();
        info!("Compiler ready with modules: {:?}", names);
        Compiler {
            grammar,
            resolver: extensions::resolver_chain(modules),
            modules: names,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let modules = extensions::select_modules(config.enabled_modules())?;
        Ok(Compiler::new(&modules))
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn resolver(&self) -> &dyn TypeResolver {
        self.resolver.as_ref()
    }

    pub fn modules(&self) -> &[&'static str] {
        &self.modules
    }

    pub fn compile(&self, sql: &str) -> Result<CompiledUnit> {
        let statements = parser::parse(sql, &self.grammar)?;
        debug!(statements = statements.len(), "parsed compilation unit");

        let mut unit = CompiledUnit::default();
        for NamedStatement { label, statement } in statements {
            match statement {
                Statement::CreateTable(create) => self.create_table(&mut unit, create)?,
                Statement::CreateIndex(create) => {
                    let index = self.create_index(&unit, create)?;
                    unit.indexes.push(index);
                }
                Statement::Select(select) => {
                    let query = self.select(&unit, label, &select)?;
                    unit.queries.push(query);
                }
                Statement::Insert(insert) => {
                    let query = self.insert(&unit, label, &insert)?;
                    unit.queries.push(query);
                }
            }
        }
        Ok(unit)
    }

    fn create_table(&self, unit: &mut CompiledUnit, create: CreateTable) -> Result<()> {
        if unit.table(&create.name).is_ok() {
            if create.if_not_exists {
                debug!(table = %create.name, "table exists, skipping");
                return Ok(());
            }
            return Err(Error::DuplicateTable(create.name));
        }

        let mut columns = Vec::with_capacity(create.columns.len());
        for def in &create.columns {
            let ty = self.resolver.definition_type(&def.type_name)?;
            let non_null =
                def.not_null || def.primary_key || create.primary_key.contains(&def.name);
            let ty = if non_null { ty.as_non_null() } else { ty.as_nullable() };
            debug!(table = %create.name, column = %def.name, ty = %ty, "declared column");
            columns.push(Column {
                name: def.name.clone(),
                ty: ty.with_name(def.name.clone()),
            });
        }
        for key in &create.primary_key {
            if !columns.iter().any(|column| &column.name == key) {
                return Err(Error::UnknownColumn(format!("{}.{}", create.name, key)));
            }
        }

        unit.tables.push(Table {
            name: create.name,
            columns,
        });
        Ok(())
    }

    fn create_index(&self, unit: &CompiledUnit, create: CreateIndex) -> Result<Index> {
        let table = unit.table(&create.table)?;
        let scope = Scope::new().with_relation(table.relation(None));
        let cx = ResolveContext::new(self.resolver(), &scope);

        let mut columns = Vec::with_capacity(create.columns.len());
        for column in &create.columns {
            cx.resolve(&column.expr)?;
            columns.push(column.expr.default_name());
        }
        if let Some(predicate) = &create.predicate {
            cx.resolve(predicate)?;
        }

        Ok(Index {
            name: create.name,
            table: create.table,
            method: create.method.map(|method| method.name),
            columns,
            parameters: create.parameters.iter().map(IndexParameter::from).collect(),
        })
    }

    fn select(&self, unit: &CompiledUnit, label: Option<String>, select: &Select) -> Result<Query> {
        let table = select
            .from
            .as_ref()
            .map(|from| unit.table(&from.name).map(|table| (table, from)))
            .transpose()?;
        let scope = match table {
            Some((table, from)) => Scope::new().with_relation(table.relation(from.alias.as_ref())),
            None => Scope::new(),
        };
        let cx = ResolveContext::new(self.resolver(), &scope);
        let mut arguments = Arguments::default();

        let mut columns = Vec::new();
        for item in &select.projection {
            match item {
                SelectItem::Wildcard => {
                    let Some((table, _)) = table else {
                        return Err(Error::WildcardWithoutFrom);
                    };
                    for column in &table.columns {
                        columns.push((column.name.clone(), column.ty.clone()));
                    }
                }
                SelectItem::Expr { expr, alias } => {
                    let ty = cx.resolve(expr)?;
                    arguments.infer(expr, None, &cx)?;
                    let name = alias.clone().unwrap_or_else(|| expr.default_name());
                    columns.push((name, ty));
                }
            }
        }

        if let Some(selection) = &select.selection {
            cx.resolve(selection)?;
            let boolean = IntermediateType::new(&PrimitiveType::Boolean);
            arguments.infer(selection, Some(&boolean), &cx)?;
        }
        for order in &select.order_by {
            cx.resolve(&order.expr)?;
            arguments.infer(&order.expr, None, &cx)?;
        }
        let bigint = IntermediateType::new(&PostgreSqlType::BigInt);
        for bound in [&select.limit, &select.offset].into_iter().flatten() {
            cx.resolve(bound)?;
            arguments.infer(bound, Some(&bigint), &cx)?;
        }

        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(i, (name, ty))| ResultColumn {
                reader: ty.read(i, CURSOR),
                ty: ty.with_name(name.clone()),
                name,
            })
            .collect();

        Ok(Query {
            label,
            kind: QueryKind::Select,
            columns,
            arguments: arguments.into_vec(),
        })
    }

    fn insert(&self, unit: &CompiledUnit, label: Option<String>, insert: &Insert) -> Result<Query> {
        let table = unit.table(&insert.table)?;
        let targets = if insert.columns.is_empty() {
            table.columns.iter().collect::<Vec<_>>()
        } else {
            insert
                .columns
                .iter()
                .map(|name| {
                    table
                        .column(name)
                        .ok_or_else(|| Error::UnknownColumn(format!("{}.{}", table.name, name)))
                })
                .collect::<Result<Vec<_>>>()?
        };

        let scope = Scope::new();
        let cx = ResolveContext::new(self.resolver(), &scope);
        let mut arguments = Arguments::default();
        for row in &insert.rows {
            if row.len() != targets.len() {
                return Err(Error::ColumnCountMismatch {
                    expected: targets.len(),
                    found: row.len(),
                });
            }
            for (value, column) in row.iter().zip(&targets) {
                cx.resolve(value)?;
                arguments.infer(value, Some(&column.ty), &cx)?;
            }
        }

        Ok(Query {
            label,
            kind: QueryKind::Insert,
            columns: Vec::new(),
            arguments: arguments.into_vec(),
        })
    }
}

/// Bind arguments of one statement, keyed by position
#[derive(Default)]
struct Arguments {
    found: BTreeMap<usize, Argument>,
}

impl Arguments {
    fn into_vec(self) -> Vec<Argument> {
        self.found.into_values().collect()
    }

    /// Type every bind argument under `expr`. `expected` is the type the
    /// surrounding context demands of `expr` itself.
    fn infer(
        &mut self,
        expr: &Expr,
        expected: Option<&IntermediateType>,
        cx: &ResolveContext<'_>,
    ) -> Result<()> {
        match expr {
            Expr::BindArg(arg) => {
                let ty = expected
                    .cloned()
                    .ok_or_else(|| Error::UntypedArgument(arg.label.clone()))?;
                self.record(arg, ty);
                Ok(())
            }
            Expr::Column { .. } | Expr::Literal(_) => Ok(()),
            Expr::Unary {
                op: UnaryOp::Not,
                expr,
            } => {
                let boolean = IntermediateType::new(&PrimitiveType::Boolean);
                self.infer(expr, Some(&boolean), cx)
            }
            Expr::Unary { expr, .. } | Expr::Nested(expr) => self.infer(expr, expected, cx),
            Expr::Binary { left, op, right } if op.is_logical() => {
                let boolean = IntermediateType::new(&PrimitiveType::Boolean);
                self.infer(left, Some(&boolean), cx)?;
                self.infer(right, Some(&boolean), cx)
            }
            Expr::Binary {
                left,
                op: BinaryOp::Concat,
                right,
            } => {
                let text = IntermediateType::new(&PrimitiveType::Text);
                self.infer(left, Some(&text), cx)?;
                self.infer(right, Some(&text), cx)
            }
            Expr::Binary { left, right, .. } => self.infer_siblings(&[&**left, &**right], cx),
            Expr::IsNull { expr, .. } => self.infer(expr, None, cx),
            Expr::Cast { expr, type_name } => {
                let target = cx.definition_type(type_name)?;
                self.infer(expr, Some(&target), cx)
            }
            Expr::Function(call) => match cx.function_argument_types(call) {
                Some(types) => {
                    for (n, arg) in call.args.iter().enumerate() {
                        self.infer(arg, types.get(n), cx)?;
                    }
                    Ok(())
                }
                None => {
                    let args: Vec<&Expr> = call.args.iter().collect();
                    self.infer_siblings(&args, cx)
                }
            },
            Expr::Extension(node) => self.infer_siblings(&node.operands(), cx),
        }
    }

    /// Each operand takes the type of the first sibling with a usable type
    fn infer_siblings(&mut self, operands: &[&Expr], cx: &ResolveContext<'_>) -> Result<()> {
        let mut sibling = None;
        for operand in operands {
            let ty = cx.resolve(operand)?;
            if !ty.is_placeholder() {
                sibling = Some(ty.as_non_null());
                break;
            }
        }
        for operand in operands {
            self.infer(operand, sibling.as_ref(), cx)?;
        }
        Ok(())
    }

    fn record(&mut self, arg: &BindArg, ty: IntermediateType) {
        let value = match arg.label.strip_prefix(':') {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("arg{}", arg.index),
        };
        let ty = ty.with_name(value.clone());
        debug!(index = arg.index, label = %arg.label, ty = %ty, "typed bind argument");
        self.found.insert(
            arg.index,
            Argument {
                index: arg.index,
                label: arg.label.clone(),
                binder: ty.bind(arg.index, &value),
                ty,
            },
        );
    }
}
