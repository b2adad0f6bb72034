//! Logical plans and the `Frame` builder

use super::expr::Expr;
use super::io::Source;
use crate::error::{Error, Result};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Join flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// Keep only matching pairs
    Inner,
    /// Keep every left row; right columns are null when nothing matches
    Left,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "inner"),
            JoinType::Left => write!(f, "left"),
        }
    }
}

/// Sort key; ascending keys put nulls first, descending keys put them last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    /// Ascending order
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    /// Descending order
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// A node of the transformation graph
#[derive(Debug, Clone)]
pub enum Plan {
    /// Read JSON records
    Scan(Source),
    /// Inline rows
    Values(RecordBatch),
    /// Keep rows where the predicate is true (null counts as false)
    Filter { input: Arc<Plan>, predicate: Expr },
    /// Compute a new set of columns
    Project { input: Arc<Plan>, exprs: Vec<Expr> },
    /// Append a column, or replace it when the name exists
    WithColumn {
        input: Arc<Plan>,
        name: String,
        expr: Expr,
    },
    /// Rename one column
    Rename {
        input: Arc<Plan>,
        from: String,
        to: String,
    },
    /// Remove exact duplicate rows
    Distinct { input: Arc<Plan> },
    /// Order rows
    Sort { input: Arc<Plan>, keys: Vec<SortKey> },
    /// Equi-join on pairs of (left column, right column)
    Join {
        left: Arc<Plan>,
        right: Arc<Plan>,
        on: Vec<(String, String)>,
        join_type: JoinType,
    },
}

impl Plan {
    /// Resolve the output schema, validating column references on the way
    pub fn schema(&self) -> Result<SchemaRef> {
        match self {
            Plan::Scan(source) => Ok(Arc::clone(&source.schema)),
            Plan::Values(batch) => Ok(batch.schema()),
            Plan::Filter { input, predicate } => {
                let schema = input.schema()?;
                let dt = predicate.data_type(&schema)?;
                if dt != DataType::Boolean {
                    return Err(Error::plan(format!(
                        "filter predicate '{predicate}' is {dt}, not boolean"
                    )));
                }
                Ok(schema)
            }
            Plan::Project { input, exprs } => {
                let schema = input.schema()?;
                let mut seen = HashSet::new();
                let fields = exprs
                    .iter()
                    .map(|expr| {
                        let name = expr.name();
                        if !seen.insert(name.clone()) {
                            return Err(Error::plan(format!(
                                "duplicate column '{name}' in projection"
                            )));
                        }
                        Ok(Field::new(name, expr.data_type(&schema)?, true))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Arc::new(Schema::new(fields)))
            }
            Plan::WithColumn { input, name, expr } => {
                let schema = input.schema()?;
                let field = Field::new(name, expr.data_type(&schema)?, true);
                let mut fields: Vec<Field> =
                    schema.fields().iter().map(|f| f.as_ref().clone()).collect();
                match schema.index_of(name) {
                    Ok(index) => fields[index] = field,
                    Err(_) => fields.push(field),
                }
                Ok(Arc::new(Schema::new(fields)))
            }
            Plan::Rename { input, from, to } => {
                let schema = input.schema()?;
                let index = schema.index_of(from).map_err(|_| {
                    Error::column_not_found(
                        from,
                        schema.fields().iter().map(|f| f.name().as_str()),
                    )
                })?;
                if from != to && schema.index_of(to).is_ok() {
                    return Err(Error::plan(format!(
                        "cannot rename '{from}' to existing column '{to}'"
                    )));
                }
                let fields: Vec<Field> = schema
                    .fields()
                    .iter()
                    .enumerate()
                    .map(|(i, f)| {
                        if i == index {
                            f.as_ref().clone().with_name(to)
                        } else {
                            f.as_ref().clone()
                        }
                    })
                    .collect();
                Ok(Arc::new(Schema::new(fields)))
            }
            Plan::Distinct { input } => input.schema(),
            Plan::Sort { input, keys } => {
                let schema = input.schema()?;
                for key in keys {
                    Expr::Column(key.column.clone()).data_type(&schema)?;
                }
                Ok(schema)
            }
            Plan::Join {
                left,
                right,
                on,
                join_type,
            } => {
                let left_schema = left.schema()?;
                let right_schema = right.schema()?;
                if on.is_empty() {
                    return Err(Error::plan("join requires at least one key pair"));
                }
                for (l, r) in on {
                    let lt = Expr::Column(l.clone()).data_type(&left_schema)?;
                    let rt = Expr::Column(r.clone()).data_type(&right_schema)?;
                    if lt != rt {
                        return Err(Error::plan(format!(
                            "join key type mismatch: {l} is {lt}, {r} is {rt}"
                        )));
                    }
                }

                let mut fields: Vec<Field> = left_schema
                    .fields()
                    .iter()
                    .map(|f| f.as_ref().clone())
                    .collect();
                for field in right_schema.fields() {
                    if left_schema.index_of(field.name()).is_ok() {
                        return Err(Error::AmbiguousColumn {
                            column: field.name().clone(),
                        });
                    }
                    let nullable = field.is_nullable() || *join_type == JoinType::Left;
                    fields.push(field.as_ref().clone().with_nullable(nullable));
                }
                Ok(Arc::new(Schema::new(fields)))
            }
        }
    }

    /// Direct inputs of this node
    pub fn inputs(&self) -> Vec<&Arc<Plan>> {
        match self {
            Plan::Scan(_) | Plan::Values(_) => vec![],
            Plan::Filter { input, .. }
            | Plan::Project { input, .. }
            | Plan::WithColumn { input, .. }
            | Plan::Rename { input, .. }
            | Plan::Distinct { input }
            | Plan::Sort { input, .. } => vec![input],
            Plan::Join { left, right, .. } => vec![left, right],
        }
    }

    /// One-line description of this node
    fn describe(&self) -> String {
        match self {
            Plan::Scan(source) => format!("Scan: {source}"),
            Plan::Values(batch) => format!("Values: {} rows", batch.num_rows()),
            Plan::Filter { predicate, .. } => format!("Filter: {predicate}"),
            Plan::Project { exprs, .. } => {
                let exprs: Vec<String> = exprs.iter().map(ToString::to_string).collect();
                format!("Project: {}", exprs.join(", "))
            }
            Plan::WithColumn { name, expr, .. } => format!("WithColumn: {name} = {expr}"),
            Plan::Rename { from, to, .. } => format!("Rename: {from} -> {to}"),
            Plan::Distinct { .. } => "Distinct".to_string(),
            Plan::Sort { keys, .. } => {
                let keys: Vec<String> = keys
                    .iter()
                    .map(|k| {
                        if k.descending {
                            format!("{} DESC", k.column)
                        } else {
                            format!("{} ASC", k.column)
                        }
                    })
                    .collect();
                format!("Sort: {}", keys.join(", "))
            }
            Plan::Join { on, join_type, .. } => {
                let on: Vec<String> = on.iter().map(|(l, r)| format!("{l} = {r}")).collect();
                format!("Join({join_type}): {}", on.join(" AND "))
            }
        }
    }

    fn fmt_indent(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{}{}", "  ".repeat(depth), self.describe())?;
        for input in self.inputs() {
            input.fmt_indent(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indent(f, 0)
    }
}

/// Immutable handle on a transformation graph
///
/// Every method returns a new `Frame`; nothing runs until the frame is
/// handed to an [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone)]
pub struct Frame {
    plan: Arc<Plan>,
}

impl Frame {
    /// Frame over a JSON source
    pub fn scan(source: Source) -> Self {
        Self::from_plan(Plan::Scan(source))
    }

    /// Frame over inline rows
    pub fn values(batch: RecordBatch) -> Self {
        Self::from_plan(Plan::Values(batch))
    }

    /// Wrap a plan node
    pub fn from_plan(plan: Plan) -> Self {
        Self {
            plan: Arc::new(plan),
        }
    }

    /// Keep rows matching the predicate
    #[must_use]
    pub fn filter(&self, predicate: Expr) -> Frame {
        Self::from_plan(Plan::Filter {
            input: Arc::clone(&self.plan),
            predicate,
        })
    }

    /// Compute a new set of columns
    #[must_use]
    pub fn select<I, E>(&self, exprs: I) -> Frame
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Self::from_plan(Plan::Project {
            input: Arc::clone(&self.plan),
            exprs: exprs.into_iter().map(Into::into).collect(),
        })
    }

    /// Append or replace a column
    #[must_use]
    pub fn with_column(&self, name: impl Into<String>, expr: Expr) -> Frame {
        Self::from_plan(Plan::WithColumn {
            input: Arc::clone(&self.plan),
            name: name.into(),
            expr,
        })
    }

    /// Rename a column
    #[must_use]
    pub fn with_column_renamed(&self, from: impl Into<String>, to: impl Into<String>) -> Frame {
        Self::from_plan(Plan::Rename {
            input: Arc::clone(&self.plan),
            from: from.into(),
            to: to.into(),
        })
    }

    /// Remove exact duplicate rows
    #[must_use]
    pub fn distinct(&self) -> Frame {
        Self::from_plan(Plan::Distinct {
            input: Arc::clone(&self.plan),
        })
    }

    /// Order rows
    #[must_use]
    pub fn order_by(&self, keys: Vec<SortKey>) -> Frame {
        Self::from_plan(Plan::Sort {
            input: Arc::clone(&self.plan),
            keys,
        })
    }

    /// Equi-join with another frame on (left column, right column) pairs
    #[must_use]
    pub fn join(&self, right: &Frame, on: &[(&str, &str)], join_type: JoinType) -> Frame {
        Self::from_plan(Plan::Join {
            left: Arc::clone(&self.plan),
            right: Arc::clone(&right.plan),
            on: on
                .iter()
                .map(|(l, r)| ((*l).to_string(), (*r).to_string()))
                .collect(),
            join_type,
        })
    }

    /// Root plan node
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Resolved output schema
    pub fn schema(&self) -> Result<SchemaRef> {
        self.plan.schema()
    }

    /// Indented tree rendering of the plan
    pub fn explain(&self) -> String {
        self.plan.to_string()
    }
}
