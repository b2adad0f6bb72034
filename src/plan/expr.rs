//! Column expressions
//!
//! A small expression language covering what the star-schema transforms
//! need: column references, literals, equality and conjunction for
//! predicates and join keys, text concatenation, and timestamp handling.

use crate::error::{Error, Result};
use arrow::datatypes::{DataType, Schema, TimeUnit};
use std::fmt;

/// Timestamp type produced by every timestamp expression (naive, microseconds)
pub const TIMESTAMP: DataType = DataType::Timestamp(TimeUnit::Microsecond, None);

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    Utf8(String),
}

impl ScalarValue {
    /// Arrow type of the literal
    pub fn data_type(&self) -> DataType {
        match self {
            ScalarValue::Null => DataType::Null,
            ScalarValue::Boolean(_) => DataType::Boolean,
            ScalarValue::Int64(_) => DataType::Int64,
            ScalarValue::Float64(_) => DataType::Float64,
            ScalarValue::Utf8(_) => DataType::Utf8,
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Utf8(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Utf8(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int64(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float64(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Boolean(b) => write!(f, "{b}"),
            ScalarValue::Int64(i) => write!(f, "{i}"),
            ScalarValue::Float64(x) => write!(f, "{x}"),
            ScalarValue::Utf8(s) => write!(f, "'{s}'"),
        }
    }
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    And,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Eq => write!(f, "="),
            Operator::And => write!(f, "AND"),
        }
    }
}

/// Calendar field extracted from a timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Hour,
    Day,
    Month,
    Year,
    /// 1 = Sunday .. 7 = Saturday
    Weekday,
}

impl DatePart {
    /// Function name used in plan output and SQL
    pub fn function_name(&self) -> &'static str {
        match self {
            DatePart::Hour => "hour",
            DatePart::Day => "dayofmonth",
            DatePart::Month => "month",
            DatePart::Year => "year",
            DatePart::Weekday => "dayofweek",
        }
    }
}

/// A column expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Reference to an input column
    Column(String),
    /// Constant value
    Literal(ScalarValue),
    /// `left op right`
    Binary {
        left: Box<Expr>,
        op: Operator,
        right: Box<Expr>,
    },
    /// Text concatenation of the arguments; null if any argument is null
    Concat(Vec<Expr>),
    /// Epoch milliseconds to a timestamp truncated to whole seconds
    FromEpochMillis(Box<Expr>),
    /// Timestamp rendered as text with a strftime-style format
    DateFormat { expr: Box<Expr>, format: String },
    /// Text parsed as a timestamp with a strftime-style format; null on failure
    ToTimestamp { expr: Box<Expr>, format: String },
    /// Calendar field of a timestamp
    DatePart { part: DatePart, expr: Box<Expr> },
    /// Renamed expression
    Alias { expr: Box<Expr>, name: String },
}

impl Expr {
    /// `self = other`
    #[must_use]
    pub fn equals(self, other: impl Into<Expr>) -> Expr {
        Expr::Binary {
            left: Box::new(self),
            op: Operator::Eq,
            right: Box::new(other.into()),
        }
    }

    /// `self AND other`
    #[must_use]
    pub fn and(self, other: Expr) -> Expr {
        Expr::Binary {
            left: Box::new(self),
            op: Operator::And,
            right: Box::new(other),
        }
    }

    /// Give the expression an output name
    #[must_use]
    pub fn alias(self, name: impl Into<String>) -> Expr {
        Expr::Alias {
            expr: Box::new(self),
            name: name.into(),
        }
    }

    /// Output column name
    pub fn name(&self) -> String {
        match self {
            Expr::Column(name) | Expr::Alias { name, .. } => name.clone(),
            other => other.to_string(),
        }
    }

    /// Resolve the result type against an input schema
    pub fn data_type(&self, schema: &Schema) -> Result<DataType> {
        match self {
            Expr::Column(name) => schema
                .field_with_name(name)
                .map(|f| f.data_type().clone())
                .map_err(|_| {
                    Error::column_not_found(
                        name,
                        schema.fields().iter().map(|f| f.name().as_str()),
                    )
                }),
            Expr::Literal(value) => Ok(value.data_type()),
            Expr::Binary { left, op, right } => {
                let lt = left.data_type(schema)?;
                let rt = right.data_type(schema)?;
                match op {
                    Operator::Eq => {
                        if lt != rt && lt != DataType::Null && rt != DataType::Null {
                            return Err(Error::plan(format!(
                                "cannot compare {lt} with {rt} in '{self}'"
                            )));
                        }
                    }
                    Operator::And => {
                        if lt != DataType::Boolean || rt != DataType::Boolean {
                            return Err(Error::plan(format!(
                                "AND requires boolean operands in '{self}'"
                            )));
                        }
                    }
                }
                Ok(DataType::Boolean)
            }
            Expr::Concat(args) => {
                for arg in args {
                    let dt = arg.data_type(schema)?;
                    if !is_concat_compatible(&dt) {
                        return Err(Error::plan(format!(
                            "concat does not accept {dt} argument '{arg}'"
                        )));
                    }
                }
                Ok(DataType::Utf8)
            }
            Expr::FromEpochMillis(inner) => {
                expect_type(inner, schema, &[DataType::Int64, DataType::Int32])?;
                Ok(TIMESTAMP)
            }
            Expr::DateFormat { expr, .. } => {
                expect_type(expr, schema, &[TIMESTAMP])?;
                Ok(DataType::Utf8)
            }
            Expr::ToTimestamp { expr, .. } => {
                expect_type(expr, schema, &[DataType::Utf8])?;
                Ok(TIMESTAMP)
            }
            Expr::DatePart { expr, .. } => {
                expect_type(expr, schema, &[TIMESTAMP])?;
                Ok(DataType::Int32)
            }
            Expr::Alias { expr, .. } => expr.data_type(schema),
        }
    }
}

fn is_concat_compatible(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Utf8
            | DataType::Int32
            | DataType::Int64
            | DataType::Float64
            | DataType::Boolean
            | DataType::Null
    )
}

fn expect_type(expr: &Expr, schema: &Schema, allowed: &[DataType]) -> Result<()> {
    let dt = expr.data_type(schema)?;
    if allowed.contains(&dt) {
        Ok(())
    } else {
        Err(Error::plan(format!(
            "unexpected type {dt} for '{expr}'"
        )))
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Expr::Column(name.to_string())
    }
}

impl From<String> for Expr {
    fn from(name: String) -> Self {
        Expr::Column(name)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "{name}"),
            Expr::Literal(value) => write!(f, "{value}"),
            Expr::Binary { left, op, right } => write!(f, "({left} {op} {right})"),
            Expr::Concat(args) => {
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "concat({})", args.join(", "))
            }
            Expr::FromEpochMillis(inner) => write!(f, "from_epoch_millis({inner})"),
            Expr::DateFormat { expr, format } => write!(f, "date_format({expr}, '{format}')"),
            Expr::ToTimestamp { expr, format } => write!(f, "to_timestamp({expr}, '{format}')"),
            Expr::DatePart { part, expr } => write!(f, "{}({expr})", part.function_name()),
            Expr::Alias { expr, name } => write!(f, "{expr} AS {name}"),
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

/// Reference a column by name
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// Constant value
pub fn lit(value: impl Into<ScalarValue>) -> Expr {
    Expr::Literal(value.into())
}

/// Text concatenation; null if any argument is null
pub fn concat<I, E>(args: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    Expr::Concat(args.into_iter().map(Into::into).collect())
}

/// Epoch milliseconds to a naive timestamp truncated to whole seconds
pub fn from_epoch_millis(expr: impl Into<Expr>) -> Expr {
    Expr::FromEpochMillis(Box::new(expr.into()))
}

/// Render a timestamp as text
pub fn date_format(expr: impl Into<Expr>, format: impl Into<String>) -> Expr {
    Expr::DateFormat {
        expr: Box::new(expr.into()),
        format: format.into(),
    }
}

/// Parse text into a timestamp
pub fn to_timestamp(expr: impl Into<Expr>, format: impl Into<String>) -> Expr {
    Expr::ToTimestamp {
        expr: Box::new(expr.into()),
        format: format.into(),
    }
}

fn date_part(part: DatePart, expr: impl Into<Expr>) -> Expr {
    Expr::DatePart {
        part,
        expr: Box::new(expr.into()),
    }
}

/// Hour of day (0-23)
pub fn hour(expr: impl Into<Expr>) -> Expr {
    date_part(DatePart::Hour, expr)
}

/// Day of month (1-31)
pub fn dayofmonth(expr: impl Into<Expr>) -> Expr {
    date_part(DatePart::Day, expr)
}

/// Month (1-12)
pub fn month(expr: impl Into<Expr>) -> Expr {
    date_part(DatePart::Month, expr)
}

/// Calendar year
pub fn year(expr: impl Into<Expr>) -> Expr {
    date_part(DatePart::Year, expr)
}

/// Day of week, 1 = Sunday .. 7 = Saturday
pub fn dayofweek(expr: impl Into<Expr>) -> Expr {
    date_part(DatePart::Weekday, expr)
}
