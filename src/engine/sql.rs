//! Plan to DuckDB SQL compilation
//!
//! Every plan node becomes one `SELECT` wrapping its input as a subquery,
//! so the generated text mirrors the plan tree one to one.

use crate::error::{Error, Result};
use crate::output::DEFAULT_PARTITION;
use crate::plan::{DatePart, Expr, JoinType, Plan, ScalarValue, Source};
use crate::types::Compression;
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Float64Type, Int32Type, Int64Type, TimeUnit, TimestampMicrosecondType,
};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;

/// Compile a plan into a single DuckDB query
pub fn compile(plan: &Plan) -> Result<String> {
    Compiler::default().plan(plan)
}

/// `COPY ... TO` statement writing a query result as Parquet
pub fn copy_statement(
    query: &str,
    target: &str,
    partition_by: &[String],
    compression: Compression,
    row_group_size: usize,
) -> String {
    let mut options = vec![
        "FORMAT PARQUET".to_string(),
        format!("COMPRESSION '{}'", compression.as_sql()),
        format!("ROW_GROUP_SIZE {row_group_size}"),
    ];
    if !partition_by.is_empty() {
        let columns: Vec<String> = partition_by.iter().map(|c| ident(c)).collect();
        options.push(format!("PARTITION_BY ({})", columns.join(", ")));
        options.push("OVERWRITE_OR_IGNORE true".to_string());
    }
    format!(
        "COPY ({query}) TO {} ({})",
        literal(target),
        options.join(", ")
    )
}

/// Query over `table` that `COPY` writes out
///
/// Partition columns are rendered as text with nulls mapped to
/// [`DEFAULT_PARTITION`], so directory names match the in-process writer.
pub fn partition_source(table: &str, partition_by: &[String]) -> String {
    if partition_by.is_empty() {
        return format!("SELECT * FROM {table}");
    }
    let replacements: Vec<String> = partition_by
        .iter()
        .map(|c| {
            format!(
                "COALESCE(CAST({col} AS VARCHAR), {default}) AS {col}",
                col = ident(c),
                default = literal(DEFAULT_PARTITION)
            )
        })
        .collect();
    format!("SELECT * REPLACE ({}) FROM {table}", replacements.join(", "))
}

/// Quote an identifier
pub fn ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal
pub fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[derive(Default)]
struct Compiler {
    next_alias: usize,
}

impl Compiler {
    fn alias(&mut self, prefix: &str) -> String {
        self.next_alias += 1;
        format!("{prefix}{}", self.next_alias)
    }

    fn subquery(&mut self, input: &Plan) -> Result<String> {
        let sql = self.plan(input)?;
        Ok(format!("({sql}) AS {}", self.alias("t")))
    }

    fn plan(&mut self, plan: &Plan) -> Result<String> {
        match plan {
            Plan::Scan(source) => scan(source),
            Plan::Values(batch) => values(batch),
            Plan::Filter { input, predicate } => {
                let from = self.subquery(input)?;
                Ok(format!("SELECT * FROM {from} WHERE {}", expr(predicate)?))
            }
            Plan::Project { input, exprs } => {
                if exprs.is_empty() {
                    return Err(Error::plan("projection without columns"));
                }
                let items = exprs
                    .iter()
                    .map(|e| Ok(format!("{} AS {}", expr(e)?, ident(&e.name()))))
                    .collect::<Result<Vec<_>>>()?;
                let from = self.subquery(input)?;
                Ok(format!("SELECT {} FROM {from}", items.join(", ")))
            }
            Plan::WithColumn {
                input,
                name,
                expr: value,
            } => {
                let schema = input.schema()?;
                let value = format!("{} AS {}", expr(value)?, ident(name));
                let mut items: Vec<String> = Vec::with_capacity(schema.fields().len() + 1);
                let mut replaced = false;
                for field in schema.fields() {
                    if field.name() == name {
                        items.push(value.clone());
                        replaced = true;
                    } else {
                        items.push(ident(field.name()));
                    }
                }
                if !replaced {
                    items.push(value);
                }
                let from = self.subquery(input)?;
                Ok(format!("SELECT {} FROM {from}", items.join(", ")))
            }
            Plan::Rename { input, from, to } => {
                let schema = input.schema()?;
                let items: Vec<String> = schema
                    .fields()
                    .iter()
                    .map(|field| {
                        if field.name() == from {
                            format!("{} AS {}", ident(from), ident(to))
                        } else {
                            ident(field.name())
                        }
                    })
                    .collect();
                let source = self.subquery(input)?;
                Ok(format!("SELECT {} FROM {source}", items.join(", ")))
            }
            Plan::Distinct { input } => {
                let from = self.subquery(input)?;
                Ok(format!("SELECT DISTINCT * FROM {from}"))
            }
            Plan::Sort { input, keys } => {
                if keys.is_empty() {
                    return self.plan(input);
                }
                let keys: Vec<String> = keys
                    .iter()
                    .map(|k| {
                        if k.descending {
                            format!("{} DESC NULLS LAST", ident(&k.column))
                        } else {
                            format!("{} ASC NULLS FIRST", ident(&k.column))
                        }
                    })
                    .collect();
                let from = self.subquery(input)?;
                Ok(format!("SELECT * FROM {from} ORDER BY {}", keys.join(", ")))
            }
            Plan::Join {
                left,
                right,
                on,
                join_type,
            } => {
                let left_sql = self.plan(left)?;
                let right_sql = self.plan(right)?;
                let l = self.alias("l");
                let r = self.alias("r");
                let condition: Vec<String> = on
                    .iter()
                    .map(|(a, b)| format!("{l}.{} = {r}.{}", ident(a), ident(b)))
                    .collect();
                let kind = match join_type {
                    JoinType::Inner => "INNER JOIN",
                    JoinType::Left => "LEFT JOIN",
                };
                Ok(format!(
                    "SELECT {l}.*, {r}.* FROM ({left_sql}) AS {l} {kind} ({right_sql}) AS {r} ON {}",
                    condition.join(" AND ")
                ))
            }
        }
    }
}

fn scan(source: &Source) -> Result<String> {
    let columns = source
        .schema
        .fields()
        .iter()
        .map(|f| Ok(format!("{}: {}", literal(f.name()), literal(sql_type(f.data_type())?))))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "SELECT * FROM read_json({}, format = 'auto', columns = {{{}}})",
        literal(&source.url()),
        columns.join(", ")
    ))
}

fn values(batch: &RecordBatch) -> Result<String> {
    let schema = batch.schema_ref();
    if schema.fields().is_empty() {
        return Err(Error::plan("inline values without columns"));
    }

    if batch.num_rows() == 0 {
        let items = schema
            .fields()
            .iter()
            .map(|f| {
                Ok(format!(
                    "CAST(NULL AS {}) AS {}",
                    sql_type(f.data_type())?,
                    ident(f.name())
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        return Ok(format!("SELECT {} WHERE false", items.join(", ")));
    }

    let mut rows = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let cells = batch
            .columns()
            .iter()
            .map(|column| value(column.as_ref(), row))
            .collect::<Result<Vec<_>>>()?;
        rows.push(format!("({})", cells.join(", ")));
    }
    let names: Vec<String> = schema.fields().iter().map(|f| ident(f.name())).collect();
    Ok(format!(
        "SELECT * FROM (VALUES {}) AS v({})",
        rows.join(", "),
        names.join(", ")
    ))
}

/// One typed cell of an inline batch
fn value(array: &dyn Array, row: usize) -> Result<String> {
    let ty = sql_type(array.data_type())?;
    if array.is_null(row) {
        return Ok(format!("CAST(NULL AS {ty})"));
    }
    let text = match array.data_type() {
        DataType::Utf8 => literal(array.as_string::<i32>().value(row)),
        DataType::Int64 => array.as_primitive::<Int64Type>().value(row).to_string(),
        DataType::Int32 => array.as_primitive::<Int32Type>().value(row).to_string(),
        DataType::Float64 => literal(&array.as_primitive::<Float64Type>().value(row).to_string()),
        DataType::Boolean => array.as_boolean().value(row).to_string(),
        DataType::Timestamp(TimeUnit::Microsecond, None) => {
            let micros = array.as_primitive::<TimestampMicrosecondType>().value(row);
            let dt = DateTime::from_timestamp_micros(micros)
                .ok_or_else(|| Error::plan(format!("timestamp {micros} out of range")))?;
            literal(&dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string())
        }
        other => return Err(Error::plan(format!("unsupported type {other} in inline values"))),
    };
    Ok(format!("CAST({text} AS {ty})"))
}

fn sql_type(data_type: &DataType) -> Result<&'static str> {
    match data_type {
        DataType::Utf8 => Ok("VARCHAR"),
        DataType::Int64 => Ok("BIGINT"),
        DataType::Int32 => Ok("INTEGER"),
        DataType::Float64 => Ok("DOUBLE"),
        DataType::Boolean => Ok("BOOLEAN"),
        DataType::Timestamp(TimeUnit::Microsecond, None) => Ok("TIMESTAMP"),
        other => Err(Error::plan(format!("type {other} has no SQL mapping"))),
    }
}

fn expr(e: &Expr) -> Result<String> {
    Ok(match e {
        Expr::Column(name) => ident(name),
        Expr::Literal(value) => scalar(value),
        Expr::Binary { left, op, right } => {
            format!("({} {op} {})", expr(left)?, expr(right)?)
        }
        Expr::Concat(args) => {
            if args.is_empty() {
                return Ok("''".to_string());
            }
            let parts = args
                .iter()
                .map(|a| Ok(format!("CAST({} AS VARCHAR)", expr(a)?)))
                .collect::<Result<Vec<_>>>()?;
            format!("({})", parts.join(" || "))
        }
        Expr::FromEpochMillis(inner) => format!(
            "date_trunc('second', epoch_ms(CAST({} AS BIGINT)))",
            expr(inner)?
        ),
        Expr::DateFormat {
            expr: inner,
            format,
        } => format!("strftime({}, {})", expr(inner)?, literal(format)),
        Expr::ToTimestamp {
            expr: inner,
            format,
        } => format!("try_strptime({}, {})", expr(inner)?, literal(format)),
        Expr::DatePart { part, expr: inner } => match part {
            // DuckDB counts Sunday as 0
            DatePart::Weekday => format!("CAST(dayofweek({}) + 1 AS INTEGER)", expr(inner)?),
            other => format!(
                "CAST({}({}) AS INTEGER)",
                other.function_name(),
                expr(inner)?
            ),
        },
        Expr::Alias { expr: inner, .. } => expr(inner)?,
    })
}

fn scalar(value: &ScalarValue) -> String {
    match value {
        ScalarValue::Null => "NULL".to_string(),
        ScalarValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        ScalarValue::Int64(v) => format!("CAST({v} AS BIGINT)"),
        ScalarValue::Float64(v) => format!("CAST({} AS DOUBLE)", literal(&v.to_string())),
        ScalarValue::Utf8(s) => literal(s),
    }
}
