//! Arrow kernels behind the in-process engine
//!
//! Each plan node maps onto one function here that takes fully materialized
//! input batches. Expression evaluation follows SQL null semantics: any null
//! input to a comparison, concatenation or date function yields null.

use crate::error::{Error, Result};
use crate::plan::{DatePart, Expr, JoinType, Operator, ScalarValue, SortKey};
use arrow::array::{
    new_null_array, Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int32Array, Int64Array,
    StringArray, StringBuilder, TimestampMicrosecondArray, UInt32Array,
};
use arrow::compute::kernels::cmp;
use arrow::compute::{
    and_kleene, cast, filter_record_batch, lexsort_to_indices, take, take_record_batch,
    SortColumn, SortOptions,
};
use arrow::datatypes::{DataType, Int64Type, SchemaRef, TimestampMicrosecondType};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::row::{Row, RowConverter, SortField};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// ============================================================================
// Expressions
// ============================================================================

/// Evaluate an expression against every row of a batch
pub fn evaluate(expr: &Expr, batch: &RecordBatch) -> Result<ArrayRef> {
    let rows = batch.num_rows();
    match expr {
        Expr::Column(name) => batch.column_by_name(name).cloned().ok_or_else(|| {
            Error::column_not_found(
                name,
                batch.schema_ref().fields().iter().map(|f| f.name().as_str()),
            )
        }),
        Expr::Literal(value) => Ok(literal_array(value, rows)),
        Expr::Binary { left, op, right } => {
            let l = evaluate(left, batch)?;
            let r = evaluate(right, batch)?;
            match op {
                Operator::Eq => {
                    if l.data_type() == &DataType::Null || r.data_type() == &DataType::Null {
                        return Ok(new_null_array(&DataType::Boolean, rows));
                    }
                    Ok(Arc::new(cmp::eq(&l, &r)?))
                }
                Operator::And => {
                    let l = boolean(&l, left)?;
                    let r = boolean(&r, right)?;
                    Ok(Arc::new(and_kleene(l, r)?))
                }
            }
        }
        Expr::Concat(args) => {
            let parts = args
                .iter()
                .map(|arg| Ok(cast(&evaluate(arg, batch)?, &DataType::Utf8)?))
                .collect::<Result<Vec<ArrayRef>>>()?;
            let parts: Vec<&StringArray> = parts.iter().map(|p| p.as_string::<i32>()).collect();

            let mut builder = StringBuilder::with_capacity(rows, rows * 16);
            'rows: for row in 0..rows {
                let mut value = String::new();
                for part in &parts {
                    if part.is_null(row) {
                        builder.append_null();
                        continue 'rows;
                    }
                    value.push_str(part.value(row));
                }
                builder.append_value(value);
            }
            Ok(Arc::new(builder.finish()))
        }
        Expr::FromEpochMillis(inner) => {
            let array = cast(&evaluate(inner, batch)?, &DataType::Int64)?;
            let micros: TimestampMicrosecondArray = array
                .as_primitive::<Int64Type>()
                .unary_opt(|ms| ms.div_euclid(1000).checked_mul(1_000_000));
            Ok(Arc::new(micros))
        }
        Expr::DateFormat {
            expr: inner,
            format,
        } => {
            check_format(format)?;
            let array = evaluate(inner, batch)?;
            let formatted: StringArray = timestamps(&array, inner)?
                .iter()
                .map(|v| {
                    v.and_then(to_naive)
                        .map(|dt| dt.format(format).to_string())
                })
                .collect();
            Ok(Arc::new(formatted))
        }
        Expr::ToTimestamp {
            expr: inner,
            format,
        } => {
            check_format(format)?;
            let array = evaluate(inner, batch)?;
            let text = array.as_string_opt::<i32>().ok_or_else(|| {
                Error::plan(format!("to_timestamp expects text, got {}", array.data_type()))
            })?;
            let parsed: TimestampMicrosecondArray = text
                .iter()
                .map(|v| {
                    v.and_then(|s| NaiveDateTime::parse_from_str(s, format).ok())
                        .map(|dt| dt.and_utc().timestamp_micros())
                })
                .collect();
            Ok(Arc::new(parsed))
        }
        Expr::DatePart { part, expr: inner } => {
            let array = evaluate(inner, batch)?;
            let values: Int32Array = timestamps(&array, inner)?
                .iter()
                .map(|v| v.and_then(to_naive).map(|dt| date_part(*part, &dt)))
                .collect();
            Ok(Arc::new(values))
        }
        Expr::Alias { expr: inner, .. } => evaluate(inner, batch),
    }
}

fn literal_array(value: &ScalarValue, rows: usize) -> ArrayRef {
    match value {
        ScalarValue::Null => new_null_array(&DataType::Null, rows),
        ScalarValue::Boolean(b) => Arc::new(BooleanArray::from(vec![*b; rows])),
        ScalarValue::Int64(v) => Arc::new(Int64Array::from_value(*v, rows)),
        ScalarValue::Float64(v) => Arc::new(Float64Array::from_value(*v, rows)),
        ScalarValue::Utf8(s) => Arc::new(StringArray::from_iter_values(
            std::iter::repeat(s.as_str()).take(rows),
        )),
    }
}

fn boolean<'a>(array: &'a ArrayRef, expr: &Expr) -> Result<&'a BooleanArray> {
    array
        .as_boolean_opt()
        .ok_or_else(|| Error::plan(format!("'{expr}' is {}, not boolean", array.data_type())))
}

fn timestamps<'a>(array: &'a ArrayRef, expr: &Expr) -> Result<&'a TimestampMicrosecondArray> {
    array
        .as_primitive_opt::<TimestampMicrosecondType>()
        .ok_or_else(|| Error::plan(format!("'{expr}' is {}, not a timestamp", array.data_type())))
}

/// Reject formats chrono would fail on while rendering
fn check_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::plan(format!("invalid date format '{format}'")));
    }
    Ok(())
}

fn to_naive(micros: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}

fn date_part(part: DatePart, dt: &NaiveDateTime) -> i32 {
    match part {
        DatePart::Hour => dt.hour() as i32,
        DatePart::Day => dt.day() as i32,
        DatePart::Month => dt.month() as i32,
        DatePart::Year => dt.year(),
        DatePart::Weekday => dt.weekday().number_from_sunday() as i32,
    }
}

// ============================================================================
// Relational Operators
// ============================================================================

/// Assemble output columns under a resolved schema
fn assemble(schema: SchemaRef, columns: Vec<ArrayRef>, rows: usize) -> Result<RecordBatch> {
    let options = RecordBatchOptions::new().with_row_count(Some(rows));
    Ok(RecordBatch::try_new_with_options(schema, columns, &options)?)
}

/// Keep rows where the predicate is true
pub fn filter(batch: &RecordBatch, predicate: &Expr) -> Result<RecordBatch> {
    let mask = evaluate(predicate, batch)?;
    let mask = boolean(&mask, predicate)?;
    Ok(filter_record_batch(batch, mask)?)
}

/// Evaluate a projection list
pub fn project(batch: &RecordBatch, exprs: &[Expr], schema: SchemaRef) -> Result<RecordBatch> {
    let columns = exprs
        .iter()
        .map(|expr| evaluate(expr, batch))
        .collect::<Result<Vec<_>>>()?;
    assemble(schema, columns, batch.num_rows())
}

/// Append a column, or replace the one with the same name
pub fn with_column(
    batch: &RecordBatch,
    name: &str,
    expr: &Expr,
    schema: SchemaRef,
) -> Result<RecordBatch> {
    let value = evaluate(expr, batch)?;
    let mut columns = batch.columns().to_vec();
    match batch.schema_ref().index_of(name) {
        Ok(index) => columns[index] = value,
        Err(_) => columns.push(value),
    }
    assemble(schema, columns, batch.num_rows())
}

/// Relabel columns without touching data
pub fn rename(batch: &RecordBatch, schema: SchemaRef) -> Result<RecordBatch> {
    assemble(schema, batch.columns().to_vec(), batch.num_rows())
}

/// Remove duplicate rows, keeping the first occurrence of each
pub fn distinct(batch: &RecordBatch) -> Result<RecordBatch> {
    if batch.num_columns() == 0 {
        return Ok(batch.slice(0, batch.num_rows().min(1)));
    }

    let converter = RowConverter::new(
        batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| SortField::new(f.data_type().clone()))
            .collect(),
    )?;
    let rows = converter.convert_columns(batch.columns())?;

    let mut seen: HashSet<Row<'_>> = HashSet::with_capacity(rows.num_rows());
    let keep: Vec<u32> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| seen.insert(*row))
        .map(|(i, _)| i as u32)
        .collect();

    if keep.len() == batch.num_rows() {
        return Ok(batch.clone());
    }
    Ok(take_record_batch(batch, &UInt32Array::from(keep))?)
}

/// Order rows; ascending keys put nulls first
pub fn sort(batch: &RecordBatch, keys: &[SortKey]) -> Result<RecordBatch> {
    if keys.is_empty() || batch.num_rows() < 2 {
        return Ok(batch.clone());
    }

    let columns = keys
        .iter()
        .map(|key| {
            let values = evaluate(&Expr::Column(key.column.clone()), batch)?;
            Ok(SortColumn {
                values,
                options: Some(SortOptions {
                    descending: key.descending,
                    nulls_first: !key.descending,
                }),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let indices = lexsort_to_indices(&columns, None)?;
    Ok(take_record_batch(batch, &indices)?)
}

/// Hash equi-join
///
/// Output rows follow left order; each left row is followed by its matches
/// in right order. Null keys never match.
pub fn join(
    left: &RecordBatch,
    right: &RecordBatch,
    on: &[(String, String)],
    join_type: JoinType,
    schema: SchemaRef,
) -> Result<RecordBatch> {
    let left_keys = on
        .iter()
        .map(|(l, _)| evaluate(&Expr::Column(l.clone()), left))
        .collect::<Result<Vec<_>>>()?;
    let right_keys = on
        .iter()
        .map(|(_, r)| evaluate(&Expr::Column(r.clone()), right))
        .collect::<Result<Vec<_>>>()?;

    // One converter for both sides so encoded rows compare equal
    let converter = RowConverter::new(
        right_keys
            .iter()
            .map(|k| SortField::new(k.data_type().clone()))
            .collect(),
    )?;
    let right_rows = converter.convert_columns(&right_keys)?;
    let left_rows = converter.convert_columns(&left_keys)?;

    let mut table: HashMap<Row<'_>, Vec<u32>> = HashMap::new();
    for (i, row) in right_rows.iter().enumerate() {
        if !has_null(&right_keys, i) {
            table.entry(row).or_default().push(i as u32);
        }
    }

    let mut left_indices: Vec<u32> = Vec::with_capacity(left.num_rows());
    let mut right_indices: Vec<Option<u32>> = Vec::with_capacity(left.num_rows());
    for (i, row) in left_rows.iter().enumerate() {
        let matches = if has_null(&left_keys, i) {
            None
        } else {
            table.get(&row)
        };
        match matches {
            Some(matches) => {
                for &j in matches {
                    left_indices.push(i as u32);
                    right_indices.push(Some(j));
                }
            }
            None if join_type == JoinType::Left => {
                left_indices.push(i as u32);
                right_indices.push(None);
            }
            None => {}
        }
    }

    let rows = left_indices.len();
    let left_indices = UInt32Array::from(left_indices);
    let right_indices = UInt32Array::from(right_indices);

    let mut columns = Vec::with_capacity(left.num_columns() + right.num_columns());
    for column in left.columns() {
        columns.push(take(column.as_ref(), &left_indices, None)?);
    }
    for column in right.columns() {
        columns.push(take(column.as_ref(), &right_indices, None)?);
    }
    assemble(schema, columns, rows)
}

fn has_null(keys: &[ArrayRef], row: usize) -> bool {
    keys.iter().any(|k| k.is_null(row))
}
