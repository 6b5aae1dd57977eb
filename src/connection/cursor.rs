// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cursor over an ADBC connection.
//!
//! Each `execute` runs a fresh ADBC statement and drains its record batch
//! stream. `fetch_all` then converts the buffered batches into rows of
//! [`Value`]s.

use super::Cursor;
use crate::error::DriverError;
use crate::models::{Row, Value};
use crate::result::ColumnDescriptor;
use adbc_core::{Connection, Statement};
use arrow_array::cast::AsArray;
use arrow_array::types::{
    Date32Type, Date64Type, Decimal128Type, Float16Type, Float32Type, Float64Type, Int16Type,
    Int32Type, Int64Type, Int8Type, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow_array::{Array, RecordBatch, RecordBatchReader};
use arrow_cast::display::{ArrayFormatter, FormatOptions};
use arrow_schema::{ArrowError, DataType, Schema, TimeUnit};
use std::fmt;
use tracing::debug;

/// A [`Cursor`] backed by an ADBC connection.
pub struct AdbcCursor<C: Connection> {
    connection: C,
    description: Option<Vec<ColumnDescriptor>>,
    batches: Option<Vec<RecordBatch>>,
}

impl<C: Connection> AdbcCursor<C> {
    pub fn new(connection: C) -> Self {
        Self {
            connection,
            description: None,
            batches: None,
        }
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn into_connection(self) -> C {
        self.connection
    }
}

impl<C: Connection> Cursor for AdbcCursor<C> {
    fn execute(&mut self, sql: &str) -> Result<(), DriverError> {
        self.description = None;
        self.batches = None;

        let mut statement = self.connection.new_statement()?;
        statement.set_sql_query(sql)?;
        let reader = statement.execute()?;
        let schema = reader.schema();
        let batches = reader.collect::<Result<Vec<_>, ArrowError>>()?;

        debug!(
            "Statement returned {} batches, {} columns",
            batches.len(),
            schema.fields().len()
        );
        self.description = Some(describe(&schema));
        self.batches = Some(batches);
        Ok(())
    }

    fn fetch_all(&mut self) -> Result<Vec<Row>, DriverError> {
        let batches = self
            .batches
            .take()
            .ok_or_else(|| DriverError::other("No statement has been executed"))?;
        Ok(batches_to_rows(&batches)?)
    }

    fn description(&self) -> Option<Vec<ColumnDescriptor>> {
        self.description.clone()
    }
}

impl<C: Connection> fmt::Debug for AdbcCursor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdbcCursor")
            .field("description", &self.description)
            .field("buffered_batches", &self.batches.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

fn describe(schema: &Schema) -> Vec<ColumnDescriptor> {
    schema
        .fields()
        .iter()
        .map(|field| ColumnDescriptor::new(field.name().as_str(), field.data_type().to_string()))
        .collect()
}

/// Converts record batches into rows, in batch order.
pub fn batches_to_rows(batches: &[RecordBatch]) -> Result<Vec<Row>, ArrowError> {
    let total = batches.iter().map(RecordBatch::num_rows).sum();
    let mut rows: Vec<Row> = Vec::with_capacity(total);

    for batch in batches {
        let columns = batch
            .columns()
            .iter()
            .map(|array| column_values(array.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let start = rows.len();
        rows.extend((0..batch.num_rows()).map(|_| Vec::with_capacity(columns.len())));
        for column in columns {
            for (row, value) in rows[start..].iter_mut().zip(column) {
                row.push(value);
            }
        }
    }

    Ok(rows)
}

fn collect(array: &dyn Array, value_at: impl Fn(usize) -> Value) -> Vec<Value> {
    (0..array.len())
        .map(|i| {
            if array.is_null(i) {
                Value::Null
            } else {
                value_at(i)
            }
        })
        .collect()
}

/// Converts one Arrow column into values.
///
/// Types without a native [`Value`] counterpart are rendered as strings.
pub fn column_values(array: &dyn Array) -> Result<Vec<Value>, ArrowError> {
    let values = match array.data_type() {
        DataType::Null => vec![Value::Null; array.len()],
        DataType::Boolean => {
            let a = array.as_boolean();
            collect(array, |i| Value::Bool(a.value(i)))
        }
        DataType::Int8 => {
            let a = array.as_primitive::<Int8Type>();
            collect(array, |i| Value::Int(i64::from(a.value(i))))
        }
        DataType::Int16 => {
            let a = array.as_primitive::<Int16Type>();
            collect(array, |i| Value::Int(i64::from(a.value(i))))
        }
        DataType::Int32 => {
            let a = array.as_primitive::<Int32Type>();
            collect(array, |i| Value::Int(i64::from(a.value(i))))
        }
        DataType::Int64 => {
            let a = array.as_primitive::<Int64Type>();
            collect(array, |i| Value::Int(a.value(i)))
        }
        DataType::UInt8 => {
            let a = array.as_primitive::<UInt8Type>();
            collect(array, |i| Value::Int(i64::from(a.value(i))))
        }
        DataType::UInt16 => {
            let a = array.as_primitive::<UInt16Type>();
            collect(array, |i| Value::Int(i64::from(a.value(i))))
        }
        DataType::UInt32 => {
            let a = array.as_primitive::<UInt32Type>();
            collect(array, |i| Value::Int(i64::from(a.value(i))))
        }
        DataType::UInt64 => {
            let a = array.as_primitive::<UInt64Type>();
            collect(array, |i| {
                let v = a.value(i);
                i64::try_from(v).map_or_else(|_| Value::String(v.to_string()), Value::Int)
            })
        }
        DataType::Float16 => {
            let a = array.as_primitive::<Float16Type>();
            collect(array, |i| Value::Float(a.value(i).to_f64()))
        }
        DataType::Float32 => {
            let a = array.as_primitive::<Float32Type>();
            collect(array, |i| Value::Float(f64::from(a.value(i))))
        }
        DataType::Float64 => {
            let a = array.as_primitive::<Float64Type>();
            collect(array, |i| Value::Float(a.value(i)))
        }
        DataType::Decimal128(_, _) => {
            let a = array.as_primitive::<Decimal128Type>();
            collect(array, |i| {
                let text = a.value_as_string(i);
                text.parse::<f64>()
                    .map_or_else(|_| Value::String(text.clone()), Value::Float)
            })
        }
        DataType::Utf8 => {
            let a = array.as_string::<i32>();
            collect(array, |i| Value::from(a.value(i)))
        }
        DataType::LargeUtf8 => {
            let a = array.as_string::<i64>();
            collect(array, |i| Value::from(a.value(i)))
        }
        DataType::Utf8View => {
            let a = array.as_string_view();
            collect(array, |i| Value::from(a.value(i)))
        }
        DataType::Binary => {
            let a = array.as_binary::<i32>();
            collect(array, |i| Value::Bytes(a.value(i).to_vec()))
        }
        DataType::LargeBinary => {
            let a = array.as_binary::<i64>();
            collect(array, |i| Value::Bytes(a.value(i).to_vec()))
        }
        DataType::Date32 => {
            let a = array.as_primitive::<Date32Type>();
            collect(array, |i| a.value_as_date(i).map_or(Value::Null, Value::Date))
        }
        DataType::Date64 => {
            let a = array.as_primitive::<Date64Type>();
            collect(array, |i| a.value_as_date(i).map_or(Value::Null, Value::Date))
        }
        DataType::Timestamp(unit, _) => match unit {
            TimeUnit::Second => {
                let a = array.as_primitive::<TimestampSecondType>();
                collect(array, |i| a.value_as_datetime(i).map_or(Value::Null, Value::Timestamp))
            }
            TimeUnit::Millisecond => {
                let a = array.as_primitive::<TimestampMillisecondType>();
                collect(array, |i| a.value_as_datetime(i).map_or(Value::Null, Value::Timestamp))
            }
            TimeUnit::Microsecond => {
                let a = array.as_primitive::<TimestampMicrosecondType>();
                collect(array, |i| a.value_as_datetime(i).map_or(Value::Null, Value::Timestamp))
            }
            TimeUnit::Nanosecond => {
                let a = array.as_primitive::<TimestampNanosecondType>();
                collect(array, |i| a.value_as_datetime(i).map_or(Value::Null, Value::Timestamp))
            }
        },
        _ => {
            let formatter = ArrayFormatter::try_new(array, &FormatOptions::default())?;
            collect(array, |i| Value::String(formatter.value(i).to_string()))
        }
    };
    Ok(values)
}
