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

//! Built-in fixed-schema models.

use super::{FieldError, Fields, FromFields, Value};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Typed, validating access to a row mapping on behalf of one model.
///
/// Each accessor takes the field name followed by the column spellings to
/// look it up under. Null cells count as absent.
pub struct FieldReader<'a> {
    model: &'static str,
    fields: &'a Fields,
}

impl<'a> FieldReader<'a> {
    pub fn new(model: &'static str, fields: &'a Fields) -> Self {
        Self { model, fields }
    }

    fn convert<T>(
        &self,
        field: &'static str,
        columns: &[&str],
        expected: &'static str,
        convert: impl Fn(&Value) -> Option<T>,
    ) -> Result<Option<T>, FieldError> {
        match self.fields.first_present(columns) {
            None => Ok(None),
            Some(value) => convert(value).map(Some).ok_or(FieldError::WrongType {
                model: self.model,
                field,
                expected,
                actual: value.type_name(),
            }),
        }
    }

    fn require<T>(&self, field: &'static str, value: Option<T>) -> Result<T, FieldError> {
        value.ok_or(FieldError::Missing {
            model: self.model,
            field,
        })
    }

    pub fn optional_string(
        &self,
        field: &'static str,
        columns: &[&str],
    ) -> Result<Option<String>, FieldError> {
        self.convert(field, columns, "string", |v| v.as_str().map(str::to_string))
    }

    pub fn string(&self, field: &'static str, columns: &[&str]) -> Result<String, FieldError> {
        let value = self.optional_string(field, columns)?;
        self.require(field, value)
    }

    pub fn optional_i64(
        &self,
        field: &'static str,
        columns: &[&str],
    ) -> Result<Option<i64>, FieldError> {
        self.convert(field, columns, "int", Value::to_i64)
    }

    pub fn i64(&self, field: &'static str, columns: &[&str]) -> Result<i64, FieldError> {
        let value = self.optional_i64(field, columns)?;
        self.require(field, value)
    }

    pub fn optional_f64(
        &self,
        field: &'static str,
        columns: &[&str],
    ) -> Result<Option<f64>, FieldError> {
        self.convert(field, columns, "float", Value::to_f64)
    }

    pub fn f64(&self, field: &'static str, columns: &[&str]) -> Result<f64, FieldError> {
        let value = self.optional_f64(field, columns)?;
        self.require(field, value)
    }

    pub fn optional_bool(
        &self,
        field: &'static str,
        columns: &[&str],
    ) -> Result<Option<bool>, FieldError> {
        self.convert(field, columns, "bool", Value::to_bool)
    }

    pub fn optional_timestamp(
        &self,
        field: &'static str,
        columns: &[&str],
    ) -> Result<Option<NaiveDateTime>, FieldError> {
        self.convert(field, columns, "timestamp", Value::to_timestamp)
    }

    pub fn timestamp(
        &self,
        field: &'static str,
        columns: &[&str],
    ) -> Result<NaiveDateTime, FieldError> {
        let value = self.optional_timestamp(field, columns)?;
        self.require(field, value)
    }

    pub fn invalid(&self, field: &'static str, message: impl Into<String>) -> FieldError {
        FieldError::Invalid {
            model: self.model,
            field,
            message: message.into(),
        }
    }
}

/// One entry of a `LIST '<path>'` result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub path: String,
    pub name: String,
    pub size: Option<i64>,
    pub modification_time: Option<NaiveDateTime>,
    pub is_directory: bool,
}

impl FileInfo {
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("path", self.path.as_str());
        fields.insert("name", self.name.as_str());
        fields.insert("size", self.size);
        fields.insert("modification_time", self.modification_time);
        fields.insert("is_directory", self.is_directory);
        fields
    }
}

impl FromFields for FileInfo {
    const MODEL_NAME: &'static str = "FileInfo";

    fn from_fields(fields: &Fields) -> Result<Self, FieldError> {
        let reader = FieldReader::new(Self::MODEL_NAME, fields);

        let path = reader.string("path", &["path"])?.trim().to_string();
        if path.is_empty() {
            return Err(reader.invalid("path", "Path cannot be empty"));
        }

        Ok(Self {
            path,
            name: reader.string("name", &["name"])?,
            size: reader.optional_i64("size", &["size"])?,
            modification_time: reader.optional_timestamp(
                "modification_time",
                &["modification_time", "modificationTime"],
            )?,
            is_directory: reader
                .optional_bool("is_directory", &["is_directory", "isDirectory"])?
                .unwrap_or(false),
        })
    }
}

/// One entry of a `SHOW TABLES` result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableInfo {
    pub database: String,
    pub table_name: String,
    pub is_temporary: bool,
    pub table_type: Option<String>,
}

impl TableInfo {
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("database", self.database.as_str());
        fields.insert("table_name", self.table_name.as_str());
        fields.insert("is_temporary", self.is_temporary);
        fields.insert("table_type", self.table_type.clone());
        fields
    }
}

impl FromFields for TableInfo {
    const MODEL_NAME: &'static str = "TableInfo";

    fn from_fields(fields: &Fields) -> Result<Self, FieldError> {
        let reader = FieldReader::new(Self::MODEL_NAME, fields);

        // The warehouse reports camelCase column names for SHOW TABLES.
        Ok(Self {
            database: reader
                .string("database", &["database", "namespace"])?
                .trim()
                .to_string(),
            table_name: reader
                .string("table_name", &["table_name", "tableName"])?
                .trim()
                .to_string(),
            is_temporary: reader
                .optional_bool("is_temporary", &["is_temporary", "isTemporary"])?
                .unwrap_or(false),
            table_type: reader.optional_string("table_type", &["table_type", "tableType"])?,
        })
    }
}

/// A business entity record with loosely populated columns.
///
/// Every field is optional and unknown columns are kept in `extra`, but a
/// row that shares no column with the model is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NexsysRecord {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub created_date: Option<NaiveDateTime>,
    pub status: Option<String>,
    pub amount: Option<f64>,
    pub extra: Fields,
}

impl NexsysRecord {
    const COLUMNS: [&'static str; 5] = ["id", "name", "created_date", "status", "amount"];

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("id", self.id);
        fields.insert("name", self.name.clone());
        fields.insert("created_date", self.created_date);
        fields.insert("status", self.status.clone());
        fields.insert("amount", self.amount);
        for (k, v) in self.extra.iter() {
            fields.insert(k, v.clone());
        }
        fields
    }
}

impl FromFields for NexsysRecord {
    const MODEL_NAME: &'static str = "NexsysRecord";

    fn from_fields(fields: &Fields) -> Result<Self, FieldError> {
        if !Self::COLUMNS.iter().any(|c| fields.contains_key(c)) {
            return Err(FieldError::NoMatchingColumns {
                model: Self::MODEL_NAME,
            });
        }

        let reader = FieldReader::new(Self::MODEL_NAME, fields);
        let extra = fields
            .iter()
            .filter(|(k, _)| !Self::COLUMNS.iter().any(|c| c == k))
            .map(|(k, v)| (k, v.clone()))
            .collect();

        Ok(Self {
            id: reader.optional_i64("id", &["id"])?,
            name: reader.optional_string("name", &["name"])?,
            created_date: reader.optional_timestamp("created_date", &["created_date"])?,
            status: reader.optional_string("status", &["status"])?,
            amount: reader.optional_f64("amount", &["amount"])?,
            extra,
        })
    }
}

/// A sales transaction line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    pub transaction_id: String,
    pub customer_id: Option<String>,
    pub product_id: Option<String>,
    pub quantity: i64,
    pub unit_price: f64,
    /// Defaults to `quantity * unit_price` when the row has no total.
    pub total_amount: f64,
    pub transaction_date: NaiveDateTime,
}

impl SalesRecord {
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("transaction_id", self.transaction_id.as_str());
        fields.insert("customer_id", self.customer_id.clone());
        fields.insert("product_id", self.product_id.clone());
        fields.insert("quantity", self.quantity);
        fields.insert("unit_price", self.unit_price);
        fields.insert("total_amount", self.total_amount);
        fields.insert("transaction_date", self.transaction_date);
        fields
    }
}

impl FromFields for SalesRecord {
    const MODEL_NAME: &'static str = "SalesRecord";

    fn from_fields(fields: &Fields) -> Result<Self, FieldError> {
        let reader = FieldReader::new(Self::MODEL_NAME, fields);

        let quantity = reader.i64("quantity", &["quantity"])?;
        if quantity < 0 {
            return Err(reader.invalid("quantity", "Quantity must be non-negative"));
        }
        let unit_price = reader.f64("unit_price", &["unit_price"])?;
        if unit_price < 0.0 {
            return Err(reader.invalid("unit_price", "Price must be non-negative"));
        }
        let total_amount = reader
            .optional_f64("total_amount", &["total_amount"])?
            .unwrap_or(quantity as f64 * unit_price);

        Ok(Self {
            transaction_id: reader.string("transaction_id", &["transaction_id"])?,
            customer_id: reader.optional_string("customer_id", &["customer_id"])?,
            product_id: reader.optional_string("product_id", &["product_id"])?,
            quantity,
            unit_price,
            total_amount,
            transaction_date: reader.timestamp("transaction_date", &["transaction_date"])?,
        })
    }
}
