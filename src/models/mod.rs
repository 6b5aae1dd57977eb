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

//! Record models built from result rows.
//!
//! A [`Record`] is either one of the fixed-schema models ([`FileInfo`],
//! [`TableInfo`], [`NexsysRecord`], [`SalesRecord`], or a caller-defined
//! [`CustomModel`]) or the schema-less [`GenericRecord`]. Models are
//! constructed through a [`ModelClass`], which returns a `Result` so that
//! callers can branch to the generic fallback explicitly.

mod builtin;
mod fields;
mod registry;
mod value;

pub use builtin::{FieldReader, FileInfo, NexsysRecord, SalesRecord, TableInfo};
pub use fields::Fields;
pub use registry::{
    get_model_class, list_available_models, register_model, ModelRegistry, RegistrySnapshot,
};
pub use value::{Row, Value};

use serde::{Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Why a row could not be turned into a fixed-schema model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("{model}: field '{field}' is required")]
    Missing {
        model: &'static str,
        field: &'static str,
    },

    #[error("{model}: field '{field}' expected {expected}, got {actual}")]
    WrongType {
        model: &'static str,
        field: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{model}: field '{field}': {message}")]
    Invalid {
        model: &'static str,
        field: &'static str,
        message: String,
    },

    #[error("{model}: no result column matches the model")]
    NoMatchingColumns { model: &'static str },
}

/// A model that can be constructed from a row mapping.
pub trait FromFields: Sized {
    /// Name reported by [`ModelClass::name`] and [`Record::model_name`].
    const MODEL_NAME: &'static str;

    fn from_fields(fields: &Fields) -> Result<Self, FieldError>;
}

/// A caller-defined fixed-schema model carried by [`Record::Custom`].
pub trait CustomModel: fmt::Debug + Send + Sync + 'static {
    fn model_name(&self) -> &'static str;

    fn to_fields(&self) -> Fields;

    fn as_any(&self) -> &dyn Any;
}

/// Constructor stored in the model registry.
pub type ModelConstructor = fn(&Fields) -> Result<Record, FieldError>;

/// A named record constructor: the unit the registry hands out.
#[derive(Clone, Copy)]
pub struct ModelClass {
    name: &'static str,
    construct: ModelConstructor,
}

impl ModelClass {
    pub const fn new(name: &'static str, construct: ModelConstructor) -> Self {
        Self { name, construct }
    }

    /// The class for a [`FromFields`] model.
    pub fn of<T: FromFields + Into<Record>>() -> Self {
        Self::new(T::MODEL_NAME, construct_model::<T>)
    }

    /// The class for [`GenericRecord`], used when no model matches.
    pub fn generic() -> Self {
        Self::of::<GenericRecord>()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_generic(&self) -> bool {
        self.name == GenericRecord::MODEL_NAME
    }

    pub fn construct(&self, fields: &Fields) -> Result<Record, FieldError> {
        (self.construct)(fields)
    }
}

fn construct_model<T: FromFields + Into<Record>>(fields: &Fields) -> Result<Record, FieldError> {
    T::from_fields(fields).map(Into::into)
}

impl fmt::Debug for ModelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModelClass").field(&self.name).finish()
    }
}

impl PartialEq for ModelClass {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ModelClass {}

/// A schema-less record backed by an ordered column mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GenericRecord {
    pub data: Fields,
}

impl GenericRecord {
    pub fn new(data: Fields) -> Self {
        Self { data }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns the value for `key`, or `default` when the column is absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.data.get_or(key, default)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key, value);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.data.values()
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter()
    }
}

impl FromFields for GenericRecord {
    const MODEL_NAME: &'static str = "GenericRecord";

    fn from_fields(fields: &Fields) -> Result<Self, FieldError> {
        Ok(Self::new(fields.clone()))
    }
}

/// One parsed result row.
#[derive(Debug, Clone)]
pub enum Record {
    FileInfo(FileInfo),
    TableInfo(TableInfo),
    Nexsys(NexsysRecord),
    Sales(SalesRecord),
    Generic(GenericRecord),
    Custom(Arc<dyn CustomModel>),
}

impl Record {
    pub fn model_name(&self) -> &'static str {
        match self {
            Record::FileInfo(_) => FileInfo::MODEL_NAME,
            Record::TableInfo(_) => TableInfo::MODEL_NAME,
            Record::Nexsys(_) => NexsysRecord::MODEL_NAME,
            Record::Sales(_) => SalesRecord::MODEL_NAME,
            Record::Generic(_) => GenericRecord::MODEL_NAME,
            Record::Custom(model) => model.model_name(),
        }
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, Record::Generic(_))
    }

    pub fn as_generic(&self) -> Option<&GenericRecord> {
        match self {
            Record::Generic(record) => Some(record),
            _ => None,
        }
    }

    /// Downcasts a [`Record::Custom`] to its concrete model.
    pub fn downcast_ref<T: CustomModel>(&self) -> Option<&T> {
        match self {
            Record::Custom(model) => model.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Returns the record as a column mapping, whatever its model.
    pub fn to_fields(&self) -> Fields {
        match self {
            Record::FileInfo(r) => r.to_fields(),
            Record::TableInfo(r) => r.to_fields(),
            Record::Nexsys(r) => r.to_fields(),
            Record::Sales(r) => r.to_fields(),
            Record::Generic(r) => r.data.clone(),
            Record::Custom(model) => model.to_fields(),
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.model_name() == other.model_name() && self.to_fields() == other.to_fields()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_fields().serialize(serializer)
    }
}

impl From<GenericRecord> for Record {
    fn from(record: GenericRecord) -> Self {
        Record::Generic(record)
    }
}

impl From<FileInfo> for Record {
    fn from(record: FileInfo) -> Self {
        Record::FileInfo(record)
    }
}

impl From<TableInfo> for Record {
    fn from(record: TableInfo) -> Self {
        Record::TableInfo(record)
    }
}

impl From<NexsysRecord> for Record {
    fn from(record: NexsysRecord) -> Self {
        Record::Nexsys(record)
    }
}

impl From<SalesRecord> for Record {
    fn from(record: SalesRecord) -> Self {
        Record::Sales(record)
    }
}
