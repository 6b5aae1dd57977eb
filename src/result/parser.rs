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

//! Conversion of fetched rows into records.

use super::ColumnDescriptor;
use crate::error::{Error, Result};
use crate::models::{Fields, GenericRecord, ModelClass, Record, Row};
use tracing::debug;

/// Turns raw rows into records.
pub trait ResultParser {
    /// Converts one named row into a record.
    fn parse_row(&self, fields: Fields) -> Result<Record>;

    /// Converts every row, in order.
    ///
    /// Any error from [`ResultParser::parse_row`] aborts the whole parse.
    fn parse_results(
        &self,
        rows: &[Row],
        columns: Option<&[ColumnDescriptor]>,
    ) -> Result<Vec<Record>> {
        rows.iter()
            .map(|row| self.parse_row(Fields::from_row(row, columns)))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| Error::data_parsing(format!("Failed to parse query results: {e}")))
    }
}

/// Parses rows into one model, falling back to [`GenericRecord`] for rows
/// the model rejects.
#[derive(Debug, Clone, Copy)]
pub struct ModelResultParser {
    model: ModelClass,
}

impl ModelResultParser {
    pub fn new(model: ModelClass) -> Self {
        Self { model }
    }

    pub fn model(&self) -> ModelClass {
        self.model
    }
}

impl ResultParser for ModelResultParser {
    fn parse_row(&self, fields: Fields) -> Result<Record> {
        match self.model.construct(&fields) {
            Ok(record) => Ok(record),
            Err(e) => {
                debug!(
                    "Row does not fit {}, using generic record: {}",
                    self.model.name(),
                    e
                );
                Ok(Record::Generic(GenericRecord::new(fields)))
            }
        }
    }
}
