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

//! Query results and their parsing into records.

pub mod parser;

pub use parser::{ModelResultParser, ResultParser};

use crate::models::{Record, Row};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single query execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Success,
    Failed,
    Timeout,
    SyntaxError,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Success => "success",
            QueryStatus::Failed => "failed",
            QueryStatus::Timeout => "timeout",
            QueryStatus::SyntaxError => "syntax_error",
        }
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and driver-reported type of one result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub type_name: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// The result of a query execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub status: QueryStatus,
    /// Parsed records, present when a model was requested.
    pub data: Option<Vec<Record>>,
    /// Rows as fetched from the cursor.
    pub raw_data: Option<Vec<Row>>,
    pub row_count: usize,
    pub execution_time_seconds: Option<f64>,
    pub error_message: Option<String>,
    pub query: Option<String>,
}

impl QueryResult {
    /// A successful result. `row_count` is the number of fetched rows.
    pub fn success(
        query: impl Into<String>,
        raw_data: Option<Vec<Row>>,
        data: Option<Vec<Record>>,
        execution_time_seconds: f64,
    ) -> Self {
        let row_count = raw_data.as_ref().map_or(0, Vec::len);
        Self {
            status: QueryStatus::Success,
            data,
            raw_data,
            row_count,
            execution_time_seconds: Some(execution_time_seconds),
            error_message: None,
            query: Some(query.into()),
        }
    }

    /// A result for a query that did not complete.
    pub fn failure(
        status: QueryStatus,
        query: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            data: None,
            raw_data: None,
            row_count: 0,
            execution_time_seconds: None,
            error_message: Some(error_message.into()),
            query: Some(query.into()),
        }
    }

    /// Sets the row count from a signed value; negatives clamp to zero.
    pub fn with_row_count(mut self, row_count: i64) -> Self {
        self.row_count = usize::try_from(row_count).unwrap_or(0);
        self
    }

    pub fn with_execution_time(mut self, seconds: f64) -> Self {
        self.execution_time_seconds = Some(seconds);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    /// Number of parsed records, zero when none were requested.
    pub fn record_count(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&QueryStatus::SyntaxError).unwrap(),
            r#""syntax_error""#
        );
        assert_eq!(QueryStatus::Success.to_string(), "success");
    }

    #[test]
    fn test_negative_row_count_clamps_to_zero() {
        let result = QueryResult::success("SELECT 1", None, None, 0.1).with_row_count(-5);
        assert_eq!(result.row_count, 0);

        let result = result.with_row_count(7);
        assert_eq!(result.row_count, 7);
    }

    #[test]
    fn test_success_counts_raw_rows() {
        let rows = vec![vec![Value::Int(1)], vec![Value::Int(2)]];
        let result = QueryResult::success("SELECT id FROM t", Some(rows), None, 0.5);

        assert!(result.is_success());
        assert_eq!(result.row_count, 2);
        assert_eq!(result.record_count(), 0);
        assert_eq!(result.query.as_deref(), Some("SELECT id FROM t"));
    }

    #[test]
    fn test_failure_carries_message() {
        let result = QueryResult::failure(QueryStatus::Failed, "INVALID", "Query failed");
        assert!(!result.is_success());
        assert_eq!(result.error_message.as_deref(), Some("Query failed"));
        assert_eq!(result.execution_time_seconds, None);
    }

    #[test]
    fn test_result_serializes() {
        let result = QueryResult::failure(QueryStatus::Timeout, "SELECT 1", "slow");
        let json: serde_json::Value = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "timeout");
        assert_eq!(json["row_count"], 0);
    }
}
