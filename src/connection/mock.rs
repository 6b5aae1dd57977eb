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

//! In-memory connection provider for testing.
//!
//! Each executed statement consumes the next scripted [`MockResponse`]; once
//! the script runs out, statements succeed with no rows. A [`MockProbe`]
//! keeps observing the provider after it has been moved into a handler.

use super::{ConnectionInfo, ConnectionProvider, Cursor};
use crate::error::{DriverError, Error, Result};
use crate::models::Row;
use crate::result::ColumnDescriptor;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Scripted outcome of one executed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    Rows {
        columns: Option<Vec<ColumnDescriptor>>,
        rows: Vec<Row>,
    },
    Error(DriverError),
}

impl MockResponse {
    /// Rows described by the given column names.
    pub fn rows(columns: &[&str], rows: Vec<Row>) -> Self {
        Self::Rows {
            columns: Some(
                columns
                    .iter()
                    .map(|name| ColumnDescriptor::new(*name, "string"))
                    .collect(),
            ),
            rows,
        }
    }

    /// Rows without a column description.
    pub fn undescribed(rows: Vec<Row>) -> Self {
        Self::Rows {
            columns: None,
            rows,
        }
    }

    pub fn empty() -> Self {
        Self::Rows {
            columns: Some(Vec::new()),
            rows: Vec::new(),
        }
    }

    pub fn error(error: DriverError) -> Self {
        Self::Error(error)
    }
}

#[derive(Debug, Default)]
struct MockLog {
    executed: Vec<String>,
    connect_calls: usize,
    disconnect_calls: usize,
    fetch_calls: usize,
    release_calls: usize,
}

/// Read-only view of what a [`MockConnection`] has been asked to do.
#[derive(Debug, Clone)]
pub struct MockProbe {
    log: Arc<Mutex<MockLog>>,
}

impl MockProbe {
    fn log(&self) -> MutexGuard<'_, MockLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Statements passed to `execute`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.log().executed.clone()
    }

    pub fn connect_calls(&self) -> usize {
        self.log().connect_calls
    }

    pub fn disconnect_calls(&self) -> usize {
        self.log().disconnect_calls
    }

    pub fn fetch_calls(&self) -> usize {
        self.log().fetch_calls
    }

    pub fn release_calls(&self) -> usize {
        self.log().release_calls
    }
}

#[derive(Debug)]
struct MockCursor {
    script: VecDeque<MockResponse>,
    current: Option<(Option<Vec<ColumnDescriptor>>, Vec<Row>)>,
    log: Arc<Mutex<MockLog>>,
}

impl MockCursor {
    fn log(&self) -> MutexGuard<'_, MockLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Cursor for MockCursor {
    fn execute(&mut self, sql: &str) -> std::result::Result<(), DriverError> {
        self.log().executed.push(sql.to_string());
        match self.script.pop_front().unwrap_or_else(MockResponse::empty) {
            MockResponse::Rows { columns, rows } => {
                self.current = Some((columns, rows));
                Ok(())
            }
            MockResponse::Error(e) => {
                self.current = None;
                Err(e)
            }
        }
    }

    fn fetch_all(&mut self) -> std::result::Result<Vec<Row>, DriverError> {
        self.log().fetch_calls += 1;
        self.current
            .as_mut()
            .map(|(_, rows)| std::mem::take(rows))
            .ok_or_else(|| DriverError::other("No statement has been executed"))
    }

    fn description(&self) -> Option<Vec<ColumnDescriptor>> {
        self.current.as_ref().and_then(|(columns, _)| columns.clone())
    }
}

/// A scripted, in-memory [`ConnectionProvider`].
#[derive(Debug)]
pub struct MockConnection {
    cursor: MockCursor,
    connected: bool,
    cursor_available: bool,
    connect_error: Option<String>,
    info: ConnectionInfo,
    log: Arc<Mutex<MockLog>>,
}

impl MockConnection {
    pub fn new() -> Self {
        let log = Arc::new(Mutex::new(MockLog::default()));
        Self {
            cursor: MockCursor {
                script: VecDeque::new(),
                current: None,
                log: Arc::clone(&log),
            },
            connected: false,
            cursor_available: true,
            connect_error: None,
            info: ConnectionInfo::new("mock.databricks.com", "/sql/1.0/warehouses/mock"),
            log,
        }
    }

    /// Appends one response to the script.
    pub fn with_response(mut self, response: MockResponse) -> Self {
        self.cursor.script.push_back(response);
        self
    }

    pub fn with_responses(mut self, responses: impl IntoIterator<Item = MockResponse>) -> Self {
        self.cursor.script.extend(responses);
        self
    }

    /// Makes every `connect` fail with the given message.
    pub fn with_connect_error(mut self, message: impl Into<String>) -> Self {
        self.connect_error = Some(message.into());
        self
    }

    /// Connects normally but never hands out a cursor.
    pub fn without_cursor(mut self) -> Self {
        self.cursor_available = false;
        self
    }

    pub fn probe(&self) -> MockProbe {
        MockProbe {
            log: Arc::clone(&self.log),
        }
    }

    fn log(&self) -> MutexGuard<'_, MockLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionProvider for MockConnection {
    fn connect(&mut self) -> Result<bool> {
        self.log().connect_calls += 1;
        if self.connected {
            self.info.update_activity();
            return Ok(true);
        }
        if let Some(message) = &self.connect_error {
            return Err(Error::connection(format!(
                "Failed to connect to Databricks: {message}"
            )));
        }
        debug!("Mock connection opened");
        self.connected = true;
        self.info.mark_connected();
        Ok(true)
    }

    fn disconnect(&mut self) {
        self.log().disconnect_calls += 1;
        self.connected = false;
        self.cursor.current = None;
        self.info.mark_disconnected();
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn ensure_cursor(&mut self) -> Result<()> {
        if !self.connected {
            self.connect()?;
        }
        self.info.update_activity();
        Ok(())
    }

    fn cursor(&mut self) -> Option<&mut dyn Cursor> {
        if self.connected && self.cursor_available {
            Some(&mut self.cursor as &mut dyn Cursor)
        } else {
            None
        }
    }

    fn release_cursor(&mut self) {
        self.log().release_calls += 1;
        self.info.update_activity();
    }

    fn connection_info(&self) -> ConnectionInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scripted_responses_in_order() {
        let mut mock = MockConnection::new()
            .with_response(MockResponse::rows(&["id"], vec![vec![Value::Int(1)]]))
            .with_response(MockResponse::error(DriverError::database("missing")));
        mock.connect().unwrap();

        let cursor = mock.cursor().unwrap();
        cursor.execute("SELECT id FROM t").unwrap();
        assert_eq!(cursor.fetch_all().unwrap(), vec![vec![Value::Int(1)]]);
        assert_eq!(cursor.description().unwrap()[0].name, "id");

        let err = cursor.execute("SELECT * FROM missing").unwrap_err();
        assert_eq!(err.message, "missing");

        cursor.execute("SELECT 1").unwrap();
        assert!(cursor.fetch_all().unwrap().is_empty());
    }

    #[test]
    fn test_fetch_before_execute() {
        let mut mock = MockConnection::new();
        mock.connect().unwrap();
        assert!(mock.cursor().unwrap().fetch_all().is_err());
    }

    #[test]
    fn test_probe_tracks_lifecycle() {
        let mut mock = MockConnection::new();
        let probe = mock.probe();

        mock.ensure_cursor().unwrap();
        assert!(mock.is_connected());
        mock.disconnect();
        assert!(!mock.is_connected());
        assert!(!mock.connection_info().is_connected);

        assert_eq!(probe.connect_calls(), 1);
        assert_eq!(probe.disconnect_calls(), 1);
    }

    #[test]
    fn test_connect_error() {
        let mut mock = MockConnection::new().with_connect_error("Connection failed");
        let err = mock.connect().unwrap_err();
        assert!(err.to_string().contains("Failed to connect to Databricks"));
        assert!(err.to_string().contains("Connection failed"));
        assert!(!mock.is_connected());
    }

    #[test]
    fn test_refresh_reconnects() {
        let mut mock = MockConnection::new();
        let probe = mock.probe();
        mock.connect().unwrap();

        mock.refresh().unwrap();
        assert!(mock.is_connected());
        assert_eq!(probe.disconnect_calls(), 1);
        assert_eq!(probe.connect_calls(), 2);
    }
}
