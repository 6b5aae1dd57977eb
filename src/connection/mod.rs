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

//! Connection and cursor management.
//!
//! A [`ConnectionProvider`] owns one logical connection and its cursor.
//! Callers borrow the cursor through a [`ScopedCursor`], which hands it back
//! on every exit path.

pub mod cursor;
pub mod manager;
pub mod mock;

pub use cursor::AdbcCursor;
pub use manager::ConnectionManager;
pub use mock::{MockConnection, MockProbe, MockResponse};

use crate::error::{DriverError, Error, Result};
use crate::models::Row;
use crate::result::ColumnDescriptor;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

/// Executes statements and yields their rows.
pub trait Cursor {
    fn execute(&mut self, sql: &str) -> std::result::Result<(), DriverError>;

    /// Returns every remaining row of the last executed statement.
    fn fetch_all(&mut self) -> std::result::Result<Vec<Row>, DriverError>;

    /// Columns of the last executed statement, when the driver reports them.
    fn description(&self) -> Option<Vec<ColumnDescriptor>>;
}

/// Connection state reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionInfo {
    pub server_hostname: String,
    pub http_path: String,
    pub is_connected: bool,
    pub connection_time: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl ConnectionInfo {
    pub fn new(server_hostname: impl Into<String>, http_path: impl Into<String>) -> Self {
        Self {
            server_hostname: server_hostname.into(),
            http_path: http_path.into(),
            is_connected: false,
            connection_time: None,
            last_activity: None,
        }
    }

    pub fn mark_connected(&mut self) {
        let now = Utc::now();
        self.is_connected = true;
        self.connection_time = Some(now);
        self.last_activity = Some(now);
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Some(Utc::now());
    }

    pub fn mark_disconnected(&mut self) {
        self.is_connected = false;
        self.connection_time = None;
    }
}

/// Owner of the warehouse connection and its cursor.
pub trait ConnectionProvider {
    /// Opens the connection. Returns `Ok(true)` when connected, including
    /// when it already was.
    fn connect(&mut self) -> Result<bool>;

    /// Closes the connection. Teardown failures are logged, not returned.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Reopens the connection.
    fn refresh(&mut self) -> Result<()> {
        self.disconnect();
        self.connect().map(|_| ())
    }

    /// Connects on demand so that [`ConnectionProvider::cursor`] can succeed.
    fn ensure_cursor(&mut self) -> Result<()>;

    fn cursor(&mut self) -> Option<&mut dyn Cursor>;

    /// Called when a borrowed cursor is handed back.
    fn release_cursor(&mut self);

    fn connection_info(&self) -> ConnectionInfo;

    /// Runs `SELECT 1` and reports whether it succeeded.
    fn test_connection(&mut self) -> bool {
        if let Err(e) = self.ensure_cursor() {
            warn!("Connection test failed: {}", e);
            return false;
        }

        let outcome = match self.cursor() {
            Some(cursor) => cursor
                .execute("SELECT 1")
                .and_then(|_| cursor.fetch_all())
                .map_err(|e| e.to_string()),
            None => Err("no cursor".to_string()),
        };
        self.release_cursor();

        match outcome {
            Ok(_) => true,
            Err(e) => {
                warn!("Connection test failed: {}", e);
                false
            }
        }
    }
}

/// A cursor borrowed from a provider, released on drop.
pub struct ScopedCursor<'a> {
    provider: &'a mut dyn ConnectionProvider,
}

impl<'a> ScopedCursor<'a> {
    pub fn acquire(provider: &'a mut dyn ConnectionProvider) -> Result<Self> {
        provider.ensure_cursor()?;
        Ok(Self { provider })
    }

    pub fn cursor(&mut self) -> Result<&mut dyn Cursor> {
        self.provider
            .cursor()
            .ok_or_else(|| Error::connection("Failed to get database cursor"))
    }
}

impl Drop for ScopedCursor<'_> {
    fn drop(&mut self) {
        self.provider.release_cursor();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_info_lifecycle() {
        let mut info = ConnectionInfo::new("test.databricks.com", "/sql/1.0/warehouses/test");
        assert!(!info.is_connected);
        assert!(info.connection_time.is_none());
        assert!(info.last_activity.is_none());

        info.mark_connected();
        assert!(info.is_connected);
        assert!(info.connection_time.is_some());
        let first = info.last_activity;

        std::thread::sleep(std::time::Duration::from_millis(2));
        info.update_activity();
        assert!(info.last_activity > first);

        info.mark_disconnected();
        assert!(!info.is_connected);
        assert!(info.connection_time.is_none());
    }

    #[test]
    fn test_scoped_cursor_releases_on_drop() {
        let mut mock = MockConnection::new();
        let probe = mock.probe();
        {
            let mut scope = ScopedCursor::acquire(&mut mock).unwrap();
            scope.cursor().unwrap().execute("SELECT 1").unwrap();
        }
        assert_eq!(probe.release_calls(), 1);
        assert_eq!(probe.executed(), vec!["SELECT 1"]);
    }

    #[test]
    fn test_scoped_cursor_releases_on_error() {
        let mut mock = MockConnection::new().with_response(MockResponse::error(
            DriverError::database("boom"),
        ));
        let probe = mock.probe();

        let run = |provider: &mut dyn ConnectionProvider| -> Result<()> {
            let mut scope = ScopedCursor::acquire(provider)?;
            scope
                .cursor()?
                .execute("SELECT boom")
                .map_err(|e| Error::query_execution(e.message))
        };

        assert!(run(&mut mock).is_err());
        assert_eq!(probe.release_calls(), 1);
    }

    #[test]
    fn test_missing_cursor() {
        let mut mock = MockConnection::new().without_cursor();
        let mut scope = ScopedCursor::acquire(&mut mock).unwrap();
        let err = scope.cursor().err().unwrap();
        assert_eq!(err, Error::connection("Failed to get database cursor"));
    }

    #[test]
    fn test_connect_failure_skips_release() {
        let mut mock = MockConnection::new().with_connect_error("unreachable");
        let probe = mock.probe();

        assert!(ScopedCursor::acquire(&mut mock).is_err());
        assert_eq!(probe.release_calls(), 0);
    }

    #[test]
    fn test_default_test_connection() {
        let mut mock = MockConnection::new();
        assert!(mock.test_connection());

        let mut failing = MockConnection::new()
            .with_response(MockResponse::error(DriverError::server_operation("down")));
        assert!(!failing.test_connection());
    }
}
