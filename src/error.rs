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

//! Error types for the Databricks SQL handler.
//!
//! Every failure surfaced to callers is one of the [`Error`] kinds below.
//! Driver failures are first reported as [`DriverError`] at the cursor
//! boundary and classified into this taxonomy by the query executor.

use crate::result::QueryStatus;
use thiserror::Error;

/// The error type for query handler operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Token acquisition failed (HTTP status, network, malformed payload).
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The connection or cursor could not be acquired.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Generic or server-side execution failure.
    #[error("Query execution error: {0}")]
    QueryExecution(String),

    /// The statement was rejected for syntax reasons. Never retried.
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Execution exceeded its allotted time.
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Result parsing failed outside the per-row fallback path.
    #[error("Data parsing error: {0}")]
    DataParsing(String),

    /// Invalid or incomplete settings.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn query_execution(msg: impl Into<String>) -> Self {
        Self::QueryExecution(msg.into())
    }

    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn data_parsing(msg: impl Into<String>) -> Self {
        Self::DataParsing(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the query status this error maps to.
    pub fn status(&self) -> QueryStatus {
        match self {
            Self::Syntax(_) => QueryStatus::SyntaxError,
            Self::Timeout(_) => QueryStatus::Timeout,
            _ => QueryStatus::Failed,
        }
    }

    /// Returns whether another attempt could succeed.
    ///
    /// Syntax errors are permanent; everything else is treated as transient.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Syntax(_))
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "AuthenticationError",
            Self::Connection(_) => "ConnectionError",
            Self::QueryExecution(_) => "QueryExecutionError",
            Self::Syntax(_) => "SyntaxError",
            Self::Timeout(_) => "TimeoutError",
            Self::DataParsing(_) => "DataParsingError",
            Self::Config(_) => "ConfigError",
        }
    }
}

/// A convenient alias for Results with handler errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse failure kind reported by a cursor implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// The server accepted the request but the operation failed.
    ServerOperation,
    /// The driver or database rejected the statement.
    Database,
    /// The driver gave up waiting for the statement.
    Timeout,
    /// Anything the driver could not categorise.
    Other,
}

/// A failure raised by the cursor boundary, before classification.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct DriverError {
    pub kind: DriverErrorKind,
    pub message: String,
    /// Five-character SQLSTATE, when the driver reports one.
    pub sqlstate: Option<String>,
}

impl DriverError {
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            sqlstate: None,
        }
    }

    pub fn server_operation(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::ServerOperation, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Database, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Timeout, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Other, message)
    }

    pub fn with_sqlstate(mut self, sqlstate: impl Into<String>) -> Self {
        self.sqlstate = Some(sqlstate.into());
        self
    }
}

impl From<adbc_core::error::Error> for DriverError {
    fn from(err: adbc_core::error::Error) -> Self {
        use adbc_core::error::Status;

        let kind = match err.status {
            Status::Timeout => DriverErrorKind::Timeout,
            Status::IO | Status::Internal | Status::Unknown | Status::Cancelled => {
                DriverErrorKind::ServerOperation
            }
            Status::InvalidArguments
            | Status::InvalidData
            | Status::InvalidState
            | Status::NotFound
            | Status::AlreadyExists
            | Status::Integrity
            | Status::NotImplemented
            | Status::Unauthenticated
            | Status::Unauthorized => DriverErrorKind::Database,
            #[allow(unreachable_patterns)]
            _ => DriverErrorKind::Other,
        };

        // A zeroed SQLSTATE means the driver did not report one.
        let sqlstate: String = err
            .sqlstate
            .iter()
            .take_while(|c| **c != 0)
            .map(|c| *c as u8 as char)
            .collect();

        let mut driver_error = DriverError::new(kind, err.message);
        if sqlstate.len() == 5 {
            driver_error.sqlstate = Some(sqlstate);
        }
        driver_error
    }
}

impl From<arrow_schema::ArrowError> for DriverError {
    fn from(err: arrow_schema::ArrowError) -> Self {
        DriverError::other(format!("Arrow error: {err}"))
    }
}
