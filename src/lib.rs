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

//! Databricks SQL query handler for Rust
//!
//! This crate runs SQL against a Databricks SQL warehouse and turns the rows
//! into typed records.
//!
//! ## Overview
//!
//! - [`QueryHandler`] - Entry point: connection lifecycle, retries, metrics
//! - [`QueryExecutor`] - Single-attempt execution and error classification
//! - [`RetryPolicy`] - Exponential backoff that never retries syntax errors
//! - [`ModelRegistry`] - Model lookup by tag, falling back to generic records
//! - [`ConnectionManager`] - Connection provider over any `adbc_core::Driver`
//! - [`OAuthManager`] - Client-credentials bearer tokens
//!
//! ## Example
//!
//! ```ignore
//! use dbxsql::{OAuthManager, QueryHandler, Settings};
//! use std::sync::Arc;
//!
//! let settings = Settings::from_env()?;
//! settings.configure_logging();
//! let tokens = Arc::new(OAuthManager::new(&settings, endpoint));
//! let mut handler = QueryHandler::with_driver(settings, driver, tokens);
//!
//! let result = handler.execute_query_with_retry("SELECT * FROM sales", None, None)?;
//! println!("{} rows in {:?}s", result.row_count, result.execution_time_seconds);
//! ```

pub mod auth;
pub mod connection;
pub mod error;
pub mod executor;
pub mod handler;
pub mod logging;
pub mod models;
pub mod result;
pub mod retry;
pub mod settings;
pub mod telemetry;

pub use auth::{OAuthManager, PersonalAccessToken, TokenProvider};
pub use connection::{ConnectionInfo, ConnectionManager, ConnectionProvider, MockConnection};
pub use error::{DriverError, DriverErrorKind, Error, Result};
pub use executor::{classify_driver_error, QueryExecutor};
pub use handler::{QueryHandler, Session};
pub use models::{
    get_model_class, list_available_models, register_model, GenericRecord, ModelClass,
    ModelRegistry, Record, Value,
};
pub use result::{ColumnDescriptor, QueryResult, QueryStatus};
pub use retry::RetryPolicy;
pub use settings::Settings;
pub use telemetry::QueryMetrics;
