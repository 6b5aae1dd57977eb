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

//! Top-level query handler.
//!
//! [`QueryHandler`] composes the executor, retry policy and metrics over a
//! single connection. It is the entry point most callers need.
//!
//! ## Example
//!
//! ```ignore
//! use dbxsql::{QueryHandler, Settings};
//!
//! let settings = Settings::from_env()?;
//! let mut handler = QueryHandler::with_driver(settings, driver, token_provider);
//! let mut session = handler.session()?;
//! let result = session.query_with_model("SELECT * FROM sales", "sales")?;
//! ```

use crate::auth::TokenProvider;
use crate::connection::{ConnectionInfo, ConnectionManager, ConnectionProvider};
use crate::error::Result;
use crate::executor::QueryExecutor;
use crate::models::{ModelClass, ModelRegistry};
use crate::result::{QueryResult, QueryStatus};
use crate::retry::RetryPolicy;
use crate::settings::Settings;
use crate::telemetry::{QueryMetrics, Timer};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Executes queries over one connection and keeps running metrics.
pub struct QueryHandler {
    settings: Settings,
    provider: Box<dyn ConnectionProvider>,
    executor: QueryExecutor,
    registry: ModelRegistry,
    retry: RetryPolicy,
    metrics: QueryMetrics,
}

impl QueryHandler {
    /// Creates a handler over an existing connection provider.
    ///
    /// The model registry is a snapshot of the process-wide one.
    pub fn new(settings: Settings, provider: Box<dyn ConnectionProvider>) -> Self {
        let retry = RetryPolicy::new(settings.max_retries);
        Self {
            settings,
            provider,
            executor: QueryExecutor::new(),
            registry: ModelRegistry::from_global(),
            retry,
            metrics: QueryMetrics::new(),
        }
    }

    /// Creates a handler that connects through an ADBC driver.
    pub fn with_driver<D>(
        settings: Settings,
        driver: D,
        token_provider: Arc<dyn TokenProvider>,
    ) -> Self
    where
        D: adbc_core::Driver + 'static,
    {
        let manager = ConnectionManager::new(driver, settings.clone(), token_provider);
        Self::new(settings, Box::new(manager))
    }

    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn connect(&mut self) -> Result<bool> {
        self.provider.connect()
    }

    pub fn disconnect(&mut self) {
        self.provider.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.provider.is_connected()
    }

    pub fn test_connection(&mut self) -> bool {
        self.provider.test_connection()
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        self.provider.connection_info()
    }

    /// Connects and returns a guard that disconnects when dropped.
    pub fn session(&mut self) -> Result<Session<'_>> {
        self.connect()?;
        Ok(Session { handler: self })
    }

    /// Runs `sql` once, fetching all rows.
    ///
    /// The outcome is recorded in the metrics whether or not it succeeds.
    pub fn execute_query(&mut self, sql: &str, model: Option<ModelClass>) -> Result<QueryResult> {
        self.run_recorded(sql, model, true)
    }

    /// Runs a statement that produces no rows, such as DDL or DML.
    pub fn execute_statement(&mut self, sql: &str) -> Result<QueryResult> {
        self.run_recorded(sql, None, false)
    }

    /// Runs `sql` with retries, using `max_retries` or the configured bound.
    ///
    /// Metrics see one entry per call, not one per attempt.
    pub fn execute_query_with_retry(
        &mut self,
        sql: &str,
        model: Option<ModelClass>,
        max_retries: Option<u32>,
    ) -> Result<QueryResult> {
        let policy = match max_retries {
            Some(n) => self.retry.clone().with_max_retries(n),
            None => self.retry.clone(),
        };
        let executor = self.executor;
        let provider = self.provider.as_mut();
        let timer = Timer::start();

        let outcome =
            policy.execute_with_retry(|| executor.execute_query(&mut *provider, sql, model, true));
        self.record(sql, &outcome, &timer);
        outcome
    }

    /// Runs each statement in order; a failure becomes a failed result and
    /// does not stop the batch.
    ///
    /// `models[i]` applies to `sqls[i]`; missing entries mean no model.
    pub fn execute_multiple_queries(
        &mut self,
        sqls: &[&str],
        models: Option<&[Option<ModelClass>]>,
    ) -> Vec<QueryResult> {
        let mut results = Vec::with_capacity(sqls.len());
        for (i, sql) in sqls.iter().enumerate() {
            let model = models.and_then(|m| m.get(i).copied().flatten());
            match self.execute_query(sql, model) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Query {} of {} failed: {}", i + 1, sqls.len(), e);
                    results.push(QueryResult::failure(
                        QueryStatus::Failed,
                        *sql,
                        e.to_string(),
                    ));
                }
            }
        }
        results
    }

    /// Lists files at a volume or DBFS path.
    pub fn list_files(&mut self, path: &str) -> Result<QueryResult> {
        let model = self.registry.get("file_info");
        let sql = format!("LIST '{}'", path.replace('\'', "''"));
        self.execute_query(&sql, Some(model))
    }

    pub fn show_tables(&mut self, database: Option<&str>) -> Result<QueryResult> {
        let sql = match database {
            Some(db) => format!("SHOW TABLES IN {db}"),
            None => "SHOW TABLES".to_string(),
        };
        let model = self.registry.get("table_info");
        self.execute_query(&sql, Some(model))
    }

    pub fn describe_table(&mut self, table: &str, database: Option<&str>) -> Result<QueryResult> {
        let sql = match database {
            Some(db) => format!("DESCRIBE {db}.{table}"),
            None => format!("DESCRIBE {table}"),
        };
        let model = self.registry.get("generic");
        self.execute_query(&sql, Some(model))
    }

    /// Runs `sql` and parses rows with the model registered under `tag`.
    pub fn query_with_model(&mut self, sql: &str, tag: &str) -> Result<QueryResult> {
        let model = self.registry.get(tag);
        debug!("Using model {} for tag '{}'", model.name(), tag);
        self.execute_query(sql, Some(model))
    }

    /// A copy of the current metrics.
    pub fn get_metrics(&self) -> QueryMetrics {
        self.metrics.clone()
    }

    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    fn run_recorded(
        &mut self,
        sql: &str,
        model: Option<ModelClass>,
        fetch: bool,
    ) -> Result<QueryResult> {
        let timer = Timer::start();
        let outcome = self
            .executor
            .execute_query(self.provider.as_mut(), sql, model, fetch);
        self.record(sql, &outcome, &timer);
        outcome
    }

    fn record(&mut self, sql: &str, outcome: &Result<QueryResult>, timer: &Timer) {
        match outcome {
            Ok(result) => self.metrics.add_query_result(result),
            Err(e) => {
                let failed = QueryResult::failure(e.status(), sql, e.to_string())
                    .with_execution_time(timer.elapsed_secs());
                self.metrics.add_query_result(&failed);
            }
        }
    }
}

impl fmt::Debug for QueryHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryHandler")
            .field("settings", &self.settings)
            .field("connection", &self.provider.connection_info())
            .field("retry", &self.retry)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

/// A connected handler that disconnects when dropped.
pub struct Session<'a> {
    handler: &'a mut QueryHandler,
}

impl Deref for Session<'_> {
    type Target = QueryHandler;

    fn deref(&self) -> &QueryHandler {
        self.handler
    }
}

impl DerefMut for Session<'_> {
    fn deref_mut(&mut self) -> &mut QueryHandler {
        self.handler
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.handler.disconnect();
        info!("Session closed");
    }
}
