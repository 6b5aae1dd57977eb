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

//! Single-attempt query execution.
//!
//! The executor runs one statement on a borrowed cursor, classifies driver
//! failures into [`Error`] kinds and optionally parses the fetched rows. It
//! never retries and never touches shared metrics.

use crate::connection::{ConnectionProvider, ScopedCursor};
use crate::error::{DriverError, DriverErrorKind, Error, Result};
use crate::models::ModelClass;
use crate::result::{ModelResultParser, QueryResult, ResultParser};
use crate::telemetry::Timer;
use tracing::{debug, error, info};

const SYNTAX_SQLSTATE: &str = "42601";
const SYNTAX_MARKERS: [&str; 2] = ["parse_syntax_error", "syntax error"];

/// Maps a driver failure onto the handler's error taxonomy.
///
/// Structured information (kind and SQLSTATE) is consulted first. Message
/// text is only used for syntax markers and for timeouts the driver did not
/// flag as such, since upstream wording is not stable.
pub fn classify_driver_error(err: DriverError) -> Error {
    let lowered = err.message.to_lowercase();
    let is_syntax = err.sqlstate.as_deref() == Some(SYNTAX_SQLSTATE)
        || SYNTAX_MARKERS.iter().any(|m| lowered.contains(m));

    if is_syntax {
        return Error::syntax(format!("SQL syntax error: {}", err.message));
    }

    match err.kind {
        DriverErrorKind::ServerOperation => {
            Error::query_execution(format!("Server operation error: {}", err.message))
        }
        DriverErrorKind::Database => {
            Error::query_execution(format!("Database error: {}", err.message))
        }
        DriverErrorKind::Timeout => Error::timeout(format!("Query timeout: {}", err.message)),
        DriverErrorKind::Other if lowered.contains("timeout") => {
            Error::timeout(format!("Query timeout: {}", err.message))
        }
        DriverErrorKind::Other => {
            Error::query_execution(format!("Unexpected error: {}", err.message))
        }
    }
}

/// Runs statements against a [`ConnectionProvider`].
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryExecutor;

impl QueryExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Executes `sql`, parsing fetched rows into `model` when one is given.
    pub fn execute_query(
        &self,
        provider: &mut dyn ConnectionProvider,
        sql: &str,
        model: Option<ModelClass>,
        fetch: bool,
    ) -> Result<QueryResult> {
        let parser = model.map(ModelResultParser::new);
        self.execute_with_parser(
            provider,
            sql,
            parser.as_ref().map(|p| p as &dyn ResultParser),
            fetch,
        )
    }

    /// Executes `sql` and runs fetched rows through `parser`.
    ///
    /// With `fetch == false` no rows are retrieved and the result has a
    /// row count of zero.
    pub fn execute_with_parser(
        &self,
        provider: &mut dyn ConnectionProvider,
        sql: &str,
        parser: Option<&dyn ResultParser>,
        fetch: bool,
    ) -> Result<QueryResult> {
        let timer = Timer::start();
        debug!("Executing query: {}", sql);

        let outcome = run(provider, sql, parser, fetch);
        let elapsed = timer.elapsed_secs();

        match outcome {
            Ok((raw_data, data)) => {
                let result = QueryResult::success(sql, raw_data, data, elapsed);
                info!(
                    "Query completed in {:.3}s, {} rows",
                    elapsed, result.row_count
                );
                Ok(result)
            }
            Err(e) => {
                error!("Query failed after {:.3}s: {}", elapsed, e);
                Err(e)
            }
        }
    }
}

type Fetched = (
    Option<Vec<crate::models::Row>>,
    Option<Vec<crate::models::Record>>,
);

fn run(
    provider: &mut dyn ConnectionProvider,
    sql: &str,
    parser: Option<&dyn ResultParser>,
    fetch: bool,
) -> Result<Fetched> {
    let mut scope = ScopedCursor::acquire(provider)?;
    let cursor = scope.cursor()?;

    cursor.execute(sql).map_err(classify_driver_error)?;
    if !fetch {
        return Ok((None, None));
    }

    let rows = cursor.fetch_all().map_err(classify_driver_error)?;
    let columns = cursor.description();
    let data = parser
        .map(|p| p.parse_results(&rows, columns.as_deref()))
        .transpose()?;

    Ok((Some(rows), data))
}
