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

//! Query timing and aggregate metrics.

use crate::result::{QueryResult, QueryStatus};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Running totals over every query a handler has executed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryMetrics {
    pub total_queries: u64,
    pub successful_queries: u64,
    pub failed_queries: u64,
    /// Sum of execution times, in seconds.
    pub total_execution_time: f64,
    /// `None` until the first query is recorded.
    pub average_execution_time: Option<f64>,
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one result into the totals.
    ///
    /// Any status other than success counts as a failure. A result without an
    /// execution time contributes zero seconds.
    pub fn add_query_result(&mut self, result: &QueryResult) {
        self.total_queries += 1;
        match result.status {
            QueryStatus::Success => self.successful_queries += 1,
            _ => self.failed_queries += 1,
        }
        self.total_execution_time += result.execution_time_seconds.unwrap_or(0.0);
        self.average_execution_time = Some(self.total_execution_time / self.total_queries as f64);
    }

    /// Fraction of recorded queries that succeeded.
    pub fn success_rate(&self) -> Option<f64> {
        if self.total_queries == 0 {
            return None;
        }
        Some(self.successful_queries as f64 / self.total_queries as f64)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A timer for measuring operation durations.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Starts a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Returns the elapsed duration since the timer was started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::thread::sleep;

    fn result(status: QueryStatus, time: Option<f64>) -> QueryResult {
        let mut result = QueryResult::failure(status, "SELECT 1", "");
        result.status = status;
        result.execution_time_seconds = time;
        result
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = QueryMetrics::new();
        assert_eq!(metrics.total_queries, 0);
        assert_eq!(metrics.average_execution_time, None);
        assert_eq!(metrics.success_rate(), None);
    }

    #[test]
    fn test_add_query_results() {
        let mut metrics = QueryMetrics::new();
        metrics.add_query_result(&result(QueryStatus::Success, Some(2.0)));
        metrics.add_query_result(&result(QueryStatus::Failed, Some(3.0)));

        assert_eq!(
            metrics,
            QueryMetrics {
                total_queries: 2,
                successful_queries: 1,
                failed_queries: 1,
                total_execution_time: 5.0,
                average_execution_time: Some(2.5),
            }
        );
    }

    #[test]
    fn test_timeout_and_syntax_count_as_failed() {
        let mut metrics = QueryMetrics::new();
        metrics.add_query_result(&result(QueryStatus::Timeout, None));
        metrics.add_query_result(&result(QueryStatus::SyntaxError, Some(1.0)));

        assert_eq!(metrics.failed_queries, 2);
        assert_eq!(metrics.total_execution_time, 1.0);
        assert_eq!(metrics.average_execution_time, Some(0.5));
    }

    #[test]
    fn test_reset() {
        let mut metrics = QueryMetrics::new();
        metrics.add_query_result(&result(QueryStatus::Success, Some(1.0)));
        metrics.reset();
        assert_eq!(metrics, QueryMetrics::default());
    }

    #[test]
    fn test_timer() {
        let timer = Timer::start();
        sleep(Duration::from_millis(10));
        assert!(timer.elapsed() >= Duration::from_millis(10));
        assert!(timer.elapsed_secs() >= 0.01);
    }
}
