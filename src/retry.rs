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

//! Retry with exponential backoff.

use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Blocks the caller for the given duration between attempts.
pub type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

/// Runs an operation up to `max_retries + 1` times.
///
/// The delay before retry `i` (0-based) is `base_delay * 2^i`. Errors that
/// are not [retryable](Error::is_retryable) are returned after the first
/// attempt.
#[derive(Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    sleeper: Sleeper,
}

impl RetryPolicy {
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Self::DEFAULT_BASE_DELAY,
            sleeper: Arc::new(std::thread::sleep),
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Replaces the blocking sleep, e.g. to record delays in tests.
    pub fn with_sleeper(mut self, sleeper: Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// The same policy with a different attempt bound.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay slept after the failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    pub fn execute_with_retry<T, F>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match operation() {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    if attempt < self.max_retries {
                        let delay = self.delay_for(attempt);
                        warn!(
                            "Attempt {} failed, retrying in {:?}: {}",
                            attempt + 1,
                            delay,
                            e
                        );
                        (self.sleeper)(delay);
                    } else {
                        error!("All {} attempts failed: {}", attempt + 1, e);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::query_execution("Operation failed after all retry attempts")))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn recording_policy(max_retries: u32) -> (RetryPolicy, Arc<Mutex<Vec<Duration>>>) {
        let sleeps = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&sleeps);
        let policy = RetryPolicy::new(max_retries)
            .with_sleeper(Arc::new(move |d| recorded.lock().unwrap().push(d)));
        (policy, sleeps)
    }

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.base_delay(), Duration::from_secs(1));

        let policy = RetryPolicy::new(5).with_base_delay(Duration::from_secs(2));
        assert_eq!(policy.max_retries(), 5);
        assert_eq!(policy.base_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_success_runs_once() {
        let (policy, sleeps) = recording_policy(3);
        let mut calls = 0;

        let result = policy.execute_with_retry(|| {
            calls += 1;
            Ok("success")
        });

        assert_eq!(result, Ok("success"));
        assert_eq!(calls, 1);
        assert!(sleeps.lock().unwrap().is_empty());
    }

    #[test]
    fn test_succeeds_after_one_retry() {
        let (policy, sleeps) = recording_policy(2);
        let mut calls = 0;

        let result = policy.execute_with_retry(|| {
            calls += 1;
            if calls == 1 {
                Err(Error::query_execution("error"))
            } else {
                Ok("success")
            }
        });

        assert_eq!(result, Ok("success"));
        assert_eq!(calls, 2);
        assert_eq!(*sleeps.lock().unwrap(), vec![Duration::from_secs(1)]);
    }

    #[test]
    fn test_exponential_backoff() {
        let (policy, sleeps) = recording_policy(3);
        let mut outcomes = vec![
            Err(Error::query_execution("error1")),
            Err(Error::timeout("error2")),
            Err(Error::query_execution("error3")),
            Ok("success"),
        ]
        .into_iter();

        let result = policy.execute_with_retry(|| outcomes.next().unwrap());

        assert_eq!(result, Ok("success"));
        assert_eq!(
            *sleeps.lock().unwrap(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[test]
    fn test_syntax_error_is_not_retried() {
        let (policy, sleeps) = recording_policy(3);
        let mut calls = 0;

        let result: Result<()> = policy.execute_with_retry(|| {
            calls += 1;
            Err(Error::syntax("syntax error"))
        });

        assert_eq!(result, Err(Error::syntax("syntax error")));
        assert_eq!(calls, 1);
        assert!(sleeps.lock().unwrap().is_empty());
    }

    #[test]
    fn test_exhaustion_returns_last_error() {
        let (policy, sleeps) = recording_policy(2);
        let mut calls = 0;

        let result: Result<()> = policy.execute_with_retry(|| {
            calls += 1;
            Err(Error::query_execution(format!("persistent error {calls}")))
        });

        assert_eq!(result, Err(Error::query_execution("persistent error 3")));
        assert_eq!(calls, 3);
        assert_eq!(sleeps.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_zero_retries_is_single_attempt() {
        let (policy, sleeps) = recording_policy(0);
        let mut calls = 0;

        let result: Result<()> = policy.execute_with_retry(|| {
            calls += 1;
            Err(Error::connection("down"))
        });

        assert!(result.is_err());
        assert_eq!(calls, 1);
        assert!(sleeps.lock().unwrap().is_empty());
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::new(3).with_base_delay(Duration::from_millis(500));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(64), Duration::MAX);
    }
}
