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

//! Workspace and handler settings.
//!
//! Settings are read from `DATABRICKS_`-prefixed variables. The prefix and
//! the variable names are matched case-insensitively, and unknown variables
//! are ignored:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABRICKS_CLIENT_ID` | required |
//! | `DATABRICKS_CLIENT_SECRET` | required |
//! | `DATABRICKS_SERVER_HOSTNAME` | required |
//! | `DATABRICKS_HTTP_PATH` | required |
//! | `DATABRICKS_LOG_LEVEL` | `INFO` |
//! | `DATABRICKS_MAX_RETRIES` | `3` |
//! | `DATABRICKS_QUERY_TIMEOUT` | `300` |
//! | `DATABRICKS_CONNECTION_TIMEOUT` | `30` |
//! | `DATABRICKS_OAUTH_SCOPE` | `all-apis` |
//! | `DATABRICKS_CATALOG` | unset |
//! | `DATABRICKS_SCHEMA` | unset |

use crate::error::{Error, Result};
use crate::logging;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

const ENV_PREFIX: &str = "databricks_";

#[derive(Clone, PartialEq)]
pub struct Settings {
    pub client_id: String,
    pub client_secret: String,
    pub server_hostname: String,
    pub http_path: String,
    pub log_level: String,
    pub max_retries: u32,
    /// Seconds. Informational only: it is validated and reported but never
    /// sent to the driver, whose own statement timeout applies.
    pub query_timeout: u64,
    /// Seconds.
    pub connection_timeout: u64,
    pub oauth_scope: String,
    pub catalog: Option<String>,
    pub schema: Option<String>,
}

impl Settings {
    pub const DEFAULT_LOG_LEVEL: &'static str = "INFO";
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const MAX_RETRIES_LIMIT: u32 = 10;
    pub const DEFAULT_QUERY_TIMEOUT: u64 = 300;
    pub const DEFAULT_CONNECTION_TIMEOUT: u64 = 30;
    pub const DEFAULT_OAUTH_SCOPE: &'static str = "all-apis";

    /// Settings with the required values and every default applied.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        server_hostname: impl Into<String>,
        http_path: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            server_hostname: server_hostname.into(),
            http_path: http_path.into(),
            log_level: Self::DEFAULT_LOG_LEVEL.to_string(),
            max_retries: Self::DEFAULT_MAX_RETRIES,
            query_timeout: Self::DEFAULT_QUERY_TIMEOUT,
            connection_timeout: Self::DEFAULT_CONNECTION_TIMEOUT,
            oauth_scope: Self::DEFAULT_OAUTH_SCOPE.to_string(),
            catalog: None,
            schema: None,
        }
    }

    /// Loads and validates settings from `(name, value)` pairs.
    ///
    /// Later pairs override earlier ones with the same name.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut values: HashMap<String, String> = HashMap::new();
        for (key, value) in vars {
            let key = key.as_ref().to_ascii_lowercase();
            if let Some(name) = key.strip_prefix(ENV_PREFIX) {
                values.insert(name.to_string(), value.into());
            }
        }

        let mut missing = Vec::new();
        let mut required = |name: &'static str| match values.get(name) {
            Some(v) if !v.trim().is_empty() => v.clone(),
            _ => {
                missing.push(name);
                String::new()
            }
        };
        let client_id = required("client_id");
        let client_secret = required("client_secret");
        let server_hostname = required("server_hostname");
        let http_path = required("http_path");
        if !missing.is_empty() {
            return Err(Error::config(format!(
                "Missing required settings: {}",
                missing.join(", ")
            )));
        }

        let mut settings = Self::new(client_id, client_secret, server_hostname, http_path);

        if let Some(level) = values.get("log_level") {
            settings.log_level = level.trim().to_ascii_uppercase();
        }
        if let Some(raw) = values.get("max_retries") {
            let retries = parse_int("max_retries", raw)?;
            settings.max_retries = u32::try_from(retries)
                .ok()
                .filter(|r| *r <= Self::MAX_RETRIES_LIMIT)
                .ok_or_else(max_retries_error)?;
        }
        if let Some(raw) = values.get("query_timeout") {
            settings.query_timeout = parse_timeout("query_timeout", raw)?;
        }
        if let Some(raw) = values.get("connection_timeout") {
            settings.connection_timeout = parse_timeout("connection_timeout", raw)?;
        }
        if let Some(scope) = values.get("oauth_scope") {
            settings.oauth_scope = scope.trim().to_string();
        }
        settings.catalog = non_empty(values.get("catalog"));
        settings.schema = non_empty(values.get("schema"));

        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(process_vars())
    }

    /// Loads settings from a `.env` file, with process variables taking
    /// precedence over the file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_vars = dotenvy::from_path_iter(path)
            .map_err(|e| Error::config(format!("Failed to read {}: {e}", path.display())))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;

        Self::from_vars(file_vars.into_iter().chain(process_vars()))
    }

    pub fn validate(&self) -> Result<()> {
        let level = self.log_level.to_ascii_uppercase();
        if !logging::LOG_LEVELS.contains(&level.as_str()) {
            return Err(Error::config(format!(
                "Log level must be one of {}",
                logging::LOG_LEVELS.join(", ")
            )));
        }
        if self.max_retries > Self::MAX_RETRIES_LIMIT {
            return Err(max_retries_error());
        }
        if self.query_timeout == 0 || self.connection_timeout == 0 {
            return Err(timeout_error());
        }
        let host = self.server_hostname.trim();
        if host.is_empty() || !host.contains('.') {
            return Err(Error::config(format!(
                "Invalid server hostname: '{}'",
                self.server_hostname
            )));
        }
        if !self.http_path.starts_with('/') {
            return Err(Error::config("HTTP path must start with /"));
        }
        Ok(())
    }

    /// The workspace OAuth token endpoint.
    pub fn token_url(&self) -> String {
        format!("https://{}/oidc/v1/token", self.server_hostname)
    }

    pub fn workspace_url(&self) -> String {
        format!("https://{}", self.server_hostname)
    }

    /// The configured query timeout. Nothing in this crate enforces it; a
    /// driver timeout surfaces as [`Error::Timeout`](crate::Error::Timeout).
    pub fn query_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.query_timeout)
    }

    pub fn connection_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }

    /// Installs the global log subscriber at the configured level.
    pub fn configure_logging(&self) -> bool {
        logging::init(&self.log_level)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("server_hostname", &self.server_hostname)
            .field("http_path", &self.http_path)
            .field("log_level", &self.log_level)
            .field("max_retries", &self.max_retries)
            .field("query_timeout", &self.query_timeout)
            .field("connection_timeout", &self.connection_timeout)
            .field("oauth_scope", &self.oauth_scope)
            .field("catalog", &self.catalog)
            .field("schema", &self.schema)
            .finish()
    }
}

fn process_vars() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os().filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_int(name: &str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|e| Error::config(format!("Invalid value for {name}: '{raw}' ({e})")))
}

fn parse_timeout(name: &str, raw: &str) -> Result<u64> {
    let seconds = parse_int(name, raw)?;
    u64::try_from(seconds)
        .ok()
        .filter(|s| *s > 0)
        .ok_or_else(timeout_error)
}

fn max_retries_error() -> Error {
    Error::config("max_retries must be between 0 and 10")
}

fn timeout_error() -> Error {
    Error::config("Timeout must be greater than 0")
}
