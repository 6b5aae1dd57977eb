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

//! Connection provider backed by an ADBC driver.

use super::{AdbcCursor, ConnectionInfo, ConnectionProvider, Cursor};
use crate::auth::TokenProvider;
use crate::error::{DriverError, Error, Result};
use crate::settings::Settings;
use adbc_core::options::{OptionDatabase, OptionValue};
use adbc_core::{Database, Driver};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

pub const OPTION_HTTP_PATH: &str = "databricks.http_path";
pub const OPTION_ACCESS_TOKEN: &str = "databricks.access_token";
pub const OPTION_CATALOG: &str = "databricks.catalog";
pub const OPTION_SCHEMA: &str = "databricks.schema";

type ConnectionOf<D> = <<D as Driver>::DatabaseType as Database>::ConnectionType;

/// Owns one ADBC database/connection pair for a workspace.
///
/// The connection is opened lazily and reopened on demand. Each connect
/// fetches a bearer token from the configured [`TokenProvider`].
pub struct ConnectionManager<D: Driver> {
    driver: D,
    settings: Settings,
    token_provider: Arc<dyn TokenProvider>,
    database: Option<D::DatabaseType>,
    cursor: Option<AdbcCursor<ConnectionOf<D>>>,
    info: ConnectionInfo,
}

impl<D: Driver> ConnectionManager<D> {
    pub fn new(driver: D, settings: Settings, token_provider: Arc<dyn TokenProvider>) -> Self {
        let info = ConnectionInfo::new(&settings.server_hostname, &settings.http_path);
        Self {
            driver,
            settings,
            token_provider,
            database: None,
            cursor: None,
            info,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn database_options(&self, access_token: String) -> Vec<(OptionDatabase, OptionValue)> {
        let mut opts = vec![
            (
                OptionDatabase::Uri,
                OptionValue::String(self.settings.workspace_url()),
            ),
            (
                OptionDatabase::Other(OPTION_HTTP_PATH.into()),
                OptionValue::String(self.settings.http_path.clone()),
            ),
            (
                OptionDatabase::Other(OPTION_ACCESS_TOKEN.into()),
                OptionValue::String(access_token),
            ),
        ];
        if let Some(catalog) = &self.settings.catalog {
            opts.push((
                OptionDatabase::Other(OPTION_CATALOG.into()),
                OptionValue::String(catalog.clone()),
            ));
        }
        if let Some(schema) = &self.settings.schema {
            opts.push((
                OptionDatabase::Other(OPTION_SCHEMA.into()),
                OptionValue::String(schema.clone()),
            ));
        }
        opts
    }

    fn open(&mut self) -> Result<()> {
        let token = self.token_provider.get_access_token(false)?;
        let opts = self.database_options(token);

        let database = self
            .driver
            .new_database_with_opts(opts)
            .map_err(|e| DriverError::from(e).to_string())
            .map_err(connect_failed)?;
        let connection = database
            .new_connection()
            .map_err(|e| DriverError::from(e).to_string())
            .map_err(connect_failed)?;

        self.database = Some(database);
        self.cursor = Some(AdbcCursor::new(connection));
        Ok(())
    }
}

fn connect_failed(reason: String) -> Error {
    Error::connection(format!("Failed to connect to Databricks: {reason}"))
}

impl<D: Driver> ConnectionProvider for ConnectionManager<D> {
    fn connect(&mut self) -> Result<bool> {
        if self.is_connected() {
            self.info.update_activity();
            return Ok(true);
        }

        debug!("Connecting to {}", self.settings.server_hostname);
        if let Err(e) = self.open() {
            error!("{}", e);
            self.cursor = None;
            self.database = None;
            return Err(match e {
                Error::Connection(_) => e,
                other => connect_failed(other.to_string()),
            });
        }

        self.info.mark_connected();
        info!(
            "Connected to Databricks at {}{}",
            self.settings.server_hostname, self.settings.http_path
        );
        Ok(true)
    }

    fn disconnect(&mut self) {
        let was_open = self.cursor.is_some() || self.database.is_some();
        // Connection before database: the connection may borrow driver state.
        self.cursor = None;
        self.database = None;
        self.info.mark_disconnected();
        if was_open {
            info!("Disconnected from Databricks");
        }
    }

    fn is_connected(&self) -> bool {
        self.info.is_connected && self.cursor.is_some()
    }

    fn ensure_cursor(&mut self) -> Result<()> {
        if !self.is_connected() {
            self.connect()?;
        }
        if self.cursor.is_none() {
            return Err(Error::connection("Failed to get database cursor"));
        }
        self.info.update_activity();
        Ok(())
    }

    fn cursor(&mut self) -> Option<&mut dyn Cursor> {
        self.cursor.as_mut().map(|c| c as &mut dyn Cursor)
    }

    fn release_cursor(&mut self) {
        self.info.update_activity();
    }

    fn connection_info(&self) -> ConnectionInfo {
        self.info.clone()
    }
}

impl<D: Driver> fmt::Debug for ConnectionManager<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("settings", &self.settings)
            .field("token_provider", &self.token_provider)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}
