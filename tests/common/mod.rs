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

//! In-process ADBC driver that serves canned Arrow batches.

#![allow(dead_code)]

use adbc_core::error::{Error, Result, Status};
use adbc_core::options::{
    InfoCode, ObjectDepth, OptionConnection, OptionDatabase, OptionStatement, OptionValue,
};
use adbc_core::Optionable;
use arrow_array::{RecordBatch, RecordBatchIterator, RecordBatchReader};
use arrow_schema::{ArrowError, Schema, SchemaRef};
use std::collections::{HashMap, HashSet};
use std::ffi::c_char;
use std::sync::{Arc, Mutex, MutexGuard};

type BatchReader =
    RecordBatchIterator<std::vec::IntoIter<std::result::Result<RecordBatch, ArrowError>>>;

#[derive(Clone)]
enum Outcome {
    Batches(SchemaRef, Vec<RecordBatch>),
    Fail {
        message: String,
        status: Status,
        sqlstate: Option<[u8; 5]>,
    },
}

#[derive(Default)]
struct WarehouseState {
    outcomes: HashMap<String, Vec<Outcome>>,
    executed: Vec<String>,
    database_options: Vec<(String, String)>,
    database_error: Option<String>,
    connections_opened: usize,
}

/// Scripted server state shared by every handle the driver creates.
#[derive(Clone, Default)]
pub struct FakeWarehouse {
    state: Arc<Mutex<WarehouseState>>,
}

impl FakeWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, WarehouseState> {
        self.state.lock().unwrap()
    }

    /// Serves `batches` for the next execution of `sql`.
    pub fn respond(&self, sql: &str, batch: RecordBatch) -> &Self {
        self.push(sql, Outcome::Batches(batch.schema(), vec![batch]));
        self
    }

    pub fn respond_batches(
        &self,
        sql: &str,
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
    ) -> &Self {
        self.push(sql, Outcome::Batches(schema, batches));
        self
    }

    /// Fails the next execution of `sql`.
    pub fn fail(&self, sql: &str, message: &str, status: Status) -> &Self {
        self.push(
            sql,
            Outcome::Fail {
                message: message.to_string(),
                status,
                sqlstate: None,
            },
        );
        self
    }

    pub fn fail_with_sqlstate(&self, sql: &str, message: &str, sqlstate: &str) -> &Self {
        let mut state = [0u8; 5];
        state.copy_from_slice(&sqlstate.as_bytes()[..5]);
        self.push(
            sql,
            Outcome::Fail {
                message: message.to_string(),
                status: Status::InvalidArguments,
                sqlstate: Some(state),
            },
        );
        self
    }

    /// Makes `new_database` fail.
    pub fn reject_databases(&self, message: &str) {
        self.lock().database_error = Some(message.to_string());
    }

    pub fn executed(&self) -> Vec<String> {
        self.lock().executed.clone()
    }

    pub fn database_option(&self, key: &str) -> Option<String> {
        self.lock()
            .database_options
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn database_option_keys(&self) -> Vec<String> {
        self.lock()
            .database_options
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn connections_opened(&self) -> usize {
        self.lock().connections_opened
    }

    pub fn driver(&self) -> FakeDriver {
        FakeDriver {
            warehouse: self.clone(),
        }
    }

    fn push(&self, sql: &str, outcome: Outcome) {
        self.lock()
            .outcomes
            .entry(sql.to_string())
            .or_default()
            .push(outcome);
    }

    fn run(&self, sql: &str) -> Result<BatchReader> {
        let mut state = self.lock();
        state.executed.push(sql.to_string());

        let outcome = match state.outcomes.get_mut(sql) {
            // The last scripted outcome for a statement repeats.
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Outcome::Batches(Arc::new(Schema::empty()), Vec::new()),
        };

        match outcome {
            Outcome::Batches(schema, batches) => Ok(RecordBatchIterator::new(
                batches.into_iter().map(Ok).collect::<Vec<_>>().into_iter(),
                schema,
            )),
            Outcome::Fail {
                message,
                status,
                sqlstate,
            } => {
                let mut err = Error::with_message_and_status(message, status);
                if let Some(code) = sqlstate {
                    for (dst, src) in err.sqlstate.iter_mut().zip(code) {
                        *dst = src as c_char;
                    }
                }
                Err(err)
            }
        }
    }
}

fn not_implemented(what: &str) -> Error {
    Error::with_message_and_status(format!("{what} is not implemented"), Status::NotImplemented)
}

fn unknown_option(key: &impl std::fmt::Debug) -> Error {
    Error::with_message_and_status(format!("unknown option {key:?}"), Status::NotFound)
}

pub struct FakeDriver {
    warehouse: FakeWarehouse,
}

impl adbc_core::Driver for FakeDriver {
    type DatabaseType = FakeDatabase;

    fn new_database(&mut self) -> Result<Self::DatabaseType> {
        if let Some(message) = &self.warehouse.lock().database_error {
            return Err(Error::with_message_and_status(
                message.clone(),
                Status::Unauthenticated,
            ));
        }
        Ok(FakeDatabase {
            warehouse: self.warehouse.clone(),
        })
    }

    fn new_database_with_opts(
        &mut self,
        opts: impl IntoIterator<Item = (OptionDatabase, OptionValue)>,
    ) -> Result<Self::DatabaseType> {
        let mut database = self.new_database()?;
        for (key, value) in opts {
            database.set_option(key, value)?;
        }
        Ok(database)
    }
}

pub struct FakeDatabase {
    warehouse: FakeWarehouse,
}

impl Optionable for FakeDatabase {
    type Option = OptionDatabase;

    fn set_option(&mut self, key: Self::Option, value: OptionValue) -> Result<()> {
        let name = match &key {
            OptionDatabase::Uri => "uri".to_string(),
            OptionDatabase::Other(s) => s.clone(),
            _ => return Err(unknown_option(&key)),
        };
        let OptionValue::String(value) = value else {
            return Err(Error::with_message_and_status(
                format!("option {name} must be a string"),
                Status::InvalidArguments,
            ));
        };
        self.warehouse.lock().database_options.push((name, value));
        Ok(())
    }

    fn get_option_string(&self, key: Self::Option) -> Result<String> {
        Err(unknown_option(&key))
    }

    fn get_option_bytes(&self, key: Self::Option) -> Result<Vec<u8>> {
        Err(unknown_option(&key))
    }

    fn get_option_int(&self, key: Self::Option) -> Result<i64> {
        Err(unknown_option(&key))
    }

    fn get_option_double(&self, key: Self::Option) -> Result<f64> {
        Err(unknown_option(&key))
    }
}

impl adbc_core::Database for FakeDatabase {
    type ConnectionType = FakeConnection;

    fn new_connection(&self) -> Result<Self::ConnectionType> {
        self.warehouse.lock().connections_opened += 1;
        Ok(FakeConnection {
            warehouse: self.warehouse.clone(),
        })
    }

    fn new_connection_with_opts(
        &self,
        opts: impl IntoIterator<Item = (OptionConnection, OptionValue)>,
    ) -> Result<Self::ConnectionType> {
        let mut connection = self.new_connection()?;
        for (key, value) in opts {
            connection.set_option(key, value)?;
        }
        Ok(connection)
    }
}

pub struct FakeConnection {
    warehouse: FakeWarehouse,
}

impl Optionable for FakeConnection {
    type Option = OptionConnection;

    fn set_option(&mut self, key: Self::Option, _value: OptionValue) -> Result<()> {
        match key {
            OptionConnection::AutoCommit => Ok(()),
            _ => Err(unknown_option(&key)),
        }
    }

    fn get_option_string(&self, key: Self::Option) -> Result<String> {
        Err(unknown_option(&key))
    }

    fn get_option_bytes(&self, key: Self::Option) -> Result<Vec<u8>> {
        Err(unknown_option(&key))
    }

    fn get_option_int(&self, key: Self::Option) -> Result<i64> {
        Err(unknown_option(&key))
    }

    fn get_option_double(&self, key: Self::Option) -> Result<f64> {
        Err(unknown_option(&key))
    }
}

impl adbc_core::Connection for FakeConnection {
    type StatementType = FakeStatement;

    fn new_statement(&mut self) -> Result<Self::StatementType> {
        Ok(FakeStatement {
            warehouse: self.warehouse.clone(),
            query: None,
        })
    }

    fn cancel(&mut self) -> Result<()> {
        Ok(())
    }

    fn get_info(&self, _codes: Option<HashSet<InfoCode>>) -> Result<impl RecordBatchReader + Send> {
        Err::<BatchReader, _>(not_implemented("get_info"))
    }

    fn get_objects(
        &self,
        _depth: ObjectDepth,
        _catalog: Option<&str>,
        _db_schema: Option<&str>,
        _table_name: Option<&str>,
        _table_type: Option<Vec<&str>>,
        _column_name: Option<&str>,
    ) -> Result<impl RecordBatchReader + Send> {
        Err::<BatchReader, _>(not_implemented("get_objects"))
    }

    fn get_table_schema(
        &self,
        _catalog: Option<&str>,
        _db_schema: Option<&str>,
        _table_name: &str,
    ) -> Result<Schema> {
        Err(not_implemented("get_table_schema"))
    }

    fn get_table_types(&self) -> Result<impl RecordBatchReader + Send> {
        Err::<BatchReader, _>(not_implemented("get_table_types"))
    }

    fn read_partition(
        &self,
        _partition: impl AsRef<[u8]>,
    ) -> Result<impl RecordBatchReader + Send> {
        Err::<BatchReader, _>(not_implemented("read_partition"))
    }

    fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        Err(not_implemented("rollback"))
    }

    fn get_statistic_names(&self) -> Result<impl RecordBatchReader + Send> {
        Err::<BatchReader, _>(not_implemented("get_statistic_names"))
    }

    fn get_statistics(
        &self,
        _catalog: Option<&str>,
        _db_schema: Option<&str>,
        _table_name: Option<&str>,
        _approximate: bool,
    ) -> Result<impl RecordBatchReader + Send> {
        Err::<BatchReader, _>(not_implemented("get_statistics"))
    }
}

pub struct FakeStatement {
    warehouse: FakeWarehouse,
    query: Option<String>,
}

impl Optionable for FakeStatement {
    type Option = OptionStatement;

    fn set_option(&mut self, key: Self::Option, _value: OptionValue) -> Result<()> {
        Err(unknown_option(&key))
    }

    fn get_option_string(&self, key: Self::Option) -> Result<String> {
        Err(unknown_option(&key))
    }

    fn get_option_bytes(&self, key: Self::Option) -> Result<Vec<u8>> {
        Err(unknown_option(&key))
    }

    fn get_option_int(&self, key: Self::Option) -> Result<i64> {
        Err(unknown_option(&key))
    }

    fn get_option_double(&self, key: Self::Option) -> Result<f64> {
        Err(unknown_option(&key))
    }
}

impl adbc_core::Statement for FakeStatement {
    fn set_sql_query(&mut self, query: impl AsRef<str>) -> Result<()> {
        self.query = Some(query.as_ref().to_string());
        Ok(())
    }

    fn set_substrait_plan(&mut self, _plan: impl AsRef<[u8]>) -> Result<()> {
        Err(not_implemented("set_substrait_plan"))
    }

    fn prepare(&mut self) -> Result<()> {
        Err(not_implemented("prepare"))
    }

    fn get_parameter_schema(&self) -> Result<Schema> {
        Err(not_implemented("get_parameter_schema"))
    }

    fn bind(&mut self, _batch: RecordBatch) -> Result<()> {
        Err(not_implemented("bind"))
    }

    fn bind_stream(&mut self, _stream: Box<dyn RecordBatchReader + Send>) -> Result<()> {
        Err(not_implemented("bind_stream"))
    }

    fn execute(&mut self) -> Result<impl RecordBatchReader + Send> {
        let sql = self.query.clone().ok_or_else(|| {
            Error::with_message_and_status("no query set", Status::InvalidState)
        })?;
        self.warehouse.run(&sql)
    }

    fn execute_update(&mut self) -> Result<Option<i64>> {
        Err(not_implemented("execute_update"))
    }

    fn execute_schema(&mut self) -> Result<Schema> {
        Err(not_implemented("execute_schema"))
    }

    fn execute_partitions(&mut self) -> Result<adbc_core::PartitionedResult> {
        Err(not_implemented("execute_partitions"))
    }

    fn cancel(&mut self) -> Result<()> {
        Ok(())
    }
}
