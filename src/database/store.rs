//! # Relational Store
//!
//! An in-memory DuckDB database holding the destination tables. Each table is
//! replaced atomically: drop, create and bulk insert run in one transaction,
//! so a failed load leaves the previous table (or no table) in place. Tables
//! are independent; a failure aborts the remaining loads but keeps the tables
//! already committed.

use crate::database::column::ColumnType;
use crate::database::period::PERIOD_MACROS;
use crate::database::table::Scalar;
use crate::database::table::Table;
use crate::loader::Tables;
use chrono::DateTime;
use chrono::Datelike;
use chrono::NaiveDate;
use chrono::NaiveTime;
use chrono::Timelike;
use duckdb::appender_params_from_iter;
use duckdb::types::TimeUnit;
use duckdb::types::Value;
use duckdb::Connection;
use std::time::Instant;
use thiserror::Error;

/// Days between 0001-01-01 (CE day 1) and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Errors raised by the relational store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    DuckDbError(#[from] duckdb::Error),

    #[error("Create table '{table}' failed: {source}")]
    CreateTable {
        table: String,
        #[source]
        source: duckdb::Error,
    },

    #[error("Insert into table '{table}' failed: {source}")]
    Insert {
        table: String,
        #[source]
        source: duckdb::Error,
    },

    #[error("Query failed: {source}")]
    Query {
        sql: String,
        #[source]
        source: duckdb::Error,
    },

    #[error("Table '{table}' lacks required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Column '{table}'.'{column}' must be {expected}, found {found}")]
    ColumnTypeMismatch {
        table: String,
        column: String,
        expected: &'static str,
        found: ColumnType,
    },

    #[error("Column '{table}'.'{column}' row {row}: '{value}' is not a YYYYMM period")]
    InvalidPeriod {
        table: String,
        column: String,
        row: usize,
        value: String,
    },

    #[error("Table '{0}' does not exist")]
    MissingTable(String),

    #[error("Report '{report}' returned columns {found:?}, expected {expected:?}")]
    ResultShape {
        report: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Column names and rows of a query result.
pub type QueryRows = (Vec<String>, Vec<Vec<Scalar>>);

/// Handle to the in-memory relational store.
pub struct Store {
    connection: Connection,
}

impl Store {
    /// Opens an empty in-memory store with the period macros registered.
    pub fn open_in_memory() -> Result<Store, StoreError> {
        let connection = Connection::open_in_memory()?;
        connection.execute_batch(PERIOD_MACROS)?;
        log::debug!("Opened in-memory store");
        Ok(Store { connection })
    }

    /// Replaces the four destination tables in the order Policy, Claims,
    /// Extensions, Agency. Each table is conformed to its schema first.
    pub fn materialize(&mut self, tables: &Tables) -> Result<(), StoreError> {
        for (record_set, table) in tables.iter() {
            let table = record_set.schema().conform(table)?;
            self.replace_table(&table)?;
        }
        Ok(())
    }

    /// Drops, recreates and fills one table inside a single transaction.
    pub fn replace_table(&mut self, table: &Table) -> Result<(), StoreError> {
        let started = Instant::now();
        let name = quote_identifier(&table.name);
        let columns = table
            .columns
            .iter()
            .map(|column| format!("{} {}", quote_identifier(&column.name), column.kind.as_str()))
            .collect::<Vec<_>>()
            .join(", ");

        let transaction = self.connection.transaction()?;
        transaction
            .execute_batch(&format!("DROP TABLE IF EXISTS {name}; CREATE TABLE {name} ({columns});"))
            .map_err(|source| StoreError::CreateTable {
                table: table.name.to_owned(),
                source,
            })?;
        {
            let insert_error = |source| StoreError::Insert {
                table: table.name.to_owned(),
                source,
            };
            let mut appender = transaction.appender(&table.name).map_err(insert_error)?;
            for row in &table.rows {
                appender
                    .append_row(appender_params_from_iter(row.iter().map(Value::from)))
                    .map_err(insert_error)?;
            }
            appender.flush().map_err(insert_error)?;
        }
        transaction.commit()?;

        log::info!(
            "Materialized table '{}': {} columns, {} rows",
            table.name,
            table.columns.len(),
            table.rows.len()
        );
        log::debug!("Materializing '{}' took {:?}", table.name, started.elapsed());
        Ok(())
    }

    pub fn table_exists(&self, name: &str) -> Result<bool, StoreError> {
        let count: i64 = self.connection.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Returns the column names of a table in declaration order.
    pub fn column_names(&self, name: &str) -> Result<Vec<String>, StoreError> {
        if !self.table_exists(name)? {
            Err(StoreError::MissingTable(name.to_owned()))?
        }
        let mut statement = self.connection.prepare(
            "SELECT column_name FROM information_schema.columns WHERE table_name = ? ORDER BY ordinal_position",
        )?;
        let names = statement
            .query_map([name], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    pub fn row_count(&self, name: &str) -> Result<usize, StoreError> {
        if !self.table_exists(name)? {
            Err(StoreError::MissingTable(name.to_owned()))?
        }
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(name));
        let count: i64 = self.connection.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Reads every row of a table in storage order.
    pub fn select_all(&self, name: &str) -> Result<Vec<Vec<Scalar>>, StoreError> {
        if !self.table_exists(name)? {
            Err(StoreError::MissingTable(name.to_owned()))?
        }
        let (_, rows) = self.query(&format!("SELECT * FROM {}", quote_identifier(name)))?;
        Ok(rows)
    }

    /// Runs a read-only query and collects its column names and rows.
    pub fn query(&self, sql: &str) -> Result<QueryRows, StoreError> {
        let query_error = |source| StoreError::Query {
            sql: sql.to_owned(),
            source,
        };
        let mut statement = self.connection.prepare(sql).map_err(query_error)?;
        let mut rows = statement.query([]).map_err(query_error)?;
        let columns: Vec<String> = rows
            .as_ref()
            .map(|statement| statement.column_names())
            .unwrap_or_default();

        let mut values = Vec::new();
        while let Some(row) = rows.next().map_err(query_error)? {
            let mut record = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                let value: Value = row.get(index).map_err(query_error)?;
                record.push(Scalar::from(value));
            }
            values.push(record);
        }
        Ok((columns, values))
    }

    /// Closes the connection, reporting any error the engine raises on close.
    pub fn close(self) -> Result<(), StoreError> {
        self.connection.close().map_err(|(_, error)| error)?;
        log::debug!("Closed store");
        Ok(())
    }
}

/// Quotes an identifier so header names are kept verbatim.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl From<&Scalar> for Value {
    fn from(value: &Scalar) -> Self {
        match value {
            Scalar::Null => Value::Null,
            Scalar::Boolean(value) => Value::Boolean(*value),
            Scalar::Integer(value) => Value::BigInt(*value),
            Scalar::Float(value) => Value::Double(*value),
            Scalar::Text(value) => Value::Text(value.to_owned()),
            Scalar::Date(value) => Value::Date32(value.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE),
            Scalar::Time(value) => Value::Time64(
                TimeUnit::Microsecond,
                value.num_seconds_from_midnight() as i64 * 1_000_000 + (value.nanosecond() / 1_000) as i64,
            ),
            Scalar::Timestamp(value) => Value::Timestamp(TimeUnit::Microsecond, value.and_utc().timestamp_micros()),
        }
    }
}

impl From<Value> for Scalar {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Scalar::Null,
            Value::Boolean(value) => Scalar::Boolean(value),
            Value::TinyInt(value) => Scalar::Integer(value as i64),
            Value::SmallInt(value) => Scalar::Integer(value as i64),
            Value::Int(value) => Scalar::Integer(value as i64),
            Value::BigInt(value) => Scalar::Integer(value),
            Value::HugeInt(value) => i64::try_from(value)
                .map(Scalar::Integer)
                .unwrap_or(Scalar::Float(value as f64)),
            Value::UTinyInt(value) => Scalar::Integer(value as i64),
            Value::USmallInt(value) => Scalar::Integer(value as i64),
            Value::UInt(value) => Scalar::Integer(value as i64),
            Value::UBigInt(value) => i64::try_from(value)
                .map(Scalar::Integer)
                .unwrap_or(Scalar::Float(value as f64)),
            Value::Float(value) => Scalar::Float(value as f64),
            Value::Double(value) => Scalar::Float(value),
            Value::Decimal(value) => value
                .to_string()
                .parse::<f64>()
                .map(Scalar::Float)
                .unwrap_or_else(|_| Scalar::Text(value.to_string())),
            Value::Text(value) | Value::Enum(value) => Scalar::Text(value),
            Value::Date32(days) => NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
                .map(Scalar::Date)
                .unwrap_or(Scalar::Null),
            Value::Time64(unit, value) => {
                let micros = to_micros(unit, value);
                NaiveTime::from_num_seconds_from_midnight_opt(
                    micros.div_euclid(1_000_000) as u32,
                    (micros.rem_euclid(1_000_000) * 1_000) as u32,
                )
                .map(Scalar::Time)
                .unwrap_or(Scalar::Null)
            }
            Value::Timestamp(unit, value) => DateTime::from_timestamp_micros(to_micros(unit, value))
                .map(|datetime| Scalar::Timestamp(datetime.naive_utc()))
                .unwrap_or(Scalar::Null),
            other => Scalar::Text(format!("{other:?}")),
        }
    }
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value * 1_000_000,
        TimeUnit::Millisecond => value * 1_000,
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}
