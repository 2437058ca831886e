//! # Reports
//!
//! Fixed, parameterless aggregation queries over the materialized tables.
//! Each report declares the tables it reads and the columns it returns; a
//! result that does not match its declared shape is an error.

mod catalog;

use crate::database::store::Store;
use crate::database::store::StoreError;
use crate::database::table::Scalar;
use glob::Pattern;
use std::fmt::Display;
use std::fmt::Formatter;
use std::time::Instant;

/// A named read-only query with its inputs and output shape.
#[derive(Debug)]
pub struct Report {
    /// Identifier used for selection
    pub name: &'static str,
    /// Heading printed above the result
    pub title: &'static str,
    /// Tables the query reads
    pub tables: &'static [&'static str],
    /// Result columns in order; empty when they follow the input table
    pub columns: &'static [&'static str],
    pub sql: &'static str,
}

/// Rows returned by one report.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportResult {
    pub name: &'static str,
    pub title: &'static str,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Scalar>>,
}

/// Returns every report in output order.
pub fn catalog() -> &'static [Report] {
    &catalog::REPORTS
}

pub fn find(name: &str) -> Option<&'static Report> {
    catalog().iter().find(|report| report.name == name)
}

/// Returns the reports whose name matches any of the patterns, in catalog
/// order. No patterns selects every report.
pub fn select(patterns: &[Pattern]) -> Vec<&'static Report> {
    catalog()
        .iter()
        .filter(|report| patterns.is_empty() || patterns.iter().any(|pattern| pattern.matches(report.name)))
        .collect()
}

impl Report {
    /// Runs the report against the store.
    ///
    /// # Errors
    /// Fails if an input table is missing, the query is rejected or the
    /// result columns differ from the declared ones.
    pub fn execute(&self, store: &Store) -> Result<ReportResult, StoreError> {
        for table in self.tables {
            if !store.table_exists(table)? {
                return Err(StoreError::MissingTable(table.to_string()));
            }
        }

        let started = Instant::now();
        let (columns, rows) = store.query(self.sql)?;
        if !self.columns.is_empty() && columns != self.columns {
            return Err(StoreError::ResultShape {
                report: self.name.to_owned(),
                expected: self.columns.iter().map(|column| column.to_string()).collect(),
                found: columns,
            });
        }
        log::info!("Report '{}' returned {} rows", self.name, rows.len());
        log::debug!("Report '{}' took {:?}", self.name, started.elapsed());

        Ok(ReportResult {
            name: self.name,
            title: self.title,
            columns,
            rows,
        })
    }
}

impl ReportResult {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Returns the value of the named column in the given row.
    pub fn value(&self, row: usize, column: &str) -> Option<&Scalar> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }
}

impl Display for ReportResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "== {} ({}) ==", self.title, self.name)?;
        writeln!(f, "{}", self.columns.join(" | "))?;
        for row in &self.rows {
            let values: Vec<String> = row.iter().map(|value| value.to_string()).collect();
            writeln!(f, "{}", values.join(" | "))?;
        }
        Ok(())
    }
}
