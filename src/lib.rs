//! # Insurance Reports
//!
//! Loads an insurance workbook into an in-memory relational store and prints a
//! fixed set of aggregation reports over it.
//!
//! ## Pipeline
//!
//! 1. **Load**: the `POLICY`, `CLAIMS`, `POL_SUB` and `AGENCY` sheets of an
//!    `.xlsx` workbook become typed in-memory tables ([`loader::load`]).
//! 2. **Materialize**: each table replaces its destination table (`Policy`,
//!    `Claims`, `Extensions`, `Agency`) in an in-memory DuckDB store, one
//!    transaction per table ([`Store::materialize`]).
//! 3. **Report**: the selected reports run in catalog order and are written to
//!    the output ([`report::catalog`]).
//!
//! Any failure stops the run at the stage that raised it.

pub mod config;
pub mod database;
pub mod error;
mod helpers;
pub mod loader;
pub mod report;
mod spreadsheet;

pub use crate::config::Config;
pub use crate::database::store::Store;
pub use crate::error::Error;
pub use crate::spreadsheet::WorkbookError;

use crate::loader::Tables;
use crate::report::Report;
use std::io::Write;
use std::time::Instant;

/// Runs the whole pipeline, writing every selected report to `out`.
///
/// The workbook is loaded before the store is opened, so a workbook that
/// cannot be loaded never touches a store. The store is closed on every path
/// once opened.
pub fn run<W: Write>(config: &Config, out: &mut W) -> Result<(), Error> {
    let started = Instant::now();
    let reports = report::select(&config.reports);
    if reports.is_empty() {
        log::warn!("No report matches the given patterns");
    }

    let tables = loader::load(&config.workbook)?;
    let mut store = Store::open_in_memory()?;
    let result = materialize_and_report(&mut store, &tables, &reports, out);
    let closed = store.close();
    result?;
    closed?;

    log::info!("Finished {} reports in {:?}", reports.len(), started.elapsed());
    Ok(())
}

fn materialize_and_report<W: Write>(
    store: &mut Store,
    tables: &Tables,
    reports: &[&Report],
    out: &mut W,
) -> Result<(), Error> {
    store.materialize(tables)?;
    for report in reports {
        let result = report.execute(store)?;
        writeln!(out, "{result}")?;
    }
    out.flush()?;
    Ok(())
}
