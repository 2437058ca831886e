//! # Tabular Loader
//!
//! Reads the four record sets of an insurance workbook into typed in-memory
//! tables. The first non-empty row of each sheet is the header; column names
//! are kept verbatim and column types are inferred from every data cell.

use crate::database::column::Column;
use crate::database::column::ColumnType;
use crate::database::schema;
use crate::database::schema::TableSchema;
use crate::database::table::Scalar;
use crate::database::table::Table;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Workbook;
use crate::spreadsheet::WorkbookError;
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

/// Errors raised while loading a workbook.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Malformed workbook '{file}': {source}")]
    MalformedWorkbook {
        file: String,
        #[source]
        source: WorkbookError,
    },

    #[error("Workbook '{file}' has no sheet named '{sheet}'")]
    MissingSheet { file: String, sheet: String },
}

/// The logical record sets of a workbook.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecordSet {
    Policy,
    Claims,
    Extensions,
    Agency,
}

impl RecordSet {
    /// All record sets in load order.
    pub const ALL: [RecordSet; 4] = [RecordSet::Policy, RecordSet::Claims, RecordSet::Extensions, RecordSet::Agency];

    pub fn schema(&self) -> &'static TableSchema {
        match self {
            RecordSet::Policy => &schema::POLICY,
            RecordSet::Claims => &schema::CLAIMS,
            RecordSet::Extensions => &schema::EXTENSIONS,
            RecordSet::Agency => &schema::AGENCY,
        }
    }

    /// Sheet name in the workbook.
    pub fn sheet_name(&self) -> &'static str {
        self.schema().sheet
    }

    /// Destination table name in the store.
    pub fn table_name(&self) -> &'static str {
        self.schema().table
    }
}

/// The four tables of one workbook.
#[derive(Clone, Debug, PartialEq)]
pub struct Tables {
    pub policy: Table,
    pub claims: Table,
    pub extensions: Table,
    pub agency: Table,
}

impl Tables {
    pub fn get(&self, record_set: RecordSet) -> &Table {
        match record_set {
            RecordSet::Policy => &self.policy,
            RecordSet::Claims => &self.claims,
            RecordSet::Extensions => &self.extensions,
            RecordSet::Agency => &self.agency,
        }
    }

    /// Iterates the tables in load order.
    pub fn iter(&self) -> impl Iterator<Item = (RecordSet, &Table)> {
        RecordSet::ALL.into_iter().map(move |record_set| (record_set, self.get(record_set)))
    }
}

/// Loads the Policy, Claims, Extensions and Agency tables from a workbook.
///
/// All four sheets must exist; this is checked before any sheet is read.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Tables, LoadError> {
    let started = Instant::now();
    let file = path.as_ref().display().to_string();
    let malformed = |source: WorkbookError| LoadError::MalformedWorkbook {
        file: file.to_owned(),
        source,
    };

    let mut workbook = Workbook::open(path.as_ref()).map_err(malformed)?;
    let sheet_names = workbook.sheet_names();
    if let Some(missing) = RecordSet::ALL
        .iter()
        .find(|record_set| !sheet_names.contains(&record_set.sheet_name()))
    {
        return Err(LoadError::MissingSheet {
            file: file.to_owned(),
            sheet: missing.sheet_name().to_owned(),
        });
    }

    let mut read = |record_set: RecordSet| -> Result<Table, LoadError> {
        let sheet = workbook.read_sheet(record_set.sheet_name()).map_err(malformed)?;
        let table = build_table(record_set.table_name(), &sheet, workbook.shared_strings()).map_err(malformed)?;
        log::info!(
            "Loaded sheet '{}' into '{}': {} rows, {} columns",
            sheet.name,
            table.name,
            table.rows.len(),
            table.columns.len()
        );
        Ok(table)
    };
    let tables = Tables {
        policy: read(RecordSet::Policy)?,
        claims: read(RecordSet::Claims)?,
        extensions: read(RecordSet::Extensions)?,
        agency: read(RecordSet::Agency)?,
    };
    log::debug!("Loading '{}' took {:?}", file, started.elapsed());
    Ok(tables)
}

/// Builds a table from a sheet: header from the first non-empty row, one
/// column per position between its first and last labelled cell, rows without
/// any value skipped. Unlabelled positions inside the header are named
/// `Unnamed: N`; cells left or right of the header are ignored.
pub(crate) fn build_table(name: &str, sheet: &Sheet, shared_strings: &[String]) -> Result<Table, WorkbookError> {
    let grid = sheet.grid();
    let empty = || WorkbookError::EmptySheet(sheet.name.to_owned());
    let (header, body) = grid.split_first().ok_or_else(empty)?;
    let first = header.iter().position(Option::is_some).ok_or_else(empty)?;
    let last = header.iter().rposition(Option::is_some).ok_or_else(empty)?;

    let mut names = HashSet::new();
    let mut columns = Vec::with_capacity(last - first + 1);
    for (index, cell) in header[first..=last].iter().enumerate() {
        let column_name = match cell {
            Some(cell) => cell.to_text(shared_strings).map_err(|message| cell_error(sheet, cell, message))?,
            None => format!("Unnamed: {index}"),
        };
        if !names.insert(column_name.to_owned()) {
            return Err(WorkbookError::DuplicateHeaderColumn {
                sheet: sheet.name.to_owned(),
                name: column_name,
            });
        }
        columns.push(column_name);
    }

    let body: Vec<&[Option<&Cell>]> = body
        .iter()
        .map(|row| &row[first..=last])
        .filter(|row| row.iter().any(Option::is_some))
        .collect();
    let kept: usize = std::iter::once(&header[first..=last])
        .chain(body.iter().copied())
        .map(|row| row.iter().flatten().count())
        .sum();
    let ignored = sheet.cells.len().saturating_sub(kept);
    if ignored > 0 {
        log::warn!("Sheet '{}': {} cells outside the header columns are ignored", sheet.name, ignored);
    }

    let columns: Vec<Column> = columns
        .into_iter()
        .enumerate()
        .map(|(index, column_name)| Column {
            name: column_name,
            kind: ColumnType::detect(body.iter().map(|row| row[index].and_then(ColumnType::from))),
        })
        .collect();

    let mut table = Table::new(name, columns);
    for row in body {
        let mut values = Vec::with_capacity(table.columns.len());
        for (cell, column) in row.iter().zip(&table.columns) {
            let value = match cell {
                Some(cell) => to_scalar(cell, column.kind, shared_strings).map_err(|message| cell_error(sheet, cell, message))?,
                None => Scalar::Null,
            };
            values.push(value);
        }
        table.rows.push(values);
    }
    Ok(table)
}

/// Converts a cell to a value of the column's type.
fn to_scalar(cell: &Cell, kind: ColumnType, shared_strings: &[String]) -> Result<Scalar, String> {
    if matches!(cell.kind, CellType::Empty | CellType::Error) {
        return Ok(Scalar::Null);
    }
    Ok(match kind {
        ColumnType::Boolean => Scalar::Boolean(cell.to_boolean()),
        ColumnType::BigInt => Scalar::Integer(cell.to_bigint()?),
        ColumnType::Double => Scalar::Float(cell.to_double()?),
        ColumnType::Varchar => Scalar::Text(cell.to_text(shared_strings)?),
        ColumnType::Date => Scalar::Date(cell.to_date()?),
        ColumnType::Time => Scalar::Time(cell.to_time()?),
        ColumnType::Timestamp => Scalar::Timestamp(cell.to_datetime()?),
    })
}

fn cell_error(sheet: &Sheet, cell: &Cell, message: String) -> WorkbookError {
    WorkbookError::CellValueError {
        sheet: sheet.name.to_owned(),
        reference: cell.reference(),
        message,
    }
}
