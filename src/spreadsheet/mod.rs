//! # Workbook Reader
//!
//! Reads Office Open XML workbooks (`.xlsx`, `.xlsm`) sheet by sheet. Cells keep
//! their raw value together with a cell type derived from the cell's `t`
//! attribute and its number format, so that later stages can decide how each
//! column is typed.
use quick_xml::events::attributes::AttrError;
use thiserror::Error;

pub(crate) mod cell;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

pub(crate) use xlsx::Workbook;

/// Errors raised while opening or parsing a workbook.
/// Every variant means the workbook could not be read as a well-formed table source.
#[derive(Error, Debug)]
pub enum WorkbookError {
    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] AttrError),

    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Workbook structure errors
    #[error("Missing workbook part '{0}'")]
    MissingPart(String),

    #[error("Workbook contains no sheets")]
    NoSheets,

    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("Sheet '{0}' is empty")]
    EmptySheet(String),

    #[error("Duplicate column name '{name}' in sheet '{sheet}'")]
    DuplicateHeaderColumn { sheet: String, name: String },

    #[error("Invalid cell value at '{sheet}'!{reference}: {message}")]
    CellValueError {
        sheet: String,
        reference: String,
        message: String,
    },
}
