use crate::database::column::Column;
use crate::database::column::ColumnType;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use std::fmt::Display;
use std::fmt::Formatter;

/// A single typed value of a table row or query result.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Returns the column type this value belongs to; `None` for null.
    pub fn kind(&self) -> Option<ColumnType> {
        match self {
            Scalar::Null => None,
            Scalar::Boolean(_) => Some(ColumnType::Boolean),
            Scalar::Integer(_) => Some(ColumnType::BigInt),
            Scalar::Float(_) => Some(ColumnType::Double),
            Scalar::Text(_) => Some(ColumnType::Varchar),
            Scalar::Date(_) => Some(ColumnType::Date),
            Scalar::Time(_) => Some(ColumnType::Time),
            Scalar::Timestamp(_) => Some(ColumnType::Timestamp),
        }
    }

    /// Numeric view of the value; integers widen to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(value) => Some(*value as f64),
            Scalar::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Null => f.write_str("NULL"),
            Scalar::Boolean(value) => write!(f, "{value}"),
            Scalar::Integer(value) => write!(f, "{value}"),
            // Debug keeps the fraction of whole numbers (`60.0`)
            Scalar::Float(value) => write!(f, "{value:?}"),
            Scalar::Text(value) => f.write_str(value),
            Scalar::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            Scalar::Time(value) => write!(f, "{}", value.format("%H:%M:%S%.f")),
            Scalar::Timestamp(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

/// An in-memory table read from one sheet.
///
/// Every row holds exactly one value per column, in column order.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    /// Destination table name
    pub name: String,
    /// Column definitions, in sheet order
    pub columns: Vec<Column>,
    /// Row values
    pub rows: Vec<Vec<Scalar>>,
}

impl Table {
    pub fn new(name: &str, columns: Vec<Column>) -> Self {
        Self {
            name: name.to_owned(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Returns the position of the named column; names match exactly.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// Iterates the values of the named column.
    pub fn column_values<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Scalar> + 'a> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[index]))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
