//! Schema descriptors for the four destination tables.
//!
//! Each descriptor names the columns the reports rely on and what kind of
//! values they must hold. Additional columns are always allowed.

use crate::database::column::ColumnType;
use crate::database::period::Period;
use crate::database::store::StoreError;
use crate::database::table::Scalar;
use crate::database::table::Table;
use std::borrow::Cow;

/// Semantic role of a required column.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ColumnRole {
    /// Amounts; BIGINT or DOUBLE
    Numeric,
    /// Keys used for joins and grouping; BIGINT or VARCHAR
    Identifier,
    /// `YYYYMM` billing period; BIGINT or VARCHAR with every value decodable
    Period,
}

impl ColumnRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::Numeric => "numeric",
            ColumnRole::Identifier => "identifier",
            ColumnRole::Period => "period (YYYYMM)",
        }
    }

    fn accepts(&self, kind: ColumnType) -> bool {
        match self {
            ColumnRole::Numeric => matches!(kind, ColumnType::BigInt | ColumnType::Double),
            ColumnRole::Identifier | ColumnRole::Period => matches!(kind, ColumnType::BigInt | ColumnType::Varchar),
        }
    }

    /// Type given to a required column that holds no values at all.
    fn default_type(&self) -> ColumnType {
        match self {
            ColumnRole::Numeric => ColumnType::Double,
            ColumnRole::Identifier | ColumnRole::Period => ColumnType::Varchar,
        }
    }
}

/// A column that must be present in a table.
#[derive(Debug)]
pub struct ColumnRule {
    pub name: &'static str,
    pub role: ColumnRole,
}

impl ColumnRule {
    pub const fn new(name: &'static str, role: ColumnRole) -> Self {
        Self { name, role }
    }
}

/// Destination table name, source sheet name and required columns.
#[derive(Debug)]
pub struct TableSchema {
    pub table: &'static str,
    pub sheet: &'static str,
    pub columns: &'static [ColumnRule],
}

pub static POLICY: TableSchema = TableSchema {
    table: "Policy",
    sheet: "POLICY",
    columns: &[
        ColumnRule::new("POLICY_ID", ColumnRole::Identifier),
        ColumnRule::new("AGENCY_ID", ColumnRole::Identifier),
        ColumnRule::new("ID_NUM", ColumnRole::Identifier),
        ColumnRule::new("MONTH_YEAR", ColumnRole::Period),
        ColumnRule::new("TOTAL_PREM", ColumnRole::Numeric),
        ColumnRule::new("SUB1", ColumnRole::Numeric),
        ColumnRule::new("SUB2", ColumnRole::Numeric),
        ColumnRule::new("SUB3", ColumnRole::Numeric),
        ColumnRule::new("SUB4", ColumnRole::Numeric),
        ColumnRule::new("SUB5", ColumnRole::Numeric),
    ],
};

pub static CLAIMS: TableSchema = TableSchema {
    table: "Claims",
    sheet: "CLAIMS",
    columns: &[
        ColumnRule::new("POLICY_ID", ColumnRole::Identifier),
        ColumnRule::new("MONTH_YEAR", ColumnRole::Period),
        ColumnRule::new("CLAIM_PAYMENT_NIS_AMOUNT", ColumnRole::Numeric),
    ],
};

pub static EXTENSIONS: TableSchema = TableSchema {
    table: "Extensions",
    sheet: "POL_SUB",
    columns: &[],
};

pub static AGENCY: TableSchema = TableSchema {
    table: "Agency",
    sheet: "AGENCY",
    columns: &[],
};

impl TableSchema {
    /// Checks that every required column exists with an acceptable type and,
    /// for period columns, that every non-null value decodes as `YYYYMM`.
    /// A column holding only nulls is acceptable for every role.
    pub fn validate(&self, table: &Table) -> Result<(), StoreError> {
        for rule in self.columns {
            let index = table.column_index(rule.name).ok_or_else(|| StoreError::MissingColumn {
                table: self.table.to_owned(),
                column: rule.name.to_owned(),
            })?;
            let kind = table.columns[index].kind;
            if !rule.role.accepts(kind) && !is_null_column(table, rule.name) {
                return Err(StoreError::ColumnTypeMismatch {
                    table: self.table.to_owned(),
                    column: rule.name.to_owned(),
                    expected: rule.role.as_str(),
                    found: kind,
                });
            }
            if rule.role == ColumnRole::Period {
                let invalid = table
                    .column_values(rule.name)
                    .into_iter()
                    .flatten()
                    .enumerate()
                    .find(|(_, value)| !value.is_null() && Period::from_scalar(value).is_none());
                if let Some((row, value)) = invalid {
                    return Err(StoreError::InvalidPeriod {
                        table: self.table.to_owned(),
                        column: rule.name.to_owned(),
                        row: row + 1,
                        value: value.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Validates `table` and retypes required columns that hold only nulls to
    /// the type of their role, so aggregates over them still bind.
    pub fn conform<'a>(&self, table: &'a Table) -> Result<Cow<'a, Table>, StoreError> {
        self.validate(table)?;
        let retyped: Vec<(usize, ColumnType)> = self
            .columns
            .iter()
            .filter_map(|rule| {
                let index = table.column_index(rule.name)?;
                let kind = rule.role.default_type();
                (!rule.role.accepts(table.columns[index].kind) && is_null_column(table, rule.name)).then_some((index, kind))
            })
            .collect();
        if retyped.is_empty() {
            return Ok(Cow::Borrowed(table));
        }

        let mut table = table.clone();
        for (index, kind) in retyped {
            log::debug!("Column '{}'.'{}' holds no values, typed {}", table.name, table.columns[index].name, kind);
            table.columns[index].kind = kind;
        }
        Ok(Cow::Owned(table))
    }
}

fn is_null_column(table: &Table, name: &str) -> bool {
    table.column_values(name).is_some_and(|mut values| values.all(Scalar::is_null))
}
