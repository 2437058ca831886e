//! `MONTH_YEAR` decoding.
//!
//! Billing periods arrive as `YYYYMM`, either as text or as an integer. They are
//! decoded once here; report SQL uses the equivalent macros registered in the
//! store instead of slicing strings inline.

use crate::database::table::Scalar;
use std::fmt::Display;
use std::fmt::Formatter;

/// Calendar quarter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        }
    }
}

impl Display for Quarter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A year and month decoded from a `YYYYMM` value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Parses exactly six ASCII digits with a month between 01 and 12.
    /// Surrounding whitespace is rejected, matching the SQL macros which slice
    /// the raw text.
    pub fn parse(text: &str) -> Option<Period> {
        if text.len() != 6 || !text.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        let year = text[..4].parse::<i32>().ok()?;
        let month = text[4..].parse::<u32>().ok()?;
        (1..=12).contains(&month).then_some(Period { year, month })
    }

    /// Decodes a cell value; integral floats are accepted as integers.
    pub fn from_scalar(value: &Scalar) -> Option<Period> {
        match value {
            Scalar::Text(text) => Period::parse(text),
            Scalar::Integer(number) => Period::parse(&number.to_string()),
            Scalar::Float(number) if number.fract() == 0.0 => Period::parse(&(*number as i64).to_string()),
            _ => None,
        }
    }

    /// Months 1-3 are Q1, 4-6 Q2, 7-9 Q3, the rest Q4.
    pub fn quarter(&self) -> Quarter {
        match self.month {
            1..=3 => Quarter::Q1,
            4..=6 => Quarter::Q2,
            7..=9 => Quarter::Q3,
            _ => Quarter::Q4,
        }
    }

    /// Formats the period as `YYYY-MM`.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

/// SQL macros mirroring [`Period`] for use inside report queries.
pub(crate) const PERIOD_MACROS: &str = r#"
CREATE OR REPLACE MACRO period_year(month_year) AS
    CAST(SUBSTR(CAST(month_year AS VARCHAR), 1, 4) AS INTEGER);

CREATE OR REPLACE MACRO period_month(month_year) AS
    CAST(SUBSTR(CAST(month_year AS VARCHAR), 5, 2) AS INTEGER);

CREATE OR REPLACE MACRO period_quarter(month_year) AS
    CASE
        WHEN period_month(month_year) BETWEEN 1 AND 3 THEN 'Q1'
        WHEN period_month(month_year) BETWEEN 4 AND 6 THEN 'Q2'
        WHEN period_month(month_year) BETWEEN 7 AND 9 THEN 'Q3'
        ELSE 'Q4'
    END;

CREATE OR REPLACE MACRO period_label(month_year) AS
    SUBSTR(CAST(month_year AS VARCHAR), 1, 4) || '-' || SUBSTR(CAST(month_year AS VARCHAR), 5, 2);
"#;
