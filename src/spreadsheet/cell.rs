use crate::spreadsheet::reference::index_to_reference;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;

/// Types of cell data in a workbook.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as `0`/`1`
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// Inline string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values
    Error,
}

impl CellType {
    /// Parses built-in number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Parses custom number format codes for date/time tokens outside of
    /// literals, escapes and bracketed sections.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_bracket = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_literal => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }

    /// Returns true for numbers carrying a date, time or date/time format.
    pub(crate) fn is_serial_datetime(&self) -> bool {
        matches!(
            self,
            Self::NumberDateTime1900
                | Self::NumberDate1900
                | Self::NumberTime1900
                | Self::NumberDateTime1904
                | Self::NumberDate1904
                | Self::NumberTime1904
        )
    }

    fn is_1904(&self) -> bool {
        matches!(
            self,
            Self::NumberDateTime1904 | Self::NumberDate1904 | Self::NumberTime1904
        )
    }
}

/// A single cell with position, type and raw value.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) kind: CellType,
    /// Raw cell value; an index into the shared strings for `SharedString`
    pub(crate) value: String,
}

impl Cell {
    /// Returns the A1-style cell reference.
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    pub(crate) fn to_boolean(&self) -> bool {
        self.value == "1" || self.value.eq_ignore_ascii_case("true")
    }

    /// Returns true if the numeric value has no fractional part and fits an i64 exactly.
    pub(crate) fn is_integer(&self) -> bool {
        self.value.parse::<i64>().is_ok()
            || self
                .value
                .parse::<f64>()
                .map(|value| value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15)
                .unwrap_or(false)
    }

    pub(crate) fn to_bigint(&self) -> Result<i64, String> {
        if let Ok(value) = self.value.parse::<i64>() {
            return Ok(value);
        }
        match self.value.parse::<f64>() {
            Ok(value) if value.fract() == 0.0 && value.abs() < 9.0e15 => Ok(value as i64),
            _ => Err(format!("parse '{}' to bigint failed", self.value)),
        }
    }

    pub(crate) fn to_double(&self) -> Result<f64, String> {
        self.value.parse::<f64>().map_err(|_| format!("parse '{}' to double failed", self.value))
    }

    pub(crate) fn to_datetime(&self) -> Result<NaiveDateTime, String> {
        match self.kind {
            kind if kind.is_serial_datetime() => serial_to_datetime(self.to_double()?, kind.is_1904())
                .ok_or_else(|| format!("serial '{}' out of date range", self.value)),
            CellType::IsoDateTime => parse_iso_datetime(&self.value),
            _ => Err(format!("parse '{}' to datetime failed", self.value)),
        }
    }

    pub(crate) fn to_date(&self) -> Result<NaiveDate, String> {
        self.to_datetime().map(|datetime| datetime.date())
    }

    pub(crate) fn to_time(&self) -> Result<NaiveTime, String> {
        self.to_datetime().map(|datetime| datetime.time())
    }

    /// Renders the value as text; shared strings are resolved against `shared_strings`.
    pub(crate) fn to_text(&self, shared_strings: &[String]) -> Result<String, String> {
        match self.kind {
            CellType::SharedString => self
                .value
                .parse::<usize>()
                .ok()
                .and_then(|index| shared_strings.get(index))
                .cloned()
                .ok_or_else(|| format!("shared string '{}' not found", self.value)),
            CellType::Boolean => Ok(if self.to_boolean() { "true" } else { "false" }.to_owned()),
            CellType::Number if self.is_integer() => self.to_bigint().map(|value| value.to_string()),
            CellType::Number => self.to_double().map(|value| value.to_string()),
            CellType::NumberDate1900 | CellType::NumberDate1904 => {
                self.to_date().map(|date| date.format("%Y-%m-%d").to_string())
            }
            CellType::NumberTime1900 | CellType::NumberTime1904 => {
                self.to_time().map(|time| time.format("%H:%M:%S%.f").to_string())
            }
            CellType::NumberDateTime1900 | CellType::NumberDateTime1904 => {
                self.to_datetime().map(|datetime| datetime.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            }
            CellType::IsoDateTime => Ok(self.value.replace('T', " ")),
            CellType::InlineString => Ok(self.value.to_owned()),
            CellType::Empty | CellType::Error => Err(format!("cell '{}' has no text", self.reference())),
        }
    }
}

/// Converts a serial day number to a date/time.
/// The 1900 system counts the fictitious 1900-02-29 (serial 60).
fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.trunc() as i64;
    let offset = if is_1904 {
        1_462
    } else if days < 60 {
        1
    } else {
        0
    };
    let micros = (serial.fract() * 86_400_000_000f64).round() as i64;
    NaiveDate::from_ymd_opt(1899, 12, 30)?
        .checked_add_signed(Duration::days(days + offset))?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::microseconds(micros))
}

fn parse_iso_datetime(value: &str) -> Result<NaiveDateTime, String> {
    if value.contains('T') {
        NaiveDateTime::parse_from_str(value.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|_| format!("parse '{value}' to NaiveDateTime failed"))
    } else if value.contains(':') && !value.contains('-') {
        NaiveTime::parse_from_str(value, "%H:%M:%S%.f")
            .map(|time| NaiveDate::from_ymd_opt(1899, 12, 31).expect("NaiveDate Literal").and_time(time))
            .map_err(|_| format!("parse '{value}' to NaiveTime failed"))
    } else {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|date| date.and_hms_opt(0, 0, 0).expect("Append 00:00:00"))
            .map_err(|_| format!("parse '{value}' to NaiveDate failed"))
    }
}
