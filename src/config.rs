use crate::error::Error;
use glob::Pattern;
use std::path::PathBuf;

/// Workbook read when no path is given.
pub const DEFAULT_WORKBOOK: &str = "data/datas.xlsx";

/// Settings of one reporting run.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Workbook to load
    pub workbook: PathBuf,
    /// Report name patterns; empty runs every report
    pub reports: Vec<Pattern>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workbook: PathBuf::from(DEFAULT_WORKBOOK),
            reports: Vec::new(),
        }
    }
}

impl Config {
    /// Builds a configuration, compiling the report patterns.
    pub fn new<P: Into<PathBuf>>(workbook: Option<P>, reports: &[String]) -> Result<Config, Error> {
        let reports = reports
            .iter()
            .map(|pattern| Pattern::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Config {
            workbook: workbook.map(Into::into).unwrap_or_else(|| PathBuf::from(DEFAULT_WORKBOOK)),
            reports,
        })
    }
}
