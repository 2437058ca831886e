//! Insurance Reports CLI
//!
//! Loads an insurance workbook and prints the aggregation reports.

use anyhow::Context;
use anyhow::Result;
use clap::ArgAction;
use clap::Parser;
use insurance_reports::config::DEFAULT_WORKBOOK;
use insurance_reports::report;
use insurance_reports::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "insurance-reports")]
#[command(version)]
#[command(about = "Load an insurance workbook and print premium, claim and retention reports", long_about = None)]
struct Cli {
    /// Workbook to load
    #[arg(value_name = "WORKBOOK", default_value = DEFAULT_WORKBOOK)]
    workbook: PathBuf,

    /// Run only the reports matching this glob (repeatable)
    #[arg(short, long = "report", value_name = "GLOB")]
    reports: Vec<String>,

    /// List the available reports and exit
    #[arg(long)]
    list: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if cli.list {
        for report in report::catalog() {
            println!("{:<28} {}", report.name, report.title);
        }
        return Ok(());
    }

    let config = Config::new(Some(cli.workbook), &cli.reports).context("Invalid report pattern")?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    insurance_reports::run(&config, &mut out)
        .with_context(|| format!("Reporting on '{}' failed", config.workbook.display()))?;
    Ok(())
}
