use insurance_reports::database::column::ColumnType;
use insurance_reports::database::period::Period;
use insurance_reports::database::store::StoreError;
use insurance_reports::database::table::Scalar;
use insurance_reports::loader::load;
use insurance_reports::loader::LoadError;
use insurance_reports::loader::RecordSet;
use insurance_reports::loader::Tables;
use insurance_reports::report;
use insurance_reports::report::ReportResult;
use insurance_reports::Config;
use insurance_reports::Error;
use insurance_reports::Store;
use rust_xlsxwriter::ExcelDateTime;
use rust_xlsxwriter::Format;
use rust_xlsxwriter::Workbook;
use rust_xlsxwriter::XlsxError;
use std::path::Path;
use std::path::PathBuf;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Clone)]
enum Field {
    Text(&'static str),
    Number(f64),
    Date(u16, u8, u8),
    Blank,
}

use Field::*;

const POLICY_HEADER: &[&str] = &[
    "POLICY_ID", "AGENCY_ID", "ID_NUM", "MONTH_YEAR", "TOTAL_PREM", "SUB1", "SUB2", "SUB3", "SUB4", "SUB5", "START_DATE",
];
const CLAIMS_HEADER: &[&str] = &["POLICY_ID", "MONTH_YEAR", "CLAIM_PAYMENT_NIS_AMOUNT"];
const EXTENSIONS_HEADER: &[&str] = &["POLICY_ID", "EXT_CODE", "AMOUNT"];
const AGENCY_HEADER: &[&str] = &["AGENCY_ID", "AGENCY_NAME"];

fn policy(id: f64, agency: f64, customer: f64, month_year: Field, premium: f64) -> Vec<Field> {
    vec![
        Number(id),
        Number(agency),
        Number(customer),
        month_year,
        Number(premium),
        Number(10.0),
        Number(20.0),
        Number(0.0),
        Number(0.0),
        Number(5.5),
        Date(2024, 3, 1),
    ]
}

fn claim(policy_id: f64, month_year: Field, amount: f64) -> Vec<Field> {
    vec![Number(policy_id), month_year, Number(amount)]
}

fn add_sheet(workbook: &mut Workbook, name: &str, header: &[&str], rows: &[Vec<Field>]) -> Result<(), XlsxError> {
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let worksheet = workbook.add_worksheet().set_name(name)?;
    for (col, title) in header.iter().enumerate() {
        worksheet.write_string(0, col as u16, *title)?;
    }
    for (row, fields) in rows.iter().enumerate() {
        let row = row as u32 + 1;
        for (col, field) in fields.iter().enumerate() {
            let col = col as u16;
            match field {
                Text(value) => {
                    worksheet.write_string(row, col, *value)?;
                }
                Number(value) => {
                    worksheet.write_number(row, col, *value)?;
                }
                Date(year, month, day) => {
                    let date = ExcelDateTime::from_ymd(*year, *month, *day)?;
                    worksheet.write_datetime_with_format(row, col, &date, &date_format)?;
                }
                Blank => (),
            }
        }
    }
    Ok(())
}

struct Fixture {
    policies: Vec<Vec<Field>>,
    claims: Vec<Vec<Field>>,
    skip_sheet: Option<&'static str>,
}

impl Fixture {
    fn new(policies: Vec<Vec<Field>>, claims: Vec<Vec<Field>>) -> Self {
        Self {
            policies,
            claims,
            skip_sheet: None,
        }
    }

    fn standard() -> Self {
        Self::new(
            vec![
                policy(1.0, 7.0, 100.0, Text("202403"), 1000.0),
                policy(2.0, 7.0, 100.0, Text("202407"), 500.0),
                policy(3.0, 8.0, 300.0, Text("202311"), 250.0),
            ],
            vec![claim(1.0, Text("202404"), 400.0), claim(3.0, Text("202312"), 300.0)],
        )
    }

    fn without(mut self, sheet: &'static str) -> Self {
        self.skip_sheet = Some(sheet);
        self
    }

    fn write(&self, directory: &TempDir) -> Result<PathBuf, XlsxError> {
        let path = directory.path().join("datas.xlsx");
        let extensions = vec![
            vec![Number(1.0), Text("ROAD"), Number(12.5)],
            vec![Number(2.0), Text("GLASS"), Blank],
        ];
        let agencies = vec![vec![Number(7.0), Text("North")], vec![Number(8.0), Text("South")]];

        let mut workbook = Workbook::new();
        let sheets: [(&str, &[&str], &[Vec<Field>]); 4] = [
            ("POLICY", POLICY_HEADER, &self.policies),
            ("CLAIMS", CLAIMS_HEADER, &self.claims),
            ("POL_SUB", EXTENSIONS_HEADER, &extensions),
            ("AGENCY", AGENCY_HEADER, &agencies),
        ];
        for (name, header, rows) in sheets {
            if self.skip_sheet != Some(name) {
                add_sheet(&mut workbook, name, header, rows)?;
            }
        }
        workbook.save(&path)?;
        Ok(path)
    }
}

fn run_report(store: &Store, name: &str) -> Result<ReportResult, StoreError> {
    report::find(name).expect("report exists").execute(store)
}

fn number(result: &ReportResult, row: usize, column: &str) -> Option<f64> {
    result.value(row, column).and_then(Scalar::as_f64)
}

fn text<'a>(result: &'a ReportResult, row: usize, column: &str) -> Option<&'a str> {
    result.value(row, column).and_then(Scalar::as_str)
}

fn materialized(path: &Path) -> Result<(Tables, Store), Box<dyn std::error::Error>> {
    let tables = load(path)?;
    let mut store = Store::open_in_memory()?;
    store.materialize(&tables)?;
    Ok((tables, store))
}

#[test]
fn loads_typed_tables_with_verbatim_headers() -> TestResult {
    let directory = tempfile::tempdir()?;
    let tables = load(Fixture::standard().write(&directory)?)?;

    assert_eq!(tables.policy.name, "Policy");
    assert_eq!(tables.policy.column_names(), POLICY_HEADER.to_vec());
    assert_eq!(tables.policy.len(), 3);
    let kinds: Vec<ColumnType> = tables.policy.columns.iter().map(|column| column.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ColumnType::BigInt,
            ColumnType::BigInt,
            ColumnType::BigInt,
            ColumnType::Varchar,
            ColumnType::BigInt,
            ColumnType::BigInt,
            ColumnType::BigInt,
            ColumnType::BigInt,
            ColumnType::BigInt,
            ColumnType::Double,
            ColumnType::Date,
        ]
    );
    assert_eq!(tables.policy.rows[0][3], Scalar::Text("202403".to_owned()));
    assert_eq!(tables.extensions.name, "Extensions");
    assert_eq!(tables.extensions.rows[1][2], Scalar::Null);
    assert_eq!(tables.agency.rows[1][1], Scalar::Text("South".to_owned()));
    Ok(())
}

#[test]
fn materialize_round_trips_every_table() -> TestResult {
    let directory = tempfile::tempdir()?;
    let (tables, store) = materialized(&Fixture::standard().write(&directory)?)?;

    for (record_set, table) in tables.iter() {
        let name = record_set.table_name();
        assert_eq!(store.column_names(name)?, table.column_names(), "columns of {name}");
        assert_eq!(store.select_all(name)?, table.rows, "rows of {name}");
    }
    store.close()?;
    Ok(())
}

#[test]
fn materialize_adds_no_columns() -> TestResult {
    let directory = tempfile::tempdir()?;
    let (tables, store) = materialized(&Fixture::standard().write(&directory)?)?;

    for record_set in RecordSet::ALL {
        let table = tables.get(record_set);
        assert_eq!(store.column_names(record_set.table_name())?.len(), table.columns.len());
    }
    Ok(())
}

#[test]
fn repeated_materialize_replaces_tables() -> TestResult {
    let directory = tempfile::tempdir()?;
    let (tables, mut store) = materialized(&Fixture::standard().write(&directory)?)?;
    let first: Vec<_> = RecordSet::ALL
        .iter()
        .map(|record_set| store.select_all(record_set.table_name()))
        .collect::<Result<_, _>>()?;

    store.materialize(&tables)?;

    for (record_set, rows) in RecordSet::ALL.iter().zip(first) {
        assert_eq!(store.row_count(record_set.table_name())?, rows.len());
        assert_eq!(store.select_all(record_set.table_name())?, rows);
    }
    Ok(())
}

#[test]
fn missing_sheet_fails_before_touching_the_store() -> TestResult {
    let good = tempfile::tempdir()?;
    let (tables, store) = materialized(&Fixture::standard().write(&good)?)?;

    let bad = tempfile::tempdir()?;
    let result = load(Fixture::standard().without("POL_SUB").write(&bad)?);
    assert!(matches!(result, Err(LoadError::MissingSheet { sheet, .. }) if sheet == "POL_SUB"));

    assert_eq!(store.select_all("Policy")?, tables.policy.rows);
    assert_eq!(store.select_all("Extensions")?, tables.extensions.rows);
    Ok(())
}

#[test]
fn unreadable_workbooks_are_malformed() -> TestResult {
    let directory = tempfile::tempdir()?;
    let garbage = directory.path().join("garbage.xlsx");
    std::fs::write(&garbage, b"not a zip archive")?;

    assert!(matches!(load(&garbage), Err(LoadError::MalformedWorkbook { .. })));
    assert!(matches!(
        load(directory.path().join("absent.xlsx")),
        Err(LoadError::MalformedWorkbook { .. })
    ));
    Ok(())
}

#[test]
fn quarterly_premium_income_buckets_by_month_year() -> TestResult {
    let directory = tempfile::tempdir()?;
    let fixture = Fixture::new(
        vec![
            policy(1.0, 7.0, 100.0, Number(202403.0), 1000.0),
            policy(2.0, 7.0, 101.0, Number(202407.0), 500.0),
        ],
        vec![claim(1.0, Number(202403.0), 10.0)],
    );
    let (_, store) = materialized(&fixture.write(&directory)?)?;

    let result = run_report(&store, "quarterly_premium_income")?;
    assert_eq!(result.columns, vec!["Year", "Quarter", "PremiumIncome"]);
    assert_eq!(result.rows.len(), 2);
    assert_eq!(number(&result, 0, "Year"), Some(2024.0));
    assert_eq!(text(&result, 0, "Quarter"), Some("Q1"));
    assert_eq!(number(&result, 0, "PremiumIncome"), Some(1000.0));
    assert_eq!(number(&result, 1, "Year"), Some(2024.0));
    assert_eq!(text(&result, 1, "Quarter"), Some("Q3"));
    assert_eq!(number(&result, 1, "PremiumIncome"), Some(500.0));
    Ok(())
}

#[test]
fn profitability_rates() -> TestResult {
    let directory = tempfile::tempdir()?;
    let fixture = Fixture::new(
        vec![
            policy(1.0, 7.0, 100.0, Text("202403"), 1000.0),
            policy(2.0, 7.0, 101.0, Text("202501"), 0.0),
        ],
        vec![claim(1.0, Text("202403"), 400.0), claim(2.0, Text("202502"), 50.0)],
    );
    let (_, store) = materialized(&fixture.write(&directory)?)?;

    let result = run_report(&store, "quarterly_profitability")?;
    assert_eq!(result.rows.len(), 2);
    assert_eq!(text(&result, 0, "Quarter"), Some("Q1"));
    assert_eq!(number(&result, 0, "TotalProfit"), Some(600.0));
    assert_eq!(number(&result, 0, "ProfitabilityRate"), Some(60.0));
    assert_eq!(number(&result, 1, "TotalProfit"), Some(-50.0));
    assert_eq!(number(&result, 1, "ProfitabilityRate"), Some(0.0));

    let result = run_report(&store, "annual_profitability")?;
    assert_eq!(number(&result, 0, "Year"), Some(2024.0));
    assert_eq!(number(&result, 0, "TotalProfitByYear"), Some(600.0));
    assert_eq!(number(&result, 0, "ProfitabilityRateByYear"), Some(60.0));
    assert_eq!(number(&result, 1, "ProfitabilityRateByYear"), Some(0.0));

    let result = run_report(&store, "non_profit_policies")?;
    assert_eq!(text(&result, 0, "YearMonth"), Some("2025-01"));
    assert_eq!(number(&result, 0, "NonProfitPolicies"), Some(1.0));
    Ok(())
}

#[test]
fn retention_counts_only_returning_customers() -> TestResult {
    let directory = tempfile::tempdir()?;
    let fixture = Fixture::new(
        vec![
            policy(1.0, 7.0, 100.0, Text("202301"), 100.0),
            policy(2.0, 7.0, 100.0, Text("202402"), 100.0),
            policy(3.0, 7.0, 200.0, Text("202305"), 100.0),
        ],
        vec![claim(1.0, Text("202302"), 10.0)],
    );
    let (_, store) = materialized(&fixture.write(&directory)?)?;

    let result = run_report(&store, "customer_retention")?;
    assert_eq!(result.rows.len(), 3);
    assert_eq!(text(&result, 0, "PurchaseYear"), Some("2023"));
    assert_eq!(number(&result, 0, "TotalCustomers"), Some(2.0));
    assert_eq!(number(&result, 0, "RetainedCustomers"), Some(1.0));
    assert_eq!(number(&result, 0, "RetentionRate"), Some(50.0));
    assert_eq!(text(&result, 1, "PurchaseYear"), Some("2024"));
    assert_eq!(number(&result, 1, "RetainedCustomers"), Some(0.0));
    assert_eq!(text(&result, 2, "PurchaseYear"), Some("Total"));
    assert_eq!(number(&result, 2, "TotalCustomers"), Some(3.0));
    assert_eq!(number(&result, 2, "RetentionRate"), Some(25.0));
    Ok(())
}

#[test]
fn claims_and_premiums_by_year() -> TestResult {
    let directory = tempfile::tempdir()?;
    let (_, store) = materialized(&Fixture::standard().write(&directory)?)?;

    let result = run_report(&store, "average_claim_by_year")?;
    assert_eq!(number(&result, 0, "Year"), Some(2023.0));
    assert_eq!(number(&result, 0, "AvgClaimAmount"), Some(300.0));
    assert_eq!(number(&result, 1, "AvgClaimAmount"), Some(400.0));

    let result = run_report(&store, "total_premiums_by_year")?;
    assert_eq!(number(&result, 0, "TotalPremiumsCollected"), Some(250.0));
    assert_eq!(number(&result, 1, "TotalPremiumsCollected"), Some(1500.0));

    let result = run_report(&store, "commissions_by_agency")?;
    assert_eq!(number(&result, 0, "TotalCommissions"), Some(71.0));
    assert_eq!(number(&result, 1, "TotalCommissions"), Some(35.5));
    Ok(())
}

#[test]
fn every_report_runs() -> TestResult {
    let directory = tempfile::tempdir()?;
    let (_, store) = materialized(&Fixture::standard().write(&directory)?)?;

    for report in report::catalog() {
        let result = report.execute(&store)?;
        if !report.columns.is_empty() {
            assert_eq!(result.columns, report.columns, "columns of {}", report.name);
        }
    }
    Ok(())
}

#[test]
fn invalid_period_stops_before_policy_is_created() -> TestResult {
    let directory = tempfile::tempdir()?;
    let fixture = Fixture::new(
        vec![policy(1.0, 7.0, 100.0, Text("March 2024"), 1000.0)],
        vec![claim(1.0, Text("202403"), 400.0)],
    );
    let tables = load(fixture.write(&directory)?)?;
    let mut store = Store::open_in_memory()?;

    let result = store.materialize(&tables);
    assert!(matches!(result, Err(StoreError::InvalidPeriod { column, .. }) if column == "MONTH_YEAR"));
    assert!(!store.table_exists("Policy")?);
    Ok(())
}

#[test]
fn header_only_sheets_materialize_and_report() -> TestResult {
    let directory = tempfile::tempdir()?;
    let (tables, store) = materialized(&Fixture::new(Vec::new(), Vec::new()).write(&directory)?)?;

    assert!(tables.policy.is_empty());
    assert_eq!(tables.policy.column_names(), POLICY_HEADER.to_vec());
    assert_eq!(store.column_names("Policy")?, POLICY_HEADER.to_vec());
    assert_eq!(store.row_count("Claims")?, 0);
    for report in report::catalog() {
        report.execute(&store)?;
    }
    assert!(run_report(&store, "quarterly_premium_income")?.rows.is_empty());
    Ok(())
}

#[test]
fn blank_commission_column_yields_null_totals() -> TestResult {
    let directory = tempfile::tempdir()?;
    let mut row = policy(1.0, 7.0, 100.0, Text("202403"), 1000.0);
    row[9] = Blank;
    let (tables, store) = materialized(&Fixture::new(vec![row], vec![claim(1.0, Text("202403"), 10.0)]).write(&directory)?)?;

    assert_eq!(tables.policy.columns[9].kind, ColumnType::Varchar);
    let result = run_report(&store, "commissions_by_agency")?;
    assert_eq!(result.rows.len(), 1);
    assert_eq!(number(&result, 0, "AGENCY_ID"), Some(7.0));
    assert_eq!(result.value(0, "TotalCommissions"), Some(&Scalar::Null));
    assert_eq!(number(&run_report(&store, "annual_premium_income")?, 0, "AnnualPremiumIncome"), Some(1000.0));
    Ok(())
}

#[test]
fn stray_cells_beside_the_header_are_ignored() -> TestResult {
    let directory = tempfile::tempdir()?;
    let mut fixture = Fixture::standard();
    fixture.policies[2].extend([Blank, Blank, Blank, Text("note")]);
    let (tables, store) = materialized(&fixture.write(&directory)?)?;

    assert_eq!(tables.policy.column_names(), POLICY_HEADER.to_vec());
    assert_eq!(tables.policy.len(), 3);
    assert_eq!(store.column_names("Policy")?, POLICY_HEADER.to_vec());
    Ok(())
}

#[test]
fn period_macros_agree_with_decoded_periods() -> TestResult {
    let directory = tempfile::tempdir()?;
    let fixture = Fixture::new(
        vec![
            policy(1.0, 7.0, 100.0, Text("202403"), 1.0),
            policy(2.0, 7.0, 100.0, Number(202412.0), 1.0),
            policy(3.0, 7.0, 100.0, Text("199907"), 1.0),
        ],
        Vec::new(),
    );
    let (tables, store) = materialized(&fixture.write(&directory)?)?;

    let (_, rows) = store.query(
        "SELECT period_year(MONTH_YEAR), period_month(MONTH_YEAR), period_quarter(MONTH_YEAR), period_label(MONTH_YEAR) \
         FROM Policy ORDER BY POLICY_ID",
    )?;
    assert_eq!(rows.len(), tables.policy.len());
    for (row, decoded) in rows.iter().zip(&tables.policy.rows) {
        let period = Period::from_scalar(&decoded[3]).expect("decodable period");
        assert_eq!(row[0].as_f64(), Some(period.year as f64));
        assert_eq!(row[1].as_f64(), Some(period.month as f64));
        assert_eq!(row[2].as_str(), Some(period.quarter().as_str()));
        assert_eq!(row[3].as_str(), Some(period.label().as_str()));
    }

    let mut padded = tables.clone();
    padded.policy.rows[0][3] = Scalar::Text(" 202412".to_owned());
    let mut store = Store::open_in_memory()?;
    let result = store.materialize(&padded);
    assert!(matches!(result, Err(StoreError::InvalidPeriod { row: 1, value, .. }) if value == " 202412"));
    Ok(())
}

#[test]
fn failed_table_keeps_earlier_tables_and_previous_contents() -> TestResult {
    let directory = tempfile::tempdir()?;
    let (tables, mut store) = materialized(&Fixture::standard().write(&directory)?)?;

    let mut changed = tables.clone();
    changed.policy.rows.truncate(1);
    changed.claims.rows.truncate(1);
    changed.extensions.rows[0][0] = Scalar::Text("abc".to_owned());
    changed.agency.rows.truncate(1);

    let result = store.materialize(&changed);
    assert!(matches!(result, Err(StoreError::Insert { table, .. }) if table == "Extensions"));
    assert_eq!(store.row_count("Policy")?, 1);
    assert_eq!(store.row_count("Claims")?, 1);
    assert_eq!(store.select_all("Extensions")?, tables.extensions.rows);
    assert_eq!(store.select_all("Agency")?, tables.agency.rows);
    Ok(())
}

#[test]
fn missing_required_column_fails_that_table() -> TestResult {
    let directory = tempfile::tempdir()?;
    let (tables, _) = materialized(&Fixture::standard().write(&directory)?)?;

    let mut changed = tables.clone();
    changed.claims.columns.remove(2);
    for row in changed.claims.rows.iter_mut() {
        row.remove(2);
    }
    let mut store = Store::open_in_memory()?;
    let result = store.materialize(&changed);
    assert!(matches!(
        result,
        Err(StoreError::MissingColumn { table, column }) if table == "Claims" && column == "CLAIM_PAYMENT_NIS_AMOUNT"
    ));
    assert!(store.table_exists("Policy")?);
    assert!(!store.table_exists("Claims")?);
    Ok(())
}

#[test]
fn run_writes_selected_reports() -> TestResult {
    let directory = tempfile::tempdir()?;
    let path = Fixture::standard().write(&directory)?;
    let config = Config::new(Some(path), &["quarterly_premium*".to_owned()])?;

    let mut out = Vec::new();
    insurance_reports::run(&config, &mut out)?;
    let output = String::from_utf8(out)?;

    assert!(output.starts_with("== Premium income by quarter (quarterly_premium_income) ==\n"));
    assert!(output.contains("Year | Quarter | PremiumIncome\n"));
    assert!(output.contains("2023 | Q4 | 250\n"));
    assert!(output.contains("2024 | Q1 | 1000\n"));
    assert!(output.contains("2024 | Q3 | 500\n"));
    assert!(!output.contains("customer_retention"));
    Ok(())
}

#[test]
fn run_stops_on_load_failure() -> TestResult {
    let directory = tempfile::tempdir()?;
    let path = Fixture::standard().without("AGENCY").write(&directory)?;
    let config = Config::new(Some(path), &[])?;

    let mut out = Vec::new();
    let result = insurance_reports::run(&config, &mut out);
    assert!(matches!(result, Err(Error::Load(LoadError::MissingSheet { sheet, .. })) if sheet == "AGENCY"));
    assert!(out.is_empty());
    Ok(())
}
