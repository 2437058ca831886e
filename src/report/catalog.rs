use crate::report::Report;

const POLICY: &[&str] = &["Policy"];
const POLICY_AND_CLAIMS: &[&str] = &["Policy", "Claims"];
const CLAIMS: &[&str] = &["Claims"];

/// Every report, in output order.
pub(crate) static REPORTS: [Report; 13] = [
    Report {
        name: "policy_sample",
        title: "Policy sample",
        tables: POLICY,
        columns: &[],
        sql: "SELECT * FROM Policy LIMIT 5",
    },
    Report {
        name: "quarterly_premium_income",
        title: "Premium income by quarter",
        tables: POLICY,
        columns: &["Year", "Quarter", "PremiumIncome"],
        sql: r#"
SELECT period_year(MONTH_YEAR) AS Year,
       period_quarter(MONTH_YEAR) AS Quarter,
       SUM(TOTAL_PREM) AS PremiumIncome
FROM Policy
GROUP BY Year, Quarter
ORDER BY Year, Quarter"#,
    },
    Report {
        name: "annual_premium_income",
        title: "Premium income by year",
        tables: POLICY,
        columns: &["Year", "AnnualPremiumIncome"],
        sql: r#"
SELECT period_year(MONTH_YEAR) AS Year,
       SUM(TOTAL_PREM) AS AnnualPremiumIncome
FROM Policy
GROUP BY Year
ORDER BY Year"#,
    },
    Report {
        name: "premium_by_agency",
        title: "Premium income by agency",
        tables: POLICY,
        columns: &["AGENCY_ID", "PremiumIncome"],
        sql: r#"
SELECT AGENCY_ID,
       SUM(TOTAL_PREM) AS PremiumIncome
FROM Policy
GROUP BY AGENCY_ID
ORDER BY AGENCY_ID"#,
    },
    Report {
        name: "commissions_by_agency",
        title: "Total commissions by agency",
        tables: POLICY,
        columns: &["AGENCY_ID", "TotalCommissions"],
        sql: r#"
SELECT AGENCY_ID,
       SUM(SUB1 + SUB2 + SUB3 + SUB4 + SUB5) AS TotalCommissions
FROM Policy
GROUP BY AGENCY_ID
ORDER BY AGENCY_ID"#,
    },
    Report {
        name: "policies_sold_by_agency",
        title: "Policies sold by agency per year",
        tables: POLICY,
        columns: &["Year", "AGENCY_ID", "PoliciesSold"],
        sql: r#"
SELECT period_year(MONTH_YEAR) AS Year,
       AGENCY_ID,
       COUNT(*) AS PoliciesSold
FROM Policy
GROUP BY Year, AGENCY_ID
ORDER BY Year, AGENCY_ID"#,
    },
    Report {
        name: "extensions_sold_trend",
        title: "Extensions sold per month",
        tables: POLICY,
        columns: &["YearMonth", "TotalExpansionsSold"],
        sql: r#"
SELECT period_label(MONTH_YEAR) AS YearMonth,
       SUM(SUB1 + SUB2 + SUB3 + SUB4 + SUB5) AS TotalExpansionsSold
FROM Policy
GROUP BY YearMonth
ORDER BY YearMonth"#,
    },
    Report {
        name: "non_profit_policies",
        title: "Policies with claims above premium per month",
        tables: POLICY_AND_CLAIMS,
        columns: &["YearMonth", "NonProfitPolicies"],
        sql: r#"
SELECT period_label(Policy.MONTH_YEAR) AS YearMonth,
       COUNT(*) AS NonProfitPolicies
FROM Policy
INNER JOIN Claims ON CAST(Policy.POLICY_ID AS VARCHAR) = CAST(Claims.POLICY_ID AS VARCHAR)
WHERE Policy.TOTAL_PREM < Claims.CLAIM_PAYMENT_NIS_AMOUNT
GROUP BY YearMonth
ORDER BY YearMonth"#,
    },
    Report {
        name: "quarterly_profitability",
        title: "Profitability by quarter",
        tables: POLICY_AND_CLAIMS,
        columns: &["Year", "Quarter", "TotalProfit", "ProfitabilityRate"],
        sql: r#"
SELECT period_year(Policy.MONTH_YEAR) AS Year,
       period_quarter(Policy.MONTH_YEAR) AS Quarter,
       SUM(Policy.TOTAL_PREM - Claims.CLAIM_PAYMENT_NIS_AMOUNT) AS TotalProfit,
       CASE
           WHEN SUM(Policy.TOTAL_PREM) > 0 THEN
               (SUM(Policy.TOTAL_PREM - Claims.CLAIM_PAYMENT_NIS_AMOUNT) / SUM(Policy.TOTAL_PREM)) * 100
           ELSE 0
       END AS ProfitabilityRate
FROM Policy
INNER JOIN Claims ON CAST(Policy.POLICY_ID AS VARCHAR) = CAST(Claims.POLICY_ID AS VARCHAR)
GROUP BY Year, Quarter
ORDER BY Year, Quarter"#,
    },
    Report {
        name: "annual_profitability",
        title: "Profitability by year",
        tables: POLICY_AND_CLAIMS,
        columns: &["Year", "TotalProfitByYear", "ProfitabilityRateByYear"],
        sql: r#"
SELECT period_year(Policy.MONTH_YEAR) AS Year,
       SUM(Policy.TOTAL_PREM - Claims.CLAIM_PAYMENT_NIS_AMOUNT) AS TotalProfitByYear,
       CASE
           WHEN SUM(Policy.TOTAL_PREM) > 0 THEN
               (SUM(Policy.TOTAL_PREM - Claims.CLAIM_PAYMENT_NIS_AMOUNT) / SUM(Policy.TOTAL_PREM)) * 100
           ELSE 0
       END AS ProfitabilityRateByYear
FROM Policy
INNER JOIN Claims ON CAST(Policy.POLICY_ID AS VARCHAR) = CAST(Claims.POLICY_ID AS VARCHAR)
GROUP BY Year
ORDER BY Year"#,
    },
    Report {
        name: "customer_retention",
        title: "Year-over-year customer retention by agency",
        tables: POLICY,
        columns: &["AGENCY_ID", "PurchaseYear", "TotalCustomers", "RetainedCustomers", "RetentionRate"],
        // The Total row averages the yearly rates instead of recomputing from the summed counts.
        sql: r#"
WITH CustomerPurchases AS (
    SELECT AGENCY_ID,
           ID_NUM,
           period_year(MONTH_YEAR) AS Year,
           COUNT(*) AS NumberOfPolicies
    FROM Policy
    GROUP BY AGENCY_ID, ID_NUM, Year
),
YearlyRetention AS (
    SELECT CP1.AGENCY_ID,
           CP1.Year AS PurchaseYear,
           COUNT(DISTINCT CP1.ID_NUM) AS TotalCustomers,
           COUNT(DISTINCT CP2.ID_NUM) AS RetainedCustomers,
           COUNT(DISTINCT CP2.ID_NUM) * 100.0 / COUNT(DISTINCT CP1.ID_NUM) AS RetentionRate
    FROM CustomerPurchases CP1
    LEFT JOIN CustomerPurchases CP2
        ON CP1.ID_NUM = CP2.ID_NUM
       AND CP1.AGENCY_ID = CP2.AGENCY_ID
       AND CP2.Year = CP1.Year + 1
    GROUP BY CP1.AGENCY_ID, CP1.Year
)
SELECT AGENCY_ID,
       CAST(PurchaseYear AS VARCHAR) AS PurchaseYear,
       TotalCustomers,
       RetainedCustomers,
       RetentionRate
FROM YearlyRetention
UNION ALL
SELECT AGENCY_ID,
       'Total' AS PurchaseYear,
       SUM(TotalCustomers) AS TotalCustomers,
       SUM(RetainedCustomers) AS RetainedCustomers,
       AVG(RetentionRate) AS RetentionRate
FROM YearlyRetention
GROUP BY AGENCY_ID
ORDER BY AGENCY_ID, PurchaseYear"#,
    },
    Report {
        name: "average_claim_by_year",
        title: "Average claim amount by year",
        tables: CLAIMS,
        columns: &["Year", "AvgClaimAmount"],
        sql: r#"
SELECT period_year(MONTH_YEAR) AS Year,
       AVG(CLAIM_PAYMENT_NIS_AMOUNT) AS AvgClaimAmount
FROM Claims
GROUP BY Year
ORDER BY Year"#,
    },
    Report {
        name: "total_premiums_by_year",
        title: "Total premiums collected by year",
        tables: POLICY,
        columns: &["Year", "TotalPremiumsCollected"],
        sql: r#"
SELECT period_year(MONTH_YEAR) AS Year,
       SUM(TOTAL_PREM) AS TotalPremiumsCollected
FROM Policy
GROUP BY Year
ORDER BY Year"#,
    },
];
