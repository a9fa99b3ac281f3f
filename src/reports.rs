use crate::output::{markdown_rows, markdown_table};
use crate::types::{ChargesByChurnRow, ChurnRateRow, CustomerRow};
use crate::util::{average, pct, round2};
use std::cmp::Ordering;
use std::collections::HashMap;

/// One section of the SQL insights document.
pub struct ReportSection {
    pub title: &'static str,
    pub sql: &'static str,
    pub table: String,
}

const CONTRACT_SQL: &str = "SELECT
    Contract,
    COUNT(*) as Total_Customers,
    SUM(Churn) as Churned_Customers,
    ROUND(CAST(SUM(Churn) AS FLOAT) / COUNT(*) * 100, 2) as Churn_Rate_Percent
FROM churn_data
GROUP BY Contract
ORDER BY Churn_Rate_Percent DESC;";

const TENURE_SQL: &str = "SELECT
    TenureGroup,
    COUNT(*) as Total_Customers,
    SUM(Churn) as Churned_Customers,
    ROUND(CAST(SUM(Churn) AS FLOAT) / COUNT(*) * 100, 2) as Churn_Rate_Percent
FROM churn_data
GROUP BY TenureGroup
ORDER BY Churn_Rate_Percent DESC;";

const CHARGES_SQL: &str = "SELECT
    Churn,
    ROUND(AVG(MonthlyCharges), 2) as Avg_Monthly_Charges,
    ROUND(AVG(TotalCharges), 2) as Avg_Total_Charges
FROM churn_data
GROUP BY Churn;";

const INTERNET_SQL: &str = "SELECT
    InternetService,
    COUNT(*) as Total,
    SUM(Churn) as Churned,
    ROUND(CAST(SUM(Churn) AS FLOAT) / COUNT(*) * 100, 2) as Churn_Rate
FROM churn_data
GROUP BY InternetService
ORDER BY Churn_Rate DESC;";

/// `GROUP BY key` with count, churned count and churn rate, ordered by rate
/// descending and then by key.
pub fn churn_rate_by<F>(data: &[CustomerRow], key: F) -> Vec<ChurnRateRow>
where
    F: Fn(&CustomerRow) -> String,
{
    let mut map: HashMap<String, (usize, usize)> = HashMap::new();
    for r in data {
        let e = map.entry(key(r)).or_insert((0, 0));
        e.0 += 1;
        e.1 += r.churn as usize;
    }
    let mut rows: Vec<ChurnRateRow> = map
        .into_iter()
        .map(|(group, (total, churned))| ChurnRateRow {
            group,
            total,
            churned,
            churn_rate_pct: round2(pct(churned, total)),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.churn_rate_pct
            .partial_cmp(&a.churn_rate_pct)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.group.cmp(&b.group))
    });
    rows
}

pub fn churn_by_contract(data: &[CustomerRow]) -> Vec<ChurnRateRow> {
    churn_rate_by(data, |r| r.contract.clone())
}

pub fn churn_by_tenure_group(data: &[CustomerRow]) -> Vec<ChurnRateRow> {
    churn_rate_by(data, |r| r.tenure_group.to_string())
}

pub fn churn_by_internet_service(data: &[CustomerRow]) -> Vec<ChurnRateRow> {
    churn_rate_by(data, |r| r.internet_service.clone())
}

pub fn charges_by_churn(data: &[CustomerRow]) -> Vec<ChargesByChurnRow> {
    let mut map: HashMap<u8, (Vec<f64>, Vec<f64>)> = HashMap::new();
    for r in data {
        let e = map.entry(r.churn).or_default();
        e.0.push(r.monthly_charges);
        e.1.push(r.total_charges);
    }
    let mut rows: Vec<ChargesByChurnRow> = map
        .into_iter()
        .map(|(churn, (monthly, total))| ChargesByChurnRow {
            churn,
            avg_monthly_charges: round2(average(&monthly)),
            avg_total_charges: round2(average(&total)),
        })
        .collect();
    rows.sort_by_key(|r| r.churn);
    rows
}

fn rate_table(key_header: &str, count_headers: [&str; 3], rows: &[ChurnRateRow]) -> String {
    let headers = [key_header, count_headers[0], count_headers[1], count_headers[2]];
    let body = rows
        .iter()
        .map(|r| {
            vec![
                r.group.clone(),
                r.total.to_string(),
                r.churned.to_string(),
                format!("{:.2}", r.churn_rate_pct),
            ]
        })
        .collect();
    markdown_table(&headers, body)
}

const CUSTOMER_COUNTS: [&str; 3] = ["Total_Customers", "Churned_Customers", "Churn_Rate_Percent"];

pub fn build_sections(data: &[CustomerRow]) -> Vec<ReportSection> {
    vec![
        ReportSection {
            title: "1. Churn Rate by Contract Type",
            sql: CONTRACT_SQL,
            table: rate_table("Contract", CUSTOMER_COUNTS, &churn_by_contract(data)),
        },
        ReportSection {
            title: "2. Churn by Tenure Group (Do short-tenure customers churn more?)",
            sql: TENURE_SQL,
            table: rate_table("TenureGroup", CUSTOMER_COUNTS, &churn_by_tenure_group(data)),
        },
        ReportSection {
            title: "3. Average Monthly Charges: Churn vs Non-Churn",
            sql: CHARGES_SQL,
            table: markdown_rows(&charges_by_churn(data)),
        },
        ReportSection {
            title: "4. Risk Analysis by Internet Service",
            sql: INTERNET_SQL,
            table: rate_table(
                "InternetService",
                ["Total", "Churned", "Churn_Rate"],
                &churn_by_internet_service(data),
            ),
        },
    ]
}

pub fn render_markdown(sections: &[ReportSection]) -> String {
    let mut out = String::from("# SQL Analysis Insights\n\n");
    for s in sections {
        out.push_str(&format!("## {}\n```sql\n{}\n```\n\n{}\n\n", s.title, s.sql, s.table));
    }
    out
}
