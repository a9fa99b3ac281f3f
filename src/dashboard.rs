//! Console churn dashboard: contract and payment-method filters, headline
//! KPIs and per-segment churn breakdowns over the cleaned table.

use crate::error::Result;
use crate::loader::CleanedDataset;
use crate::output::{markdown_rows, write_json, write_records};
use crate::plots::{group_churn_counts, tenure_order};
use crate::types::{ChargeSummaryRow, CustomerRow, GroupChurnCount, Kpis};
use crate::util::{average, format_int, format_number, median, pct, round2};
use chrono::{DateTime, Local};
use csv::StringRecord;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Multi-select filters. An empty selection keeps every value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardFilter {
    pub contracts: Vec<String>,
    pub payment_methods: Vec<String>,
}

impl DashboardFilter {
    pub fn matches(&self, row: &CustomerRow) -> bool {
        let contract_ok = self.contracts.is_empty() || self.contracts.iter().any(|c| c == &row.contract);
        let payment_ok = self.payment_methods.is_empty()
            || self.payment_methods.iter().any(|p| p == &row.payment_method);
        contract_ok && payment_ok
    }
}

/// Distinct values offered by the contract and payment-method selectors.
pub fn filter_options(rows: &[CustomerRow]) -> (Vec<String>, Vec<String>) {
    let contracts: BTreeSet<&str> = rows.iter().map(|r| r.contract.as_str()).collect();
    let payments: BTreeSet<&str> = rows.iter().map(|r| r.payment_method.as_str()).collect();
    (
        contracts.into_iter().map(String::from).collect(),
        payments.into_iter().map(String::from).collect(),
    )
}

/// The filtered slice of the dataset, keeping the full records for export.
pub struct FilteredView {
    pub headers: StringRecord,
    pub records: Vec<StringRecord>,
    pub rows: Vec<CustomerRow>,
}

pub fn apply_filter(dataset: &CleanedDataset, filter: &DashboardFilter) -> FilteredView {
    let mut records = Vec::new();
    let mut rows = Vec::new();
    for (record, row) in dataset.records.iter().zip(&dataset.rows) {
        if filter.matches(row) {
            records.push(record.clone());
            rows.push(row.clone());
        }
    }
    FilteredView {
        headers: dataset.headers.clone(),
        records,
        rows,
    }
}

pub fn compute_kpis(rows: &[CustomerRow]) -> Kpis {
    let total = rows.len();
    let churned = rows.iter().filter(|r| r.churned()).count();
    Kpis {
        total_customers: total,
        active_customers: total - churned,
        churned_customers: churned,
        churn_rate_pct: round2(pct(churned, total)),
    }
}

pub fn charge_summary(rows: &[CustomerRow]) -> Vec<ChargeSummaryRow> {
    [0u8, 1u8]
        .iter()
        .filter_map(|c| {
            let values: Vec<f64> = rows
                .iter()
                .filter(|r| r.churn == *c)
                .map(|r| r.monthly_charges)
                .collect();
            if values.is_empty() {
                return None;
            }
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            Some(ChargeSummaryRow {
                churn: *c,
                customers: values.len(),
                min: format_number(min, 2),
                median: format_number(median(values.clone()), 2),
                mean: format_number(average(&values), 2),
                max: format_number(max, 2),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub generated_at: DateTime<Local>,
    pub contracts: Vec<String>,
    pub payment_methods: Vec<String>,
    pub kpis: Kpis,
    pub by_contract: Vec<GroupChurnCount>,
    pub by_payment_method: Vec<GroupChurnCount>,
    pub by_tenure_group: Vec<GroupChurnCount>,
}

pub fn build_summary(rows: &[CustomerRow], filter: &DashboardFilter) -> DashboardSummary {
    DashboardSummary {
        generated_at: Local::now(),
        contracts: filter.contracts.clone(),
        payment_methods: filter.payment_methods.clone(),
        kpis: compute_kpis(rows),
        by_contract: group_churn_counts(rows, |r| r.contract.clone(), None),
        by_payment_method: group_churn_counts(rows, |r| r.payment_method.clone(), None),
        by_tenure_group: group_churn_counts(rows, |r| r.tenure_group.to_string(), Some(tenure_order().as_slice())),
    }
}

pub fn render(summary: &DashboardSummary, rows: &[CustomerRow]) -> String {
    let k = &summary.kpis;
    let selection = |v: &[String]| if v.is_empty() { "all".to_string() } else { v.join(", ") };
    let mut out = String::new();
    out.push_str("# Telecom Customer Churn Dashboard\n\n");
    out.push_str(&format!(
        "Filters: Contract = {}; PaymentMethod = {}\n\n",
        selection(summary.contracts.as_slice()),
        selection(summary.payment_methods.as_slice())
    ));
    out.push_str("## Key Performance Indicators\n\n");
    out.push_str(&format!(
        "Total Customers: {}  |  Active: {}  |  Churned: {}  |  Churn Rate: {:.2}%\n\n",
        format_int(k.total_customers),
        format_int(k.active_customers),
        format_int(k.churned_customers),
        k.churn_rate_pct
    ));
    let sections: [(&str, &Vec<GroupChurnCount>); 3] = [
        ("Churn by Contract Type", &summary.by_contract),
        ("Churn by Payment Method", &summary.by_payment_method),
        ("Churn by Tenure Group", &summary.by_tenure_group),
    ];
    for (title, table) in sections {
        out.push_str(&format!("## {}\n\n{}\n\n", title, markdown_rows(table)));
    }
    out.push_str(&format!(
        "## Monthly Charges by Churn\n\n{}\n",
        markdown_rows(&charge_summary(rows))
    ));
    out
}

/// Filter, print, and optionally export. Returns the KPIs of the selection.
pub fn run_dashboard(
    dataset: &CleanedDataset,
    filter: &DashboardFilter,
    export_csv: Option<&Path>,
    export_json: Option<&Path>,
) -> Result<Kpis> {
    let (contracts, payments) = filter_options(&dataset.rows);
    tracing::debug!("Contract options: {:?}; PaymentMethod options: {:?}", contracts, payments);
    let view = apply_filter(dataset, filter);
    tracing::info!(
        "Dashboard selection: {} of {} customers",
        format_int(view.rows.len()),
        format_int(dataset.rows.len())
    );
    let summary = build_summary(&view.rows, filter);
    println!("{}", render(&summary, &view.rows));

    if let Some(path) = export_csv {
        write_records(path, &view.headers, &view.records)?;
        tracing::info!("Filtered data exported to {}", path.display());
    }
    if let Some(path) = export_json {
        write_json(path, &summary)?;
        tracing::info!("Dashboard summary written to {}", path.display());
    }
    Ok(summary.kpis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChargeGroup, RiskCategory, TenureGroup};

    fn customer(contract: &str, payment: &str, monthly: f64, churn: u8) -> CustomerRow {
        CustomerRow {
            contract: contract.to_string(),
            payment_method: payment.to_string(),
            internet_service: "DSL".to_string(),
            tenure: 10,
            monthly_charges: monthly,
            total_charges: monthly * 10.0,
            churn,
            tenure_group: TenureGroup::New,
            charge_group: ChargeGroup::Low,
            risk_category: RiskCategory::Low,
        }
    }

    fn dataset() -> CleanedDataset {
        let rows = vec![
            customer("Month-to-month", "Electronic check", 80.0, 1),
            customer("Month-to-month", "Mailed check", 40.0, 0),
            customer("One year", "Electronic check", 60.0, 0),
            customer("Two year", "Credit card (automatic)", 30.0, 0),
        ];
        let headers = StringRecord::from(vec!["Contract", "PaymentMethod", "Churn"]);
        let records = rows
            .iter()
            .map(|r| StringRecord::from(vec![r.contract.clone(), r.payment_method.clone(), r.churn.to_string()]))
            .collect();
        CleanedDataset { headers, records, rows }
    }

    #[test]
    fn test_empty_filter_keeps_all() {
        let view = apply_filter(&dataset(), &DashboardFilter::default());
        assert_eq!(view.rows.len(), 4);
        assert_eq!(view.records.len(), 4);
    }

    #[test]
    fn test_filter_by_contract_and_payment() {
        let filter = DashboardFilter {
            contracts: vec!["Month-to-month".into(), "One year".into()],
            payment_methods: vec!["Electronic check".into()],
        };
        let view = apply_filter(&dataset(), &filter);
        assert_eq!(view.rows.len(), 2);
        assert!(view.rows.iter().all(|r| r.payment_method == "Electronic check"));
        assert_eq!(&view.records[0][0], "Month-to-month");
    }

    #[test]
    fn test_kpis() {
        let k = compute_kpis(&dataset().rows);
        assert_eq!(k.total_customers, 4);
        assert_eq!(k.churned_customers, 1);
        assert_eq!(k.active_customers, 3);
        assert_eq!(k.churn_rate_pct, 25.0);
        let empty = compute_kpis(&[]);
        assert_eq!(empty.churn_rate_pct, 0.0);
    }

    #[test]
    fn test_filter_options_are_distinct_and_sorted() {
        let (contracts, payments) = filter_options(&dataset().rows);
        assert_eq!(contracts, ["Month-to-month", "One year", "Two year"]);
        assert_eq!(payments.len(), 3);
    }

    #[test]
    fn test_charge_summary() {
        let rows = charge_summary(&dataset().rows);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].customers, 3);
        assert_eq!(rows[0].median, "40.00");
        assert_eq!(rows[1].mean, "80.00");
    }

    #[test]
    fn test_run_dashboard_exports() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("filtered.csv");
        let json_path = dir.path().join("summary.json");
        let filter = DashboardFilter {
            contracts: vec!["Month-to-month".into()],
            payment_methods: vec![],
        };
        let kpis = run_dashboard(&dataset(), &filter, Some(&csv_path), Some(&json_path)).unwrap();
        assert_eq!(kpis.total_customers, 2);
        let csv_text = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv_text.lines().count(), 3);
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["kpis"]["churned_customers"], 1);
        assert_eq!(json["by_tenure_group"].as_array().unwrap().len(), 3);
    }
}
