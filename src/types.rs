use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// Customer lifetime bucket derived from `tenure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TenureGroup {
    New,
    Medium,
    Long,
}

impl TenureGroup {
    pub const ALL: [TenureGroup; 3] = [TenureGroup::New, TenureGroup::Medium, TenureGroup::Long];

    pub fn as_str(&self) -> &'static str {
        match self {
            TenureGroup::New => "New",
            TenureGroup::Medium => "Medium",
            TenureGroup::Long => "Long",
        }
    }
}

/// Dataset-relative tertile of `MonthlyCharges`, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChargeGroup {
    Low,
    Medium,
    High,
}

impl ChargeGroup {
    pub const ALL: [ChargeGroup; 3] = [ChargeGroup::Low, ChargeGroup::Medium, ChargeGroup::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeGroup::Low => "Low",
            ChargeGroup::Medium => "Medium",
            ChargeGroup::High => "High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskCategory {
    High,
    Medium,
    Low,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::High => "High",
            RiskCategory::Medium => "Medium",
            RiskCategory::Low => "Low",
        }
    }
}

impl fmt::Display for TenureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ChargeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw row that survived deduplication, numeric repair, the missing-value
/// drop and label encoding. Row-local features are already attached; the
/// charge bucket needs the whole dataset and is assigned afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRecord {
    /// Raw fields in input column order, untouched.
    pub fields: Vec<String>,
    pub tenure: i64,
    pub monthly_charges: f64,
    pub total_charges: f64,
    pub churn: u8,
    pub contract: String,
    pub tenure_group: TenureGroup,
}

/// One row of the cleaned table.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub fields: Vec<String>,
    pub tenure: i64,
    pub monthly_charges: f64,
    pub total_charges: f64,
    pub churn: u8,
    pub contract: String,
    pub tenure_group: TenureGroup,
    pub charge_group: ChargeGroup,
    pub risk_category: RiskCategory,
}

/// Typed read-only view of a cleaned-table row, used by the reporting
/// surfaces. Extra columns in the file are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CustomerRow {
    #[serde(rename = "Contract")]
    pub contract: String,
    #[serde(rename = "PaymentMethod")]
    pub payment_method: String,
    #[serde(rename = "InternetService")]
    pub internet_service: String,
    #[serde(rename = "tenure")]
    pub tenure: i64,
    #[serde(rename = "MonthlyCharges")]
    pub monthly_charges: f64,
    #[serde(rename = "TotalCharges")]
    pub total_charges: f64,
    #[serde(rename = "Churn")]
    pub churn: u8,
    #[serde(rename = "TenureGroup")]
    pub tenure_group: TenureGroup,
    #[serde(rename = "ChargeGroup")]
    pub charge_group: ChargeGroup,
    #[serde(rename = "RiskCategory")]
    pub risk_category: RiskCategory,
}

impl CustomerRow {
    pub fn churned(&self) -> bool {
        self.churn == 1
    }
}

/// Count summary of one cleaning run. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub total_rows: usize,
    pub duplicates_removed: usize,
    pub repaired_total_charges: usize,
    pub dropped_missing: usize,
    pub dropped_invalid_churn: usize,
    pub written_rows: usize,
}

/// Group-level churn rate, the shape shared by several SQL-style reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnRateRow {
    pub group: String,
    pub total: usize,
    pub churned: usize,
    pub churn_rate_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ChargesByChurnRow {
    #[serde(rename = "Churn")]
    #[tabled(rename = "Churn")]
    pub churn: u8,
    #[serde(rename = "Avg_Monthly_Charges")]
    #[tabled(rename = "Avg_Monthly_Charges")]
    pub avg_monthly_charges: f64,
    #[serde(rename = "Avg_Total_Charges")]
    #[tabled(rename = "Avg_Total_Charges")]
    pub avg_total_charges: f64,
}

/// Customers per (category, churn) pair, used by the plots and the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct GroupChurnCount {
    #[tabled(rename = "Group")]
    pub group: String,
    #[tabled(rename = "Retained")]
    pub retained: usize,
    #[tabled(rename = "Churned")]
    pub churned: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_customers: usize,
    pub active_customers: usize,
    pub churned_customers: usize,
    pub churn_rate_pct: f64,
}

/// Five-number summary of a numeric sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxStats {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ChargeSummaryRow {
    #[tabled(rename = "Churn")]
    pub churn: u8,
    #[tabled(rename = "Customers")]
    pub customers: usize,
    #[tabled(rename = "Min")]
    pub min: String,
    #[tabled(rename = "Median")]
    pub median: String,
    #[tabled(rename = "Mean")]
    pub mean: String,
    #[tabled(rename = "Max")]
    pub max: String,
}
