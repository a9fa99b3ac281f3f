use crate::config::{
    FeatureConfig, COL_CHARGE_GROUP, COL_CHURN, COL_CONTRACT, COL_MONTHLY_CHARGES,
    COL_RISK_CATEGORY, COL_TENURE, COL_TENURE_GROUP, COL_TOTAL_CHARGES,
};
use crate::error::{ChurnError, Result};
use crate::features::{assign_features, tenure_group, ChargeBreaks};
use crate::types::{CleanRecord, CleanReport, CustomerRow, PreparedRecord};
use crate::util::{format_float, format_int, is_missing, parse_f64_safe, parse_i64_safe};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::path::Path;

/// The raw feed as read from disk: header plus text rows, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Positions of the columns the cleaning stage reads.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSchema {
    pub headers: Vec<String>,
    pub tenure: usize,
    pub monthly_charges: usize,
    pub total_charges: usize,
    pub contract: usize,
    pub churn: usize,
}

fn column_index(headers: &[String], name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| ChurnError::MissingColumn(name.to_string()))
}

impl RawSchema {
    pub fn from_headers(headers: &[String]) -> Result<Self> {
        Ok(Self {
            headers: headers.to_vec(),
            tenure: column_index(headers, COL_TENURE)?,
            monthly_charges: column_index(headers, COL_MONTHLY_CHARGES)?,
            total_charges: column_index(headers, COL_TOTAL_CHARGES)?,
            contract: column_index(headers, COL_CONTRACT)?,
            churn: column_index(headers, COL_CHURN)?,
        })
    }
}

/// The cleaned table: raw columns (with `TotalCharges` and `Churn`
/// rewritten) followed by the three derived columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanTable {
    pub schema: RawSchema,
    pub records: Vec<CleanRecord>,
    pub charge_breaks: Option<ChargeBreaks>,
}

impl CleanTable {
    pub fn headers(&self) -> Vec<String> {
        let mut headers = self.schema.headers.clone();
        headers.extend(
            [COL_TENURE_GROUP, COL_CHARGE_GROUP, COL_RISK_CATEGORY]
                .iter()
                .map(|s| s.to_string()),
        );
        headers
    }

    pub fn render_row(&self, record: &CleanRecord) -> Vec<String> {
        let mut row = record.fields.clone();
        row[self.schema.tenure] = row[self.schema.tenure].trim().to_string();
        row[self.schema.monthly_charges] = row[self.schema.monthly_charges].trim().to_string();
        row[self.schema.total_charges] = format_float(record.total_charges);
        row[self.schema.churn] = record.churn.to_string();
        row.push(record.tenure_group.to_string());
        row.push(record.charge_group.to_string());
        row.push(record.risk_category.to_string());
        row
    }
}

pub fn read_raw(path: &Path) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }
    Ok(RawTable { headers, rows })
}

/// Drop rows identical in every field to an earlier row. First occurrence
/// and input order are kept. Returns the survivors and the number removed.
pub fn dedup_rows(rows: Vec<Vec<String>>) -> (Vec<Vec<String>>, usize) {
    let before = rows.len();
    let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(before);
    let kept: Vec<Vec<String>> = rows
        .into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}

/// `TotalCharges` as a number, or `0.0` when it does not parse.
/// The flag reports whether the default was substituted.
pub fn repair_total_charges(raw: &str) -> (f64, bool) {
    match parse_f64_safe(Some(raw)) {
        Some(v) => (v, false),
        None => (0.0, true),
    }
}

/// Exact-match label encoding: `Yes` is 1, `No` is 0, anything else is
/// unrecognized.
pub fn encode_churn(label: &str) -> Option<u8> {
    match label {
        "Yes" => Some(1),
        "No" => Some(0),
        _ => None,
    }
}

/// Row-local cleaning in the fixed order: numeric repair, missing-value
/// drop, label encoding, tenure bucket. Counts go into `report`.
pub fn prepare_rows(
    schema: &RawSchema,
    rows: Vec<Vec<String>>,
    cfg: &FeatureConfig,
    report: &mut CleanReport,
) -> Vec<PreparedRecord> {
    let width = schema.headers.len();
    let mut prepared = Vec::with_capacity(rows.len());

    for fields in rows {
        if fields.len() != width {
            report.dropped_missing += 1;
            continue;
        }

        let (total_charges, repaired) = repair_total_charges(&fields[schema.total_charges]);
        if repaired {
            report.repaired_total_charges += 1;
        }

        let has_missing = fields
            .iter()
            .enumerate()
            .any(|(i, f)| i != schema.total_charges && is_missing(f));
        let tenure = parse_i64_safe(Some(fields[schema.tenure].as_str()));
        let monthly_charges = parse_f64_safe(Some(fields[schema.monthly_charges].as_str()));
        let (tenure, monthly_charges) = match (has_missing, tenure, monthly_charges) {
            (false, Some(t), Some(m)) => (t, m),
            _ => {
                report.dropped_missing += 1;
                continue;
            }
        };

        let churn = match encode_churn(&fields[schema.churn]) {
            Some(c) => c,
            None => {
                tracing::warn!("Unrecognized Churn label {:?}, dropping row", fields[schema.churn]);
                report.dropped_invalid_churn += 1;
                continue;
            }
        };

        let contract = fields[schema.contract].clone();
        prepared.push(PreparedRecord {
            fields,
            tenure,
            monthly_charges,
            total_charges,
            churn,
            contract,
            tenure_group: tenure_group(tenure, cfg),
        });
    }
    prepared
}

/// Full in-memory transformation of a raw table into the cleaned table.
pub fn clean_table(raw: RawTable, cfg: &FeatureConfig) -> Result<(CleanTable, CleanReport)> {
    cfg.validate()?;
    let schema = RawSchema::from_headers(&raw.headers)?;
    let mut report = CleanReport {
        total_rows: raw.rows.len(),
        ..Default::default()
    };

    let (rows, duplicates) = dedup_rows(raw.rows);
    report.duplicates_removed = duplicates;
    tracing::info!("Removed {} duplicate rows.", format_int(duplicates));

    let prepared = prepare_rows(&schema, rows, cfg, &mut report);
    tracing::info!(
        "Repaired {} TotalCharges values, dropped {} rows with missing values, {} with unrecognized Churn labels.",
        format_int(report.repaired_total_charges),
        format_int(report.dropped_missing),
        format_int(report.dropped_invalid_churn)
    );

    let (records, charge_breaks) = assign_features(prepared);
    if let Some(b) = &charge_breaks {
        tracing::info!("ChargeGroup boundaries (MonthlyCharges): {:?}", b.edges());
    }
    report.written_rows = records.len();

    Ok((
        CleanTable {
            schema,
            records,
            charge_breaks,
        },
        report,
    ))
}

/// The cleaned table as read back by the reporting surfaces. `records` keeps
/// every column for export; `rows` is the typed view of the same lines.
#[derive(Debug, Clone)]
pub struct CleanedDataset {
    pub headers: StringRecord,
    pub records: Vec<StringRecord>,
    pub rows: Vec<CustomerRow>,
}

const CLEANED_REQUIRED: [&str; 10] = [
    COL_CONTRACT,
    "PaymentMethod",
    "InternetService",
    COL_TENURE,
    COL_MONTHLY_CHARGES,
    COL_TOTAL_CHARGES,
    COL_CHURN,
    COL_TENURE_GROUP,
    COL_CHARGE_GROUP,
    COL_RISK_CATEGORY,
];

pub fn load_cleaned(path: &Path) -> Result<CleanedDataset> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_path(path)?;
    let headers = rdr.headers()?.clone();
    for name in CLEANED_REQUIRED {
        if !headers.iter().any(|h| h == name) {
            return Err(ChurnError::MissingColumn(name.to_string()));
        }
    }

    let mut records = Vec::new();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row: CustomerRow = record.deserialize(Some(&headers))?;
        rows.push(row);
        records.push(record);
    }
    tracing::debug!("Loaded {} cleaned rows from {}", rows.len(), path.display());
    Ok(CleanedDataset {
        headers,
        records,
        rows,
    })
}
