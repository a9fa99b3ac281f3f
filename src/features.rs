//! Derived churn features: tenure buckets, charge tertiles and the composite
//! risk category.
//!
//! Tenure and risk are row-local pure functions. Charge buckets depend on the
//! whole dataset, so they are computed in two passes: first the boundaries
//! over every `MonthlyCharges` value ([`ChargeBreaks::compute`]), then a
//! per-row lookup ([`ChargeBreaks::classify`]).

use crate::config::{FeatureConfig, CHARGE_BUCKETS, MONTH_TO_MONTH};
use crate::types::{ChargeGroup, CleanRecord, PreparedRecord, RiskCategory, TenureGroup};
use crate::util::{quantile_ratio_sorted, sort_floats};

/// `<= tenure_new_max` is New, `<= tenure_medium_max` is Medium, else Long.
pub fn tenure_group(tenure: i64, cfg: &FeatureConfig) -> TenureGroup {
    if tenure <= cfg.tenure_new_max {
        TenureGroup::New
    } else if tenure <= cfg.tenure_medium_max {
        TenureGroup::Medium
    } else {
        TenureGroup::Long
    }
}

/// Risk depends on the contract and the charge bucket only.
pub fn risk_category(contract: &str, charge_group: ChargeGroup) -> RiskCategory {
    if contract != MONTH_TO_MONTH {
        RiskCategory::Low
    } else if charge_group == ChargeGroup::High {
        RiskCategory::High
    } else {
        RiskCategory::Medium
    }
}

/// Inner quantile boundaries of `MonthlyCharges` for one dataset.
///
/// Bins are right-inclusive: a value equal to a boundary falls in the lower
/// bucket. Equal boundaries are allowed and simply leave a bucket empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeBreaks {
    edges: Vec<f64>,
}

impl ChargeBreaks {
    /// Returns `None` for an empty sample: there is nothing to bucket.
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sort_floats(&mut sorted);
        let edges = (1..CHARGE_BUCKETS)
            .map(|k| quantile_ratio_sorted(&sorted, k, CHARGE_BUCKETS))
            .collect::<Option<Vec<f64>>>()?;
        Some(Self { edges })
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn classify(&self, value: f64) -> ChargeGroup {
        let idx = self.edges.iter().take_while(|edge| value > **edge).count();
        ChargeGroup::ALL[idx.min(ChargeGroup::ALL.len() - 1)]
    }
}

/// Second pass over the prepared rows: assign charge buckets from the
/// dataset-wide boundaries, then the risk category per row.
pub fn assign_features(prepared: Vec<PreparedRecord>) -> (Vec<CleanRecord>, Option<ChargeBreaks>) {
    let charges: Vec<f64> = prepared.iter().map(|r| r.monthly_charges).collect();
    let Some(breaks) = ChargeBreaks::compute(&charges) else {
        return (Vec::new(), None);
    };

    let records = prepared
        .into_iter()
        .map(|r| {
            let charge_group = breaks.classify(r.monthly_charges);
            let risk = risk_category(&r.contract, charge_group);
            CleanRecord {
                fields: r.fields,
                tenure: r.tenure,
                monthly_charges: r.monthly_charges,
                total_charges: r.total_charges,
                churn: r.churn,
                contract: r.contract,
                tenure_group: r.tenure_group,
                charge_group,
                risk_category: risk,
            }
        })
        .collect();
    (records, Some(breaks))
}
