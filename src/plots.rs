//! Exploratory charts of the cleaned table, rendered with Plotters.
//!
//! Every chart is split into a pure data step (counts, quartiles,
//! correlations) and a drawing step, so the numbers can be tested without a
//! font stack.

use crate::error::{ChurnError, Result};
use crate::types::{BoxStats, CustomerRow, GroupChurnCount, TenureGroup};
use crate::util::{box_stats, pearson};
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

type DrawResult = std::result::Result<(), Box<dyn Error>>;

const RETAINED_COLOR: RGBColor = RGBColor(144, 238, 144);
const CHURNED_COLOR: RGBColor = RGBColor(255, 160, 158);

pub const NUMERIC_COLUMNS: [&str; 4] = ["tenure", "MonthlyCharges", "TotalCharges", "Churn"];

/// Number of retained (index 0) and churned (index 1) customers.
pub fn churn_counts(data: &[CustomerRow]) -> [usize; 2] {
    let churned = data.iter().filter(|r| r.churned()).count();
    [data.len() - churned, churned]
}

/// Retained/churned counts per category. Categories follow `order` when
/// given, otherwise they are sorted by name.
pub fn group_churn_counts<F>(data: &[CustomerRow], key: F, order: Option<&[&str]>) -> Vec<GroupChurnCount>
where
    F: Fn(&CustomerRow) -> String,
{
    let mut map: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for r in data {
        let e = map.entry(key(r)).or_insert((0, 0));
        if r.churned() {
            e.1 += 1;
        } else {
            e.0 += 1;
        }
    }
    let to_row = |group: String, (retained, churned): (usize, usize)| GroupChurnCount {
        group,
        retained,
        churned,
    };
    match order {
        Some(order) => order
            .iter()
            .map(|g| {
                let counts = map.get(*g).copied().unwrap_or((0, 0));
                to_row(g.to_string(), counts)
            })
            .collect(),
        None => map.into_iter().map(|(g, c)| to_row(g, c)).collect(),
    }
}

pub fn tenure_order() -> Vec<&'static str> {
    TenureGroup::ALL.iter().map(|g| g.as_str()).collect()
}

/// Five-number summary of `MonthlyCharges` for churn 0 and 1, skipping a
/// class with no customers.
pub fn charges_box_stats(data: &[CustomerRow]) -> Vec<(u8, BoxStats)> {
    [0u8, 1u8]
        .iter()
        .filter_map(|c| {
            let values: Vec<f64> = data
                .iter()
                .filter(|r| r.churn == *c)
                .map(|r| r.monthly_charges)
                .collect();
            box_stats(values).map(|b| (*c, b))
        })
        .collect()
}

fn numeric_column(data: &[CustomerRow], idx: usize) -> Vec<f64> {
    data.iter()
        .map(|r| match idx {
            0 => r.tenure as f64,
            1 => r.monthly_charges,
            2 => r.total_charges,
            _ => r.churn as f64,
        })
        .collect()
}

/// Pearson correlation between every pair of [`NUMERIC_COLUMNS`]; `None`
/// where a column is constant.
pub fn correlation_matrix(data: &[CustomerRow]) -> Vec<Vec<Option<f64>>> {
    let columns: Vec<Vec<f64>> = (0..NUMERIC_COLUMNS.len())
        .map(|i| numeric_column(data, i))
        .collect();
    columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
        .collect()
}

fn category_label(names: &[String], x: f64) -> String {
    let idx = x.round();
    if idx < 0.0 || (x - idx).abs() > 1e-6 {
        return String::new();
    }
    names.get(idx as usize).cloned().unwrap_or_default()
}

fn draw_grouped_bars(path: &Path, title: &str, x_desc: &str, rows: &[GroupChurnCount]) -> DrawResult {
    let names: Vec<String> = rows.iter().map(|r| r.group.clone()).collect();
    let n = rows.len().max(1);
    let max_count = rows
        .iter()
        .map(|r| r.retained.max(r.churned))
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    let root = BitMapBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..(max_count * 1.1))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|x| category_label(&names, *x))
        .x_desc(x_desc)
        .y_desc("Customers")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart
        .draw_series(rows.iter().enumerate().map(|(i, r)| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x, r.retained as f64)], RETAINED_COLOR.filled())
        }))?
        .label("Retained (0)")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], RETAINED_COLOR.filled()));

    chart
        .draw_series(rows.iter().enumerate().map(|(i, r)| {
            let x = i as f64;
            Rectangle::new([(x, 0.0), (x + 0.4, r.churned as f64)], CHURNED_COLOR.filled())
        }))?
        .label("Churned (1)")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], CHURNED_COLOR.filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_churn_distribution(path: &Path, counts: [usize; 2]) -> DrawResult {
    let names = vec!["0".to_string(), "1".to_string()];
    let max_count = counts[0].max(counts[1]).max(1) as f64;

    let root = BitMapBackend::new(path, (600, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Overall Churn Distribution (0=No, 1=Yes)", ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..1.5f64, 0f64..(max_count * 1.1))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(2)
        .x_label_formatter(&|x| category_label(&names, *x))
        .x_desc("Churn")
        .y_desc("Customers")
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(i, c)| {
        let x = i as f64;
        let color = if i == 0 { RETAINED_COLOR } else { CHURNED_COLOR };
        Rectangle::new([(x - 0.35, 0.0), (x + 0.35, *c as f64)], color.filled())
    }))?;

    root.present()?;
    Ok(())
}

fn draw_charges_box(path: &Path, stats: &[(u8, BoxStats)]) -> DrawResult {
    let names = vec!["0".to_string(), "1".to_string()];
    let y_max = stats.iter().map(|(_, b)| b.max).fold(0.0f64, f64::max).max(1.0);

    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Charges Distribution by Churn Status", ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..1.5f64, 0f64..(y_max * 1.1))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(2)
        .x_label_formatter(&|x| category_label(&names, *x))
        .x_desc("Churn")
        .y_desc("MonthlyCharges")
        .draw()?;

    for (churn, b) in stats {
        let x = *churn as f64;
        let color = if *churn == 0 { RETAINED_COLOR } else { CHURNED_COLOR };
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x, b.min), (x, b.max)],
            BLACK.stroke_width(1),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.25, b.q1), (x + 0.25, b.q3)],
            color.filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.25, b.q1), (x + 0.25, b.q3)],
            BLACK.stroke_width(1),
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x - 0.25, b.median), (x + 0.25, b.median)],
            BLACK.stroke_width(2),
        )))?;
    }

    root.present()?;
    Ok(())
}

/// Blue for -1, white for 0, red for +1.
fn diverging_color(v: f64) -> RGBColor {
    let v = v.clamp(-1.0, 1.0);
    let fade = |t: f64| (255.0 * (1.0 - t)) as u8;
    if v >= 0.0 {
        RGBColor(255, fade(v), fade(v))
    } else {
        RGBColor(fade(-v), fade(-v), 255)
    }
}

fn draw_heatmap(path: &Path, matrix: &[Vec<Option<f64>>]) -> DrawResult {
    let names: Vec<String> = NUMERIC_COLUMNS.iter().map(|s| s.to_string()).collect();
    let n = names.len();

    let root = BitMapBackend::new(path, (900, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Correlation Heatmap", ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(120)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), -0.5f64..(n as f64 - 0.5))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&|x| category_label(&names, *x))
        .y_label_formatter(&|y| category_label(&names, *y))
        .draw()?;

    for (i, row) in matrix.iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            let (x, y) = (j as f64, i as f64);
            let fill = value.map(diverging_color).unwrap_or(RGBColor(200, 200, 200));
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                fill.filled(),
            )))?;
            let text = value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "n/a".to_string());
            chart.draw_series(std::iter::once(Text::new(
                text,
                (x - 0.12, y + 0.05),
                ("sans-serif", 18).into_font(),
            )))?;
        }
    }

    root.present()?;
    Ok(())
}

fn plot_err(chart: &str, e: Box<dyn Error>) -> ChurnError {
    ChurnError::Plot(format!("{}: {}", chart, e))
}

/// Render all charts into `dir`, returning the files written.
pub fn generate_plots(data: &[CustomerRow], dir: &Path) -> Result<Vec<PathBuf>> {
    if data.is_empty() {
        return Err(ChurnError::EmptyDataset("no rows to plot".to_string()));
    }
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let path = dir.join("churn_distribution.png");
    draw_churn_distribution(&path, churn_counts(data)).map_err(|e| plot_err("churn distribution", e))?;
    written.push(path);

    let bars: [(&str, &str, &str, Vec<GroupChurnCount>); 3] = [
        (
            "churn_by_contract.png",
            "Churn by Contract Type",
            "Contract",
            group_churn_counts(data, |r| r.contract.clone(), None),
        ),
        (
            "churn_by_payment.png",
            "Churn by Payment Method",
            "PaymentMethod",
            group_churn_counts(data, |r| r.payment_method.clone(), None),
        ),
        (
            "churn_by_tenure_group.png",
            "Churn by Tenure Group",
            "TenureGroup",
            group_churn_counts(data, |r| r.tenure_group.to_string(), Some(tenure_order().as_slice())),
        ),
    ];
    for (file, title, x_desc, rows) in bars.iter() {
        let path = dir.join(file);
        draw_grouped_bars(&path, title, x_desc, rows).map_err(|e| plot_err(title, e))?;
        written.push(path);
    }

    let path = dir.join("monthly_charges_vs_churn.png");
    draw_charges_box(&path, &charges_box_stats(data)).map_err(|e| plot_err("monthly charges", e))?;
    written.push(path);

    let path = dir.join("correlation_heatmap.png");
    draw_heatmap(&path, &correlation_matrix(data)).map_err(|e| plot_err("correlation heatmap", e))?;
    written.push(path);

    for p in &written {
        tracing::debug!("Wrote {}", p.display());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChargeGroup, RiskCategory};

    fn customer(contract: &str, payment: &str, tenure: i64, group: TenureGroup, monthly: f64, churn: u8) -> CustomerRow {
        CustomerRow {
            contract: contract.to_string(),
            payment_method: payment.to_string(),
            internet_service: "DSL".to_string(),
            tenure,
            monthly_charges: monthly,
            total_charges: monthly * tenure as f64,
            churn,
            tenure_group: group,
            charge_group: ChargeGroup::Medium,
            risk_category: RiskCategory::Medium,
        }
    }

    fn sample() -> Vec<CustomerRow> {
        vec![
            customer("Month-to-month", "Electronic check", 1, TenureGroup::New, 70.0, 1),
            customer("Month-to-month", "Mailed check", 5, TenureGroup::New, 60.0, 1),
            customer("One year", "Mailed check", 20, TenureGroup::Medium, 40.0, 0),
            customer("Two year", "Bank transfer (automatic)", 60, TenureGroup::Long, 30.0, 0),
            customer("Two year", "Electronic check", 70, TenureGroup::Long, 20.0, 0),
        ]
    }

    #[test]
    fn test_churn_counts() {
        assert_eq!(churn_counts(&sample()), [3, 2]);
        assert_eq!(churn_counts(&[]), [0, 0]);
    }

    #[test]
    fn test_group_counts_sorted_by_name() {
        let rows = group_churn_counts(&sample(), |r| r.contract.clone(), None);
        let keys: Vec<&str> = rows.iter().map(|r| r.group.as_str()).collect();
        assert_eq!(keys, ["Month-to-month", "One year", "Two year"]);
        assert_eq!((rows[0].retained, rows[0].churned), (0, 2));
        assert_eq!((rows[2].retained, rows[2].churned), (2, 0));
    }

    #[test]
    fn test_group_counts_follow_tenure_order() {
        let data: Vec<CustomerRow> = sample().into_iter().filter(|r| r.tenure_group != TenureGroup::Medium).collect();
        let rows = group_churn_counts(&data, |r| r.tenure_group.to_string(), Some(tenure_order().as_slice()));
        let keys: Vec<&str> = rows.iter().map(|r| r.group.as_str()).collect();
        assert_eq!(keys, ["New", "Medium", "Long"]);
        assert_eq!((rows[1].retained, rows[1].churned), (0, 0));
    }

    #[test]
    fn test_charges_box_stats() {
        let stats = charges_box_stats(&sample());
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].0, 0);
        assert_eq!(stats[0].1.median, 30.0);
        assert_eq!(stats[1].1.min, 60.0);
        assert_eq!(stats[1].1.max, 70.0);
    }

    #[test]
    fn test_correlation_matrix_shape_and_diagonal() {
        let m = correlation_matrix(&sample());
        assert_eq!(m.len(), NUMERIC_COLUMNS.len());
        for (i, row) in m.iter().enumerate() {
            assert_eq!(row.len(), NUMERIC_COLUMNS.len());
            assert!((row[i].unwrap() - 1.0).abs() < 1e-12);
        }
        // Higher monthly charges go with churn in the sample.
        assert!(m[1][3].unwrap() > 0.0);
        assert!((m[1][3].unwrap() - m[3][1].unwrap()).abs() < 1e-12);
    }

    #[test]
    fn test_category_label() {
        let names = vec!["a".to_string(), "b".to_string()];
        assert_eq!(category_label(&names, 0.0), "a");
        assert_eq!(category_label(&names, 1.0), "b");
        assert_eq!(category_label(&names, 0.5), "");
        assert_eq!(category_label(&names, -1.0), "");
        assert_eq!(category_label(&names, 5.0), "");
    }

    #[test]
    fn test_diverging_color() {
        assert_eq!(diverging_color(0.0), RGBColor(255, 255, 255));
        assert_eq!(diverging_color(1.0), RGBColor(255, 0, 0));
        assert_eq!(diverging_color(-1.0), RGBColor(0, 0, 255));
    }

    #[test]
    fn test_generate_plots_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let err = generate_plots(&[], dir.path()).unwrap_err();
        assert!(matches!(err, ChurnError::EmptyDataset(_)));
    }

    #[test]
    fn test_generate_plots_writes_all_charts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plots");
        let written = generate_plots(&sample(), &out).unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "churn_distribution.png",
                "churn_by_contract.png",
                "churn_by_payment.png",
                "churn_by_tenure_group.png",
                "monthly_charges_vs_churn.png",
                "correlation_heatmap.png"
            ]
        );
        for p in &written {
            assert!(fs::metadata(p).unwrap().len() > 0, "{} is empty", p.display());
        }
    }
}
