//! Churn report: cleans a customer-attrition dataset, derives churn features
//! and produces SQL-style reports, exploratory charts and a filtering
//! dashboard over the cleaned table.
//!
//! The cleaned table is written once per run and only read afterwards.

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod features;
pub mod loader;
pub mod logging;
pub mod output;
pub mod plots;
pub mod reports;
pub mod types;
pub mod util;

pub use config::{Config, FeatureConfig};
pub use error::{ChurnError, Result};
pub use loader::{clean_table, load_cleaned, read_raw, CleanTable, CleanedDataset};
pub use types::{ChargeGroup, CleanReport, RiskCategory, TenureGroup};

use std::path::{Path, PathBuf};

/// Read the raw feed at `input`, clean it and write the cleaned table to
/// `output`. The raw file is never modified.
pub fn clean_and_engineer(input: &Path, output: &Path, cfg: &FeatureConfig) -> Result<CleanReport> {
    tracing::info!("Loading data from {}", input.display());
    let raw = read_raw(input)?;
    let (table, report) = clean_table(raw, cfg)?;
    tracing::info!("Saving processed data to {}", output.display());
    output::write_cleaned(output, &table)?;
    Ok(report)
}

/// Run the SQL-style aggregates over the cleaned table and write them as
/// Markdown to `report_path`.
pub fn run_sql_analysis(cleaned: &Path, report_path: &Path) -> Result<()> {
    let dataset = load_cleaned(cleaned)?;
    let sections = reports::build_sections(&dataset.rows);
    for s in &sections {
        tracing::debug!("Running: {}", s.title);
    }
    output::write_text(report_path, &reports::render_markdown(&sections))?;
    tracing::info!("SQL analysis results saved to {}", report_path.display());
    Ok(())
}

/// Render the exploratory charts of the cleaned table into `plots_dir`.
pub fn run_eda(cleaned: &Path, plots_dir: &Path) -> Result<Vec<PathBuf>> {
    let dataset = load_cleaned(cleaned)?;
    let written = plots::generate_plots(&dataset.rows, plots_dir)?;
    tracing::info!("EDA plots saved to {}", plots_dir.display());
    Ok(written)
}
