//! Command-line interface definitions and argument parsing

use crate::config::{Config, DEFAULT_CONFIG_FILE};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Customer churn analysis: cleaning, SQL-style reports, charts and dashboard
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the TOML configuration file (defaults apply when absent)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Clean the raw dataset and write the cleaned table
    Clean(CleanArgs),
    /// Write the SQL-style aggregate report as Markdown
    Report(ReportArgs),
    /// Render the exploratory charts
    Plots(PlotsArgs),
    /// Filter the cleaned table and print KPIs and churn breakdowns
    Dashboard(DashboardArgs),
    /// Clean, then report, then plot
    All(AllArgs),
}

#[derive(ClapArgs, Debug, Default)]
pub struct CleanArgs {
    /// Raw CSV input
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Cleaned CSV output
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Tenure months up to which a customer is New
    #[arg(long)]
    pub tenure_new_max: Option<i64>,

    /// Tenure months up to which a customer is Medium
    #[arg(long)]
    pub tenure_medium_max: Option<i64>,
}

#[derive(ClapArgs, Debug, Default)]
pub struct ReportArgs {
    /// Cleaned CSV input
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Markdown report output
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Default)]
pub struct PlotsArgs {
    /// Cleaned CSV input
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory for the PNG charts
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Default)]
pub struct DashboardArgs {
    /// Cleaned CSV input
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Contract types to keep (repeatable or comma-separated; default all)
    #[arg(long = "contract", value_delimiter = ',')]
    pub contracts: Vec<String>,

    /// Payment methods to keep (repeatable or comma-separated; default all)
    #[arg(long = "payment", value_delimiter = ',')]
    pub payment_methods: Vec<String>,

    /// Export the filtered rows to this CSV file
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Write the KPI summary to this JSON file
    #[arg(long)]
    pub export_json: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Default)]
pub struct AllArgs {
    #[command(flatten)]
    pub clean: CleanArgs,

    /// Markdown report output
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Directory for the PNG charts
    #[arg(long)]
    pub plots_dir: Option<PathBuf>,
}

impl CleanArgs {
    /// Fold command-line overrides into the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(p) = &self.input {
            config.paths.raw = p.clone();
        }
        if let Some(p) = &self.output {
            config.paths.cleaned = p.clone();
        }
        if let Some(v) = self.tenure_new_max {
            config.features.tenure_new_max = v;
        }
        if let Some(v) = self.tenure_medium_max {
            config.features.tenure_medium_max = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean_overrides() {
        let args = Args::parse_from([
            "churn_report",
            "clean",
            "--input",
            "raw.csv",
            "--tenure-new-max",
            "6",
        ]);
        let Command::Clean(clean) = args.command else {
            panic!("expected clean subcommand");
        };
        let mut config = Config::default();
        clean.apply(&mut config);
        assert_eq!(config.paths.raw, PathBuf::from("raw.csv"));
        assert_eq!(config.features.tenure_new_max, 6);
        assert_eq!(config.features.tenure_medium_max, 36);
    }

    #[test]
    fn test_parse_dashboard_filters() {
        let args = Args::parse_from([
            "churn_report",
            "--verbose",
            "dashboard",
            "--contract",
            "Month-to-month,One year",
            "--payment",
            "Electronic check",
        ]);
        assert!(args.verbose);
        let Command::Dashboard(d) = args.command else {
            panic!("expected dashboard subcommand");
        };
        assert_eq!(d.contracts, ["Month-to-month", "One year"]);
        assert_eq!(d.payment_methods, ["Electronic check"]);
    }

    #[test]
    fn test_default_config_path() {
        let args = Args::parse_from(["churn_report", "report"]);
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }
}
