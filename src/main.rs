//! Entry point: parses the command line, loads configuration and runs the
//! requested stage of the churn pipeline.

use anyhow::{Context, Result};
use churn_report::cli::{AllArgs, Args, CleanArgs, Command, DashboardArgs, PlotsArgs, ReportArgs};
use churn_report::dashboard::{run_dashboard, DashboardFilter};
use churn_report::util::format_int;
use churn_report::{clean_and_engineer, load_cleaned, logging, run_eda, run_sql_analysis, Config};
use clap::Parser;
use std::time::Instant;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.verbose);

    let mut config = Config::load(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;

    let start = Instant::now();
    match &args.command {
        Command::Clean(a) => handle_clean(a, &mut config)?,
        Command::Report(a) => handle_report(a, &config)?,
        Command::Plots(a) => handle_plots(a, &config)?,
        Command::Dashboard(a) => handle_dashboard(a, &config)?,
        Command::All(a) => handle_all(a, &mut config)?,
    }
    tracing::debug!("Finished in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn handle_clean(a: &CleanArgs, config: &mut Config) -> Result<()> {
    a.apply(config);
    let report = clean_and_engineer(&config.paths.raw, &config.paths.cleaned, &config.features)
        .with_context(|| format!("cleaning {}", config.paths.raw.display()))?;
    println!(
        "Processed dataset: {} rows read, {} duplicates removed, {} rows written to {}",
        format_int(report.total_rows),
        format_int(report.duplicates_removed),
        format_int(report.written_rows),
        config.paths.cleaned.display()
    );
    if report.dropped_missing + report.dropped_invalid_churn > 0 {
        println!(
            "Note: {} rows dropped for missing values, {} for unrecognized Churn labels.",
            format_int(report.dropped_missing),
            format_int(report.dropped_invalid_churn)
        );
    }
    Ok(())
}

fn handle_report(a: &ReportArgs, config: &Config) -> Result<()> {
    let input = a.input.as_ref().unwrap_or(&config.paths.cleaned);
    let output = a.output.as_ref().unwrap_or(&config.paths.sql_report);
    run_sql_analysis(input, output)
        .with_context(|| format!("running SQL analysis on {}", input.display()))?;
    println!("SQL analysis results saved to {}", output.display());
    Ok(())
}

fn handle_plots(a: &PlotsArgs, config: &Config) -> Result<()> {
    let input = a.input.as_ref().unwrap_or(&config.paths.cleaned);
    let dir = a.output_dir.as_ref().unwrap_or(&config.paths.plots_dir);
    let written = run_eda(input, dir).with_context(|| format!("plotting {}", input.display()))?;
    println!("{} EDA plots saved to {}", written.len(), dir.display());
    Ok(())
}

fn handle_dashboard(a: &DashboardArgs, config: &Config) -> Result<()> {
    let input = a.input.as_ref().unwrap_or(&config.paths.cleaned);
    let dataset = load_cleaned(input).with_context(|| {
        format!(
            "loading {} (run the clean command first)",
            input.display()
        )
    })?;
    let filter = DashboardFilter {
        contracts: a.contracts.clone(),
        payment_methods: a.payment_methods.clone(),
    };
    run_dashboard(
        &dataset,
        &filter,
        a.export_csv.as_deref(),
        a.export_json.as_deref(),
    )?;
    Ok(())
}

fn handle_all(a: &AllArgs, config: &mut Config) -> Result<()> {
    if let Some(p) = &a.report {
        config.paths.sql_report = p.clone();
    }
    if let Some(p) = &a.plots_dir {
        config.paths.plots_dir = p.clone();
    }
    handle_clean(&a.clean, config)?;
    handle_report(&ReportArgs::default(), config)?;
    handle_plots(&PlotsArgs::default(), config)?;
    Ok(())
}
