use crate::error::Result;
use crate::loader::CleanTable;
use csv::StringRecord;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};
use tempfile::NamedTempFile;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write `contents` to a temporary file next to `path` and rename it into
/// place, so a crashed run never leaves a truncated file behind.
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut NamedTempFile) -> Result<()>,
{
    ensure_parent(path)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    write(&mut tmp)?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

/// Persist the cleaned table: header row, one line per record, full rewrite.
pub fn write_cleaned(path: &Path, table: &CleanTable) -> Result<()> {
    write_atomic(path, |tmp| {
        let mut wtr = csv::Writer::from_writer(tmp.as_file_mut());
        wtr.write_record(table.headers())?;
        for r in &table.records {
            wtr.write_record(table.render_row(r))?;
        }
        wtr.flush()?;
        Ok(())
    })
}

pub fn write_records(path: &Path, headers: &StringRecord, records: &[StringRecord]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(headers)?;
    for r in records {
        wtr.write_record(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    write_text(path, &s)
}

pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    write_atomic(path, |tmp| {
        tmp.write_all(contents.as_bytes())?;
        Ok(())
    })
}

pub fn markdown_rows<T>(rows: &[T]) -> String
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows.to_vec()).with(Style::markdown()).to_string()
}

/// Markdown table with headers chosen at runtime.
pub fn markdown_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(|h| h.to_string()));
    for r in rows {
        builder.push_record(r);
    }
    builder.build().with(Style::markdown()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureConfig;
    use crate::loader::{clean_table, RawTable};
    use crate::types::GroupChurnCount;
    use tempfile::tempdir;

    #[test]
    fn test_write_cleaned_creates_parent_and_header() {
        let raw = RawTable {
            headers: vec!["tenure".into(), "Contract".into(), "MonthlyCharges".into(), "TotalCharges".into(), "Churn".into()],
            rows: vec![vec!["3".into(), "One year".into(), "20.5".into(), "61.5".into(), "No".into()]],
        };
        let (table, _) = clean_table(raw, &FeatureConfig::default()).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("cleaned.csv");
        write_cleaned(&path, &table).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "tenure,Contract,MonthlyCharges,TotalCharges,Churn,TenureGroup,ChargeGroup,RiskCategory\n\
             3,One year,20.5,61.5,0,New,Low,Low\n"
        );
    }

    #[test]
    fn test_write_text_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.md");
        write_text(&path, "first").unwrap();
        write_text(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_markdown_table_has_headers() {
        let s = markdown_table(&["Contract", "Total"], vec![vec!["One year".into(), "3".into()]]);
        assert!(s.contains("| Contract"));
        assert!(s.contains("One year"));
        assert!(s.lines().count() >= 3);
    }

    #[test]
    fn test_markdown_rows_empty() {
        let rows: Vec<GroupChurnCount> = vec![];
        assert_eq!(markdown_rows(&rows), "(no rows)");
    }
}
