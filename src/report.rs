use crate::models::{RunSummary, VerificationResult};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Column order of the verification CSV
pub const CSV_COLUMNS: [&str; 11] = [
    "property_id",
    "hyperlink_text",
    "actual_hotel_name",
    "availability_status",
    "vendor_url",
    "successful_dates",
    "dates_tried",
    "currency",
    "daily_rate",
    "error_message",
    "source_page_url",
];

fn csv_row(result: &VerificationResult) -> [String; 11] {
    [
        result.property_id.map(|id| id.to_string()).unwrap_or_default(),
        result.hyperlink_text.clone(),
        result.actual_name.clone().unwrap_or_default(),
        result.status.to_string(),
        result.vendor_url.clone(),
        result.successful_dates.map(|d| d.to_string()).unwrap_or_default(),
        result
            .dates_tried
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("; "),
        result.currency.clone(),
        result.daily_rate.map(|r| r.to_string()).unwrap_or_default(),
        result.error_message.clone().unwrap_or_default(),
        result.source_page_url.clone(),
    ]
}

/// Writes results as CSV, header first, in input order
pub fn write_csv<W: Write>(writer: W, results: &[VerificationResult]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_COLUMNS).context("Failed to write CSV header")?;
    for result in results {
        csv.write_record(csv_row(result)).context("Failed to write CSV row")?;
    }
    csv.flush().context("Failed to flush CSV output")?;
    Ok(())
}

pub fn save_csv(path: &Path, results: &[VerificationResult]) -> Result<()> {
    ensure_parent(path)?;
    let file = fs::File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    write_csv(file, results)?;
    info!("✓ Results saved to {}", path.display());
    Ok(())
}

pub fn save_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json).with_context(|| format!("Failed to write summary to {:?}", path))?;
    info!("✓ JSON summary saved to {}", path.display());
    Ok(())
}

pub fn load_summary(path: &Path) -> Result<RunSummary> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read summary from {:?}", path))?;
    let summary = serde_json::from_str(&content).with_context(|| format!("Failed to parse summary {:?}", path))?;
    Ok(summary)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    Ok(())
}
