//! Static HTML health page built from run summaries.
//!
//! Rendering is a pure function of the summaries plus the generation
//! timestamp, so unchanged input yields identical markup apart from that stamp.

use crate::models::{RunHealth, RunSummary};
use crate::report::load_summary;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const SUMMARY_SUFFIX: &str = "_summary.json";

/// Issue count below which the overall banner is a warning rather than critical
const CRITICAL_THRESHOLD: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallHealth {
    Healthy,
    Warning,
    Critical,
}

impl OverallHealth {
    pub fn from_issues(issues: usize) -> Self {
        match issues {
            0 => Self::Healthy,
            n if n < CRITICAL_THRESHOLD => Self::Warning,
            _ => Self::Critical,
        }
    }

    fn badge(self) -> &'static str {
        match self {
            Self::Healthy => "✓ All Systems Healthy",
            Self::Warning => "⚠ Minor Issues Detected",
            Self::Critical => "✗ Critical Issues",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Healthy => "#10b981",
            Self::Warning => "#f59e0b",
            Self::Critical => "#ef4444",
        }
    }
}

/// Loads every `*_summary.json` in `dir`, skipping unreadable files, sorted by destination
pub fn load_summaries(dir: &Path) -> Result<Vec<RunSummary>> {
    let entries = fs::read_dir(dir).with_context(|| format!("Failed to read directory {:?}", dir))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(SUMMARY_SUFFIX))
        })
        .collect();
    paths.sort();

    let mut summaries = Vec::new();
    for path in paths {
        match load_summary(&path) {
            Ok(summary) => summaries.push(summary),
            Err(e) => warn!("Failed to load {}: {:#}", path.display(), e),
        }
    }

    sort_summaries(&mut summaries);
    info!("Found {} destination(s)", summaries.len());
    Ok(summaries)
}

fn sort_summaries(summaries: &mut [RunSummary]) {
    summaries.sort_by(|a, b| {
        destination_label(a)
            .cmp(destination_label(b))
            .then_with(|| a.source_page_url.cmp(&b.source_page_url))
    });
}

fn destination_label(summary: &RunSummary) -> &str {
    summary
        .destination
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or(&summary.source_page_url)
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn destination_rows(summaries: &[RunSummary]) -> String {
    if summaries.is_empty() {
        return r#"<tr><td colspan="6" class="text-center text-muted">No data available</td></tr>"#.to_string();
    }

    let mut rows = String::new();
    for summary in summaries {
        let issues = summary.issues();
        let status_html = match summary.status {
            RunHealth::Healthy if issues == 0 => r#"<span class="badge badge-success">✓ Healthy</span>"#.to_string(),
            _ => format!(r#"<span class="badge badge-warning">⚠ {} Issue(s)</span>"#, issues),
        };
        let issues_cell = if issues > 0 { issues.to_string() } else { "-".to_string() };

        let _ = write!(
            rows,
            r#"
        <tr>
            <td><a href="{url}" target="_blank" class="destination-link">{name}</a></td>
            <td class="text-center">{total}</td>
            <td class="text-center text-success">{available}</td>
            <td class="text-center">{issues}</td>
            <td class="text-center">{status}</td>
            <td class="text-center text-muted">{checked}</td>
        </tr>"#,
            url = escape_html(&summary.source_page_url),
            name = escape_html(destination_label(summary)),
            total = summary.total,
            available = summary.available,
            issues = issues_cell,
            status = status_html,
            checked = summary.timestamp.format("%b %d, %I:%M %p"),
        );

        if !summary.unavailable_properties.is_empty() {
            let items: String = summary
                .unavailable_properties
                .iter()
                .map(|p| {
                    let id = p.property_id.map(|id| format!(" (#{})", id)).unwrap_or_default();
                    let reason = p
                        .error_message
                        .as_deref()
                        .map(|m| format!(r#" <span class="text-muted">{}</span>"#, escape_html(m)))
                        .unwrap_or_default();
                    format!(
                        "\n                        <li>{}{} - {}{}</li>",
                        escape_html(&p.hotel_name),
                        id,
                        p.availability_status,
                        reason
                    )
                })
                .collect();

            let _ = write!(
                rows,
                r#"
        <tr class="details-row">
            <td colspan="6">
                <details class="unavailable-details">
                    <summary>Unavailable Properties ({count})</summary>
                    <ul class="unavailable-list">{items}
                    </ul>
                </details>
            </td>
        </tr>"#,
                count = summary.unavailable_properties.len(),
                items = items,
            );
        }
    }
    rows
}

/// Renders the dashboard page. `generated_at` is the only input not derived from the summaries.
pub fn render_dashboard(summaries: &[RunSummary], generated_at: DateTime<Utc>) -> String {
    let mut ordered = summaries.to_vec();
    sort_summaries(&mut ordered);

    let total_hotels: usize = ordered.iter().map(|s| s.total).sum();
    let total_available: usize = ordered.iter().map(|s| s.available).sum();
    let total_issues: usize = ordered.iter().map(RunSummary::issues).sum();
    let overall = OverallHealth::from_issues(total_issues);

    let last_update = ordered
        .iter()
        .map(|s| s.timestamp)
        .max()
        .map(|t| t.format("%B %d, %Y at %I:%M %p UTC").to_string())
        .unwrap_or_else(|| "No data available".to_string());

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Hotel Links Health Dashboard</title>
    <style>{css}</style>
</head>
<body>
    <div class="container">
        <header>
            <h1>🏨 Hotel Links Health Dashboard</h1>
            <p class="subtitle">Monitoring hotel affiliate links across travel blog posts</p>
            <div class="status-banner" style="background-color: {color};">{badge}</div>
            <p class="last-update">Last updated: {last_update}</p>
        </header>

        <div class="stats-grid">
            <div class="stat-card">
                <div class="stat-value">{destinations}</div>
                <div class="stat-label">Destinations</div>
            </div>
            <div class="stat-card">
                <div class="stat-value">{total_hotels}</div>
                <div class="stat-label">Total Hotels</div>
            </div>
            <div class="stat-card success">
                <div class="stat-value">{total_available}</div>
                <div class="stat-label">Available</div>
            </div>
            <div class="stat-card {issues_class}">
                <div class="stat-value">{total_issues}</div>
                <div class="stat-label">Issues</div>
            </div>
        </div>

        <div class="main-content">
            <h2>Destination Status</h2>
            <table>
                <thead>
                    <tr>
                        <th>Destination</th>
                        <th class="text-center">Total Hotels</th>
                        <th class="text-center">Available</th>
                        <th class="text-center">Issues</th>
                        <th class="text-center">Status</th>
                        <th class="text-center">Last Checked</th>
                    </tr>
                </thead>
                <tbody>{rows}
                </tbody>
            </table>
        </div>

        <footer>
            <p>Generated at {generated_at}</p>
        </footer>
    </div>
</body>
</html>
"#,
        css = STYLESHEET,
        color = overall.color(),
        badge = overall.badge(),
        last_update = last_update,
        destinations = ordered.len(),
        total_hotels = total_hotels,
        total_available = total_available,
        issues_class = if total_issues > 0 { "error" } else { "success" },
        total_issues = total_issues,
        rows = destination_rows(&ordered),
        generated_at = generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

pub fn write_dashboard(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    fs::write(path, html).with_context(|| format!("Failed to write dashboard to {:?}", path))?;
    info!("✓ Dashboard generated: {}", path.display());
    Ok(())
}

const STYLESHEET: &str = r#"
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            min-height: 100vh;
            padding: 20px;
            color: #1f2937;
        }
        .container { max-width: 1200px; margin: 0 auto; }
        header, .main-content {
            background: white;
            border-radius: 16px;
            padding: 32px;
            margin-bottom: 24px;
            box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1);
        }
        h1 { font-size: 2.5rem; font-weight: 700; margin-bottom: 8px; color: #111827; }
        h2 { font-size: 1.75rem; margin-bottom: 24px; color: #111827; }
        .subtitle { color: #6b7280; font-size: 1.1rem; }
        .status-banner {
            display: inline-block;
            padding: 12px 24px;
            border-radius: 8px;
            font-weight: 600;
            margin-top: 16px;
            font-size: 1.1rem;
            color: white;
        }
        .last-update { color: #6b7280; font-size: 0.95rem; margin-top: 12px; }
        .stats-grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
            gap: 16px;
            margin-bottom: 24px;
        }
        .stat-card { background: white; border-radius: 12px; padding: 24px; box-shadow: 0 2px 4px rgba(0, 0, 0, 0.05); }
        .stat-value { font-size: 2.5rem; font-weight: 700; color: #111827; }
        .stat-label { color: #6b7280; font-size: 0.9rem; margin-top: 4px; text-transform: uppercase; letter-spacing: 0.5px; }
        .stat-card.success .stat-value { color: #10b981; }
        .stat-card.error .stat-value { color: #ef4444; }
        table { width: 100%; border-collapse: collapse; }
        thead { background: #f9fafb; }
        th {
            padding: 16px;
            text-align: left;
            font-weight: 600;
            color: #374151;
            border-bottom: 2px solid #e5e7eb;
            font-size: 0.9rem;
            text-transform: uppercase;
        }
        td { padding: 16px; border-bottom: 1px solid #f3f4f6; }
        .details-row { background-color: #fef3c7; }
        .details-row td { padding: 16px 32px; }
        .unavailable-details { font-size: 0.9rem; color: #92400e; }
        .unavailable-details summary { cursor: pointer; font-weight: 600; }
        .unavailable-list { margin-top: 8px; margin-left: 20px; list-style-type: disc; }
        .unavailable-list li { margin: 4px 0; }
        .destination-link { color: #667eea; text-decoration: none; font-weight: 600; }
        .destination-link:hover { color: #764ba2; text-decoration: underline; }
        .badge { display: inline-block; padding: 6px 12px; border-radius: 6px; font-size: 0.85rem; font-weight: 600; }
        .badge-success { background-color: #d1fae5; color: #065f46; }
        .badge-warning { background-color: #fed7aa; color: #92400e; }
        .text-center { text-align: center; }
        .text-success { color: #10b981; font-weight: 600; }
        .text-muted { color: #9ca3af; }
        footer { margin-top: 32px; text-align: center; color: white; font-size: 0.9rem; }
        @media (max-width: 768px) {
            h1 { font-size: 1.75rem; }
            .stats-grid { grid-template-columns: 1fr; }
            table { font-size: 0.85rem; }
            th, td { padding: 12px 8px; }
            .main-content { padding: 20px; }
        }
    "#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvailabilityStatus, PropertyId, SummaryProperty};
    use chrono::TimeZone;

    fn summary(destination: &str, available: usize, unavailable: usize) -> RunSummary {
        let props: Vec<SummaryProperty> = (0..unavailable)
            .map(|i| SummaryProperty {
                hotel_name: format!("Hotel <{}>", i),
                property_id: Some(PropertyId(100 + i as u64)),
                url: "https://vendor.example/search?hid=100".to_string(),
                availability_status: AvailabilityStatus::Unavailable,
                error_message: Some("No availability found in 3 probed date range(s)".to_string()),
            })
            .collect();

        RunSummary {
            destination: Some(destination.to_string()),
            source_page_url: format!("https://blog.example/{}", destination.to_lowercase()),
            timestamp: Utc.with_ymd_and_hms(2026, 10, 16, 6, 30, 0).unwrap(),
            total: available + unavailable,
            available,
            unavailable,
            error: 0,
            status: if unavailable == 0 { RunHealth::Healthy } else { RunHealth::Issues },
            unavailable_properties: props.clone(),
            all_properties: props,
        }
    }

    #[test]
    fn overall_health_thresholds() {
        assert_eq!(OverallHealth::from_issues(0), OverallHealth::Healthy);
        assert_eq!(OverallHealth::from_issues(4), OverallHealth::Warning);
        assert_eq!(OverallHealth::from_issues(5), OverallHealth::Critical);
    }

    #[test]
    fn renders_counts_and_escaped_problem_list() {
        let html = render_dashboard(&[summary("Goa", 3, 0), summary("Bali", 5, 2)], Utc::now());

        assert!(html.contains("⚠ Minor Issues Detected"));
        assert!(html.contains(r#"<div class="stat-value">10</div>"#));
        assert!(html.contains("Hotel &lt;0&gt; (#100) - Unavailable"));
        assert!(!html.contains("Hotel <0>"));
        assert!(html.contains("Unavailable Properties (2)"));
        // sorted by destination
        assert!(html.find(">Bali<").unwrap() < html.find(">Goa<").unwrap());
    }

    #[test]
    fn empty_input_renders_placeholder() {
        let html = render_dashboard(&[], Utc::now());
        assert!(html.contains("No data available"));
        assert!(html.contains("✓ All Systems Healthy"));
    }

    #[test]
    fn output_only_differs_by_generation_stamp() {
        let input = vec![summary("Bali", 1, 1)];
        let first = render_dashboard(&input, Utc.with_ymd_and_hms(2026, 10, 16, 7, 0, 0).unwrap());
        let again = render_dashboard(&input, Utc.with_ymd_and_hms(2026, 10, 16, 7, 0, 0).unwrap());
        let later = render_dashboard(&input, Utc.with_ymd_and_hms(2026, 10, 17, 7, 0, 0).unwrap());

        assert_eq!(first, again);
        assert_eq!(
            first.replace("2026-10-16 07:00:00 UTC", "STAMP"),
            later.replace("2026-10-17 07:00:00 UTC", "STAMP")
        );
    }

    #[test]
    fn loads_only_summary_files() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, s: &RunSummary| {
            fs::write(dir.path().join(name), serde_json::to_string(s).unwrap()).unwrap();
        };
        write("goa_summary.json", &summary("Goa", 1, 0));
        write("bali_summary.json", &summary("Bali", 1, 0));
        write("bali_report.json", &summary("Ignored", 1, 0));
        fs::write(dir.path().join("broken_summary.json"), "{ not json").unwrap();

        let loaded = load_summaries(dir.path()).unwrap();
        let names: Vec<_> = loaded.iter().map(|s| s.destination.clone().unwrap()).collect();
        assert_eq!(names, vec!["Bali", "Goa"]);
    }
}
