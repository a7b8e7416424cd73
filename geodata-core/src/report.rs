// Plain-text rendering of discovery and pipeline results

use crate::pipeline::{BundleResult, DownloadOutcome, DownloadStatus};
use geodata_scanner::ResolvedLink;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

/// One status line per download, as shown in the run log
pub fn outcome_line(outcome: &DownloadOutcome) -> String {
    match outcome.status {
        DownloadStatus::Succeeded { .. } => {
            format!("✓ {}: success ({})", outcome.filename, outcome.origin)
        }
        DownloadStatus::Failed { .. } => format!("✗ {}: download failed", outcome.filename),
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Summary plus one line per outcome, failures with their cause
pub fn generate_run_report(result: &BundleResult) -> String {
    let mut report = String::new();
    report.push_str(RULE);
    report.push_str("\n# Summary:\n");
    report.push_str(&format!("  Archives requested: {}\n", result.outcomes.len()));
    report.push_str(&format!("  Downloaded: {}\n", result.succeeded_count()));
    report.push_str(&format!("  Failed: {}\n", result.failed_count()));
    report.push_str(&format!("  Bundle: {}\n", result.archive_name()));
    report.push('\n');
    report.push_str(RULE);
    report.push('\n');

    for outcome in &result.outcomes {
        report.push_str("  ");
        report.push_str(&outcome_line(outcome));
        match &outcome.status {
            DownloadStatus::Succeeded { bytes } => {
                report.push_str(&format!(" [{}]", format_bytes(*bytes)));
            }
            DownloadStatus::Failed { error } => {
                report.push_str(&format!("\n      {}", error));
            }
        }
        report.push('\n');
    }

    report
}

/// Discovered links grouped by source, in discovery order
pub fn generate_links_report(links: &[ResolvedLink]) -> String {
    let mut report = String::new();
    report.push_str(&format!("# {} archive link(s) found\n", links.len()));

    let mut current_origin: Option<&str> = None;
    for link in links {
        if current_origin != Some(link.origin.as_str()) {
            report.push_str(&format!("\n## {}\n", link.origin));
            current_origin = Some(link.origin.as_str());
        }
        report.push_str(&format!("  {} <- {}\n", link.filename, link.url));
    }

    report
}
