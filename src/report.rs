use std::fmt::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_truncate::UnicodeTruncateStr;

use crate::error::Result;
use crate::http_probe::result::Outcome;
use crate::stats::RunStatistics;
use crate::targets::{ExpectedClass, Target};

const LABEL_WIDTH: usize = 8;
const RESULT_WIDTH: usize = 25;
const RULE_WIDTH: usize = 40;

fn to_fixed_width(input: &str, width: usize) -> String {
    let (truncated, _) = input.unicode_truncate(width);
    format!("{:<width$}", truncated, width = width)
}

fn icon(target: &Target, outcome: &Outcome) -> &'static str {
    match (target.expected_class(), outcome.is_blocked()) {
        (ExpectedClass::Bad, true) => "🛡️ ",
        (ExpectedClass::Bad, false) => "❌ ",
        (ExpectedClass::Good, true) => "⚠️ ",
        (ExpectedClass::Good, false) => "✅ ",
    }
}

/// One progress line per completed probe.
pub fn render_line(target: &Target, outcome: &Outcome) -> String {
    format!(
        "[{}] {} | {:4.0}ms | {:<width$} | {}",
        icon(target, outcome),
        to_fixed_width(&target.label.to_uppercase(), LABEL_WIDTH),
        outcome.duration_ms,
        outcome.to_string(),
        outcome.url,
        width = RESULT_WIDTH
    )
}

fn rate(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v * 100.0))
        .unwrap_or_else(|| "N/A".to_string())
}

/// The end-of-run summary block. Every number comes straight from `stats`.
pub fn render_summary(stats: &RunStatistics) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut s = String::new();

    let _ = writeln!(s, "{heavy}");
    let _ = writeln!(s, "TEST COMPLETE. Total Requests: {}", stats.total);
    let _ = writeln!(s, "{light}");
    let _ = writeln!(s, "🛡️  True Positives  (Malware Blocked): {}", stats.true_positive);
    let _ = writeln!(s, "✅  True Negatives  (Benign Allowed):  {}", stats.true_negative);
    let _ = writeln!(s, "❌  False Negatives (Malware Missed):  {}", stats.false_negative);
    let _ = writeln!(s, "⚠️   False Positives (Benign Blocked):  {}", stats.false_positive);
    let _ = writeln!(s, "{light}");
    let _ = writeln!(s, "BLOCK MECHANISMS:");
    let _ = writeln!(s, "⚡ TCP Resets (Active Rejection):      {}", stats.mechanism_rst_count);
    let _ = writeln!(s, "⏳ Timeouts (Silent Drops):            {}", stats.mechanism_timeout_count);
    let _ = writeln!(s, "{light}");
    let _ = writeln!(s, "Probe errors (counted as not blocked): {}", stats.probe_errors);
    let _ = writeln!(s, "Detection rate:                        {}", rate(stats.detection_rate()));
    let _ = writeln!(s, "False positive rate:                   {}", rate(stats.false_positive_rate()));
    let _ = write!(s, "{heavy}");
    s
}

/// Machine-readable record of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub concurrency: usize,
    pub loops: usize,
    pub batch_size: usize,
    pub timeout_seconds: f64,
    pub statistics: RunStatistics,
}

pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(summary)?)?;
    Ok(())
}
