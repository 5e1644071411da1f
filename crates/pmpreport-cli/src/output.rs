//! Text and JSON output for CLI commands

use chrono::NaiveDate;
use pmpreport_core::{PeriodSelection, ReportingPeriod};
use pmpreport_engine::{EmptyState, EpicTable, MilestoneReport, MilestoneStatus};
use serde::Serialize;
use std::fmt::Write;

/// Output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Text,
    Json,
}

pub const NO_EPIC_DATA: &str = "No epic data loaded. Refresh the snapshot and try again.";
pub const NO_MILESTONE_DATA: &str = "No milestone data loaded. Refresh the snapshot and try again.";

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

fn fmt_variance(days: Option<i64>) -> String {
    match days {
        Some(d) if d > 0 => format!("+{}", d),
        Some(d) => d.to_string(),
        None => "-".to_string(),
    }
}

fn fmt_flag(flag: bool, label: &str) -> &str {
    if flag {
        label
    } else {
        ""
    }
}

pub fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Message for a milestone report with no rows
pub fn empty_message(report: &MilestoneReport, state: EmptyState) -> String {
    match state {
        EmptyState::NoData => NO_MILESTONE_DATA.to_string(),
        EmptyState::NoMatches => {
            let mut msg = format!("No milestones found for {}", report.selection);
            if let Some(project) = &report.project_filter {
                let _ = write!(msg, ", project \"{}\"", project);
            }
            msg.push('.');
            msg
        }
    }
}

pub fn render_epics_text(table: &EpicTable) -> String {
    if table.is_empty() {
        return format!("{}\n", NO_EPIC_DATA);
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<8} {:<32} {:<24} {:>8} {:<10} {:<10} {:>7} {:>7} {:>7} {:>7}  {}",
        "ID", "Title", "Area", "Features", "Start", "End", "dStart", "dEnd", "dOStart", "dOEnd", "Health"
    );
    for row in table.iter() {
        let _ = writeln!(
            out,
            "{:<8} {:<32} {:<24} {:>8} {:<10} {:<10} {:>7} {:>7} {:>7} {:>7}  {}",
            row.parent.id,
            truncate(&row.parent.title, 32),
            truncate(&row.parent.area_path, 24),
            format!("{}/{}", row.rollup.features_with_dates, row.rollup.feature_count),
            fmt_date(row.rolled_up_start()),
            fmt_date(row.rolled_up_end()),
            fmt_variance(row.start_date_variance),
            fmt_variance(row.end_date_variance),
            fmt_variance(row.original_start_variance),
            fmt_variance(row.original_end_variance),
            row.health,
        );
    }
    let _ = writeln!(out, "\n{} epics", table.len());
    out
}

pub fn render_milestones_text(report: &MilestoneReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Milestones for {} ({})", report.selection, report.period);

    if let Some(state) = report.empty_state() {
        let _ = writeln!(out, "{}", empty_message(report, state));
        return out;
    }

    for status in MilestoneStatus::ORDER {
        let rows: Vec<_> = report.with_status(status).collect();
        if rows.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{} ({})", status, rows.len());
        for row in rows {
            let _ = writeln!(
                out,
                "  {:<8} {:<40} {:<10} {:<10} {:<8} {:<3}",
                row.milestone.id,
                truncate(&row.milestone.title, 40),
                fmt_date(row.effective_start),
                fmt_date(row.effective_end),
                fmt_flag(row.milestone.is_critical_date, "CRITICAL"),
                fmt_flag(row.milestone.is_key_feature, "KEY"),
            );
        }
    }

    let summary = report.summary();
    let _ = writeln!(
        out,
        "\nTotal: {}  Scheduled: {}  Delayed: {}  Critical: {} ({} delayed)  Key: {}",
        summary.total,
        summary.scheduled,
        summary.delayed,
        summary.critical_dates,
        summary.delayed_critical_dates,
        summary.key_features
    );
    out
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PeriodJson<'a> {
    selection: &'a PeriodSelection,
    start: NaiveDate,
    end: NaiveDate,
}

pub fn render_period(selection: &PeriodSelection, period: &ReportingPeriod, format: Format) -> anyhow::Result<String> {
    match format {
        Format::Text => Ok(format!("{}: {}\n", selection, period)),
        Format::Json => {
            let json = to_json(&PeriodJson {
                selection,
                start: period.start,
                end: period.end,
            })?;
            Ok(json + "\n")
        }
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
        short.push('…');
        short
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variance_formatting() {
        assert_eq!(fmt_variance(Some(5)), "+5");
        assert_eq!(fmt_variance(Some(0)), "0");
        assert_eq!(fmt_variance(Some(-3)), "-3");
        assert_eq!(fmt_variance(None), "-");
    }

    #[test]
    fn truncate_long_titles() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long title", 6), "a ver…");
    }
}
