use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use owo_colors::{OwoColorize, Stream, Style};
use serde::Serialize;
use tracing::warn;

use crate::errors::HstatError;
use crate::sample::SampleSeries;
use crate::stats;
use crate::types::{Config, Metric, ReportRow, RowLabel};

/// Rows ready for display: one per successful iteration plus the requested
/// summary rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub columns: Vec<Metric>,
    pub iterations: Vec<ReportRow>,
    pub summaries: Vec<ReportRow>,
}

/// Build the report rows. With no successful samples the summaries are left
/// out and a warning is logged.
pub fn build_report(config: &Config, series: &SampleSeries) -> Report {
    let columns = config.columns();
    let iterations = series.rows(&columns);

    let mut summaries = Vec::new();
    for summary in config.summaries.selected() {
        match stats::summarize(&iterations, summary) {
            Ok(row) => summaries.push(row),
            Err(HstatError::EmptySeries) => {
                warn!("no successful iterations, skipping summary rows");
                break;
            }
            Err(err) => warn!("{}", err),
        }
    }

    Report {
        columns,
        iterations,
        summaries,
    }
}

fn style_header() -> Style {
    Style::new().green()
}

fn style_summary() -> Style {
    Style::new().yellow().bold()
}

/// Render the report as a bordered table.
///
/// Iteration rows come first, then a rule, then the summary rows. With
/// `hide_iterations` set and at least one summary row, only summaries are
/// shown.
pub fn format_table(report: &Report, hide_iterations: bool) -> String {
    let mut header: Vec<&str> = vec!["/"];
    header.extend(report.columns.iter().map(|m| m.header()));

    let show_iterations = !(hide_iterations && !report.summaries.is_empty());
    let mut body: Vec<&ReportRow> = Vec::new();
    if show_iterations {
        body.extend(report.iterations.iter());
    }
    body.extend(report.summaries.iter());

    let cells: Vec<Vec<String>> = body
        .iter()
        .map(|row| {
            let mut line = vec![row.label.to_string()];
            line.extend(row.cells.iter().map(|v| v.to_string()));
            line
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|c| {
            cells
                .iter()
                .filter_map(|line| line.get(c).map(String::len))
                .chain(std::iter::once(header[c].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let rule = {
        let mut s = String::from("+");
        for w in &widths {
            s.push_str(&"-".repeat(w + 2));
            s.push('+');
        }
        s.push('\n');
        s
    };

    let mut out = String::new();
    out.push_str(&rule);

    let header_style = style_header();
    out.push('|');
    for (c, title) in header.iter().enumerate() {
        let padded = format!(" {:<width$} ", title, width = widths[c]);
        out.push_str(
            &padded
                .if_supports_color(Stream::Stdout, |s| s.style(header_style))
                .to_string(),
        );
        out.push('|');
    }
    out.push('\n');
    out.push_str(&rule);

    let summary_style = style_summary();
    let iteration_rows = if show_iterations {
        report.iterations.len()
    } else {
        0
    };

    for (i, (row, line)) in body.iter().zip(&cells).enumerate() {
        if i == iteration_rows && i > 0 {
            out.push_str(&rule);
        }

        out.push('|');
        for (c, value) in line.iter().enumerate() {
            if c == 0 {
                let padded = format!(" {:<width$} ", value, width = widths[c]);
                match row.label {
                    RowLabel::Summary(_) => out.push_str(
                        &padded
                            .if_supports_color(Stream::Stdout, |s| s.style(summary_style))
                            .to_string(),
                    ),
                    RowLabel::Iteration(_) => out.push_str(&padded),
                }
            } else {
                out.push_str(&format!(" {:>width$} ", value, width = widths[c]));
            }
            out.push('|');
        }
        out.push('\n');
    }

    if !body.is_empty() {
        out.push_str(&rule);
    }

    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    url: &'a str,
    started_at: String,
    requested_iterations: u32,
    successful_iterations: usize,
    iterations: Vec<BTreeMap<&'static str, i64>>,
    summary: BTreeMap<&'static str, BTreeMap<&'static str, i64>>,
}

/// Machine-readable report: every metric of every iteration, plus the
/// summary rows keyed by label.
pub fn format_json(
    config: &Config,
    series: &SampleSeries,
    report: &Report,
    started_at: DateTime<Utc>,
) -> String {
    let iterations: Vec<BTreeMap<&'static str, i64>> = (0..series.len())
        .map(|i| {
            let mut obj: BTreeMap<&'static str, i64> = Metric::ALL
                .iter()
                .map(|&m| (m.key(), series.column(m)[i]))
                .collect();
            obj.insert("iteration", (i + 1) as i64);
            obj
        })
        .collect();

    let summary: BTreeMap<&'static str, BTreeMap<&'static str, i64>> = report
        .summaries
        .iter()
        .filter_map(|row| match row.label {
            RowLabel::Summary(s) => Some((
                s.label(),
                report
                    .columns
                    .iter()
                    .map(|m| m.key())
                    .zip(row.cells.iter().copied())
                    .collect(),
            )),
            RowLabel::Iteration(_) => None,
        })
        .collect();

    let json = JsonReport {
        url: &config.url,
        started_at: started_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        requested_iterations: config.iterations,
        successful_iterations: series.len(),
        iterations,
        summary,
    };

    serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string())
}
