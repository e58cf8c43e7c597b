use crate::errors::HstatError;
use crate::types::{ReportRow, RowLabel, Summary};

/// Per-column mean, rounded half away from zero.
pub fn average(rows: &[ReportRow]) -> Result<ReportRow, HstatError> {
    reduce(rows, Summary::Average, |column| {
        let sum: i64 = column.iter().sum();
        rounded_div(sum, column.len() as i64)
    })
}

/// Per-column median. Even-length columns take the rounded mean of the two
/// middle values.
pub fn median(rows: &[ReportRow]) -> Result<ReportRow, HstatError> {
    reduce(rows, Summary::Median, |column| {
        let mut sorted = column.to_vec();
        sorted.sort_unstable();
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 1 {
            sorted[mid]
        } else {
            rounded_div(sorted[mid - 1] + sorted[mid], 2)
        }
    })
}

pub fn min(rows: &[ReportRow]) -> Result<ReportRow, HstatError> {
    reduce(rows, Summary::Min, |column| {
        column.iter().copied().fold(i64::MAX, i64::min)
    })
}

pub fn max(rows: &[ReportRow]) -> Result<ReportRow, HstatError> {
    reduce(rows, Summary::Max, |column| {
        column.iter().copied().fold(i64::MIN, i64::max)
    })
}

pub fn summarize(rows: &[ReportRow], summary: Summary) -> Result<ReportRow, HstatError> {
    match summary {
        Summary::Median => median(rows),
        Summary::Average => average(rows),
        Summary::Min => min(rows),
        Summary::Max => max(rows),
    }
}

/// Apply `f` to each numeric column. The row label never takes part.
fn reduce(
    rows: &[ReportRow],
    summary: Summary,
    f: impl Fn(&[i64]) -> i64,
) -> Result<ReportRow, HstatError> {
    let width = rows
        .iter()
        .map(|r| r.cells.len())
        .min()
        .ok_or(HstatError::EmptySeries)?;

    let cells = (0..width)
        .map(|c| {
            let column: Vec<i64> = rows.iter().map(|r| r.cells[c]).collect();
            f(&column)
        })
        .collect();

    Ok(ReportRow {
        label: RowLabel::Summary(summary),
        cells,
    })
}

fn rounded_div(numerator: i64, denominator: i64) -> i64 {
    (numerator as f64 / denominator as f64).round() as i64
}
