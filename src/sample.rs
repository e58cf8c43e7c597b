use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::command::CommandBuilder;
use crate::errors::HstatError;
use crate::parse;
use crate::runner::Runner;
use crate::types::{Config, Metric, ReportRow, RowLabel, TimingSample};

/// Per-metric values across the successful iterations of one run, in
/// iteration order. Every column has the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSeries {
    columns: BTreeMap<Metric, Vec<i64>>,
}

impl SampleSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: &TimingSample) {
        for (metric, value) in sample.iter() {
            self.columns.entry(metric).or_default().push(value);
        }
    }

    /// Number of successful iterations recorded.
    pub fn len(&self) -> usize {
        self.columns.values().next().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column(&self, metric: Metric) -> &[i64] {
        self.columns.get(&metric).map(Vec::as_slice).unwrap_or(&[])
    }

    /// One row per recorded iteration, numbered from 1, with the requested
    /// metrics as cells.
    pub fn rows(&self, columns: &[Metric]) -> Vec<ReportRow> {
        (0..self.len())
            .map(|i| ReportRow {
                label: RowLabel::Iteration(i + 1),
                cells: columns.iter().map(|&m| self.column(m)[i]).collect(),
            })
            .collect()
    }
}

/// Run the configured number of transfers and gather every successful sample.
///
/// The command is built once and reused. A failed exit or an unreadable
/// payload costs only that iteration; launch failures abort the run.
pub fn collect<R: Runner + ?Sized>(
    config: &Config,
    builder: &CommandBuilder,
    runner: &R,
) -> Result<SampleSeries, HstatError> {
    let command = builder.build(&config.url, &config.extra_args)?;
    debug!("{}", command);

    let mut series = SampleSeries::new();
    let total = config.iterations;

    for i in 0..total {
        let outcome = runner
            .run(&command)?
            .into_stdout()
            .and_then(|stdout| parse::parse_timing(&stdout));

        match outcome {
            Ok(sample) => series.push(&sample),
            Err(HstatError::Parse { detail, raw }) => {
                warn!("json decode error: {}", detail);
                debug!("curl result: {}", raw.trim_end());
            }
            Err(err) if !err.is_fatal() => {
                debug!("iteration {}/{} skipped: {}", i + 1, total, err);
            }
            Err(err) => return Err(err),
        }

        if let Err(err) = command.reset_body() {
            debug!("could not truncate {}: {}", command.body_path().display(), err);
        }

        if i + 1 < total && !config.pause.is_zero() {
            std::thread::sleep(config.pause);
        }
    }

    debug!("{}/{} iterations succeeded", series.len(), total);
    Ok(series)
}
