use std::time::Duration;

use clap::ValueEnum;

/// Every metric a sample carries: the eight raw write-out fields, then the
/// five phase ranges derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    TimeNamelookup,
    TimeConnect,
    TimeAppconnect,
    TimePretransfer,
    TimeRedirect,
    TimeStarttransfer,
    TimeTotal,
    SpeedDownload,
    RangeDns,
    RangeConnect,
    RangeSsl,
    RangeServer,
    RangeTransfer,
}

impl Metric {
    /// Raw fields in write-out order.
    pub const RAW: [Metric; 8] = [
        Metric::TimeNamelookup,
        Metric::TimeConnect,
        Metric::TimeAppconnect,
        Metric::TimePretransfer,
        Metric::TimeRedirect,
        Metric::TimeStarttransfer,
        Metric::TimeTotal,
        Metric::SpeedDownload,
    ];

    pub const DERIVED: [Metric; 5] = [
        Metric::RangeDns,
        Metric::RangeConnect,
        Metric::RangeSsl,
        Metric::RangeServer,
        Metric::RangeTransfer,
    ];

    pub const ALL: [Metric; 13] = [
        Metric::TimeNamelookup,
        Metric::TimeConnect,
        Metric::TimeAppconnect,
        Metric::TimePretransfer,
        Metric::TimeRedirect,
        Metric::TimeStarttransfer,
        Metric::TimeTotal,
        Metric::SpeedDownload,
        Metric::RangeDns,
        Metric::RangeConnect,
        Metric::RangeSsl,
        Metric::RangeServer,
        Metric::RangeTransfer,
    ];

    /// Key as it appears in the write-out JSON and in `--json` output.
    pub fn key(self) -> &'static str {
        match self {
            Metric::TimeNamelookup => "time_namelookup",
            Metric::TimeConnect => "time_connect",
            Metric::TimeAppconnect => "time_appconnect",
            Metric::TimePretransfer => "time_pretransfer",
            Metric::TimeRedirect => "time_redirect",
            Metric::TimeStarttransfer => "time_starttransfer",
            Metric::TimeTotal => "time_total",
            Metric::SpeedDownload => "speed_download",
            Metric::RangeDns => "range_dns",
            Metric::RangeConnect => "range_connect",
            Metric::RangeSsl => "range_ssl",
            Metric::RangeServer => "range_server",
            Metric::RangeTransfer => "range_transfer",
        }
    }

    /// Table header for the metrics that can be shown as report columns.
    pub fn header(self) -> &'static str {
        match self {
            Metric::RangeDns => "DNS lookup (ms)",
            Metric::RangeConnect => "TCP connection (ms)",
            Metric::RangeSsl => "TLS handshake (ms)",
            Metric::RangeServer => "server processing (ms)",
            Metric::RangeTransfer => "content transfer (ms)",
            Metric::TimeTotal => "total (ms)",
            other => other.key(),
        }
    }
}

/// One successful transfer, every metric in whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingSample {
    values: [i64; 13],
}

impl TimingSample {
    pub(crate) fn from_values(values: [i64; 13]) -> Self {
        Self { values }
    }

    pub fn get(&self, metric: Metric) -> i64 {
        self.values[metric as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, i64)> + '_ {
        Metric::ALL.iter().map(|&m| (m, self.get(m)))
    }
}

/// Summary row kinds, in the order they are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Summary {
    Median,
    Average,
    Min,
    Max,
}

impl Summary {
    pub fn label(self) -> &'static str {
        match self {
            Summary::Median => "med",
            Summary::Average => "avg",
            Summary::Min => "min",
            Summary::Max => "max",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLabel {
    /// 1-based iteration number.
    Iteration(usize),
    Summary(Summary),
}

impl std::fmt::Display for RowLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowLabel::Iteration(n) => write!(f, "{}", n),
            RowLabel::Summary(s) => f.write_str(s.label()),
        }
    }
}

/// A table row: the label cell plus one value per report column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub label: RowLabel,
    pub cells: Vec<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummarySelection {
    pub average: bool,
    pub median: bool,
    pub min: bool,
    pub max: bool,
}

impl SummarySelection {
    pub fn selected(&self) -> Vec<Summary> {
        [
            (self.median, Summary::Median),
            (self.average, Summary::Average),
            (self.min, Summary::Min),
            (self.max, Summary::Max),
        ]
        .into_iter()
        .filter_map(|(on, s)| on.then_some(s))
        .collect()
    }

    pub fn any(&self) -> bool {
        self.average || self.median || self.min || self.max
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Resolved run configuration. Built once at startup, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub url: String,
    pub iterations: u32,
    pub pause: Duration,
    pub extra_args: String,
    pub tool: String,
    pub summaries: SummarySelection,
    pub hide_iterations: bool,
    pub show_total: bool,
    pub format: OutputFormat,
}

impl Config {
    /// Metrics shown as report columns after the label cell.
    pub fn columns(&self) -> Vec<Metric> {
        let mut columns = Metric::DERIVED.to_vec();
        if self.show_total {
            columns.push(Metric::TimeTotal);
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_discriminants_index_all() {
        for (i, m) in Metric::ALL.iter().enumerate() {
            assert_eq!(*m as usize, i);
        }
    }

    #[test]
    fn summary_order_is_med_avg_min_max() {
        let all = SummarySelection {
            average: true,
            median: true,
            min: true,
            max: true,
        };
        assert_eq!(
            all.selected(),
            vec![Summary::Median, Summary::Average, Summary::Min, Summary::Max]
        );
        assert!(SummarySelection::default().selected().is_empty());
        assert!(!SummarySelection::default().any());
    }

    #[test]
    fn row_label_display() {
        assert_eq!(RowLabel::Iteration(3).to_string(), "3");
        assert_eq!(RowLabel::Summary(Summary::Average).to_string(), "avg");
    }

    #[test]
    fn columns_with_and_without_total() {
        let mut config = Config {
            url: "https://example.com".to_string(),
            iterations: 1,
            pause: Duration::ZERO,
            extra_args: String::new(),
            tool: "curl".to_string(),
            summaries: SummarySelection::default(),
            hide_iterations: false,
            show_total: true,
            format: OutputFormat::Table,
        };
        assert_eq!(config.columns().len(), 6);
        assert_eq!(config.columns().last(), Some(&Metric::TimeTotal));
        config.show_total = false;
        assert_eq!(config.columns(), Metric::DERIVED.to_vec());
    }
}
