use serde::Deserialize;

use crate::errors::HstatError;
use crate::types::{Metric, TimingSample};

/// The write-out payload. Every field is required; values are seconds
/// (`speed_download` is bytes per second).
#[derive(Debug, Deserialize)]
struct RawTiming {
    time_namelookup: f64,
    time_connect: f64,
    time_appconnect: f64,
    time_pretransfer: f64,
    time_redirect: f64,
    time_starttransfer: f64,
    time_total: f64,
    speed_download: f64,
}

impl RawTiming {
    fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::TimeNamelookup => self.time_namelookup,
            Metric::TimeConnect => self.time_connect,
            Metric::TimeAppconnect => self.time_appconnect,
            Metric::TimePretransfer => self.time_pretransfer,
            Metric::TimeRedirect => self.time_redirect,
            Metric::TimeStarttransfer => self.time_starttransfer,
            Metric::TimeTotal => self.time_total,
            Metric::SpeedDownload => self.speed_download,
            _ => 0.0,
        }
    }
}

/// Seconds to whole milliseconds, rounding half away from zero.
pub fn seconds_to_ms(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

/// Decode one write-out payload and derive the phase ranges.
///
/// Ranges are plain differences of the rounded cumulative timestamps; a
/// negative range means the tool reported out-of-order timestamps and is kept
/// as-is.
pub fn parse_timing(raw: &str) -> Result<TimingSample, HstatError> {
    let timing: RawTiming = serde_json::from_str(raw.trim()).map_err(|e| HstatError::Parse {
        detail: e.to_string(),
        raw: raw.to_string(),
    })?;

    let mut values = [0i64; 13];
    for metric in Metric::RAW {
        values[metric as usize] = seconds_to_ms(timing.get(metric));
    }

    let v = |m: Metric| values[m as usize];
    let dns = v(Metric::TimeNamelookup);
    let connect = v(Metric::TimeConnect) - v(Metric::TimeNamelookup);
    let ssl = v(Metric::TimePretransfer) - v(Metric::TimeConnect);
    let server = v(Metric::TimeStarttransfer) - v(Metric::TimePretransfer);
    let transfer = v(Metric::TimeTotal) - v(Metric::TimeStarttransfer);

    values[Metric::RangeDns as usize] = dns;
    values[Metric::RangeConnect as usize] = connect;
    values[Metric::RangeSsl as usize] = ssl;
    values[Metric::RangeServer as usize] = server;
    values[Metric::RangeTransfer as usize] = transfer;

    Ok(TimingSample::from_values(values))
}
