//! CSV bar loader.
//!
//! Expects a header row with a time column (`time`, `date` or `timestamp`)
//! plus `open`, `high`, `low`, `close` and optionally `volume`, matched
//! case-insensitively. Times may be Unix seconds, `YYYY-MM-DD` dates or
//! RFC 3339 timestamps. Rows must be strictly ascending in time.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate};
use thiserror::Error;
use tracing::debug;

use wfalab_core::domain::{Bar, BarTime};

/// Errors from loading bar data.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column '{0}'")]
    MissingColumn(&'static str),
    #[error("row {row}: unrecognized time '{value}'")]
    BadTime { row: usize, value: String },
    #[error("row {row}: bad {column} value '{value}'")]
    BadNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: time is not after the previous row")]
    Unordered { row: usize },
    #[error("no bars in input")]
    Empty,
}

struct Columns {
    time: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let require = |name: &'static str| find(&[name]).ok_or(LoadError::MissingColumn(name));

        Ok(Self {
            time: find(&["time", "date", "timestamp"]).ok_or(LoadError::MissingColumn("time"))?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find(&["volume"]),
        })
    }
}

/// Load bars from a CSV file.
pub fn load_bars_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bars = read_bars_csv(file)?;
    debug!(path = %path.display(), bars = bars.len(), "loaded bars");
    Ok(bars)
}

/// Parse bars from any CSV reader.
pub fn read_bars_csv<R: Read>(reader: R) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let columns = Columns::from_headers(rdr.headers()?)?;

    let mut bars: Vec<Bar> = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let row = i + 2;
        let field = |idx: usize| record.get(idx).unwrap_or("");
        let number = |idx: usize, column: &'static str| {
            let raw = field(idx);
            raw.parse::<f64>().map_err(|_| LoadError::BadNumber {
                row,
                column,
                value: raw.to_string(),
            })
        };

        let time = parse_time(field(columns.time)).ok_or_else(|| LoadError::BadTime {
            row,
            value: field(columns.time).to_string(),
        })?;
        if let Some(prev) = bars.last() {
            if time <= prev.time {
                return Err(LoadError::Unordered { row });
            }
        }

        bars.push(Bar {
            time,
            open: number(columns.open, "open")?,
            high: number(columns.high, "high")?,
            low: number(columns.low, "low")?,
            close: number(columns.close, "close")?,
            volume: match columns.volume {
                Some(idx) if !field(idx).is_empty() => number(idx, "volume")?,
                _ => 0.0,
            },
        });
    }

    if bars.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(bars)
}

fn parse_time(raw: &str) -> Option<BarTime> {
    if let Ok(secs) = raw.parse::<i64>() {
        return Some(BarTime::Timestamp(secs));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(BarTime::Date(date));
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| BarTime::Timestamp(dt.timestamp()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_dates_and_optional_volume() {
        let csv = "Date,Open,High,Low,Close\n\
                   2024-01-02,10,11,9,10.5\n\
                   2024-01-03,10.5,12,10,11.5\n";
        let bars = read_bars_csv(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(
            bars[0].time,
            BarTime::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        );
        assert_eq!(bars[1].close, 11.5);
        assert_eq!(bars[1].volume, 0.0);
    }

    #[test]
    fn reads_unix_and_rfc3339_times() {
        let csv = "time,open,high,low,close,volume\n\
                   1704153600,1,1,1,1,100\n\
                   2024-01-03T00:00:00Z,2,2,2,2,200\n";
        let bars = read_bars_csv(csv.as_bytes()).unwrap();
        assert_eq!(bars[0].time, BarTime::Timestamp(1_704_153_600));
        assert_eq!(bars[1].time.unix_seconds(), 1_704_240_000);
        assert_eq!(bars[1].volume, 200.0);
    }

    #[test]
    fn rejects_unordered_rows() {
        let csv = "time,open,high,low,close\n2,1,1,1,1\n1,1,1,1,1\n";
        assert!(matches!(
            read_bars_csv(csv.as_bytes()),
            Err(LoadError::Unordered { row: 3 })
        ));
    }

    #[test]
    fn reports_bad_values() {
        let missing = "time,open,high,low\n1,1,1,1\n";
        assert!(matches!(
            read_bars_csv(missing.as_bytes()),
            Err(LoadError::MissingColumn("close"))
        ));

        let bad_number = "time,open,high,low,close\n1,1,1,1,abc\n";
        assert!(matches!(
            read_bars_csv(bad_number.as_bytes()),
            Err(LoadError::BadNumber { row: 2, column: "close", .. })
        ));

        let bad_time = "time,open,high,low,close\nyesterday,1,1,1,1\n";
        assert!(matches!(
            read_bars_csv(bad_time.as_bytes()),
            Err(LoadError::BadTime { row: 2, .. })
        ));

        let empty = "time,open,high,low,close\n";
        assert!(matches!(read_bars_csv(empty.as_bytes()), Err(LoadError::Empty)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.csv");
        std::fs::write(&path, "date,open,high,low,close\n2024-01-02,1,2,0.5,1.5\n").unwrap();
        let bars = load_bars_csv(&path).unwrap();
        assert_eq!(bars.len(), 1);

        assert!(matches!(
            load_bars_csv(&dir.path().join("missing.csv")),
            Err(LoadError::Io { .. })
        ));
    }
}
