//! Bar — the fundamental market data unit, and its timestamp type.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Timestamp of a bar: either a plain Unix-seconds number or a calendar date.
///
/// Both forms share one total order. A date compares as midnight UTC of that
/// day, so a series mixing the two is still totally ordered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BarTime {
    Timestamp(i64),
    Date(NaiveDate),
}

impl BarTime {
    /// Unix seconds of this timestamp (midnight UTC for dates).
    pub fn unix_seconds(&self) -> i64 {
        match self {
            BarTime::Timestamp(secs) => *secs,
            BarTime::Date(date) => date
                .and_hms_opt(0, 0, 0)
                .map_or(0, |dt| dt.and_utc().timestamp()),
        }
    }
}

/// Total ordering over bar timestamps.
pub fn compare_time(a: &BarTime, b: &BarTime) -> Ordering {
    a.unix_seconds().cmp(&b.unix_seconds())
}

impl PartialEq for BarTime {
    fn eq(&self, other: &Self) -> bool {
        compare_time(self, other) == Ordering::Equal
    }
}

impl Eq for BarTime {}

impl PartialOrd for BarTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BarTime {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_time(self, other)
    }
}

impl Hash for BarTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.unix_seconds().hash(state);
    }
}

impl fmt::Display for BarTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarTime::Timestamp(secs) => write!(f, "{secs}"),
            BarTime::Date(date) => write!(f, "{date}"),
        }
    }
}

impl From<NaiveDate> for BarTime {
    fn from(date: NaiveDate) -> Self {
        BarTime::Date(date)
    }
}

impl From<i64> for BarTime {
    fn from(secs: i64) -> Self {
        BarTime::Timestamp(secs)
    }
}

/// OHLCV bar for a single instrument at a single timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub time: BarTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}
