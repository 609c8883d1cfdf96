//! Price series with explicit identity and precomputed derived arrays.
//!
//! Strategies receive a `PriceSeries` instead of a bare bar slice. Derived
//! arrays (closes) are computed once per series value and travel with it, so
//! there is no memoization keyed on hidden global state. Each series carries a
//! `SeriesId`: a content hash for a root series, and a hash of
//! `(parent id, start, end)` for a slice.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{Bar, BarTime};

/// Content-derived identity of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesId(pub [u8; 32]);

impl SeriesId {
    /// Hash the timestamps and closes of a bar slice.
    pub fn of_bars(bars: &[Bar]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(bars.len() as u64).to_le_bytes());
        for bar in bars {
            hasher.update(&bar.time.unix_seconds().to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Identity of the sub-range `[start, end)` of the series with this id.
    pub fn child(&self, start: usize, end: usize) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.0);
        hasher.update(&(start as u64).to_le_bytes());
        hasher.update(&(end as u64).to_le_bytes());
        Self(*hasher.finalize().as_bytes())
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// A borrowed bar series plus its derived arrays.
#[derive(Debug, Clone)]
pub struct PriceSeries<'a> {
    id: SeriesId,
    bars: &'a [Bar],
    closes: Vec<f64>,
}

impl<'a> PriceSeries<'a> {
    pub fn new(bars: &'a [Bar]) -> Self {
        Self {
            id: SeriesId::of_bars(bars),
            bars,
            closes: bars.iter().map(|b| b.close).collect(),
        }
    }

    /// Sub-series over `[start, end)`. Bounds are clamped to the series length.
    pub fn slice(&self, start: usize, end: usize) -> PriceSeries<'a> {
        let end = end.min(self.bars.len());
        let start = start.min(end);
        PriceSeries {
            id: self.id.child(start, end),
            bars: &self.bars[start..end],
            closes: self.closes[start..end].to_vec(),
        }
    }

    pub fn id(&self) -> SeriesId {
        self.id
    }

    pub fn bars(&self) -> &'a [Bar] {
        self.bars
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn time(&self, index: usize) -> Option<BarTime> {
        self.bars.get(index).map(|b| b.time)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
