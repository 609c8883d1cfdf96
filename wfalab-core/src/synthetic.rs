//! Deterministic synthetic bars for demos, tests and benchmarks.

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{Bar, BarTime};

/// Length of the embedded price cycle, in bars.
const CYCLE_BARS: f64 = 60.0;

/// Generate `count` daily bars: a seeded random walk riding a sine cycle.
///
/// Weekdays only, starting 2020-01-01. The same `seed` always yields the same bars.
pub fn synthetic_bars(count: usize, seed: u64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bars = Vec::with_capacity(count);
    let mut price = 100.0_f64;
    let mut date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();

    while bars.len() < count {
        let weekday = date.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            date += chrono::Duration::days(1);
            continue;
        }

        let phase = bars.len() as f64 * std::f64::consts::TAU / CYCLE_BARS;
        let daily_return = 0.0002 + 0.10 * phase.cos() * (std::f64::consts::TAU / CYCLE_BARS)
            + rng.gen_range(-0.01..0.01);
        let open = price;
        let close = (price * (1.0 + daily_return)).max(1.0);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.005));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.005));
        let volume = rng.gen_range(500_000.0..5_000_000.0_f64).round();

        bars.push(Bar {
            time: BarTime::Date(date),
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        date += chrono::Duration::days(1);
    }

    bars
}
