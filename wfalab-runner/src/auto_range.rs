//! Quick-mode planning: parameter ranges from strategy defaults and window
//! sizes from the bar count.
//!
//! Each default value `d` becomes a search range around itself:
//! - integers: `[max(1, ⌊d/2⌋), ⌈2d⌉]`, whole-number steps
//! - fractions below 1: `[max(0.1, d/2), min(1, 1.5d)]`, steps of at least 0.01
//! - anything else: treated as an integer-style range
//!
//! Steps are sized so the whole grid stays near [`TARGET_GRID_POINTS`].

use serde::{Deserialize, Serialize};

use wfalab_core::domain::{round3, ParameterSet};

use crate::grid::ParameterRange;

/// Approximate grid size quick mode aims for.
pub const TARGET_GRID_POINTS: f64 = 200.0;
/// Number of windows quick mode sizes for.
pub const TARGET_WINDOWS: usize = 5;
/// Share of each window used for testing.
pub const TEST_FRACTION: f64 = 0.3;
pub const MIN_TEST_BARS: usize = 20;
pub const MIN_OPTIMIZATION_BARS: usize = 50;

const MIN_DECIMAL_STEP: f64 = 0.01;

/// Derived ranges and window sizes for a quick run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoRangePlan {
    pub ranges: Vec<ParameterRange>,
    pub optimization_window: usize,
    pub test_window: usize,
    pub step_size: usize,
}

pub fn auto_range_plan(total_bars: usize, defaults: &ParameterSet) -> AutoRangePlan {
    let (optimization_window, test_window, step_size) = window_sizing(total_bars);
    AutoRangePlan {
        ranges: derive_ranges(defaults),
        optimization_window,
        test_window,
        step_size,
    }
}

/// `(optimization, test, step)` for `total_bars`.
///
/// Each window spans a fifth of the data; 30% of it (at least 20 bars) is
/// test, the rest (at least 50 bars) optimization. Windows advance by the
/// test length so consecutive test windows tile the data.
pub fn window_sizing(total_bars: usize) -> (usize, usize, usize) {
    let window = total_bars / TARGET_WINDOWS;
    let test = MIN_TEST_BARS.max((window as f64 * TEST_FRACTION).floor() as usize);
    let optimization = MIN_OPTIMIZATION_BARS.max(window.saturating_sub(test));
    (optimization, test, test)
}

/// One range per default parameter. Degenerate ranges are left out.
pub fn derive_ranges(defaults: &ParameterSet) -> Vec<ParameterRange> {
    if defaults.is_empty() {
        return Vec::new();
    }
    let steps_per_param = TARGET_GRID_POINTS
        .powf(1.0 / defaults.len() as f64)
        .floor()
        .max(2.0);

    defaults
        .iter()
        .filter_map(|(name, &value)| derive_range(name, value, steps_per_param))
        .collect()
}

fn derive_range(name: &str, value: f64, steps_per_param: f64) -> Option<ParameterRange> {
    if !value.is_finite() {
        return None;
    }
    let is_decimal = value.fract() != 0.0 && value < 1.0;

    let (min, max, step) = if is_decimal {
        let min = round3((value * 0.5).max(0.1));
        let max = round3((value * 1.5).min(1.0));
        let step = round3((max - min) / steps_per_param).max(MIN_DECIMAL_STEP);
        (min, max, step)
    } else {
        let min = (value * 0.5).floor().max(1.0);
        let max = (value * 2.0).ceil();
        let step = ((max - min) / steps_per_param).floor().max(1.0);
        (min, max, step)
    };

    (min < max).then(|| ParameterRange::new(name, min, max, step))
}
