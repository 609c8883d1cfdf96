//! Named numeric strategy parameters.

use std::collections::BTreeMap;

/// Mapping from parameter name to value.
///
/// A `BTreeMap` so reports and logs list parameters in a stable order.
pub type ParameterSet = BTreeMap<String, f64>;

/// Overlay `overrides` onto `defaults`. Keys in `overrides` win.
pub fn merge_params(defaults: &ParameterSet, overrides: &ParameterSet) -> ParameterSet {
    let mut merged = defaults.clone();
    for (name, value) in overrides {
        merged.insert(name.clone(), *value);
    }
    merged
}

/// Round to 3 decimal places, the precision used for grid and averaged values.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
