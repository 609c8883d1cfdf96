//! Parameter ranges and exhaustive grid generation.
//!
//! A range `{ name, min, max, step }` expands to
//! `min, min + step, …` up to `max`, each value rounded to 3 decimals.
//! The grid is the Cartesian product of every active range.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use wfalab_core::domain::{round3, ParameterSet};

/// Default upper bound on the number of grid points.
pub const GRID_SAFETY_CAP: usize = 200_000;

/// Slack added before flooring the step count so `0.1..=0.3 step 0.1`
/// still yields three values.
const STEP_EPSILON: f64 = 1e-9;

/// Search interval for one named parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// Errors from range validation and grid construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("invalid range '{name}': {reason}")]
    InvalidRange { name: String, reason: String },
    #[error("parameter grid is empty")]
    Empty,
    #[error("parameter grid has {size} points, above the cap of {cap}")]
    TooLarge { size: usize, cap: usize },
}

impl ParameterRange {
    pub fn new(name: impl Into<String>, min: f64, max: f64, step: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            step,
        }
    }

    /// Width of the range; zero for a single-value range.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Number of grid values this range contributes.
    pub fn steps(&self) -> usize {
        if self.min > self.max {
            return 0;
        }
        ((self.max - self.min) / self.step + STEP_EPSILON).floor() as usize + 1
    }

    /// All grid values for this range, ascending.
    pub fn values(&self) -> Vec<f64> {
        (0..self.steps())
            .map(|k| round3(self.min + k as f64 * self.step))
            .collect()
    }

    fn validate(&self) -> Result<(), GridError> {
        let invalid = |reason: &str| GridError::InvalidRange {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(invalid("bounds must be finite"));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(invalid("step must be a positive number"));
        }
        Ok(())
    }
}

/// Validate `ranges` and drop the inverted ones.
///
/// A range with `min > max` contributes nothing and is skipped with a
/// warning; `min == max` is kept as a single value. A non-positive step,
/// non-finite bound or duplicate name is an error.
pub fn active_ranges(ranges: &[ParameterRange]) -> Result<Vec<ParameterRange>, GridError> {
    let mut active: Vec<ParameterRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        range.validate()?;
        if active.iter().any(|r| r.name == range.name) {
            return Err(GridError::InvalidRange {
                name: range.name.clone(),
                reason: "duplicate parameter name".into(),
            });
        }
        if range.min > range.max {
            warn!(
                param = %range.name,
                min = range.min,
                max = range.max,
                "dropping inverted parameter range"
            );
            continue;
        }
        active.push(range.clone());
    }
    Ok(active)
}

/// Every range must name a parameter the strategy knows.
///
/// `known` is the strategy's defaults merged with any fixed overrides.
pub fn require_known_params(
    ranges: &[ParameterRange],
    known: &ParameterSet,
) -> Result<(), GridError> {
    match ranges.iter().find(|r| !known.contains_key(&r.name)) {
        Some(range) => Err(GridError::InvalidRange {
            name: range.name.clone(),
            reason: "unknown parameter for strategy".into(),
        }),
        None => Ok(()),
    }
}

/// Number of grid points, saturating at `usize::MAX`.
pub fn grid_size(ranges: &[ParameterRange]) -> usize {
    ranges
        .iter()
        .fold(1usize, |acc, r| acc.saturating_mul(r.steps()))
}

/// Full Cartesian product of `ranges`, first range varying slowest.
///
/// No ranges yields a single empty parameter set.
pub fn generate_grid(ranges: &[ParameterRange]) -> Vec<ParameterSet> {
    let mut out = Vec::with_capacity(grid_size(ranges).min(GRID_SAFETY_CAP));
    let mut current = ParameterSet::new();
    expand(ranges, &mut current, &mut out);
    out
}

fn expand(ranges: &[ParameterRange], current: &mut ParameterSet, out: &mut Vec<ParameterSet>) {
    let Some((first, rest)) = ranges.split_first() else {
        out.push(current.clone());
        return;
    };
    for value in first.values() {
        current.insert(first.name.clone(), value);
        expand(rest, current, out);
    }
    current.remove(&first.name);
}

/// Size-check and expand `ranges`, which must already be active.
pub fn build_grid(ranges: &[ParameterRange], cap: usize) -> Result<Vec<ParameterSet>, GridError> {
    let size = grid_size(ranges);
    if size == 0 {
        return Err(GridError::Empty);
    }
    if size > cap {
        return Err(GridError::TooLarge { size, cap });
    }
    Ok(generate_grid(ranges))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_include_both_ends() {
        let range = ParameterRange::new("period", 5.0, 20.0, 5.0);
        assert_eq!(range.values(), vec![5.0, 10.0, 15.0, 20.0]);
    }

    #[test]
    fn decimal_steps_do_not_drift() {
        let range = ParameterRange::new("k", 0.1, 0.3, 0.1);
        assert_eq!(range.values(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn max_not_on_step_is_excluded() {
        let range = ParameterRange::new("n", 1.0, 10.0, 4.0);
        assert_eq!(range.values(), vec![1.0, 5.0, 9.0]);
    }

    #[test]
    fn equal_bounds_give_single_value() {
        let range = ParameterRange::new("n", 7.0, 7.0, 1.0);
        assert_eq!(range.values(), vec![7.0]);
    }

    #[test]
    fn grid_is_cartesian_product() {
        let ranges = vec![
            ParameterRange::new("a", 1.0, 2.0, 1.0),
            ParameterRange::new("b", 10.0, 30.0, 10.0),
        ];
        let grid = generate_grid(&ranges);
        assert_eq!(grid.len(), 6);
        assert_eq!(grid_size(&ranges), 6);
        assert_eq!(grid[0]["a"], 1.0);
        assert_eq!(grid[0]["b"], 10.0);
        assert_eq!(grid[5]["a"], 2.0);
        assert_eq!(grid[5]["b"], 30.0);
        assert!(grid.iter().all(|p| p.len() == 2));
    }

    #[test]
    fn no_ranges_yields_one_empty_set() {
        let grid = generate_grid(&[]);
        assert_eq!(grid.len(), 1);
        assert!(grid[0].is_empty());
    }

    #[test]
    fn inverted_range_dropped() {
        let ranges = vec![
            ParameterRange::new("a", 5.0, 1.0, 1.0),
            ParameterRange::new("b", 1.0, 3.0, 1.0),
        ];
        let active = active_ranges(&ranges).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "b");
    }

    #[test]
    fn non_positive_step_rejected() {
        for step in [0.0, -1.0, f64::NAN] {
            let err = active_ranges(&[ParameterRange::new("a", 1.0, 3.0, step)]).unwrap_err();
            assert!(matches!(err, GridError::InvalidRange { .. }));
        }
    }

    #[test]
    fn duplicate_names_rejected() {
        let ranges = vec![
            ParameterRange::new("a", 1.0, 3.0, 1.0),
            ParameterRange::new("a", 1.0, 5.0, 1.0),
        ];
        assert!(active_ranges(&ranges).is_err());
    }

    #[test]
    fn unknown_parameter_names_rejected() {
        let known: ParameterSet = [("fast_period".to_string(), 10.0)].into_iter().collect();

        let ranges = [ParameterRange::new("fast_period", 5.0, 9.0, 1.0)];
        assert!(require_known_params(&ranges, &known).is_ok());
        let err = require_known_params(&[ParameterRange::new("fast", 5.0, 9.0, 1.0)], &known)
            .unwrap_err();
        assert_eq!(
            err,
            GridError::InvalidRange {
                name: "fast".into(),
                reason: "unknown parameter for strategy".into(),
            }
        );
    }

    #[test]
    fn cap_enforced() {
        let ranges = vec![
            ParameterRange::new("a", 1.0, 100.0, 1.0),
            ParameterRange::new("b", 1.0, 100.0, 1.0),
        ];
        assert_eq!(
            build_grid(&ranges, 5_000),
            Err(GridError::TooLarge {
                size: 10_000,
                cap: 5_000
            })
        );
        assert_eq!(build_grid(&ranges, 10_000).unwrap().len(), 10_000);
    }
}
