//! Anchored parameter averaging.
//!
//! Turns a window's top-N candidates into the single parameter set carried
//! into the out-of-sample test. Averaging the leaders instead of taking the
//! single best damps sensitivity to noise in the optimization window.

use wfalab_core::domain::{round3, ParameterSet};

use crate::grid::ParameterRange;
use crate::optimizer::OptimizationResult;

/// Combine `top` into one parameter set over `ranges`.
///
/// - no candidates: each range's midpoint
/// - one candidate: its parameters unchanged
/// - otherwise: score-weighted mean with weights `max(0, score)`, snapped to
///   the nearest multiple of the range step and clamped into the range. When
///   no candidate has a positive score the best one is used as-is.
pub fn anchored_params(top: &[OptimizationResult], ranges: &[ParameterRange]) -> ParameterSet {
    match top {
        [] => ranges
            .iter()
            .map(|r| (r.name.clone(), r.midpoint()))
            .collect(),
        [only] => only.params.clone(),
        _ => {
            let total_weight: f64 = top.iter().map(|r| r.score.max(0.0)).sum();
            if total_weight <= 0.0 {
                return best(top).params.clone();
            }
            ranges
                .iter()
                .map(|range| {
                    let weighted: f64 = top
                        .iter()
                        .map(|r| {
                            let value = r.params.get(&range.name).copied().unwrap_or(range.midpoint());
                            value * r.score.max(0.0)
                        })
                        .sum();
                    (range.name.clone(), snap(weighted / total_weight, range))
                })
                .collect()
        }
    }
}

/// Nearest multiple of `range.step`, clamped to `[min, max]`, 3 decimals.
fn snap(value: f64, range: &ParameterRange) -> f64 {
    let stepped = (value / range.step).round() * range.step;
    round3(stepped.clamp(range.min, range.max))
}

fn best(top: &[OptimizationResult]) -> &OptimizationResult {
    top.iter()
        .fold(&top[0], |best, r| if r.score > best.score { r } else { best })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfalab_core::engine::calculate_backtest_stats;

    fn candidate(period: f64, score: f64) -> OptimizationResult {
        OptimizationResult {
            params: [("period".to_string(), period)].into_iter().collect(),
            result: calculate_backtest_stats(Vec::new(), Vec::new(), 1.0, 1.0, 0.0, 0.0),
            score,
        }
    }

    fn period_range() -> Vec<ParameterRange> {
        vec![ParameterRange::new("period", 5.0, 20.0, 5.0)]
    }

    #[test]
    fn empty_top_uses_midpoints() {
        let params = anchored_params(&[], &period_range());
        assert_eq!(params["period"], 12.5);
    }

    #[test]
    fn single_candidate_verbatim() {
        let params = anchored_params(&[candidate(15.0, -2.0)], &period_range());
        assert_eq!(params["period"], 15.0);
    }

    #[test]
    fn weighted_average_snapped_to_step() {
        // (10·3 + 20·1) / 4 = 12.5 → nearest multiple of 5 rounds half away: 15
        let top = [candidate(10.0, 3.0), candidate(20.0, 1.0)];
        assert_eq!(anchored_params(&top, &period_range())["period"], 15.0);

        // (10·1 + 15·1 + 20·0) / 2 = 12.5 with a zero weight ignored
        let top = [candidate(10.0, 1.0), candidate(15.0, 1.0), candidate(20.0, -4.0)];
        assert_eq!(anchored_params(&top, &period_range())["period"], 15.0);

        let top = [candidate(5.0, 2.0), candidate(10.0, 1.0)];
        assert_eq!(anchored_params(&top, &period_range())["period"], 5.0);
    }

    #[test]
    fn non_positive_scores_fall_back_to_best() {
        let top = [candidate(5.0, -0.5), candidate(20.0, 0.0), candidate(10.0, -1.0)];
        assert_eq!(anchored_params(&top, &period_range())["period"], 20.0);
    }

    #[test]
    fn snapped_value_clamped_into_range() {
        let ranges = vec![ParameterRange::new("k", 0.3, 0.9, 0.25)];
        let top = [
            OptimizationResult {
                params: [("k".to_string(), 0.9)].into_iter().collect(),
                ..candidate(0.0, 1.0)
            },
            OptimizationResult {
                params: [("k".to_string(), 0.9)].into_iter().collect(),
                ..candidate(0.0, 1.0)
            },
        ];
        // 0.9 snaps to 1.0, then clamps to 0.9
        assert_eq!(anchored_params(&top, &ranges)["k"], 0.9);
    }
}
