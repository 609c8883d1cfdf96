//! Indicators over close-price arrays.
//!
//! Each indicator takes the `closes()` of a `PriceSeries` and returns a vector
//! of the same length, NaN until the indicator has enough history.

pub mod rsi;
pub mod sma;

pub use rsi::rsi;
pub use sma::sma;

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
