//! Simple Moving Average (SMA) (spec §4.1).
//!
//! Rolling mean of close prices over a lookback window. Lookback:
//! `period - 1` (first valid value at index `period - 1`).

use crate::components::indicator::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    alias: String,
}

impl Sma {
    /// `period` must be >= 1; this is a caller invariant already enforced by
    /// cartridge validation, so it is asserted rather than returned as a
    /// `Result`.
    pub fn new(alias: impl Into<String>, period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            alias: alias.into(),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.alias
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        sma_series(candles.iter().map(|c| c.c), self.period)
    }
}

/// Rolling simple mean over an arbitrary close-like series. Shared between
/// `Sma` and Stochastic's %K/%D smoothing stages (spec §4.1).
pub fn sma_series(values: impl Iterator<Item = f64>, period: usize) -> Vec<Option<f64>> {
    let values: Vec<f64> = values.collect();
    let n = values.len();
    let mut result = vec![None; n];
    if n < period {
        return result;
    }
    let mut sum: f64 = values[..period].iter().sum();
    result[period - 1] = Some(sum / period as f64);
    for i in period..n {
        sum += values[i] - values[i - period];
        result[i] = Some(sum / period as f64);
    }
    result
}
