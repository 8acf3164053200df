//! Stochastic oscillator (spec §4.1).
//!
//! Raw `%K` at `i`: `100·(c_i − min(low[i-k+1..=i])) / (max(high[..]) − min(low[..]))`;
//! 0 when the range is 0. Smoothed `%K` = SMA of raw `%K` over `k_smoothing`.
//! `%D` = SMA of smoothed `%K` over `d_smoothing`. All values clamped to
//! `[0,100]`.

use std::sync::Arc;

use crate::components::indicator::Indicator;
use crate::domain::Candle;
use crate::indicators::sma::sma_series;

/// One of the two Stochastic output lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StochasticLine {
    K,
    D,
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    pub k_period: usize,
    pub k_smoothing: usize,
    pub d_smoothing: usize,
}

impl Stochastic {
    /// All periods must be `>= 1`; enforced by cartridge validation before
    /// construction, so asserted here rather than returned as a `Result`.
    pub fn new(k_period: usize, k_smoothing: usize, d_smoothing: usize) -> Self {
        assert!(
            k_period >= 1 && k_smoothing >= 1 && d_smoothing >= 1,
            "Stochastic periods must be >= 1"
        );
        Self {
            k_period,
            k_smoothing,
            d_smoothing,
        }
    }

    /// Compute `(smoothed %K, %D)` series, each `Vec<Option<f64>>` aligned
    /// to `candles`.
    pub fn compute_all(&self, candles: &[Candle]) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
        let n = candles.len();
        let mut raw_k = vec![None; n];
        for i in 0..n {
            if i + 1 < self.k_period {
                continue;
            }
            let window = &candles[i + 1 - self.k_period..=i];
            let lowest = window.iter().map(|c| c.l).fold(f64::INFINITY, f64::min);
            let highest = window.iter().map(|c| c.h).fold(f64::NEG_INFINITY, f64::max);
            let range = highest - lowest;
            let value = if range == 0.0 {
                50.0
            } else {
                100.0 * (candles[i].c - lowest) / range
            };
            raw_k[i] = Some(value.clamp(0.0, 100.0));
        }

        let raw_defined_from = raw_k.iter().position(Option::is_some);
        let smoothed_k = match raw_defined_from {
            Some(start) => {
                let defined: Vec<f64> = raw_k[start..].iter().map(|v| v.unwrap()).collect();
                let mut out = vec![None; start];
                out.extend(sma_series(defined.into_iter(), self.k_smoothing));
                out
            }
            None => vec![None; n],
        };

        let smoothed_defined_from = smoothed_k.iter().position(Option::is_some);
        let d = match smoothed_defined_from {
            Some(start) => {
                let defined: Vec<f64> = smoothed_k[start..].iter().map(|v| v.unwrap()).collect();
                let mut out = vec![None; start];
                out.extend(sma_series(defined.into_iter(), self.d_smoothing));
                out
            }
            None => vec![None; n],
        };

        (smoothed_k, d)
    }
}

/// Thin `Indicator` facade exposing one Stochastic output under its alias.
pub struct StochasticOutput {
    alias: String,
    stochastic: Arc<Stochastic>,
    line: StochasticLine,
}

impl StochasticOutput {
    pub fn new(alias: impl Into<String>, stochastic: Arc<Stochastic>, line: StochasticLine) -> Self {
        Self {
            alias: alias.into(),
            stochastic,
            line,
        }
    }
}

impl Indicator for StochasticOutput {
    fn name(&self) -> &str {
        &self.alias
    }

    fn lookback(&self) -> usize {
        match self.line {
            StochasticLine::K => self.stochastic.k_period - 1 + self.stochastic.k_smoothing - 1,
            StochasticLine::D => {
                self.stochastic.k_period - 1 + self.stochastic.k_smoothing - 1
                    + self.stochastic.d_smoothing
                    - 1
            }
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        let (k, d) = self.stochastic.compute_all(candles);
        match self.line {
            StochasticLine::K => k,
            StochasticLine::D => d,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candle(i: i64, h: f64, l: f64, c: f64) -> Candle {
        Candle {
            ts: Utc.timestamp_opt(i * 60, 0).unwrap(),
            o: c,
            h,
            l,
            c,
            v: 1000.0,
        }
    }

    #[test]
    fn stochastic_zero_range_is_fifty() {
        let candles: Vec<Candle> = (0..5).map(|i| candle(i, 10.0, 10.0, 10.0)).collect();
        let stoch = Stochastic::new(3, 1, 1);
        let (k, _) = stoch.compute_all(&candles);
        assert_eq!(k[2], Some(50.0));
    }

    #[test]
    fn stochastic_bounds_clamped() {
        let candles = vec![
            candle(0, 10.0, 8.0, 9.0),
            candle(1, 12.0, 9.0, 11.9),
            candle(2, 15.0, 10.0, 14.9),
            candle(3, 9.0, 5.0, 5.1),
        ];
        let stoch = Stochastic::new(3, 1, 1);
        let (k, d) = stoch.compute_all(&candles);
        for v in k.iter().chain(d.iter()).flatten() {
            assert!((0.0..=100.0).contains(v));
        }
    }

    #[test]
    fn stochastic_d_needs_more_warmup_than_k() {
        let candles: Vec<Candle> = (0..10)
            .map(|i| candle(i, (i as f64) + 1.0, i as f64, i as f64 + 0.5))
            .collect();
        let stoch = Stochastic::new(3, 2, 2);
        let (k, d) = stoch.compute_all(&candles);
        let first_k = k.iter().position(Option::is_some).unwrap();
        let first_d = d.iter().position(Option::is_some).unwrap();
        assert!(first_d > first_k);
    }

    #[test]
    fn stochastic_no_lookahead() {
        let candles: Vec<Candle> = (0..8)
            .map(|i| candle(i, (i as f64) + 1.0, i as f64, i as f64 + 0.5))
            .collect();
        let mut full = candles.clone();
        full.push(candle(100, 1000.0, 1.0, 500.0));
        let stoch = Stochastic::new(3, 2, 2);
        let (full_k, _) = stoch.compute_all(&full);
        let (trunc_k, _) = stoch.compute_all(&candles);
        assert_eq!(full_k[..candles.len()], trunc_k[..]);
    }
}
