//! Moving Average Convergence/Divergence (MACD) (spec §4.1).
//!
//! `macd = EMA(fast) - EMA(slow)`; `signal = EMA(macd, signal_period)`;
//! `histogram = macd - signal`. Defined once the slow EMA is defined.
//!
//! A single `Macd` instance computes all three series at once and exposes
//! each as a separate `Indicator` facade (`MacdOutput`) under its own
//! alias, matching how the Multi-Indicator Manager only knows
//! `Indicator::compute` returning one series per alias (spec §4.3).

use std::sync::Arc;

use crate::components::indicator::Indicator;
use crate::domain::Candle;
use crate::indicators::ema::ema_of_series;

/// One of the three MACD output lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
    Histogram,
}

/// Shared MACD computation, parameterized by fast/slow/signal periods.
#[derive(Debug, Clone)]
pub struct Macd {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Macd {
    /// `fast < slow` and all periods `>= 1` are caller invariants enforced
    /// by cartridge validation.
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be < slow period");
        Self { fast, slow, signal }
    }

    /// Compute `(macd, signal, histogram)` series together, each
    /// `Vec<Option<f64>>` aligned to `candles`.
    pub fn compute_all(
        &self,
        candles: &[Candle],
    ) -> (Vec<Option<f64>>, Vec<Option<f64>>, Vec<Option<f64>>) {
        let closes = candles.iter().map(|c| c.c);
        let fast_ema = ema_of_series(closes, self.fast);
        let slow_ema = ema_of_series(candles.iter().map(|c| c.c), self.slow);

        let macd: Vec<Option<f64>> = fast_ema
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| match (f, s) {
                (Some(f), Some(s)) => Some(f - s),
                _ => None,
            })
            .collect();

        // The signal line is an EMA of the MACD line, which itself starts
        // undefined; feed only the defined suffix through ema_of_series and
        // re-pad the undefined prefix so alignment with `candles` is kept.
        let first_defined = macd.iter().position(Option::is_some);
        let signal = match first_defined {
            Some(start) => {
                let defined: Vec<f64> = macd[start..].iter().map(|v| v.unwrap()).collect();
                let sub_signal = ema_of_series(defined.into_iter(), self.signal);
                let mut out = vec![None; start];
                out.extend(sub_signal);
                out
            }
            None => vec![None; macd.len()],
        };

        let histogram: Vec<Option<f64>> = macd
            .iter()
            .zip(signal.iter())
            .map(|(m, s)| match (m, s) {
                (Some(m), Some(s)) => Some(m - s),
                _ => None,
            })
            .collect();

        (macd, signal, histogram)
    }
}

/// Thin `Indicator` facade exposing one MACD output line under its alias.
/// Multiple `MacdOutput`s typically share one `Arc<Macd>` so the underlying
/// EMAs are described once even though the manager asks each alias to
/// `compute` independently.
pub struct MacdOutput {
    alias: String,
    macd: Arc<Macd>,
    line: MacdLine,
}

impl MacdOutput {
    pub fn new(alias: impl Into<String>, macd: Arc<Macd>, line: MacdLine) -> Self {
        Self {
            alias: alias.into(),
            macd,
            line,
        }
    }
}

impl Indicator for MacdOutput {
    fn name(&self) -> &str {
        &self.alias
    }

    fn lookback(&self) -> usize {
        match self.line {
            MacdLine::Macd => self.macd.slow - 1,
            MacdLine::Signal | MacdLine::Histogram => self.macd.slow - 1 + self.macd.signal - 1,
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        let (macd, signal, histogram) = self.macd.compute_all(candles);
        match self.line {
            MacdLine::Macd => macd,
            MacdLine::Signal => signal,
            MacdLine::Histogram => histogram,
        }
    }
}
