//! Exponential Moving Average (EMA) (spec §4.1).
//!
//! Recursive: `ema[t] = alpha * close[t] + (1 - alpha) * ema[t-1]`.
//! Seed: `ema[period-1]` = SMA of first `period` close values.
//! Lookback: `period - 1`.

use crate::components::indicator::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    alias: String,
}

impl Ema {
    /// `period` must be >= 1; asserted rather than returned as a `Result`
    /// since cartridge validation already guarantees it.
    pub fn new(alias: impl Into<String>, period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            alias: alias.into(),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.alias
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        ema_of_series(candles.iter().map(|c| c.c), self.period)
    }
}

/// EMA of an arbitrary series, used both by `Ema` and by MACD's line/signal
/// stages.
pub fn ema_of_series(values: impl Iterator<Item = f64>, period: usize) -> Vec<Option<f64>> {
    let values: Vec<f64> = values.collect();
    let n = values.len();
    let mut result = vec![None; n];
    if n < period {
        return result;
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let seed: f64 = values[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = Some(seed);
    let mut prev = seed;
    for (i, val) in result.iter_mut().enumerate().skip(period) {
        let ema = alpha * values[i] + (1.0 - alpha) * prev;
        *val = Some(ema);
        prev = ema;
    }
    result
}
