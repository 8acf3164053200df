//! Relative Strength Index (RSI) (spec §4.1).
//!
//! Wilder's smoothing of average gains and losses.
//! `RSI = 100 - 100 / (1 + avg_gain / avg_loss)`.
//! Lookback: `period`. Edge cases: `avg_loss == 0` → 100; `avg_gain == 0` and
//! `avg_loss == 0` → 50 (no movement).

use crate::components::indicator::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    alias: String,
}

impl Rsi {
    /// `period` must be >= 1; asserted rather than returned as a `Result`
    /// since cartridge validation already guarantees it.
    pub fn new(alias: impl Into<String>, period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            alias: alias.into(),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.alias
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        let n = candles.len();
        let mut result = vec![None; n];
        if n < self.period + 1 {
            return result;
        }

        let changes: Vec<f64> = candles.windows(2).map(|w| w[1].c - w[0].c).collect();

        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for &ch in &changes[..self.period] {
            if ch > 0.0 {
                avg_gain += ch;
            } else {
                avg_loss -= ch;
            }
        }
        avg_gain /= self.period as f64;
        avg_loss /= self.period as f64;

        result[self.period] = Some(wilder_rsi(avg_gain, avg_loss));

        let alpha = 1.0 / self.period as f64;
        for i in (self.period + 1)..n {
            let ch = changes[i - 1];
            let gain = ch.max(0.0);
            let loss = (-ch).max(0.0);
            avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
            result[i] = Some(wilder_rsi(avg_gain, avg_loss));
        }

        result
    }
}

fn wilder_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
