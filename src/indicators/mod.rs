//! Concrete indicator implementations (spec §4.1).
//!
//! All six indicator types implement the `Indicator` trait from
//! `components::indicator`. They are pure functions of a candle slice,
//! precomputed once per run and fed per-bar into the interpreter via
//! `components::manager::IndicatorSeries`.
//!
//! MACD and Stochastic are multi-series: each is exposed as several thin
//! `Indicator` instances (one per output), the same pattern the teacher uses
//! for its multi-band indicators ("Multi-series indicators ... are exposed
//! as separate named instances per band, keeping the single-series
//! `Indicator` trait unchanged" — `trendlab-core/src/indicators/mod.rs`).

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod vwap;

pub use ema::Ema;
pub use macd::{Macd, MacdOutput};
pub use rsi::Rsi;
pub use sma::Sma;
pub use stochastic::{Stochastic, StochasticOutput};
pub use vwap::Vwap;

/// Build synthetic one-minute candles from close prices, for indicator unit
/// tests. Plausible OHLV: open = prev close, high/low padded by 0.5,
/// volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<crate::domain::Candle> {
    use crate::domain::Candle;
    use chrono::{TimeZone, Utc};
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + 0.5;
            let low = open.min(close) - 0.5;
            Candle {
                ts: Utc.timestamp_opt((i as i64) * 60, 0).unwrap(),
                o: open,
                h: high,
                l: low,
                c: close,
                v: 1000.0,
            }
        })
        .collect()
}

/// Assert two `Option<f64>` indicator values are approximately equal, or
/// both absent.
#[cfg(test)]
pub fn assert_approx_opt(actual: Option<f64>, expected: Option<f64>, epsilon: f64) {
    match (actual, expected) {
        (None, None) => {}
        (Some(a), Some(e)) => assert!(
            (a - e).abs() < epsilon,
            "assert_approx_opt failed: actual={a}, expected={e}"
        ),
        _ => panic!("assert_approx_opt failed: actual={actual:?}, expected={expected:?}"),
    }
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-9;
