//! Indicator trait and precomputed indicator series container.
//!
//! Indicators are pure functions: candle history in, a named numeric series
//! out. They are precomputed once before the bar loop and fed per-bar into
//! the interpreter via `IndicatorValues`. No recomputation on each bar.

use crate::domain::Candle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trait for indicators.
///
/// Indicators take a full candle series and produce an output series of the
/// same length, one value per candle. Absent (warm-up, zero-volume session,
/// etc.) is `None`, not a NaN sentinel.
///
/// # Look-ahead contamination guard
/// No indicator value at bar `i` may depend on price data from bar `i+1` or
/// later. Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name of this instance (its cartridge alias).
    fn name(&self) -> &str;

    /// Number of candles needed before the indicator can produce a value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire candle series.
    ///
    /// Returns a `Vec<Option<f64>>` of the same length as `candles`; entries
    /// before `lookback()` (and any other locally-undefined bar, e.g. a
    /// zero-volume VWAP session) are `None`.
    fn compute(&self, candles: &[Candle]) -> Vec<Option<f64>>;
}

/// Container for precomputed indicator series, keyed by alias.
///
/// Built once before the bar loop by the Multi-Indicator Manager, then
/// queried by candle index during the loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<Option<f64>>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named indicator series.
    pub fn insert(&mut self, alias: impl Into<String>, values: Vec<Option<f64>>) {
        self.series.insert(alias.into(), values);
    }

    /// Value of `alias` at `index`, or `None` if undefined there or the
    /// alias is unknown.
    pub fn get(&self, alias: &str, index: usize) -> Option<f64> {
        self.series.get(alias).and_then(|v| v.get(index).copied().flatten())
    }

    /// The full series for a named indicator.
    pub fn get_series(&self, alias: &str) -> Option<&[Option<f64>]> {
        self.series.get(alias).map(|v| v.as_slice())
    }

    /// Number of indicator series stored.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|s| s.as_str())
    }
}
