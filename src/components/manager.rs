//! Multi-Indicator Manager (MM) (spec §4.3).
//!
//! Registers uniquely-aliased indicator instances and computes per-instance
//! series over a candle sequence. Simple cartridges synthesize implicit
//! aliases (`SMA20`, `EMA50`, `MACD`, `MACD_SIGNAL`, `MACD_HISTOGRAM`, `RSI`,
//! `VWAP`) so the same infix compiler serves both dialects; that synthesis
//! happens in `interpreter`, not here — the manager only guarantees alias
//! uniqueness and computes whatever it is given.

use std::collections::HashSet;

use crate::components::indicator::{Indicator, IndicatorValues};
use crate::domain::Candle;
use crate::error::EngineError;

#[derive(Default)]
pub struct IndicatorManager {
    instances: Vec<Box<dyn Indicator>>,
    registered: HashSet<String>,
    values: IndicatorValues,
}

impl IndicatorManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an indicator instance. Fails with `DuplicateAlias` if its
    /// alias was already registered.
    pub fn register(&mut self, indicator: Box<dyn Indicator>) -> Result<(), EngineError> {
        let alias = indicator.name().to_string();
        if !self.registered.insert(alias.clone()) {
            return Err(EngineError::DuplicateAlias(alias));
        }
        self.instances.push(indicator);
        Ok(())
    }

    /// Compute every registered instance's series over `candles`, once.
    pub fn compute_all(&mut self, candles: &[Candle]) {
        self.values = IndicatorValues::new();
        for indicator in &self.instances {
            let series = indicator.compute(candles);
            self.values.insert(indicator.name().to_string(), series);
        }
    }

    /// Value of `alias` at candle index `i`, or `None` if undefined there or
    /// the alias was never registered.
    pub fn get_value(&self, alias: &str, index: usize) -> Option<f64> {
        self.values.get(alias, index)
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.instances.iter().map(|i| i.name())
    }

    pub fn is_registered(&self, alias: &str) -> bool {
        self.registered.contains(alias)
    }

    pub fn values(&self) -> &IndicatorValues {
        &self.values
    }
}
