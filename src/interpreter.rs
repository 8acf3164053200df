//! DSL Strategy Interpreter (S) (spec §4.6).
//!
//! Built once from a validated cartridge: configures the Multi-Indicator
//! Manager, compiles `conditions.buy`/`conditions.sell`, and owns the
//! Crossover Detector's state across the whole run. `on_bar` is the
//! per-candle contract the Backtest Engine drives.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cartridge::{ValidatedCartridge, ValidatedIndicator};
use crate::components::condition::evaluate_condition;
use crate::components::crossover::CrossoverDetector;
use crate::components::manager::IndicatorManager;
use crate::domain::{Candle, Signal, SignalDirection};
use crate::error::EngineError;
use crate::indicators::macd::{Macd, MacdLine, MacdOutput};
use crate::indicators::stochastic::{Stochastic, StochasticLine, StochasticOutput};
use crate::indicators::{Ema, Rsi, Sma, Vwap};

/// Per-bar outcome of asking the interpreter whether to signal.
pub struct BarContext {
    pub values: HashMap<String, f64>,
}

pub struct Interpreter {
    cartridge: ValidatedCartridge,
    manager: IndicatorManager,
    crossover: CrossoverDetector,
    reference_price_series: Vec<Option<f64>>,
}

impl Interpreter {
    /// Build the interpreter and precompute every indicator series (and the
    /// implicit `reference_price` series, if the cartridge is timing-based)
    /// over the full candle sequence, once.
    pub fn new(cartridge: ValidatedCartridge, candles: &[Candle]) -> Result<Self, EngineError> {
        let mut manager = IndicatorManager::new();
        for instance in &cartridge.indicators {
            register_instance(&mut manager, instance)?;
        }
        manager.compute_all(candles);

        let reference_price_series = match &cartridge.timing {
            Some(timing) => compute_reference_price_series(candles, timing),
            None => vec![None; candles.len()],
        };

        Ok(Self {
            cartridge,
            manager,
            crossover: CrossoverDetector::new(),
            reference_price_series,
        })
    }

    pub fn cartridge(&self) -> &ValidatedCartridge {
        &self.cartridge
    }

    pub fn manager(&self) -> &IndicatorManager {
        &self.manager
    }

    /// Whether `index` is eligible for a *new* signal: within
    /// `timing.signal_time`'s window if the cartridge declares one (spec
    /// §4.7's session-boundary rule); always eligible otherwise.
    pub fn signal_eligible(&self, candles: &[Candle], index: usize) -> bool {
        match &self.cartridge.timing {
            Some(timing) => candles[index].ts.time() >= timing.signal_time,
            None => true,
        }
    }

    /// Per-bar contract (spec §4.6):
    /// 1. Populate `ctx` with current-bar values of each alias.
    /// 2. If a position is open, return no signal.
    /// 3. Evaluate sell first, then buy (mutually exclusive at emission).
    /// 4. Update the crossover detector for every alias present in `ctx`.
    /// 5. Return a signal or none.
    pub fn on_bar(&mut self, candles: &[Candle], index: usize, has_open: bool) -> Option<Signal> {
        let candle = &candles[index];
        let ctx = self.build_context(index);

        let signal = if has_open {
            None
        } else if !self.signal_eligible(candles, index) {
            None
        } else if evaluate_condition(&self.cartridge.sell, &ctx.values, &self.crossover) {
            Some(Signal {
                direction: SignalDirection::Sell,
                price: candle.c,
                ts: candle.ts,
                reason: "sell condition met".to_string(),
            })
        } else if evaluate_condition(&self.cartridge.buy, &ctx.values, &self.crossover) {
            Some(Signal {
                direction: SignalDirection::Buy,
                price: candle.c,
                ts: candle.ts,
                reason: "buy condition met".to_string(),
            })
        } else {
            None
        };

        for (alias, value) in &ctx.values {
            self.crossover.update(alias, *value);
        }

        signal
    }

    fn build_context(&self, index: usize) -> BarContext {
        let mut values = HashMap::new();
        for alias in self.manager.aliases() {
            if let Some(v) = self.manager.get_value(alias, index) {
                values.insert(alias.to_string(), v);
            }
        }
        if let Some(v) = self.reference_price_series[index] {
            values.insert(crate::cartridge::REFERENCE_PRICE_ALIAS.to_string(), v);
        }
        BarContext { values }
    }
}

fn register_instance(manager: &mut IndicatorManager, instance: &ValidatedIndicator) -> Result<(), EngineError> {
    match instance {
        ValidatedIndicator::Sma { alias, period } => {
            manager.register(Box::new(Sma::new(alias.clone(), *period)))
        }
        ValidatedIndicator::Ema { alias, period } => {
            manager.register(Box::new(Ema::new(alias.clone(), *period)))
        }
        ValidatedIndicator::Rsi { alias, period } => {
            manager.register(Box::new(Rsi::new(alias.clone(), *period)))
        }
        ValidatedIndicator::Vwap { alias } => manager.register(Box::new(Vwap::new(alias.clone()))),
        ValidatedIndicator::Macd {
            line_alias,
            signal_alias,
            histogram_alias,
            fast,
            slow,
            signal,
        } => {
            let macd = Arc::new(Macd::new(*fast, *slow, *signal));
            manager.register(Box::new(MacdOutput::new(line_alias.clone(), macd.clone(), MacdLine::Macd)))?;
            manager.register(Box::new(MacdOutput::new(
                signal_alias.clone(),
                macd.clone(),
                MacdLine::Signal,
            )))?;
            manager.register(Box::new(MacdOutput::new(
                histogram_alias.clone(),
                macd,
                MacdLine::Histogram,
            )))
        }
        ValidatedIndicator::Stochastic {
            k_alias,
            d_alias,
            k_period,
            k_smoothing,
            d_smoothing,
        } => {
            let stochastic = Arc::new(Stochastic::new(*k_period, *k_smoothing, *d_smoothing));
            manager.register(Box::new(StochasticOutput::new(
                k_alias.clone(),
                stochastic.clone(),
                StochasticLine::K,
            )))?;
            manager.register(Box::new(StochasticOutput::new(
                d_alias.clone(),
                stochastic,
                StochasticLine::D,
            )))
        }
    }
}

fn compute_reference_price_series(
    candles: &[Candle],
    timing: &crate::cartridge::ValidatedTiming,
) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(candles.len());
    let mut anchor: Option<(chrono::NaiveDate, f64)> = None;
    for candle in candles {
        let day = candle.ts.date_naive();
        if anchor.as_ref().map(|(d, _)| *d) != Some(day) {
            anchor = None;
        }
        if anchor.is_none() && candle.ts.time() >= timing.reference_time {
            anchor = Some((day, candle.field(timing.reference_price)));
        }
        out.push(anchor.map(|(_, v)| v));
    }
    out
}
