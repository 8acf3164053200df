//! Backtest Engine (B) (spec §4.7).
//!
//! Drives the candle loop, maintains at most one active trade, detects
//! SL/TP within subsequent candles, closes before evaluating new signals,
//! and closes any still-open trade at run end.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::cartridge::{RiskParameters, ValidatedCartridge};
use crate::components::indicator::IndicatorValues;
use crate::domain::candle::check_timeline;
use crate::domain::{Candle, ExitReason, SignalDirection, Trade};
use crate::error::EngineError;
use crate::interpreter::Interpreter;

/// Runs a full backtest over `candles` for a validated `cartridge`.
///
/// `pip_size` must be positive; this is the one runtime-supplied numeric
/// input the engine itself validates (spec §9: "the spec delegates to the
/// caller and validates only positivity").
pub fn run(
    candles: &[Candle],
    cartridge: ValidatedCartridge,
    pip_size: f64,
) -> Result<(Vec<Trade>, IndicatorValues), EngineError> {
    if pip_size <= 0.0 {
        return Err(EngineError::NumericDomain(format!(
            "pip_size must be > 0, got {pip_size}"
        )));
    }
    check_timeline(candles)?;

    let risk = cartridge.risk;
    let mut interpreter = Interpreter::new(cartridge, candles)?;

    let mut trades: Vec<Trade> = Vec::new();
    if candles.is_empty() {
        return Ok((trades, interpreter.manager().values().clone()));
    }

    // Bar 0 primes the crossover detector's "previous value" state; the
    // engine's own open/close loop only begins at i=1 (spec §4.7).
    interpreter.on_bar(candles, 0, true);

    let mut open_trade: Option<Trade> = None;
    let mut daily_counts: HashMap<NaiveDate, u32> = HashMap::new();

    for i in 1..candles.len() {
        let candle = &candles[i];
        let mut exit_price_this_bar: Option<f64> = None;

        // Step 1: close-before-signal.
        if let Some(trade) = open_trade.as_mut() {
            if let Some((exit_price, reason)) = detect_exit(trade, candle) {
                trade.close(candle.ts, exit_price, reason);
                trades.push(open_trade.take().expect("just closed"));
                exit_price_this_bar = Some(exit_price);
            }
        }

        // Step 2: signal evaluation.
        let has_open = open_trade.is_some();
        let signal = interpreter.on_bar(candles, i, has_open);
        if has_open {
            continue;
        }

        let Some(signal) = signal else { continue };

        let day = candle.ts.date_naive();
        let count = daily_counts.entry(day).or_insert(0);
        if risk.max_daily_trades.is_some_and(|max| *count >= max) {
            continue;
        }

        if let Some(exit_price) = exit_price_this_bar {
            let allowed = risk
                .min_pip_distance
                .is_some_and(|min_dist| (signal.price - exit_price).abs() / pip_size >= min_dist);
            if !allowed {
                continue;
            }
        }

        // Step 3: open.
        let (sl, tp) = compute_bracket(signal.direction, signal.price, &risk, pip_size);
        open_trade = Some(Trade::open(signal.direction, signal.ts, signal.price, sl, tp));
        *count += 1;
    }

    // End of input: close any still-open trade at the last candle's close.
    if let Some(mut trade) = open_trade.take() {
        let last = candles.last().expect("non-empty candles checked above");
        trade.close(last.ts, last.c, ExitReason::EndOfRun);
        trades.push(trade);
    }

    Ok((trades, interpreter.manager().values().clone()))
}

fn compute_bracket(direction: SignalDirection, entry: f64, risk: &RiskParameters, pip_size: f64) -> (f64, f64) {
    match direction {
        SignalDirection::Buy => (
            entry - risk.stop_loss_pips * pip_size,
            entry + risk.take_profit_pips * pip_size,
        ),
        SignalDirection::Sell => (
            entry + risk.stop_loss_pips * pip_size,
            entry - risk.take_profit_pips * pip_size,
        ),
    }
}

/// SL/TP detection within a candle (spec §4.7). Both levels touched in the
/// same candle resolve pessimistically to `StopLoss`.
fn detect_exit(trade: &Trade, candle: &Candle) -> Option<(f64, ExitReason)> {
    let (hit_sl, hit_tp) = match trade.direction {
        SignalDirection::Buy => (candle.l <= trade.sl, candle.h >= trade.tp),
        SignalDirection::Sell => (candle.h >= trade.sl, candle.l <= trade.tp),
    };
    match (hit_sl, hit_tp) {
        (true, _) => Some((trade.sl, ExitReason::StopLoss)),
        (false, true) => Some((trade.tp, ExitReason::TakeProfit)),
        (false, false) => None,
    }
}
