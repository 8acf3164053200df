//! Backtest engine: drives a validated cartridge against a candle series
//! and assembles the run's trades, indicator series, and summary.

pub mod backtest;
pub mod results;

pub use results::{summarize, Summary};

use serde::{Deserialize, Serialize};

use crate::cartridge::ValidatedCartridge;
use crate::components::indicator::IndicatorValues;
use crate::domain::{Candle, Trade};
use crate::error::EngineError;

/// Everything a completed run produces (spec §6's engine API shape). Plain,
/// JSON-serializable data — no borrowed or trait-object fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub indicator_series: IndicatorValues,
    pub summary: Summary,
}

/// Run a validated cartridge over `candles` and assemble the result.
pub fn run_backtest(
    candles: &[Candle],
    cartridge: ValidatedCartridge,
    pip_size: f64,
) -> Result<BacktestResult, EngineError> {
    let (trades, indicator_series) = backtest::run(candles, cartridge, pip_size)?;
    let summary = summarize(&trades, pip_size);
    Ok(BacktestResult {
        trades,
        indicator_series,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::validate_cartridge;
    use chrono::{TimeZone, Utc};

    fn candle(i: i64, c: f64) -> Candle {
        Candle {
            ts: Utc.timestamp_opt(i * 60, 0).unwrap(),
            o: c,
            h: c + 0.05,
            l: c - 0.05,
            c,
            v: 1000.0,
        }
    }

    #[test]
    fn run_backtest_assembles_trades_series_and_summary() {
        let doc = serde_json::from_value(serde_json::json!({
            "name": "ma-cross",
            "version": "1",
            "indicators": [
                {"type": "SMA", "period": 2, "alias": "fast"},
                {"type": "SMA", "period": 4, "alias": "slow"}
            ],
            "conditions": {
                "buy": {"compare": "fast > slow", "crossover": true},
                "sell": {"compare": "fast < slow", "crossover": true}
            },
            "risk_management": {"stop_loss_pips": 5, "take_profit_pips": 10}
        }))
        .unwrap();
        let cartridge = validate_cartridge(&doc).unwrap();
        let closes = [1.0, 1.0, 1.0, 1.1, 1.2, 1.2, 1.1, 1.0];
        let candles: Vec<Candle> = closes.iter().enumerate().map(|(i, &c)| candle(i as i64, c)).collect();

        let result = run_backtest(&candles, cartridge, 0.0001).unwrap();
        assert_eq!(result.summary.total_trades, result.trades.len());
        assert!(result.indicator_series.get_series("fast").is_some());
        assert!(result.indicator_series.get_series("slow").is_some());
    }

    #[test]
    fn run_backtest_result_is_json_serializable() {
        let doc = serde_json::from_value(serde_json::json!({
            "name": "ma-cross",
            "version": "1",
            "indicators": [
                {"type": "SMA", "period": 2, "alias": "fast"},
                {"type": "SMA", "period": 4, "alias": "slow"}
            ],
            "conditions": {
                "buy": {"compare": "fast > slow", "crossover": true},
                "sell": {"compare": "fast < slow", "crossover": true}
            },
            "risk_management": {"stop_loss_pips": 5, "take_profit_pips": 10}
        }))
        .unwrap();
        let cartridge = validate_cartridge(&doc).unwrap();
        let closes = [1.0, 1.0, 1.0, 1.1, 1.2, 1.2, 1.1, 1.0];
        let candles: Vec<Candle> = closes.iter().enumerate().map(|(i, &c)| candle(i as i64, c)).collect();

        let result = run_backtest(&candles, cartridge, 0.0001).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let deser: BacktestResult = serde_json::from_str(&json).unwrap();
        assert_eq!(deser.trades.len(), result.trades.len());
        assert_eq!(deser.summary, result.summary);
    }
}
