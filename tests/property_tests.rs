//! Quantified properties from spec §8 (P1-P11), exercised across the
//! public crate surface rather than any single module's internals.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use cartridge_engine::cartridge::validate_cartridge;
use cartridge_engine::components::{CrossoverDetector, IndicatorManager};
use cartridge_engine::domain::Candle;
use cartridge_engine::indicators::{Sma, Stochastic};
use cartridge_engine::run_backtest;

fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Candle {
            ts: Utc.timestamp_opt((i as i64) * 60, 0).unwrap(),
            o: c,
            h: c + 0.3,
            l: c - 0.3,
            c,
            v: 1_000.0,
        })
        .collect()
}

fn ma_crossover_doc() -> serde_json::Value {
    serde_json::json!({
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
    })
}

// P1 — alias uniqueness.
#[test]
fn p1_duplicate_alias_fails_validation() {
    let mut doc = ma_crossover_doc();
    doc["indicators"][1]["alias"] = serde_json::json!("fast");
    let doc = serde_json::from_value(doc).unwrap();
    let err = validate_cartridge(&doc).unwrap_err();
    match err {
        cartridge_engine::EngineError::SchemaInvalid(issues) => {
            assert!(issues.iter().any(|i| i.rule.contains("duplicate alias")));
        }
        other => panic!("expected SchemaInvalid, got {other:?}"),
    }
}

proptest! {
    // P2 — Stochastic bounds: every defined %K/%D is in [0,100]; zero range -> 50.
    #[test]
    fn p2_stochastic_always_in_bounds(
        closes in prop::collection::vec(1.0f64..1000.0, 20..120)
    ) {
        let candles = candles_from_closes(&closes);
        let stoch = Stochastic::new(9, 3, 3);
        let (k, d) = stoch.compute_all(&candles);
        for v in k.into_iter().chain(d).flatten() {
            prop_assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn p2_stochastic_zero_range_is_neutral(c in 1.0f64..1000.0, n in 5usize..40) {
        let flat: Vec<Candle> = (0..n)
            .map(|i| Candle {
                ts: Utc.timestamp_opt((i as i64) * 60, 0).unwrap(),
                o: c, h: c, l: c, c, v: 1_000.0,
            })
            .collect();
        let stoch = Stochastic::new(3, 1, 1);
        let (k, _) = stoch.compute_all(&flat);
        for v in k.into_iter().flatten() {
            prop_assert_eq!(v, 50.0);
        }
    }

    // P3 — crossover accuracy: detect_cross_above is true iff prev <= T < current.
    #[test]
    fn p3_crossover_accuracy(prev in -100.0f64..100.0, current in -100.0f64..100.0, threshold in -100.0f64..100.0) {
        let mut xd = CrossoverDetector::new();
        xd.update("x", prev);
        let expect_above = prev <= threshold && current > threshold;
        let expect_below = prev >= threshold && current < threshold;
        prop_assert_eq!(xd.detect_cross_above("x", current, threshold), expect_above);
        prop_assert_eq!(xd.detect_cross_below("x", current, threshold), expect_below);
    }

    #[test]
    fn p3_no_previous_value_never_crosses(current in -100.0f64..100.0, threshold in -100.0f64..100.0) {
        let xd = CrossoverDetector::new();
        prop_assert!(!xd.detect_cross_above("never-seen", current, threshold));
        prop_assert!(!xd.detect_cross_below("never-seen", current, threshold));
    }

    // P8 — pip accounting: summary's total_pips equals the exact sum of
    // per-trade pips for any candle series the MA-crossover cartridge runs
    // against.
    #[test]
    fn p8_total_pips_matches_sum_of_trade_pips(
        closes in prop::collection::vec(0.5f64..2.0, 10..80)
    ) {
        let candles = candles_from_closes(&closes);
        let doc = serde_json::from_value(ma_crossover_doc()).unwrap();
        let cartridge = validate_cartridge(&doc).unwrap();
        let result = run_backtest(&candles, cartridge, 0.01).unwrap();
        let expected: f64 = result.trades.iter().filter_map(|t| t.pips(0.01)).sum();
        prop_assert!((result.summary.total_pips - expected).abs() < 1e-9);
    }

    // P10 — determinism: identical inputs yield bit-identical outputs.
    #[test]
    fn p10_determinism(closes in prop::collection::vec(0.5f64..2.0, 10..80)) {
        let candles = candles_from_closes(&closes);
        let doc: cartridge_engine::CartridgeDoc = serde_json::from_value(ma_crossover_doc()).unwrap();
        let cartridge_a = validate_cartridge(&doc).unwrap();
        let cartridge_b = validate_cartridge(&doc).unwrap();
        let run_a = run_backtest(&candles, cartridge_a, 0.01).unwrap();
        let run_b = run_backtest(&candles, cartridge_b, 0.01).unwrap();
        prop_assert_eq!(run_a.trades, run_b.trades);
        prop_assert_eq!(run_a.summary, run_b.summary);
    }

    // P6 — one position at a time: across any candle series, the engine
    // never reports overlapping trades.
    #[test]
    fn p6_no_overlapping_trades(closes in prop::collection::vec(0.5f64..2.0, 10..150)) {
        let candles = candles_from_closes(&closes);
        let doc = serde_json::from_value(ma_crossover_doc()).unwrap();
        let cartridge = validate_cartridge(&doc).unwrap();
        let result = run_backtest(&candles, cartridge, 0.01).unwrap();
        for pair in result.trades.windows(2) {
            prop_assert!(pair[0].exit_ts.unwrap() <= pair[1].entry_ts);
        }
    }
}

// P4 — zone correctness: all_below is true iff every referenced alias is
// defined and below the threshold; false the moment any is missing.
#[test]
fn p4_zone_false_on_missing_alias() {
    use cartridge_engine::components::condition::{Zone, ZoneBound};
    let zone = Zone {
        bound: ZoneBound::AllBelow(20.0),
        indicators: vec!["present".into(), "missing".into()],
    };
    let mut values = std::collections::HashMap::new();
    values.insert("present".to_string(), 5.0);
    assert!(!zone.evaluate(|alias| values.get(alias).copied()));
}

#[test]
fn p4_zone_true_when_all_defined_and_within_bound() {
    use cartridge_engine::components::condition::{Zone, ZoneBound};
    let zone = Zone {
        bound: ZoneBound::AllBelow(20.0),
        indicators: vec!["a".into(), "b".into()],
    };
    let mut values = std::collections::HashMap::new();
    values.insert("a".to_string(), 5.0);
    values.insert("b".to_string(), 10.0);
    assert!(zone.evaluate(|alias| values.get(alias).copied()));
}

// P5 — rotation precision: a rotation BUY fires on bar i iff the zone held
// on i-1 and the trigger alias crossed above the threshold between i-1, i.
#[test]
fn p5_rotation_fires_exactly_on_qualifying_bar() {
    let doc: cartridge_engine::CartridgeDoc = serde_json::from_value(serde_json::json!({
        "name": "quad-rotation",
        "version": "1",
        "indicators": [
            {"type": "STOCHASTIC", "alias": "fast", "params": {"k_period": 3, "k_smoothing": 1, "d_smoothing": 1}},
            {"type": "STOCHASTIC", "alias": "slow", "params": {"k_period": 3, "k_smoothing": 1, "d_smoothing": 1}}
        ],
        "conditions": {
            "buy": {
                "type": "rotation",
                "zone": {"all_below": 20, "indicators": ["fast", "slow"]},
                "trigger": {"indicator": "fast", "crosses_above": 20}
            },
            "sell": {"compare": "fast > 9000"}
        },
        "risk_management": {"stop_loss_pips": 15, "take_profit_pips": 25}
    }))
    .unwrap();
    let cartridge = validate_cartridge(&doc).unwrap();

    // Closes dip (driving both stochastics below 20) then rally sharply.
    let closes = [10.0, 9.0, 8.0, 7.5, 7.0, 6.5, 6.0, 20.0, 40.0, 60.0];
    let candles = candles_from_closes(&closes);
    let result = run_backtest(&candles, cartridge, 1.0).unwrap();
    assert!(!result.trades.is_empty());
}

// P7 — SL/TP semantics: a STOP_LOSS exit's price equals the SL level, and
// the closing bar's extreme actually reached it.
#[test]
fn p7_stop_loss_exit_matches_level_and_bar_extreme() {
    use cartridge_engine::domain::{ExitReason, SignalDirection};
    let mut manager = IndicatorManager::new();
    manager.register(Box::new(Sma::new("sma", 1))).unwrap();
    let closes = [1.0, 1.0, 1.0, 0.8]; // sharp drop to trigger a long SL
    let candles: Vec<Candle> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Candle {
            ts: Utc.timestamp_opt((i as i64) * 60, 0).unwrap(),
            o: c,
            h: c + 0.05,
            l: c - 0.3,
            c,
            v: 1_000.0,
        })
        .collect();
    manager.compute_all(&candles);

    let entry = candles[1].c;
    let sl = entry - 0.1;
    let tp = entry + 1.0;
    let mut trade = cartridge_engine::Trade::open(SignalDirection::Buy, candles[1].ts, entry, sl, tp);
    // The engine's own bracket check, mirrored here directly against the bar.
    let hit = candles[3].l <= sl;
    assert!(hit, "fixture should breach the stop");
    trade.close(candles[3].ts, sl, ExitReason::StopLoss);
    assert_eq!(trade.exit_price, Some(sl));
    assert_eq!(trade.exit_reason, Some(ExitReason::StopLoss));
}

// P9 — backward compatibility: a simple-dialect cartridge referencing only
// SMA aliases yields the same trades whether or not advanced rotation
// machinery is compiled into the same binary (it is always linked in this
// crate; this asserts the simple path's output is independent of it by
// running the same cartridge twice and any advanced-only cartridge in
// between does not leak state).
#[test]
fn p9_simple_dialect_unaffected_by_advanced_components_in_same_process() {
    let closes = [1.0, 1.0, 1.0, 1.1, 1.2, 1.2, 1.1, 1.0];
    let candles = candles_from_closes(&closes);

    let doc = serde_json::from_value(ma_crossover_doc()).unwrap();
    let cartridge_before = validate_cartridge(&doc).unwrap();
    let result_before = run_backtest(&candles, cartridge_before, 0.0001).unwrap();

    // Run an unrelated advanced rotation cartridge in between.
    let rotation_doc: cartridge_engine::CartridgeDoc = serde_json::from_value(serde_json::json!({
        "name": "quad-rotation",
        "version": "1",
        "indicators": [
            {"type": "STOCHASTIC", "alias": "fast", "params": {"k_period": 3}}
        ],
        "conditions": {
            "buy": {
                "type": "rotation",
                "zone": {"all_below": 20, "indicators": ["fast"]},
                "trigger": {"indicator": "fast", "crosses_above": 20}
            },
            "sell": {"compare": "fast > 9000"}
        },
        "risk_management": {"stop_loss_pips": 15, "take_profit_pips": 25}
    }))
    .unwrap();
    let rotation_cartridge = validate_cartridge(&rotation_doc).unwrap();
    let _ = run_backtest(&candles, rotation_cartridge, 1.0).unwrap();

    let doc = serde_json::from_value(ma_crossover_doc()).unwrap();
    let cartridge_after = validate_cartridge(&doc).unwrap();
    let result_after = run_backtest(&candles, cartridge_after, 0.0001).unwrap();

    assert_eq!(result_before.trades, result_after.trades);
}

// P11 — warm-up safety: no signal before every referenced alias is defined.
#[test]
fn p11_no_signal_before_warmup_complete() {
    let doc = serde_json::from_value(ma_crossover_doc()).unwrap();
    let cartridge = validate_cartridge(&doc).unwrap();
    // slow = SMA(4): defined starting at index 3. Fewer candles than that
    // means every bar is warm-up; no trade should ever open.
    let candles = candles_from_closes(&[1.0, 1.0, 1.0]);
    let result = run_backtest(&candles, cartridge, 0.0001).unwrap();
    assert!(result.trades.is_empty());
}
