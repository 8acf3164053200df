//! Trade — a position's lifecycle from entry to exit.
//!
//! A `Signal` (domain::signal) is the PROPOSED stage of spec §3's lifecycle;
//! once the engine acts on it, a `Trade` is born directly in the OPEN state
//! and transitions to CLOSED exactly once. The engine holds at most one
//! `Trade` in the OPEN state at a time (spec §4.7, invariant P6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::signal::SignalDirection;

/// Why a trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    EndOfRun,
    SessionEnd,
}

/// Lifecycle state of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    Open,
    Closed,
}

/// A single round-trip trade.
///
/// `exit_*` fields are `None` while `status == Open` and `Some` once
/// `status == Closed`; `close()` is the only way to transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub status: TradeStatus,
    pub direction: SignalDirection,
    pub entry_ts: DateTime<Utc>,
    pub entry_price: f64,
    pub sl: f64,
    pub tp: f64,
    pub exit_ts: Option<DateTime<Utc>>,
    pub exit_price: Option<f64>,
    pub exit_reason: Option<ExitReason>,
}

impl Trade {
    /// Open a new trade. `sl`/`tp` must already respect the directional
    /// invariant from spec §3 (BUY: `sl < entry < tp`; SELL: `tp < entry < sl`);
    /// this is a constructor-level invariant enforced by the caller
    /// (`engine::backtest`, which derives `sl`/`tp` from risk parameters), so
    /// it is asserted here rather than returned as a `Result` — the same
    /// convention the teacher uses for `Sma::new`/`Ema::new` period checks.
    pub fn open(
        direction: SignalDirection,
        entry_ts: DateTime<Utc>,
        entry_price: f64,
        sl: f64,
        tp: f64,
    ) -> Self {
        match direction {
            SignalDirection::Buy => debug_assert!(sl < entry_price && entry_price < tp),
            SignalDirection::Sell => debug_assert!(tp < entry_price && entry_price < sl),
        }
        Self {
            status: TradeStatus::Open,
            direction,
            entry_ts,
            entry_price,
            sl,
            tp,
            exit_ts: None,
            exit_price: None,
            exit_reason: None,
        }
    }

    /// Close an open trade. Panics if already closed or if `exit_ts` precedes
    /// `entry_ts` (both are engine-internal invariants, never caller input).
    pub fn close(&mut self, exit_ts: DateTime<Utc>, exit_price: f64, reason: ExitReason) {
        assert_eq!(self.status, TradeStatus::Open, "trade already closed");
        assert!(exit_ts >= self.entry_ts, "exit_ts precedes entry_ts");
        self.status = TradeStatus::Closed;
        self.exit_ts = Some(exit_ts);
        self.exit_price = Some(exit_price);
        self.exit_reason = Some(reason);
    }

    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    /// Per-trade pips (spec §4.8): BUY `(exit-entry)/pip_size`, SELL inverse.
    /// Returns `None` while the trade is still open.
    pub fn pips(&self, pip_size: f64) -> Option<f64> {
        let exit_price = self.exit_price?;
        Some(match self.direction {
            SignalDirection::Buy => (exit_price - self.entry_price) / pip_size,
            SignalDirection::Sell => (self.entry_price - exit_price) / pip_size,
        })
    }

    pub fn is_winner(&self, pip_size: f64) -> bool {
        self.pips(pip_size).is_some_and(|p| p > 0.0)
    }
}
