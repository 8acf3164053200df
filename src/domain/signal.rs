//! Signal — an entry intent emitted by the strategy interpreter.
//!
//! Signals are portfolio-agnostic: the interpreter that emits them only sees
//! bar history and indicator values, never the engine's open-trade state
//! (spec §4.6 step 2 is the engine's job, not the signal's).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Directional intent of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalDirection {
    Buy,
    Sell,
}

/// An entry signal produced at a candle boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub direction: SignalDirection,
    pub price: f64,
    pub ts: DateTime<Utc>,
    pub reason: String,
}
