//! Candle — the fundamental OHLCV unit the engine operates on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single OHLCV bar for one symbol/timeframe, timestamped in UTC.
///
/// Immutable once constructed. Candle sequences fed to the engine must be
/// strictly increasing by `ts` with no duplicates (spec §4.7, `BAD_TIMELINE`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub ts: DateTime<Utc>,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    pub v: f64,
}

impl Candle {
    /// Midpoint price, used by VWAP.
    pub fn mid(&self) -> f64 {
        (self.h + self.l) / 2.0
    }

    /// OHLCV sanity check per spec §3: `l <= o,c <= h`, `l <= h`, `v >= 0`.
    pub fn is_sane(&self) -> bool {
        self.l <= self.o
            && self.l <= self.c
            && self.o <= self.h
            && self.c <= self.h
            && self.l <= self.h
            && self.v >= 0.0
            && !self.o.is_nan()
            && !self.h.is_nan()
            && !self.l.is_nan()
            && !self.c.is_nan()
            && !self.v.is_nan()
    }

    /// The named OHLC field, selected by `timing.reference_price`.
    pub fn field(&self, which: ReferencePrice) -> f64 {
        match which {
            ReferencePrice::Open => self.o,
            ReferencePrice::High => self.h,
            ReferencePrice::Low => self.l,
            ReferencePrice::Close => self.c,
        }
    }
}

/// Which OHLC field a time-based cartridge's `reference_price` names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferencePrice {
    Open,
    High,
    Low,
    Close,
}

/// Validate an ordered candle slice against the timeline invariant
/// (spec §4.7): strictly increasing timestamps, no duplicates.
///
/// Returns `Ok(())` for an empty or single-candle slice.
pub fn check_timeline(candles: &[Candle]) -> Result<(), crate::error::EngineError> {
    for w in candles.windows(2) {
        if w[1].ts <= w[0].ts {
            return Err(crate::error::EngineError::BadTimeline(format!(
                "candle at {} does not strictly follow candle at {}",
                w[1].ts, w[0].ts
            )));
        }
    }
    Ok(())
}
