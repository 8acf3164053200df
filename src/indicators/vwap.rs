//! Volume-Weighted Average Price (VWAP) (spec §4.1).
//!
//! Running `Σ(mid·v)/Σ(v)` within a trading session, `mid = (h+l)/2`;
//! resets at each new session boundary (default: UTC calendar day). If
//! `Σv = 0` at a bar, the value is undefined at that bar.

use chrono::{DateTime, NaiveDate, Utc};

use crate::components::indicator::Indicator;
use crate::domain::Candle;

/// A session boundary function: given a candle's timestamp, returns an
/// opaque key that is equal for two timestamps in the same session and
/// different otherwise. Default is the UTC calendar date.
pub trait SessionKey: Send + Sync {
    fn key(&self, ts: DateTime<Utc>) -> NaiveDate;
}

/// Default session boundary: UTC calendar day (spec §4.1, §4.7).
#[derive(Debug, Clone, Copy, Default)]
pub struct UtcDaySession;

impl SessionKey for UtcDaySession {
    fn key(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.date_naive()
    }
}

pub struct Vwap {
    alias: String,
    session: Box<dyn SessionKey>,
}

impl Vwap {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            session: Box::new(UtcDaySession),
        }
    }

    pub fn with_session(alias: impl Into<String>, session: Box<dyn SessionKey>) -> Self {
        Self {
            alias: alias.into(),
            session,
        }
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        &self.alias
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        let mut out = Vec::with_capacity(candles.len());
        let mut current_session: Option<NaiveDate> = None;
        let mut sum_pv = 0.0;
        let mut sum_v = 0.0;
        for candle in candles {
            let key = self.session.key(candle.ts);
            if current_session != Some(key) {
                current_session = Some(key);
                sum_pv = 0.0;
                sum_v = 0.0;
            }
            sum_pv += candle.mid() * candle.v;
            sum_v += candle.v;
            out.push(if sum_v == 0.0 { None } else { Some(sum_pv / sum_v) });
        }
        out
    }
}
