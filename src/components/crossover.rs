//! Crossover Detector (XD) (spec §4.4).
//!
//! State: `{alias -> previous_value}`, no history retained beyond the last
//! bar. `detect_*` must be called before `update` for the same bar and
//! alias; the engine enforces "evaluate then update" once per bar, after
//! condition evaluation (spec §4.6 step 4, §5 ordering guarantee (c)).

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct CrossoverDetector {
    previous: HashMap<String, f64>,
}

impl CrossoverDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff a previous value exists, `previous <= threshold`, and
    /// `current > threshold`.
    pub fn detect_cross_above(&self, alias: &str, current: f64, threshold: f64) -> bool {
        match self.previous.get(alias) {
            Some(&prev) => prev <= threshold && current > threshold,
            None => false,
        }
    }

    /// True iff a previous value exists, `previous >= threshold`, and
    /// `current < threshold`.
    pub fn detect_cross_below(&self, alias: &str, current: f64, threshold: f64) -> bool {
        match self.previous.get(alias) {
            Some(&prev) => prev >= threshold && current < threshold,
            None => false,
        }
    }

    /// The previous bar's value for `alias`, if any has been recorded.
    pub fn previous(&self, alias: &str) -> Option<f64> {
        self.previous.get(alias).copied()
    }

    /// Record `current` as `alias`'s previous value for the next bar. Must
    /// be called after all `detect_*` calls for the current bar.
    pub fn update(&mut self, alias: &str, current: f64) {
        self.previous.insert(alias.to_string(), current);
    }
}
