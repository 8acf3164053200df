//! DSL Schema Validator (V) (spec §4.2, §6).
//!
//! Parses a strategy cartridge's raw JSON shape (`CartridgeDoc`) and
//! validates it into a `ValidatedCartridge` the interpreter can build
//! directly from: every alias resolved, every numeric domain checked, every
//! condition compiled into a `components::condition::Condition`. Validation
//! collects every failure before returning, rather than aborting on the
//! first one (spec §7).

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::components::condition::{
    Comparison, Condition, CrossDirection, RotationCondition, Zone, ZoneBound,
};
use crate::domain::candle::ReferencePrice;
use crate::error::{EngineError, ValidationIssue};

/// The implicit alias a timing-only cartridge's `reference_price` is bound
/// to for the remainder of its session (SPEC_FULL.md).
pub const REFERENCE_PRICE_ALIAS: &str = "reference_price";

// ---------------------------------------------------------------------
// Raw wire types (spec §6) — direct `serde` mirror of the canonical JSON.
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CartridgeDoc {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timing: Option<TimingSpec>,
    #[serde(default)]
    pub indicators: Vec<IndicatorSpecRaw>,
    pub conditions: ConditionsSpec,
    pub risk_management: RiskManagementSpec,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingSpec {
    pub reference_time: String,
    pub reference_price: ReferencePrice,
    pub signal_time: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndicatorSpecRaw {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub period: Option<i64>,
    #[serde(default)]
    pub params: Option<IndicatorParamsRaw>,
}

/// Extra parameters for multi-period indicators (MACD, Stochastic). All
/// fields optional; absent fields fall back to conventional defaults,
/// checked for domain validity regardless of source.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IndicatorParamsRaw {
    pub fast: Option<i64>,
    pub slow: Option<i64>,
    pub signal: Option<i64>,
    pub k_period: Option<i64>,
    pub k_smoothing: Option<i64>,
    pub d_smoothing: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConditionsSpec {
    pub buy: ConditionSpec,
    pub sell: ConditionSpec,
}

/// The tagged union from spec §9: simple compare vs. rotation, modeled as
/// an untagged enum disambiguated by disjoint field sets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ConditionSpec {
    Rotation(RotationSpec),
    Compare(CompareSpec),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompareSpec {
    pub compare: String,
    #[serde(default)]
    pub crossover: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RotationSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub zone: ZoneSpec,
    pub trigger: TriggerSpec,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ZoneSpec {
    #[serde(default)]
    pub all_above: Option<f64>,
    #[serde(default)]
    pub all_below: Option<f64>,
    pub indicators: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TriggerSpec {
    pub indicator: String,
    #[serde(default)]
    pub crosses_above: Option<f64>,
    #[serde(default)]
    pub crosses_below: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RiskManagementSpec {
    pub stop_loss_pips: f64,
    pub take_profit_pips: f64,
    #[serde(default)]
    pub max_daily_trades: Option<u32>,
    #[serde(default)]
    pub min_pip_distance: Option<f64>,
}

// ---------------------------------------------------------------------
// Validated output — what the interpreter actually consumes.
// ---------------------------------------------------------------------

/// Risk parameters (spec §9's fixed struct); `pip_size` stays a per-run
/// argument and is never embedded here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskParameters {
    pub stop_loss_pips: f64,
    pub take_profit_pips: f64,
    pub max_daily_trades: Option<u32>,
    pub min_pip_distance: Option<f64>,
}

/// A single concrete indicator instance to register with the Multi-Indicator
/// Manager. Multi-output types (MACD, Stochastic) carry all of their output
/// aliases together so the interpreter can share one underlying computation
/// across them.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedIndicator {
    Sma { alias: String, period: usize },
    Ema { alias: String, period: usize },
    Rsi { alias: String, period: usize },
    Vwap { alias: String },
    Macd {
        line_alias: String,
        signal_alias: String,
        histogram_alias: String,
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_alias: String,
        d_alias: String,
        k_period: usize,
        k_smoothing: usize,
        d_smoothing: usize,
    },
}

impl ValidatedIndicator {
    /// Every alias this instance contributes to the shared namespace.
    pub fn aliases(&self) -> Vec<&str> {
        match self {
            ValidatedIndicator::Sma { alias, .. }
            | ValidatedIndicator::Ema { alias, .. }
            | ValidatedIndicator::Rsi { alias, .. }
            | ValidatedIndicator::Vwap { alias } => vec![alias.as_str()],
            ValidatedIndicator::Macd {
                line_alias,
                signal_alias,
                histogram_alias,
                ..
            } => vec![line_alias.as_str(), signal_alias.as_str(), histogram_alias.as_str()],
            ValidatedIndicator::Stochastic { k_alias, d_alias, .. } => {
                vec![k_alias.as_str(), d_alias.as_str()]
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ValidatedTiming {
    pub reference_time: NaiveTime,
    pub reference_price: ReferencePrice,
    pub signal_time: NaiveTime,
}

fn parse_hhmm(raw: &str, path: &str, issues: &mut Issues) -> Option<NaiveTime> {
    match NaiveTime::parse_from_str(raw, "%H:%M") {
        Ok(t) => Some(t),
        Err(_) => {
            issues.push(path, format!("not a valid HH:MM time: '{raw}'"));
            None
        }
    }
}

/// A cartridge that has passed validation: every alias resolved, every
/// condition compiled, every numeric domain checked.
#[derive(Debug, Clone)]
pub struct ValidatedCartridge {
    pub name: String,
    pub version: String,
    pub description: String,
    pub timing: Option<ValidatedTiming>,
    pub indicators: Vec<ValidatedIndicator>,
    pub buy: Condition,
    pub sell: Condition,
    pub risk: RiskParameters,
}

struct Issues(Vec<ValidationIssue>);

impl Issues {
    fn new() -> Self {
        Self(Vec::new())
    }
    fn push(&mut self, path: impl Into<String>, rule: impl Into<String>) {
        self.0.push(ValidationIssue::new(path, rule));
    }
}

fn period_from_raw(raw: Option<i64>, path: &str, issues: &mut Issues) -> usize {
    match raw {
        Some(p) if p >= 1 => p as usize,
        Some(_) => {
            issues.push(path, "period must be >= 1");
            1
        }
        None => {
            issues.push(path, "period is required for this indicator type");
            1
        }
    }
}

/// Validate a raw cartridge document into a `ValidatedCartridge`, or a list
/// of every failing path/rule.
pub fn validate_cartridge(doc: &CartridgeDoc) -> Result<ValidatedCartridge, EngineError> {
    let mut issues = Issues::new();
    let mut known_aliases: HashSet<String> = HashSet::new();

    if doc.timing.is_some() {
        known_aliases.insert(REFERENCE_PRICE_ALIAS.to_string());
    }

    let timing = doc.timing.as_ref().and_then(|t| {
        let reference_time = parse_hhmm(&t.reference_time, "timing.reference_time", &mut issues);
        let signal_time = parse_hhmm(&t.signal_time, "timing.signal_time", &mut issues);
        match (reference_time, signal_time) {
            (Some(reference_time), Some(signal_time)) => Some(ValidatedTiming {
                reference_time,
                reference_price: t.reference_price,
                signal_time,
            }),
            _ => None,
        }
    });

    let mut indicators = Vec::with_capacity(doc.indicators.len());
    for (i, raw) in doc.indicators.iter().enumerate() {
        let path = format!("indicators[{i}]");
        let validated = validate_indicator(raw, &path, &mut issues);
        if let Some(validated) = validated {
            for alias in validated.aliases() {
                if !known_aliases.insert(alias.to_string()) {
                    issues.push(format!("{path}.alias"), format!("duplicate alias: {alias}"));
                }
            }
            indicators.push(validated);
        }
    }

    let buy = validate_condition(&doc.conditions.buy, "conditions.buy", &known_aliases, &mut issues);
    let sell = validate_condition(&doc.conditions.sell, "conditions.sell", &known_aliases, &mut issues);

    if doc.risk_management.stop_loss_pips <= 0.0 {
        issues.push("risk_management.stop_loss_pips", "must be > 0");
    }
    if doc.risk_management.take_profit_pips <= 0.0 {
        issues.push("risk_management.take_profit_pips", "must be > 0");
    }
    if let Some(n) = doc.risk_management.max_daily_trades {
        if n == 0 {
            issues.push("risk_management.max_daily_trades", "must be >= 1 when present");
        }
    }
    if let Some(d) = doc.risk_management.min_pip_distance {
        if d < 0.0 {
            issues.push("risk_management.min_pip_distance", "must be >= 0 when present");
        }
    }

    if !issues.0.is_empty() {
        return Err(EngineError::SchemaInvalid(issues.0));
    }

    Ok(ValidatedCartridge {
        name: doc.name.clone(),
        version: doc.version.clone(),
        description: doc.description.clone(),
        timing,
        indicators,
        buy: buy.expect("no issues implies buy compiled"),
        sell: sell.expect("no issues implies sell compiled"),
        risk: RiskParameters {
            stop_loss_pips: doc.risk_management.stop_loss_pips,
            take_profit_pips: doc.risk_management.take_profit_pips,
            max_daily_trades: doc.risk_management.max_daily_trades,
            min_pip_distance: doc.risk_management.min_pip_distance,
        },
    })
}

fn validate_indicator(
    raw: &IndicatorSpecRaw,
    path: &str,
    issues: &mut Issues,
) -> Option<ValidatedIndicator> {
    let params = raw.params.clone().unwrap_or_default();
    match raw.kind.as_str() {
        "SMA" => {
            let period = period_from_raw(raw.period, &format!("{path}.period"), issues);
            let alias = raw.alias.clone().unwrap_or_else(|| format!("SMA{period}"));
            Some(ValidatedIndicator::Sma { alias, period })
        }
        "EMA" => {
            let period = period_from_raw(raw.period, &format!("{path}.period"), issues);
            let alias = raw.alias.clone().unwrap_or_else(|| format!("EMA{period}"));
            Some(ValidatedIndicator::Ema { alias, period })
        }
        "RSI" => {
            let period = period_from_raw(raw.period, &format!("{path}.period"), issues);
            let alias = raw.alias.clone().unwrap_or_else(|| "RSI".to_string());
            Some(ValidatedIndicator::Rsi { alias, period })
        }
        "VWAP" => {
            let alias = raw.alias.clone().unwrap_or_else(|| "VWAP".to_string());
            Some(ValidatedIndicator::Vwap { alias })
        }
        "MACD" => {
            let fast = params.fast.unwrap_or(12);
            let slow = params.slow.unwrap_or(26);
            let signal = params.signal.unwrap_or(9);
            let (fast, slow, signal) = validate_macd_periods(fast, slow, signal, path, issues);
            let (line_alias, signal_alias, histogram_alias) = match &raw.alias {
                Some(alias) => (
                    alias.clone(),
                    format!("{alias}_SIGNAL"),
                    format!("{alias}_HISTOGRAM"),
                ),
                None => (
                    "MACD".to_string(),
                    "MACD_SIGNAL".to_string(),
                    "MACD_HISTOGRAM".to_string(),
                ),
            };
            Some(ValidatedIndicator::Macd {
                line_alias,
                signal_alias,
                histogram_alias,
                fast,
                slow,
                signal,
            })
        }
        "STOCHASTIC" => {
            let k_period = require_positive(params.k_period, 14, &format!("{path}.params.k_period"), issues);
            let k_smoothing =
                require_positive(params.k_smoothing, 3, &format!("{path}.params.k_smoothing"), issues);
            let d_smoothing =
                require_positive(params.d_smoothing, 3, &format!("{path}.params.d_smoothing"), issues);
            let alias = match &raw.alias {
                Some(alias) => alias.clone(),
                None => {
                    issues.push(format!("{path}.alias"), "alias is required for STOCHASTIC");
                    "STOCHASTIC".to_string()
                }
            };
            let d_alias = format!("{alias}_D");
            Some(ValidatedIndicator::Stochastic {
                k_alias: alias,
                d_alias,
                k_period,
                k_smoothing,
                d_smoothing,
            })
        }
        other => {
            issues.push(format!("{path}.type"), format!("unknown indicator type: {other}"));
            None
        }
    }
}

fn require_positive(raw: Option<i64>, default: i64, path: &str, issues: &mut Issues) -> usize {
    let value = raw.unwrap_or(default);
    if value < 1 {
        issues.push(path, "must be >= 1");
        1
    } else {
        value as usize
    }
}

fn validate_macd_periods(
    fast: i64,
    slow: i64,
    signal: i64,
    path: &str,
    issues: &mut Issues,
) -> (usize, usize, usize) {
    if fast < 1 {
        issues.push(format!("{path}.params.fast"), "must be >= 1");
    }
    if slow < 1 {
        issues.push(format!("{path}.params.slow"), "must be >= 1");
    }
    if signal < 1 {
        issues.push(format!("{path}.params.signal"), "must be >= 1");
    }
    if fast >= slow {
        issues.push(format!("{path}.params"), "fast period must be < slow period");
    }
    (fast.max(1) as usize, slow.max(2) as usize, signal.max(1) as usize)
}

fn validate_condition(
    spec: &ConditionSpec,
    path: &str,
    known_aliases: &HashSet<String>,
    issues: &mut Issues,
) -> Option<Condition> {
    match spec {
        ConditionSpec::Compare(compare_spec) => {
            let comparison = match Comparison::parse(&compare_spec.compare) {
                Ok(c) => c,
                Err(EngineError::SchemaInvalid(sub_issues)) => {
                    for sub in sub_issues {
                        issues.push(format!("{path}.compare"), sub.rule);
                    }
                    return None;
                }
                Err(_) => unreachable!("Comparison::parse only returns SchemaInvalid"),
            };
            for alias in comparison.aliases() {
                if !known_aliases.contains(alias) {
                    issues.push(format!("{path}.compare"), format!("unknown alias: {alias}"));
                }
            }
            Some(Condition::Compare {
                comparison,
                crossover: compare_spec.crossover,
            })
        }
        ConditionSpec::Rotation(rotation_spec) => {
            if rotation_spec.kind != "rotation" {
                issues.push(format!("{path}.type"), "expected \"rotation\"");
            }
            let bound = match (rotation_spec.zone.all_above, rotation_spec.zone.all_below) {
                (Some(t), None) => Some(ZoneBound::AllAbove(t)),
                (None, Some(t)) => Some(ZoneBound::AllBelow(t)),
                (Some(_), Some(_)) => {
                    issues.push(format!("{path}.zone"), "exactly one of all_above/all_below required");
                    None
                }
                (None, None) => {
                    issues.push(format!("{path}.zone"), "exactly one of all_above/all_below required");
                    None
                }
            };
            for alias in &rotation_spec.zone.indicators {
                if !known_aliases.contains(alias) {
                    issues.push(format!("{path}.zone.indicators"), format!("unknown alias: {alias}"));
                }
            }
            let direction = match (
                rotation_spec.trigger.crosses_above,
                rotation_spec.trigger.crosses_below,
            ) {
                (Some(t), None) => Some((CrossDirection::Above, t)),
                (None, Some(t)) => Some((CrossDirection::Below, t)),
                _ => {
                    issues.push(
                        format!("{path}.trigger"),
                        "exactly one of crosses_above/crosses_below required",
                    );
                    None
                }
            };
            if !known_aliases.contains(&rotation_spec.trigger.indicator) {
                issues.push(
                    format!("{path}.trigger.indicator"),
                    format!("unknown alias: {}", rotation_spec.trigger.indicator),
                );
            }
            match (bound, direction) {
                (Some(bound), Some((trigger_direction, trigger_threshold))) => {
                    Some(Condition::Rotation(RotationCondition {
                        zone: Zone {
                            bound,
                            indicators: rotation_spec.zone.indicators.clone(),
                        },
                        trigger_indicator: rotation_spec.trigger.indicator.clone(),
                        trigger_direction,
                        trigger_threshold,
                        zone_window: 1,
                    }))
                }
                _ => None,
            }
        }
    }
}
