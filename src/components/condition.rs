//! Condition Evaluator (CE) (spec §4.5).
//!
//! Evaluates simple comparisons (optionally gated on a crossover transition),
//! zone tests (`all_above`/`all_below`), and rotation conditions (zone held
//! on the previous bar AND a trigger indicator crosses a threshold on the
//! current bar).

use std::collections::HashMap;

use crate::components::crossover::CrossoverDetector;
use crate::error::{EngineError, ValidationIssue};

/// One side of an infix comparison: either an indicator alias or a numeric
/// literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Alias(String),
    Literal(f64),
}

impl Term {
    fn parse(raw: &str) -> Result<Self, EngineError> {
        let s = raw.trim();
        let looks_like_alias = s
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if looks_like_alias {
            return Ok(Term::Alias(s.to_string()));
        }
        s.parse::<f64>().map(Term::Literal).map_err(|_| {
            EngineError::SchemaInvalid(vec![ValidationIssue::new(
                "compare",
                format!("invalid term in comparison: '{s}'"),
            )])
        })
    }

    fn resolve(&self, current: &HashMap<String, f64>) -> Option<f64> {
        match self {
            Term::Alias(a) => current.get(a).copied(),
            Term::Literal(v) => Some(*v),
        }
    }

    fn resolve_previous(&self, xd: &CrossoverDetector) -> Option<f64> {
        match self {
            Term::Alias(a) => xd.previous(a),
            Term::Literal(v) => Some(*v),
        }
    }
}

/// A comparison operator (spec §6 grammar: `>,<,>=,<=,==,!=`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl Op {
    fn apply(self, x: f64, y: f64) -> bool {
        match self {
            Op::Gt => x > y,
            Op::Lt => x < y,
            Op::Ge => x >= y,
            Op::Le => x <= y,
            Op::Eq => x == y,
            Op::Ne => x != y,
        }
    }
}

/// An infix comparison `<term> <op> <term>` (spec §6).
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub lhs: Term,
    pub op: Op,
    pub rhs: Term,
}

impl Comparison {
    /// Parse a whitespace-insensitive infix expression. Operators are
    /// matched longest-first so `>=` isn't mistaken for `>`.
    pub fn parse(expr: &str) -> Result<Self, EngineError> {
        const OPS: [(&str, Op); 6] = [
            (">=", Op::Ge),
            ("<=", Op::Le),
            ("==", Op::Eq),
            ("!=", Op::Ne),
            (">", Op::Gt),
            ("<", Op::Lt),
        ];
        for (token, op) in OPS {
            if let Some(pos) = expr.find(token) {
                let lhs_raw = &expr[..pos];
                let rhs_raw = &expr[pos + token.len()..];
                if lhs_raw.trim().is_empty() || rhs_raw.trim().is_empty() {
                    continue;
                }
                let lhs = Term::parse(lhs_raw)?;
                let rhs = Term::parse(rhs_raw)?;
                return Ok(Comparison { lhs, op, rhs });
            }
        }
        Err(EngineError::SchemaInvalid(vec![ValidationIssue::new(
            "compare",
            format!("no recognized comparison operator in: '{expr}'"),
        )]))
    }

    /// Current-bar predicate. Missing value on either side makes it false,
    /// never an error (spec §4.5).
    pub fn evaluate(&self, current: &HashMap<String, f64>) -> bool {
        match (self.lhs.resolve(current), self.rhs.resolve(current)) {
            (Some(x), Some(y)) => self.op.apply(x, y),
            _ => false,
        }
    }

    /// The alias terms referenced by this comparison, in `lhs, rhs` order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        [&self.lhs, &self.rhs].into_iter().filter_map(|t| match t {
            Term::Alias(a) => Some(a.as_str()),
            Term::Literal(_) => None,
        })
    }

    /// Crossover-gated predicate: true iff `P(current)` holds now and did
    /// not hold on the previous bar. When either side has no recorded
    /// previous value yet (the first bar that alias is defined), the
    /// previous-bar predicate is treated as not having held, so a predicate
    /// that is true on its first defined bar counts as a crossover
    /// (spec §4.5).
    pub fn evaluate_crossover(&self, current: &HashMap<String, f64>, xd: &CrossoverDetector) -> bool {
        if !self.evaluate(current) {
            return false;
        }
        let held_previously = match (self.lhs.resolve_previous(xd), self.rhs.resolve_previous(xd)) {
            (Some(px), Some(py)) => self.op.apply(px, py),
            _ => false,
        };
        !held_previously
    }
}

/// Which side of the zone a set of indicators must stay on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneBound {
    AllAbove(f64),
    AllBelow(f64),
}

/// A zone test over a group of aliases (spec §4.5).
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub bound: ZoneBound,
    pub indicators: Vec<String>,
}

impl Zone {
    /// Evaluate against whatever value lookup the caller supplies — current
    /// bar values for a standalone zone, or the crossover detector's
    /// previous-bar values for a rotation's zone leg. Short-circuits on the
    /// first failing alias; a missing value fails the zone.
    pub fn evaluate(&self, lookup: impl Fn(&str) -> Option<f64>) -> bool {
        self.indicators.iter().all(|alias| match self.bound {
            ZoneBound::AllAbove(t) => lookup(alias).is_some_and(|v| v > t),
            ZoneBound::AllBelow(t) => lookup(alias).is_some_and(|v| v < t),
        })
    }
}

/// Which direction a rotation's trigger must cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossDirection {
    Above,
    Below,
}

/// A rotation condition: the zone held on the previous bar, AND the trigger
/// alias crosses its threshold on the current bar (spec §4.5, §4.2).
#[derive(Debug, Clone, PartialEq)]
pub struct RotationCondition {
    pub zone: Zone,
    pub trigger_indicator: String,
    pub trigger_direction: CrossDirection,
    pub trigger_threshold: f64,
    /// Number of trailing bars the zone must have held across. Fixed at `1`
    /// for cartridges parsed from the documented JSON wire format (see
    /// SPEC_FULL.md); kept as a field so the evaluator logic does not need
    /// to change if a future wire format exposes it.
    pub zone_window: usize,
}

fn evaluate_rotation(
    rotation: &RotationCondition,
    current: &HashMap<String, f64>,
    xd: &CrossoverDetector,
) -> bool {
    let zone_held = rotation.zone.evaluate(|alias| xd.previous(alias));
    let trigger_value = match current.get(&rotation.trigger_indicator) {
        Some(v) => *v,
        None => return false,
    };
    let triggered = match rotation.trigger_direction {
        CrossDirection::Above => {
            xd.detect_cross_above(&rotation.trigger_indicator, trigger_value, rotation.trigger_threshold)
        }
        CrossDirection::Below => {
            xd.detect_cross_below(&rotation.trigger_indicator, trigger_value, rotation.trigger_threshold)
        }
    };
    zone_held && triggered
}

/// A buy/sell condition: either a (possibly crossover-gated) comparison, or
/// a rotation (spec §4.2's two dialects modeled as one discriminated union).
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare { comparison: Comparison, crossover: bool },
    Rotation(RotationCondition),
}

/// Evaluate any condition variant against the current bar's values and the
/// crossover detector's previous-bar state.
pub fn evaluate_condition(
    condition: &Condition,
    current: &HashMap<String, f64>,
    xd: &CrossoverDetector,
) -> bool {
    match condition {
        Condition::Compare { comparison, crossover } => {
            if *crossover {
                comparison.evaluate_crossover(current, xd)
            } else {
                comparison.evaluate(current)
            }
        }
        Condition::Rotation(rotation) => evaluate_rotation(rotation, current, xd),
    }
}
