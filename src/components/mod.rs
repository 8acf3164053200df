//! The components that make up the DSL interpreter's runtime: the indicator
//! trait, the Multi-Indicator Manager (MM), the Crossover Detector (XD), and
//! the Condition Evaluator (CE) (spec §4.3-§4.5).

pub mod condition;
pub mod crossover;
pub mod indicator;
pub mod manager;

pub use condition::{
    evaluate_condition, Comparison, Condition, CrossDirection, Op, RotationCondition, Term, Zone,
    ZoneBound,
};
pub use crossover::CrossoverDetector;
pub use indicator::{Indicator, IndicatorValues};
pub use manager::IndicatorManager;
