//! Strategy cartridge engine — DSL interpreter and backtest engine for
//! JSON-configured intraday trading strategies.
//!
//! This crate contains the core of the engine:
//! - Domain value types (candles, signals, trades)
//! - An indicator library (SMA, EMA, RSI, MACD, VWAP, Stochastic)
//! - A cartridge schema validator covering both the simple and advanced DSL
//!   dialects
//! - A Multi-Indicator Manager, Crossover Detector, and Condition Evaluator
//! - A DSL strategy interpreter and a single-threaded backtest engine
//! - A results assembler producing trade lists and summary statistics

pub mod cartridge;
pub mod components;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod interpreter;

pub use cartridge::{validate_cartridge, CartridgeDoc, ValidatedCartridge};
pub use domain::{Candle, ExitReason, Signal, SignalDirection, Trade, TradeStatus};
pub use engine::{run_backtest, BacktestResult};
pub use error::EngineError;
