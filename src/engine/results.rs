//! Results Assembler (R) (spec §4.8).
//!
//! Packages a completed run's trades into summary statistics. Per-trade
//! pips are `Trade::pips`; this module only aggregates.

use serde::{Deserialize, Serialize};

use crate::domain::Trade;

/// Aggregate statistics over a run's trades.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub total_pips: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub profit_factor: f64,
}

/// Compute the run summary (spec §4.8). `profit_factor` is `+inf` when
/// there are wins and no losses, `0` when there are no trades at all.
pub fn summarize(trades: &[Trade], pip_size: f64) -> Summary {
    let total_trades = trades.len();
    let pips: Vec<f64> = trades.iter().filter_map(|t| t.pips(pip_size)).collect();

    let wins: Vec<f64> = pips.iter().copied().filter(|&p| p > 0.0).collect();
    let losses: Vec<f64> = pips.iter().copied().filter(|&p| p < 0.0).collect();

    let total_pips: f64 = pips.iter().sum();
    let win_rate = if total_trades == 0 {
        0.0
    } else {
        wins.len() as f64 / total_trades as f64
    };
    let average_win = if wins.is_empty() {
        0.0
    } else {
        wins.iter().sum::<f64>() / wins.len() as f64
    };
    let average_loss = if losses.is_empty() {
        0.0
    } else {
        losses.iter().sum::<f64>() / losses.len() as f64
    };

    let sum_wins: f64 = wins.iter().sum();
    let sum_losses: f64 = losses.iter().sum();
    let profit_factor = if total_trades == 0 {
        0.0
    } else if sum_losses == 0.0 {
        if sum_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        sum_wins / sum_losses.abs()
    };

    Summary {
        total_trades,
        wins: wins.len(),
        losses: losses.len(),
        win_rate,
        total_pips,
        average_win,
        average_loss,
        profit_factor,
    }
}
