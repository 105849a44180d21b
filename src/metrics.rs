//! Performance analytics
//!
//! Reduces an equity curve and trade log to the fixed metrics record the
//! comparator ranks on.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::types::{EquityPoint, Trade};

/// Fixed per-strategy metrics record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub final_value: Decimal,
    pub profit_loss: Decimal,
    pub return_percentage: Decimal,
    pub total_trades: u32,
    pub winning_trades: u32,
    /// Percent of closed trades with positive P&L
    pub win_rate: Decimal,
    /// Maximum percent decline from a running equity peak
    pub max_drawdown: Decimal,
    /// Annualized mean/stddev of daily equity returns, 0 when undefined
    pub sharpe_ratio: f64,
}

/// Summarize one simulation run
pub fn analyze(
    initial_capital: Decimal,
    equity_curve: &[EquityPoint],
    trades: &[Trade],
) -> PerformanceSummary {
    let final_value = equity_curve
        .last()
        .map(|p| p.equity)
        .unwrap_or(initial_capital);
    let profit_loss = final_value - initial_capital;
    let return_percentage = profit_loss / initial_capital * dec!(100);

    let total_trades = trades.len() as u32;
    let winning_trades = trades.iter().filter(|t| t.is_winning()).count() as u32;
    let win_rate = if total_trades > 0 {
        Decimal::from(winning_trades) / Decimal::from(total_trades) * dec!(100)
    } else {
        Decimal::ZERO
    };

    PerformanceSummary {
        final_value,
        profit_loss,
        return_percentage,
        total_trades,
        winning_trades,
        win_rate,
        max_drawdown: max_drawdown(equity_curve),
        sharpe_ratio: sharpe_ratio(equity_curve),
    }
}

/// Maximum percentage decline from any running peak, single forward pass
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> Decimal {
    let mut peak = Decimal::ZERO;
    let mut max_dd = Decimal::ZERO;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        }
        if peak > Decimal::ZERO {
            let drawdown = (peak - point.equity) / peak * dec!(100);
            if drawdown > max_dd {
                max_dd = drawdown;
            }
        }
    }

    max_dd
}

/// Annualized Sharpe ratio over daily equity returns (no risk-free leg)
fn sharpe_ratio(equity_curve: &[EquityPoint]) -> f64 {
    const TRADING_DAYS: f64 = 252.0;

    let mut returns = Vec::with_capacity(equity_curve.len().saturating_sub(1));
    for pair in equity_curve.windows(2) {
        let prev = pair[0].equity.to_f64().unwrap_or(f64::NAN);
        let curr = pair[1].equity.to_f64().unwrap_or(f64::NAN);
        if prev > 0.0 {
            returns.push((curr - prev) / prev);
        }
    }
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = (&returns).mean();
    let std_dev = (&returns).std_dev();
    if !std_dev.is_finite() || std_dev == 0.0 {
        return 0.0;
    }

    mean / std_dev * TRADING_DAYS.sqrt()
}
