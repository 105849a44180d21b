//! Type definitions for the backtesting engine

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::metrics::PerformanceSummary;

/// OHLCV bar for one trading day
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Chronological bar sequence for a single symbol
///
/// The series arrives pre-validated from the data layer: strictly increasing
/// dates, positive prices, `low <= open,close <= high`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self { bars }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    #[inline]
    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn bar(&self, index: usize) -> Option<&PriceBar> {
        self.bars.get(index)
    }

    /// Close prices as f64 for the indicator kernels
    pub fn closes(&self) -> Vec<f64> {
        self.bars
            .iter()
            .map(|b| b.close.to_f64().unwrap_or(f64::NAN))
            .collect()
    }

    /// High prices as f64 for the indicator kernels
    pub fn highs(&self) -> Vec<f64> {
        self.bars
            .iter()
            .map(|b| b.high.to_f64().unwrap_or(f64::NAN))
            .collect()
    }

    /// Low prices as f64 for the indicator kernels
    pub fn lows(&self) -> Vec<f64> {
        self.bars
            .iter()
            .map(|b| b.low.to_f64().unwrap_or(f64::NAN))
            .collect()
    }
}

/// Per-bar trading signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    LongEntry,
    LongExit,
    Hold,
}

/// Open long position inside a simulation run
///
/// `cost_basis` is the cash deducted at entry, fees included, so the closing
/// trade's P&L reconciles exactly against the cash ledger. Entry-leg costs
/// are carried until the exit leg completes the trade record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    pub entry_date: NaiveDate,
    pub entry_price: Decimal,
    pub quantity: Decimal,
    pub cost_basis: Decimal,
    pub entry_commission: Decimal,
    pub entry_slippage: Decimal,
}

/// Closed round-trip trade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    /// Entry fill price, slippage included
    pub entry_price: Decimal,
    /// Exit fill price, slippage included
    pub exit_price: Decimal,
    pub quantity: Decimal,
    /// Commission across both legs
    pub commission_paid: Decimal,
    /// Slippage cost across both legs
    pub slippage_cost: Decimal,
    /// Net of all transaction costs
    pub profit_loss: Decimal,
}

impl Trade {
    #[inline]
    pub fn is_winning(&self) -> bool {
        self.profit_loss > Decimal::ZERO
    }
}

/// Equity curve point, one per bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: Decimal,
}

/// Complete per-strategy backtest output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub strategy_name: String,
    pub description: String,
    pub symbol: String,
    pub initial_capital: Decimal,
    pub summary: PerformanceSummary,
    pub trade_log: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}
