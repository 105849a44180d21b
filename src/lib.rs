//! Strategy backtesting and comparison engine
//!
//! Evaluates a set of technical trading strategies against one historical
//! price series and ranks them by simulated performance. Data flows strictly
//! downward: price series -> indicators -> signals -> simulated trades and
//! equity -> metrics -> ranking. The caller (CLI, web layer) supplies an
//! already-validated series and renders the structured reports; the engine
//! performs no I/O of its own.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

pub mod comparator;
pub mod error;
pub mod indicators;
pub mod metrics;
pub mod simulator;
pub mod strategies;
pub mod types;

pub use comparator::{run_backtests, ComparisonReport, StrategyFailure};
pub use error::{BacktestError, Result};
pub use metrics::PerformanceSummary;
pub use strategies::{Strategy, StrategyConfig};
pub use types::{BacktestReport, EquityPoint, PriceBar, PriceSeries, Signal, Trade};

/// Capital and transaction-cost parameters shared by every strategy run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalConfig {
    pub initial_capital: Decimal,
    /// Commission per leg, as a fraction of notional
    pub commission_rate: Decimal,
    /// Execution price disadvantage per leg, as a fraction of the close
    pub slippage_rate: Decimal,
}

impl Default for CapitalConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(100000),
            commission_rate: Decimal::ZERO,
            slippage_rate: Decimal::ZERO,
        }
    }
}

impl CapitalConfig {
    /// Reject non-positive capital and negative rates
    pub fn validate(&self) -> Result<()> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(BacktestError::invalid_config(
                "initial capital must be positive",
            ));
        }
        if self.commission_rate < Decimal::ZERO || self.slippage_rate < Decimal::ZERO {
            return Err(BacktestError::invalid_config(
                "commission and slippage rates must not be negative",
            ));
        }
        Ok(())
    }
}

/// Symbol identity attached to every report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolMeta {
    pub symbol: String,
    pub timeframe: String,
}

impl SymbolMeta {
    /// Daily-bar metadata for `symbol`
    pub fn daily(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe: "1d".to_string(),
        }
    }
}
