//! Strategy comparator
//!
//! Runs every configured strategy against the same price series and ranks
//! the outcomes. Each run is a pure function of (series, config, capital)
//! owning its own portfolio state, so the runs execute in parallel without
//! locking; one strategy's failure never aborts the batch.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{BacktestError, Result};
use crate::metrics;
use crate::simulator;
use crate::strategies::{Strategy, StrategyConfig};
use crate::types::{BacktestReport, PriceSeries};
use crate::{CapitalConfig, SymbolMeta};

/// A strategy that produced no result, with the reason retained
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyFailure {
    pub strategy: String,
    pub reason: String,
}

/// Ranked comparison output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Successful runs, rank 1 first
    pub ranked: Vec<BacktestReport>,
    /// Failed strategies, excluded from ranking
    pub failures: Vec<StrategyFailure>,
}

impl ComparisonReport {
    /// The best-performing strategy, if any run succeeded
    pub fn best(&self) -> Option<&BacktestReport> {
        self.ranked.first()
    }
}

/// Run every configured strategy against `series` and rank the results.
///
/// The capital configuration is shared by all runs and validated once; a bad
/// one fails the whole batch. Per-strategy errors (unknown identifier, bad
/// parameters, series shorter than the warm-up) are collected as failures.
pub fn run_backtests(
    series: &PriceSeries,
    meta: &SymbolMeta,
    capital: &CapitalConfig,
    configs: &[StrategyConfig],
) -> Result<ComparisonReport> {
    capital.validate()?;
    if series.is_empty() {
        return Err(BacktestError::invalid_config(
            "price series must not be empty",
        ));
    }

    info!(
        symbol = %meta.symbol,
        bars = series.len(),
        strategies = configs.len(),
        "running strategy comparison"
    );

    let outcomes: Vec<_> = configs
        .par_iter()
        .map(|config| run_strategy(series, meta, capital, config))
        .collect();

    let mut ranked = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(report) => ranked.push(report),
            Err(failure) => failures.push(failure),
        }
    }

    ranked.sort_by(rank_ordering);
    if let Some(best) = ranked.first() {
        info!(
            strategy = %best.strategy_name,
            return_pct = %best.summary.return_percentage,
            "comparison complete"
        );
    }

    Ok(ComparisonReport { ranked, failures })
}

fn run_strategy(
    series: &PriceSeries,
    meta: &SymbolMeta,
    capital: &CapitalConfig,
    config: &StrategyConfig,
) -> std::result::Result<BacktestReport, StrategyFailure> {
    backtest_one(series, meta, capital, config).map_err(|err| {
        warn!(strategy = %config.id, error = %err, "strategy failed, excluded from ranking");
        StrategyFailure {
            strategy: config.id.clone(),
            reason: err.to_string(),
        }
    })
}

fn backtest_one(
    series: &PriceSeries,
    meta: &SymbolMeta,
    capital: &CapitalConfig,
    config: &StrategyConfig,
) -> Result<BacktestReport> {
    let strategy = Strategy::from_config(config)?;
    let signals = strategy.generate(series)?;
    let simulation = simulator::simulate(series, &signals, capital)?;
    let summary = metrics::analyze(capital.initial_capital, &simulation.equity_curve, &simulation.trades);

    debug!(
        strategy = strategy.display_name(),
        trades = summary.total_trades,
        return_pct = %summary.return_percentage,
        "strategy run complete"
    );

    Ok(BacktestReport {
        strategy_name: strategy.display_name().to_string(),
        description: strategy.description().to_string(),
        symbol: meta.symbol.clone(),
        initial_capital: capital.initial_capital,
        summary,
        trade_log: simulation.trades,
        equity_curve: simulation.equity_curve,
    })
}

/// Return descending; ties prefer lower drawdown, then fewer trades
fn rank_ordering(a: &BacktestReport, b: &BacktestReport) -> Ordering {
    b.summary
        .return_percentage
        .cmp(&a.summary.return_percentage)
        .then_with(|| a.summary.max_drawdown.cmp(&b.summary.max_drawdown))
        .then_with(|| a.summary.total_trades.cmp(&b.summary.total_trades))
}
