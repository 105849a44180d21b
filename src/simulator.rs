//! Bar-by-bar trade simulator
//!
//! Replays a signal sequence against its price series, managing a single-asset
//! portfolio through the FLAT -> LONG -> FLAT lifecycle. All money arithmetic
//! uses `Decimal` so repeated runs are bit-identical.

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{BacktestError, Result};
use crate::types::{EquityPoint, Position, PriceBar, PriceSeries, Signal, Trade};
use crate::CapitalConfig;

/// Raw simulation output, before analytics
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

/// Replay `signals` over `series` under the given capital configuration.
///
/// One decision per bar: an entry fills at `close * (1 + slippage)`, an exit
/// at `close * (1 - slippage)`, commission applied to both legs. Signals that
/// do not match the current state are ignored. A position still open after
/// the last bar is force-closed at the final close, and the final equity
/// point is restated to realized cash so the trade log reconciles exactly
/// with `final_value - initial_capital`.
pub fn simulate(
    series: &PriceSeries,
    signals: &[Signal],
    config: &CapitalConfig,
) -> Result<SimulationResult> {
    config.validate()?;
    if signals.len() != series.len() {
        return Err(BacktestError::invalid_config(
            "signal sequence length must match the price series",
        ));
    }

    let mut cash = config.initial_capital;
    let mut position: Option<Position> = None;
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(series.len());

    for (bar, signal) in series.bars().iter().zip(signals) {
        match signal {
            Signal::LongEntry if position.is_none() => {
                if let Some(opened) = open_position(bar, cash, config) {
                    cash -= opened.cost_basis;
                    position = Some(opened);
                } else {
                    debug!(date = %bar.date, "entry skipped: cash below one share");
                }
            }
            Signal::LongExit => {
                if let Some(open) = position.take() {
                    let (trade, proceeds) = close_position(&open, bar, config);
                    cash += proceeds;
                    trades.push(trade);
                }
            }
            // Entries while long and exits while flat are ignored.
            _ => {}
        }

        let marked = position
            .as_ref()
            .map(|p| p.quantity * bar.close)
            .unwrap_or(Decimal::ZERO);
        equity_curve.push(EquityPoint {
            date: bar.date,
            equity: cash + marked,
        });
    }

    // Forced liquidation at the final close.
    if let (Some(open), Some(last)) = (position.take(), series.bars().last()) {
        let (trade, proceeds) = close_position(&open, last, config);
        cash += proceeds;
        debug!(date = %last.date, pnl = %trade.profit_loss, "forced liquidation at series end");
        trades.push(trade);

        if let Some(point) = equity_curve.last_mut() {
            point.equity = cash;
        }
    }

    Ok(SimulationResult {
        trades,
        equity_curve,
    })
}

/// Size and open a position; `None` when cash cannot buy a single share
fn open_position(bar: &PriceBar, cash: Decimal, config: &CapitalConfig) -> Option<Position> {
    let one = Decimal::ONE;
    let fill = bar.close * (one + config.slippage_rate);
    let unit_cost = fill * (one + config.commission_rate);
    let quantity = (cash / unit_cost).floor();
    if quantity <= Decimal::ZERO {
        return None;
    }

    Some(Position {
        entry_date: bar.date,
        entry_price: fill,
        quantity,
        cost_basis: quantity * unit_cost,
        entry_commission: quantity * fill * config.commission_rate,
        entry_slippage: quantity * (fill - bar.close),
    })
}

/// Close a position at this bar, producing the trade record and cash proceeds
fn close_position(open: &Position, bar: &PriceBar, config: &CapitalConfig) -> (Trade, Decimal) {
    let one = Decimal::ONE;
    let fill = bar.close * (one - config.slippage_rate);
    let proceeds = open.quantity * fill * (one - config.commission_rate);

    let trade = Trade {
        entry_date: open.entry_date,
        exit_date: bar.date,
        entry_price: open.entry_price,
        exit_price: fill,
        quantity: open.quantity,
        commission_paid: open.entry_commission + open.quantity * fill * config.commission_rate,
        slippage_cost: open.entry_slippage + open.quantity * (bar.close - fill),
        profit_loss: proceeds - open.cost_basis,
    };

    (trade, proceeds)
}
