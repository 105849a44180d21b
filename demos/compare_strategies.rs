//! Strategy comparison demo
//!
//! Generates a deterministic synthetic daily series and ranks the full
//! default strategy suite against it, printing the comparison table the way
//! a front end would render it.

use anyhow::Result;
use chrono::NaiveDate;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use strategy_lab::{
    run_backtests, CapitalConfig, PriceBar, PriceSeries, StrategyConfig, SymbolMeta,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    info!("starting strategy comparison demo");

    let series = synthetic_series(730, 42);
    let meta = SymbolMeta::daily("BTC-USD");
    let capital = CapitalConfig {
        initial_capital: dec!(100000),
        commission_rate: dec!(0.001),
        slippage_rate: dec!(0.0005),
    };

    let report = run_backtests(&series, &meta, &capital, &StrategyConfig::default_suite())?;

    println!(
        "{:<5} {:<16} {:>14} {:>10} {:>8} {:>10} {:>10}",
        "Rank", "Strategy", "Final value", "Return %", "Trades", "Win %", "Max DD %"
    );
    for (rank, result) in report.ranked.iter().enumerate() {
        let s = &result.summary;
        println!(
            "{:<5} {:<16} {:>14.2} {:>10.2} {:>8} {:>10.2} {:>10.2}",
            rank + 1,
            result.strategy_name,
            s.final_value,
            s.return_percentage,
            s.total_trades,
            s.win_rate,
            s.max_drawdown
        );
    }
    for failure in &report.failures {
        println!("failed: {} ({})", failure.strategy, failure.reason);
    }

    if let Some(best) = report.best() {
        println!("\nbest strategy: {} ({})", best.strategy_name, best.description);
        println!("{}", serde_json::to_string_pretty(&best.summary)?);
    }

    Ok(())
}

/// Deterministic random-walk daily series with mild drift
fn synthetic_series(days: usize, seed: u64) -> PriceSeries {
    let mut rng = Pcg64::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();

    let mut close = 25_000.0_f64;
    let bars = (0..days)
        .map(|i| {
            let open = close;
            close *= 1.0005 + rng.gen_range(-0.025..0.025);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: Decimal::from_f64(open).unwrap().round_dp(2),
                high: Decimal::from_f64(high).unwrap().round_dp(2),
                low: Decimal::from_f64(low).unwrap().round_dp(2),
                close: Decimal::from_f64(close).unwrap().round_dp(2),
                volume: Decimal::from(rng.gen_range(500..5000)),
            }
        })
        .collect();

    PriceSeries::new(bars)
}
