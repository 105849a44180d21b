//! Criterion benchmarks for the indicator kernels and the full comparison

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use strategy_lab::{
    indicators, run_backtests, CapitalConfig, PriceBar, PriceSeries, StrategyConfig, SymbolMeta,
};

fn random_walk(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut price = 100.0;
    (0..len)
        .map(|_| {
            price *= 1.0 + rng.gen_range(-0.02..0.02);
            price
        })
        .collect()
}

fn series_from_closes(closes: &[f64]) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let close = Decimal::from_f64(c).unwrap().round_dp(4);
            PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: dec!(1000),
            }
        })
        .collect();
    PriceSeries::new(bars)
}

fn bench_indicators(c: &mut Criterion) {
    let closes = random_walk(10_000, 42);

    c.bench_function("sma_20_10k", |b| {
        b.iter(|| indicators::sma(black_box(&closes), 20).unwrap())
    });
    c.bench_function("ema_20_10k", |b| {
        b.iter(|| indicators::ema(black_box(&closes), 20).unwrap())
    });
    c.bench_function("rsi_14_10k", |b| {
        b.iter(|| indicators::rsi(black_box(&closes), 14).unwrap())
    });
    c.bench_function("macd_12_26_9_10k", |b| {
        b.iter(|| indicators::macd(black_box(&closes), 12, 26, 9).unwrap())
    });
    c.bench_function("bollinger_20_10k", |b| {
        b.iter(|| indicators::bollinger(black_box(&closes), 20, 2.0).unwrap())
    });
    c.bench_function("zscore_20_10k", |b| {
        b.iter(|| indicators::zscore(black_box(&closes), 20).unwrap())
    });
}

fn bench_full_comparison(c: &mut Criterion) {
    let series = series_from_closes(&random_walk(2_000, 7));
    let meta = SymbolMeta::daily("BENCH");
    let capital = CapitalConfig {
        initial_capital: dec!(100000),
        commission_rate: dec!(0.001),
        slippage_rate: dec!(0.0005),
    };
    let suite = StrategyConfig::default_suite();

    c.bench_function("default_suite_2k_bars", |b| {
        b.iter(|| run_backtests(black_box(&series), &meta, &capital, &suite).unwrap())
    });
}

criterion_group!(benches, bench_indicators, bench_full_comparison);
criterion_main!(benches);
