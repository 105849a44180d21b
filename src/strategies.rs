//! Strategy engine
//!
//! Nine interchangeable signal generators over one shared operation:
//! `generate` maps a price series to an aligned signal sequence. A crossing
//! fires on first detection only (condition false at t-1, true at t); an
//! internal long/flat tape suppresses re-triggers while the matching state
//! is already held, so no entry repeats without an intervening exit.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{BacktestError, Result};
use crate::indicators;
use crate::types::{PriceSeries, Signal};

/// Strategy identifier plus an opaque parameter set
///
/// The caller hands parameters over as JSON (the shape the excluded web layer
/// produces); missing fields fall back to the per-strategy defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub id: String,
    #[serde(default)]
    pub params: Value,
}

impl StrategyConfig {
    /// Config for `id` with all-default parameters
    pub fn with_defaults(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: Value::Null,
        }
    }

    /// All nine strategies with their default parameters
    pub fn default_suite() -> Vec<StrategyConfig> {
        [
            "rsi",
            "sma_crossover",
            "ema_crossover",
            "macd",
            "bollinger",
            "stochastic",
            "momentum",
            "mean_reversion",
            "buy_hold",
        ]
        .into_iter()
        .map(StrategyConfig::with_defaults)
        .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiParams {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmaCrossParams {
    pub short_period: usize,
    pub long_period: usize,
}

impl Default for SmaCrossParams {
    fn default() -> Self {
        Self {
            short_period: 10,
            long_period: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmaCrossParams {
    pub short_period: usize,
    pub long_period: usize,
}

impl Default for EmaCrossParams {
    fn default() -> Self {
        Self {
            short_period: 12,
            long_period: 26,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BollingerParams {
    pub period: usize,
    pub width: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            period: 20,
            width: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StochasticParams {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for StochasticParams {
    fn default() -> Self {
        Self {
            period: 14,
            oversold: 20.0,
            overbought: 80.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumParams {
    pub period: usize,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self { period: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanReversionParams {
    pub period: usize,
    pub threshold: f64,
}

impl Default for MeanReversionParams {
    fn default() -> Self {
        Self {
            period: 20,
            threshold: 2.0,
        }
    }
}

/// The closed set of strategy variants
#[derive(Debug, Clone)]
pub enum Strategy {
    Rsi(RsiParams),
    SmaCrossover(SmaCrossParams),
    EmaCrossover(EmaCrossParams),
    Macd(MacdParams),
    Bollinger(BollingerParams),
    Stochastic(StochasticParams),
    Momentum(MomentumParams),
    MeanReversion(MeanReversionParams),
    BuyHold,
}

impl Strategy {
    /// Resolve a configured strategy, validating its parameter set
    pub fn from_config(config: &StrategyConfig) -> Result<Self> {
        let strategy = match config.id.as_str() {
            "rsi" => {
                let p: RsiParams = parse_params(&config.id, &config.params)?;
                if p.period == 0 {
                    return Err(BacktestError::invalid_config("RSI period must be > 0"));
                }
                if p.oversold >= p.overbought {
                    return Err(BacktestError::invalid_config(
                        "RSI oversold threshold must be below overbought",
                    ));
                }
                Strategy::Rsi(p)
            }
            "sma_crossover" => {
                let p: SmaCrossParams = parse_params(&config.id, &config.params)?;
                if p.short_period == 0 || p.short_period >= p.long_period {
                    return Err(BacktestError::invalid_config(
                        "SMA crossover needs 0 < short period < long period",
                    ));
                }
                Strategy::SmaCrossover(p)
            }
            "ema_crossover" => {
                let p: EmaCrossParams = parse_params(&config.id, &config.params)?;
                if p.short_period == 0 || p.short_period >= p.long_period {
                    return Err(BacktestError::invalid_config(
                        "EMA crossover needs 0 < short period < long period",
                    ));
                }
                Strategy::EmaCrossover(p)
            }
            "macd" => {
                let p: MacdParams = parse_params(&config.id, &config.params)?;
                if p.fast == 0 || p.signal == 0 || p.fast >= p.slow {
                    return Err(BacktestError::invalid_config(
                        "MACD needs 0 < fast < slow and signal period > 0",
                    ));
                }
                Strategy::Macd(p)
            }
            "bollinger" => {
                let p: BollingerParams = parse_params(&config.id, &config.params)?;
                if p.period == 0 || p.width <= 0.0 {
                    return Err(BacktestError::invalid_config(
                        "Bollinger needs period > 0 and band width > 0",
                    ));
                }
                Strategy::Bollinger(p)
            }
            "stochastic" => {
                let p: StochasticParams = parse_params(&config.id, &config.params)?;
                if p.period == 0 || p.oversold >= p.overbought {
                    return Err(BacktestError::invalid_config(
                        "Stochastic needs period > 0 and oversold < overbought",
                    ));
                }
                Strategy::Stochastic(p)
            }
            "momentum" => {
                let p: MomentumParams = parse_params(&config.id, &config.params)?;
                if p.period == 0 {
                    return Err(BacktestError::invalid_config(
                        "Momentum period must be > 0",
                    ));
                }
                Strategy::Momentum(p)
            }
            "mean_reversion" => {
                let p: MeanReversionParams = parse_params(&config.id, &config.params)?;
                if p.period == 0 || p.threshold <= 0.0 {
                    return Err(BacktestError::invalid_config(
                        "Mean reversion needs period > 0 and threshold > 0",
                    ));
                }
                Strategy::MeanReversion(p)
            }
            "buy_hold" => Strategy::BuyHold,
            other => return Err(BacktestError::unknown_strategy(other)),
        };

        Ok(strategy)
    }

    /// Human-readable name for reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Strategy::Rsi(_) => "RSI",
            Strategy::SmaCrossover(_) => "SMA Crossover",
            Strategy::EmaCrossover(_) => "EMA Crossover",
            Strategy::Macd(_) => "MACD",
            Strategy::Bollinger(_) => "Bollinger Bands",
            Strategy::Stochastic(_) => "Stochastic",
            Strategy::Momentum(_) => "Momentum",
            Strategy::MeanReversion(_) => "Mean Reversion",
            Strategy::BuyHold => "Buy & Hold",
        }
    }

    /// One-line description for the result table
    pub fn description(&self) -> &'static str {
        match self {
            Strategy::Rsi(_) => {
                "Buys when the RSI drops into oversold territory and sells once it recovers past the overbought threshold."
            }
            Strategy::SmaCrossover(_) => {
                "Follows the trend by trading the crossover of a short and a long simple moving average."
            }
            Strategy::EmaCrossover(_) => {
                "Crossover of two exponential moving averages; reacts faster to fresh prices than the SMA pair."
            }
            Strategy::Macd(_) => {
                "Trades crossings of the MACD line and its signal line to catch trend reversals."
            }
            Strategy::Bollinger(_) => {
                "Buys when price falls through the lower Bollinger band and exits on reversion to the middle band."
            }
            Strategy::Stochastic(_) => {
                "Trades %K/%D crossings inside the oversold and overbought zones of the oscillator."
            }
            Strategy::Momentum(_) => {
                "Buys when price momentum turns positive and sells when it turns negative."
            }
            Strategy::MeanReversion(_) => {
                "Buys deep negative deviations from the rolling mean and exits once the z-score recovers to zero."
            }
            Strategy::BuyHold => {
                "Enters once at the first bar and stays invested for the whole period."
            }
        }
    }

    /// Bars of history required before the first signal can be defined
    pub fn min_bars(&self) -> usize {
        match self {
            Strategy::Rsi(p) => p.period + 1,
            Strategy::SmaCrossover(p) => p.long_period,
            Strategy::EmaCrossover(p) => p.long_period,
            Strategy::Macd(p) => p.slow + p.signal - 1,
            Strategy::Bollinger(p) => p.period,
            Strategy::Stochastic(p) => p.period + 2,
            Strategy::Momentum(p) => p.period + 1,
            Strategy::MeanReversion(p) => p.period,
            Strategy::BuyHold => 1,
        }
    }

    /// Generate one signal per bar, aligned with the series
    pub fn generate(&self, series: &PriceSeries) -> Result<Vec<Signal>> {
        let available = series.len();
        let required = self.min_bars();
        if available < required {
            return Err(BacktestError::insufficient_data(required, available));
        }
        debug!(strategy = self.display_name(), bars = available, "generating signals");

        match self {
            Strategy::Rsi(p) => rsi_signals(series, p),
            Strategy::SmaCrossover(p) => sma_cross_signals(series, p),
            Strategy::EmaCrossover(p) => ema_cross_signals(series, p),
            Strategy::Macd(p) => macd_signals(series, p),
            Strategy::Bollinger(p) => bollinger_signals(series, p),
            Strategy::Stochastic(p) => stochastic_signals(series, p),
            Strategy::Momentum(p) => momentum_signals(series, p),
            Strategy::MeanReversion(p) => mean_reversion_signals(series, p),
            Strategy::BuyHold => Ok(buy_hold_signals(series)),
        }
    }
}

fn parse_params<T>(id: &str, params: &Value) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if params.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(params.clone())
        .map_err(|e| BacktestError::invalid_config(format!("{id} parameters: {e}")))
}

/// Long/flat tape that gates raw crossing conditions into signals
///
/// Only an entry while flat or an exit while long is recorded; everything
/// else collapses to `Hold`.
struct SignalTape {
    signals: Vec<Signal>,
    long: bool,
}

impl SignalTape {
    fn with_capacity(n: usize) -> Self {
        Self {
            signals: Vec::with_capacity(n),
            long: false,
        }
    }

    fn push(&mut self, entry: bool, exit: bool) {
        let signal = if !self.long && entry {
            self.long = true;
            Signal::LongEntry
        } else if self.long && exit {
            self.long = false;
            Signal::LongExit
        } else {
            Signal::Hold
        };
        self.signals.push(signal);
    }

    fn into_signals(self) -> Vec<Signal> {
        self.signals
    }
}

/// Condition `a > b` became true this bar (NaN on either side never fires)
#[inline]
fn crossed_above(prev_a: f64, prev_b: f64, a: f64, b: f64) -> bool {
    prev_a <= prev_b && a > b
}

/// Condition `a < b` became true this bar (NaN on either side never fires)
#[inline]
fn crossed_below(prev_a: f64, prev_b: f64, a: f64, b: f64) -> bool {
    prev_a >= prev_b && a < b
}

fn rsi_signals(series: &PriceSeries, p: &RsiParams) -> Result<Vec<Signal>> {
    let closes = series.closes();
    let rsi = indicators::rsi(&closes, p.period)?;

    let mut tape = SignalTape::with_capacity(closes.len());
    tape.push(false, false);
    for t in 1..closes.len() {
        let entry = crossed_below(rsi[t - 1], p.oversold, rsi[t], p.oversold);
        let exit = crossed_above(rsi[t - 1], p.overbought, rsi[t], p.overbought);
        tape.push(entry, exit);
    }
    Ok(tape.into_signals())
}

fn sma_cross_signals(series: &PriceSeries, p: &SmaCrossParams) -> Result<Vec<Signal>> {
    let closes = series.closes();
    let short = indicators::sma(&closes, p.short_period)?;
    let long = indicators::sma(&closes, p.long_period)?;
    Ok(dual_line_cross(&short, &long))
}

fn ema_cross_signals(series: &PriceSeries, p: &EmaCrossParams) -> Result<Vec<Signal>> {
    let closes = series.closes();
    let short = indicators::ema(&closes, p.short_period)?;
    let long = indicators::ema(&closes, p.long_period)?;
    Ok(dual_line_cross(&short, &long))
}

fn macd_signals(series: &PriceSeries, p: &MacdParams) -> Result<Vec<Signal>> {
    let closes = series.closes();
    let macd = indicators::macd(&closes, p.fast, p.slow, p.signal)?;
    Ok(dual_line_cross(&macd.macd, &macd.signal))
}

/// Entry when the first line crosses above the second, exit on the reverse
fn dual_line_cross(fast: &[f64], slow: &[f64]) -> Vec<Signal> {
    let mut tape = SignalTape::with_capacity(fast.len());
    tape.push(false, false);
    for t in 1..fast.len() {
        let entry = crossed_above(fast[t - 1], slow[t - 1], fast[t], slow[t]);
        let exit = crossed_below(fast[t - 1], slow[t - 1], fast[t], slow[t]);
        tape.push(entry, exit);
    }
    tape.into_signals()
}

fn bollinger_signals(series: &PriceSeries, p: &BollingerParams) -> Result<Vec<Signal>> {
    let closes = series.closes();
    let bands = indicators::bollinger(&closes, p.period, p.width)?;

    let mut tape = SignalTape::with_capacity(closes.len());
    tape.push(false, false);
    for t in 1..closes.len() {
        let entry = crossed_below(closes[t - 1], bands.lower[t - 1], closes[t], bands.lower[t]);
        let exit = crossed_above(closes[t - 1], bands.middle[t - 1], closes[t], bands.middle[t]);
        tape.push(entry, exit);
    }
    Ok(tape.into_signals())
}

fn stochastic_signals(series: &PriceSeries, p: &StochasticParams) -> Result<Vec<Signal>> {
    let highs = series.highs();
    let lows = series.lows();
    let closes = series.closes();
    let stoch = indicators::stochastic(&highs, &lows, &closes, p.period)?;

    let mut tape = SignalTape::with_capacity(closes.len());
    tape.push(false, false);
    for t in 1..closes.len() {
        let crossed_up = crossed_above(stoch.k[t - 1], stoch.d[t - 1], stoch.k[t], stoch.d[t]);
        let crossed_down = crossed_below(stoch.k[t - 1], stoch.d[t - 1], stoch.k[t], stoch.d[t]);
        let entry = crossed_up && stoch.k[t] < p.oversold;
        let exit = crossed_down && stoch.k[t] > p.overbought;
        tape.push(entry, exit);
    }
    Ok(tape.into_signals())
}

fn momentum_signals(series: &PriceSeries, p: &MomentumParams) -> Result<Vec<Signal>> {
    let closes = series.closes();
    let momentum = indicators::momentum(&closes, p.period)?;

    let mut tape = SignalTape::with_capacity(closes.len());
    tape.push(false, false);
    for t in 1..closes.len() {
        let entry = crossed_above(momentum[t - 1], 0.0, momentum[t], 0.0);
        let exit = crossed_below(momentum[t - 1], 0.0, momentum[t], 0.0);
        tape.push(entry, exit);
    }
    Ok(tape.into_signals())
}

fn mean_reversion_signals(series: &PriceSeries, p: &MeanReversionParams) -> Result<Vec<Signal>> {
    let closes = series.closes();
    let z = indicators::zscore(&closes, p.period)?;

    let mut tape = SignalTape::with_capacity(closes.len());
    tape.push(false, false);
    for t in 1..closes.len() {
        let entry = crossed_below(z[t - 1], -p.threshold, z[t], -p.threshold);
        let exit = crossed_above(z[t - 1], 0.0, z[t], 0.0);
        tape.push(entry, exit);
    }
    Ok(tape.into_signals())
}

/// Single entry on the first bar, exit on the last
fn buy_hold_signals(series: &PriceSeries) -> Vec<Signal> {
    let n = series.len();
    let mut signals = vec![Signal::Hold; n];
    signals[0] = Signal::LongEntry;
    if n > 1 {
        signals[n - 1] = Signal::LongExit;
    }
    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::prelude::*;
    use rust_decimal::Decimal;

    use crate::types::PriceBar;

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let close = Decimal::from_f64(c).unwrap();
                PriceBar {
                    date: start + chrono::Duration::days(i as i64),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: Decimal::from(1000),
                }
            })
            .collect();
        PriceSeries::new(bars)
    }

    #[test]
    fn unknown_identifier_is_rejected() {
        let err = Strategy::from_config(&StrategyConfig::with_defaults("martingale")).unwrap_err();
        assert!(matches!(
            err,
            BacktestError::UnknownStrategy { identifier } if identifier == "martingale"
        ));
    }

    #[test]
    fn default_suite_parses_completely() {
        let suite = StrategyConfig::default_suite();
        assert_eq!(suite.len(), 9);
        for config in &suite {
            Strategy::from_config(config).unwrap();
        }
    }

    #[test]
    fn params_override_defaults() {
        let config = StrategyConfig {
            id: "rsi".to_string(),
            params: serde_json::json!({ "period": 7 }),
        };
        let strategy = Strategy::from_config(&config).unwrap();
        match strategy {
            Strategy::Rsi(p) => {
                assert_eq!(p.period, 7);
                assert_eq!(p.oversold, 30.0);
            }
            _ => panic!("expected RSI"),
        }
    }

    #[test]
    fn invalid_params_are_rejected() {
        let config = StrategyConfig {
            id: "sma_crossover".to_string(),
            params: serde_json::json!({ "short_period": 30, "long_period": 10 }),
        };
        assert!(matches!(
            Strategy::from_config(&config).unwrap_err(),
            BacktestError::InvalidConfig { .. }
        ));
    }

    #[test]
    fn short_series_fails_with_insufficient_data() {
        let series = series_from_closes(&[1.0; 10]);
        let err = Strategy::Rsi(RsiParams::default())
            .generate(&series)
            .unwrap_err();
        assert!(matches!(
            err,
            BacktestError::InsufficientData {
                required: 15,
                available: 10
            }
        ));
    }

    #[test]
    fn momentum_crossing_fires_once() {
        let series = series_from_closes(&[5.0, 4.0, 3.0, 4.0, 5.0, 6.0, 5.0, 4.0, 3.0]);
        let signals = Strategy::Momentum(MomentumParams { period: 1 })
            .generate(&series)
            .unwrap();

        assert_eq!(signals.len(), 9);
        assert_eq!(signals[3], Signal::LongEntry);
        assert_eq!(signals[4], Signal::Hold);
        assert_eq!(signals[5], Signal::Hold);
        assert_eq!(signals[6], Signal::LongExit);
        assert_eq!(signals[7], Signal::Hold);
    }

    #[test]
    fn flat_series_never_triggers_sma_crossover() {
        let series = series_from_closes(&[50.0; 40]);
        let signals = Strategy::SmaCrossover(SmaCrossParams::default())
            .generate(&series)
            .unwrap();
        assert!(signals.iter().all(|s| *s == Signal::Hold));
    }

    #[test]
    fn buy_hold_enters_first_exits_last() {
        let series = series_from_closes(&[10.0, 11.0, 12.0]);
        let signals = Strategy::BuyHold.generate(&series).unwrap();
        assert_eq!(
            signals,
            vec![Signal::LongEntry, Signal::Hold, Signal::LongExit]
        );
    }

    #[test]
    fn entries_and_exits_alternate() {
        // Sawtooth closes keep the 1-bar momentum oscillating.
        let closes: Vec<f64> = (0..30)
            .map(|i| if i % 4 < 2 { 10.0 } else { 12.0 })
            .collect();
        let series = series_from_closes(&closes);
        let signals = Strategy::Momentum(MomentumParams { period: 1 })
            .generate(&series)
            .unwrap();

        let mut long = false;
        for signal in signals {
            match signal {
                Signal::LongEntry => {
                    assert!(!long);
                    long = true;
                }
                Signal::LongExit => {
                    assert!(long);
                    long = false;
                }
                Signal::Hold => {}
            }
        }
    }
}
