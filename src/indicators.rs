//! Technical indicator kernels
//!
//! Pure transforms of a price series into an aligned indicator series.
//! Every output has the same length as its input; positions inside the
//! warm-up window hold `f64::NAN` and must never drive a signal.

use crate::error::{BacktestError, Result};

/// Simple Moving Average
///
/// Undefined for index < period - 1.
pub fn sma(data: &[f64], period: usize) -> Result<Vec<f64>> {
    if period == 0 {
        return Err(BacktestError::invalid_config("SMA period must be > 0"));
    }

    let n = data.len();
    let mut out = vec![f64::NAN; n];
    if period > n {
        return Ok(out);
    }

    let mut sum: f64 = data[..period].iter().sum();
    out[period - 1] = sum / period as f64;

    for i in period..n {
        sum = sum - data[i - period] + data[i];
        out[i] = sum / period as f64;
    }

    Ok(out)
}

/// Exponential Moving Average
///
/// Seeded with the SMA of the first `period` values, then
/// `ema[t] = close[t] * k + ema[t-1] * (1 - k)` with `k = 2 / (period + 1)`.
pub fn ema(data: &[f64], period: usize) -> Result<Vec<f64>> {
    if period == 0 {
        return Err(BacktestError::invalid_config("EMA period must be > 0"));
    }
    Ok(ema_from(data, period))
}

/// EMA over a series that may carry a NaN warm-up prefix.
///
/// Seeds from the first `period` defined values; everything before the seed
/// stays NaN.
fn ema_from(data: &[f64], period: usize) -> Vec<f64> {
    let n = data.len();
    let mut out = vec![f64::NAN; n];

    let start = match data.iter().position(|v| v.is_finite()) {
        Some(s) => s,
        None => return out,
    };
    if n - start < period {
        return out;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed_end = start + period;
    let seed: f64 = data[start..seed_end].iter().sum::<f64>() / period as f64;
    out[seed_end - 1] = seed;

    for i in seed_end..n {
        out[i] = alpha * data[i] + (1.0 - alpha) * out[i - 1];
    }

    out
}

/// Relative Strength Index with Wilder smoothing
///
/// First defined value at index `period`; an all-gain window (avg loss 0)
/// saturates at 100.
pub fn rsi(data: &[f64], period: usize) -> Result<Vec<f64>> {
    if period == 0 {
        return Err(BacktestError::invalid_config("RSI period must be > 0"));
    }

    let n = data.len();
    let mut out = vec![f64::NAN; n];
    if n < period + 1 {
        return Ok(out);
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss += -change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    out[period] = rsi_value(avg_gain, avg_loss);

    let p = period as f64;
    for i in period + 1..n {
        let change = data[i] - data[i - 1];
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, -change)
        };
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
        out[i] = rsi_value(avg_gain, avg_loss);
    }

    Ok(out)
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// MACD line, signal line, and histogram
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Moving Average Convergence Divergence
///
/// `macd = EMA(fast) - EMA(slow)`, `signal = EMA(signal_period)` of the MACD
/// line, `histogram = macd - signal`.
pub fn macd(data: &[f64], fast: usize, slow: usize, signal_period: usize) -> Result<MacdSeries> {
    if fast == 0 || slow == 0 || signal_period == 0 {
        return Err(BacktestError::invalid_config("MACD periods must be > 0"));
    }
    if fast >= slow {
        return Err(BacktestError::invalid_config(
            "MACD fast period must be shorter than slow period",
        ));
    }

    let ema_fast = ema(data, fast)?;
    let ema_slow = ema(data, slow)?;

    let line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal = ema_from(&line, signal_period);
    let histogram: Vec<f64> = line.iter().zip(&signal).map(|(m, s)| m - s).collect();

    Ok(MacdSeries {
        macd: line,
        signal,
        histogram,
    })
}

/// Bollinger band triple
#[derive(Debug, Clone)]
pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Bollinger Bands: SMA(period) +/- width * population stddev(period)
pub fn bollinger(data: &[f64], period: usize, width: f64) -> Result<BollingerSeries> {
    if period == 0 {
        return Err(BacktestError::invalid_config(
            "Bollinger period must be > 0",
        ));
    }
    if width <= 0.0 {
        return Err(BacktestError::invalid_config(
            "Bollinger band width must be > 0",
        ));
    }

    let n = data.len();
    let mut upper = vec![f64::NAN; n];
    let mut middle = vec![f64::NAN; n];
    let mut lower = vec![f64::NAN; n];

    if period <= n {
        for i in period - 1..n {
            let window = &data[i + 1 - period..=i];
            let (mean, sd) = window_mean_stddev(window);
            upper[i] = mean + width * sd;
            middle[i] = mean;
            lower[i] = mean - width * sd;
        }
    }

    Ok(BollingerSeries {
        upper,
        middle,
        lower,
    })
}

/// Stochastic oscillator pair
#[derive(Debug, Clone)]
pub struct StochasticSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

/// Stochastic oscillator
///
/// `%K = 100 * (close - lowestLow) / (highestHigh - lowestLow)` over the
/// window, 50 when the range is flat; `%D` is the 3-bar SMA of `%K`.
pub fn stochastic(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Result<StochasticSeries> {
    if period == 0 {
        return Err(BacktestError::invalid_config(
            "Stochastic period must be > 0",
        ));
    }
    let n = close.len();
    if high.len() != n || low.len() != n {
        return Err(BacktestError::invalid_config(
            "Stochastic input series must share one length",
        ));
    }

    let mut k = vec![f64::NAN; n];
    if period <= n {
        for i in period - 1..n {
            let lo = low[i + 1 - period..=i]
                .iter()
                .cloned()
                .fold(f64::INFINITY, f64::min);
            let hi = high[i + 1 - period..=i]
                .iter()
                .cloned()
                .fold(f64::NEG_INFINITY, f64::max);
            k[i] = if hi == lo {
                50.0
            } else {
                100.0 * (close[i] - lo) / (hi - lo)
            };
        }
    }

    const D_PERIOD: usize = 3;
    let mut d = vec![f64::NAN; n];
    for i in 0..n {
        if i + 1 >= D_PERIOD {
            let window = &k[i + 1 - D_PERIOD..=i];
            if window.iter().all(|v| v.is_finite()) {
                d[i] = window.iter().sum::<f64>() / D_PERIOD as f64;
            }
        }
    }

    Ok(StochasticSeries { k, d })
}

/// Momentum: `close[t] - close[t - period]`
pub fn momentum(data: &[f64], period: usize) -> Result<Vec<f64>> {
    if period == 0 {
        return Err(BacktestError::invalid_config(
            "Momentum period must be > 0",
        ));
    }

    let n = data.len();
    let mut out = vec![f64::NAN; n];
    for i in period..n {
        out[i] = data[i] - data[i - period];
    }

    Ok(out)
}

/// Mean-reversion z-score: `(close - SMA(period)) / stddev(period)`
///
/// A flat window (stddev 0) yields NaN, which the signal layer reads as HOLD.
pub fn zscore(data: &[f64], period: usize) -> Result<Vec<f64>> {
    if period == 0 {
        return Err(BacktestError::invalid_config("z-score period must be > 0"));
    }

    let n = data.len();
    let mut out = vec![f64::NAN; n];
    if period <= n {
        for i in period - 1..n {
            let window = &data[i + 1 - period..=i];
            let (mean, sd) = window_mean_stddev(window);
            if sd > 0.0 {
                out[i] = (data[i] - mean) / sd;
            }
        }
    }

    Ok(out)
}

/// Population mean and stddev of one window
fn window_mean_stddev(window: &[f64]) -> (f64, f64) {
    let len = window.len() as f64;
    let mean = window.iter().sum::<f64>() / len;
    let variance = window.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / len;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warmup_and_values() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let out = sma(&data, 3).unwrap();
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert!((out[2] - 2.0).abs() < 1e-12);
        assert!((out[3] - 3.0).abs() < 1e-12);
        assert!((out[4] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn sma_period_longer_than_series() {
        let out = sma(&[1.0, 2.0], 5).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn ema_seeds_with_sma() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let out = ema(&data, 3).unwrap();
        assert!(out[1].is_nan());
        assert!((out[2] - 2.0).abs() < 1e-12);
        assert!((out[3] - 3.0).abs() < 1e-12);
        assert!((out[4] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn rsi_saturates_on_pure_gains() {
        let data: Vec<f64> = (1..=16).map(f64::from).collect();
        let out = rsi(&data, 14).unwrap();
        assert!(out[13].is_nan());
        assert!((out[14] - 100.0).abs() < 1e-12);
        assert!((out[15] - 100.0).abs() < 1e-12);
    }

    #[test]
    fn rsi_zero_period_rejected() {
        assert!(rsi(&[1.0, 2.0], 0).is_err());
    }

    #[test]
    fn macd_signal_warmup() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let out = macd(&data, 2, 3, 2).unwrap();
        assert!(out.macd[1].is_nan());
        assert!(out.macd[2].is_finite());
        assert!(out.signal[2].is_nan());
        assert!(out.signal[3].is_finite());
        assert!((out.histogram[3] - (out.macd[3] - out.signal[3])).abs() < 1e-12);
    }

    #[test]
    fn macd_rejects_inverted_periods() {
        assert!(macd(&[1.0; 40], 26, 12, 9).is_err());
    }

    #[test]
    fn bollinger_band_math() {
        let out = bollinger(&[1.0, 3.0], 2, 2.0).unwrap();
        assert!(out.middle[0].is_nan());
        assert!((out.middle[1] - 2.0).abs() < 1e-12);
        assert!((out.upper[1] - 4.0).abs() < 1e-12);
        assert!((out.lower[1] - 0.0).abs() < 1e-12);
    }

    #[test]
    fn stochastic_flat_range_is_midpoint() {
        let high = vec![5.0; 4];
        let low = vec![5.0; 4];
        let close = vec![5.0; 4];
        let out = stochastic(&high, &low, &close, 3).unwrap();
        assert!(out.k[1].is_nan());
        assert!((out.k[2] - 50.0).abs() < 1e-12);
        assert!(out.d[3].is_nan());
    }

    #[test]
    fn stochastic_d_is_sma_of_k() {
        let high = vec![10.0, 12.0, 14.0, 16.0, 18.0, 20.0];
        let low = vec![8.0, 9.0, 10.0, 11.0, 12.0, 13.0];
        let close = vec![9.0, 11.0, 13.0, 15.0, 17.0, 19.0];
        let out = stochastic(&high, &low, &close, 3).unwrap();
        assert!(out.d[3].is_nan());
        let expected = (out.k[2] + out.k[3] + out.k[4]) / 3.0;
        assert!((out.d[4] - expected).abs() < 1e-12);
    }

    #[test]
    fn momentum_is_price_difference() {
        let data = vec![1.0, 2.0, 4.0, 8.0];
        let out = momentum(&data, 2).unwrap();
        assert!(out[1].is_nan());
        assert!((out[2] - 3.0).abs() < 1e-12);
        assert!((out[3] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn zscore_flat_window_is_undefined() {
        let out = zscore(&[5.0, 5.0, 5.0, 5.0], 3).unwrap();
        assert!(out[2].is_nan());
        assert!(out[3].is_nan());
    }

    #[test]
    fn zscore_unit_deviation() {
        let out = zscore(&[1.0, 3.0], 2).unwrap();
        assert!((out[1] - 1.0).abs() < 1e-12);
    }
}
