//! Error types for the backtesting engine

use thiserror::Error;

/// Result type alias for backtest operations
pub type Result<T> = std::result::Result<T, BacktestError>;

/// Errors raised by the backtesting pipeline
#[derive(Error, Debug)]
pub enum BacktestError {
    /// Price series shorter than a strategy's warm-up requirement
    #[error("insufficient data: need at least {required} bars, got {available}")]
    InsufficientData { required: usize, available: usize },

    /// Non-positive capital, negative rates, or out-of-range indicator periods
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Strategy identifier not in the configured set
    #[error("unknown strategy: {identifier}")]
    UnknownStrategy { identifier: String },
}

impl BacktestError {
    pub fn insufficient_data(required: usize, available: usize) -> Self {
        Self::InsufficientData {
            required,
            available,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn unknown_strategy(identifier: impl Into<String>) -> Self {
        Self::UnknownStrategy {
            identifier: identifier.into(),
        }
    }
}
