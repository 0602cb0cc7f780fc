//! Technical indicator library.
//!
//! Every calculation is a pure function over a slice of bars returning a
//! freshly allocated [`IndicatorSeries`] of the same length as the input.
//! Points before an indicator's warmup carry `valid: false` and a placeholder
//! value; an input shorter than the warmup produces an all-invalid series,
//! never an error.

pub mod sma;
pub mod ema;
pub mod rsi;
pub mod macd;
pub mod bollinger;
pub mod atr;
pub mod swing;
pub mod risk;

pub use atr::calculate_atr;
pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use swing::{calculate_swings, support_resistance};

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
    Swing {
        high: bool,
        low: bool,
    },
}

impl IndicatorValue {
    /// The scalar payload, when this is a `Simple` point.
    pub fn simple(&self) -> Option<f64> {
        match self {
            IndicatorValue::Simple(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        num_std: f64,
    },
    Swing(usize),
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Scalar value at `index` if the point exists, is valid and is `Simple`.
    pub fn simple_at(&self, index: usize) -> Option<f64> {
        self.values
            .get(index)
            .filter(|p| p.valid)
            .and_then(|p| p.value.simple())
    }

    /// `(line, signal, histogram)` at `index` for a valid MACD point.
    pub fn macd_at(&self, index: usize) -> Option<(f64, f64, f64)> {
        match self.values.get(index).filter(|p| p.valid)?.value {
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } => Some((line, signal, histogram)),
            _ => None,
        }
    }

    /// `(upper, middle, lower)` at `index` for a valid Bollinger point.
    pub fn bands_at(&self, index: usize) -> Option<(f64, f64, f64)> {
        match self.values.get(index).filter(|p| p.valid)?.value {
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => Some((upper, middle, lower)),
            _ => None,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger { period, num_std } => {
                write!(f, "BOLLINGER({},{})", period, num_std)
            }
            IndicatorType::Swing(window) => write!(f, "SWING({})", window),
        }
    }
}
