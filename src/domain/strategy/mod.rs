//! Strategy abstraction and shared parameter handling.
//!
//! A strategy maps a price series to one signal per bar and prices the
//! protective levels for entries. Concrete strategies live in the submodules;
//! `factory` builds them by name.

pub mod bollinger;
pub mod crossover;
pub mod factory;
pub mod macd;
pub mod rsi;

pub use bollinger::BollingerBandsStrategy;
pub use crossover::MovingAverageCrossover;
pub use factory::StrategyKind;
pub use macd::MacdStrategy;
pub use rsi::RsiStrategy;

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::StratbenchError;
use crate::domain::optimizer::{self, OptimizationOutcome, ParameterGrid};
use crate::domain::series::{PriceBar, PriceSeries};
use crate::domain::signal::SignalSeries;

const DEFAULT_STOP_LOSS_PCT: f64 = 0.05;
const DEFAULT_TAKE_PROFIT_PCT: f64 = 0.10;

/// Named numeric parameters for a strategy. Backed by an ordered map so
/// printed parameter sets are reproducible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: BTreeMap<String, f64>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        let mut params = Self::new();
        for (name, value) in pairs {
            params.set(name, *value);
        }
        params
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    /// Inserts every entry of `other`, overwriting existing keys.
    pub fn merge(&mut self, other: &Parameters) {
        for (name, value) in &other.values {
            self.values.insert(name.clone(), *value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.values {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
            first = false;
        }
        Ok(())
    }
}

/// A trading strategy over a single price series.
///
/// `generate_signals` returns exactly one signal per input bar. The level
/// calculators price the stop-loss and take-profit for a long entry at the
/// given bar's close; the engine mirrors them around the close for shorts.
pub trait Strategy: fmt::Debug {
    fn name(&self) -> &str;

    fn parameters(&self) -> &Parameters;

    fn parameters_mut(&mut self) -> &mut Parameters;

    fn generate_signals(&self, series: &PriceSeries) -> Result<SignalSeries, StratbenchError>;

    /// Merges the given values into the current parameter set.
    fn set_parameters(&mut self, updates: &Parameters) {
        self.parameters_mut().merge(updates);
    }

    /// Stop-loss for an entry at `index`. Defaults to a fixed percentage
    /// below the close, read from `stop_loss_pct`.
    fn calculate_stop_loss(&self, series: &PriceSeries, index: usize) -> f64 {
        let pct = self.parameters().get_or("stop_loss_pct", DEFAULT_STOP_LOSS_PCT);
        series.bars()[index].close * (1.0 - pct)
    }

    /// Take-profit for an entry at `index`. Defaults to a fixed percentage
    /// above the close, read from `take_profit_pct`.
    fn calculate_take_profit(&self, series: &PriceSeries, index: usize) -> f64 {
        let pct = self.parameters().get_or("take_profit_pct", DEFAULT_TAKE_PROFIT_PCT);
        series.bars()[index].close * (1.0 + pct)
    }

    /// Runs a grid search over `grid`, leaves the best parameter set applied
    /// to `self`, and returns the full result table.
    fn optimize(
        &mut self,
        series: &PriceSeries,
        grid: &ParameterGrid,
        metric: &str,
        config: &BacktestConfig,
    ) -> Result<OptimizationOutcome, StratbenchError>
    where
        Self: Sized,
    {
        optimizer::grid_search(self, series, grid, metric, config)
    }
}

/// Interprets a parameter as a lookback window, rounding to the nearest whole
/// number. Windows below one bar are rejected.
pub(crate) fn window_param(params: &Parameters, name: &str, default: f64) -> Option<usize> {
    let raw = params.get_or(name, default);
    if !raw.is_finite() {
        return None;
    }
    let rounded = raw.round();
    if rounded < 1.0 { None } else { Some(rounded as usize) }
}

/// True when `value` closed above `reference` after sitting at or below it on
/// the previous bar.
pub(crate) fn crossed_above(prev_value: f64, prev_ref: f64, value: f64, reference: f64) -> bool {
    prev_value <= prev_ref && value > reference
}

/// True when `value` closed below `reference` after sitting at or above it on
/// the previous bar.
pub(crate) fn crossed_below(prev_value: f64, prev_ref: f64, value: f64, reference: f64) -> bool {
    prev_value >= prev_ref && value < reference
}

/// Lowest low over the trailing `lookback` bars up to and including `index`.
pub(crate) fn lowest_low(bars: &[PriceBar], index: usize, lookback: usize) -> f64 {
    let start = index.saturating_sub(lookback);
    bars[start..=index].iter().map(|b| b.low).fold(f64::MAX, f64::min)
}

/// ATR at `index` for protective levels. While the ATR is still warming up,
/// 2% of the bar's close stands in.
pub(crate) fn atr_or_fallback(bars: &[PriceBar], index: usize) -> f64 {
    crate::domain::indicator::calculate_atr(bars, 14)
        .simple_at(index)
        .unwrap_or(bars[index].close * 0.02)
}
