//! Bollinger band mean-reversion strategy.
//!
//! Buys when the close recovers above the lower band after touching or
//! breaking it, sells when the close falls back below the upper band. The
//! stop sits just under the lower band at entry and the target is the upper
//! band itself.

use crate::domain::error::StratbenchError;
use crate::domain::indicator::calculate_bollinger;
use crate::domain::series::PriceSeries;
use crate::domain::signal::{Signal, SignalSeries};
use crate::domain::strategy::{Parameters, Strategy, crossed_above, crossed_below, window_param};

const DEFAULT_WINDOW: f64 = 20.0;
const DEFAULT_NUM_STD: f64 = 2.0;

const BAND_BUFFER: f64 = 0.99;

#[derive(Debug, Clone)]
pub struct BollingerBandsStrategy {
    parameters: Parameters,
}

impl BollingerBandsStrategy {
    pub fn new(window: usize, num_std: f64) -> Self {
        Self {
            parameters: Parameters::from_pairs(&[
                ("window", window as f64),
                ("num_std", num_std),
            ]),
        }
    }

    fn bands(&self, series: &PriceSeries) -> Option<crate::domain::indicator::IndicatorSeries> {
        let window = window_param(&self.parameters, "window", DEFAULT_WINDOW)?;
        let num_std = self.parameters.get_or("num_std", DEFAULT_NUM_STD);
        Some(calculate_bollinger(series.bars(), window, num_std))
    }
}

impl Default for BollingerBandsStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW as usize, DEFAULT_NUM_STD)
    }
}

impl Strategy for BollingerBandsStrategy {
    fn name(&self) -> &str {
        "Bollinger Bands Strategy"
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<SignalSeries, StratbenchError> {
        let bars = series.bars();
        let Some(bands) = self.bands(series) else {
            return Ok(vec![Signal::Hold; bars.len()]);
        };

        let mut signals = vec![Signal::Hold; bars.len()];
        for i in 1..bars.len() {
            let (Some((prev_upper, _, prev_lower)), Some((upper, _, lower))) =
                (bands.bands_at(i - 1), bands.bands_at(i))
            else {
                continue;
            };
            let prev_close = bars[i - 1].close;
            let close = bars[i].close;

            if crossed_above(prev_close, prev_lower, close, lower) {
                signals[i] = Signal::Buy;
            } else if crossed_below(prev_close, prev_upper, close, upper) {
                signals[i] = Signal::Sell;
            }
        }

        Ok(signals)
    }

    /// Buffered lower band at entry, or zero (disabled) while the bands are
    /// still warming up.
    fn calculate_stop_loss(&self, series: &PriceSeries, index: usize) -> f64 {
        self.bands(series)
            .and_then(|bands| bands.bands_at(index))
            .map(|(_, _, lower)| lower * BAND_BUFFER)
            .unwrap_or(0.0)
    }

    /// Upper band at entry, or zero (disabled) while the bands are still
    /// warming up.
    fn calculate_take_profit(&self, series: &PriceSeries, index: usize) -> f64 {
        self.bands(series)
            .and_then(|bands| bands.bands_at(index))
            .map(|(upper, _, _)| upper)
            .unwrap_or(0.0)
    }
}
