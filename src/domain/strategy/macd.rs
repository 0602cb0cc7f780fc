//! MACD signal-line crossover strategy.
//!
//! Buys when the MACD line closes above its signal line after being at or
//! below it, sells on the mirrored downward cross. The stop takes the lower
//! of a buffered ten-bar swing low and two ATRs under the close; the target
//! doubles the risked distance.

use crate::domain::error::StratbenchError;
use crate::domain::indicator::calculate_macd;
use crate::domain::series::PriceSeries;
use crate::domain::signal::{Signal, SignalSeries};
use crate::domain::strategy::{
    Parameters, Strategy, atr_or_fallback, crossed_above, crossed_below, lowest_low, window_param,
};

const DEFAULT_FAST: f64 = 12.0;
const DEFAULT_SLOW: f64 = 26.0;
const DEFAULT_SIGNAL: f64 = 9.0;

const SWING_LOOKBACK: usize = 10;
const SWING_BUFFER: f64 = 0.995;
const RISK_REWARD_RATIO: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct MacdStrategy {
    parameters: Parameters,
}

impl MacdStrategy {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            parameters: Parameters::from_pairs(&[
                ("fast", fast as f64),
                ("slow", slow as f64),
                ("signal", signal as f64),
            ]),
        }
    }
}

impl Default for MacdStrategy {
    fn default() -> Self {
        Self::new(
            DEFAULT_FAST as usize,
            DEFAULT_SLOW as usize,
            DEFAULT_SIGNAL as usize,
        )
    }
}

impl Strategy for MacdStrategy {
    fn name(&self) -> &str {
        "MACD Strategy"
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<SignalSeries, StratbenchError> {
        let bars = series.bars();
        let windows = (
            window_param(&self.parameters, "fast", DEFAULT_FAST),
            window_param(&self.parameters, "slow", DEFAULT_SLOW),
            window_param(&self.parameters, "signal", DEFAULT_SIGNAL),
        );
        let (Some(fast), Some(slow), Some(signal_window)) = windows else {
            return Ok(vec![Signal::Hold; bars.len()]);
        };

        let macd = calculate_macd(bars, fast, slow, signal_window);

        let mut signals = vec![Signal::Hold; bars.len()];
        for i in 1..bars.len() {
            let (Some((prev_line, prev_signal, _)), Some((line, signal, _))) =
                (macd.macd_at(i - 1), macd.macd_at(i))
            else {
                continue;
            };

            if crossed_above(prev_line, prev_signal, line, signal) {
                signals[i] = Signal::Buy;
            } else if crossed_below(prev_line, prev_signal, line, signal) {
                signals[i] = Signal::Sell;
            }
        }

        Ok(signals)
    }

    fn calculate_stop_loss(&self, series: &PriceSeries, index: usize) -> f64 {
        let bars = series.bars();
        let swing_stop = lowest_low(bars, index, SWING_LOOKBACK) * SWING_BUFFER;
        let atr_stop = bars[index].close - 2.0 * atr_or_fallback(bars, index);
        swing_stop.min(atr_stop)
    }

    fn calculate_take_profit(&self, series: &PriceSeries, index: usize) -> f64 {
        let close = series.bars()[index].close;
        let risk = close - self.calculate_stop_loss(series, index);
        close + RISK_REWARD_RATIO * risk
    }
}
