//! RSI threshold-recovery strategy.
//!
//! Buys when the RSI climbs back above the oversold threshold, sells when it
//! drops back below the overbought threshold. The stop sits just under the
//! lowest low of the trailing ten bars; the target doubles the risked
//! distance.

use crate::domain::error::StratbenchError;
use crate::domain::indicator::calculate_rsi;
use crate::domain::series::PriceSeries;
use crate::domain::signal::{Signal, SignalSeries};
use crate::domain::strategy::{
    Parameters, Strategy, crossed_above, crossed_below, lowest_low, window_param,
};

const DEFAULT_RSI_WINDOW: f64 = 14.0;
const DEFAULT_OVERBOUGHT: f64 = 70.0;
const DEFAULT_OVERSOLD: f64 = 30.0;

const SWING_LOOKBACK: usize = 10;
const SWING_BUFFER: f64 = 0.995;
const RISK_REWARD_RATIO: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct RsiStrategy {
    parameters: Parameters,
}

impl RsiStrategy {
    pub fn new(rsi_window: usize, overbought: f64, oversold: f64) -> Self {
        Self {
            parameters: Parameters::from_pairs(&[
                ("rsi_window", rsi_window as f64),
                ("overbought", overbought),
                ("oversold", oversold),
            ]),
        }
    }
}

impl Default for RsiStrategy {
    fn default() -> Self {
        Self::new(
            DEFAULT_RSI_WINDOW as usize,
            DEFAULT_OVERBOUGHT,
            DEFAULT_OVERSOLD,
        )
    }
}

impl Strategy for RsiStrategy {
    fn name(&self) -> &str {
        "RSI Strategy"
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<SignalSeries, StratbenchError> {
        let bars = series.bars();
        let Some(rsi_window) = window_param(&self.parameters, "rsi_window", DEFAULT_RSI_WINDOW)
        else {
            return Ok(vec![Signal::Hold; bars.len()]);
        };
        let overbought = self.parameters.get_or("overbought", DEFAULT_OVERBOUGHT);
        let oversold = self.parameters.get_or("oversold", DEFAULT_OVERSOLD);

        let rsi = calculate_rsi(bars, rsi_window);

        let mut signals = vec![Signal::Hold; bars.len()];
        for i in 1..bars.len() {
            let (Some(prev), Some(cur)) = (rsi.simple_at(i - 1), rsi.simple_at(i)) else {
                continue;
            };

            if crossed_above(prev, oversold, cur, oversold) {
                signals[i] = Signal::Buy;
            } else if crossed_below(prev, overbought, cur, overbought) {
                signals[i] = Signal::Sell;
            }
        }

        Ok(signals)
    }

    fn calculate_stop_loss(&self, series: &PriceSeries, index: usize) -> f64 {
        lowest_low(series.bars(), index, SWING_LOOKBACK) * SWING_BUFFER
    }

    fn calculate_take_profit(&self, series: &PriceSeries, index: usize) -> f64 {
        let close = series.bars()[index].close;
        let risk = close - self.calculate_stop_loss(series, index);
        close + RISK_REWARD_RATIO * risk
    }
}
