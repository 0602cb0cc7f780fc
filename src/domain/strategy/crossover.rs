//! Moving-average crossover strategy.
//!
//! Buys when the short SMA closes above the long SMA after being at or below
//! it, sells on the mirrored downward cross. Protective levels are placed two
//! ATRs below and three ATRs above the entry close.

use crate::domain::error::StratbenchError;
use crate::domain::indicator::calculate_sma;
use crate::domain::series::PriceSeries;
use crate::domain::signal::{Signal, SignalSeries};
use crate::domain::strategy::{
    Parameters, Strategy, atr_or_fallback, crossed_above, crossed_below, window_param,
};

const DEFAULT_SHORT_WINDOW: f64 = 20.0;
const DEFAULT_LONG_WINDOW: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct MovingAverageCrossover {
    parameters: Parameters,
}

impl MovingAverageCrossover {
    pub fn new(short_window: usize, long_window: usize) -> Self {
        Self {
            parameters: Parameters::from_pairs(&[
                ("short_window", short_window as f64),
                ("long_window", long_window as f64),
            ]),
        }
    }
}

impl Default for MovingAverageCrossover {
    fn default() -> Self {
        Self::new(DEFAULT_SHORT_WINDOW as usize, DEFAULT_LONG_WINDOW as usize)
    }
}

impl Strategy for MovingAverageCrossover {
    fn name(&self) -> &str {
        "MA Crossover"
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
            window_param(&self.parameters, "short_window", DEFAULT_SHORT_WINDOW),
            window_param(&self.parameters, "long_window", DEFAULT_LONG_WINDOW),
        );
        let (Some(short_window), Some(long_window)) = windows else {
            return Ok(vec![Signal::Hold; bars.len()]);
        };

        let short_sma = calculate_sma(bars, short_window);
        let long_sma = calculate_sma(bars, long_window);

        let mut signals = vec![Signal::Hold; bars.len()];
        for i in 1..bars.len() {
            let values = (
                short_sma.simple_at(i - 1),
                long_sma.simple_at(i - 1),
                short_sma.simple_at(i),
                long_sma.simple_at(i),
            );
            let (Some(prev_short), Some(prev_long), Some(short), Some(long)) = values else {
                continue;
            };

            if crossed_above(prev_short, prev_long, short, long) {
                signals[i] = Signal::Buy;
            } else if crossed_below(prev_short, prev_long, short, long) {
                signals[i] = Signal::Sell;
            }
        }

        Ok(signals)
    }

    fn calculate_stop_loss(&self, series: &PriceSeries, index: usize) -> f64 {
        let bars = series.bars();
        bars[index].close - 2.0 * atr_or_fallback(bars, index)
    }

    fn calculate_take_profit(&self, series: &PriceSeries, index: usize) -> f64 {
        let bars = series.bars();
        bars[index].close + 3.0 * atr_or_fallback(bars, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::PriceBar;
    use chrono::NaiveDate;

    fn make_series(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Days::new(i as u64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
                adj_close: None,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    fn make_ranged_series(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Days::new(i as u64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
                adj_close: None,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    #[test]
    fn default_windows() {
        let strategy = MovingAverageCrossover::default();
        assert_eq!(strategy.parameters().get("short_window"), Some(20.0));
        assert_eq!(strategy.parameters().get("long_window"), Some(50.0));
    }

    #[test]
    fn buy_and_sell_at_crossings() {
        let strategy = MovingAverageCrossover::new(2, 4);
        let series = make_series(&[
            10.0, 10.0, 10.0, 10.0, 20.0, 20.0, 20.0, 20.0, 10.0, 10.0, 10.0, 10.0,
        ]);

        let signals = strategy.generate_signals(&series).unwrap();
        assert_eq!(signals.len(), 12);
        assert_eq!(signals[4], Signal::Buy);
        assert_eq!(signals[8], Signal::Sell);
        for (i, signal) in signals.iter().enumerate() {
            if i != 4 && i != 8 {
                assert_eq!(*signal, Signal::Hold, "bar {i}");
            }
        }
    }

    #[test]
    fn warmup_bars_hold() {
        let strategy = MovingAverageCrossover::new(2, 4);
        let series = make_series(&[10.0, 20.0, 10.0]);
        let signals = strategy.generate_signals(&series).unwrap();
        assert_eq!(signals, vec![Signal::Hold; 3]);
    }

    #[test]
    fn non_positive_window_holds() {
        let mut strategy = MovingAverageCrossover::new(2, 4);
        strategy.parameters_mut().set("short_window", 0.0);
        let series = make_series(&[10.0, 20.0, 10.0, 20.0, 10.0]);
        let signals = strategy.generate_signals(&series).unwrap();
        assert_eq!(signals, vec![Signal::Hold; 5]);
    }

    #[test]
    fn flat_series_never_signals() {
        let strategy = MovingAverageCrossover::new(2, 4);
        let series = make_series(&[50.0; 30]);
        let signals = strategy.generate_signals(&series).unwrap();
        assert!(signals.iter().all(|s| *s == Signal::Hold));
    }

    #[test]
    fn levels_use_atr_when_seeded() {
        let strategy = MovingAverageCrossover::default();
        // Constant close with a 2.0 bar range keeps the ATR at 2.0.
        let series = make_ranged_series(&[100.0; 20]);

        let stop = strategy.calculate_stop_loss(&series, 19);
        let target = strategy.calculate_take_profit(&series, 19);
        assert!((stop - 96.0).abs() < 1e-10);
        assert!((target - 106.0).abs() < 1e-10);
    }

    #[test]
    fn levels_fall_back_to_two_percent() {
        let strategy = MovingAverageCrossover::default();
        // Too short for ATR(14), so 2% of the close stands in.
        let series = make_ranged_series(&[50.0; 5]);

        let stop = strategy.calculate_stop_loss(&series, 4);
        let target = strategy.calculate_take_profit(&series, 4);
        assert!((stop - 48.0).abs() < 1e-10);
        assert!((target - 53.0).abs() < 1e-10);
    }
}
