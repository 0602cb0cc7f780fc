//! Bollinger Bands.
//!
//! - Middle: SMA over `period` closes
//! - Upper: middle + num_std × stddev
//! - Lower: middle - num_std × stddev
//!
//! Stddev is the population standard deviation over the window (divides by N).
//! A zero-volatility window collapses all three bands onto the middle.
//!
//! Warmup: first (period-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::series::PriceBar;

pub fn calculate_bollinger(bars: &[PriceBar], period: usize, num_std: f64) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let warmup = period.saturating_sub(1);

    for i in 0..bars.len() {
        let date = bars[i].date;
        let valid = period > 0 && i >= warmup;

        let (upper, middle, lower) = if valid {
            let start = i + 1 - period;
            let window = &bars[start..=i];

            let middle: f64 = window.iter().map(|b| b.close).sum::<f64>() / period as f64;
            let variance: f64 = window
                .iter()
                .map(|b| {
                    let diff = b.close - middle;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;
            let stddev = variance.sqrt();

            (middle + num_std * stddev, middle, middle - num_std * stddev)
        } else {
            (0.0, 0.0, 0.0)
        };

        values.push(IndicatorPoint {
            date,
            valid,
            value: IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger { period, num_std },
        values,
    }
}
