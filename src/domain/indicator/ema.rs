//! Exponential Moving Average.
//!
//! Smoothing factor k = 2 / (period + 1). The first defined value seeds from
//! the simple average of the first `period` closes, then
//! ema = close * k + prev_ema * (1 - k).
//!
//! Warmup: first (period-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::series::PriceBar;

pub fn calculate_ema(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());

    if period == 0 || bars.len() < period {
        for bar in bars {
            values.push(IndicatorPoint {
                date: bar.date,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            });
        }
        return IndicatorSeries {
            indicator_type: IndicatorType::Ema(period),
            values,
        };
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if i + 1 < period {
            values.push(IndicatorPoint {
                date: bar.date,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            });
        } else if i + 1 == period {
            let seed: f64 = bars[..period].iter().map(|b| b.close).sum::<f64>() / period as f64;
            ema = seed;
            values.push(IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Simple(ema),
            });
        } else {
            ema = bar.close * k + ema * (1.0 - k);
            values.push(IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Simple(ema),
            });
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}
