//! Average True Range.
//!
//! True range per bar = max(high-low, |high-prev_close|, |low-prev_close|);
//! the first bar has no previous close and uses high-low. The ATR is
//! Wilder-smoothed: the first value seeds from the simple mean of the first
//! `period` true ranges, then atr = (prev_atr * (n-1) + tr) / n.
//!
//! Warmup: first (period-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::series::PriceBar;

pub fn calculate_atr(bars: &[PriceBar], period: usize) -> IndicatorSeries {
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
            indicator_type: IndicatorType::Atr(period),
            values,
        };
    }

    let mut tr_values: Vec<f64> = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let tr = if i == 0 {
            bar.high - bar.low
        } else {
            bar.true_range(bars[i - 1].close)
        };
        tr_values.push(tr);
    }

    let mut atr = 0.0;
    for (i, bar) in bars.iter().enumerate() {
        if i + 1 < period {
            values.push(IndicatorPoint {
                date: bar.date,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            });
        } else if i + 1 == period {
            atr = tr_values[..period].iter().sum::<f64>() / period as f64;
            values.push(IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Simple(atr),
            });
        } else {
            atr = (atr * (period - 1) as f64 + tr_values[i]) / period as f64;
            values.push(IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Simple(atr),
            });
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}
