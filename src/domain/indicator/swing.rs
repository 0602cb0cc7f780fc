//! Swing-point detection and support/resistance levels.
//!
//! A bar is a swing high when its high equals the maximum high over a window
//! centered on it, and a swing low when its low equals the window's minimum
//! low. The span is `2*(window/2) + 1` bars, so the window is widened to the
//! nearest odd span. Bars whose centered window does not fit inside the
//! series are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::series::PriceBar;

pub fn calculate_swings(bars: &[PriceBar], window: usize) -> IndicatorSeries {
    let half = window / 2;
    let mut values = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        let valid = window > 0 && i >= half && i + half < bars.len();

        let (high, low) = if valid {
            let slice = &bars[i - half..=i + half];
            let max_high = slice.iter().map(|b| b.high).fold(f64::MIN, f64::max);
            let min_low = slice.iter().map(|b| b.low).fold(f64::MAX, f64::min);
            (bars[i].high >= max_high, bars[i].low <= min_low)
        } else {
            (false, false)
        };

        values.push(IndicatorPoint {
            date: bars[i].date,
            valid,
            value: IndicatorValue::Swing { high, low },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Swing(window),
        values,
    }
}

/// The most recent confirmed swing low (support) and swing high (resistance)
/// as of the final bar. Either side is `None` until a swing of that kind has
/// been confirmed.
pub fn support_resistance(bars: &[PriceBar], window: usize) -> (Option<f64>, Option<f64>) {
    let swings = calculate_swings(bars, window);

    let mut support = None;
    let mut resistance = None;

    for (i, point) in swings.values.iter().enumerate() {
        if !point.valid {
            continue;
        }
        if let IndicatorValue::Swing { high, low } = point.value {
            if low {
                support = Some(bars[i].low);
            }
            if high {
                resistance = Some(bars[i].high);
            }
        }
    }

    (support, resistance)
}
