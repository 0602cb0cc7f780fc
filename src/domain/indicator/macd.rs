//! Moving Average Convergence Divergence.
//!
//! MACD line = EMA(fast) - EMA(slow)
//! Signal line = EMA(signal) of the MACD line
//! Histogram = MACD line - signal line
//!
//! The signal-line EMA seeds from the simple average of the first `signal`
//! defined MACD values, mirroring the close-price EMA.
//!
//! Warmup: slow - 1 + signal - 1 bars.

use crate::domain::indicator::{
    IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue, calculate_ema,
};
use crate::domain::series::PriceBar;

pub fn calculate_macd(
    bars: &[PriceBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };

    let warmup = slow.saturating_sub(1) + signal_period.saturating_sub(1);
    if fast == 0 || slow == 0 || signal_period == 0 || bars.len() <= warmup {
        let values = bars
            .iter()
            .map(|b| IndicatorPoint {
                date: b.date,
                valid: false,
                value: IndicatorValue::Macd {
                    line: 0.0,
                    signal: 0.0,
                    histogram: 0.0,
                },
            })
            .collect();
        return IndicatorSeries {
            indicator_type,
            values,
        };
    }

    let ema_fast = ema_raw_values(bars, fast);
    let ema_slow = ema_raw_values(bars, slow);

    let macd_line: Vec<f64> = (0..bars.len()).map(|i| ema_fast[i] - ema_slow[i]).collect();

    // Signal line: EMA over the MACD values defined from index slow-1 on.
    let macd_start = slow - 1;
    let k = 2.0 / (signal_period as f64 + 1.0);
    let mut signal_line = vec![0.0; bars.len()];

    let seed: f64 = macd_line[macd_start..macd_start + signal_period]
        .iter()
        .sum::<f64>()
        / signal_period as f64;
    let mut signal_ema = seed;
    signal_line[macd_start + signal_period - 1] = signal_ema;

    for i in (macd_start + signal_period)..bars.len() {
        signal_ema = macd_line[i] * k + signal_ema * (1.0 - k);
        signal_line[i] = signal_ema;
    }

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let line = macd_line[i];
            let signal = signal_line[i];
            IndicatorPoint {
                date: bar.date,
                valid: i >= warmup,
                value: IndicatorValue::Macd {
                    line,
                    signal,
                    histogram: line - signal,
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

/// Raw EMA values, 0.0 during warmup.
fn ema_raw_values(bars: &[PriceBar], period: usize) -> Vec<f64> {
    calculate_ema(bars, period)
        .values
        .iter()
        .map(|p| p.value.simple().unwrap_or(0.0))
        .collect()
}
