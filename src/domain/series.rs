//! Price bar and validated price series.

use crate::domain::error::StratbenchError;
use chrono::NaiveDate;

/// A single OHLCV bar. `adj_close` is carried when the source provides it
/// but nothing in the core reads it.
#[derive(Debug, Clone)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub adj_close: Option<f64>,
}

impl PriceBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// An ordered series of bars for one instrument.
///
/// Construction validates the whole sequence; everything downstream
/// (indicators, strategies, the engine) can assume dates are unique and
/// strictly ascending and each bar's high/low envelope holds. The series is
/// read-only after construction; computed series (signals, indicators) are
/// always freshly allocated, never written back into the input.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, StratbenchError> {
        for (i, bar) in bars.iter().enumerate() {
            if !(bar.open.is_finite()
                && bar.high.is_finite()
                && bar.low.is_finite()
                && bar.close.is_finite())
            {
                return Err(StratbenchError::InvalidSeries {
                    reason: format!("non-finite price in bar {} ({})", i, bar.date),
                });
            }
            if bar.high < bar.open || bar.high < bar.close || bar.high < bar.low {
                return Err(StratbenchError::InvalidSeries {
                    reason: format!("bar {} ({}): high below open/close/low", i, bar.date),
                });
            }
            if bar.low > bar.open || bar.low > bar.close {
                return Err(StratbenchError::InvalidSeries {
                    reason: format!("bar {} ({}): low above open/close", i, bar.date),
                });
            }
            if bar.volume < 0 {
                return Err(StratbenchError::InvalidSeries {
                    reason: format!("bar {} ({}): negative volume", i, bar.date),
                });
            }
            if i > 0 && bars[i - 1].date >= bar.date {
                return Err(StratbenchError::InvalidSeries {
                    reason: format!(
                        "dates not strictly ascending at bar {} ({} then {})",
                        i,
                        bars[i - 1].date,
                        bar.date
                    ),
                });
            }
        }

        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Closing prices in bar order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}
