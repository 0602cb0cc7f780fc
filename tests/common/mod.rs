#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;
use stratbench::domain::backtest::BacktestConfig;
use stratbench::domain::error::StratbenchError;
pub use stratbench::domain::series::{PriceBar, PriceSeries};
use stratbench::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, StratbenchError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(StratbenchError::Data {
                reason: reason.clone(),
            });
        }
        PriceSeries::new(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, StratbenchError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Bar with a one-point envelope around the close.
pub fn make_bar(date_str: &str, close: f64) -> PriceBar {
    PriceBar {
        date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
        adj_close: None,
    }
}

/// Daily series with enveloped bars, starting 2024-01-01.
pub fn make_series(closes: &[f64]) -> PriceSeries {
    let start = date(2024, 1, 1);
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            date: start + chrono::Duration::days(i as i64),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1000,
            adj_close: None,
        })
        .collect();
    PriceSeries::new(bars).unwrap()
}

/// Daily series where every bar trades flat at its close, so protective
/// levels only fire when the close itself reaches them.
pub fn make_flat_series(closes: &[f64]) -> PriceSeries {
    let start = date(2024, 1, 1);
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            date: start + chrono::Duration::days(i as i64),
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

pub fn generate_bars(start_date: &str, count: usize, start_price: f64) -> Vec<PriceBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| PriceBar {
            date: start + chrono::Duration::days(i as i64),
            open: start_price + i as f64,
            high: start_price + i as f64 + 1.0,
            low: start_price + i as f64 - 1.0,
            close: start_price + i as f64,
            volume: 1000,
            adj_close: None,
        })
        .collect()
}

pub fn zero_cost_config(initial_capital: f64) -> BacktestConfig {
    BacktestConfig {
        initial_capital,
        commission_pct: 0.0,
        position_size: 1.0,
        allow_shorting: false,
    }
}

/// Writes `<dir>/<symbol>.csv` with flat daily bars starting 2024-01-01.
pub fn write_symbol_csv(dir: &Path, symbol: &str, closes: &[f64]) {
    let start = date(2024, 1, 1);
    let mut content = String::from("date,open,high,low,close,volume\n");
    for (i, close) in closes.iter().enumerate() {
        let day = start + chrono::Duration::days(i as i64);
        content.push_str(&format!(
            "{},{close},{close},{close},{close},1000\n",
            day.format("%Y-%m-%d")
        ));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}
