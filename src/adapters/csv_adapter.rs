//! CSV file data adapter.
//!
//! One file per symbol at `<dir>/<SYMBOL>.csv` with a header row and the
//! columns `date,open,high,low,close,volume[,adj_close]`. Rows are sorted by
//! date before series validation, so an unsorted file loads fine but
//! duplicate dates are rejected.

use crate::domain::error::StratbenchError;
use crate::domain::series::{PriceBar, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn parse_column<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<T, StratbenchError>
where
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| StratbenchError::Data {
            reason: format!("missing {} column", name),
        })?
        .parse()
        .map_err(|e| StratbenchError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, StratbenchError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| StratbenchError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| StratbenchError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date_str = record.get(0).ok_or_else(|| StratbenchError::Data {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                StratbenchError::Data {
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            let open: f64 = parse_column(&record, 1, "open")?;
            let high: f64 = parse_column(&record, 2, "high")?;
            let low: f64 = parse_column(&record, 3, "low")?;
            let close: f64 = parse_column(&record, 4, "close")?;
            let volume: i64 = parse_column(&record, 5, "volume")?;

            let adj_close = match record.get(6) {
                Some(raw) if !raw.is_empty() => {
                    Some(raw.parse().map_err(|e| StratbenchError::Data {
                        reason: format!("invalid adj_close value: {}", e),
                    })?)
                }
                _ => None,
            };

            bars.push(PriceBar {
                date,
                open,
                high,
                low,
                close,
                volume,
                adj_close,
            });
        }

        bars.sort_by_key(|b| b.date);
        PriceSeries::new(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, StratbenchError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| StratbenchError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StratbenchError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";

        fs::write(path.join("ACME.csv"), csv_content).unwrap();
        fs::write(path.join("ZETA.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "not price data\n").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_series_returns_bars() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter.fetch_series("ACME").unwrap();
        assert_eq!(series.len(), 3);

        let bar = &series.bars()[0];
        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(bar.open, 100.0);
        assert_eq!(bar.high, 110.0);
        assert_eq!(bar.low, 90.0);
        assert_eq!(bar.close, 105.0);
        assert_eq!(bar.volume, 50000);
        assert_eq!(bar.adj_close, None);
    }

    #[test]
    fn fetch_series_sorts_rows_by_date() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("SHUF.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-17,110.0,120.0,105.0,115.0,55000\n\
             2024-01-15,100.0,110.0,90.0,105.0,50000\n\
             2024-01-16,105.0,115.0,100.0,110.0,60000\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(path);

        let series = adapter.fetch_series("SHUF").unwrap();
        let dates: Vec<NaiveDate> = series.bars().iter().map(|b| b.date).collect();
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn fetch_series_reads_adj_close_column() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("ADJ.csv"),
            "date,open,high,low,close,volume,adj_close\n\
             2024-01-15,100.0,110.0,90.0,105.0,50000,104.2\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(path);

        let series = adapter.fetch_series("ADJ").unwrap();
        assert_eq!(series.bars()[0].adj_close, Some(104.2));
    }

    #[test]
    fn fetch_series_missing_file_is_a_data_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_series("XYZ").unwrap_err();
        assert!(matches!(err, StratbenchError::Data { .. }));
    }

    #[test]
    fn fetch_series_rejects_malformed_values() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("BAD.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-15,100.0,110.0,90.0,oops,50000\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_series("BAD").unwrap_err();
        assert!(matches!(err, StratbenchError::Data { .. }));
    }

    #[test]
    fn fetch_series_rejects_duplicate_dates() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("DUP.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-15,100.0,110.0,90.0,105.0,50000\n\
             2024-01-15,105.0,115.0,100.0,110.0,60000\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_series("DUP").unwrap_err();
        assert!(matches!(err, StratbenchError::InvalidSeries { .. }));
    }

    #[test]
    fn fetch_series_empty_file_yields_empty_series() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter.fetch_series("ZETA").unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn list_symbols_finds_csv_files() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let symbols = adapter.list_symbols().unwrap();
        assert_eq!(symbols, vec!["ACME", "ZETA"]);
    }
}
