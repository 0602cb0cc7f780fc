//! Data access port trait.

use crate::domain::error::StratbenchError;
use crate::domain::series::PriceSeries;

pub trait DataPort {
    /// Loads the full validated price history for one symbol.
    fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, StratbenchError>;

    /// Symbols this source can serve, sorted ascending.
    fn list_symbols(&self) -> Result<Vec<String>, StratbenchError>;
}
