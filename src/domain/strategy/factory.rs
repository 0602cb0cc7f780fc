//! Strategy construction by name.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::StratbenchError;
use crate::domain::strategy::{
    BollingerBandsStrategy, MacdStrategy, MovingAverageCrossover, RsiStrategy, Strategy,
};

/// The built-in strategy catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    MaCrossover,
    Rsi,
    Macd,
    Bollinger,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::MaCrossover,
        StrategyKind::Rsi,
        StrategyKind::Macd,
        StrategyKind::Bollinger,
    ];

    /// Stable identifier used on the command line and in config files.
    pub fn id(&self) -> &'static str {
        match self {
            StrategyKind::MaCrossover => "ma-crossover",
            StrategyKind::Rsi => "rsi",
            StrategyKind::Macd => "macd",
            StrategyKind::Bollinger => "bollinger",
        }
    }

    /// Builds the strategy with its default parameters.
    pub fn create(&self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::MaCrossover => Box::new(MovingAverageCrossover::default()),
            StrategyKind::Rsi => Box::new(RsiStrategy::default()),
            StrategyKind::Macd => Box::new(MacdStrategy::default()),
            StrategyKind::Bollinger => Box::new(BollingerBandsStrategy::default()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for StrategyKind {
    type Err = StratbenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "ma-crossover" | "ma" | "crossover" => Ok(StrategyKind::MaCrossover),
            "rsi" => Ok(StrategyKind::Rsi),
            "macd" => Ok(StrategyKind::Macd),
            "bollinger" | "bollinger-bands" => Ok(StrategyKind::Bollinger),
            _ => Err(StratbenchError::UnknownStrategy {
                name: s.to_string(),
            }),
        }
    }
}
