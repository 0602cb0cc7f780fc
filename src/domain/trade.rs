//! Trade records and open-position tracking.

use std::fmt;

use chrono::NaiveDate;

use crate::domain::series::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeDirection {
    Long,
    Short,
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Long => write!(f, "LONG"),
            TradeDirection::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Signal,
    StopLoss,
    TakeProfit,
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal => write!(f, "signal"),
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::TakeProfit => write!(f, "take_profit"),
            ExitReason::EndOfData => write!(f, "end_of_data"),
        }
    }
}

/// A position currently held by the backtest engine.
#[derive(Debug, Clone)]
pub struct OpenPosition {
    pub direction: TradeDirection,
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl OpenPosition {
    /// Whether the bar's range touched the stop level. A level at or below
    /// zero disables the check.
    pub fn should_stop_loss(&self, bar: &PriceBar) -> bool {
        if self.stop_loss <= 0.0 {
            return false;
        }
        match self.direction {
            TradeDirection::Long => bar.low <= self.stop_loss,
            TradeDirection::Short => bar.high >= self.stop_loss,
        }
    }

    /// Whether the bar's range touched the take-profit level. A level at or
    /// below zero disables the check.
    pub fn should_take_profit(&self, bar: &PriceBar) -> bool {
        if self.take_profit <= 0.0 {
            return false;
        }
        match self.direction {
            TradeDirection::Long => bar.high >= self.take_profit,
            TradeDirection::Short => bar.low <= self.take_profit,
        }
    }
}

/// A completed round trip.
#[derive(Debug, Clone)]
pub struct Trade {
    pub direction: TradeDirection,
    pub quantity: f64,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub profit: f64,
    pub profit_pct: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn hold_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
