//! Core domain types and logic.

pub mod series;
pub mod signal;
pub mod indicator;
pub mod strategy;
pub mod trade;
pub mod backtest;
pub mod metrics;
pub mod optimizer;
pub mod error;
