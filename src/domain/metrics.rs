//! Performance metrics over a completed backtest.
//!
//! Returns are computed from the per-bar equity curve, trade statistics from
//! the closed trade list. The annualized return uses a 365 calendar-day
//! basis; the Sharpe ratio scales daily returns by sqrt(252) with a zero
//! risk-free rate. Drawdown is reported as a negative fraction.

use crate::domain::backtest::EquityPoint;
use crate::domain::error::StratbenchError;
use crate::domain::trade::Trade;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const CALENDAR_DAYS_PER_YEAR: f64 = 365.0;

/// Metric names accepted by [`Metrics::metric_value`] and the optimizer.
pub const METRIC_NAMES: &[&str] = &[
    "total_return",
    "annual_return",
    "sharpe_ratio",
    "max_drawdown",
    "win_rate",
    "profit_factor",
    "total_trades",
    "avg_profit",
    "avg_hold_days",
];

#[derive(Debug, Clone)]
pub struct Metrics {
    pub total_return: f64,
    pub annual_return: f64,
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough equity decline, as a fraction at or below zero.
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    /// Gross profit over gross loss. Infinite when there are wins but no
    /// losses, zero when there are no trades.
    pub profit_factor: f64,
    pub avg_profit: f64,
    pub avg_win: f64,
    /// Average losing trade, reported as a positive magnitude.
    pub avg_loss: f64,
    pub avg_hold_days: f64,
    pub final_capital: f64,
}

impl Metrics {
    pub fn compute(trades: &[Trade], equity_curve: &[EquityPoint], initial_capital: f64) -> Self {
        let net_profit: f64 = trades.iter().map(|t| t.profit).sum();
        let final_capital = initial_capital + net_profit;
        let total_return = if initial_capital != 0.0 {
            net_profit / initial_capital
        } else {
            0.0
        };

        let annual_return = annualized_return(total_return, equity_curve);
        let returns = daily_returns(equity_curve);
        let sharpe_ratio = sharpe(&returns);
        let max_drawdown = compute_drawdown(equity_curve);

        let winners: Vec<f64> = trades
            .iter()
            .map(|t| t.profit)
            .filter(|p| *p > 0.0)
            .collect();
        let losers: Vec<f64> = trades
            .iter()
            .map(|t| t.profit)
            .filter(|p| *p < 0.0)
            .collect();

        let gross_profit: f64 = winners.iter().sum();
        let gross_loss: f64 = -losers.iter().sum::<f64>();

        let profit_factor = if trades.is_empty() {
            0.0
        } else if gross_loss == 0.0 {
            if gross_profit > 0.0 { f64::INFINITY } else { 0.0 }
        } else {
            gross_profit / gross_loss
        };

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            winners.len() as f64 / total_trades as f64
        } else {
            0.0
        };
        let avg_profit = mean(&trades.iter().map(|t| t.profit).collect::<Vec<_>>());
        let avg_win = mean(&winners);
        let avg_loss = mean(&losers).abs();
        let avg_hold_days = mean(
            &trades
                .iter()
                .map(|t| t.hold_days() as f64)
                .collect::<Vec<_>>(),
        );

        Metrics {
            total_return,
            annual_return,
            sharpe_ratio,
            max_drawdown,
            total_trades,
            winning_trades: winners.len(),
            losing_trades: losers.len(),
            win_rate,
            profit_factor,
            avg_profit,
            avg_win,
            avg_loss,
            avg_hold_days,
            final_capital,
        }
    }

    /// Looks up a metric by its name in [`METRIC_NAMES`].
    pub fn metric_value(&self, name: &str) -> Result<f64, StratbenchError> {
        match name {
            "total_return" => Ok(self.total_return),
            "annual_return" => Ok(self.annual_return),
            "sharpe_ratio" => Ok(self.sharpe_ratio),
            "max_drawdown" => Ok(self.max_drawdown),
            "win_rate" => Ok(self.win_rate),
            "profit_factor" => Ok(self.profit_factor),
            "total_trades" => Ok(self.total_trades as f64),
            "avg_profit" => Ok(self.avg_profit),
            "avg_hold_days" => Ok(self.avg_hold_days),
            _ => Err(StratbenchError::UnknownMetric {
                name: name.to_string(),
            }),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn daily_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|pair| {
            if pair[0].equity != 0.0 {
                pair[1].equity / pair[0].equity - 1.0
            } else {
                0.0
            }
        })
        .collect()
}

fn annualized_return(total_return: f64, equity_curve: &[EquityPoint]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let days = (equity_curve[equity_curve.len() - 1].date - equity_curve[0].date)
        .num_days()
        .max(1) as f64;
    (1.0 + total_return).powf(CALENDAR_DAYS_PER_YEAR / days) - 1.0
}

fn sharpe(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let mean_return = mean(returns);
    let variance = returns
        .iter()
        .map(|r| (r - mean_return).powi(2))
        .sum::<f64>()
        / returns.len() as f64;
    let std_dev = variance.sqrt();
    if std_dev == 0.0 {
        return 0.0;
    }
    TRADING_DAYS_PER_YEAR.sqrt() * mean_return / std_dev
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_drawdown: f64 = 0.0;
    for point in equity_curve {
        peak = peak.max(point.equity);
        if peak > 0.0 {
            max_drawdown = max_drawdown.min(point.equity / peak - 1.0);
        }
    }
    max_drawdown
}
