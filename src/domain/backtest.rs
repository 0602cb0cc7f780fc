//! Backtest engine and event loop.
//!
//! The engine walks the series bar by bar. Open positions are checked against
//! their protective levels first, using the bar's high/low; when both levels
//! fall inside the same bar the stop-loss is assumed to fill first. Signal
//! entries and exits then execute at the bar's close. Any position still open
//! after the last bar is closed at the final close.

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::error::StratbenchError;
use crate::domain::metrics::Metrics;
use crate::domain::series::PriceSeries;
use crate::domain::signal::Signal;
use crate::domain::strategy::Strategy;
use crate::domain::trade::{ExitReason, OpenPosition, Trade, TradeDirection};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Commission as a fraction of trade value, charged on entry and exit.
    pub commission_pct: f64,
    /// Fraction of current capital committed per entry.
    pub position_size: f64,
    pub allow_shorting: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 50_000.0,
            commission_pct: 0.001,
            position_size: 0.95,
            allow_shorting: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, Default)]
pub struct BacktestEngine {
    pub config: BacktestConfig,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        series: &PriceSeries,
        strategy: &dyn Strategy,
    ) -> Result<BacktestResult, StratbenchError> {
        if series.is_empty() {
            return Err(StratbenchError::EmptyInput {
                reason: "price series has no bars".into(),
            });
        }

        let signals = strategy.generate_signals(series)?;
        debug_assert_eq!(signals.len(), series.len());

        let bars = series.bars();
        let mut capital = self.config.initial_capital;
        let mut position: Option<OpenPosition> = None;
        let mut trades: Vec<Trade> = Vec::new();
        let mut equity_curve = Vec::with_capacity(bars.len());

        for (i, bar) in bars.iter().enumerate() {
            // Protective exits run before signal handling.
            if let Some(pos) = &position {
                let stop_hit = pos.should_stop_loss(bar);
                let take_hit = pos.should_take_profit(bar);
                if stop_hit || take_hit {
                    let (price, reason) = if stop_hit {
                        (pos.stop_loss, ExitReason::StopLoss)
                    } else {
                        (pos.take_profit, ExitReason::TakeProfit)
                    };
                    if let Some(pos) = position.take() {
                        trades.push(self.close_position(pos, price, bar.date, reason, &mut capital));
                    }
                }
            }

            match signals[i] {
                Signal::Buy => {
                    if let Some(pos) = &position {
                        if pos.direction == TradeDirection::Short {
                            if let Some(pos) = position.take() {
                                trades.push(self.close_position(
                                    pos,
                                    bar.close,
                                    bar.date,
                                    ExitReason::Signal,
                                    &mut capital,
                                ));
                            }
                        }
                    }
                    if position.is_none() {
                        position =
                            self.open_position(series, strategy, i, TradeDirection::Long, &mut capital);
                    }
                }
                Signal::Sell => {
                    if let Some(pos) = &position {
                        if pos.direction == TradeDirection::Long {
                            if let Some(pos) = position.take() {
                                trades.push(self.close_position(
                                    pos,
                                    bar.close,
                                    bar.date,
                                    ExitReason::Signal,
                                    &mut capital,
                                ));
                            }
                        }
                    }
                    if position.is_none() && self.config.allow_shorting {
                        position = self.open_position(
                            series,
                            strategy,
                            i,
                            TradeDirection::Short,
                            &mut capital,
                        );
                    }
                }
                Signal::Hold => {}
            }

            let equity = match &position {
                None => capital,
                Some(pos) => match pos.direction {
                    TradeDirection::Long => capital + pos.quantity * bar.close,
                    TradeDirection::Short => capital - pos.quantity * bar.close,
                },
            };
            equity_curve.push(EquityPoint {
                date: bar.date,
                equity,
            });
        }

        if let Some(pos) = position.take() {
            let last = &bars[bars.len() - 1];
            trades.push(self.close_position(
                pos,
                last.close,
                last.date,
                ExitReason::EndOfData,
                &mut capital,
            ));
        }

        let metrics = Metrics::compute(&trades, &equity_curve, self.config.initial_capital);

        Ok(BacktestResult {
            strategy_name: strategy.name().to_string(),
            trades,
            equity_curve,
            metrics,
        })
    }

    /// Sizes and opens a position at the bar's close. Returns `None` when no
    /// capital is left to commit.
    fn open_position(
        &self,
        series: &PriceSeries,
        strategy: &dyn Strategy,
        index: usize,
        direction: TradeDirection,
        capital: &mut f64,
    ) -> Option<OpenPosition> {
        let bar = &series.bars()[index];
        let price = bar.close;
        let commission = self.config.commission_pct;

        let budget = *capital * self.config.position_size;
        let quantity = budget / (price * (1.0 + commission));
        if !quantity.is_finite() || quantity <= 0.0 {
            return None;
        }

        let long_stop = strategy.calculate_stop_loss(series, index);
        let long_take = strategy.calculate_take_profit(series, index);
        let (stop_loss, take_profit) = match direction {
            TradeDirection::Long => (long_stop, long_take),
            // Short levels mirror the long ones around the entry close.
            TradeDirection::Short => (
                if long_stop > 0.0 { 2.0 * price - long_stop } else { 0.0 },
                if long_take > 0.0 { 2.0 * price - long_take } else { 0.0 },
            ),
        };

        match direction {
            TradeDirection::Long => *capital -= quantity * price * (1.0 + commission),
            TradeDirection::Short => *capital += quantity * price * (1.0 - commission),
        }

        debug!(
            date = %bar.date,
            %direction,
            price,
            quantity,
            stop_loss,
            take_profit,
            "opened position"
        );

        Some(OpenPosition {
            direction,
            quantity,
            entry_price: price,
            entry_date: bar.date,
            stop_loss,
            take_profit,
        })
    }

    fn close_position(
        &self,
        position: OpenPosition,
        price: f64,
        date: NaiveDate,
        reason: ExitReason,
        capital: &mut f64,
    ) -> Trade {
        let commission = self.config.commission_pct;

        let (profit, profit_pct) = match position.direction {
            TradeDirection::Long => {
                let entry_cost = position.quantity * position.entry_price * (1.0 + commission);
                let proceeds = position.quantity * price * (1.0 - commission);
                *capital += proceeds;
                (proceeds - entry_cost, price / position.entry_price - 1.0)
            }
            TradeDirection::Short => {
                let entry_credit = position.quantity * position.entry_price * (1.0 - commission);
                let cover_cost = position.quantity * price * (1.0 + commission);
                *capital -= cover_cost;
                (
                    entry_credit - cover_cost,
                    (position.entry_price - price) / position.entry_price,
                )
            }
        };

        debug!(
            date = %date,
            direction = %position.direction,
            price,
            profit,
            %reason,
            "closed position"
        );

        Trade {
            direction: position.direction,
            quantity: position.quantity,
            entry_date: position.entry_date,
            entry_price: position.entry_price,
            exit_date: date,
            exit_price: price,
            profit,
            profit_pct,
            exit_reason: reason,
        }
    }
}
