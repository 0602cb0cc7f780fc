//! Volatility-based stop-loss and take-profit levels.
//!
//! The stop is placed `atr_multiplier` ATRs away from the latest close, on
//! the losing side for the given direction. The take-profit mirrors the
//! risked distance scaled by `risk_reward_ratio`.

use crate::domain::indicator::atr::calculate_atr;
use crate::domain::series::PriceBar;
use crate::domain::trade::TradeDirection;

const ATR_PERIOD: usize = 14;

/// Returns `(stop_loss, take_profit)` for a position opened at the latest
/// close, or `None` when the series is too short for a valid ATR.
pub fn stop_loss_take_profit(
    bars: &[PriceBar],
    atr_multiplier: f64,
    risk_reward_ratio: f64,
    direction: TradeDirection,
) -> Option<(f64, f64)> {
    let last = bars.last()?;
    let atr = calculate_atr(bars, ATR_PERIOD).simple_at(bars.len() - 1)?;

    let risk = atr_multiplier * atr;
    let (stop, target) = match direction {
        TradeDirection::Long => (last.close - risk, last.close + risk_reward_ratio * risk),
        TradeDirection::Short => (last.close + risk, last.close - risk_reward_ratio * risk),
    };

    Some((stop, target))
}
