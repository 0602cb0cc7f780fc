//! Trading signals.

use std::fmt;

/// Per-bar strategy output. A signal series is aligned 1:1 with the price
/// series it was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

/// One [`Signal`] per bar, same length and order as the input series.
pub type SignalSeries = Vec<Signal>;

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}
