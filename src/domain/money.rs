//! Decimal rounding at the output boundary.
//!
//! Every monetary figure is carried at full precision through the
//! calculation and rounded half-up exactly once when it leaves the domain.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places for cash amounts and valuations.
pub const MONEY_DP: u32 = 2;

/// Decimal places for quotes below one unit of cash (JPY-style rates).
pub const FINE_QUOTE_DP: u32 = 4;

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a unit price or rate, keeping four places for sub-unit quotes.
pub fn round_quote(value: Decimal) -> Decimal {
    let dp = if value.abs() < Decimal::ONE {
        FINE_QUOTE_DP
    } else {
        MONEY_DP
    };
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}
