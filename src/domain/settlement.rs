//! Trade settlement: validating and applying buy/sell orders to one team's holdings.
//!
//! An order moves `Received -> Validated -> Applied`, or is rejected during
//! validation. [`Order`] is the received order, [`ValidatedOrder`] carries the
//! priced order that passed every check, and [`SettlementReceipt`] records
//! what was applied. Rejection is an `Err` and never touches holdings.
//!
//! Buys are priced at the buy quote, sells at the sell quote. There are no
//! partial fills.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::error::CashCrashError;
use super::holdings::TeamHoldings;
use super::instrument::Instrument;
use super::price_book::PriceBook;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => f.write_str("buy"),
            Side::Sell => f.write_str("sell"),
        }
    }
}

/// A received order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Order {
    pub instrument: Instrument,
    pub side: Side,
    pub quantity: Decimal,
}

impl Order {
    pub fn buy(instrument: Instrument, quantity: Decimal) -> Self {
        Order {
            instrument,
            side: Side::Buy,
            quantity,
        }
    }

    pub fn sell(instrument: Instrument, quantity: Decimal) -> Self {
        Order {
            instrument,
            side: Side::Sell,
            quantity,
        }
    }
}

/// An order that passed validation against current quotes and holdings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedOrder {
    pub order: Order,
    pub unit_price: Decimal,
    /// Cost for a buy, proceeds for a sell. Full precision.
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettlementReceipt {
    pub instrument: Instrument,
    pub side: Side,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub cash_after: Decimal,
    pub held_after: Decimal,
    pub settled_at: DateTime<Utc>,
}

/// Checks `quantity > 0`, and whole shares for stock.
pub fn check_quantity(instrument: Instrument, quantity: Decimal) -> Result<(), CashCrashError> {
    if quantity <= Decimal::ZERO {
        return Err(CashCrashError::InvalidQuantity {
            reason: format!("quantity must be positive, got {quantity}"),
        });
    }
    if let Instrument::Stock(_) = instrument {
        whole_shares(quantity)?;
    }
    Ok(())
}

/// `quantity × unit_price`, rejecting orders too large to price.
fn order_value(quantity: Decimal, unit_price: Decimal) -> Result<Decimal, CashCrashError> {
    quantity
        .checked_mul(unit_price)
        .ok_or_else(|| CashCrashError::InvalidQuantity {
            reason: format!("{quantity} at {unit_price} is too large to price"),
        })
}

fn whole_shares(quantity: Decimal) -> Result<i64, CashCrashError> {
    if !quantity.fract().is_zero() {
        return Err(CashCrashError::InvalidQuantity {
            reason: format!("stock orders must be whole shares, got {quantity}"),
        });
    }
    quantity
        .to_i64()
        .ok_or_else(|| CashCrashError::InvalidQuantity {
            reason: format!("share count {quantity} is out of range"),
        })
}

/// Validates `order` against `book` and `holdings` without mutating anything.
pub fn validate(
    order: Order,
    book: &PriceBook,
    holdings: &TeamHoldings,
) -> Result<ValidatedOrder, CashCrashError> {
    check_quantity(order.instrument, order.quantity)?;

    match order.side {
        Side::Buy => {
            let unit_price = book.quote(order.instrument)?.buy;
            let cost = order_value(order.quantity, unit_price)?;
            if holdings.cash() < cost {
                return Err(CashCrashError::InsufficientFunds {
                    required: cost,
                    available: holdings.cash(),
                });
            }
            Ok(ValidatedOrder {
                order,
                unit_price,
                amount: cost,
            })
        }
        Side::Sell => {
            let held = holdings.held(order.instrument);
            if order.quantity > held {
                return Err(CashCrashError::InsufficientHoldings {
                    requested: order.quantity,
                    held,
                });
            }
            let unit_price = book.quote(order.instrument)?.sell;
            Ok(ValidatedOrder {
                order,
                unit_price,
                amount: order_value(order.quantity, unit_price)?,
            })
        }
    }
}

/// Applies a validated order. Cash and lot change together or not at all.
pub fn apply(
    validated: ValidatedOrder,
    holdings: &mut TeamHoldings,
) -> Result<SettlementReceipt, CashCrashError> {
    let ValidatedOrder {
        order,
        unit_price,
        amount,
    } = validated;
    let (cash_delta, lot_delta) = match order.side {
        Side::Buy => (-amount, order.quantity),
        Side::Sell => (amount, -order.quantity),
    };

    let mut next = holdings.clone();
    adjust_lot(&mut next, order.instrument, lot_delta)?;
    let cash_after = next.adjust_cash(cash_delta)?;
    let held_after = next.held(order.instrument);
    *holdings = next;

    Ok(SettlementReceipt {
        instrument: order.instrument,
        side: order.side,
        quantity: order.quantity,
        unit_price,
        amount,
        cash_after,
        held_after,
        settled_at: Utc::now(),
    })
}

/// Validates then applies `order`.
pub fn settle(
    order: Order,
    book: &PriceBook,
    holdings: &mut TeamHoldings,
) -> Result<SettlementReceipt, CashCrashError> {
    let validated = validate(order, book, holdings)?;
    apply(validated, holdings)
}

fn adjust_lot(
    holdings: &mut TeamHoldings,
    instrument: Instrument,
    delta: Decimal,
) -> Result<Decimal, CashCrashError> {
    match instrument {
        Instrument::Stock(id) => {
            let shares = whole_shares(delta.abs())?;
            let signed = if delta.is_sign_negative() { -shares } else { shares };
            holdings.adjust_stock_lot(id, signed).map(Decimal::from)
        }
        Instrument::Currency(id) => holdings.adjust_currency_lot(id, delta),
    }
}

/// Admin grant: adds `quantity` of a listed instrument without charging cash.
pub fn grant(
    instrument: Instrument,
    quantity: Decimal,
    book: &PriceBook,
    holdings: &mut TeamHoldings,
) -> Result<Decimal, CashCrashError> {
    check_quantity(instrument, quantity)?;
    if !book.contains(instrument) {
        return Err(CashCrashError::InstrumentNotFound {
            kind: instrument.kind(),
            id: instrument.id(),
        });
    }
    adjust_lot(holdings, instrument, quantity)
}

/// Admin revocation: removes `quantity` without crediting cash. Works on stale lots too.
pub fn revoke(
    instrument: Instrument,
    quantity: Decimal,
    holdings: &mut TeamHoldings,
) -> Result<Decimal, CashCrashError> {
    check_quantity(instrument, quantity)?;
    let held = holdings.held(instrument);
    if quantity > held {
        return Err(CashCrashError::InsufficientHoldings {
            requested: quantity,
            held,
        });
    }
    adjust_lot(holdings, instrument, -quantity)
}
