//! Property-based tests for order settlement through the desk.
//!
//! Random order sequences, including ones that must be rejected, are run
//! against a seeded store to check that balances never go negative, that a
//! rejection changes nothing, and that accepted orders conserve value.

mod common;

use cashcrash::domain::desk;
use cashcrash::domain::instrument::Instrument;
use cashcrash::domain::settlement::{Order, Side};
use cashcrash::ports::holdings_port::HoldingsPort;
use cashcrash::ports::price_book_port::PriceBookPort;
use common::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// =============================================================================
// Generators
// =============================================================================

/// Listed instruments plus one that is not in the book.
fn arb_instrument() -> impl Strategy<Value = Instrument> {
    prop_oneof![
        Just(Instrument::Stock(1)),
        Just(Instrument::Stock(2)),
        Just(Instrument::Stock(9)),
        Just(Instrument::Currency(1)),
        Just(Instrument::Currency(2)),
    ]
}

fn arb_side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

/// Quantities from -5 to 50, with up to two decimal places.
fn arb_quantity() -> impl Strategy<Value = Decimal> {
    (-500i64..5000, 0u32..=2).prop_map(|(units, scale)| Decimal::new(units, scale))
}

fn arb_order() -> impl Strategy<Value = Order> {
    (arb_instrument(), arb_side(), arb_quantity()).prop_map(|(instrument, side, quantity)| {
        Order {
            instrument,
            side,
            quantity,
        }
    })
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Cash and every lot stay non-negative under any order sequence, and a
    /// rejected order leaves the holdings exactly as they were.
    #[test]
    fn prop_no_negative_balances(orders in proptest::collection::vec(arb_order(), 1..40)) {
        let store = seeded_store();
        for order in orders {
            let before = store.holdings(1).unwrap();
            match desk::execute_order(&store, &store, 1, order) {
                Ok(execution) => {
                    prop_assert!(execution.receipt.cash_after >= Decimal::ZERO);
                    prop_assert!(execution.receipt.held_after >= Decimal::ZERO);
                }
                Err(_) => {
                    prop_assert_eq!(store.holdings(1).unwrap(), before);
                }
            }
            let after = store.holdings(1).unwrap();
            prop_assert!(after.cash() >= Decimal::ZERO);
            prop_assert!(after.currency_lots().all(|(_, amount)| amount > Decimal::ZERO));
        }
    }

    /// An accepted buy moves exactly quantity × buy price out of cash and
    /// quantity into the lot; an accepted sell does the reverse at the sell price.
    #[test]
    fn prop_accepted_orders_conserve_value(orders in proptest::collection::vec(arb_order(), 1..40)) {
        let store = seeded_store();
        let book = store.snapshot().unwrap();
        for order in orders {
            let before = store.holdings(1).unwrap();
            let Ok(execution) = desk::execute_order(&store, &store, 1, order) else {
                continue;
            };
            let after = store.holdings(1).unwrap();
            let quote = book.quote(order.instrument).unwrap();
            match order.side {
                Side::Buy => {
                    prop_assert_eq!(after.cash(), before.cash() - order.quantity * quote.buy);
                    prop_assert_eq!(
                        after.held(order.instrument),
                        before.held(order.instrument) + order.quantity
                    );
                }
                Side::Sell => {
                    prop_assert_eq!(after.cash(), before.cash() + order.quantity * quote.sell);
                    prop_assert_eq!(
                        after.held(order.instrument),
                        before.held(order.instrument) - order.quantity
                    );
                }
            }
            prop_assert_eq!(execution.receipt.cash_after, after.cash());
        }
    }

    /// Orders for one team never touch another team's holdings.
    #[test]
    fn prop_other_teams_untouched(orders in proptest::collection::vec(arb_order(), 1..20)) {
        let store = seeded_store();
        let bears = store.holdings(2).unwrap();
        for order in orders {
            let _ = desk::execute_order(&store, &store, 1, order);
        }
        prop_assert_eq!(store.holdings(2).unwrap(), bears);
    }
}

#[test]
fn fractional_stock_orders_are_always_rejected() {
    let store = seeded_store();
    let err = desk::execute_order(&store, &store, 1, Order::buy(Instrument::Stock(1), dec!(0.5)))
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidQuantity");
    assert_eq!(store.get_cash(1).unwrap(), dec!(10000.00));
}
