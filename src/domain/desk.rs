//! Trading desk: order execution and valuation over the store ports.

use rust_decimal::Decimal;

use super::error::CashCrashError;
use super::instrument::Instrument;
use super::leaderboard::{self, LeaderboardEntry};
use super::settlement::{self, Order, SettlementReceipt};
use super::team::TeamId;
use super::valuation::{PortfolioSnapshot, value_portfolio};
use crate::ports::holdings_port::HoldingsPort;
use crate::ports::price_book_port::PriceBookPort;

/// Result of an accepted order.
#[derive(Debug, Clone)]
pub struct Execution {
    pub receipt: SettlementReceipt,
    pub portfolio: PortfolioSnapshot,
}

/// Values one team's portfolio against the current price book.
pub fn portfolio(
    prices: &dyn PriceBookPort,
    holdings: &dyn HoldingsPort,
    team_id: TeamId,
) -> Result<PortfolioSnapshot, CashCrashError> {
    let team = holdings.team(team_id)?;
    let book = prices.snapshot()?;
    let current = holdings.holdings(team_id)?;
    let snapshot = value_portfolio(&team, &current, &book);
    tracing::debug!(
        team_id,
        total = %snapshot.total_portfolio_value,
        "valued portfolio"
    );
    Ok(snapshot)
}

/// Settles `order` for `team_id` inside the team's transaction and re-values.
///
/// The book is held steady from the quote read through the commit, so an
/// instrument cannot be delisted underneath an order that is buying it.
pub fn execute_order(
    prices: &dyn PriceBookPort,
    holdings: &dyn HoldingsPort,
    team_id: TeamId,
    order: Order,
) -> Result<Execution, CashCrashError> {
    let team = holdings.team(team_id)?;

    let mut execution = None;
    let result = prices.read(&mut |book| {
        let mut receipt = None;
        let committed = holdings.update(team_id, &mut |h| {
            receipt = Some(settlement::settle(order, book, h)?);
            Ok(())
        })?;
        let receipt = receipt.ok_or_else(|| CashCrashError::Internal {
            reason: "settlement produced no receipt".into(),
        })?;
        execution = Some(Execution {
            portfolio: value_portfolio(&team, &committed, book),
            receipt,
        });
        Ok(())
    });

    if let Err(err) = result {
        tracing::warn!(
            team_id,
            instrument = %order.instrument,
            side = %order.side,
            quantity = %order.quantity,
            error = %err,
            "order rejected"
        );
        return Err(err);
    }
    let execution = execution.ok_or_else(|| CashCrashError::Internal {
        reason: "settlement produced no execution".into(),
    })?;

    let receipt = &execution.receipt;
    tracing::info!(
        team_id,
        instrument = %receipt.instrument,
        side = %receipt.side,
        quantity = %receipt.quantity,
        unit_price = %receipt.unit_price,
        amount = %receipt.amount,
        cash_after = %receipt.cash_after,
        "order settled"
    );
    Ok(execution)
}

/// Admin grant of an instrument without charging cash.
pub fn grant_position(
    prices: &dyn PriceBookPort,
    holdings: &dyn HoldingsPort,
    team_id: TeamId,
    instrument: Instrument,
    quantity: Decimal,
) -> Result<PortfolioSnapshot, CashCrashError> {
    prices.read(&mut |book| {
        holdings
            .update(team_id, &mut |h| {
                settlement::grant(instrument, quantity, book, h).map(|_| ())
            })
            .map(|_| ())
    })?;
    tracing::info!(team_id, %instrument, %quantity, "position granted");
    portfolio(prices, holdings, team_id)
}

/// Admin revocation of an instrument without crediting cash.
pub fn revoke_position(
    prices: &dyn PriceBookPort,
    holdings: &dyn HoldingsPort,
    team_id: TeamId,
    instrument: Instrument,
    quantity: Decimal,
) -> Result<PortfolioSnapshot, CashCrashError> {
    holdings.update(team_id, &mut |h| {
        settlement::revoke(instrument, quantity, h).map(|_| ())
    })?;
    tracing::info!(team_id, %instrument, %quantity, "position revoked");
    portfolio(prices, holdings, team_id)
}

/// Number of teams holding `instrument`.
pub fn holders_of(
    holdings: &dyn HoldingsPort,
    instrument: Instrument,
) -> Result<usize, CashCrashError> {
    let mut count = 0;
    for team in holdings.teams()? {
        if holdings.holdings(team.id)?.holds(instrument) {
            count += 1;
        }
    }
    Ok(count)
}

/// Removes an instrument from the price book, refusing while any team holds it.
///
/// Holders are counted under the book's write lock, which no order can
/// settle past.
pub fn delist(
    prices: &dyn PriceBookPort,
    holdings: &dyn HoldingsPort,
    instrument: Instrument,
) -> Result<(), CashCrashError> {
    prices.write(&mut |book| {
        let holders = holders_of(holdings, instrument)?;
        if holders > 0 {
            return Err(CashCrashError::InstrumentInUse {
                kind: instrument.kind(),
                id: instrument.id(),
                holders,
            });
        }
        match instrument {
            Instrument::Stock(id) => book.remove_company(id).map(|_| ()),
            Instrument::Currency(id) => book.remove_currency(id).map(|_| ()),
        }
    })?;
    tracing::info!(%instrument, "instrument delisted");
    Ok(())
}

/// Every team's snapshot, ranked.
pub fn leaderboard(
    prices: &dyn PriceBookPort,
    holdings: &dyn HoldingsPort,
) -> Result<Vec<LeaderboardEntry>, CashCrashError> {
    let book = prices.snapshot()?;
    let mut snapshots = Vec::new();
    for team in holdings.teams()? {
        let current = match holdings.holdings(team.id) {
            Ok(h) => h,
            // Removed between listing and reading.
            Err(CashCrashError::TeamNotFound { .. }) => continue,
            Err(err) => return Err(err),
        };
        snapshots.push(value_portfolio(&team, &current, &book));
    }
    Ok(leaderboard::rank(snapshots))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::MemoryStore;
    use crate::domain::instrument::{NewCompany, NewCurrency};
    use rust_decimal_macros::dec;
    use std::sync::Barrier;
    use std::thread;

    fn store() -> MemoryStore {
        let store = MemoryStore::default();
        store
            .add_company(NewCompany {
                name: "Acme".into(),
                symbol: "ACM".into(),
                buy_price: dec!(100.00),
                sell_price: Some(dec!(98.00)),
                dividend_pct: Decimal::ZERO,
                description: String::new(),
                logo: None,
            })
            .unwrap();
        store.create_team("Bulls", "BULLS1", dec!(10000.00)).unwrap();
        store.create_team("Bears", "BEARS1", dec!(50.00)).unwrap();
        store
    }

    #[test]
    fn scenario_buy_then_sell() {
        let store = store();
        let acme = Instrument::Stock(1);

        let bought = execute_order(&store, &store, 1, Order::buy(acme, dec!(10))).unwrap();
        assert_eq!(bought.portfolio.cash, dec!(9000.00));
        assert_eq!(bought.portfolio.stock(1).unwrap().shares, 10);

        let sold = execute_order(&store, &store, 1, Order::sell(acme, dec!(4))).unwrap();
        assert_eq!(sold.portfolio.cash, dec!(9392.00));
        assert_eq!(sold.portfolio.stock(1).unwrap().shares, 6);
        assert_eq!(sold.receipt.amount, dec!(392.00));
    }

    #[test]
    fn buy_leaves_other_teams_alone() {
        let store = store();
        let before = store.holdings(2).unwrap();
        execute_order(&store, &store, 1, Order::buy(Instrument::Stock(1), dec!(1))).unwrap();
        assert_eq!(store.holdings(2).unwrap(), before);
    }

    #[test]
    fn rejected_order_leaves_state_untouched() {
        let store = store();
        let before = store.holdings(2).unwrap();
        let err = execute_order(&store, &store, 2, Order::buy(Instrument::Stock(1), dec!(1)))
            .unwrap_err();
        assert!(matches!(err, CashCrashError::InsufficientFunds { .. }));
        assert_eq!(store.holdings(2).unwrap(), before);
    }

    #[test]
    fn unknown_team_is_rejected() {
        let store = store();
        let err = execute_order(&store, &store, 9, Order::buy(Instrument::Stock(1), dec!(1)))
            .unwrap_err();
        assert!(matches!(err, CashCrashError::TeamNotFound { id: 9 }));
    }

    #[test]
    fn price_change_reaches_every_holder() {
        let store = store();
        let acme = Instrument::Stock(1);
        store.adjust_cash(2, dec!(1000)).unwrap();
        execute_order(&store, &store, 1, Order::buy(acme, dec!(10))).unwrap();
        execute_order(&store, &store, 2, Order::buy(acme, dec!(1))).unwrap();

        store.set_company_price(1, dec!(120.00), None).unwrap();
        for team_id in [1, 2] {
            let snap = portfolio(&store, &store, team_id).unwrap();
            assert_eq!(snap.stock(1).unwrap().sell_price, dec!(117.60));
        }
    }

    #[test]
    fn delist_refuses_held_instruments() {
        let store = store();
        let acme = Instrument::Stock(1);
        execute_order(&store, &store, 1, Order::buy(acme, dec!(1))).unwrap();
        let err = delist(&store, &store, acme).unwrap_err();
        assert!(matches!(err, CashCrashError::InstrumentInUse { holders: 1, .. }));

        execute_order(&store, &store, 1, Order::sell(acme, dec!(1))).unwrap();
        delist(&store, &store, acme).unwrap();
        assert!(store.get_company(1).is_err());
    }

    #[test]
    fn unpriceable_order_leaves_team_tradable() {
        let store = store();
        store
            .add_currency(NewCurrency {
                name: "Euro".into(),
                code: "EUR".into(),
                buy_rate: dec!(1.10),
                sell_rate: None,
                logo: None,
            })
            .unwrap();
        let euro = Instrument::Currency(1);
        let before = store.holdings(1).unwrap();

        let err = execute_order(&store, &store, 1, Order::buy(euro, Decimal::MAX)).unwrap_err();
        assert!(matches!(err, CashCrashError::InvalidQuantity { .. }));
        assert_eq!(store.holdings(1).unwrap(), before);

        let bought = execute_order(&store, &store, 1, Order::buy(euro, dec!(100))).unwrap();
        assert_eq!(bought.portfolio.cash, dec!(9890.00));
    }

    #[test]
    fn unpriceable_quote_leaves_price_book_usable() {
        let store = store();
        let err = store.set_company_price(1, Decimal::MAX, None).unwrap_err();
        assert!(matches!(err, CashCrashError::InvalidPrice { .. }));
        assert_eq!(store.list_companies().unwrap()[0].buy_price, dec!(100.00));
        execute_order(&store, &store, 1, Order::buy(Instrument::Stock(1), dec!(1))).unwrap();
    }

    #[test]
    fn delist_racing_a_buy_never_strands_a_lot() {
        let acme = Instrument::Stock(1);
        for _ in 0..200 {
            let store = store();
            let start = Barrier::new(2);
            thread::scope(|s| {
                s.spawn(|| {
                    start.wait();
                    let _ = execute_order(&store, &store, 1, Order::buy(acme, dec!(1)));
                });
                s.spawn(|| {
                    start.wait();
                    let _ = delist(&store, &store, acme);
                });
            });

            let listed = store.get_company(1).is_ok();
            let held = store.holdings(1).unwrap().holds(acme);
            assert!(listed || !held, "team holds a lot on a delisted company");
        }
    }

    #[test]
    fn grant_and_revoke_positions() {
        let store = store();
        let acme = Instrument::Stock(1);
        let snap = grant_position(&store, &store, 2, acme, dec!(3)).unwrap();
        assert_eq!(snap.cash, dec!(50.00));
        assert_eq!(snap.stock(1).unwrap().shares, 3);

        let snap = revoke_position(&store, &store, 2, acme, dec!(3)).unwrap();
        assert!(snap.stock(1).is_none());
        assert_eq!(snap.cash, dec!(50.00));
    }

    #[test]
    fn leaderboard_ranks_all_teams() {
        let store = store();
        let board = leaderboard(&store, &store).unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].team_name, "Bulls");
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].total_portfolio_value, dec!(50.00));
    }
}
