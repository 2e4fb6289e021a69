//! Point-in-time portfolio valuation.
//!
//! Holdings are valued at the sell quote (liquidation value). A lot whose
//! instrument is no longer in the price book contributes zero and is
//! flagged `stale` instead of failing the snapshot. So does a lot whose value
//! exceeds the decimal range; totals saturate at `Decimal::MAX`.

use rust_decimal::Decimal;
use serde::Serialize;

use super::holdings::TeamHoldings;
use super::instrument::{CompanyId, CurrencyId, Instrument};
use super::money::{round_money, round_quote};
use super::price_book::PriceBook;
use super::team::{StartupGrant, Team, TeamSummary};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockHolding {
    pub company_id: CompanyId,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub shares: u64,
    pub sell_price: Decimal,
    pub value: Decimal,
    pub stale: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyHolding {
    pub currency_id: CurrencyId,
    pub name: Option<String>,
    pub code: Option<String>,
    pub amount: Decimal,
    pub sell_rate: Decimal,
    pub value: Decimal,
    pub stale: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub team: TeamSummary,
    pub cash: Decimal,
    pub stocks: Vec<StockHolding>,
    pub currencies: Vec<CurrencyHolding>,
    pub startup: Option<StartupGrant>,
    pub total_stock_value: Decimal,
    pub total_currency_value: Decimal,
    pub startup_value: Decimal,
    pub total_portfolio_value: Decimal,
}

impl PortfolioSnapshot {
    pub fn has_stale_holdings(&self) -> bool {
        self.stocks.iter().any(|s| s.stale) || self.currencies.iter().any(|c| c.stale)
    }

    pub fn stock(&self, company_id: CompanyId) -> Option<&StockHolding> {
        self.stocks.iter().find(|s| s.company_id == company_id)
    }

    pub fn currency(&self, currency_id: CurrencyId) -> Option<&CurrencyHolding> {
        self.currencies.iter().find(|c| c.currency_id == currency_id)
    }

    pub fn references(&self, instrument: Instrument) -> bool {
        match instrument {
            Instrument::Stock(id) => self.stock(id).is_some(),
            Instrument::Currency(id) => self.currency(id).is_some(),
        }
    }
}

/// Values `holdings` against `book`.
///
/// Totals are summed at full precision and rounded once on output, so an
/// unchanged portfolio always produces the same snapshot.
pub fn value_portfolio(team: &Team, holdings: &TeamHoldings, book: &PriceBook) -> PortfolioSnapshot {
    let mut total_stock = Decimal::ZERO;
    let stocks: Vec<StockHolding> = holdings
        .stock_lots()
        .filter(|(_, shares)| *shares > 0)
        .map(|(company_id, shares)| match book.get_company(company_id) {
            Ok(company) => {
                let (value, stale) = match Decimal::from(shares).checked_mul(company.sell_price) {
                    Some(value) => (value, false),
                    None => {
                        tracing::warn!(team_id = team.id, company_id, "stock lot value out of range");
                        (Decimal::ZERO, true)
                    }
                };
                total_stock = total_stock.saturating_add(value);
                StockHolding {
                    company_id,
                    name: Some(company.name.clone()),
                    symbol: Some(company.symbol.clone()),
                    shares,
                    sell_price: round_quote(company.sell_price),
                    value: round_money(value),
                    stale,
                }
            }
            Err(_) => {
                tracing::warn!(team_id = team.id, company_id, "stale stock lot valued at zero");
                StockHolding {
                    company_id,
                    name: None,
                    symbol: None,
                    shares,
                    sell_price: Decimal::ZERO,
                    value: Decimal::ZERO,
                    stale: true,
                }
            }
        })
        .collect();

    let mut total_currency = Decimal::ZERO;
    let currencies: Vec<CurrencyHolding> = holdings
        .currency_lots()
        .filter(|(_, amount)| *amount > Decimal::ZERO)
        .map(|(currency_id, amount)| match book.get_currency(currency_id) {
            Ok(currency) => {
                let (value, stale) = match amount.checked_mul(currency.sell_rate) {
                    Some(value) => (value, false),
                    None => {
                        tracing::warn!(team_id = team.id, currency_id, "currency lot value out of range");
                        (Decimal::ZERO, true)
                    }
                };
                total_currency = total_currency.saturating_add(value);
                CurrencyHolding {
                    currency_id,
                    name: Some(currency.name.clone()),
                    code: Some(currency.code.clone()),
                    amount,
                    sell_rate: round_quote(currency.sell_rate),
                    value: round_money(value),
                    stale,
                }
            }
            Err(_) => {
                tracing::warn!(team_id = team.id, currency_id, "stale currency lot valued at zero");
                CurrencyHolding {
                    currency_id,
                    name: None,
                    code: None,
                    amount,
                    sell_rate: Decimal::ZERO,
                    value: Decimal::ZERO,
                    stale: true,
                }
            }
        })
        .collect();

    let startup = holdings.startup_grant().cloned();
    let startup_value = startup.as_ref().map_or(Decimal::ZERO, |g| g.value);
    let total = holdings
        .cash()
        .saturating_add(total_stock)
        .saturating_add(total_currency)
        .saturating_add(startup_value);

    PortfolioSnapshot {
        team: TeamSummary::from(team),
        cash: round_money(holdings.cash()),
        stocks,
        currencies,
        startup,
        total_stock_value: round_money(total_stock),
        total_currency_value: round_money(total_currency),
        startup_value: round_money(startup_value),
        total_portfolio_value: round_money(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instrument::{NewCompany, NewCurrency};
    use crate::domain::team::RiskLevel;
    use rust_decimal_macros::dec;

    fn team() -> Team {
        Team {
            id: 1,
            name: "Bulls".into(),
            access_code: "BULLS1".into(),
        }
    }

    fn book() -> PriceBook {
        let mut book = PriceBook::default();
        book.add_company(NewCompany {
            name: "Acme".into(),
            symbol: "ACM".into(),
            buy_price: dec!(100.00),
            sell_price: Some(dec!(98.00)),
            dividend_pct: Decimal::ZERO,
            description: String::new(),
            logo: None,
        })
        .unwrap();
        book.add_currency(NewCurrency {
            name: "Japanese Yen".into(),
            code: "JPY".into(),
            buy_rate: dec!(0.0068),
            sell_rate: Some(dec!(0.00665)),
            logo: None,
        })
        .unwrap();
        book
    }

    #[test]
    fn cash_only_portfolio() {
        let holdings = TeamHoldings::new(1, dec!(10000.00)).unwrap();
        let snap = value_portfolio(&team(), &holdings, &book());
        assert_eq!(snap.cash, dec!(10000.00));
        assert!(snap.stocks.is_empty());
        assert!(snap.currencies.is_empty());
        assert_eq!(snap.total_portfolio_value, dec!(10000.00));
    }

    #[test]
    fn holdings_use_sell_quotes() {
        let mut holdings = TeamHoldings::new(1, dec!(9000.00)).unwrap();
        holdings.adjust_stock_lot(1, 10).unwrap();
        holdings.adjust_currency_lot(1, dec!(1000)).unwrap();

        let snap = value_portfolio(&team(), &holdings, &book());
        let acme = snap.stock(1).unwrap();
        assert_eq!(acme.sell_price, dec!(98.00));
        assert_eq!(acme.value, dec!(980.00));
        assert_eq!(acme.symbol.as_deref(), Some("ACM"));

        let yen = snap.currency(1).unwrap();
        assert_eq!(yen.sell_rate, dec!(0.0067));
        assert_eq!(yen.value, dec!(6.65));

        assert_eq!(snap.total_stock_value, dec!(980.00));
        assert_eq!(snap.total_currency_value, dec!(6.65));
        assert_eq!(snap.total_portfolio_value, dec!(9986.65));
    }

    #[test]
    fn rounding_happens_once_on_totals() {
        let mut book = book();
        book.set_currency_rate(1, dec!(0.0012), Some(dec!(0.00099))).unwrap();
        let mut holdings = TeamHoldings::new(1, Decimal::ZERO).unwrap();
        holdings.adjust_currency_lot(1, dec!(5)).unwrap();

        // 5 x 0.00099 = 0.00495 -> 0.00; rounding the rate first would give 0.01
        let snap = value_portfolio(&team(), &holdings, &book);
        assert_eq!(snap.currency(1).unwrap().sell_rate, dec!(0.0010));
        assert_eq!(snap.total_currency_value, dec!(0.00));
        assert_eq!(snap.total_portfolio_value, dec!(0.00));
    }

    #[test]
    fn missing_instrument_degrades_to_stale_zero() {
        let mut holdings = TeamHoldings::new(1, dec!(100)).unwrap();
        holdings.adjust_stock_lot(1, 2).unwrap();
        holdings.adjust_stock_lot(42, 7).unwrap();
        holdings.adjust_currency_lot(9, dec!(3)).unwrap();

        let snap = value_portfolio(&team(), &holdings, &book());
        let ghost = snap.stock(42).unwrap();
        assert!(ghost.stale);
        assert_eq!(ghost.value, Decimal::ZERO);
        assert!(ghost.name.is_none());
        assert!(snap.currency(9).unwrap().stale);
        assert!(snap.has_stale_holdings());
        assert_eq!(snap.total_portfolio_value, dec!(296.00));
    }

    #[test]
    fn out_of_range_lot_degrades_instead_of_failing() {
        let mut book = book();
        book.set_currency_rate(1, dec!(2.00), Some(dec!(2.00))).unwrap();
        let mut holdings = TeamHoldings::new(1, Decimal::MAX).unwrap();
        holdings.adjust_stock_lot(1, 10).unwrap();
        holdings.adjust_currency_lot(1, Decimal::MAX).unwrap();

        let snap = value_portfolio(&team(), &holdings, &book);
        let lot = snap.currency(1).unwrap();
        assert!(lot.stale);
        assert_eq!(lot.value, Decimal::ZERO);
        assert_eq!(lot.code.as_deref(), Some("JPY"));
        assert!(!snap.stock(1).unwrap().stale);
        assert_eq!(snap.total_stock_value, dec!(980.00));
        assert_eq!(snap.total_portfolio_value, Decimal::MAX);
    }

    #[test]
    fn startup_value_is_included() {
        let mut holdings = TeamHoldings::new(1, dec!(500)).unwrap();
        holdings.set_startup_grant(StartupGrant {
            id: 1,
            team_id: 1,
            name: "Rocket".into(),
            description: String::new(),
            value: dec!(2500.555),
            industry: "Space".into(),
            risk_level: RiskLevel::High,
        });
        let snap = value_portfolio(&team(), &holdings, &book());
        assert_eq!(snap.startup_value, dec!(2500.56));
        assert_eq!(snap.total_portfolio_value, dec!(3000.56));
        assert_eq!(snap.startup.unwrap().name, "Rocket");
    }

    #[test]
    fn valuation_is_deterministic() {
        let mut holdings = TeamHoldings::new(1, dec!(1234.567)).unwrap();
        holdings.adjust_stock_lot(1, 3).unwrap();
        holdings.adjust_currency_lot(1, dec!(777.7)).unwrap();
        let book = book();

        let first = value_portfolio(&team(), &holdings, &book);
        let second = value_portfolio(&team(), &holdings, &book);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn price_change_is_visible_on_next_valuation() {
        let mut holdings = TeamHoldings::new(1, Decimal::ZERO).unwrap();
        holdings.adjust_stock_lot(1, 10).unwrap();
        let mut book = book();

        book.set_company_price(1, dec!(120.00), None).unwrap();
        let snap = value_portfolio(&team(), &holdings, &book);
        assert_eq!(snap.stock(1).unwrap().sell_price, dec!(117.60));
        assert_eq!(snap.total_stock_value, dec!(1176.00));
    }
}
