//! The shared price book: current buy/sell quotes for every company and currency.
//!
//! Writes overwrite in place; there is no quote history. A sell quote omitted
//! on write is derived from the buy quote using the book's default spread.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use super::error::CashCrashError;
use super::instrument::{
    Company, CompanyEdit, CompanyId, Currency, CurrencyEdit, CurrencyId, Instrument,
    InstrumentKind, NewCompany, NewCurrency, QuoteUpdate,
};
use super::money::round_quote;

/// Default discount of the sell quote below the buy quote, in percent.
pub const DEFAULT_SPREAD_PCT: Decimal = dec!(2);

/// A buy/sell pair for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub buy: Decimal,
    pub sell: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBook {
    companies: BTreeMap<CompanyId, Company>,
    currencies: BTreeMap<CurrencyId, Currency>,
    default_spread_pct: Decimal,
    next_company_id: CompanyId,
    next_currency_id: CurrencyId,
}

impl Default for PriceBook {
    fn default() -> Self {
        Self::new(DEFAULT_SPREAD_PCT)
    }
}

impl PriceBook {
    pub fn new(default_spread_pct: Decimal) -> Self {
        PriceBook {
            companies: BTreeMap::new(),
            currencies: BTreeMap::new(),
            default_spread_pct,
            next_company_id: 1,
            next_currency_id: 1,
        }
    }

    pub fn default_spread_pct(&self) -> Decimal {
        self.default_spread_pct
    }

    /// Sell quote implied by `buy` under the default spread.
    pub fn derived_sell(&self, buy: Decimal) -> Result<Decimal, CashCrashError> {
        buy.checked_mul(Decimal::ONE_HUNDRED - self.default_spread_pct)
            .map(|scaled| round_quote(scaled / Decimal::ONE_HUNDRED))
            .ok_or_else(|| CashCrashError::InvalidPrice {
                reason: format!("buy price {buy} is out of range"),
            })
    }

    fn resolve_quote(&self, buy: Decimal, sell: Option<Decimal>) -> Result<Quote, CashCrashError> {
        if buy < Decimal::ZERO {
            return Err(CashCrashError::InvalidPrice {
                reason: format!("buy price {buy} is negative"),
            });
        }
        let sell = match sell {
            Some(s) if s < Decimal::ZERO => {
                return Err(CashCrashError::InvalidPrice {
                    reason: format!("sell price {s} is negative"),
                });
            }
            Some(s) => s,
            None => self.derived_sell(buy)?,
        };
        Ok(Quote { buy, sell })
    }

    pub fn get_company(&self, id: CompanyId) -> Result<&Company, CashCrashError> {
        self.companies
            .get(&id)
            .ok_or(CashCrashError::InstrumentNotFound {
                kind: InstrumentKind::Stock,
                id,
            })
    }

    pub fn get_currency(&self, id: CurrencyId) -> Result<&Currency, CashCrashError> {
        self.currencies
            .get(&id)
            .ok_or(CashCrashError::InstrumentNotFound {
                kind: InstrumentKind::Currency,
                id,
            })
    }

    /// Current quote for any instrument.
    pub fn quote(&self, instrument: Instrument) -> Result<Quote, CashCrashError> {
        match instrument {
            Instrument::Stock(id) => self.get_company(id).map(|c| Quote {
                buy: c.buy_price,
                sell: c.sell_price,
            }),
            Instrument::Currency(id) => self.get_currency(id).map(|c| Quote {
                buy: c.buy_rate,
                sell: c.sell_rate,
            }),
        }
    }

    pub fn contains(&self, instrument: Instrument) -> bool {
        match instrument {
            Instrument::Stock(id) => self.companies.contains_key(&id),
            Instrument::Currency(id) => self.currencies.contains_key(&id),
        }
    }

    pub fn companies(&self) -> impl Iterator<Item = &Company> {
        self.companies.values()
    }

    pub fn currencies(&self) -> impl Iterator<Item = &Currency> {
        self.currencies.values()
    }

    pub fn add_company(&mut self, new: NewCompany) -> Result<Company, CashCrashError> {
        let quote = self.resolve_quote(new.buy_price, new.sell_price)?;
        let company = Company {
            id: self.next_company_id,
            name: new.name,
            symbol: new.symbol,
            buy_price: quote.buy,
            sell_price: quote.sell,
            dividend_pct: new.dividend_pct,
            description: new.description,
            logo: new.logo,
        };
        self.next_company_id += 1;
        self.companies.insert(company.id, company.clone());
        Ok(company)
    }

    pub fn add_currency(&mut self, new: NewCurrency) -> Result<Currency, CashCrashError> {
        let quote = self.resolve_quote(new.buy_rate, new.sell_rate)?;
        let currency = Currency {
            id: self.next_currency_id,
            name: new.name,
            code: new.code,
            buy_rate: quote.buy,
            sell_rate: quote.sell,
            logo: new.logo,
        };
        self.next_currency_id += 1;
        self.currencies.insert(currency.id, currency.clone());
        Ok(currency)
    }

    pub fn set_company_price(
        &mut self,
        id: CompanyId,
        buy: Decimal,
        sell: Option<Decimal>,
    ) -> Result<Company, CashCrashError> {
        let quote = self.resolve_quote(buy, sell)?;
        let company = self
            .companies
            .get_mut(&id)
            .ok_or(CashCrashError::InstrumentNotFound {
                kind: InstrumentKind::Stock,
                id,
            })?;
        company.buy_price = quote.buy;
        company.sell_price = quote.sell;
        Ok(company.clone())
    }

    pub fn set_currency_rate(
        &mut self,
        id: CurrencyId,
        buy: Decimal,
        sell: Option<Decimal>,
    ) -> Result<Currency, CashCrashError> {
        let quote = self.resolve_quote(buy, sell)?;
        let currency = self
            .currencies
            .get_mut(&id)
            .ok_or(CashCrashError::InstrumentNotFound {
                kind: InstrumentKind::Currency,
                id,
            })?;
        currency.buy_rate = quote.buy;
        currency.sell_rate = quote.sell;
        Ok(currency.clone())
    }

    /// Applies every update or none of them.
    pub fn set_company_prices(
        &mut self,
        updates: &[QuoteUpdate],
    ) -> Result<Vec<Company>, CashCrashError> {
        let mut staged = self.clone();
        let updated = updates
            .iter()
            .map(|u| staged.set_company_price(u.id, u.buy, u.sell))
            .collect::<Result<Vec<_>, _>>()?;
        *self = staged;
        Ok(updated)
    }

    /// Applies every update or none of them.
    pub fn set_currency_rates(
        &mut self,
        updates: &[QuoteUpdate],
    ) -> Result<Vec<Currency>, CashCrashError> {
        let mut staged = self.clone();
        let updated = updates
            .iter()
            .map(|u| staged.set_currency_rate(u.id, u.buy, u.sell))
            .collect::<Result<Vec<_>, _>>()?;
        *self = staged;
        Ok(updated)
    }

    pub fn update_company(
        &mut self,
        id: CompanyId,
        edit: CompanyEdit,
    ) -> Result<Company, CashCrashError> {
        let company = self
            .companies
            .get_mut(&id)
            .ok_or(CashCrashError::InstrumentNotFound {
                kind: InstrumentKind::Stock,
                id,
            })?;
        if let Some(name) = edit.name {
            company.name = name;
        }
        if let Some(symbol) = edit.symbol {
            company.symbol = symbol;
        }
        if let Some(dividend_pct) = edit.dividend_pct {
            company.dividend_pct = dividend_pct;
        }
        if let Some(description) = edit.description {
            company.description = description;
        }
        if let Some(logo) = edit.logo {
            company.logo = Some(logo);
        }
        Ok(company.clone())
    }

    pub fn update_currency(
        &mut self,
        id: CurrencyId,
        edit: CurrencyEdit,
    ) -> Result<Currency, CashCrashError> {
        let currency = self
            .currencies
            .get_mut(&id)
            .ok_or(CashCrashError::InstrumentNotFound {
                kind: InstrumentKind::Currency,
                id,
            })?;
        if let Some(name) = edit.name {
            currency.name = name;
        }
        if let Some(code) = edit.code {
            currency.code = code;
        }
        if let Some(logo) = edit.logo {
            currency.logo = Some(logo);
        }
        Ok(currency.clone())
    }

    pub fn remove_company(&mut self, id: CompanyId) -> Result<Company, CashCrashError> {
        self.companies
            .remove(&id)
            .ok_or(CashCrashError::InstrumentNotFound {
                kind: InstrumentKind::Stock,
                id,
            })
    }

    pub fn remove_currency(&mut self, id: CurrencyId) -> Result<Currency, CashCrashError> {
        self.currencies
            .remove(&id)
            .ok_or(CashCrashError::InstrumentNotFound {
                kind: InstrumentKind::Currency,
                id,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(name: &str, buy: Decimal, sell: Option<Decimal>) -> NewCompany {
        NewCompany {
            name: name.into(),
            symbol: name.to_uppercase(),
            buy_price: buy,
            sell_price: sell,
            dividend_pct: Decimal::ZERO,
            description: String::new(),
            logo: None,
        }
    }

    fn yen(buy: Decimal) -> NewCurrency {
        NewCurrency {
            name: "Japanese Yen".into(),
            code: "JPY".into(),
            buy_rate: buy,
            sell_rate: None,
            logo: None,
        }
    }

    #[test]
    fn ids_are_assigned_sequentially() {
        let mut book = PriceBook::default();
        let a = book.add_company(company("a", dec!(10), None)).unwrap();
        let b = book.add_company(company("b", dec!(10), None)).unwrap();
        let c = book.add_currency(yen(dec!(0.0068))).unwrap();
        assert_eq!((a.id, b.id, c.id), (1, 2, 1));
    }

    #[test]
    fn omitted_sell_price_takes_two_percent_discount() {
        let mut book = PriceBook::default();
        let acme = book.add_company(company("acme", dec!(100.00), None)).unwrap();
        assert_eq!(acme.sell_price, dec!(98.00));

        let updated = book.set_company_price(acme.id, dec!(120.00), None).unwrap();
        assert_eq!(updated.buy_price, dec!(120.00));
        assert_eq!(updated.sell_price, dec!(117.60));
    }

    #[test]
    fn explicit_sell_price_is_kept() {
        let mut book = PriceBook::default();
        let acme = book
            .add_company(company("acme", dec!(100.00), Some(dec!(90.00))))
            .unwrap();
        assert_eq!(acme.sell_price, dec!(90.00));
        let updated = book
            .set_company_price(acme.id, dec!(50), Some(dec!(49.5)))
            .unwrap();
        assert_eq!(updated.sell_price, dec!(49.5));
    }

    #[test]
    fn derived_sell_for_low_rates_keeps_four_places() {
        let mut book = PriceBook::default();
        let jpy = book.add_currency(yen(dec!(0.0068))).unwrap();
        assert_eq!(jpy.sell_rate, dec!(0.0067));
    }

    #[test]
    fn custom_spread_is_used_for_derivation() {
        let book = PriceBook::new(dec!(5));
        assert_eq!(book.derived_sell(dec!(200)).unwrap(), dec!(190.00));
    }

    #[test]
    fn buy_price_too_large_to_derive_from_is_rejected() {
        let mut book = PriceBook::default();
        let acme = book.add_company(company("acme", dec!(100.00), None)).unwrap();
        let before = book.clone();

        let err = book.set_company_price(acme.id, Decimal::MAX, None).unwrap_err();
        assert!(matches!(err, CashCrashError::InvalidPrice { .. }));
        let err = book.add_currency(yen(Decimal::MAX)).unwrap_err();
        assert!(matches!(err, CashCrashError::InvalidPrice { .. }));
        assert_eq!(book, before);
    }

    #[test]
    fn negative_prices_are_rejected() {
        let mut book = PriceBook::default();
        let err = book
            .add_company(company("acme", dec!(-1), None))
            .unwrap_err();
        assert!(matches!(err, CashCrashError::InvalidPrice { .. }));

        let acme = book.add_company(company("acme", dec!(10), None)).unwrap();
        let err = book
            .set_company_price(acme.id, dec!(10), Some(dec!(-2)))
            .unwrap_err();
        assert!(matches!(err, CashCrashError::InvalidPrice { .. }));
        assert_eq!(book.get_company(acme.id).unwrap().buy_price, dec!(10));
    }

    #[test]
    fn missing_instrument_is_not_found() {
        let mut book = PriceBook::default();
        assert!(matches!(
            book.get_company(9),
            Err(CashCrashError::InstrumentNotFound {
                kind: InstrumentKind::Stock,
                id: 9
            })
        ));
        assert!(matches!(
            book.set_currency_rate(3, dec!(1), None),
            Err(CashCrashError::InstrumentNotFound {
                kind: InstrumentKind::Currency,
                id: 3
            })
        ));
        assert!(book.quote(Instrument::Stock(1)).is_err());
    }

    #[test]
    fn bulk_update_is_all_or_nothing() {
        let mut book = PriceBook::default();
        let a = book.add_company(company("a", dec!(10), None)).unwrap();
        let before = book.clone();

        let result = book.set_company_prices(&[
            QuoteUpdate {
                id: a.id,
                buy: dec!(20),
                sell: None,
            },
            QuoteUpdate {
                id: 99,
                buy: dec!(5),
                sell: None,
            },
        ]);
        assert!(result.is_err());
        assert_eq!(book, before);

        let updated = book
            .set_company_prices(&[QuoteUpdate {
                id: a.id,
                buy: dec!(20),
                sell: None,
            }])
            .unwrap();
        assert_eq!(updated[0].sell_price, dec!(19.60));
    }

    #[test]
    fn edits_leave_prices_alone() {
        let mut book = PriceBook::default();
        let a = book.add_company(company("a", dec!(10), None)).unwrap();
        let edited = book
            .update_company(
                a.id,
                CompanyEdit {
                    name: Some("Alpha".into()),
                    dividend_pct: Some(dec!(3)),
                    ..CompanyEdit::default()
                },
            )
            .unwrap();
        assert_eq!(edited.name, "Alpha");
        assert_eq!(edited.dividend_pct, dec!(3));
        assert_eq!(edited.buy_price, dec!(10));
        assert_eq!(edited.symbol, "A");
    }

    #[test]
    fn removed_company_is_gone() {
        let mut book = PriceBook::default();
        let a = book.add_company(company("a", dec!(10), None)).unwrap();
        book.remove_company(a.id).unwrap();
        assert!(!book.contains(Instrument::Stock(a.id)));
        assert!(book.remove_company(a.id).is_err());
    }
}
